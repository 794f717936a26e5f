//! Email notifications.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{check_status, ClientError, Result};

/// Templated emails this service sends. Fields are the template's
/// personalisation values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "PascalCase")]
pub enum Email {
    CertificateProviderInvite {
        donor_full_name: String,
        lpa_type: String,
        certificate_provider_full_name: String,
        certificate_provider_start_url: String,
        share_code: String,
    },
    AttorneyInvite {
        donor_full_name: String,
        lpa_type: String,
        attorney_full_name: String,
        attorney_start_page_url: String,
        share_code: String,
        #[serde(skip)]
        is_replacement: bool,
    },
    DonorAccess {
        organisation_name: String,
        donor_name: String,
        url: String,
        share_code: String,
    },
    CertificateProviderOptedOut {
        certificate_provider_full_name: String,
        donor_full_name: String,
        lpa_uid: String,
        donor_start_page_url: String,
    },
    AttorneyOptedOut {
        attorney_full_name: String,
        donor_full_name: String,
        lpa_uid: String,
        donor_start_page_url: String,
    },
}

impl Email {
    /// Template name, mapped to a provider template id by configuration.
    pub fn template(&self) -> &'static str {
        match self {
            Email::CertificateProviderInvite { .. } => "certificate-provider-invite",
            Email::AttorneyInvite {
                is_replacement: false,
                ..
            } => "attorney-invite",
            Email::AttorneyInvite {
                is_replacement: true,
                ..
            } => "replacement-attorney-invite",
            Email::DonorAccess { .. } => "donor-access",
            Email::CertificateProviderOptedOut { .. } => "certificate-provider-opted-out",
            Email::AttorneyOptedOut { .. } => "attorney-opted-out",
        }
    }
}

/// Sends templated emails.
///
/// Failures are returned to the caller; nothing is queued or retried here.
#[async_trait]
pub trait NotifyClient: Send + Sync {
    async fn send_email(&self, to: &str, email: &Email) -> Result<()>;

    /// Send an email about a specific LPA, tagged with its UID.
    async fn send_actor_email(&self, to: &str, lpa_uid: &str, email: &Email) -> Result<()>;
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    email_address: &'a str,
    template_id: &'a str,
    personalisation: &'a Email,
    #[serde(skip_serializing_if = "str::is_empty")]
    reference: &'a str,
}

/// Notification API client over HTTP.
pub struct HttpNotifyClient {
    client: Client,
    base_url: String,
    api_key: String,
    templates: HashMap<String, String>,
}

impl HttpNotifyClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        templates: HashMap<String, String>,
    ) -> Result<Self> {
        if base_url.is_empty() {
            return Err(ClientError::Config("notify base_url not configured".to_string()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            templates,
        })
    }

    fn template_id<'a>(&'a self, email: &'a Email) -> &'a str {
        self.templates
            .get(email.template())
            .map(String::as_str)
            .unwrap_or(email.template())
    }

    async fn post(&self, to: &str, email: &Email, reference: &str) -> Result<()> {
        let url = format!("{}/v2/notifications/email", self.base_url);
        let body = EmailRequest {
            email_address: to,
            template_id: self.template_id(email),
            personalisation: email,
            reference,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        match check_status("notify", response).await {
            Ok(_) => {
                debug!(template = email.template(), "Email sent");
                Ok(())
            }
            Err(e) => {
                error!(template = email.template(), error = %e, "Email send failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl NotifyClient for HttpNotifyClient {
    async fn send_email(&self, to: &str, email: &Email) -> Result<()> {
        self.post(to, email, "").await
    }

    async fn send_actor_email(&self, to: &str, lpa_uid: &str, email: &Email) -> Result<()> {
        self.post(to, email, lpa_uid).await
    }
}

/// Writes emails to the log instead of sending them. Used when notifications
/// are disabled.
#[derive(Debug, Default)]
pub struct LogNotifyClient;

#[async_trait]
impl NotifyClient for LogNotifyClient {
    async fn send_email(&self, to: &str, email: &Email) -> Result<()> {
        info!(to = %to, template = email.template(), "Email (not sent)");
        Ok(())
    }

    async fn send_actor_email(&self, to: &str, lpa_uid: &str, email: &Email) -> Result<()> {
        info!(to = %to, lpa_uid = %lpa_uid, template = email.template(), "Email (not sent)");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub lpa_uid: Option<String>,
    pub email: Email,
}

/// Records every email for assertions.
#[derive(Default)]
pub struct MockNotifyClient {
    sent: Mutex<Vec<SentEmail>>,
    fail: Mutex<bool>,
}

impl MockNotifyClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }

    async fn record(&self, to: &str, lpa_uid: Option<&str>, email: &Email) -> Result<()> {
        if *self.fail.lock().await {
            return Err(ClientError::Unavailable("notify disabled".to_string()));
        }

        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            lpa_uid: lpa_uid.map(str::to_string),
            email: email.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotifyClient for MockNotifyClient {
    async fn send_email(&self, to: &str, email: &Email) -> Result<()> {
        self.record(to, None, email).await
    }

    async fn send_actor_email(&self, to: &str, lpa_uid: &str, email: &Email) -> Result<()> {
        self.record(to, Some(lpa_uid), email).await
    }
}
