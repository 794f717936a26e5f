//! Injectable time source.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Returns the current time. Stores take one so tests can pin it.
pub type Now = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_now() -> Now {
    Arc::new(Utc::now)
}

/// A clock stuck at `at`.
pub fn fixed(at: DateTime<Utc>) -> Now {
    Arc::new(move || at)
}
