//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Records table schema. One row per `(pk, sk)` item.
#[derive(Iden)]
pub enum Records {
    Table,
    #[iden = "pk"]
    Pk,
    #[iden = "sk"]
    Sk,
    #[iden = "data"]
    Data,
}

/// SQL for creating the records table.
///
/// `idx_records_actor_index` serves reverse lookups by sort key.
pub const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    pk TEXT NOT NULL,
    sk TEXT NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (pk, sk)
);

CREATE INDEX IF NOT EXISTS idx_records_actor_index ON records(sk, data);
"#;
