//! SQLite RecordStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::storage::schema::{Records, CREATE_RECORDS_TABLE};
use crate::storage::{
    check_index, single_match, Item, Keys, RecordStore, Result, StorageError,
};

/// SQLite implementation of RecordStore.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Create a new SQLite record store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_RECORDS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    fn to_item(row: &SqliteRow) -> Item {
        Item {
            pk: row.get("pk"),
            sk: row.get("sk"),
            data: row.get("data"),
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, keys: &Keys) -> Result<Item> {
        let (sql, values) = Query::select()
            .columns([Records::Pk, Records::Sk, Records::Data])
            .from(Records::Table)
            .and_where(Expr::col(Records::Pk).eq(keys.pk.as_str()))
            .and_where(Expr::col(Records::Sk).eq(keys.sk.as_str()))
            .build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(Self::to_item)
            .ok_or_else(|| StorageError::not_found(keys))
    }

    async fn create(&self, item: Item) -> Result<()> {
        let (sql, values) = Query::insert()
            .into_table(Records::Table)
            .columns([Records::Pk, Records::Sk, Records::Data])
            .values_panic([
                item.pk.clone().into(),
                item.sk.clone().into(),
                item.data.into(),
            ])
            .build_sqlx(SqliteQueryBuilder);

        match sqlx::query_with(&sql, values).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(pk = %item.pk, sk = %item.sk, "create rejected, item exists");
                Err(StorageError::AlreadyExists {
                    pk: item.pk,
                    sk: item.sk,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, item: Item) -> Result<()> {
        let (sql, values) = Query::insert()
            .into_table(Records::Table)
            .columns([Records::Pk, Records::Sk, Records::Data])
            .values_panic([item.pk.into(), item.sk.into(), item.data.into()])
            .on_conflict(
                OnConflict::columns([Records::Pk, Records::Sk])
                    .update_column(Records::Data)
                    .to_owned(),
            )
            .build_sqlx(SqliteQueryBuilder);

        sqlx::query_with(&sql, values).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, keys: &Keys) -> Result<()> {
        let (sql, values) = Query::delete()
            .from_table(Records::Table)
            .and_where(Expr::col(Records::Pk).eq(keys.pk.as_str()))
            .and_where(Expr::col(Records::Sk).eq(keys.sk.as_str()))
            .build_sqlx(SqliteQueryBuilder);

        sqlx::query_with(&sql, values).execute(&self.pool).await?;
        Ok(())
    }

    async fn get_one_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Item> {
        let items = self.get_all_by_partial_sk(pk, sk_prefix).await?;
        single_match(pk, sk_prefix, items)
    }

    async fn get_all_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        // Sort key prefixes contain `_`, a LIKE wildcard, so match in Rust.
        let (sql, values) = Query::select()
            .columns([Records::Pk, Records::Sk, Records::Data])
            .from(Records::Table)
            .and_where(Expr::col(Records::Pk).eq(pk))
            .order_by(Records::Sk, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(Self::to_item)
            .filter(|item| item.sk.starts_with(sk_prefix))
            .collect())
    }

    async fn get_all_by_gsi(&self, index: &str, sk: &str) -> Result<Vec<Item>> {
        check_index(index)?;

        let (sql, values) = Query::select()
            .columns([Records::Pk, Records::Sk, Records::Data])
            .from(Records::Table)
            .and_where(Expr::col(Records::Sk).eq(sk))
            .order_by(Records::Data, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::to_item).collect())
    }

    async fn get_all_by_keys(&self, keys: &[Keys]) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(keys.len());
        for k in keys {
            match self.get(k).await {
                Ok(item) => items.push(item),
                Err(StorageError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteRecordStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteRecordStore::new(pool);
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_conflict_maps_to_already_exists() {
        let store = store().await;
        let item = Item::new(Keys::new("LPA#1", "#ATTORNEY#a"), "{}");

        store.create(item.clone()).await.unwrap();
        let err = store.create(item).await.unwrap_err();

        assert!(err.is_already_exists(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_partial_sk_treats_underscore_literally() {
        let store = store().await;
        store
            .put(Item::new(Keys::new("LPA#1", "#CERTIFICATEXPROVIDER#a"), "{}"))
            .await
            .unwrap();

        let err = store
            .get_one_by_partial_sk("LPA#1", "#CERTIFICATE_PROVIDER#")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
