use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

use super::{DocumentStore, StoreError};
use crate::models::{Collection, DocId, TranslatedString, Translations};

/// PostgreSQL-backed store. Each document is a row with its nested data in a
/// JSONB column; connections are checked out of the pool per operation.
///
/// Names and texts have no length limit, so their uniqueness is enforced on
/// an md5 digest and lookups compare the digest and then the exact value.
const ATTACH_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and create the tables if needed.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.create_tables().await?;

        info!(max_connections, "PostgreSQL store ready");
        Ok(store)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                strings JSONB NOT NULL DEFAULT '[]'::jsonb
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create collections table")?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS collections_name_digest ON collections (md5(name))",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create collections name index")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS strings (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                translations JSONB NOT NULL DEFAULT '{}'::jsonb
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create strings table")?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS strings_text_digest ON strings (md5(text))")
            .execute(&self.pool)
            .await
            .context("Failed to create strings text index")?;

        Ok(())
    }
}

fn parse_stored_id(raw: &str) -> Result<DocId, StoreError> {
    DocId::parse(raw).ok_or_else(|| StoreError::Backend(anyhow!("malformed id in store: {}", raw)))
}

fn collection_from_row(row: &PgRow) -> Result<Collection, StoreError> {
    let id: String = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let Json(strings): Json<Vec<TranslatedString>> = row.try_get("strings")?;

    Ok(Collection {
        id: parse_stored_id(&id)?,
        name,
        strings,
    })
}

fn string_from_row(row: &PgRow) -> Result<TranslatedString, StoreError> {
    let id: String = row.try_get("id")?;
    let text: String = row.try_get("text")?;
    let Json(translations): Json<Translations> = row.try_get("translations")?;

    Ok(TranslatedString {
        id: parse_stored_id(&id)?,
        text,
        translations,
    })
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_collection(&self, id: &DocId) -> Result<Collection, StoreError> {
        let row = sqlx::query("SELECT id, name, strings FROM collections WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        collection_from_row(&row)
    }

    async fn find_collection_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Collection>, StoreError> {
        let row = sqlx::query("SELECT id, name, strings FROM collections WHERE md5(name) = md5($1) AND name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(collection_from_row).transpose()
    }

    async fn insert_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO collections (id, name, strings) VALUES ($1, $2, $3)")
            .bind(collection.id.as_str())
            .bind(&collection.name)
            .bind(Json(&collection.strings))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn rename_collection(&self, id: &DocId, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE collections SET name = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn remove_collection(&self, id: &DocId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn attach_string(
        &self,
        collection_id: &DocId,
        string: &TranslatedString,
    ) -> Result<TranslatedString, StoreError> {
        // The text check is re-evaluated under the row lock, so two
        // concurrent attaches of the same text append it once.
        for _ in 0..ATTACH_ATTEMPTS {
            let result = sqlx::query(
                "UPDATE collections
                 SET strings = strings || jsonb_build_array($2::jsonb)
                 WHERE id = $1
                   AND NOT EXISTS (
                       SELECT 1 FROM jsonb_array_elements(strings) AS s(elem)
                       WHERE s.elem->>'text' = $3
                   )",
            )
            .bind(collection_id.as_str())
            .bind(Json(string))
            .bind(&string.text)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 1 {
                return Ok(string.clone());
            }

            let collection = self.find_collection(collection_id).await?;
            if let Some(existing) = collection.find_by_text(&string.text) {
                return Ok(existing.clone());
            }
            // Detached between the two statements; try again.
        }

        Err(StoreError::Backend(anyhow!(
            "string kept changing while attaching to collection {}",
            collection_id
        )))
    }

    async fn detach_string(
        &self,
        collection_id: &DocId,
        string_id: &DocId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE collections
             SET strings = COALESCE(
                 (SELECT jsonb_agg(s.elem ORDER BY s.pos)
                  FROM jsonb_array_elements(strings) WITH ORDINALITY AS s(elem, pos)
                  WHERE s.elem->>'id' <> $2),
                 '[]'::jsonb)
             WHERE id = $1
               AND EXISTS (
                   SELECT 1 FROM jsonb_array_elements(strings) AS s(elem)
                   WHERE s.elem->>'id' = $2
               )",
        )
        .bind(collection_id.as_str())
        .bind(string_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_string_by_text(
        &self,
        text: &str,
    ) -> Result<Option<TranslatedString>, StoreError> {
        let row = sqlx::query("SELECT id, text, translations FROM strings WHERE md5(text) = md5($1) AND text = $1")
            .bind(text)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(string_from_row).transpose()
    }

    async fn insert_string(&self, string: &TranslatedString) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO strings (id, text, translations) VALUES ($1, $2, $3)")
            .bind(string.id.as_str())
            .bind(&string.text)
            .bind(Json(&string.translations))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
