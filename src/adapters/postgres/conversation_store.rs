//! PostgreSQL implementation of ConversationStore.
//!
//! One row per (business unit, person). The context bag is stored as JSONB.
//! Saves lock the row, check the version and upsert inside one transaction.
//! The upsert only overwrites the version it expects, so two first inserts
//! racing past the (empty) row lock still end in a conflict.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::context::ConversationContext;
use crate::domain::conversation::ConversationState;
use crate::domain::foundation::{BusinessUnitId, ConversationKey, PersonId, Timestamp};
use crate::ports::{check_version, ConversationStore, StoreError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to run migrations: {}", e)))
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn load(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT business_unit, person_id, current_state, menu_page, last_menu,
                   last_submenu, search_term, context, turn_count, version,
                   created_at, updated_at
            FROM conversation_states
            WHERE business_unit = $1 AND person_id = $2
            "#,
        )
        .bind(key.business_unit.as_str())
        .bind(key.person_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch conversation"))?;

        row.map(|row| row_to_state(&row)).transpose()
    }

    async fn save(&self, state: &ConversationState) -> Result<(), StoreError> {
        let key = state.key();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;

        let stored: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT version FROM conversation_states
            WHERE business_unit = $1 AND person_id = $2
            FOR UPDATE
            "#,
        )
        .bind(key.business_unit.as_str())
        .bind(key.person_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock conversation"))?;

        check_version(&key, stored.map(|v| v.max(0) as u64), state.version)?;

        let written = sqlx::query(
            r#"
            INSERT INTO conversation_states (
                business_unit, person_id, current_state, menu_page, last_menu,
                last_submenu, search_term, context, turn_count, version,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (business_unit, person_id) DO UPDATE SET
                current_state = EXCLUDED.current_state,
                menu_page = EXCLUDED.menu_page,
                last_menu = EXCLUDED.last_menu,
                last_submenu = EXCLUDED.last_submenu,
                search_term = EXCLUDED.search_term,
                context = EXCLUDED.context,
                turn_count = EXCLUDED.turn_count,
                version = EXCLUDED.version,
                updated_at = EXCLUDED.updated_at
            WHERE conversation_states.version = EXCLUDED.version - 1
            "#,
        )
        .bind(key.business_unit.as_str())
        .bind(key.person_id.as_str())
        .bind(&state.current_state)
        .bind(i32::try_from(state.menu_page).unwrap_or(i32::MAX))
        .bind(&state.last_menu)
        .bind(&state.last_submenu)
        .bind(&state.search_term)
        .bind(Json(&state.context))
        .bind(i64::try_from(state.turn_count).unwrap_or(i64::MAX))
        .bind(i64::try_from(state.version).unwrap_or(i64::MAX))
        .bind(state.created_at.as_datetime())
        .bind(state.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to upsert conversation"))?
        .rows_affected();
        ensure_written(&key, written, state.version)?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM conversation_states WHERE business_unit = $1 AND person_id = $2")
            .bind(key.business_unit.as_str())
            .bind(key.person_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete conversation"))?;
        Ok(())
    }
}

/// A guarded upsert that touched no row lost a race with another writer.
fn ensure_written(key: &ConversationKey, rows: u64, incoming: u64) -> Result<(), StoreError> {
    if rows == 0 {
        return Err(StoreError::Conflict {
            key: key.to_string(),
            expected: incoming.saturating_sub(1),
            found: incoming,
        });
    }
    Ok(())
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{}: {}", context, e))
        }
        other => StoreError::Database(format!("{}: {}", context, other)),
    }
}

fn row_to_state(row: &PgRow) -> Result<ConversationState, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Serialization(e.to_string());
    let invalid = |e: crate::domain::foundation::ValidationError| {
        StoreError::Serialization(e.to_string())
    };

    let business_unit: String = row.try_get("business_unit").map_err(get_err)?;
    let person_id: String = row.try_get("person_id").map_err(get_err)?;
    let menu_page: i32 = row.try_get("menu_page").map_err(get_err)?;
    let context: Json<ConversationContext> = row.try_get("context").map_err(get_err)?;
    let turn_count: i64 = row.try_get("turn_count").map_err(get_err)?;
    let version: i64 = row.try_get("version").map_err(get_err)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(get_err)?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at").map_err(get_err)?;

    Ok(ConversationState {
        person_id: PersonId::new(person_id).map_err(invalid)?,
        business_unit: BusinessUnitId::new(business_unit).map_err(invalid)?,
        current_state: row.try_get("current_state").map_err(get_err)?,
        menu_page: u32::try_from(menu_page).unwrap_or(0),
        last_menu: row.try_get("last_menu").map_err(get_err)?,
        last_submenu: row.try_get("last_submenu").map_err(get_err)?,
        search_term: row.try_get("search_term").map_err(get_err)?,
        context: context.0,
        turn_count: u64::try_from(turn_count).unwrap_or(0),
        version: u64::try_from(version).unwrap_or(0),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
