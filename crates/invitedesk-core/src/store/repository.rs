//! Local record store repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::warn;

use super::StoredState;
use crate::Result;
use crate::invitation::InvitationRecord;
use crate::user::StaffUser;

/// Slot holding the invitation queue (JSON array).
const SLOT_QUEUE: &str = "invitation_queue";
/// Slot holding the signed-in user (JSON object).
const SLOT_USER: &str = "current_user";
/// Slot holding the last successful sync instant (RFC 3339 string).
const SLOT_LAST_SYNC: &str = "last_sync";

/// Durable, process-local persistence for the three state slots the rest
/// of the system relies on: invitation queue, current user, last-sync
/// marker.
#[derive(Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS app_state (
                slot TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the queue and current user.
    ///
    /// Fails softly by contract: any read or parse failure is logged and
    /// yields an empty queue and no user, never an error to the caller.
    pub async fn load(&self) -> StoredState {
        match self.try_load().await {
            Ok(state) => state,
            Err(error) => {
                warn!(%error, "failed to load local state; starting empty");
                StoredState::default()
            }
        }
    }

    async fn try_load(&self) -> Result<StoredState> {
        let records = match self.read_slot(SLOT_QUEUE).await? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        let current_user = self
            .read_slot(SLOT_USER)
            .await?
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        Ok(StoredState {
            records,
            current_user,
        })
    }

    /// Saves the queue and current user in one transaction.
    ///
    /// Atomic from the caller's point of view: either both slots are
    /// replaced or the prior state is retained.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails; the
    /// stored state is unchanged in that case.
    pub async fn save(
        &self,
        records: &[InvitationRecord],
        current_user: Option<&StaffUser>,
    ) -> Result<()> {
        let queue_json = serde_json::to_string(records)?;
        let user_json = current_user.map(serde_json::to_string).transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO app_state (slot, value) VALUES (?, ?)
            ON CONFLICT(slot) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(SLOT_QUEUE)
        .bind(queue_json)
        .execute(&mut *tx)
        .await?;

        if let Some(json) = user_json {
            sqlx::query(
                r"
                INSERT INTO app_state (slot, value) VALUES (?, ?)
                ON CONFLICT(slot) DO UPDATE SET value = excluded.value
                ",
            )
            .bind(SLOT_USER)
            .bind(json)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(r"DELETE FROM app_state WHERE slot = ?")
                .bind(SLOT_USER)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// The instant of the last completed sync run, if any.
    pub async fn last_sync(&self) -> Option<String> {
        self.read_slot(SLOT_LAST_SYNC).await.ok().flatten()
    }

    /// Records the instant of a completed sync run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn set_last_sync(&self, timestamp: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO app_state (slot, value) VALUES (?, ?)
            ON CONFLICT(slot) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(SLOT_LAST_SYNC)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn read_slot(&self, slot: &str) -> Result<Option<String>> {
        let row = sqlx::query(r"SELECT value FROM app_state WHERE slot = ?")
            .bind(slot)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    /// Overwrites one slot with raw text. Test hook for corruption cases.
    #[cfg(test)]
    async fn write_slot_raw(&self, slot: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO app_state (slot, value) VALUES (?, ?)
            ON CONFLICT(slot) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(slot)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::invitation::{LocalId, ScreeningSelections, SyncStatus};
    use crate::session::AppointmentType;
    use crate::user::{Role, StaffUser};
    use chrono::DateTime;

    fn record(name: &str) -> InvitationRecord {
        let now: DateTime<chrono::FixedOffset> = "2026-03-01T09:00:00+08:00".parse().unwrap();
        InvitationRecord {
            local_id: LocalId::generate(now),
            server_id: None,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            create_time: now,
            last_modified: now,
            name: name.to_string(),
            phone1: "0912345678".to_string(),
            phone2: String::new(),
            screening: ScreeningSelections::default(),
            notes: String::new(),
            session_info: "20260301-North-Clinic A-primary".to_string(),
            date: "0301".to_string(),
            year: "2026".to_string(),
            region: "North".to_string(),
            location: "Clinic A".to_string(),
            session: "morning".to_string(),
            appointment_type: AppointmentType::Primary,
            inviter: "chen".to_string(),
            invite_date: "0301".to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trips() {
        let repo = StoreRepository::in_memory().await.unwrap();
        let records = vec![record("Lin Mei"), record("Wu Fang")];
        let user = StaffUser::new("chen", Role::Staff);

        repo.save(&records, Some(&user)).await.unwrap();

        let state = repo.load().await;
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.records[0].name, "Lin Mei");
        assert_eq!(state.current_user.unwrap().name, "chen");
    }

    #[tokio::test]
    async fn saving_without_user_clears_the_user_slot() {
        let repo = StoreRepository::in_memory().await.unwrap();
        let user = StaffUser::new("chen", Role::Staff);
        repo.save(&[], Some(&user)).await.unwrap();

        repo.save(&[], None).await.unwrap();

        let state = repo.load().await;
        assert!(state.current_user.is_none());
    }

    #[tokio::test]
    async fn empty_store_loads_empty_state() {
        let repo = StoreRepository::in_memory().await.unwrap();
        let state = repo.load().await;
        assert!(state.records.is_empty());
        assert!(state.current_user.is_none());
    }

    #[tokio::test]
    async fn corrupt_queue_json_loads_as_empty_state() {
        let repo = StoreRepository::in_memory().await.unwrap();
        repo.write_slot_raw(SLOT_QUEUE, "not json at all")
            .await
            .unwrap();

        let state = repo.load().await;
        assert!(state.records.is_empty());
        assert!(state.current_user.is_none());
    }

    #[tokio::test]
    async fn last_sync_round_trips() {
        let repo = StoreRepository::in_memory().await.unwrap();
        assert!(repo.last_sync().await.is_none());

        repo.set_last_sync("2026-03-01T09:15:00+08:00").await.unwrap();
        assert_eq!(
            repo.last_sync().await.as_deref(),
            Some("2026-03-01T09:15:00+08:00")
        );
    }
}
