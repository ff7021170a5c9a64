//! SQLite implementation of the ParcelRepository port.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use packtrail_core::sync::ports::ParcelRepository;
use packtrail_domain::{
    PacktrailError, Parcel, ParcelDirection, ParcelStatus, Result, TrackingTimelineEvent,
};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;
use uuid::Uuid;

use crate::errors::InfraError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS parcels (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    tracking_number TEXT,
    order_number TEXT,
    carrier TEXT,
    direction INTEGER NOT NULL DEFAULT 0,
    status INTEGER NOT NULL DEFAULT 0,
    archived INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    expected_delivery TEXT,
    date_added TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    timeline_json TEXT NOT NULL DEFAULT '[]'
)";

const COLUMNS: &str = "id, title, tracking_number, order_number, carrier, direction, status,
    archived, notes, expected_delivery, date_added, last_updated, timeline_json";

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// SQLite implementation of the parcel repository.
///
/// The timeline is persisted as a JSON column; the status as its
/// historical numeric code.
pub struct SqliteParcelRepository {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteParcelRepository {
    /// Open (creating if needed) the parcel database at `path`.
    pub fn open(path: &str, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|e| PacktrailError::from(InfraError::from(e)))?;

        let repo = Self { pool };
        repo.conn()?.execute(SCHEMA, []).map_err(sql_err)?;
        Ok(repo)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| PacktrailError::from(InfraError::from(e)))
    }
}

fn sql_err(err: rusqlite::Error) -> PacktrailError {
    InfraError::from(err).into()
}

/// Raw column values; conversion to the domain type happens outside the
/// rusqlite row closure so parse failures surface as storage errors.
struct ParcelRow {
    id: String,
    title: String,
    tracking_number: Option<String>,
    order_number: Option<String>,
    carrier: Option<String>,
    direction: i64,
    status: i64,
    archived: bool,
    notes: Option<String>,
    expected_delivery: Option<String>,
    date_added: String,
    last_updated: String,
    timeline_json: String,
}

impl ParcelRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            tracking_number: row.get(2)?,
            order_number: row.get(3)?,
            carrier: row.get(4)?,
            direction: row.get(5)?,
            status: row.get(6)?,
            archived: row.get(7)?,
            notes: row.get(8)?,
            expected_delivery: row.get(9)?,
            date_added: row.get(10)?,
            last_updated: row.get(11)?,
            timeline_json: row.get(12)?,
        })
    }

    fn into_parcel(self) -> Result<Parcel> {
        let timeline: Vec<TrackingTimelineEvent> =
            serde_json::from_str(&self.timeline_json)
                .map_err(|e| PacktrailError::Storage(format!("corrupt timeline column: {e}")))?;

        let expected_delivery = match self.expected_delivery {
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, DATE_ONLY_FORMAT)
                    .map_err(|e| PacktrailError::Storage(format!("bad expected_delivery: {e}")))?,
            ),
            None => None,
        };

        Ok(Parcel {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| PacktrailError::Storage(format!("bad parcel id: {e}")))?,
            title: self.title,
            tracking_number: self.tracking_number,
            order_number: self.order_number,
            carrier: self.carrier,
            direction: ParcelDirection::from_code(self.direction),
            status: ParcelStatus::from_code(self.status),
            archived: self.archived,
            notes: self.notes,
            expected_delivery,
            date_added: parse_timestamp(&self.date_added)?,
            last_updated: parse_timestamp(&self.last_updated)?,
            timeline,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PacktrailError::Storage(format!("bad timestamp column: {e}")))
}

fn encode_timeline(timeline: &[TrackingTimelineEvent]) -> Result<String> {
    serde_json::to_string(timeline)
        .map_err(|e| PacktrailError::Storage(format!("timeline encode failed: {e}")))
}

#[async_trait]
impl ParcelRepository for SqliteParcelRepository {
    async fn insert(&self, parcel: &Parcel) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO parcels (id, title, tracking_number, order_number, carrier, direction,
                status, archived, notes, expected_delivery, date_added, last_updated, timeline_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                parcel.id.to_string(),
                parcel.title,
                parcel.tracking_number,
                parcel.order_number,
                parcel.carrier,
                parcel.direction.code(),
                parcel.status.code(),
                parcel.archived,
                parcel.notes,
                parcel.expected_delivery.map(|d| d.format(DATE_ONLY_FORMAT).to_string()),
                parcel.date_added.to_rfc3339(),
                parcel.last_updated.to_rfc3339(),
                encode_timeline(&parcel.timeline)?,
            ],
        )
        .map_err(sql_err)?;

        debug!(parcel = %parcel.id, "parcel inserted");
        Ok(())
    }

    async fn fetch_active(&self) -> Result<Vec<Parcel>> {
        let conn = self.conn()?;
        let mut statement = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM parcels
                 WHERE archived = 0 AND status NOT IN (?1, ?2)
                 ORDER BY date_added"
            ))
            .map_err(sql_err)?;

        let rows = statement
            .query_map(
                params![ParcelStatus::Delivered.code(), ParcelStatus::Exception.code()],
                ParcelRow::from_row,
            )
            .map_err(sql_err)?;

        let mut parcels = Vec::new();
        for row in rows {
            parcels.push(row.map_err(sql_err)?.into_parcel()?);
        }
        Ok(parcels)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Parcel>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM parcels WHERE id = ?1"),
                params![id.to_string()],
                ParcelRow::from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(sql_err(other)),
            })?;

        row.map(ParcelRow::into_parcel).transpose()
    }

    async fn update_tracking(
        &self,
        id: Uuid,
        status: ParcelStatus,
        timeline: &[TrackingTimelineEvent],
        expected_delivery: Option<NaiveDate>,
        last_updated: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE parcels
                 SET status = ?2, timeline_json = ?3, expected_delivery = ?4, last_updated = ?5
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    status.code(),
                    encode_timeline(timeline)?,
                    expected_delivery.map(|d| d.format(DATE_ONLY_FORMAT).to_string()),
                    last_updated.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;

        if changed == 0 {
            return Err(PacktrailError::NotFound(format!("parcel {id} not found")));
        }
        debug!(parcel = %id, ?status, events = timeline.len(), "tracking state updated");
        Ok(())
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE parcels SET archived = ?2, last_updated = ?3 WHERE id = ?1",
                params![id.to_string(), archived, Utc::now().to_rfc3339()],
            )
            .map_err(sql_err)?;

        if changed == 0 {
            return Err(PacktrailError::NotFound(format!("parcel {id} not found")));
        }
        Ok(())
    }
}
