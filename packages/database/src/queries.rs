//! `SQLite`-backed implementation of every store trait.
//!
//! All ids are UUID v4 strings and every timestamp column holds
//! [`crate::format_timestamp`] text.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use moosicbox_json_utils::database::ToValue as _;
use safeguard_crime_models::{CrimeRecord, CrimeSeverity, NewCrimeRecord};
use safeguard_database_models::{
    ContactStore, CrimeStore, EmergencyContact, EventStore, NewEmergencyContact, SessionStore,
    SosEvent, StoreError, User, UserStore,
};
use safeguard_geography_models::{BoundingBox, Coordinate};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{format_timestamp, parse_timestamp};

/// Store backed by a `switchy_database` connection.
#[derive(Clone)]
pub struct DbStore {
    db: Arc<dyn Database>,
}

impl DbStore {
    /// Wraps an open database. The schema must already exist (see
    /// [`crate::open_db`]).
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Opens the database at `path`, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened.
    pub async fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let db = crate::open_db(path).await?;
        Ok(Self::new(Arc::from(db)))
    }

    /// Returns the number of stored crime records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn count_crimes(&self) -> Result<u64, StoreError> {
        let rows = self
            .db
            .query_raw_params("SELECT COUNT(*) as cnt FROM crime_data", &[])
            .await
            .map_err(db_error)?;

        let count: i64 = rows.first().map_or(0, |r| r.to_value("cnt").unwrap_or(0));

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn db_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

fn column<E: std::fmt::Display>(name: &str) -> impl FnOnce(E) -> StoreError + '_ {
    move |e| StoreError::Conversion {
        message: format!("Failed to read column '{name}': {e}"),
    }
}

fn string(value: &str) -> DatabaseValue {
    DatabaseValue::String(value.to_string())
}

fn opt_string(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |v| DatabaseValue::String(v.to_string()))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn row_to_user(row: &Row) -> Result<User, StoreError> {
    let created_at: String = row.to_value("created_at").map_err(column("created_at"))?;
    Ok(User {
        id: row.to_value("id").map_err(column("id"))?,
        email: row.to_value("email").map_err(column("email"))?,
        display_name: row.to_value("display_name").unwrap_or(None),
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_contact(row: &Row) -> Result<EmergencyContact, StoreError> {
    let created_at: String = row.to_value("created_at").map_err(column("created_at"))?;
    Ok(EmergencyContact {
        id: row.to_value("id").map_err(column("id"))?,
        user_id: row.to_value("user_id").map_err(column("user_id"))?,
        name: row.to_value("name").map_err(column("name"))?,
        phone_number: row.to_value("phone_number").map_err(column("phone_number"))?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_location(row: &Row) -> Result<Coordinate, StoreError> {
    let latitude: f64 = row.to_value("latitude").map_err(column("latitude"))?;
    let longitude: f64 = row.to_value("longitude").map_err(column("longitude"))?;
    Coordinate::new(latitude, longitude).map_err(|e| StoreError::Conversion {
        message: e.to_string(),
    })
}

fn row_to_event(row: &Row) -> Result<SosEvent, StoreError> {
    let created_at: String = row.to_value("created_at").map_err(column("created_at"))?;
    Ok(SosEvent {
        id: row.to_value("id").map_err(column("id"))?,
        user_id: row.to_value("user_id").map_err(column("user_id"))?,
        location: row_to_location(row)?,
        address: row.to_value("address").unwrap_or(None),
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_crime(row: &Row) -> Result<CrimeRecord, StoreError> {
    let severity: i64 = row.to_value("severity").map_err(column("severity"))?;
    let severity = u8::try_from(severity)
        .ok()
        .and_then(|v| CrimeSeverity::from_value(v).ok())
        .ok_or_else(|| StoreError::Conversion {
            message: format!("Invalid severity {severity}"),
        })?;
    let reported_at: String = row.to_value("reported_at").map_err(column("reported_at"))?;

    Ok(CrimeRecord {
        id: row.to_value("id").map_err(column("id"))?,
        location: row_to_location(row)?,
        crime_type: row.to_value("crime_type").map_err(column("crime_type"))?,
        severity,
        description: row.to_value("description").unwrap_or(None),
        reported_at: parse_timestamp(&reported_at)?,
    })
}

const CRIME_COLUMNS: &str = "id, latitude, longitude, crime_type, severity, description, reported_at";

#[async_trait]
impl UserStore for DbStore {
    async fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<User, StoreError> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "A user with email '{email}' already exists"
            )));
        }

        let user = User {
            id: new_id(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            created_at: Utc::now(),
        };

        self.db
            .exec_raw_params(
                "INSERT INTO users (id, email, display_name, created_at)
                 VALUES ($1, $2, $3, $4)",
                &[
                    string(&user.id),
                    string(&user.email),
                    opt_string(user.display_name.as_deref()),
                    DatabaseValue::String(format_timestamp(user.created_at)),
                ],
            )
            .await
            .map_err(db_error)?;

        Ok(user)
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
                &[string(user_id)],
            )
            .await
            .map_err(db_error)?;

        rows.first().map(row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT id, email, display_name, created_at FROM users WHERE email = $1",
                &[string(email)],
            )
            .await
            .map_err(db_error)?;

        rows.first().map(row_to_user).transpose()
    }
}

#[async_trait]
impl SessionStore for DbStore {
    async fn issue(&self, user_id: &str) -> Result<String, StoreError> {
        let session_id = new_id();

        self.db
            .exec_raw_params(
                "INSERT INTO sessions (id, user_id, created_at) VALUES ($1, $2, $3)",
                &[
                    string(&session_id),
                    string(user_id),
                    DatabaseValue::String(format_timestamp(Utc::now())),
                ],
            )
            .await
            .map_err(db_error)?;

        Ok(session_id)
    }

    async fn resolve(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT user_id FROM sessions WHERE id = $1",
                &[string(session_id)],
            )
            .await
            .map_err(db_error)?;

        rows.first()
            .map(|row| row.to_value("user_id").map_err(column("user_id")))
            .transpose()
    }

    async fn revoke(&self, session_id: &str) -> Result<bool, StoreError> {
        let deleted = self
            .db
            .exec_raw_params("DELETE FROM sessions WHERE id = $1", &[string(session_id)])
            .await
            .map_err(db_error)?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl ContactStore for DbStore {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EmergencyContact>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT id, user_id, name, phone_number, created_at
                 FROM emergency_contacts
                 WHERE user_id = $1
                 ORDER BY created_at, rowid",
                &[string(user_id)],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_contact).collect()
    }

    async fn add(
        &self,
        user_id: &str,
        contact: NewEmergencyContact,
    ) -> Result<EmergencyContact, StoreError> {
        let stored = EmergencyContact {
            id: new_id(),
            user_id: user_id.to_string(),
            name: contact.name().to_string(),
            phone_number: contact.phone_number().to_string(),
            created_at: Utc::now(),
        };

        self.db
            .exec_raw_params(
                "INSERT INTO emergency_contacts (id, user_id, name, phone_number, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    string(&stored.id),
                    string(&stored.user_id),
                    string(&stored.name),
                    string(&stored.phone_number),
                    DatabaseValue::String(format_timestamp(stored.created_at)),
                ],
            )
            .await
            .map_err(db_error)?;

        Ok(stored)
    }

    async fn delete(&self, user_id: &str, contact_id: &str) -> Result<bool, StoreError> {
        let deleted = self
            .db
            .exec_raw_params(
                "DELETE FROM emergency_contacts WHERE id = $1 AND user_id = $2",
                &[string(contact_id), string(user_id)],
            )
            .await
            .map_err(db_error)?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl EventStore for DbStore {
    async fn append(
        &self,
        user_id: &str,
        location: Coordinate,
        address: Option<String>,
    ) -> Result<SosEvent, StoreError> {
        let event = SosEvent {
            id: new_id(),
            user_id: user_id.to_string(),
            location,
            address,
            created_at: Utc::now(),
        };

        self.db
            .exec_raw_params(
                "INSERT INTO sos_events (id, user_id, latitude, longitude, address, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    string(&event.id),
                    string(&event.user_id),
                    DatabaseValue::Real64(location.latitude),
                    DatabaseValue::Real64(location.longitude),
                    opt_string(event.address.as_deref()),
                    DatabaseValue::String(format_timestamp(event.created_at)),
                ],
            )
            .await
            .map_err(db_error)?;

        Ok(event)
    }

    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<SosEvent>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT id, user_id, latitude, longitude, address, created_at
                 FROM sos_events
                 WHERE user_id = $1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT $2",
                &[string(user_id), DatabaseValue::Int64(i64::from(limit))],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_event).collect()
    }
}

#[async_trait]
impl CrimeStore for DbStore {
    async fn query_all(&self) -> Result<Vec<CrimeRecord>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                &format!("SELECT {CRIME_COLUMNS} FROM crime_data ORDER BY rowid"),
                &[],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_crime).collect()
    }

    async fn query_near(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<CrimeRecord>, StoreError> {
        let Some(bbox) = BoundingBox::around(center, radius_km) else {
            log::debug!("Bounding box around {center} is degenerate, scanning all crimes");
            return self.query_all().await;
        };

        let rows = self
            .db
            .query_raw_params(
                &format!(
                    "SELECT {CRIME_COLUMNS} FROM crime_data
                     WHERE latitude BETWEEN $1 AND $2
                       AND longitude BETWEEN $3 AND $4
                     ORDER BY rowid"
                ),
                &[
                    DatabaseValue::Real64(bbox.south),
                    DatabaseValue::Real64(bbox.north),
                    DatabaseValue::Real64(bbox.west),
                    DatabaseValue::Real64(bbox.east),
                ],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_crime).collect()
    }

    async fn insert_many(&self, records: &[NewCrimeRecord]) -> Result<u64, StoreError> {
        let txn = self.db.begin_transaction().await.map_err(db_error)?;

        let inserted = match insert_crime_rows(txn.as_ref(), records).await {
            Ok(inserted) => inserted,
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    log::warn!("Failed to roll back crime insert: {rollback}");
                }
                return Err(e);
            }
        };

        txn.commit().await.map_err(db_error)?;

        log::debug!("Inserted {inserted} crime records");
        Ok(inserted)
    }
}

async fn insert_crime_rows(
    db: &dyn Database,
    records: &[NewCrimeRecord],
) -> Result<u64, StoreError> {
    let mut inserted = 0;

    for record in records {
        inserted += db
            .exec_raw_params(
                "INSERT INTO crime_data
                 (id, latitude, longitude, crime_type, severity, description, reported_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    DatabaseValue::String(new_id()),
                    DatabaseValue::Real64(record.location.latitude),
                    DatabaseValue::Real64(record.location.longitude),
                    string(&record.crime_type),
                    DatabaseValue::Int64(i64::from(record.severity.value())),
                    opt_string(record.description.as_deref()),
                    DatabaseValue::String(format_timestamp(record.reported_at)),
                ],
            )
            .await
            .map_err(db_error)?;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> DbStore {
        let path = std::env::temp_dir().join(format!("safeguard-test-{}.db", new_id()));
        DbStore::open(&path).await.unwrap()
    }

    fn crime(lat: f64, lng: f64, crime_type: &str) -> NewCrimeRecord {
        NewCrimeRecord {
            location: Coordinate::new(lat, lng).unwrap(),
            crime_type: crime_type.to_string(),
            severity: CrimeSeverity::Moderate,
            description: Some("test".to_string()),
            reported_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn users_are_unique_by_email() {
        let store = temp_store().await;
        let user = store
            .create_user("ada@example.com", Some("Ada"))
            .await
            .unwrap();

        let found = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(found.display_name.as_deref(), Some("Ada"));

        assert!(matches!(
            store.create_user("ada@example.com", None).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.find_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sessions_issue_resolve_revoke() {
        let store = temp_store().await;
        let user = store.create_user("s@example.com", None).await.unwrap();

        let session = store.issue(&user.id).await.unwrap();
        assert_eq!(store.resolve(&session).await.unwrap(), Some(user.id));

        assert!(store.revoke(&session).await.unwrap());
        assert!(!store.revoke(&session).await.unwrap());
        assert_eq!(store.resolve(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn contacts_are_scoped_to_their_owner() {
        let store = temp_store().await;
        let owner = store.create_user("o@example.com", None).await.unwrap();
        let other = store.create_user("x@example.com", None).await.unwrap();

        let first = store
            .add(
                &owner.id,
                NewEmergencyContact::new("First", "+15550000001").unwrap(),
            )
            .await
            .unwrap();
        store
            .add(
                &owner.id,
                NewEmergencyContact::new("Second", "+15550000002").unwrap(),
            )
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_by_user(&owner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert!(store.list_by_user(&other.id).await.unwrap().is_empty());

        assert!(!store.delete(&other.id, &first.id).await.unwrap());
        assert!(store.delete(&owner.id, &first.id).await.unwrap());
        assert_eq!(store.list_by_user(&owner.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recent_events_newest_first() {
        let store = temp_store().await;
        let user = store.create_user("e@example.com", None).await.unwrap();

        for i in 0..3 {
            store
                .append(
                    &user.id,
                    Coordinate::new(f64::from(i), 0.0).unwrap(),
                    (i == 2).then(|| "Main St".to_string()),
                )
                .await
                .unwrap();
        }

        let events = store.recent(&user.id, 2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!((events[0].location.latitude - 2.0).abs() < f64::EPSILON);
        assert_eq!(events[0].address.as_deref(), Some("Main St"));
        assert!((events[1].location.latitude - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn query_near_prefilters_by_bounding_box() {
        let store = temp_store().await;
        let inserted = store
            .insert_many(&[
                crime(40.7128, -74.006, "theft"),
                crime(40.72, -74.0, "assault"),
                crime(34.0522, -118.2437, "robbery"),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(store.count_crimes().await.unwrap(), 3);

        let center = Coordinate::new(40.7128, -74.006).unwrap();
        let near = store.query_near(center, 5.0).await.unwrap();
        let types: Vec<&str> = near.iter().map(|c| c.crime_type.as_str()).collect();
        assert_eq!(types, vec!["theft", "assault"]);

        assert_eq!(store.query_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_crime_insert_writes_nothing() {
        let store = temp_store().await;
        store
            .db
            .exec_raw(
                "CREATE TRIGGER reject_arson BEFORE INSERT ON crime_data
                 WHEN NEW.crime_type = 'arson'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            )
            .await
            .unwrap();

        let records = vec![
            crime(40.7128, -74.006, "theft"),
            crime(40.7130, -74.005, "assault"),
            crime(40.7140, -74.004, "arson"),
        ];

        assert!(store.insert_many(&records).await.is_err());
        assert_eq!(store.count_crimes().await.unwrap(), 0);

        assert_eq!(store.insert_many(&records[..2]).await.unwrap(), 2);
        assert_eq!(store.count_crimes().await.unwrap(), 2);
    }
}
