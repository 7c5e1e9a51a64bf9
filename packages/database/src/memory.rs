//! In-process implementation of every store trait.
//!
//! Used by tests across the workspace. Nothing survives a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use safeguard_crime_models::{CrimeRecord, NewCrimeRecord};
use safeguard_database_models::{
    ContactStore, CrimeStore, EmergencyContact, EventStore, NewEmergencyContact, SessionStore,
    SosEvent, StoreError, User, UserStore,
};
use safeguard_geography_models::Coordinate;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: BTreeMap<String, String>,
    contacts: Vec<EmergencyContact>,
    events: Vec<SosEvent>,
    crimes: Vec<CrimeRecord>,
}

/// Store that keeps everything in memory behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of SOS events recorded across all users.
    pub async fn event_count(&self) -> usize {
        self.tables.read().await.events.len()
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == email) {
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
        tables.users.push(user.clone());
        drop(tables);

        Ok(user)
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn issue(&self, user_id: &str) -> Result<String, StoreError> {
        let session_id = new_id();
        self.tables
            .write()
            .await
            .sessions
            .insert(session_id.clone(), user_id.to_string());
        Ok(session_id)
    }

    async fn resolve(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.tables.read().await.sessions.get(session_id).cloned())
    }

    async fn revoke(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .write()
            .await
            .sessions
            .remove(session_id)
            .is_some())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EmergencyContact>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contacts
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
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
        self.tables.write().await.contacts.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, user_id: &str, contact_id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.contacts.len();
        tables
            .contacts
            .retain(|c| !(c.id == contact_id && c.user_id == user_id));
        Ok(tables.contacts.len() < before)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
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
        self.tables.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<SosEvent>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CrimeStore for MemoryStore {
    async fn query_all(&self) -> Result<Vec<CrimeRecord>, StoreError> {
        Ok(self.tables.read().await.crimes.clone())
    }

    async fn insert_many(&self, records: &[NewCrimeRecord]) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .crimes
            .extend(records.iter().cloned().map(|record| CrimeRecord {
                id: new_id(),
                location: record.location,
                crime_type: record.crime_type,
                severity: record.severity,
                description: record.description,
                reported_at: record.reported_at,
            }));
        Ok(u64::try_from(records.len()).unwrap_or(u64::MAX))
    }
}
