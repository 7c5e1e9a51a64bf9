#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stored entity types and persistence collaborator traits.
//!
//! The SOS and aggregation services only see the traits defined here.
//! `safeguard_database` provides the `SQLite` and in-memory
//! implementations.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use safeguard_crime_models::{CrimeRecord, NewCrimeRecord};
use safeguard_geography_models::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// International phone number pattern: optional `+`, no leading zero,
/// 2 to 15 digits.
static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid regex"));

/// Errors returned by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be converted into its model type.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Error returned when an emergency contact fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactValidationError {
    /// The name is empty or only whitespace.
    #[error("Name is required")]
    EmptyName,

    /// The phone number does not look like an international number.
    #[error("Invalid phone number format")]
    InvalidPhoneNumber,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub id: String,
    /// Unique email address.
    pub email: String,
    /// Name shown to emergency contacts.
    pub display_name: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to put in alerts: the display name, or the email when none is
    /// set.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// An emergency contact owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Primary key.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Contact's name.
    pub name: String,
    /// Phone number the alert SMS goes to.
    pub phone_number: String,
    /// When the contact was added.
    pub created_at: DateTime<Utc>,
}

/// A validated emergency contact ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmergencyContact {
    name: String,
    phone_number: String,
}

impl NewEmergencyContact {
    /// Validates a contact.
    ///
    /// The name is trimmed and must not be empty. The phone number must
    /// match `^\+?[1-9]\d{1,14}$`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactValidationError`] describing the first failing
    /// field.
    pub fn new(name: &str, phone_number: &str) -> Result<Self, ContactValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContactValidationError::EmptyName);
        }
        if !PHONE_NUMBER.is_match(phone_number) {
            return Err(ContactValidationError::InvalidPhoneNumber);
        }

        Ok(Self {
            name: name.to_string(),
            phone_number: phone_number.to_string(),
        })
    }

    /// The trimmed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The phone number.
    #[must_use]
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
}

/// An immutable entry in a user's SOS log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosEvent {
    /// Primary key.
    pub id: String,
    /// User who triggered the SOS.
    pub user_id: String,
    /// Reported location.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Resolved street address, when the client had one.
    pub address: Option<String>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Storage for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the email is already registered.
    async fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<User, StoreError>;

    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by email.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Storage for opaque session ids mapping to users.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Issues a new session for `user_id` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn issue(&self, user_id: &str) -> Result<String, StoreError>;

    /// Returns the user a session belongs to, if the session exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn resolve(&self, session_id: &str) -> Result<Option<String>, StoreError>;

    /// Removes a session. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn revoke(&self, session_id: &str) -> Result<bool, StoreError>;
}

/// Storage for emergency contacts.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Lists a user's contacts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EmergencyContact>, StoreError>;

    /// Adds a contact for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn add(
        &self,
        user_id: &str,
        contact: NewEmergencyContact,
    ) -> Result<EmergencyContact, StoreError>;

    /// Deletes a contact owned by `user_id`. Returns `false` when no such
    /// contact exists for that user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn delete(&self, user_id: &str, contact_id: &str) -> Result<bool, StoreError>;
}

/// Append-only SOS event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Durably records a new event and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the event could not be persisted.
    async fn append(
        &self,
        user_id: &str,
        location: Coordinate,
        address: Option<String>,
    ) -> Result<SosEvent, StoreError>;

    /// Returns up to `limit` of a user's events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<SosEvent>, StoreError>;
}

/// Read access to the shared crime dataset, plus bulk seeding.
#[async_trait]
pub trait CrimeStore: Send + Sync {
    /// Returns every crime record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the dataset is unavailable.
    async fn query_all(&self) -> Result<Vec<CrimeRecord>, StoreError>;

    /// Returns a superset of the records within `radius_km` of `center`.
    ///
    /// Callers apply the exact distance test themselves. The default is a
    /// full scan.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the dataset is unavailable.
    async fn query_near(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<CrimeRecord>, StoreError> {
        let _ = (center, radius_km);
        self.query_all().await
    }

    /// Inserts records and returns how many were stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    async fn insert_many(&self, records: &[NewCrimeRecord]) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_international_numbers() {
        for phone in ["+14155550123", "14155550123", "+447911123456", "12"] {
            assert!(NewEmergencyContact::new("Ada", phone).is_ok(), "{phone}");
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        for phone in [
            "",
            "+",
            "1",
            "+0123456789",
            "555-0123",
            "+1 415 555 0123",
            "+1234567890123456",
            "abc",
        ] {
            assert_eq!(
                NewEmergencyContact::new("Ada", phone),
                Err(ContactValidationError::InvalidPhoneNumber),
                "{phone}"
            );
        }
    }

    #[test]
    fn trims_and_requires_name() {
        let contact = NewEmergencyContact::new("  Grace Hopper ", "+15551234567").unwrap();
        assert_eq!(contact.name(), "Grace Hopper");
        assert_eq!(contact.phone_number(), "+15551234567");

        assert_eq!(
            NewEmergencyContact::new("   ", "+15551234567"),
            Err(ContactValidationError::EmptyName)
        );
    }

    #[test]
    fn sender_name_falls_back_to_email() {
        let mut user = User {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: Some("Ada".to_string()),
            created_at: Utc::now(),
        };
        assert_eq!(user.sender_name(), "Ada");

        user.display_name = Some("  ".to_string());
        assert_eq!(user.sender_name(), "ada@example.com");

        user.display_name = None;
        assert_eq!(user.sender_name(), "ada@example.com");
    }

    #[test]
    fn sos_event_json_is_flat() {
        let event = SosEvent {
            id: "e1".to_string(),
            user_id: "u1".to_string(),
            location: Coordinate::new(1.5, 2.5).unwrap(),
            address: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["latitude"], 1.5);
        assert_eq!(json["longitude"], 2.5);
        assert_eq!(json["userId"], "u1");
        assert!(json["address"].is_null());
    }
}
