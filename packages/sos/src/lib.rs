#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! SOS trigger orchestration.
//!
//! A trigger runs in a fixed order:
//!
//! 1. Validate the reported coordinates.
//! 2. Resolve the user and load their emergency contacts. No contacts is a
//!    hard failure and nothing is written.
//! 3. Append the event to the SOS log. This must succeed before any SMS
//!    goes out so the audit record exists whatever happens to delivery.
//! 4. Fan the alert out through [`ContactNotifier`]. Delivery is best
//!    effort: an unconfigured channel or failed sends only lower
//!    `contacts_notified`, they never fail the trigger.

use std::sync::Arc;

use safeguard_database_models::{ContactStore, EventStore, SosEvent, StoreError, UserStore};
use safeguard_geography_models::{Coordinate, InvalidCoordinateError};
use safeguard_notify::{AlertPayload, ContactNotifier, DEFAULT_MAPS_LINK_BASE};
use serde::Serialize;
use thiserror::Error;

/// Message when every contact was reached.
pub const ALL_SENT_MESSAGE: &str = "SOS alerts sent successfully";

/// Message when no contact could be reached.
pub const NONE_SENT_MESSAGE: &str =
    "SOS event logged but SMS alerts could not be sent. Please check SMS configuration.";

/// Errors that abort an SOS trigger.
#[derive(Debug, Error)]
pub enum SosError {
    /// Reported location is missing or out of range.
    #[error("Invalid location: {0}")]
    Validation(#[from] InvalidCoordinateError),

    /// The user has no emergency contacts to alert.
    #[error("No emergency contacts configured. Please add emergency contacts first.")]
    NoContacts,

    /// The triggering user does not exist.
    #[error("User not found")]
    UnknownUser,

    /// A store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a successful trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResult {
    /// The recorded event.
    pub event: SosEvent,
    /// How many contacts the alert reached.
    pub contacts_notified: usize,
    /// Human-readable summary of delivery.
    pub message: String,
}

/// Builds the delivery summary for `notified` of `total` contacts.
#[must_use]
pub fn delivery_message(notified: usize, total: usize) -> String {
    if notified == 0 {
        NONE_SENT_MESSAGE.to_string()
    } else if notified >= total {
        ALL_SENT_MESSAGE.to_string()
    } else {
        format!("SOS alerts sent to {notified} of {total} contacts")
    }
}

/// Orchestrates SOS triggers.
#[derive(Clone)]
pub struct SosEventService {
    users: Arc<dyn UserStore>,
    contacts: Arc<dyn ContactStore>,
    events: Arc<dyn EventStore>,
    notifier: ContactNotifier,
    maps_link_base: String,
}

impl SosEventService {
    /// Creates a service over the given stores and notifier.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
        events: Arc<dyn EventStore>,
        notifier: ContactNotifier,
    ) -> Self {
        Self {
            users,
            contacts,
            events,
            notifier,
            maps_link_base: DEFAULT_MAPS_LINK_BASE.to_string(),
        }
    }

    /// Overrides the map link prefix used in alerts.
    #[must_use]
    pub fn with_maps_link_base(mut self, maps_link_base: impl Into<String>) -> Self {
        self.maps_link_base = maps_link_base.into();
        self
    }

    /// Records an SOS for `user_id` and alerts their contacts.
    ///
    /// # Errors
    ///
    /// * [`SosError::Validation`] if either coordinate is missing or out of
    ///   range. Nothing is read or written.
    /// * [`SosError::UnknownUser`] if the user does not exist.
    /// * [`SosError::NoContacts`] if the user has no contacts. No event is
    ///   recorded.
    /// * [`SosError::Store`] if a store fails before the event is recorded.
    pub async fn trigger(
        &self,
        user_id: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
        address: Option<String>,
    ) -> Result<TriggerResult, SosError> {
        let location = Coordinate::from_parts(latitude, longitude)?;
        let address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(SosError::UnknownUser)?;

        let contacts = self.contacts.list_by_user(user_id).await?;
        if contacts.is_empty() {
            log::info!("SOS from user {user_id} rejected: no emergency contacts");
            return Err(SosError::NoContacts);
        }

        let event = self.events.append(user_id, location, address).await?;
        log::info!(
            "SOS event {} recorded for user {user_id} at {location}",
            event.id
        );

        let alert = AlertPayload {
            sender_name: user.sender_name().to_string(),
            location,
            address: event.address.clone(),
            maps_link_base: self.maps_link_base.clone(),
        };

        let contacts_notified = match self.notifier.notify_all(&contacts, &alert).await {
            Ok(report) => {
                if report.failed() > 0 {
                    log::warn!(
                        "SOS event {}: {} of {} alerts failed",
                        event.id,
                        report.failed(),
                        contacts.len()
                    );
                }
                report.succeeded()
            }
            Err(e) => {
                log::error!("SOS event {}: alerts not sent: {e}", event.id);
                0
            }
        };

        log::info!(
            "SOS event {}: notified {contacts_notified} of {} contacts",
            event.id,
            contacts.len()
        );

        Ok(TriggerResult {
            message: delivery_message(contacts_notified, contacts.len()),
            event,
            contacts_notified,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use async_trait::async_trait;
    use safeguard_database::MemoryStore;
    use safeguard_database_models::NewEmergencyContact;
    use safeguard_notify::{SendError, SmsChannel};

    use super::*;

    struct FailingNumbers(BTreeSet<&'static str>);

    #[async_trait]
    impl SmsChannel for FailingNumbers {
        async fn send(&self, phone_number: &str, _body: &str) -> Result<(), SendError> {
            if self.0.contains(phone_number) {
                Err(SendError::Rejected {
                    status: 400,
                    message: "undeliverable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn service(store: &Arc<MemoryStore>, channel: Option<Arc<dyn SmsChannel>>) -> SosEventService {
        SosEventService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ContactNotifier::new(channel, Duration::from_secs(1)),
        )
    }

    async fn user_with_contacts(store: &MemoryStore, phones: &[&str]) -> String {
        let user = store
            .create_user("ada@example.com", Some("Ada"))
            .await
            .unwrap();
        for (i, phone) in phones.iter().enumerate() {
            store
                .add(
                    &user.id,
                    NewEmergencyContact::new(&format!("Contact {i}"), phone).unwrap(),
                )
                .await
                .unwrap();
        }
        user.id
    }

    #[test]
    fn delivery_messages() {
        assert_eq!(delivery_message(2, 2), ALL_SENT_MESSAGE);
        assert_eq!(delivery_message(1, 3), "SOS alerts sent to 1 of 3 contacts");
        assert_eq!(delivery_message(0, 3), NONE_SENT_MESSAGE);
    }

    #[tokio::test]
    async fn missing_coordinates_fail_before_any_side_effect() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user_with_contacts(&store, &["+15550000001"]).await;
        let svc = service(&store, Some(Arc::new(FailingNumbers(BTreeSet::new()))));

        let result = svc.trigger(&user_id, None, Some(-74.0), None).await;
        assert!(matches!(
            result,
            Err(SosError::Validation(InvalidCoordinateError::MissingLatitude))
        ));

        let result = svc.trigger(&user_id, Some(95.0), Some(-74.0), None).await;
        assert!(matches!(result, Err(SosError::Validation(_))));

        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn zero_contacts_records_nothing() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user_with_contacts(&store, &[]).await;
        let svc = service(&store, Some(Arc::new(FailingNumbers(BTreeSet::new()))));

        let result = svc.trigger(&user_id, Some(40.0), Some(-74.0), None).await;

        assert!(matches!(result, Err(SosError::NoContacts)));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_user_records_nothing() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, None);

        let result = svc.trigger("ghost", Some(40.0), Some(-74.0), None).await;

        assert!(matches!(result, Err(SosError::UnknownUser)));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn unconfigured_sms_still_records_event() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user_with_contacts(&store, &["+15550000001", "+15550000002"]).await;
        let svc = service(&store, None);

        let result = svc
            .trigger(&user_id, Some(40.7128), Some(-74.006), Some("1 Main St".to_string()))
            .await
            .unwrap();

        assert_eq!(result.contacts_notified, 0);
        assert_eq!(result.message, NONE_SENT_MESSAGE);
        assert_eq!(result.event.address.as_deref(), Some("1 Main St"));
        assert_eq!(store.recent(&user_id, 10).await.unwrap(), vec![result.event]);
    }

    #[tokio::test]
    async fn partial_delivery_counts_successes() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user_with_contacts(&store, &["+15550000001", "+15550000002"]).await;
        let channel: Arc<dyn SmsChannel> =
            Arc::new(FailingNumbers(BTreeSet::from(["+15550000002"])));
        let svc = service(&store, Some(channel));

        let result = svc
            .trigger(&user_id, Some(41.8781), Some(-87.6298), None)
            .await
            .unwrap();

        assert_eq!(result.contacts_notified, 1);
        assert_eq!(result.message, "SOS alerts sent to 1 of 2 contacts");
        assert!((result.event.location.latitude - 41.8781).abs() < 1e-9);
        assert!((result.event.location.longitude - -87.6298).abs() < 1e-9);
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn full_delivery() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user_with_contacts(&store, &["+15550000001", "+15550000002"]).await;
        let svc = service(&store, Some(Arc::new(FailingNumbers(BTreeSet::new()))));

        let result = svc
            .trigger(&user_id, Some(0.0), Some(0.0), Some("   ".to_string()))
            .await
            .unwrap();

        assert_eq!(result.contacts_notified, 2);
        assert_eq!(result.message, ALL_SENT_MESSAGE);
        assert!(result.event.address.is_none());
    }
}
