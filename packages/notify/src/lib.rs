#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Concurrent SMS fan-out of SOS alerts to emergency contacts.
//!
//! [`ContactNotifier::notify_all`] sends one message per contact through an
//! [`SmsChannel`], all at once, and waits for every send to settle. A
//! failed or timed-out send is recorded in the [`NotificationReport`] and
//! never affects the other recipients. The only error the notifier itself
//! returns is [`NotifyError::Configuration`], when there is no channel to
//! send through at all.

pub mod twilio;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use safeguard_database_models::EmergencyContact;
use safeguard_geography_models::Coordinate;
use thiserror::Error;

/// Default map link prefix. Coordinates are appended as `?q=lat,lng`.
pub const DEFAULT_MAPS_LINK_BASE: &str = "https://www.google.com/maps";

/// Failure of a single SMS send.
#[derive(Debug, Error)]
pub enum SendError {
    /// HTTP request to the SMS provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider accepted the request but refused to deliver.
    #[error("Provider rejected message ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Provider's error description.
        message: String,
    },

    /// The send did not settle within the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors that prevent any send from being attempted.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No SMS channel is configured (e.g. missing credentials).
    #[error("SMS channel not configured: {0}")]
    Configuration(String),
}

/// An external channel that delivers a text message to one phone number.
#[async_trait]
pub trait SmsChannel: Send + Sync {
    /// Sends `body` to `phone_number`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the message could not be handed to the
    /// provider.
    async fn send(&self, phone_number: &str, body: &str) -> Result<(), SendError>;
}

/// What an SOS alert says and where it points.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    /// Name of the person in distress.
    pub sender_name: String,
    /// Reported location.
    pub location: Coordinate,
    /// Resolved street address, if known.
    pub address: Option<String>,
    /// Map link prefix, see [`DEFAULT_MAPS_LINK_BASE`].
    pub maps_link_base: String,
}

impl AlertPayload {
    /// Link to the raw coordinates on a map.
    #[must_use]
    pub fn map_link(&self) -> String {
        format!(
            "{}?q={},{}",
            self.maps_link_base, self.location.latitude, self.location.longitude
        )
    }

    /// Full SMS text.
    #[must_use]
    pub fn message(&self) -> String {
        let location_text = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map_or_else(|| self.location.to_string(), str::to_string);

        format!(
            "EMERGENCY ALERT!\n\n\
             {} has pressed the SOS button and may be in danger!\n\n\
             Location: {location_text}\n\n\
             View on map: {}\n\n\
             Please check on them immediately!\n\n\
             - SafeGuard Safety Alert",
            self.sender_name,
            self.map_link(),
        )
    }
}

/// Result of sending to one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOutcome {
    /// Contact the send was addressed to.
    pub contact_id: String,
    /// Contact's name, for logging.
    pub contact_name: String,
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

/// Per-contact outcomes of one fan-out, in contact order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationReport {
    /// One entry per contact.
    pub outcomes: Vec<NotificationOutcome>,
}

impl NotificationReport {
    /// Number of contacts that were reached.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Number of contacts that could not be reached.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether the report has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Fans an alert out to every contact concurrently.
#[derive(Clone)]
pub struct ContactNotifier {
    channel: Option<Arc<dyn SmsChannel>>,
    timeout: Duration,
}

impl ContactNotifier {
    /// Creates a notifier. `channel` is `None` when SMS is unconfigured;
    /// every send is bounded by `timeout`.
    #[must_use]
    pub fn new(channel: Option<Arc<dyn SmsChannel>>, timeout: Duration) -> Self {
        Self { channel, timeout }
    }

    /// Whether an SMS channel is available.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.channel.is_some()
    }

    /// Sends `alert` to every contact and collects the outcomes.
    ///
    /// An empty contact list returns an empty report without touching the
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Configuration`] if there are contacts but no
    /// channel. Individual send failures are reported, not returned.
    pub async fn notify_all(
        &self,
        contacts: &[EmergencyContact],
        alert: &AlertPayload,
    ) -> Result<NotificationReport, NotifyError> {
        if contacts.is_empty() {
            return Ok(NotificationReport::default());
        }

        let channel = self.channel.as_ref().ok_or_else(|| {
            NotifyError::Configuration("no SMS credentials configured".to_string())
        })?;

        let body = alert.message();

        let sends = contacts.iter().map(|contact| {
            let channel = Arc::clone(channel);
            let body = body.as_str();
            async move {
                let result =
                    match tokio::time::timeout(self.timeout, channel.send(&contact.phone_number, body))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(SendError::Timeout(self.timeout)),
                    };

                match result {
                    Ok(()) => {
                        log::debug!("SOS alert sent to contact {}", contact.id);
                        NotificationOutcome {
                            contact_id: contact.id.clone(),
                            contact_name: contact.name.clone(),
                            success: true,
                            error: None,
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to send SOS alert to contact {}: {e}", contact.id);
                        NotificationOutcome {
                            contact_id: contact.id.clone(),
                            contact_name: contact.name.clone(),
                            success: false,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        });

        let outcomes = futures::future::join_all(sends).await;

        Ok(NotificationReport { outcomes })
    }
}
