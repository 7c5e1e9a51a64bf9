//! Twilio Programmable Messaging channel.
//!
//! Sends through the `Messages` REST resource with HTTP basic auth. See
//! <https://www.twilio.com/docs/messaging/api/message-resource#create-a-message-resource>

use async_trait::async_trait;
use serde::Deserialize;

use crate::{NotifyError, SendError, SmsChannel};

const DEFAULT_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Credentials and sender number for a Twilio account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    /// Account SID, also the basic-auth username.
    pub account_sid: String,
    /// Auth token, the basic-auth password.
    pub auth_token: String,
    /// Number messages are sent from.
    pub from_number: String,
    /// REST API root, overridable for testing.
    pub api_base: String,
}

impl TwilioConfig {
    /// Reads `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and
    /// `TWILIO_PHONE_NUMBER`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Configuration`] naming the first variable that
    /// is unset or empty.
    pub fn from_env() -> Result<Self, NotifyError> {
        Ok(Self {
            account_sid: required_env("TWILIO_ACCOUNT_SID")?,
            auth_token: required_env("TWILIO_AUTH_TOKEN")?,
            from_number: required_env("TWILIO_PHONE_NUMBER")?,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

fn required_env(name: &str) -> Result<String, NotifyError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NotifyError::Configuration(format!("{name} is not set")))
}

/// Error body returned by Twilio on non-2xx responses.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
    code: Option<i64>,
}

/// [`SmsChannel`] backed by the Twilio REST API.
pub struct TwilioChannel {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioChannel {
    /// Creates a channel with its own HTTP client.
    #[must_use]
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Creates a channel from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Configuration`] if credentials are missing.
    pub fn from_env() -> Result<Self, NotifyError> {
        TwilioConfig::from_env().map(Self::new)
    }
}

#[async_trait]
impl SmsChannel for TwilioChannel {
    async fn send(&self, phone_number: &str, body: &str) -> Result<(), SendError> {
        let resp = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", phone_number),
                ("From", self.config.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        Err(SendError::Rejected {
            status: status.as_u16(),
            message: parse_error_message(&text),
        })
    }
}

fn parse_error_message(text: &str) -> String {
    match serde_json::from_str::<TwilioErrorBody>(text) {
        Ok(TwilioErrorBody {
            message: Some(message),
            code: Some(code),
        }) => format!("{message} (code {code})"),
        Ok(TwilioErrorBody {
            message: Some(message),
            code: None,
        }) => message,
        _ => text.chars().take(200).collect(),
    }
}
