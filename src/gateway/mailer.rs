//! Best-effort outbound email.
//!
//! The scheduler hands reminder emails to a `Mailer` after its transaction
//! commits, so delivery failures can never roll back scheduling state. The
//! transport is a JSON POST to a configured relay endpoint; without one the
//! mailer degrades to a no-op that logs what it would have sent.
//!
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::gateway::models::UserRow;

/// One outbound reminder email.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ReminderEmail {
    /// Builds the order-reminder message for a user flagged by the sweep.
    pub fn order_reminder(user: &UserRow) -> Self {
        Self {
            to: user.email.clone(),
            subject: "Time to restock your groceries".to_string(),
            body: format!(
                "Hi {}, it has been a while since your last order. \
                 Your predicted basket is ready whenever you are.",
                user.first_name
            ),
        }
    }
}

/// Email transport.
///
#[derive(Clone)]
pub enum Mailer {
    /// POSTs each message as JSON to a relay endpoint.
    Relay { client: reqwest::Client, endpoint: Url },
    /// Logs and drops each message.
    Disabled,
}

impl Mailer {
    /// Builds the transport from configuration: `Relay` when
    /// `EMAIL_RELAY_URL` is set, `Disabled` otherwise.
    pub fn from_config(config: &GatewayConfig) -> Self {
        match &config.email_relay_url {
            Some(endpoint) => Self::relay(endpoint.clone()),
            None => {
                info!("no EMAIL_RELAY_URL configured; reminder emails disabled");
                Mailer::Disabled
            }
        }
    }

    pub fn relay(endpoint: Url) -> Self {
        let client = reqwest::Client::builder()
            // Email delivery gets a short leash; it must never stall a tick.
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Mailer::Relay { client, endpoint }
    }

    /// Sends one message. Failures surface as errors for the caller to log;
    /// callers must not treat them as fatal.
    pub async fn send(&self, email: &ReminderEmail) -> Result<()> {
        match self {
            Mailer::Relay { client, endpoint } => {
                client
                    .post(endpoint.clone())
                    .json(email)
                    .send()
                    .await?
                    .error_for_status()?;
                debug!(to = %email.to, "reminder email relayed");
                Ok(())
            }
            Mailer::Disabled => {
                debug!(to = %email.to, subject = %email.subject, "email transport disabled; dropping");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relay_posts_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/outbound")
            .match_header("content-type", "application/json")
            .with_status(202)
            .create_async()
            .await;

        let endpoint = Url::parse(&format!("{}/outbound", server.url())).unwrap();
        let mailer = Mailer::relay(endpoint);
        mailer
            .send(&ReminderEmail {
                to: "ada@example.com".into(),
                subject: "Time to restock your groceries".into(),
                body: "hello".into(),
            })
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_relay_failure_is_an_error_not_a_panic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/outbound")
            .with_status(500)
            .create_async()
            .await;

        let endpoint = Url::parse(&format!("{}/outbound", server.url())).unwrap();
        let mailer = Mailer::relay(endpoint);
        let result = mailer
            .send(&ReminderEmail {
                to: "ada@example.com".into(),
                subject: "s".into(),
                body: "b".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_disabled_mailer_swallows_messages() {
        let mailer = Mailer::Disabled;
        mailer
            .send(&ReminderEmail {
                to: "ada@example.com".into(),
                subject: "s".into(),
                body: "b".into(),
            })
            .await
            .unwrap();
    }
}
