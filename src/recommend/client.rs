//! Asynchronous client for the recommender service.
//!
//! The recommender is best-effort by contract: transient failures get a
//! short bounded retry, and whatever error survives is absorbed by the
//! predictions endpoint into an empty result. Nothing that happens here may
//! surface as a 5xx to the browser.
//!
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use url::Url;

use crate::config::EdgeConfig;
use crate::error::{Result, TimeleError};
use crate::recommend::models::UserPredictions;

/// Creates the retry policy for recommender calls.
///
/// Short initial interval and a tight elapsed-time cap: this call sits on an
/// interactive request path, so the retry budget must stay well under the
/// caller's patience.
fn create_backoff_policy(max_elapsed: Duration) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(250))
        .with_max_interval(Duration::from_secs(2))
        .with_max_elapsed_time(Some(max_elapsed))
        .build()
}

/// An asynchronous client for the recommender (M).
///
#[derive(Clone)]
pub struct RecommenderClient {
    /// A reqwest client instance
    client: reqwest::Client,
    /// Base URL of the recommender service
    base_url: Url,
    /// Retry budget for one logical call
    retry_budget: Duration,
}

impl RecommenderClient {
    /// Constructs a `RecommenderClient` from the edge configuration,
    /// applying the configured recommender timeout per attempt.
    pub fn new(config: &EdgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.recommender_timeout)
            .build()?;
        Ok(Self::from_parts(client, config.ml_service_url.clone()))
    }

    /// Internal function to construct a `RecommenderClient` from parts.
    ///
    pub fn from_parts(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            retry_budget: Duration::from_secs(5),
        }
    }

    /// Overrides the retry budget, mainly for tests.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Fetches ranked predictions for a user via `GET /predict/{user_id}`.
    ///
    /// The identifier is the internal numeric key; the recommender's feature
    /// tables are keyed by the legacy integer ids. Server errors and
    /// transport failures retry within the budget; client errors fail fast.
    /// Scores are clamped into [0, 1] on receipt.
    pub async fn predict(&self, user_id: i64) -> Result<UserPredictions> {
        let url = self
            .base_url
            .join(&format!("/predict/{user_id}"))
            .map_err(|e| TimeleError::Internal(format!("bad recommender path: {e}")))?;

        let policy = create_backoff_policy(self.retry_budget);
        let response = backoff::future::retry(policy, || async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| backoff::Error::transient(TimeleError::from(e)))?;
            let status = response.status();
            if status.is_server_error() {
                return Err(backoff::Error::transient(TimeleError::Internal(format!(
                    "recommender returned {status}"
                ))));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(TimeleError::Internal(format!(
                    "recommender returned {status}"
                ))));
            }
            response
                .json::<UserPredictions>()
                .await
                .map_err(|e| backoff::Error::permanent(TimeleError::from(e)))
        })
        .await?;

        Ok(response.clamped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_client(server: &mockito::ServerGuard) -> RecommenderClient {
        let base_url = Url::parse(&server.url()).unwrap();
        RecommenderClient::from_parts(reqwest::Client::new(), base_url)
            .with_retry_budget(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_predict_parses_ranked_list() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predict/200001")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "user_id": 200001,
                    "predictions": [
                        { "product_id": 2, "score": 0.91 },
                        { "product_id": 5, "score": 0.44 }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server).await;
        let response = client.predict(200_001).await.unwrap();
        assert_eq!(response.predictions.len(), 2);
        assert_eq!(response.predictions[0].product_id, 2);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_the_retry_budget() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predict/200001")
            .with_status(503)
            .expect_at_least(2)
            .create_async()
            .await;

        let client = test_client(&server).await;
        assert!(client.predict(200_001).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_fails_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/predict/200001")
            .with_status(200)
            .with_body("not json")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server).await;
        assert!(client.predict(200_001).await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predict/200001")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "user_id": 200001,
                    "predictions": [{ "product_id": 2, "score": 3.5 }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server).await;
        let response = client.predict(200_001).await.unwrap();
        assert_eq!(response.predictions[0].score, 1.0);
    }
}
