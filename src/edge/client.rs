//! Asynchronous client for the data gateway.
//!
//! The edge talks to the gateway exclusively through this client; handlers
//! never build raw requests. API groups (`users()`, `carts()`, `orders()`,
//! `products()`) borrow the client and expose the internal contract as typed
//! methods.
//!
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::EdgeConfig;
use crate::edge::api::{Carts, Orders, Products, Users};
use crate::error::{map_deserialization_error, ErrorKind, Result, ServiceError, TimeleError};
use crate::gateway::models::GatewayResponse;

/// An asynchronous `GatewayClient` to make HTTP requests with.
///
/// `GatewayClient` is a wrapper over `reqwest::Client` which holds a
/// connection pool internally. It is advisable to create one and **reuse**
/// it. You do **not** have to wrap `GatewayClient` in an [`Rc`] or [`Arc`] to
/// **reuse** it because the `reqwest::Client` used internally already uses an
/// [`Arc`].
///
/// [`Rc`]: std::rc::Rc
/// [`Arc`]: std::sync::Arc
#[derive(Clone)]
pub struct GatewayClient {
    /// A reqwest client instance
    client: reqwest::Client,
    /// Base URL of the data gateway
    base_url: Url,
}

impl GatewayClient {
    /// Constructs a `GatewayClient` from the edge configuration, applying the
    /// configured gateway timeout to every call.
    pub fn new(config: &EdgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.gateway_timeout)
            .build()?;
        Ok(Self::from_parts(client, config.db_service_url.clone()))
    }

    /// Internal function to construct a `GatewayClient` from parts.
    ///
    pub fn from_parts(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Identity API group: `/users/`.
    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Cart API group: `/carts/`.
    pub fn carts(&self) -> Carts<'_> {
        Carts::new(self)
    }

    /// Order API group: `/orders/`.
    pub fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    /// Catalog API group: `/products/`.
    pub fn products(&self) -> Products<'_> {
        Products::new(self)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| TimeleError::Internal(format!("bad gateway path `{path}`: {e}")))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)?).send().await?;
        Self::unwrap_envelope(response, path).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.client.post(self.url(path)?).json(body).send().await?;
        Self::unwrap_envelope(response, path).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.post(self.url(path)?).send().await?;
        Self::unwrap_envelope(response, path).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.client.put(self.url(path)?).json(body).send().await?;
        Self::unwrap_envelope(response, path).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.delete(self.url(path)?).send().await?;
        Self::unwrap_envelope(response, path).await
    }

    pub(crate) async fn delete_with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .delete(self.url(path)?)
            .json(body)
            .send()
            .await?;
        Self::unwrap_envelope(response, path).await
    }

    /// Parses a gateway response envelope, re-typing carried errors.
    ///
    /// The gateway serializes its `ErrorKind` by wire name; reconstructing it
    /// here preserves the error context across the service hop, so the edge
    /// maps status codes from the kind rather than from HTTP heuristics.
    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let body = response.text().await?;
        let envelope: GatewayResponse<T> =
            serde_json::from_str(&body).map_err(|e| map_deserialization_error(e, &body))?;
        if envelope.status == "success" {
            envelope.data.ok_or_else(|| {
                TimeleError::Internal(format!("gateway success without data at `{endpoint}`"))
            })
        } else {
            let kind = envelope
                .error_kind
                .as_deref()
                .map(ErrorKind::from)
                .unwrap_or(ErrorKind::Internal);
            let detail = envelope
                .message
                .unwrap_or_else(|| "gateway error".to_string());
            Err(TimeleError::Service(
                ServiceError::new(kind, detail).at(endpoint),
            ))
        }
    }

    /// Probes the gateway's health endpoint until it answers, with a bounded
    /// number of attempts. The edge must not accept traffic before this
    /// succeeds.
    pub async fn wait_until_healthy(&self, attempts: u32, delay: Duration) -> Result<()> {
        for attempt in 1..=attempts {
            match self.get::<serde_json::Value>("/health").await {
                Ok(_) => {
                    tracing::info!(attempt, "data gateway is healthy");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "data gateway not ready");
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(TimeleError::service(
            ErrorKind::UpstreamUnavailable,
            "data gateway did not become healthy",
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use mockito::ServerGuard;

    /// Spins up a mockito server and a `GatewayClient` pointed at it.
    pub(crate) async fn get_test_client() -> (ServerGuard, GatewayClient) {
        let server = mockito::Server::new_async().await;
        let base_url = Url::parse(&server.url()).expect("mockito URL");
        let client = GatewayClient::from_parts(reqwest::Client::new(), base_url);
        (server, client)
    }

    /// Renders a success envelope body around `data`.
    pub(crate) fn success_body(data: serde_json::Value) -> String {
        serde_json::json!({
            "status": "success",
            "data": data,
            "message": null,
            "error_kind": null
        })
        .to_string()
    }

    /// Renders an error envelope body.
    pub(crate) fn error_body(kind: &str, detail: &str) -> String {
        serde_json::json!({
            "status": "error",
            "data": null,
            "message": detail,
            "error_kind": kind
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    #[tokio::test]
    async fn test_error_envelope_is_retyped() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("GET", "/users/missing")
            .with_status(404)
            .with_body(error_body("not_found", "user not found"))
            .create_async()
            .await;

        let err = client
            .get::<serde_json::Value>("/users/missing")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.detail(), "user not found");
    }

    #[tokio::test]
    async fn test_unknown_error_kind_collapses_to_internal() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("GET", "/users/odd")
            .with_status(500)
            .with_body(error_body("weird_new_kind", "??"))
            .create_async()
            .await;

        let err = client.get::<serde_json::Value>("/users/odd").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_unavailable() {
        // Nothing listens on this port.
        let base_url = Url::parse("http://127.0.0.1:1").unwrap();
        let client = GatewayClient::from_parts(reqwest::Client::new(), base_url);
        let err = client.get::<serde_json::Value>("/health").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }
}
