//! Users API group: `/users/`
//!
//! This module provides the edge's typed access to the identity endpoints of
//! the data gateway: registration, login, profile reads and patches, the
//! password-gated operations, notification settings and the derived
//! notification stream.
//!
use uuid::Uuid;

use crate::edge::client::GatewayClient;
use crate::error::Result;
use crate::gateway::models::{
    AccountDeletion, EmailChange, LoginRequest, LoginSuccess, NewUser, NotificationSettings,
    NotificationSettingsPatch, PasswordChange, ResolvedUser, StatusHistoryEntry, UserPatch,
    UserProfile,
};

/// User related endpoints on the data gateway.
///
pub struct Users<'c> {
    /// Reference to the HTTP client used for making API requests.
    pub client: &'c GatewayClient,
}

impl<'c> Users<'c> {
    /// Creates a new instance of `Users`.
    ///
    /// # Arguments
    ///
    /// * `client` - A reference to the `GatewayClient` used for making API requests.
    ///
    pub fn new(client: &'c GatewayClient) -> Self {
        Self { client }
    }

    // ===== [ Gateway API endpoints ] =====

    /// Registers a new user via `POST /users/register`.
    pub async fn register(&self, user: &NewUser) -> Result<UserProfile> {
        self.client.post("/users/register", user).await
    }

    /// Authenticates via `POST /users/login`; the result carries the profile
    /// plus the derived `has_active_cart` flag.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginSuccess> {
        self.client.post("/users/login", request).await
    }

    /// Fetches a profile via `GET /users/{user_id}`.
    pub async fn get(&self, user_id: Uuid) -> Result<UserProfile> {
        self.client.get(&format!("/users/{user_id}")).await
    }

    /// Applies a partial profile update via `PUT /users/{user_id}`.
    pub async fn update(&self, user_id: Uuid, patch: &UserPatch) -> Result<UserProfile> {
        self.client.put(&format!("/users/{user_id}"), patch).await
    }

    /// Deletes the account via `DELETE /users/{user_id}`; password-gated.
    pub async fn delete(
        &self,
        user_id: Uuid,
        request: &AccountDeletion,
    ) -> Result<serde_json::Value> {
        self.client
            .delete_with_body(&format!("/users/{user_id}"), request)
            .await
    }

    /// Changes the password via `PUT /users/{user_id}/password`.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        change: &PasswordChange,
    ) -> Result<serde_json::Value> {
        self.client
            .put(&format!("/users/{user_id}/password"), change)
            .await
    }

    /// Changes the email via `PUT /users/{user_id}/email`.
    pub async fn change_email(&self, user_id: Uuid, change: &EmailChange) -> Result<UserProfile> {
        self.client
            .put(&format!("/users/{user_id}/email"), change)
            .await
    }

    /// Reads notification settings via
    /// `GET /users/{user_id}/notification-settings`.
    pub async fn notification_settings(&self, user_id: Uuid) -> Result<NotificationSettings> {
        self.client
            .get(&format!("/users/{user_id}/notification-settings"))
            .await
    }

    /// Updates notification settings via
    /// `PUT /users/{user_id}/notification-settings`.
    pub async fn update_notification_settings(
        &self,
        user_id: Uuid,
        patch: &NotificationSettingsPatch,
    ) -> Result<NotificationSettings> {
        self.client
            .put(&format!("/users/{user_id}/notification-settings"), patch)
            .await
    }

    /// Reads the derived notification stream via
    /// `GET /users/{user_id}/order-status-notifications`.
    pub async fn order_status_notifications(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>> {
        self.client
            .get(&format!("/users/{user_id}/order-status-notifications"))
            .await
    }

    /// Acknowledges the stream via `POST /users/{user_id}/notifications/viewed`.
    pub async fn mark_notifications_viewed(&self, user_id: Uuid) -> Result<serde_json::Value> {
        self.client
            .post_empty(&format!("/users/{user_id}/notifications/viewed"))
            .await
    }

    /// Resolves the external UUID to the internal numeric key via
    /// `GET /users/{user_id}/resolve`. The result never leaves the internal
    /// network; it keys the recommender's feature tables.
    pub async fn resolve(&self, user_id: Uuid) -> Result<ResolvedUser> {
        self.client.get(&format!("/users/{user_id}/resolve")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::client::test_utils::{error_body, get_test_client, success_body};
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_register_round_trip() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("POST", "/users/register")
            .with_status(200)
            .with_body(success_body(serde_json::json!({
                "user_id": "bb4f0f04-6695-5f26-a652-b2ed8e0e20fa",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "phone": null,
                "street": null,
                "city": null,
                "postal_code": null,
                "country": null,
                "last_login_at": null,
                "last_notifications_viewed_at": "2025-01-01T00:00:00Z",
                "days_between_order_notifications": 7,
                "order_notifications_start_at": "2025-01-01T00:00:00Z",
                "order_notifications_next_at": "2025-01-08T00:00:00Z",
                "pending_order_notification": false,
                "order_notifications_via_email": false,
                "created_at": "2025-01-01T00:00:00Z"
            })))
            .create_async()
            .await;

        let profile = client
            .users()
            .register(&NewUser {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: "p@ss1234".into(),
                phone: None,
                street: None,
                city: None,
                postal_code: None,
                country: None,
                days_between_order_notifications: None,
                order_notifications_start_at: None,
                order_notifications_via_email: None,
            })
            .await
            .unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.days_between_order_notifications, 7);
    }

    #[tokio::test]
    async fn test_duplicate_email_surfaces_conflict() {
        let (mut server, client) = get_test_client().await;
        server
            .mock("POST", "/users/register")
            .with_status(409)
            .with_body(error_body("conflict", "an account with this email already exists"))
            .create_async()
            .await;

        let err = client
            .users()
            .register(&NewUser {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: "p@ss1234".into(),
                phone: None,
                street: None,
                city: None,
                postal_code: None,
                country: None,
                days_between_order_notifications: None,
                order_notifications_start_at: None,
                order_notifications_via_email: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_resolve_returns_internal_key() {
        let (mut server, client) = get_test_client().await;
        let user_id = Uuid::parse_str("bb4f0f04-6695-5f26-a652-b2ed8e0e20fa").unwrap();
        server
            .mock("GET", "/users/bb4f0f04-6695-5f26-a652-b2ed8e0e20fa/resolve")
            .with_status(200)
            .with_body(success_body(serde_json::json!({ "internal_id": 200001 })))
            .create_async()
            .await;

        let resolved = client.users().resolve(user_id).await.unwrap();
        assert_eq!(resolved.internal_id, 200_001);
    }
}
