//! Identity handlers.

use axum::extract::{Path, State};
use axum::Json;

use crate::gateway::models::{
    AccountDeletion, EmailChange, LoginRequest, LoginSuccess, NewUser, NotificationSettings,
    NotificationSettingsPatch, PasswordChange, ResolvedUser, StatusHistoryEntry, UserPatch,
    UserProfile,
};
use crate::gateway::store::Store;

use super::{ok, GatewayResult};

pub(super) async fn register(
    State(store): State<Store>,
    Json(body): Json<NewUser>,
) -> GatewayResult<UserProfile> {
    ok(store.users().register(&body).await?)
}

pub(super) async fn login(
    State(store): State<Store>,
    Json(body): Json<LoginRequest>,
) -> GatewayResult<LoginSuccess> {
    ok(store.users().login(&body).await?)
}

pub(super) async fn get_user(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<UserProfile> {
    ok(store.users().get(&user_id).await?)
}

pub(super) async fn update_user(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<UserPatch>,
) -> GatewayResult<UserProfile> {
    ok(store.users().update(&user_id, &body).await?)
}

pub(super) async fn delete_user(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<AccountDeletion>,
) -> GatewayResult<serde_json::Value> {
    store.users().delete(&user_id, &body).await?;
    ok(serde_json::json!({ "deleted": true }))
}

pub(super) async fn change_password(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<PasswordChange>,
) -> GatewayResult<serde_json::Value> {
    store.users().change_password(&user_id, &body).await?;
    ok(serde_json::json!({ "password_changed": true }))
}

pub(super) async fn change_email(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<EmailChange>,
) -> GatewayResult<UserProfile> {
    ok(store.users().change_email(&user_id, &body).await?)
}

pub(super) async fn notification_settings(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<NotificationSettings> {
    ok(store.notifications().settings(&user_id).await?)
}

pub(super) async fn update_notification_settings(
    State(store): State<Store>,
    Path(user_id): Path<String>,
    Json(body): Json<NotificationSettingsPatch>,
) -> GatewayResult<NotificationSettings> {
    ok(store.notifications().update_settings(&user_id, &body).await?)
}

pub(super) async fn order_status_notifications(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<Vec<StatusHistoryEntry>> {
    ok(store.notifications().order_status_stream(&user_id).await?)
}

pub(super) async fn mark_notifications_viewed(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<serde_json::Value> {
    store.notifications().mark_viewed(&user_id).await?;
    ok(serde_json::json!({ "viewed": true }))
}

pub(super) async fn resolve_user(
    State(store): State<Store>,
    Path(user_id): Path<String>,
) -> GatewayResult<ResolvedUser> {
    ok(store.users().resolve(&user_id).await?)
}
