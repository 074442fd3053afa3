//! User handlers on the external surface.

use axum::extract::{Path, State};
use axum::Json;

use crate::edge::error::EdgeResult;
use crate::edge::models::ids::parse_user_id;
use crate::edge::models::{
    ApiEnvelope, DeleteAccountRequest, EmailChangeRequest, LoginRequestExternal,
    LoginResponseExternal, NotificationSettingsExternal, NotificationSettingsPatchExternal,
    PasswordChangeRequest, RegisterRequest, StatusHistoryExternal, UserPatchExternal,
    UserProfileExternal,
};

use super::EdgeState;

pub(super) async fn register(
    State(state): State<EdgeState>,
    Json(body): Json<RegisterRequest>,
) -> EdgeResult<Json<ApiEnvelope<UserProfileExternal>>> {
    let profile = state.gateway.users().register(&body.into()).await?;
    Ok(Json(ApiEnvelope::new(
        "registration successful",
        profile.into(),
    )))
}

pub(super) async fn login(
    State(state): State<EdgeState>,
    Json(body): Json<LoginRequestExternal>,
) -> EdgeResult<Json<ApiEnvelope<LoginResponseExternal>>> {
    let success = state.gateway.users().login(&body.into()).await?;
    Ok(Json(ApiEnvelope::new("login successful", success.into())))
}

/// Stateless placeholder: the platform has no server-side sessions to tear
/// down.
pub(super) async fn logout() -> Json<ApiEnvelope<serde_json::Value>> {
    Json(ApiEnvelope::new(
        "logout successful",
        serde_json::json!({ "loggedOut": true }),
    ))
}

pub(super) async fn get_user(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<UserProfileExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let profile = state.gateway.users().get(user_id).await?;
    Ok(Json(ApiEnvelope::new("user found", profile.into())))
}

pub(super) async fn update_user(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<UserPatchExternal>,
) -> EdgeResult<Json<ApiEnvelope<UserProfileExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let profile = state.gateway.users().update(user_id, &body.into()).await?;
    Ok(Json(ApiEnvelope::new("user updated", profile.into())))
}

pub(super) async fn delete_user(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<DeleteAccountRequest>,
) -> EdgeResult<Json<ApiEnvelope<serde_json::Value>>> {
    let user_id = parse_user_id(&user_id)?;
    state.gateway.users().delete(user_id, &body.into()).await?;
    Ok(Json(ApiEnvelope::new(
        "account deleted",
        serde_json::json!({ "deleted": true }),
    )))
}

pub(super) async fn change_password(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<PasswordChangeRequest>,
) -> EdgeResult<Json<ApiEnvelope<serde_json::Value>>> {
    let user_id = parse_user_id(&user_id)?;
    state
        .gateway
        .users()
        .change_password(user_id, &body.into())
        .await?;
    Ok(Json(ApiEnvelope::new(
        "password changed",
        serde_json::json!({ "passwordChanged": true }),
    )))
}

pub(super) async fn change_email(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<EmailChangeRequest>,
) -> EdgeResult<Json<ApiEnvelope<UserProfileExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let profile = state
        .gateway
        .users()
        .change_email(user_id, &body.into())
        .await?;
    Ok(Json(ApiEnvelope::new("email changed", profile.into())))
}

pub(super) async fn notification_settings(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<NotificationSettingsExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let settings = state.gateway.users().notification_settings(user_id).await?;
    Ok(Json(ApiEnvelope::new(
        "notification settings",
        settings.into(),
    )))
}

pub(super) async fn update_notification_settings(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
    Json(body): Json<NotificationSettingsPatchExternal>,
) -> EdgeResult<Json<ApiEnvelope<NotificationSettingsExternal>>> {
    let user_id = parse_user_id(&user_id)?;
    let settings = state
        .gateway
        .users()
        .update_notification_settings(user_id, &body.into())
        .await?;
    Ok(Json(ApiEnvelope::new(
        "notification settings updated",
        settings.into(),
    )))
}

pub(super) async fn order_status_notifications(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<Vec<StatusHistoryExternal>>>> {
    let user_id = parse_user_id(&user_id)?;
    let entries = state
        .gateway
        .users()
        .order_status_notifications(user_id)
        .await?;
    Ok(Json(ApiEnvelope::new(
        "order status notifications",
        entries.into_iter().map(Into::into).collect(),
    )))
}

pub(super) async fn mark_notifications_viewed(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<serde_json::Value>>> {
    let user_id = parse_user_id(&user_id)?;
    state
        .gateway
        .users()
        .mark_notifications_viewed(user_id)
        .await?;
    Ok(Json(ApiEnvelope::new(
        "notifications marked as viewed",
        serde_json::json!({ "viewed": true }),
    )))
}
