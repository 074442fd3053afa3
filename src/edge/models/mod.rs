//! Data types for the external (camelCase) contract of the edge API.
//!
//! Every structure here is the camelCase twin of an internal snake_case
//! model, with `From` conversions in both directions where both directions
//! exist. The translation is mechanical: renames only, no semantic change,
//! so external -> internal -> external round-trips preserve the field set.
//!
//! # Submodules and Types
//!
//! - `ids`: typed parsing of external path identifiers.
//! - `user`: registration, login, profile, patches and notification settings.
//! - `cart`: cart views and item operations.
//! - `order`: order views, direct creation and status history.
//! - `catalog`: product views and listing parameters.
//!
use serde::Serialize;

/// The success envelope of every external response:
/// `{ "message": ..., "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// The pagination block paginated endpoints wrap their items in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Derives the page block from a limit/offset window over `total` rows.
    pub fn from_window(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        let has_next = offset + (items.len() as i64) < total;
        Self {
            page: offset / limit.max(1) + 1,
            per_page: limit,
            has_next,
            has_prev: offset > 0,
            total,
            items,
        }
    }
}

pub mod ids;

mod user;
pub use user::{
    DeleteAccountRequest, EmailChangeRequest, LoginRequestExternal, LoginResponseExternal,
    NotificationSettingsExternal, NotificationSettingsPatchExternal, PasswordChangeRequest,
    RegisterRequest, UserPatchExternal, UserProfileExternal,
};

mod cart;
pub use cart::{
    AddItemRequest, CartItemExternal, CartItemSpecExternal, CartViewExternal, CreateCartRequest,
    ReplaceCartRequest, SetQuantityRequest,
};

mod order;
pub use order::{
    CreateOrderRequest, DeliveryExternal, OrderViewExternal, StatusHistoryExternal,
    TrackingExternal,
};

mod catalog;
pub use catalog::{PredictionExternal, PredictionsData, ProductExternal};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_math() {
        let page = Page::from_window(vec![1, 2, 3], 10, 3, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let page = Page::from_window(vec![1, 2, 3], 10, 3, 6);
        assert_eq!(page.page, 3);
        assert!(page.has_next);
        assert!(page.has_prev);

        let page = Page::from_window(vec![1], 10, 3, 9);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let value = serde_json::to_value(Page::from_window(vec![1], 1, 20, 0)).unwrap();
        assert!(value.get("perPage").is_some());
        assert!(value.get("hasNext").is_some());
        assert!(value.get("hasPrev").is_some());
        assert!(value.get("per_page").is_none());
    }

    #[test]
    fn test_empty_page_has_no_next() {
        let page: Page<i32> = Page::from_window(vec![], 0, 20, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
        assert_eq!(page.page, 1);
    }
}
