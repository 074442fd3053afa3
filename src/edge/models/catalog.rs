//! External catalog and prediction types.
//!
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::gateway::models::ProductDetail;

/// A join-rendered product on the external wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductExternal {
    pub product_id: i32,
    pub product_name: String,
    pub aisle_id: i32,
    pub aisle: String,
    pub department_id: i32,
    pub department: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

impl From<ProductDetail> for ProductExternal {
    fn from(p: ProductDetail) -> Self {
        Self {
            product_id: p.product_id,
            product_name: p.product_name,
            aisle_id: p.aisle_id,
            aisle: p.aisle,
            department_id: p.department_id,
            department: p.department,
            description: p.description,
            price: p.price,
            image_url: p.image_url,
        }
    }
}

/// One recommendation: a product spliced with its ranker score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionExternal {
    #[serde(flatten)]
    pub product: ProductExternal,
    pub score: f64,
}

/// Payload of the predictions endpoint. The recommender is best-effort: on
/// upstream failure this degrades to an empty list, never a 5xx.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionsData {
    pub predictions: Vec<PredictionExternal>,
    pub total: i64,
}

impl PredictionsData {
    pub fn empty() -> Self {
        Self {
            predictions: vec![],
            total: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> ProductDetail {
        ProductDetail {
            product_id: 2,
            product_name: "All-Seasons Salt".into(),
            aisle_id: 104,
            aisle: "spices seasonings".into(),
            department_id: 13,
            department: "pantry".into(),
            description: None,
            price: Some("4.99".parse().unwrap()),
            image_url: None,
        }
    }

    #[test]
    fn test_prediction_flattens_product_fields() {
        let value = serde_json::to_value(PredictionExternal {
            product: detail().into(),
            score: 0.87,
        })
        .unwrap();
        assert_eq!(value["productId"], 2);
        assert_eq!(value["productName"], "All-Seasons Salt");
        assert_eq!(value["score"], 0.87);
    }

    #[test]
    fn test_empty_predictions_shape() {
        let value = serde_json::to_value(PredictionsData::empty()).unwrap();
        assert_eq!(value["total"], 0);
        assert_eq!(value["predictions"].as_array().unwrap().len(), 0);
    }
}
