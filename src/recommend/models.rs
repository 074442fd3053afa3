//! Data types for the recommender contract.
//!
//! The recommender is a black box to the core: a stage-1 candidate generator
//! and a stage-2 ranker over tabular user-product features, keyed by the
//! legacy integer user ids. Only the request/response shape is specified
//! here.
//!
use serde::{Deserialize, Serialize};

/// One ranked recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub product_id: i32,
    /// Ranker score; contractually in [0, 1], clamped on receipt.
    pub score: f64,
}

/// The recommender's response for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPredictions {
    pub user_id: i64,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl UserPredictions {
    /// Clamps every score into [0, 1]; the ranker promises the range but the
    /// edge does not trust it.
    pub fn clamped(mut self) -> Self {
        for p in &mut self.predictions {
            p.score = p.score.clamp(0.0, 1.0);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_are_clamped() {
        let response = UserPredictions {
            user_id: 1,
            predictions: vec![
                Prediction { product_id: 1, score: 1.7 },
                Prediction { product_id: 2, score: -0.2 },
                Prediction { product_id: 3, score: 0.5 },
            ],
        }
        .clamped();
        assert_eq!(response.predictions[0].score, 1.0);
        assert_eq!(response.predictions[1].score, 0.0);
        assert_eq!(response.predictions[2].score, 0.5);
    }

    #[test]
    fn test_missing_predictions_default_empty() {
        let response: UserPredictions = serde_json::from_str(r#"{"user_id": 7}"#).unwrap();
        assert!(response.predictions.is_empty());
    }
}
