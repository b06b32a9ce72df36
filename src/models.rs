use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassifyRequest {
    pub image_path: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ClassifyResponse {
    pub request_id: String,
    pub ingredients: PipelineResult,
    pub outcome: String,
    pub stages: Vec<StageReport>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Fixed set of ingredient categories, in the order the catalog is scanned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Vegetables,
    Fruits,
    Meat,
    Dairy,
    Grains,
    Legumes,
    Herbs,
    Spices,
}

impl FoodCategory {
    pub const SCAN_ORDER: [FoodCategory; 8] = [
        FoodCategory::Vegetables,
        FoodCategory::Fruits,
        FoodCategory::Meat,
        FoodCategory::Dairy,
        FoodCategory::Grains,
        FoodCategory::Legumes,
        FoodCategory::Herbs,
        FoodCategory::Spices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::Fruits => "fruits",
            FoodCategory::Meat => "meat",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Grains => "grains",
            FoodCategory::Legumes => "legumes",
            FoodCategory::Herbs => "herbs",
            FoodCategory::Spices => "spices",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedIngredient {
    pub name: String,
    pub localized_name: Option<String>,
    pub category: FoodCategory,
    pub confidence: f64,
}

/// Final output of the pipeline.
///
/// Only [`crate::scoring::sufficiency_gate`] and the fallback provider build one, so
/// every value is sorted by descending confidence, holds at most ten unique names and
/// never carries a confidence under the acceptance floor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PipelineResult(Vec<ClassifiedIngredient>);

impl PipelineResult {
    pub(crate) fn from_ranked(items: Vec<ClassifiedIngredient>) -> Self {
        Self(items)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn items(&self) -> &[ClassifiedIngredient] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|item| item.name.as_str()).collect()
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> Vec<ClassifiedIngredient> {
        self.0
    }
}
