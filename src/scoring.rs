use crate::catalog::{Catalog, CatalogEntry};
use crate::models::{ClassifiedIngredient, PipelineResult};
use std::collections::HashSet;

/// Heuristic constants for matching, scoring and the sufficiency gate.
pub mod config {
    /// Confidence lost per rank position.
    pub const RANK_DECAY_STEP: f64 = 0.1;
    /// Lowest base score a matched label can receive from rank decay alone.
    pub const RANK_SCORE_FLOOR: f64 = 0.5;
    /// Multiplier applied to problematic items that appear late in the label list.
    pub const PROBLEMATIC_PENALTY: f64 = 0.7;
    /// Problematic items ranked strictly after this index are penalised.
    pub const PROBLEMATIC_RANK_THRESHOLD: usize = 3;
    pub const ACCEPTANCE_FLOOR: f64 = 0.6;
    pub const HIGH_CONFIDENCE: f64 = 0.75;
    pub const MAX_RESULTS: usize = 10;
    /// A sparse result is only trusted with this many entries or one high-confidence hit.
    pub const MIN_SPARSE_RESULTS: usize = 2;
    pub const FUZZY_LENGTH_SLACK: usize = 3;
    pub const FUZZY_MIN_LENGTH: usize = 3;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub decay_step: f64,
    pub rank_floor: f64,
    pub problematic_penalty: f64,
    pub problematic_rank_threshold: usize,
    pub acceptance_floor: f64,
    pub high_confidence: f64,
    pub max_results: usize,
    pub min_sparse_results: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decay_step: config::RANK_DECAY_STEP,
            rank_floor: config::RANK_SCORE_FLOOR,
            problematic_penalty: config::PROBLEMATIC_PENALTY,
            problematic_rank_threshold: config::PROBLEMATIC_RANK_THRESHOLD,
            acceptance_floor: config::ACCEPTANCE_FLOOR,
            high_confidence: config::HIGH_CONFIDENCE,
            max_results: config::MAX_RESULTS,
            min_sparse_results: config::MIN_SPARSE_RESULTS,
        }
    }
}

impl ScoringConfig {
    /// Confidence for a matched catalog entry found at `rank` in the upstream label list.
    pub fn score(&self, entry: &CatalogEntry, rank: usize, catalog: &Catalog) -> f64 {
        let mut score = (1.0 - rank as f64 * self.decay_step).max(self.rank_floor);
        if catalog.is_problematic(entry.name) && rank > self.problematic_rank_threshold {
            score *= self.problematic_penalty;
        }
        score.clamp(0.0, 1.0)
    }

    pub fn ingredient(
        &self,
        entry: &CatalogEntry,
        rank: usize,
        catalog: &Catalog,
    ) -> ClassifiedIngredient {
        ClassifiedIngredient {
            name: entry.name.to_string(),
            localized_name: entry.localized_name.map(str::to_string),
            category: entry.category,
            confidence: self.score(entry, rank, catalog),
        }
    }
}

/// Sorts by descending confidence and keeps the first occurrence of every name.
///
/// The sort is stable, so equal scores keep their upstream order.
pub fn rank(mut candidates: Vec<ClassifiedIngredient>) -> Vec<ClassifiedIngredient> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut seen = HashSet::new();
    candidates.retain(|item| seen.insert(item.name.clone()));
    candidates
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    Accepted(PipelineResult),
    /// Nothing survived the acceptance floor.
    NothingDetected,
    /// Too few entries and none of them high confidence.
    Insufficient { kept: usize },
}

impl GateVerdict {
    pub fn into_result(self) -> PipelineResult {
        match self {
            GateVerdict::Accepted(result) => result,
            GateVerdict::NothingDetected | GateVerdict::Insufficient { .. } => {
                PipelineResult::empty()
            }
        }
    }
}

/// Applies the acceptance floor, the result cap and the sparse-evidence rule to an
/// already ranked list.
pub fn sufficiency_gate(ranked: Vec<ClassifiedIngredient>, config: &ScoringConfig) -> GateVerdict {
    let kept: Vec<ClassifiedIngredient> = ranked
        .into_iter()
        .filter(|item| item.confidence >= config.acceptance_floor)
        .take(config.max_results)
        .collect();
    let high = kept
        .iter()
        .filter(|item| item.confidence >= config.high_confidence)
        .count();

    if kept.is_empty() {
        GateVerdict::NothingDetected
    } else if kept.len() < config.min_sparse_results && high == 0 {
        GateVerdict::Insufficient { kept: kept.len() }
    } else {
        GateVerdict::Accepted(PipelineResult::from_ranked(kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;
    use crate::models::FoodCategory;

    fn item(name: &str, confidence: f64) -> ClassifiedIngredient {
        ClassifiedIngredient {
            name: name.to_string(),
            localized_name: None,
            category: FoodCategory::Vegetables,
            confidence,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn score_decays_linearly_to_floor() {
        let cfg = ScoringConfig::default();
        let tomato = catalog().get("tomato").unwrap();
        let expected = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.5, 0.5];
        for (rank, want) in expected.iter().enumerate() {
            let got = cfg.score(tomato, rank, catalog());
            assert!(approx(got, *want), "rank {rank}: {got} != {want}");
        }
        assert!(approx(cfg.score(tomato, 40, catalog()), 0.5));
    }

    #[test]
    fn problematic_items_penalised_only_after_threshold() {
        let cfg = ScoringConfig::default();
        let orange = catalog().get("orange").unwrap();
        assert!(approx(cfg.score(orange, 3, catalog()), 0.7));
        assert!(approx(cfg.score(orange, 4, catalog()), 0.6 * 0.7));
        assert!(approx(cfg.score(orange, 9, catalog()), 0.5 * 0.7));
    }

    #[test]
    fn ingredient_carries_catalog_metadata() {
        let cfg = ScoringConfig::default();
        let basil = catalog().get("basil").unwrap();
        let out = cfg.ingredient(basil, 2, catalog());
        assert_eq!(out.name, "basil");
        assert_eq!(out.category, FoodCategory::Herbs);
        assert_eq!(out.localized_name.as_deref(), Some("罗勒"));
        assert!(approx(out.confidence, 0.8));
    }

    #[test]
    fn rank_keeps_best_duplicate() {
        let ranked = rank(vec![
            item("onion", 0.6),
            item("tomato", 0.8),
            item("onion", 0.9),
            item("tomato", 0.7),
        ]);
        let names: Vec<&str> = ranked.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["onion", "tomato"]);
        assert!(approx(ranked[0].confidence, 0.9));
        assert!(approx(ranked[1].confidence, 0.8));
    }

    #[test]
    fn gate_drops_below_floor_and_caps() {
        let cfg = ScoringConfig::default();
        let mut ranked: Vec<_> = (0..12).map(|i| item(&format!("item{i}"), 0.95)).collect();
        ranked.push(item("weak", 0.59));
        let GateVerdict::Accepted(result) = sufficiency_gate(ranked, &cfg) else {
            panic!("expected accepted");
        };
        assert_eq!(result.len(), config::MAX_RESULTS);
        assert!(!result.names().contains(&"weak"));
    }

    #[test]
    fn gate_boundaries() {
        let cfg = ScoringConfig::default();
        assert_eq!(sufficiency_gate(vec![], &cfg), GateVerdict::NothingDetected);
        assert_eq!(
            sufficiency_gate(vec![item("garlic", 0.5)], &cfg),
            GateVerdict::NothingDetected
        );
        assert_eq!(
            sufficiency_gate(vec![item("garlic", 0.6)], &cfg),
            GateVerdict::Insufficient { kept: 1 }
        );
        assert_eq!(
            sufficiency_gate(vec![item("garlic", 0.74)], &cfg),
            GateVerdict::Insufficient { kept: 1 }
        );
        assert!(matches!(
            sufficiency_gate(vec![item("garlic", 0.75)], &cfg),
            GateVerdict::Accepted(_)
        ));
        // Two weak entries are enough on their own.
        assert!(matches!(
            sufficiency_gate(vec![item("garlic", 0.6), item("onion", 0.6)], &cfg),
            GateVerdict::Accepted(_)
        ));
        // The floor is applied before counting, so a sub-floor companion does not help.
        assert_eq!(
            sufficiency_gate(vec![item("garlic", 0.65), item("onion", 0.55)], &cfg),
            GateVerdict::Insufficient { kept: 1 }
        );
    }

    #[test]
    fn tuned_thresholds_are_respected() {
        let cfg = ScoringConfig {
            acceptance_floor: 0.4,
            high_confidence: 0.9,
            ..ScoringConfig::default()
        };
        assert!(matches!(
            sufficiency_gate(vec![item("garlic", 0.45), item("onion", 0.41)], &cfg),
            GateVerdict::Accepted(_)
        ));
        assert_eq!(
            sufficiency_gate(vec![item("garlic", 0.85)], &cfg),
            GateVerdict::Insufficient { kept: 1 }
        );
    }
}
