use crate::catalog::catalog;
use crate::models::{ClassifiedIngredient, PipelineResult};

/// Pantry staples substituted when the vision service cannot be used at all.
const FALLBACK_SET: [(&str, f64); 5] = [
    ("tomato", 0.85),
    ("onion", 0.8),
    ("garlic", 0.75),
    ("carrot", 0.7),
    ("potato", 0.65),
];

pub fn fallback_ingredients() -> PipelineResult {
    let items = FALLBACK_SET
        .iter()
        .filter_map(|(name, confidence)| {
            catalog().get(name).map(|entry| ClassifiedIngredient {
                name: entry.name.to_string(),
                localized_name: entry.localized_name.map(str::to_string),
                category: entry.category,
                confidence: *confidence,
            })
        })
        .collect();
    PipelineResult::from_ranked(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{GateVerdict, ScoringConfig, sufficiency_gate};

    #[test]
    fn fallback_has_five_catalog_items() {
        let result = fallback_ingredients();
        assert_eq!(
            result.names(),
            vec!["tomato", "onion", "garlic", "carrot", "potato"]
        );
        assert!(result.items().iter().all(|i| i.localized_name.is_some()));
    }

    #[test]
    fn fallback_already_passes_the_gate() {
        let result = fallback_ingredients();
        let verdict = sufficiency_gate(result.clone().into_inner(), &ScoringConfig::default());
        assert_eq!(verdict, GateVerdict::Accepted(result));
    }
}
