use crate::catalog::{Catalog, CatalogEntry};
use crate::scoring::config;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Maximum length difference between a label and a catalog name for a fuzzy match.
    pub length_slack: usize,
    /// The shorter of the two strings must be at least this long for a fuzzy match.
    pub min_length: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            length_slack: config::FUZZY_LENGTH_SLACK,
            min_length: config::FUZZY_MIN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Fuzzy,
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub rule: MatchRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagVerdict<'a> {
    Matched(TagMatch<'a>),
    /// Generic scene or container label.
    Excluded,
    NoMatch,
}

impl<'a> TagVerdict<'a> {
    pub fn matched(self) -> Option<TagMatch<'a>> {
        match self {
            TagVerdict::Matched(found) => Some(found),
            TagVerdict::Excluded | TagVerdict::NoMatch => None,
        }
    }
}

pub fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Resolves one upstream label to a catalog entry.
///
/// Rules are tried in order: exclusion list, exact name, bounded prefix/suffix match in
/// catalog scan order, then the alias table.
pub fn classify_tag<'a>(tag: &str, catalog: &'a Catalog, config: &MatchConfig) -> TagVerdict<'a> {
    let normalized = normalize(tag);
    if normalized.is_empty() {
        return TagVerdict::NoMatch;
    }
    if catalog.is_excluded(&normalized) {
        return TagVerdict::Excluded;
    }
    if let Some(entry) = catalog.get(&normalized) {
        return TagVerdict::Matched(TagMatch {
            entry,
            rule: MatchRule::Exact,
        });
    }
    if let Some(entry) = catalog
        .entries()
        .iter()
        .find(|entry| fuzzy_matches(&normalized, entry.name, config))
    {
        return TagVerdict::Matched(TagMatch {
            entry,
            rule: MatchRule::Fuzzy,
        });
    }
    match catalog.override_for(&normalized) {
        Some(entry) => TagVerdict::Matched(TagMatch {
            entry,
            rule: MatchRule::Override,
        }),
        None => TagVerdict::NoMatch,
    }
}

fn fuzzy_matches(tag: &str, name: &str, config: &MatchConfig) -> bool {
    let tag_len = tag.chars().count();
    let name_len = name.chars().count();
    if tag_len.abs_diff(name_len) > config.length_slack {
        return false;
    }
    if tag_len.min(name_len) < config.min_length {
        return false;
    }
    tag.starts_with(name) || tag.ends_with(name) || name.starts_with(tag) || name.ends_with(tag)
}
