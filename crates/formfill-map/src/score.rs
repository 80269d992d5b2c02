//! Independent similarity strategies for (source, target) field pairs.
//!
//! Every scorer is a pure function returning a value in [0, 1] and is
//! total over arbitrary input: empty or separator-only names score 0.0 on
//! every strategy rather than erroring.

use std::collections::BTreeMap;

use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};

use formfill_model::{
    AliasTable, FieldType, MappingWeights, SourceField, TargetField, name_tokens, normalize_name,
};

/// Edit-distance similarity over normalized names.
///
/// `first_name`, `firstName`, and `first-name` normalize identically and
/// score exactly 1.0 against each other.
pub fn lexical_score(a: &str, b: &str) -> f32 {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    levenshtein::normalized_similarity(a.chars(), b.chars()) as f32
}

/// Jaccard similarity over name token sets; catches reordered compound
/// names such as `name_first` vs `first_name`.
pub fn token_overlap_score(a: &str, b: &str) -> f32 {
    let a = name_tokens(a);
    let b = name_tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f32 / union as f32
}

/// Compatibility between the extractor's type guess and the target's
/// declared type. Total over [`FieldType`]: equal types score 1.0,
/// coercible pairs get partial credit, incompatible pairs score 0.0.
pub fn type_compatibility_score(source: FieldType, target: FieldType) -> f32 {
    use FieldType as F;
    if source == target {
        return 1.0;
    }
    match (source, target) {
        (F::Unknown, _) | (_, F::Unknown) => 0.5,
        (F::Text, _) | (_, F::Text) => 0.5,
        (F::Numeric, F::Currency) | (F::Currency, F::Numeric) => 0.75,
        (F::Phone, F::Numeric) | (F::Numeric, F::Phone) => 0.25,
        _ => 0.0,
    }
}

/// 1.0 when the pair falls in the same configured alias group, else 0.0.
pub fn alias_score(a: &str, b: &str, aliases: &AliasTable) -> f32 {
    if aliases.contains_pair(a, b) { 1.0 } else { 0.0 }
}

/// The four strategy scores for one (source, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyScores {
    pub lexical: f32,
    pub token_overlap: f32,
    pub type_compatibility: f32,
    pub alias: f32,
}

impl StrategyScores {
    /// Weighted combination, normalized by the total weight.
    #[must_use]
    pub fn composite(&self, weights: &MappingWeights) -> f32 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let sum = self.lexical * weights.lexical
            + self.token_overlap * weights.token_overlap
            + self.type_compatibility * weights.type_compatibility
            + self.alias * weights.alias;
        (sum / total).clamp(0.0, 1.0)
    }

    /// Named breakdown attached to emitted mappings for observability.
    #[must_use]
    pub fn breakdown(&self) -> BTreeMap<String, f32> {
        BTreeMap::from([
            ("lexical".to_string(), self.lexical),
            ("token_overlap".to_string(), self.token_overlap),
            ("type_compatibility".to_string(), self.type_compatibility),
            ("alias".to_string(), self.alias),
        ])
    }
}

/// Scores for one pair plus the exact-normalized-name marker that
/// short-circuits the composite to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct PairScore {
    pub scores: StrategyScores,
    pub exact_name: bool,
}

#[derive(Debug, Clone, Copy)]
struct NameScores {
    lexical: f32,
    token_overlap: f32,
    alias: f32,
    exact: bool,
}

/// Memo for name-based similarity, keyed by (source name, target name).
///
/// Passed explicitly into engine calls so concurrent jobs stay independent;
/// type compatibility is cheap and computed per pair, uncached.
#[derive(Debug, Default)]
pub struct ScoreCache {
    names: BTreeMap<(String, String), NameScores>,
}

impl ScoreCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Scores a pair, reusing cached name similarity where available.
    pub fn score_pair(
        &mut self,
        source: &SourceField,
        target: &TargetField,
        aliases: &AliasTable,
    ) -> PairScore {
        let key = (source.name.clone(), target.name.clone());
        let name_scores = if let Some(cached) = self.names.get(&key).copied() {
            cached
        } else {
            let normalized = normalize_name(&source.name);
            let computed = NameScores {
                lexical: lexical_score(&source.name, &target.name),
                token_overlap: token_overlap_score(&source.name, &target.name),
                alias: alias_score(&source.name, &target.name, aliases),
                exact: !normalized.is_empty() && normalized == normalize_name(&target.name),
            };
            self.names.insert(key, computed);
            computed
        };
        PairScore {
            scores: StrategyScores {
                lexical: name_scores.lexical,
                token_overlap: name_scores.token_overlap,
                type_compatibility: type_compatibility_score(
                    source.field_type,
                    target.field_type,
                ),
                alias: name_scores.alias,
            },
            exact_name: name_scores.exact,
        }
    }
}
