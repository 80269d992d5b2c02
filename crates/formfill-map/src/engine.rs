//! Mapping engine: candidate matrix generation and greedy assignment.

use std::collections::BTreeSet;

use tracing::debug;

use formfill_model::{
    FieldMapping, MappingConfig, MappingOutcome, MergeMode, SourceField, TargetField,
};

use crate::score::{PairScore, ScoreCache};

/// Composite cap for pairs whose normalized names differ; exactly 1.0 is
/// reserved for exact normalized-name matches.
const NON_EXACT_CAP: f32 = 0.99;

/// Engine for assigning extracted source fields to target form fields.
///
/// Generates the full |sources| x |targets| composite-score matrix and
/// resolves it with greedy allocation in descending score order. The
/// engine never mutates its inputs and is deterministic for a given
/// configuration: ties are broken by exact type match, then shorter
/// target name, then source name, then target name.
pub struct MappingEngine {
    config: MappingConfig,
}

struct Candidate<'a> {
    source_idx: usize,
    source: &'a SourceField,
    target: &'a TargetField,
    confidence: f32,
    pair: PairScore,
    exact_type: bool,
}

impl MappingEngine {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Maps source fields onto target fields.
    ///
    /// Empty sources or targets produce an empty result, not an error.
    /// Pairs below the assignment threshold are left unassigned even when
    /// no competing assignment exists.
    pub fn map(
        &self,
        sources: &[SourceField],
        targets: &[TargetField],
        cache: &mut ScoreCache,
    ) -> MappingOutcome {
        let mut candidates = self.collect_candidates(sources, targets, cache);

        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.exact_type.cmp(&a.exact_type))
                .then_with(|| a.target.name.len().cmp(&b.target.name.len()))
                .then_with(|| a.source.name.cmp(&b.source.name))
                .then_with(|| a.target.name.cmp(&b.target.name))
        });

        let mut assigned_sources: BTreeSet<usize> = BTreeSet::new();
        let mut occupied_targets: BTreeSet<(String, Option<String>)> = BTreeSet::new();
        let mut mappings = Vec::new();

        for candidate in candidates {
            if candidate.confidence < self.config.assignment_threshold {
                // Sorted descending, so nothing further can be accepted.
                break;
            }
            let target_key = (
                candidate.target.name.clone(),
                match self.config.merge_mode {
                    MergeMode::SingleSource => None,
                    MergeMode::MultiSource => candidate.source.document_id.clone(),
                },
            );
            if assigned_sources.contains(&candidate.source_idx)
                || occupied_targets.contains(&target_key)
            {
                debug!(
                    source = %candidate.source.name,
                    target = %candidate.target.name,
                    confidence = candidate.confidence,
                    "candidate skipped, side already assigned"
                );
                continue;
            }
            assigned_sources.insert(candidate.source_idx);
            occupied_targets.insert(target_key);

            let flagged =
                candidate.confidence < self.config.assignment_threshold + self.config.flag_margin;
            debug!(
                source = %candidate.source.name,
                target = %candidate.target.name,
                confidence = candidate.confidence,
                flagged,
                "mapping accepted"
            );
            mappings.push(FieldMapping {
                source_name: candidate.source.name.clone(),
                target_name: candidate.target.name.clone(),
                confidence: candidate.confidence,
                strategy_breakdown: candidate.pair.scores.breakdown(),
                flagged,
                document_id: candidate.source.document_id.clone(),
            });
        }

        let unmapped_sources = sources
            .iter()
            .enumerate()
            .filter(|(idx, _)| !assigned_sources.contains(idx))
            .map(|(_, field)| field.name.clone())
            .collect();
        let unmapped_targets = targets
            .iter()
            .filter(|target| {
                !mappings
                    .iter()
                    .any(|mapping| mapping.target_name == target.name)
            })
            .map(|target| target.name.clone())
            .collect();

        MappingOutcome {
            mappings,
            unmapped_sources,
            unmapped_targets,
        }
    }

    fn collect_candidates<'a>(
        &self,
        sources: &'a [SourceField],
        targets: &'a [TargetField],
        cache: &mut ScoreCache,
    ) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::with_capacity(sources.len() * targets.len());
        for (source_idx, source) in sources.iter().enumerate() {
            for target in targets {
                let pair = cache.score_pair(source, target, &self.config.aliases);
                let confidence = self.composite_confidence(&pair);
                if confidence < self.config.candidate_floor {
                    continue;
                }
                candidates.push(Candidate {
                    source_idx,
                    source,
                    target,
                    confidence,
                    pair,
                    exact_type: source.field_type == target.field_type,
                });
            }
        }
        candidates
    }

    fn composite_confidence(&self, pair: &PairScore) -> f32 {
        if pair.exact_name {
            return 1.0;
        }
        let mut confidence = pair.scores.composite(&self.config.weights);
        if pair.scores.alias >= 1.0 {
            confidence = confidence.max(self.config.alias_floor);
        }
        confidence.min(NON_EXACT_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_model::FieldType;

    fn engine() -> MappingEngine {
        MappingEngine::new(MappingConfig::default())
    }

    #[test]
    fn empty_inputs_yield_empty_outcome() {
        let outcome = engine().map(&[], &[], &mut ScoreCache::new());
        assert!(outcome.mappings.is_empty());

        let targets = vec![TargetField::new("email", FieldType::Email, true)];
        let outcome = engine().map(&[], &targets, &mut ScoreCache::new());
        assert!(outcome.mappings.is_empty());
        assert_eq!(outcome.unmapped_targets, vec!["email".to_string()]);
    }

    #[test]
    fn exact_normalized_name_scores_one() {
        let sources = vec![SourceField::new("firstName", "John", FieldType::Name)];
        let targets = vec![TargetField::new("first_name", FieldType::Name, true)];
        let outcome = engine().map(&sources, &targets, &mut ScoreCache::new());
        assert_eq!(outcome.mappings.len(), 1);
        assert_eq!(outcome.mappings[0].confidence, 1.0);
        assert!(!outcome.mappings[0].flagged);
    }

    #[test]
    fn non_exact_confidence_stays_below_one() {
        let sources = vec![SourceField::new(
            "email_address",
            "a@b.example",
            FieldType::Email,
        )];
        let targets = vec![TargetField::new("email", FieldType::Email, true)];
        let outcome = engine().map(&sources, &targets, &mut ScoreCache::new());
        assert_eq!(outcome.mappings.len(), 1);
        let mapping = &outcome.mappings[0];
        assert!(mapping.confidence < 1.0);
        assert!(mapping.confidence >= 0.6);
    }

    #[test]
    fn low_scores_stay_unassigned_even_without_competition() {
        let sources = vec![SourceField::new("qty", "3", FieldType::Numeric)];
        let targets = vec![TargetField::new("applicant_email", FieldType::Email, true)];
        let outcome = engine().map(&sources, &targets, &mut ScoreCache::new());
        assert!(outcome.mappings.is_empty());
        assert_eq!(outcome.unmapped_sources, vec!["qty".to_string()]);
        assert_eq!(
            outcome.unmapped_targets,
            vec!["applicant_email".to_string()]
        );
    }

    #[test]
    fn breakdown_lists_all_strategies() {
        let sources = vec![SourceField::new("email", "a@b.example", FieldType::Email)];
        let targets = vec![TargetField::new("email", FieldType::Email, true)];
        let outcome = engine().map(&sources, &targets, &mut ScoreCache::new());
        let breakdown = &outcome.mappings[0].strategy_breakdown;
        for key in ["lexical", "token_overlap", "type_compatibility", "alias"] {
            assert!(breakdown.contains_key(key), "missing strategy {key}");
        }
    }

    #[test]
    fn weak_accept_is_flagged() {
        // Without the alias table this pair scores just under 0.5; with the
        // threshold lowered it becomes a weak accept inside the flag margin.
        let config = MappingConfig {
            aliases: formfill_model::AliasTable::empty(),
            assignment_threshold: 0.45,
            qa_min_confidence: 0.40,
            ..MappingConfig::default()
        };
        let sources = vec![SourceField::new(
            "email_address",
            "a@b.example",
            FieldType::Email,
        )];
        let targets = vec![TargetField::new("email", FieldType::Email, true)];
        let outcome =
            MappingEngine::new(config).map(&sources, &targets, &mut ScoreCache::new());
        assert_eq!(outcome.mappings.len(), 1);
        let mapping = &outcome.mappings[0];
        assert!(mapping.confidence >= 0.45 && mapping.confidence < 0.55);
        assert!(mapping.flagged);
    }

    #[test]
    fn exact_accepts_are_not_flagged() {
        let sources = vec![SourceField::new("city", "Utrecht", FieldType::Text)];
        let targets = vec![TargetField::new("city", FieldType::Text, false)];
        let outcome = engine().map(&sources, &targets, &mut ScoreCache::new());
        assert_eq!(outcome.mappings.len(), 1);
        assert!(!outcome.mappings[0].flagged);
    }

    #[test]
    fn multi_source_merge_allows_one_mapping_per_document() {
        let config = MappingConfig {
            merge_mode: MergeMode::MultiSource,
            ..MappingConfig::default()
        };
        let sources = vec![
            SourceField::new("email", "a@one.example", FieldType::Email)
                .with_document_id("doc-1"),
            SourceField::new("email", "a@two.example", FieldType::Email)
                .with_document_id("doc-2"),
        ];
        let targets = vec![TargetField::new("email", FieldType::Email, true)];
        let outcome =
            MappingEngine::new(config).map(&sources, &targets, &mut ScoreCache::new());
        assert_eq!(outcome.mappings.len(), 2);
        let docs: BTreeSet<_> = outcome
            .mappings
            .iter()
            .map(|m| m.document_id.clone())
            .collect();
        assert_eq!(docs.len(), 2);
    }
}
