//! Mapping configuration: strategy weights, thresholds, merge mode, and
//! the alias table.
//!
//! All numeric knobs are tunable defaults, not contracts; construction
//! validates ranges so the engine never sees a non-finite weight.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::normalize::normalize_name;

/// Weights combining the four similarity strategies into one composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingWeights {
    pub lexical: f32,
    pub token_overlap: f32,
    pub type_compatibility: f32,
    pub alias: f32,
}

impl Default for MappingWeights {
    fn default() -> Self {
        Self {
            lexical: 0.30,
            token_overlap: 0.25,
            type_compatibility: 0.25,
            alias: 0.20,
        }
    }
}

impl MappingWeights {
    /// Preset for cleanly named, machine-generated source fields.
    #[must_use]
    pub fn lexical_heavy() -> Self {
        Self {
            lexical: 0.45,
            token_overlap: 0.30,
            type_compatibility: 0.15,
            alias: 0.10,
        }
    }

    /// Preset for noisy free-form extractions where names are unreliable.
    #[must_use]
    pub fn type_heavy() -> Self {
        Self {
            lexical: 0.20,
            token_overlap: 0.20,
            type_compatibility: 0.40,
            alias: 0.20,
        }
    }

    #[must_use]
    pub fn total(&self) -> f32 {
        self.lexical + self.token_overlap + self.type_compatibility + self.alias
    }

    fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            ("lexical", self.lexical),
            ("token_overlap", self.token_overlap),
            ("type_compatibility", self.type_compatibility),
            ("alias", self.alias),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidConfig(format!(
                    "weight '{name}' must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(ModelError::InvalidConfig(
                "strategy weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Uniqueness discipline for target assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// One mapping per target field.
    #[default]
    SingleSource,
    /// One mapping per (target field, source document) pair.
    MultiSource,
}

/// Domain synonym groups; names in the same group alias each other.
///
/// Groups are matched on normalized names, so `date_of_birth` and
/// `Date Of Birth` hit the same group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    pub groups: Vec<Vec<String>>,
}

impl AliasTable {
    #[must_use]
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// True when both names belong to the same alias group.
    pub fn contains_pair(&self, a: &str, b: &str) -> bool {
        let a = normalize_name(a);
        let b = normalize_name(b);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        self.groups.iter().any(|group| {
            let mut has_a = false;
            let mut has_b = false;
            for entry in group {
                let entry = normalize_name(entry);
                has_a |= entry == a;
                has_b |= entry == b;
            }
            has_a && has_b
        })
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        let groups = [
            vec!["first_name", "given_name", "fname", "first"],
            vec!["last_name", "family_name", "surname", "lname", "last"],
            vec!["full_name", "name", "applicant_name", "complete_name"],
            vec!["email", "email_address", "e_mail", "electronic_mail"],
            vec![
                "phone",
                "phone_number",
                "telephone",
                "mobile",
                "mobile_number",
                "cell_phone",
            ],
            vec![
                "address",
                "street_address",
                "mailing_address",
                "home_address",
            ],
            vec!["dob", "date_of_birth", "birth_date", "birthdate"],
            vec!["zip", "zip_code", "postal_code", "postcode"],
            vec!["ssn", "social_security_number"],
            vec!["salary", "income", "annual_income"],
        ];
        Self {
            groups: groups
                .into_iter()
                .map(|group| group.into_iter().map(String::from).collect())
                .collect(),
        }
    }
}

/// Full mapping configuration for one job attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub weights: MappingWeights,
    /// Minimum composite score for a pair to be considered at all.
    pub candidate_floor: f32,
    /// Minimum composite score for a pair to be accepted as a mapping.
    pub assignment_threshold: f32,
    /// Accepts within this margin above the threshold are flagged for review.
    pub flag_margin: f32,
    /// Floor confidence applied when an alias-table pair matches.
    pub alias_floor: f32,
    /// Hard QA floor; catches config drift below the assignment threshold.
    pub qa_min_confidence: f32,
    /// Maximum mapping attempts before degraded finalization.
    pub max_attempts: u32,
    /// Maximum re-extraction requests before proceeding degraded.
    pub max_reextraction_requests: u32,
    /// Wall-clock budget per pipeline stage, in milliseconds.
    pub stage_timeout_ms: Option<u64>,
    pub merge_mode: MergeMode,
    pub aliases: AliasTable,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            weights: MappingWeights::default(),
            candidate_floor: 0.30,
            assignment_threshold: 0.60,
            flag_margin: 0.10,
            alias_floor: 0.90,
            qa_min_confidence: 0.40,
            max_attempts: 3,
            max_reextraction_requests: 1,
            stage_timeout_ms: Some(30_000),
            merge_mode: MergeMode::SingleSource,
            aliases: AliasTable::default(),
        }
    }
}

impl MappingConfig {
    /// Tight thresholds for submission-quality mapping.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            candidate_floor: 0.40,
            assignment_threshold: 0.75,
            ..Self::default()
        }
    }

    /// Loose thresholds for exploratory mapping.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            candidate_floor: 0.25,
            assignment_threshold: 0.50,
            ..Self::default()
        }
    }

    /// Validates ranges and relationships between knobs.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.weights.validate()?;
        for (name, value) in [
            ("candidate_floor", self.candidate_floor),
            ("assignment_threshold", self.assignment_threshold),
            ("flag_margin", self.flag_margin),
            ("alias_floor", self.alias_floor),
            ("qa_min_confidence", self.qa_min_confidence),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ModelError::InvalidConfig(format!(
                    "'{name}' must be within [0, 1], got {value}"
                )));
            }
        }
        if self.candidate_floor > self.assignment_threshold {
            return Err(ModelError::InvalidConfig(format!(
                "candidate_floor {} exceeds assignment_threshold {}",
                self.candidate_floor, self.assignment_threshold
            )));
        }
        if self.qa_min_confidence > self.assignment_threshold {
            return Err(ModelError::InvalidConfig(format!(
                "qa_min_confidence {} exceeds assignment_threshold {}",
                self.qa_min_confidence, self.assignment_threshold
            )));
        }
        if self.max_attempts == 0 {
            return Err(ModelError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
