//! Document-type classification: selects a weight profile for mapping.
//!
//! The profile only replaces weights that are still at their defaults, so
//! explicit per-job weight overrides always win over the hint.

use tracing::debug;

use formfill_model::{MappingConfig, MappingWeights};

/// Weight profile for a document-type hint.
///
/// Unrecognized or absent hints return `None` and the job proceeds with
/// its current configuration.
pub fn profile_for(hint: &str) -> Option<MappingWeights> {
    match hint.trim().to_lowercase().as_str() {
        // Machine-generated forms carry clean, reliable field names.
        "structured" | "form" | "table" => Some(MappingWeights::lexical_heavy()),
        // Scans and free text have noisy names; lean on the type signal.
        "freeform" | "scan" | "ocr" | "letter" => Some(MappingWeights::type_heavy()),
        _ => None,
    }
}

/// Applies the profile for `hint` to `config` when one matches.
pub fn apply_profile(config: &mut MappingConfig, hint: Option<&str>) {
    let Some(hint) = hint else {
        return;
    };
    if config.weights != MappingWeights::default() {
        debug!(hint, "weights explicitly configured, ignoring document-type profile");
        return;
    }
    if let Some(weights) = profile_for(hint) {
        debug!(hint, "applying document-type weight profile");
        config.weights = weights;
    }
}
