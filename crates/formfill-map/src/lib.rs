//! Field mapping: similarity scoring and candidate assignment.
//!
//! [`score`] holds the four independent similarity strategies; [`engine`]
//! combines them into composite confidences and resolves a full candidate
//! matrix into a one-to-one (or per-document) assignment.

#![deny(unsafe_code)]

pub mod engine;
pub mod score;

pub use engine::MappingEngine;
pub use score::{PairScore, ScoreCache, StrategyScores};
