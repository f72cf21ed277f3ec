// Pipeline processing: detection, quality scoring, tagging, and publication

pub mod detect;
pub mod heuristics;
pub mod publish;
pub mod quality_gate;
pub mod tagging;

pub use detect::detect;
pub use heuristics::LocalHeuristicEngine;
pub use quality_gate::{QualityGate, QualityTier, ValidationScoringEngine};
