//! archweight-ranker: Metric weight derivation engine.
//!
//! Pipeline (leaves first): normalise → orient → {entropy, dependency,
//! variance} → combine → blend → capped projection.

pub mod weights;
pub mod normalise;
pub mod matrix;
pub mod orient;
pub mod entropy;
pub mod reference;
pub mod dependency;
pub mod variance;
pub mod combine;
pub mod projection;
pub mod blend;
pub mod pipeline;
pub mod scorer;
pub mod report;
pub mod assemble;

pub use matrix::MetricMatrix;
pub use orient::OrientedMatrix;
pub use pipeline::{run_pipeline, WeightingReport};
pub use projection::{project_capped_simplex, ProjectionOutcome};
pub use report::{ResultRow, ResultTable};
pub use weights::WeightVector;
