//! `hypothesis_model` — data contract with the native hypothesis optimiser.
//!
//! # Module layout
//! - [`types`]  — Hypothesis kind table and generation bitmask
//! - [`params`] — Fixed-layout parameter block sent to the engine
//! - [`record`] — Read-only view of hypothesis records returned by the engine
//! - [`loader`] — JSON model document → parameter block
//! - [`engine`] — Trait for the opaque engine call and the call driver
//! - [`error`]  — Shared error type

pub mod engine;
pub mod error;
pub mod loader;
pub mod params;
pub mod record;
pub mod types;

pub use engine::{run_engine, HypothesisEngine};
pub use error::{ModelError, ModelResult};
pub use loader::{load_model_file, LoadDiagnostic, LoadedModel, ParameterLoader};
pub use params::{ParameterBlock, RawParameterBlock, PARAMETER_BLOCK_SIZE};
pub use record::{decode_records, HypothesisRecord, HYPOTHESIS_RECORD_SIZE};
pub use types::{HypothesisKind, HypothesisMask, KIND_COUNT};
