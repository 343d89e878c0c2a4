//! Boundary with the native hypothesis engine.
//!
//! The engine is a single blocking call: it receives the encoded parameter
//! block and returns a buffer of fixed-size hypothesis records. How it is
//! bound (dynamic library, subprocess, test double) is up to the implementor.

use crate::params::{ParameterBlock, PARAMETER_BLOCK_SIZE};
use crate::record::{decode_records, HypothesisRecord};
use anyhow::Context;
use tracing::debug;

/// The opaque hypothesis generation call.
pub trait HypothesisEngine {
    /// Generate hypotheses for one parameter block, returning the raw record buffer.
    fn generate(&mut self, params: &[u8; PARAMETER_BLOCK_SIZE]) -> anyhow::Result<Vec<u8>>;
}

/// Validate, encode, invoke the engine once and decode its output.
pub fn run_engine<E: HypothesisEngine + ?Sized>(
    engine: &mut E,
    block: &ParameterBlock,
) -> anyhow::Result<Vec<HypothesisRecord>> {
    block
        .validate()
        .with_context(|| format!("invalid parameters for model '{}'", block.name))?;

    let raw = engine
        .generate(&block.to_bytes())
        .with_context(|| format!("hypothesis engine failed for model '{}'", block.name))?;
    let records = decode_records(&raw).context("corrupt hypothesis engine output")?;

    debug!(
        model = %block.name,
        mask = %block.hypotheses_to_generate,
        records = records.len(),
        "Engine returned hypotheses"
    );
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
