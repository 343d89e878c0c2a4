//! Loading model files from disk and handing them to an engine.

use approx::assert_abs_diff_eq;
use hypothesis_model::{
    load_model_file, run_engine, HypothesisEngine, HypothesisKind, ModelError, ParameterBlock,
    PARAMETER_BLOCK_SIZE,
};
use std::io::Write;
use std::path::Path;

fn shipped_model() -> &'static Path {
    Path::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/models/cell_hypothesis.json"
    ))
}

#[test]
fn shipped_model_loads_cleanly() {
    let loaded = load_model_file(shipped_model()).unwrap();
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);

    let block = loaded.block;
    assert_eq!(block.name, "cell_hypothesis");
    assert_abs_diff_eq!(block.lambda_branch, 50.0);
    assert_abs_diff_eq!(block.dist_thresh, 40.0);
    assert_eq!(block.apop_thresh, 5);
    assert!(block.relax);
    // Everything except merge
    assert_eq!(block.hypotheses_to_generate.bits(), 0b011_1111);
    assert!(!block.hypotheses_to_generate.contains(HypothesisKind::Merge));
}

#[test]
fn model_file_with_typo_still_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"HypothesisModel": {{"name": "typo", "theta_dsit": 9.0,
            "hypotheses": ["P_FP", "P_brnach"]}}}}"#
    )
    .unwrap();

    let loaded = load_model_file(file.path()).unwrap();
    assert_abs_diff_eq!(loaded.block.theta_dist, 0.0);
    assert_eq!(loaded.block.hypotheses_to_generate.bits(), 1);
    assert_eq!(loaded.diagnostics.len(), 2);
}

#[test]
fn missing_and_invalid_files_carry_the_path() {
    let err = load_model_file(Path::new("/nonexistent/model.json")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/model.json"));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"HypothesisModel": {{"hypotheses": []}}}}"#).unwrap();
    let err = load_model_file(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::MissingField("name"))
    ));
}

/// Returns one initialisation hypothesis per call.
struct SingleInit;

impl HypothesisEngine for SingleInit {
    fn generate(&mut self, params: &[u8; PARAMETER_BLOCK_SIZE]) -> anyhow::Result<Vec<u8>> {
        let block = ParameterBlock::from_bytes(params)?;
        anyhow::ensure!(block.hypotheses_to_generate.contains(HypothesisKind::Initialization));
        let mut rec = vec![0u8; hypothesis_model::HYPOTHESIS_RECORD_SIZE];
        rec[0..4].copy_from_slice(&1u32.to_ne_bytes());
        rec[4..8].copy_from_slice(&42u32.to_ne_bytes());
        rec[8..16].copy_from_slice(&(-0.25f64).to_ne_bytes());
        Ok(rec)
    }
}

#[test]
fn shipped_model_drives_engine() {
    let block = load_model_file(shipped_model()).unwrap().block;
    let records = run_engine(&mut SingleInit, &block).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind(), HypothesisKind::Initialization);
    assert_eq!(records[0].id(), 42);
    assert_abs_diff_eq!(records[0].log_likelihood(), -0.25);
}
