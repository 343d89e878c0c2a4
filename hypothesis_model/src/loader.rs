//! Parameter loader: model configuration document → [`ParameterBlock`].
//!
//! # Document shape
//! ```json
//! { "HypothesisModel": {
//!     "name": "cell_hypothesis",
//!     "lambda_time": 5.0,
//!     "apop_thresh": 5,
//!     "relax": true,
//!     "hypotheses": ["P_FP", "P_init", "P_term", "P_link"]
//! } }
//! ```
//!
//! # Loading steps
//! 1. Locate the `HypothesisModel` object
//! 2. Assign every known numeric/boolean key through the field table
//! 3. Read `name`
//! 4. Read `hypotheses` and build the generation mask
//!
//! Unknown keys and unrecognised hypothesis names are accepted and reported
//! as [`LoadDiagnostic`]s. Any other problem aborts the whole load.

use crate::error::{ModelError, ModelResult};
use crate::params::ParameterBlock;
use crate::types::{HypothesisKind, HypothesisMask};
use anyhow::Context;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

const MODEL_KEY: &str = "HypothesisModel";
const NAME_KEY: &str = "name";
const HYPOTHESES_KEY: &str = "hypotheses";
/// Part of the block, but always computed from `hypotheses`.
const MASK_KEY: &str = "hypotheses_to_generate";

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

type Assign = fn(&mut ParameterBlock, &Value) -> ModelResult<()>;

/// One assignable parameter: configuration key plus typed setter.
struct FieldSetter {
    key: &'static str,
    assign: Assign,
}

macro_rules! float_field {
    ($field:ident) => {
        FieldSetter {
            key: stringify!($field),
            assign: |block, value| {
                block.$field = coerce_f64(stringify!($field), value)?;
                Ok(())
            },
        }
    };
}

const FIELDS: [FieldSetter; 13] = [
    float_field!(lambda_time),
    float_field!(lambda_dist),
    float_field!(lambda_link),
    float_field!(lambda_branch),
    float_field!(eta),
    float_field!(theta_dist),
    float_field!(theta_time),
    float_field!(dist_thresh),
    float_field!(time_thresh),
    FieldSetter {
        key: "apop_thresh",
        assign: |block, value| {
            block.apop_thresh = coerce_u32("apop_thresh", value)?;
            Ok(())
        },
    },
    float_field!(segmentation_miss_rate),
    float_field!(apoptosis_rate),
    FieldSetter {
        key: "relax",
        assign: |block, value| {
            block.relax = coerce_bool("relax", value)?;
            Ok(())
        },
    },
];

fn coerce_f64(key: &'static str, value: &Value) -> ModelResult<f64> {
    let v = value.as_f64().ok_or(ModelError::TypeMismatch(key))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ModelError::NonFinite(key))
    }
}

fn coerce_u32(key: &'static str, value: &Value) -> ModelResult<u32> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(ModelError::TypeMismatch(key))
}

fn coerce_bool(key: &'static str, value: &Value) -> ModelResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ModelError::TypeMismatch(key)),
        },
        _ => Err(ModelError::TypeMismatch(key)),
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Non-fatal findings from a load. These never change the resulting block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadDiagnostic {
    /// Key in `HypothesisModel` that matches no parameter (possibly a typo)
    UnknownKey(String),
    /// Key naming a field that is never read from the document
    ReservedKey(String),
    /// Entry in `hypotheses` that names no known kind
    UnrecognizedHypothesis(String),
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadDiagnostic::UnknownKey(k) => write!(f, "ignored unknown key `{k}`"),
            LoadDiagnostic::ReservedKey(k) => {
                write!(f, "ignored `{k}`, it is computed from `{HYPOTHESES_KEY}`")
            }
            LoadDiagnostic::UnrecognizedHypothesis(h) => {
                write!(f, "ignored unrecognised hypothesis `{h}`")
            }
        }
    }
}

/// A loaded block together with everything the loader chose to ignore.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedModel {
    pub block: ParameterBlock,
    pub diagnostics: Vec<LoadDiagnostic>,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Stateless loader; every call is an independent transformation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParameterLoader;

impl ParameterLoader {
    /// Load a block, discarding diagnostics.
    pub fn load(document: &Value) -> ModelResult<ParameterBlock> {
        Self::load_with_diagnostics(document).map(|loaded| loaded.block)
    }

    /// Parse JSON text and load it.
    pub fn load_str(text: &str) -> ModelResult<LoadedModel> {
        let document: Value = serde_json::from_str(text)?;
        Self::load_with_diagnostics(&document)
    }

    pub fn load_with_diagnostics(document: &Value) -> ModelResult<LoadedModel> {
        let model = match document.get(MODEL_KEY) {
            Some(Value::Object(model)) => model,
            Some(_) => return Err(ModelError::TypeMismatch(MODEL_KEY)),
            None => return Err(ModelError::MissingField(MODEL_KEY)),
        };

        let mut block = ParameterBlock::default();
        let mut diagnostics = Vec::new();

        assign_fields(model, &mut block, &mut diagnostics)?;

        block.name = match model.get(NAME_KEY) {
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(ModelError::TypeMismatch(NAME_KEY)),
            None => return Err(ModelError::MissingField(NAME_KEY)),
        };

        let hypotheses = hypothesis_names(model)?;
        block.hypotheses_to_generate = generation_mask(&hypotheses);
        for name in hypotheses {
            if HypothesisKind::from_name(name).is_none() {
                diagnostics.push(LoadDiagnostic::UnrecognizedHypothesis(name.to_owned()));
            }
        }

        for d in &diagnostics {
            warn!(model = %block.name, "{d}");
        }
        debug!(
            model = %block.name,
            mask = %block.hypotheses_to_generate,
            ignored = diagnostics.len(),
            "Loaded hypothesis model"
        );

        Ok(LoadedModel { block, diagnostics })
    }
}

/// Assign every recognised key in document order.
fn assign_fields(
    model: &Map<String, Value>,
    block: &mut ParameterBlock,
    diagnostics: &mut Vec<LoadDiagnostic>,
) -> ModelResult<()> {
    for (key, value) in model {
        match FIELDS.iter().find(|f| f.key == key) {
            Some(field) => (field.assign)(block, value)?,
            None if key == MASK_KEY => diagnostics.push(LoadDiagnostic::ReservedKey(key.clone())),
            None if key == NAME_KEY || key == HYPOTHESES_KEY => {}
            None => diagnostics.push(LoadDiagnostic::UnknownKey(key.clone())),
        }
    }
    Ok(())
}

fn hypothesis_names(model: &Map<String, Value>) -> ModelResult<Vec<&str>> {
    let entries = match model.get(HYPOTHESES_KEY) {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ModelError::TypeMismatch(HYPOTHESES_KEY)),
        None => return Err(ModelError::MissingField(HYPOTHESES_KEY)),
    };
    entries
        .iter()
        .map(|e| e.as_str().ok_or(ModelError::TypeMismatch(HYPOTHESES_KEY)))
        .collect()
}

/// Bit `i` is set iff the name of table kind `i` appears anywhere in `names`.
pub fn generation_mask(names: &[&str]) -> HypothesisMask {
    HypothesisKind::ALL
        .into_iter()
        .filter(|kind| names.contains(&kind.name()))
        .collect()
}

/// Read and load a JSON model file.
pub fn load_model_file(path: &Path) -> anyhow::Result<LoadedModel> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading hypothesis model {}", path.display()))?;
    let loaded = ParameterLoader::load_str(&text)
        .with_context(|| format!("loading hypothesis model {}", path.display()))?;
    Ok(loaded)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
