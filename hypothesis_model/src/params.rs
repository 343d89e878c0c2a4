//! Parameter block handed to the native optimiser.
//!
//! # Binary layout
//! The engine reads the block as a C struct (native endianness, natural
//! alignment). Offsets are written out explicitly below rather than derived
//! from any Rust type layout:
//!
//! | offset | width | field                    |
//! |--------|-------|--------------------------|
//! | 0      | 8     | `lambda_time`            |
//! | 8      | 8     | `lambda_dist`            |
//! | 16     | 8     | `lambda_link`            |
//! | 24     | 8     | `lambda_branch`          |
//! | 32     | 8     | `eta`                    |
//! | 40     | 8     | `theta_dist`             |
//! | 48     | 8     | `theta_time`             |
//! | 56     | 8     | `dist_thresh`            |
//! | 64     | 8     | `time_thresh`            |
//! | 72     | 4     | `apop_thresh`            |
//! | 76     | 4     | padding                  |
//! | 80     | 8     | `segmentation_miss_rate` |
//! | 88     | 8     | `apoptosis_rate`         |
//! | 96     | 1     | `relax`                  |
//! | 97     | 3     | padding                  |
//! | 100    | 4     | `hypotheses_to_generate` |
//!
//! `name` travels with the in-process value only.

use crate::error::{ModelError, ModelResult};
use crate::types::HypothesisMask;
use serde::{Deserialize, Serialize};
use std::mem::{offset_of, size_of};

/// Size in bytes of the encoded parameter block.
pub const PARAMETER_BLOCK_SIZE: usize = 104;

const OFF_LAMBDA_TIME: usize = 0;
const OFF_LAMBDA_DIST: usize = 8;
const OFF_LAMBDA_LINK: usize = 16;
const OFF_LAMBDA_BRANCH: usize = 24;
const OFF_ETA: usize = 32;
const OFF_THETA_DIST: usize = 40;
const OFF_THETA_TIME: usize = 48;
const OFF_DIST_THRESH: usize = 56;
const OFF_TIME_THRESH: usize = 64;
const OFF_APOP_THRESH: usize = 72;
const OFF_SEGMENTATION_MISS_RATE: usize = 80;
const OFF_APOPTOSIS_RATE: usize = 88;
const OFF_RELAX: usize = 96;
const OFF_HYPOTHESES_TO_GENERATE: usize = 100;

// ---------------------------------------------------------------------------
// ParameterBlock
// ---------------------------------------------------------------------------

/// Tunable hypothesis model parameters plus the generation mask.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterBlock {
    /// Human label for the model (not part of the binary block)
    pub name: String,
    /// Time-decay weight (lambda_1)
    pub lambda_time: f64,
    /// Distance weight (lambda_2)
    pub lambda_dist: f64,
    /// Linking weight (lambda_3)
    pub lambda_link: f64,
    /// Branching weight (lambda_4)
    pub lambda_branch: f64,
    /// Default low-probability floor
    pub eta: f64,
    pub theta_dist: f64,
    pub theta_time: f64,
    /// Distance beyond which a hypothesis is infeasible
    pub dist_thresh: f64,
    /// Time gap beyond which a hypothesis is infeasible
    pub time_thresh: f64,
    /// Frame count threshold for apoptosis hypotheses
    pub apop_thresh: u32,
    /// Assumed false-negative rate of the upstream segmentation
    pub segmentation_miss_rate: f64,
    pub apoptosis_rate: f64,
    /// Relax the distance/time threshold constraints
    pub relax: bool,
    /// Kinds the engine should generate
    pub hypotheses_to_generate: HypothesisMask,
}

impl ParameterBlock {
    /// All-default block carrying the given label.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Float fields by name, in layout order.
    fn float_fields(&self) -> [(&'static str, f64); 11] {
        [
            ("lambda_time", self.lambda_time),
            ("lambda_dist", self.lambda_dist),
            ("lambda_link", self.lambda_link),
            ("lambda_branch", self.lambda_branch),
            ("eta", self.eta),
            ("theta_dist", self.theta_dist),
            ("theta_time", self.theta_time),
            ("dist_thresh", self.dist_thresh),
            ("time_thresh", self.time_thresh),
            ("segmentation_miss_rate", self.segmentation_miss_rate),
            ("apoptosis_rate", self.apoptosis_rate),
        ]
    }

    /// Reject NaN / infinite floats; the engine assumes finite input.
    pub fn validate(&self) -> ModelResult<()> {
        match self.float_fields().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, _)) => Err(ModelError::NonFinite(field)),
            None => Ok(()),
        }
    }

    /// Encode into the engine's native layout. Padding bytes are zero.
    pub fn to_bytes(&self) -> [u8; PARAMETER_BLOCK_SIZE] {
        let mut buf = [0u8; PARAMETER_BLOCK_SIZE];
        put_f64(&mut buf, OFF_LAMBDA_TIME, self.lambda_time);
        put_f64(&mut buf, OFF_LAMBDA_DIST, self.lambda_dist);
        put_f64(&mut buf, OFF_LAMBDA_LINK, self.lambda_link);
        put_f64(&mut buf, OFF_LAMBDA_BRANCH, self.lambda_branch);
        put_f64(&mut buf, OFF_ETA, self.eta);
        put_f64(&mut buf, OFF_THETA_DIST, self.theta_dist);
        put_f64(&mut buf, OFF_THETA_TIME, self.theta_time);
        put_f64(&mut buf, OFF_DIST_THRESH, self.dist_thresh);
        put_f64(&mut buf, OFF_TIME_THRESH, self.time_thresh);
        put_u32(&mut buf, OFF_APOP_THRESH, self.apop_thresh);
        put_f64(&mut buf, OFF_SEGMENTATION_MISS_RATE, self.segmentation_miss_rate);
        put_f64(&mut buf, OFF_APOPTOSIS_RATE, self.apoptosis_rate);
        buf[OFF_RELAX] = u8::from(self.relax);
        put_u32(
            &mut buf,
            OFF_HYPOTHESES_TO_GENERATE,
            self.hypotheses_to_generate.bits(),
        );
        buf
    }

    /// Decode a block from the engine's native layout. The result is unnamed.
    pub fn from_bytes(bytes: &[u8]) -> ModelResult<Self> {
        if bytes.len() != PARAMETER_BLOCK_SIZE {
            return Err(ModelError::Truncated {
                expected: PARAMETER_BLOCK_SIZE,
                actual: bytes.len(),
            });
        }
        let relax = match bytes[OFF_RELAX] {
            0 => false,
            1 => true,
            _ => return Err(ModelError::TypeMismatch("relax")),
        };
        Ok(Self {
            name: String::new(),
            lambda_time: get_f64(bytes, OFF_LAMBDA_TIME),
            lambda_dist: get_f64(bytes, OFF_LAMBDA_DIST),
            lambda_link: get_f64(bytes, OFF_LAMBDA_LINK),
            lambda_branch: get_f64(bytes, OFF_LAMBDA_BRANCH),
            eta: get_f64(bytes, OFF_ETA),
            theta_dist: get_f64(bytes, OFF_THETA_DIST),
            theta_time: get_f64(bytes, OFF_THETA_TIME),
            dist_thresh: get_f64(bytes, OFF_DIST_THRESH),
            time_thresh: get_f64(bytes, OFF_TIME_THRESH),
            apop_thresh: get_u32(bytes, OFF_APOP_THRESH),
            segmentation_miss_rate: get_f64(bytes, OFF_SEGMENTATION_MISS_RATE),
            apoptosis_rate: get_f64(bytes, OFF_APOPTOSIS_RATE),
            relax,
            hypotheses_to_generate: HypothesisMask::from_bits(get_u32(
                bytes,
                OFF_HYPOTHESES_TO_GENERATE,
            )),
        })
    }
}

// ---------------------------------------------------------------------------
// RawParameterBlock — C mirror for engines bound by pointer
// ---------------------------------------------------------------------------

/// `#[repr(C)]` twin of the engine's `HypothesisParams` struct.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawParameterBlock {
    pub lambda_time: f64,
    pub lambda_dist: f64,
    pub lambda_link: f64,
    pub lambda_branch: f64,
    pub eta: f64,
    pub theta_dist: f64,
    pub theta_time: f64,
    pub dist_thresh: f64,
    pub time_thresh: f64,
    pub apop_thresh: u32,
    pub segmentation_miss_rate: f64,
    pub apoptosis_rate: f64,
    pub relax: bool,
    pub hypotheses_to_generate: u32,
}

const _: () = {
    assert!(size_of::<RawParameterBlock>() == PARAMETER_BLOCK_SIZE);
    assert!(offset_of!(RawParameterBlock, lambda_time) == OFF_LAMBDA_TIME);
    assert!(offset_of!(RawParameterBlock, lambda_dist) == OFF_LAMBDA_DIST);
    assert!(offset_of!(RawParameterBlock, lambda_link) == OFF_LAMBDA_LINK);
    assert!(offset_of!(RawParameterBlock, lambda_branch) == OFF_LAMBDA_BRANCH);
    assert!(offset_of!(RawParameterBlock, eta) == OFF_ETA);
    assert!(offset_of!(RawParameterBlock, theta_dist) == OFF_THETA_DIST);
    assert!(offset_of!(RawParameterBlock, theta_time) == OFF_THETA_TIME);
    assert!(offset_of!(RawParameterBlock, dist_thresh) == OFF_DIST_THRESH);
    assert!(offset_of!(RawParameterBlock, time_thresh) == OFF_TIME_THRESH);
    assert!(offset_of!(RawParameterBlock, apop_thresh) == OFF_APOP_THRESH);
    assert!(
        offset_of!(RawParameterBlock, segmentation_miss_rate) == OFF_SEGMENTATION_MISS_RATE
    );
    assert!(offset_of!(RawParameterBlock, apoptosis_rate) == OFF_APOPTOSIS_RATE);
    assert!(offset_of!(RawParameterBlock, relax) == OFF_RELAX);
    assert!(
        offset_of!(RawParameterBlock, hypotheses_to_generate) == OFF_HYPOTHESES_TO_GENERATE
    );
};

impl From<&ParameterBlock> for RawParameterBlock {
    fn from(p: &ParameterBlock) -> Self {
        Self {
            lambda_time: p.lambda_time,
            lambda_dist: p.lambda_dist,
            lambda_link: p.lambda_link,
            lambda_branch: p.lambda_branch,
            eta: p.eta,
            theta_dist: p.theta_dist,
            theta_time: p.theta_time,
            dist_thresh: p.dist_thresh,
            time_thresh: p.time_thresh,
            apop_thresh: p.apop_thresh,
            segmentation_miss_rate: p.segmentation_miss_rate,
            apoptosis_rate: p.apoptosis_rate,
            relax: p.relax,
            hypotheses_to_generate: p.hypotheses_to_generate.bits(),
        }
    }
}

// ---------------------------------------------------------------------------
// Byte helpers (shared with the record codec)
// ---------------------------------------------------------------------------

pub(crate) fn put_f64(buf: &mut [u8], offset: usize, value: f64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
}

pub(crate) fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

/// Caller guarantees `offset + 8 <= buf.len()`.
pub(crate) fn get_f64(buf: &[u8], offset: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_ne_bytes(raw)
}

/// Caller guarantees `offset + 4 <= buf.len()`.
pub(crate) fn get_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_ne_bytes(raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
