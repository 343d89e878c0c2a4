//! Read-only view over the hypothesis records returned by the engine.
//!
//! Each record is a 40-byte C struct in native endianness:
//! `hypothesis: u32 | id: u32 | probability: f64 | link_id: u32 |
//! child_one_id: u32 | child_two_id: u32 | parent_one_id: u32 |
//! parent_two_id: u32 | 4 bytes trailing padding`.
//!
//! The `probability` slot has always held a log-likelihood; the slot keeps its
//! legacy name and position, while the accessor is [`HypothesisRecord::log_likelihood`].

use crate::error::{ModelError, ModelResult};
use crate::params::{get_f64, get_u32};
use crate::types::HypothesisKind;
use serde::Serialize;

/// Size in bytes of one encoded hypothesis record.
pub const HYPOTHESIS_RECORD_SIZE: usize = 40;

const OFF_KIND: usize = 0;
const OFF_ID: usize = 4;
const OFF_PROBABILITY: usize = 8;
const OFF_LINK_ID: usize = 16;
const OFF_CHILD_ONE_ID: usize = 20;
const OFF_CHILD_TWO_ID: usize = 24;
const OFF_PARENT_ONE_ID: usize = 28;
const OFF_PARENT_TWO_ID: usize = 32;

/// One hypothesis produced by the optimiser. Immutable once decoded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HypothesisRecord {
    kind: HypothesisKind,
    id: u32,
    #[serde(rename = "log_likelihood")]
    probability: f64,
    link_id: u32,
    child_one_id: u32,
    child_two_id: u32,
    parent_one_id: u32,
    parent_two_id: u32,
}

impl HypothesisRecord {
    /// Decode one record. `bytes` must be exactly [`HYPOTHESIS_RECORD_SIZE`] long.
    ///
    /// A kind index outside the kind table means the engine output is corrupt
    /// and fails with [`ModelError::IndexOutOfRange`].
    pub fn from_bytes(bytes: &[u8]) -> ModelResult<Self> {
        if bytes.len() != HYPOTHESIS_RECORD_SIZE {
            return Err(ModelError::Truncated {
                expected: HYPOTHESIS_RECORD_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            kind: HypothesisKind::kind_at(get_u32(bytes, OFF_KIND))?,
            id: get_u32(bytes, OFF_ID),
            probability: get_f64(bytes, OFF_PROBABILITY),
            link_id: get_u32(bytes, OFF_LINK_ID),
            child_one_id: get_u32(bytes, OFF_CHILD_ONE_ID),
            child_two_id: get_u32(bytes, OFF_CHILD_TWO_ID),
            parent_one_id: get_u32(bytes, OFF_PARENT_ONE_ID),
            parent_two_id: get_u32(bytes, OFF_PARENT_TWO_ID),
        })
    }

    pub fn kind(&self) -> HypothesisKind {
        self.kind
    }

    /// Identifier, unique within one engine result set.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Log-likelihood of this hypothesis (stored in the legacy `probability` slot).
    pub fn log_likelihood(&self) -> f64 {
        self.probability
    }

    /// Removed: always fails, pointing at [`Self::log_likelihood`].
    #[deprecated(note = "score is deprecated, use log_likelihood")]
    pub fn score(&self) -> ModelResult<f64> {
        Err(ModelError::DeprecatedApi {
            replacement: "log_likelihood",
        })
    }

    pub fn link_id(&self) -> u32 {
        self.link_id
    }

    pub fn child_one_id(&self) -> u32 {
        self.child_one_id
    }

    pub fn child_two_id(&self) -> u32 {
        self.child_two_id
    }

    pub fn parent_one_id(&self) -> u32 {
        self.parent_one_id
    }

    pub fn parent_two_id(&self) -> u32 {
        self.parent_two_id
    }
}

/// Decode a contiguous buffer of records, as returned by one engine call.
pub fn decode_records(bytes: &[u8]) -> ModelResult<Vec<HypothesisRecord>> {
    if bytes.len() % HYPOTHESIS_RECORD_SIZE != 0 {
        return Err(ModelError::Truncated {
            expected: HYPOTHESIS_RECORD_SIZE,
            actual: bytes.len(),
        });
    }
    bytes
        .chunks_exact(HYPOTHESIS_RECORD_SIZE)
        .map(HypothesisRecord::from_bytes)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::params::{put_f64, put_u32};
    use approx::assert_abs_diff_eq;

    /// Build the engine's byte form of a record: `[kind, id, link, c1, c2, p1, p2]`.
    pub(crate) fn record_bytes(ids: [u32; 7], log_likelihood: f64) -> [u8; HYPOTHESIS_RECORD_SIZE] {
        let mut buf = [0u8; HYPOTHESIS_RECORD_SIZE];
        put_u32(&mut buf, OFF_KIND, ids[0]);
        put_u32(&mut buf, OFF_ID, ids[1]);
        put_f64(&mut buf, OFF_PROBABILITY, log_likelihood);
        put_u32(&mut buf, OFF_LINK_ID, ids[2]);
        put_u32(&mut buf, OFF_CHILD_ONE_ID, ids[3]);
        put_u32(&mut buf, OFF_CHILD_TWO_ID, ids[4]);
        put_u32(&mut buf, OFF_PARENT_ONE_ID, ids[5]);
        put_u32(&mut buf, OFF_PARENT_TWO_ID, ids[6]);
        buf
    }

    #[test]
    fn decodes_branch_record() {
        let rec = HypothesisRecord::from_bytes(&record_bytes([4, 17, 0, 21, 22, 0, 0], -3.25))
            .unwrap();
        assert_eq!(rec.kind(), HypothesisKind::Branch);
        assert_eq!(rec.id(), 17);
        assert_abs_diff_eq!(rec.log_likelihood(), -3.25);
        assert_eq!(rec.link_id(), 0);
        assert_eq!(rec.child_one_id(), 21);
        assert_eq!(rec.child_two_id(), 22);
        assert_eq!(rec.parent_one_id(), 0);
        assert_eq!(rec.parent_two_id(), 0);
    }

    #[test]
    fn log_likelihood_is_not_clamped() {
        let rec = HypothesisRecord::from_bytes(&record_bytes([3, 1, 2, 0, 0, 0, 0], 12.5))
            .unwrap();
        assert_abs_diff_eq!(rec.log_likelihood(), 12.5);
    }

    #[test]
    fn corrupt_kind_index_is_rejected() {
        let err = HypothesisRecord::from_bytes(&record_bytes([7, 1, 0, 0, 0, 0, 0], 0.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::IndexOutOfRange(7)));
    }

    #[test]
    #[allow(deprecated)]
    fn score_always_fails() {
        for (kind, ll) in [(0, 0.0), (3, -1.5), (6, f64::NAN), (5, 1e300)] {
            let rec = HypothesisRecord::from_bytes(&record_bytes([kind, 9, 1, 2, 3, 4, 5], ll))
                .unwrap();
            assert!(matches!(
                rec.score(),
                Err(ModelError::DeprecatedApi {
                    replacement: "log_likelihood"
                })
            ));
        }
    }

    #[test]
    fn decode_records_splits_buffer() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record_bytes([1, 1, 0, 0, 0, 0, 0], -0.5));
        buf.extend_from_slice(&record_bytes([3, 2, 1, 0, 0, 0, 0], -1.5));
        buf.extend_from_slice(&record_bytes([2, 3, 0, 0, 0, 0, 0], -2.5));

        let records = decode_records(&buf).unwrap();
        let kinds: Vec<_> = records.iter().map(HypothesisRecord::kind).collect();
        assert_eq!(
            kinds,
            vec![
                HypothesisKind::Initialization,
                HypothesisKind::Link,
                HypothesisKind::Termination
            ]
        );
        assert_eq!(records[1].link_id(), 1);
        assert!(decode_records(&[]).unwrap().is_empty());
    }

    #[test]
    fn decode_records_rejects_partial_record() {
        let buf = record_bytes([0, 1, 0, 0, 0, 0, 0], 0.0);
        assert!(matches!(
            decode_records(&buf[..36]),
            Err(ModelError::Truncated {
                expected: HYPOTHESIS_RECORD_SIZE,
                actual: 36
            })
        ));
    }

    #[test]
    fn serializes_likelihood_under_new_name() {
        let rec = HypothesisRecord::from_bytes(&record_bytes([5, 8, 0, 0, 0, 0, 0], -2.0))
            .unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["kind"], "Death");
        assert_eq!(json["log_likelihood"], -2.0);
        assert!(json.get("probability").is_none());
    }
}
