//! Fundamental types used across the crate: the hypothesis kind table and
//! the generation bitmask built over it.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Kind table — order is part of the engine's wire contract.
// Position i in `HypothesisKind::ALL` is bit i of the generation mask.
// ---------------------------------------------------------------------------

/// Number of hypothesis kinds known to the engine.
pub const KIND_COUNT: usize = 7;

/// One of the seven categories of hypothesis the engine can generate.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u32)]
pub enum HypothesisKind {
    /// Detection is spurious (`P_FP`)
    FalsePositive = 0,
    /// Track starts here (`P_init`)
    Initialization = 1,
    /// Track ends here (`P_term`)
    Termination = 2,
    /// Two track segments join (`P_link`)
    Link = 3,
    /// Track divides into two children (`P_branch`)
    Branch = 4,
    /// Track ends by apoptosis (`P_dead`)
    Death = 5,
    /// Two tracks merge into one (`P_merge`)
    Merge = 6,
}

impl HypothesisKind {
    /// All kinds in table order.
    pub const ALL: [HypothesisKind; KIND_COUNT] = [
        HypothesisKind::FalsePositive,
        HypothesisKind::Initialization,
        HypothesisKind::Termination,
        HypothesisKind::Link,
        HypothesisKind::Branch,
        HypothesisKind::Death,
        HypothesisKind::Merge,
    ];

    /// Look up the kind stored at `index` in the table.
    pub fn kind_at(index: u32) -> ModelResult<Self> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(ModelError::IndexOutOfRange(index))
    }

    /// Table position (and mask bit) of this kind.
    pub fn index_of(self) -> usize {
        self as usize
    }

    /// Name used for this kind in model configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            HypothesisKind::FalsePositive => "P_FP",
            HypothesisKind::Initialization => "P_init",
            HypothesisKind::Termination => "P_term",
            HypothesisKind::Link => "P_link",
            HypothesisKind::Branch => "P_branch",
            HypothesisKind::Death => "P_dead",
            HypothesisKind::Merge => "P_merge",
        }
    }

    /// Exact-match lookup of a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for HypothesisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Generation mask
// ---------------------------------------------------------------------------

/// Bitmask selecting which kinds the engine should generate.
/// Bit `i` corresponds to `HypothesisKind::ALL[i]`; bits above 6 are unused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HypothesisMask(pub u32);

impl HypothesisMask {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, kind: HypothesisKind) {
        self.0 |= 1 << kind.index_of();
    }

    pub fn contains(self, kind: HypothesisKind) -> bool {
        self.0 & (1 << kind.index_of()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.kinds().next().is_none()
    }

    /// Requested kinds in table order.
    pub fn kinds(self) -> impl Iterator<Item = HypothesisKind> {
        HypothesisKind::ALL
            .into_iter()
            .filter(move |&k| self.contains(k))
    }
}

impl FromIterator<HypothesisKind> for HypothesisMask {
    fn from_iter<I: IntoIterator<Item = HypothesisKind>>(iter: I) -> Self {
        let mut mask = Self::empty();
        for kind in iter {
            mask.insert(kind);
        }
        mask
    }
}

impl fmt::Display for HypothesisMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.kinds().map(HypothesisKind::name).collect();
        write!(f, "{:#09b} [{}]", self.0, names.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
