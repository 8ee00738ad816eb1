//! Cross-stream alignment.
//!
//! Two windows are paired positionally, in walk order: the i-th primary
//! reading goes with the i-th secondary group. Timestamps are not matched;
//! streams sampled at different rates pair by arrival rank.
//!
//! ```text
//! OneToOne:    T0 T1 T2 T3 T4          Grouped(3):  T0         T1
//!              H0 H1 H2                             W0 W1 W2   W3 W4 W5   W6
//!              -> 3 pairs, 2 T left                 -> 2 pairs, 1 W left
//! ```

use std::num::NonZeroUsize;

use crate::reading::Reading;

/// How secondary readings are matched to each primary reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignMode {
    /// One secondary reading per primary reading.
    OneToOne,
    /// `n` consecutive secondary readings per primary reading, reduced by
    /// arithmetic mean.
    Grouped(NonZeroUsize),
}

impl AlignMode {
    /// Three secondary readings per primary reading (wind chill).
    pub const ONE_TO_THREE: AlignMode = AlignMode::Grouped(NonZeroUsize::MIN.saturating_add(2));

    /// Secondary readings consumed per aligned tuple.
    pub const fn group_size(&self) -> usize {
        match self {
            Self::OneToOne => 1,
            Self::Grouped(n) => n.get(),
        }
    }
}

impl std::fmt::Display for AlignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneToOne => write!(f, "1:1"),
            Self::Grouped(n) => write!(f, "1:{n}"),
        }
    }
}

/// Which input of an alignment a leftover belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Primary,
    Secondary,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Non-fatal report that one input had unconsumed readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentMismatch {
    pub side: Side,
    pub count: usize,
}

/// One primary reading and the secondary readings aligned with it.
#[derive(Debug, Clone)]
pub struct Aligned {
    pub primary: Reading,
    pub secondary: Vec<Reading>,
}

impl Aligned {
    /// Arithmetic mean of the secondary values (the value itself in 1:1 mode).
    pub fn secondary_mean(&self) -> f64 {
        let sum: f64 = self.secondary.iter().map(|r| r.value).sum();
        sum / self.secondary.len() as f64
    }
}

/// Result of aligning two windows.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub tuples: Vec<Aligned>,
    /// Unconsumed primary readings.
    pub primary_left: usize,
    /// Unconsumed secondary readings.
    pub secondary_left: usize,
}

impl Alignment {
    /// Leftover conditions, primary side first. Empty when both inputs were
    /// fully consumed.
    pub fn mismatches(&self) -> Vec<AlignmentMismatch> {
        let mut out = Vec::new();
        if self.primary_left > 0 {
            out.push(AlignmentMismatch {
                side: Side::Primary,
                count: self.primary_left,
            });
        }
        if self.secondary_left > 0 {
            out.push(AlignmentMismatch {
                side: Side::Secondary,
                count: self.secondary_left,
            });
        }
        out
    }

    pub fn is_balanced(&self) -> bool {
        self.primary_left == 0 && self.secondary_left == 0
    }
}

/// Align `primary` with `secondary` according to `mode`.
///
/// Both inputs are expected in ascending order (as returned by
/// [`crate::window::extract_window`]). Alignment stops as soon as the primary
/// window is exhausted or fewer than a full group of secondary readings
/// remain.
pub fn align(mode: AlignMode, primary: Vec<Reading>, secondary: Vec<Reading>) -> Alignment {
    let group = mode.group_size();
    let n_tuples = primary.len().min(secondary.len() / group);

    let primary_left = primary.len() - n_tuples;
    let secondary_left = secondary.len() - n_tuples * group;

    let mut secondary = secondary.into_iter();
    let tuples = primary
        .into_iter()
        .take(n_tuples)
        .map(|p| Aligned {
            primary: p,
            secondary: secondary.by_ref().take(group).collect(),
        })
        .collect();

    Alignment {
        tuples,
        primary_left,
        secondary_left,
    }
}
