//! Cue points and the ordered index of ad-break positions.
//!
//! The index is built once when advertising is attached and never mutated
//! afterwards. Breaks are retired through their status, never by removal,
//! so indices stay stable for the seek searches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A break position on the content timeline, in milliseconds.
///
/// Two values are reserved: [`CuePoint::PRE`] (0) plays before content
/// starts and [`CuePoint::POST`] (-1) plays after content ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuePoint(pub i64);

impl CuePoint {
    pub const PRE: CuePoint = CuePoint(0);
    pub const POST: CuePoint = CuePoint(-1);

    pub fn millis(self) -> i64 {
        self.0
    }

    pub fn is_preroll(self) -> bool {
        self == Self::PRE
    }

    pub fn is_postroll(self) -> bool {
        self == Self::POST
    }

    pub fn is_midroll(self) -> bool {
        self.0 > 0
    }

    /// Anything below the postroll sentinel is meaningless.
    pub fn is_valid(self) -> bool {
        self.0 >= Self::POST.0
    }

    /// Ordering key that puts the postroll sentinel after every midroll.
    fn order_key(self) -> i64 {
        if self.is_postroll() { i64::MAX } else { self.0 }
    }
}

impl fmt::Display for CuePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CuePoint::PRE => write!(f, "preroll"),
            CuePoint::POST => write!(f, "postroll"),
            CuePoint(ms) => write!(f, "{}ms", ms),
        }
    }
}

/// Ascending sequence of unique cue points.
///
/// `PRE`, if present, is always first and `POST`, if present, is always
/// last regardless of its numeric value. An empty index means the session
/// has no advertising.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CuePointIndex {
    points: Vec<CuePoint>,
}

impl CuePointIndex {
    /// Build an index from cue points in any order.
    ///
    /// Duplicates collapse into one entry and invalid positions are dropped.
    pub fn new(points: impl IntoIterator<Item = CuePoint>) -> Self {
        let mut points: Vec<CuePoint> = points.into_iter().filter(|p| p.is_valid()).collect();
        points.sort_by_key(|p| p.order_key());
        points.dedup();
        CuePointIndex { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<CuePoint> {
        self.points.get(index).copied()
    }

    pub fn first(&self) -> Option<CuePoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<CuePoint> {
        self.points.last().copied()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }

    pub fn has_preroll(&self) -> bool {
        self.first() == Some(CuePoint::PRE)
    }

    pub fn has_postroll(&self) -> bool {
        self.last() == Some(CuePoint::POST)
    }

    /// Number of breaks that are neither preroll nor postroll.
    pub fn midroll_count(&self) -> usize {
        self.midroll_range().len()
    }

    /// Index range covering only the midroll breaks.
    pub fn midroll_range(&self) -> Range<usize> {
        let start = usize::from(self.has_preroll());
        let end = self.points.len() - usize::from(self.has_postroll());
        start..end.max(start)
    }

    /// Index of the postroll break, if configured.
    pub fn postroll_index(&self) -> Option<usize> {
        if self.has_postroll() { self.last_index() } else { None }
    }

    /// The break the monitor cursor moves to after `index` fires.
    ///
    /// `None` when `index` is the last break or the postroll.
    pub fn successor(&self, index: usize) -> Option<usize> {
        let cue = self.at(index)?;
        if index + 1 < self.points.len() && !cue.is_postroll() {
            Some(index + 1)
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[CuePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = CuePoint> + '_ {
        self.points.iter().copied()
    }
}
