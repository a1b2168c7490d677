use crate::cue_point::{CuePoint, CuePointIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Lifecycle state shared by single ads and whole breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdState {
    Ready,
    Playing,
    Error,
    Played,
}

impl AdState {
    /// PLAYED and ERROR are final: a break in either state is never retried.
    pub fn is_terminal(self) -> bool {
        matches!(self, AdState::Played | AdState::Error)
    }
}

impl fmt::Display for AdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdState::Ready => write!(f, "ready"),
            AdState::Playing => write!(f, "playing"),
            AdState::Error => write!(f, "error"),
            AdState::Played => write!(f, "played"),
        }
    }
}

/// One waterfall candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ad {
    /// Opaque playable reference handed to the playback requester.
    pub tag: String,
    pub state: AdState,
}

impl Ad {
    pub fn new(tag: String) -> Self {
        Ad {
            tag,
            state: AdState::Ready,
        }
    }
}

/// An ad break: the candidates in waterfall priority order plus the
/// break-level state.
///
/// While the break is PLAYING exactly one ad is PLAYING, every ad before it
/// is ERROR and every ad after it is still READY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdBreak {
    pub cue: CuePoint,
    pub ads: Vec<Ad>,
    pub state: AdState,
}

impl AdBreak {
    pub fn new(cue: CuePoint, tags: Vec<String>) -> Self {
        AdBreak {
            cue,
            ads: tags.into_iter().map(Ad::new).collect(),
            state: AdState::Ready,
        }
    }

    /// The candidate currently on offer, if any.
    pub fn playing_ad(&self) -> Option<&Ad> {
        self.ads.iter().find(|ad| ad.state == AdState::Playing)
    }

    pub fn ad_count(&self) -> usize {
        self.ads.len()
    }
}

/// Break waterfalls keyed by cue position.
#[derive(Debug, Clone, Default)]
pub struct AdBreakTable {
    breaks: HashMap<CuePoint, AdBreak>,
}

impl AdBreakTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a break. A break already present at the same position
    /// absorbs the new candidates at the end of its waterfall.
    pub fn insert(&mut self, ad_break: AdBreak) {
        match self.breaks.get_mut(&ad_break.cue) {
            Some(existing) => existing.ads.extend(ad_break.ads),
            None => {
                self.breaks.insert(ad_break.cue, ad_break);
            }
        }
    }

    pub fn get(&self, cue: CuePoint) -> Option<&AdBreak> {
        self.breaks.get(&cue)
    }

    pub fn get_mut(&mut self, cue: CuePoint) -> Option<&mut AdBreak> {
        self.breaks.get_mut(&cue)
    }

    pub fn len(&self) -> usize {
        self.breaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }
}

/// The cue index together with its break table, built in one step so the
/// two always describe the same set of positions.
#[derive(Debug, Clone, Default)]
pub struct AdvertisingPlan {
    pub cues: CuePointIndex,
    pub breaks: AdBreakTable,
}

impl AdvertisingPlan {
    pub fn new(breaks: impl IntoIterator<Item = AdBreak>) -> Self {
        let mut table = AdBreakTable::new();
        for ad_break in breaks.into_iter().filter(|b| b.cue.is_valid()) {
            table.insert(ad_break);
        }
        let cues = CuePointIndex::new(table.breaks.keys().copied());
        AdvertisingPlan {
            cues,
            breaks: table,
        }
    }

    /// Break at cue-list index `index`.
    pub fn break_at(&self, index: usize) -> Option<&AdBreak> {
        self.cues.at(index).and_then(|cue| self.breaks.get(cue))
    }

    pub fn break_at_mut(&mut self, index: usize) -> Option<&mut AdBreak> {
        let cue = self.cues.at(index)?;
        self.breaks.get_mut(cue)
    }

    /// Every break in cue order.
    pub fn iter(&self) -> impl Iterator<Item = &AdBreak> + '_ {
        self.cues.iter().filter_map(|cue| self.breaks.get(cue))
    }
}
