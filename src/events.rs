//! Events delivered by the host player and the actions sent back to it.

use serde::Serialize;
use std::fmt;

// ── Break reference ─────────────────────────────────────────────────────────

/// Identifies the break an ad request belongs to (its cue-list index).
///
/// Handed out with every [`Action::PlayAd`] and echoed back by the host on
/// the matching [`PlaybackEvent::Ad`] outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BreakRef(pub usize);

impl fmt::Display for BreakRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "break#{}", self.0)
    }
}

// ── Inbound ─────────────────────────────────────────────────────────────────

/// Why an ad failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdErrorKind {
    /// The player itself failed to play the ad. Abandons the whole break.
    VideoPlayError,
    /// The candidate could not be fetched or resolved.
    AdFetch,
    /// Any other ad-level failure.
    Other(String),
}

impl AdErrorKind {
    /// Whether the next waterfall candidate should be tried.
    pub fn is_waterfall_retriable(&self) -> bool {
        !matches!(self, AdErrorKind::VideoPlayError)
    }
}

/// Ad lifecycle notifications from the ad SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdEvent {
    Started,
    Completed,
    Skipped,
    Error(AdErrorKind),
    /// The SDK is done with the ad and wants content back.
    ContentResumeRequested,
}

/// Outcome of an ad request as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdOutcome {
    Completed,
    ErrorWaterfallRetriable,
    ErrorTerminal,
}

impl AdOutcome {
    /// Map an SDK event onto an outcome. Non-terminal events map to `None`.
    pub fn from_event(event: &AdEvent) -> Option<Self> {
        match event {
            AdEvent::Completed | AdEvent::Skipped => Some(AdOutcome::Completed),
            AdEvent::Error(kind) if kind.is_waterfall_retriable() => {
                Some(AdOutcome::ErrorWaterfallRetriable)
            }
            AdEvent::Error(_) => Some(AdOutcome::ErrorTerminal),
            AdEvent::Started | AdEvent::ContentResumeRequested => None,
        }
    }
}

impl fmt::Display for AdOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdOutcome::Completed => write!(f, "completed"),
            AdOutcome::ErrorWaterfallRetriable => write!(f, "error:retriable"),
            AdOutcome::ErrorTerminal => write!(f, "error:terminal"),
        }
    }
}

/// Every event the scheduler reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    PlayheadAdvanced { position_ms: i64 },
    SeekStarted,
    SeekCompleted { target_ms: i64 },
    ContentEnded,
    Ad { break_ref: BreakRef, event: AdEvent },
}

// ── Outbound ────────────────────────────────────────────────────────────────

/// Commands for the playback requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Pause content and play this ad.
    PlayAd { break_ref: BreakRef, ad_tag: String },
    /// Resume content playback.
    ResumeContent,
}
