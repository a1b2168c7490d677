//! AdScheduler: decides when each ad break fires and which candidate plays.
//!
//! Driven entirely by [`PlaybackEvent`]s from the host player. Every handler
//! runs to completion on the caller's thread and answers with at most one
//! [`Action`] for the playback requester. Asking for an ad and learning its
//! outcome are two separate events; `firing_in_progress` covers the gap.

use crate::ad_break::{AdBreak, AdState, AdvertisingPlan};
use crate::ad_logger::AdAttemptLog;
use crate::config::AdvertisingConfig;
use crate::cue_point::CuePoint;
use crate::events::{AdEvent, AdOutcome, Action, BreakRef, PlaybackEvent};
use crate::seek::{SeekDecision, decide_seek};
use crate::waterfall::{BreakOutcome, mark_break_outcome, select_playable_ad};
use serde::Serialize;
use tracing::{debug, info, warn};

// --- Scheduler State ---

/// Cursor and guard flags for one playback session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    /// Cue-list index of the break currently offering an ad.
    pub current_break: Option<usize>,
    /// Cue-list index of the next break to fire by playhead position.
    pub monitor_cursor: Option<usize>,
    /// An ad was requested and its outcome has not arrived yet.
    pub firing_in_progress: bool,
    /// A seek is in flight; position ticks are ignored.
    pub seeking: bool,
}

/// Diagnostic snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct AdvertisingSummary {
    pub breaks: Vec<AdBreak>,
    pub state: SchedulerState,
    pub all_ads_played: bool,
}

// --- AdScheduler ---

/// Cue-point scheduler and waterfall driver for a single playback session.
#[derive(Debug, Default)]
pub struct AdScheduler {
    plan: AdvertisingPlan,
    state: SchedulerState,
    attempts: AdAttemptLog,
}

impl AdScheduler {
    /// A scheduler with no advertising attached. Every event is a no-op
    /// until [`attach_advertising`](Self::attach_advertising) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with advertising already attached.
    pub fn with_config(config: &AdvertisingConfig) -> Self {
        let mut scheduler = Self::new();
        scheduler.attach_advertising(config);
        scheduler
    }

    /// Replace the advertising plan and reset all session state.
    pub fn attach_advertising(&mut self, config: &AdvertisingConfig) {
        self.plan = config.build();
        self.state = SchedulerState::default();
        self.attempts.clear();
        info!(
            cue_points = ?self.plan.cues.as_slice(),
            preroll = self.plan.cues.has_preroll(),
            midrolls = self.plan.cues.midroll_count(),
            postroll = self.plan.cues.has_postroll(),
            "Advertising attached"
        );
    }

    /// Start the session once the player is prepared.
    ///
    /// Fires the preroll if there is one; otherwise starts watching the
    /// first midroll.
    pub fn play_advertising(&mut self) -> Option<Action> {
        if self.plan.cues.has_preroll() {
            return self.fire(0);
        }
        if self.plan.cues.midroll_count() > 0 {
            self.state.monitor_cursor = Some(0);
            debug!("No preroll, monitoring first midroll");
        }
        None
    }

    /// Dispatch a player or ad-SDK event.
    pub fn handle(&mut self, event: PlaybackEvent) -> Option<Action> {
        match event {
            PlaybackEvent::PlayheadAdvanced { position_ms } => self.on_playhead_advanced(position_ms),
            PlaybackEvent::SeekStarted => {
                self.on_seek_started();
                None
            }
            PlaybackEvent::SeekCompleted { target_ms } => self.on_seek_completed(target_ms),
            PlaybackEvent::ContentEnded => self.on_content_ended(),
            PlaybackEvent::Ad { break_ref, event } => match AdOutcome::from_event(&event) {
                Some(outcome) => self.on_ad_outcome(break_ref, outcome),
                None => {
                    self.on_ad_lifecycle(break_ref, &event);
                    None
                }
            },
        }
    }

    /// Fire the monitored break once the playhead reaches it.
    ///
    /// The postroll is never fired by position, only by content end.
    pub fn on_playhead_advanced(&mut self, position_ms: i64) -> Option<Action> {
        if self.state.seeking || self.state.firing_in_progress {
            return None;
        }
        let cursor = self.state.monitor_cursor?;
        let target = self.plan.cues.at(cursor)?;
        if target.is_postroll() || position_ms < target.millis() {
            return None;
        }
        debug!(position_ms, %target, cursor, "Playhead reached cue point");
        self.fire(cursor)
    }

    pub fn on_seek_started(&mut self) {
        self.state.seeking = true;
    }

    /// Re-anchor after a seek, firing a jumped-over break if one is due.
    pub fn on_seek_completed(&mut self, target_ms: i64) -> Option<Action> {
        self.state.seeking = false;
        match decide_seek(&self.plan, target_ms, self.state.firing_in_progress) {
            SeekDecision::FireOverdue(index) => {
                info!(target_ms, index, "Seek jumped over an ad break, firing it");
                self.fire(index)
            }
            SeekDecision::Reanchor(cursor) => {
                debug!(target_ms, ?cursor, "Seek re-anchored monitor cursor");
                self.state.monitor_cursor = cursor;
                None
            }
            SeekDecision::Ignore => None,
        }
    }

    /// Fire the postroll, or wind the session down when there is none.
    pub fn on_content_ended(&mut self) -> Option<Action> {
        match self.plan.cues.postroll_index() {
            Some(postroll) => {
                debug!("Content ended, firing postroll");
                self.fire(postroll)
            }
            None => {
                self.state.current_break = None;
                self.state.monitor_cursor = None;
                self.state.firing_in_progress = false;
                None
            }
        }
    }

    /// Apply the outcome of the ad request issued for `break_ref`.
    ///
    /// Outcomes for a break that is not PLAYING are stale (the break was
    /// already resolved) and are ignored. An outcome for a PLAYING break that
    /// is no longer the current one only settles that break: the guard and
    /// the screen belong to the current request.
    pub fn on_ad_outcome(&mut self, break_ref: BreakRef, outcome: AdOutcome) -> Option<Action> {
        let index = break_ref.0;
        let Some(ad_break) = self.plan.break_at(index) else {
            warn!(%break_ref, %outcome, "Outcome for unknown ad break");
            return None;
        };
        if ad_break.state != AdState::Playing {
            warn!(%break_ref, state = %ad_break.state, %outcome, "Ignoring stale ad outcome");
            return None;
        }
        let cue = ad_break.cue;
        if let Some(ad) = ad_break.playing_ad() {
            let tag = ad.tag.clone();
            self.attempts.log(cue, &tag, &outcome.to_string());
        }

        if self.state.current_break != Some(index) {
            // Another break holds the screen; settle this one quietly.
            let resolved = match outcome {
                AdOutcome::Completed => BreakOutcome::Completed,
                _ => BreakOutcome::TerminalError,
            };
            debug!(%cue, current = ?self.state.current_break, %outcome, "Late outcome for superseded break");
            mark_break_outcome(&mut self.plan, index, resolved);
            return None;
        }

        self.state.firing_in_progress = false;
        match outcome {
            AdOutcome::Completed => {
                mark_break_outcome(&mut self.plan, index, BreakOutcome::Completed);
                self.resolve(index)
            }
            AdOutcome::ErrorWaterfallRetriable => match select_playable_ad(&mut self.plan, index) {
                Some(ad_tag) => {
                    info!(%cue, %ad_tag, "Retrying break with next waterfall candidate");
                    self.state.firing_in_progress = true;
                    self.state.current_break = Some(index);
                    Some(Action::PlayAd { break_ref, ad_tag })
                }
                None => {
                    warn!(%cue, "All waterfall candidates failed");
                    mark_break_outcome(&mut self.plan, index, BreakOutcome::TerminalError);
                    self.resolve(index)
                }
            },
            AdOutcome::ErrorTerminal => {
                warn!(%cue, "Terminal ad error, abandoning break");
                mark_break_outcome(&mut self.plan, index, BreakOutcome::TerminalError);
                if let Some(next) = self.plan.cues.successor(index) {
                    if matches!(self.state.monitor_cursor, Some(c) if c < next) {
                        self.state.monitor_cursor = Some(next);
                    }
                }
                self.resolve(index)
            }
        }
    }

    fn on_ad_lifecycle(&mut self, break_ref: BreakRef, event: &AdEvent) {
        match event {
            AdEvent::Started => {
                if let Some(ad_break) = self.plan.break_at(break_ref.0) {
                    if let Some(ad) = ad_break.playing_ad() {
                        let (cue, tag) = (ad_break.cue, ad.tag.clone());
                        self.attempts.log(cue, &tag, "started");
                    }
                }
                debug!(%break_ref, "Ad started");
            }
            other => debug!(%break_ref, event = ?other, "Ad lifecycle event"),
        }
    }

    /// Request an ad for the break at `index` and move the cursor past it.
    fn fire(&mut self, index: usize) -> Option<Action> {
        let cue = self.plan.cues.at(index)?;
        self.state.firing_in_progress = true;
        let selected = select_playable_ad(&mut self.plan, index);
        self.state.monitor_cursor = self.plan.cues.successor(index);

        match selected {
            Some(ad_tag) => {
                info!(%cue, %ad_tag, next = ?self.state.monitor_cursor, "Firing ad break");
                self.state.current_break = Some(index);
                Some(Action::PlayAd {
                    break_ref: BreakRef(index),
                    ad_tag,
                })
            }
            None => {
                debug!(%cue, next = ?self.state.monitor_cursor, "Nothing playable, skipping break");
                self.state.firing_in_progress = false;
                if self.plan.break_at(index).is_some_and(|b| b.state == AdState::Playing) {
                    mark_break_outcome(&mut self.plan, index, BreakOutcome::TerminalError);
                }
                None
            }
        }
    }

    /// The break at `index` is done; hand the screen back to content.
    fn resolve(&mut self, index: usize) -> Option<Action> {
        if self.state.current_break == Some(index) {
            self.state.current_break = None;
        }
        match self.plan.cues.at(index) {
            Some(cue) if cue.is_postroll() => None,
            _ => Some(Action::ResumeContent),
        }
    }

    // --- Queries ---

    /// Whether every midroll break has resolved (PLAYED or ERROR).
    pub fn all_ads_played(&self) -> bool {
        self.plan
            .iter()
            .filter(|b| b.cue.is_midroll())
            .all(|b| b.state.is_terminal())
    }

    pub fn summary(&self) -> AdvertisingSummary {
        AdvertisingSummary {
            breaks: self.plan.iter().cloned().collect(),
            state: self.state.clone(),
            all_ads_played: self.all_ads_played(),
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn plan(&self) -> &AdvertisingPlan {
        &self.plan
    }

    pub fn attempts(&self) -> &AdAttemptLog {
        &self.attempts
    }

    /// State of the break at `cue`, if configured.
    pub fn break_state(&self, cue: CuePoint) -> Option<AdState> {
        self.plan.breaks.get(cue).map(|b| b.state)
    }
}
