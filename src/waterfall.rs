//! Per-break waterfall: picks the next candidate to try and records how the
//! break ended.
//!
//! All transitions mutate the [`AdvertisingPlan`] in place. Nothing is ever
//! removed, so a break that has run out of candidates keeps answering
//! "nothing playable" no matter how often it is asked.

use crate::ad_break::{AdState, AdvertisingPlan};
use serde::Serialize;
use tracing::debug;

/// How a break finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakOutcome {
    /// An ad played to the end (or was skipped by the viewer).
    Completed,
    /// The break is abandoned without trying further candidates.
    TerminalError,
}

/// Choose the next ad to offer for the break at cue-list index `break_index`.
///
/// - READY break: becomes PLAYING and offers its first candidate.
/// - PLAYING break: the candidate on offer (and any earlier failure) is
///   marked ERROR and the first READY candidate is offered.
/// - PLAYED / ERROR break: never retried.
///
/// `None` means nothing is playable now and the caller should skip the break.
pub fn select_playable_ad(plan: &mut AdvertisingPlan, break_index: usize) -> Option<String> {
    let ad_break = plan.break_at_mut(break_index)?;
    let cue = ad_break.cue;

    match ad_break.state {
        AdState::Ready => {
            ad_break.state = AdState::Playing;
            match ad_break.ads.first_mut() {
                Some(first) => {
                    first.state = AdState::Playing;
                    debug!(%cue, tag = %first.tag, "Offering first waterfall candidate");
                    Some(first.tag.clone())
                }
                None => {
                    debug!(%cue, "Break has no candidates");
                    None
                }
            }
        }
        AdState::Playing => {
            for ad in ad_break.ads.iter_mut() {
                match ad.state {
                    AdState::Playing | AdState::Error => ad.state = AdState::Error,
                    AdState::Ready => {
                        ad.state = AdState::Playing;
                        debug!(%cue, tag = %ad.tag, "Falling through to next waterfall candidate");
                        return Some(ad.tag.clone());
                    }
                    AdState::Played => {}
                }
            }
            debug!(%cue, "Waterfall exhausted");
            None
        }
        AdState::Played | AdState::Error => None,
    }
}

/// Record the final outcome of the break at `break_index`.
///
/// A break that already reached PLAYED or ERROR keeps its state.
pub fn mark_break_outcome(plan: &mut AdvertisingPlan, break_index: usize, outcome: BreakOutcome) {
    let Some(ad_break) = plan.break_at_mut(break_index) else {
        return;
    };
    if ad_break.state.is_terminal() {
        debug!(cue = %ad_break.cue, state = %ad_break.state, ?outcome, "Break already resolved");
        return;
    }

    let (break_state, ad_state) = match outcome {
        BreakOutcome::Completed => (AdState::Played, AdState::Played),
        BreakOutcome::TerminalError => (AdState::Error, AdState::Error),
    };
    if let Some(ad) = ad_break.ads.iter_mut().find(|ad| ad.state == AdState::Playing) {
        ad.state = ad_state;
    }
    ad_break.state = break_state;
    debug!(cue = %ad_break.cue, state = %break_state, "Break resolved");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad_break::AdBreak;
    use crate::cue_point::CuePoint;

    fn plan_with(tags: &[&str]) -> AdvertisingPlan {
        AdvertisingPlan::new(vec![
            AdBreak::new(CuePoint::PRE, vec!["pre".into()]),
            AdBreak::new(
                CuePoint(15000),
                tags.iter().map(|t| t.to_string()).collect(),
            ),
            AdBreak::new(CuePoint::POST, vec!["post".into()]),
        ])
    }

    fn states(plan: &AdvertisingPlan, index: usize) -> Vec<AdState> {
        plan.break_at(index).unwrap().ads.iter().map(|a| a.state).collect()
    }

    #[test]
    fn ready_break_offers_first_candidate() {
        let mut plan = plan_with(&["adA", "adB"]);
        assert_eq!(select_playable_ad(&mut plan, 1), Some("adA".into()));
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Playing);
        assert_eq!(states(&plan, 1), vec![AdState::Playing, AdState::Ready]);
    }

    #[test]
    fn playing_break_falls_through_in_order() {
        let mut plan = plan_with(&["adA", "adB", "adC"]);
        select_playable_ad(&mut plan, 1);
        assert_eq!(select_playable_ad(&mut plan, 1), Some("adB".into()));
        assert_eq!(
            states(&plan, 1),
            vec![AdState::Error, AdState::Playing, AdState::Ready]
        );
        assert_eq!(select_playable_ad(&mut plan, 1), Some("adC".into()));
        assert_eq!(
            states(&plan, 1),
            vec![AdState::Error, AdState::Error, AdState::Playing]
        );
    }

    #[test]
    fn exhausted_break_stays_empty() {
        let mut plan = plan_with(&["adA"]);
        select_playable_ad(&mut plan, 1);
        assert_eq!(select_playable_ad(&mut plan, 1), None);
        assert_eq!(select_playable_ad(&mut plan, 1), None);
        assert_eq!(states(&plan, 1), vec![AdState::Error]);

        mark_break_outcome(&mut plan, 1, BreakOutcome::TerminalError);
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Error);
        for _ in 0..3 {
            assert_eq!(select_playable_ad(&mut plan, 1), None);
        }
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Error);
    }

    #[test]
    fn break_without_candidates_offers_nothing() {
        let mut plan = plan_with(&[]);
        assert_eq!(select_playable_ad(&mut plan, 1), None);
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Playing);
    }

    #[test]
    fn unknown_index_offers_nothing() {
        let mut plan = plan_with(&["adA"]);
        assert_eq!(select_playable_ad(&mut plan, 9), None);
        mark_break_outcome(&mut plan, 9, BreakOutcome::Completed);
    }

    #[test]
    fn completed_break_is_never_retried() {
        let mut plan = plan_with(&["adA", "adB"]);
        select_playable_ad(&mut plan, 1);
        mark_break_outcome(&mut plan, 1, BreakOutcome::Completed);
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Played);
        assert_eq!(states(&plan, 1), vec![AdState::Played, AdState::Ready]);
        assert_eq!(select_playable_ad(&mut plan, 1), None);
    }

    #[test]
    fn resolved_break_keeps_its_state() {
        let mut plan = plan_with(&["adA"]);
        select_playable_ad(&mut plan, 1);
        mark_break_outcome(&mut plan, 1, BreakOutcome::Completed);
        mark_break_outcome(&mut plan, 1, BreakOutcome::TerminalError);
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Played);
    }

    #[test]
    fn terminal_error_fails_the_offered_candidate() {
        let mut plan = plan_with(&["adA", "adB"]);
        select_playable_ad(&mut plan, 1);
        mark_break_outcome(&mut plan, 1, BreakOutcome::TerminalError);
        assert_eq!(plan.break_at(1).unwrap().state, AdState::Error);
        assert_eq!(states(&plan, 1), vec![AdState::Error, AdState::Ready]);
    }
}
