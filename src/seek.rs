//! Seek resolution: re-anchors the scheduler after a discontinuous jump.
//!
//! Two binary searches over the midroll part of the cue list find the break
//! immediately behind the seek target and the one immediately ahead of it.
//! Sentinel positions are never seek targets and are excluded.

use crate::ad_break::{AdState, AdvertisingPlan};
use crate::cue_point::CuePointIndex;

/// Highest midroll index whose position is at or before `target_ms`.
///
/// Landing exactly on a cue point counts as having reached it.
pub fn immediate_last(cues: &CuePointIndex, target_ms: i64) -> Option<usize> {
    let range = cues.midroll_range();
    let reached = cues.as_slice()[range.clone()].partition_point(|c| c.millis() <= target_ms);
    reached.checked_sub(1).map(|i| range.start + i)
}

/// Lowest midroll index whose position is strictly after `target_ms`.
pub fn immediate_next(cues: &CuePointIndex, target_ms: i64) -> Option<usize> {
    let range = cues.midroll_range();
    let midrolls = &cues.as_slice()[range.clone()];
    let reached = midrolls.partition_point(|c| c.millis() <= target_ms);
    (reached < midrolls.len()).then_some(range.start + reached)
}

/// What the scheduler should do once a seek has landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDecision {
    /// A break behind the target was jumped over and never attempted: fire it now.
    FireOverdue(usize),
    /// Nothing to fire; watch this break next (`None` stops monitoring).
    Reanchor(Option<usize>),
    /// No midrolls configured, the seek changes nothing.
    Ignore,
}

/// Decide how to react to a seek landing on `target_ms`.
///
/// Exactly one outcome applies. An overdue break is only fired when no
/// earlier fire is still waiting for its outcome; otherwise the cursor is
/// parked on the overdue break so the first tick after the pending outcome
/// fires it.
pub fn decide_seek(plan: &AdvertisingPlan, target_ms: i64, firing_in_progress: bool) -> SeekDecision {
    if plan.cues.midroll_count() == 0 {
        return SeekDecision::Ignore;
    }

    if let Some(last) = immediate_last(&plan.cues, target_ms) {
        let overdue = plan
            .break_at(last)
            .is_some_and(|b| b.state == AdState::Ready);
        if overdue {
            if firing_in_progress {
                return SeekDecision::Reanchor(Some(last));
            }
            return SeekDecision::FireOverdue(last);
        }
    }

    let next = immediate_next(&plan.cues, target_ms).or(plan.cues.postroll_index());
    SeekDecision::Reanchor(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad_break::AdBreak;
    use crate::cue_point::CuePoint;

    fn cues(points: &[i64]) -> CuePointIndex {
        CuePointIndex::new(points.iter().map(|p| CuePoint(*p)))
    }

    fn plan(points: &[i64]) -> AdvertisingPlan {
        AdvertisingPlan::new(
            points
                .iter()
                .map(|p| AdBreak::new(CuePoint(*p), vec![format!("ad@{}", p)])),
        )
    }

    #[test]
    fn searches_bracket_the_target() {
        let idx = cues(&[0, 10000, 20000, 30000, -1]);
        assert_eq!(immediate_last(&idx, 15000), Some(1));
        assert_eq!(immediate_next(&idx, 15000), Some(2));
        assert_eq!(immediate_last(&idx, 35000), Some(3));
        assert_eq!(immediate_next(&idx, 35000), None);
        assert_eq!(immediate_last(&idx, 5000), None);
        assert_eq!(immediate_next(&idx, 5000), Some(1));
    }

    #[test]
    fn exact_hit_counts_as_reached() {
        let idx = cues(&[0, 10000, 20000, -1]);
        assert_eq!(immediate_last(&idx, 20000), Some(2));
        assert_eq!(immediate_next(&idx, 20000), None);
        assert_eq!(immediate_last(&idx, 10000), Some(1));
        assert_eq!(immediate_next(&idx, 10000), Some(2));
    }

    #[test]
    fn sentinels_are_never_found() {
        let idx = cues(&[0, -1]);
        assert_eq!(immediate_last(&idx, 0), None);
        assert_eq!(immediate_next(&idx, -1), None);
        assert_eq!(immediate_last(&idx, 99_999), None);
    }

    #[test]
    fn works_without_preroll() {
        let idx = cues(&[10000, 20000]);
        assert_eq!(immediate_last(&idx, 12000), Some(0));
        assert_eq!(immediate_next(&idx, 12000), Some(1));
        assert_eq!(immediate_next(&idx, 0), Some(0));
    }

    #[test]
    fn searches_are_adjacent_for_every_target() {
        let idx = cues(&[0, 5000, 10000, 20000, 40000, -1]);
        let slice = idx.as_slice();
        for target in (-1000..45000).step_by(500) {
            let last = immediate_last(&idx, target);
            let next = immediate_next(&idx, target);
            if let (Some(l), Some(n)) = (last, next) {
                assert_eq!(l + 1, n, "target {}", target);
                assert!(slice[l].millis() <= target && target < slice[n].millis());
            }
            if let Some(l) = last {
                assert!(slice[l].is_midroll());
            }
            if let Some(n) = next {
                assert!(slice[n].is_midroll());
            }
        }
    }

    #[test]
    fn fires_jumped_over_ready_break() {
        let p = plan(&[0, 10000, 20000, -1]);
        assert_eq!(decide_seek(&p, 15000, false), SeekDecision::FireOverdue(1));
    }

    #[test]
    fn played_break_is_skipped_and_cursor_reanchored() {
        let mut p = plan(&[0, 10000, 20000, -1]);
        p.break_at_mut(1).unwrap().state = AdState::Played;
        assert_eq!(decide_seek(&p, 15000, false), SeekDecision::Reanchor(Some(2)));
    }

    #[test]
    fn in_flight_fire_defers_overdue_break() {
        let p = plan(&[0, 10000, 20000, -1]);
        assert_eq!(decide_seek(&p, 15000, true), SeekDecision::Reanchor(Some(1)));
    }

    #[test]
    fn past_last_midroll_watches_postroll() {
        let mut p = plan(&[0, 10000, -1]);
        p.break_at_mut(1).unwrap().state = AdState::Error;
        assert_eq!(decide_seek(&p, 50000, false), SeekDecision::Reanchor(Some(2)));

        let mut no_post = plan(&[0, 10000]);
        no_post.break_at_mut(1).unwrap().state = AdState::Played;
        assert_eq!(decide_seek(&no_post, 50000, false), SeekDecision::Reanchor(None));
    }

    #[test]
    fn no_midrolls_ignores_seek() {
        assert_eq!(decide_seek(&plan(&[0, -1]), 5000, false), SeekDecision::Ignore);
    }
}
