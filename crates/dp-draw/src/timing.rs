//! Reveal timing profiles
//!
//! Every slot in a batch keeps "rolling" until its own stop time
//! `base + stagger * step`, which gives the left-to-right stopping effect.
//! The base shrinks as the batch grows so the last slot stops close to
//! `target_stop_ms`, but never below `min_base_ms`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing profile for reveals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealProfile {
    /// Live event on stage, matched to the draw soundtrack
    Stage,
    /// Quick run-through while setting up
    Rehearsal,
    /// No delays at all
    Instant,
    /// Scaled or hand-tuned
    Custom,
}

impl Default for RevealProfile {
    fn default() -> Self {
        Self::Stage
    }
}

/// Detailed reveal timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTiming {
    /// Profile type
    pub profile: RevealProfile,

    /// When the last slot of a batch should stop (ms)
    pub target_stop_ms: u64,

    /// Lower bound for the shared base duration (ms)
    pub min_base_ms: u64,

    /// Extra delay per stagger position (ms)
    pub stagger_step_ms: u64,

    /// Delay from the last stop to the celebration burst (ms)
    pub celebration_offset_ms: u64,

    /// Gap between the burst and the follow-up burst of a batch draw (ms)
    pub follow_up_burst_ms: u64,

    /// How long the celebration holds before returning to idle (ms)
    pub celebration_hold_ms: u64,
}

impl RevealTiming {
    /// Stage timing: 9 s of rolling, 5 s of celebration
    pub fn stage() -> Self {
        Self {
            profile: RevealProfile::Stage,
            target_stop_ms: 9000,
            min_base_ms: 3000,
            stagger_step_ms: 500,
            celebration_offset_ms: 0,
            follow_up_burst_ms: 500,
            celebration_hold_ms: 5000,
        }
    }

    /// Rehearsal timing
    pub fn rehearsal() -> Self {
        Self {
            profile: RevealProfile::Rehearsal,
            target_stop_ms: 2000,
            min_base_ms: 600,
            stagger_step_ms: 150,
            celebration_offset_ms: 0,
            follow_up_burst_ms: 200,
            celebration_hold_ms: 800,
        }
    }

    /// Everything at once
    pub fn instant() -> Self {
        Self {
            profile: RevealProfile::Instant,
            target_stop_ms: 0,
            min_base_ms: 0,
            stagger_step_ms: 0,
            celebration_offset_ms: 0,
            follow_up_burst_ms: 0,
            celebration_hold_ms: 0,
        }
    }

    pub fn from_profile(profile: RevealProfile) -> Self {
        match profile {
            RevealProfile::Stage => Self::stage(),
            RevealProfile::Rehearsal => Self::rehearsal(),
            RevealProfile::Instant => Self::instant(),
            RevealProfile::Custom => Self::stage(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            profile: RevealProfile::Custom,
            target_stop_ms: scale(self.target_stop_ms),
            min_base_ms: scale(self.min_base_ms),
            stagger_step_ms: scale(self.stagger_step_ms),
            celebration_offset_ms: scale(self.celebration_offset_ms),
            follow_up_burst_ms: scale(self.follow_up_burst_ms),
            celebration_hold_ms: scale(self.celebration_hold_ms),
        }
    }

    /// Shared base duration for a batch whose highest stagger position is `max_stagger`
    pub fn base_duration_ms(&self, max_stagger: usize) -> u64 {
        let spread = self.stagger_step_ms.saturating_mul(max_stagger as u64);
        self.target_stop_ms.saturating_sub(spread).max(self.min_base_ms)
    }

    /// Stop time of the slot at `stagger` given the batch base
    pub fn slot_delay(&self, base_ms: u64, stagger: usize) -> Duration {
        Duration::from_millis(base_ms + self.stagger_step_ms.saturating_mul(stagger as u64))
    }

    /// Total time from start to idle for a batch of `slots`
    pub fn total_duration(&self, slots: usize) -> Duration {
        if slots == 0 {
            return Duration::ZERO;
        }
        let max_stagger = slots - 1;
        self.slot_delay(self.base_duration_ms(max_stagger), max_stagger)
            + Duration::from_millis(self.celebration_offset_ms + self.celebration_hold_ms)
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let stage = RevealTiming::stage();
        let rehearsal = RevealTiming::rehearsal();
        let instant = RevealTiming::instant();

        assert!(rehearsal.target_stop_ms < stage.target_stop_ms);
        assert_eq!(instant.total_duration(10), Duration::ZERO);
        assert_eq!(RevealTiming::from_profile(RevealProfile::Stage), stage);
        assert_eq!(RevealTiming::default(), stage);
    }

    #[test]
    fn test_dynamic_base_lands_on_target() {
        let timing = RevealTiming::stage();

        assert_eq!(timing.base_duration_ms(0), 9000);
        assert_eq!(timing.base_duration_ms(4), 7000);
        assert_eq!(timing.slot_delay(7000, 4), Duration::from_millis(9000));

        // Big batches stop floor at min_base and run past the target
        assert_eq!(timing.base_duration_ms(20), 3000);
        assert_eq!(timing.slot_delay(3000, 20), Duration::from_millis(13000));
    }

    #[test]
    fn test_total_duration() {
        let timing = RevealTiming::stage();
        assert_eq!(timing.total_duration(0), Duration::ZERO);
        assert_eq!(timing.total_duration(1), Duration::from_millis(14000));
        assert_eq!(timing.total_duration(5), Duration::from_millis(14000));
    }

    #[test]
    fn test_scaled() {
        let half = RevealTiming::stage().scaled(0.5);
        assert_eq!(half.profile, RevealProfile::Custom);
        assert_eq!(half.target_stop_ms, 4500);
        assert_eq!(half.stagger_step_ms, 250);
        assert_eq!(half.celebration_hold_ms, 2500);
    }

    #[test]
    fn test_partial_config_uses_stage_defaults() {
        let timing: RevealTiming = serde_json::from_str(r#"{"stagger_step_ms": 250}"#).unwrap();
        assert_eq!(timing.stagger_step_ms, 250);
        assert_eq!(timing.target_stop_ms, 9000);
    }
}
