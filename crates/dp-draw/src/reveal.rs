//! Reveal Scheduler
//!
//! Presentational state machine for winners that are already committed:
//!
//! ```text
//! Idle ──start(outcome)──► Rolling ──last slot stops──► Settling ──hold──► Idle
//!                            │                            │
//!                            └ SlotRevealed at D(slot)    └ Celebration cues
//! ```
//!
//! `D(slot) = base + stagger * step`, stagger being the slot's position in
//! the outcome. The draw lease travels into the reveal task and is released
//! on the return to `Idle`, or when the reveal is cancelled or dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::error::DrawError;
use crate::orchestrator::{Allocation, DrawOutcome};
use crate::timing::RevealTiming;

// ═══════════════════════════════════════════════════════════════════════════════
// STATE & EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Reveal phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    #[default]
    Idle,
    /// Some slots are still rolling
    Rolling,
    /// Every slot has stopped, celebration in progress
    Settling,
}

/// Celebration side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CelebrationCue {
    /// Fired once when the last slot has stopped
    Burst,
    /// Second burst for multi-slot batch draws
    FollowUp,
}

/// Events emitted by a running reveal, in time order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    Started { slots: usize },
    SlotRevealed { allocation: Allocation, at: Duration },
    Celebration(CelebrationCue),
    Settled,
}

#[derive(Debug, Default)]
struct RevealStatus {
    phase: RevealPhase,
    /// Slot key -> stop time, for slots still rolling
    rolling: HashMap<String, Duration>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct RevealScheduler {
    timing: RevealTiming,
    status: Arc<RwLock<RevealStatus>>,
    task: Option<JoinHandle<()>>,
}

impl RevealScheduler {
    pub fn new(timing: RevealTiming) -> Self {
        Self {
            timing,
            status: Arc::new(RwLock::new(RevealStatus::default())),
            task: None,
        }
    }

    pub fn timing(&self) -> &RevealTiming {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: RevealTiming) {
        self.timing = timing;
    }

    pub fn phase(&self) -> RevealPhase {
        self.status.read().phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == RevealPhase::Idle
    }

    /// True while the slot's stop time has not been reached
    pub fn is_rolling(&self, prize_id: &str, index: usize) -> bool {
        self.status.read().rolling.contains_key(&slot_key(prize_id, index))
    }

    /// Stop time of a rolling slot, measured from the start of the reveal
    pub fn reveal_delay(&self, prize_id: &str, index: usize) -> Option<Duration> {
        self.status.read().rolling.get(&slot_key(prize_id, index)).copied()
    }

    /// Start revealing `outcome`. Must be called from within a tokio runtime.
    ///
    /// The receiver yields every [`RevealEvent`]; dropping it does not stop
    /// the reveal.
    pub fn start(&mut self, outcome: DrawOutcome) -> Result<mpsc::UnboundedReceiver<RevealEvent>, DrawError> {
        if !self.is_idle() {
            return Err(DrawError::DrawInProgress);
        }

        let follow_up = outcome.is_batch() && outcome.allocations.len() > 1;
        let (_, allocations, _, lease) = outcome.into_parts();

        let max_stagger = allocations.len().saturating_sub(1);
        let base = self.timing.base_duration_ms(max_stagger);
        let plan: Vec<(Allocation, Duration)> = allocations
            .into_iter()
            .enumerate()
            .map(|(stagger, allocation)| {
                let delay = self.timing.slot_delay(base, stagger);
                (allocation, delay)
            })
            .collect();
        let last_stop = plan.last().map(|(_, delay)| *delay).unwrap_or_default();

        {
            let mut status = self.status.write();
            status.phase = RevealPhase::Rolling;
            status.rolling = plan.iter().map(|(a, delay)| (a.key(), *delay)).collect();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::clone(&self.status);
        let timing = self.timing.clone();
        let started = Instant::now();

        log::info!(
            "[Reveal] Rolling {} slots, last stop at {} ms",
            plan.len(),
            last_stop.as_millis()
        );

        self.task = Some(tokio::spawn(async move {
            tx.send(RevealEvent::Started { slots: plan.len() }).ok();

            for (allocation, at) in plan {
                sleep_until(started + at).await;
                status.write().rolling.remove(&allocation.key());
                log::debug!("[Reveal] {} -> '{}'", allocation.key(), allocation.name);
                tx.send(RevealEvent::SlotRevealed { allocation, at }).ok();
            }

            status.write().phase = RevealPhase::Settling;
            let settle_at = last_stop + Duration::from_millis(timing.celebration_offset_ms);
            sleep_until(started + settle_at).await;
            tx.send(RevealEvent::Celebration(CelebrationCue::Burst)).ok();

            if follow_up {
                sleep_until(started + settle_at + Duration::from_millis(timing.follow_up_burst_ms)).await;
                tx.send(RevealEvent::Celebration(CelebrationCue::FollowUp)).ok();
            }

            sleep_until(started + settle_at + Duration::from_millis(timing.celebration_hold_ms)).await;
            status.write().phase = RevealPhase::Idle;
            drop(lease);
            log::info!("[Reveal] Settled");
            tx.send(RevealEvent::Settled).ok();
        }));

        Ok(rx)
    }

    /// Wait for the running reveal, if any, to settle
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    log::error!("[Reveal] Task failed: {}", e);
                }
            }
        }
    }

    /// Abort pending timers and return to `Idle`. Ledger data is unaffected.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::debug!("[Reveal] Cancelled");
        }
        let mut status = self.status.write();
        status.phase = RevealPhase::Idle;
        status.rolling.clear();
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(RevealTiming::default())
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn slot_key(prize_id: &str, index: usize) -> String {
    format!("{prize_id}-{index}")
}
