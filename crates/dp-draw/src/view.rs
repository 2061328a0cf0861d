//! Slot views for rendering
//!
//! Renderers get one [`SlotView`] per slot and only decide how to animate it.
//! Winners always come from the ledger; the scheduler only says whether the
//! slot is still rolling.

use std::time::Duration;

use dp_core::WinnerLedger;
use serde::Serialize;

use crate::error::DrawError;
use crate::reveal::RevealScheduler;

/// Shown for a slot with nothing to display yet
pub const PENDING_LABEL: &str = "????";

/// Shown for a slot that stopped without a committed winner
pub const NO_WINNER_LABEL: &str = "No Winner";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub prize_id: String,
    pub prize_name: String,
    pub index: usize,
    /// Committed winner, even while the slot is still rolling
    pub winner: Option<String>,
    pub rolling: bool,
    /// Stop time from the start of the reveal; zero when not rolling
    pub reveal_delay: Duration,
}

impl SlotView {
    /// Text to show once any animation is accounted for
    pub fn display_name(&self) -> &str {
        match (&self.winner, self.rolling) {
            (Some(name), false) => name,
            _ => PENDING_LABEL,
        }
    }
}

/// Views of every slot of `session_id`, in display order
pub fn slot_views(
    ledger: &WinnerLedger,
    session_id: &str,
    scheduler: &RevealScheduler,
) -> Result<Vec<SlotView>, DrawError> {
    Ok(ledger
        .display_slots(session_id)?
        .into_iter()
        .map(|slot| {
            let reveal_delay = scheduler.reveal_delay(&slot.prize_id, slot.index);
            SlotView {
                winner: ledger.winner_at(&slot.prize_id, slot.index).map(str::to_string),
                rolling: reveal_delay.is_some(),
                reveal_delay: reveal_delay.unwrap_or_default(),
                prize_id: slot.prize_id,
                prize_name: slot.prize_name,
                index: slot.index,
            }
        })
        .collect())
}

/// Name to show when a slot stops rolling
pub fn revealed_name<'a>(ledger: &'a WinnerLedger, prize_id: &str, index: usize) -> &'a str {
    ledger.winner_at(prize_id, index).unwrap_or(NO_WINNER_LABEL)
}
