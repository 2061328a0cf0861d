//! Draw Orchestrator
//!
//! Turns ledger state plus a permutation into committed winners:
//!
//! - **Batch draw** fills every empty slot of a session. Slot *k* (display
//!   order) receives permuted candidate *k*.
//! - **Reshuffle** replaces the winner of one filled slot with the first
//!   permuted candidate.
//!
//! Winners are committed to the ledger, as one saved transition, before the
//! call returns. The returned [`DrawOutcome`] carries the [`DrawLease`], so
//! the lock stays held until the reveal of those results has settled.

use dp_core::{LedgerError, WinnerLedger};
use dp_random::{PermutationOrigin, RandomSource};
use serde::Serialize;

use crate::error::DrawError;
use crate::lock::{DrawLease, DrawLock};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOME TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// One committed (slot, winner) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub prize_id: String,
    pub prize_name: String,
    pub index: usize,
    pub name: String,
}

impl Allocation {
    /// Same key format as `SlotRef::key`
    pub fn key(&self) -> String {
        format!("{}-{}", self.prize_id, self.index)
    }
}

/// What produced an outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawKind {
    Batch { session_id: String },
    Reshuffle { replaced: String },
}

/// Committed allocations awaiting their reveal
#[derive(Debug)]
pub struct DrawOutcome {
    pub kind: DrawKind,
    /// Slot order of the draw; position doubles as reveal stagger
    pub allocations: Vec<Allocation>,
    pub origin: PermutationOrigin,
    lease: DrawLease,
}

impl DrawOutcome {
    pub fn is_batch(&self) -> bool {
        matches!(self.kind, DrawKind::Batch { .. })
    }

    /// Split off the lease; the lock is released when it is dropped
    pub fn into_parts(self) -> (DrawKind, Vec<Allocation>, PermutationOrigin, DrawLease) {
        (self.kind, self.allocations, self.origin, self.lease)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Batch draws and reshuffles behind a single in-flight lock
pub struct DrawOrchestrator {
    source: RandomSource,
    lock: DrawLock,
}

impl DrawOrchestrator {
    pub fn new(source: RandomSource) -> Self {
        Self {
            source,
            lock: DrawLock::new(),
        }
    }

    pub fn source(&self) -> &RandomSource {
        &self.source
    }

    pub fn lock(&self) -> &DrawLock {
        &self.lock
    }

    /// True while a draw or its reveal is in flight
    pub fn is_drawing(&self) -> bool {
        self.lock.is_held()
    }

    fn acquire(&self) -> Result<DrawLease, DrawError> {
        self.lock.try_acquire().ok_or_else(|| {
            log::warn!("[Draw] Rejected: a draw is already in progress");
            DrawError::DrawInProgress
        })
    }

    /// Fill every empty slot of `session_id`.
    ///
    /// `Ok(None)` when the session has nothing left to fill. On
    /// `InsufficientCandidates` the ledger is untouched.
    pub async fn batch_draw(
        &self,
        ledger: &mut WinnerLedger,
        session_id: &str,
    ) -> Result<Option<DrawOutcome>, DrawError> {
        let lease = self.acquire()?;

        let slots = ledger.empty_slots(session_id)?;
        if slots.is_empty() {
            log::info!("[Draw] Session '{}' has no empty slots", session_id);
            return Ok(None);
        }

        let candidates = ledger.available_candidates();
        if candidates.len() < slots.len() {
            return Err(DrawError::InsufficientCandidates {
                need: slots.len(),
                have: candidates.len(),
            });
        }

        let permutation = self.source.permute_traced(&candidates).await;

        let entries: Vec<(String, String)> = slots
            .iter()
            .zip(permutation.items)
            .map(|(slot, name)| (slot.prize_id.clone(), name))
            .collect();
        let indices = ledger.record_winners(&entries)?;

        let allocations: Vec<Allocation> = slots
            .into_iter()
            .zip(entries)
            .zip(indices)
            .map(|((slot, (_, name)), index)| {
                debug_assert_eq!(index, slot.index);
                Allocation {
                    prize_id: slot.prize_id,
                    prize_name: slot.prize_name,
                    index,
                    name,
                }
            })
            .collect();

        log::info!(
            "[Draw] Session '{}': {} winners committed ({:?})",
            session_id,
            allocations.len(),
            permutation.origin
        );

        Ok(Some(DrawOutcome {
            kind: DrawKind::Batch {
                session_id: session_id.to_string(),
            },
            allocations,
            origin: permutation.origin,
            lease,
        }))
    }

    /// Replace the winner at `index` of `prize_id` with a fresh candidate
    pub async fn reshuffle(
        &self,
        ledger: &mut WinnerLedger,
        prize_id: &str,
        index: usize,
    ) -> Result<DrawOutcome, DrawError> {
        let lease = self.acquire()?;

        let (session, prize) = ledger
            .prize(prize_id)
            .ok_or_else(|| LedgerError::UnknownPrize(prize_id.to_string()))?;
        if !session.allow_reshuffle {
            return Err(LedgerError::SessionNotReshufflable {
                session_id: session.id.clone(),
            }
            .into());
        }
        let prize_name = prize.name.clone();

        if ledger.winner_at(prize_id, index).is_none() {
            return Err(LedgerError::IndexNotFilled {
                prize_id: prize_id.to_string(),
                index,
            }
            .into());
        }

        // The winner being replaced still counts as a winner here
        let candidates = ledger.available_candidates();
        if candidates.is_empty() {
            return Err(DrawError::NoCandidates);
        }

        let permutation = self.source.permute_traced(&candidates).await;
        let name = permutation
            .items
            .into_iter()
            .next()
            .ok_or(DrawError::NoCandidates)?;

        let replaced = ledger.update_winner(prize_id, index, &name)?;
        log::info!(
            "[Draw] Reshuffled {} slot {}: '{}' -> '{}' ({:?})",
            prize_id,
            index,
            replaced,
            name,
            permutation.origin
        );

        Ok(DrawOutcome {
            kind: DrawKind::Reshuffle { replaced },
            allocations: vec![Allocation {
                prize_id: prize_id.to_string(),
                prize_name,
                index,
                name,
            }],
            origin: permutation.origin,
            lease,
        })
    }
}

impl Default for DrawOrchestrator {
    fn default() -> Self {
        Self::new(RandomSource::local())
    }
}
