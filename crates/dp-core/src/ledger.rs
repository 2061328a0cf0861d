//! Winner Ledger
//!
//! Owns the [`EventState`] and every transition over it. Each mutating call
//! validates first, then applies the change in one step and writes the whole
//! blob through the injected [`StateStore`]. A rejected call leaves the state
//! untouched.
//!
//! Invariants held here:
//! - no participant name appears twice in the roster
//! - no name wins more than one (prize, slot) pair
//! - a prize's winner list never grows past its quantity and has no holes
//! - a recorded winner can never be removed from the roster

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{EventState, PrizeItem, Session, SlotRef, slugify};
use crate::storage::{DEFAULT_STORAGE_KEY, StateStore};

/// Event ledger with optional persistence
pub struct WinnerLedger {
    state: EventState,
    store: Option<Arc<dyn StateStore>>,
    key: String,
}

impl WinnerLedger {
    /// Create an empty, unpersisted ledger
    pub fn new() -> Self {
        Self::from_state(EventState::default())
    }

    /// Wrap an existing state, unpersisted
    pub fn from_state(state: EventState) -> Self {
        Self {
            state,
            store: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Rehydrate from `store` under `key`.
    ///
    /// An absent blob starts a fresh event. A blob that fails to read or parse
    /// is moved aside with [`StateStore::quarantine`] before starting fresh. If
    /// it cannot be moved, the ledger runs unpersisted rather than overwrite it.
    pub fn open(store: Arc<dyn StateStore>, key: &str) -> Self {
        let (state, store) = match load_state(store.as_ref(), key) {
            Ok(state) => (state, Some(store)),
            Err(e) => {
                log::error!("[Ledger] Stored state under '{}' is unreadable, starting fresh: {}", key, e);
                match store.quarantine(key) {
                    Ok(()) => (EventState::default(), Some(store)),
                    Err(e) => {
                        log::error!(
                            "[Ledger] Failed to move '{}' aside, changes will not be saved: {}",
                            key,
                            e
                        );
                        (EventState::default(), None)
                    }
                }
            }
        };

        log::info!(
            "[Ledger] Opened '{}': {} participants, {} sessions, {} winners",
            key,
            state.participants.len(),
            state.sessions.len(),
            state.winners.values().map(Vec::len).sum::<usize>()
        );

        Self {
            state,
            store,
            key: key.to_string(),
        }
    }

    /// False when changes are kept in memory only
    pub fn is_persisted(&self) -> bool {
        self.store.is_some()
    }

    fn commit(&self) {
        let Some(store) = &self.store else {
            return;
        };

        let blob = match self.state.to_json() {
            Ok(blob) => blob,
            Err(e) => {
                log::error!("[Ledger] Failed to serialize state: {}", e);
                return;
            }
        };

        if let Err(e) = store.save(&self.key, &blob) {
            log::error!("[Ledger] Failed to persist '{}': {}", self.key, e);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ ACCESS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> &EventState {
        &self.state
    }

    pub fn event_name(&self) -> &str {
        &self.state.event_name
    }

    pub fn participants(&self) -> &[String] {
        &self.state.participants
    }

    pub fn sessions(&self) -> &[Session] {
        &self.state.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.state.sessions.iter().find(|s| s.id == session_id)
    }

    /// Find a prize together with its owning session
    pub fn prize(&self, prize_id: &str) -> Option<(&Session, &PrizeItem)> {
        self.state
            .sessions
            .iter()
            .find_map(|s| s.prize(prize_id).map(|p| (s, p)))
    }

    pub fn winners(&self) -> &BTreeMap<String, Vec<String>> {
        &self.state.winners
    }

    /// Winners of one prize in slot order
    pub fn winners_for(&self, prize_id: &str) -> &[String] {
        self.state
            .winners
            .get(prize_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn winner_at(&self, prize_id: &str, index: usize) -> Option<&str> {
        self.winners_for(prize_id).get(index).map(String::as_str)
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked
    }

    /// Every name currently recorded as a winner
    pub fn winner_names(&self) -> HashSet<&str> {
        self.state
            .winners
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    pub fn is_winner(&self, name: &str) -> bool {
        self.state.winners.values().flatten().any(|w| w == name)
    }

    pub fn winner_count(&self) -> usize {
        self.state.winners.values().map(Vec::len).sum()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DERIVED QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Participants not yet recorded as a winner of any prize, roster order
    pub fn available_candidates(&self) -> Vec<String> {
        let winners = self.winner_names();
        self.state
            .participants
            .iter()
            .filter(|p| !winners.contains(p.as_str()))
            .cloned()
            .collect()
    }

    /// All slots of a session: prize order, then slot index
    pub fn display_slots(&self, session_id: &str) -> LedgerResult<Vec<SlotRef>> {
        let session = self
            .session(session_id)
            .ok_or_else(|| LedgerError::UnknownSession(session_id.to_string()))?;

        Ok(session
            .prizes
            .iter()
            .flat_map(|prize| {
                (0..prize.quantity as usize).map(move |index| SlotRef {
                    prize_id: prize.id.clone(),
                    prize_name: prize.name.clone(),
                    index,
                })
            })
            .collect())
    }

    /// Unfilled slots of a session, in display order
    pub fn empty_slots(&self, session_id: &str) -> LedgerResult<Vec<SlotRef>> {
        Ok(self
            .display_slots(session_id)?
            .into_iter()
            .filter(|slot| self.winner_at(&slot.prize_id, slot.index).is_none())
            .collect())
    }

    /// `(filled, total)` slots of a session
    pub fn session_progress(&self, session_id: &str) -> LedgerResult<(usize, usize)> {
        let slots = self.display_slots(session_id)?;
        let filled = slots
            .iter()
            .filter(|slot| self.winner_at(&slot.prize_id, slot.index).is_some())
            .count();
        Ok((filled, slots.len()))
    }

    /// True when the session has slots and every one of them is filled
    pub fn is_session_complete(&self, session_id: &str) -> bool {
        matches!(self.session_progress(session_id), Ok((filled, total)) if total > 0 && filled == total)
    }

    /// Total slots across all sessions
    pub fn total_slots(&self) -> usize {
        self.state.sessions.iter().map(Session::slot_count).sum()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EVENT
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn set_event_name(&mut self, name: &str) {
        self.state.event_name = name.trim().to_string();
        self.commit();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ROSTER
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add one participant. Exact (case-sensitive) duplicates are rejected.
    pub fn add_participant(&mut self, name: &str) -> LedgerResult<()> {
        let name = normalize_name(name)?;
        if self.state.locked {
            return Err(LedgerError::RosterLocked);
        }
        if self.state.participants.iter().any(|p| *p == name) {
            return Err(LedgerError::DuplicateParticipant { name });
        }

        log::info!("[Ledger] Added participant '{}'", name);
        self.state.participants.push(name);
        self.commit();
        Ok(())
    }

    /// Bulk add. Names already on the roster (or repeated in the batch) and
    /// blank names are skipped. Returns how many were added.
    pub fn add_participants<I, S>(&mut self, names: I) -> LedgerResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state.locked {
            return Err(LedgerError::RosterLocked);
        }

        let mut seen: HashSet<String> = self.state.participants.iter().cloned().collect();
        let fresh: Vec<String> = names
            .into_iter()
            .filter_map(|n| normalize_name(n.as_ref()).ok())
            .filter(|n| seen.insert(n.clone()))
            .collect();

        let added = fresh.len();
        if added > 0 {
            self.state.participants.extend(fresh);
            self.commit();
        }

        log::info!("[Ledger] Imported {} new participants", added);
        Ok(added)
    }

    /// Remove one participant by (trimmed) name. Returns whether anyone was removed.
    pub fn remove_participant(&mut self, name: &str) -> LedgerResult<bool> {
        let name = name.trim();
        if self.is_winner(name) {
            return Err(LedgerError::ParticipantIsWinner {
                name: name.to_string(),
            });
        }
        if self.state.locked {
            return Err(LedgerError::RosterLocked);
        }

        let before = self.state.participants.len();
        self.state.participants.retain(|p| p != name);
        if self.state.participants.len() == before {
            log::debug!("[Ledger] No participant named '{}'", name);
            return Ok(false);
        }

        log::info!("[Ledger] Removed participant '{}'", name);
        self.commit();
        Ok(true)
    }

    /// Drop every participant who is not a recorded winner. Returns how many were dropped.
    pub fn reset_participants(&mut self) -> usize {
        let winners: HashSet<String> = self.winner_names().into_iter().map(str::to_string).collect();
        let before = self.state.participants.len();
        self.state.participants.retain(|p| winners.contains(p));
        let dropped = before - self.state.participants.len();

        log::info!("[Ledger] Roster reset, dropped {} non-winners", dropped);
        self.commit();
        dropped
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PRIZES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add a prize to the session named `session_name`, creating the session if
    /// needed. The session's reshuffle policy follows the latest value given.
    /// Returns the new prize id.
    pub fn add_prize(
        &mut self,
        session_name: &str,
        prize_name: &str,
        quantity: u32,
        allow_reshuffle: bool,
    ) -> LedgerResult<String> {
        let session_name = session_name.trim();
        let prize_name = prize_name.trim();
        if session_name.is_empty() || prize_name.is_empty() {
            return Err(LedgerError::InvalidParameters(
                "session and prize names must not be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(LedgerError::InvalidParameters(format!(
                "quantity of '{prize_name}' must be a positive integer"
            )));
        }

        let position = match self.state.sessions.iter().position(|s| s.name == session_name) {
            Some(position) => position,
            None => {
                let id = self.unique_session_id(session_name);
                self.state.sessions.push(Session {
                    id,
                    name: session_name.to_string(),
                    allow_reshuffle,
                    prizes: Vec::new(),
                });
                self.state.sessions.len() - 1
            }
        };

        self.state.prize_seq += 1;
        let session = &mut self.state.sessions[position];
        let prize_id = format!("{}-{}", session.id, self.state.prize_seq);

        session.allow_reshuffle = allow_reshuffle;
        session.prizes.push(PrizeItem {
            id: prize_id.clone(),
            session_id: session.id.clone(),
            name: prize_name.to_string(),
            quantity,
        });

        log::info!(
            "[Ledger] Added prize '{}' x{} to session '{}' ({})",
            prize_name,
            quantity,
            session_name,
            prize_id
        );
        self.commit();
        Ok(prize_id)
    }

    fn unique_session_id(&self, session_name: &str) -> String {
        let slug = match slugify(session_name) {
            s if s.is_empty() => "session".to_string(),
            s => s,
        };

        let taken = |id: &str| self.state.sessions.iter().any(|s| s.id == id);
        if !taken(&slug) {
            return slug;
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{slug}-{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Remove a prize, its recorded winners, and its session if now empty
    pub fn remove_prize(&mut self, prize_id: &str) -> LedgerResult<()> {
        if self.prize(prize_id).is_none() {
            return Err(LedgerError::UnknownPrize(prize_id.to_string()));
        }

        for session in &mut self.state.sessions {
            session.prizes.retain(|p| p.id != prize_id);
        }
        self.state.sessions.retain(|s| !s.prizes.is_empty());
        self.state.winners.remove(prize_id);

        log::info!("[Ledger] Removed prize {}", prize_id);
        self.commit();
        Ok(())
    }

    /// Clear sessions, prizes and winners; unlock the roster
    pub fn reset_prizes(&mut self) {
        self.state.sessions.clear();
        self.state.winners.clear();
        self.state.locked = false;

        log::info!("[Ledger] Prizes reset");
        self.commit();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WINNERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record `name` in the next empty slot of `prize_id` and lock the roster.
    /// Returns the slot index filled.
    pub fn record_winner(&mut self, prize_id: &str, name: &str) -> LedgerResult<usize> {
        let index = self.next_slot(prize_id, 0)?;
        self.check_eligible(name)?;

        self.push_winner(prize_id, index, name);
        self.state.locked = true;
        self.commit();
        Ok(index)
    }

    /// Record a whole batch of `(prize_id, name)` pairs as one transition.
    ///
    /// Every entry is validated before any is applied, and the blob is saved
    /// once. Entries for the same prize fill consecutive slots in the order
    /// given. Returns the slot index filled by each entry.
    pub fn record_winners(&mut self, entries: &[(String, String)]) -> LedgerResult<Vec<usize>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut queued: HashMap<&str, usize> = HashMap::new();
        let mut names: HashSet<&str> = HashSet::new();
        let mut indices = Vec::with_capacity(entries.len());

        for (prize_id, name) in entries {
            let pending = queued.entry(prize_id.as_str()).or_default();
            indices.push(self.next_slot(prize_id, *pending)?);
            *pending += 1;

            self.check_eligible(name)?;
            if !names.insert(name.as_str()) {
                return Err(LedgerError::InvalidParameters(format!(
                    "'{name}' appears more than once in the batch"
                )));
            }
        }

        for ((prize_id, name), &index) in entries.iter().zip(&indices) {
            self.push_winner(prize_id, index, name);
        }
        self.state.locked = true;

        log::info!("[Ledger] Recorded {} winners in one batch", entries.len());
        self.commit();
        Ok(indices)
    }

    /// Slot index after `pending` not-yet-applied winners of `prize_id`
    fn next_slot(&self, prize_id: &str, pending: usize) -> LedgerResult<usize> {
        let (_, prize) = self
            .prize(prize_id)
            .ok_or_else(|| LedgerError::UnknownPrize(prize_id.to_string()))?;

        let index = self.winners_for(prize_id).len() + pending;
        if index >= prize.quantity as usize {
            return Err(LedgerError::SlotsExhausted {
                prize_id: prize_id.to_string(),
                quantity: prize.quantity,
            });
        }
        Ok(index)
    }

    fn push_winner(&mut self, prize_id: &str, index: usize, name: &str) {
        self.state
            .winners
            .entry(prize_id.to_string())
            .or_default()
            .push(name.to_string());
        log::info!("[Ledger] {} slot {} -> '{}'", prize_id, index, name);
    }

    /// Overwrite the winner of an already-filled slot. Returns the replaced name.
    pub fn update_winner(&mut self, prize_id: &str, index: usize, name: &str) -> LedgerResult<String> {
        let (session, _) = self
            .prize(prize_id)
            .ok_or_else(|| LedgerError::UnknownPrize(prize_id.to_string()))?;
        if !session.allow_reshuffle {
            return Err(LedgerError::SessionNotReshufflable {
                session_id: session.id.clone(),
            });
        }
        if self.winner_at(prize_id, index).is_none() {
            return Err(LedgerError::IndexNotFilled {
                prize_id: prize_id.to_string(),
                index,
            });
        }
        self.check_eligible(name)?;

        let slot = self
            .state
            .winners
            .get_mut(prize_id)
            .and_then(|list| list.get_mut(index))
            .ok_or_else(|| LedgerError::IndexNotFilled {
                prize_id: prize_id.to_string(),
                index,
            })?;
        let previous = std::mem::replace(slot, name.to_string());

        log::info!("[Ledger] {} slot {} reshuffled '{}' -> '{}'", prize_id, index, previous, name);
        self.commit();
        Ok(previous)
    }

    /// A winner must be on the roster and must not already hold a slot
    fn check_eligible(&self, name: &str) -> LedgerResult<()> {
        if !self.state.participants.iter().any(|p| p == name) {
            return Err(LedgerError::InvalidParameters(format!(
                "'{name}' is not a participant"
            )));
        }
        if self.is_winner(name) {
            return Err(LedgerError::InvalidParameters(format!(
                "'{name}' has already won a prize"
            )));
        }
        Ok(())
    }

    /// Clear every winner and unlock the roster
    pub fn reset_draw(&mut self) {
        self.state.winners.clear();
        self.state.locked = false;

        log::info!("[Ledger] Draw reset");
        self.commit();
    }
}

impl Default for WinnerLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn load_state(store: &dyn StateStore, key: &str) -> Result<EventState, String> {
    match store.load(key).map_err(|e| e.to_string())? {
        Some(blob) => EventState::from_json(&blob).map_err(|e| e.to_string()),
        None => Ok(EventState::default()),
    }
}

fn normalize_name(name: &str) -> LedgerResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidParameters(
            "participant name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::StorageError;
    use crate::storage::{MemoryStore, quarantine_key};

    /// Counts saves; optionally refuses to quarantine
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        saves: AtomicUsize,
        stuck: bool,
    }

    impl StateStore for CountingStore {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(key, blob)
        }

        fn quarantine(&self, key: &str) -> Result<(), StorageError> {
            if self.stuck {
                return Err(std::io::Error::other("read-only volume").into());
            }
            self.inner.quarantine(key)
        }
    }

    fn ledger_with(names: &[&str]) -> WinnerLedger {
        let mut ledger = WinnerLedger::new();
        ledger.add_participants(names.iter().copied()).unwrap();
        ledger
    }

    #[test]
    fn test_add_participant_rejects_exact_duplicate() {
        let mut ledger = WinnerLedger::new();
        ledger.add_participant("Amy").unwrap();

        let err = ledger.add_participant("Amy").unwrap_err();
        assert_eq!(err, LedgerError::DuplicateParticipant { name: "Amy".into() });
        assert_eq!(ledger.participants().len(), 1);

        // Identity is case-sensitive
        ledger.add_participant("amy").unwrap();
        assert_eq!(ledger.participants().len(), 2);
    }

    #[test]
    fn test_add_participant_trims_and_rejects_blank() {
        let mut ledger = WinnerLedger::new();
        ledger.add_participant("  Budi ").unwrap();
        assert_eq!(ledger.participants(), ["Budi".to_string()]);

        assert!(matches!(
            ledger.add_participant("   "),
            Err(LedgerError::InvalidParameters(_))
        ));
        assert!(matches!(
            ledger.add_participant("Budi"),
            Err(LedgerError::DuplicateParticipant { .. })
        ));
    }

    #[test]
    fn test_add_participants_skips_known_names() {
        let mut ledger = ledger_with(&["A", "B"]);
        let added = ledger.add_participants(["B", "C", "C", "", "D"]).unwrap();

        assert_eq!(added, 2);
        assert_eq!(ledger.participants(), ["A", "B", "C", "D"].map(String::from));
    }

    #[test]
    fn test_winner_cannot_be_removed() {
        let mut ledger = ledger_with(&["A", "B"]);
        let prize = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        ledger.record_winner(&prize, "A").unwrap();

        assert_eq!(
            ledger.remove_participant("A"),
            Err(LedgerError::ParticipantIsWinner { name: "A".into() })
        );
        assert_eq!(ledger.remove_participant("B"), Err(LedgerError::RosterLocked));
        assert_eq!(ledger.participants().len(), 2);
    }

    #[test]
    fn test_remove_participant_before_draw() {
        let mut ledger = ledger_with(&["A", "B"]);
        assert!(ledger.remove_participant("A").unwrap());
        assert!(!ledger.remove_participant("missing").unwrap());
        assert_eq!(ledger.participants(), ["B".to_string()]);
    }

    #[test]
    fn test_locked_roster_rejects_additions() {
        let mut ledger = ledger_with(&["A"]);
        let prize = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        ledger.record_winner(&prize, "A").unwrap();

        assert!(ledger.is_locked());
        assert_eq!(ledger.add_participant("B"), Err(LedgerError::RosterLocked));
        assert_eq!(ledger.add_participants(["B"]), Err(LedgerError::RosterLocked));
    }

    #[test]
    fn test_reset_participants_keeps_winners() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        let prize = ledger.add_prize("S", "Lamp", 2, false).unwrap();
        ledger.record_winner(&prize, "B").unwrap();

        assert_eq!(ledger.reset_participants(), 2);
        assert_eq!(ledger.participants(), ["B".to_string()]);
        assert_eq!(ledger.winners_for(&prize), ["B".to_string()]);
    }

    #[test]
    fn test_add_prize_creates_and_reuses_session() {
        let mut ledger = WinnerLedger::new();
        let p1 = ledger.add_prize("Doorprize Sesi 1", "Toaster", 2, false).unwrap();
        let p2 = ledger.add_prize("Doorprize Sesi 1", "Blender", 1, true).unwrap();

        assert_eq!(ledger.sessions().len(), 1);
        let session = &ledger.sessions()[0];
        assert_eq!(session.id, "doorprize-sesi-1");
        assert!(session.allow_reshuffle, "latest reshuffle flag wins");
        assert_eq!(p1, "doorprize-sesi-1-1");
        assert_eq!(p2, "doorprize-sesi-1-2");
        assert_eq!(ledger.total_slots(), 3);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let mut ledger = WinnerLedger::new();
        ledger.add_prize("Grand Prize", "TV", 1, true).unwrap();
        ledger.add_prize("grand prize", "Bike", 1, true).unwrap();
        ledger.add_prize("!!!", "Mug", 1, false).unwrap();

        let ids: Vec<&str> = ledger.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["grand-prize", "grand-prize-2", "session"]);
    }

    #[test]
    fn test_add_prize_rejects_zero_quantity() {
        let mut ledger = WinnerLedger::new();
        assert!(matches!(
            ledger.add_prize("S", "Lamp", 0, false),
            Err(LedgerError::InvalidParameters(_))
        ));
        assert!(ledger.sessions().is_empty());
    }

    #[test]
    fn test_remove_prize_drops_winners_and_empty_session() {
        let mut ledger = ledger_with(&["A", "B"]);
        let keep = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        let gone = ledger.add_prize("T", "Iron", 1, false).unwrap();
        ledger.record_winner(&gone, "A").unwrap();

        ledger.remove_prize(&gone).unwrap();

        assert_eq!(ledger.sessions().len(), 1);
        assert!(ledger.winners_for(&gone).is_empty());
        assert_eq!(ledger.available_candidates(), ["A", "B"].map(String::from));
        assert!(ledger.prize(&keep).is_some());
        assert_eq!(
            ledger.remove_prize(&gone),
            Err(LedgerError::UnknownPrize(gone.clone()))
        );
    }

    #[test]
    fn test_record_winner_fills_in_order_until_exhausted() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        let prize = ledger.add_prize("S", "Lamp", 2, false).unwrap();

        assert_eq!(ledger.record_winner(&prize, "C").unwrap(), 0);
        assert_eq!(ledger.record_winner(&prize, "A").unwrap(), 1);
        assert_eq!(
            ledger.record_winner(&prize, "B"),
            Err(LedgerError::SlotsExhausted { prize_id: prize.clone(), quantity: 2 })
        );
        assert_eq!(ledger.winners_for(&prize), ["C", "A"].map(String::from));
    }

    #[test]
    fn test_record_winner_rejects_double_win() {
        let mut ledger = ledger_with(&["A", "B"]);
        let p1 = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        let p2 = ledger.add_prize("S", "Iron", 1, false).unwrap();
        ledger.record_winner(&p1, "A").unwrap();

        assert!(matches!(ledger.record_winner(&p2, "A"), Err(LedgerError::InvalidParameters(_))));
        assert!(matches!(ledger.record_winner(&p2, "Z"), Err(LedgerError::InvalidParameters(_))));
        assert_eq!(ledger.winner_count(), 1);
    }

    #[test]
    fn test_update_winner() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        let prize = ledger.add_prize("Grand", "TV", 2, true).unwrap();
        ledger.record_winner(&prize, "A").unwrap();

        assert_eq!(ledger.update_winner(&prize, 0, "B").unwrap(), "A");
        assert_eq!(ledger.winner_at(&prize, 0), Some("B"));
        assert_eq!(
            ledger.update_winner(&prize, 1, "C"),
            Err(LedgerError::IndexNotFilled { prize_id: prize.clone(), index: 1 })
        );
        assert_eq!(ledger.winner_count(), 1);
    }

    #[test]
    fn test_update_winner_respects_session_policy() {
        let mut ledger = ledger_with(&["A", "B"]);
        let prize = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        ledger.record_winner(&prize, "A").unwrap();

        assert_eq!(
            ledger.update_winner(&prize, 0, "B"),
            Err(LedgerError::SessionNotReshufflable { session_id: "s".into() })
        );
        assert_eq!(ledger.winner_at(&prize, 0), Some("A"));
    }

    #[test]
    fn test_reset_draw_is_idempotent() {
        let mut ledger = ledger_with(&["A", "B"]);
        let prize = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        ledger.record_winner(&prize, "A").unwrap();

        ledger.reset_draw();
        let once = ledger.state().clone();
        ledger.reset_draw();

        assert_eq!(ledger.state(), &once);
        assert!(ledger.winners().is_empty());
        assert!(!ledger.is_locked());
        assert_eq!(ledger.sessions().len(), 1);
    }

    #[test]
    fn test_reset_prizes_unlocks() {
        let mut ledger = ledger_with(&["A"]);
        let prize = ledger.add_prize("S", "Lamp", 1, false).unwrap();
        ledger.record_winner(&prize, "A").unwrap();

        ledger.reset_prizes();
        assert!(ledger.sessions().is_empty());
        assert!(ledger.winners().is_empty());
        assert!(!ledger.is_locked());
        assert_eq!(ledger.participants().len(), 1);
    }

    #[test]
    fn test_display_slots_and_completion() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        let p1 = ledger.add_prize("S", "Lamp", 2, false).unwrap();
        let p2 = ledger.add_prize("S", "Iron", 1, false).unwrap();

        let slots = ledger.display_slots("s").unwrap();
        let keys: Vec<String> = slots.iter().map(|s| s.key()).collect();
        assert_eq!(keys, [format!("{p1}-0"), format!("{p1}-1"), format!("{p2}-0")]);
        assert!(!ledger.is_session_complete("s"));

        ledger.record_winner(&p2, "A").unwrap();
        let empty: Vec<(String, usize)> = ledger
            .empty_slots("s")
            .unwrap()
            .into_iter()
            .map(|s| (s.prize_id, s.index))
            .collect();
        assert_eq!(empty, [(p1.clone(), 0), (p1.clone(), 1)]);
        assert_eq!(ledger.session_progress("s").unwrap(), (1, 3));

        ledger.record_winner(&p1, "B").unwrap();
        ledger.record_winner(&p1, "C").unwrap();
        assert!(ledger.is_session_complete("s"));
        assert!(ledger.available_candidates().is_empty());

        assert!(matches!(ledger.display_slots("nope"), Err(LedgerError::UnknownSession(_))));
        assert!(!ledger.is_session_complete("nope"));
    }

    #[test]
    fn test_persists_every_mutation() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut ledger = WinnerLedger::open(store.clone(), "event");
            ledger.set_event_name("OM 70");
            ledger.add_participants(["A", "B"]).unwrap();
            let prize = ledger.add_prize("S", "Lamp", 1, false).unwrap();
            ledger.record_winner(&prize, "B").unwrap();
        }

        let reopened = WinnerLedger::open(store, "event");
        assert_eq!(reopened.event_name(), "OM 70");
        assert_eq!(reopened.participants().len(), 2);
        assert!(reopened.is_locked());
        assert!(reopened.is_winner("B"));
        assert_eq!(reopened.available_candidates(), ["A".to_string()]);
    }

    #[test]
    fn test_open_corrupt_blob_is_kept_aside() {
        let store = Arc::new(MemoryStore::new());
        store.save("event", "{not json").unwrap();

        let mut ledger = WinnerLedger::open(store.clone(), "event");
        assert!(ledger.participants().is_empty());
        assert!(!ledger.is_locked());
        assert!(ledger.is_persisted());

        ledger.add_participant("Amy").unwrap();
        assert_eq!(
            store.load(&quarantine_key("event")).unwrap().as_deref(),
            Some("{not json")
        );
        assert!(store.load("event").unwrap().is_some_and(|blob| blob.contains("Amy")));
    }

    #[test]
    fn test_open_never_overwrites_a_blob_it_cannot_move() {
        let store = Arc::new(CountingStore {
            stuck: true,
            ..Default::default()
        });
        store.inner.save("event", "{not json").unwrap();

        let mut ledger = WinnerLedger::open(store.clone(), "event");
        assert!(!ledger.is_persisted());
        ledger.add_participant("Amy").unwrap();

        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
        assert_eq!(store.load("event").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_record_winners_saves_once() {
        let store = Arc::new(CountingStore::default());
        let mut ledger = WinnerLedger::open(store.clone(), "event");
        ledger.add_participants(["A", "B", "C", "D"]).unwrap();
        let lamp = ledger.add_prize("S", "Lamp", 2, false).unwrap();
        let iron = ledger.add_prize("S", "Iron", 1, false).unwrap();
        let before = store.saves.load(Ordering::SeqCst);

        let batch = [
            (lamp.clone(), "C".to_string()),
            (lamp.clone(), "A".to_string()),
            (iron.clone(), "D".to_string()),
        ];
        assert_eq!(ledger.record_winners(&batch).unwrap(), [0, 1, 0]);

        assert_eq!(store.saves.load(Ordering::SeqCst), before + 1);
        assert!(ledger.is_locked());
        let reopened = WinnerLedger::open(store, "event");
        assert_eq!(reopened.winners_for(&lamp), ["C", "A"].map(String::from));
        assert_eq!(reopened.winners_for(&iron), ["D".to_string()]);
    }

    #[test]
    fn test_record_winners_rejects_whole_batch() {
        let mut ledger = ledger_with(&["A", "B", "C"]);
        let lamp = ledger.add_prize("S", "Lamp", 2, false).unwrap();
        ledger.record_winner(&lamp, "A").unwrap();

        // Over capacity on the second entry
        let over = [(lamp.clone(), "B".to_string()), (lamp.clone(), "C".to_string())];
        assert_eq!(
            ledger.record_winners(&over),
            Err(LedgerError::SlotsExhausted { prize_id: lamp.clone(), quantity: 2 })
        );

        // Same name twice in one batch
        let iron = ledger.add_prize("T", "Iron", 2, false).unwrap();
        let before_iron = ledger.state().clone();
        let repeat = [(iron.clone(), "B".to_string()), (iron.clone(), "B".to_string())];
        assert!(matches!(ledger.record_winners(&repeat), Err(LedgerError::InvalidParameters(_))));
        assert_eq!(ledger.state(), &before_iron);

        // Existing winner, unknown name, unknown prize
        for batch in [
            [(iron.clone(), "A".to_string())],
            [(iron.clone(), "Z".to_string())],
            [("nope-9".to_string(), "B".to_string())],
        ] {
            assert!(ledger.record_winners(&batch).is_err());
        }
        assert_eq!(ledger.state(), &before_iron);
        assert_eq!(ledger.winners_for(&lamp), ["A".to_string()]);
        assert_eq!(ledger.record_winners(&[]).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn test_remove_participant_trims_name() {
        let mut ledger = ledger_with(&["Amy", "Budi"]);
        assert!(ledger.remove_participant(" Amy ").unwrap());
        assert!(!ledger.remove_participant(" Amy ").unwrap());
        assert_eq!(ledger.participants(), ["Budi".to_string()]);
    }
}
