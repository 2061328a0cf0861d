//! Event data model
//!
//! Everything the draw needs to survive a reload lives in [`EventState`]:
//! the roster, the prize catalogue grouped into sessions, and the winner
//! assignment keyed by prize id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default event label
pub const DEFAULT_EVENT_NAME: &str = "Doorprize";

/// A prize definition. Quantity `q` expands into slots `0..q`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeItem {
    pub id: String,
    /// Owning session id
    pub session_id: String,
    pub name: String,
    pub quantity: u32,
}

/// A named group of prizes drawn together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub allow_reshuffle: bool,
    pub prizes: Vec<PrizeItem>,
}

impl Session {
    /// Total number of slots across all prizes
    pub fn slot_count(&self) -> usize {
        self.prizes.iter().map(|p| p.quantity as usize).sum()
    }

    pub fn prize(&self, prize_id: &str) -> Option<&PrizeItem> {
        self.prizes.iter().find(|p| p.id == prize_id)
    }
}

/// One addressable slot of a prize, in display order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub prize_id: String,
    pub prize_name: String,
    pub index: usize,
}

impl SlotRef {
    /// Stable key for view bookkeeping (`<prize-id>-<index>`)
    pub fn key(&self) -> String {
        format!("{}-{}", self.prize_id, self.index)
    }
}

/// Persisted event blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventState {
    pub event_name: String,
    pub participants: Vec<String>,
    /// Sessions in display order
    pub sessions: Vec<Session>,
    /// Prize id -> winner per filled slot index
    pub winners: BTreeMap<String, Vec<String>>,
    /// True once any winner has been recorded
    pub locked: bool,
    /// Monotonic counter used to mint prize ids
    pub prize_seq: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            event_name: DEFAULT_EVENT_NAME.to_string(),
            participants: Vec::new(),
            sessions: Vec::new(),
            winners: BTreeMap::new(),
            locked: false,
            prize_seq: 0,
        }
    }
}

impl EventState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Lowercase ASCII slug: runs of anything outside `[a-z0-9]` collapse to `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}
