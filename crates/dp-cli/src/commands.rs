//! Console commands
//!
//! Each command mutates the ledger (which persists itself) and reports to `out`.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use dp_core::WinnerLedger;
use dp_draw::{
    CelebrationCue, DrawKind, DrawOrchestrator, DrawOutcome, NO_WINNER_LABEL, PENDING_LABEL, RevealEvent,
    RevealScheduler, revealed_name,
};

// ═══════════════════════════════════════════════════════════════════════════════
// OVERVIEW
// ═══════════════════════════════════════════════════════════════════════════════

pub fn status(ledger: &WinnerLedger, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", ledger.event_name())?;
    writeln!(
        out,
        "Participants: {} ({} still eligible){}",
        ledger.participants().len(),
        ledger.available_candidates().len(),
        if ledger.is_locked() { " [locked]" } else { "" }
    )?;
    writeln!(out, "Winners: {} of {} slots", ledger.winner_count(), ledger.total_slots())?;

    for session in ledger.sessions() {
        let (filled, total) = ledger.session_progress(&session.id)?;
        writeln!(out)?;
        writeln!(
            out,
            "[{}] {} - {}/{} drawn{}",
            session.id,
            session.name,
            filled,
            total,
            if session.allow_reshuffle { ", reshuffle allowed" } else { "" }
        )?;

        for prize in &session.prizes {
            writeln!(out, "  {} ({}) x{}", prize.name, prize.id, prize.quantity)?;
            for index in 0..prize.quantity as usize {
                let name = ledger.winner_at(&prize.id, index).unwrap_or(PENDING_LABEL);
                writeln!(out, "    #{} {}", index, name)?;
            }
        }
    }
    Ok(())
}

pub fn set_event_name(ledger: &mut WinnerLedger, name: &str, out: &mut impl Write) -> Result<()> {
    ledger.set_event_name(name);
    writeln!(out, "Event name set to '{}'", ledger.event_name())?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROSTER
// ═══════════════════════════════════════════════════════════════════════════════

pub fn add(ledger: &mut WinnerLedger, names: &[String], out: &mut impl Write) -> Result<()> {
    if let [name] = names {
        ledger.add_participant(name)?;
        writeln!(out, "Added '{}'", name.trim())?;
    } else {
        let added = ledger.add_participants(names)?;
        writeln!(out, "Added {} of {} participants", added, names.len())?;
    }
    Ok(())
}

/// One name per line; blank lines and repeats are skipped
pub fn import(ledger: &mut WinnerLedger, file: &Path, out: &mut impl Write) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let added = ledger.add_participants(raw.lines())?;
    writeln!(
        out,
        "Imported {} new participants from {} ({} total)",
        added,
        file.display(),
        ledger.participants().len()
    )?;
    Ok(())
}

pub fn remove(ledger: &mut WinnerLedger, name: &str, out: &mut impl Write) -> Result<()> {
    let name = name.trim();
    if ledger.remove_participant(name)? {
        writeln!(out, "Removed '{}'", name)?;
    } else {
        writeln!(out, "No participant named '{}'", name)?;
    }
    Ok(())
}

pub fn reset_participants(ledger: &mut WinnerLedger, out: &mut impl Write) -> Result<()> {
    let dropped = ledger.reset_participants();
    writeln!(out, "Removed {} participants, winners kept", dropped)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIZES
// ═══════════════════════════════════════════════════════════════════════════════

pub fn add_prize(
    ledger: &mut WinnerLedger,
    session: &str,
    prize: &str,
    quantity: u32,
    allow_reshuffle: bool,
    out: &mut impl Write,
) -> Result<()> {
    let prize_id = ledger.add_prize(session, prize, quantity, allow_reshuffle)?;
    let session_id = ledger
        .prize(&prize_id)
        .map(|(s, _)| s.id.clone())
        .unwrap_or_default();
    writeln!(out, "Added '{}' x{} as {} in session {}", prize.trim(), quantity, prize_id, session_id)?;
    Ok(())
}

pub fn remove_prize(ledger: &mut WinnerLedger, prize_id: &str, out: &mut impl Write) -> Result<()> {
    ledger.remove_prize(prize_id)?;
    writeln!(out, "Removed prize {}", prize_id)?;
    Ok(())
}

pub fn reset_prizes(ledger: &mut WinnerLedger, out: &mut impl Write) -> Result<()> {
    ledger.reset_prizes();
    writeln!(out, "All sessions, prizes and winners cleared")?;
    Ok(())
}

pub fn reset_draw(ledger: &mut WinnerLedger, out: &mut impl Write) -> Result<()> {
    ledger.reset_draw();
    writeln!(out, "All winners cleared")?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRAWS
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn draw(
    orchestrator: &DrawOrchestrator,
    reveal: &mut RevealScheduler,
    ledger: &mut WinnerLedger,
    session_id: &str,
    out: &mut impl Write,
) -> Result<()> {
    match orchestrator.batch_draw(ledger, session_id).await? {
        Some(outcome) => play_reveal(reveal, ledger, outcome, out).await,
        None => {
            writeln!(out, "Session {} is already fully drawn", session_id)?;
            Ok(())
        }
    }
}

pub async fn reshuffle(
    orchestrator: &DrawOrchestrator,
    reveal: &mut RevealScheduler,
    ledger: &mut WinnerLedger,
    prize_id: &str,
    index: usize,
    out: &mut impl Write,
) -> Result<()> {
    let outcome = orchestrator.reshuffle(ledger, prize_id, index).await?;
    if let DrawKind::Reshuffle { replaced } = &outcome.kind {
        writeln!(out, "Replacing '{}'", replaced)?;
    }
    play_reveal(reveal, ledger, outcome, out).await
}

/// Print reveal events as they fire; winners are read back from the ledger
async fn play_reveal(
    reveal: &mut RevealScheduler,
    ledger: &WinnerLedger,
    outcome: DrawOutcome,
    out: &mut impl Write,
) -> Result<()> {
    let mut events = reveal.start(outcome)?;

    while let Some(event) = events.recv().await {
        match event {
            RevealEvent::Started { slots } => writeln!(out, "Drawing {} slot(s)...", slots)?,
            RevealEvent::SlotRevealed { allocation, .. } => {
                let name = revealed_name(ledger, &allocation.prize_id, allocation.index);
                writeln!(out, "  {} #{}: {}", allocation.prize_name, allocation.index, name)?;
                if name == NO_WINNER_LABEL {
                    log::warn!("[Reveal] {} has no committed winner", allocation.key());
                }
            }
            RevealEvent::Celebration(CelebrationCue::Burst) => writeln!(out, "Congratulations!")?,
            RevealEvent::Celebration(CelebrationCue::FollowUp) => {}
            RevealEvent::Settled => {}
        }
        out.flush()?;
    }

    reveal.wait().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use dp_draw::RevealTiming;

    use super::*;

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn engine() -> (DrawOrchestrator, RevealScheduler) {
        (DrawOrchestrator::default(), RevealScheduler::new(RevealTiming::instant()))
    }

    #[test]
    fn test_roster_commands() {
        let mut ledger = WinnerLedger::new();
        let mut out = Vec::new();

        add(&mut ledger, &["  Amy ".to_string()], &mut out).unwrap();
        add(&mut ledger, &["Budi".to_string(), "Amy".to_string(), "Citra".to_string()], &mut out).unwrap();
        assert!(add(&mut ledger, &["Amy".to_string()], &mut out).is_err());
        remove(&mut ledger, " Citra ", &mut out).unwrap();
        remove(&mut ledger, "Dewi", &mut out).unwrap();

        assert_eq!(ledger.participants(), &["Amy", "Budi"]);
        let text = output(out);
        assert!(text.contains("Removed 'Citra'"));
        assert!(text.contains("No participant named 'Dewi'"));
        assert!(!text.contains("Removed 'Dewi'"));
        assert!(text.contains("Added 'Amy'"));
        assert!(text.contains("Added 2 of 3 participants"));
    }

    #[test]
    fn test_import_skips_blanks_and_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("guests.txt");
        fs::write(&file, "Amy\n\n  Budi  \nAmy\nCitra\n").unwrap();

        let mut ledger = WinnerLedger::new();
        let mut out = Vec::new();
        import(&mut ledger, &file, &mut out).unwrap();

        assert_eq!(ledger.participants(), &["Amy", "Budi", "Citra"]);
        assert!(output(out).contains("Imported 3 new participants"));
        assert!(import(&mut ledger, &dir.path().join("missing.txt"), &mut Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_draw_then_status() {
        let mut ledger = WinnerLedger::new();
        ledger.set_event_name("Year End Party");
        ledger.add_participants(["Amy", "Budi", "Citra", "Dewi"]).unwrap();
        let mut out = Vec::new();
        add_prize(&mut ledger, "Grand Prize", "TV", 2, true, &mut out).unwrap();

        let (orch, mut reveal) = engine();
        draw(&orch, &mut reveal, &mut ledger, "grand-prize", &mut out).await.unwrap();
        draw(&orch, &mut reveal, &mut ledger, "grand-prize", &mut out).await.unwrap();
        assert_eq!(ledger.winner_count(), 2);
        assert!(!orch.is_drawing());

        let text = output(out);
        assert!(text.contains("Added 'TV' x2 as grand-prize-1 in session grand-prize"));
        assert!(text.contains("Drawing 2 slot(s)..."));
        assert!(text.contains("Congratulations!"));
        assert!(text.contains("already fully drawn"));

        let mut out = Vec::new();
        status(&ledger, &mut out).unwrap();
        let text = output(out);
        assert!(text.starts_with("Year End Party\n"));
        assert!(text.contains("Participants: 4 (2 still eligible) [locked]"));
        assert!(text.contains("[grand-prize] Grand Prize - 2/2 drawn, reshuffle allowed"));
        assert!(!text.contains(PENDING_LABEL));
    }

    #[tokio::test]
    async fn test_reshuffle_reports_replacement() {
        let mut ledger = WinnerLedger::new();
        ledger.add_participants(["Amy", "Budi"]).unwrap();
        let prize_id = ledger.add_prize("Lucky", "Mug", 1, true).unwrap();
        let (orch, mut reveal) = engine();
        let mut out = Vec::new();

        draw(&orch, &mut reveal, &mut ledger, "lucky", &mut out).await.unwrap();
        let first = ledger.winner_at(&prize_id, 0).unwrap().to_string();

        reshuffle(&orch, &mut reveal, &mut ledger, &prize_id, 0, &mut out).await.unwrap();
        let second = ledger.winner_at(&prize_id, 0).unwrap().to_string();
        assert_ne!(first, second);
        assert!(output(out).contains(&format!("Replacing '{}'", first)));
    }

    #[tokio::test]
    async fn test_draw_errors_surface() {
        let mut ledger = WinnerLedger::new();
        ledger.add_participants(["Amy"]).unwrap();
        ledger.add_prize("Lucky", "Mug", 3, false).unwrap();
        let (orch, mut reveal) = engine();

        let err = draw(&orch, &mut reveal, &mut ledger, "lucky", &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not enough participants: need 3, have 1");
        assert_eq!(ledger.winner_count(), 0);
    }

    #[test]
    fn test_resets() {
        let mut ledger = WinnerLedger::new();
        ledger.add_participants(["Amy", "Budi"]).unwrap();
        let prize_id = ledger.add_prize("Lucky", "Mug", 1, false).unwrap();
        ledger.record_winner(&prize_id, "Amy").unwrap();
        let mut out = Vec::new();

        reset_participants(&mut ledger, &mut out).unwrap();
        assert_eq!(ledger.participants(), &["Amy"]);

        reset_draw(&mut ledger, &mut out).unwrap();
        assert!(!ledger.is_locked());

        reset_prizes(&mut ledger, &mut out).unwrap();
        assert!(ledger.sessions().is_empty());

        assert!(remove_prize(&mut ledger, &prize_id, &mut out).is_err());
        set_event_name(&mut ledger, " Gala ", &mut out).unwrap();
        assert!(output(out).ends_with("Event name set to 'Gala'\n"));
    }
}
