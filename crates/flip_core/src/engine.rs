//! Reveal / compare / resolve state machine for one game session.
//!
//! The engine owns its [`Board`] and is driven by two calls per frame:
//!
//!   1. `handle_click(x, y, now_ms)` for every queued pointer press
//!   2. `tick(now_ms)` once, which resolves a pending pair after the reveal delay
//!
//! Time is a monotonic millisecond counter supplied by the caller, so the
//! whole machine is a pure function of its inputs and can be tested without
//! a clock. Resolution is polled, never scheduled: a pair stays face-up for
//! at least `reveal_delay_ms`, plus however long until the next frame.

use crate::board::{Board, CardState};

pub const DEFAULT_REVEAL_DELAY_MS: u64 = 1000;

/// The two revealed cards waiting to be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingResolution {
    pub first: usize,
    pub second: usize,
    pub revealed_at_ms: u64,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    WaitingForFirst,
    WaitingForSecond { first: usize },
    Resolving(PendingResolution),
    Won,
}

impl EnginePhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::WaitingForFirst => "Waiting for first card",
            Self::WaitingForSecond { .. } => "Waiting for second card",
            Self::Resolving(_) => "Resolving",
            Self::Won => "Won",
        }
    }
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    RevealedFirst { index: usize },
    RevealedSecond { index: usize, deadline_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Matched,
    Mismatched,
}

/// Result of resolving a pending pair. `won` is true on exactly one
/// resolution per session: the one that matched the last pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub first: usize,
    pub second: usize,
    pub outcome: PairOutcome,
    pub won: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Resolved pairs of reveals, matched or not.
    pub turns: u32,
    pub pairs_matched: usize,
    pub total_pairs: usize,
}

pub struct MatchEngine {
    board: Board,
    phase: EnginePhase,
    reveal_delay_ms: u64,
    stats: SessionStats,
}

impl MatchEngine {
    pub fn new(board: Board, reveal_delay_ms: u64) -> Self {
        let stats = SessionStats {
            total_pairs: board.layout().pair_count,
            ..SessionStats::default()
        };
        Self {
            board,
            phase: EnginePhase::WaitingForFirst,
            reveal_delay_ms,
            stats,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_won(&self) -> bool {
        matches!(self.phase, EnginePhase::Won)
    }

    /// Reveal the hidden card under `(x, y)` if the current phase accepts a reveal.
    /// Clicks on empty space, on face-up cards, while resolving, or after the win
    /// leave the engine untouched.
    pub fn handle_click(&mut self, x: i32, y: i32, now_ms: u64) -> ClickOutcome {
        if matches!(self.phase, EnginePhase::Resolving(_) | EnginePhase::Won) {
            return ClickOutcome::Ignored;
        }
        let Some(index) = self.board.card_at(x, y) else {
            return ClickOutcome::Ignored;
        };
        if self.board.cards()[index].state() != CardState::HiddenUnmatched {
            return ClickOutcome::Ignored;
        }

        match self.phase {
            EnginePhase::WaitingForFirst => {
                self.board.set_state(index, CardState::Revealed);
                self.phase = EnginePhase::WaitingForSecond { first: index };
                ClickOutcome::RevealedFirst { index }
            }
            EnginePhase::WaitingForSecond { first } => {
                // `first` is Revealed, so the hidden-state guard above already excludes it.
                debug_assert_ne!(first, index);
                self.board.set_state(index, CardState::Revealed);
                let deadline_ms = now_ms.saturating_add(self.reveal_delay_ms);
                self.phase = EnginePhase::Resolving(PendingResolution {
                    first,
                    second: index,
                    revealed_at_ms: now_ms,
                    deadline_ms,
                });
                ClickOutcome::RevealedSecond { index, deadline_ms }
            }
            EnginePhase::Resolving(_) | EnginePhase::Won => ClickOutcome::Ignored,
        }
    }

    /// Resolve the pending pair once `now_ms` reaches its deadline.
    pub fn tick(&mut self, now_ms: u64) -> Option<Resolution> {
        let EnginePhase::Resolving(pending) = self.phase else {
            return None;
        };
        if now_ms < pending.deadline_ms {
            return None;
        }

        let first_id = self.board.cards()[pending.first].identity();
        let second_id = self.board.cards()[pending.second].identity();
        let outcome = if first_id == second_id {
            PairOutcome::Matched
        } else {
            PairOutcome::Mismatched
        };
        let next_state = match outcome {
            PairOutcome::Matched => CardState::Matched,
            PairOutcome::Mismatched => CardState::HiddenUnmatched,
        };
        self.board.set_state(pending.first, next_state);
        self.board.set_state(pending.second, next_state);

        self.stats.turns += 1;
        if outcome == PairOutcome::Matched {
            self.stats.pairs_matched += 1;
        }

        let won = self.board.all_matched();
        self.phase = if won {
            EnginePhase::Won
        } else {
            EnginePhase::WaitingForFirst
        };

        Some(Resolution {
            first: pending.first,
            second: pending.second,
            outcome,
            won,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardLayout, Rect};

    const DELAY: u64 = DEFAULT_REVEAL_DELAY_MS;

    fn engine_with(identities: &[usize], columns: usize) -> MatchEngine {
        let layout = BoardLayout {
            pair_count: identities.len() / 2,
            columns,
            ..BoardLayout::default()
        };
        let board = Board::from_identities(layout, identities).expect("valid test board");
        MatchEngine::new(board, DELAY)
    }

    fn center(engine: &MatchEngine, index: usize) -> (i32, i32) {
        let Rect { x, y, w, h } = engine.board().cards()[index].position();
        (x + w / 2, y + h / 2)
    }

    fn click(engine: &mut MatchEngine, index: usize, now_ms: u64) -> ClickOutcome {
        let (x, y) = center(engine, index);
        engine.handle_click(x, y, now_ms)
    }

    fn state_of(engine: &MatchEngine, index: usize) -> CardState {
        engine.board().cards()[index].state()
    }

    #[test]
    fn single_pair_session_wins_once() {
        let mut engine = engine_with(&[0, 0], 4);
        assert_eq!(
            click(&mut engine, 0, 0),
            ClickOutcome::RevealedFirst { index: 0 }
        );
        assert_eq!(engine.phase(), EnginePhase::WaitingForSecond { first: 0 });

        assert_eq!(
            click(&mut engine, 1, 100),
            ClickOutcome::RevealedSecond {
                index: 1,
                deadline_ms: 100 + DELAY
            }
        );
        assert!(matches!(engine.phase(), EnginePhase::Resolving(_)));

        assert_eq!(engine.tick(100 + DELAY - 1), None);
        let resolution = engine.tick(100 + DELAY).expect("delay elapsed");
        assert_eq!(resolution.outcome, PairOutcome::Matched);
        assert!(resolution.won);
        assert_eq!(state_of(&engine, 0), CardState::Matched);
        assert_eq!(state_of(&engine, 1), CardState::Matched);
        assert_eq!(engine.phase(), EnginePhase::Won);

        // The win notification is never repeated.
        assert_eq!(engine.tick(100 + DELAY * 10), None);
        assert_eq!(engine.tick(u64::MAX), None);
    }

    #[test]
    fn matching_pair_stays_face_up() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 0);
        click(&mut engine, 2, 10);
        let resolution = engine.tick(10 + DELAY).expect("resolved");
        assert_eq!(
            resolution,
            Resolution {
                first: 0,
                second: 2,
                outcome: PairOutcome::Matched,
                won: false,
            }
        );
        assert_eq!(state_of(&engine, 0), CardState::Matched);
        assert_eq!(state_of(&engine, 2), CardState::Matched);
        assert_eq!(engine.phase(), EnginePhase::WaitingForFirst);
        assert_eq!(engine.stats().pairs_matched, 1);
    }

    #[test]
    fn mismatch_flips_back_and_allows_fresh_turn() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 0);
        click(&mut engine, 1, 0);
        let resolution = engine.tick(DELAY).expect("resolved");
        assert_eq!(resolution.outcome, PairOutcome::Mismatched);
        assert!(!resolution.won);
        assert_eq!(state_of(&engine, 0), CardState::HiddenUnmatched);
        assert_eq!(state_of(&engine, 1), CardState::HiddenUnmatched);
        assert_eq!(engine.phase(), EnginePhase::WaitingForFirst);

        assert_eq!(
            click(&mut engine, 0, DELAY + 5),
            ClickOutcome::RevealedFirst { index: 0 }
        );
        assert_eq!(engine.phase(), EnginePhase::WaitingForSecond { first: 0 });
    }

    #[test]
    fn pair_is_not_resolved_before_deadline() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 500);
        click(&mut engine, 1, 600);
        assert_eq!(engine.tick(600), None);
        assert_eq!(engine.tick(600 + DELAY - 1), None);
        assert_eq!(state_of(&engine, 0), CardState::Revealed);
        assert_eq!(state_of(&engine, 1), CardState::Revealed);
        assert!(engine.tick(600 + DELAY).is_some());
    }

    #[test]
    fn clicking_revealed_card_is_ignored() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 0);
        let before = engine.phase();
        assert_eq!(click(&mut engine, 0, 10), ClickOutcome::Ignored);
        assert_eq!(engine.phase(), before);
        assert_eq!(state_of(&engine, 0), CardState::Revealed);
        assert_eq!(engine.board().count_in_state(CardState::Revealed), 1);
    }

    #[test]
    fn clicking_matched_card_is_ignored() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 0);
        click(&mut engine, 2, 0);
        engine.tick(DELAY);

        assert_eq!(click(&mut engine, 0, DELAY + 1), ClickOutcome::Ignored);
        assert_eq!(engine.phase(), EnginePhase::WaitingForFirst);
        assert_eq!(state_of(&engine, 0), CardState::Matched);
    }

    #[test]
    fn clicks_while_resolving_are_ignored() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 0);
        click(&mut engine, 1, 0);
        let resolving = engine.phase();
        assert_eq!(click(&mut engine, 2, 1), ClickOutcome::Ignored);
        assert_eq!(click(&mut engine, 3, 2), ClickOutcome::Ignored);
        assert_eq!(engine.phase(), resolving);
        assert_eq!(engine.board().count_in_state(CardState::Revealed), 2);
    }

    #[test]
    fn clicks_outside_cards_are_ignored() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        assert_eq!(engine.handle_click(0, 0, 0), ClickOutcome::Ignored);
        assert_eq!(engine.handle_click(155, 100, 0), ClickOutcome::Ignored);
        assert_eq!(engine.phase(), EnginePhase::WaitingForFirst);
    }

    #[test]
    fn won_is_entered_only_after_last_pair() {
        let mut engine = engine_with(&[0, 1, 1, 0], 4);
        let mut now = 0;
        let mut wins = 0;

        for (a, b) in [(0, 3), (1, 2)] {
            assert!(!engine.is_won());
            click(&mut engine, a, now);
            click(&mut engine, b, now);
            now += DELAY;
            let resolution = engine.tick(now).expect("resolved");
            if resolution.won {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert!(engine.is_won());
        assert!(engine.board().all_matched());
        assert_eq!(
            engine.stats(),
            SessionStats {
                turns: 2,
                pairs_matched: 2,
                total_pairs: 2,
            }
        );
    }

    #[test]
    fn clicks_after_win_change_nothing() {
        let mut engine = engine_with(&[0, 0], 4);
        click(&mut engine, 0, 0);
        click(&mut engine, 1, 0);
        engine.tick(DELAY);
        assert!(engine.is_won());

        let stats = engine.stats();
        for index in 0..2 {
            assert_eq!(click(&mut engine, index, DELAY * 2), ClickOutcome::Ignored);
        }
        assert_eq!(engine.handle_click(0, 0, DELAY * 2), ClickOutcome::Ignored);
        assert_eq!(engine.phase(), EnginePhase::Won);
        assert_eq!(engine.stats(), stats);
    }

    #[test]
    fn never_more_than_two_cards_revealed() {
        let mut engine = engine_with(&[0, 1, 2, 0, 1, 2], 3);
        for index in 0..6 {
            click(&mut engine, index, 0);
            assert!(engine.board().count_in_state(CardState::Revealed) <= 2);
        }
    }

    #[test]
    fn turns_count_mismatches_too() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, 0);
        click(&mut engine, 1, 0);
        engine.tick(DELAY);
        assert_eq!(engine.stats().turns, 1);
        assert_eq!(engine.stats().pairs_matched, 0);
    }

    #[test]
    fn deadline_saturates_near_clock_limit() {
        let mut engine = engine_with(&[0, 1, 0, 1], 4);
        click(&mut engine, 0, u64::MAX - 10);
        let outcome = click(&mut engine, 1, u64::MAX - 10);
        assert_eq!(
            outcome,
            ClickOutcome::RevealedSecond {
                index: 1,
                deadline_ms: u64::MAX
            }
        );
        assert!(engine.tick(u64::MAX).is_some());
    }

    #[test]
    fn phase_labels_are_readable() {
        assert_eq!(EnginePhase::Won.to_string(), "Won");
        assert!(EnginePhase::WaitingForSecond { first: 3 }
            .label()
            .contains("second"));
    }
}
