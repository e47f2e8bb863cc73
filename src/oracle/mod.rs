//! Game-rule adjudication.
//!
//! An [`Oracle`] knows the rules of one game: it tracks the position, applies
//! moves in engine notation, and decides whether the game is over. The game
//! driver treats it as optional; without one, games only end on engine
//! crash, illegal-move claim or timeout.

use serde::{Deserialize, Serialize};

mod ataxx;

pub use ataxx::AtaxxOracle;

/// The games the runner knows how to referee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Chess,
    Ataxx,
}

impl GameKind {
    /// Protocol prefix spoken by engines for this game: the three canonical
    /// handshakes are `<prefix>`, `<prefix>ok` and `<prefix>newgame`.
    pub fn protocol(self) -> &'static str {
        match self {
            GameKind::Chess => "uci",
            GameKind::Ataxx => "uai",
        }
    }

    /// Rules adjudicator for this game, if one is built in.
    ///
    /// Chess adjudication is delegated to an external implementation and is
    /// not bundled; those games fall back to crash/illegal/timeout endings.
    pub fn oracle(self) -> Option<Box<dyn Oracle + Send>> {
        match self {
            GameKind::Chess => None,
            GameKind::Ataxx => Some(Box::new(AtaxxOracle::default())),
        }
    }

    /// Whether the time-control base accepts the `MM:SS` clock form.
    pub fn clock_base_allowed(self) -> bool {
        matches!(self, GameKind::Chess)
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameKind::Chess => write!(f, "chess"),
            GameKind::Ataxx => write!(f, "ataxx"),
        }
    }
}

/// Which of the two players a position says is to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    First,
    Second,
}

/// Verdict on the current position, relative to its side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    /// The side to move wins.
    StmWins,
    /// The side not to move wins.
    XtmWins,
    Draw,
}

/// A rules adjudicator for one game.
pub trait Oracle {
    /// Reset to the position described by `fen`.
    fn initialize(&mut self, fen: &str);

    /// Apply one move in engine notation. An error means the move could not
    /// be interpreted and the mover forfeits.
    fn make_move(&mut self, mov: &str) -> anyhow::Result<()>;

    /// Serialize the current position.
    fn fen(&self) -> String;

    fn side_to_move(&self) -> Color;

    /// Result of the current position plus a human-readable reason
    /// (empty while the game is ongoing).
    fn result(&self) -> (GameStatus, &'static str);

    /// True when the irreversible-move counter just reset, meaning the move
    /// history can be compacted by re-anchoring on a fresh FEN.
    fn zero_moves(&self) -> bool;
}
