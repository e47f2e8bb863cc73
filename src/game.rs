//! The game driver: alternates turns between two engine adapters, keeps the
//! clocks, and consults the rules oracle to decide the outcome.

use std::time::Instant;

use tracing::instrument;

use crate::engine::{Engine, EngineConfig};
use crate::oracle::{GameKind, GameStatus};
use crate::time_control::{Clock, TimeControl};

/// Everything needed to play one game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub kind: GameKind,
    pub opening_fen: String,
    /// Seat order: `engines[0]` moves first from the opening position.
    pub engines: [EngineConfig; 2],
}

/// Outcome of one game, seat-relative: player 1 is the engine that moved
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Player1Wins,
    Draw,
    Player2Wins,
}

impl GameOutcome {
    /// Score from player 1's point of view: +1, 0 or -1.
    pub fn score(self) -> i32 {
        match self {
            GameOutcome::Player1Wins => 1,
            GameOutcome::Draw => 0,
            GameOutcome::Player2Wins => -1,
        }
    }

    fn won_by(seat: usize) -> GameOutcome {
        if seat == 0 {
            GameOutcome::Player1Wins
        } else {
            GameOutcome::Player2Wins
        }
    }

    fn lost_by(seat: usize) -> GameOutcome {
        GameOutcome::won_by(seat ^ 1)
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Player1Wins => write!(f, "1-0"),
            GameOutcome::Draw => write!(f, "1/2-1/2"),
            GameOutcome::Player2Wins => write!(f, "0-1"),
        }
    }
}

/// Play one game to completion. Engine failures of any kind (spawn, I/O,
/// timeout, illegal move) become a loss for the offending seat; this
/// function never fails outright, it only reports who won and why.
#[instrument(skip_all, fields(p1 = %config.engines[0].name, p2 = %config.engines[1].name))]
pub fn run(config: &GameConfig) -> (GameOutcome, String) {
    let protocol = config.kind.protocol();

    let mut clocks: [Clock; 2] = [Clock {
        remaining_ms: 0,
        increment_ms: 0,
    }; 2];
    for seat in 0..2 {
        match TimeControl::parse(&config.engines[seat].time_control, config.kind) {
            Ok(tc) => clocks[seat] = tc.clock(),
            Err(err) => return (GameOutcome::lost_by(seat), err.to_string()),
        }
    }

    let mut engine1 = match Engine::start(&config.engines[0], protocol) {
        Ok(engine) => engine,
        Err(err) => return (GameOutcome::lost_by(0), err.to_string()),
    };
    let mut engine2 = match Engine::start(&config.engines[1], protocol) {
        Ok(engine) => engine,
        Err(err) => return (GameOutcome::lost_by(1), err.to_string()),
    };

    let mut oracle = config.kind.oracle();
    if let Some(oracle) = oracle.as_mut() {
        oracle.initialize(&config.opening_fen);
    }

    let mut fen = config.opening_fen.clone();
    // accumulated move list, pre-padded with one space per move
    let mut moves = String::new();
    let mut stm = 0usize;

    loop {
        let engine = if stm == 0 { &mut engine1 } else { &mut engine2 };

        if let Err(err) = engine.write(&format!("position fen {fen} moves{moves}")) {
            return (GameOutcome::lost_by(stm), err.to_string());
        }

        if let Err(err) = engine.synchronize() {
            return (GameOutcome::lost_by(stm), err.to_string());
        }

        let mut go = format!(
            "go wtime {} btime {} winc {} binc {}",
            clocks[0].remaining_ms,
            clocks[1].remaining_ms,
            clocks[0].increment_ms,
            clocks[1].increment_ms,
        );
        if let Some(depth) = config.engines[stm].depth {
            go.push_str(&format!(" depth {depth}"));
        }
        if let Some(nodes) = config.engines[stm].nodes {
            go.push_str(&format!(" nodes {nodes}"));
        }
        if let Err(err) = engine.write(&go) {
            return (GameOutcome::lost_by(stm), err.to_string());
        }

        let start = Instant::now();
        let reply = engine.await_match("bestmove .*", clocks[stm].budget());
        clocks[stm].debit(start.elapsed());

        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => return (GameOutcome::lost_by(stm), err.to_string()),
        };

        let Some(best) = reply.split_whitespace().nth(1) else {
            return (GameOutcome::lost_by(stm), format!("malformed reply {reply:?}"));
        };

        moves.push(' ');
        moves.push_str(best);

        let mover = stm;
        stm ^= 1;

        if let Some(oracle) = oracle.as_mut() {
            if oracle.make_move(best).is_err() {
                return (GameOutcome::lost_by(mover), "illegal move".to_string());
            }

            let (status, reason) = oracle.result();
            match status {
                // relative to the side now to move, so XtmWins crowns the
                // player who just delivered the final move
                GameStatus::StmWins => return (GameOutcome::won_by(stm), reason.to_string()),
                GameStatus::XtmWins => return (GameOutcome::won_by(mover), reason.to_string()),
                GameStatus::Draw => return (GameOutcome::Draw, reason.to_string()),
                GameStatus::Ongoing => {}
            }

            if oracle.zero_moves() {
                fen = oracle.fen();
                moves.clear();
            }
        }
    }
}
