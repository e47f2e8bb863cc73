//! SPRT mode: workers play game pairs on shared openings until the
//! log-likelihood ratio accepts one of the two Elo hypotheses.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::{SprtConfig, SprtState};
use crate::game::{self, GameConfig};
use crate::openings::OpeningBook;
use crate::stats;

/// Which hypothesis the test accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprtVerdict {
    /// No improvement: the null hypothesis holds.
    H0Accepted,
    /// Improvement: the alternate hypothesis holds.
    H1Accepted,
}

impl std::fmt::Display for SprtVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SprtVerdict::H0Accepted => write!(f, "H0 Accepted"),
            SprtVerdict::H1Accepted => write!(f, "H1 Accepted"),
        }
    }
}

/// Verdict plus the final counts, as also written to the checkpoint.
#[derive(Debug, Clone)]
pub struct SprtOutcome {
    pub verdict: SprtVerdict,
    pub state: SprtState,
}

/// One game of a pair, already normalized to player 1's perspective.
#[derive(Debug)]
struct PairGame {
    number: u64,
    score: i32,
    reason: String,
}

/// Two games on the same opening with seats swapped, emitted atomically by
/// one worker.
#[derive(Debug)]
struct PairOutcome {
    games: [PairGame; 2],
    book_cursor: usize,
}

/// Run the test until a hypothesis is accepted.
///
/// Resuming is implicit: if `config.state` already carries counts (loaded
/// from a checkpoint), the test continues from them and from the recorded
/// opening cursor.
pub fn run(config: &SprtConfig) -> Result<SprtOutcome> {
    config.validate()?;

    let (a, b) = stats::stopping_bounds(config.alpha, config.beta);

    let start = config.state.book_cursor.unwrap_or(config.openings.start);
    let book = Arc::new(Mutex::new(OpeningBook::open_at(&config.openings, start)?));

    let mut state = config.state.clone();
    let shared = Arc::new(config.clone());
    let ended = Arc::new(AtomicBool::new(false));
    let game_counter = Arc::new(AtomicU64::new(state.games()));

    let (pair_tx, pair_rx) = mpsc::channel::<PairOutcome>();

    let mut workers = Vec::with_capacity(config.concurrency);
    for _ in 0..config.concurrency {
        let config = Arc::clone(&shared);
        let book = Arc::clone(&book);
        let ended = Arc::clone(&ended);
        let counter = Arc::clone(&game_counter);
        let results = pair_tx.clone();
        workers.push(thread::spawn(move || {
            worker(&config, &book, &ended, &counter, results)
        }));
    }
    drop(pair_tx);

    let mut pairs = state.pairs();
    let mut verdict = None;

    for pair in pair_rx.iter() {
        state.record_pair(pair.games[0].score, pair.games[1].score);
        state.book_cursor = Some(pair.book_cursor);
        pairs += 1;

        for game in &pair.games {
            info!(
                "Finished Game #{}: {} vs {}: {}",
                game.number,
                config.engines[0].name,
                config.engines[1].name,
                describe(config, game),
            );
        }

        if pairs % 5 == 0 {
            report(config, &state, a, b);
            checkpoint(config, &state);
        }

        let llr = llr(config, &state);
        verdict = if llr <= a {
            Some(SprtVerdict::H0Accepted)
        } else if llr >= b {
            Some(SprtVerdict::H1Accepted)
        } else {
            None
        };
        if verdict.is_some() {
            break;
        }
    }

    let Some(verdict) = verdict else {
        bail!("workers stopped before a hypothesis was accepted");
    };

    ended.store(true, Ordering::Relaxed);
    drop(pair_rx);

    report(config, &state, a, b);
    checkpoint(config, &state);
    println!("{verdict}");

    // workers finish their in-flight pair before observing the flag
    for handle in workers {
        handle.join().ok().context("worker thread panicked")?;
    }

    Ok(SprtOutcome { verdict, state })
}

fn worker(
    config: &SprtConfig,
    book: &Mutex<OpeningBook>,
    ended: &AtomicBool,
    game_counter: &AtomicU64,
    results: mpsc::Sender<PairOutcome>,
) {
    while !ended.load(Ordering::Relaxed) {
        // the pair plays on whatever the book yields here; each advance is
        // claimed by exactly one worker
        let (opening, cursor) = {
            let mut book = book.lock().expect("opening book lock poisoned");
            book.next();
            (book.current().to_string(), book.cursor())
        };

        let pair = PairOutcome {
            games: [
                play_one(config, &opening, [0, 1], game_counter),
                play_one(config, &opening, [1, 0], game_counter),
            ],
            book_cursor: cursor,
        };
        if results.send(pair).is_err() {
            return;
        }
    }
}

/// Play one game of a pair with the given seating (`seats[0]` moves first)
/// and normalize the outcome to player 1's perspective.
fn play_one(
    config: &SprtConfig,
    opening: &str,
    seats: [usize; 2],
    game_counter: &AtomicU64,
) -> PairGame {
    let number = game_counter.fetch_add(1, Ordering::Relaxed) + 1;
    info!(
        "Starting Game #{number}: {} vs {} ({opening})",
        config.engines[seats[0]].name, config.engines[seats[1]].name,
    );

    let (outcome, reason) = game::run(&GameConfig {
        kind: config.game,
        opening_fen: opening.to_string(),
        engines: [
            config.engines[seats[0]].clone(),
            config.engines[seats[1]].clone(),
        ],
    });

    let mut score = outcome.score();
    if seats[0] == 1 {
        score = -score;
    }

    PairGame {
        number,
        score,
        reason,
    }
}

fn describe(config: &SprtConfig, game: &PairGame) -> String {
    match game.score.cmp(&0) {
        std::cmp::Ordering::Greater => {
            format!("{} wins by {}", config.engines[0].name, game.reason)
        }
        std::cmp::Ordering::Less => {
            format!("{} wins by {}", config.engines[1].name, game.reason)
        }
        std::cmp::Ordering::Equal => format!("Draw by {}", game.reason),
    }
}

fn llr(config: &SprtConfig, state: &SprtState) -> f64 {
    if config.legacy {
        stats::sprt_trinomial(state.wins, state.draws, state.losses, config.elo0, config.elo1)
    } else {
        stats::sprt_pentanomial(
            state.loss_loss,
            state.draw_loss,
            state.draw_draw,
            state.win_draw,
            state.win_win,
            config.elo0,
            config.elo1,
        )
    }
}

fn report(config: &SprtConfig, state: &SprtState, a: f64, b: f64) {
    let (lower, elo, upper) = stats::elo(state.wins, state.draws, state.losses);
    let error = stats::elo_error(lower, elo, upper);
    let llr = llr(config, state);

    let mut lines = vec![
        format!("║ ELO   | {elo:.2} +- {error:.2} (95%)"),
        format!(
            "║ LLR   | {llr:.2} ({a:.2}, {b:.2}) [{:.2}, {:.2}]",
            config.elo0, config.elo1,
        ),
        format!(
            "║ GAMES | N: {} W: {} L: {} D: {}",
            state.games(),
            state.wins,
            state.losses,
            state.draws,
        ),
    ];
    if !config.legacy {
        lines.push(format!(
            "║ PENTA | [{}, {}, {}, {}, {}]",
            state.loss_loss, state.draw_loss, state.draw_draw, state.win_draw, state.win_win,
        ));
    }

    println!("╔═════════════════════════════════════════════════╗");
    for line in lines {
        println!("{line:<50}║");
    }
    println!("╚═════════════════════════════════════════════════╝");
}

fn checkpoint(config: &SprtConfig, state: &SprtState) {
    let mut snapshot = config.clone();
    snapshot.state = state.clone();
    if let Err(err) = snapshot.write_checkpoint() {
        warn!("checkpoint write failed: {err:#}");
    }
}
