//! Tournament mode: a fixed schedule of encounters fanned out over a worker
//! pool, aggregated into a per-engine Elo table.
//!
//! One tournament is `rounds` rounds; one round is the scheduler's set of
//! encounters; one encounter is `game_pairs` pairs; one pair is two games
//! with the seats swapped on the same opening.

use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::TournamentConfig;
use crate::game::{self, GameConfig, GameOutcome};
use crate::openings::OpeningBook;
use crate::schedule;
use crate::stats;

/// One scheduled game, ready to hand to a worker.
#[derive(Debug, Clone)]
pub struct GameTask {
    /// 1-based round index.
    pub round: usize,
    /// 1-based game index within the round.
    pub number: usize,
    /// Engine index seated as player 1 (moves first).
    pub player1: usize,
    /// Engine index seated as player 2.
    pub player2: usize,
    pub game: GameConfig,
}

/// A finished game as reported by a worker. Results arrive in no particular
/// order; the task carries the context needed to score them.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub task: GameTask,
    pub outcome: GameOutcome,
    pub reason: String,
}

impl std::fmt::Display for GameRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            GameOutcome::Player1Wins => {
                write!(f, "{} wins by {}", self.task.game.engines[0].name, self.reason)
            }
            GameOutcome::Player2Wins => {
                write!(f, "{} wins by {}", self.task.game.engines[1].name, self.reason)
            }
            GameOutcome::Draw => write!(f, "Draw by {}", self.reason),
        }
    }
}

/// Win/loss/draw tally for one engine across the tournament.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

impl Score {
    pub fn total(&self) -> u64 {
        self.wins + self.losses + self.draws
    }
}

/// Final (or interim) tournament table.
#[derive(Debug, Clone)]
pub struct Standings {
    pub entries: Vec<(String, Score)>,
}

impl Standings {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("╔══════════════════════════════════════════════════════════╗\n");
        out.push_str("║    Name               Elo Error   Wins Loss Draw   Total ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════╣\n");
        for (index, (name, score)) in self.entries.iter().enumerate() {
            let (lower, elo, upper) = stats::elo(score.wins, score.draws, score.losses);
            let error = stats::elo_error(lower, elo, upper);
            out.push_str(&format!(
                "║ {:2}. {:<15}   {:+4.0} {:4.0}   {:4} {:4} {:4}   {:5} ║\n",
                index + 1,
                name,
                elo,
                error,
                score.wins,
                score.losses,
                score.draws,
                score.total(),
            ));
        }
        out.push_str("╚══════════════════════════════════════════════════════════╝");
        out
    }
}

impl std::fmt::Display for Standings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Run a tournament to completion and return the final table.
pub fn run(config: &TournamentConfig) -> Result<Standings> {
    config.validate()?;
    if config.recover {
        warn!("recover is not supported: crashed engines forfeit their game");
    }

    let mut scheduler = schedule::new(&config.scheduler)?;
    let mut book = OpeningBook::open(&config.openings)?;

    scheduler.initialize(config.engines.len());
    let encounters = scheduler.total_encounters();
    let target = config.rounds * encounters * config.game_pairs * 2;

    // rendezvous channel: the producer blocks until a worker is free, which
    // bounds outstanding games to the worker count
    let (task_tx, task_rx) = crossbeam_channel::bounded::<GameTask>(0);
    let (result_tx, result_rx) = mpsc::channel::<GameRecord>();

    let mut workers = Vec::with_capacity(config.concurrency);
    for _ in 0..config.concurrency {
        let tasks = task_rx.clone();
        let results = result_tx.clone();
        workers.push(thread::spawn(move || worker(tasks, results)));
    }
    drop(task_rx);
    drop(result_tx);

    let producer = {
        let config = config.clone();
        thread::spawn(move || {
            for round in 0..config.rounds {
                scheduler.initialize(config.engines.len());
                let mut number = 0;

                for _ in 0..scheduler.total_encounters() {
                    let (mut p1, mut p2) = scheduler.next_encounter();

                    for _ in 0..config.game_pairs {
                        for _ in 0..2 {
                            number += 1;
                            let task = GameTask {
                                round: round + 1,
                                number,
                                player1: p1,
                                player2: p2,
                                game: GameConfig {
                                    kind: config.game,
                                    opening_fen: book.current().to_string(),
                                    engines: [
                                        config.engines[p1].clone(),
                                        config.engines[p2].clone(),
                                    ],
                                },
                            };
                            if task_tx.send(task).is_err() {
                                return;
                            }
                            std::mem::swap(&mut p1, &mut p2);
                        }

                        book.next();
                    }
                }
            }
        })
    };

    let mut scores = vec![Score::default(); config.engines.len()];
    let mut received = 0usize;

    for record in result_rx.iter() {
        received += 1;

        match record.outcome {
            GameOutcome::Player1Wins => {
                scores[record.task.player1].wins += 1;
                scores[record.task.player2].losses += 1;
            }
            GameOutcome::Player2Wins => {
                scores[record.task.player2].wins += 1;
                scores[record.task.player1].losses += 1;
            }
            GameOutcome::Draw => {
                scores[record.task.player1].draws += 1;
                scores[record.task.player2].draws += 1;
            }
        }

        info!(
            "Finished Round #{} Game #{}: {} vs {}: {}",
            record.task.round,
            record.task.number,
            record.task.game.engines[0].name,
            record.task.game.engines[1].name,
            record,
        );

        if received % 5 == 0 {
            println!("{}", standings(config, &scores).render());
        }

        if received == target {
            break;
        }
    }

    if received != target {
        bail!("workers stopped after {received}/{target} games");
    }

    producer.join().ok().context("producer thread panicked")?;
    for worker in workers {
        worker.join().ok().context("worker thread panicked")?;
    }

    Ok(standings(config, &scores))
}

fn standings(config: &TournamentConfig, scores: &[Score]) -> Standings {
    Standings {
        entries: config
            .engines
            .iter()
            .zip(scores)
            .map(|(engine, score)| (engine.name.clone(), *score))
            .collect(),
    }
}

fn worker(tasks: crossbeam_channel::Receiver<GameTask>, results: mpsc::Sender<GameRecord>) {
    for task in tasks.iter() {
        info!(
            "Starting Round #{} Game #{}: {} vs {} ({})",
            task.round,
            task.number,
            task.game.engines[0].name,
            task.game.engines[1].name,
            task.game.opening_fen,
        );

        let (outcome, reason) = game::run(&task.game);
        let record = GameRecord {
            task,
            outcome,
            reason,
        };
        if results.send(record).is_err() {
            return;
        }
    }
}
