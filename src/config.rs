//! Run configuration documents.
//!
//! Both run modes are described by a JSON document. The SPRT document embeds
//! its mutable result counts, so a checkpoint is simply the same document
//! written back with the counts filled in; `resume` re-reads it and picks up
//! where the run left off.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::openings::OpeningsConfig;
use crate::oracle::GameKind;

fn default_concurrency() -> usize {
    1
}

fn default_one() -> usize {
    1
}

/// Configuration for a fixed-schedule tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub engines: Vec<EngineConfig>,
    pub game: GameKind,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// `round-robin` (default) or `gauntlet`.
    #[serde(default)]
    pub scheduler: String,
    #[serde(default = "default_one")]
    pub rounds: usize,
    /// Game pairs per encounter; every pair is two games with seats swapped.
    #[serde(default = "default_one")]
    pub game_pairs: usize,
    pub openings: OpeningsConfig,
    /// Accepted for compatibility; crashed engines forfeit their game
    /// instead of being restarted.
    #[serde(default)]
    pub recover: bool,
}

impl TournamentConfig {
    pub fn load(path: &Path) -> Result<TournamentConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: TournamentConfig = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engines.len() < 2 {
            bail!("config: a tournament needs at least two engines");
        }
        if self.concurrency == 0 {
            bail!("config: concurrency must be at least 1");
        }
        if self.rounds == 0 || self.game_pairs == 0 {
            bail!("config: rounds and game_pairs must be at least 1");
        }
        Ok(())
    }
}

/// Configuration for a Sequential Probability Ratio Test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprtConfig {
    /// Test name; also names the default checkpoint file.
    pub name: String,
    pub engines: [EngineConfig; 2],
    pub game: GameKind,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Use the trinomial LLR instead of the pentanomial one.
    #[serde(default)]
    pub legacy: bool,
    /// Null Elo hypothesis.
    pub elo0: f64,
    /// Alternate Elo hypothesis.
    pub elo1: f64,
    /// Type I error probability.
    pub alpha: f64,
    /// Type II error probability.
    pub beta: f64,
    pub openings: OpeningsConfig,
    /// Checkpoint file; defaults to `<name>.checkpoint.json`.
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
    /// Result counts so far. Zero for a fresh run, populated in checkpoints.
    #[serde(default)]
    pub state: SprtState,
}

impl SprtConfig {
    pub fn load(path: &Path) -> Result<SprtConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: SprtConfig = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("config: concurrency must be at least 1");
        }
        for value in [self.alpha, self.beta] {
            if !(0.0..0.5).contains(&value) || value == 0.0 {
                bail!("config: alpha and beta must lie in (0, 0.5)");
            }
        }
        if self.elo0 >= self.elo1 {
            bail!("config: elo0 must be below elo1");
        }
        Ok(())
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.checkpoint.json", self.name)))
    }

    /// Write this document (with its current counts) to the checkpoint file.
    pub fn write_checkpoint(&self) -> Result<()> {
        let path = self.checkpoint_path();
        let text = serde_json::to_string_pretty(self).context("serialize checkpoint")?;
        fs::write(&path, text).with_context(|| format!("write checkpoint {}", path.display()))
    }
}

/// Accumulated SPRT results: per-game trinomial counts, per-pair pentanomial
/// bins, and the opening cursor to resume from.
///
/// Scores are player-1-centric, player 1 being `engines[0]` of the test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprtState {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,

    pub win_win: u64,
    pub win_draw: u64,
    pub draw_draw: u64,
    pub draw_loss: u64,
    pub loss_loss: u64,

    /// Opening-book cursor after the last recorded pair.
    #[serde(default)]
    pub book_cursor: Option<usize>,
}

impl SprtState {
    pub fn games(&self) -> u64 {
        self.wins + self.losses + self.draws
    }

    pub fn pairs(&self) -> u64 {
        self.win_win + self.win_draw + self.draw_draw + self.draw_loss + self.loss_loss
    }

    /// Record one completed pair from its two game scores (+1/0/-1 each,
    /// player-1-centric). The pentanomial bin is the score sum; win-loss
    /// pairs land in the draw-draw bin by construction.
    pub fn record_pair(&mut self, first: i32, second: i32) {
        for score in [first, second] {
            match score.cmp(&0) {
                std::cmp::Ordering::Greater => self.wins += 1,
                std::cmp::Ordering::Equal => self.draws += 1,
                std::cmp::Ordering::Less => self.losses += 1,
            }
        }

        match first + second {
            2 => self.win_win += 1,
            1 => self.win_draw += 1,
            0 => self.draw_draw += 1,
            -1 => self.draw_loss += 1,
            _ => self.loss_loss += 1,
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn pair_recording_fills_the_expected_bins() {
        let mut state = SprtState::default();
        state.record_pair(1, 1); // WW
        state.record_pair(1, 0); // WD
        state.record_pair(0, 1); // WD
        state.record_pair(0, 0); // DD
        state.record_pair(1, -1); // win-loss lands in DD
        state.record_pair(-1, 0); // DL
        state.record_pair(-1, -1); // LL

        assert_eq!(state.win_win, 1);
        assert_eq!(state.win_draw, 2);
        assert_eq!(state.draw_draw, 2);
        assert_eq!(state.draw_loss, 1);
        assert_eq!(state.loss_loss, 1);

        assert_eq!(state.pairs(), 7);
        assert_eq!(state.games(), 14);
        assert_eq!((state.wins, state.draws, state.losses), (5, 5, 4));
    }

    #[test]
    fn trinomial_and_pentanomial_counts_stay_consistent() {
        let mut state = SprtState::default();
        let scripted = [(1, 1), (1, 0), (0, 0), (-1, 1), (-1, -1), (0, -1)];
        for (first, second) in scripted {
            state.record_pair(first, second);
        }
        assert_eq!(state.games(), 2 * state.pairs());
    }

    #[test]
    fn sprt_validation_rejects_bad_hypotheses() {
        let config = sample_sprt();
        assert!(config.validate().is_ok());

        let mut bad = config.clone();
        bad.elo0 = 5.0;
        bad.elo1 = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = config.clone();
        bad.alpha = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = config;
        bad.beta = 0.7;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn checkpoint_round_trips_through_json() {
        let mut config = sample_sprt();
        config.state.record_pair(1, 1);
        config.state.book_cursor = Some(3);

        let text = serde_json::to_string(&config).unwrap();
        let reread: SprtConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(reread.state, config.state);
        assert_eq!(reread.name, config.name);
    }

    fn sample_sprt() -> SprtConfig {
        let engine = |name: &str| crate::engine::EngineConfig {
            name: name.to_string(),
            cmd: format!("./{name}"),
            dir: None,
            args: String::new(),
            protocol: String::new(),
            init_string: None,
            options: Default::default(),
            time_control: "8+0.08".to_string(),
            depth: None,
            nodes: None,
        };

        SprtConfig {
            name: "sample".to_string(),
            engines: [engine("dev"), engine("base")],
            game: GameKind::Ataxx,
            concurrency: 1,
            legacy: false,
            elo0: 0.0,
            elo1: 5.0,
            alpha: 0.05,
            beta: 0.05,
            openings: crate::openings::OpeningsConfig {
                file: PathBuf::from("book.epd"),
                order: Default::default(),
                start: 0,
                seed: 0,
            },
            checkpoint: None,
            state: SprtState::default(),
        }
    }
}
