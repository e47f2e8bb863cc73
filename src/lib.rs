//! # duelist
//!
//! A match runner for game-playing engines that speak a UCI-style text
//! protocol on stdin/stdout. It plays many games concurrently between two or
//! more engines and either:
//!
//! - aggregates an Elo rating table over a fixed schedule of encounters
//!   ([`tournament`]), or
//! - runs a Sequential Probability Ratio Test that stops as soon as one of
//!   two Elo hypotheses can be accepted ([`sprt`]).
//!
//! Each game is driven by the [`game`] module, which owns two [`engine`]
//! adapters (one subprocess each), keeps the clocks, and consults an optional
//! rules [`oracle`] to adjudicate the result. Engine crashes, illegal moves
//! and timeouts are never fatal to a run: they convert into a loss for the
//! offending side and the dispatcher moves on.
//!
//! The statistical layer lives in [`stats`]: WDL/Elo conversion, confidence
//! bounds, and the trinomial and pentanomial log-likelihood ratios used by
//! the SPRT stop rule.

pub mod config;
pub mod engine;
pub mod game;
pub mod logger;
pub mod openings;
pub mod oracle;
pub mod schedule;
pub mod sprt;
pub mod stats;
pub mod time_control;
pub mod tournament;
