//! Encounter schedulers: who plays whom, and how many times per round.

use anyhow::{bail, Result};

/// A generator of player pairings for one tournament round.
///
/// After `initialize(n)`, `next_encounter` is called exactly
/// `total_encounters()` times before the next `initialize`.
pub trait Scheduler {
    fn initialize(&mut self, players: usize);
    fn next_encounter(&mut self) -> (usize, usize);
    fn total_encounters(&self) -> usize;
}

/// Look up a scheduler by its configuration name.
pub fn new(name: &str) -> Result<Box<dyn Scheduler + Send>> {
    match name {
        "round-robin" | "" => Ok(Box::new(RoundRobin::default())),
        "gauntlet" => Ok(Box::new(Gauntlet::default())),
        _ => bail!("invalid scheduler {name:?}"),
    }
}

/// All-play-all via the circle method: players sit on two rows of a circle
/// and everyone except the first seat rotates between columns. Odd player
/// counts get a virtual bye whose encounters are skipped.
#[derive(Debug, Default)]
pub struct RoundRobin {
    players: usize,
    top: Vec<usize>,
    bot: Vec<usize>,
    cursor: usize,
}

impl RoundRobin {
    fn rotate(&mut self) {
        let riser = self.bot.remove(0);
        self.top.insert(1, riser);
        if let Some(dropped) = self.top.pop() {
            self.bot.push(dropped);
        }
    }
}

impl Scheduler for RoundRobin {
    fn initialize(&mut self, players: usize) {
        self.players = players;
        let rounded = players + players % 2;
        let half = rounded / 2;
        self.top = (0..half).collect();
        self.bot = (0..half).map(|i| rounded - 1 - i).collect();
        self.cursor = 0;
    }

    fn next_encounter(&mut self) -> (usize, usize) {
        loop {
            if self.cursor == self.top.len() {
                self.rotate();
                self.cursor = 0;
            }

            let pair = (self.top[self.cursor], self.bot[self.cursor]);
            self.cursor += 1;

            // pairings against the bye are not played
            if pair.0 < self.players && pair.1 < self.players {
                return pair;
            }
        }
    }

    fn total_encounters(&self) -> usize {
        self.players * self.players.saturating_sub(1) / 2
    }
}

/// Player 0 faces each of the others once per round.
#[derive(Debug, Default)]
pub struct Gauntlet {
    players: usize,
    opponent: usize,
}

impl Scheduler for Gauntlet {
    fn initialize(&mut self, players: usize) {
        self.players = players;
        self.opponent = 0;
    }

    fn next_encounter(&mut self) -> (usize, usize) {
        self.opponent += 1;
        (0, self.opponent)
    }

    fn total_encounters(&self) -> usize {
        self.players.saturating_sub(1)
    }
}
