//! Opening books: a newline-delimited file of EPD/FEN starting positions
//! with a shared cursor, advanced sequentially or by a seeded PRNG.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// How the book picks the next opening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOrder {
    #[default]
    Sequential,
    Random,
}

/// Opening-book section of a run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningsConfig {
    pub file: PathBuf,
    #[serde(default)]
    pub order: SelectionOrder,
    /// Cursor position before the first `next()`.
    #[serde(default)]
    pub start: usize,
    /// Seed for random order; 0 picks one from the clock.
    #[serde(default)]
    pub seed: u64,
}

/// A loaded opening book with its selection cursor.
#[derive(Debug)]
pub struct OpeningBook {
    entries: Vec<String>,
    order: SelectionOrder,
    cursor: usize,
    prng: Xorshift64Star,
}

impl OpeningBook {
    pub fn open(config: &OpeningsConfig) -> Result<OpeningBook> {
        Self::open_at(config, config.start)
    }

    /// Open the book with the cursor at `start`, overriding the configured
    /// start index. Used when resuming from a checkpoint.
    pub fn open_at(config: &OpeningsConfig, start: usize) -> Result<OpeningBook> {
        let text = std::fs::read_to_string(&config.file)
            .with_context(|| format!("opening book {}", config.file.display()))?;

        let entries: Vec<String> = text
            .lines()
            .map(|line| line.trim_matches([' ', '\t', '\r']).to_string())
            .filter(|line| !line.is_empty())
            .collect();

        if entries.is_empty() {
            bail!("opening book {} has no entries", config.file.display());
        }

        let cursor = start % entries.len();
        Ok(OpeningBook {
            entries,
            order: config.order,
            cursor,
            prng: Xorshift64Star::new(config.seed),
        })
    }

    /// Advance the cursor to a new opening.
    pub fn next(&mut self) {
        self.cursor = match self.order {
            SelectionOrder::Sequential => (self.cursor + 1) % self.entries.len(),
            SelectionOrder::Random => (self.prng.next_u64() % self.entries.len() as u64) as usize,
        };
    }

    /// The currently selected opening.
    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// xorshift64* with the canonical multiplier. The exact bit sequence is part
/// of the book's contract: a fixed nonzero seed must reproduce the same
/// opening order across runs and platforms.
#[derive(Debug)]
pub struct Xorshift64Star {
    state: u64,
}

impl Xorshift64Star {
    const MULTIPLIER: u64 = 2685821657736338717;

    /// Seed 0 would freeze the generator, so it is replaced by a timestamp.
    pub fn new(seed: u64) -> Xorshift64Star {
        let state = if seed == 0 {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(1);
            nanos.max(1)
        } else {
            seed
        };
        Xorshift64Star { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(Self::MULTIPLIER)
    }
}

#[cfg(test)]
mod openings_tests {
    use std::io::Write;
    use std::path::Path;

    use super::*;

    fn book_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn config(file: &Path, order: SelectionOrder, seed: u64) -> OpeningsConfig {
        OpeningsConfig {
            file: file.to_path_buf(),
            order,
            start: 0,
            seed,
        }
    }

    #[test]
    fn sequential_order_wraps_around() {
        let file = book_file(&["fen one", "fen two", "fen three"]);
        let config = config(file.path(), SelectionOrder::Sequential, 0);
        let mut book = OpeningBook::open(&config).unwrap();

        assert_eq!(book.current(), "fen one");
        for _ in 0..book.len() {
            book.next();
        }
        assert_eq!(book.current(), "fen one");
    }

    #[test]
    fn start_index_positions_the_cursor() {
        let file = book_file(&["a", "b", "c"]);
        let mut config = config(file.path(), SelectionOrder::Sequential, 0);
        config.start = 2;
        let mut book = OpeningBook::open(&config).unwrap();
        assert_eq!(book.current(), "c");
        book.next();
        assert_eq!(book.current(), "a");
    }

    #[test]
    fn blank_lines_and_padding_are_dropped() {
        let file = book_file(&["  fen one\t", "", "fen two ", ""]);
        let config = config(file.path(), SelectionOrder::Sequential, 0);
        let book = OpeningBook::open(&config).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.current(), "fen one");
    }

    #[test]
    fn empty_book_is_rejected() {
        let file = book_file(&["", "  "]);
        let config = config(file.path(), SelectionOrder::Sequential, 0);
        assert!(OpeningBook::open(&config).is_err());
    }

    #[test]
    fn random_order_is_seed_stable() {
        let lines: Vec<String> = (0..17).map(|i| format!("fen {i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = book_file(&refs);

        let config = config(file.path(), SelectionOrder::Random, 42);
        let mut first = OpeningBook::open(&config).unwrap();
        let mut second = OpeningBook::open(&config).unwrap();

        for _ in 0..100 {
            first.next();
            second.next();
            assert_eq!(first.current(), second.current());
        }
    }

    #[test]
    fn prng_produces_the_reference_sequence() {
        let mut prng = Xorshift64Star::new(1);
        let expected: [u64; 5] = [
            5180492295206395165,
            12380297144915551517,
            13389498078930870103,
            5599127315341312413,
            1036278371763004928,
        ];
        for value in expected {
            assert_eq!(prng.next_u64(), value);
        }
    }

    #[test]
    fn zero_seed_is_replaced() {
        let mut prng = Xorshift64Star::new(0);
        // state is a timestamp, never the stuck all-zero state
        assert_ne!(prng.next_u64(), 0);
    }
}
