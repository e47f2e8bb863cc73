#![allow(dead_code)] // each test binary uses its own subset of the fakes

//! Scripted fake engines for the end-to-end tests.
//!
//! Each fake is a tiny shell stub written into a tempdir that speaks just
//! enough of the wire protocol: handshake, `isready`, and a canned reply to
//! every `go`. They are real subprocesses, so the tests exercise the whole
//! spawn/reader/await pipeline.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use duelist::engine::EngineConfig;
use duelist::openings::{OpeningsConfig, SelectionOrder};

pub const ATAXX_START: &str = "x5o/7/7/7/7/7/o5x x 0 1";

/// Same position with the irreversible-move clock nearly run out, so games
/// between passive engines end quickly by the 50-move rule.
pub const ATAXX_NEARLY_STALE: &str = "x5o/7/7/7/7/7/o5x x 96 1";

/// Write an executable shell stub and return its path.
pub fn script_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

/// An engine that answers every `go` instantly with the next move from
/// `moves`, then passes (`0000`) once the list runs out.
pub fn scripted_mover(dir: &Path, name: &str, moves: &str) -> PathBuf {
    let body = format!(
        r#"moves="{moves}"
i=0
while read line; do
  case "$line" in
    uci|uai) echo "id name {name}"; echo "${{line}}ok" ;;
    isready) echo "readyok" ;;
    go*) i=$((i+1))
         m=$(printf '%s\n' "$moves" | cut -d' ' -f$i)
         [ -n "$m" ] || m=0000
         echo "bestmove $m" ;;
    quit) exit 0 ;;
  esac
done"#
    );
    script_engine(dir, name, &body)
}

/// An engine that always passes.
pub fn passer(dir: &Path, name: &str) -> PathBuf {
    scripted_mover(dir, name, "")
}

/// An engine that beats a passer from the standard ataxx opening as either
/// colour, by cloning toward the opponent's corners and flipping them.
pub fn striker(dir: &Path, name: &str) -> PathBuf {
    scripted_mover(dir, name, "f1 b7 b1 f7 c1 e7")
}

/// An engine that completes the handshake but exits as soon as a new game
/// is announced.
pub fn quitter(dir: &Path, name: &str) -> PathBuf {
    let body = r#"while read line; do
  case "$line" in
    uci|uai) echo "${line}ok" ;;
    isready) echo "readyok" ;;
    ucinewgame|uainewgame) exit 0 ;;
    quit) exit 0 ;;
  esac
done"#;
    script_engine(dir, name, body)
}

/// An engine that sits on every `go` far longer than any test clock.
pub fn sleeper(dir: &Path, name: &str) -> PathBuf {
    let body = r#"while read line; do
  case "$line" in
    uci|uai) echo "${line}ok" ;;
    isready) echo "readyok" ;;
    go*) sleep 3; echo "bestmove 0000" ;;
    quit) exit 0 ;;
  esac
done"#;
    script_engine(dir, name, body)
}

pub fn engine_config(name: &str, cmd: &Path, tc: &str) -> EngineConfig {
    EngineConfig {
        name: name.to_string(),
        cmd: cmd.display().to_string(),
        dir: None,
        args: String::new(),
        protocol: String::new(),
        init_string: None,
        options: Default::default(),
        time_control: tc.to_string(),
        depth: None,
        nodes: None,
    }
}

/// Write an opening book of `copies` identical lines.
pub fn book(dir: &Path, fen: &str, copies: usize) -> OpeningsConfig {
    let path = dir.join("book.epd");
    let mut text = String::new();
    for _ in 0..copies {
        text.push_str(fen);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    OpeningsConfig {
        file: path,
        order: SelectionOrder::Sequential,
        start: 0,
        seed: 0,
    }
}
