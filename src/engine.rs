//! The engine process adapter: owns one child process and bridges its
//! line-oriented protocol (UCI for chess, UAI for ataxx) to structured
//! requests with timeouts.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Launch descriptor for one engine. Immutable once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Display name used in logs and reports.
    pub name: String,
    /// Path to the executable.
    pub cmd: String,
    /// Working directory for the child process.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Whitespace-separated argument tail.
    #[serde(default)]
    pub args: String,
    /// Protocol prefix; empty means the game's default (`uci`/`uai`).
    #[serde(default)]
    pub protocol: String,
    /// A line written to the engine before the protocol handshake.
    #[serde(default)]
    pub init_string: Option<String>,
    /// Options sent as `setoption name <k> value <v>` after the handshake.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Time control, e.g. `40/60+0.5` or `8+0.08`.
    #[serde(rename = "tc")]
    pub time_control: String,
    /// Fixed search-depth cap appended to every `go`.
    #[serde(default)]
    pub depth: Option<u32>,
    /// Fixed node-count cap appended to every `go`.
    #[serde(default)]
    pub nodes: Option<u64>,
}

/// Failures surfaced by the adapter. None of them abort a run; the driver
/// converts them into a loss for the engine's side.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The awaited reply did not arrive inside the time budget.
    #[error("timeout")]
    Timeout,
    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> EngineError {
        EngineError::Io(err.to_string())
    }
}

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// A live engine subprocess.
///
/// A reader thread drains the child's stdout into a line channel so that
/// [`Engine::await_match`] can apply a timeout to every read. The child is
/// killed when the adapter is dropped.
pub struct Engine {
    name: String,
    protocol: String,
    child: Child,
    writer: BufWriter<std::process::ChildStdin>,
    lines: Receiver<String>,
    read_error: Arc<Mutex<Option<String>>>,
}

impl Engine {
    /// Spawn and fully initialize an engine: protocol handshake, options,
    /// and a fresh-game reset. On success the engine is ready for
    /// `position`/`go` traffic.
    pub fn start(config: &EngineConfig, default_protocol: &str) -> anyhow::Result<Engine> {
        let protocol = if config.protocol.is_empty() {
            default_protocol.to_string()
        } else {
            config.protocol.clone()
        };

        let mut command = Command::new(&config.cmd);
        command
            .args(config.args.split_whitespace())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());
        if let Some(dir) = &config.dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("{}: spawn {:?} failed", config.name, config.cmd))?;

        let stdin = child.stdin.take().context("engine stdin unavailable")?;
        let stdout = child.stdout.take().context("engine stdout unavailable")?;

        let (line_tx, line_rx) = mpsc::channel();
        let read_error = Arc::new(Mutex::new(None));

        let reader_error = Arc::clone(&read_error);
        let reader_name = config.name.clone();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) => {
                        *reader_error.lock().expect("reader slot poisoned") =
                            Some("engine closed its output".to_string());
                        return;
                    }
                    Ok(_) => {
                        let line = line.trim().to_string();
                        debug!("({reader_name})> {line}");
                        if line_tx.send(line).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        *reader_error.lock().expect("reader slot poisoned") = Some(err.to_string());
                        return;
                    }
                }
            }
        });

        let mut engine = Engine {
            name: config.name.clone(),
            protocol,
            child,
            writer: BufWriter::new(stdin),
            lines: line_rx,
            read_error,
        };

        if let Some(init) = &config.init_string {
            engine.write(init)?;
        }

        engine.initialize()?;

        for (name, value) in &config.options {
            engine.write(&format!("setoption name {name} value {value}"))?;
        }

        engine.new_game()?;

        Ok(engine)
    }

    /// Perform the startup handshake: `<proto>`, await `<proto>ok`.
    fn initialize(&mut self) -> Result<(), EngineError> {
        let protocol = self.protocol.clone();
        self.write(&protocol)?;
        self.await_match(&format!("{protocol}ok"), HANDSHAKE_TIMEOUT)?;
        Ok(())
    }

    /// Reset the engine for a new game and wait until it is ready.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        let protocol = self.protocol.clone();
        self.write(&format!("{protocol}newgame"))?;
        self.synchronize()
    }

    /// Wait for the engine to finish any pending work: `isready`, await
    /// `readyok`.
    pub fn synchronize(&mut self) -> Result<(), EngineError> {
        self.write("isready")?;
        self.await_match("readyok", HANDSHAKE_TIMEOUT)?;
        Ok(())
    }

    /// Send one protocol line.
    pub fn write(&mut self, line: &str) -> Result<(), EngineError> {
        debug!("({})< {line}", self.name);
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Consume engine output until a line matches `pattern` or the timeout
    /// expires. Non-matching lines are discarded.
    pub fn await_match(&mut self, pattern: &str, timeout: Duration) -> Result<String, EngineError> {
        let regex = Regex::new(pattern).map_err(|err| EngineError::Io(err.to_string()))?;
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timeout_error());
            }

            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    if regex.is_match(&line) {
                        return Ok(line);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Err(self.timeout_error()),
                // the reader is gone: no reply can ever arrive, so surface
                // the parked read error instead of sleeping out the budget
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Io(self.parked_error()))
                }
            }
        }
    }

    /// Ask the engine to quit, then make sure it is gone.
    pub fn kill(&mut self) {
        let _ = self.write("quit");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    fn timeout_error(&self) -> EngineError {
        match &*self.read_error.lock().expect("reader slot poisoned") {
            Some(parked) => EngineError::Io(parked.clone()),
            None => EngineError::Timeout,
        }
    }

    fn parked_error(&self) -> String {
        self.read_error
            .lock()
            .expect("reader slot poisoned")
            .clone()
            .unwrap_or_else(|| "engine closed its output".to_string())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.kill();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}
