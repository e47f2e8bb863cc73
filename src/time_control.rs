//! Time-control parsing and per-side clock bookkeeping.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::oracle::GameKind;

/// A parsed time control: optional moves-to-go, base time and increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeControl {
    /// Moves per control cycle, -1 for a non-cyclic control.
    pub moves_to_go: i64,
    pub base: Duration,
    pub inc: Duration,
}

impl TimeControl {
    /// Parse a `[moves/]base+increment` string, where base and increment are
    /// in (possibly fractional) seconds. Chess additionally accepts the base
    /// as a `MM:SS` clock; other games reject colons.
    pub fn parse(tc: &str, kind: GameKind) -> Result<TimeControl> {
        let (moves_to_go, rest) = match tc.split_once('/') {
            Some((moves, rest)) => {
                let moves = moves
                    .parse::<i64>()
                    .with_context(|| format!("parse tc: bad moves-to-go in {tc:?}"))?;
                (moves, rest)
            }
            None => (-1, tc),
        };

        let Some((base, inc)) = rest.split_once('+') else {
            bail!("parse tc: increment not found in {tc:?}");
        };

        Ok(TimeControl {
            moves_to_go,
            base: parse_base(base, kind)?,
            inc: parse_seconds(inc)?,
        })
    }

    /// A fresh clock for one side of one game.
    pub fn clock(&self) -> Clock {
        Clock {
            remaining_ms: self.base.as_millis() as i64,
            increment_ms: self.inc.as_millis() as i64,
        }
    }
}

fn parse_base(base: &str, kind: GameKind) -> Result<Duration> {
    match base.split_once(':') {
        Some((minutes, seconds)) if kind.clock_base_allowed() => {
            let minutes = minutes
                .parse::<f64>()
                .with_context(|| format!("parse tc: bad minutes in {base:?}"))?;
            let seconds = seconds
                .parse::<f64>()
                .with_context(|| format!("parse tc: bad seconds in {base:?}"))?;
            Ok(millis(minutes * 60.0 + seconds))
        }
        Some(_) => bail!("parse tc: clock base {base:?} is only valid for chess"),
        None => parse_seconds(base),
    }
}

fn parse_seconds(s: &str) -> Result<Duration> {
    let seconds = s
        .parse::<f64>()
        .with_context(|| format!("parse tc: bad duration {s:?}"))?;
    Ok(millis(seconds))
}

fn millis(seconds: f64) -> Duration {
    Duration::from_millis((seconds * 1000.0).round() as u64)
}

/// Mutable clock state for one side. Remaining time is signed so a late
/// reply is observable as an overdraft.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub remaining_ms: i64,
    pub increment_ms: i64,
}

impl Clock {
    /// Debit the measured reply time and credit the increment.
    pub fn debit(&mut self, elapsed: Duration) {
        self.remaining_ms -= elapsed.as_millis() as i64;
        self.remaining_ms += self.increment_ms;
    }

    /// How long to wait for the next reply before flagging.
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.remaining_ms.max(0) as u64)
    }
}

#[cfg(test)]
mod time_control_tests {
    use super::*;

    #[test]
    fn parses_cyclic_control() {
        let tc = TimeControl::parse("40/60+0.5", GameKind::Chess).unwrap();
        assert_eq!(tc.moves_to_go, 40);
        assert_eq!(tc.base, Duration::from_secs(60));
        assert_eq!(tc.inc, Duration::from_millis(500));
    }

    #[test]
    fn parses_sudden_death_control() {
        let tc = TimeControl::parse("8+0.08", GameKind::Ataxx).unwrap();
        assert_eq!(tc.moves_to_go, -1);
        assert_eq!(tc.base, Duration::from_secs(8));
        assert_eq!(tc.inc, Duration::from_millis(80));
    }

    #[test]
    fn missing_increment_is_an_error() {
        let err = TimeControl::parse("8", GameKind::Chess).unwrap_err();
        assert!(err.to_string().contains("increment not found"), "{err}");
    }

    #[test]
    fn clock_base_is_chess_only() {
        let tc = TimeControl::parse("1:30+1", GameKind::Chess).unwrap();
        assert_eq!(tc.base, Duration::from_secs(90));
        assert_eq!(tc.inc, Duration::from_secs(1));

        assert!(TimeControl::parse("1:30+1", GameKind::Ataxx).is_err());
    }

    #[test]
    fn rejects_junk() {
        assert!(TimeControl::parse("abc+1", GameKind::Chess).is_err());
        assert!(TimeControl::parse("x/8+1", GameKind::Chess).is_err());
        assert!(TimeControl::parse("8+x", GameKind::Chess).is_err());
    }

    #[test]
    fn clock_overdrafts_on_late_replies() {
        let tc = TimeControl::parse("1+0", GameKind::Ataxx).unwrap();
        let mut clock = tc.clock();
        assert_eq!(clock.budget(), Duration::from_secs(1));

        clock.debit(Duration::from_millis(1500));
        assert!(clock.remaining_ms <= 0);
        assert_eq!(clock.budget(), Duration::ZERO);
    }

    #[test]
    fn increment_is_credited_after_the_debit() {
        let tc = TimeControl::parse("10+2", GameKind::Ataxx).unwrap();
        let mut clock = tc.clock();
        clock.debit(Duration::from_millis(500));
        assert_eq!(clock.remaining_ms, 11_500);
    }
}
