//! End-to-end games and tournaments against scripted engines.

mod common;

use common::*;
use duelist::config::TournamentConfig;
use duelist::game::{self, GameConfig, GameOutcome};
use duelist::oracle::GameKind;
use duelist::tournament;

fn single_game(engines: [duelist::engine::EngineConfig; 2], opening: &str) -> (GameOutcome, String) {
    game::run(&GameConfig {
        kind: GameKind::Ataxx,
        opening_fen: opening.to_string(),
        engines,
    })
}

#[test]
fn crashing_engine_forfeits_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let good = striker(dir.path(), "good");
    let bad = quitter(dir.path(), "bad");

    let (outcome, reason) = single_game(
        [
            engine_config("good", &good, "8+0.08"),
            engine_config("bad", &bad, "8+0.08"),
        ],
        ATAXX_START,
    );

    assert_eq!(outcome, GameOutcome::Player1Wins);
    assert!(!reason.is_empty(), "a failure reason is surfaced");
}

#[test]
fn slow_engine_loses_on_time() {
    let dir = tempfile::tempdir().unwrap();
    let slow = sleeper(dir.path(), "slow");
    let fast = passer(dir.path(), "fast");

    let (outcome, reason) = single_game(
        [
            engine_config("slow", &slow, "1+0"),
            engine_config("fast", &fast, "1+0"),
        ],
        ATAXX_START,
    );

    assert_eq!(outcome, GameOutcome::Player2Wins);
    assert_eq!(reason, "timeout");
}

#[test]
fn passive_engines_draw_by_the_halfmove_clock() {
    let dir = tempfile::tempdir().unwrap();
    let one = passer(dir.path(), "one");
    let two = passer(dir.path(), "two");

    let (outcome, reason) = single_game(
        [
            engine_config("one", &one, "8+0.08"),
            engine_config("two", &two, "8+0.08"),
        ],
        ATAXX_NEARLY_STALE,
    );

    assert_eq!(outcome, GameOutcome::Draw);
    assert_eq!(reason, "50-move Rule");
}

#[test]
fn striker_beats_passer_as_either_colour() {
    let dir = tempfile::tempdir().unwrap();
    let hero = striker(dir.path(), "hero");
    let pushover = passer(dir.path(), "pushover");

    let (outcome, reason) = single_game(
        [
            engine_config("hero", &hero, "8+0.08"),
            engine_config("pushover", &pushover, "8+0.08"),
        ],
        ATAXX_START,
    );
    assert_eq!((outcome, reason.as_str()), (GameOutcome::Player1Wins, "Eradication"));

    let (outcome, reason) = single_game(
        [
            engine_config("pushover", &pushover, "8+0.08"),
            engine_config("hero", &hero, "8+0.08"),
        ],
        ATAXX_START,
    );
    assert_eq!((outcome, reason.as_str()), (GameOutcome::Player2Wins, "Eradication"));
}

#[test]
fn round_robin_accounting_balances() {
    let dir = tempfile::tempdir().unwrap();

    let engines = ["alpha", "beta", "gamma", "delta"]
        .iter()
        .map(|name| engine_config(name, &passer(dir.path(), name), "8+0.08"))
        .collect::<Vec<_>>();

    let config = TournamentConfig {
        engines,
        game: GameKind::Ataxx,
        concurrency: 2,
        scheduler: "round-robin".to_string(),
        rounds: 1,
        game_pairs: 1,
        openings: book(dir.path(), ATAXX_NEARLY_STALE, 4),
        recover: false,
    };

    let standings = tournament::run(&config).unwrap();

    // 4 players, one round: 6 encounters of one pair = 12 games, and every
    // engine sits in exactly 6 of them
    let mut games = 0;
    for (name, score) in &standings.entries {
        assert_eq!(score.total(), 6, "{name} played {}", score.total());
        assert_eq!(score.wins + score.losses, 0, "{name} should only draw");
        games += score.total();
    }
    assert_eq!(games, 24, "sum of per-engine tallies is twice the game count");
}

#[test]
fn gauntlet_schedules_only_player_zero_matches() {
    let dir = tempfile::tempdir().unwrap();

    let engines = ["hero", "goon1", "goon2"]
        .iter()
        .map(|name| engine_config(name, &passer(dir.path(), name), "8+0.08"))
        .collect::<Vec<_>>();

    let config = TournamentConfig {
        engines,
        game: GameKind::Ataxx,
        concurrency: 2,
        scheduler: "gauntlet".to_string(),
        rounds: 1,
        game_pairs: 1,
        openings: book(dir.path(), ATAXX_NEARLY_STALE, 4),
        recover: false,
    };

    let standings = tournament::run(&config).unwrap();

    assert_eq!(standings.entries[0].1.total(), 4, "player 0 is in every game");
    assert_eq!(standings.entries[1].1.total(), 2);
    assert_eq!(standings.entries[2].1.total(), 2);
}
