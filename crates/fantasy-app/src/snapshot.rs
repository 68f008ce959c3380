// Snapshot and fixture loading.
//
// A snapshot is a single JSON document holding the user's squad, the
// transfer market and rival rosters. This is the boundary where input is
// validated and histories are normalized to oldest-first before anything
// reaches the core.

use fantasy_core::player::{Fixture, Market, Player, PlayerId, RivalTeam, TeamState};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Order of `recent_points` and `price_history` in the incoming document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub team: TeamState,
    #[serde(default)]
    pub market: Market,
    #[serde(default)]
    pub rivals: Vec<RivalTeam>,
    /// Fixtures embedded in the snapshot; a fixtures CSV adds to these.
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    #[serde(default)]
    pub recent_points_order: HistoryOrder,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Snapshot parsing
// ---------------------------------------------------------------------------

/// Parse, validate and normalize a snapshot document.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, SnapshotError> {
    let mut snapshot: Snapshot = serde_json::from_str(text)?;
    validate(&snapshot)?;
    if snapshot.recent_points_order == HistoryOrder::NewestFirst {
        for p in snapshot
            .team
            .players
            .iter_mut()
            .chain(snapshot.market.available_players.iter_mut())
        {
            reverse_histories(p);
        }
        snapshot.recent_points_order = HistoryOrder::OldestFirst;
    }
    Ok(snapshot)
}

/// Load a snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_snapshot(&text)
}

fn reverse_histories(player: &mut Player) {
    player.recent_points.reverse();
    player.price_history.reverse();
}

fn validate_player(p: &Player) -> Result<(), SnapshotError> {
    if !p.price.is_finite() || p.price < 0.0 {
        return Err(SnapshotError::Validation(format!(
            "player {} ({}) has invalid price {}",
            p.id, p.name, p.price
        )));
    }
    if !(0.0..=100.0).contains(&p.ownership_percent) {
        return Err(SnapshotError::Validation(format!(
            "player {} ({}) has ownership {} outside 0-100",
            p.id, p.name, p.ownership_percent
        )));
    }
    if let Some(d) = p.fixture_difficulty {
        if !(1..=5).contains(&d) {
            return Err(SnapshotError::Validation(format!(
                "player {} ({}) has fixture difficulty {} outside 1-5",
                p.id, p.name, d
            )));
        }
    }
    if let Some(prob) = p.starter_probability {
        if !(0.0..=1.0).contains(&prob) {
            return Err(SnapshotError::Validation(format!(
                "player {} ({}) has starter probability {} outside 0-1",
                p.id, p.name, prob
            )));
        }
    }
    if p.recent_points.iter().any(|v| !v.is_finite())
        || p.price_history.iter().any(|v| !v.is_finite())
    {
        return Err(SnapshotError::Validation(format!(
            "player {} ({}) has a non-finite history value",
            p.id, p.name
        )));
    }
    Ok(())
}

fn validate(snapshot: &Snapshot) -> Result<(), SnapshotError> {
    if !snapshot.team.bankroll.is_finite() || snapshot.team.bankroll < 0.0 {
        return Err(SnapshotError::Validation(format!(
            "bankroll must be a non-negative number, got {}",
            snapshot.team.bankroll
        )));
    }

    let mut squad_ids: HashSet<PlayerId> = HashSet::new();
    for p in &snapshot.team.players {
        validate_player(p)?;
        if !squad_ids.insert(p.id) {
            return Err(SnapshotError::Validation(format!(
                "player {} appears twice in the squad",
                p.id
            )));
        }
    }

    let mut market_ids: HashSet<PlayerId> = HashSet::new();
    for p in &snapshot.market.available_players {
        validate_player(p)?;
        if !market_ids.insert(p.id) {
            return Err(SnapshotError::Validation(format!(
                "player {} appears twice in the market",
                p.id
            )));
        }
    }

    for f in &snapshot.fixtures {
        if !(1..=5).contains(&f.difficulty_home) || !(1..=5).contains(&f.difficulty_away) {
            return Err(SnapshotError::Validation(format!(
                "fixture {} v {} has difficulty outside 1-5",
                f.team_home, f.team_away
            )));
        }
    }

    for m in &snapshot.market.market_data {
        if !market_ids.contains(&m.player_id) {
            warn!(
                "market data for player {} has no matching market player",
                m.player_id
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fixtures CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawFixture {
    team_home: String,
    team_away: String,
    #[serde(default)]
    gameweek: u32,
    difficulty_home: u8,
    difficulty_away: u8,
}

fn load_fixtures_from_reader<R: Read>(rdr: R) -> Result<Vec<Fixture>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut fixtures = Vec::new();
    for result in reader.deserialize::<RawFixture>() {
        match result {
            Ok(raw) => {
                let home = raw.team_home.trim();
                let away = raw.team_away.trim();
                if home.is_empty() || away.is_empty() {
                    warn!("skipping fixture with a blank team name");
                    continue;
                }
                if !(1..=5).contains(&raw.difficulty_home)
                    || !(1..=5).contains(&raw.difficulty_away)
                {
                    warn!(
                        "skipping fixture {} v {}: difficulty outside 1-5",
                        home, away
                    );
                    continue;
                }
                fixtures.push(Fixture {
                    team_home: home.to_string(),
                    team_away: away.to_string(),
                    gameweek: raw.gameweek,
                    difficulty_home: raw.difficulty_home,
                    difficulty_away: raw.difficulty_away,
                });
            }
            Err(e) => {
                warn!("skipping malformed fixture row: {}", e);
            }
        }
    }
    Ok(fixtures)
}

/// Load fixtures from a CSV file with columns
/// `team_home,team_away,gameweek,difficulty_home,difficulty_away`.
pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>, SnapshotError> {
    let file = std::fs::File::open(path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_fixtures_from_reader(file).map_err(|e| SnapshotError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fantasy_core::player::Position;

    const MINIMAL: &str = r#"{
        "team": {
            "players": [
                {"id": 1, "name": "Bono", "team": "Sevilla", "position": "POR", "price": 5.0,
                 "recent_points": [2, 4, 6], "price_history": [4.5, 4.8, 5.0]}
            ],
            "bankroll": 10.0
        }
    }"#;

    #[test]
    fn minimal_snapshot_uses_defaults() {
        let s = parse_snapshot(MINIMAL).unwrap();
        assert_eq!(s.team.players.len(), 1);
        assert_eq!(s.team.players[0].position, Position::Goalkeeper);
        assert_eq!(s.team.players[0].recent_points, vec![2.0, 4.0, 6.0]);
        assert!(s.market.available_players.is_empty());
        assert!(s.rivals.is_empty());
        assert_eq!(s.recent_points_order, HistoryOrder::OldestFirst);
    }

    #[test]
    fn newest_first_histories_are_reversed() {
        let text = MINIMAL.replacen('{', r#"{"recent_points_order": "newest_first","#, 1);
        let s = parse_snapshot(&text).unwrap();
        let p = &s.team.players[0];
        assert_eq!(p.recent_points, vec![6.0, 4.0, 2.0]);
        assert_eq!(p.price_history, vec![5.0, 4.8, 4.5]);
        assert_eq!(s.recent_points_order, HistoryOrder::OldestFirst);
    }

    #[test]
    fn negative_bankroll_is_rejected() {
        let text = MINIMAL.replace("\"bankroll\": 10.0", "\"bankroll\": -1.0");
        match parse_snapshot(&text) {
            Err(SnapshotError::Validation(msg)) => assert!(msg.contains("bankroll")),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_difficulty_is_rejected() {
        let text = MINIMAL.replace("\"price\": 5.0,", "\"price\": 5.0, \"fixture_difficulty\": 7,");
        assert!(matches!(
            parse_snapshot(&text),
            Err(SnapshotError::Validation(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            parse_snapshot("{\"team\": "),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn fixtures_csv_skips_bad_rows() {
        let csv = "\
team_home,team_away,gameweek,difficulty_home,difficulty_away
Sevilla,Real Madrid,5,5,2
Girona,Getafe,5,9,3
Betis,Valencia,not-a-number,3,3
Osasuna,Celta,6,3,2
";
        let fixtures = load_fixtures_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].team_home, "Sevilla");
        assert_eq!(fixtures[0].difficulty_for("Sevilla"), Some(5));
        assert_eq!(fixtures[1].gameweek, 6);
    }

    #[test]
    fn missing_fixtures_file_is_io_error() {
        let path = std::env::temp_dir().join("fantasy_app_missing_fixtures.csv");
        assert!(matches!(
            load_fixtures(&path),
            Err(SnapshotError::Io { .. })
        ));
    }
}
