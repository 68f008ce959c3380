// Player snapshots and the surrounding market/team/rival records.
//
// Every record here is an immutable input to the core. Point and price
// histories are stored chronologically: index 0 is the oldest observation
// and the last element is the most recent one. Loaders that receive
// newest-first data must reverse it before constructing a `Player`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = u32;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Playing position. Parsing accepts short codes, the Spanish league codes
/// (`POR`, `DEF`, `CEN`, `DEL`) and long names, in any case. Serializes as
/// the short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string (case-insensitive).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "POR" | "PORTERO" | "GOALKEEPER" => Some(Position::Goalkeeper),
            "DEF" | "DEFENSA" | "DEFENDER" => Some(Position::Defender),
            "MID" | "CEN" | "CENTROCAMPISTA" | "MIDFIELDER" => Some(Position::Midfielder),
            "FWD" | "DEL" | "DELANTERO" | "FORWARD" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// How many of this position a full squad is expected to carry.
    pub fn squad_target(&self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// Valuation premium for scarce, high-scoring positions.
    pub fn scarcity_multiplier(&self) -> f64 {
        match self {
            Position::Goalkeeper => 0.9,
            Position::Defender => 1.0,
            Position::Midfielder => 1.1,
            Position::Forward => 1.2,
        }
    }

    /// How strongly this position's scoring reacts to opponent strength.
    pub fn fixture_sensitivity(&self) -> f64 {
        match self {
            Position::Goalkeeper => 0.8,
            Position::Defender => 1.0,
            Position::Midfielder => 1.1,
            Position::Forward => 1.2,
        }
    }

    /// League-wide baseline points per game for a player with no history.
    pub fn baseline_points_per_game(&self) -> f64 {
        match self {
            Position::Goalkeeper => 3.5,
            Position::Defender => 4.2,
            Position::Midfielder => 4.8,
            Position::Forward => 5.1,
        }
    }

    /// Points per game of a freely available bench replacement.
    pub fn replacement_points_per_game(&self) -> f64 {
        match self {
            Position::Goalkeeper => 2.0,
            Position::Defender => 2.5,
            Position::Midfielder => 3.0,
            Position::Forward => 3.5,
        }
    }

    /// Per-game points variance assumed when a player has too little history.
    pub fn default_points_variance(&self) -> f64 {
        match self {
            Position::Goalkeeper => 4.0,
            Position::Defender => 6.0,
            Position::Midfielder => 8.0,
            Position::Forward => 10.0,
        }
    }
}

impl TryFrom<String> for Position {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Position::from_str_pos(&s).ok_or_else(|| format!("unknown position '{s}'"))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lineup availability reported by the league. Parsing accepts English and
/// Spanish labels in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PlayerStatus {
    #[default]
    Available,
    Doubtful,
    Injured,
    Suspended,
}

impl PlayerStatus {
    pub fn from_str_status(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "available" | "disponible" => Some(PlayerStatus::Available),
            "doubtful" | "duda" => Some(PlayerStatus::Doubtful),
            "injured" | "lesionado" => Some(PlayerStatus::Injured),
            "suspended" | "sancionado" => Some(PlayerStatus::Suspended),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlayerStatus::Available => "available",
            PlayerStatus::Doubtful => "doubtful",
            PlayerStatus::Injured => "injured",
            PlayerStatus::Suspended => "suspended",
        }
    }

    /// Injured and doubtful players carry fitness uncertainty; a suspension
    /// is a known absence.
    pub fn has_fitness_doubt(&self) -> bool {
        matches!(self, PlayerStatus::Injured | PlayerStatus::Doubtful)
    }
}

impl TryFrom<String> for PlayerStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        PlayerStatus::from_str_status(&s).ok_or_else(|| format!("unknown status '{s}'"))
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player snapshot as supplied by the loading collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    /// Current market price in millions.
    pub price: f64,
    /// Points per match, oldest first.
    #[serde(default)]
    pub recent_points: Vec<f64>,
    #[serde(default)]
    pub season_average_points: f64,
    #[serde(default)]
    pub status: PlayerStatus,
    /// Share of league rosters holding the player, 0-100.
    #[serde(default)]
    pub ownership_percent: f64,
    /// Difficulty of the next match, 1 (easy) to 5 (hard).
    #[serde(default)]
    pub fixture_difficulty: Option<u8>,
    /// Upcoming opponents in match order.
    #[serde(default)]
    pub next_opponents: Vec<String>,
    #[serde(default)]
    pub minutes_played: u32,
    #[serde(default)]
    pub games_played: u32,
    /// Past prices, oldest first.
    #[serde(default)]
    pub price_history: Vec<f64>,
    /// Externally supplied probability of starting, if known.
    #[serde(default)]
    pub starter_probability: Option<f64>,
}

impl Player {
    /// Construct a player with every optional field at its default.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        team: impl Into<String>,
        position: Position,
        price: f64,
    ) -> Self {
        Player {
            id,
            name: name.into(),
            team: team.into(),
            position,
            price,
            recent_points: Vec::new(),
            season_average_points: 0.0,
            status: PlayerStatus::Available,
            ownership_percent: 0.0,
            fixture_difficulty: None,
            next_opponents: Vec::new(),
            minutes_played: 0,
            games_played: 0,
            price_history: Vec::new(),
            starter_probability: None,
        }
    }

    /// The `n` most recent point totals (fewer if the history is shorter).
    pub fn latest_points(&self, n: usize) -> &[f64] {
        let start = self.recent_points.len().saturating_sub(n);
        &self.recent_points[start..]
    }

    /// The `n` most recent prices (fewer if the history is shorter).
    pub fn latest_prices(&self, n: usize) -> &[f64] {
        let start = self.price_history.len().saturating_sub(n);
        &self.price_history[start..]
    }

    /// Average minutes per appearance, or `None` before the first appearance.
    pub fn minutes_per_game(&self) -> Option<f64> {
        if self.games_played == 0 {
            None
        } else {
            Some(self.minutes_played as f64 / self.games_played as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// Surrounding records
// ---------------------------------------------------------------------------

/// A scheduled match with a difficulty rating for each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub team_home: String,
    pub team_away: String,
    #[serde(default)]
    pub gameweek: u32,
    pub difficulty_home: u8,
    pub difficulty_away: u8,
}

impl Fixture {
    /// Difficulty faced by `team`, if it plays in this fixture.
    pub fn difficulty_for(&self, team: &str) -> Option<u8> {
        if self.team_home == team {
            Some(self.difficulty_home)
        } else if self.team_away == team {
            Some(self.difficulty_away)
        } else {
            None
        }
    }
}

/// Transfer-market movement for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub player_id: PlayerId,
    pub current_price: f64,
    /// Price change since the previous gameweek.
    pub price_change: f64,
    #[serde(default)]
    pub predicted_price: f64,
    /// Demand level, 0-1.
    #[serde(default)]
    pub demand: f64,
    /// Supply level, 0-1.
    #[serde(default)]
    pub supply: f64,
}

/// The user's squad and available money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    pub players: Vec<Player>,
    /// Money available for transfers, in millions.
    pub bankroll: f64,
}

/// Players that can currently be bought, plus optional price movement data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub available_players: Vec<Player>,
    #[serde(default)]
    pub market_data: Vec<MarketData>,
}

impl Market {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.available_players.iter().find(|p| p.id == id)
    }

    pub fn market_data_for(&self, id: PlayerId) -> Option<&MarketData> {
        self.market_data.iter().find(|m| m.player_id == id)
    }
}

/// A competing manager's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RivalTeam {
    pub team_id: String,
    #[serde(default)]
    pub manager_name: String,
    pub players: Vec<PlayerId>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_parses_short_and_spanish_codes() {
        assert_eq!(Position::from_str_pos("gk"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("POR"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("cen"), Some(Position::Midfielder));
        assert_eq!(Position::from_str_pos("Delantero"), Some(Position::Forward));
        assert_eq!(Position::from_str_pos("SS"), None);
    }

    #[test]
    fn squad_targets_sum_to_fifteen() {
        let total: usize = Position::ALL.iter().map(|p| p.squad_target()).sum();
        assert_eq!(total, 15);
    }

    #[test]
    fn status_parses_both_languages() {
        assert_eq!(PlayerStatus::from_str_status("Injured"), Some(PlayerStatus::Injured));
        assert_eq!(PlayerStatus::from_str_status("duda"), Some(PlayerStatus::Doubtful));
        assert_eq!(PlayerStatus::from_str_status("unknown"), None);
    }

    #[test]
    fn latest_points_takes_tail() {
        let mut p = Player::new(1, "A", "T", Position::Midfielder, 5.0);
        p.recent_points = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(p.latest_points(3), &[2.0, 3.0, 4.0]);
        assert_eq!(p.latest_points(10).len(), 4);
    }

    #[test]
    fn minutes_per_game_requires_appearances() {
        let mut p = Player::new(1, "A", "T", Position::Defender, 5.0);
        assert_eq!(p.minutes_per_game(), None);
        p.games_played = 4;
        p.minutes_played = 300;
        assert_eq!(p.minutes_per_game(), Some(75.0));
    }

    #[test]
    fn fixture_difficulty_for_home_and_away() {
        let fx = Fixture {
            team_home: "Sevilla".into(),
            team_away: "Getafe".into(),
            gameweek: 7,
            difficulty_home: 2,
            difficulty_away: 4,
        };
        assert_eq!(fx.difficulty_for("Sevilla"), Some(2));
        assert_eq!(fx.difficulty_for("Getafe"), Some(4));
        assert_eq!(fx.difficulty_for("Girona"), None);
    }

    #[test]
    fn player_deserializes_with_defaults_and_aliases() {
        let json = r#"{"id": 3, "name": "X", "team": "Y", "position": "DEL",
                       "price": 7.5, "status": "lesionado"}"#;
        let p: Player = serde_json::from_str(json).unwrap();
        assert_eq!(p.position, Position::Forward);
        assert_eq!(p.status, PlayerStatus::Injured);
        assert!(p.recent_points.is_empty());
        assert_eq!(p.fixture_difficulty, None);
    }

    #[test]
    fn deserialization_is_case_insensitive() {
        for (pos, status) in [("gk", "Available"), ("PORTERO", "DISPONIBLE"), (" Goalkeeper ", "available")] {
            let json = format!(
                r#"{{"id": 1, "name": "X", "team": "Y", "position": "{pos}", "price": 5.0, "status": "{status}"}}"#
            );
            let p: Player = serde_json::from_str(&json).unwrap();
            assert_eq!(p.position, Position::Goalkeeper, "{pos}");
            assert_eq!(p.status, PlayerStatus::Available, "{status}");
        }
        let bad = r#"{"id": 1, "name": "X", "team": "Y", "position": "SS", "price": 5.0}"#;
        let err = serde_json::from_str::<Player>(bad).unwrap_err();
        assert!(err.to_string().contains("unknown position 'SS'"));
    }

    #[test]
    fn serializes_canonical_labels() {
        assert_eq!(serde_json::to_string(&Position::Midfielder).unwrap(), "\"MID\"");
        assert_eq!(serde_json::to_string(&PlayerStatus::Doubtful).unwrap(), "\"doubtful\"");
        let back: Position = serde_json::from_str("\"MID\"").unwrap();
        assert_eq!(back, Position::Midfielder);
    }
}
