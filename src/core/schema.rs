//! Declarative stat schemas and column extraction.
//!
//! A schema lists the columns of a player table (or leader table) together
//! with the upstream stat names each column accepts and the stat categories it
//! is searched in. Extraction never branches on league beyond the schema
//! lookup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::league::League;

/// One output column and the upstream stat names it accepts.
#[derive(Debug)]
pub struct StatColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    /// Categories searched first; empty means the schema's `stat_categories`.
    pub categories: &'static [&'static str],
}

#[derive(Debug)]
pub struct StatSchema {
    pub stat_categories: &'static [&'static str],
    /// Leaders category the table is built from.
    pub leader_category: Option<&'static str>,
    pub columns: &'static [StatColumn],
}

/// `mode=`: batting/offense vs pitching/defense flavour of a league's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatMode {
    #[default]
    Hitting,
    Pitching,
}

impl StatMode {
    /// Anything but `pitching` is `hitting`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("pitching") => Self::Pitching,
            _ => Self::Hitting,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hitting => "hitting",
            Self::Pitching => "pitching",
        }
    }
}

/// `view=`: column set of the player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableView {
    #[default]
    Standard,
    Expanded,
}

impl TableView {
    /// Anything but `expanded` is `standard`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("expanded") => Self::Expanded,
            _ => Self::Standard,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Expanded => "expanded",
        }
    }
}

// =============================================================================
// Upstream statistics payload
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub short_display_name: Option<String>,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatSplits {
    #[serde(default)]
    pub categories: Vec<StatCategory>,
}

/// Athlete statistics resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatisticsPayload {
    #[serde(default)]
    pub splits: Option<StatSplits>,
}

impl StatisticsPayload {
    #[must_use]
    pub fn categories(&self) -> &[StatCategory] {
        self.splits.as_ref().map_or(&[], |s| s.categories.as_slice())
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

impl StatEntry {
    fn matches(&self, aliases: &[String]) -> bool {
        [
            &self.name,
            &self.abbreviation,
            &self.display_name,
            &self.short_display_name,
        ]
        .into_iter()
        .flatten()
        .any(|field| aliases.contains(&normalize_key(field)))
    }

    /// `displayValue` when present, else `value`.
    fn output(&self) -> Option<Value> {
        self.display_value
            .clone()
            .map(Value::String)
            .or_else(|| self.value.clone().filter(|v| !v.is_null()))
    }
}

fn find_in<'a>(
    categories: impl IntoIterator<Item = &'a StatCategory>,
    aliases: &[String],
) -> Option<Value> {
    categories
        .into_iter()
        .flat_map(|category| category.stats.iter())
        .find(|stat| stat.matches(aliases) && stat.output().is_some())
        .and_then(StatEntry::output)
}

/// Value of `column` in `categories`.
///
/// The column's own categories (else `fallback`) are searched first, then
/// every category. The first matching stat with a value wins.
#[must_use]
pub fn extract_stat(
    categories: &[StatCategory],
    column: &StatColumn,
    fallback: &[&str],
) -> Option<Value> {
    if categories.is_empty() {
        return None;
    }
    let aliases: Vec<String> = column
        .aliases
        .iter()
        .filter(|a| !a.is_empty())
        .map(|a| normalize_key(a))
        .collect();
    if aliases.is_empty() {
        return None;
    }

    let desired = if column.categories.is_empty() {
        fallback
    } else {
        column.categories
    };
    // A repeated category name resolves to its last occurrence.
    let preferred: Vec<&StatCategory> = desired
        .iter()
        .filter_map(|wanted| {
            let wanted = normalize_key(wanted);
            categories
                .iter()
                .rfind(|c| c.name.as_deref().map(normalize_key).as_deref() == Some(&wanted))
        })
        .collect();

    if preferred.is_empty() {
        return find_in(categories, &aliases);
    }
    find_in(preferred, &aliases).or_else(|| find_in(categories, &aliases))
}

/// Extract every column of `schema` into a JSON object; missing values are null.
#[must_use]
pub fn extract_row(
    categories: &[StatCategory],
    schema: &StatSchema,
) -> serde_json::Map<String, Value> {
    schema
        .columns
        .iter()
        .map(|column| {
            let value = extract_stat(categories, column, schema.stat_categories);
            (column.key.to_string(), value.unwrap_or(Value::Null))
        })
        .collect()
}

// =============================================================================
// Schema tables
// =============================================================================

macro_rules! col {
    ($key:literal, $label:literal, [$($alias:literal),* $(,)?]) => {
        StatColumn { key: $key, label: $label, aliases: &[$($alias),*], categories: &[] }
    };
    ($key:literal, $label:literal, [$($alias:literal),* $(,)?], [$($cat:literal),* $(,)?]) => {
        StatColumn { key: $key, label: $label, aliases: &[$($alias),*], categories: &[$($cat),*] }
    };
}

const MLB_HITTING_STANDARD_COLUMNS: &[StatColumn] = &[
    col!("g", "G", ["teamGamesPlayed", "gamesPlayed", "G", "GP"]),
    col!("ab", "AB", ["atBats", "AB"]),
    col!("r", "R", ["runs", "R"]),
    col!("h", "H", ["hits", "H"]),
    col!("2b", "2B", ["doubles", "2B"]),
    col!("3b", "3B", ["triples", "3B"]),
    col!("hr", "HR", ["homeRuns", "HR"]),
    col!("rbi", "RBI", ["RBIs", "RBI"]),
    col!("bb", "BB", ["walks", "BB"]),
    col!("so", "SO", ["strikeouts", "SO", "K"]),
    col!("sb", "SB", ["stolenBases", "SB"]),
    col!("cs", "CS", ["caughtStealing", "CS"]),
    col!("avg", "AVG", ["avg", "battingAverage", "AVG"]),
    col!("obp", "OBP", ["onBasePct", "onBasePercentage", "OBP"]),
    col!("slg", "SLG", ["slugAvg", "sluggingPercentage", "SLG"]),
    col!("ops", "OPS", ["OPS", "onBasePlusSlugging"]),
];

const MLB_PITCHING_STANDARD_COLUMNS: &[StatColumn] = &[
    col!("g", "G", ["gamesPlayed", "GP", "G"]),
    col!("gs", "GS", ["gamesStarted", "GS"]),
    col!("ip", "IP", ["innings", "IP"]),
    col!("w", "W", ["wins", "W"]),
    col!("l", "L", ["losses", "L"]),
    col!("sv", "SV", ["saves", "SV"]),
    col!("so", "SO", ["strikeouts", "SO", "K"]),
    col!("bb", "BB", ["walks", "BB"]),
    col!("era", "ERA", ["ERA", "earnedRunAverage"]),
    col!("whip", "WHIP", ["WHIP", "walksHitsPerInningPitched"]),
];

// Leader schemas

static MLB_HITTING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["batting"],
    leader_category: Some("avg"),
    columns: MLB_HITTING_STANDARD_COLUMNS,
};

static MLB_PITCHING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["pitching"],
    leader_category: Some("ERA"),
    columns: MLB_PITCHING_STANDARD_COLUMNS,
};

static NBA_HITTING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["offensive", "general", "defensive"],
    leader_category: Some("pointsPerGame"),
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("min", "MIN", ["avgMinutes", "minutes", "MIN"], ["general"]),
        col!("pts", "PTS", ["avgPoints", "points", "PTS"], ["offensive"]),
        col!("reb", "REB", ["avgRebounds", "rebounds", "REB"], ["general"]),
        col!("ast", "AST", ["avgAssists", "assists", "AST"], ["offensive"]),
        col!("stl", "STL", ["avgSteals", "steals", "STL"], ["defensive"]),
        col!("blk", "BLK", ["avgBlocks", "blocks", "BLK"], ["defensive"]),
        col!("fgp", "FG%", ["fieldGoalPct", "FG%"], ["offensive"]),
        col!("tpp", "3P%", ["threePointPct", "threePointFieldGoalPct", "3P%"], ["offensive"]),
        col!("ftp", "FT%", ["freeThrowPct", "FT%"], ["offensive"]),
    ],
};

static NBA_PITCHING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["defensive", "general"],
    leader_category: Some("blocksPerGame"),
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("min", "MIN", ["avgMinutes", "minutes", "MIN"], ["general"]),
        col!("reb", "REB", ["avgRebounds", "rebounds", "REB"], ["general"]),
        col!("stl", "STL", ["avgSteals", "steals", "STL"], ["defensive"]),
        col!("blk", "BLK", ["avgBlocks", "blocks", "BLK"], ["defensive"]),
        col!("pf", "PF", ["fouls", "personalFouls", "PF"], ["general"]),
    ],
};

static NFL_HITTING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["passing", "general"],
    leader_category: Some("passingYards"),
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("cmp", "CMP", ["completions", "CMP"], ["passing"]),
        col!("att", "ATT", ["passingAttempts", "ATT"], ["passing"]),
        col!("yds", "YDS", ["passingYards", "YDS"], ["passing"]),
        col!("td", "TD", ["passingTouchdowns", "TD"], ["passing"]),
        col!("int", "INT", ["interceptions", "INT"], ["passing"]),
        col!("rtg", "RTG", ["QBRating", "passerRating", "rating", "RTG"], ["passing"]),
    ],
};

static NFL_PITCHING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["defensive", "defensiveInterceptions", "general"],
    leader_category: Some("totalTackles"),
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("tot", "TOT", ["totalTackles", "TOT"], ["defensive"]),
        col!("sack", "SACK", ["sacks", "SACK"], ["defensive"]),
        col!("tfl", "TFL", ["tacklesForLoss", "TFL"], ["defensive"]),
        col!("pd", "PD", ["passesDefended", "PD"], ["defensive"]),
        col!("int", "INT", ["interceptions", "INT"], ["defensiveInterceptions", "defensive"]),
    ],
};

static NHL_HITTING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["offensive", "general"],
    leader_category: Some("points"),
    columns: &[
        col!("gp", "GP", ["games", "gamesPlayed", "GP"], ["general"]),
        col!("g", "G", ["goals", "G"], ["offensive"]),
        col!("a", "A", ["assists", "A"], ["offensive"]),
        col!("pts", "PTS", ["points", "PTS"], ["offensive"]),
        col!("ppg", "PPG", ["powerPlayGoals", "PPG"], ["offensive"]),
        col!("s", "S", ["shotsTotal", "S"], ["offensive"]),
    ],
};

static NHL_PITCHING_LEADERS: StatSchema = StatSchema {
    stat_categories: &["defensive", "general"],
    leader_category: Some("savePct"),
    columns: &[
        col!("gp", "GP", ["games", "gamesPlayed", "GP"], ["general"]),
        col!("ga", "GA", ["goalsAgainst", "GA"], ["defensive"]),
        col!("gaa", "GAA", ["avgGoalsAgainst", "GAA"], ["defensive"]),
        col!("sv", "SV", ["saves", "SV"], ["defensive"]),
        col!("svp", "SV%", ["savePct", "SV%"], ["defensive"]),
        col!("so", "SO", ["shutouts", "SO"], ["defensive"]),
    ],
};

// Player table schemas

const NFL_TABLE_CATEGORIES: &[&str] = &[
    "passing",
    "rushing",
    "receiving",
    "defensive",
    "defensiveInterceptions",
    "general",
];

static NFL_STANDARD: StatSchema = StatSchema {
    stat_categories: NFL_TABLE_CATEGORIES,
    leader_category: None,
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("passYds", "PASS YDS", ["passingYards", "passYards", "netPassingYards"], ["passing"]),
        col!("passTd", "PASS TD", ["passingTouchdowns", "passTD", "passTd"], ["passing"]),
        col!("int", "INT", ["interceptions", "INT"], ["passing"]),
        col!("rushYds", "RUSH YDS", ["rushingYards", "rushYds"], ["rushing"]),
        col!("rushTd", "RUSH TD", ["rushingTouchdowns", "rushTd"], ["rushing"]),
        col!("rec", "REC", ["receptions", "rec"], ["receiving"]),
        col!("recYds", "REC YDS", ["receivingYards", "recYds"], ["receiving"]),
        col!("recTd", "REC TD", ["receivingTouchdowns", "recTd"], ["receiving"]),
        col!("tackles", "TCK", ["totalTackles", "tackles", "TOT"], ["defensive"]),
        col!("sacks", "SACK", ["sacks", "SACK"], ["defensive"]),
        col!(
            "defInt",
            "DEF INT",
            ["interceptions", "INT"],
            ["defensiveInterceptions", "defensive"]
        ),
    ],
};

static NFL_EXPANDED: StatSchema = StatSchema {
    stat_categories: NFL_TABLE_CATEGORIES,
    leader_category: None,
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("cmp", "CMP", ["completions", "CMP"], ["passing"]),
        col!("att", "ATT", ["passingAttempts", "ATT"], ["passing"]),
        col!("cmpPct", "CMP%", ["completionPct"], ["passing"]),
        col!("ypa", "Y/A", ["yardsPerAttempt", "avgGain"], ["passing"]),
        col!("passYds", "PASS YDS", ["passingYards", "passYards", "netPassingYards"], ["passing"]),
        col!("passTd", "PASS TD", ["passingTouchdowns", "passTD", "passTd"], ["passing"]),
        col!("int", "INT", ["interceptions", "INT"], ["passing"]),
        col!("qbr", "QBR", ["ESPNQBRating", "QBRating", "passerRating", "rating"], ["passing"]),
        col!("rushAtt", "RUSH ATT", ["rushingAttempts", "rushAtt"], ["rushing"]),
        col!("rushYds", "RUSH YDS", ["rushingYards", "rushYds"], ["rushing"]),
        col!("ypc", "YPC", ["yardsPerRushAttempt", "avgGain"], ["rushing"]),
        col!("rushTd", "RUSH TD", ["rushingTouchdowns", "rushTd"], ["rushing"]),
        col!("targets", "TGT", ["receivingTargets", "targets"], ["receiving"]),
        col!("rec", "REC", ["receptions", "rec"], ["receiving"]),
        col!("recYds", "REC YDS", ["receivingYards", "recYds"], ["receiving"]),
        col!("ypr", "Y/REC", ["yardsPerReception", "avgGain"], ["receiving"]),
        col!("recTd", "REC TD", ["receivingTouchdowns", "recTd"], ["receiving"]),
        col!("tackles", "TCK", ["totalTackles", "tackles", "TOT"], ["defensive"]),
        col!("tfl", "TFL", ["tacklesForLoss", "TFL"], ["defensive"]),
        col!("sacks", "SACK", ["sacks", "SACK"], ["defensive"]),
        col!("pd", "PD", ["passesDefended", "PD"], ["defensive"]),
        col!("ff", "FF", ["fumblesForced", "FF"], ["defensive"]),
        col!("fr", "FR", ["fumblesRecovered", "FR"], ["defensive"]),
        col!(
            "defInt",
            "DEF INT",
            ["interceptions", "INT"],
            ["defensiveInterceptions", "defensive"]
        ),
    ],
};

static NBA_STANDARD: StatSchema = StatSchema {
    stat_categories: &["offensive", "defensive", "general"],
    leader_category: None,
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("min", "MIN", ["avgMinutes", "minutes", "MIN"], ["general"]),
        col!("pts", "PTS", ["avgPoints", "points", "PTS"], ["offensive"]),
        col!("reb", "REB", ["avgRebounds", "rebounds", "REB"], ["general"]),
        col!("ast", "AST", ["avgAssists", "assists", "AST"], ["offensive"]),
        col!("stl", "STL", ["avgSteals", "steals", "STL"], ["defensive"]),
        col!("blk", "BLK", ["avgBlocks", "blocks", "BLK"], ["defensive"]),
        col!("fgp", "FG%", ["fieldGoalPct", "FG%"], ["offensive"]),
        col!("tpp", "3P%", ["threePointPct", "threePointFieldGoalPct", "3P%"], ["offensive"]),
        col!("ftp", "FT%", ["freeThrowPct", "FT%"], ["offensive"]),
        col!("tov", "TOV", ["avgTurnovers", "turnovers", "TOV"], ["offensive"]),
    ],
};

static NBA_EXPANDED: StatSchema = StatSchema {
    stat_categories: &["offensive", "defensive", "general"],
    leader_category: None,
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP"], ["general"]),
        col!("min", "MIN", ["minutes", "MIN"], ["general"]),
        col!("pts", "PTS", ["points", "PTS"], ["offensive"]),
        col!("reb", "REB", ["rebounds", "REB"], ["general"]),
        col!("oreb", "OREB", ["offensiveRebounds", "OREB"], ["offensive"]),
        col!("dreb", "DREB", ["defensiveRebounds", "DREB"], ["defensive"]),
        col!("ast", "AST", ["assists", "AST"], ["offensive"]),
        col!("stl", "STL", ["steals", "STL"], ["defensive"]),
        col!("blk", "BLK", ["blocks", "BLK"], ["defensive"]),
        col!("tov", "TOV", ["turnovers", "TOV"], ["offensive"]),
        col!("fgm", "FGM", ["fieldGoalsMade", "FGM"], ["offensive"]),
        col!("fga", "FGA", ["fieldGoalsAttempted", "FGA"], ["offensive"]),
        col!("fgp", "FG%", ["fieldGoalPct", "FG%"], ["offensive"]),
        col!("tpm", "3PM", ["threePointFieldGoalsMade", "3PM"], ["offensive"]),
        col!("tpa", "3PA", ["threePointFieldGoalsAttempted", "3PA"], ["offensive"]),
        col!("tpp", "3P%", ["threePointPct", "threePointFieldGoalPct", "3P%"], ["offensive"]),
        col!("ftm", "FTM", ["freeThrowsMade", "FTM"], ["offensive"]),
        col!("fta", "FTA", ["freeThrowsAttempted", "FTA"], ["offensive"]),
        col!("ftp", "FT%", ["freeThrowPct", "FT%"], ["offensive"]),
        col!("per", "PER", ["PER"], ["general"]),
        col!("pm", "+/-", ["plusMinus"], ["general"]),
    ],
};

static MLB_HITTING_STANDARD: StatSchema = StatSchema {
    stat_categories: &["batting"],
    leader_category: None,
    columns: MLB_HITTING_STANDARD_COLUMNS,
};

static MLB_HITTING_EXPANDED: StatSchema = StatSchema {
    stat_categories: &["batting"],
    leader_category: None,
    columns: &[
        col!("g", "G", ["teamGamesPlayed", "gamesPlayed", "G", "GP"]),
        col!("ab", "AB", ["atBats", "AB"]),
        col!("r", "R", ["runs", "R"]),
        col!("h", "H", ["hits", "H"]),
        col!("2b", "2B", ["doubles", "2B"]),
        col!("3b", "3B", ["triples", "3B"]),
        col!("hr", "HR", ["homeRuns", "HR"]),
        col!("rbi", "RBI", ["RBIs", "RBI"]),
        col!("tb", "TB", ["totalBases", "TB"]),
        col!("bb", "BB", ["walks", "BB"]),
        col!("so", "SO", ["strikeouts", "SO", "K"]),
        col!("hbp", "HBP", ["hitByPitch", "HBP"]),
        col!("ibb", "IBB", ["intentionalWalks", "IBB"]),
        col!("sb", "SB", ["stolenBases", "SB"]),
        col!("cs", "CS", ["caughtStealing", "CS"]),
        col!("avg", "AVG", ["avg", "battingAverage", "AVG"]),
        col!("obp", "OBP", ["onBasePct", "onBasePercentage", "OBP"]),
        col!("slg", "SLG", ["slugAvg", "sluggingPercentage", "SLG"]),
        col!("ops", "OPS", ["OPS", "onBasePlusSlugging"]),
        col!("sf", "SF", ["sacrificeFlies", "SF"]),
        col!("sh", "SH", ["sacrificeHits", "SH"]),
        col!("gidp", "GIDP", ["groundIntoDoublePlay", "GIDP"]),
    ],
};

static MLB_PITCHING_STANDARD: StatSchema = StatSchema {
    stat_categories: &["pitching"],
    leader_category: None,
    columns: MLB_PITCHING_STANDARD_COLUMNS,
};

static MLB_PITCHING_EXPANDED: StatSchema = StatSchema {
    stat_categories: &["pitching"],
    leader_category: None,
    columns: &[
        col!("g", "G", ["gamesPlayed", "GP", "G"]),
        col!("gs", "GS", ["gamesStarted", "GS"]),
        col!("ip", "IP", ["innings", "IP"]),
        col!("w", "W", ["wins", "W"]),
        col!("l", "L", ["losses", "L"]),
        col!("sv", "SV", ["saves", "SV"]),
        col!("hld", "HLD", ["holds", "HLD"]),
        col!("bs", "BS", ["blownSaves", "BS"]),
        col!("so", "SO", ["strikeouts", "SO", "K"]),
        col!("bb", "BB", ["walks", "BB"]),
        col!("h", "H", ["hits", "H"]),
        col!("er", "ER", ["earnedRuns", "ER"]),
        col!("hr", "HR", ["homeRuns", "HR"]),
        col!("era", "ERA", ["ERA", "earnedRunAverage"]),
        col!("whip", "WHIP", ["WHIP", "walksHitsPerInningPitched"]),
        col!("svo", "SVO", ["saveOpportunities", "SVO"]),
        col!("bf", "BF", ["battersFaced", "BF"]),
        col!("pitches", "PIT", ["pitches", "P"]),
        col!("cg", "CG", ["completeGames", "CG"]),
        col!("sho", "SHO", ["shutouts", "SHO"]),
        col!("wpct", "WPCT", ["winPct", "W%"]),
    ],
};

const NHL_TABLE_CATEGORIES: &[&str] = &["offensive", "defensive", "general", "penalties"];

static NHL_STANDARD: StatSchema = StatSchema {
    stat_categories: NHL_TABLE_CATEGORIES,
    leader_category: None,
    columns: &[
        col!("gp", "GP", ["gamesPlayed", "GP"], ["general"]),
        col!("g", "G", ["goals", "G"], ["offensive"]),
        col!("a", "A", ["assists", "A"], ["offensive"]),
        col!("pts", "PTS", ["points", "PTS"], ["offensive"]),
        col!("s", "S", ["shotsTotal", "S"], ["offensive"]),
        col!("pm", "+/-", ["plusMinus"], ["general"]),
        col!("pim", "PIM", ["penaltyMinutes", "PIM"], ["penalties"]),
        col!("ppg", "PPG", ["powerPlayGoals", "PPG"], ["offensive"]),
        col!("shg", "SHG", ["shortHandedGoals", "SHG"], ["offensive"]),
        col!("toi", "TOI/G", ["timeOnIcePerGame", "TOI"], ["general"]),
        col!("w", "W", ["wins", "W"], ["general"]),
        col!("l", "L", ["losses", "L"], ["general"]),
        col!("sv", "SV", ["saves", "SV"], ["defensive"]),
        col!("svp", "SV%", ["savePct", "SV%"], ["defensive"]),
        col!("gaa", "GAA", ["avgGoalsAgainst", "goalsAgainstAvg", "GAA"], ["defensive"]),
        col!("so", "SO", ["shutouts", "SO"], ["defensive"]),
    ],
};

static NHL_EXPANDED: StatSchema = StatSchema {
    stat_categories: NHL_TABLE_CATEGORIES,
    leader_category: None,
    columns: &[
        col!("gp", "GP", ["gamesPlayed", "GP"], ["general"]),
        col!("g", "G", ["goals", "G"], ["offensive"]),
        col!("a", "A", ["assists", "A"], ["offensive"]),
        col!("pts", "PTS", ["points", "PTS"], ["offensive"]),
        col!("ppg", "PPG", ["powerPlayGoals", "PPG"], ["offensive"]),
        col!("shg", "SHG", ["shortHandedGoals", "SHG"], ["offensive"]),
        col!("s", "S", ["shotsTotal", "S"], ["offensive"]),
        col!("sPct", "S%", ["shootingPct", "S%"], ["offensive"]),
        col!("pm", "+/-", ["plusMinus"], ["general"]),
        col!("pim", "PIM", ["penaltyMinutes", "PIM"], ["penalties"]),
        col!("toi", "TOI/G", ["timeOnIcePerGame", "TOI"], ["general"]),
        col!("w", "W", ["wins", "W"], ["general"]),
        col!("l", "L", ["losses", "L"], ["general"]),
        col!("ot", "OTL", ["otLosses", "OT"], ["general"]),
        col!("sv", "SV", ["saves", "SV"], ["defensive"]),
        col!("sa", "SA", ["shotsAgainst", "SA"], ["defensive"]),
        col!("svp", "SV%", ["savePct", "SV%"], ["defensive"]),
        col!("gaa", "GAA", ["avgGoalsAgainst", "goalsAgainstAvg", "GAA"], ["defensive"]),
        col!("ga", "GA", ["goalsAgainst", "GA"], ["defensive"]),
        col!("so", "SO", ["shutouts", "SO"], ["defensive"]),
    ],
};

/// Schema for the season leaders table.
#[must_use]
pub fn leader_schema(league: League, mode: StatMode) -> &'static StatSchema {
    match (league, mode) {
        (League::Mlb, StatMode::Hitting) => &MLB_HITTING_LEADERS,
        (League::Mlb, StatMode::Pitching) => &MLB_PITCHING_LEADERS,
        (League::Nba, StatMode::Hitting) => &NBA_HITTING_LEADERS,
        (League::Nba, StatMode::Pitching) => &NBA_PITCHING_LEADERS,
        (League::Nfl, StatMode::Hitting) => &NFL_HITTING_LEADERS,
        (League::Nfl, StatMode::Pitching) => &NFL_PITCHING_LEADERS,
        (League::Nhl, StatMode::Hitting) => &NHL_HITTING_LEADERS,
        (League::Nhl, StatMode::Pitching) => &NHL_PITCHING_LEADERS,
    }
}

/// Schema for the player table. Only MLB distinguishes modes.
#[must_use]
pub fn table_schema(league: League, mode: StatMode, view: TableView) -> &'static StatSchema {
    match (league, mode, view) {
        (League::Mlb, StatMode::Hitting, TableView::Standard) => &MLB_HITTING_STANDARD,
        (League::Mlb, StatMode::Hitting, TableView::Expanded) => &MLB_HITTING_EXPANDED,
        (League::Mlb, StatMode::Pitching, TableView::Standard) => &MLB_PITCHING_STANDARD,
        (League::Mlb, StatMode::Pitching, TableView::Expanded) => &MLB_PITCHING_EXPANDED,
        (League::Nba, _, TableView::Standard) => &NBA_STANDARD,
        (League::Nba, _, TableView::Expanded) => &NBA_EXPANDED,
        (League::Nfl, _, TableView::Standard) => &NFL_STANDARD,
        (League::Nfl, _, TableView::Expanded) => &NFL_EXPANDED,
        (League::Nhl, _, TableView::Standard) => &NHL_STANDARD,
        (League::Nhl, _, TableView::Expanded) => &NHL_EXPANDED,
    }
}
