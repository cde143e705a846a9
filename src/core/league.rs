//! League definitions and the keyword classifier for match records.
//!
//! Classification is table driven: each league carries its category slugs and
//! brand, team and exclude keyword lists. The rules are evaluated in a fixed
//! order and the first one that decides wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::models::RawMatch;
use crate::error::MatchdayError;

/// Nickname hits that accept a match on their own.
pub const MIN_NICKNAME_HITS: usize = 2;

/// Nickname hits that accept a match whose category names the league.
pub const CATEGORY_NICKNAME_HITS: usize = 1;

/// Keywords that reject a match for every league.
pub const GLOBAL_EXCLUDED_KEYWORDS: &[&str] = &[];

/// Supported leagues, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Nfl,
    Nba,
    Mlb,
    Nhl,
}

impl League {
    /// Priority order used by [`identify`] and the all-leagues sort.
    pub const PRIORITY: [Self; 4] = [Self::Nfl, Self::Nba, Self::Mlb, Self::Nhl];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Nfl => "nfl",
            Self::Nba => "nba",
            Self::Mlb => "mlb",
            Self::Nhl => "nhl",
        }
    }

    /// Sport segment used by the stats provider URLs.
    #[must_use]
    pub fn sport(self) -> &'static str {
        self.config().sport
    }

    #[must_use]
    pub fn config(self) -> &'static LeagueConfig {
        match self {
            Self::Nfl => &NFL,
            Self::Nba => &NBA,
            Self::Mlb => &MLB,
            Self::Nhl => &NHL,
        }
    }

    /// Position in [`League::PRIORITY`].
    #[must_use]
    pub fn priority(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|l| *l == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for League {
    type Err = MatchdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|league| league.key() == wanted)
            .ok_or_else(|| MatchdayError::UnsupportedLeague(s.trim().to_string()))
    }
}

/// `league=` selector on the games, teams and standings views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueScope {
    All,
    One(League),
}

impl LeagueScope {
    /// Parse a query value; empty means `all`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchdayError::UnsupportedLeague`] for unknown keys.
    pub fn parse(value: Option<&str>) -> crate::error::Result<Self> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(Self::All),
            Some(v) if v.eq_ignore_ascii_case("all") => Ok(Self::All),
            Some(v) => v.parse().map(Self::One),
        }
    }

    /// Leagues covered by this scope, in priority order.
    #[must_use]
    pub fn leagues(self) -> Vec<League> {
        match self {
            Self::All => League::PRIORITY.to_vec(),
            Self::One(league) => vec![league],
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::One(league) => league.key(),
        }
    }
}

/// Static classification table for one league.
#[derive(Debug)]
pub struct LeagueConfig {
    pub key: &'static str,
    pub sport: &'static str,
    pub categories: &'static [&'static str],
    pub brand_keywords: &'static [&'static str],
    pub team_keywords: &'static [&'static str],
    pub exclude_keywords: &'static [&'static str],
}

impl LeagueConfig {
    /// Number of team nicknames found in `text`.
    #[must_use]
    pub fn nickname_hits(&self, text: &str) -> usize {
        self.team_keywords
            .iter()
            .filter(|nickname| text.contains(*nickname))
            .count()
    }
}

pub static NFL: LeagueConfig = LeagueConfig {
    key: "nfl",
    sport: "football",
    categories: &["american-football", "nfl", "football-am"],
    brand_keywords: &["nfl", "redzone", "red zone", "nfl network"],
    team_keywords: &[
        "bills", "dolphins", "patriots", "jets", "ravens", "bengals", "browns", "steelers",
        "texans", "colts", "jaguars", "titans", "broncos", "chiefs", "raiders", "chargers",
        "cowboys", "giants", "eagles", "commanders", "bears", "lions", "packers", "vikings",
        "falcons", "panthers", "saints", "buccaneers", "cardinals", "rams", "49ers", "seahawks",
    ],
    exclude_keywords: &[
        "ncaaf", "ncaa", "college", "cfb", "fbs", "fcs", "xfl", "usfl", "cfl", "arena", "nhl",
        "hockey", "ice hockey",
    ],
};

pub static NBA: LeagueConfig = LeagueConfig {
    key: "nba",
    sport: "basketball",
    categories: &["basketball", "nba"],
    brand_keywords: &["nba", "nba tv", "league pass", "summer league", "all-star", "all star"],
    team_keywords: &[
        "hawks", "celtics", "nets", "hornets", "bulls", "cavaliers", "mavericks", "nuggets",
        "pistons", "warriors", "rockets", "pacers", "clippers", "lakers", "grizzlies", "heat",
        "bucks", "timberwolves", "pelicans", "knicks", "thunder", "magic", "76ers", "sixers",
        "suns", "trail blazers", "blazers", "kings", "spurs", "raptors", "jazz", "wizards",
    ],
    exclude_keywords: &[
        "wnba", "ncaab", "ncaa", "college", "g league", "gleague", "fiba", "euroleague", "nhl",
        "hockey", "ice hockey",
    ],
};

pub static MLB: LeagueConfig = LeagueConfig {
    key: "mlb",
    sport: "baseball",
    categories: &["baseball", "mlb"],
    brand_keywords: &["mlb", "mlb network", "world series", "spring training", "all-star"],
    team_keywords: &[
        "orioles", "red sox", "yankees", "rays", "blue jays", "white sox", "guardians", "tigers",
        "royals", "twins", "astros", "angels", "athletics", "mariners", "rangers", "braves",
        "marlins", "mets", "phillies", "nationals", "cubs", "reds", "brewers", "pirates",
        "cardinals", "diamondbacks", "rockies", "dodgers", "padres", "giants",
    ],
    exclude_keywords: &[
        "college", "ncaa", "minor league", "triple-a", "double-a", "kbo", "npb",
    ],
};

pub static NHL: LeagueConfig = LeagueConfig {
    key: "nhl",
    sport: "hockey",
    categories: &["hockey", "ice-hockey", "nhl"],
    brand_keywords: &["nhl", "nhl network", "hockey night", "stanley cup", "winter classic"],
    team_keywords: &[
        "ducks", "bruins", "sabres", "flames", "hurricanes", "blackhawks", "avalanche",
        "blue jackets", "stars", "red wings", "oilers", "panthers", "kings", "wild", "canadiens",
        "predators", "devils", "islanders", "rangers", "senators", "flyers", "penguins", "sharks",
        "kraken", "blues", "lightning", "maple leafs", "leafs", "canucks", "golden knights",
        "capitals", "jets", "utah", "coyotes",
    ],
    exclude_keywords: &[
        "ahl", "khl", "ncaa", "college", "whl", "ohl", "qmjhl", "iihf", "world juniors",
        "olympics",
    ],
};

/// Decide whether `record` belongs to the league described by `config`.
#[must_use]
pub fn classify(record: &RawMatch, config: &LeagueConfig) -> bool {
    let category = record.category_lower();
    let text = record.search_text();

    if !category.is_empty() && !config.categories.iter().any(|c| category.contains(c)) {
        return false;
    }
    if GLOBAL_EXCLUDED_KEYWORDS.iter().any(|k| text.contains(k)) {
        return false;
    }
    if config.exclude_keywords.iter().any(|k| text.contains(k)) {
        return false;
    }
    if config.brand_keywords.iter().any(|k| text.contains(k)) {
        return true;
    }

    let hits = config.nickname_hits(&text);
    if hits >= MIN_NICKNAME_HITS {
        return true;
    }
    !category.is_empty() && category.contains(config.key) && hits >= CATEGORY_NICKNAME_HITS
}

/// First league in priority order that accepts `record`.
#[must_use]
pub fn identify(record: &RawMatch) -> Option<League> {
    League::PRIORITY
        .into_iter()
        .find(|league| classify(record, league.config()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, title: &str) -> RawMatch {
        RawMatch {
            id: Some("x".into()),
            title: Some(title.into()),
            category: Some(category.into()),
            ..RawMatch::default()
        }
    }

    #[test]
    fn brand_keyword_accepts() {
        assert!(classify(
            &record("american-football", "Bills vs Dolphins RedZone"),
            &NFL
        ));
    }

    #[test]
    fn exclude_keyword_rejects_before_nicknames() {
        assert!(!classify(
            &record("basketball", "NCAA Tournament: Lakers vs Celtics"),
            &NBA
        ));
    }

    #[test]
    fn category_mismatch_rejects() {
        assert!(!classify(&record("basketball", "Bills vs Dolphins"), &NFL));
    }

    #[test]
    fn two_nicknames_accept_without_brand() {
        assert!(classify(&record("", "Lakers vs Celtics"), &NBA));
    }

    #[test]
    fn one_nickname_needs_league_in_category() {
        assert!(!classify(&record("basketball", "Lakers Tonight"), &NBA));
        assert!(classify(&record("nba-basketball", "Lakers Tonight"), &NBA));
    }

    #[test]
    fn nothing_matches_rejects() {
        assert!(!classify(&record("basketball", "Madrid vs Barcelona"), &NBA));
    }

    #[test]
    fn identify_uses_priority_order() {
        // "Giants vs Cardinals" hits both NFL and MLB nicknames.
        let m = record("", "Giants vs Cardinals");
        assert_eq!(identify(&m), Some(League::Nfl));

        let m = record("baseball", "Giants vs Cardinals");
        assert_eq!(identify(&m), Some(League::Mlb));

        let m = record("ice-hockey", "Rangers vs Devils");
        assert_eq!(identify(&m), Some(League::Nhl));

        assert_eq!(identify(&record("cricket", "India vs Australia")), None);
    }

    #[test]
    fn identify_is_deterministic() {
        let m = record("basketball", "Heat vs Knicks");
        let first = identify(&m);
        for _ in 0..10 {
            assert_eq!(identify(&m), first);
        }
    }

    #[test]
    fn league_parsing() {
        assert_eq!("NBA".parse::<League>().unwrap(), League::Nba);
        assert!(matches!(
            "wnba".parse::<League>(),
            Err(MatchdayError::UnsupportedLeague(_))
        ));
        assert_eq!(LeagueScope::parse(None).unwrap(), LeagueScope::All);
        assert_eq!(LeagueScope::parse(Some("ALL")).unwrap(), LeagueScope::All);
        assert_eq!(
            LeagueScope::parse(Some("nhl")).unwrap(),
            LeagueScope::One(League::Nhl)
        );
        assert_eq!(League::Mlb.sport(), "baseball");
        assert_eq!(League::Nhl.priority(), 3);
    }
}
