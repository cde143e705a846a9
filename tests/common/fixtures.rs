//! Test fixtures and mock upstreams for integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::fixtures::*;
//!
//! let upstream = MockUpstream::start().await;
//! upstream.mount_directory(&[live_nfl()], &[live_nfl(), upcoming_nba()]).await;
//! let app = upstream.app(&dir);
//! ```
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use matchday::App;
use matchday::core::models::RawMatch;
use matchday::storage::config::Config;
use matchday::test_utils::{make_test_config, make_test_match, make_test_match_at};

// =============================================================================
// Fixture Loading
// =============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Load and deserialize a JSON file under `tests/fixtures/`.
///
/// # Panics
///
/// Panics if the file cannot be read or parsed.
pub fn load_fixture<T: DeserializeOwned>(path: &str) -> T {
    let full_path = fixtures_dir().join(path);
    let content = fs::read_to_string(&full_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", full_path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", full_path.display(), e))
}

// =============================================================================
// Match records
// =============================================================================

/// NFL game that kicked off twenty minutes ago.
pub fn live_nfl() -> RawMatch {
    make_test_match_at(
        "chiefs-bills",
        "american-football",
        "Kansas City Chiefs vs Buffalo Bills",
        20,
    )
}

/// NBA game starting in two hours.
pub fn upcoming_nba() -> RawMatch {
    make_test_match_at("lakers-celtics", "basketball", "Los Angeles Lakers vs Boston Celtics", -120)
}

/// NHL game that started ten minutes ago.
pub fn live_nhl() -> RawMatch {
    make_test_match("bruins-rangers", "hockey", "Boston Bruins vs New York Rangers")
}

/// College game no league accepts.
pub fn college_football() -> RawMatch {
    make_test_match("ncaa-game", "american-football", "NCAA: Alabama vs Georgia")
}

// =============================================================================
// Mock upstream
// =============================================================================

/// One mock server standing in for every upstream the app talks to.
///
/// Paths follow [`make_test_config`]: the match directory at the root,
/// embeds under `/embed`, the core stats API under `/core` and the site API
/// under `/site`.
pub struct MockUpstream {
    pub server: MockServer,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self, data_dir: &Path) -> Config {
        make_test_config(&self.base(), data_dir)
    }

    /// App backed by this server with snapshots under `data_dir`.
    pub fn app(&self, data_dir: &Path) -> App {
        App::new(self.config(data_dir)).expect("app")
    }

    pub async fn mount_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_status(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_directory(&self, live: &[RawMatch], all: &[RawMatch]) {
        self.mount_json("/matches/live", serde_json::to_value(live).expect("live"))
            .await;
        self.mount_json("/matches/all", serde_json::to_value(all).expect("all"))
            .await;
    }

    /// Answer HEAD probes for one embed with `status`.
    pub async fn mount_embed(&self, source: &str, id: &str, status: u16) {
        Mock::given(method("HEAD"))
            .and(path(format!("/embed/{source}/{id}/1")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub fn core_league(&self, sport: &str, league: &str) -> String {
        format!("{}/core/{sport}/leagues/{league}", self.base())
    }

    /// Serve the NBA seasons list with `years`, newest first.
    ///
    /// Mount before `mount_nba_season` so this list wins.
    pub async fn mount_nba_seasons(&self, years: &[&str]) {
        let league = self.core_league("basketball", "nba");
        let items: Vec<Value> = years
            .iter()
            .map(|y| json!({"$ref": format!("{league}/seasons/{y}?lang=en")}))
            .collect();
        self.mount_json(
            "/core/basketball/leagues/nba/seasons",
            json!({"items": items, "pageIndex": 1, "pageCount": 1}),
        )
        .await;
    }

    /// Mount an NBA season graph.
    ///
    /// `teams` lists `(team_id, [(athlete_id, name, position, points)])`.
    /// Rosters of teams in `failing` answer 500.
    pub async fn mount_nba_season(
        &self,
        year: &str,
        teams: &[(&str, &[(&str, &str, &str, f64)])],
        failing: &[&str],
    ) {
        let league = self.core_league("basketball", "nba");
        let local = |url: &str| url.trim_start_matches(&self.base()).to_string();

        self.mount_json(
            &local(&format!("{league}/seasons")),
            json!({
                "items": [{"$ref": format!("{league}/seasons/{year}?lang=en")}],
                "pageIndex": 1,
                "pageCount": 1
            }),
        )
        .await;

        let team_items: Vec<Value> = teams
            .iter()
            .map(|(id, _)| json!({"$ref": format!("{league}/seasons/{year}/teams/{id}")}))
            .collect();
        self.mount_json(
            &local(&format!("{league}/seasons/{year}/teams")),
            json!({"items": team_items, "count": teams.len()}),
        )
        .await;

        for (team_id, athletes) in teams {
            self.mount_json(
                &local(&format!("{league}/seasons/{year}/teams/{team_id}")),
                json!({
                    "id": team_id,
                    "abbreviation": format!("T{team_id}"),
                    "displayName": format!("Team {team_id}"),
                    "logos": [{
                        "href": format!("https://img.example/{team_id}.png"),
                        "width": 500,
                        "height": 500
                    }]
                }),
            )
            .await;

            let roster_route = local(&format!("{league}/seasons/{year}/teams/{team_id}/athletes"));
            if failing.contains(team_id) {
                self.mount_status(&roster_route, 500).await;
                continue;
            }
            let items: Vec<Value> = athletes
                .iter()
                .map(|(id, ..)| json!({"$ref": format!("{league}/seasons/{year}/athletes/{id}")}))
                .collect();
            self.mount_json(&roster_route, json!({"items": items})).await;

            for (athlete_id, name, position, points) in *athletes {
                let athlete = format!("{league}/seasons/{year}/athletes/{athlete_id}");
                self.mount_json(
                    &local(&athlete),
                    json!({
                        "id": athlete_id,
                        "displayName": name,
                        "shortName": name,
                        "headshot": {"href": format!("https://img.example/p/{athlete_id}.png")},
                        "position": {"abbreviation": position},
                        "team": {"$ref": format!("{league}/seasons/{year}/teams/{team_id}")},
                        "statistics": {"$ref": format!("{athlete}/statistics")}
                    }),
                )
                .await;
                self.mount_json(
                    &local(&format!("{athlete}/statistics")),
                    json!({"splits": {"categories": [
                        {"name": "general", "stats": [
                            {"name": "gamesPlayed", "displayValue": "10", "value": 10},
                            {"name": "avgRebounds", "displayValue": "5.1", "value": 5.1}
                        ]},
                        {"name": "offensive", "stats": [
                            {
                                "name": "avgPoints",
                                "displayValue": format!("{points:.1}"),
                                "value": points
                            }
                        ]}
                    ]}}),
                )
                .await;
            }
        }
    }

    /// Leaders for the season pointing at already-mounted athletes.
    pub async fn mount_nba_leaders(&self, year: &str, athlete_ids: &[&str]) {
        let league = self.core_league("basketball", "nba");
        let leaders: Vec<Value> = athlete_ids
            .iter()
            .map(|id| {
                let athlete = format!("{league}/seasons/{year}/athletes/{id}");
                json!({
                    "athlete": {"$ref": athlete},
                    "statistics": {"$ref": format!("{athlete}/statistics")}
                })
            })
            .collect();
        self.mount_json(
            &format!("/core/basketball/leagues/nba/seasons/{year}/types/2/leaders"),
            json!({"categories": [
                {"name": "reboundsPerGame", "displayName": "Rebounds Per Game", "leaders": []},
                {
                    "name": "pointsPerGame",
                    "displayName": "Points Per Game",
                    "abbreviation": "PTS",
                    "leaders": leaders
                }
            ]}),
        )
        .await;
    }

    pub async fn mount_site_fixtures(&self) {
        self.mount_json(
            "/site/site/v2/sports/football/nfl/teams",
            load_fixture("site/nfl_teams.json"),
        )
        .await;
        self.mount_json(
            "/site/v2/sports/hockey/nhl/standings",
            load_fixture("site/nhl_standings.json"),
        )
        .await;
        self.mount_json(
            "/site/site/v2/sports/football/nfl/scoreboard",
            load_fixture("site/nfl_scoreboard.json"),
        )
        .await;
        self.mount_json(
            "/site/site/v2/sports/football/nfl/summary",
            load_fixture("site/nfl_summary.json"),
        )
        .await;
    }
}
