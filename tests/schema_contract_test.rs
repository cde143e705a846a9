//! JSON Schema contract tests.
//!
//! Responses served by the routes must match `schemas/matchday-v1.schema.json`,
//! the contract browser clients depend on.

mod common;

use http_body_util::BodyExt;
use hyper::{Method, Uri};
use jsonschema::Validator;
use serde_json::{Value, json};

use matchday::App;
use matchday::error::MatchdayError;
use matchday::render::ErrorBody;
use matchday::server::route;
use matchday::test_utils::TestDir;

use common::fixtures::{MockUpstream, live_nfl, upcoming_nba};

fn schema() -> Value {
    let text = include_str!("../schemas/matchday-v1.schema.json");
    serde_json::from_str(text).expect("Schema should be valid JSON")
}

/// Validator for one definition of the schema.
fn validator(definition: &str) -> Validator {
    let root = schema();
    let wrapped = json!({
        "$schema": root["$schema"],
        "$defs": root["$defs"],
        "$ref": format!("#/$defs/{definition}")
    });
    jsonschema::validator_for(&wrapped).expect("Schema should compile")
}

fn assert_valid(definition: &str, instance: &Value) {
    let validator = validator(definition);
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();
    assert!(
        errors.is_empty(),
        "{definition} violations: {errors:#?}\n\n{}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

const TATUM: &[(&str, &str, &str, f64)] = &[("101", "Jayson Tatum", "SF", 27.1)];

async fn get(app: &App, uri: &str) -> (u16, Value) {
    let uri: Uri = uri.parse().unwrap();
    let response = route(app, &Method::GET, &uri).await;
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn app_with_games() -> (MockUpstream, TestDir, App) {
    let upstream = MockUpstream::start().await;
    upstream
        .mount_directory(&[live_nfl()], &[live_nfl(), upcoming_nba()])
        .await;
    upstream.mount_embed("admin", "chiefs-bills-admin", 200).await;
    let dir = TestDir::new();
    let app = upstream.app(dir.path());
    (upstream, dir, app)
}

// =============================================================================
// Schema sanity
// =============================================================================

#[test]
fn schema_compiles() {
    let root = schema();
    jsonschema::validator_for(&root).expect("Schema should compile");
    for name in ["gamesEnvelope", "gameEnvelope", "serviceHealth", "errorBody", "playerTable"] {
        assert!(root["$defs"][name].is_object(), "missing definition {name}");
    }
}

#[test]
fn schema_rejects_unknown_game_fields() {
    let invalid = json!({
        "games": [{"id": "api_1", "extra": true}],
        "meta": {
            "count": 1,
            "filter": "all",
            "league": "all",
            "cacheAgeSec": 0,
            "stale": false,
            "upstreamBase": null
        }
    });
    assert!(!validator("gamesEnvelope").is_valid(&invalid));
}

// =============================================================================
// Route contracts
// =============================================================================

#[tokio::test]
async fn games_envelope_matches_contract() {
    let (_upstream, _dir, app) = app_with_games().await;
    let (status, body) = get(&app, "/games").await;
    assert_eq!(status, 200);
    assert_eq!(body["meta"]["count"], 2);
    assert_valid("gamesEnvelope", &body);
}

#[tokio::test]
async fn games_with_health_match_contract() {
    let (_upstream, _dir, app) = app_with_games().await;
    let (_, body) = get(&app, "/games?includeHealth=1").await;
    assert!(body["games"][0]["sources"][0]["health"].is_object());
    assert_valid("gamesEnvelope", &body);
}

#[tokio::test]
async fn game_envelope_matches_contract() {
    let (_upstream, _dir, app) = app_with_games().await;
    let (status, body) = get(&app, "/games/lakers-celtics").await;
    assert_eq!(status, 200);
    assert_valid("gameEnvelope", &body);
}

#[tokio::test]
async fn health_matches_contract_before_and_after_fetch() {
    let (_upstream, _dir, app) = app_with_games().await;
    let (_, before) = get(&app, "/health").await;
    assert_valid("serviceHealth", &before);
    get(&app, "/games").await;
    let (_, after) = get(&app, "/health").await;
    assert_valid("serviceHealth", &after);
}

#[tokio::test]
async fn error_bodies_match_contract() {
    let (_upstream, _dir, app) = app_with_games().await;
    for uri in ["/games?league=xfl", "/games/missing", "/nowhere"] {
        let (status, body) = get(&app, uri).await;
        assert!(status >= 400, "{uri} returned {status}");
        assert_valid("errorBody", &body);
    }

    let errors = [
        MatchdayError::SeasonNotFound {
            league: "nba".into(),
            season: "1999".into(),
        },
        MatchdayError::Config("bad".into()),
        MatchdayError::Network("reset".into()),
    ];
    for err in &errors {
        let body = serde_json::to_value(ErrorBody::from(err)).unwrap();
        assert_valid("errorBody", &body);
    }
}

#[tokio::test]
async fn player_table_matches_contract() {
    let upstream = MockUpstream::start().await;
    upstream
        .mount_nba_season("2025", &[("2", TATUM)], &[])
        .await;
    let dir = TestDir::new();
    let app = upstream.app(dir.path());

    let (status, body) = get(&app, "/players?league=nba&perPage=25").await;
    assert_eq!(status, 200);
    assert_eq!(body["perPage"], 25);
    assert_valid("playerTable", &body);
}
