//! HTTP surface: a hyper 1 `http1` server over a tokio listener.
//!
//! Every response is JSON with `Cache-Control: no-store` and permissive CORS
//! headers. Routing is a plain match on method and path.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL, CONTENT_TYPE, HeaderValue,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::app::{App, GamesRequest, StatsRequest};
use crate::core::assembly::GameFilter;
use crate::core::league::{League, LeagueScope};
use crate::core::pipeline::{
    LeadersQuery, PlayerQuery, PositionFilter, parse_leader_limit, parse_page, parse_per_page,
    DEFAULT_SEASON_TYPE,
};
use crate::core::refs::SeasonSelector;
use crate::core::schema::{StatMode, TableView};
use crate::core::site::Matchup;
use crate::error::{MatchdayError, Result};
use crate::render::ErrorBody;
use crate::util::{is_truthy, percent_decode};

pub type Body = Full<Bytes>;

/// Decoded query string. Repeated keys keep their first value.
#[derive(Debug, Default, Clone)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Self::default();
        };
        let pairs = reqwest::Url::parse(&format!("http://localhost/?{query}"))
            .map(|url| url.query_pairs().into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for the first key present, trimmed and non-empty.
    #[must_use]
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.get(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }

    fn league(&self, default: &str) -> Result<League> {
        self.first_of(&["league"]).unwrap_or(default).parse()
    }

    fn scope(&self, default: &str) -> Result<LeagueScope> {
        LeagueScope::parse(Some(self.first_of(&["league"]).unwrap_or(default)))
    }
}

fn with_headers(mut response: Response<Body>, status: StatusCode) -> Response<Body> {
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET,OPTIONS"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    response
}

/// JSON response with the standard headers.
pub fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response<Body> {
    let (status, body) = match serde_json::to_vec(payload) {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"internal_error"}"#.to_vec(),
            )
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(body)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_headers(response, status)
}

fn error_response(err: &MatchdayError) -> Response<Body> {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
    if status.is_server_error() {
        tracing::error!(code = err.error_code(), error = %err, "Request failed");
    } else {
        tracing::debug!(code = err.error_code(), error = %err, "Request rejected");
    }
    json_response(status, &ErrorBody::from(err))
}

fn respond<T: Serialize>(result: Result<T>) -> Response<Body> {
    match result {
        Ok(payload) => json_response(StatusCode::OK, &payload),
        Err(e) => error_response(&e),
    }
}

fn games_request(query: &Query) -> Result<GamesRequest> {
    Ok(GamesRequest {
        scope: query.scope("all")?,
        filter: GameFilter::parse(query.get("filter")),
        include_health: query.flag("includeHealth"),
        force: query.flag("force"),
    })
}

fn stats_request(query: &Query) -> Result<StatsRequest> {
    let text = |key: &str| query.first_of(&[key]).map(ToString::to_string);
    Ok(StatsRequest {
        league: query.league("nfl")?,
        matchup: Matchup {
            away: text("away"),
            home: text("home"),
            abbr_away: text("abbrAway"),
            abbr_home: text("abbrHome"),
        },
        date: text("date"),
        force: query.flag("force"),
    })
}

fn player_query(query: &Query) -> Result<PlayerQuery> {
    Ok(PlayerQuery {
        season: SeasonSelector::parse(query.get("season")),
        view: TableView::parse(query.get("view")),
        mode: StatMode::parse(query.get("mode")),
        position: PositionFilter::parse(query.get("position")),
        page: parse_page(query.get("page")),
        per_page: parse_per_page(query.first_of(&["perPage", "per_page"])),
        ..PlayerQuery::new(query.league("nfl")?)
    })
}

fn leaders_query(query: &Query) -> Result<LeadersQuery> {
    Ok(LeadersQuery {
        season: SeasonSelector::parse(query.get("season")),
        season_type: query
            .first_of(&["type", "seasontype"])
            .unwrap_or(DEFAULT_SEASON_TYPE)
            .to_string(),
        limit: parse_leader_limit(query.get("limit")),
        mode: StatMode::parse(query.get("mode")),
        ..LeadersQuery::new(query.league("nfl")?)
    })
}

/// Dispatch one request.
pub async fn route(app: &App, method: &Method, uri: &Uri) -> Response<Body> {
    if method == Method::OPTIONS {
        return with_headers(Response::new(Full::new(Bytes::new())), StatusCode::NO_CONTENT);
    }
    if method != Method::GET {
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorBody {
                error: "method_not_allowed".to_string(),
                message: None,
            },
        );
    }

    let query = Query::parse(uri.query());
    let force = query.flag("force");
    match uri.path() {
        "/health" => json_response(StatusCode::OK, &app.service_health()),
        "/games" => match games_request(&query) {
            Ok(request) => respond(app.games(&request).await),
            Err(e) => error_response(&e),
        },
        "/teams" => match query.scope("nfl") {
            Ok(scope) => respond(app.teams(scope, force).await),
            Err(e) => error_response(&e),
        },
        "/standings" => match query.scope("nfl") {
            Ok(scope) => respond(app.standings(scope, query.get("season"), force).await),
            Err(e) => error_response(&e),
        },
        "/stats" => match stats_request(&query) {
            Ok(request) => respond(app.stats(&request).await),
            Err(e) => error_response(&e),
        },
        "/players" => match player_query(&query) {
            Ok(players) => respond(app.players(&players, force).await),
            Err(e) => error_response(&e),
        },
        "/leaders" => match leaders_query(&query) {
            Ok(leaders) => respond(app.leaders(&leaders, force).await),
            Err(e) => error_response(&e),
        },
        "/streams/check" => {
            let stream = query.get("stream").and_then(|s| s.trim().parse().ok());
            let check = app
                .check_stream(
                    query.get("source").unwrap_or(crate::core::assembly::DEFAULT_SOURCE),
                    query.get("slug").unwrap_or_default(),
                    stream,
                )
                .await;
            json_response(StatusCode::OK, &check)
        }
        path => match path.strip_prefix("/games/") {
            Some(slug) if !slug.is_empty() => match games_request(&query) {
                Ok(request) => respond(app.game(&percent_decode(slug), &request).await),
                Err(e) => error_response(&e),
            },
            _ => json_response(StatusCode::NOT_FOUND, &ErrorBody::not_found()),
        },
    }
}

async fn handle(app: Arc<App>, request: Request<Incoming>) -> Response<Body> {
    let start = Instant::now();
    let response = route(&app, request.method(), request.uri()).await;
    tracing::info!(
        method = %request.method(),
        path = request.uri().path(),
        status = response.status().as_u16(),
        latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Handled request"
    );
    response
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
///
/// The address cannot be bound.
pub async fn serve(app: Arc<App>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_until(app, listener, async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Accept connections on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// The listener's local address cannot be read.
pub async fn serve_until<F>(app: Arc<App>, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Listening");
    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Shutting down");
                return Ok(());
            }
            accepted = listener.accept() => accepted,
        };
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                continue;
            }
        };

        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let service = service_fn(move |request| {
                let app = Arc::clone(&app);
                async move { Ok::<_, Infallible>(handle(app, request).await) }
            });
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(%peer, error = %e, "Connection closed with error");
            }
        });
    }
}
