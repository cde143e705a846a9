//! Walker for the stats provider's reference-linked resource graph.
//!
//! Collections come back as `{items: [{"$ref": url}], pageIndex, pageCount}`;
//! every resource is reached by following `$ref` URLs. This module holds the
//! URL layout, ref helpers, pagination and the upstream payload shapes the
//! player pipeline reads.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::http::{Fetcher, join_url};
use crate::core::league::League;
use crate::error::Result;

/// Page size requested for team and roster collections.
pub const COLLECTION_LIMIT: u32 = 200;

static SEASON_YEAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/seasons/(\d{4})").ok());
static TEAM_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"/teams/(\d+)").ok());
static ATHLETE_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/athletes/(\d+)").ok());

// =============================================================================
// Ref helpers
// =============================================================================

/// Upgrade `http://` refs to `https://` and trim whitespace.
///
/// Loopback refs stay on plain HTTP.
#[must_use]
pub fn normalize_ref(reference: &str) -> String {
    let trimmed = reference.trim();
    match trimmed.strip_prefix("http://") {
        Some(rest) if !is_loopback(rest) => format!("https://{rest}"),
        _ => trimmed.to_string(),
    }
}

fn is_loopback(authority: &str) -> bool {
    ["127.0.0.1", "localhost", "[::1]"]
        .iter()
        .any(|host| {
            authority
                .strip_prefix(host)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with([':', '/']))
        })
}

/// `$ref` (else `href`) of a link object, normalized.
#[must_use]
pub fn item_ref(item: &Value) -> Option<String> {
    item.get("$ref")
        .or_else(|| item.get("href"))
        .and_then(Value::as_str)
        .filter(|r| !r.trim().is_empty())
        .map(normalize_ref)
}

/// Numeric id following `/{segment}/` in a ref URL.
#[must_use]
pub fn extract_id_from_ref(reference: &str, segment: &str) -> Option<String> {
    let compiled;
    let pattern = match segment {
        "teams" => TEAM_ID.as_ref()?,
        "athletes" => ATHLETE_ID.as_ref()?,
        other => {
            compiled = Regex::new(&format!(r"/{}/(\d+)", regex::escape(other))).ok()?;
            &compiled
        }
    };
    pattern
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Four-digit season year in a season ref.
#[must_use]
pub fn extract_season_year(reference: &str) -> Option<String> {
    SEASON_YEAR
        .as_ref()?
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Append `key=value` using `&` when the URL already has a query.
#[must_use]
pub fn append_query_param(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

/// Deserialize an id sent either as a string or as a number.
pub fn de_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Season selection
// =============================================================================

/// The `season=` query value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeasonSelector {
    /// Walk the provider's season list, newest first.
    Current,
    /// A caller-supplied season such as `2024` or `2023-24`.
    Explicit(String),
}

impl SeasonSelector {
    /// Empty or `current` (any case) selects the current season.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Current,
            Some(v) if v.eq_ignore_ascii_case("current") => Self::Current,
            Some(v) => Self::Explicit(v.to_string()),
        }
    }

    #[must_use]
    pub const fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }

    /// Cache-key and response form.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Current => "current",
            Self::Explicit(value) => value,
        }
    }

    /// Year of an explicit season: the first four digits, if there are four.
    #[must_use]
    pub fn explicit_year(&self) -> Option<String> {
        let Self::Explicit(value) = self else {
            return None;
        };
        let digits = crate::util::text::digits_only(value);
        (digits.len() >= 4).then(|| digits[..4].to_string())
    }
}

// =============================================================================
// Upstream payloads
// =============================================================================

/// A `{"$ref": ...}` link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefLink {
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

impl RefLink {
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.reference
            .as_deref()
            .or(self.href.as_deref())
            .filter(|r| !r.trim().is_empty())
            .map(normalize_ref)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Athlete resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthletePayload {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub headshot: Option<Value>,
    #[serde(default)]
    pub position: Option<PositionPayload>,
    #[serde(default)]
    pub team: Option<RefLink>,
    #[serde(default)]
    pub statistics: Option<RefLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogoPayload {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub width: Option<Value>,
    #[serde(default)]
    pub height: Option<Value>,
}

/// Team resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamPayload {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub logos: Vec<LogoPayload>,
}

fn dimension(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

/// Largest logo by width then height, first wins ties. Logos without an
/// href are ignored.
#[must_use]
pub fn select_logo(logos: &[LogoPayload]) -> Option<String> {
    logos
        .iter()
        .filter(|l| l.href.is_some())
        .rev()
        .max_by_key(|l| (dimension(l.width.as_ref()), dimension(l.height.as_ref())))
        .and_then(|l| l.href.clone())
}

impl TeamPayload {
    #[must_use]
    pub fn best_logo(&self) -> Option<String> {
        select_logo(&self.logos)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderEntryPayload {
    #[serde(default)]
    pub athlete: Option<RefLink>,
    #[serde(default)]
    pub team: Option<RefLink>,
    #[serde(default)]
    pub statistics: Option<RefLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderCategoryPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub short_display_name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub leaders: Vec<LeaderEntryPayload>,
}

/// Season leaders resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadersPayload {
    #[serde(default)]
    pub categories: Vec<LeaderCategoryPayload>,
}

/// One page of a collection. `items: null` reads as empty and page numbers
/// may arrive as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionPage {
    #[serde(default, deserialize_with = "de_items")]
    items: Vec<Value>,
    #[serde(default, deserialize_with = "de_opt_page")]
    page_index: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_page")]
    page_count: Option<u32>,
}

fn de_items<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

fn de_opt_page<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// =============================================================================
// Client
// =============================================================================

/// Reference-graph client rooted at the core API base.
#[derive(Debug, Clone)]
pub struct CoreApi {
    fetcher: Fetcher,
    base: String,
}

impl CoreApi {
    pub fn new(fetcher: Fetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }

    #[must_use]
    pub const fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// `{base}/{sport}/leagues/{league}`.
    #[must_use]
    pub fn league_url(&self, league: League) -> String {
        join_url(
            &self.base,
            &format!("{}/leagues/{}", league.sport(), league.key()),
        )
    }

    #[must_use]
    pub fn seasons_url(&self, league: League) -> String {
        format!("{}/seasons", self.league_url(league))
    }

    #[must_use]
    pub fn teams_url(&self, league: League, year: &str) -> String {
        format!(
            "{}/seasons/{year}/teams?limit={COLLECTION_LIMIT}",
            self.league_url(league)
        )
    }

    #[must_use]
    pub fn roster_url(&self, league: League, year: &str, team_id: &str) -> String {
        format!(
            "{}/seasons/{year}/teams/{team_id}/athletes?limit={COLLECTION_LIMIT}",
            self.league_url(league)
        )
    }

    #[must_use]
    pub fn leaders_url(&self, league: League, year: &str, season_type: &str) -> String {
        format!(
            "{}/seasons/{year}/types/{season_type}/leaders",
            self.league_url(league)
        )
    }

    /// Fetch a typed resource by ref.
    ///
    /// # Errors
    ///
    /// Propagates fetch and decode failures.
    pub async fn resource<T: serde::de::DeserializeOwned>(&self, reference: &str) -> Result<T> {
        self.fetcher.fetch_json(&normalize_ref(reference)).await
    }

    /// Every item of a paginated collection, in page order.
    ///
    /// # Errors
    ///
    /// Fails if any page fails.
    pub async fn fetch_items(&self, url: &str) -> Result<Vec<Value>> {
        let first: CollectionPage = self.fetcher.fetch_json(url).await?;
        let mut items = first.items;
        let index = first.page_index.unwrap_or(1);
        let count = first.page_count.unwrap_or(1);
        for page in index.saturating_add(1)..=count {
            let next: CollectionPage = self
                .fetcher
                .fetch_json(&append_query_param(url, "page", &page.to_string()))
                .await?;
            items.extend(next.items);
        }
        Ok(items)
    }

    /// Refs of every item in a paginated collection.
    ///
    /// # Errors
    ///
    /// Fails if any page fails.
    pub async fn collection_refs(&self, url: &str) -> Result<Vec<String>> {
        Ok(self
            .fetch_items(url)
            .await?
            .iter()
            .filter_map(item_ref)
            .collect())
    }

    /// Candidate season years to try, in order.
    ///
    /// An explicit season yields at most one year. The current season walks
    /// the provider's season list.
    ///
    /// # Errors
    ///
    /// Fails if the season list cannot be fetched.
    pub async fn season_candidates(
        &self,
        league: League,
        season: &SeasonSelector,
    ) -> Result<Vec<String>> {
        if !season.is_current() {
            return Ok(season.explicit_year().into_iter().collect());
        }
        let refs = self.collection_refs(&self.seasons_url(league)).await?;
        let mut years: Vec<String> = Vec::new();
        for year in refs.iter().filter_map(|r| extract_season_year(r)) {
            if !years.contains(&year) {
                years.push(year);
            }
        }
        Ok(years)
    }

    /// Team refs for a season, and the URL they came from.
    ///
    /// # Errors
    ///
    /// Fails if the team collection cannot be fetched.
    pub async fn team_refs(&self, league: League, year: &str) -> Result<(Vec<String>, String)> {
        let url = self.teams_url(league, year);
        let refs = self.collection_refs(&url).await?;
        Ok((refs, url))
    }

    /// Athlete refs on one team's roster.
    ///
    /// # Errors
    ///
    /// Fails if the roster cannot be fetched.
    pub async fn roster_refs(
        &self,
        league: League,
        year: &str,
        team_id: &str,
    ) -> Result<Vec<String>> {
        self.collection_refs(&self.roster_url(league, year, team_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_refs() {
        assert_eq!(
            normalize_ref(" http://core.example/v2/x "),
            "https://core.example/v2/x"
        );
        assert_eq!(normalize_ref("https://a/b"), "https://a/b");
        assert_eq!(
            normalize_ref("http://127.0.0.1:8080/v2/x"),
            "http://127.0.0.1:8080/v2/x"
        );
        assert_eq!(normalize_ref("http://localhost.example/x"), "https://localhost.example/x");
        assert_eq!(
            item_ref(&json!({"$ref": "http://a/b"})).as_deref(),
            Some("https://a/b")
        );
        assert_eq!(item_ref(&json!({"href": "https://a/c"})).as_deref(), Some("https://a/c"));
        assert_eq!(item_ref(&json!({"name": "x"})), None);
    }

    #[test]
    fn extracts_ids() {
        let r = "https://core/v2/sports/football/leagues/nfl/seasons/2024/teams/12/\
                 athletes/3139477?lang=en";
        assert_eq!(extract_id_from_ref(r, "teams").as_deref(), Some("12"));
        assert_eq!(extract_id_from_ref(r, "athletes").as_deref(), Some("3139477"));
        assert_eq!(extract_id_from_ref(r, "seasons").as_deref(), Some("2024"));
        assert_eq!(extract_id_from_ref(r, "events"), None);
        assert_eq!(extract_season_year(r).as_deref(), Some("2024"));
    }

    #[test]
    fn collection_page_tolerates_loose_shapes() {
        let page: CollectionPage =
            serde_json::from_value(json!({"items": null, "pageIndex": "1", "pageCount": "3"}))
                .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page_index, Some(1));
        assert_eq!(page.page_count, Some(3));

        let page: CollectionPage =
            serde_json::from_value(json!({"items": [{"$ref": "a"}], "pageCount": "n/a"})).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page_count, None);
    }

    #[tokio::test]
    async fn fetch_items_walks_string_page_counts() {
        use crate::core::http::RetryPolicy;
        use std::time::Duration;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"items": [{"$ref": "b"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"items": [{"$ref": "a"}], "pageIndex": "1", "pageCount": "2"}),
            ))
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            attempts: 1,
            backoff_base: Duration::from_millis(1),
            timeout: Duration::from_secs(2),
        };
        let api = CoreApi::new(Fetcher::new(policy, "matchday-test").unwrap(), server.uri());
        let refs = api
            .collection_refs(&format!("{}/teams", server.uri()))
            .await
            .unwrap();
        assert_eq!(refs, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn appends_query_params() {
        assert_eq!(append_query_param("https://a/b", "page", "2"), "https://a/b?page=2");
        assert_eq!(
            append_query_param("https://a/b?limit=200", "page", "3"),
            "https://a/b?limit=200&page=3"
        );
    }

    #[test]
    fn season_selector() {
        assert_eq!(SeasonSelector::parse(None), SeasonSelector::Current);
        assert_eq!(SeasonSelector::parse(Some(" CURRENT ")), SeasonSelector::Current);
        let explicit = SeasonSelector::parse(Some("2023-24"));
        assert_eq!(explicit.key(), "2023-24");
        assert_eq!(explicit.explicit_year().as_deref(), Some("2023"));
        assert_eq!(SeasonSelector::parse(Some("23")).explicit_year(), None);
        assert_eq!(SeasonSelector::Current.explicit_year(), None);
    }

    #[test]
    fn best_logo_prefers_largest() {
        let team: TeamPayload = serde_json::from_value(json!({
            "id": 12,
            "logos": [
                {"href": "small", "width": 100, "height": 100},
                {"href": "large", "width": "500", "height": 500},
                {"width": 900}
            ]
        }))
        .unwrap();
        assert_eq!(team.id.as_deref(), Some("12"));
        assert_eq!(team.best_logo().as_deref(), Some("large"));
        assert_eq!(TeamPayload::default().best_logo(), None);
    }
}
