//! Service wiring: one [`App`] owns every cache and upstream client and
//! answers the operations exposed over HTTP and the CLI.

use std::path::Path;

use crate::core::assembly::{
    AssemblyOptions, GameFilter, apply_health, build_games, filter_games, find_game_by_slug,
    sort_games,
};
use crate::core::directory::MatchFeed;
use crate::core::freshness::Cached;
use crate::core::health::{Budget, DEFAULT_STREAM, Prober, SourceHealth};
use crate::core::http::Fetcher;
use crate::core::league::{League, LeagueScope};
use crate::core::models::Game;
use crate::core::pipeline::{
    LeadersQuery, LeadersTable, PipelineOptions, PlayerPipeline, PlayerQuery, PlayerTable,
};
use crate::core::refs::CoreApi;
use crate::core::site::{GameStats, Matchup, SiteApi, SiteOptions};
use crate::error::{MatchdayError, Result};
use crate::render::{
    Freshness, GameEnvelope, GameMeta, GamesEnvelope, GamesMeta, LeagueStandings, ServiceHealth,
    StandingsEnvelope, StandingsMeta, StandingsResponse, StreamCheck, TeamsEnvelope, TeamsMeta,
};
use crate::storage::config::Config;
use crate::util::{now_ms, sanitize_slug};

/// `/games` and `/games/{slug}` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamesRequest {
    pub scope: LeagueScope,
    pub filter: GameFilter,
    pub include_health: bool,
    pub force: bool,
}

impl Default for GamesRequest {
    fn default() -> Self {
        Self {
            scope: LeagueScope::All,
            filter: GameFilter::All,
            include_health: false,
            force: false,
        }
    }
}

/// `/stats` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRequest {
    pub league: League,
    pub matchup: Matchup,
    pub date: Option<String>,
    pub force: bool,
}

pub struct App {
    config: Config,
    feed: MatchFeed,
    health: SourceHealth,
    site: SiteApi,
    players: PlayerPipeline,
    assembly: AssemblyOptions,
}

impl App {
    /// Build from config, persisting snapshots under its data directory.
    ///
    /// # Errors
    ///
    /// The HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let dir = config.snapshot_dir();
        Self::with_snapshot_dir(config, Some(&dir))
    }

    /// Build with snapshots under `dir`, or purely in memory with `None`.
    ///
    /// # Errors
    ///
    /// The HTTP client cannot be built.
    pub fn with_snapshot_dir(config: Config, dir: Option<&Path>) -> Result<Self> {
        let fetcher = Fetcher::new(config.retry_policy(), &config.upstream.user_agent)?;
        let cache = &config.cache;

        let feed = match dir {
            Some(dir) => MatchFeed::persisted(
                fetcher.clone(),
                config.upstream.api_bases.clone(),
                cache.games_policy(),
                dir,
            ),
            None => MatchFeed::new(
                fetcher.clone(),
                config.upstream.api_bases.clone(),
                cache.games_policy(),
            ),
        };
        let health = SourceHealth::new(
            Prober::new(fetcher.client().clone(), config.health.embed_base.clone()),
            config.health.ttl_secs,
            config.health.source_preference.clone(),
            config.health.probe_concurrency,
        );
        let site = SiteApi::new(
            fetcher.clone(),
            config.players.site_api_base.clone(),
            SiteOptions {
                teams_ttl: cache.teams_ttl_secs,
                teams_stale: cache.teams_stale_secs,
                standings_ttl: cache.standings_ttl_secs,
                standings_stale: cache.standings_stale_secs,
                stats_ttl: cache.stats_ttl_secs,
            },
            dir,
        );
        let players = PlayerPipeline::new(
            CoreApi::new(fetcher, config.players.core_api_base.clone()),
            PipelineOptions {
                workers: config.players.workers,
                index_ttl: config.players.index_ttl_secs,
                profile_ttl: config.players.profile_ttl_secs,
                stats_ttl: config.players.stats_ttl_secs,
                page_ttl: config.players.page_ttl_secs,
                leaders_ttl: cache.leaders_ttl_secs,
            },
        );
        let assembly = AssemblyOptions {
            live_max_age_secs: config.games.live_max_age_secs,
            ended_grace_secs: config.games.ended_grace_secs,
            image_base: config.games.image_base.clone(),
            preference: config.health.source_preference.clone(),
        };

        if let Some(dir) = dir {
            tracing::debug!(dir = %dir.display(), "Snapshot directory");
        }
        Ok(Self {
            config,
            feed,
            health,
            site,
            players,
            assembly,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn service_health(&self) -> ServiceHealth {
        ServiceHealth::from(self.feed.status())
    }

    async fn assembled(
        &self,
        request: &GamesRequest,
    ) -> Result<(Vec<Game>, Freshness, Option<String>)> {
        let cached = self.feed.directory(request.force).await?;
        let mut games = build_games(&cached.value, request.scope, now_ms(), &self.assembly);
        if request.include_health {
            let budget = Budget::new(self.config.health.max_checks);
            games = apply_health(games, &self.health, &budget).await;
            tracing::debug!(remaining = budget.remaining(), "Health budget after annotation");
        }
        Ok((games, Freshness::of(&cached), cached.source.clone()))
    }

    /// Assembled, filtered and sorted games.
    ///
    /// # Errors
    ///
    /// Upstream unavailable with no usable cached directory.
    pub async fn games(&self, request: &GamesRequest) -> Result<GamesEnvelope> {
        let (games, freshness, upstream_base) = self.assembled(request).await?;
        let games = sort_games(filter_games(games, request.filter), request.scope);
        Ok(GamesEnvelope {
            meta: GamesMeta {
                count: games.len(),
                filter: request.filter.as_str(),
                league: request.scope.key(),
                freshness,
                upstream_base,
            },
            games,
        })
    }

    /// One game by slug, match id or source id.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a slug with no usable characters, `NotFound` when
    /// nothing matches, or the directory error.
    pub async fn game(&self, slug: &str, request: &GamesRequest) -> Result<GameEnvelope> {
        if sanitize_slug(slug).is_empty() {
            return Err(MatchdayError::InvalidInput {
                field: "slug".to_string(),
                message: format!("'{slug}' has no letters, digits, '-' or '_'"),
            });
        }
        let (games, freshness, upstream_base) = self.assembled(request).await?;
        let game = find_game_by_slug(&games, slug).ok_or_else(|| MatchdayError::NotFound {
            resource: format!("game {slug}"),
        })?;
        Ok(GameEnvelope {
            game,
            meta: GameMeta {
                freshness,
                upstream_base,
                league: request.scope.key(),
            },
        })
    }

    /// Team directory; the all-leagues view skips failing leagues.
    ///
    /// # Errors
    ///
    /// Upstream unavailable for a single league with nothing cached.
    pub async fn teams(&self, scope: LeagueScope, force: bool) -> Result<TeamsEnvelope> {
        match scope {
            LeagueScope::One(league) => {
                let cached = self.site.teams(league, force).await?;
                let teams = cached.value.teams.clone();
                Ok(TeamsEnvelope {
                    meta: TeamsMeta {
                        count: teams.len(),
                        league: league.key().to_string(),
                        freshness: Freshness::of(&cached),
                        upstream_base: cached.source.clone(),
                    },
                    teams,
                })
            }
            LeagueScope::All => {
                let rollup = self.site.all_teams(force).await;
                Ok(TeamsEnvelope {
                    meta: TeamsMeta {
                        count: rollup.items.len(),
                        league: "all".to_string(),
                        freshness: Freshness {
                            cache_age_sec: rollup.cache_age_sec,
                            stale: rollup.stale,
                        },
                        upstream_base: None,
                    },
                    teams: rollup.items,
                })
            }
        }
    }

    /// Standings for one league or all of them.
    ///
    /// # Errors
    ///
    /// Upstream unavailable for a single league with nothing cached.
    pub async fn standings(
        &self,
        scope: LeagueScope,
        season: Option<&str>,
        force: bool,
    ) -> Result<StandingsResponse> {
        let season_label = season
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or("current")
            .to_string();
        match scope {
            LeagueScope::One(league) => {
                let cached = self.site.standings(league, season, force).await?;
                Ok(StandingsResponse::One(StandingsEnvelope {
                    standings: cached.value.as_ref().clone(),
                    meta: StandingsMeta {
                        count: None,
                        league: league.key().to_string(),
                        season: season_label,
                        freshness: Freshness::of(&cached),
                        upstream_base: cached.source.clone(),
                    },
                }))
            }
            LeagueScope::All => {
                let rollup = self.site.all_standings(season, force).await;
                let standings: Vec<LeagueStandings> = rollup
                    .items
                    .into_iter()
                    .map(|(league, standings)| LeagueStandings { league, standings })
                    .collect();
                Ok(StandingsResponse::All(StandingsEnvelope {
                    meta: StandingsMeta {
                        count: Some(standings.len()),
                        league: "all".to_string(),
                        season: season_label,
                        freshness: Freshness {
                            cache_age_sec: rollup.cache_age_sec,
                            stale: rollup.stale,
                        },
                        upstream_base: None,
                    },
                    standings,
                }))
            }
        }
    }

    /// Summary statistics for one matchup.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when no team is named, `EventNotFound`, or the
    /// upstream error.
    pub async fn stats(&self, request: &StatsRequest) -> Result<GameStats> {
        if request.matchup.is_empty() {
            return Err(MatchdayError::InvalidInput {
                field: "teams".to_string(),
                message: "one of away, home, abbrAway or abbrHome is required".to_string(),
            });
        }
        let cached = self
            .site
            .game_stats(request.league, &request.matchup, request.date.as_deref(), request.force)
            .await?;
        Ok(GameStats::served(&cached))
    }

    /// One page of the player table.
    ///
    /// # Errors
    ///
    /// Season or players not found, or the upstream error.
    pub async fn players(&self, query: &PlayerQuery, force: bool) -> Result<PlayerTable> {
        let cached: Cached<PlayerTable> = self.players.player_table(query, force).await?;
        Ok(PlayerTable::served(&cached))
    }

    /// Season leaders.
    ///
    /// # Errors
    ///
    /// Season not found, or the upstream error.
    pub async fn leaders(&self, query: &LeadersQuery, force: bool) -> Result<LeadersTable> {
        let cached = self.players.leaders(query, force).await?;
        Ok(LeadersTable::served(&cached))
    }

    /// Probe one stream directly, bypassing the budget and the health cache.
    pub async fn check_stream(
        &self,
        source: &str,
        slug: &str,
        stream: Option<u32>,
    ) -> StreamCheck {
        let stream = stream.unwrap_or(DEFAULT_STREAM);
        let health = self.health.prober().check_source(source, slug, stream).await;
        StreamCheck {
            slug: slug.to_string(),
            source: source.to_string(),
            stream,
            health,
        }
    }
}
