//! `nearfield session` - drive the proximity engine from stdin.
//!
//! Each input line is one event:
//!
//! ```text
//! pos <lat> <lon>                      new device reading
//! lost                                 drop the current reading
//! view <lat> <lon> <lat_d> <lon_d>     settle the map on a region
//! filter <types|all>                   change the type filter
//! stats                                print request statistics
//! quit                                 stop
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. After every event
//! the session waits for the engine to go quiet and prints the snapshot.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use nearfield::artifact::TypeFilter;
use nearfield::engine::{EngineSnapshot, ProximityEngine};
use nearfield::geo::GeoPoint;
use nearfield::position::{PositionSource, StaticLocationService, UserPosition};
use nearfield::repository::{ArtifactClient, NearbyArtifactRepository};
use nearfield::scheduler::SchedulerStats;
use nearfield::viewport::{MapRegion, ViewportTracker};

use super::common::{format_row, header, point};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Accuracy reported for `pos` readings typed into the session.
const SESSION_READING_ACCURACY_M: f32 = 5.0;

/// No snapshot change for this long means the engine is idle.
const QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Upper bound on waiting for an outstanding fetch.
const IDLE_DEADLINE: Duration = Duration::from_secs(15);

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Use the built-in Seattle catalog instead of the API
    #[arg(long)]
    pub demo: bool,

    /// Starting latitude reported by the location service
    #[arg(long, requires = "user_lon", allow_hyphen_values = true)]
    pub user_lat: Option<f64>,

    /// Starting longitude reported by the location service
    #[arg(long, requires = "user_lat", allow_hyphen_values = true)]
    pub user_lon: Option<f64>,

    /// Use the configured fallback point when no location is available
    #[arg(long)]
    pub fallback: bool,
}

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Position(GeoPoint),
    Lost,
    View(MapRegion),
    Filter(TypeFilter),
    Stats,
    Quit,
}

impl SessionEvent {
    /// Parse one line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let event = match (command.as_str(), args.as_slice()) {
            ("pos", [lat, lon]) => Self::Position(parse_geo(lat, lon)?),
            ("lost", []) => Self::Lost,
            ("view", [lat, lon, lat_delta, lon_delta]) => Self::View(MapRegion::new(
                parse_geo(lat, lon)?,
                parse_number(lat_delta)?,
                parse_number(lon_delta)?,
            )),
            ("filter", [types]) => {
                Self::Filter(TypeFilter::parse(types).map_err(|e| e.to_string())?)
            }
            ("stats", []) => Self::Stats,
            ("quit" | "exit", []) => Self::Quit,
            ("pos" | "lost" | "view" | "filter" | "stats" | "quit" | "exit", _) => {
                return Err(format!("wrong number of arguments for '{}'", command));
            }
            _ => return Err(format!("unknown command '{}'", command)),
        };
        Ok(Some(event))
    }
}

fn parse_number(word: &str) -> Result<f64, String> {
    word.parse()
        .map_err(|_| format!("'{}' is not a number", word))
}

fn parse_geo(lat: &str, lon: &str) -> Result<GeoPoint, String> {
    GeoPoint::new(parse_number(lat)?, parse_number(lon)?).map_err(|e| e.to_string())
}

pub async fn run(runner: &CliRunner, args: SessionArgs) -> Result<(), CliError> {
    runner.log_startup("session");
    if args.demo {
        session(runner, runner.demo_repository()?, &args).await
    } else {
        session(runner, runner.http_repository()?, &args).await
    }
}

async fn session<C: ArtifactClient>(
    runner: &CliRunner,
    repository: NearbyArtifactRepository<C>,
    args: &SessionArgs,
) -> Result<(), CliError> {
    let config = runner.config();

    let service = match (args.user_lat, args.user_lon) {
        (Some(lat), Some(lon)) => {
            StaticLocationService::granted_at(point(lat, lon)?, SESSION_READING_ACCURACY_M)
        }
        _ => StaticLocationService::new(),
    };
    let source = Arc::new(PositionSource::new(service));
    let tracker = Arc::new(ViewportTracker::new());

    let (engine, handle) = ProximityEngine::new(
        repository.clone(),
        Arc::clone(&source),
        Arc::clone(&tracker),
        config.engine_config(),
    );
    let scheduler_stats = engine.scheduler_stats();

    let token = CancellationToken::new();
    let engine_task = tokio::spawn(engine.run(token.clone()));

    let mut updates = handle.subscribe();

    // Initial fix, then center the map on it.
    let start = acquire_position(&source, runner, args.fallback).await;
    if let Some(position) = start {
        tracker.settle(&MapRegion::around(position.point));
    }
    print_snapshot(&wait_for_idle(&mut updates, IDLE_DEADLINE).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match SessionEvent::parse(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("? {}", message);
                continue;
            }
        };

        match event {
            SessionEvent::Position(point) => {
                source.apply_reading(UserPosition::from_device(point, SESSION_READING_ACCURACY_M));
            }
            SessionEvent::Lost => source.clear(),
            SessionEvent::View(region) => {
                tracker.settle(&region);
            }
            SessionEvent::Filter(filter) => handle.set_filter(filter).await?,
            SessionEvent::Stats => {
                print_stats(&scheduler_stats, &repository);
                continue;
            }
            SessionEvent::Quit => break,
        }

        print_snapshot(&wait_for_idle(&mut updates, IDLE_DEADLINE).await);
    }

    // Engine may already be gone if every handle dropped
    let _ = handle.shutdown().await;
    token.cancel();
    if let Err(e) = engine_task.await {
        warn!(error = %e, "Engine task ended abnormally");
    }

    repository.log_stats();
    Ok(())
}

/// Ask for permission and one reading, within the configured timeout.
async fn acquire_position(
    source: &PositionSource<StaticLocationService>,
    runner: &CliRunner,
    use_fallback: bool,
) -> Option<UserPosition> {
    let config = runner.config();

    if let Err(e) = source.request_permission().await {
        warn!(error = %e, "Location permission request failed");
    }

    let reading =
        tokio::time::timeout(config.position_timeout(), source.refresh(config.position.accuracy))
            .await;
    match reading {
        Ok(Ok(position)) => return Some(position),
        Ok(Err(e)) => warn!(error = %e, "No location fix"),
        Err(_) => warn!(
            timeout_secs = config.position.timeout_secs,
            "Timed out waiting for a location fix"
        ),
    }

    if use_fallback {
        info!(point = %config.position.fallback, "Using fallback position");
        source.set_manual_position(config.position.fallback);
        return source.current_position();
    }
    None
}

/// Wait until the snapshot stops changing and no fetch is outstanding.
async fn wait_for_idle(
    updates: &mut watch::Receiver<EngineSnapshot>,
    deadline: Duration,
) -> EngineSnapshot {
    let give_up = Instant::now() + deadline;
    loop {
        match tokio::time::timeout(QUIET_PERIOD, updates.changed()).await {
            Ok(Ok(())) => {}
            // Engine stopped
            Ok(Err(_)) => break,
            Err(_) => {
                if !updates.borrow().loading {
                    break;
                }
            }
        }
        if Instant::now() >= give_up {
            warn!("Engine still busy, printing current snapshot");
            break;
        }
    }
    updates.borrow_and_update().clone()
}

fn print_snapshot(snapshot: &EngineSnapshot) {
    match &snapshot.position {
        Some(position) => println!("position: {} ({})", position.point, position.origin),
        None => println!("position: none"),
    }
    match &snapshot.query {
        Some(query) => println!("query:    {}", query),
        None => println!("query:    none"),
    }
    if let Some(error) = &snapshot.last_error {
        println!("error:    {}", error);
    }
    if snapshot.stale {
        println!("(showing last good results)");
    }

    println!("{}", header());
    for entry in snapshot.artifacts.iter() {
        println!("{}", format_row(entry));
    }
    println!();
}

fn print_stats<C: ArtifactClient>(
    scheduler: &SchedulerStats,
    repository: &NearbyArtifactRepository<C>,
) {
    let s = scheduler.snapshot();
    let r = repository.stats();
    println!(
        "settles={} fetches={} recency_hits={} stale_discarded={}",
        s.settles, s.fetches, s.recency_hits, s.stale_discarded
    );
    println!(
        "requests={} network={} coalesced={} reused={} ({:.0}% shared)",
        r.total_requests,
        r.network_requests,
        r.coalesced_requests,
        r.reused_requests,
        r.coalescing_ratio() * 100.0
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearfield::artifact::ArtifactType;

    #[test]
    fn test_parse_position() {
        let event = SessionEvent::parse("pos 47.6205 -122.3493").unwrap();
        assert_eq!(
            event,
            Some(SessionEvent::Position(GeoPoint::new(47.6205, -122.3493).unwrap()))
        );
    }

    #[test]
    fn test_parse_view() {
        let event = SessionEvent::parse("view 47.62 -122.35 0.01 0.02").unwrap();
        match event {
            Some(SessionEvent::View(region)) => {
                assert_eq!(region.center, GeoPoint::new(47.62, -122.35).unwrap());
                assert_eq!(region.latitude_delta, 0.01);
                assert_eq!(region.longitude_delta, 0.02);
            }
            other => panic!("Expected view, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_filter() {
        let event = SessionEvent::parse("filter art,menu").unwrap();
        assert_eq!(
            event,
            Some(SessionEvent::Filter(TypeFilter::only([
                ArtifactType::Art,
                ArtifactType::Menu
            ])))
        );
        assert_eq!(
            SessionEvent::parse("filter all").unwrap(),
            Some(SessionEvent::Filter(TypeFilter::all()))
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(SessionEvent::parse("lost").unwrap(), Some(SessionEvent::Lost));
        assert_eq!(SessionEvent::parse("STATS").unwrap(), Some(SessionEvent::Stats));
        assert_eq!(SessionEvent::parse("quit").unwrap(), Some(SessionEvent::Quit));
        assert_eq!(SessionEvent::parse("exit").unwrap(), Some(SessionEvent::Quit));
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        assert_eq!(SessionEvent::parse("").unwrap(), None);
        assert_eq!(SessionEvent::parse("   ").unwrap(), None);
        assert_eq!(SessionEvent::parse("# walk to the needle").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(SessionEvent::parse("teleport 1 2").is_err());
        assert!(SessionEvent::parse("pos 47.6").is_err());
        assert!(SessionEvent::parse("pos north west").is_err());
        assert!(SessionEvent::parse("pos 95 0").is_err());
        assert!(SessionEvent::parse("filter dragons").is_err());
        assert!(SessionEvent::parse("lost now").is_err());
    }
}
