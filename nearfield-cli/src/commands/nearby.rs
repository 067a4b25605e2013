//! `nearfield nearby` - fetch artifacts near a point and show their state.

use clap::Args;
use tracing::info;

use nearfield::position::UserPosition;
use nearfield::repository::{ArtifactClient, NearbyArtifactRepository, NearbyQuery, QueryKey};
use nearfield::visibility::{ArtifactVisibility, VisibilityState};

use super::common::{format_row, header, parse_types, point};
use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct NearbyArgs {
    /// Query center latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Query center longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Search radius in meters (default from config)
    #[arg(long)]
    pub radius: Option<u32>,

    /// Comma-separated artifact types (art, menu, wayfinding, object_scan, info_card)
    #[arg(long)]
    pub types: Option<String>,

    /// User latitude, for distance and visibility
    #[arg(long, requires = "user_lon", allow_hyphen_values = true)]
    pub user_lat: Option<f64>,

    /// User longitude, for distance and visibility
    #[arg(long, requires = "user_lat", allow_hyphen_values = true)]
    pub user_lon: Option<f64>,

    /// Number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Use the built-in Seattle catalog instead of the API
    #[arg(long)]
    pub demo: bool,
}

pub async fn run(runner: &CliRunner, args: NearbyArgs) -> Result<(), CliError> {
    runner.log_startup("nearby");
    if args.demo {
        list(runner, runner.demo_repository()?, &args).await
    } else {
        list(runner, runner.http_repository()?, &args).await
    }
}

async fn list<C: ArtifactClient>(
    runner: &CliRunner,
    repository: NearbyArtifactRepository<C>,
    args: &NearbyArgs,
) -> Result<(), CliError> {
    let config = runner.config();
    let center = point(args.lat, args.lon)?;
    let radius = args.radius.unwrap_or(config.query.default_radius_m);
    let types = parse_types(args.types.as_deref())?;
    let user = match (args.user_lat, args.user_lon) {
        (Some(lat), Some(lon)) => Some(UserPosition::manual(point(lat, lon)?)),
        _ => None,
    };

    let key = QueryKey::new(center, radius, types, config.query.center_precision);
    repository
        .fetch(&NearbyQuery::first_page(key.clone(), config.query.page_limit))
        .await?;

    for _ in 1..args.pages.max(1) {
        let has_more = repository.cached(&key).is_some_and(|set| set.has_more());
        if !has_more {
            break;
        }
        repository.fetch_next_page(&key).await?;
    }

    let set = repository.cached(&key).unwrap_or_default();
    info!(
        key = %key,
        shown = set.len(),
        total = set.total_count(),
        "Nearby query complete"
    );

    println!("Query: {}", key);
    if user.is_none() {
        println!("No user position given; every artifact is hidden.");
    }
    println!();
    println!("{}", header());
    for artifact in set.artifacts() {
        let entry = ArtifactVisibility {
            state: VisibilityState::evaluate(artifact, user.as_ref()),
            artifact: artifact.clone(),
        };
        println!("{}", format_row(&entry));
    }
    println!();
    println!(
        "Showing {} of {}{}",
        set.len(),
        set.total_count(),
        if set.has_more() { " (more available)" } else { "" }
    );

    repository.log_stats();
    Ok(())
}
