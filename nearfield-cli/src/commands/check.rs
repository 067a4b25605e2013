//! `nearfield check` - the AR entry gate for one artifact.

use clap::Args;

use nearfield::artifact::ArtifactId;
use nearfield::position::UserPosition;
use nearfield::repository::{ArtifactClient, NearbyArtifactRepository};
use nearfield::visibility::{format_distance_away, ArtifactVisibility, VisibilityState};

use super::common::point;
use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Artifact id
    pub id: ArtifactId,

    /// User latitude
    #[arg(long, allow_hyphen_values = true)]
    pub user_lat: f64,

    /// User longitude
    #[arg(long, allow_hyphen_values = true)]
    pub user_lon: f64,

    /// Use the built-in Seattle catalog instead of the API
    #[arg(long)]
    pub demo: bool,
}

pub async fn run(runner: &CliRunner, args: CheckArgs) -> Result<(), CliError> {
    runner.log_startup("check");
    if args.demo {
        check(runner.demo_repository()?, &args).await
    } else {
        check(runner.http_repository()?, &args).await
    }
}

async fn check<C: ArtifactClient>(
    repository: NearbyArtifactRepository<C>,
    args: &CheckArgs,
) -> Result<(), CliError> {
    let user = UserPosition::manual(point(args.user_lat, args.user_lon)?);
    let artifact = repository.fetch_artifact(args.id, Some(user.point)).await?;

    let entry = ArtifactVisibility {
        state: VisibilityState::evaluate(&artifact, Some(&user)),
        artifact,
    };

    println!("{} ({})", entry.artifact.title, entry.artifact.artifact_type.label());
    println!(
        "  View distance: {}m - {}m",
        entry.artifact.view_distance.min(),
        entry.artifact.view_distance.max()
    );
    println!("  {}", format_distance_away(entry.state.distance_meters));
    println!("  State: {}", entry.visibility());
    println!(
        "  AR entry: {}",
        if entry.can_enter_ar() { "allowed" } else { "blocked" }
    );
    println!("  {}", entry.guidance());
    Ok(())
}
