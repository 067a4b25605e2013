//! `nearfield distance` - great-circle distance between two points.

use clap::Args;
use nearfield::geo::{bearing_degrees, distance_meters};
use nearfield::visibility::format_distance;

use super::common::parse_point;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// First point as lat,lon
    #[arg(allow_hyphen_values = true)]
    pub from: String,

    /// Second point as lat,lon
    #[arg(allow_hyphen_values = true)]
    pub to: String,
}

pub fn run(args: DistanceArgs) -> Result<(), CliError> {
    let from = parse_point(&args.from)?;
    let to = parse_point(&args.to)?;

    let meters = distance_meters(from, to);
    println!("From:     {}", from);
    println!("To:       {}", to);
    println!("Distance: {:.1} m ({})", meters, format_distance(Some(meters)));
    if meters > 0.0 {
        println!("Bearing:  {:.1}°", bearing_degrees(from, to));
    }
    Ok(())
}
