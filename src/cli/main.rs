//! Resolve the location of a single sighting photo from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sighting_locator::config::Config;
use sighting_locator::positioning::{NoPositioning, PermissionState, PositionFix, ReportedPosition};
use sighting_locator::{LocationResolver, SubdivisionCatalog, Submission};

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Resolve where a sighting photo was taken")]
struct Args {
    /// Photo file; omit to resolve from --subdivision alone
    photo: Option<PathBuf>,

    /// Manually selected subdivision
    #[arg(short, long)]
    subdivision: Option<String>,

    /// Device fix as "lat,lon", treated as a live capture with granted permission
    #[arg(long, value_parser = parse_fix)]
    fix: Option<(f64, f64)>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Never call the reverse geocoder
    #[arg(long)]
    offline: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_fix(s: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got '{}'", s))?;
    let lat = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
    let lon = lon.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
    Ok((lat, lon))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load_or_default(args.config.as_ref())?;
    if args.offline {
        config.geocoder.enabled = false;
    }

    let resolver = LocationResolver::from_config(&config, SubdivisionCatalog::builtin())
        .context("Failed to set up reverse geocoder")?;

    let photo = match &args.photo {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };
    info!("Photo: {} bytes", photo.as_ref().map_or(0, Vec::len));

    let submission = Submission {
        photo,
        live_capture: args.fix.is_some(),
        manual_subdivision: args.subdivision,
    };

    let result = match args.fix {
        Some((lat, lon)) => {
            let positions =
                ReportedPosition::new(PermissionState::Granted, Some(PositionFix::new(lat, lon)));
            resolver.resolve(submission, &positions).await?
        }
        None => resolver.resolve(submission, &NoPositioning).await?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_finalizable() {
        eprintln!("warning: no subdivision resolved; pass --subdivision to finalize the report");
    }

    Ok(())
}
