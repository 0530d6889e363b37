use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod constants;
mod exif_writer;
mod gps;
mod lookup;
mod processing;
mod settings;
#[cfg(test)]
mod test_support;

use constants::{DEFAULT_GRAPH_URL, DEFAULT_TIMEOUT_SECS};
use lookup::LookupClient;
use settings::Settings;

/// Batch geotagger: look up Mapillary image coordinates and write them
/// into local JPEG EXIF.
#[derive(Debug, Parser)]
#[command(name = "mapillary-geotagger", version)]
struct Args {
    /// Folder of JPEG images named after Mapillary image IDs
    folder: std::path::PathBuf,

    /// Mapillary Graph API access token
    #[arg(long, env = "MAPILLARY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Graph API base URL
    #[arg(long, default_value = DEFAULT_GRAPH_URL)]
    graph_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Resolve coordinates and report them without modifying any file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::new(
        args.folder,
        args.access_token,
        args.graph_url,
        args.timeout,
        args.dry_run,
    )?;

    let client = LookupClient::new(&settings)?;
    let stats = processing::process_folder(&settings, &client)?;

    println!("\n📊 Geotagging summary:");
    println!("   🔍 Images found: {}", stats.total);
    println!("   📍 Geotagged: {}", stats.geotagged);
    println!("   ❌ Lookup failures: {}", stats.lookup_failures);
    println!("   💥 Write failures: {}", stats.write_failures);
    println!("   ⏱️  Elapsed: {:.2} s", stats.elapsed.as_secs_f64());
    if settings.dry_run {
        println!("   📝 Dry run - no files were modified");
    }

    Ok(())
}
