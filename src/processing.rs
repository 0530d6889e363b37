use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::constants::IMAGE_EXTENSIONS;
use crate::exif_writer::write_gps_location;
use crate::lookup::LookupClient;
use crate::settings::Settings;

/// Counters for one batch run.
#[derive(Debug, Default)]
pub struct BatchStats {
    pub total: usize,
    pub geotagged: usize,
    pub lookup_failures: usize,
    pub write_failures: usize,
    pub elapsed: Duration,
}

/// List the image files directly inside `folder`.
///
/// Non-recursive, hidden files included, extension matched against the
/// allow-list case-insensitively. Subdirectories and non-image files are
/// silently skipped. An unreadable folder is a fatal error.
pub fn collect_image_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(folder)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry =
            entry.with_context(|| format!("Failed to list {}", folder.display()))?;
        if !entry.file_type().map_or(false, |ft| ft.is_file()) {
            continue;
        }
        let is_image = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
            });
        if is_image {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Run the batch: for each image in the folder, resolve its coordinates
/// through the filename-derived ID and write them into the file's EXIF.
///
/// Strictly sequential; every per-file failure is logged, counted and
/// skipped so one bad image never blocks the rest.
pub fn process_folder(settings: &Settings, client: &LookupClient) -> Result<BatchStats> {
    let started = Instant::now();

    let files = collect_image_files(&settings.folder)?;
    info!(
        "Found {} images in {}",
        files.len(),
        settings.folder.display()
    );

    let mut stats = BatchStats {
        total: files.len(),
        ..BatchStats::default()
    };

    for path in &files {
        let Some(image_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!("Skipping {}: file name is not valid UTF-8", path.display());
            stats.lookup_failures += 1;
            continue;
        };

        let Some((lat, lon)) = client.image_geometry(image_id) else {
            stats.lookup_failures += 1;
            continue;
        };

        if settings.dry_run {
            info!("{}: {}, {} (dry run, not written)", image_id, lat, lon);
            stats.geotagged += 1;
            continue;
        }

        match write_gps_location(path, lat, lon) {
            Ok(()) => {
                debug!("Geotagged {} at {}, {}", path.display(), lat, lon);
                stats.geotagged += 1;
            }
            Err(err) => {
                warn!("Failed to geotag {}: {:#}", path.display(), err);
                stats.write_failures += 1;
            }
        }
    }

    stats.elapsed = started.elapsed();
    Ok(stats)
}
