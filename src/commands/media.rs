//! Media population: phase folders into the media table

use crate::config::Config;
use crate::error::Result;
use crate::phase::Phase;
use crate::progress::LoadProgress;
use crate::resolve::{PageResolver, Resolution};
use crate::store::{MediaType, NewMedia, TargetDb};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Statistics from a media population run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaStats {
    pub media_root: String,
    pub owner_page_id: i64,
    pub owner_page_created: bool,
    pub phases_processed: Vec<String>,
    pub missing_phases: Vec<String>,
    pub images: usize,
    pub videos: usize,
    /// Ids assigned to the inserted items, in insertion order
    pub media_ids: Vec<i64>,
    pub skipped_files: Vec<String>,
}

impl MediaStats {
    pub fn added(&self) -> usize {
        self.images + self.videos
    }
}

/// Files of one phase directory, sorted by name
///
/// Symlinks are followed, so a link to a file counts as that file.
fn phase_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Populate the media table from `<media root>/<phase>/`
///
/// Every item is attached to the configured owner page, created first if
/// absent. Running twice inserts every item twice.
pub async fn cmd_populate_media(config: &Config, db: &TargetDb) -> Result<MediaStats> {
    let root = config.media_root();
    info!("Starting to populate Media table from {}", root.display());

    let mut stats = MediaStats {
        media_root: root.display().to_string(),
        owner_page_id: config.media.owner_page_id,
        ..Default::default()
    };

    let mut resolver = PageResolver::new(
        db,
        config.import.default_phase,
        config.import.placeholder_name.clone(),
    );
    let owner = resolver
        .ensure_named_page(config.media.owner_page_id, &config.media.owner_page_name)
        .await?;
    stats.owner_page_created = owner == Resolution::Created;

    for phase in &config.media.phases {
        let dir = root.join(phase.to_string());
        if !dir.is_dir() {
            warn!("Phase directory does not exist: {}", dir.display());
            stats.missing_phases.push(phase.to_string());
            continue;
        }

        info!("Processing phase: {}", phase);
        load_phase(config, db, *phase, &dir, &mut stats).await?;
        stats.phases_processed.push(phase.to_string());
    }

    info!("Finished populating Media table");
    Ok(stats)
}

async fn load_phase(
    config: &Config,
    db: &TargetDb,
    phase: Phase,
    dir: &Path,
    stats: &mut MediaStats,
) -> Result<()> {
    let files = phase_files(dir)?;
    let progress = LoadProgress::start(files.len(), &format!("Phase {}", phase));

    for path in files {
        progress.advance();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(media_type) = MediaType::from_path(&path) else {
            warn!("Skipped file with unsupported extension: {}", file_name);
            stats.skipped_files.push(file_name);
            continue;
        };

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let media = NewMedia {
            title: title.clone(),
            phase,
            path: title.clone(),
            media_type,
            page_id: config.media.owner_page_id,
        };
        let id = match db.insert_media(&media).await {
            Ok(id) => id,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };
        info!("Successfully added {} to Media table with id {}", title, id);
        stats.media_ids.push(id);

        match media_type {
            MediaType::Image => stats.images += 1,
            MediaType::Video => stats.videos += 1,
        }
    }

    progress.finish(&format!("Phase {} done", phase));
    Ok(())
}

/// Print media population results
pub fn print_media_stats(stats: &MediaStats) {
    println!("\n✓ Finished populating Media table\n");
    println!("  Media root: {}", stats.media_root);
    if stats.owner_page_created {
        println!("  Created owner page {}", stats.owner_page_id);
    }
    println!("  Phases processed: {}", stats.phases_processed.join(", "));
    if !stats.missing_phases.is_empty() {
        println!("  Missing phase directories: {}", stats.missing_phases.join(", "));
    }
    println!(
        "  Added: {} ({} images, {} videos)",
        stats.added(),
        stats.images,
        stats.videos
    );
    if !stats.skipped_files.is_empty() {
        println!("  Skipped: {}", stats.skipped_files.join(", "));
    }
}
