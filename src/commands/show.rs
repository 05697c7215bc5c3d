//! Phase view: the media and history of one phase

use crate::cache::open_cache;
use crate::config::Config;
use crate::error::Result;
use crate::phase::{Phase, PHASES};
use crate::store::{History, Media, TargetDb};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One entry of the phase selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub phase: String,
    pub label: String,
}

/// Everything shown for a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseView {
    pub current_phase: String,
    pub phases: Vec<PhaseEntry>,
    pub media: Vec<Media>,
    pub history: Vec<History>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowResult {
    #[serde(flatten)]
    pub view: PhaseView,
    pub from_cache: bool,
}

/// Cache key of a phase view
pub fn view_cache_key(phase: Phase) -> String {
    format!("view:phase:{}", phase)
}

async fn build_view(db: &TargetDb, phase: Phase) -> Result<PhaseView> {
    Ok(PhaseView {
        current_phase: phase.to_string(),
        phases: PHASES
            .iter()
            .map(|(phase, label)| PhaseEntry {
                phase: phase.to_string(),
                label: label.to_string(),
            })
            .collect(),
        media: db.list_media(phase).await?,
        history: db.list_history(phase).await?,
    })
}

/// Build the view of `phase`, served from the view cache while fresh
pub async fn cmd_show_phase(config: &Config, db: &TargetDb, phase: Phase) -> Result<ShowResult> {
    let ttl = config.view.cache_ttl_secs;
    if ttl == 0 {
        return Ok(ShowResult {
            view: build_view(db, phase).await?,
            from_cache: false,
        });
    }

    let cache = open_cache(config, &config.view.cache_alias, db)?;
    let key = view_cache_key(phase);

    if let Some(cached) = cache.get(&key).await? {
        match serde_json::from_str::<PhaseView>(&cached) {
            Ok(view) => {
                debug!(key = %key, "Phase view served from cache");
                return Ok(ShowResult {
                    view,
                    from_cache: true,
                });
            }
            Err(e) => debug!(key = %key, "Discarding unreadable cached view: {}", e),
        }
    }

    let view = build_view(db, phase).await?;
    cache
        .set(&key, &serde_json::to_string(&view)?, Some(Duration::from_secs(ttl)))
        .await?;

    Ok(ShowResult {
        view,
        from_cache: false,
    })
}

/// Print a phase view
pub fn print_phase_view(result: &ShowResult) {
    let view = &result.view;
    println!("\n📚 Phases\n");
    for entry in &view.phases {
        let marker = if entry.phase == view.current_phase {
            "•"
        } else {
            " "
        };
        println!("{} {}  {}", marker, entry.phase, entry.label);
    }

    println!("\nMedia ({}):", view.media.len());
    for media in &view.media {
        println!("  [{}] {}", media.media_type, media.title);
    }

    println!("\nHistory ({}):", view.history.len());
    for entry in &view.history {
        println!("  #{} (page {}): {}", entry.id, entry.page_id, entry.content);
    }

    if result.from_cache {
        println!("\n(served from cache)");
    }
}
