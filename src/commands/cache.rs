//! Clear-cache command implementation

use crate::cache::{format_bytes, open_cache, CacheBackend, CacheStats};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::TargetDb;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing::info;

const PATTERN_CAPABILITY: &str = "Pattern-based clearing";

/// Options for clearing a cache
#[derive(Debug, Clone, Default)]
pub struct ClearCacheOptions {
    pub alias: String,
    pub pattern: Option<String>,
    pub no_confirm: bool,
    pub dry_run: bool,
    pub show_stats: bool,
}

/// What happened to the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClearOutcome {
    Cleared { removed: usize },
    WouldClear { matching: usize },
    Cancelled,
}

/// Result of a clear-cache run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCacheReport {
    pub alias: String,
    pub backend: String,
    pub pattern: Option<String>,
    pub dry_run: bool,
    pub outcome: ClearOutcome,
    pub stats_before: Option<CacheStats>,
    pub stats_after: Option<CacheStats>,
}

/// Clear the cache configured under `options.alias`
///
/// `confirm` is asked before anything is deleted unless `no_confirm` or
/// `dry_run` is set. Pattern clearing fails without touching the cache when
/// the backend cannot delete by pattern.
pub async fn cmd_clear_cache(
    config: &Config,
    db: &TargetDb,
    options: &ClearCacheOptions,
    confirm: &dyn Fn(&str) -> Result<bool>,
) -> Result<ClearCacheReport> {
    let cache = open_cache(config, &options.alias, db)?;
    info!("Cache backend: {}", cache.kind());
    info!("Cache alias: {}", options.alias);
    if options.dry_run {
        info!("Dry run, no changes will be made");
    }

    let mut report = ClearCacheReport {
        alias: options.alias.clone(),
        backend: cache.kind().to_string(),
        pattern: options.pattern.clone(),
        dry_run: options.dry_run,
        outcome: ClearOutcome::Cancelled,
        stats_before: None,
        stats_after: None,
    };

    if options.show_stats {
        report.stats_before = Some(cache.stats().await?);
    }

    report.outcome = match &options.pattern {
        Some(pattern) => clear_pattern(cache.as_ref(), options, pattern, confirm).await?,
        None => clear_all(cache.as_ref(), options, confirm).await?,
    };

    if options.show_stats && matches!(report.outcome, ClearOutcome::Cleared { .. }) {
        report.stats_after = Some(cache.stats().await?);
    }

    Ok(report)
}

async fn clear_pattern(
    cache: &dyn CacheBackend,
    options: &ClearCacheOptions,
    pattern: &str,
    confirm: &dyn Fn(&str) -> Result<bool>,
) -> Result<ClearOutcome> {
    let Some(patterns) = cache.pattern_clear() else {
        return Err(Error::BackendUnsupported {
            alias: options.alias.clone(),
            backend: cache.kind().to_string(),
            capability: PATTERN_CAPABILITY.to_string(),
        });
    };
    info!("Pattern-based clearing: \"{}\"", pattern);

    if options.dry_run {
        let matching = patterns.count_matching(pattern).await?;
        return Ok(ClearOutcome::WouldClear { matching });
    }

    if !options.no_confirm {
        let prompt = format!(
            "This will clear keys matching \"{}\" in the \"{}\" cache.",
            pattern, options.alias
        );
        if !confirm(&prompt)? {
            return Ok(ClearOutcome::Cancelled);
        }
    }

    let removed = patterns.clear_matching(pattern).await?;
    info!("Cleared {} keys matching pattern: {}", removed, pattern);
    Ok(ClearOutcome::Cleared { removed })
}

async fn clear_all(
    cache: &dyn CacheBackend,
    options: &ClearCacheOptions,
    confirm: &dyn Fn(&str) -> Result<bool>,
) -> Result<ClearOutcome> {
    if options.dry_run {
        let matching = cache.stats().await?.keys;
        return Ok(ClearOutcome::WouldClear { matching });
    }

    if !options.no_confirm {
        let prompt = format!(
            "This will clear ALL data in the \"{}\" cache.",
            options.alias
        );
        if !confirm(&prompt)? {
            return Ok(ClearOutcome::Cancelled);
        }
    }

    let removed = cache.clear().await?;
    info!("Cache \"{}\" cleared", options.alias);
    Ok(ClearOutcome::Cleared { removed })
}

/// Ask on stdin; only an answer of `yes` confirms
pub fn prompt_confirmation(message: &str) -> Result<bool> {
    print!("\n⚠️  {} Are you sure? (yes/no): ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("yes"))
}

fn print_cache_stats(label: &str, stats: &CacheStats) {
    println!("\n📊 Cache Stats ({}):", label);
    println!("  Keys: {}", stats.keys);
    println!("  Expired Keys: {}", stats.expired_keys);
    println!("  Approx. Size: {}", format_bytes(stats.approx_size_bytes));
    println!("  Max Entries: {}", stats.max_entries);
    if let Some(usage) = stats.usage_percent() {
        println!("  Usage: {:.1}%", usage);
    }
}

/// Print clear-cache results
pub fn print_clear_cache(report: &ClearCacheReport) {
    println!("Cache backend: {}", report.backend);
    println!("Cache alias: {}", report.alias);
    if report.dry_run {
        println!("\n🔍 DRY RUN MODE - No changes will be made");
    }

    if let Some(stats) = &report.stats_before {
        print_cache_stats("BEFORE", stats);
    }

    let target = match &report.pattern {
        Some(pattern) => format!("keys matching pattern: {}", pattern),
        None => format!("cache \"{}\"", report.alias),
    };
    match &report.outcome {
        ClearOutcome::Cleared { removed } => {
            println!("\n✅ Cleared {} ({} removed)", target, removed)
        }
        ClearOutcome::WouldClear { matching } => {
            println!("\n✅ Would clear {} ({} keys, dry-run)", target, matching)
        }
        ClearOutcome::Cancelled => println!("\nCache clear cancelled."),
    }

    if let Some(stats) = &report.stats_after {
        print_cache_stats("AFTER", stats);
    }
}
