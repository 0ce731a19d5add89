use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

use crate::args::{Args, Command, OutputFormat};
use crate::cache::MemoryDayCache;
use crate::query::QueryEngine;
use crate::stats::DateRangeResult;
use crate::utils::format_number;
use crate::validate;
use crate::wikipedia::{WikipediaConfig, WikipediaSource};

pub fn build_engine(args: &Args) -> Result<QueryEngine> {
    let base_url = Url::parse(&args.base_url)
        .with_context(|| format!("Invalid --base-url {:?}", args.base_url))?;
    let config = WikipediaConfig {
        base_url,
        project: args.project.clone(),
        access: args.access.clone(),
        user_agent: args.user_agent.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
    };

    let source = WikipediaSource::new(config).context("Failed to build HTTP client")?;
    let config = source.config();
    info!(
        action = "configure",
        component = "wikipedia",
        base_url = %config.base_url,
        project = %config.project,
        access = %config.access,
        timeout_secs = config.timeout.as_secs(),
        "Using Wikimedia pageviews API"
    );

    Ok(QueryEngine::new(Arc::new(source), Arc::new(MemoryDayCache::new()))
        .with_workers(args.workers))
}

/// Validates the command's arguments and runs its query.
pub fn run_command(engine: &QueryEngine, args: &Args) -> Result<DateRangeResult> {
    let total_start_time = Instant::now();

    let mut result = match &args.command {
        Command::MostViewed { startdate, enddate } => {
            let (start, end) = validate::validate_range(startdate, enddate, args.max_days)?;
            engine.range_ranking(start, end)?
        }
        Command::ViewCount {
            article,
            startdate,
            enddate,
        } => {
            let article = validate::validate_article(article)?;
            let (start, end) = validate::validate_range(startdate, enddate, args.max_days)?;
            engine.item_total(article, start, end)?
        }
        Command::MostViewedDay {
            article,
            year,
            month,
        } => {
            let article = validate::validate_article(article)?;
            let month = validate::parse_month(year, month)?;
            engine.best_day_in_month(article, month)?
        }
    };

    if let Some(top) = args.top {
        result.items.truncate(top);
    }

    info!(
        action = "complete",
        component = "command",
        item_count = result.items.len(),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Command completed successfully"
    );
    Ok(result)
}

pub fn render(result: &DateRangeResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(result).context("Failed to serialize result"),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &DateRangeResult) -> String {
    let days = (result.end - result.start).num_days() + 1;
    let mut lines = vec![
        format!(
            "--- Page views {} to {} ({} days) ---",
            result.start,
            result.end,
            format_number(days.unsigned_abs())
        ),
        format!("Articles: {}", format_number(result.items.len() as u64)),
        format!("Total views: {}", format_number(result.total_views())),
    ];

    if result.items.is_empty() {
        lines.push("No matching articles".to_string());
    }
    for (rank, item) in result.items.iter().enumerate() {
        let mut line = format!(
            "{:>4}. {}: {} views",
            rank + 1,
            item.name,
            format_number(item.views)
        );
        if let Some(day) = item.day {
            line.push_str(&format!(" on {day}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}
