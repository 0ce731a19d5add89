use clap::{Parser, Subcommand, ValueEnum};

use crate::validate::MAX_DAY_INTERVAL;
use crate::wikipedia::{DEFAULT_ACCESS, DEFAULT_BASE_URL, DEFAULT_PROJECT, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "topviews",
    about = "Aggregate Wikipedia article page views over a date range",
    version,
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Number of days fetched at once (default: every day in the range)
    #[arg(short, long, global = true, env = "TOPVIEWS_WORKERS")]
    pub workers: Option<usize>,

    /// Number of top articles to display
    #[arg(short, long, global = true)]
    pub top: Option<usize>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the Wikimedia REST API
    #[arg(long, global = true, env = "TOPVIEWS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Wiki project to query
    #[arg(long, global = true, env = "TOPVIEWS_PROJECT", default_value = DEFAULT_PROJECT)]
    pub project: String,

    /// Access type (all-access, desktop, mobile-app, mobile-web)
    #[arg(long, global = true, env = "TOPVIEWS_ACCESS", default_value = DEFAULT_ACCESS)]
    pub access: String,

    /// User-Agent sent to the API
    #[arg(long, global = true, env = "TOPVIEWS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Largest accepted gap between start and end dates, in days
    #[arg(long, global = true, default_value_t = MAX_DAY_INTERVAL)]
    pub max_days: i64,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rank every article by total views between two dates (YYYYMMDD, inclusive)
    MostViewed { startdate: String, enddate: String },

    /// Total views of one article between two dates (YYYYMMDD, inclusive)
    ViewCount {
        article: String,
        startdate: String,
        enddate: String,
    },

    /// Day of a month on which an article had the most views
    MostViewedDay {
        article: String,
        /// 4-digit year
        year: String,
        /// 2-digit month
        month: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommand_with_global_options() {
        let args = Args::try_parse_from([
            "topviews",
            "view-count",
            "Dua_Lipa",
            "20210101",
            "20210103",
            "--workers",
            "4",
            "--format",
            "text",
        ])
        .unwrap();

        assert_eq!(
            args.command,
            Command::ViewCount {
                article: "Dua_Lipa".to_string(),
                startdate: "20210101".to_string(),
                enddate: "20210103".to_string(),
            }
        );
        assert_eq!(args.workers, Some(4));
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.max_days, MAX_DAY_INTERVAL);
    }

    #[test]
    fn most_viewed_day_takes_year_and_month() {
        let args =
            Args::try_parse_from(["topviews", "most-viewed-day", "Albert_Einstein", "2015", "07"])
                .unwrap();
        assert!(matches!(args.command, Command::MostViewedDay { ref month, .. } if month == "07"));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn missing_dates_are_rejected() {
        assert!(Args::try_parse_from(["topviews", "most-viewed", "20220101"]).is_err());
    }
}
