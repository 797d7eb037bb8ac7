//! Command line and environment configuration for the `schedule` binary.

use chrono::Duration;
use clap::Parser;
use schedule_engine::SearchLimits;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "schedule",
    version,
    about = "Calendar service: users, recurring meetings and free-time search"
)]
pub struct Config {
    /// Bind to the local address
    #[arg(short, long, env = "SCHEDULE_ADDRESS", default_value = "localhost")]
    pub address: String,

    /// Listen on the port
    #[arg(short, long, env = "SCHEDULE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// How many days past the requested start a free-time search may look
    #[arg(
        long,
        env = "SCHEDULE_SEARCH_HORIZON_DAYS",
        default_value_t = 365,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub search_horizon_days: u32,

    /// How many candidate slots a free-time search may examine
    #[arg(
        long,
        env = "SCHEDULE_SEARCH_MAX_ITERATIONS",
        default_value_t = 100_000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub search_max_iterations: u64,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            horizon: Duration::days(i64::from(self.search_horizon_days)),
            max_iterations: usize::try_from(self.search_max_iterations).unwrap_or(usize::MAX),
        }
    }
}
