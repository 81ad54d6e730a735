//! Server configuration and CLI argument parsing
//!
//! All settings can be supplied as command-line arguments or environment
//! variables with the `BRUTEGUARD_` prefix, with this precedence:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! bruteguard --port 9090 --allowed-retries 3
//!
//! # Using environment variables
//! export BRUTEGUARD_PORT=9090
//! export BRUTEGUARD_ALLOWED_RETRIES=3
//! bruteguard
//!
//! # Mixed (CLI overrides env)
//! export BRUTEGUARD_PORT=8080
//! bruteguard --port 9090  # Uses port 9090
//! ```

use anyhow::{Result, anyhow};
use bruteguard::ThrottleConfig;
use clap::Parser;
use std::time::Duration;

/// Main configuration structure for the server
///
/// Built from CLI arguments and environment variables; holds everything
/// needed to construct the store, the engine and the HTTP listener.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener configuration
    pub http: HttpConfig,
    /// Process-wide throttling defaults
    pub throttle: ThrottleConfig,
    /// Attempt store configuration
    pub store: StoreConfig,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Attempt store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Expected number of tracked identities
    pub capacity: usize,
    /// Minimum time between inline sweeps of expired entries
    pub cleanup_interval: Duration,
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// BRUTEGUARD_ prefix. CLI arguments take precedence over environment
/// variables.
#[derive(Parser, Debug)]
#[command(
    name = "bruteguard",
    about = "Brute-force attempt throttling service",
    long_about = "A standalone brute-force throttling service.\n\nAttempts are tracked per identity (proxy-aware client address, or a caller-supplied key/value pair), delayed along an exponentially growing curve, and rejected once the retry ceiling is exceeded within the sliding window.\n\nEnvironment variables with BRUTEGUARD_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    // HTTP listener
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "127.0.0.1",
        env = "BRUTEGUARD_HOST"
    )]
    pub host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8080,
        env = "BRUTEGUARD_PORT"
    )]
    pub port: u16,

    // Throttling defaults
    #[arg(
        long,
        value_name = "N",
        help = "Retries allowed beyond the first attempt before lockout",
        default_value_t = 5,
        env = "BRUTEGUARD_ALLOWED_RETRIES"
    )]
    pub allowed_retries: u32,
    #[arg(
        long,
        value_name = "MS",
        help = "First mandatory delay (milliseconds)",
        default_value_t = 100,
        env = "BRUTEGUARD_INITIAL_WAIT"
    )]
    pub initial_wait: u64,
    #[arg(
        long,
        value_name = "MS",
        help = "Cap on any single delay (milliseconds)",
        default_value_t = 15_000,
        env = "BRUTEGUARD_MAX_WAIT"
    )]
    pub max_wait: u64,
    #[arg(
        long,
        value_name = "MS",
        help = "Sliding inactivity window (milliseconds)",
        default_value_t = 360_000,
        env = "BRUTEGUARD_TIME_WINDOW"
    )]
    pub time_window: u64,
    #[arg(
        long,
        value_name = "N",
        help = "Trusted proxy depth for forwarded-address resolution",
        default_value_t = 0,
        env = "BRUTEGUARD_PROXY_COUNT"
    )]
    pub proxy_count: usize,
    #[arg(
        long,
        help = "Run the throttle pre-check on every request",
        env = "BRUTEGUARD_PRE_RESPONSE"
    )]
    pub pre_response: bool,

    // Store configuration
    #[arg(
        long,
        value_name = "SIZE",
        help = "Initial store capacity",
        default_value_t = 100_000,
        env = "BRUTEGUARD_STORE_CAPACITY"
    )]
    pub store_capacity: usize,
    #[arg(
        long,
        value_name = "SECS",
        help = "Minimum interval between expired-entry sweeps (seconds)",
        default_value_t = 60,
        env = "BRUTEGUARD_STORE_CLEANUP_INTERVAL"
    )]
    pub store_cleanup_interval: u64,

    // General options
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "BRUTEGUARD_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if any throttling value fails validation.
    pub fn from_env_and_args() -> Result<Self> {
        // Clap handles the CLI > env > default precedence
        let args = Args::parse();

        // Handle --list-env-vars
        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        let config = Self::from_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration structure from parsed arguments.
    pub fn from_args(args: Args) -> Self {
        Config {
            http: HttpConfig {
                host: args.host,
                port: args.port,
            },
            throttle: ThrottleConfig {
                allowed_retries: args.allowed_retries,
                initial_wait: Duration::from_millis(args.initial_wait),
                max_wait: Duration::from_millis(args.max_wait),
                time_window: Duration::from_millis(args.time_window),
                proxy_count: args.proxy_count,
                pre_response: args.pre_response,
            },
            store: StoreConfig {
                capacity: args.store_capacity,
                cleanup_interval: Duration::from_secs(args.store_cleanup_interval),
            },
            log_level: args.log_level,
        }
    }

    /// Validate the configuration
    ///
    /// Throttling defaults are validated by the core library; a failure here
    /// aborts startup rather than the first request.
    pub fn validate(&self) -> Result<()> {
        self.throttle
            .validate()
            .map_err(|err| anyhow!("{err}"))?;
        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("Bruteguard Environment Variables");
        println!("================================");
        println!();
        println!("All environment variables use the BRUTEGUARD_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("HTTP Listener:");
        println!("  BRUTEGUARD_HOST=<host>                  HTTP host [default: 127.0.0.1]");
        println!("  BRUTEGUARD_PORT=<port>                  HTTP port [default: 8080]");
        println!();

        println!("Throttling Defaults:");
        println!("  BRUTEGUARD_ALLOWED_RETRIES=<n>          Retries before lockout [default: 5]");
        println!("  BRUTEGUARD_INITIAL_WAIT=<ms>            First mandatory delay [default: 100]");
        println!("  BRUTEGUARD_MAX_WAIT=<ms>                Cap on any single delay [default: 15000]");
        println!("  BRUTEGUARD_TIME_WINDOW=<ms>             Sliding inactivity window [default: 360000]");
        println!("  BRUTEGUARD_PROXY_COUNT=<n>              Trusted proxy depth [default: 0]");
        println!("  BRUTEGUARD_PRE_RESPONSE=true|false      Pre-check every request [default: false]");
        println!();

        println!("Store Configuration:");
        println!("  BRUTEGUARD_STORE_CAPACITY=<size>        Initial store capacity [default: 100000]");
        println!(
            "  BRUTEGUARD_STORE_CLEANUP_INTERVAL=<secs> Sweep interval in seconds [default: 60]"
        );
        println!();

        println!("General Configuration:");
        println!(
            "  BRUTEGUARD_LOG_LEVEL=<level>            Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # Tighter login throttling behind one proxy");
        println!("  export BRUTEGUARD_ALLOWED_RETRIES=3");
        println!("  export BRUTEGUARD_PROXY_COUNT=1");
        println!();
        println!("  # Run server (CLI args override env vars)");
        println!("  bruteguard --port 9090");
    }
}
