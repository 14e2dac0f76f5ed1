//! Command-line interface parsing for Farewatch
//!
//! This module handles parsing of CLI arguments using clap and applying them
//! on top of the environment configuration.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Farewatch - watch airfares and email subscribers when a deal shows up
#[derive(Parser, Debug)]
#[command(name = "farewatch")]
#[command(about = "Airfare price monitoring with email alerts")]
#[command(version)]
pub struct Cli {
    /// Compose notifications and log them instead of sending email
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for the code map and route cache
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Airport or city code every search departs from
    ///
    /// Examples:
    ///   farewatch --origin MEL
    ///   farewatch --origin LON --dry-run
    #[arg(long, value_name = "IATA", value_parser = parse_iata_arg)]
    pub origin: Option<String>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies flag overrides to a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(origin) = &self.origin {
            config.origin_code = origin.clone();
        }
    }

    /// Default log filter for this invocation
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "farewatch=debug"
        } else {
            "farewatch=info"
        }
    }
}

/// Parses a code argument: 3 ASCII letters, normalized to upper case
///
/// # Returns
/// * `Ok(String)` with the upper-cased code
/// * `Err(String)` describing why the value was rejected
pub fn parse_iata_arg(s: &str) -> Result<String, String> {
    let code = s.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(format!("Invalid code: '{}'. Expected 3 letters, e.g. SYD", s))
    }
}
