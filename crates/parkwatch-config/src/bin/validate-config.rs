//! Config validation CLI tool
//!
//! Validates a parkwatchd configuration file and reports any errors.

use parkwatch_config::{AlertFormat, ConfigError, CURRENT_CONFIG_VERSION};
use parkwatch_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a parkwatchd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match parkwatch_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Check interval: {}s", policy.monitor.interval.as_secs());
            println!("  Check on start: {}", policy.monitor.check_on_start);
            println!(
                "  Hourly allowance: {}h",
                policy.rules.hourly_allowance_hours
            );
            println!(
                "  Day pass window: 00:00-{:02}:00 on the day after entry",
                policy.rules.day_pass_window_end_hour
            );
            println!("  Slots file: {}", policy.source.slots_path.display());
            let format = match policy.alerts.format {
                AlertFormat::Log => "log",
                AlertFormat::Json => "json",
            };
            println!("  Alert format: {}", format);

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
