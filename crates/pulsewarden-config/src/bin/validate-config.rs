//! Config validation CLI tool
//!
//! Validates a pulsewarden configuration file and reports any errors.

use pulsewarden_util::default_config_path;
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
            eprintln!("Validates a pulsewarden configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match pulsewarden_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version:   {}", pulsewarden_config::CURRENT_CONFIG_VERSION);
            println!("  Native libraries: {}", config.backend.native_lib_dir.display());
            println!("  Working dir:      {}", config.backend.working_dir.display());
            println!("  Temp dir:         {}", config.backend.tmp_dir.display());
            println!("  System libraries: {}", config.backend.system_lib_dir.display());
            println!("  Socket:           {}", config.socket_path.display());
            println!("  Volume:           {}", config.audio.volume);
            println!("  Performance mode: {}", config.audio.performance_mode);
            ExitCode::SUCCESS
        }
        Err(pulsewarden_config::ConfigError::ValidationFailed { errors }) => {
            eprintln!("✗ Configuration has {} error(s):", errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("✗ Failed to load configuration: {}", e);
            ExitCode::from(1)
        }
    }
}
