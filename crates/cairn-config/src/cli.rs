//! Command-line overrides shared by Cairn binaries.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Global command-line options.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct CliArgs {
    /// World directory.
    #[arg(long, global = true)]
    pub world: Option<PathBuf>,

    /// Channel value treated as full brightness.
    #[arg(long, global = true)]
    pub max_brightness: Option<u8>,

    /// Disable LZ4 compression of written chunk files.
    #[arg(long, global = true)]
    pub no_compress: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref world) = args.world {
            self.storage.world_dir = Some(world.clone());
        }
        if let Some(max) = args.max_brightness {
            self.lighting.max_brightness = max;
        }
        if args.no_compress {
            self.storage.compress = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            world: Some(PathBuf::from("/tmp/w")),
            max_brightness: Some(15),
            no_compress: true,
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.storage.world_dir, Some(PathBuf::from("/tmp/w")));
        assert_eq!(config.lighting.max_brightness, 15);
        assert!(!config.storage.compress);
        // Non-overridden fields retain defaults
        assert_eq!(config.debug.log_level, "info");
        assert_eq!(config.storage.compression_threshold, 256);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }
}
