mod training;

use std::path::PathBuf;
use std::process::ExitCode;

use blackjack_drivers::{parse_config_from_file, Config, DriverError};
use clap::Parser;
use log::{error, info, warn};

const DEFAULT_CONFIG_FILE: &str = ".blackjack_rl.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file. Defaults to ~/.blackjack_rl.yml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of training episodes, overrides the config file
    #[arg(short, long)]
    episodes: Option<u64>,

    /// Seed for cards and exploration, overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,
}

fn load_config(args: &CommandLineArgs) -> Result<Config, DriverError> {
    let default_path = home::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE));
    load_config_with_default(args, default_path)
}

/// An explicit `--config` must exist. The default path is only read if it is a file.
fn load_config_with_default(
    args: &CommandLineArgs,
    default_path: Option<PathBuf>,
) -> Result<Config, DriverError> {
    let mut config = match &args.config {
        Some(path) => parse_config_from_file(path)?,
        None => match default_path {
            Some(path) if path.is_file() => {
                info!("reading config from {}", path.display());
                parse_config_from_file(path)?
            }
            _ => {
                warn!("no ~/{} found, using default config", DEFAULT_CONFIG_FILE);
                Config::default()
            }
        },
    };

    if let Some(episodes) = args.episodes {
        config.trainer.episodes = episodes;
    }
    if args.seed.is_some() {
        config.trainer.seed = args.seed;
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandLineArgs::parse();
    let result = load_config(&args).and_then(|config| training::train_and_report(&config));
    match result {
        Ok(table) => {
            info!("trained {} table entries", table.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn parse_args(args: &[&str]) -> CommandLineArgs {
        CommandLineArgs::try_parse_from(
            std::iter::once("blackjack_trainer").chain(args.iter().copied()),
        )
        .unwrap()
    }

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "blackjack_trainer_{}_{}.yml",
            std::process::id(),
            name
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let args = parse_args(&[]);
        let missing = std::env::temp_dir().join("blackjack_trainer_no_such_default.yml");
        let config = load_config_with_default(&args, Some(missing)).unwrap();
        assert_eq!(config, Config::default());

        let config = load_config_with_default(&args, None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let args = parse_args(&["--config", "/nonexistent/blackjack_rl.yml"]);
        let result = load_config_with_default(&args, None);
        assert!(matches!(result, Err(DriverError::Io { .. })));
    }

    #[test]
    fn default_file_is_read_when_present() {
        let path = write_config("default", "trainer:\n  episodes: 77\n");
        let config = load_config_with_default(&parse_args(&[]), Some(path.clone())).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.trainer.episodes, 77);
    }

    #[test]
    fn command_line_overrides_config_file() {
        let path = write_config("overrides", "trainer:\n  episodes: 1000\n  seed: 8\n");
        let path_arg = path.display().to_string();

        let args = parse_args(&["--config", &path_arg, "--episodes", "5", "--seed", "3"]);
        let overridden = load_config_with_default(&args, None).unwrap();
        let args = parse_args(&["--config", &path_arg]);
        let from_file = load_config_with_default(&args, None).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(overridden.trainer.episodes, 5);
        assert_eq!(overridden.trainer.seed, Some(3));
        assert_eq!(from_file.trainer.episodes, 1000);
        assert_eq!(from_file.trainer.seed, Some(8));
    }
}
