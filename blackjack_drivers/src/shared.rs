use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

use blackjack_rl::{Action, LearningConfig, PlayerState, ValueTable, DEALER_UP_CARDS, PLAYER_TOTALS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Learning(#[from] blackjack_rl::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub learning: ConfigLearning,
    pub trainer: ConfigTrainer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLearning {
    pub discount_rate: f64,
    pub learning_rate: f64,
    pub exploration_rate: f64,
    pub actions: Vec<Action>,
}

impl Default for ConfigLearning {
    fn default() -> Self {
        let defaults = LearningConfig::default();
        ConfigLearning {
            discount_rate: defaults.discount_rate,
            learning_rate: defaults.learning_rate,
            exploration_rate: defaults.exploration_rate,
            actions: defaults.actions,
        }
    }
}

impl TryInto<LearningConfig> for ConfigLearning {
    type Error = blackjack_rl::Error;

    fn try_into(self) -> Result<LearningConfig, Self::Error> {
        let learning_config = LearningConfig {
            discount_rate: self.discount_rate,
            learning_rate: self.learning_rate,
            exploration_rate: self.exploration_rate,
            actions: self.actions,
        };
        learning_config.validate()?;

        Ok(learning_config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigTrainer {
    pub episodes: u64,
    pub seed: Option<u64>,
    /// Log progress every this many episodes. 0 disables progress logs.
    pub report_every: u64,
    /// Greedy episodes played after training to measure the learned policy.
    pub evaluation_episodes: u64,
}

impl Default for ConfigTrainer {
    fn default() -> Self {
        ConfigTrainer {
            episodes: 100_000,
            seed: None,
            report_every: 10_000,
            evaluation_episodes: 10_000,
        }
    }
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file<P: AsRef<Path>>(filename: P) -> Result<Config, DriverError> {
    let filename = filename.as_ref();
    let file_content = fs::read_to_string(filename).map_err(|source| DriverError::Io {
        path: filename.display().to_string(),
        source,
    })?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> Result<Config, DriverError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Renders the greedy policy as two charts, hard totals then soft totals.
/// Rows are player totals, columns are dealer up cards, `S` stands and `H` hits.
pub fn format_policy_chart(table: &ValueTable, actions: &[Action]) -> String {
    let mut chart = String::new();
    write_policy_chart(&mut chart, table, actions).expect("writing to a String never fails");
    chart
}

fn write_policy_chart<W: Write>(out: &mut W, table: &ValueTable, actions: &[Action]) -> fmt::Result {
    for (title, usable_flex) in [("Hard totals", false), ("Soft totals", true)] {
        writeln!(out, "{}", title)?;
        write!(out, "{:>4}", "")?;
        for up_card in DEALER_UP_CARDS {
            if up_card == 1 {
                write!(out, "{:>3}", "A")?;
            } else {
                write!(out, "{:>3}", up_card)?;
            }
        }
        writeln!(out)?;

        for player_total in PLAYER_TOTALS {
            write!(out, "{:>4}", player_total)?;
            for up_card in DEALER_UP_CARDS {
                let state = PlayerState::new(player_total, up_card, usable_flex);
                let symbol = match table.greedy_action(&state, actions) {
                    Action::Stand => 'S',
                    Action::Hit => 'H',
                };
                write!(out, "{:>3}", symbol)?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_full_config() {
        let config = parse_config(
            r#"
learning:
  discount_rate: 1.0
  learning_rate: 0.05
  exploration_rate: 0.2
  actions: [Hit, Stand]
trainer:
  episodes: 5000
  seed: 42
  report_every: 1000
  evaluation_episodes: 0
"#,
        )
        .unwrap();

        assert_eq!(config.learning.learning_rate, 0.05);
        assert_eq!(config.learning.actions, vec![Action::Hit, Action::Stand]);
        assert_eq!(config.trainer.episodes, 5000);
        assert_eq!(config.trainer.seed, Some(42));

        let learning: LearningConfig = config.learning.try_into().unwrap();
        assert_eq!(learning.exploration_rate, 0.2);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse_config("learning:\n  exploration_rate: 0.1\n").unwrap();
        assert_eq!(config.learning.exploration_rate, 0.1);
        assert_eq!(config.learning.learning_rate, 0.1);
        assert_eq!(config.learning.actions, vec![Action::Stand, Action::Hit]);
        assert_eq!(config.trainer, ConfigTrainer::default());

        let empty = parse_config("{}").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn should_return_error_when_converting_learning() {
        let mut config_learning = ConfigLearning::default();
        config_learning.learning_rate = 2.0;
        let convert_result: Result<LearningConfig, blackjack_rl::Error> =
            config_learning.try_into();
        assert!(convert_result.is_err());
    }

    #[test]
    fn unknown_action_is_a_parse_error() {
        let result = parse_config("learning:\n  actions: [Stand, Double]\n");
        assert!(matches!(result, Err(DriverError::Yaml(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = parse_config_from_file("/nonexistent/blackjack_rl.yml");
        assert!(matches!(result, Err(DriverError::Io { .. })));
    }

    #[test]
    fn policy_chart_of_fresh_table() {
        let chart = format_policy_chart(&ValueTable::new(), &[Action::Stand, Action::Hit]);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Hard totals");
        assert_eq!(lines[1], "      A  2  3  4  5  6  7  8  9 10");
        assert_eq!(lines[2], "  12  S  S  S  S  S  S  S  S  S  S");
        assert_eq!(lines[12], "");
        assert_eq!(lines[13], "Soft totals");
        assert_eq!(lines[14], lines[1]);
        assert_eq!(lines.len(), 26);

        let hit_first = format_policy_chart(&ValueTable::new(), &[Action::Hit, Action::Stand]);
        assert!(hit_first.contains("  12  H  H  H  H  H  H  H  H  H  H"));
        assert!(hit_first.contains("  21  S  S  S  S  S  S  S  S  S  S"));
    }
}
