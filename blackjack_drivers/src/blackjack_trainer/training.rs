use blackjack_rl::simulation::shoe::InfiniteShoe;
use blackjack_rl::{EpisodeDriver, EpisodeEventHandler, EpisodeOutcome, LearningConfig, ValueTable};
use blackjack_drivers::{format_policy_chart, Config, DriverError};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use self::private::Statistics;

mod private {
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Statistics {
        episodes: u64,
        wins: u64,
        pushes: u64,
        losses: u64,
        player_naturals: u64,
        total_reward: i64,

        last_episodes: u64,
        last_reward: i64,
    }

    impl Statistics {
        pub fn record(&mut self, reward: i8, player_natural: bool) {
            self.episodes += 1;
            match reward {
                1..=i8::MAX => self.wins += 1,
                0 => self.pushes += 1,
                _ => self.losses += 1,
            }
            if player_natural {
                self.player_naturals += 1;
            }
            self.total_reward += reward as i64;
        }

        pub fn get_episodes(&self) -> u64 {
            self.episodes
        }

        pub fn get_rate(&self, count: u64) -> f64 {
            if self.episodes == 0 {
                0.0
            } else {
                count as f64 / self.episodes as f64
            }
        }

        pub fn get_win_rate(&self) -> f64 {
            self.get_rate(self.wins)
        }

        pub fn get_push_rate(&self) -> f64 {
            self.get_rate(self.pushes)
        }

        pub fn get_loss_rate(&self) -> f64 {
            self.get_rate(self.losses)
        }

        pub fn get_player_naturals(&self) -> u64 {
            self.player_naturals
        }

        pub fn get_average_reward(&self) -> f64 {
            if self.episodes == 0 {
                0.0
            } else {
                self.total_reward as f64 / self.episodes as f64
            }
        }

        /// Average reward since the last call.
        pub fn get_delta_average_reward(&mut self) -> f64 {
            let episodes = self.episodes - self.last_episodes;
            let reward = self.total_reward - self.last_reward;
            self.last_episodes = self.episodes;
            self.last_reward = self.total_reward;
            if episodes == 0 {
                0.0
            } else {
                reward as f64 / episodes as f64
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Handler {
    label: &'static str,
    report_every: u64,
    stat: Statistics,
}

impl Handler {
    fn new(label: &'static str, report_every: u64) -> Self {
        Handler {
            label,
            report_every,
            ..Default::default()
        }
    }
}

impl EpisodeEventHandler for Handler {
    fn on_summary_episode(&mut self, outcome: &EpisodeOutcome) {
        // A two-card 21 is always a natural.
        let player_natural = outcome.natural && outcome.player_total == 21;
        self.stat.record(outcome.reward, player_natural);

        if self.report_every > 0 && self.stat.get_episodes() % self.report_every == 0 {
            info!(
                "{} episode {}: average reward {:.4} (last {} episodes {:.4})",
                self.label,
                self.stat.get_episodes(),
                self.stat.get_average_reward(),
                self.report_every,
                self.stat.get_delta_average_reward(),
            );
        }
    }
}

/// Trains a table as configured, evaluates it greedily and prints the results.
pub fn train_and_report(config: &Config) -> Result<ValueTable, DriverError> {
    let learning: LearningConfig = config.learning.clone().try_into()?;
    let trainer = &config.trainer;
    let mut driver: EpisodeDriver<InfiniteShoe<StdRng>, StdRng> = match trainer.seed {
        Some(seed) => EpisodeDriver::with_seed(learning, seed)?,
        None => EpisodeDriver::new(
            learning,
            InfiniteShoe::new(StdRng::from_entropy()),
            StdRng::from_entropy(),
        )?,
    };

    info!("training for {} episodes", trainer.episodes);
    let mut training = Handler::new("training", trainer.report_every);
    driver.run(trainer.episodes, &mut training)?;

    println!("Learned policy");
    print!("{}", format_policy_chart(driver.table(), &driver.config().actions));

    if trainer.evaluation_episodes > 0 {
        info!(
            "evaluating greedy policy for {} episodes",
            trainer.evaluation_episodes
        );
        let mut evaluation = Handler::new("evaluation", 0);
        driver.evaluate(trainer.evaluation_episodes, &mut evaluation)?;
        print_statistics(&evaluation.stat);
    }

    Ok(driver.into_table())
}

fn print_statistics(stat: &Statistics) {
    println!("Greedy evaluation over {} episodes", stat.get_episodes());
    println!(
        "Win: {:.2}%. Push: {:.2}%. Loss: {:.2}%. Player naturals: {}. Average reward: {:.4}.",
        stat.get_win_rate() * 100.0,
        stat.get_push_rate() * 100.0,
        stat.get_loss_rate() * 100.0,
        stat.get_player_naturals(),
        stat.get_average_reward(),
    );
    println!("----------------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_average_reward_covers_only_new_episodes() {
        let mut stat = Statistics::default();
        for reward in [1, -1, 0, 1] {
            stat.record(reward, false);
        }
        assert_eq!(stat.get_delta_average_reward(), 0.25);

        stat.record(-1, false);
        stat.record(-1, false);
        assert_eq!(stat.get_delta_average_reward(), -1.0);
        assert_eq!(stat.get_delta_average_reward(), 0.0);

        assert_eq!(stat.get_episodes(), 6);
        assert_eq!(stat.get_average_reward(), -1.0 / 6.0);
        assert_eq!(stat.get_win_rate(), 2.0 / 6.0);
        assert_eq!(stat.get_push_rate(), 1.0 / 6.0);
        assert_eq!(stat.get_loss_rate(), 3.0 / 6.0);
    }

    #[test]
    fn handler_counts_player_naturals() {
        let mut handler = Handler::new("test", 0);
        let outcome = EpisodeOutcome {
            reward: 1,
            natural: true,
            player_total: 21,
            dealer_total: 15,
            decisions: 0,
        };
        handler.on_summary_episode(&outcome);
        handler.on_summary_episode(&EpisodeOutcome {
            reward: -1,
            player_total: 12,
            dealer_total: 21,
            ..outcome
        });
        assert_eq!(handler.stat.get_player_naturals(), 1);
        assert_eq!(handler.stat.get_episodes(), 2);
    }
}
