pub mod error;
pub mod simulation;
pub mod strategy;
mod value_table;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use strum_macros::EnumIter;

pub use error::Error;
pub use simulation::{EpisodeDriver, EpisodeEventHandler, EpisodeOutcome, EpisodePhase};
pub use value_table::{round_to_precision, ValueTable, DEALER_UP_CARDS, PLAYER_TOTALS};

/// Hyper-parameters of the learner. Checked by [`LearningConfig::validate`] when an
/// [`EpisodeDriver`] is built.
#[derive(Clone, Debug, PartialEq)]
pub struct LearningConfig {
    /// Multiplier applied to the target carried backward through a trajectory.
    /// Every intermediate reward is 0, so the default of 1 leaves it inert.
    pub discount_rate: f64,
    pub learning_rate: f64,
    /// Probability of replacing the greedy action by a non-greedy one.
    pub exploration_rate: f64,
    /// Action order. Greedy ties go to the first action in this list.
    pub actions: Vec<Action>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        LearningConfig {
            discount_rate: 1.0,
            learning_rate: 0.1,
            exploration_rate: 0.3,
            actions: vec![Action::Stand, Action::Hit],
        }
    }
}

impl LearningConfig {
    pub fn validate(&self) -> Result<(), Error> {
        check_rate("discount_rate", self.discount_rate)?;
        check_rate("learning_rate", self.learning_rate)?;
        check_rate("exploration_rate", self.exploration_rate)?;

        let has_each_once = self.actions.len() == 2
            && self.actions.contains(&Action::Stand)
            && self.actions.contains(&Action::Hit);
        if !has_each_once {
            return Err(Error::InvalidActionSet(self.actions.clone()));
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::RateOutOfRange { name, value })
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    Serialize_enum_str,
    Deserialize_enum_str,
)]
pub enum Action {
    Stand,
    Hit,
}

/// What the learning player observes. Only totals in [`PLAYER_TOTALS`] are used
/// as value-table keys; lower totals are forced hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerState {
    pub player_total: u8,
    pub dealer_up_card: u8,
    pub usable_flex: bool,
}

impl PlayerState {
    pub fn new(player_total: u8, dealer_up_card: u8, usable_flex: bool) -> Self {
        PlayerState {
            player_total,
            dealer_up_card,
            usable_flex,
        }
    }

    /// Whether the state carries a decision worth learning.
    pub fn is_recorded(&self) -> bool {
        self.player_total >= *PLAYER_TOTALS.start()
    }
}

/// Trains a fresh table for `episodes` episodes with the default configuration.
pub fn run(episodes: u64) -> Result<ValueTable, Error> {
    run_with_config(LearningConfig::default(), episodes, None)
}

/// Trains a fresh table. A `seed` makes the whole run reproducible.
pub fn run_with_config(
    config: LearningConfig,
    episodes: u64,
    seed: Option<u64>,
) -> Result<ValueTable, Error> {
    let mut driver = match seed {
        Some(seed) => EpisodeDriver::with_seed(config, seed)?,
        None => EpisodeDriver::new(
            config,
            simulation::shoe::InfiniteShoe::new(StdRng::from_entropy()),
            StdRng::from_entropy(),
        )?,
    };
    driver.run(episodes, &mut ())?;
    Ok(driver.into_table())
}
