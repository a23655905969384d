pub mod hand;
pub mod shoe;

use blackjack_macros::allowed_phase;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::strategy::{EpsilonGreedy, Strategy};
use crate::{Action, Error, LearningConfig, PlayerState, ValueTable};

use self::hand::{DealerHand, Hand};
use self::shoe::{CardSource, InfiniteShoe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    WaitForDeal,
    Dealt,
    PlayerActing,
    PlayerDone,
    DealerActing,
    Resolved,
}

/// How one episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeOutcome {
    /// +1 if the player wins, -1 if the dealer wins, 0 for a push.
    pub reward: i8,
    /// Settled by a two-card 21 on either side, without any decision.
    pub natural: bool,
    pub player_total: u8,
    pub dealer_total: u8,
    /// Number of (state, action) pairs recorded for learning.
    pub decisions: usize,
}

/// Reward of a played-out episode. Both sides busting is a push.
pub fn compare_totals(player_total: u8, dealer_total: u8) -> i8 {
    let player_bust = player_total > hand::BLACKJACK;
    let dealer_bust = dealer_total > hand::BLACKJACK;
    match (player_bust, dealer_bust) {
        (true, true) => 0,
        (true, false) => -1,
        (false, true) => 1,
        (false, false) => match player_total.cmp(&dealer_total) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        },
    }
}

/// Reward when at least one side was dealt a natural.
fn natural_reward(player_natural: bool, dealer_natural: bool) -> i8 {
    match (player_natural, dealer_natural) {
        (true, true) => 0,
        (true, false) => 1,
        (false, true) => -1,
        (false, false) => unreachable!("natural_reward called without a natural"),
    }
}

pub trait EpisodeEventHandler {
    fn on_deal_cards(&mut self, _state: &PlayerState, _dealer: &DealerHand) {}
    fn on_natural(&mut self, _reward: i8) {}
    fn on_make_decision(&mut self, _state: &PlayerState, _action: Action) {}
    fn on_player_bust(&mut self, _player_total: u8) {}
    fn on_summary_episode(&mut self, _outcome: &EpisodeOutcome) {}
}

impl EpisodeEventHandler for () {}

/// Plays episodes of the simplified game and learns from them.
///
/// The driver owns the value table and the trajectory of the current episode.
/// Each step of an episode is a method that may only be called in its own phase,
/// see [`EpisodePhase`]. [`EpisodeDriver::play_episode`] chains them.
pub struct EpisodeDriver<S: CardSource, R: Rng> {
    config: LearningConfig,
    strategy: EpsilonGreedy,
    table: ValueTable,
    shoe: S,
    rng: R,
    learning_enabled: bool,

    // Episode state
    phase: EpisodePhase,
    player_hand: Hand,
    dealer_hand: DealerHand,
    player_natural: bool,
    dealer_natural: bool,
    trajectory: Vec<(PlayerState, Action)>,
    reward: Option<i8>,
}

impl EpisodeDriver<InfiniteShoe<StdRng>, StdRng> {
    /// Seeds both the shoe and the exploration coin so a run can be replayed.
    pub fn with_seed(config: LearningConfig, seed: u64) -> Result<Self, Error> {
        let shoe = InfiniteShoe::new(StdRng::seed_from_u64(seed));
        let rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        Self::new(config, shoe, rng)
    }
}

impl<S: CardSource, R: Rng> EpisodeDriver<S, R> {
    pub fn new(config: LearningConfig, shoe: S, rng: R) -> Result<Self, Error> {
        Self::with_table(config, ValueTable::new(), shoe, rng)
    }

    /// Starts from an existing table, e.g. to continue training.
    pub fn with_table(
        config: LearningConfig,
        table: ValueTable,
        shoe: S,
        rng: R,
    ) -> Result<Self, Error> {
        config.validate()?;
        let strategy = EpsilonGreedy::new(config.exploration_rate, config.actions.clone());
        Ok(Self {
            config,
            strategy,
            table,
            shoe,
            rng,
            learning_enabled: true,
            phase: EpisodePhase::WaitForDeal,
            player_hand: Hand::new(),
            dealer_hand: DealerHand::default(),
            player_natural: false,
            dealer_natural: false,
            trajectory: Vec::new(),
            reward: None,
        })
    }

    /// Plays `episodes` episodes, learning after each one.
    pub fn run<U: EpisodeEventHandler>(&mut self, episodes: u64, handler: &mut U) -> Result<(), Error> {
        for _ in 0..episodes {
            self.play_episode(handler)?;
        }
        debug!("finished {} episodes", episodes);
        Ok(())
    }

    /// Plays `episodes` episodes greedily without touching the table.
    pub fn evaluate<U: EpisodeEventHandler>(
        &mut self,
        episodes: u64,
        handler: &mut U,
    ) -> Result<(), Error> {
        let training_strategy = std::mem::replace(
            &mut self.strategy,
            EpsilonGreedy::greedy(self.config.actions.clone()),
        );
        self.learning_enabled = false;

        let result = (0..episodes).try_for_each(|_| self.play_episode(handler).map(|_| ()));

        self.strategy = training_strategy;
        self.learning_enabled = true;
        debug!("evaluated {} episodes", episodes);
        result
    }

    /// Plays one episode from the deal to the reset. Can be called at WaitForDeal phase.
    pub fn play_episode<U: EpisodeEventHandler>(
        &mut self,
        handler: &mut U,
    ) -> Result<EpisodeOutcome, Error> {
        let state = self.deal_initial_cards()?;
        handler.on_deal_cards(&state, &self.dealer_hand);

        if let Some(reward) = self.check_naturals()? {
            trace!("natural, reward {}", reward);
            handler.on_natural(reward);
        } else {
            loop {
                let state = self.current_state();
                let action = self
                    .strategy
                    .make_decision(&self.table, &state, &mut self.rng);
                handler.on_make_decision(&state, action);
                let finished = self.play(action)?;
                if finished {
                    break;
                }
            }
            if self.player_hand.bust() {
                handler.on_player_bust(self.player_hand.total());
            }

            self.start_dealer_turn()?;
            self.dealer_plays_and_summary()?;
        }

        let outcome = self.outcome();
        trace!("episode finished: {:?}", outcome);
        handler.on_summary_episode(&outcome);
        self.reset()?;
        Ok(outcome)
    }

    /// Can be called at WaitForDeal phase.
    /// Deals two cards to the player, then two to the dealer. The dealer's first
    /// card is the up card.
    #[allowed_phase(WaitForDeal)]
    pub fn deal_initial_cards(&mut self) -> Result<PlayerState, Error> {
        let player = (self.shoe.draw(), self.shoe.draw());
        let dealer = (self.shoe.draw(), self.shoe.draw());
        self.player_hand = Hand::with_initial_cards(player.0, player.1);
        self.dealer_hand = DealerHand::with_initial_cards(dealer.0, dealer.1);
        self.player_natural = self.player_hand.is_natural();
        self.dealer_natural = self.dealer_hand.is_natural();

        self.phase = EpisodePhase::Dealt;
        Ok(self.current_state())
    }

    /// Can be called at Dealt phase.
    /// Returns the reward if either side has a natural, in which case the episode
    /// is already resolved and nothing will be learned from it.
    #[allowed_phase(Dealt)]
    pub fn check_naturals(&mut self) -> Result<Option<i8>, Error> {
        if self.player_natural || self.dealer_natural {
            let reward = natural_reward(self.player_natural, self.dealer_natural);
            self.reward = Some(reward);
            self.phase = EpisodePhase::Resolved;
            return Ok(Some(reward));
        }
        self.phase = EpisodePhase::PlayerActing;
        Ok(None)
    }

    /// Plays the given action. Returns true if the player can't act any more.
    pub fn play(&mut self, action: Action) -> Result<bool, Error> {
        match action {
            Action::Stand => self.play_stand(),
            Action::Hit => self.play_hit(),
        }
    }

    /// Can be called at PlayerActing phase.
    /// Returns true if cannot play current hand any more.
    #[allowed_phase(PlayerActing)]
    pub fn play_stand(&mut self) -> Result<bool, Error> {
        self.record(Action::Stand);
        self.phase = EpisodePhase::PlayerDone;
        Ok(true)
    }

    /// Can be called at PlayerActing phase.
    /// Returns true if cannot play current hand any more.
    #[allowed_phase(PlayerActing)]
    pub fn play_hit(&mut self) -> Result<bool, Error> {
        self.record(Action::Hit);
        let card = self.shoe.draw();
        self.player_hand.receive_card(card);
        if self.player_hand.bust() {
            self.phase = EpisodePhase::PlayerDone;
            return Ok(true);
        }
        Ok(false)
    }

    /// Can be called at PlayerDone phase.
    #[allowed_phase(PlayerDone)]
    pub fn start_dealer_turn(&mut self) -> Result<(), Error> {
        self.phase = EpisodePhase::DealerActing;
        Ok(())
    }

    /// Can be called at DealerActing phase.
    /// Call this to make dealer play according to the fixed policy, settle the
    /// episode and learn from it. Returns the reward.
    ///
    /// The dealer plays even if the player busted.
    #[allowed_phase(DealerActing)]
    pub fn dealer_plays_and_summary(&mut self) -> Result<i8, Error> {
        self.dealer_hand.play(&mut self.shoe);
        let reward = compare_totals(self.player_hand.total(), self.dealer_hand.total());
        self.reward = Some(reward);

        if self.learning_enabled {
            self.table.backward_update(
                &self.trajectory,
                reward as f64,
                self.config.learning_rate,
                self.config.discount_rate,
            );
        }

        self.phase = EpisodePhase::Resolved;
        Ok(reward)
    }

    /// Can be called at Resolved phase.
    /// Clears everything that belongs to the finished episode.
    #[allowed_phase(Resolved)]
    pub fn reset(&mut self) -> Result<(), Error> {
        self.player_hand.clear();
        self.dealer_hand.clear();
        self.player_natural = false;
        self.dealer_natural = false;
        self.trajectory.clear();
        self.reward = None;
        self.phase = EpisodePhase::WaitForDeal;
        Ok(())
    }

    pub fn current_state(&self) -> PlayerState {
        PlayerState::new(
            self.player_hand.total(),
            self.dealer_hand.up_card(),
            self.player_hand.is_soft(),
        )
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn into_table(self) -> ValueTable {
        self.table
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn trajectory(&self) -> &[(PlayerState, Action)] {
        &self.trajectory
    }

    pub fn player_hand(&self) -> &Hand {
        &self.player_hand
    }

    pub fn dealer_hand(&self) -> &DealerHand {
        &self.dealer_hand
    }

    /// States below 12 are forced hits and are left out of the trajectory.
    fn record(&mut self, action: Action) {
        let state = self.current_state();
        if state.is_recorded() {
            self.trajectory.push((state, action));
        }
    }

    fn outcome(&self) -> EpisodeOutcome {
        EpisodeOutcome {
            reward: self.reward.unwrap_or_default(),
            natural: self.player_natural || self.dealer_natural,
            player_total: self.player_hand.total(),
            dealer_total: self.dealer_hand.total(),
            decisions: self.trajectory.len(),
        }
    }
}
