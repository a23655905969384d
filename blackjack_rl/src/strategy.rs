use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Action, PlayerState, ValueTable};

/// Totals at or below this can't bust on the next card, so the player always hits.
pub const FORCED_HIT_THRESHOLD: u8 = 11;

pub trait Strategy {
    fn make_decision<R: Rng + ?Sized>(
        &self,
        table: &ValueTable,
        state: &PlayerState,
        rng: &mut R,
    ) -> Action;
}

/// Greedy over the value table, except that with probability `exploration_rate`
/// one of the other actions is taken instead.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    exploration_rate: f64,
    actions: Vec<Action>,
}

impl EpsilonGreedy {
    pub fn new(exploration_rate: f64, actions: Vec<Action>) -> Self {
        EpsilonGreedy {
            exploration_rate,
            actions,
        }
    }

    /// Never explores.
    pub fn greedy(actions: Vec<Action>) -> Self {
        Self::new(0.0, actions)
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl Strategy for EpsilonGreedy {
    fn make_decision<R: Rng + ?Sized>(
        &self,
        table: &ValueTable,
        state: &PlayerState,
        rng: &mut R,
    ) -> Action {
        if state.player_total <= FORCED_HIT_THRESHOLD {
            return Action::Hit;
        }

        let greedy = table.greedy_action(state, &self.actions);
        if rng.gen::<f64>() < self.exploration_rate {
            let others: Vec<Action> = self
                .actions
                .iter()
                .copied()
                .filter(|action| *action != greedy)
                .collect();
            if let Some(action) = others.choose(rng) {
                return *action;
            }
        }
        greedy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn default_actions() -> Vec<Action> {
        vec![Action::Stand, Action::Hit]
    }

    #[test]
    fn low_totals_always_hit() {
        let table = ValueTable::new();
        let strategy = EpsilonGreedy::new(1.0, default_actions());
        let mut rng = StdRng::seed_from_u64(3);
        for total in 4..=11 {
            for up_card in 1..=10 {
                let state = PlayerState::new(total, up_card, false);
                assert_eq!(strategy.make_decision(&table, &state, &mut rng), Action::Hit);
            }
        }
    }

    #[test]
    fn no_exploration_is_deterministic() {
        let mut table = ValueTable::new();
        let strategy = EpsilonGreedy::greedy(default_actions());
        let mut rng = StdRng::seed_from_u64(5);

        let tied = PlayerState::new(15, 7, false);
        let hit_better = PlayerState::new(13, 2, true);
        table[(hit_better, Action::Hit)] = 0.3;
        let on_21 = PlayerState::new(21, 9, false);

        for _ in 0..1_000 {
            assert_eq!(strategy.make_decision(&table, &tied, &mut rng), Action::Stand);
            assert_eq!(
                strategy.make_decision(&table, &hit_better, &mut rng),
                Action::Hit
            );
            assert_eq!(strategy.make_decision(&table, &on_21, &mut rng), Action::Stand);
        }
    }

    #[test]
    fn full_exploration_always_takes_other_action() {
        let table = ValueTable::new();
        let strategy = EpsilonGreedy::new(1.0, default_actions());
        let mut rng = StdRng::seed_from_u64(9);
        let state = PlayerState::new(18, 10, false);
        for _ in 0..100 {
            assert_eq!(strategy.make_decision(&table, &state, &mut rng), Action::Hit);
        }
    }

    #[test]
    fn exploration_rate_is_respected() {
        let table = ValueTable::new();
        let strategy = EpsilonGreedy::new(0.3, default_actions());
        let mut rng = StdRng::seed_from_u64(17);
        let state = PlayerState::new(16, 10, true);

        let explored = (0..10_000)
            .filter(|_| strategy.make_decision(&table, &state, &mut rng) == Action::Hit)
            .count();
        assert!((2_700..3_300).contains(&explored), "explored {}", explored);
    }

    #[test]
    fn action_order_breaks_ties() {
        let table = ValueTable::new();
        let strategy = EpsilonGreedy::greedy(vec![Action::Hit, Action::Stand]);
        let mut rng = StdRng::seed_from_u64(0);
        let state = PlayerState::new(19, 4, false);
        assert_eq!(strategy.make_decision(&table, &state, &mut rng), Action::Hit);
    }
}
