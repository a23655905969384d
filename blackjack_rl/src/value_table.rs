use std::ops::{Index, IndexMut, RangeInclusive};

use strum::IntoEnumIterator;

use crate::{Action, PlayerState};

pub const PLAYER_TOTALS: RangeInclusive<u8> = 12..=21;
pub const DEALER_UP_CARDS: RangeInclusive<u8> = 1..=10;
const USABLE_FLEX: [bool; 2] = [true, false];
const NUMBER_OF_ACTIONS: usize = 2;
const NUMBER_OF_STATES: usize =
    range_len(&PLAYER_TOTALS) * range_len(&DEALER_UP_CARDS) * USABLE_FLEX.len();
const TABLE_SIZE: usize = NUMBER_OF_STATES * NUMBER_OF_ACTIONS;

/// Estimates are stored with this many decimal places.
const PRECISION: f64 = 10_000.0;

const fn range_len(range: &RangeInclusive<u8>) -> usize {
    (*range.end() - *range.start() + 1) as usize
}

/// Rounds half away from zero to 4 decimal places.
pub fn round_to_precision(value: f64) -> f64 {
    (value * PRECISION).round() / PRECISION
}

/// Learned action values over every (state, action) pair the player can decide on.
///
/// The domain is fixed at construction. Indexing outside of it panics, since a
/// silently defaulted entry would corrupt learning. Use [`ValueTable::get`] for a
/// checked lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    data: [f64; TABLE_SIZE],
}

impl ValueTable {
    /// Every entry starts at 0, except standing on 21 which starts at 1.
    pub fn new() -> ValueTable {
        let mut table = ValueTable {
            data: [0.0; TABLE_SIZE],
        };
        for (state, action) in Self::domain() {
            if state.player_total == *PLAYER_TOTALS.end() && action == Action::Stand {
                table[(state, action)] = 1.0;
            }
        }
        table
    }

    /// The Cartesian product player total × dealer up card × usable flex × action.
    pub fn domain() -> impl Iterator<Item = (PlayerState, Action)> {
        PLAYER_TOTALS.flat_map(|player_total| {
            DEALER_UP_CARDS.flat_map(move |dealer_up_card| {
                USABLE_FLEX.into_iter().flat_map(move |usable_flex| {
                    Action::iter().map(move |action| {
                        (
                            PlayerState::new(player_total, dealer_up_card, usable_flex),
                            action,
                        )
                    })
                })
            })
        })
    }

    pub fn contains_state(state: &PlayerState) -> bool {
        PLAYER_TOTALS.contains(&state.player_total)
            && DEALER_UP_CARDS.contains(&state.dealer_up_card)
    }

    /// Number of (state, action) entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Number of distinct player states, each holding one entry per action.
    pub fn number_of_states(&self) -> usize {
        NUMBER_OF_STATES
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, state: &PlayerState, action: Action) -> Option<f64> {
        checked_index(state, action).map(|i| self.data[i])
    }

    /// All entries in domain order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerState, Action, f64)> + '_ {
        Self::domain().map(|(state, action)| (state, action, self[(state, action)]))
    }

    /// Best action among `actions` for `state`. Ties go to the earliest action.
    ///
    /// Panics if `actions` is empty or `state` is out of the table's domain.
    pub fn greedy_action(&self, state: &PlayerState, actions: &[Action]) -> Action {
        let mut best = actions[0];
        let mut best_value = self[(*state, best)];
        for &action in &actions[1..] {
            let value = self[(*state, action)];
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    /// Propagates a terminal `reward` back through `trajectory`, last pair first.
    ///
    /// Each entry moves toward the running target by `learning_rate` and is stored
    /// rounded. The unrounded estimate, scaled by `discount_rate`, becomes the
    /// target of the pair visited before it.
    pub fn backward_update(
        &mut self,
        trajectory: &[(PlayerState, Action)],
        reward: f64,
        learning_rate: f64,
        discount_rate: f64,
    ) {
        let mut target = reward;
        for &(state, action) in trajectory.iter().rev() {
            let current = self[(state, action)];
            let estimate = current + learning_rate * (target - current);
            self[(state, action)] = round_to_precision(estimate);
            target = discount_rate * estimate;
        }
    }
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_index(state: &PlayerState, action: Action) -> Option<usize> {
    if !ValueTable::contains_state(state) {
        return None;
    }
    let total = (state.player_total - PLAYER_TOTALS.start()) as usize;
    let up_card = (state.dealer_up_card - DEALER_UP_CARDS.start()) as usize;
    let flex = if state.usable_flex { 0 } else { 1 };
    let action = match action {
        Action::Stand => 0,
        Action::Hit => 1,
    };
    let row = (total * range_len(&DEALER_UP_CARDS) + up_card) * USABLE_FLEX.len() + flex;
    Some(row * NUMBER_OF_ACTIONS + action)
}

fn index_of(state: &PlayerState, action: Action) -> usize {
    match checked_index(state, action) {
        Some(index) => index,
        None => panic!("Invalid state {:?} is outside of the value table", state),
    }
}

impl Index<(PlayerState, Action)> for ValueTable {
    type Output = f64;
    fn index(&self, (state, action): (PlayerState, Action)) -> &Self::Output {
        &self.data[index_of(&state, action)]
    }
}

impl IndexMut<(PlayerState, Action)> for ValueTable {
    fn index_mut(&mut self, (state, action): (PlayerState, Action)) -> &mut Self::Output {
        &mut self.data[index_of(&state, action)]
    }
}
