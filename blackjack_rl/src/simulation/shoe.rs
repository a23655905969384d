use std::collections::VecDeque;

use rand::Rng;

/// Card values of one suit: A, 2-9, and four ten-valued cards.
pub const CARD_COMPOSITION: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

/// Anything that can deal a card rank in [1, 10].
pub trait CardSource {
    fn draw(&mut self) -> u8;
}

/// Represents a shoe that is reshuffled after every card, so every draw is
/// independent and the shoe never runs out.
#[derive(Debug, Clone)]
pub struct InfiniteShoe<R: Rng> {
    rng: R,
}

impl<R: Rng> InfiniteShoe<R> {
    pub fn new(rng: R) -> Self {
        InfiniteShoe { rng }
    }
}

impl<R: Rng> CardSource for InfiniteShoe<R> {
    fn draw(&mut self) -> u8 {
        CARD_COMPOSITION[self.rng.gen_range(0..CARD_COMPOSITION.len())]
    }
}

/// Deals the given cards first, in order, then falls back to another source.
///
/// Cards are given in blackjack values (i.e., 1 stands for A, 10 stands for 10, J, Q and K).
#[derive(Debug, Clone)]
pub struct StackedShoe<S: CardSource> {
    firsts: VecDeque<u8>,
    fallback: S,
}

impl<S: CardSource> StackedShoe<S> {
    /// Panics if any of the given cards is not a valid card value.
    pub fn new(firsts: &[u8], fallback: S) -> Self {
        if let Some(card) = firsts.iter().find(|card| !(1..=10).contains(*card)) {
            panic!("Invalid card value {}! It must be in [1, 10]", card);
        }
        StackedShoe {
            firsts: firsts.iter().copied().collect(),
            fallback,
        }
    }

    pub fn remaining_stacked(&self) -> usize {
        self.firsts.len()
    }
}

impl<S: CardSource> CardSource for StackedShoe<S> {
    fn draw(&mut self) -> u8 {
        match self.firsts.pop_front() {
            Some(card) => card,
            None => self.fallback.draw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draws_follow_card_composition() {
        let mut shoe = InfiniteShoe::new(StdRng::seed_from_u64(42));
        let mut counts = [0u32; 11];
        let draws = 130_000;
        for _ in 0..draws {
            let card = shoe.draw();
            assert!((1..=10).contains(&card));
            counts[card as usize] += 1;
        }

        // Expect 10_000 of each small card and 40_000 tens.
        for card in 1..=9 {
            assert!(
                (9_000..11_000).contains(&counts[card]),
                "card {} drawn {} times",
                card,
                counts[card]
            );
        }
        assert!((38_000..42_000).contains(&counts[10]));
    }

    #[test]
    fn stacked_cards_come_first() {
        let fallback = InfiniteShoe::new(StdRng::seed_from_u64(1));
        let mut shoe = StackedShoe::new(&[1, 10, 6], fallback);
        assert_eq!(shoe.remaining_stacked(), 3);
        assert_eq!(shoe.draw(), 1);
        assert_eq!(shoe.draw(), 10);
        assert_eq!(shoe.draw(), 6);
        assert_eq!(shoe.remaining_stacked(), 0);

        let mut reference = InfiniteShoe::new(StdRng::seed_from_u64(1));
        for _ in 0..20 {
            assert_eq!(shoe.draw(), reference.draw());
        }
    }

    #[test]
    #[should_panic]
    fn invalid_stacked_card_should_panic() {
        let fallback = InfiniteShoe::new(StdRng::seed_from_u64(1));
        let _ = StackedShoe::new(&[3, 11], fallback);
    }
}
