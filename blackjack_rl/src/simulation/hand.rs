use super::shoe::CardSource;

pub const BLACKJACK: u8 = 21;
pub const DEALER_STAND_THRESHOLD: u8 = 17;
const FLEX_BONUS: u8 = 10;

/// Running total of a hand. At most one Ace is counted as 11 at any time, and
/// only while that keeps the total at or below 21.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hand {
    total: u8,
    usable_flex: bool,
    number_of_cards: u8,
}

impl Hand {
    pub fn new() -> Hand {
        Default::default()
    }

    /// Evaluates a two-card starting hand.
    pub fn with_initial_cards(first: u8, second: u8) -> Hand {
        let mut hand = Hand::new();
        hand.receive_card(first);
        hand.receive_card(second);
        hand
    }

    /// Adds a card of the given card value.
    ///
    /// Note that this method won't check if the card value is valid.
    pub fn receive_card(&mut self, card_value: u8) {
        self.number_of_cards += 1;
        if card_value == 1 && !self.usable_flex && self.total + 1 + FLEX_BONUS <= BLACKJACK {
            self.total += 1 + FLEX_BONUS;
            self.usable_flex = true;
        } else {
            self.total += card_value;
        }

        if self.total > BLACKJACK && self.usable_flex {
            self.total -= FLEX_BONUS;
            self.usable_flex = false;
        }
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    pub fn is_soft(&self) -> bool {
        self.usable_flex
    }

    pub fn number_of_cards(&self) -> u8 {
        self.number_of_cards
    }

    pub fn bust(&self) -> bool {
        self.total > BLACKJACK
    }

    pub fn is_natural(&self) -> bool {
        self.number_of_cards == 2 && self.total == BLACKJACK
    }

    pub fn clear(&mut self) {
        *self = Hand::new();
    }
}

/// The dealer's hand together with its fixed drawing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DealerHand {
    hand: Hand,
    up_card: u8,
    busted: bool,
}

impl DealerHand {
    pub fn with_initial_cards(up_card: u8, hole_card: u8) -> DealerHand {
        DealerHand {
            hand: Hand::with_initial_cards(up_card, hole_card),
            up_card,
            busted: false,
        }
    }

    /// Draws until the total reaches 17, standing on soft 17 too. Returns the
    /// number of cards drawn.
    ///
    /// A hand that already stands at 17 or more draws nothing and is never
    /// marked busted.
    pub fn play<S: CardSource + ?Sized>(&mut self, shoe: &mut S) -> u8 {
        if self.hand.total() >= DEALER_STAND_THRESHOLD {
            return 0;
        }

        let mut drawn = 0;
        while self.hand.total() < DEALER_STAND_THRESHOLD {
            self.hand.receive_card(shoe.draw());
            drawn += 1;
        }
        self.busted = self.hand.bust();
        drawn
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn up_card(&self) -> u8 {
        self.up_card
    }

    pub fn total(&self) -> u8 {
        self.hand.total()
    }

    pub fn busted(&self) -> bool {
        self.busted
    }

    pub fn is_natural(&self) -> bool {
        self.hand.is_natural()
    }

    pub fn clear(&mut self) {
        *self = DealerHand::default();
    }
}
