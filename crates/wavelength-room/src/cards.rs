//! Spectrum cards: where each round's pair of labels comes from.
//!
//! A room only ever asks its card source to reshuffle at game start and to
//! draw one card per round. [`CardSource`] is that seam; [`SpectrumDeck`]
//! is the built-in catalog.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use wavelength_protocol::Card;

/// Supplies a finite, shuffled sequence of spectrum cards.
pub trait CardSource: Send + 'static {
    /// Refills and reshuffles the deck. Called once per game start.
    ///
    /// `Some(seed)` must produce the same order every time.
    fn reset(&mut self, seed: Option<u64>);

    /// Takes the next card, or `None` once the deck is exhausted.
    fn draw(&mut self) -> Option<Card>;

    /// Returns `true` if no card is left to draw.
    fn is_exhausted(&self) -> bool;
}

/// The built-in label pairs, left end first.
const SPECTRUM: &[(&str, &str)] = &[
    ("Hot", "Cold"),
    ("Overrated", "Underrated"),
    ("Useless", "Useful"),
    ("Smells bad", "Smells good"),
    ("Hard to spell", "Easy to spell"),
    ("Villain", "Hero"),
    ("Boring", "Exciting"),
    ("Cheap", "Expensive"),
    ("Soft", "Hard"),
    ("Fantasy", "Sci-fi"),
    ("Round", "Pointy"),
    ("Quiet", "Loud"),
    ("Sad song", "Happy song"),
    ("Rough", "Smooth"),
    ("Ugly", "Beautiful"),
    ("Unhealthy", "Healthy"),
    ("Normal pet", "Exotic pet"),
    ("Easy job", "Hard job"),
    ("Forgettable", "Memorable"),
    ("Casual", "Formal"),
    ("Worst day of the week", "Best day of the week"),
    ("Mild", "Spicy"),
    ("Tastes bad", "Tastes good"),
    ("Underpaid", "Overpaid"),
    ("Dry", "Wet"),
    ("Light", "Heavy"),
    ("Safe", "Dangerous"),
    ("Old-fashioned", "Futuristic"),
    ("Small talk", "Deep conversation"),
    ("Introvert", "Extrovert"),
    ("Trashy", "Classy"),
    ("Short-lived", "Long-lived"),
    ("Bad superpower", "Good superpower"),
    ("Fragile", "Durable"),
    ("Guilty pleasure", "Openly loved"),
    ("Slow", "Fast"),
    ("Messy", "Tidy"),
    ("Sweet", "Savory"),
    ("Weird", "Normal"),
    ("Bad movie", "Good movie"),
];

/// A shuffled deck of the built-in spectrum catalog.
///
/// Starts empty; [`reset`](CardSource::reset) fills it.
#[derive(Debug, Default)]
pub struct SpectrumDeck {
    cards: Vec<Card>,
}

impl SpectrumDeck {
    /// Creates an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cards in the full catalog.
    pub fn catalog_len() -> usize {
        SPECTRUM.len()
    }
}

impl CardSource for SpectrumDeck {
    fn reset(&mut self, seed: Option<u64>) {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.cards = SPECTRUM
            .iter()
            .map(|(left, right)| Card::new(*left, *right))
            .collect();
        self.cards.shuffle(&mut rng);
    }

    fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    fn is_exhausted(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_spectrum_deck_new_is_exhausted_until_reset() {
        let mut deck = SpectrumDeck::new();
        assert!(deck.is_exhausted());
        assert_eq!(deck.draw(), None);

        deck.reset(Some(1));
        assert!(!deck.is_exhausted());
    }

    #[test]
    fn test_spectrum_deck_draws_every_card_once() {
        let mut deck = SpectrumDeck::new();
        deck.reset(None);

        let mut seen = HashSet::new();
        while let Some(card) = deck.draw() {
            assert!(seen.insert(card), "card drawn twice");
        }
        assert_eq!(seen.len(), SpectrumDeck::catalog_len());
        assert!(deck.is_exhausted());
    }

    #[test]
    fn test_spectrum_deck_same_seed_same_order() {
        let mut a = SpectrumDeck::new();
        let mut b = SpectrumDeck::new();
        a.reset(Some(42));
        b.reset(Some(42));

        for _ in 0..SpectrumDeck::catalog_len() {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn test_spectrum_deck_reset_refills_partial_deck() {
        let mut deck = SpectrumDeck::new();
        deck.reset(Some(7));
        deck.draw();
        deck.draw();

        deck.reset(Some(7));

        let mut count = 0;
        while deck.draw().is_some() {
            count += 1;
        }
        assert_eq!(count, SpectrumDeck::catalog_len());
    }
}
