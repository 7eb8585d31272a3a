// Dice sources and the per-round activation pool.

use crate::domain::tuning::MIN_ACTIVATION_FACE;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of six-sided die rolls.
pub trait Dice: Send + Sync {
    fn d6(&mut self) -> u8;

    fn roll_2d6(&mut self) -> u8 {
        self.d6() + self.d6()
    }

    /// Pick in `0..len`; used for the first placement turn.
    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        usize::from(self.d6().saturating_sub(1)) % len
    }
}

/// Dice backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomDice<R> {
    rng: R,
}

impl<R: Rng> RandomDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDice<SmallRng> {
    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send + Sync> Dice for RandomDice<R> {
    fn d6(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Dice a participant rolled for the current round, tallied by face.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DicePool {
    counts: [u32; 6],
    /// Unspent ones carried over from the previous round.
    pub saved_ones: u32,
}

impl DicePool {
    /// Rolls `size` dice on top of `carried_ones` seeded into the value-1 bucket.
    pub fn roll(size: u32, carried_ones: u32, dice: &mut dyn Dice) -> Self {
        let mut counts = [0u32; 6];
        counts[0] = carried_ones;
        for _ in 0..size {
            let face = dice.d6().clamp(1, 6);
            counts[usize::from(face - 1)] += 1;
        }
        Self {
            counts,
            saved_ones: carried_ones,
        }
    }

    pub fn from_counts(counts: [u32; 6]) -> Self {
        Self {
            counts,
            saved_ones: 0,
        }
    }

    pub fn counts(&self) -> [u32; 6] {
        self.counts
    }

    pub fn count(&self, face: u8) -> u32 {
        match face {
            1..=6 => self.counts[usize::from(face - 1)],
            _ => 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn unspent_ones(&self) -> u32 {
        self.counts[0]
    }

    /// Smallest available face that meets `threshold`. Ones never qualify.
    pub fn lowest_face_at_least(&self, threshold: u8) -> Option<u8> {
        (threshold.max(MIN_ACTIVATION_FACE)..=6).find(|&face| self.count(face) > 0)
    }

    /// Removes one die showing `face`; false if none is left.
    pub fn take(&mut self, face: u8) -> bool {
        match face {
            1..=6 if self.counts[usize::from(face - 1)] > 0 => {
                self.counts[usize::from(face - 1)] -= 1;
                true
            }
            _ => false,
        }
    }
}
