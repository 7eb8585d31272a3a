use std::collections::VecDeque;

use crate::domain::dice::Dice;
use crate::domain::hex::{Direction, Position};
use crate::domain::ship::{Ship, ShipClass};
use crate::domain::PlayerId;

// Deterministic dice: single faces and 2d6 sums come from separate scripts.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDice {
    faces: VecDeque<u8>,
    sums: VecDeque<u8>,
}

impl ScriptedDice {
    pub(crate) fn d6(faces: &[u8]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
            sums: VecDeque::new(),
        }
    }

    pub(crate) fn sums(sums: &[u8]) -> Self {
        Self {
            faces: VecDeque::new(),
            sums: sums.iter().copied().collect(),
        }
    }

    pub(crate) fn with_sums(mut self, sums: &[u8]) -> Self {
        self.sums.extend(sums.iter().copied());
        self
    }

    pub(crate) fn remaining_sums(&self) -> usize {
        self.sums.len()
    }
}

impl Dice for ScriptedDice {
    fn d6(&mut self) -> u8 {
        self.faces.pop_front().expect("scripted d6 exhausted")
    }

    fn roll_2d6(&mut self) -> u8 {
        self.sums.pop_front().expect("scripted 2d6 exhausted")
    }
}

pub(crate) fn ship_at(id: &str, owner: PlayerId, class: ShipClass, q: i32, r: i32) -> Ship {
    Ship::new(
        id.to_string(),
        owner,
        class,
        format!("{class}-project"),
        Position::new(q, r),
        Direction::East,
        class.base_stats(),
    )
}
