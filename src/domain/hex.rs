// Cube-coordinate hex geometry shared by placement, movement and firing arcs.

use crate::domain::tuning::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};

/// Cell on the hex grid in cube coordinates. Valid cells satisfy `q + r + s == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl Position {
    /// Largest coordinate magnitude accepted from outside the engine.
    pub const MAX_COORDINATE: i32 = 10_000;

    /// Builds a cell from axial coordinates, deriving `s`.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Builds a cell from raw cube coordinates, rejecting ones off the `q + r + s = 0` plane.
    pub fn from_cube(q: i32, r: i32, s: i32) -> Option<Self> {
        let position = Self { q, r, s };
        position.is_valid().then_some(position)
    }

    pub const fn origin() -> Self {
        Self::new(0, 0)
    }

    pub fn is_valid(&self) -> bool {
        i64::from(self.q) + i64::from(self.r) + i64::from(self.s) == 0
    }

    /// Axial or cube coordinates from an untrusted source. Rejects magnitudes past
    /// `MAX_COORDINATE` and triples off the `q + r + s = 0` plane.
    pub fn checked(q: i32, r: i32, s: Option<i32>) -> Option<Self> {
        let in_range = |v: i32| v.unsigned_abs() <= Self::MAX_COORDINATE.unsigned_abs();
        if !in_range(q) || !in_range(r) {
            return None;
        }
        match s {
            Some(s) if in_range(s) => Self::from_cube(q, r, s),
            Some(_) => None,
            None => Some(Self::new(q, r)),
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Self {
        self.offset(direction, 1)
    }

    /// Cell `steps` cells away along `direction`.
    pub fn offset(&self, direction: Direction, steps: i32) -> Self {
        let (dq, dr, ds) = direction.vector();
        Self {
            q: self.q + dq * steps,
            r: self.r + dr * steps,
            s: self.s + ds * steps,
        }
    }

    pub fn distance(&self, other: &Position) -> u32 {
        let total = (self.q - other.q).unsigned_abs()
            + (self.r - other.r).unsigned_abs()
            + (self.s - other.s).unsigned_abs();
        total / 2
    }
}

/// One of the six hex facings, clockwise starting from West.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    West,
    NorthWest,
    NorthEast,
    East,
    SouthEast,
    SouthWest,
}

/// A single 60 degree rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::West => 0,
            Direction::NorthWest => 1,
            Direction::NorthEast => 2,
            Direction::East => 3,
            Direction::SouthEast => 4,
            Direction::SouthWest => 5,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    /// Unit step in cube coordinates.
    pub fn vector(self) -> (i32, i32, i32) {
        match self {
            Direction::West => (-1, 0, 1),
            Direction::NorthWest => (0, -1, 1),
            Direction::NorthEast => (1, -1, 0),
            Direction::East => (1, 0, -1),
            Direction::SouthEast => (0, 1, -1),
            Direction::SouthWest => (-1, 1, 0),
        }
    }

    pub fn rotated(self, turn: Turn) -> Self {
        match turn {
            Turn::Right => Self::from_index(self.index() + 1),
            Turn::Left => Self::from_index(self.index() + 5),
        }
    }

    pub fn left(self) -> Self {
        self.rotated(Turn::Left)
    }

    pub fn right(self) -> Self {
        self.rotated(Turn::Right)
    }

    /// Signed minimal rotation from `self` to `target` in 60 degree steps.
    /// Positive is clockwise; a half turn is reported as `3`.
    pub fn steps_to(self, target: Direction) -> i32 {
        let diff = (target.index() as i32 - self.index() as i32).rem_euclid(6);
        if diff <= 3 { diff } else { diff - 6 }
    }

    pub fn turns_to(self, target: Direction) -> u32 {
        self.steps_to(target).unsigned_abs()
    }

    /// Facing that best points from `from` towards `to`.
    ///
    /// Picks the direction whose unit vector has the largest dot product with the
    /// displacement. Ties go to the direction needing the fewest turns from `current`,
    /// then to the lower direction index. Returns `None` when both cells coincide.
    pub fn bearing(from: Position, to: Position, current: Direction) -> Option<Direction> {
        if from == to {
            return None;
        }
        let (dq, dr, ds) = (to.q - from.q, to.r - from.r, to.s - from.s);

        let mut best: Option<(i32, u32, Direction)> = None;
        for direction in Self::ALL {
            let (vq, vr, vs) = direction.vector();
            let dot = dq * vq + dr * vr + ds * vs;
            let turns = current.turns_to(direction);
            let better = match best {
                None => true,
                Some((best_dot, best_turns, _)) => {
                    dot > best_dot || (dot == best_dot && turns < best_turns)
                }
            };
            if better {
                best = Some((dot, turns, direction));
            }
        }
        best.map(|(_, _, direction)| direction)
    }
}

/// Rhombus-shaped playing field of `width * height` cells centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBounds {
    pub width: u32,
    pub height: u32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: DEFAULT_MAP_WIDTH,
            height: DEFAULT_MAP_HEIGHT,
        }
    }
}

impl MapBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn axis_range(size: u32) -> (i32, i32) {
        let size = size as i32;
        let min = -(size / 2);
        (min, min + size - 1)
    }

    pub fn contains(&self, position: &Position) -> bool {
        let (min_q, max_q) = Self::axis_range(self.width);
        let (min_r, max_r) = Self::axis_range(self.height);
        position.is_valid()
            && (min_q..=max_q).contains(&position.q)
            && (min_r..=max_r).contains(&position.r)
    }
}
