// Reachability search for ship movement under speed and maneuver allowances.

use crate::domain::hex::{Direction, MapBounds, Position, Turn};
use crate::domain::ship::Ship;
use std::collections::{HashSet, VecDeque};

/// Cost and outcome of moving a ship to one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub destination: Position,
    pub speed_cost: u32,
    pub maneuver_cost: u32,
    pub facing: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SearchState {
    position: Position,
    facing: Direction,
    speed: u32,
    maneuver: u32,
    free_turn: bool,
}

fn blocked_cells(ship: &Ship, roster: &[Ship]) -> HashSet<Position> {
    roster
        .iter()
        .filter(|other| other.id != ship.id && other.is_alive())
        .map(|other| other.position)
        .collect()
}

/// Every cell the ship can end its move on, excluding its current cell.
///
/// Breadth-first over (cell, facing, speed left, maneuver left, free turn). A forward
/// step costs one speed and grants a free turn; a turn is only possible while maneuver
/// is left and costs one point unless the free turn is spent instead.
pub fn reachable_cells(ship: &Ship, roster: &[Ship], bounds: &MapBounds) -> Vec<Position> {
    let blocked = blocked_cells(ship, roster);
    let origin = ship.position;

    let start = SearchState {
        position: origin,
        facing: ship.facing,
        speed: ship.current_speed,
        maneuver: ship.current_maneuverability,
        free_turn: ship.free_turn,
    };

    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut reachable = HashSet::new();

    while let Some(state) = queue.pop_front() {
        let mut next_states = Vec::with_capacity(3);

        if state.speed > 0 {
            let next = state.position.neighbor(state.facing);
            if bounds.contains(&next) && !blocked.contains(&next) {
                if next != origin {
                    reachable.insert(next);
                }
                next_states.push(SearchState {
                    position: next,
                    speed: state.speed - 1,
                    free_turn: true,
                    ..state
                });
            }
        }

        if state.maneuver > 0 {
            let maneuver = if state.free_turn {
                state.maneuver
            } else {
                state.maneuver - 1
            };
            for turn in [Turn::Left, Turn::Right] {
                next_states.push(SearchState {
                    facing: state.facing.rotated(turn),
                    maneuver,
                    free_turn: false,
                    ..state
                });
            }
        }

        for next in next_states {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let mut cells: Vec<Position> = reachable.into_iter().collect();
    cells.sort();
    cells
}

/// Plans a move to `target`, or `None` if the cell is not reachable.
pub fn plan_move(
    ship: &Ship,
    roster: &[Ship],
    bounds: &MapBounds,
    target: Position,
) -> Option<MovePlan> {
    if !reachable_cells(ship, roster, bounds).contains(&target) {
        return None;
    }

    let bearing = Direction::bearing(ship.position, target, ship.facing)?;
    let turns = ship.facing.turns_to(bearing);
    let maneuver_cost = if ship.free_turn { 0 } else { turns };
    let facing = if turns > 0 { bearing } else { ship.facing };

    Some(MovePlan {
        destination: target,
        speed_cost: ship.position.distance(&target),
        maneuver_cost,
        facing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ship::ShipClass;
    use crate::domain::test_support::ship_at;

    fn mover(speed: u32, maneuver: u32) -> Ship {
        let mut ship = ship_at("mover", 1, ShipClass::Cruiser, 0, 0);
        ship.current_speed = speed;
        ship.current_maneuverability = maneuver;
        ship
    }

    #[test]
    fn when_ship_has_no_maneuver_then_only_the_forward_ray_is_reachable() {
        let ship = mover(3, 0);
        let cells = reachable_cells(&ship, std::slice::from_ref(&ship), &MapBounds::default());
        assert_eq!(
            cells,
            vec![Position::new(1, 0), Position::new(2, 0), Position::new(3, 0)]
        );
    }

    #[test]
    fn when_a_live_ship_blocks_the_ray_then_cells_behind_it_are_unreachable() {
        let ship = mover(3, 0);
        let blocker = ship_at("blocker", 2, ShipClass::Frigate, 2, 0);
        let roster = vec![ship.clone(), blocker];
        let cells = reachable_cells(&ship, &roster, &MapBounds::default());
        assert_eq!(cells, vec![Position::new(1, 0)]);
    }

    #[test]
    fn when_the_blocking_ship_is_destroyed_then_it_no_longer_blocks() {
        let ship = mover(3, 0);
        let mut wreck = ship_at("wreck", 2, ShipClass::Frigate, 2, 0);
        wreck.destroy();
        let roster = vec![ship.clone(), wreck];
        let cells = reachable_cells(&ship, &roster, &MapBounds::default());
        assert_eq!(cells.len(), 3);
    }

    #[test]
    fn when_the_ray_leaves_the_map_then_search_stops_at_the_edge() {
        let mut ship = mover(5, 0);
        ship.position = Position::new(8, 0);
        let cells = reachable_cells(&ship, std::slice::from_ref(&ship), &MapBounds::default());
        assert_eq!(cells, vec![Position::new(9, 0)]);
    }

    #[test]
    fn when_ship_can_turn_then_cells_off_the_forward_ray_are_reachable() {
        let ship = mover(2, 1);
        let cells = reachable_cells(&ship, std::slice::from_ref(&ship), &MapBounds::default());
        // Turn first, then advance twice.
        assert!(cells.contains(&Position::new(0, 2)));
        // Advance, take the free turn, advance again.
        assert!(cells.contains(&Position::new(1, 1)));
        assert!(cells.contains(&Position::new(2, -1)));
        assert!(!cells.contains(&Position::origin()));
    }

    #[test]
    fn when_planning_a_straight_move_then_only_speed_is_charged() {
        let ship = mover(3, 1);
        let plan = plan_move(
            &ship,
            std::slice::from_ref(&ship),
            &MapBounds::default(),
            Position::new(3, 0),
        )
        .expect("straight move should be legal");
        assert_eq!(plan.speed_cost, 3);
        assert_eq!(plan.maneuver_cost, 0);
        assert_eq!(plan.facing, Direction::East);
    }

    #[test]
    fn when_planning_a_turned_move_then_maneuver_is_charged_unless_a_free_turn_is_held() {
        let mut ship = mover(3, 1);
        let target = Position::new(0, 2);
        let plan = plan_move(&ship, std::slice::from_ref(&ship), &MapBounds::default(), target)
            .expect("turned move should be legal");
        assert_eq!(plan.speed_cost, 2);
        assert_eq!(plan.maneuver_cost, 1);
        assert_eq!(plan.facing, Direction::SouthEast);

        ship.free_turn = true;
        let plan = plan_move(&ship, std::slice::from_ref(&ship), &MapBounds::default(), target)
            .expect("turned move should be legal");
        assert_eq!(plan.maneuver_cost, 0);
    }

    #[test]
    fn when_target_is_unreachable_then_no_plan_is_returned() {
        let ship = mover(3, 0);
        let plan = plan_move(
            &ship,
            std::slice::from_ref(&ship),
            &MapBounds::default(),
            Position::new(-1, 0),
        );
        assert!(plan.is_none());
    }
}
