// Elimination check run after every hp-changing mutation.

use crate::domain::PlayerId;
use crate::domain::ship::Ship;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Victory {
    pub winners: Vec<PlayerId>,
    pub losers: Vec<PlayerId>,
}

impl Victory {
    pub fn is_draw(&self) -> bool {
        self.winners.is_empty()
    }
}

/// Returns the outcome once at least one participant has no surviving ships.
/// When everybody is eliminated at once the match is a draw with no winners.
pub fn evaluate(players: &[PlayerId], ships: &[Ship]) -> Option<Victory> {
    let (winners, losers): (Vec<PlayerId>, Vec<PlayerId>) = players
        .iter()
        .copied()
        .partition(|player| ships.iter().any(|ship| ship.owner == *player && ship.is_alive()));

    if losers.is_empty() {
        return None;
    }
    Some(Victory { winners, losers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ship::ShipClass;
    use crate::domain::test_support::ship_at;

    #[test]
    fn when_both_sides_have_ships_then_no_victory() {
        let ships = vec![
            ship_at("a", 1, ShipClass::Frigate, 0, 0),
            ship_at("b", 2, ShipClass::Frigate, 3, 0),
        ];
        assert_eq!(evaluate(&[1, 2], &ships), None);
    }

    #[test]
    fn when_one_side_is_eliminated_then_the_other_wins() {
        let mut lost = ship_at("a", 1, ShipClass::Frigate, 0, 0);
        lost.destroy();
        let ships = vec![lost, ship_at("b", 2, ShipClass::Frigate, 3, 0)];
        assert_eq!(
            evaluate(&[1, 2], &ships),
            Some(Victory {
                winners: vec![2],
                losers: vec![1],
            })
        );
    }

    #[test]
    fn when_everyone_is_eliminated_then_the_result_is_a_draw() {
        let mut a = ship_at("a", 1, ShipClass::Frigate, 0, 0);
        let mut b = ship_at("b", 2, ShipClass::Frigate, 3, 0);
        a.destroy();
        b.destroy();
        let victory = evaluate(&[1, 2], &[a, b]).expect("draw should end the match");
        assert!(victory.is_draw());
        assert_eq!(victory.losers, vec![1, 2]);
    }
}
