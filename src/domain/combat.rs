// Weapon fire resolution: arcs, to-hit, armor penetration and the critical table.

use crate::domain::dice::Dice;
use crate::domain::hex::{Direction, Position};
use crate::domain::ship::{FiringArc, Ship, Weapon};
use crate::domain::tuning::{CRITICAL_DAMAGE, MAX_CHAIN_REACTIONS, SPLASH_DAMAGE};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticalKind {
    ReactorExplosion,
    ChainReaction,
    ArmorDamage,
    SpeedDamage,
    ManeuverDamage,
    NoEffect,
    BridgeHit,
}

impl CriticalKind {
    /// Critical table lookup for a 2d6 roll.
    pub fn from_roll(roll: u8) -> Self {
        match roll {
            2 => CriticalKind::ReactorExplosion,
            3 | 11 => CriticalKind::ChainReaction,
            4 | 8 => CriticalKind::ArmorDamage,
            5 | 9 => CriticalKind::SpeedDamage,
            6 | 10 => CriticalKind::ManeuverDamage,
            12 => CriticalKind::BridgeHit,
            _ => CriticalKind::NoEffect,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CriticalKind::ReactorExplosion => "reactor_explosion",
            CriticalKind::ChainReaction => "chain_reaction",
            CriticalKind::ArmorDamage => "armor_damage",
            CriticalKind::SpeedDamage => "speed_damage",
            CriticalKind::ManeuverDamage => "maneuver_damage",
            CriticalKind::NoEffect => "no_effect",
            CriticalKind::BridgeHit => "bridge_hit",
        }
    }
}

/// One resolved critical roll. Chained rolls carry increasing `depth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalOutcome {
    pub roll: u8,
    pub kind: CriticalKind,
    pub damage: u32,
    pub effects: Vec<String>,
    pub depth: u32,
}

/// Reactor blast effect on a nearby ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplashHit {
    pub ship_id: String,
    pub roll: u8,
    pub needed: u32,
    /// Armor failed to hold against the blast.
    pub damaged: bool,
    pub destroyed: bool,
}

/// A 2d6 check that succeeds when `roll > needed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRoll {
    pub roll: u8,
    pub needed: u32,
}

impl CheckRoll {
    fn roll(dice: &mut dyn Dice, needed: u32) -> Self {
        Self {
            roll: dice.roll_2d6(),
            needed,
        }
    }

    pub fn success(&self) -> bool {
        u32::from(self.roll) > self.needed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotResult {
    Miss,
    Deflected,
    Hit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaponResult {
    pub weapon_id: String,
    pub weapon_name: String,
    pub hit_check: CheckRoll,
    pub armor_check: Option<CheckRoll>,
    pub criticals: Vec<CriticalOutcome>,
    pub splash: Vec<SplashHit>,
    pub result: ShotResult,
    pub damage: u32,
    pub target_destroyed: bool,
    /// Set when resolution stopped early, e.g. on a runaway chain reaction.
    pub error: Option<String>,
}

/// Cells covered by a weapon arc from `origin` facing `facing`.
pub fn arc_cells(origin: Position, facing: Direction, arc: FiringArc, range: u32) -> Vec<Position> {
    let range = range as i32;
    let (left, right) = (facing.left(), facing.right());
    let mut cells = Vec::new();

    match arc {
        FiringArc::Narrow => {
            cells.extend((1..=range).map(|t| origin.offset(facing, t)));
        }
        FiringArc::Standard => {
            for t in 1..=range {
                let center = origin.offset(facing, t);
                cells.push(center);
                for i in 1..=(range - t) {
                    cells.push(center.offset(left, i));
                    cells.push(center.offset(right, i));
                }
            }
        }
        FiringArc::Wide => {
            cells.extend((1..=range).map(|t| origin.offset(facing, t)));
            let side = (range - 1).max(1);
            for i in 1..=side {
                cells.push(origin.offset(left, i));
                cells.push(origin.offset(right, i));
            }
        }
        FiringArc::Broadside => {
            for i in 1..=range {
                cells.push(origin.offset(left, i));
                cells.push(origin.offset(right, i));
            }
        }
    }

    let mut seen = HashSet::new();
    cells.retain(|cell| seen.insert(*cell));
    cells
}

pub fn in_arc(attacker: &Ship, weapon: &Weapon, target: Position) -> bool {
    arc_cells(attacker.position, attacker.facing, weapon.arc, weapon.range).contains(&target)
}

/// Live enemy ships inside the weapon's arc.
pub fn targets_in_arc<'a>(attacker: &Ship, weapon: &Weapon, roster: &'a [Ship]) -> Vec<&'a Ship> {
    let cells = arc_cells(attacker.position, attacker.facing, weapon.arc, weapon.range);
    roster
        .iter()
        .filter(|ship| ship.id != attacker.id && ship.owner != attacker.owner && ship.is_alive())
        .filter(|ship| cells.contains(&ship.position))
        .collect()
}

/// Resolves one weapon against `ships[target]`: to-hit, armor, then criticals.
pub fn resolve_weapon(
    weapon: &Weapon,
    target: usize,
    ships: &mut [Ship],
    dice: &mut dyn Dice,
) -> WeaponResult {
    let mut result = WeaponResult {
        weapon_id: weapon.id.clone(),
        weapon_name: weapon.name.clone(),
        hit_check: CheckRoll::roll(dice, ships[target].evasion()),
        armor_check: None,
        criticals: Vec::new(),
        splash: Vec::new(),
        result: ShotResult::Miss,
        damage: 0,
        target_destroyed: false,
        error: None,
    };

    if !result.hit_check.success() {
        return result;
    }

    let armor_check = CheckRoll::roll(dice, ships[target].effective_armor());
    result.armor_check = Some(armor_check);
    if !armor_check.success() {
        result.result = ShotResult::Deflected;
        return result;
    }

    let hp_before = ships[target].hp;
    let chain = resolve_criticals(target, ships, dice);
    result.result = ShotResult::Hit;
    result.criticals = chain.outcomes;
    result.splash = chain.splash;
    result.error = chain.error;
    result.damage = hp_before - ships[target].hp;
    result.target_destroyed = !ships[target].is_alive();
    result
}

struct CriticalChain {
    outcomes: Vec<CriticalOutcome>,
    splash: Vec<SplashHit>,
    error: Option<String>,
}

// Chain reactions re-roll on the same target until a non-chain result, the target dies,
// or the follow-up cap is reached.
fn resolve_criticals(target: usize, ships: &mut [Ship], dice: &mut dyn Dice) -> CriticalChain {
    let mut chain = CriticalChain {
        outcomes: Vec::new(),
        splash: Vec::new(),
        error: None,
    };
    let mut depth = 0;

    loop {
        let roll = dice.roll_2d6();
        let kind = CriticalKind::from_roll(roll);
        let hp_before = ships[target].hp;
        let mut effects = Vec::new();

        if kind == CriticalKind::ReactorExplosion {
            effects.push("reactor explosion".to_string());
            ships[target].destroy();
            let blast = reactor_blast(target, ships, dice);
            for hit in blast.iter().filter(|hit| hit.damaged) {
                effects.push(format!("{} caught in the blast", hit.ship_id));
            }
            chain.splash.extend(blast);
        } else {
            effects.extend(apply_critical(kind, &mut ships[target]));
        }

        let ship = &ships[target];
        if hp_before > 0 && !ship.is_alive() {
            effects.push(format!("{} destroyed", ship.class));
        }
        chain.outcomes.push(CriticalOutcome {
            roll,
            kind,
            damage: hp_before - ship.hp,
            effects,
            depth,
        });

        if kind != CriticalKind::ChainReaction || !ship.is_alive() {
            break;
        }
        if depth >= MAX_CHAIN_REACTIONS {
            chain.error = Some("chain reaction limit reached".to_string());
            break;
        }
        depth += 1;
    }

    chain
}

fn apply_critical(kind: CriticalKind, ship: &mut Ship) -> Vec<String> {
    match kind {
        CriticalKind::BridgeHit => {
            ship.destroy();
            vec!["direct hit on the bridge".to_string()]
        }
        CriticalKind::ChainReaction => {
            ship.apply_damage(CRITICAL_DAMAGE);
            vec!["chain reaction".to_string()]
        }
        CriticalKind::ArmorDamage => {
            ship.apply_damage(CRITICAL_DAMAGE);
            ship.armor_penalty += 1;
            vec!["armor damaged".to_string()]
        }
        CriticalKind::SpeedDamage => {
            ship.apply_damage(CRITICAL_DAMAGE);
            ship.current_speed = ship.current_speed.saturating_sub(1);
            ship.max_speed = ship.max_speed.saturating_sub(1);
            vec!["engines damaged".to_string()]
        }
        CriticalKind::ManeuverDamage => {
            ship.apply_damage(CRITICAL_DAMAGE);
            ship.current_maneuverability = ship.current_maneuverability.saturating_sub(1);
            ship.max_maneuverability = ship.max_maneuverability.saturating_sub(1);
            vec!["steering damaged".to_string()]
        }
        CriticalKind::NoEffect => {
            ship.apply_damage(CRITICAL_DAMAGE);
            Vec::new()
        }
        // Handled by the caller, which needs the whole roster.
        CriticalKind::ReactorExplosion => Vec::new(),
    }
}

// Every other live ship within max(1, activation - 1) of the exploding ship rolls armor
// and takes splash damage when the check fails.
fn reactor_blast(center: usize, ships: &mut [Ship], dice: &mut dyn Dice) -> Vec<SplashHit> {
    let origin = ships[center].position;
    let radius = u32::from(ships[center].activation.saturating_sub(1).max(1));

    let mut hits = Vec::new();
    for (index, ship) in ships.iter_mut().enumerate() {
        if index == center || !ship.is_alive() || ship.position.distance(&origin) > radius {
            continue;
        }
        let check = CheckRoll::roll(dice, ship.effective_armor());
        let damaged = !check.success();
        let destroyed = damaged && ship.apply_damage(SPLASH_DAMAGE);
        hits.push(SplashHit {
            ship_id: ship.id.clone(),
            roll: check.roll,
            needed: check.needed,
            damaged,
            destroyed,
        });
    }
    hits
}
