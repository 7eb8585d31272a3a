// Ship classes, catalog projects and the live ship state mutated during a battle.

use crate::domain::PlayerId;
use crate::domain::hex::{Direction, Position};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipClass {
    Frigate,
    Destroyer,
    Cruiser,
    Battleship,
    Dreadnought,
}

/// Per-class defaults used when a project does not override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipStats {
    pub speed: u32,
    pub maneuverability: u32,
    pub armor: u32,
    /// Lowest die face that activates the ship; also its hit points.
    pub activation: u8,
}

impl ShipClass {
    pub const ALL: [ShipClass; 5] = [
        ShipClass::Frigate,
        ShipClass::Destroyer,
        ShipClass::Cruiser,
        ShipClass::Battleship,
        ShipClass::Dreadnought,
    ];

    /// Accepts English names and the legacy Russian class names, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "frigate" | "фрегат" => Some(ShipClass::Frigate),
            "destroyer" | "эсминец" => Some(ShipClass::Destroyer),
            "cruiser" | "крейсер" => Some(ShipClass::Cruiser),
            "battleship" | "линкор" => Some(ShipClass::Battleship),
            "dreadnought" | "дредноут" => Some(ShipClass::Dreadnought),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipClass::Frigate => "frigate",
            ShipClass::Destroyer => "destroyer",
            ShipClass::Cruiser => "cruiser",
            ShipClass::Battleship => "battleship",
            ShipClass::Dreadnought => "dreadnought",
        }
    }

    pub fn base_stats(self) -> ShipStats {
        let (speed, armor, activation) = match self {
            ShipClass::Frigate => (5, 5, 2),
            ShipClass::Destroyer => (4, 6, 3),
            ShipClass::Cruiser => (3, 7, 4),
            ShipClass::Battleship => (2, 8, 5),
            ShipClass::Dreadnought => (1, 9, 6),
        };
        ShipStats {
            speed,
            maneuverability: 1,
            armor,
            activation,
        }
    }

    pub fn weapons(self) -> Vec<Weapon> {
        use FiringArc::{Narrow, Standard, Wide};
        let table: &[(&str, &str, u32, u32, FiringArc)] = match self {
            ShipClass::Frigate => &[("frigate_gun_1", "Light gun", 1, 3, Standard)],
            ShipClass::Destroyer => &[
                ("destroyer_gun_1", "Main gun", 2, 4, Standard),
                ("destroyer_gun_2", "Flak gun", 1, 2, Wide),
            ],
            ShipClass::Cruiser => &[
                ("cruiser_gun_1", "Heavy gun #1", 2, 4, Narrow),
                ("cruiser_gun_2", "Heavy gun #2", 2, 4, Narrow),
                ("cruiser_sec_1", "Secondary #1", 1, 3, Wide),
            ],
            ShipClass::Battleship => &[
                ("battleship_main_1", "Main battery #1", 3, 5, Narrow),
                ("battleship_main_2", "Main battery #2", 3, 5, Narrow),
                ("battleship_sec_1", "Medium battery #1", 2, 4, Wide),
                ("battleship_sec_2", "Medium battery #2", 2, 4, Wide),
            ],
            ShipClass::Dreadnought => &[
                ("dread_main_1", "Super-heavy gun #1", 4, 6, Narrow),
                ("dread_main_2", "Super-heavy gun #2", 4, 6, Narrow),
                ("dread_main_3", "Super-heavy gun #3", 4, 6, Narrow),
            ],
        };
        table
            .iter()
            .map(|&(id, name, damage, range, arc)| Weapon {
                id: id.to_string(),
                name: name.to_string(),
                damage,
                range,
                arc,
            })
            .collect()
    }
}

impl fmt::Display for ShipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringArc {
    Narrow,
    Standard,
    Wide,
    Broadside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub damage: u32,
    pub range: u32,
    pub arc: FiringArc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipStatus {
    Ready,
    Activated,
    Spent,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Speed,
    Maneuverability,
    Armor,
}

/// Numeric effect of an installed module, parsed from its effect text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatModifier {
    pub stat: StatKind,
    pub delta: i32,
}

impl StatModifier {
    /// Parses effect text shaped like `+1 speed` or `-1 к манёвренности`.
    /// Text that names no known stat yields `None`.
    pub fn parse(effect: &str) -> Option<Self> {
        let mut parts = effect.trim().splitn(2, char::is_whitespace);
        let delta = parts.next()?.parse::<i32>().ok()?;
        let rest = parts.next()?.to_lowercase();

        let stat = if rest.contains("speed") || rest.contains("скорост") {
            StatKind::Speed
        } else if rest.contains("maneuver")
            || rest.contains("manoeuvr")
            || rest.contains("манёвр")
            || rest.contains("маневр")
        {
            StatKind::Maneuverability
        } else if rest.contains("armor") || rest.contains("armour") || rest.contains("брон") {
            StatKind::Armor
        } else {
            return None;
        };

        Some(Self { stat, delta })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub effect: String,
    pub cost: u32,
}

/// Design-time ship blueprint from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipProject {
    pub id: String,
    pub name: String,
    pub class: ShipClass,
    pub speed: Option<u32>,
    pub maneuverability: Option<u32>,
    pub armor: Option<u32>,
    pub activation: Option<u8>,
    pub modules: Vec<Module>,
}

impl ShipProject {
    /// Class stats, overridden by the project's own values, then shifted by module effects.
    pub fn resolve_stats(&self) -> ShipStats {
        let base = self.class.base_stats();
        let mut speed = i64::from(self.speed.unwrap_or(base.speed));
        let mut maneuverability = i64::from(self.maneuverability.unwrap_or(base.maneuverability));
        let mut armor = i64::from(self.armor.unwrap_or(base.armor));

        for modifier in self
            .modules
            .iter()
            .filter_map(|module| StatModifier::parse(&module.effect))
        {
            let delta = i64::from(modifier.delta);
            match modifier.stat {
                StatKind::Speed => speed += delta,
                StatKind::Maneuverability => maneuverability += delta,
                StatKind::Armor => armor += delta,
            }
        }

        ShipStats {
            speed: speed.max(0) as u32,
            maneuverability: maneuverability.max(0) as u32,
            armor: armor.max(0) as u32,
            activation: self.activation.unwrap_or(base.activation).clamp(1, 6),
        }
    }
}

/// A ship placed on the battle map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    pub id: String,
    pub owner: PlayerId,
    pub class: ShipClass,
    pub project_id: String,
    pub position: Position,
    pub facing: Direction,
    pub hp: u32,
    pub max_hp: u32,
    pub armor: u32,
    pub armor_penalty: u32,
    pub current_speed: u32,
    pub max_speed: u32,
    pub current_maneuverability: u32,
    pub max_maneuverability: u32,
    pub activation: u8,
    pub status: ShipStatus,
    pub used_weapons: HashSet<String>,
    pub weapons: Vec<Weapon>,
    /// Set after a forward move; the next turn costs no maneuverability.
    pub free_turn: bool,
}

impl Ship {
    pub fn new(
        id: String,
        owner: PlayerId,
        class: ShipClass,
        project_id: String,
        position: Position,
        facing: Direction,
        stats: ShipStats,
    ) -> Self {
        let hp = u32::from(stats.activation);
        Self {
            id,
            owner,
            class,
            project_id,
            position,
            facing,
            hp,
            max_hp: hp,
            armor: stats.armor,
            armor_penalty: 0,
            current_speed: stats.speed,
            max_speed: stats.speed,
            current_maneuverability: stats.maneuverability,
            max_maneuverability: stats.maneuverability,
            activation: stats.activation,
            status: ShipStatus::Ready,
            used_weapons: HashSet::new(),
            weapons: class.weapons(),
            free_turn: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0 && self.status != ShipStatus::Destroyed
    }

    pub fn effective_armor(&self) -> u32 {
        self.armor.saturating_sub(self.armor_penalty)
    }

    /// Difficulty a to-hit roll must exceed.
    pub fn evasion(&self) -> u32 {
        self.current_speed + self.current_maneuverability
    }

    pub fn weapon(&self, weapon_id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|weapon| weapon.id == weapon_id)
    }

    /// Removes hit points and returns true if the ship is destroyed afterwards.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.status = ShipStatus::Destroyed;
        }
        self.status == ShipStatus::Destroyed
    }

    pub fn destroy(&mut self) {
        self.hp = 0;
        self.status = ShipStatus::Destroyed;
    }

    /// Start-of-round refresh for a surviving ship.
    pub fn refresh(&mut self) {
        if self.status == ShipStatus::Destroyed {
            return;
        }
        self.status = ShipStatus::Ready;
        self.current_speed = self.max_speed;
        self.current_maneuverability = self.max_maneuverability;
        self.free_turn = false;
    }
}
