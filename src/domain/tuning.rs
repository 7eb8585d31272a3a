// Gameplay tuning. Keep this separate from runtime/server configuration (ports, buffer sizes).

/// Default playing field width in cells.
pub const DEFAULT_MAP_WIDTH: u32 = 20;
/// Default playing field height in cells.
pub const DEFAULT_MAP_HEIGHT: u32 = 20;

/// Participants per room; battles are strictly one against one.
pub const MAX_PLAYERS_PER_ROOM: usize = 2;

/// Follow-up critical rolls a single chain reaction may trigger.
pub const MAX_CHAIN_REACTIONS: u32 = 5;

/// Lowest die face that can ever pay for an activation.
pub const MIN_ACTIVATION_FACE: u8 = 2;

/// Damage dealt by every critical result except outright destruction.
pub const CRITICAL_DAMAGE: u32 = 1;

/// Damage dealt by a reactor blast to each nearby ship whose armor check fails.
pub const SPLASH_DAMAGE: u32 = 1;
