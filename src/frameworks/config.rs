use crate::domain::tuning::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
use std::{env, net::IpAddr, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("FLEET_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn http_host() -> IpAddr {
    env::var("FLEET_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Base URL of the fleet designer serving `/api/ships`, if any.
pub fn catalog_url() -> Option<String> {
    env::var("CATALOG_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Directory of `*.json` ship projects, used when no catalog URL is set.
pub fn catalog_dir() -> Option<PathBuf> {
    env::var("CATALOG_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub fn catalog_timeout() -> Duration {
    let millis = env::var("CATALOG_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub fn map_width() -> u32 {
    env::var("MAP_WIDTH")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_MAP_WIDTH)
}

pub fn map_height() -> u32 {
    env::var("MAP_HEIGHT")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_MAP_HEIGHT)
}

pub const OUTBOX_CAPACITY: usize = 256;
