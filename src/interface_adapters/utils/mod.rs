pub mod rng;
pub mod throttle;
