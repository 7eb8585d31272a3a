// Interface adapters: wire protocol, session fan-out and network handling.

pub mod clients;
pub mod http;
pub mod hub;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
