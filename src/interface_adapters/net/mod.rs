// Network adapter modules: player sockets and plain HTTP routes.

pub mod client;

pub use client::ws_handler;
