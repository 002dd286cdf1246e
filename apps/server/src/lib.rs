//! Host process for the Bistro storage core: configuration and service wiring.

pub mod config;
pub mod context;
