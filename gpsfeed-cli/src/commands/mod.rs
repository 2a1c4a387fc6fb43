//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`listen`] - Connect to a location server and print updates
//! - [`route`] - Print a generated route
//! - [`simulate`] - Run the simulated location feed

pub mod common;
pub mod listen;
pub mod route;
pub mod simulate;
