//! INI configuration file (`~/.gpsfeed/config.ini`).
//!
//! Sections map onto the engine configs: `[feed]` and `[route]` build a
//! [`FeedConfig`](crate::feed::FeedConfig), `[stream]` builds a
//! [`ClientConfig`](crate::stream::ClientConfig). The parser module documents the
//! full key list.

mod file;
mod parser;

pub use file::{config_directory, config_file_path, ConfigFile, ConfigFileError};
