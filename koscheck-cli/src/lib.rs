//! koscheck command-line shell: configuration, logging setup, chat log
//! discovery and report rendering around the resolution engine.

pub mod config;
pub mod error;
pub mod logs;
pub mod report;
pub mod telemetry;
