//! koscheck Engine
//!
//! The resolution pipeline: a [`tailer::LogTailer`] pulls KOS-check
//! requests out of a chat log, an [`processor::EntryProcessor`] runs every
//! requested name through the cascading [`resolver::Resolver`], and a
//! [`watch::KosWatcher`] drives the loop and hands each report to an
//! [`watch::EntryHandler`].

pub mod processor;
pub mod resolver;
pub mod tailer;
pub mod watch;

pub use processor::{normalize_name, EntryProcessor, EntryReport, LookupFailure};
pub use resolver::{Resolver, DEFAULT_KOS_TTL_SECS};
pub use tailer::{parse_line, LineRead, LogTailer, TailEntry};
pub use watch::{EntryHandler, KosWatcher, DEFAULT_IDLE_DELAY};
