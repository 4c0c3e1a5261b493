// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod extract;
pub mod filter;
pub mod notify;
pub mod pipeline;
pub mod store;

pub use crate::config::{AppConfig, SourceConfig};
pub use crate::extract::{Extractor, HtmlExtractor, RawItem};
pub use crate::notify::Notifier;
pub use crate::pipeline::{run_once, NotifyOutcome, RunReport};
pub use crate::store::{Match, MatchState, MatchStore, StoreError};
