//! Daily Wisdom: a browsing client for a curated collection of instructions
//!
//! Short pieces of advice with authors, tags and categories live in a hosted
//! PostgREST database. This crate is the client side: it shows one instruction
//! a day, remembers what the user has seen, and searches the collection while
//! coping with whatever the deployed database happens to support.
//!
//! # Core Concepts
//!
//! - **Hero**: the single-instruction view with back/forward history
//! - **Daily cache**: the random pick is reused for 24 hours
//! - **Gateway**: one entry point to the remote service that degrades from the
//!   filter endpoint to a direct table scan on its own
//! - **Search**: paginated remote search or local filtering of loaded results
//!
//! # Example
//!
//! ```
//! use daily_wisdom::{Gateway, Instruction, MockRemote};
//! use std::sync::Arc;
//!
//! let remote = MockRemote::new(vec![Instruction::new(1, "Be kind.")]);
//! let gateway = Gateway::new(Arc::new(remote));
//! assert!(gateway.capabilities().supports_filter_endpoint());
//! ```

pub mod clock;
pub mod config;
pub mod daily;
pub mod deeplink;
pub mod filter;
pub mod gateway;
pub mod hero;
pub mod model;
pub mod notify;
pub mod search;
pub mod storage;
pub mod telemetry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use daily::DailyCache;
pub use deeplink::DeepLink;
pub use filter::Criteria;
pub use gateway::{
    Batch, Capabilities, Gateway, GatewayError, GatewayResult, MockRemote, Page, PostgrestClient,
    PostgrestConfig, RemoteError, RemoteService,
};
pub use hero::{Hero, StartupSource};
pub use model::{
    reduce, Category, HistoryAction, HistoryState, Instruction, InstructionId, Label,
    LabelCatalog, Tag,
};
pub use notify::{Notifier, RecordingNotifier, Severity, Toast, TracingNotifier};
pub use search::{SearchError, SearchMode, SearchOrchestrator, SearchState};
pub use storage::{
    CookieStore, KeyValueStore, MemoryStore, OpenStore, SqliteStore, StorageAdapter, StorageError,
    StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
