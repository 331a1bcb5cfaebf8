//! # Phrasebook Architecture
//!
//! Phrasebook is a **UI-agnostic phrase-collection library**: CRUD over short
//! text phrases with tags, authors, and categories, plus the filtering,
//! sorting, and debounced-search pipeline a frontend needs on top. There is
//! no terminal or GUI code in here; any client (a TUI, a web service, a
//! desktop shell) drives the same facade.
//!
//! ## The Layer Stack
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - PhraseApp facade: entry point for all operations         │
//! │  - Validates and sanitizes input, threads the clock through │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  State Layer (store/)                                       │
//! │  - Pure reducer over a closed Action enum                   │
//! │  - Synchronous subscriber notification                      │
//! │  - Memoized filter/sort selectors                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session Layer (session.rs, search/, debounce.rs)           │
//! │  - Debounced search with regex and result caches            │
//! │  - Autosave coalescing                                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (persist/)                                   │
//! │  - Abstract KeyValueStore trait                             │
//! │  - FileBackend (production), MemoryBackend (testing)        │
//! │  - StorageGateway: JSON codecs, quota recovery, backups     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time Is an Argument
//!
//! Nothing in the library reads the wall clock. Debounced search and
//! autosave take `Instant`s from the caller ([`api::PhraseApp::poll`] is the
//! tick), so every timing behavior is deterministic under test.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Result`, slices, owned values)
//! - **Never** writes to stdout/stderr
//! - **Never** panics on bad input or bad storage
//!
//! The only I/O lives behind [`persist::KeyValueStore`].
//!
//! ## Module Overview
//!
//! - [`api`]: The [`api::PhraseApp`] facade—entry point for all operations
//! - [`model`]: Core data types (`Phrase`, `AppState`, the enums)
//! - [`store`]: Actions, reducer, store, selectors
//! - [`validation`]: Form validation and input sanitization
//! - [`search`]: Term normalization, safe regex construction, caches
//! - [`session`]: Debounced search session and autosave coordination
//! - [`debounce`]: The clock-injected debouncer both sessions build on
//! - [`persist`]: Storage backends and the gateway
//! - [`error`]: Tagged error type shared across the crate

pub mod api;
pub mod debounce;
pub mod error;
pub mod model;
pub mod persist;
pub mod search;
pub mod session;
pub mod store;
pub mod validation;

pub use api::PhraseApp;
pub use error::{AppError, ErrorCategory};
pub use model::{AppState, Phrase, PhraseId, SortBy, SortOrder, Theme, ViewMode};
pub use store::{Action, PhraseUpdates};
