//! # Libris Architecture
//!
//! Libris is a **catalog data layer** for books, authors, stores and the
//! inventory that links them. The CLI is one client; the library does not
//! assume it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints tables or JSON envelopes        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Context (context.rs, auth/, forms.rs, views.rs)            │
//! │  - In-memory collections with load states                   │
//! │  - Form validation, derived joins, session state            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Facade (api.rs)                                        │
//! │  - Named operations, one backend picked at startup          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Services (service/)                                        │
//! │  - MockService: ids, persistence, latency, auth             │
//! │  - HttpService: the same contract over HTTP                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/, seed.rs)                                  │
//! │  - KeyValueStore trait: FileStore, MemoryStore              │
//! │  - Typed collections seeded on first use                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Writer
//!
//! Only a service assigns ids and writes collections. The context routes
//! every mutation through the facade and mirrors what comes back, so the
//! mock and HTTP backends behave the same from above.
//!
//! ## Errors
//!
//! Every fallible call returns [`error::Result`]. The `{success, data, error}`
//! [`envelope::Envelope`] only appears on the wire and in `--json` output.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade and the startup [`api::Backend`] choice
//! - [`service`]: The operation contract and its mock and HTTP implementations
//! - [`store`]: Key-value storage and typed collections
//! - [`seed`]: Where first-run data comes from
//! - [`context`]: Load states, mutators and views for a UI
//! - [`auth`]: Session state and mock tokens
//! - [`forms`]: Input validation
//! - [`views`]: Joins across collections
//! - [`model`]: Entities, drafts and patches
//! - [`config`]: `config.json` plus environment overrides
//! - [`logging`]: Subscriber setup for binaries
//! - [`error`], [`envelope`]: Error types and the wire wrapper

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod forms;
pub mod logging;
pub mod model;
pub mod seed;
pub mod service;
pub mod store;
pub mod views;
