//! Hallar: wait-aware DOM querying for integration tests
//!
//! Hallar (Spanish: "to find") locates elements in script-driven pages the
//! way a patient human would: it retries queries until the page settles,
//! survives DOM replacement through reloadable element handles, and keeps a
//! single driver-facing trait so the same tests run against any backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     HALLAR Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐             │
//! │   │ Finder     │    │ Poller     │    │ Driver     │             │
//! │   │ (facade)   │───►│ (retry     │───►│ (backend   │             │
//! │   │            │    │  engine)   │    │  adapter)  │             │
//! │   └────────────┘    └────────────┘    └────────────┘             │
//! │         │                 │                                      │
//! │         ▼                 ▼                                      │
//! │   ┌────────────┐    ┌────────────┐                               │
//! │   │ Element    │    │ Query      │                               │
//! │   │ (reloadable│    │ (immutable │                               │
//! │   │  handle)   │    │  search)   │                               │
//! │   └────────────┘    └────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Process-wide settings: wait budget and automatic reload
pub mod config;
/// The driver adapter boundary
pub mod driver;
mod element;
mod finder;
/// In-memory DOM driver for tests
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;
mod poller;
mod query;
mod query_result;
mod result;
mod session;

pub use driver::{AttrValue, Driver, ElementHandle};
pub use element::{Element, Scope};
pub use finder::Finder;
pub use mock::{MockDriver, NodeSpec};
pub use query::{Filters, Query, QueryOptions, Selector};
pub use query_result::QueryResult;
pub use result::{HallarError, HallarResult};
pub use session::Session;
