//! # rental-engine: Availability, Packs and Guarded Mutations
//!
//! The crate the storefront and admin call into. It answers availability
//! questions for single products and packs, and serializes destructive
//! inventory writes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      rental-engine (THIS CRATE)                         │
//! │                                                                         │
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐               │
//! │   │ Availability │◄──│ PackResolver │   │ProductDeleter│               │
//! │   │  Calculator  │   │              │   │              │               │
//! │   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘               │
//! │          │                  │                  │ via MutationGuard      │
//! │          └──────────────────┼──────────────────┘                        │
//! │                             ▼                                           │
//! │                  InventoryStore (trait)                                 │
//! │                  ├── SqliteStore   (rental-db)                          │
//! │                  └── InMemoryStore (tests)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - [`RentalEngine`] facade and builder
//! - [`availability`] - Single-product checks, calendars, summaries
//! - [`pack`] - Pack checks, bottleneck, pricing, composition writes
//! - [`guard`] - FIFO mutation guard
//! - [`deletion`] - Soft/hard product deletion
//! - [`stock`] - Conditional stock counter updates
//! - [`store`] - Storage trait and implementations
//! - [`config`] - TOML + environment configuration
//! - [`clock`] - Source of "today"
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Engine errors and API error codes

pub mod availability;
pub mod clock;
pub mod config;
pub mod deletion;
pub mod engine;
pub mod error;
pub mod guard;
pub mod pack;
pub mod stock;
pub mod store;
pub mod telemetry;

pub use availability::{AvailabilityRequest, AvailabilityResult, MultiAvailability};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use deletion::{DeleteKind, DeletionOutcome};
pub use engine::{RentalEngine, RentalEngineBuilder};
pub use error::{ApiError, EngineError, EngineResult, ErrorCode};
pub use guard::MutationGuard;
pub use pack::{ComponentCapacity, PackAvailability, PackMaxAvailability, UnavailableComponent};
pub use stock::StockOperation;
pub use store::{InventoryStore, StoreError, StoreResult};
