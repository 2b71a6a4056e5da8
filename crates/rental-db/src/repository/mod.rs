//! # Repository Module
//!
//! Database repository implementations for the rental engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  SqliteStore (rental-engine)                                           │
//! │       │                                                                 │
//! │       │  db.products().get_by_id("speaker-01")                         │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── relation_counts(&self, id)                                        │
//! │  ├── hard_delete(&self, id, budget)                                    │
//! │  └── adjust_stock(&self, id, change)                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (mock the repository)                                  │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog reads, deletion, stock counters
//! - [`component::ComponentRepository`] - Pack composition
//! - [`order::OrderRepository`] - Reservation ledger
//! - [`engagement::EngagementRepository`] - Reviews, favorites, interactions, analytics

pub mod component;
pub mod engagement;
pub mod order;
pub mod product;
