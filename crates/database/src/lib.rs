//! # Footfall Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database. It is the system's "permanent archive" of uploaded
//! daily sales rows.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate is an adapter that encapsulates all
//!   database-specific logic. It provides a clean, abstract API to the rest
//!   of the application, hiding the underlying SQL.
//! - **Append-only rows:** Stored records are immutable. The only mutations
//!   are bulk append (on upload) and bulk delete (administrative reset);
//!   there is no update-in-place and no identity beyond row order.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses
//!   a connection pool (`PgPool`) for concurrent database access.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply database migrations, ensuring the
//!   schema is up-to-date.
//! - `SalesRepository`: The main struct that holds the connection pool and
//!   provides all the high-level data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::SalesRepository;
