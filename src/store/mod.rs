//! Persistence layer (spec §6): Schedule Store (C1), News & Status Store
//! (C2), and League Store, all backed by a single Postgres pool.

pub mod postgres;

pub use postgres::Store;
