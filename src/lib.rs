//! School timetable construction core.
//!
//! Decomposes a curriculum into placeable teaching units, lets an operator
//! place them on a weekly grid, recomputes constraint violations after
//! every edit, and keeps the placements in step with an authoritative
//! backend that owns lecture groups, blocks and a bulk auto-scheduler.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Curriculum`, `SubjectInfo`, `Teacher`,
//!   `UnassignedCard`, `ClassBlock`, `Conflict`, backend records
//! - **`generator`**: Curriculum → unassigned cards (credit slicing)
//! - **`conflicts`**: Pure conflict recompute (double booking, overflow, time-off)
//! - **`engine`**: Block store with revalidation after every mutation
//! - **`validation`**: Curriculum integrity checks
//! - **`gateway`**: Backend traits, wire decoding, in-memory backend
//! - **`sync`**: Service object: placement state machine, resync, auto-schedule
//! - **`config`**: TOML settings
//!
//! # Architecture
//!
//! Everything below `sync` is synchronous and backend-agnostic. The
//! `sync::TimetableService` owns the editing session and talks to the
//! backend only through the `gateway` traits, so tests construct it with
//! `gateway::InMemoryBackend`.
//!
//! # Logging
//!
//! Soft failures are reported through the `log` facade; the crate never
//! installs a logger.

pub mod config;
pub mod conflicts;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod ids;
pub mod models;
pub mod sync;
pub mod validation;

pub use error::{TimetableError, TimetableResult};
