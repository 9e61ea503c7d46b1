//! Purpose: Library crate behind the `liftlog` workout log CLI and HTTP service.
//! Exports: `core` (records, validation, seeding, paging, stats, file store) and `api`.
//! Role: Keeps the CRUD, pagination and aggregation logic free of any UI or transport.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
