// Core modules: record model, validation, seeding, paging, stats, and the file store.
pub mod error;
pub mod paging;
pub mod record;
pub mod seed;
pub mod stats;
pub mod store;
pub mod validate;
