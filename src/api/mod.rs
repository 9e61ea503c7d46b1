//! Purpose: Define the public Rust API boundary for liftlog.
//! Exports: Record types, the `Backend` adapters, the client `Session`, and errors.
//! Role: The surface used by the CLI, the HTTP service, and integration tests.
//! Invariants: Storage internals are reached only through `LocalBackend` or `WorkoutStore`.

mod backend;
mod remote;
mod session;

pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::paging::{
    DEFAULT_LIMIT, DEFAULT_PAGE, Page, PageRequest, PagerView, clamp_page_after_delete,
    max_page, paginate,
};
pub use crate::core::record::{WorkoutDraft, WorkoutRecord};
pub use crate::core::seed::seed_records;
pub use crate::core::stats::{COUNTER_DURATION_MS, Stats, ease_out_cubic};
pub use crate::core::store::WorkoutStore;
pub use crate::core::validate::{is_valid_workout, validate_workout};
pub use backend::{
    ApiResult, Backend, BackendConfig, DEFAULT_TIMEOUT, LocalBackend, default_store_path,
};
pub use remote::RemoteClient;
pub use session::Session;
