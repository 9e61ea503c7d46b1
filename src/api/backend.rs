//! Purpose: One persistence interface with a local-file and a remote-HTTP implementation.
//! Exports: `Backend`, `LocalBackend`, `BackendConfig`, `default_store_path`.
//! Role: Lets the session and CLI drive either deployment shape through one trait.
//! Invariants: Every mutation is validated before it reaches storage.
//! Invariants: Local mutations write the full collection through to disk.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::remote::RemoteClient;
use crate::core::error::Error;
use crate::core::paging::{Page, PageRequest};
use crate::core::record::{WorkoutDraft, WorkoutRecord};
use crate::core::stats::Stats;
use crate::core::store::WorkoutStore;

pub type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub trait Backend {
    fn list(&mut self, request: PageRequest) -> ApiResult<Page>;
    fn create(&mut self, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord>;
    fn update(&mut self, id: u64, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord>;
    fn delete(&mut self, id: u64) -> ApiResult<()>;
    fn stats(&mut self) -> ApiResult<Stats>;
}

/// Client-only backend: the whole collection in memory, written through to a
/// JSON file on every change.
pub struct LocalBackend {
    store: WorkoutStore,
}

impl LocalBackend {
    pub fn open(path: impl AsRef<Path>) -> ApiResult<Self> {
        Ok(Self {
            store: WorkoutStore::open(path)?,
        })
    }

    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub fn load(&mut self) -> ApiResult<Vec<WorkoutRecord>> {
        Ok(self.store.load()?.to_vec())
    }

    pub fn save_all(&mut self, records: &[WorkoutRecord]) -> ApiResult<()> {
        self.store.save_all(records)
    }
}

impl Backend for LocalBackend {
    fn list(&mut self, request: PageRequest) -> ApiResult<Page> {
        Ok(self.store.list(request))
    }

    fn create(&mut self, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord> {
        self.store.create(draft.clone())
    }

    fn update(&mut self, id: u64, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord> {
        self.store.update(id, draft.clone())
    }

    fn delete(&mut self, id: u64) -> ApiResult<()> {
        self.store.delete(id)
    }

    fn stats(&mut self) -> ApiResult<Stats> {
        Ok(self.store.stats())
    }
}

impl Backend for RemoteClient {
    fn list(&mut self, request: PageRequest) -> ApiResult<Page> {
        RemoteClient::list(self, request)
    }

    fn create(&mut self, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord> {
        RemoteClient::create(self, draft)
    }

    fn update(&mut self, id: u64, draft: &WorkoutDraft) -> ApiResult<WorkoutRecord> {
        RemoteClient::update(self, id, draft)
    }

    fn delete(&mut self, id: u64) -> ApiResult<()> {
        RemoteClient::delete(self, id)
    }

    fn stats(&mut self) -> ApiResult<Stats> {
        RemoteClient::stats(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    Local { path: PathBuf },
    Remote { base_url: String, timeout: Duration },
}

impl BackendConfig {
    pub fn connect(&self) -> ApiResult<Box<dyn Backend>> {
        match self {
            BackendConfig::Local { path } => Ok(Box::new(LocalBackend::open(path)?)),
            BackendConfig::Remote { base_url, timeout } => {
                Ok(Box::new(RemoteClient::new(base_url.clone())?.with_timeout(*timeout)))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BackendConfig::Local { path } => path.display().to_string(),
            BackendConfig::Remote { base_url, .. } => base_url.clone(),
        }
    }
}

pub fn default_store_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".liftlog").join("workouts.json")
}
