//! Purpose: Explicit client view state driven by handler methods.
//! Exports: `Session`.
//! Role: Holds the current page, total, page size and edit target; talks to any `Backend`.
//! Invariants: Drafts are validated before any backend call is made.
//! Invariants: After every mutation the current page is re-fetched; nothing is patched locally.
//! Invariants: `current_page` never drops below 1 and is clamped after deletes.
#![allow(clippy::result_large_err)]

use tracing::debug;

use super::backend::{ApiResult, Backend};
use crate::core::error::{Error, ErrorKind};
use crate::core::paging::{
    DEFAULT_LIMIT, PageRequest, PagerView, clamp_page_after_delete, max_page,
};
use crate::core::record::{WorkoutDraft, WorkoutRecord};
use crate::core::stats::Stats;
use crate::core::validate::validate_workout;

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    current_page: u64,
    total_records: u64,
    limit: u64,
    records: Vec<WorkoutRecord>,
    editing_id: Option<u64>,
}

impl Session {
    pub fn new(limit: u64) -> ApiResult<Self> {
        PageRequest::new(1, limit)?;
        Ok(Self {
            current_page: 1,
            total_records: 0,
            limit,
            records: Vec::new(),
            editing_id: None,
        })
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn editing_id(&self) -> Option<u64> {
        self.editing_id
    }

    pub fn pager(&self) -> PagerView {
        PagerView::new(self.current_page, self.total_records, self.limit)
    }

    /// Fetches `page` and adopts the echoed page and total. Page 0 is a
    /// `Usage` error.
    pub fn fetch_page(&mut self, backend: &mut dyn Backend, page: u64) -> ApiResult<()> {
        let request = PageRequest::new(page, self.limit)?;
        let result = backend.list(request)?;
        debug!(page = result.page, total = result.total, "fetched page");
        self.current_page = result.page.max(1);
        self.total_records = result.total;
        self.records = result.records;
        Ok(())
    }

    pub fn refresh(&mut self, backend: &mut dyn Backend) -> ApiResult<()> {
        self.fetch_page(backend, self.current_page)
    }

    pub fn next_page(&mut self, backend: &mut dyn Backend) -> ApiResult<bool> {
        if !self.pager().next_enabled {
            return Ok(false);
        }
        self.fetch_page(backend, self.current_page + 1)?;
        Ok(true)
    }

    pub fn prev_page(&mut self, backend: &mut dyn Backend) -> ApiResult<bool> {
        if !self.pager().prev_enabled {
            return Ok(false);
        }
        self.fetch_page(backend, self.current_page - 1)?;
        Ok(true)
    }

    /// Enters edit mode for a record on the current page and returns its
    /// fields for prefilling.
    pub fn begin_edit(&mut self, id: u64) -> ApiResult<WorkoutDraft> {
        let record = self
            .records
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| {
                Error::new(ErrorKind::NotFound)
                    .with_message("record is not on the current page")
                    .with_id(id)
            })?;
        self.editing_id = Some(id);
        Ok(record.to_draft())
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
    }

    /// Creates, or updates the record being edited, then re-fetches the page.
    /// A failed submission leaves edit mode untouched.
    pub fn submit(
        &mut self,
        backend: &mut dyn Backend,
        draft: WorkoutDraft,
    ) -> ApiResult<WorkoutRecord> {
        let draft = draft.normalized();
        validate_workout(&draft)?;
        let saved = match self.editing_id {
            None => backend.create(&draft)?,
            Some(id) => {
                let saved = backend.update(id, &draft)?;
                self.editing_id = None;
                saved
            }
        };
        self.refresh(backend)?;
        Ok(saved)
    }

    /// Deletes `id`, clamps the page if the last one emptied, then re-fetches.
    pub fn delete(&mut self, backend: &mut dyn Backend, id: u64) -> ApiResult<()> {
        backend.delete(id)?;
        if self.editing_id == Some(id) {
            self.editing_id = None;
        }
        let page = clamp_page_after_delete(self.current_page, self.total_records, self.limit);
        self.fetch_page(backend, page)
    }

    /// Walks pages from the first until `id` is found; the wire contract has
    /// no get-by-id. Leaves the session on the page holding the record.
    pub fn find_record(
        &mut self,
        backend: &mut dyn Backend,
        id: u64,
    ) -> ApiResult<WorkoutRecord> {
        self.fetch_page(backend, 1)?;
        loop {
            if let Some(record) = self.records.iter().find(|record| record.id == id) {
                return Ok(record.clone());
            }
            if self.current_page >= max_page(self.total_records, self.limit) {
                return Err(Error::new(ErrorKind::NotFound)
                    .with_message("not found")
                    .with_id(id));
            }
            self.fetch_page(backend, self.current_page + 1)?;
        }
    }

    pub fn stats(&self, backend: &mut dyn Backend) -> ApiResult<Stats> {
        backend.stats()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_records: 0,
            limit: DEFAULT_LIMIT,
            records: Vec::new(),
            editing_id: None,
        }
    }
}
