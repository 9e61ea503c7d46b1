// Page slicing over an ordered collection and the pager arithmetic shared by
// the service and the client session.
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::record::WorkoutRecord;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub records: Vec<WorkoutRecord>,
    pub total: u64,
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub total_pages: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

/// Validated page/limit pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Result<Self, Error> {
        if page < 1 {
            return Err(Error::new(ErrorKind::Usage).with_message("page must be at least 1"));
        }
        if limit < 1 {
            return Err(Error::new(ErrorKind::Usage).with_message("limit must be at least 1"));
        }
        Ok(Self { page, limit })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Returns `records[(page-1)*limit .. page*limit]`; pages past the end are empty.
pub fn paginate(records: &[WorkoutRecord], request: PageRequest) -> Page {
    let total = records.len() as u64;
    let start = request.page.saturating_sub(1).saturating_mul(request.limit);
    let end = start.saturating_add(request.limit).min(total);
    let slice = if start >= total {
        Vec::new()
    } else {
        records[start as usize..end as usize].to_vec()
    };
    Page {
        records: slice,
        total,
        page: request.page,
        limit: request.limit,
        total_pages: max_page(total, request.limit),
    }
}

pub fn max_page(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(limit).max(1)
}

/// Page to re-fetch after deleting one record while viewing `current`.
pub fn clamp_page_after_delete(current: u64, total: u64, limit: u64) -> u64 {
    let max_after = max_page(total.saturating_sub(1), limit);
    current.min(max_after).max(1)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PagerView {
    pub current: u64,
    pub max: u64,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl PagerView {
    pub fn new(current: u64, total: u64, limit: u64) -> Self {
        let max = max_page(total, limit);
        Self {
            current,
            max,
            prev_enabled: current > 1,
            next_enabled: current < max,
        }
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current, self.max)
    }
}
