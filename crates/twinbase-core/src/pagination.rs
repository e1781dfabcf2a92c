//! Cursor-based pagination
//!
//! The cursor is the base64-encoded key of the last item of the previous
//! page. Keys must be unique within the collection; element paths are.
//! The collection is never mutated and the order is whatever order the
//! caller supplies, so an unchanged collection pages identically every time.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TwinError};

/// Default maximum items per page
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Pagination parameters for cursor-based pagination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Cursor from a previous page (base64 encoded)
    pub cursor: Option<String>,

    /// Maximum number of items to return
    pub limit: usize,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PaginationParams {
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            limit,
        }
    }

    pub fn after(cursor: impl Into<String>, limit: usize) -> Self {
        Self {
            cursor: Some(cursor.into()),
            limit,
        }
    }
}

/// A page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,

    /// Cursor for the next page; `None` on the last page
    pub cursor: Option<String>,

    pub has_more: bool,
}

impl<T> PagedResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            cursor: self.cursor,
            has_more: self.has_more,
        }
    }
}

/// Slice `items` into the page selected by `params`
///
/// # Errors
/// * `InvalidLimit` - If `params.limit` is zero
/// * `InvalidCursor` - If the cursor does not decode or names no item
pub fn paginate<T, F>(items: Vec<T>, params: &PaginationParams, key_fn: F) -> Result<PagedResult<T>>
where
    F: Fn(&T) -> String,
{
    if params.limit == 0 {
        return Err(TwinError::InvalidLimit {
            limit: params.limit,
            reason: "must be at least 1".to_string(),
        });
    }

    let start = match params.cursor.as_deref() {
        None => 0,
        Some(cursor) => {
            let after = decode_cursor(cursor)?;
            items
                .iter()
                .position(|item| key_fn(item) == after)
                .map(|p| p + 1)
                .ok_or_else(|| TwinError::InvalidCursor {
                    cursor: cursor.to_string(),
                })?
        }
    };

    let mut rest = items.into_iter().skip(start);
    let page: Vec<T> = rest.by_ref().take(params.limit).collect();
    let has_more = rest.next().is_some();
    let cursor = if has_more {
        page.last().map(|item| encode_cursor(&key_fn(item)))
    } else {
        None
    };

    Ok(PagedResult {
        items: page,
        cursor,
        has_more,
    })
}

/// Encode a sort key as an opaque cursor
pub fn encode_cursor(key: &str) -> String {
    STANDARD.encode(key.as_bytes())
}

fn decode_cursor(cursor: &str) -> Result<String> {
    let invalid = || TwinError::InvalidCursor {
        cursor: cursor.to_string(),
    };
    let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
    String::from_utf8(bytes).map_err(|_| invalid())
}
