//! # Pagination
//!
//! Page requests and page results shared by the service and REST layers.

use serde_json::Value;

/// Maximum page size a caller may request
pub const MAX_SIZE: usize = 1000;

/// Default page size if not specified
pub const DEFAULT_SIZE: usize = 100;

/// Sort key for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

/// A page request: zero-based page number, page size, sort keys
#[derive(Debug, Clone)]
pub struct Pageable {
    pub page: usize,
    pub size: usize,
    pub sort: Vec<SortKey>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_SIZE,
            sort: Vec::new(),
        }
    }
}

impl Pageable {
    /// First row index covered by this page
    pub fn offset(&self) -> usize {
        self.page * self.size
    }

    /// Slice a full, ordered result set down to this page
    pub fn slice<T>(&self, rows: Vec<T>) -> Page<T> {
        let total = rows.len();
        let items: Vec<T> = rows
            .into_iter()
            .skip(self.offset())
            .take(self.size)
            .collect();
        Page {
            items,
            page: self.page,
            size: self.size,
            total,
        }
    }
}

/// One page of results together with the size of the full result set
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    /// Whether rows exist beyond this page
    pub fn has_next(&self) -> bool {
        (self.page + 1) * self.size < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

/// Sort documents in place by the given keys, earlier keys winning
pub fn sort_documents(rows: &mut [Value], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        for key in keys {
            let cmp = compare_values(a.get(&key.field), b.get(&key.field));
            let cmp = if key.ascending { cmp } else { cmp.reverse() };
            if cmp != std::cmp::Ordering::Equal {
                return cmp;
            }
        }
        std::cmp::Ordering::Equal
    });
}

/// Order two optional JSON values; absent values sort first
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
