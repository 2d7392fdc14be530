//! Response envelopes

use serde::Serialize;

use crate::page::{Page, Pageable};

/// List-result envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Page metadata; `next` is present only when more pages exist
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub next: Option<String>,
    pub total: usize,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn from_page(page: Page<T>, next: Option<String>) -> Self {
        Self {
            meta: PageMeta {
                next,
                total: page.total,
            },
            items: page.items,
        }
    }
}

/// Link to the following page, carrying the tenant, pageable, and filter.
pub fn next_url(
    base_path: &str,
    tenant: &str,
    pageable: &Pageable,
    filter: Option<&str>,
) -> String {
    let mut url = format!(
        "{base_path}?tenantId={}&page={}&size={}",
        encode_component(tenant),
        pageable.page + 1,
        pageable.size
    );

    if !pageable.sort.is_empty() {
        let sort: Vec<String> = pageable
            .sort
            .iter()
            .map(|key| {
                let direction = if key.ascending { "asc" } else { "desc" };
                format!("{}.{direction}", key.field)
            })
            .collect();
        url.push_str("&sort=");
        url.push_str(&sort.join(","));
    }

    if let Some(filter) = filter {
        url.push_str("&filter=");
        url.push_str(&encode_component(filter));
    }

    url
}

/// Percent-encode the characters that would break a query component.
fn encode_component(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'(' | b')'
            | b',' | b'*' => encoded.push(byte as char),
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
