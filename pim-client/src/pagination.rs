//! Continuation tokens and pagination state
//!
//! The `next` field of the list envelope is nominally a URL but in
//! practice arrives as an absolute URL, a path with a query string, a
//! bare query string, or an opaque token. [`parse_next`] tries structured
//! URL parsing first and falls back to a regex scan.

use crate::api::Page;
use regex::Regex;
use reqwest::Url;
use shared::{PageRequest, SortSpec};
use std::sync::OnceLock;

/// Where the next page starts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Page-number pagination
    Page(u32),
    /// Cursor pagination (opaque token echoed back as `cursor=`)
    Token(String),
}

/// Base for resolving relative `next` links
const RELATIVE_BASE: &str = "http://localhost/";

/// Extract the next-page cursor from a server `next` reference
///
/// Pages are 1-based; a link pointing at page 0 is not a continuation.
pub fn parse_next(next: &str) -> Option<Cursor> {
    scan_next(next).filter(|cursor| !matches!(cursor, Cursor::Page(0)))
}

fn scan_next(next: &str) -> Option<Cursor> {
    let next = next.trim();
    if next.is_empty() {
        return None;
    }

    if let Ok(page) = next.parse::<u32>() {
        return Some(Cursor::Page(page));
    }

    let parsed = Url::parse(next)
        .ok()
        .or_else(|| Url::parse(RELATIVE_BASE).ok()?.join(next).ok());
    if let Some(cursor) = parsed.as_ref().and_then(cursor_from_url) {
        return Some(cursor);
    }

    if let Some(cursor) = cursor_from_regex(next) {
        return Some(cursor);
    }

    // Not URL-shaped at all: an opaque token
    if !next.contains(['/', '?', '&']) {
        return Some(Cursor::Token(next.to_string()));
    }

    tracing::warn!(next = next, "Could not extract a page from continuation link");
    None
}

fn cursor_from_url(url: &Url) -> Option<Cursor> {
    let mut cursor = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "page" => {
                if let Ok(page) = value.trim().parse() {
                    return Some(Cursor::Page(page));
                }
            }
            "cursor" if !value.is_empty() => cursor = Some(Cursor::Token(value.into_owned())),
            _ => {}
        }
    }
    cursor
}

fn next_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[?&;])(page|cursor)=([^&#;]+)").ok())
        .as_ref()
}

fn cursor_from_regex(next: &str) -> Option<Cursor> {
    let re = next_regex()?;
    let mut cursor = None;
    for caps in re.captures_iter(next) {
        let value = &caps[2];
        match &caps[1] {
            "page" => {
                if let Ok(page) = value.parse() {
                    return Some(Cursor::Page(page));
                }
            }
            _ => {
                let decoded = percent_encoding::percent_decode_str(value)
                    .decode_utf8_lossy()
                    .into_owned();
                cursor = Some(Cursor::Token(decoded));
            }
        }
    }
    cursor
}

/// Page position within the current filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Last page loaded (1-based); 0 before the first load
    pub page: u32,
    pub page_size: u32,
    /// Continuation from the last successful fetch
    pub next: Option<Cursor>,
    /// Total reported by the server
    pub count: Option<u64>,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size,
            next: None,
            count: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn first_request(&self, sort: Option<SortSpec>) -> PageRequest {
        PageRequest::first(self.page_size).with_sort(sort)
    }

    /// Request for the page after the last one loaded; `None` without a token
    pub fn next_request(&self, sort: Option<SortSpec>) -> Option<PageRequest> {
        let request = match self.next.as_ref()? {
            Cursor::Page(page) => PageRequest::first(self.page_size).with_page(*page),
            Cursor::Token(token) => PageRequest::first(self.page_size)
                .with_page(self.page + 1)
                .with_cursor(token.clone()),
        };
        Some(request.with_sort(sort))
    }

    /// Record a successful fetch of `request`
    pub fn record<T>(&mut self, request: &PageRequest, page: &Page<T>) {
        self.page = request.page.max(1);
        self.count = page.count.or(self.count);
        self.next = page.next.as_deref().and_then(parse_next);
    }
}
