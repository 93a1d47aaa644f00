//! Cursor-driven page traversal.
//!
//! A [`PageStream`] issues the requests for one logical [`FetchRequest`]
//! lazily: the next page is only requested once the caller has consumed the
//! previous one. The stream ends when the cursor is exhausted, when a
//! response carries no rows, or after the first fetch error.

use super::endpoint::FetchRequest;
use super::envelope::{decode, BlockRead};
use super::source::{FetchError, JsonSource};
use crate::domain::Page;
use tracing::{debug, warn};

/// Page size used when none is configured.
pub const DEFAULT_LIMIT: u64 = 100;

/// Why a page stream stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Cursor reported no further pages, or the response had no cursor.
    Exhausted,
    /// Expected block present with no rows.
    Empty,
    /// Expected block missing from the response.
    Absent,
    /// Expected block present with an unexpected shape.
    Malformed(String),
    /// A request failed; the error was yielded as the last item.
    Failed,
}

impl StreamEnd {
    /// Whether the stream ended on a data-shape problem.
    pub fn is_shape_warning(&self) -> bool {
        matches!(self, StreamEnd::Absent | StreamEnd::Malformed(_))
    }
}

/// Lazy sequence of pages for one logical request.
pub struct PageStream<'s, S: JsonSource + ?Sized> {
    source: &'s S,
    request: FetchRequest,
    limit: u64,
    start: u64,
    requests: usize,
    end: Option<StreamEnd>,
}

impl<'s, S: JsonSource + ?Sized> PageStream<'s, S> {
    pub fn new(source: &'s S, request: FetchRequest, limit: u64) -> Self {
        Self {
            source,
            request,
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
            start: 0,
            requests: 0,
            end: None,
        }
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// HTTP requests issued so far (retries inside the transport excluded).
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// How the stream ended, once it has.
    pub fn end(&self) -> Option<&StreamEnd> {
        self.end.as_ref()
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = self.request.query.clone();
        if self.request.paginated {
            query.push(("start".into(), self.start.to_string()));
            query.push(("limit".into(), self.limit.to_string()));
        }
        query
    }

    fn finish(&mut self, end: StreamEnd) {
        match &end {
            StreamEnd::Absent => warn!(
                request = %self.request.label,
                block = self.request.block,
                start = self.start,
                "response has no expected block"
            ),
            StreamEnd::Malformed(detail) => warn!(
                request = %self.request.label,
                start = self.start,
                detail = %detail,
                "unexpected response shape"
            ),
            _ => {}
        }
        self.end = Some(end);
    }
}

impl<S: JsonSource + ?Sized> Iterator for PageStream<'_, S> {
    type Item = Result<Page, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }

        let query = self.query();
        self.requests += 1;
        debug!(request = %self.request.label, start = self.start, "fetching page");

        let body = match self.source.get_json(&self.request.url, &query) {
            Ok(body) => body,
            Err(e) => {
                warn!(request = %self.request.label, start = self.start, error = %e, "fetch failed");
                self.end = Some(StreamEnd::Failed);
                return Some(Err(e));
            }
        };

        let envelope = decode(&body, self.request.block, self.request.layout);
        match envelope.block {
            BlockRead::Rows(page) => {
                let next = if self.request.paginated {
                    envelope.cursor.and_then(|c| c.next_start(self.start))
                } else {
                    None
                };
                match next {
                    Some(start) => self.start = start,
                    None => self.end = Some(StreamEnd::Exhausted),
                }
                Some(Ok(page))
            }
            BlockRead::Empty => {
                self.finish(StreamEnd::Empty);
                None
            }
            BlockRead::Absent => {
                self.finish(StreamEnd::Absent);
                None
            }
            BlockRead::Malformed(detail) => {
                self.finish(StreamEnd::Malformed(detail));
                None
            }
        }
    }
}

/// Consume a whole stream into memory. The first fetch error is returned
/// and any pages gathered before it are discarded.
pub fn fetch_all<S: JsonSource + ?Sized>(
    source: &S,
    request: FetchRequest,
    limit: u64,
) -> Result<Vec<Page>, FetchError> {
    PageStream::new(source, request, limit).collect()
}
