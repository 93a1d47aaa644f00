//! Paginated fetching from the MOEX ISS API.
//!
//! - `source`: the [`JsonSource`] seam and [`FetchError`]
//! - `iss`: blocking HTTP transport with retries
//! - `envelope`: per-block response decoding
//! - `endpoint`: request templates per record kind
//! - `paginate`: lazy cursor traversal

pub mod endpoint;
pub mod envelope;
pub mod iss;
pub mod paginate;
pub mod source;

pub use endpoint::{schedule_block, Endpoints, FetchRequest};
pub use envelope::{decode, BlockLayout, BlockRead, Envelope};
pub use iss::IssClient;
pub use paginate::{fetch_all, PageStream, StreamEnd, DEFAULT_LIMIT};
pub use source::{FetchError, JsonSource, Query};
