//! Typed wrappers for the TruSTAR endpoints.
//!
//! Each operation builds a [`RequestDescriptor`](crate::dispatch::RequestDescriptor) and funnels
//! it through [`Session::send_into`](crate::session::Session::send_into), so all of them share
//! the same authentication, error and decoding behavior. Listing operations return a single page;
//! walking further pages is left to the caller via the `pageNumber` query parameter.

pub mod enclaves;
pub mod epoch;
pub mod indicators;
pub mod misc;
pub mod reports;
pub mod types;
pub mod whitelist;

pub use epoch::*;
pub use types::*;

/// Query parameters passed through verbatim, e.g. `&[("pageSize", "25")]`.
pub type Query<'a> = &'a [(&'a str, &'a str)];
