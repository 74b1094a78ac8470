//! HTTP handlers and wire types.
//!
//! Handlers parse and validate the wire representation themselves (rather
//! than leaning on extractor rejections) so every validation failure comes
//! back as a 400 with the contract error body. Timestamps on the wire are
//! RFC 3339 with offset; everything internal is UTC.

pub mod bookings;
pub mod flights;
pub mod search;
