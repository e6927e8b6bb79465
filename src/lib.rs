//! Computes MD5 checksums of the files referenced by a BitTorrent metainfo file.
//!
//! Files without a recorded `md5sum` get one added to the metainfo, which is then
//! written back. Files that already have one are compared against it instead.

/// Entry point of a checksum run.
pub mod app;

/// Bencode encoding and decoding.
pub mod benc;

pub mod checksum;

mod error;

/// Owned model of the metainfo fields this tool reads and updates.
pub mod metainfo;

/// Lexical path handling.
pub mod path;

pub use error::Error;
