//! Tag engine core
//!
//! - [`error`] - Error types for tag operations
//! - [`config`] - Engine options
//! - [`header`] - APEv2 header/footer codec
//! - [`legacy`] - ID3v1 trailer and field trimming
//! - [`item`] - APEv2 item codec and bounds-checked scanner
//! - [`bounded`] - Copy-out into caller-sized buffers
//! - [`store`] - The tag store, lookups and edits
//! - [`loader`] - Finding and loading a tag at the end of a stream
//! - [`writer`] - Writing a tag to a sink or back into its stream
//! - [`io`] - Stream and sink capabilities

pub mod bounded;
pub mod config;
pub mod error;
pub mod header;
pub mod io;
pub mod item;
pub mod legacy;
pub mod loader;
pub mod store;
pub mod writer;

pub use bounded::CopyOutcome;
pub use config::TagOptions;
pub use error::{Result, TagError};
pub use header::ApeHeader;
pub use io::{BlockSink, ByteStream, FnSink, StreamAdapter, WriteSink};
pub use legacy::FixedTag;
pub use store::{ApeTag, TagKind, TagStore};
pub use writer::TagSink;
