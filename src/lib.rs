//! # tailtag - trailing APEv2 / ID3v1 tag engine
//!
//! `tailtag` finds, reads, edits and rewrites the metadata tag stored at the
//! end of an audio container:
//!
//! - **APEv2**: variable-length key/value item list with a footer and an
//!   optional duplicate header, editable in place
//! - **ID3v1**: fixed 128-byte trailer, read-only
//!
//! Every length read from the wire is checked against the bytes actually
//! present, so a corrupt or hostile tag fails to load instead of being
//! trusted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tailtag::{TagFileBuilder, Result};
//!
//! # fn main() -> Result<()> {
//! let mut file = TagFileBuilder::new()
//!     .path("song.wv")
//!     .edit_tags()
//!     .open()?;
//!
//! file.set("Title", b"My Song")?;
//! file.remove("Comment");
//!
//! for (name, value) in file.items() {
//!     println!("{} = {}", name, String::from_utf8_lossy(&value));
//! }
//!
//! file.save()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming output
//!
//! ```rust
//! use tailtag::{TagStore, Result};
//!
//! # fn main() -> Result<()> {
//! let mut store = TagStore::default();
//! store.append("Artist", b"Someone")?;
//!
//! let mut out = Vec::new();
//! store.write_to_sink(&mut out)?;
//! assert_eq!(&out[..8], b"APETAGEX");
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout at end of stream
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ audio data                   │
//! ├──────────────────────────────┤
//! │ APEv2 header (optional, 32)  │
//! │ items                        │
//! │ APEv2 footer (32)            │
//! ├──────────────────────────────┤
//! │ ID3v1 trailer (optional,128) │
//! └──────────────────────────────┘
//! ```

pub mod core;

pub use crate::core::{
    bounded::CopyOutcome,
    config::TagOptions,
    error::{Result, TagError},
    header::ApeHeader,
    io::{BlockSink, ByteStream, FnSink, StreamAdapter, WriteSink},
    legacy::FixedTag,
    store::{ApeTag, TagKind, TagStore},
    writer::TagSink,
};

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tagged file on disk
///
/// Wraps a [`TagStore`] together with the file it was loaded from so the
/// tag can be saved back in place.
///
/// # Examples
///
/// ```rust,no_run
/// use tailtag::TagFile;
///
/// let file = TagFile::open("track.ape")?;
/// if let Some(title) = file.get("title") {
///     println!("Title: {}", String::from_utf8_lossy(&title));
/// }
/// # Ok::<(), tailtag::TagError>(())
/// ```
pub struct TagFile {
    stream: StreamAdapter<File>,
    store: TagStore,
    path: PathBuf,
}

impl TagFile {
    /// Open a file read-only with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, TagOptions::default())
    }

    /// Open a file with explicit options
    ///
    /// The file is opened for writing only when `options.edit_tags` is set.
    /// A corrupt tag is logged and treated as absent.
    pub fn open_with<P: AsRef<Path>>(path: P, options: TagOptions) -> Result<Self> {
        let path = path.as_ref();
        info!(
            "Opening {:?} ({})",
            path,
            if options.edit_tags { "edit" } else { "read-only" }
        );

        let file = OpenOptions::new()
            .read(true)
            .write(options.edit_tags)
            .open(path)?;
        let mut stream = StreamAdapter::new(file);

        let store = match TagStore::load(&mut stream, options) {
            Ok(store) => store,
            Err(e) if e.is_malformed() => {
                warn!("Ignoring corrupt tag in {:?}: {}", path, e);
                TagStore::new(options)
            }
            Err(e) => return Err(e),
        };

        Ok(TagFile {
            stream,
            store,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &TagStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TagStore {
        &mut self.store
    }

    pub fn kind(&self) -> Option<TagKind> {
        self.store.kind()
    }

    pub fn item_count(&self) -> usize {
        self.store.item_count()
    }

    /// Value of an item (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.store.get(name).map(|value| value.into_owned())
    }

    /// All visible items as `(name, value)`, in tag order
    pub fn items(&self) -> Vec<(String, Vec<u8>)> {
        self.store
            .iter()
            .map(|(name, value)| {
                (
                    String::from_utf8_lossy(&name).into_owned(),
                    value.into_owned(),
                )
            })
            .collect()
    }

    /// Set an item, replacing any item of the same name
    pub fn set(&mut self, name: &str, value: &[u8]) -> Result<()> {
        self.store.append(name, value)
    }

    /// Remove an item; returns false when it did not exist
    pub fn remove(&mut self, name: &str) -> bool {
        self.store.delete(name)
    }

    /// Write the tag back into the file
    pub fn save(&mut self) -> Result<()> {
        info!("Saving tag to {:?}", self.path);
        self.store.write_in_place(&mut self.stream)?;
        self.stream.get_mut().sync_all()?;
        Ok(())
    }

    /// Human-readable reason for the last failed save
    pub fn error_message(&self) -> Option<&str> {
        self.store.error_message()
    }
}

/// Builder for opening a [`TagFile`] with custom options
///
/// # Examples
///
/// ```rust,no_run
/// use tailtag::TagFileBuilder;
///
/// # fn main() -> tailtag::Result<()> {
/// let file = TagFileBuilder::new()
///     .path("album/01.wv")
///     .edit_tags()
///     .max_tag_length(256 * 1024)
///     .open()?;
/// # Ok(())
/// # }
/// ```
pub struct TagFileBuilder {
    path: Option<PathBuf>,
    options: TagOptions,
}

impl TagFileBuilder {
    pub fn new() -> Self {
        TagFileBuilder {
            path: None,
            options: TagOptions::default(),
        }
    }

    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace all options at once, e.g. with ones loaded from TOML
    pub fn options(mut self, options: TagOptions) -> Self {
        self.options = options;
        self
    }

    /// Open the file writable so the tag can be saved in place
    pub fn edit_tags(mut self) -> Self {
        self.options.edit_tags = true;
        self
    }

    pub fn max_tag_length(mut self, limit: u32) -> Self {
        self.options.max_tag_length = limit;
        self
    }

    /// Accept tags whose item list does not scan cleanly
    pub fn skip_item_validation(mut self) -> Self {
        self.options.validate_items = false;
        self
    }

    pub fn open(self) -> Result<TagFile> {
        let path = self.path.ok_or_else(|| {
            TagError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path must be set",
            ))
        })?;

        debug!("Building tag file for {:?}", path);
        TagFile::open_with(path, self.options)
    }
}

impl Default for TagFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
