//! Writing the active APEv2 tag back out
//!
//! Both paths emit the same sequence: the leading header copy (only when
//! the tag carries one), the item blob, then the footer. The in-place path
//! first zero-fills whatever part of the old tag region the new tag does not
//! cover, so the tag still ends exactly at end of stream.

use crate::core::error::{Result, TagError};
use crate::core::header::HEADER_SIZE;
use crate::core::io::{BlockSink, ByteStream};
use crate::core::store::{ApeTag, TagStore};
use std::io::SeekFrom;
use tracing::{debug, warn};

/// Message recorded when a write comes up short
pub const WRITE_FAILED: &str = "can't write tag data, disk probably full!";

/// Where [`TagStore::write_tag`] sends its output
pub enum TagSink<'a> {
    /// Append-only output, e.g. a container being encoded
    Blocks(&'a mut dyn BlockSink),
    /// The stream the tag was loaded from, rewritten in place
    Stream(&'a mut dyn ByteStream),
}

impl TagStore {
    /// Write the tag to whichever sink the container was opened with
    pub fn write_tag(&mut self, sink: TagSink<'_>) -> Result<()> {
        match sink {
            TagSink::Blocks(sink) => self.write_to_sink(sink),
            TagSink::Stream(stream) => self.write_in_place(stream),
        }
    }

    /// Emit the tag as blocks on an append-only sink
    ///
    /// Nothing is emitted when there is no APEv2 tag or it has no items.
    pub fn write_to_sink<K: BlockSink + ?Sized>(&mut self, sink: &mut K) -> Result<()> {
        let Some(tag) = self.writable_tag() else {
            debug!("No APEv2 items to emit");
            return Ok(());
        };

        let header = tag.header;
        let mut ok = true;
        if header.has_header_copy() {
            ok &= sink.emit(&header.to_bytes(true));
        }
        if !tag.blob.is_empty() {
            ok &= sink.emit(&tag.blob);
        }
        ok &= sink.emit(&header.to_bytes(false));

        if !ok {
            return self.fail(TagError::SinkRejected);
        }

        debug!("Emitted APEv2 tag ({} bytes)", header.total_size());
        Ok(())
    }

    /// Rewrite the tag region at the end of `stream`
    ///
    /// Requires the tag-edit option and a seekable stream. The region
    /// starts at the anchor recorded when the tag was loaded; a smaller tag
    /// is preceded by zero padding, a larger one extends the stream.
    pub fn write_in_place<S: ByteStream + ?Sized>(&mut self, stream: &mut S) -> Result<()> {
        if !self.options().edit_tags {
            return self.fail(TagError::EditNotPermitted);
        }
        if !stream.can_seek() {
            return self.fail(TagError::SeekUnsupported);
        }

        match self.rewrite(stream) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    fn rewrite<S: ByteStream + ?Sized>(&mut self, stream: &mut S) -> Result<()> {
        let tag_size = self.writable_tag().map_or(0, |tag| tag.header.total_size());
        let region = self.anchor.unsigned_abs() as usize;

        stream.seek(SeekFrom::End(self.anchor))?;

        if tag_size < region {
            let padding = vec![0u8; region - tag_size];
            write_all(stream, &padding)?;
        }

        if let Some(tag) = self.writable_tag() {
            let header = tag.header;
            if header.has_header_copy() {
                write_all(stream, &header.to_bytes(true))?;
            }
            write_all(stream, &tag.blob)?;
            write_all(stream, &header.to_bytes(false))?;
        }

        self.anchor = -(region.max(tag_size) as i64);
        debug!(
            "Rewrote tag region: {} tag bytes, {} padding bytes",
            tag_size,
            region.saturating_sub(tag_size)
        );
        Ok(())
    }

    fn writable_tag(&self) -> Option<&ApeTag> {
        self.ape().filter(|tag| {
            tag.header.item_count > 0 && tag.header.length as usize > HEADER_SIZE
        })
    }

    fn fail(&mut self, err: TagError) -> Result<()> {
        warn!("Tag write failed: {}", err);
        match err {
            TagError::ShortWrite { .. } | TagError::SinkRejected => self.set_error(WRITE_FAILED),
            ref other => self.set_error(other.to_string()),
        }
        Err(err)
    }
}

fn write_all<S: ByteStream + ?Sized>(stream: &mut S, buf: &[u8]) -> Result<()> {
    let written = stream.write_bytes(buf)?;
    if written != buf.len() {
        return Err(TagError::ShortWrite {
            expected: buf.len(),
            written,
        });
    }
    Ok(())
}
