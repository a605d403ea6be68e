//! Locating and loading the trailing tag of a stream
//!
//! The APEv2 footer is probed first at the very end of the stream. When it
//! is not there, the last 128 bytes are checked for an ID3v1 trailer; if one
//! is found the APEv2 probe is repeated just before it, because some writers
//! stack both. An APEv2 tag always wins over an ID3v1 tag.

use crate::core::config::TagOptions;
use crate::core::error::{Result, TagError};
use crate::core::header::{ApeHeader, FLAG_IS_HEADER, HEADER_SIZE};
use crate::core::io::ByteStream;
use crate::core::item;
use crate::core::legacy::{FixedTag, FIXED_TAG_SIZE};
use crate::core::store::{ActiveTag, ApeTag, TagStore};
use std::io::SeekFrom;
use tracing::{debug, warn};

impl TagStore {
    /// Load the tag at the end of `stream`
    ///
    /// Returns an empty store when no tag is present. A tag that is found
    /// but turns out to be corrupt (header/footer disagreement, truncated
    /// item blob, items overrunning the blob) is an error.
    pub fn load<S: ByteStream + ?Sized>(stream: &mut S, options: TagOptions) -> Result<TagStore> {
        let mut store = TagStore::new(options);

        if !stream.can_seek() {
            debug!("Stream cannot seek, skipping tag probe");
            return Ok(store);
        }

        let end = stream.seek(SeekFrom::End(0))?;
        let mut fixed: Option<FixedTag> = None;

        loop {
            let trailer = if fixed.is_some() { FIXED_TAG_SIZE } else { 0 };

            if let Some(footer) = probe_footer(stream, end, trailer)? {
                match footer.validate(options.tag_length_limit()) {
                    Ok(()) => {
                        let (tag, anchor) = read_ape(stream, end, footer, trailer, &options)?;
                        debug!(
                            "Loaded APEv2 tag: {} items, {} bytes, anchor {}",
                            tag.header.item_count, tag.header.length, anchor
                        );
                        store.tag = Some(ActiveTag::Extensible(tag));
                        store.anchor = anchor;
                        return Ok(store);
                    }
                    Err(e) => debug!("Ignoring APEv2 footer: {}", e),
                }
            }

            if let Some(tag) = fixed {
                debug!("Loaded ID3v1 tag");
                store.tag = Some(ActiveTag::Fixed(tag));
                store.anchor = -(FIXED_TAG_SIZE as i64);
                return Ok(store);
            }

            match probe_fixed(stream, end)? {
                Some(tag) => fixed = Some(tag),
                None => {
                    debug!("No tag found");
                    return Ok(store);
                }
            }
        }
    }
}

/// Read a header-sized block ending `trailer` bytes before the end
fn probe_footer<S: ByteStream + ?Sized>(
    stream: &mut S,
    end: u64,
    trailer: usize,
) -> Result<Option<ApeHeader>> {
    let offset = (HEADER_SIZE + trailer) as u64;
    if end < offset {
        return Ok(None);
    }

    stream.seek(SeekFrom::End(-(offset as i64)))?;
    let mut block = [0u8; HEADER_SIZE];
    if stream.read_bytes(&mut block)? != HEADER_SIZE {
        return Ok(None);
    }

    Ok(ApeHeader::from_bytes(&block).ok())
}

fn probe_fixed<S: ByteStream + ?Sized>(stream: &mut S, end: u64) -> Result<Option<FixedTag>> {
    if end < FIXED_TAG_SIZE as u64 {
        return Ok(None);
    }

    stream.seek(SeekFrom::End(-(FIXED_TAG_SIZE as i64)))?;
    let mut block = [0u8; FIXED_TAG_SIZE];
    if stream.read_bytes(&mut block)? != FIXED_TAG_SIZE {
        return Ok(None);
    }

    Ok(FixedTag::from_bytes(&block).ok())
}

/// Read the item blob described by a validated footer
fn read_ape<S: ByteStream + ?Sized>(
    stream: &mut S,
    end: u64,
    footer: ApeHeader,
    trailer: usize,
    options: &TagOptions,
) -> Result<(ApeTag, i64)> {
    let span = (footer.total_size() + trailer) as u64;
    if span > end {
        warn!(
            "APEv2 tag claims {} bytes but the stream holds only {}",
            span, end
        );
        return Err(TagError::InvalidLength(footer.length));
    }

    let anchor = -(span as i64);
    stream.seek(SeekFrom::End(anchor))?;

    if footer.has_header_copy() {
        let mut block = [0u8; HEADER_SIZE];
        let read = stream.read_bytes(&mut block)?;
        if read != HEADER_SIZE {
            return Err(TagError::TruncatedRead {
                expected: HEADER_SIZE,
                actual: read,
            });
        }

        let leading = ApeHeader::from_bytes(&block)?;
        if leading.version != footer.version
            || leading.item_count != footer.item_count
            || leading.length != footer.length
        {
            warn!("APEv2 leading header does not match footer");
            return Err(TagError::HeaderMismatch {
                footer_items: footer.item_count,
                footer_length: footer.length,
                header_items: leading.item_count,
                header_length: leading.length,
            });
        }
    }

    let mut blob = vec![0u8; footer.blob_len()];
    let read = stream.read_bytes(&mut blob)?;
    if read != blob.len() {
        return Err(TagError::TruncatedRead {
            expected: blob.len(),
            actual: read,
        });
    }

    // Every item takes at least ITEM_OVERHEAD bytes, validated or not.
    let capacity = (blob.len() / item::ITEM_OVERHEAD) as u32;
    if options.validate_items || footer.item_count > capacity {
        let scanned = item::scan_count(&blob, footer.item_count, footer.length);
        if scanned != footer.item_count {
            warn!(
                "APEv2 item list is corrupt: {} of {} items in bounds",
                scanned, footer.item_count
            );
            return Err(TagError::CorruptItems {
                declared: footer.item_count,
                scanned,
            });
        }
    }

    let mut header = footer;
    header.flags &= !FLAG_IS_HEADER;

    Ok((ApeTag { header, blob }, anchor))
}
