//! APEv2 item codec
//!
//! Items are stored back to back in the blob that sits between the header
//! copies:
//!
//! ```text
//! value_size  u32 LE
//! flags       u32 LE
//! key         bytes, NUL terminated
//! value       value_size bytes
//! ```
//!
//! Every length read from the blob is checked against the bytes that are
//! actually left before it is used. A scan that hits an inconsistent item
//! simply ends; it never reads past the blob.

use crate::core::header::read_u32_le;

/// Item flag bits 1-2; items with either set are hidden from readers
pub const RESERVED_ITEM_FLAGS: u32 = 0x6;

/// Fixed per-item overhead: value size, flags and the key terminator
pub const ITEM_OVERHEAD: usize = 9;

/// One decoded item, borrowed from the blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawItem<'a> {
    /// Offset of the value-size field
    pub start: usize,
    /// Offset just past the value
    pub end: usize,
    pub flags: u32,
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> RawItem<'a> {
    /// Items with an empty key or value never match a lookup
    pub fn is_matchable(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.flags & RESERVED_ITEM_FLAGS == 0
    }

    pub fn key_matches(&self, name: &[u8]) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }
}

/// Front-to-back iterator over the items of a blob
///
/// Yields at most `item_count` items and stops early at the first item
/// whose declared sizes do not fit.
#[derive(Debug, Clone)]
pub struct ItemScanner<'a> {
    blob: &'a [u8],
    cursor: usize,
    remaining: u32,
    tag_length: u32,
    corrupt: bool,
}

impl<'a> ItemScanner<'a> {
    /// `tag_length` is the header's length field; no value may claim more
    pub fn new(blob: &'a [u8], item_count: u32, tag_length: u32) -> Self {
        ItemScanner {
            blob,
            cursor: 0,
            remaining: item_count,
            tag_length,
            corrupt: false,
        }
    }

    /// True once the scan stopped on an item that did not fit
    pub fn is_corrupt(&self) -> bool {
        self.corrupt
    }

    fn stop(&mut self) -> Option<RawItem<'a>> {
        self.corrupt = true;
        self.remaining = 0;
        None
    }
}

impl<'a> Iterator for ItemScanner<'a> {
    type Item = RawItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let start = self.cursor;
        let rest = &self.blob[start..];
        if rest.len() <= 8 {
            return self.stop();
        }

        let value_size = read_u32_le(&rest[0..4]);
        let flags = read_u32_le(&rest[4..8]);
        let body = &rest[8..];

        // A key without terminator runs to the end of the blob and can never fit.
        let key_len = body.iter().position(|&b| b == 0).unwrap_or(body.len());

        if value_size > i32::MAX as u32 || value_size > self.tag_length {
            return self.stop();
        }

        let value_size = value_size as usize;
        if key_len + 1 + value_size > body.len() {
            return self.stop();
        }

        let key = &body[..key_len];
        let value = &body[key_len + 1..key_len + 1 + value_size];
        let end = start + 8 + key_len + 1 + value_size;

        self.cursor = end;
        self.remaining -= 1;

        Some(RawItem {
            start,
            end,
            flags,
            key,
            value,
        })
    }
}

/// Number of items that can be scanned within bounds
pub fn scan_count(blob: &[u8], item_count: u32, tag_length: u32) -> u32 {
    ItemScanner::new(blob, item_count, tag_length).count() as u32
}

/// Append one encoded item with zero flags
pub fn encode_item(out: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    out.reserve(encoded_len(key, value));
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(key);
    out.push(0);
    out.extend_from_slice(value);
}

pub fn encoded_len(key: &[u8], value: &[u8]) -> usize {
    key.len() + value.len() + ITEM_OVERHEAD
}
