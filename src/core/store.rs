//! Tag store: the one active tag of an open container
//!
//! A store holds at most one tag, either an APEv2 tag (header plus owned
//! item blob) or an ID3v1 trailer, together with the anchor recorded at
//! load time. Lookups go through the item codec so a corrupt blob is never
//! walked past its end.

use crate::core::bounded::{self, CopyOutcome};
use crate::core::config::TagOptions;
use crate::core::error::{Result, TagError};
use crate::core::header::{ApeHeader, HEADER_SIZE};
use crate::core::item::{self, ItemScanner, RawItem};
use crate::core::legacy::FixedTag;
use std::borrow::Cow;
use tracing::debug;

/// Which format the active tag uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// APEv2
    Extensible,
    /// ID3v1
    Fixed,
}

/// APEv2 header plus the raw item list it describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApeTag {
    pub header: ApeHeader,
    pub blob: Vec<u8>,
}

impl ApeTag {
    /// Empty tag as originated by this engine
    pub fn new() -> Self {
        ApeTag {
            header: ApeHeader::new(),
            blob: Vec::new(),
        }
    }

    /// Every item within bounds, hidden ones included
    pub fn items(&self) -> ItemScanner<'_> {
        ItemScanner::new(&self.blob, self.header.item_count, self.header.length)
    }

    /// Items readers may see: non-empty key and value, reserved flags clear
    pub fn visible_items(&self) -> impl Iterator<Item = RawItem<'_>> {
        self.items()
            .filter(|item| item.is_matchable() && item.is_visible())
    }

    fn find_deletable(&self, name: &[u8]) -> Option<RawItem<'_>> {
        // Reserved-flag items still match here; only readers skip them.
        self.items()
            .find(|item| item.is_matchable() && item.key_matches(name))
    }
}

impl Default for ApeTag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActiveTag {
    Extensible(ApeTag),
    Fixed(FixedTag),
}

/// Tag state of one open container
#[derive(Debug, Clone)]
pub struct TagStore {
    pub(crate) tag: Option<ActiveTag>,
    pub(crate) anchor: i64,
    options: TagOptions,
    error_message: Option<String>,
}

impl TagStore {
    /// Empty store with no tag and nothing to overwrite
    pub fn new(options: TagOptions) -> Self {
        TagStore {
            tag: None,
            anchor: 0,
            options,
            error_message: None,
        }
    }

    pub fn options(&self) -> &TagOptions {
        &self.options
    }

    pub fn kind(&self) -> Option<TagKind> {
        match self.tag {
            Some(ActiveTag::Extensible(_)) => Some(TagKind::Extensible),
            Some(ActiveTag::Fixed(_)) => Some(TagKind::Fixed),
            None => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
    }

    pub fn ape(&self) -> Option<&ApeTag> {
        match &self.tag {
            Some(ActiveTag::Extensible(tag)) => Some(tag),
            _ => None,
        }
    }

    pub fn fixed(&self) -> Option<&FixedTag> {
        match &self.tag {
            Some(ActiveTag::Fixed(tag)) => Some(tag),
            _ => None,
        }
    }

    /// Offset from end of stream where the loaded tag began (0 if none)
    pub fn anchor(&self) -> i64 {
        self.anchor
    }

    /// Last write failure, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Drop the active tag; the anchor is kept so a rewrite still covers it
    pub fn clear(&mut self) {
        self.tag = None;
    }

    /// Number of visible items, in enumeration order
    pub fn item_count(&self) -> usize {
        (0..).take_while(|&index| self.name_at(index).is_some()).count()
    }

    /// Value of the named item (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        match &self.tag {
            Some(ActiveTag::Extensible(tag)) => tag
                .visible_items()
                .find(|item| item.key_matches(name.as_bytes()))
                .map(|item| Cow::Borrowed(item.value)),
            Some(ActiveTag::Fixed(tag)) => tag.get(name),
            None => None,
        }
    }

    /// Name of the `index`-th visible item
    pub fn name_at(&self, index: usize) -> Option<Cow<'_, [u8]>> {
        match &self.tag {
            Some(ActiveTag::Extensible(tag)) => tag
                .visible_items()
                .nth(index)
                .map(|item| Cow::Borrowed(item.key)),
            Some(ActiveTag::Fixed(tag)) => tag
                .name_at(index)
                .map(|name| Cow::Borrowed(name.as_bytes())),
            None => None,
        }
    }

    /// Name and value of the `index`-th visible item
    pub fn get_indexed(&self, index: usize) -> Option<(Cow<'_, [u8]>, Cow<'_, [u8]>)> {
        match &self.tag {
            Some(ActiveTag::Extensible(tag)) => tag
                .visible_items()
                .nth(index)
                .map(|item| (Cow::Borrowed(item.key), Cow::Borrowed(item.value))),
            Some(ActiveTag::Fixed(tag)) => {
                let name = tag.name_at(index)?;
                let value = tag.get(name)?;
                Some((Cow::Borrowed(name.as_bytes()), value))
            }
            None => None,
        }
    }

    /// All visible items in index order
    pub fn iter(&self) -> impl Iterator<Item = (Cow<'_, [u8]>, Cow<'_, [u8]>)> + '_ {
        (0..).map_while(move |index| self.get_indexed(index))
    }

    /// Copy the named value into `out` under the bounded-copy contract
    pub fn get_item(&self, name: &str, mut out: Option<&mut [u8]>) -> CopyOutcome {
        bounded::clear(out.as_deref_mut());
        match self.get(name) {
            Some(value) => bounded::copy_bounded(&value, out),
            None => CopyOutcome::NotFound,
        }
    }

    /// Copy the `index`-th item name into `out` under the bounded-copy contract
    pub fn get_item_indexed(&self, index: usize, mut out: Option<&mut [u8]>) -> CopyOutcome {
        bounded::clear(out.as_deref_mut());
        match self.name_at(index) {
            Some(name) => bounded::copy_bounded(&name, out),
            None => CopyOutcome::NotFound,
        }
    }

    /// Add an item, replacing every existing item of the same name
    ///
    /// Starts a new APEv2 tag (with a leading header copy) when none is
    /// active; an ID3v1 tag stops being visible once that happens.
    pub fn append(&mut self, name: &str, value: &[u8]) -> Result<()> {
        if name.as_bytes().contains(&0) {
            return Err(TagError::InvalidItemName(name.to_string()));
        }

        if let Some(tag) = self.ape() {
            if tag.header.item_count.checked_add(1).is_none() {
                return Err(TagError::CorruptItems {
                    declared: tag.header.item_count,
                    scanned: tag.items().count() as u32,
                });
            }
        }

        let limit = self.options.tag_length_limit();
        let current = self.ape().map_or(HEADER_SIZE, |tag| {
            let reclaimed: usize = tag
                .items()
                .filter(|item| item.is_matchable() && item.key_matches(name.as_bytes()))
                .map(|item| item.end - item.start)
                .sum();
            (tag.header.length as usize).saturating_sub(reclaimed)
        });
        let new_length = current + item::encoded_len(name.as_bytes(), value);
        if new_length >= limit as usize {
            return Err(TagError::TagTooLarge {
                length: new_length,
                limit,
            });
        }

        while self.delete(name) {}

        let mut tag = match self.tag.take() {
            Some(ActiveTag::Extensible(tag)) => tag,
            Some(ActiveTag::Fixed(_)) => {
                debug!("Replacing ID3v1 tag with a new APEv2 tag");
                ApeTag::new()
            }
            None => ApeTag::new(),
        };

        let mut blob = Vec::with_capacity(tag.blob.len() + item::encoded_len(name.as_bytes(), value));
        blob.extend_from_slice(&tag.blob);
        item::encode_item(&mut blob, name.as_bytes(), value);

        tag.header.length = (HEADER_SIZE + blob.len()) as u32;
        tag.header.item_count += 1;
        tag.blob = blob;

        debug!(
            "Appended item '{}' ({} bytes), tag now {} items / {} bytes",
            name,
            value.len(),
            tag.header.item_count,
            tag.header.length
        );
        self.tag = Some(ActiveTag::Extensible(tag));
        Ok(())
    }

    /// Remove the first item named `name` (case-insensitive)
    ///
    /// Returns false when there is no APEv2 tag or no such item.
    pub fn delete(&mut self, name: &str) -> bool {
        let Some(ActiveTag::Extensible(tag)) = &mut self.tag else {
            return false;
        };

        let Some((start, end)) = tag
            .find_deletable(name.as_bytes())
            .map(|item| (item.start, item.end))
        else {
            return false;
        };

        let mut blob = Vec::with_capacity(tag.blob.len() - (end - start));
        blob.extend_from_slice(&tag.blob[..start]);
        blob.extend_from_slice(&tag.blob[end..]);

        tag.header.length = (HEADER_SIZE + blob.len()) as u32;
        tag.header.item_count -= 1;
        tag.blob = blob;

        debug!("Deleted item '{}' ({} bytes)", name, end - start);
        true
    }
}

impl Default for TagStore {
    fn default() -> Self {
        Self::new(TagOptions::default())
    }
}
