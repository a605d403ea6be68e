//! ID3v1 trailer support (read-only)

use crate::core::error::{Result, TagError};
use std::borrow::Cow;

pub const MAGIC: [u8; 3] = *b"TAG";

/// Size of the fixed trailer on the wire
pub const FIXED_TAG_SIZE: usize = 128;

/// Field names in enumeration order
pub const FIELD_NAMES: [&str; 6] = ["Title", "Artist", "Album", "Year", "Comment", "Track"];

/// Fixed 128-byte ID3v1 trailer
///
/// ```text
/// 0    3  "TAG"
/// 3   30  title
/// 33  30  artist
/// 63  30  album
/// 93   4  year
/// 97  30  comment (bytes 28/29 may hold a track number)
/// 127  1  genre
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTag {
    pub title: [u8; 30],
    pub artist: [u8; 30],
    pub album: [u8; 30],
    pub year: [u8; 4],
    pub comment: [u8; 30],
    pub genre: u8,
}

impl FixedTag {
    /// Decode a trailer; fails unless it starts with "TAG"
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIXED_TAG_SIZE {
            return Err(TagError::TruncatedRead {
                expected: FIXED_TAG_SIZE,
                actual: bytes.len(),
            });
        }

        if bytes[0..3] != MAGIC {
            return Err(TagError::InvalidMagic);
        }

        let mut tag = FixedTag {
            title: [0; 30],
            artist: [0; 30],
            album: [0; 30],
            year: [0; 4],
            comment: [0; 30],
            genre: bytes[127],
        };
        tag.title.copy_from_slice(&bytes[3..33]);
        tag.artist.copy_from_slice(&bytes[33..63]);
        tag.album.copy_from_slice(&bytes[63..93]);
        tag.year.copy_from_slice(&bytes[93..97]);
        tag.comment.copy_from_slice(&bytes[97..127]);

        Ok(tag)
    }

    pub fn to_bytes(&self) -> [u8; FIXED_TAG_SIZE] {
        let mut bytes = [0u8; FIXED_TAG_SIZE];
        bytes[0..3].copy_from_slice(&MAGIC);
        bytes[3..33].copy_from_slice(&self.title);
        bytes[33..63].copy_from_slice(&self.artist);
        bytes[63..93].copy_from_slice(&self.album);
        bytes[93..97].copy_from_slice(&self.year);
        bytes[97..127].copy_from_slice(&self.comment);
        bytes[127] = self.genre;
        bytes
    }

    /// Track number stored in the last comment byte (ID3v1.1)
    pub fn track(&self) -> Option<u8> {
        if self.comment[29] != 0 && self.comment[28] == 0 {
            Some(self.comment[29])
        } else {
            None
        }
    }

    /// Look up a field by case-insensitive name, trimmed
    ///
    /// Fields that are blank after trimming are reported as absent.
    pub fn get(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        let raw: &[u8] = if name.eq_ignore_ascii_case("title") {
            &self.title
        } else if name.eq_ignore_ascii_case("artist") {
            &self.artist
        } else if name.eq_ignore_ascii_case("album") {
            &self.album
        } else if name.eq_ignore_ascii_case("year") {
            &self.year
        } else if name.eq_ignore_ascii_case("comment") {
            &self.comment
        } else if name.eq_ignore_ascii_case("track") {
            return self
                .track()
                .map(|track| Cow::Owned(track.to_string().into_bytes()));
        } else {
            return None;
        };

        let value = trim_field(raw);
        if value.is_empty() {
            None
        } else {
            Some(Cow::Borrowed(value))
        }
    }

    /// Name of the `index`-th populated field
    pub fn name_at(&self, index: usize) -> Option<&'static str> {
        let populated = [
            has_data(&self.title),
            has_data(&self.artist),
            has_data(&self.album),
            has_data(&self.year),
            has_data(&self.comment),
            self.track().is_some(),
        ];

        FIELD_NAMES
            .iter()
            .zip(populated)
            .filter(|(_, present)| *present)
            .map(|(name, _)| *name)
            .nth(index)
    }
}

/// Trim a fixed-width field
///
/// A trailing non-NUL byte preceded by NUL is a track number and is
/// dropped. Leading spaces and trailing spaces/NULs are removed, and the
/// result ends at the first interior NUL.
pub fn trim_field(field: &[u8]) -> &[u8] {
    let mut start = 0;
    let mut end = field.len();

    if end >= 2 && field[end - 1] != 0 && field[end - 2] == 0 {
        end -= 1;
    }

    while start < end {
        if field[start] == b' ' {
            start += 1;
        } else if field[end - 1] == 0 || field[end - 1] == b' ' {
            end -= 1;
        } else {
            break;
        }
    }

    let trimmed = &field[start..end];
    match trimmed.iter().position(|&b| b == 0) {
        Some(nul) => &trimmed[..nul],
        None => trimmed,
    }
}

/// True if the field has anything left after trimming
pub fn has_data(field: &[u8]) -> bool {
    !trim_field(field).is_empty()
}
