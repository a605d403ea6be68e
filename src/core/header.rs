use crate::core::error::{Result, TagError};

pub const MAGIC: [u8; 8] = *b"APETAGEX";
pub const VERSION: u32 = 2000;

/// Size of one header or footer copy on the wire
pub const HEADER_SIZE: usize = 32;

/// Sanity bound on the total tag length (exclusive)
pub const MAX_TAG_LENGTH: u32 = 1024 * 1024;

/// A duplicate header also precedes the item blob
pub const FLAG_HAS_HEADER: u32 = 0x8000_0000;

/// This copy is the leading header, not the trailing footer
pub const FLAG_IS_HEADER: u32 = 0x2000_0000;

/// APEv2 tag header / footer
///
/// The same 32-byte structure is written before the item list (when
/// [`FLAG_HAS_HEADER`] is set) and after it. `length` counts the item list
/// plus one copy of this structure, never the optional leading copy.
///
/// ```text
/// 0   8  magic "APETAGEX"
/// 8   4  version (2000)
/// 12  4  length (items + footer)
/// 16  4  item count
/// 20  4  flags
/// 24  8  reserved, zero
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApeHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub length: u32,
    pub item_count: u32,
    pub flags: u32,
    pub reserved: [u8; 8],
}

impl ApeHeader {
    /// Header for a tag originated by this engine: no items, leading copy enabled
    pub fn new() -> Self {
        ApeHeader {
            magic: MAGIC,
            version: VERSION,
            length: HEADER_SIZE as u32,
            item_count: 0,
            flags: FLAG_HAS_HEADER,
            reserved: [0; 8],
        }
    }

    pub fn has_header_copy(&self) -> bool {
        self.flags & FLAG_HAS_HEADER != 0
    }

    /// Bytes taken by the item list
    pub fn blob_len(&self) -> usize {
        (self.length as usize).saturating_sub(HEADER_SIZE)
    }

    /// Bytes the tag occupies at the end of a stream, leading copy included
    pub fn total_size(&self) -> usize {
        let mut size = self.length as usize;
        if self.has_header_copy() {
            size += HEADER_SIZE;
        }
        size
    }

    /// Validate a footer before trusting its length
    ///
    /// Requires version 2000, at least one item and
    /// `HEADER_SIZE < length < limit`.
    pub fn validate(&self, limit: u32) -> Result<()> {
        if self.magic != MAGIC {
            return Err(TagError::InvalidMagic);
        }

        if self.version != VERSION {
            return Err(TagError::UnsupportedVersion(self.version));
        }

        if self.item_count == 0 || self.length <= HEADER_SIZE as u32 || self.length >= limit {
            return Err(TagError::InvalidLength(self.length));
        }

        Ok(())
    }

    /// Serialize one copy; `leading` sets [`FLAG_IS_HEADER`] on the wire only
    pub fn to_bytes(&self, leading: bool) -> [u8; HEADER_SIZE] {
        let flags = if leading {
            self.flags | FLAG_IS_HEADER
        } else {
            self.flags & !FLAG_IS_HEADER
        };

        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.length.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.item_count.to_le_bytes());
        bytes[20..24].copy_from_slice(&flags.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.reserved);
        bytes
    }

    /// Decode a header-sized block
    ///
    /// Only the magic is checked here; callers decide which of the other
    /// fields they trust.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(TagError::TruncatedRead {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        if bytes[0..8] != MAGIC {
            return Err(TagError::InvalidMagic);
        }

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&bytes[24..32]);

        Ok(ApeHeader {
            magic: MAGIC,
            version: read_u32_le(&bytes[8..12]),
            length: read_u32_le(&bytes[12..16]),
            item_count: read_u32_le(&bytes[16..20]),
            flags: read_u32_le(&bytes[20..24]),
            reserved,
        })
    }
}

impl Default for ApeHeader {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
