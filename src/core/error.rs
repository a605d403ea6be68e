use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("Invalid magic in tag header")]
    InvalidMagic,

    #[error("Unsupported APE tag version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid APE tag length: {0}")]
    InvalidLength(u32),

    #[error(
        "APE header/footer mismatch: footer reports {footer_items} items in {footer_length} bytes, \
         header reports {header_items} items in {header_length} bytes"
    )]
    HeaderMismatch {
        footer_items: u32,
        footer_length: u32,
        header_items: u32,
        header_length: u32,
    },

    #[error("Corrupt item list: {declared} items declared, only {scanned} scanned within bounds")]
    CorruptItems { declared: u32, scanned: u32 },

    #[error("Invalid item name: {0:?}")]
    InvalidItemName(String),

    #[error("Tag too large: {length} bytes exceeds limit of {limit}")]
    TagTooLarge { length: usize, limit: u32 },

    #[error("Truncated read: expected {expected} bytes, got {actual}")]
    TruncatedRead { expected: usize, actual: usize },

    #[error("Stream does not support seeking")]
    SeekUnsupported,

    #[error("Tag editing was not enabled when the stream was opened")]
    EditNotPermitted,

    #[error("Short write: expected {expected} bytes, wrote {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("Output sink rejected tag data")]
    SinkRejected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl TagError {
    /// True for errors caused by bytes found in the stream rather than by the stream itself
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            TagError::InvalidMagic
                | TagError::UnsupportedVersion(_)
                | TagError::InvalidLength(_)
                | TagError::HeaderMismatch { .. }
                | TagError::CorruptItems { .. }
                | TagError::TruncatedRead { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TagError>;
