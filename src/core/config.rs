//! Engine options
//!
//! Options can be built in code with the chained setters or loaded from a
//! TOML document:
//!
//! ```toml
//! edit_tags = true
//! max_tag_length = 65536
//! validate_items = true
//! ```

use crate::core::error::Result;
use crate::core::header::MAX_TAG_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling how tags are loaded, edited and written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagOptions {
    /// Grants the tag-edit capability needed for random-access rewrites
    pub edit_tags: bool,

    /// Upper bound (exclusive) on the total APE tag length, header included.
    /// Values above 1 MiB are capped at 1 MiB.
    pub max_tag_length: u32,

    /// Walk the item list at load time and reject lists that overrun the blob
    pub validate_items: bool,
}

impl TagOptions {
    pub fn new() -> Self {
        TagOptions {
            edit_tags: false,
            max_tag_length: MAX_TAG_LENGTH,
            validate_items: true,
        }
    }

    pub fn edit_tags(mut self, enabled: bool) -> Self {
        self.edit_tags = enabled;
        self
    }

    pub fn max_tag_length(mut self, limit: u32) -> Self {
        self.max_tag_length = limit;
        self
    }

    pub fn validate_items(mut self, enabled: bool) -> Self {
        self.validate_items = enabled;
        self
    }

    /// Length bound actually enforced; never above [`MAX_TAG_LENGTH`]
    pub fn tag_length_limit(&self) -> u32 {
        self.max_tag_length.min(MAX_TAG_LENGTH)
    }

    /// Parse options from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load options from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

impl Default for TagOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TagError;

    #[test]
    fn test_defaults() {
        let options = TagOptions::default();
        assert!(!options.edit_tags);
        assert!(options.validate_items);
        assert_eq!(options.max_tag_length, 1024 * 1024);
    }

    #[test]
    fn test_from_toml_partial() {
        let options = TagOptions::from_toml_str("edit_tags = true").unwrap();
        assert!(options.edit_tags);
        assert_eq!(options.max_tag_length, MAX_TAG_LENGTH);
    }

    #[test]
    fn test_from_toml_full() {
        let options = TagOptions::from_toml_str(
            "edit_tags = false\nmax_tag_length = 4096\nvalidate_items = false\n",
        )
        .unwrap();
        assert_eq!(
            options,
            TagOptions::new().max_tag_length(4096).validate_items(false)
        );
    }

    #[test]
    fn test_length_limit_is_capped() {
        assert_eq!(TagOptions::new().tag_length_limit(), MAX_TAG_LENGTH);
        assert_eq!(TagOptions::new().max_tag_length(4096).tag_length_limit(), 4096);
        assert_eq!(
            TagOptions::new().max_tag_length(u32::MAX).tag_length_limit(),
            MAX_TAG_LENGTH
        );

        let options = TagOptions::from_toml_str("max_tag_length = 4294967295").unwrap();
        assert_eq!(options.tag_length_limit(), MAX_TAG_LENGTH);
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        let result = TagOptions::from_toml_str("max_tag_length = \"big\"");
        assert!(matches!(result, Err(TagError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"edit_tags = true\n").unwrap();

        let options = TagOptions::load(file.path()).unwrap();
        assert!(options.edit_tags);
    }
}
