//! Display keys for ledger maps.
//!
//! A key is a contract's base name, optionally followed by `#` and a tag:
//! `Vault`, `Vault#1a2b3c4d`, `Vault#v1`. Tags that are exactly 8 hex digits
//! are short hashes generated by Chronicle; anything else was chosen by an
//! operator.

use std::fmt;

use crate::hash::{InitcodeHash, SHORT_HASH_LEN};

/// Separator between the base name and the tag.
pub const TAG_SEPARATOR: char = '#';

/// A parsed `base#tag` key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey {
    base: String,
    tag: Option<String>,
}

impl StorageKey {
    /// A key with no tag.
    pub fn bare(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            tag: None,
        }
    }

    /// A key with an explicit tag.
    pub fn tagged(base: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            tag: Some(tag.into()),
        }
    }

    /// The key a freshly merged record is stored under within one batch:
    /// the base name plus the short initcode hash, when known.
    pub fn for_record(base: impl Into<String>, hash: Option<&InitcodeHash>) -> Self {
        match hash {
            Some(hash) => Self::tagged(base, hash.short()),
            None => Self::bare(base),
        }
    }

    /// Split an existing key on the first separator.
    pub fn parse(key: &str) -> Self {
        match key.split_once(TAG_SEPARATOR) {
            Some((base, tag)) => Self::tagged(base, tag),
            None => Self::bare(key),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The existing tag, unless it is an auto-generated short hash.
    pub fn human_tag(&self) -> Option<&str> {
        self.tag().filter(|tag| !is_auto_tag(tag))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}{}{}", self.base, TAG_SEPARATOR, tag),
            None => f.write_str(&self.base),
        }
    }
}

/// Base name of a key (everything before the first `#`).
pub fn base_name(key: &str) -> &str {
    key.split(TAG_SEPARATOR).next().unwrap_or(key)
}

/// Whether a tag looks like an auto-generated short hash (8 hex digits).
pub fn is_auto_tag(tag: &str) -> bool {
    tag.len() == SHORT_HASH_LEN && tag.chars().all(|c| c.is_ascii_hexdigit())
}
