use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    ProfileImage(String),
    Album(String),
}

impl ResourceKey {
    pub fn profile_image(filename: &str) -> Result<Self, CoreError> {
        let trimmed = filename.trim();
        if trimmed.is_empty() || trimmed.contains('/') || trimmed.contains("..") {
            return Err(CoreError::InvalidResourceKey(trimmed.to_string()));
        }
        Ok(Self::ProfileImage(trimmed.to_string()))
    }

    pub fn album(catalog_id: &str) -> Result<Self, CoreError> {
        let trimmed = catalog_id.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidResourceKey(trimmed.to_string()));
        }
        Ok(Self::Album(trimmed.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceKey::ProfileImage(_) => "profile_image",
            ResourceKey::Album(_) => "album",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResourceKey::ProfileImage(value) | ResourceKey::Album(value) => value,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumMetadata {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Image(ImageBlob),
    Album(AlbumMetadata),
    Missing,
}

impl Resource {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resource::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceKey;

    #[test]
    fn profile_image_rejects_paths() {
        assert!(ResourceKey::profile_image("avatar.png").is_ok());
        assert!(ResourceKey::profile_image("../etc/passwd").is_err());
        assert!(ResourceKey::profile_image("a/b.png").is_err());
        assert!(ResourceKey::profile_image("  ").is_err());
    }

    #[test]
    fn album_requires_alphanumeric_id() {
        let key = ResourceKey::album("4aawyAB9vmqN3uQ7FjRGTy").unwrap();
        assert_eq!(key.to_string(), "album:4aawyAB9vmqN3uQ7FjRGTy");
        assert!(ResourceKey::album("bad id").is_err());
    }
}
