use serde::{Deserialize, Serialize};

/// File suffixes the vault serves as images.
pub const IMAGE_SUFFIXES: [&str; 4] = ["jpeg", "jpg", "png", "gif"];
/// File suffixes the vault serves as videos.
pub const VIDEO_SUFFIXES: [&str; 3] = ["mov", "mp4", "m4v"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Dir,
    Image,
    Video,
    Unknown,
}

impl ItemKind {
    /// Classifies a plain file name by its suffix. Directories are decided by
    /// the server and never inferred from a name.
    pub fn from_file_name(name: &str) -> Self {
        let suffix = name
            .rsplit_once('.')
            .map(|(_, suffix)| suffix.to_ascii_lowercase())
            .unwrap_or_default();
        if IMAGE_SUFFIXES.contains(&suffix.as_str()) {
            ItemKind::Image
        } else if VIDEO_SUFFIXES.contains(&suffix.as_str()) {
            ItemKind::Video
        } else {
            ItemKind::Unknown
        }
    }

    pub fn is_media(self) -> bool {
        matches!(self, ItemKind::Image | ItemKind::Video)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Grid,
    Column,
}

/// Sibling navigation hints carried by a page. Either side may be absent at a
/// boundary item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborLinks {
    #[serde(
        rename = "neighbor_previous",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub previous: Option<String>,
    #[serde(
        rename = "neighbor_next",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next: Option<String>,
}

impl NeighborLinks {
    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_suffix_case_insensitively() {
        assert_eq!(ItemKind::from_file_name("beach.JPG"), ItemKind::Image);
        assert_eq!(ItemKind::from_file_name("clip.m4v"), ItemKind::Video);
        assert_eq!(ItemKind::from_file_name("notes.txt"), ItemKind::Unknown);
        assert_eq!(ItemKind::from_file_name("no_suffix"), ItemKind::Unknown);
    }
}
