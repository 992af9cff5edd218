//! Page-model contract between the vault server and its clients.
//!
//! The server renders one `PageSnapshot` per content path. Hrefs inside a
//! snapshot (`tree`, `breadcrumbs`, `items`, neighbor links) are content
//! paths; fetchable resources (`thumb_url`, `raw_url`, `upload_url`, the
//! favorite form action) are URL paths resolved against the server base.

use serde::{Deserialize, Serialize};

use crate::domain::{ItemKind, NeighborLinks};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Whether the node lies on the currently open content path.
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub name: String,
    pub kind: ItemKind,
    /// Content path opened when the item is activated.
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    /// Deferred items hold their thumbnail fetch until revealed.
    #[serde(default)]
    pub deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// The favorite form exactly as the page declares it; clients submit the
/// declared method and action verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteForm {
    pub method: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentView {
    pub raw_url: String,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PageBody {
    Listing { items: Vec<ItemSummary> },
    Single { content: ContentView },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tree: Vec<TreeNode>,
    #[serde(flatten)]
    pub neighbors: NeighborLinks,
    /// Upload destination for dropped files; absence disables uploads on this
    /// page entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<FavoriteForm>,
    pub body: PageBody,
}

impl PageSnapshot {
    pub fn is_listing(&self) -> bool {
        matches!(self.body, PageBody::Listing { .. })
    }
}
