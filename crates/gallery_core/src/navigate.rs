//! Navigation intents: arrow keys, swipe gestures, and folder-tree clicks all
//! resolve to a content path (or to nothing) without touching any UI state.

use shared::domain::NeighborLinks;
use shared::protocol::TreeNode;

/// Minimum displacement on the dominant axis for a drag to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
}

/// Resolves an arrow key against the page's neighbor links. Absent targets
/// make the key press a no-op.
pub fn resolve_arrow(key: ArrowKey, neighbors: &NeighborLinks) -> Option<&str> {
    match key {
        ArrowKey::Right => neighbors.next.as_deref(),
        ArrowKey::Left => neighbors.previous.as_deref(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeGesture {
    Left,
    Right,
    Up,
    Down,
}

/// Start/end displacement resolution for one pointer interaction.
///
/// The dominant axis decides the gesture; a displacement below
/// [`SWIPE_THRESHOLD`] on that axis discards the interaction entirely, minor
/// axis included.
pub fn resolve_swipe(dx: f32, dy: f32) -> Option<SwipeGesture> {
    if dx.abs() > dy.abs() {
        if dx.abs() < SWIPE_THRESHOLD {
            return None;
        }
        Some(if dx > 0.0 {
            SwipeGesture::Right
        } else {
            SwipeGesture::Left
        })
    } else {
        if dy.abs() < SWIPE_THRESHOLD {
            return None;
        }
        Some(if dy > 0.0 {
            SwipeGesture::Down
        } else {
            SwipeGesture::Up
        })
    }
}

/// Maps a gesture to a navigation target. A rightward swipe pulls the
/// previous sibling back, mirroring the arrow keys; vertical gestures are
/// recognized but bound to no action.
pub fn swipe_target(gesture: SwipeGesture, neighbors: &NeighborLinks) -> Option<&str> {
    match gesture {
        SwipeGesture::Right => neighbors.previous.as_deref(),
        SwipeGesture::Left => neighbors.next.as_deref(),
        SwipeGesture::Up | SwipeGesture::Down => None,
    }
}

/// Tracks one pointer interaction from press to release.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start: Option<(f32, f32)>,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f32, y: f32) {
        self.start = Some((x, y));
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }

    /// Consumes the tracked start point and resolves the gesture, if any.
    pub fn finish(&mut self, x: f32, y: f32) -> Option<SwipeGesture> {
        let (start_x, start_y) = self.start.take()?;
        resolve_swipe(x - start_x, y - start_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeInteraction {
    Click,
    DoubleClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeAction<'a> {
    /// Flip the entry's expanded state; no navigation.
    ToggleExpanded,
    Navigate(&'a str),
    Ignore,
}

/// Folder-tree semantics: a single click on an entry with children toggles
/// its expansion, a double click navigates; leaves navigate on a single
/// click. Entries without an href resolve to nothing.
pub fn resolve_tree_interaction(node: &TreeNode, interaction: TreeInteraction) -> TreeAction<'_> {
    if node.has_children() && interaction == TreeInteraction::Click {
        return TreeAction::ToggleExpanded;
    }
    match node.href.as_deref() {
        Some(href) => TreeAction::Navigate(href),
        None => TreeAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbors(previous: Option<&str>, next: Option<&str>) -> NeighborLinks {
        NeighborLinks {
            previous: previous.map(str::to_string),
            next: next.map(str::to_string),
        }
    }

    fn node(name: &str, href: Option<&str>, children: usize) -> TreeNode {
        TreeNode {
            name: name.to_string(),
            href: href.map(str::to_string),
            selected: false,
            children: (0..children)
                .map(|i| TreeNode {
                    name: format!("child-{i}"),
                    href: None,
                    selected: false,
                    children: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn arrow_keys_follow_neighbor_links() {
        let links = neighbors(Some("a/1"), Some("a/3"));
        assert_eq!(resolve_arrow(ArrowKey::Right, &links), Some("a/3"));
        assert_eq!(resolve_arrow(ArrowKey::Left, &links), Some("a/1"));
    }

    #[test]
    fn arrow_key_without_target_is_a_no_op() {
        let links = neighbors(Some("a/1"), None);
        assert_eq!(resolve_arrow(ArrowKey::Right, &links), None);
    }

    #[test]
    fn horizontal_swipe_over_threshold_resolves_once() {
        assert_eq!(resolve_swipe(200.0, 10.0), Some(SwipeGesture::Right));
        assert_eq!(resolve_swipe(-200.0, 10.0), Some(SwipeGesture::Left));
    }

    #[test]
    fn below_threshold_swipes_are_ignored_entirely() {
        assert_eq!(resolve_swipe(100.0, 10.0), None);
        assert_eq!(resolve_swipe(140.0, 100.0), None);
        assert_eq!(resolve_swipe(-149.9, 0.0), None);
    }

    #[test]
    fn vertical_swipes_resolve_but_bind_to_nothing() {
        let gesture = resolve_swipe(10.0, 200.0).expect("vertical gesture");
        assert_eq!(gesture, SwipeGesture::Down);
        let links = neighbors(Some("a/1"), Some("a/3"));
        assert_eq!(swipe_target(gesture, &links), None);
    }

    #[test]
    fn equal_displacement_falls_to_the_vertical_branch() {
        assert_eq!(resolve_swipe(200.0, 200.0), Some(SwipeGesture::Down));
        assert_eq!(resolve_swipe(200.0, -200.0), Some(SwipeGesture::Up));
    }

    #[test]
    fn swipe_direction_maps_to_neighbors() {
        let links = neighbors(Some("a/1"), Some("a/3"));
        assert_eq!(swipe_target(SwipeGesture::Right, &links), Some("a/1"));
        assert_eq!(swipe_target(SwipeGesture::Left, &links), Some("a/3"));
    }

    #[test]
    fn tracker_resolves_press_to_release_displacement() {
        let mut tracker = SwipeTracker::default();
        tracker.begin(300.0, 100.0);
        assert_eq!(tracker.finish(80.0, 110.0), Some(SwipeGesture::Left));
        // The gesture is discarded after resolution.
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.finish(0.0, 0.0), None);
    }

    #[test]
    fn folder_click_toggles_and_double_click_navigates() {
        let folder = node("albums", Some("albums"), 2);
        assert_eq!(
            resolve_tree_interaction(&folder, TreeInteraction::Click),
            TreeAction::ToggleExpanded
        );
        assert_eq!(
            resolve_tree_interaction(&folder, TreeInteraction::DoubleClick),
            TreeAction::Navigate("albums")
        );
    }

    #[test]
    fn leaf_click_navigates_directly() {
        let leaf = node("inbox", Some("inbox"), 0);
        assert_eq!(
            resolve_tree_interaction(&leaf, TreeInteraction::Click),
            TreeAction::Navigate("inbox")
        );
    }

    #[test]
    fn missing_href_is_ignored() {
        let leaf = node("stub", None, 0);
        assert_eq!(
            resolve_tree_interaction(&leaf, TreeInteraction::Click),
            TreeAction::Ignore
        );
        let folder = node("stub", None, 1);
        assert_eq!(
            resolve_tree_interaction(&folder, TreeInteraction::DoubleClick),
            TreeAction::Ignore
        );
    }
}
