//! Resolves which editor region a DOM node belongs to.
//!
//! The editor widget exposes no "which editor am I in" API. The only anchor is
//! the hidden textarea the host page renders beside each editor, whose id
//! encodes both the kind and the numeric id (`SectionTextarea42`). We walk up
//! from the node and, at each level, look at the node and its siblings.

use crate::models::{EditorInfo, EditorKind};
use crate::util::trailing_number;

/// The slice of a DOM node the search needs.
pub(crate) trait TreeNode: Clone {
    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Vec<Self>;
    fn tag_name(&self) -> String;
    fn id(&self) -> String;
}

impl TreeNode for web_sys::Element {
    fn parent(&self) -> Option<Self> {
        self.parent_element()
    }

    fn children(&self) -> Vec<Self> {
        crate::util::element_children(self)
    }

    fn tag_name(&self) -> String {
        web_sys::Element::tag_name(self)
    }

    fn id(&self) -> String {
        web_sys::Element::id(self)
    }
}

fn editor_anchor<N: TreeNode>(node: &N) -> Option<EditorInfo> {
    if !node.tag_name().eq_ignore_ascii_case("textarea") {
        return None;
    }

    let dom_id = node.id();
    let kind = EditorKind::from_textarea_id(&dom_id)?;
    let numeric_id = trailing_number(&dom_id);
    if numeric_id.is_none() {
        tracing::error!("Could not parse numeric id from {dom_id}");
    }

    Some(EditorInfo {
        kind,
        dom_id,
        numeric_id,
    })
}

/// Nearest editor anchor: the node itself, then its siblings, then the same
/// for each ancestor up to the root.
pub(crate) fn find_editor_info<N: TreeNode>(start: &N) -> Option<EditorInfo> {
    let mut current = Some(start.clone());

    while let Some(node) = current {
        if let Some(info) = editor_anchor(&node) {
            return Some(info);
        }

        let parent = node.parent();
        if let Some(p) = &parent {
            if let Some(info) = p.children().iter().find_map(editor_anchor) {
                return Some(info);
            }
        }

        current = parent;
    }

    None
}
