use serde::{Deserialize, Serialize};

/// The two kinds of editable content units in a guide.
///
/// Gameplay guides only ever contain sections; trophy guides also carry a roadmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum EditorKind {
    Section,
    Roadmap,
}

impl EditorKind {
    /// Id prefix of the hidden textarea the host page renders next to each editor.
    pub fn textarea_prefix(self) -> &'static str {
        match self {
            EditorKind::Section => "SectionTextarea",
            EditorKind::Roadmap => "editRoadmapTextarea",
        }
    }

    /// Id prefix of the container holding the editor, its name input and buttons.
    pub fn container_prefix(self) -> &'static str {
        match self {
            EditorKind::Section => "SectionContainer",
            EditorKind::Roadmap => "roadmapStep",
        }
    }

    pub fn from_textarea_id(id: &str) -> Option<Self> {
        [EditorKind::Section, EditorKind::Roadmap]
            .into_iter()
            .find(|k| id.starts_with(k.textarea_prefix()))
    }
}

/// Which logical editor a DOM node belongs to. Always recomputed from the DOM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EditorInfo {
    pub kind: EditorKind,
    pub dom_id: String,

    /// Trailing digits of `dom_id`; `None` when the id carries no number.
    pub numeric_id: Option<u64>,
}

impl EditorInfo {
    pub fn container_id(&self) -> Option<String> {
        self.numeric_id
            .map(|n| format!("{}{}", self.kind.container_prefix(), n))
    }
}

/// Persisted shape of the custom color lists.
///
/// Kept as ordered `(guide id, colors)` pairs so the JSON matches what older
/// builds wrote.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CustomColors {
    #[serde(
        rename = "documentIDToCustomColorList",
        alias = "guideIDToCustomColorList",
        default
    )]
    pub lists: Vec<(u64, Vec<String>)>,
}

impl CustomColors {
    pub fn get(&self, guide_id: u64) -> Option<&Vec<String>> {
        self.lists
            .iter()
            .find(|(id, _)| *id == guide_id)
            .map(|(_, colors)| colors)
    }

    pub fn set(&mut self, guide_id: u64, colors: Vec<String>) {
        if let Some(entry) = self.lists.iter_mut().find(|(id, _)| *id == guide_id) {
            entry.1 = colors;
        } else {
            self.lists.push((guide_id, colors));
        }
    }
}
