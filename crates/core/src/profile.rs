use std::collections::BTreeSet;
use tokio::sync::watch;

/// The sentinel profile. While it is selected nothing else can be.
pub const STANDARD: &str = "Standard";
pub const READING_AND_LANGUAGE: &str = "Reading & Language Support";
pub const WRITING_AND_EXPRESSION: &str = "Writing & Expression Support";
pub const VISION_AND_SCREEN_READER: &str = "Vision & Screen-Reader Support";
pub const MATH_AND_NUMERACY: &str = "Math & Numeracy Support";
pub const FOCUS_AND_ORGANIZATION: &str = "Focus & Organization Support";

/// A learning profile the user can select to tailor a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Profile {
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// The catalog shipped with the application. It is advisory: the selection
/// engine accepts ids that are not listed here.
pub fn default_catalog() -> Vec<Profile> {
    vec![
        Profile::new(
            STANDARD,
            "Standard",
            "Clear, accurate answers in standard academic language.",
        ),
        Profile::new(
            READING_AND_LANGUAGE,
            "Reading & Language",
            "Simplified sentences, bold key terms and generous spacing for dyslexic readers.",
        ),
        Profile::new(
            WRITING_AND_EXPRESSION,
            "Writing & Expression",
            "Outlines, sentence starters and phrasing examples for written expression.",
        ),
        Profile::new(
            VISION_AND_SCREEN_READER,
            "Vision & Screen-Reader",
            "Linear text that reads well aloud, with visuals described in words.",
        ),
        Profile::new(
            MATH_AND_NUMERACY,
            "Math & Numeracy",
            "Numbered step-by-step procedures and real-world analogies for dyscalculia.",
        ),
        Profile::new(
            FOCUS_AND_ORGANIZATION,
            "Focus & Organization",
            "A one-line summary first, then a short checklist, for executive-function support.",
        ),
    ]
}

/// A non-empty set of selected profile ids.
///
/// Either exactly `{"Standard"}`, or one or more non-standard ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    ids: BTreeSet<String>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::standard()
    }
}

impl SelectionState {
    pub fn standard() -> Self {
        Self {
            ids: BTreeSet::from([STANDARD.to_string()]),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_standard(&self) -> bool {
        self.contains(STANDARD)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    // Never true, kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Returns true if any of `ids` is selected.
    pub fn intersects(&self, ids: &[&str]) -> bool {
        ids.iter().any(|id| self.contains(id))
    }

    fn toggled(&self, id: &str) -> Self {
        if id == STANDARD {
            return Self::standard();
        }

        let mut ids = self.ids.clone();
        ids.remove(STANDARD);
        if !ids.remove(id) {
            ids.insert(id.to_string());
        }

        if ids.is_empty() {
            Self::standard()
        } else {
            Self { ids }
        }
    }
}

/// Owns the profile selection and publishes every change to subscribers.
pub struct ProfileSelectionEngine {
    selection: SelectionState,
    tx: watch::Sender<SelectionState>,
}

impl Default for ProfileSelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSelectionEngine {
    pub fn new() -> Self {
        let selection = SelectionState::standard();
        let (tx, _) = watch::channel(selection.clone());
        Self { selection, tx }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Get a receiver that always observes the latest selection.
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.tx.subscribe()
    }

    pub fn toggle(&mut self, id: &str) -> SelectionState {
        self.selection = self.selection.toggled(id);
        tracing::debug!("Profile '{}' toggled, selection is now {:?}", id, self.selection);
        // `send_replace` stores the value even when nobody is subscribed yet.
        self.tx.send_replace(self.selection.clone());
        self.selection.clone()
    }
}
