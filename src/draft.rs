//! Local compose state: the unsent draft and the suggestions panel latch.
//!
//! DESIGN
//! ======
//! Neither type touches the network. The panel's visibility is explicit state
//! rather than a function of transcript length, because a dismissal must win
//! over every later empty transcript.

/// Unsent message text. Single writer: the UI session that owns it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftState {
    text: String,
}

impl DraftState {
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.text
    }

    /// Whitespace-only drafts are not worth a request.
    #[must_use]
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// How the suggestions panel decides whether to show itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelVisibility {
    /// Open exactly while the transcript is empty.
    #[default]
    Auto,
    /// Explicitly opened by the user.
    Open,
    /// Dismissed by the user; stays closed for the rest of the session.
    Dismissed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuggestionsPanel {
    visibility: PanelVisibility,
}

impl SuggestionsPanel {
    pub fn toggle(&mut self, open: bool) {
        self.visibility = if open { PanelVisibility::Open } else { PanelVisibility::Dismissed };
    }

    #[must_use]
    pub fn visibility(&self) -> PanelVisibility {
        self.visibility
    }

    #[must_use]
    pub fn is_open(&self, transcript_empty: bool) -> bool {
        match self.visibility {
            PanelVisibility::Auto => transcript_empty,
            PanelVisibility::Open => true,
            PanelVisibility::Dismissed => false,
        }
    }
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
