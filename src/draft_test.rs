use super::*;

// =============================================================
// DraftState
// =============================================================

#[test]
fn draft_default_is_empty() {
    let draft = DraftState::default();
    assert_eq!(draft.current(), "");
    assert!(!draft.is_sendable());
}

#[test]
fn draft_set_text_replaces() {
    let mut draft = DraftState::default();
    draft.set_text("Hello");
    draft.set_text("Can you clarify?");
    assert_eq!(draft.current(), "Can you clarify?");
    assert!(draft.is_sendable());
}

#[test]
fn draft_clear_empties() {
    let mut draft = DraftState::default();
    draft.set_text("Hello");
    draft.clear();
    assert_eq!(draft.current(), "");
}

#[test]
fn draft_whitespace_only_not_sendable() {
    let mut draft = DraftState::default();
    draft.set_text(" \n\t ");
    assert!(!draft.is_sendable());
}

// =============================================================
// SuggestionsPanel
// =============================================================

#[test]
fn panel_auto_follows_transcript() {
    let panel = SuggestionsPanel::default();
    assert_eq!(panel.visibility(), PanelVisibility::Auto);
    assert!(panel.is_open(true));
    assert!(!panel.is_open(false));
}

#[test]
fn panel_dismissal_latches() {
    let mut panel = SuggestionsPanel::default();
    panel.toggle(false);
    assert!(!panel.is_open(true));
    assert!(!panel.is_open(false));
}

#[test]
fn panel_explicit_open_ignores_transcript() {
    let mut panel = SuggestionsPanel::default();
    panel.toggle(false);
    panel.toggle(true);
    assert_eq!(panel.visibility(), PanelVisibility::Open);
    assert!(panel.is_open(false));
}
