//! Cell edit state machine
//!
//! `Idle` or `Editing` exactly one cell. Beginning an edit on another cell
//! displaces the open one; what happens to it is decided by
//! [`ReselectPolicy`]. The machine itself never performs a mutation: it
//! hands the displaced or committed edit back to the caller.

use crate::error::{GridError, GridResult};
use serde_json::Value;
use shared::ProductId;

/// What selecting another cell does to an edit in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReselectPolicy {
    /// Drop the pending value silently
    #[default]
    Discard,
    /// Commit the pending value before switching
    Commit,
}

/// The cell being edited
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditTarget {
    pub row_index: usize,
    pub field_id: String,
}

impl EditTarget {
    pub fn new(row_index: usize, field_id: impl Into<String>) -> Self {
        Self {
            row_index,
            field_id: field_id.into(),
        }
    }
}

/// Editor widget family, which decides the keyboard contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    Text,
    Number,
    MultiSelect,
    TreeSelect,
    Toggle,
}

impl EditorKind {
    /// Pickers fire blur while the user navigates inside them
    pub fn commits_on_blur(&self) -> bool {
        matches!(self, EditorKind::Text | EditorKind::Number)
    }

    pub fn commits_on_enter(&self) -> bool {
        !matches!(self, EditorKind::MultiSelect | EditorKind::TreeSelect)
    }
}

/// Uncommitted value of the open cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingValue {
    Text(String),
    /// Kept as typed; parsed on commit
    Number(String),
    Tags(Vec<String>),
    Category(Option<i64>),
    Toggle(bool),
}

impl PendingValue {
    /// Editor seed for a cell holding `value`
    pub fn from_cell(kind: EditorKind, value: &Value) -> Self {
        match kind {
            EditorKind::Text => PendingValue::Text(match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            EditorKind::Number => PendingValue::Number(match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            EditorKind::MultiSelect => PendingValue::Tags(
                value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            EditorKind::TreeSelect => PendingValue::Category(match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                Value::Object(obj) => obj.get("id").and_then(Value::as_i64),
                _ => None,
            }),
            EditorKind::Toggle => PendingValue::Toggle(value.as_bool().unwrap_or(true)),
        }
    }
}

/// An open edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEdit {
    pub target: EditTarget,
    /// Row identity captured at begin; survives index shifts
    pub row_id: ProductId,
    pub kind: EditorKind,
    /// Value the cell held when the edit began
    pub initial: PendingValue,
    pub pending: PendingValue,
}

impl ActiveEdit {
    pub fn new(target: EditTarget, row_id: ProductId, kind: EditorKind, initial: PendingValue) -> Self {
        Self {
            target,
            row_id,
            kind,
            pending: initial.clone(),
            initial,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.pending != self.initial
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(ActiveEdit),
}

/// Fate of the edit displaced by [`CellEditor::begin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Displaced {
    Nothing,
    Discarded(ActiveEdit),
    /// Caller must commit this one
    Commit(ActiveEdit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Commit,
    Cancel,
    Ignore,
}

#[derive(Debug, Default)]
pub struct CellEditor {
    state: EditState,
    policy: ReselectPolicy,
}

impl CellEditor {
    pub fn new(policy: ReselectPolicy) -> Self {
        Self {
            state: EditState::Idle,
            policy,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveEdit> {
        match &self.state {
            EditState::Editing(edit) => Some(edit),
            EditState::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    /// Open `edit`; re-selecting the open cell keeps its pending value
    pub fn begin(&mut self, edit: ActiveEdit) -> Displaced {
        if let EditState::Editing(current) = &self.state
            && current.target == edit.target
            && current.row_id == edit.row_id
        {
            return Displaced::Nothing;
        }

        match std::mem::replace(&mut self.state, EditState::Editing(edit)) {
            EditState::Idle => Displaced::Nothing,
            EditState::Editing(previous) => match self.policy {
                ReselectPolicy::Discard => {
                    tracing::debug!(
                        row_id = %previous.row_id,
                        field = %previous.target.field_id,
                        dirty = previous.is_dirty(),
                        "Discarding edit on reselect"
                    );
                    Displaced::Discarded(previous)
                }
                ReselectPolicy::Commit => Displaced::Commit(previous),
            },
        }
    }

    pub fn change(&mut self, value: PendingValue) -> GridResult<()> {
        match &mut self.state {
            EditState::Editing(edit) => {
                edit.pending = value;
                Ok(())
            }
            EditState::Idle => Err(GridError::NoActiveEdit),
        }
    }

    /// Close the edit for committing
    pub fn take(&mut self) -> GridResult<ActiveEdit> {
        match std::mem::take(&mut self.state) {
            EditState::Editing(edit) => Ok(edit),
            EditState::Idle => Err(GridError::NoActiveEdit),
        }
    }

    /// Reopen an edit whose commit was refused, unless another cell took over
    pub fn restore(&mut self, edit: ActiveEdit) {
        if !self.is_editing() {
            self.state = EditState::Editing(edit);
        }
    }

    pub fn cancel(&mut self) -> Option<ActiveEdit> {
        match std::mem::take(&mut self.state) {
            EditState::Editing(edit) => Some(edit),
            EditState::Idle => None,
        }
    }

    /// What a key press means for the open edit
    pub fn key_action(&self, key: EditKey) -> KeyAction {
        let Some(edit) = self.active() else {
            return KeyAction::Ignore;
        };
        match key {
            EditKey::Escape => KeyAction::Cancel,
            EditKey::Enter if edit.kind.commits_on_enter() => KeyAction::Commit,
            EditKey::Enter => KeyAction::Ignore,
        }
    }

    /// What losing focus means for the open edit
    pub fn blur_action(&self) -> KeyAction {
        match self.active() {
            Some(edit) if edit.kind.commits_on_blur() => KeyAction::Commit,
            _ => KeyAction::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edit(row: usize, field: &str, kind: EditorKind, value: PendingValue) -> ActiveEdit {
        ActiveEdit::new(
            EditTarget::new(row, field),
            ProductId::new(row.to_string()),
            kind,
            value,
        )
    }

    fn text(row: usize, field: &str, value: &str) -> ActiveEdit {
        edit(row, field, EditorKind::Text, PendingValue::Text(value.into()))
    }

    #[test]
    fn test_begin_change_take() {
        let mut editor = CellEditor::default();
        assert_eq!(editor.begin(text(0, "name", "Old")), Displaced::Nothing);

        editor.change(PendingValue::Text("New".into())).unwrap();
        let taken = editor.take().unwrap();

        assert_eq!(taken.pending, PendingValue::Text("New".into()));
        assert!(taken.is_dirty());
        assert_eq!(editor.state(), &EditState::Idle);
    }

    #[test]
    fn test_reselect_discards_by_default() {
        let mut editor = CellEditor::new(ReselectPolicy::Discard);
        editor.begin(text(0, "name", "A"));
        editor.change(PendingValue::Text("changed".into())).unwrap();

        let displaced = editor.begin(text(1, "sku", "S"));

        assert!(matches!(displaced, Displaced::Discarded(ref e) if e.target == EditTarget::new(0, "name")));
        assert_eq!(editor.active().unwrap().target, EditTarget::new(1, "sku"));
    }

    #[test]
    fn test_reselect_commit_policy() {
        let mut editor = CellEditor::new(ReselectPolicy::Commit);
        editor.begin(text(0, "name", "A"));

        let displaced = editor.begin(text(0, "sku", "S"));

        assert!(matches!(displaced, Displaced::Commit(_)));
        assert_eq!(editor.active().unwrap().target.field_id, "sku");
    }

    #[test]
    fn test_reselect_same_cell_keeps_pending() {
        let mut editor = CellEditor::default();
        editor.begin(text(0, "name", "A"));
        editor.change(PendingValue::Text("B".into())).unwrap();

        assert_eq!(editor.begin(text(0, "name", "A")), Displaced::Nothing);
        assert_eq!(editor.active().unwrap().pending, PendingValue::Text("B".into()));
    }

    #[test]
    fn test_idle_operations() {
        let mut editor = CellEditor::default();
        assert!(matches!(editor.change(PendingValue::Toggle(true)), Err(GridError::NoActiveEdit)));
        assert!(matches!(editor.take(), Err(GridError::NoActiveEdit)));
        assert!(editor.cancel().is_none());
        assert_eq!(editor.key_action(EditKey::Enter), KeyAction::Ignore);
        assert_eq!(editor.blur_action(), KeyAction::Ignore);
    }

    #[test]
    fn test_keyboard_contract_by_kind() {
        let mut editor = CellEditor::default();

        editor.begin(text(0, "name", "A"));
        assert_eq!(editor.key_action(EditKey::Enter), KeyAction::Commit);
        assert_eq!(editor.key_action(EditKey::Escape), KeyAction::Cancel);
        assert_eq!(editor.blur_action(), KeyAction::Commit);

        editor.begin(edit(0, "tags", EditorKind::MultiSelect, PendingValue::Tags(vec![])));
        assert_eq!(editor.key_action(EditKey::Enter), KeyAction::Ignore);
        assert_eq!(editor.key_action(EditKey::Escape), KeyAction::Cancel);
        assert_eq!(editor.blur_action(), KeyAction::Ignore);

        editor.begin(edit(0, "category", EditorKind::TreeSelect, PendingValue::Category(None)));
        assert_eq!(editor.blur_action(), KeyAction::Ignore);
        assert_eq!(editor.key_action(EditKey::Enter), KeyAction::Ignore);
    }

    #[test]
    fn test_restore_only_when_idle() {
        let mut editor = CellEditor::default();
        editor.begin(text(0, "name", "A"));
        let taken = editor.take().unwrap();

        editor.begin(text(1, "name", "B"));
        editor.restore(taken.clone());
        assert_eq!(editor.active().unwrap().target.row_index, 1);

        editor.cancel();
        editor.restore(taken);
        assert_eq!(editor.active().unwrap().target.row_index, 0);
    }

    #[test]
    fn test_pending_from_cell() {
        assert_eq!(
            PendingValue::from_cell(EditorKind::Number, &json!(12.5)),
            PendingValue::Number("12.5".into())
        );
        assert_eq!(
            PendingValue::from_cell(EditorKind::Number, &json!("9.90")),
            PendingValue::Number("9.90".into())
        );
        assert_eq!(
            PendingValue::from_cell(EditorKind::MultiSelect, &json!(["a", "b"])),
            PendingValue::Tags(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            PendingValue::from_cell(EditorKind::TreeSelect, &json!({"id": 4, "name": "Shoes"})),
            PendingValue::Category(Some(4))
        );
        assert_eq!(
            PendingValue::from_cell(EditorKind::TreeSelect, &json!("Shoes")),
            PendingValue::Category(None)
        );
        assert_eq!(
            PendingValue::from_cell(EditorKind::Text, &serde_json::Value::Null),
            PendingValue::Text(String::new())
        );
    }
}
