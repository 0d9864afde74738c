//! Modal entry dialog state machine
//!
//! `Closed -> Open -> Submitting -> Closed` on success. A failed check keeps
//! the dialog `Open` with field errors; a failed gateway call returns it to
//! `Open` with the failure message so it can be retried or cancelled.

use tracing::debug;

use crate::console::forms::EntryForm;
use crate::console::validator::{Field, FieldErrors};
use crate::locale::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    Open,
    Submitting,
}

#[derive(Debug, Clone)]
pub struct EntryDialog<F: EntryForm> {
    phase: DialogPhase,
    form: F,
    errors: FieldErrors,
    failure: Option<String>,
}

impl<F: EntryForm> Default for EntryDialog<F> {
    fn default() -> Self {
        Self {
            phase: DialogPhase::Closed,
            form: F::default(),
            errors: FieldErrors::new(),
            failure: None,
        }
    }
}

impl<F: EntryForm> EntryDialog<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != DialogPhase::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == DialogPhase::Submitting
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Message of the last failed submission, if any
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Open with a pre-filled (edit) or default (create) form
    pub fn open(&mut self, form: F) {
        self.phase = DialogPhase::Open;
        self.form = form;
        self.errors = FieldErrors::new();
        self.failure = None;
    }

    /// Change a field while the dialog is open; clears that field's error
    pub fn edit(&mut self, field: Field, value: &str) {
        if self.phase != DialogPhase::Open {
            return;
        }
        self.form.set(field, value);
        self.errors.clear(field);
    }

    /// Validate the form. Returns the record to send when every required
    /// field is present and moves to `Submitting`.
    pub fn submit(&mut self, locale: &Locale) -> Option<F::Output> {
        if self.phase != DialogPhase::Open {
            return None;
        }
        match self.form.check(locale) {
            Ok(output) => {
                self.errors = FieldErrors::new();
                self.failure = None;
                self.phase = DialogPhase::Submitting;
                Some(output)
            }
            Err(errors) => {
                debug!("Dialog submission blocked by {} field error(s)", errors.len());
                self.errors = errors;
                None
            }
        }
    }

    /// Apply the gateway result of a submission
    pub fn settle(&mut self, result: Result<(), String>) {
        if self.phase != DialogPhase::Submitting {
            return;
        }
        match result {
            Ok(()) => self.close(),
            Err(message) => {
                self.phase = DialogPhase::Open;
                self.failure = Some(message);
            }
        }
    }

    /// Close by any path and reset the form
    pub fn close(&mut self) {
        self.phase = DialogPhase::Closed;
        self.form = F::default();
        self.errors = FieldErrors::new();
        self.failure = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::forms::{PermissionDraftForm, PermissionEditForm};
    use crate::models::{Action, Module, UserAppPermission};

    fn filled() -> PermissionDraftForm {
        PermissionDraftForm {
            username: "alice".into(),
            app: "orders".into(),
            modules: Some(Module::Config),
            action: Some(Action::ReadWrite),
        }
    }

    #[test]
    fn test_blocked_submission_stays_open() {
        let locale = Locale::en_us();
        let mut dialog = EntryDialog::<PermissionDraftForm>::new();
        dialog.open(PermissionDraftForm::default());
        dialog.edit(Field::Username, "alice");

        assert!(dialog.submit(&locale).is_none());
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert!(dialog.errors().get(Field::Username).is_none());
        for field in [Field::App, Field::Modules, Field::Action] {
            assert!(!dialog.errors().get(field).unwrap().is_empty());
        }

        dialog.edit(Field::App, "orders");
        assert!(dialog.errors().get(Field::App).is_none());
    }

    #[test]
    fn test_success_closes_and_resets() {
        let locale = Locale::en_us();
        let mut dialog = EntryDialog::<PermissionDraftForm>::new();
        dialog.open(filled());

        let sent = dialog.submit(&locale).unwrap();
        assert_eq!(sent.username, "alice");
        assert!(dialog.is_submitting());

        dialog.settle(Ok(()));
        assert_eq!(dialog.phase(), DialogPhase::Closed);

        dialog.open(PermissionDraftForm::default());
        assert_eq!(dialog.form(), &PermissionDraftForm::default());
    }

    #[test]
    fn test_gateway_failure_returns_to_open() {
        let locale = Locale::en_us();
        let mut dialog = EntryDialog::<PermissionDraftForm>::new();
        dialog.open(filled());
        dialog.submit(&locale).unwrap();

        dialog.settle(Err("Permission denied".to_string()));
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(dialog.failure(), Some("Permission denied"));
        assert_eq!(dialog.form(), &filled());

        // retry goes through
        assert!(dialog.submit(&locale).is_some());
        assert!(dialog.failure().is_none());
    }

    #[test]
    fn test_cancel_resets_and_ignores_late_result() {
        let locale = Locale::en_us();
        let mut dialog = EntryDialog::<PermissionEditForm>::new();
        let grant = UserAppPermission::new("alice", "orders", Module::Naming, Action::Read);
        dialog.open(PermissionEditForm::from(&grant));
        dialog.submit(&locale).unwrap();
        dialog.close();

        dialog.settle(Err("late".to_string()));
        assert_eq!(dialog.phase(), DialogPhase::Closed);
        assert_eq!(dialog.form(), &PermissionEditForm::default());
        assert!(dialog.failure().is_none());
    }
}
