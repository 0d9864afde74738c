//! Entry forms for the create and edit dialogs
//!
//! Each form is a plain value struct. Fields are described for the front end
//! through [`FieldSpec`]; `check` turns the form into a typed record or the
//! set of missing-field errors.

use std::fmt;

use crate::console::validator::{Field, FieldErrors, Required};
use crate::locale::Locale;
use crate::models::{normalize_kps, Action, Module, NewUser, User, UserAppPermission, UserUpdate};

/// How a field is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    /// Free text with server-side suggestions
    Lookup,
    /// Shown but not editable
    ReadOnly,
    /// Pick-list of the apps the server reports
    Apps,
    Modules,
    Actions,
}

impl FieldKind {
    pub fn is_editable(&self) -> bool {
        !matches!(self, FieldKind::ReadOnly)
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::Apps | FieldKind::Modules | FieldKind::Actions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
}

impl FieldSpec {
    fn new(field: Field, kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            value: value.into(),
            required: kind.is_editable(),
        }
    }
}

pub trait EntryForm: Clone + Default + fmt::Debug + Send + 'static {
    type Output: Clone + fmt::Debug + Send + Sync + 'static;

    /// Ordered field descriptors with current values
    fn fields(&self) -> Vec<FieldSpec>;

    /// Set a field from its textual value; read-only fields are left alone
    fn set(&mut self, field: Field, value: &str);

    /// Validate every required field at once
    fn check(&self, locale: &Locale) -> Result<Self::Output, FieldErrors>;

    fn value(&self, field: Field) -> String {
        self.fields()
            .into_iter()
            .find(|spec| spec.field == field)
            .map(|spec| spec.value)
            .unwrap_or_default()
    }
}

fn opt_str<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// New app permission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDraftForm {
    pub username: String,
    pub app: String,
    pub modules: Option<Module>,
    pub action: Option<Action>,
}

impl EntryForm for PermissionDraftForm {
    type Output = UserAppPermission;

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(Field::Username, FieldKind::Lookup, self.username.as_str()),
            FieldSpec::new(Field::App, FieldKind::Apps, self.app.as_str()),
            FieldSpec::new(Field::Modules, FieldKind::Modules, opt_str(self.modules)),
            FieldSpec::new(Field::Action, FieldKind::Actions, opt_str(self.action)),
        ]
    }

    fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::Username => self.username = value.to_string(),
            Field::App => self.app = value.to_string(),
            Field::Modules => self.modules = value.parse().ok(),
            Field::Action => self.action = value.parse().ok(),
            _ => {}
        }
    }

    fn check(&self, locale: &Locale) -> Result<UserAppPermission, FieldErrors> {
        let mut required = Required::new(locale);
        let username = required.text(Field::Username, &self.username);
        let app = required.text(Field::App, &self.app);
        let modules = required.pick(Field::Modules, self.modules);
        let action = required.pick(Field::Action, self.action);
        required.finish(|| Some(UserAppPermission::new(&username?, &app?, modules?, action?)))
    }
}

/// Change of module/action on an existing grant; username and app are fixed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionEditForm {
    pub username: String,
    pub app: String,
    pub modules: Option<Module>,
    pub action: Option<Action>,
}

impl From<&UserAppPermission> for PermissionEditForm {
    fn from(permission: &UserAppPermission) -> Self {
        Self {
            username: permission.username.clone(),
            app: permission.app.clone(),
            modules: Some(permission.modules),
            action: Some(permission.action),
        }
    }
}

impl EntryForm for PermissionEditForm {
    type Output = UserAppPermission;

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(Field::Username, FieldKind::ReadOnly, self.username.as_str()),
            FieldSpec::new(Field::App, FieldKind::ReadOnly, self.app.as_str()),
            FieldSpec::new(Field::Modules, FieldKind::Modules, opt_str(self.modules)),
            FieldSpec::new(Field::Action, FieldKind::Actions, opt_str(self.action)),
        ]
    }

    fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::Modules => self.modules = value.parse().ok(),
            Field::Action => self.action = value.parse().ok(),
            _ => {}
        }
    }

    fn check(&self, locale: &Locale) -> Result<UserAppPermission, FieldErrors> {
        let mut required = Required::new(locale);
        let modules = required.pick(Field::Modules, self.modules);
        let action = required.pick(Field::Action, self.action);
        required.finish(|| {
            Some(UserAppPermission::new(&self.username, &self.app, modules?, action?))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraftForm {
    pub username: String,
    pub password: String,
}

impl EntryForm for UserDraftForm {
    type Output = NewUser;

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(Field::Username, FieldKind::Text, self.username.as_str()),
            FieldSpec::new(Field::Password, FieldKind::Secret, self.password.as_str()),
        ]
    }

    fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::Username => self.username = value.to_string(),
            Field::Password => self.password = value.to_string(),
            _ => {}
        }
    }

    fn check(&self, locale: &Locale) -> Result<NewUser, FieldErrors> {
        let mut required = Required::new(locale);
        let username = required.text(Field::Username, &self.username);
        // passwords are sent as typed, only emptiness is checked
        let password = required
            .text(Field::Password, &self.password)
            .map(|_| self.password.clone());
        required.finish(|| {
            Some(NewUser {
                username: username?,
                password: password?,
            })
        })
    }
}

/// Replacement of a user's namespace keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEditForm {
    pub username: String,
    pub kps: String,
}

impl From<&User> for UserEditForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            kps: user.kps_str().to_string(),
        }
    }
}

impl EntryForm for UserEditForm {
    type Output = UserUpdate;

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(Field::Username, FieldKind::ReadOnly, self.username.as_str()),
            FieldSpec::new(Field::Kps, FieldKind::Text, self.kps.as_str()),
        ]
    }

    fn set(&mut self, field: Field, value: &str) {
        if field == Field::Kps {
            self.kps = value.to_string();
        }
    }

    fn check(&self, locale: &Locale) -> Result<UserUpdate, FieldErrors> {
        let mut required = Required::new(locale);
        // a list of only separators is still empty
        let kps = required
            .text(Field::Kps, &normalize_kps(&self.kps))
            .map(|_| self.kps.trim().to_string());
        required.finish(|| {
            Some(UserUpdate {
                username: self.username.clone(),
                kps: kps?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_draft_all_or_nothing() {
        let locale = Locale::en_us();
        let mut form = PermissionDraftForm::default();
        form.set(Field::Username, "alice");
        form.set(Field::Modules, "config");

        let errors = form.check(&locale).unwrap_err();
        assert_eq!(errors.get(Field::App), Some("App cannot be empty"));
        assert_eq!(errors.get(Field::Action), Some("Action cannot be empty"));
        assert!(errors.get(Field::Username).is_none());
        assert!(errors.get(Field::Modules).is_none());

        form.set(Field::App, "orders");
        form.set(Field::Action, "rw");
        let permission = form.check(&locale).unwrap();
        assert_eq!(permission, UserAppPermission::new("alice", "orders", Module::Config, Action::ReadWrite));
    }

    #[test]
    fn test_unknown_choice_counts_as_missing() {
        let locale = Locale::en_us();
        let mut form = PermissionDraftForm {
            username: "alice".into(),
            app: "orders".into(),
            modules: Some(Module::All),
            action: Some(Action::Read),
        };
        form.set(Field::Action, "admin");
        let errors = form.check(&locale).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get(Field::Action).is_some());
    }

    #[test]
    fn test_edit_form_keeps_identity_fixed() {
        let locale = Locale::en_us();
        let original = UserAppPermission::new("alice", "orders", Module::Config, Action::Read);
        let mut form = PermissionEditForm::from(&original);
        form.set(Field::Username, "mallory");
        form.set(Field::App, "billing");
        form.set(Field::Action, "rw");

        let updated = form.check(&locale).unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.app, "orders");
        assert_eq!(updated.modules, Module::Config);
        assert_eq!(updated.action, Action::ReadWrite);

        let specs = form.fields();
        assert_eq!(specs[0].kind, FieldKind::ReadOnly);
        assert!(!specs[0].required);
    }

    #[test]
    fn test_user_forms() {
        let locale = Locale::en_us();
        let mut edit = UserEditForm::from(&User::new("bob", ""));
        assert_eq!(edit.check(&locale).unwrap_err().get(Field::Kps), Some("Namespace keys cannot be empty"));
        edit.set(Field::Kps, "dev,prod");
        assert_eq!(edit.check(&locale).unwrap().kps, "dev,prod");

        edit.set(Field::Kps, " , ,");
        assert_eq!(edit.check(&locale).unwrap_err().get(Field::Kps), Some("Namespace keys cannot be empty"));

        let mut draft = UserDraftForm::default();
        draft.set(Field::Username, "carol");
        draft.set(Field::Password, " secret ");
        assert_eq!(draft.check(&locale).unwrap().password, " secret ");
        assert_eq!(draft.value(Field::Username), "carol");
    }
}
