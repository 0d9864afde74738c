//! Required-field validation for entry dialogs

use std::collections::BTreeMap;

use crate::locale::Locale;

/// Form fields known to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    App,
    Modules,
    Action,
    Kps,
    Password,
}

impl Field {
    /// Wire/key name of the field
    pub fn key(&self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::App => "app",
            Field::Modules => "modules",
            Field::Action => "action",
            Field::Kps => "kps",
            Field::Password => "password",
        }
    }

    /// Locale key of the field label
    pub fn label_key(&self) -> &'static str {
        match self {
            Field::Modules => "module",
            other => other.key(),
        }
    }

    pub fn placeholder_key(&self) -> &'static str {
        match self {
            Field::Username => "usernamePlaceholder",
            Field::App => "appPlaceholder",
            Field::Modules => "modulePlaceholder",
            Field::Action => "actionPlaceholder",
            Field::Kps => "kpsPlaceholder",
            Field::Password => "passwordPlaceholder",
        }
    }

    /// Locale key of the "missing value" message
    pub fn error_key(&self) -> &'static str {
        match self {
            Field::Username => "usernameError",
            Field::App => "appError",
            Field::Modules => "moduleError",
            Field::Action => "actionError",
            Field::Kps => "kpsError",
            Field::Password => "passwordError",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        match key {
            "username" => Some(Field::Username),
            "app" => Some(Field::App),
            "modules" | "module" => Some(Field::Modules),
            "action" => Some(Field::Action),
            "kps" => Some(Field::Kps),
            "password" => Some(Field::Password),
            _ => None,
        }
    }
}

/// Per-field error messages attached after a failed check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<Field, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Collects required values; every missing one gets a localized error.
///
/// A form is only accepted when no field is missing, partial sets are never
/// returned.
pub struct Required<'a> {
    locale: &'a Locale,
    errors: FieldErrors,
}

impl<'a> Required<'a> {
    pub fn new(locale: &'a Locale) -> Self {
        Self {
            locale,
            errors: FieldErrors::new(),
        }
    }

    /// Check a text value, returning it trimmed when present
    pub fn text(&mut self, field: Field, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.missing(field);
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Check an optional selection
    pub fn pick<T: Copy>(&mut self, field: Field, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing(field);
        }
        value
    }

    fn missing(&mut self, field: Field) {
        self.errors.set(field, self.locale.get(field.error_key()));
    }

    /// Finish the check: `Ok` with the built value only when nothing is missing
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, FieldErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or(self.errors)
    }
}
