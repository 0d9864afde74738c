//! Inline driver for a CRUD screen
//!
//! Runs every effect to completion before returning. Used by the one-shot CLI
//! and by tests; the TUI drives the same screen through its event loop instead.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::console::crud::{execute, CrudScreen, Effect, Outcome};
use crate::console::resource::Resource;
use crate::console::validator::{Field, FieldErrors};
use crate::gateway::Gateway;
use crate::locale::Locale;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{}", describe_errors(.0))]
    Invalid(FieldErrors),

    #[error("{0}")]
    Failed(String),

    #[error("{0} not found")]
    NotFound(String),
}

fn describe_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field.key(), message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct CrudSession<R: Resource, G: Gateway<R> + ?Sized> {
    pub screen: CrudScreen<R>,
    gateway: Arc<G>,
    locale: Locale,
}

impl<R, G> CrudSession<R, G>
where
    R: Resource,
    G: Gateway<R> + ?Sized,
{
    pub fn new(gateway: Arc<G>, locale: Locale) -> Self {
        Self {
            screen: CrudScreen::new(),
            gateway,
            locale,
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn items(&self) -> &[R::Item] {
        self.screen.list.items()
    }

    /// Run an effect and every follow-up it triggers
    pub async fn drive(&mut self, effect: Effect<R>) {
        let mut next = Some(effect);
        while let Some(effect) = next.take() {
            debug!("Running {} effect: {}", R::NAME, effect.describe());
            let outcome = execute(self.gateway.as_ref(), effect).await;
            next = self.screen.apply(outcome, &self.locale);
        }
    }

    /// Search failures surface as the list's error notice
    fn search_result(&mut self) -> Result<(), SessionError> {
        match self.screen.list.notice() {
            Some(notice) if notice.is_error() => {
                let message = notice.message.clone();
                self.screen.list.take_notice();
                Err(SessionError::Failed(message))
            }
            _ => Ok(()),
        }
    }

    pub async fn mount(&mut self) -> Result<(), SessionError> {
        let effect = self.screen.mount();
        self.drive(effect).await;
        self.search_result()
    }

    /// Apply filters and search from page 1
    pub async fn query(&mut self, filters: &[(Field, &str)]) -> Result<(), SessionError> {
        for (field, value) in filters {
            self.screen.list.set_filter(*field, value);
        }
        let effect = self.screen.query();
        self.drive(effect).await;
        self.search_result()
    }

    pub async fn change_page(&mut self, page_no: u32) -> Result<(), SessionError> {
        let effect = self.screen.change_page(page_no);
        self.drive(effect).await;
        self.search_result()
    }

    /// Fill the create dialog and submit it
    pub async fn create(&mut self, values: &[(Field, &str)]) -> Result<(), SessionError> {
        self.screen.open_create();
        for (field, value) in values {
            self.screen.create.edit(*field, value);
        }
        let Some(effect) = self.screen.submit_create(&self.locale) else {
            let errors = self.screen.create.errors().clone();
            self.screen.create.close();
            return Err(SessionError::Invalid(errors));
        };
        self.drive(effect).await;
        if let Some(failure) = self.screen.create.failure() {
            let failure = failure.to_string();
            self.screen.create.close();
            return Err(SessionError::Failed(failure));
        }
        Ok(())
    }

    /// Open the edit dialog for `item`, change fields and submit
    pub async fn edit(
        &mut self,
        item: &R::Item,
        values: &[(Field, &str)],
    ) -> Result<(), SessionError> {
        self.screen.open_edit(item);
        for (field, value) in values {
            self.screen.edit.edit(*field, value);
        }
        let Some(effect) = self.screen.submit_edit(&self.locale) else {
            let errors = self.screen.edit.errors().clone();
            self.screen.edit.close();
            return Err(SessionError::Invalid(errors));
        };
        self.drive(effect).await;
        if let Some(failure) = self.screen.edit.failure() {
            let failure = failure.to_string();
            self.screen.edit.close();
            return Err(SessionError::Failed(failure));
        }
        Ok(())
    }

    /// Request deletion of `item`; nothing is sent unless `confirmed`
    pub async fn delete(&mut self, item: R::Item, confirmed: bool) -> Result<bool, SessionError> {
        self.screen.request_delete(item);
        if !confirmed {
            self.screen.decline_delete();
            return Ok(false);
        }
        let Some(effect) = self.screen.confirm_delete() else {
            return Ok(false);
        };
        // the delete decides the result; the refresh it triggers only warns
        let outcome = execute(self.gateway.as_ref(), effect).await;
        let failed = matches!(outcome, Outcome::Deleted(Err(_)));
        let refresh = self.screen.apply(outcome, &self.locale);
        if failed {
            let message = self
                .screen
                .list
                .take_notice()
                .map(|notice| notice.message)
                .unwrap_or_default();
            return Err(SessionError::Failed(message));
        }
        if let Some(refresh) = refresh {
            self.drive(refresh).await;
            if let Err(e) = self.search_result() {
                warn!("{} deleted but the list could not be refreshed: {}", R::NAME, e);
            }
        }
        Ok(true)
    }

    /// First row on the current page matching `predicate`
    pub fn find(&self, predicate: impl Fn(&R::Item) -> bool) -> Option<R::Item> {
        self.items().iter().find(|item| predicate(item)).cloned()
    }
}
