//! Paginated CRUD screen: list plus create and edit dialogs
//!
//! The screen never calls the gateway itself. User intents return an
//! [`Effect`] that the front end runs (inline or on a spawned task) with
//! [`execute`]; the resulting [`Outcome`] is fed back through
//! [`CrudScreen::apply`], which may ask for a follow-up effect.

use tracing::{info, warn};

use crate::console::dialog::EntryDialog;
use crate::console::list::{ListState, SearchRequest};
use crate::console::resource::{Draft, Patch, Resource};
use crate::gateway::{Gateway, GatewayError};
use crate::locale::Locale;
use crate::models::Page;

/// Gateway work requested by the screen
pub enum Effect<R: Resource> {
    Search(SearchRequest<R::Filter>),
    Create(Draft<R>),
    Update(Patch<R>),
    Delete(R::Item),
}

impl<R: Resource> Effect<R> {
    pub fn describe(&self) -> String {
        match self {
            Effect::Search(req) => format!("search #{} page {}", req.seq, req.criteria.page_no),
            Effect::Create(_) => "create".to_string(),
            Effect::Update(_) => "update".to_string(),
            Effect::Delete(item) => format!("delete {}", R::describe(item)),
        }
    }
}

/// Result of an executed [`Effect`]
pub enum Outcome<R: Resource> {
    Searched {
        seq: u64,
        result: Result<Page<R::Item>, GatewayError>,
    },
    Created(Result<String, GatewayError>),
    Updated(Result<String, GatewayError>),
    Deleted(Result<String, GatewayError>),
}

/// Run one effect against the gateway
pub async fn execute<R, G>(gateway: &G, effect: Effect<R>) -> Outcome<R>
where
    R: Resource,
    G: Gateway<R> + ?Sized,
{
    match effect {
        Effect::Search(req) => Outcome::Searched {
            seq: req.seq,
            result: gateway.search(&req.criteria).await,
        },
        Effect::Create(draft) => Outcome::Created(gateway.create(&draft).await),
        Effect::Update(patch) => Outcome::Updated(gateway.update(&patch).await),
        Effect::Delete(item) => Outcome::Deleted(gateway.delete(&item).await),
    }
}

pub struct CrudScreen<R: Resource> {
    pub list: ListState<R>,
    pub create: EntryDialog<R::CreateForm>,
    pub edit: EntryDialog<R::EditForm>,
}

impl<R: Resource> Default for CrudScreen<R> {
    fn default() -> Self {
        Self {
            list: ListState::new(),
            create: EntryDialog::new(),
            edit: EntryDialog::new(),
        }
    }
}

impl<R: Resource> CrudScreen<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a modal (dialog or delete confirmation) owns the input
    pub fn modal_open(&self) -> bool {
        self.create.is_open() || self.edit.is_open() || self.list.pending_delete().is_some()
    }

    pub fn mount(&mut self) -> Effect<R> {
        Effect::Search(self.list.mount())
    }

    pub fn query(&mut self) -> Effect<R> {
        Effect::Search(self.list.query())
    }

    pub fn change_page(&mut self, page_no: u32) -> Effect<R> {
        Effect::Search(self.list.change_page(page_no))
    }

    pub fn refresh(&mut self) -> Effect<R> {
        Effect::Search(self.list.refresh())
    }

    pub fn open_create(&mut self) {
        self.create.open(R::CreateForm::default());
    }

    /// Open the edit dialog pre-filled from a row
    pub fn open_edit(&mut self, item: &R::Item) {
        self.edit.open(R::EditForm::from(item));
    }

    pub fn submit_create(&mut self, locale: &Locale) -> Option<Effect<R>> {
        self.create.submit(locale).map(Effect::Create)
    }

    pub fn submit_edit(&mut self, locale: &Locale) -> Option<Effect<R>> {
        self.edit.submit(locale).map(Effect::Update)
    }

    pub fn request_delete(&mut self, item: R::Item) {
        self.list.request_delete(item);
    }

    pub fn decline_delete(&mut self) {
        self.list.decline_delete();
    }

    pub fn confirm_delete(&mut self) -> Option<Effect<R>> {
        self.list.confirm_delete().map(Effect::Delete)
    }

    /// Fold a gateway outcome into the screen; may request a refresh
    pub fn apply(&mut self, outcome: Outcome<R>, locale: &Locale) -> Option<Effect<R>> {
        match outcome {
            Outcome::Searched { seq, result } => {
                self.list
                    .search_settled(seq, result.map_err(|e| e.to_string()), locale);
                None
            }
            Outcome::Created(result) => match result {
                Ok(message) => {
                    info!("{} created: {}", R::NAME, message);
                    self.create.settle(Ok(()));
                    Some(Effect::Search(self.list.mutation_settled(locale)))
                }
                Err(e) => {
                    warn!("{} create failed: {}", R::NAME, e);
                    self.create
                        .settle(Err(format!("{}: {}", locale.get("saveFailed"), e)));
                    None
                }
            },
            Outcome::Updated(result) => match result {
                Ok(message) => {
                    info!("{} updated: {}", R::NAME, message);
                    self.edit.settle(Ok(()));
                    Some(Effect::Search(self.list.mutation_settled(locale)))
                }
                Err(e) => {
                    warn!("{} update failed: {}", R::NAME, e);
                    self.edit
                        .settle(Err(format!("{}: {}", locale.get("saveFailed"), e)));
                    None
                }
            },
            Outcome::Deleted(result) => {
                if let Ok(message) = &result {
                    info!("{} deleted: {}", R::NAME, message);
                }
                self.list
                    .delete_settled(result.map(|_| ()).map_err(|e| e.to_string()), locale)
                    .map(Effect::Search)
            }
        }
    }
}
