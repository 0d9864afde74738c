//! Headless console core
//!
//! State machines for the paginated lists, entry dialogs and username lookup.
//! Nothing in here renders or performs I/O; front ends feed user intents and
//! gateway outcomes in and run the effects that come out.

pub mod crud;
pub mod dialog;
pub mod forms;
pub mod list;
pub mod lookup;
pub mod notice;
pub mod resource;
pub mod session;
pub mod validator;

pub use crud::{execute, CrudScreen, Effect, Outcome};
pub use dialog::{DialogPhase, EntryDialog};
pub use list::{ListState, SearchRequest};
pub use lookup::{LookupRequest, UsernameLookup};
pub use notice::{Notice, NoticeLevel};
pub use resource::{Permissions, Resource, Users};
pub use session::{CrudSession, SessionError};
pub use validator::{Field, FieldErrors};
