//! Events delivered to the TUI loop from background tasks

use crate::console::{Outcome, Permissions, Users};

/// Completion of a gateway call spawned by the app
pub enum AppEvent {
    Permissions(Outcome<Permissions>),
    Users(Outcome<Users>),
    /// Username suggestions for lookup request `seq`
    Lookup {
        seq: u64,
        result: Result<Vec<String>, String>,
    },
    /// Apps available in the create dialog
    Apps(Result<Vec<String>, String>),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Permissions(_) => "permissions",
            AppEvent::Users(_) => "users",
            AppEvent::Lookup { .. } => "lookup",
            AppEvent::Apps(_) => "apps",
        }
    }
}
