//! Remote data gateway
//!
//! The console core never talks to the network directly; everything goes
//! through these traits. `HttpGateway` speaks the server's REST API and
//! `MemoryGateway` keeps everything in process (demo mode and tests).

pub mod errors;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::console::resource::{Draft, Patch, Permissions, Resource, Users};
use crate::models::{Page, SearchCriteria};

pub use errors::GatewayError;
pub use http::HttpGateway;
pub use memory::{Call, MemoryGateway};

/// Search and mutation calls for one resource type
#[async_trait]
pub trait Gateway<R: Resource>: Send + Sync {
    async fn search(
        &self,
        criteria: &SearchCriteria<R::Filter>,
    ) -> Result<Page<R::Item>, GatewayError>;

    /// Returns the server's acknowledgement message
    async fn create(&self, draft: &Draft<R>) -> Result<String, GatewayError>;

    async fn update(&self, patch: &Patch<R>) -> Result<String, GatewayError>;

    async fn delete(&self, item: &R::Item) -> Result<String, GatewayError>;
}

/// Lookups feeding the entry dialogs
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Usernames matching a typed fragment
    async fn search_usernames(&self, fragment: &str) -> Result<Vec<String>, GatewayError>;

    /// Apps the logged-in user may grant permissions on
    async fn list_apps(&self) -> Result<Vec<String>, GatewayError>;
}

/// Everything the console front ends need from the server
pub trait ConsoleGateway: Gateway<Permissions> + Gateway<Users> + DirectoryGateway {}

impl<T> ConsoleGateway for T where T: Gateway<Permissions> + Gateway<Users> + DirectoryGateway {}
