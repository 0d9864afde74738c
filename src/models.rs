use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access scope of an app permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module {
    #[serde(rename = "config")]
    Config,
    #[serde(rename = "naming")]
    Naming,
    #[serde(rename = "*")]
    All,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Config, Module::Naming, Module::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Config => "config",
            Module::Naming => "naming",
            Module::All => "*",
        }
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "config" => Ok(Module::Config),
            "naming" => Ok(Module::Naming),
            "*" => Ok(Module::All),
            other => Err(format!("Unknown module '{}' (expected config, naming or *)", other)),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission level of an app permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "rw")]
    ReadWrite,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Read, Action::Write, Action::ReadWrite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "r",
            Action::Write => "w",
            Action::ReadWrite => "rw",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "r" => Ok(Action::Read),
            "w" => Ok(Action::Write),
            "rw" => Ok(Action::ReadWrite),
            other => Err(format!("Unknown action '{}' (expected r, w or rw)", other)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grant of a module/action pair on one app to one user.
///
/// `(username, app)` identifies the grant; an update replaces the whole
/// module/action pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAppPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    pub app: String,
    pub modules: Module,
    pub action: Action,
}

impl UserAppPermission {
    pub fn new(username: &str, app: &str, modules: Module, action: Action) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            app: app.to_string(),
            modules,
            action,
        }
    }

    pub fn same_grant(&self, other: &UserAppPermission) -> bool {
        self.username == other.username && self.app == other.app
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Comma separated namespace keys
    #[serde(default)]
    pub kps: Option<String>,
}

impl User {
    pub fn new(username: &str, kps: &str) -> Self {
        Self {
            username: username.to_string(),
            kps: if kps.is_empty() { None } else { Some(kps.to_string()) },
        }
    }

    pub fn kps_str(&self) -> &str {
        self.kps.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// Replacement of a user's namespace keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: String,
    pub kps: String,
}

impl UserUpdate {
    /// Normalized kps list as sent to the server
    pub fn normalized_kps(&self) -> String {
        normalize_kps(&self.kps)
    }
}

/// Trim each comma separated key and drop the empty ones
pub fn normalize_kps(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// One page of search results as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub pages_available: u32,
    #[serde(default = "Vec::new")]
    pub page_items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            total_count: 0,
            page_number: 0,
            pages_available: 0,
            page_items: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    pub fn new(page_items: Vec<T>, total_count: u64) -> Self {
        Self {
            total_count,
            page_items,
            ..Default::default()
        }
    }
}

/// Search criteria for a paginated list; `page_no` is 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria<F> {
    pub page_no: u32,
    pub page_size: u32,
    pub filter: F,
}

impl<F> SearchCriteria<F> {
    /// Zero-based offset of the first item on the requested page
    pub fn offset(&self) -> usize {
        (self.page_no.saturating_sub(1) as usize) * self.page_size as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFilter {
    pub username: String,
    pub app: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub username: String,
}

/// Envelope used by the server for mutations and some lookups
#[derive(Debug, Clone, Deserialize)]
pub struct RestResult<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_ttl: u64,
    #[serde(default)]
    pub global_admin: bool,
}
