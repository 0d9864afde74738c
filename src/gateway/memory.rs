//! In-process gateway backing demo mode and tests

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::console::resource::{Permissions, Users};
use crate::gateway::{DirectoryGateway, Gateway, GatewayError};
use crate::models::{
    Action, Module, NewUser, Page, PermissionFilter, SearchCriteria, User, UserAppPermission,
    UserFilter, UserUpdate,
};

/// A gateway call as recorded by [`MemoryGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SearchPermissions(SearchCriteria<PermissionFilter>),
    CreatePermission(UserAppPermission),
    UpdatePermission(UserAppPermission),
    DeletePermission { username: String, app: String },
    SearchUsers(SearchCriteria<UserFilter>),
    CreateUser(NewUser),
    UpdateUser(UserUpdate),
    DeleteUser(String),
    SearchUsernames(String),
    ListApps,
}

#[derive(Debug, Default)]
struct State {
    permissions: Vec<UserAppPermission>,
    users: Vec<User>,
    apps: Vec<String>,
    calls: Vec<Call>,
    fail_next: Option<String>,
}

impl State {
    /// Record a call, failing it if a failure was queued
    fn record(&mut self, call: Call) -> Result<(), GatewayError> {
        debug!("Memory gateway call: {:?}", call);
        self.calls.push(call);
        match self.fail_next.take() {
            Some(message) => Err(GatewayError::Status {
                status_code: 403,
                message,
            }),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        self.permissions
            .iter()
            .filter_map(|p| p.id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

fn matches_filter(value: &str, filter: &str) -> bool {
    let filter = filter.trim();
    filter.is_empty() || value.contains(filter)
}

fn paginate<T: Clone, F>(rows: Vec<T>, criteria: &SearchCriteria<F>) -> Page<T> {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(criteria.offset())
        .take(criteria.page_size as usize)
        .collect();
    let mut page = Page::new(items, total);
    page.page_number = criteria.page_no;
    page.pages_available = crate::console::list::pages_for(total, criteria.page_size);
    page
}

impl MemoryGateway {
    pub fn new(permissions: Vec<UserAppPermission>, users: Vec<User>, apps: Vec<String>) -> Self {
        Self {
            state: Mutex::new(State {
                permissions,
                users,
                apps,
                ..State::default()
            }),
        }
    }

    /// Demo data spanning more than one page of grants
    pub fn seeded() -> Self {
        let apps: Vec<String> = ["orders", "billing", "inventory", "gateway"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let names = ["alice", "bob", "carol", "dave", "erin", "frank"];
        let users = names
            .iter()
            .enumerate()
            .map(|(i, name)| User::new(name, if i % 2 == 0 { "public,dev" } else { "" }))
            .collect();
        let mut permissions = Vec::new();
        for (i, name) in names.iter().enumerate() {
            for (j, app) in apps.iter().enumerate().take(2 + i % 2) {
                let mut grant = UserAppPermission::new(
                    name,
                    app,
                    Module::ALL[(i + j) % 3],
                    Action::ALL[(i + 2 * j) % 3],
                );
                grant.id = Some(permissions.len() as i64 + 1);
                permissions.push(grant);
            }
        }
        Self::new(permissions, users, apps)
    }

    /// Every call made so far, oldest first
    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    /// Make the next call fail as if the server refused it
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().await.fail_next = Some(message.into());
    }

    pub async fn permissions(&self) -> Vec<UserAppPermission> {
        self.state.lock().await.permissions.clone()
    }

    pub async fn users(&self) -> Vec<User> {
        self.state.lock().await.users.clone()
    }
}

#[async_trait]
impl Gateway<Permissions> for MemoryGateway {
    async fn search(
        &self,
        criteria: &SearchCriteria<PermissionFilter>,
    ) -> Result<Page<UserAppPermission>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::SearchPermissions(criteria.clone()))?;
        let rows = state
            .permissions
            .iter()
            .filter(|p| matches_filter(&p.username, &criteria.filter.username))
            .filter(|p| matches_filter(&p.app, &criteria.filter.app))
            .cloned()
            .collect();
        Ok(paginate(rows, criteria))
    }

    async fn create(&self, draft: &UserAppPermission) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::CreatePermission(draft.clone()))?;
        if state.permissions.iter().any(|p| p.same_grant(draft)) {
            return Err(GatewayError::rejected(format!(
                "user '{}' already has a permission on app '{}'",
                draft.username, draft.app
            )));
        }
        let mut grant = draft.clone();
        grant.id = Some(state.next_id());
        state.permissions.push(grant);
        Ok("add permission ok!".to_string())
    }

    async fn update(&self, patch: &UserAppPermission) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::UpdatePermission(patch.clone()))?;
        let grant = state
            .permissions
            .iter_mut()
            .find(|p| p.same_grant(patch))
            .ok_or_else(|| {
                GatewayError::rejected(format!(
                    "no permission for user '{}' on app '{}'",
                    patch.username, patch.app
                ))
            })?;
        grant.modules = patch.modules;
        grant.action = patch.action;
        Ok("update permission ok!".to_string())
    }

    async fn delete(&self, item: &UserAppPermission) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::DeletePermission {
            username: item.username.clone(),
            app: item.app.clone(),
        })?;
        state.permissions.retain(|p| !p.same_grant(item));
        Ok("delete permission ok!".to_string())
    }
}

#[async_trait]
impl Gateway<Users> for MemoryGateway {
    async fn search(&self, criteria: &SearchCriteria<UserFilter>) -> Result<Page<User>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::SearchUsers(criteria.clone()))?;
        let rows = state
            .users
            .iter()
            .filter(|u| matches_filter(&u.username, &criteria.filter.username))
            .cloned()
            .collect();
        Ok(paginate(rows, criteria))
    }

    async fn create(&self, draft: &NewUser) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::CreateUser(draft.clone()))?;
        if state.users.iter().any(|u| u.username == draft.username) {
            return Err(GatewayError::rejected(format!(
                "user '{}' already exist!",
                draft.username
            )));
        }
        state.users.push(User::new(&draft.username, ""));
        Ok("create user ok!".to_string())
    }

    async fn update(&self, patch: &UserUpdate) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::UpdateUser(patch.clone()))?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.username == patch.username)
            .ok_or_else(|| {
                GatewayError::rejected(format!("user '{}' not exist!", patch.username))
            })?;
        let kps = patch.normalized_kps();
        user.kps = (!kps.is_empty()).then_some(kps);
        Ok("update user ok!".to_string())
    }

    async fn delete(&self, item: &User) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::DeleteUser(item.username.clone()))?;
        state.users.retain(|u| u.username != item.username);
        Ok("delete user ok!".to_string())
    }
}

#[async_trait]
impl DirectoryGateway for MemoryGateway {
    async fn search_usernames(&self, fragment: &str) -> Result<Vec<String>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::SearchUsernames(fragment.to_string()))?;
        Ok(state
            .users
            .iter()
            .filter(|u| u.username.contains(fragment))
            .map(|u| u.username.clone())
            .collect())
    }

    async fn list_apps(&self) -> Result<Vec<String>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Call::ListApps)?;
        Ok(state.apps.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(page_no: u32, username: &str) -> SearchCriteria<PermissionFilter> {
        SearchCriteria {
            page_no,
            page_size: 10,
            filter: PermissionFilter {
                username: username.to_string(),
                app: String::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_seeded_spans_two_pages() {
        let gateway = MemoryGateway::seeded();
        let first = Gateway::<Permissions>::search(&gateway, &criteria(1, "")).await.unwrap();
        assert!(first.total_count > 10);
        assert_eq!(first.page_items.len(), 10);

        let second = Gateway::<Permissions>::search(&gateway, &criteria(2, "")).await.unwrap();
        assert_eq!(second.page_items.len() as u64, first.total_count - 10);
    }

    #[tokio::test]
    async fn test_duplicate_grant_rejected() {
        let gateway = MemoryGateway::default();
        let grant = UserAppPermission::new("alice", "orders", Module::Config, Action::Read);
        Gateway::<Permissions>::create(&gateway, &grant).await.unwrap();
        let err = Gateway::<Permissions>::create(&gateway, &grant).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
        assert_eq!(gateway.permissions().await[0].id, Some(1));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let gateway = MemoryGateway::seeded();
        gateway.fail_next("Permission denied").await;
        let err = gateway.list_apps().await.unwrap_err();
        assert!(err.is_forbidden());
        assert_eq!(gateway.list_apps().await.unwrap().len(), 4);
        assert_eq!(gateway.calls().await, vec![Call::ListApps, Call::ListApps]);
    }
}
