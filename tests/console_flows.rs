//! End-to-end console flows against the in-memory gateway

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use permctl::cli::{PageArgs, PermissionCommand, UserCommand};
use permctl::commands;
use permctl::console::{CrudSession, Field, Permissions, SessionError, Users};
use permctl::gateway::{Call, Gateway, GatewayError, MemoryGateway};
use permctl::locale::Locale;
use permctl::models::{
    Action, Module, Page, PermissionFilter, SearchCriteria, User, UserAppPermission, UserUpdate,
};

fn empty_gateway() -> Arc<MemoryGateway> {
    Arc::new(MemoryGateway::new(
        Vec::new(),
        vec![User::new("alice", "")],
        vec!["orders".to_string()],
    ))
}

#[tokio::test]
async fn create_grant_then_refresh_first_page() {
    let gateway = empty_gateway();
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();

    session
        .create(&[
            (Field::Username, "alice"),
            (Field::App, "orders"),
            (Field::Modules, "config"),
            (Field::Action, "rw"),
        ])
        .await
        .unwrap();

    let calls = gateway.calls().await;
    let created = UserAppPermission::new("alice", "orders", Module::Config, Action::ReadWrite);
    let n = calls.len();
    assert_eq!(calls[n - 2], Call::CreatePermission(created));
    assert_eq!(
        calls[n - 1],
        Call::SearchPermissions(SearchCriteria {
            page_no: 1,
            page_size: 10,
            filter: PermissionFilter::default(),
        })
    );
    assert_eq!(session.items().len(), 1);
    assert!(!session.screen.create.is_open());
}

#[tokio::test]
async fn missing_fields_send_nothing() {
    let gateway = empty_gateway();
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());

    let err = session
        .create(&[(Field::Username, "alice")])
        .await
        .unwrap_err();

    match err {
        SessionError::Invalid(errors) => {
            assert_eq!(errors.len(), 3);
            assert_eq!(errors.get(Field::App), Some("App cannot be empty"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn rejected_create_reports_server_message() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();

    let err = session
        .create(&[
            (Field::Username, "alice"),
            (Field::App, "orders"),
            (Field::Modules, "*"),
            (Field::Action, "r"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Failed(ref m) if m.contains("already has a permission")));
    assert_eq!(gateway.permissions().await.len(), 15);
}

#[tokio::test]
async fn edit_changes_action_only() {
    let gateway = Arc::new(MemoryGateway::new(
        vec![UserAppPermission::new("bob", "billing", Module::Naming, Action::Read)],
        Vec::new(),
        Vec::new(),
    ));
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();
    let grant = session.find(|p| p.username == "bob").unwrap();

    // username and app are read-only in the edit form
    session
        .edit(&grant, &[(Field::App, "orders"), (Field::Action, "rw")])
        .await
        .unwrap();

    let stored = gateway.permissions().await;
    assert_eq!(stored[0].app, "billing");
    assert_eq!(stored[0].modules, Module::Naming);
    assert_eq!(stored[0].action, Action::ReadWrite);
}

#[tokio::test]
async fn declined_delete_makes_no_call() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut session = CrudSession::<Users, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();
    let before = gateway.calls().await.len();
    let bob = session.find(|u| u.username == "bob").unwrap();

    assert!(!session.delete(bob.clone(), false).await.unwrap());
    assert_eq!(gateway.calls().await.len(), before);

    assert!(session.delete(bob, true).await.unwrap());
    assert!(gateway
        .calls()
        .await
        .contains(&Call::DeleteUser("bob".to_string())));
}

#[tokio::test]
async fn delete_on_last_page_moves_back() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();
    session.change_page(2).await.unwrap();
    assert_eq!(session.items().len(), 5);

    for _ in 0..5 {
        let item = session.items()[0].clone();
        session.delete(item, true).await.unwrap();
    }

    assert_eq!(session.screen.list.page_no(), 1);
    assert_eq!(session.items().len(), 10);
    assert!(!session.screen.list.pager_visible());
}

/// Serves the first search, then refuses every later one
struct SearchOutage {
    inner: MemoryGateway,
    searches: AtomicUsize,
}

#[async_trait]
impl Gateway<Permissions> for SearchOutage {
    async fn search(
        &self,
        criteria: &SearchCriteria<PermissionFilter>,
    ) -> Result<Page<UserAppPermission>, GatewayError> {
        if self.searches.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(GatewayError::rejected("search down"));
        }
        Gateway::<Permissions>::search(&self.inner, criteria).await
    }

    async fn create(&self, draft: &UserAppPermission) -> Result<String, GatewayError> {
        Gateway::<Permissions>::create(&self.inner, draft).await
    }

    async fn update(&self, patch: &UserAppPermission) -> Result<String, GatewayError> {
        Gateway::<Permissions>::update(&self.inner, patch).await
    }

    async fn delete(&self, item: &UserAppPermission) -> Result<String, GatewayError> {
        Gateway::<Permissions>::delete(&self.inner, item).await
    }
}

#[tokio::test]
async fn delete_succeeds_even_when_refresh_fails() {
    let gateway = Arc::new(SearchOutage {
        inner: MemoryGateway::seeded(),
        searches: AtomicUsize::new(0),
    });
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();
    let item = session.items()[0].clone();

    assert!(session.delete(item.clone(), true).await.unwrap());
    assert_eq!(gateway.inner.permissions().await.len(), 14);
    assert!(!gateway
        .inner
        .permissions()
        .await
        .iter()
        .any(|p| p.same_grant(&item)));
}

#[tokio::test]
async fn failed_delete_is_reported() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut session = CrudSession::<Permissions, _>::new(gateway.clone(), Locale::en_us());
    session.mount().await.unwrap();
    let item = session.items()[0].clone();
    gateway.fail_next("Permission denied").await;

    let err = session.delete(item, true).await.unwrap_err();
    assert!(err.to_string().contains("Permission denied"));
    assert_eq!(gateway.permissions().await.len(), 15);
}

#[tokio::test]
async fn failed_search_surfaces_as_error() {
    let gateway = Arc::new(MemoryGateway::seeded());
    gateway.fail_next("authorization failed!").await;
    let mut session = CrudSession::<Users, _>::new(gateway.clone(), Locale::en_us());

    let err = session.mount().await.unwrap_err();
    assert!(err.to_string().contains("authorization failed!"));
    assert!(session.items().is_empty());
}

#[tokio::test]
async fn cli_permission_list_prints_pager() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut out = Vec::new();
    let mut never = |_: &str| -> anyhow::Result<bool> { panic!("no prompt expected") };
    let command = PermissionCommand::List {
        username: None,
        app: None,
        paging: PageArgs { page: 2 },
    };

    commands::run_permissions(gateway, Locale::en_us(), &command, &mut out, &mut never)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("Username"));
    assert_eq!(lines.len(), 1 + 5 + 1);
    assert_eq!(lines[6], "Page 2/2 (15 total)");
}

#[tokio::test]
async fn cli_user_add_reports_field_errors() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut out = Vec::new();
    let mut never = |_: &str| -> anyhow::Result<bool> { Ok(false) };
    let command = UserCommand::Add {
        username: "zoe".to_string(),
        password: "  ".to_string(),
    };

    let err = commands::run_users(gateway.clone(), Locale::en_us(), &command, &mut out, &mut never)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "1 field(s) failed validation");
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Password: Password cannot be empty"));
    assert!(!gateway
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, Call::CreateUser(_))));
}

#[tokio::test]
async fn cli_user_update_and_prompted_delete() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut out = Vec::new();
    let mut prompts = Vec::new();
    let mut answer_no = |prompt: &str| -> anyhow::Result<bool> {
        prompts.push(prompt.to_string());
        Ok(false)
    };

    let update = UserCommand::Update {
        username: "bob".to_string(),
        kps: "public, test".to_string(),
    };
    commands::run_users(gateway.clone(), Locale::en_us(), &update, &mut out, &mut answer_no)
        .await
        .unwrap();

    let delete = UserCommand::Delete {
        username: "bob".to_string(),
        yes: false,
    };
    commands::run_users(gateway.clone(), Locale::en_us(), &delete, &mut out, &mut answer_no)
        .await
        .unwrap();

    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Delete User"));
    let calls = gateway.calls().await;
    assert!(calls.contains(&Call::UpdateUser(UserUpdate {
        username: "bob".to_string(),
        kps: "public, test".to_string(),
    })));
    assert!(!calls.iter().any(|c| matches!(c, Call::DeleteUser(_))));
    assert!(String::from_utf8(out).unwrap().ends_with("Cancelled\n"));
}

#[tokio::test]
async fn cli_edit_unknown_grant_is_not_found() {
    let gateway = Arc::new(MemoryGateway::seeded());
    let mut out = Vec::new();
    let mut never = |_: &str| -> anyhow::Result<bool> { Ok(true) };
    let command = PermissionCommand::Edit {
        username: "nobody".to_string(),
        app: "orders".to_string(),
        modules: None,
        action: Some(Action::Write),
    };

    let err = commands::run_permissions(gateway, Locale::en_us(), &command, &mut out, &mut never)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "permission nobody@orders not found");
}
