//! Per-entity configuration of the generic paginated CRUD list

use std::fmt::Debug;

use crate::console::forms::{
    EntryForm, PermissionDraftForm, PermissionEditForm, UserDraftForm, UserEditForm,
};
use crate::console::validator::Field;
use crate::locale::Locale;
use crate::models::{PermissionFilter, User, UserAppPermission, UserFilter};

/// Text filters bound to the list's search bar
pub trait SearchFilter: Clone + Default + Debug + PartialEq + Send + Sync + 'static {
    fn fields() -> &'static [Field];
    fn get(&self, field: Field) -> &str;
    fn set(&mut self, field: Field, value: &str);

    /// Non-empty filter values as query parameters
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Self::fields()
            .iter()
            .filter_map(|field| {
                let value = self.get(*field).trim();
                (!value.is_empty()).then(|| (field.key(), value.to_string()))
            })
            .collect()
    }
}

impl SearchFilter for PermissionFilter {
    fn fields() -> &'static [Field] {
        &[Field::Username, Field::App]
    }

    fn get(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::App => &self.app,
            _ => "",
        }
    }

    fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::Username => self.username = value.to_string(),
            Field::App => self.app = value.to_string(),
            _ => {}
        }
    }
}

impl SearchFilter for UserFilter {
    fn fields() -> &'static [Field] {
        &[Field::Username]
    }

    fn get(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            _ => "",
        }
    }

    fn set(&mut self, field: Field, value: &str) {
        if field == Field::Username {
            self.username = value.to_string();
        }
    }
}

/// A row of the list's data table
pub trait TableRow {
    fn columns() -> &'static [Field];
    fn cell(&self, column: Field, locale: &Locale) -> String;
}

impl TableRow for UserAppPermission {
    fn columns() -> &'static [Field] {
        &[Field::Username, Field::App, Field::Modules, Field::Action]
    }

    fn cell(&self, column: Field, locale: &Locale) -> String {
        match column {
            Field::Username => self.username.clone(),
            Field::App => self.app.clone(),
            Field::Modules => locale.module_text(self.modules),
            Field::Action => locale.action_text(self.action),
            _ => String::new(),
        }
    }
}

impl TableRow for User {
    fn columns() -> &'static [Field] {
        &[Field::Username, Field::Kps]
    }

    fn cell(&self, column: Field, _locale: &Locale) -> String {
        match column {
            Field::Username => self.username.clone(),
            Field::Kps => self.kps_str().to_string(),
            _ => String::new(),
        }
    }
}

/// Entity managed by a paginated search-and-mutate list
pub trait Resource: Send + Sync + 'static {
    type Item: TableRow + Clone + Debug + PartialEq + Send + Sync + 'static;
    type Filter: SearchFilter;
    type CreateForm: EntryForm;
    type EditForm: EntryForm + for<'a> From<&'a Self::Item>;

    /// Short name used in logs and CLI output
    const NAME: &'static str;
    /// Fixed page size of the list
    const PAGE_SIZE: u32;

    const TITLE_KEY: &'static str;
    const CREATE_TITLE_KEY: &'static str;
    const EDIT_TITLE_KEY: &'static str;
    const DELETE_TITLE_KEY: &'static str;
    const DELETE_TIP_KEY: &'static str;

    /// Human readable identity of an item
    fn describe(item: &Self::Item) -> String;
}

pub type Draft<R> = <<R as Resource>::CreateForm as EntryForm>::Output;
pub type Patch<R> = <<R as Resource>::EditForm as EntryForm>::Output;

/// User-to-app permission grants
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissions;

impl Resource for Permissions {
    type Item = UserAppPermission;
    type Filter = PermissionFilter;
    type CreateForm = PermissionDraftForm;
    type EditForm = PermissionEditForm;

    const NAME: &'static str = "permissions";
    const PAGE_SIZE: u32 = 10;

    const TITLE_KEY: &'static str = "privilegeManagement";
    const CREATE_TITLE_KEY: &'static str = "addAppPermission";
    const EDIT_TITLE_KEY: &'static str = "editAppPermission";
    const DELETE_TITLE_KEY: &'static str = "deletePermission";
    const DELETE_TIP_KEY: &'static str = "deletePermissionTip";

    fn describe(item: &UserAppPermission) -> String {
        format!("{}@{}", item.username, item.app)
    }
}

/// Console users
#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

impl Resource for Users {
    type Item = User;
    type Filter = UserFilter;
    type CreateForm = UserDraftForm;
    type EditForm = UserEditForm;

    const NAME: &'static str = "users";
    const PAGE_SIZE: u32 = 9;

    const TITLE_KEY: &'static str = "userList";
    const CREATE_TITLE_KEY: &'static str = "createUser";
    const EDIT_TITLE_KEY: &'static str = "updateUser";
    const DELETE_TITLE_KEY: &'static str = "deleteUser";
    const DELETE_TIP_KEY: &'static str = "deleteUserTip";

    fn describe(item: &User) -> String {
        item.username.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Module};

    #[test]
    fn test_query_pairs_skip_empty_filters() {
        let filter = PermissionFilter {
            username: "  ".to_string(),
            app: " orders ".to_string(),
        };
        assert_eq!(filter.query_pairs(), vec![("app", "orders".to_string())]);
        assert!(UserFilter::default().query_pairs().is_empty());
    }

    #[test]
    fn test_permission_cells_use_locale_text() {
        let locale = Locale::en_us();
        let grant = UserAppPermission::new("alice", "orders", Module::Naming, Action::Write);
        let cells: Vec<String> = UserAppPermission::columns()
            .iter()
            .map(|c| grant.cell(*c, &locale))
            .collect();
        assert_eq!(cells, vec!["alice", "orders", "Naming only (Naming)", "Write only (w)"]);
    }
}
