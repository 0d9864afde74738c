//! Display strings for the console
//!
//! A `Locale` is an opaque key to string mapping. Built-in tables cover
//! English and Simplified Chinese; a JSON file can override any key.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::models::{Action, Module};

const EN_US: &[(&str, &str)] = &[
    ("privilegeManagement", "App Permissions"),
    ("userList", "Users"),
    ("username", "Username"),
    ("app", "App"),
    ("module", "Module"),
    ("action", "Action"),
    ("kps", "Namespace Keys"),
    ("password", "Password"),
    ("operation", "Operation"),
    ("query", "Query"),
    ("edit", "Edit"),
    ("usernamePlaceholder", "Enter a username"),
    ("appPlaceholder", "Select an app"),
    ("modulePlaceholder", "Select a module"),
    ("actionPlaceholder", "Select an action"),
    ("kpsPlaceholder", "Comma separated namespace keys"),
    ("passwordPlaceholder", "Enter a password"),
    ("usernameError", "Username cannot be empty"),
    ("appError", "App cannot be empty"),
    ("moduleError", "Module cannot be empty"),
    ("actionError", "Action cannot be empty"),
    ("kpsError", "Namespace keys cannot be empty"),
    ("passwordError", "Password cannot be empty"),
    ("configOnly", "Config only"),
    ("namingOnly", "Naming only"),
    ("allModule", "All modules"),
    ("readOnly", "Read only"),
    ("writeOnly", "Write only"),
    ("readWrite", "Read & write"),
    ("addAppPermission", "Add Permission"),
    ("editAppPermission", "Edit Permission"),
    ("deletePermission", "Delete Permission"),
    ("deletePermissionTip", "Delete this permission?"),
    ("createUser", "Create User"),
    ("updateUser", "Update User"),
    ("deleteUser", "Delete User"),
    ("deleteUserTip", "Delete this user?"),
    ("loading", "Loading..."),
    ("empty", "No data"),
    ("searchFailed", "Search failed"),
    ("saveFailed", "Save failed"),
    ("deleteFailed", "Delete failed"),
    ("saved", "Saved"),
    ("deleted", "Deleted"),
];

const ZH_CN: &[(&str, &str)] = &[
    ("privilegeManagement", "应用权限管理"),
    ("userList", "用户列表"),
    ("username", "用户名"),
    ("app", "应用"),
    ("module", "模块"),
    ("action", "动作"),
    ("kps", "命名空间"),
    ("password", "密码"),
    ("operation", "操作"),
    ("query", "查询"),
    ("edit", "编辑"),
    ("usernamePlaceholder", "请输入用户名"),
    ("appPlaceholder", "请选择应用"),
    ("modulePlaceholder", "请选择模块"),
    ("actionPlaceholder", "请选择动作"),
    ("kpsPlaceholder", "多个命名空间以逗号分隔"),
    ("passwordPlaceholder", "请输入密码"),
    ("usernameError", "用户名不能为空"),
    ("appError", "应用不能为空"),
    ("moduleError", "模块不能为空"),
    ("actionError", "动作不能为空"),
    ("kpsError", "命名空间不能为空"),
    ("passwordError", "密码不能为空"),
    ("configOnly", "仅配置"),
    ("namingOnly", "仅服务"),
    ("allModule", "全部模块"),
    ("readOnly", "只读"),
    ("writeOnly", "只写"),
    ("readWrite", "读写"),
    ("addAppPermission", "添加权限"),
    ("editAppPermission", "编辑权限"),
    ("deletePermission", "删除权限"),
    ("deletePermissionTip", "是否要删除该权限？"),
    ("createUser", "创建用户"),
    ("updateUser", "修改用户"),
    ("deleteUser", "删除用户"),
    ("deleteUserTip", "是否要删除该用户？"),
    ("loading", "加载中..."),
    ("empty", "没有数据"),
    ("searchFailed", "查询失败"),
    ("saveFailed", "保存失败"),
    ("deleteFailed", "删除失败"),
    ("saved", "保存成功"),
    ("deleted", "删除成功"),
];

#[derive(Debug, Clone)]
pub struct Locale {
    pub name: String,
    strings: HashMap<String, String>,
}

impl Default for Locale {
    fn default() -> Self {
        Self::en_us()
    }
}

impl Locale {
    pub fn en_us() -> Self {
        Self::from_table("en-US", EN_US)
    }

    pub fn zh_cn() -> Self {
        Self::from_table("zh-CN", ZH_CN)
    }

    fn from_table(name: &str, table: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            strings: table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Resolve a built-in locale by name, falling back to English
    pub fn named(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "zh-cn" | "zh_cn" | "zh" => Self::zh_cn(),
            _ => Self::en_us(),
        }
    }

    /// Overlay string overrides from a flat JSON object
    pub fn with_overrides_file(mut self, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read locale file: {}", path.display()))?;
        let overrides: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("Locale file is not a flat JSON object: {}", path.display()))?;
        self.strings.extend(overrides);
        Ok(self)
    }

    /// Look up a display string; unknown keys render as the key itself
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn module_text(&self, module: Module) -> String {
        match module {
            Module::Config => format!("{} (Config)", self.get("configOnly")),
            Module::Naming => format!("{} (Naming)", self.get("namingOnly")),
            Module::All => format!("{} (All)", self.get("allModule")),
        }
    }

    pub fn action_text(&self, action: Action) -> String {
        match action {
            Action::Read => format!("{} (r)", self.get("readOnly")),
            Action::Write => format!("{} (w)", self.get("writeOnly")),
            Action::ReadWrite => format!("{} (rw)", self.get("readWrite")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_tables_share_keys() {
        let en = Locale::en_us();
        let zh = Locale::zh_cn();
        for (key, _) in EN_US {
            assert_ne!(zh.get(key), *key, "missing zh-CN string for {}", key);
            assert_ne!(en.get(key), *key);
        }
    }

    #[test]
    fn test_display_text() {
        let en = Locale::en_us();
        assert_eq!(en.module_text(Module::All), "All modules (All)");
        assert_eq!(en.action_text(Action::ReadWrite), "Read & write (rw)");
        assert_eq!(en.get("noSuchKey"), "noSuchKey");
    }

    #[test]
    fn test_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"query": "Search"}}"#).unwrap();
        let locale = Locale::en_us().with_overrides_file(file.path()).unwrap();
        assert_eq!(locale.get("query"), "Search");
        assert_eq!(locale.get("edit"), "Edit");
    }

    #[test]
    fn test_named_fallback() {
        assert_eq!(Locale::named("zh-CN").name, "zh-CN");
        assert_eq!(Locale::named("fr").name, "en-US");
    }
}
