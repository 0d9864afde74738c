//! REST gateway against the server console API

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{Config, Credentials};
use crate::console::resource::{Permissions, SearchFilter, Users};
use crate::gateway::{DirectoryGateway, Gateway, GatewayError};
use crate::models::{
    LoginResponse, NewUser, Page, PermissionFilter, RestResult, SearchCriteria, User,
    UserAppPermission, UserFilter, UserUpdate,
};

const PERMISSIONS_PATH: &[&str] = &["v1", "auth", "userAppPermissions"];
const USERS_PATH: &[&str] = &["v1", "auth", "users"];
const USER_SEARCH_PATH: &[&str] = &["v1", "auth", "users", "search"];
const LOGIN_PATH: &[&str] = &["v1", "auth", "users", "login"];
const APPS_PATH: &[&str] = &["v1", "auth", "app"];

pub struct HttpGateway {
    client: Client,
    base: Url,
    access_token: Option<String>,
}

impl HttpGateway {
    pub fn new(client: Client, base: Url) -> Self {
        Self {
            client,
            base,
            access_token: None,
        }
    }

    /// Build a gateway with timeout and user agent taken from the config
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let base = Url::parse(&config.server_url)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", config.server_url, e)))?;
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;
        let mut gateway = Self::new(client, base);
        gateway.access_token = config.access_token.clone();
        Ok(gateway)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Exchange credentials for an access token used by every later call
    #[instrument(name = "permctl.http.login", skip_all, fields(username = %credentials.username))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), GatewayError> {
        let url = self.endpoint(LOGIN_PATH)?;
        let response = self
            .client
            .post(url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;
        let login: LoginResponse = read_json(response)
            .await
            .map_err(|e| GatewayError::Login(e.to_string()))?;
        info!(
            "Logged in as {} (token ttl {}s, global admin: {})",
            credentials.username, login.token_ttl, login.global_admin
        );
        self.access_token = Some(login.access_token);
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, GatewayError> {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);
        let mut builder = self.client.request(method, url).query(query);
        if let Some(token) = &self.access_token {
            builder = builder.query(&[("accessToken", token.as_str())]);
        }
        Ok(builder)
    }

    async fn search_page<T, F>(
        &self,
        segments: &[&str],
        criteria: &SearchCriteria<F>,
    ) -> Result<Page<T>, GatewayError>
    where
        T: DeserializeOwned,
        F: SearchFilter,
    {
        let mut query = vec![
            ("pageNo", criteria.page_no.to_string()),
            ("pageSize", criteria.page_size.to_string()),
        ];
        query.extend(criteria.filter.query_pairs());
        let response = self.request(Method::GET, segments, &query)?.send().await?;
        read_json(response).await
    }

    async fn mutate(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<String, GatewayError> {
        let response = self.request(method, segments, query)?.send().await?;
        read_ack(response).await
    }
}

fn grant_query(permission: &UserAppPermission) -> Vec<(&'static str, String)> {
    vec![
        ("username", permission.username.clone()),
        ("app", permission.app.clone()),
        ("modules", permission.modules.as_str().to_string()),
        ("action", permission.action.as_str().to_string()),
    ]
}

/// Decode a JSON body, turning non-2xx statuses into errors carrying the body
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            body.trim().to_string()
        };
        return Err(GatewayError::Status {
            status_code: status.as_u16(),
            message,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

async fn read_ack(response: Response) -> Result<String, GatewayError> {
    let result: RestResult<serde_json::Value> = read_json(response).await?;
    let message = result.message.unwrap_or_default();
    if result.code != 200 {
        return Err(GatewayError::Rejected {
            code: result.code,
            message,
        });
    }
    Ok(message)
}

#[async_trait]
impl Gateway<Permissions> for HttpGateway {
    #[instrument(
        name = "permctl.http.permissions.search",
        skip_all,
        fields(page_no = criteria.page_no, page_size = criteria.page_size)
    )]
    async fn search(
        &self,
        criteria: &SearchCriteria<PermissionFilter>,
    ) -> Result<Page<UserAppPermission>, GatewayError> {
        self.search_page(PERMISSIONS_PATH, criteria).await
    }

    #[instrument(name = "permctl.http.permissions.create", skip_all, fields(username = %draft.username, app = %draft.app))]
    async fn create(&self, draft: &UserAppPermission) -> Result<String, GatewayError> {
        self.mutate(Method::POST, PERMISSIONS_PATH, &grant_query(draft)).await
    }

    #[instrument(name = "permctl.http.permissions.update", skip_all, fields(username = %patch.username, app = %patch.app))]
    async fn update(&self, patch: &UserAppPermission) -> Result<String, GatewayError> {
        self.mutate(Method::PUT, PERMISSIONS_PATH, &grant_query(patch)).await
    }

    #[instrument(name = "permctl.http.permissions.delete", skip_all, fields(username = %item.username, app = %item.app))]
    async fn delete(&self, item: &UserAppPermission) -> Result<String, GatewayError> {
        let query = [
            ("username", item.username.clone()),
            ("app", item.app.clone()),
        ];
        self.mutate(Method::DELETE, PERMISSIONS_PATH, &query).await
    }
}

#[async_trait]
impl Gateway<Users> for HttpGateway {
    #[instrument(
        name = "permctl.http.users.search",
        skip_all,
        fields(page_no = criteria.page_no, page_size = criteria.page_size)
    )]
    async fn search(&self, criteria: &SearchCriteria<UserFilter>) -> Result<Page<User>, GatewayError> {
        self.search_page(USERS_PATH, criteria).await
    }

    #[instrument(name = "permctl.http.users.create", skip_all, fields(username = %draft.username))]
    async fn create(&self, draft: &NewUser) -> Result<String, GatewayError> {
        let query = [
            ("username", draft.username.clone()),
            ("password", draft.password.clone()),
        ];
        self.mutate(Method::POST, USERS_PATH, &query).await
    }

    #[instrument(name = "permctl.http.users.update", skip_all, fields(username = %patch.username))]
    async fn update(&self, patch: &UserUpdate) -> Result<String, GatewayError> {
        let query = [
            ("username", patch.username.clone()),
            ("kps", patch.normalized_kps()),
        ];
        self.mutate(Method::PUT, USERS_PATH, &query).await
    }

    #[instrument(name = "permctl.http.users.delete", skip_all, fields(username = %item.username))]
    async fn delete(&self, item: &User) -> Result<String, GatewayError> {
        let query = [("username", item.username.clone())];
        self.mutate(Method::DELETE, USERS_PATH, &query).await
    }
}

#[async_trait]
impl DirectoryGateway for HttpGateway {
    #[instrument(name = "permctl.http.users.lookup", skip_all, fields(fragment = %fragment))]
    async fn search_usernames(&self, fragment: &str) -> Result<Vec<String>, GatewayError> {
        let query = [("username", fragment.to_string())];
        let response = self
            .request(Method::GET, USER_SEARCH_PATH, &query)?
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(name = "permctl.http.apps.list", skip_all)]
    async fn list_apps(&self) -> Result<Vec<String>, GatewayError> {
        let response = self.request(Method::GET, APPS_PATH, &[])?.send().await?;
        let result: RestResult<Vec<String>> = read_json(response).await?;
        if result.code != 200 {
            return Err(GatewayError::Rejected {
                code: result.code,
                message: result.message.unwrap_or_default(),
            });
        }
        Ok(result.data.unwrap_or_default())
    }
}
