use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{UserId, UserRecord},
    error::ServiceError,
    protocol::{
        LoginFailureBody, LoginRequest, LoginSuccess, MessageBody, RegisterRequest,
        UpdateUserRequest,
    },
};
use url::Url;

/// Upper bound on every network call issued by this crate.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_LOGIN_FAILURE: &str = "invalid username or password";

/// Boundary seam for the remote User Directory Service.
///
/// `list_users`, `delete_user` and `update_user` are protected calls: the
/// caller passes the bearer token read fresh from the session.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginSuccess, ServiceError>;
    async fn register(&self, request: &RegisterRequest) -> Result<(), ServiceError>;
    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, ServiceError>;
    async fn delete_user(&self, token: &str, id: UserId) -> Result<(), ServiceError>;
    async fn update_user(
        &self,
        token: &str,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> Result<(), ServiceError>;
}

/// `DirectoryService` over HTTP, honoring the documented wire contract:
/// `POST /users/login`, `POST /users/register`, `GET /users`,
/// `DELETE /users/{id}`, `PUT /users/{id}` with `Authorization: Bearer`.
pub struct HttpDirectoryService {
    http: Client,
    base_url: Url,
}

impl HttpDirectoryService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::Network(format!("invalid base url '{base_url}': {e}")))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    ServiceError::Network(err.to_string())
}

/// Maps a non-2xx response on a protected call into the failure taxonomy.
///
/// 401 and 422 are what the service produces for a rejected or malformed
/// bearer token, so those become the distinguishable `Unauthorized` kind.
async fn reject(response: reqwest::Response) -> ServiceError {
    let status = response.status();
    let body: MessageBody = response.json().await.unwrap_or_default();
    let message = body
        .message
        .unwrap_or_else(|| format!("request failed with status {status}"));
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::UNPROCESSABLE_ENTITY {
        ServiceError::Unauthorized { message }
    } else {
        ServiceError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    async fn login(&self, request: &LoginRequest) -> Result<LoginSuccess, ServiceError> {
        let response = self
            .http
            .post(self.endpoint("/users/login"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: LoginFailureBody = response.json().await.unwrap_or_default();
            return Err(ServiceError::Rejected {
                status,
                message: body.msg.unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string()),
            });
        }

        response.json().await.map_err(transport_error)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(self.endpoint("/users/register"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }
        Ok(())
    }

    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, ServiceError> {
        let response = self
            .http
            .get(self.endpoint("/users"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }
        response.json().await.map_err(transport_error)
    }

    async fn delete_user(&self, token: &str, id: UserId) -> Result<(), ServiceError> {
        let response = self
            .http
            .delete(self.endpoint(&format!("/users/{}", id.0)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }
        Ok(())
    }

    async fn update_user(
        &self,
        token: &str,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> Result<(), ServiceError> {
        let response = self
            .http
            .put(self.endpoint(&format!("/users/{}", id.0)))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }
        Ok(())
    }
}
