use crate::notes_app::error::ApiError;
use crate::notes_app::models::{
    HealthResponse, LoginRequest, LoginResponse, NewNote, Note, UpgradeResponse,
};
use reqwest::{Response, StatusCode};
use tracing::{debug, instrument, warn};

pub const LOGIN_FAILED: &str = "Login failed";
pub const FETCH_FAILED: &str = "Failed to fetch notes";
pub const ADD_FAILED: &str = "Failed to add note";
pub const UPDATE_FAILED: &str = "Failed to update note";
pub const DELETE_FAILED: &str = "Failed to delete note";
pub const UPGRADE_FAILED: &str = "Failed to upgrade plan";

/// Remote notes store behind the SaaS API.
#[derive(Clone)]
pub struct NotesRepository {
    base_url: String,
    http: reqwest::Client,
}

impl NotesRepository {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "login rejected");
            return Err(ApiError::status(response.status().as_u16(), LOGIN_FAILED));
        }
        let body: LoginResponse = response.json().await?;
        if body.access_token.is_empty() {
            warn!("login response carried an empty access token");
            return Err(ApiError::Decode(LOGIN_FAILED.to_string()));
        }
        Ok(body.access_token)
    }

    pub async fn load_notes(&self, token: &str) -> Result<Vec<Note>, ApiError> {
        let response = self
            .http
            .get(self.url("/notes"))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::status(response.status().as_u16(), FETCH_FAILED));
        }
        let notes: Vec<Note> = response.json().await?;
        debug!(count = notes.len(), "notes loaded");
        Ok(notes)
    }

    pub async fn create_note(&self, token: &str, content: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/notes"))
            .bearer_auth(token)
            .json(&NewNote::from_draft(content))
            .send()
            .await?;
        check_status(response, ADD_FAILED).await
    }

    pub async fn update_note(&self, token: &str, id: i64, content: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/notes/{id}")))
            .bearer_auth(token)
            .json(&NewNote::from_draft(content))
            .send()
            .await?;
        check_status(response, UPDATE_FAILED).await
    }

    pub async fn delete_note(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/notes/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        check_status(response, DELETE_FAILED).await
    }

    /// Moves the tenant to the pro plan. The backend only allows admins.
    #[instrument(skip(self, token))]
    pub async fn upgrade_tenant(&self, token: &str, slug: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/tenants/{slug}/upgrade")))
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "upgrade rejected");
            return Err(ApiError::status_with_detail(status.as_u16(), &body, UPGRADE_FAILED));
        }
        let body: UpgradeResponse = response.json().await?;
        Ok(body.plan)
    }

    pub async fn health(&self) -> Result<String, ApiError> {
        let response = self.http.get(self.url("/health")).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::status(
                response.status().as_u16(),
                format!("Health check failed with HTTP {}", response.status().as_u16()),
            ));
        }
        let body: HealthResponse = response.json().await?;
        Ok(body.status)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Success bodies of mutations are discarded; failures may carry a `detail`.
async fn check_status(response: Response, fallback: &str) -> Result<(), ApiError> {
    let status: StatusCode = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    warn!(%status, "mutation rejected");
    Err(ApiError::status_with_detail(status.as_u16(), &body, fallback))
}
