use crate::models::{Exercise, ExerciseLog, LogPatch, LoginRequest, Routine, TokenResponse, User};
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("not logged in")]
    MissingToken,
    #[error("{status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("invalid log id {0}")]
    InvalidLogId(u64),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Rejected { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Typed calls against the coaching backend. The token is passed per call
/// because it lives in local storage, not in the client.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder, token: Option<&str>) -> Result<reqwest::RequestBuilder, ClientError> {
        let token = token.ok_or(ClientError::MissingToken)?;
        Ok(builder.bearer_auth(token))
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<String, ClientError> {
        let resp = self.client.post(self.url("/auth/login")).json(req).send().await?;
        let body: TokenResponse = parse_response(resp).await?;
        Ok(body.token)
    }

    pub async fn me(&self, token: Option<&str>) -> Result<User, ClientError> {
        let req = self.authed(self.client.get(self.url("/users/me")), token)?;
        parse_response(req.send().await?).await
    }

    pub async fn routines_by_user(&self, token: Option<&str>, user_id: u64) -> Result<Vec<Routine>, ClientError> {
        let req = self.authed(self.client.get(self.url(&format!("/routines/user/{user_id}"))), token)?;
        parse_response(req.send().await?).await
    }

    pub async fn routine(&self, token: Option<&str>, routine_id: u64) -> Result<Routine, ClientError> {
        let req = self.authed(self.client.get(self.url(&format!("/routines/{routine_id}"))), token)?;
        parse_response(req.send().await?).await
    }

    pub async fn exercises(&self, token: Option<&str>) -> Result<Vec<Exercise>, ClientError> {
        let req = self.authed(self.client.get(self.url("/exercises")), token)?;
        parse_response(req.send().await?).await
    }

    pub async fn logs_by_user(&self, token: Option<&str>, user_id: u64) -> Result<Vec<ExerciseLog>, ClientError> {
        let req = self.authed(self.client.get(self.url(&format!("/logs/user/{user_id}"))), token)?;
        parse_response(req.send().await?).await
    }

    pub async fn logs_by_date(
        &self,
        token: Option<&str>,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<ExerciseLog>, ClientError> {
        let req = self
            .client
            .get(self.url(&format!("/logs/user/{user_id}/date")))
            .query(&[("dateStr", date.format("%Y-%m-%d").to_string())]);
        let req = self.authed(req, token)?;
        parse_response(req.send().await?).await
    }

    /// Returns the id the backend assigned.
    pub async fn create_log(&self, token: Option<&str>, log: &ExerciseLog) -> Result<u64, ClientError> {
        let req = self.authed(self.client.post(self.url("/logs")).json(log), token)?;
        let id: u64 = parse_response(req.send().await?).await?;
        debug!(log_id = id, date = %log.exercise_date, "created log");
        Ok(id)
    }

    pub async fn patch_log(&self, token: Option<&str>, log_id: u64, patch: &LogPatch) -> Result<(), ClientError> {
        let req = self.authed(self.client.patch(self.url(&format!("/logs/{log_id}"))).json(patch), token)?;
        expect_success(req.send().await?).await
    }

    pub async fn delete_log(&self, token: Option<&str>, log_id: u64) -> Result<(), ClientError> {
        if log_id == 0 {
            return Err(ClientError::InvalidLogId(log_id));
        }
        let req = self.authed(self.client.delete(self.url(&format!("/logs/{log_id}"))), token)?;
        expect_success(req.send().await?).await
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    if !status.is_success() {
        let url = resp.url().clone();
        let body = resp.text().await.unwrap_or_default();
        error!(%status, %url, "backend rejected request");
        return Err(ClientError::Rejected { status, body });
    }
    Ok(resp)
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let resp = check_status(resp).await?;
    Ok(resp.json().await?)
}

async fn expect_success(resp: reqwest::Response) -> Result<(), ClientError> {
    check_status(resp).await.map(|_| ())
}
