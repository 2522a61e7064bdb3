use crate::config::{Config, ConfigError};
use crate::service::{
    ExperimentRecord, LoadTestRecord, ServiceError, ServiceResult, SummaryService,
};
use crate::session::history::{HistoryEntry, HistorySummary, SaveSummaryRequest};
use crate::session::SummaryResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct HttpSummaryService {
    http: Client,
    base: Url,
}

impl HttpSummaryService {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|_| ConfigError::InvalidCookie)?;
            headers.insert(COOKIE, value);
        }

        let base = Url::parse(&config.server_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidServerUrl(config.server_url.clone()))?;

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().map_err(ConfigError::HttpClient)?,
            base,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// `<base>/<action>/<id>` with the id escaped as a single path segment.
    fn entry_url(&self, action: &str, id: &str) -> Url {
        let mut url = self.base.clone();
        // The base is checked to have a path when the client is built.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(action).push(id);
        }
        url
    }

    async fn check(response: Response) -> ServiceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error);
        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SummaryService for HttpSummaryService {
    async fn summarize(&self, file_name: &str, bytes: Vec<u8>) -> ServiceResult<SummaryResult> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self
            .http
            .post(self.url("summarize"))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn save_summary(&self, request: &SaveSummaryRequest) -> ServiceResult<()> {
        let response = self
            .http
            .post(self.url("save_summary"))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_summaries(&self) -> ServiceResult<Vec<HistorySummary>> {
        let response = self.http.get(self.url("get_summaries")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_summary(&self, id: &str) -> ServiceResult<HistoryEntry> {
        let response = self
            .http
            .get(self.entry_url("get_summary", id))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_summary(&self, id: &str) -> ServiceResult<()> {
        let response = self
            .http
            .delete(self.entry_url("delete_summary", id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn experiments(&self) -> ServiceResult<Vec<ExperimentRecord>> {
        let response = self.http.get(self.url("admin/api/experiments")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn load_tests(&self) -> ServiceResult<Vec<LoadTestRecord>> {
        let response = self.http.get(self.url("admin/api/loadtests")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn run_load_test(&self) -> ServiceResult<()> {
        let response = self.http.post(self.url("admin/run-loadtest")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn run_eval(&self) -> ServiceResult<()> {
        let response = self.http.post(self.url("admin/run-eval")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn sign_up(&self, username: &str, password: &str) -> ServiceResult<()> {
        let response = self
            .http
            .post(self.url("signup"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn change_password(&self, new_password: &str) -> ServiceResult<()> {
        let response = self
            .http
            .post(self.url("change_password"))
            .form(&[("new_password", new_password)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
