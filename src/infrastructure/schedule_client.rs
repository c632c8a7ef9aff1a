use crate::domain::models::DaySchedule;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const DATES_SEGMENT: &str = "term";

#[async_trait]
pub trait ScheduleApiClient: Send + Sync {
    /// Ordered list of dates the schedule endpoint currently serves.
    async fn list_dates(&self) -> Result<Vec<String>, InfraError>;

    async fn fetch_day(&self, date: &str) -> Result<DaySchedule, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestScheduleApiClient {
    client: Client,
    base_url: Url,
    dates_locale: String,
    schedule_locale: String,
    schedule_id: u32,
}

impl ReqwestScheduleApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, InfraError> {
        let base_url = Url::parse(config.api_base_url.trim()).map_err(|error| {
            InfraError::InvalidConfig(format!("invalid apiBaseUrl '{}': {error}", config.api_base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(InfraError::InvalidConfig(format!(
                "apiBaseUrl cannot be a base: {}",
                config.api_base_url
            )));
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|error| InfraError::Transport(format!("failed to build http client: {error}")))?;

        Ok(Self {
            client,
            base_url,
            dates_locale: config.dates_locale.clone(),
            schedule_locale: config.schedule_locale.clone(),
            schedule_id: config.schedule_id,
        })
    }

    fn endpoint(&self, segment: &str) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                InfraError::InvalidConfig("schedule api base URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.push(segment);
        }
        Ok(url)
    }

    fn dates_endpoint(&self) -> Result<Url, InfraError> {
        let mut url = self.endpoint(DATES_SEGMENT)?;
        url.query_pairs_mut().append_pair("locale", &self.dates_locale);
        Ok(url)
    }

    fn day_endpoint(&self, date: &str) -> Result<Url, InfraError> {
        let mut url = self.endpoint(&self.schedule_id.to_string())?;
        url.query_pairs_mut()
            .append_pair("locale", &self.schedule_locale)
            .append_pair("date", date)
            .append_pair("scheduleType", "")
            .append_pair("minLevel", "")
            .append_pair("maxLevel", "");
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, InfraError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| InfraError::Transport(format!("network error while fetching {what}: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Transport(format!("failed reading {what} response: {error}")))?;

        if !status.is_success() {
            return Err(InfraError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ScheduleApiClient for ReqwestScheduleApiClient {
    async fn list_dates(&self) -> Result<Vec<String>, InfraError> {
        let url = self.dates_endpoint()?;
        self.get_json(url, "schedule dates").await
    }

    async fn fetch_day(&self, date: &str) -> Result<DaySchedule, InfraError> {
        let date = date.trim();
        if date.is_empty() {
            return Err(InfraError::Transport("date list contained an empty schedule date".to_string()));
        }
        let url = self.day_endpoint(date)?;
        self.get_json(url, "day schedule").await
    }
}
