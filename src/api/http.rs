use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{
    entities::{
        TaskEntity, WorkReportByCategory, WorkReportByTask, WorkReportTotal, WorkStartRequest,
    },
    ActiveTaskQuery, WorkTotalsProvider,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The backend expects local time without an offset.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Client of the time tracking REST api.
pub struct HttpWorkApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWorkApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn range_query(start: DateTime<Local>, end: DateTime<Local>) -> [(&'static str, String); 2] {
        [
            (
                "start_datetime",
                start.naive_local().format(DATETIME_FORMAT).to_string(),
            ),
            (
                "end_datetime",
                end.naive_local().format(DATETIME_FORMAT).to_string(),
            ),
        ]
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn post(&self, path: &str, body: &impl serde::Serialize) -> Result<()> {
        let url = self.url(path);
        debug!("POST {url}");
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn report_total(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<WorkReportTotal> {
        self.get_json("/work/report_total", &Self::range_query(start, end))
            .await
    }

    #[instrument(skip(self))]
    pub async fn report_by_category(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<Vec<WorkReportByCategory>> {
        self.get_json("/work/report_by_category", &Self::range_query(start, end))
            .await
    }

    #[instrument(skip(self))]
    pub async fn report_by_task(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<Vec<WorkReportByTask>> {
        self.get_json("/work/report_by_task", &Self::range_query(start, end))
            .await
    }

    /// Tasks that are being worked on right now. The backend may ignore the `is_current` filter
    /// and return every task, so the flag of each task is checked again.
    pub async fn current_tasks(&self) -> Result<Vec<TaskEntity>> {
        let tasks: Vec<TaskEntity> = self
            .get_json("/tasks", &[("is_current", "true".to_string())])
            .await?;
        Ok(tasks.into_iter().filter(|t| t.is_current != 0).collect())
    }

    pub async fn start_work(&self, task_id: i64) -> Result<()> {
        self.post("/work/start", &WorkStartRequest { task_id }).await
    }

    pub async fn stop_current_work(&self) -> Result<()> {
        self.post("/work/stop_current", &serde_json::json!({})).await
    }
}

#[async_trait]
impl WorkTotalsProvider for HttpWorkApi {
    async fn get_total(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<WorkReportTotal> {
        self.report_total(start, end).await
    }
}

#[async_trait]
impl ActiveTaskQuery for HttpWorkApi {
    async fn has_active_task(&self) -> Result<bool> {
        Ok(self.current_tasks().await?.iter().any(|t| t.is_current != 0))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::api::{ActiveTaskQuery, WorkTotalsProvider};

    use super::HttpWorkApi;

    fn test_day() -> (chrono::DateTime<Local>, chrono::DateTime<Local>) {
        let start = NaiveDate::from_ymd_opt(2023, 12, 12)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let end = NaiveDate::from_ymd_opt(2023, 12, 13)
            .unwrap()
            .and_time(NaiveTime::MIN);
        (
            Local.from_local_datetime(&start).earliest().unwrap(),
            Local.from_local_datetime(&end).earliest().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_report_total_sends_local_range() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/work/report_total"))
            .and(query_param("start_datetime", "2023-12-12T00:00:00"))
            .and(query_param("end_datetime", "2023-12-13T00:00:00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "time": 120.7 })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(format!("{}/", server.uri()))?;
        let (start, end) = test_day();
        let total = api.get_total(start, end).await?;

        assert_eq!(total.seconds(), 120);
        Ok(())
    }

    #[tokio::test]
    async fn test_report_total_server_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/work/report_total"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(server.uri())?;
        let (start, end) = test_day();

        assert!(api.get_total(start, end).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_active_task_query() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("is_current", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 3,
                    "name": "Write report",
                    "is_current": 1,
                    "category": { "id": 1, "name": "Office" }
                }
            ])))
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(server.uri())?;

        assert!(api.has_active_task().await?);
        let tasks = api.current_tasks().await?;
        assert_eq!(&*tasks[0].name, "Write report");
        Ok(())
    }

    #[tokio::test]
    async fn test_no_active_task() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(server.uri())?;

        assert!(!api.has_active_task().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_tasks_not_in_progress_are_not_active() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "name": "Write report",
                    "is_current": 0,
                    "category": { "id": 1, "name": "Office" }
                },
                {
                    "id": 2,
                    "name": "Review",
                    "is_current": 0,
                    "category": { "id": 1, "name": "Office" }
                }
            ])))
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(server.uri())?;

        assert!(!api.has_active_task().await?);
        assert!(api.current_tasks().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_start_work_posts_task() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/work/start"))
            .and(body_json(json!({ "task_id": 7 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(server.uri())?;
        api.start_work(7).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_report_by_category() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/work/report_by_category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "category": { "id": 1, "name": "Office" }, "time": 3600.0 },
                { "category": { "id": 2 }, "time": 60.0 }
            ])))
            .mount(&server)
            .await;

        let api = HttpWorkApi::new(server.uri())?;
        let (start, end) = test_day();
        let report = api.report_by_category(start, end).await?;

        assert_eq!(report.len(), 2);
        assert_eq!(report[1].category.name, None);
        assert_eq!(report[0].time, 3600.);
        Ok(())
    }
}
