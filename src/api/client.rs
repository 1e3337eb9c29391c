use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ApiError, TriggerApi};
use crate::config::ViewConfig;
use crate::models::{EventList, Trigger, TriggerState};

/// `TriggerApi` backed by the alerting service's HTTP API.
pub struct HttpTriggerApi {
    client: Client,
    api_url: String,
    events_page_size: u64,
}

impl HttpTriggerApi {
    pub fn new(api_url: &str, timeout: Duration, events_page_size: u64) -> Result<Self, ApiError> {
        let api_url = api_url.trim_end_matches('/');
        if api_url.is_empty() {
            return Err(ApiError::InvalidConfiguration(
                "API URL must not be empty".to_string(),
            ));
        }
        if events_page_size == 0 {
            return Err(ApiError::InvalidConfiguration(
                "Events page size must be positive".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            events_page_size,
        })
    }

    pub fn from_config(config: &ViewConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
            config.events_page_size,
        )
    }

    fn trigger_url(&self, trigger_id: &str, suffix: &str) -> String {
        format!(
            "{}/trigger/{}{}",
            self.api_url,
            urlencoding::encode(trigger_id),
            suffix
        )
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let url = response.url().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            warn!(%url, status = status.as_u16(), "Alerting API returned non-success status.");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
                body,
            });
        }

        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self.execute(self.client.get(&url)).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl TriggerApi for HttpTriggerApi {
    async fn get_trigger(&self, trigger_id: &str) -> Result<Trigger, ApiError> {
        self.fetch_json(self.trigger_url(trigger_id, "")).await
    }

    async fn get_trigger_state(&self, trigger_id: &str) -> Result<TriggerState, ApiError> {
        self.fetch_json(self.trigger_url(trigger_id, "/state")).await
    }

    async fn get_trigger_events(&self, trigger_id: &str, page: u64) -> Result<EventList, ApiError> {
        let url = format!("{}/event/{}", self.api_url, urlencoding::encode(trigger_id));
        debug!(%url, page, size = self.events_page_size, "GET");
        let request = self
            .client
            .get(&url)
            .query(&[("p", page), ("size", self.events_page_size)]);
        let response = self.execute(request).await?;
        Ok(response.json::<EventList>().await?)
    }

    async fn del_throttling(&self, trigger_id: &str) -> Result<(), ApiError> {
        let url = self.trigger_url(trigger_id, "/throttling");
        debug!(%url, "DELETE");
        self.execute(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn set_maintenance(
        &self,
        trigger_id: &str,
        maintenance: &HashMap<String, i64>,
    ) -> Result<(), ApiError> {
        let url = self.trigger_url(trigger_id, "/setMaintenance");
        debug!(%url, metrics = maintenance.len(), "PUT");
        self.execute(self.client.put(&url).json(maintenance)).await?;
        Ok(())
    }

    async fn del_metric(&self, trigger_id: &str, metric: &str) -> Result<(), ApiError> {
        let url = self.trigger_url(trigger_id, "/metrics");
        debug!(%url, metric, "DELETE");
        self.execute(self.client.delete(&url).query(&[("name", metric)]))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::models::Status;

    fn create_test_api(url: &str) -> HttpTriggerApi {
        HttpTriggerApi::new(url, Duration::from_secs(5), 50).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_url() {
        let result = HttpTriggerApi::new("/", Duration::from_secs(5), 50);
        assert!(matches!(result, Err(ApiError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_new_rejects_zero_page_size() {
        let result = HttpTriggerApi::new("http://localhost", Duration::from_secs(5), 0);
        assert!(matches!(result, Err(ApiError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_get_trigger() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/trigger/t1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "t1",
                    "name": "CPU load",
                    "targets": ["srv.*.cpu"],
                    "throttling": 1700000000
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = create_test_api(&format!("{}/", server.url()));
        let trigger = api.get_trigger("t1").await.unwrap();

        assert_eq!(trigger.id, "t1");
        assert_eq!(trigger.name, "CPU load");
        assert_eq!(trigger.targets, vec!["srv.*.cpu".to_string()]);
        assert_eq!(trigger.throttling, 1_700_000_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_trigger_state() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/trigger/t1/state")
            .with_status(200)
            .with_body(
                json!({
                    "trigger_id": "t1",
                    "state": "OK",
                    "metrics": {
                        "srv1.cpu": { "state": "WARN", "value": 81.0, "event_timestamp": 1700000000 }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = create_test_api(&server.url());
        let state = api.get_trigger_state("t1").await.unwrap();

        assert_eq!(state.metrics["srv1.cpu"].state, Status::Warn);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_trigger_events_sends_page_and_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/event/t1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("p".into(), "2".into()),
                Matcher::UrlEncoded("size".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "total": 101,
                    "page": 2,
                    "size": 50,
                    "list": [
                        { "timestamp": 1700000000, "metric": "srv1.cpu", "state": "ERROR", "old_state": "OK", "trigger_id": "t1" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = create_test_api(&server.url());
        let events = api.get_trigger_events("t1", 2).await.unwrap();

        assert_eq!(events.total, 101);
        assert_eq!(events.list.len(), 1);
        assert_eq!(events.list[0].old_state, Status::Ok);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/trigger/missing")
            .with_status(404)
            .with_body("trigger not found")
            .create_async()
            .await;

        let api = create_test_api(&server.url());
        let err = api.get_trigger("missing").await.unwrap_err();

        match err {
            ApiError::Status { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "trigger not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_del_throttling() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/trigger/t1/throttling")
            .with_status(200)
            .create_async()
            .await;

        let api = create_test_api(&server.url());
        api.del_throttling("t1").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_maintenance_sends_metric_map() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/trigger/t1/setMaintenance")
            .match_body(Matcher::Json(json!({ "srv1.cpu": 1700003600 })))
            .with_status(200)
            .create_async()
            .await;

        let api = create_test_api(&server.url());
        let payload = HashMap::from([("srv1.cpu".to_string(), 1_700_003_600)]);
        api.set_maintenance("t1", &payload).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_del_metric_sends_name_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/trigger/t1/metrics")
            .match_query(Matcher::UrlEncoded("name".into(), "srv 1.cpu".into()))
            .with_status(200)
            .create_async()
            .await;

        let api = create_test_api(&server.url());
        api.del_metric("t1", "srv 1.cpu").await.unwrap();

        mock.assert_async().await;
    }
}
