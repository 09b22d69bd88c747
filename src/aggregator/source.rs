//! Data sources the time aggregator fetches observations from

use crate::error::FetchError;
use crate::observations::Observation;
use crate::store::ObservationStore;
use log::debug;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Future returned by [`ObservationSource::fetch_full`]
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Observation>, FetchError>> + Send + 'a>>;

/// Supplier of the current full-view observation collection
pub trait ObservationSource: Send + Sync {
    fn fetch_full<'a>(&'a self) -> FetchFuture<'a>;
}

/// In-process source reading straight from the store
impl ObservationSource for ObservationStore {
    fn fetch_full<'a>(&'a self) -> FetchFuture<'a> {
        Box::pin(async move { Ok(self.list_full()) })
    }
}

/// Remote source reading `GET {endpoint}/observations/full`
///
/// Used when the aggregator runs apart from the service that owns the store.
pub struct HttpObservationSource {
    client: Client,
    endpoint: String,
}

impl HttpObservationSource {
    /// Create a source for the observation service at `endpoint`
    ///
    /// # Example
    /// ```
    /// use stargaze::aggregator::HttpObservationSource;
    ///
    /// let source = HttpObservationSource::new("http://127.0.0.1:8000".to_string()).unwrap();
    /// assert_eq!(source.url(), "http://127.0.0.1:8000/observations/full");
    /// ```
    pub fn new(endpoint: String) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Full-view listing URL on the remote service
    pub fn url(&self) -> String {
        format!("{}/observations/full", self.endpoint.trim_end_matches('/'))
    }

    async fn fetch(&self) -> Result<Vec<Observation>, FetchError> {
        let url = self.url();
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let observations: Vec<Observation> =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!("Fetched {} observations from {}", observations.len(), url);
        Ok(observations)
    }
}

impl ObservationSource for HttpObservationSource {
    fn fetch_full<'a>(&'a self) -> FetchFuture<'a> {
        Box::pin(self.fetch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::ObservationStatus;
    use crate::store::StoreSettings;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    /// Serve `router` on an ephemeral local port and return its base URL
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_store_source_returns_full_view() {
        let store = ObservationStore::seeded(StoreSettings::default(), 21);
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let generated = store.generate(start, start + ChronoDuration::hours(1), "src");

        let fetched = store.fetch_full().await.unwrap();
        assert_eq!(fetched, generated);
    }

    #[tokio::test]
    async fn test_http_source_parses_naive_timestamps() {
        let body = r#"[
            {"id": "a", "start_time": "2024-02-01T00:00:00", "end_time": "2024-02-01T00:10:00",
             "name": "n_1", "status": "Failed", "problem_report": "PR-000001",
             "investigation_report": null},
            {"id": "b", "start_time": "2024-02-01T00:10:00+00:00", "end_time": "2024-02-01T00:15:00+00:00",
             "name": "n_2", "status": "Success", "problem_report": null,
             "investigation_report": null}
        ]"#;
        let router = Router::new().route("/observations/full", get(move || async move { body }));
        let source = HttpObservationSource::new(serve(router).await).unwrap();

        let observations = source.fetch_full().await.unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].status, ObservationStatus::Failed);
        assert_eq!(observations[0].problem_report.as_deref(), Some("PR-000001"));
        assert_eq!(observations[0].duration_seconds(), 600.0);
        assert_eq!(observations[1].duration_seconds(), 300.0);
    }

    #[tokio::test]
    async fn test_http_source_reports_error_status() {
        let router = Router::new().route(
            "/observations/full",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let source = HttpObservationSource::new(serve(router).await).unwrap();

        match source.fetch_full().await {
            Err(FetchError::Status(code)) => assert_eq!(code, 503),
            other => panic!("expected status error, got {:?}", other.map(|o| o.len())),
        }
    }

    #[tokio::test]
    async fn test_http_source_reports_bad_payload() {
        let router = Router::new().route("/observations/full", get(|| async { "not json" }));
        let source = HttpObservationSource::new(serve(router).await).unwrap();

        assert!(matches!(
            source.fetch_full().await,
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let source = HttpObservationSource::new("http://localhost:9000/".to_string()).unwrap();
        assert_eq!(source.url(), "http://localhost:9000/observations/full");
    }
}
