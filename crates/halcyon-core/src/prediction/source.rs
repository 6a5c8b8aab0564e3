//! Remote prediction source.
//!
//! The trait is synchronous; the HTTP implementation drives async reqwest
//! through the current runtime handle. Call it from a blocking context
//! (the provider uses `spawn_blocking`), never from inside an async task.

use url::Url;

use super::model::Prediction;
use crate::error::FetchError;
use crate::storage::PredictionConfig;

/// Source of fresh predictions.
///
/// A single asynchronous operation with no parameters; auth context is
/// implicit in the implementation. Failures propagate as `FetchError` and
/// are absorbed by the cache's failure path.
pub trait PredictionSource: Send + Sync {
    fn fetch_latest(&self) -> Result<Prediction, FetchError>;
}

/// HTTP client for the prediction service.
pub struct HttpPredictionSource {
    client: reqwest::Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpPredictionSource {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Build from configuration. `Ok(None)` means the endpoint capability
    /// is simply not configured; callers check before use rather than
    /// catching errors as control flow.
    pub fn from_config(config: &PredictionConfig) -> Result<Option<Self>, FetchError> {
        match &config.endpoint {
            None => Ok(None),
            Some(raw) => {
                let url = Url::parse(raw)
                    .map_err(|e| FetchError::InvalidEndpoint(format!("{raw}: {e}")))?;
                Ok(Some(Self::new(url)))
            }
        }
    }
}

impl PredictionSource for HttpPredictionSource {
    fn fetch_latest(&self) -> Result<Prediction, FetchError> {
        let mut request = self.client.get(self.endpoint.clone());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let resp = tokio::runtime::Handle::current().block_on(request.send())?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
            });
        }
        let prediction: Prediction = tokio::runtime::Handle::current()
            .block_on(resp.json())
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_without_endpoint() {
        let config = PredictionConfig::default();
        assert!(HttpPredictionSource::from_config(&config)
            .unwrap()
            .is_none());
    }

    #[test]
    fn from_config_rejects_bad_url() {
        let config = PredictionConfig {
            endpoint: Some("not a url".into()),
            ..Default::default()
        };
        assert!(matches!(
            HttpPredictionSource::from_config(&config),
            Err(FetchError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn fetch_latest_decodes_payload() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/v1/prediction/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"pred-7","generated_at_ms":1700000000000,
                    "score":0.64,"label":"restless","confidence":0.81,
                    "factors":["late screen time"]}"#,
            )
            .create();

        let url = Url::parse(&format!("{}/v1/prediction/latest", server.url())).unwrap();
        let source = HttpPredictionSource::new(url);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let prediction = source.fetch_latest().unwrap();
        assert_eq!(prediction.id, "pred-7");
        assert_eq!(prediction.label, "restless");
        mock.assert();
    }

    #[test]
    fn fetch_latest_maps_error_status() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/prediction/latest")
            .with_status(503)
            .create();

        let url = Url::parse(&format!("{}/v1/prediction/latest", server.url())).unwrap();
        let source = HttpPredictionSource::new(url);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        assert!(matches!(
            source.fetch_latest(),
            Err(FetchError::Status { status: 503 })
        ));
    }
}
