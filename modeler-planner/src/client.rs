//! Planner service client using reqwest

use std::time::Duration;

use modeler_core::config::PlannerConfig;
use modeler_core::{Plan, Unit};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::response::decode_plan;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("ai-modeler/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the planner service
#[derive(Clone)]
pub struct PlannerSettings {
    /// Service base URL; requests go to `{base_url}/plan`
    pub base_url: String,
    /// Bearer token, if the service wants one
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total attempts before giving up
    pub max_attempts: u32,
    /// Attempt N waits N times this before retrying
    pub backoff: Duration,
}

impl PlannerSettings {
    /// Settings for `base_url` with default timeout and retry policy
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = PlannerConfig::default();
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: defaults.timeout,
            max_attempts: defaults.max_attempts,
            backoff: defaults.backoff,
        }
    }

    /// Settings from the `[planner]` config section
    ///
    /// Fails if no base URL is configured.
    pub fn from_config(config: &PlannerConfig, api_key: Option<String>) -> Result<Self> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            Error::Config(
                "No planner URL configured. Set MODELER_PLANNER_URL or planner.base_url"
                    .to_string(),
            )
        })?;

        Ok(Self {
            base_url,
            api_key,
            timeout: config.timeout,
            max_attempts: config.max_attempts,
            backoff: config.backoff,
        })
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.backoff = backoff;
        self
    }
}

impl std::fmt::Debug for PlannerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

/// HTTP client for the planner service
pub struct PlannerClient {
    http: reqwest::Client,
    endpoint: Url,
    settings: PlannerSettings,
}

impl PlannerClient {
    /// Create a client for the configured service
    pub fn new(settings: PlannerSettings) -> Result<Self> {
        let endpoint = plan_endpoint(&settings.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        info!(endpoint = %endpoint, "Created planner client");

        Ok(Self {
            http,
            endpoint,
            settings,
        })
    }

    /// The URL plans are requested from
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask the service for a plan
    ///
    /// Transport errors and error statuses are retried with linear backoff.
    /// A response that arrives but is not a valid plan fails immediately.
    pub async fn generate_plan(&self, prompt: &str, units: Unit) -> Result<Plan> {
        let body = json!({
            "prompt": prompt,
            "units": units,
        });
        let attempts = self.settings.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            debug!(attempt, endpoint = %self.endpoint, "Requesting plan");

            let err = match self.request(&body).await {
                Ok(value) => {
                    let plan = decode_plan(value)?;
                    info!(plan_id = %plan.id, steps = plan.steps.len(), attempt, "Received plan");
                    return Ok(plan);
                }
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            if attempt >= attempts {
                return Err(Error::Network {
                    message: format!("gave up after {} attempts: {}", attempts, err),
                    status: err.status(),
                });
            }

            let delay = self.settings.backoff * attempt;
            warn!(attempt, error = %err, delay = ?delay, "Planner request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn request(&self, body: &Value) -> Result<Value> {
        let mut request = self.http.post(self.endpoint.clone()).json(body);
        if let Some(ref key) = self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| Error::Network {
            message: e.to_string(),
            status: None,
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Network {
                message: format!("status {}: {}", status, text),
                status: Some(status.as_u16()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Validation(format!("response is not JSON: {}", e)))
    }
}

impl std::fmt::Debug for PlannerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("max_attempts", &self.settings.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Build `{base}/plan`, keeping any path prefix on the base URL
fn plan_endpoint(base_url: &str) -> Result<Url> {
    let base = Url::parse(base_url.trim())?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Planner URL must use http or https: {}",
            base_url
        )));
    }

    let path = format!("{}/plan", base.path().trim_end_matches('/'));
    let mut endpoint = base;
    endpoint.set_path(&path);
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_plan_endpoint() {
        assert_eq!(
            plan_endpoint("http://localhost:8000").unwrap().as_str(),
            "http://localhost:8000/plan"
        );
        assert_eq!(
            plan_endpoint("https://planner.example/api/").unwrap().as_str(),
            "https://planner.example/api/plan"
        );
        assert!(plan_endpoint("ftp://planner.example").is_err());
        assert!(plan_endpoint("not a url").is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = PlannerConfig::default();
        assert!(PlannerSettings::from_config(&config, None).is_err());

        config.base_url = Some("http://planner".to_string());
        config.max_attempts = 5;
        let settings = PlannerSettings::from_config(&config, Some("key".to_string())).unwrap();
        assert_eq!(settings.base_url, "http://planner");
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = PlannerSettings::new("http://planner").with_api_key("secret-token");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    /// Read one HTTP request (headers plus body) off the stream
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve the given `(status, body)` responses in order, one per connection
    async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await;
                seen.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });

        (format!("http://{}", addr), requests)
    }

    fn plan_body() -> String {
        json!({
            "plan": {
                "id": "remote-1",
                "prompt": "a cube",
                "units": "MM",
                "steps": [{"op": "ADD_CUBE", "params": {"size": 20}}]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate_plan_retries_server_error() {
        let (url, requests) = serve(vec![
            (500, r#"{"error":"busy"}"#.to_string()),
            (200, plan_body()),
        ])
        .await;

        let settings = PlannerSettings::new(url)
            .with_api_key("token-123")
            .with_retry(3, Duration::from_millis(10));
        let client = PlannerClient::new(settings).unwrap();

        let plan = client.generate_plan("a cube", Unit::Millimeter).await.unwrap();
        assert_eq!(plan.id, "remote-1");
        assert_eq!(plan.units, Unit::Millimeter);
        assert_eq!(plan.ops(), vec!["ADD_CUBE"]);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let first = requests[0].to_lowercase();
        assert!(first.starts_with("post /plan "));
        assert!(first.contains("authorization: bearer token-123"));
        assert!(requests[0].contains(r#""units":"MM""#));
    }

    #[tokio::test]
    async fn test_generate_plan_gives_up_with_status() {
        let (url, requests) = serve(vec![
            (503, "{}".to_string()),
            (503, "{}".to_string()),
        ])
        .await;

        let settings = PlannerSettings::new(url).with_retry(2, Duration::ZERO);
        let client = PlannerClient::new(settings).unwrap();

        let err = client.generate_plan("a cube", Unit::Meter).await.unwrap_err();
        assert!(matches!(err, Error::Network { status: Some(503), .. }), "{:?}", err);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_planner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let settings =
            PlannerSettings::new(format!("http://{}", addr)).with_retry(2, Duration::ZERO);
        let client = PlannerClient::new(settings).unwrap();

        let err = client.generate_plan("a cube", Unit::Meter).await.unwrap_err();
        assert!(matches!(err, Error::Network { status: None, .. }), "{:?}", err);
        assert!(err.to_string().contains("2 attempts"));
    }

    #[tokio::test]
    async fn test_invalid_plan_is_not_retried() {
        let (url, requests) = serve(vec![(200, r#"{"id":"x"}"#.to_string())]).await;

        let settings = PlannerSettings::new(url).with_retry(3, Duration::ZERO);
        let client = PlannerClient::new(settings).unwrap();

        let err = client.generate_plan("a cube", Unit::Meter).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{:?}", err);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }
}
