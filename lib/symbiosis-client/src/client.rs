//! reqwest-backed client for the Symbiosis REST API

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use symbiosis_api::v1::{paths, API_KEY_HEADER};
use symbiosis_api::{ApiError, ClusterList};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::error::{ClientError, Result};

/// SymbiosisClient holds the base address and credentials for API calls
///
/// Cloning is cheap and clones share one connection pool.
#[derive(Clone, Debug)]
pub struct SymbiosisClient {
    http: reqwest::Client,
    base: Url,
}

impl SymbiosisClient {
    /// Build a client without contacting the API
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base = config.base_url()?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::InvalidApiKey)?;
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                path: base.to_string(),
                source,
            })?;

        Ok(Self { http, base })
    }

    /// Build a client and verify the API key with a lightweight list call
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        let clusters = client.probe().await?;
        info!(
            "Connected to Symbiosis API at {} ({} clusters visible)",
            client.base,
            clusters.content.len()
        );
        Ok(client)
    }

    /// Connectivity and authentication check
    pub async fn probe(&self) -> Result<ClusterList> {
        let path = format!("{}?size=10&page=0", paths::clusters());
        self.get_required(&path).await
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base.join(path).map_err(|e| {
            ClientError::Config(ConfigError::InvalidEndpoint {
                endpoint: format!("{}{}", self.base, path),
                reason: e.to_string(),
            })
        })?;
        Ok(self.http.request(method, url))
    }

    /// Send a request and return the body of a 2xx response
    ///
    /// A 404 yields `None` when `absent_ok` is set, otherwise it is an API error like any other status.
    async fn execute(
        &self,
        request: RequestBuilder,
        path: &str,
        absent_ok: bool,
    ) -> Result<Option<Vec<u8>>> {
        let transport = |source| ClientError::Transport {
            path: path.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        debug!("{} -> {}", path, status);

        if status == StatusCode::NOT_FOUND && absent_ok {
            return Ok(None);
        }

        let body = response.bytes().await.map_err(transport)?;

        if status.is_success() {
            return Ok(Some(body.to_vec()));
        }

        let err = decode_api_error(status, path, &body);
        warn!("Symbiosis API error on {}: {}", path, err);
        Err(ClientError::Api(err))
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T> {
        serde_json::from_slice(body).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// GET a resource, `None` if it does not exist
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let request = self.request(Method::GET, path)?;
        match self.execute(request, path, true).await? {
            Some(body) => Self::decode(path, &body).map(Some),
            None => Ok(None),
        }
    }

    /// GET a resource that must exist
    pub async fn get_required<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path)?;
        let body = self.execute(request, path, false).await?.unwrap_or_default();
        Self::decode(path, &body)
    }

    /// Send a JSON body and decode the JSON response
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path)?.json(body);
        let body = self.execute(request, path, false).await?.unwrap_or_default();
        Self::decode(path, &body)
    }

    /// Send a JSON body, falling back to `T::default()` when a 2xx body does not decode
    ///
    /// For creates whose acceptance matters more than the echo in the response.
    pub async fn send_json_or_default<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let request = self.request(method, path)?.json(body);
        let body = self.execute(request, path, false).await?.unwrap_or_default();
        Ok(Self::decode(path, &body).unwrap_or_else(|e| {
            warn!("Request to {} was accepted but its response is unreadable: {}", path, e);
            T::default()
        }))
    }

    /// Send an optional JSON body, ignoring the response body
    pub async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(method, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request, path, false).await?;
        Ok(())
    }

    /// DELETE a resource, `false` if it was already gone
    pub async fn delete(&self, path: &str) -> Result<bool> {
        let request = self.request(Method::DELETE, path)?;
        Ok(self.execute(request, path, true).await?.is_some())
    }
}

/// Decode the structured error payload, falling back to the raw body text
fn decode_api_error(status: StatusCode, path: &str, body: &[u8]) -> ApiError {
    let mut err = serde_json::from_slice::<ApiError>(body).unwrap_or_else(|_| ApiError {
        error_type: "unknown".to_string(),
        message: String::from_utf8_lossy(body).trim().to_string(),
        ..Default::default()
    });

    if err.status == 0 {
        err.status = status.as_u16();
    }
    if err.error_type.is_empty() {
        err.error_type = status
            .canonical_reason()
            .unwrap_or("unknown")
            .to_string();
    }
    if err.message.is_empty() {
        err.message = format!("request failed with status {}", status.as_u16());
    }
    if err.path.is_empty() {
        err.path = format!("/{}", path.split('?').next().unwrap_or(path));
    }
    err
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the raw request
    pub(crate) async fn stub(status: u16, body: &str) -> (ClientConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break buf.len();
                }
            };

            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&buf).to_string()
        });

        let config = ClientConfig::new("test-key").with_endpoint(format!("http://{}", addr));
        (config, handle)
    }

    #[tokio::test]
    async fn test_get_decodes_success() {
        let (config, server) = stub(200, r#"{"email":"alice@example.com","role":"ADMIN"}"#).await;
        let client = SymbiosisClient::new(&config).unwrap();

        let member: Option<symbiosis_api::TeamMember> = client
            .get("rest/v1/team/member/alice@example.com")
            .await
            .unwrap();
        assert_eq!(member.unwrap().role, "ADMIN");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /rest/v1/team/member/alice@example.com HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("x-auth-apikey: test-key"));
        assert!(request.to_ascii_lowercase().contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_get_not_found_is_absent() {
        let (config, _server) = stub(404, r#"{"status":404,"error":"Not Found"}"#).await;
        let client = SymbiosisClient::new(&config).unwrap();

        let cluster: Option<symbiosis_api::Cluster> = client.get("rest/v1/cluster/gone").await.unwrap();
        assert!(cluster.is_none());
    }

    #[tokio::test]
    async fn test_error_payload_is_structured() {
        let (config, _server) = stub(
            403,
            r#"{"status":403,"error":"Forbidden","message":"Invalid api key","path":"/rest/v1/cluster"}"#,
        )
        .await;
        let client = SymbiosisClient::new(&config).unwrap();

        let err = client.probe().await.unwrap_err();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status, 403);
                assert_eq!(api.error_type, "Forbidden");
                assert_eq!(api.message, "Invalid api key");
                assert_eq!(api.path, "/rest/v1/cluster");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_fails_on_rejected_key() {
        let (config, _server) = stub(401, "unauthorized").await;

        let err = SymbiosisClient::connect(&config).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        if let ClientError::Api(api) = err {
            assert_eq!(api.error_type, "unknown");
            assert_eq!(api.message, "unauthorized");
            assert_eq!(api.path, "/rest/v1/cluster");
        }
    }

    #[tokio::test]
    async fn test_connect_succeeds() {
        let (config, server) = stub(200, r#"{"content":[{"name":"c1","state":"ACTIVE"}],"totalElements":1}"#).await;

        SymbiosisClient::connect(&config).await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /rest/v1/cluster?size=10&page=0 "));
    }

    #[tokio::test]
    async fn test_not_found_on_create_is_an_error() {
        let (config, _server) = stub(404, r#"{"status":404,"error":"Not Found","message":"Cluster not found"}"#).await;
        let client = SymbiosisClient::new(&config).unwrap();

        let err = client
            .send_json::<_, symbiosis_api::NodePoolCreated>(Method::POST, "rest/v1/node-pool", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_decode_failure_is_distinct() {
        let (config, _server) = stub(200, r#"{"unexpected":true}"#).await;
        let client = SymbiosisClient::new(&config).unwrap();

        let err = client
            .get::<symbiosis_api::Cluster>("rest/v1/cluster/c1")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_unreachable_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig::new("k").with_endpoint(format!("http://{}", addr));
        let client = SymbiosisClient::new(&config).unwrap();
        let err = client.delete("rest/v1/node-pool/np-1").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let (config, _server) = stub(404, "").await;
        let client = SymbiosisClient::new(&config).unwrap();
        assert!(!client.delete("rest/v1/node-pool/np-1").await.unwrap());

        let (config, _server) = stub(200, "").await;
        let client = SymbiosisClient::new(&config).unwrap();
        assert!(client.delete("rest/v1/node-pool/np-1").await.unwrap());
    }

    #[test]
    fn test_decode_api_error_fills_gaps() {
        let err = decode_api_error(StatusCode::BAD_GATEWAY, "rest/v1/cluster/c1", b"");
        assert_eq!(err.status, 502);
        assert_eq!(err.error_type, "unknown");
        assert_eq!(err.message, "request failed with status 502");
        assert_eq!(err.path, "/rest/v1/cluster/c1");
    }
}
