use crate::{ClientError, ConnectFailure, Result};
use entsearch_core::{AccessToken, ClientConfig, ClientIdentity};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Url};
use serde_json::Value;
use std::error::Error as _;
use tracing::{debug, warn};

pub const CLIENT_NAME_HEADER: &str = "X-Swiftype-Client";
pub const CLIENT_VERSION_HEADER: &str = "X-Swiftype-Client-Version";

/// Issues authenticated requests against the service and decodes JSON bodies
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// GET `path`, appending `query` when it is non-empty
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value>;

    /// POST `body` as JSON to `path`
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;
}

/// reqwest-backed transport. Holds no per-call state and can be shared freely.
pub struct HttpTransport {
    base_url: String,
    access_token: AccessToken,
    identity: ClientIdentity,
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<AccessToken>,
        identity: ClientIdentity,
    ) -> Result<Self> {
        Self::build(base_url.into(), access_token.into(), identity, false)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::build(
            config.base_url().to_string(),
            config.access_token.clone(),
            config.identity.clone(),
            config.insecure_skip_verify,
        )
    }

    fn build(
        base_url: String,
        access_token: AccessToken,
        identity: ClientIdentity,
        insecure_skip_verify: bool,
    ) -> Result<Self> {
        let mut builder = HttpClient::builder().no_proxy();
        if insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            identity,
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.access_token.expose())
            .header(CLIENT_NAME_HEADER, &self.identity.name)
            .header(CLIENT_VERSION_HEADER, &self.identity.version)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        debug!(%method, %url, "sending request");

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, %url, error = %err, "request did not complete");
                return Err(connection_error(&url, err));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| connection_error(&url, err))?;

        debug!(%method, %url, %status, "received response");

        if status.as_u16() >= 400 {
            warn!(%method, %url, %status, "server returned an error");
            return Err(ClientError::Transport {
                status: status.as_u16(),
                headers,
                body: error_body(&bytes),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let mut builder = self.request(Method::GET, path);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.send(builder).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }
}

/// Error bodies are kept as JSON when they parse, otherwise as a string
fn error_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn connection_error(url: &Url, err: reqwest::Error) -> ClientError {
    ClientError::Connection {
        failure: classify(&err),
        host: url.host_str().unwrap_or_default().to_string(),
        port: url.port_or_known_default(),
        source: err,
    }
}

fn classify(err: &reqwest::Error) -> ConnectFailure {
    if err.is_timeout() {
        return ConnectFailure::TimedOut;
    }

    let mut cause = err.source();
    while let Some(inner) = cause {
        // Matches hyper-util's `ConnectError` message "dns error" (legacy HttpConnector)
        // and the std getaddrinfo text "failed to lookup address information".
        // Revisit when upgrading reqwest or hyper-util.
        let message = inner.to_string();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return ConnectFailure::DnsResolution;
        }
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => return ConnectFailure::Refused,
                std::io::ErrorKind::TimedOut => return ConnectFailure::TimedOut,
                _ => {}
            }
        }
        cause = inner.source();
    }

    ConnectFailure::Other
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "mockAccessToken";

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(base_url, TOKEN, ClientIdentity::new("entsearch-rs", "0.2.0")).unwrap()
    }

    fn identified() -> wiremock::MockBuilder {
        Mock::given(header("authorization", "Bearer mockAccessToken"))
            .and(header("x-swiftype-client", "entsearch-rs"))
            .and(header("x-swiftype-client-version", "0.2.0"))
            .and(header("content-type", "application/json"))
    }

    #[tokio::test]
    async fn test_get_sends_query_and_headers() {
        let server = MockServer::start().await;
        identified()
            .and(method("GET"))
            .and(path("/get"))
            .and(query_param("foo", "bar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hello": "world"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server.uri())
            .get("/get", &[("foo".to_string(), "bar".to_string())])
            .await
            .unwrap();

        assert_eq!(response, json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        identified()
            .and(method("POST"))
            .and(path("/post"))
            .and(body_json(json!({"foo": "bar"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hello": "world"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server.uri())
            .post("/post", &json!({"foo": "bar"}))
            .await
            .unwrap();

        assert_eq!(response, json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_error_status_carries_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(path("/error"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"hello": "world"})))
            .expect(2)
            .mount(&server)
            .await;

        let client = transport(&server.uri());
        let get_err = client.get("/error", &[]).await.unwrap_err();
        let post_err = client.post("/error", &json!({"foo": "bar"})).await.unwrap_err();

        for err in [get_err, post_err] {
            match err {
                ClientError::Transport {
                    status,
                    headers,
                    body,
                } => {
                    assert_eq!(status, 500);
                    assert_eq!(headers.get("content-type").unwrap(), "application/json");
                    assert_eq!(body, json!({"hello": "world"}));
                }
                other => panic!("expected transport error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_kept_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = transport(&server.uri()).get("/missing", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        match err {
            ClientError::Transport { body, .. } => assert_eq!(body, json!("Not Found")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = transport(&server.uri()).post("/noop", &json!([])).await.unwrap();
        assert_eq!(response, Value::Null);
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = transport(&format!("{}/", server.uri()));
        assert_eq!(client.get("/get", &[]).await.unwrap(), json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_dns_failure() {
        let client = transport("https://test.invalid");

        for result in [
            client.get("/error", &[]).await,
            client.post("/error", &json!({"foo": "bar"})).await,
        ] {
            match result {
                Err(ClientError::Connection {
                    failure,
                    host,
                    port,
                    ..
                }) => {
                    assert_eq!(failure, ConnectFailure::DnsResolution);
                    assert_eq!(failure.code(), "ENOTFOUND");
                    assert_eq!(host, "test.invalid");
                    assert_eq!(port, Some(443));
                }
                other => panic!("expected connection error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_closed_port_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = transport(&format!("http://{}", addr)).get("/", &[]).await;
        match result {
            Err(ClientError::Connection { host, port, .. }) => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, Some(addr.port()));
            }
            other => panic!("expected connection error, got {:?}", other),
        }
    }
}
