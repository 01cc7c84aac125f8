// Remote-control HTTP client
//
// Wraps the host's shared `reqwest::Client` with URL construction, bearer
// authentication and status classification. Endpoint families (monitor,
// modules, updates, system) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Connection ───────────────────────────────────────────────────────

/// Identifies one appliance: where it listens and which key it expects.
///
/// Immutable once built. Every request derives its base URL and
/// `Authorization` header from this value.
#[derive(Debug, Clone)]
pub struct Connection {
    host: String,
    port: u16,
    api_key: SecretString,
}

impl Connection {
    pub fn new(host: impl Into<String>, port: u16, api_key: SecretString) -> Self {
        Self {
            host: host.into(),
            port,
            api_key,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// `http://{host}:{port}/`. IPv6 literals are bracketed.
    pub fn base_url(&self) -> Result<Url, Error> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Ok(Url::parse(&format!("http://{host}:{}/", self.port))?)
    }

    /// The appliance's own remote-control page, used as the device
    /// configuration URL by hosts.
    pub fn remote_url(&self) -> Result<Url, Error> {
        Ok(self.base_url()?.join("remote.html")?)
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Raw HTTP client for the appliance's remote-control API.
///
/// Stateless apart from the connection it was built for. The session is
/// a handle to a connection pool owned by the host; the client never
/// opens or closes it. When no session is present every request returns
/// an absent body.
pub struct MirrorClient {
    connection: Connection,
    base_url: Url,
    session: Option<reqwest::Client>,
}

impl MirrorClient {
    /// Create a client with its own session built from `transport`.
    pub fn new(connection: Connection, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(connection, http)
    }

    /// Create a client on top of a pre-built, shared `reqwest::Client`.
    pub fn with_client(connection: Connection, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = connection.base_url()?;
        Ok(Self {
            connection,
            base_url,
            session: Some(http),
        })
    }

    /// Create a client with no session. Every call yields "no data".
    pub fn without_session(connection: Connection) -> Result<Self, Error> {
        let base_url = connection.base_url()?;
        Ok(Self {
            connection,
            base_url,
            session: None,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve a fixed API path (e.g. `api/monitor/status`) against the base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build a URL from individual path segments, percent-encoding each one.
    ///
    /// Used wherever a module name ends up in the path.
    pub(crate) fn segments_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated GET of an API path.
    ///
    /// Returns the decoded JSON body on 200, `None` on any other status
    /// except 403 or when there is no session. HTTP 403 fails with
    /// [`Error::Forbidden`]; refused, reset or timed-out requests fail
    /// with [`Error::Transport`].
    pub async fn fetch(&self, path: &str) -> Result<Option<Value>, Error> {
        let url = self.api_url(path)?;
        self.fetch_url(url).await
    }

    /// Authenticated POST with a JSON body. Same status rules as [`fetch`](Self::fetch).
    pub async fn submit(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Option<Value>, Error> {
        let url = self.api_url(path)?;
        let Some(http) = self.session.as_ref() else {
            warn!(%url, "there is no HTTP session");
            return Ok(None);
        };

        debug!("POST {}", url);
        let sent = self.authorize(http.post(url.clone()).json(body)).send().await;
        Self::classify(&url, sent).await
    }

    /// Fire-and-forget GET for side-effecting commands.
    ///
    /// Never fails: bad URLs, missing sessions, connection errors and
    /// unexpected statuses are all logged and dropped.
    pub async fn fire(&self, path: &str) {
        let url = match self.api_url(path) {
            Ok(url) => url,
            Err(e) => {
                error!(path, error = %e, "cannot build system call URL");
                return;
            }
        };
        let Some(http) = self.session.as_ref() else {
            warn!(%url, "there is no HTTP session");
            return;
        };

        debug!("GET {} (fire-and-forget)", url);
        match self.authorize(http.get(url.clone())).send().await {
            Ok(resp) if !resp.status().is_success() => {
                warn!(status = %resp.status(), %url, "system call not acknowledged");
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    %url,
                    error = %e,
                    "connection error -- check that the MagicMirror service is running"
                );
            }
        }
    }

    pub(crate) async fn fetch_url(&self, url: Url) -> Result<Option<Value>, Error> {
        let Some(http) = self.session.as_ref() else {
            warn!(%url, "there is no HTTP session");
            return Ok(None);
        };

        debug!("GET {}", url);
        let sent = self.authorize(http.get(url.clone())).send().await;
        Self::classify(&url, sent).await
    }

    /// GET an API path and decode it into a typed response.
    pub(crate) async fn get_typed<T>(&self, path: &str) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        decode(self.fetch(path).await?)
    }

    /// GET a segment-built URL and decode it into a typed response.
    pub(crate) async fn get_typed_url<T>(&self, url: Url) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        decode(self.fetch_url(url).await?)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(ACCEPT, "application/json")
            .bearer_auth(self.connection.api_key.expose_secret())
    }

    /// Map a send result onto the absent/forbidden/transport/body contract.
    async fn classify(
        url: &Url,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Option<Value>, Error> {
        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => {
                error!(
                    %url,
                    error = %e,
                    "connection error -- check that the MagicMirror service is running"
                );
                return Err(Error::Transport(e));
            }
        };

        let status = resp.status();

        if status == StatusCode::FORBIDDEN {
            return Err(Error::Forbidden {
                url: url.to_string(),
            });
        }

        if status != StatusCode::OK {
            warn!(%status, %url, "response not 200 OK");
            return Ok(None);
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                error!(%url, error = %e, "connection dropped while reading body");
                return Err(Error::Transport(e));
            }
        };

        let value: Value =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))?;
        trace!(%url, body = %value, "decoded response");
        Ok(Some(value))
    }
}

/// Decode an optional body into a typed response.
///
/// An absent body becomes `T::default()`, which for every response type
/// in [`models`](crate::models) carries `success = false`.
pub(crate) fn decode<T>(body: Option<Value>) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    match body {
        None => Ok(T::default()),
        Some(value) => {
            let raw = value.to_string();
            serde_json::from_value(value).map_err(|e| Error::deserialization(&e, raw))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{MonitorResponse, ModuleResponse};

    fn connection(host: &str) -> Connection {
        Connection::new(host, 8080, SecretString::from("key".to_string()))
    }

    #[test]
    fn base_url_uses_plain_http_and_port() {
        let url = connection("10.0.0.5").base_url().unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8080/");
    }

    #[test]
    fn base_url_brackets_ipv6_literals() {
        let url = connection("fe80::1").base_url().unwrap();
        assert_eq!(url.as_str(), "http://[fe80::1]:8080/");
    }

    #[test]
    fn remote_url_points_at_remote_page() {
        let url = connection("mirror.local").remote_url().unwrap();
        assert_eq!(url.as_str(), "http://mirror.local:8080/remote.html");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let client = MirrorClient::without_session(connection("10.0.0.5")).unwrap();
        let url = client
            .segments_url(&["api", "module", "MMM-Some Module", "show"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.5:8080/api/module/MMM-Some%20Module/show"
        );
    }

    #[test]
    fn absent_body_decodes_to_failed_default() {
        let monitor: MonitorResponse = decode(None).unwrap();
        assert!(!monitor.success);
        assert!(monitor.monitor.is_none());

        let modules: ModuleResponse = decode(None).unwrap();
        assert!(!modules.success);
        assert!(modules.data.is_empty());
    }

    #[test]
    fn wrongly_shaped_body_is_a_decode_error() {
        let body = serde_json::json!({ "success": true, "data": "not-a-list" });
        let result: Result<ModuleResponse, Error> = decode(Some(body));
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[tokio::test]
    async fn missing_session_yields_absent_body() {
        let client = MirrorClient::without_session(connection("10.0.0.5")).unwrap();
        assert!(!client.has_session());
        assert!(client.fetch("api/test").await.unwrap().is_none());
        client.fire("api/refresh").await;
    }
}
