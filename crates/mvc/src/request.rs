//! Inbound request handling: the request wrapper given to actions and its
//! ordered parameter list.

use crate::error::{BoxError, DispatchError};
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri};
use http_body::Body;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tracing::warn;

const ACTION_PREFIX: &str = "action_";

/// Request parameters in enumeration order: query string first, then the
/// url-encoded body. A name may occur several times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_query(query: &str) -> Result<Self, DispatchError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query).map_err(DispatchError::invalid_request)?;
        Ok(Self { pairs })
    }

    pub fn extend_from_form(&mut self, body: &[u8]) -> Result<(), DispatchError> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body).map_err(DispatchError::invalid_request)?;
        self.pairs.extend(pairs);
        Ok(())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.pairs.iter().filter(move |(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// The action selected by the first `action_<name>` parameter with a
    /// truthy value. Image submit coordinates (`action_<name>_x`,
    /// `action_<name>_y`) select `<name>` as well.
    pub fn action_name(&self) -> Option<String> {
        self.iter().find_map(|(key, value)| {
            let name = key.strip_prefix(ACTION_PREFIX)?;
            if !is_truthy(value) {
                return None;
            }
            let name = name.strip_suffix("_x").or_else(|| name.strip_suffix("_y")).unwrap_or(name);
            if is_valid_action_name(name) {
                Some(name.to_string())
            } else {
                warn!(param = key, "action name rejected, only [A-Za-z0-9_] is allowed");
                None
            }
        })
    }

    /// Deserializes the parameters into `T`, the first occurrence of a name wins.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        let encoded = serde_urlencoded::to_string(&self.pairs).map_err(DispatchError::invalid_request)?;
        serde_urlencoded::from_str(&encoded).map_err(DispatchError::invalid_request)
    }
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

fn is_valid_action_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// The request as seen by actions: the HTTP head and the decoded parameters.
#[derive(Debug)]
pub struct ActionRequest {
    parts: Parts,
    params: RequestParams,
}

impl ActionRequest {
    pub fn new(parts: Parts, params: RequestParams) -> Self {
        Self { parts, params }
    }

    /// Collects the body and decodes query string and url-encoded form
    /// parameters.
    pub async fn from_http<B>(request: Request<B>) -> Result<Self, DispatchError>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let mut params = match parts.uri.query() {
            Some(query) => RequestParams::from_query(query)?,
            None => RequestParams::new(),
        };

        if is_form_urlencoded(&parts.headers) {
            let collected = body.collect().await.map_err(|e| {
                let e: BoxError = e.into();
                DispatchError::invalid_request(e)
            })?;
            let bytes = collected.to_bytes();
            params.extend_from_form(&bytes)?;
        }

        Ok(Self { parts, params })
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// `http://<host><directory of the request path>/`, used when no url is
    /// configured.
    pub fn base_url(&self) -> Option<String> {
        let host = self.headers().get(http::header::HOST)?.to_str().ok()?;
        let scheme = self.uri().scheme_str().unwrap_or("http");
        let path = self.uri().path();
        let dir = path.rfind('/').map_or("", |index| &path[..index]);
        Some(format!("{scheme}://{host}{dir}/"))
    }
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use serde::Deserialize;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn first_truthy_action_wins() {
        let params = RequestParams::from_query("action_login=true&action_logout=true").unwrap();
        assert_eq!(params.action_name().as_deref(), Some("login"));
    }

    #[test]
    fn falsy_actions_are_skipped() {
        let params = RequestParams::from_query("action_login=0&action_home=&action_search=1").unwrap();
        assert_eq!(params.action_name().as_deref(), Some("search"));
    }

    #[test]
    fn image_submit_coordinates() {
        let params = RequestParams::from_query("action_send_x=12&action_send_y=7").unwrap();
        assert_eq!(params.action_name().as_deref(), Some("send"));
    }

    #[test]
    fn invalid_names_are_ignored() {
        let params = RequestParams::from_query("action_..%2Fetc=1").unwrap();
        assert_eq!(params.action_name(), None);
    }

    #[derive(Clone)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rejected_names_are_logged() {
        let output = Captured(Arc::default());
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt().with_ansi(false).with_writer(move || writer.clone()).finish();

        let action = tracing::subscriber::with_default(subscriber, || {
            RequestParams::from_query("action_..%2Fetc=1&action_home=1").unwrap().action_name()
        });
        assert_eq!(action.as_deref(), Some("home"));

        let logs = String::from_utf8(output.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("action_../etc"), "{logs}");
    }

    #[test]
    fn repeated_params() {
        let params = RequestParams::from_query("tag%5B%5D=a&tag%5B%5D=b&name=x").unwrap();
        assert_eq!(params.get_all("tag[]").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(params.get("name"), Some("x"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn deserialize_params() {
        #[derive(Deserialize)]
        struct Login {
            user: String,
            remember: Option<String>,
        }

        let params: RequestParams = [("user", "alice")].into_iter().collect();
        let login: Login = params.deserialize().unwrap();
        assert_eq!(login.user, "alice");
        assert!(login.remember.is_none());
    }

    #[tokio::test]
    async fn query_comes_before_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/index?action_home=1")
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=UTF-8")
            .header(http::header::HOST, "example.com")
            .body(Full::new(Bytes::from("action_login=true&user=alice")))
            .unwrap();

        let request = ActionRequest::from_http(request).await.unwrap();
        assert_eq!(request.params().action_name().as_deref(), Some("home"));
        assert_eq!(request.param("user"), Some("alice"));
        assert_eq!(request.base_url().as_deref(), Some("http://example.com/"));
    }

    #[tokio::test]
    async fn other_bodies_are_not_decoded() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/app/index")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from("{\"action_login\":true}")))
            .unwrap();

        let request = ActionRequest::from_http(request).await.unwrap();
        assert!(request.params().is_empty());
        assert_eq!(request.base_url(), None);
    }
}
