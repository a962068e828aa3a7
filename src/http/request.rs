//! Buffered request representation handed to the dispatcher

use std::collections::HashMap;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, COOKIE};
use hyper::{Method, Request, Version};

use super::form::{parse_cookies, Params};
use crate::error::WebError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A fully read request: method, path, merged query/form params, headers and cookies
#[derive(Debug, Clone)]
pub struct WebRequest {
    pub method: Method,
    pub path: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub params: Params,
    pub cookies: HashMap<String, String>,
}

impl WebRequest {
    /// Build a request without a body. `target` may carry a query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, params) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), Params::parse(q.as_bytes())),
            None => (target.to_string(), Params::new()),
        };

        Self {
            method,
            path,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            params,
            cookies: HashMap::new(),
        }
    }

    /// Read a hyper request, enforcing `max_body_size` and decoding form bodies
    pub async fn from_hyper<B>(req: Request<B>, max_body_size: u64) -> Result<Self, WebError>
    where
        B: hyper::body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();

        if let Some(size) = content_length(&parts.headers) {
            if size > max_body_size {
                return Err(WebError::PayloadTooLarge {
                    size,
                    max: max_body_size,
                });
            }
        }

        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        let mut request = Self::new(parts.method, &target);
        request.version = parts.version;

        // Bodies without a content length are cut off as soon as they pass the limit
        let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
        let bytes = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    WebError::BodyLimitExceeded { max: max_body_size }
                } else {
                    WebError::BodyRead(e.to_string())
                }
            })?
            .to_bytes();

        let is_form = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));
        if is_form {
            request.params.extend_encoded(&bytes);
        }

        if let Some(cookie) = parts.headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            request.cookies = parse_cookies(cookie);
        }
        request.headers = parts.headers;

        Ok(request)
    }

    /// Append an urlencoded form body, as a browser form post would
    #[cfg(test)]
    #[must_use]
    pub fn with_form(mut self, body: &str) -> Self {
        self.params.extend_encoded(body.as_bytes());
        self.headers
            .insert(CONTENT_TYPE, hyper::header::HeaderValue::from_static(FORM_CONTENT_TYPE));
        self
    }

    /// Header names are normalized to lowercase
    #[cfg(test)]
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            hyper::header::HeaderName::from_bytes(name.as_bytes()),
            hyper::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::{Bytes, Frame};
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};

    #[test]
    fn test_new_splits_query() {
        let req = WebRequest::new(Method::GET, "/springmvc/testRequestParam?username=tom&age=3");
        assert_eq!(req.path, "/springmvc/testRequestParam");
        assert_eq!(req.params.get("age"), Some("3"));
        assert_eq!(req.params.get("username"), Some("tom"));
    }

    #[tokio::test]
    async fn test_from_hyper_reads_form_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/emp?source=test")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(COOKIE, "JSESSIONID=s1")
            .body(Full::new(Bytes::from("name=Ann&email=ann%40x.io")))
            .unwrap();

        let web = WebRequest::from_hyper(req, 1024).await.unwrap();
        assert_eq!(web.method, Method::POST);
        assert_eq!(web.path, "/emp");
        assert_eq!(web.params.get("source"), Some("test"));
        assert_eq!(web.params.get("name"), Some("Ann"));
        assert_eq!(web.params.get("email"), Some("ann@x.io"));
        assert_eq!(web.cookie("JSESSIONID"), Some("s1"));
    }

    #[tokio::test]
    async fn test_from_hyper_ignores_non_form_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/emp")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from("name=Ann")))
            .unwrap();

        let web = WebRequest::from_hyper(req, 1024).await.unwrap();
        assert!(web.params.is_empty());
    }

    #[tokio::test]
    async fn test_from_hyper_rejects_large_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/emp")
            .header(CONTENT_LENGTH, "64")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();

        let err = WebRequest::from_hyper(req, 16).await.unwrap_err();
        assert!(matches!(err, WebError::PayloadTooLarge { size: 64, max: 16 }));
    }

    /// Chunked body that never ends, counting the frames read from it
    struct EndlessBody {
        frames: Arc<AtomicUsize>,
    }

    impl hyper::body::Body for EndlessBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            self.frames.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Some(Ok(Frame::data(Bytes::from(vec![b'x'; 256])))))
        }
    }

    #[tokio::test]
    async fn test_from_hyper_stops_reading_unsized_body_at_limit() {
        let frames = Arc::new(AtomicUsize::new(0));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/emp")
            .body(EndlessBody {
                frames: Arc::clone(&frames),
            })
            .unwrap();

        let err = WebRequest::from_hyper(req, 1024).await.unwrap_err();
        assert!(matches!(err, WebError::BodyLimitExceeded { max: 1024 }));
        assert_eq!(err.status(), hyper::StatusCode::PAYLOAD_TOO_LARGE);
        assert!(frames.load(Ordering::SeqCst) <= 5);
    }

    #[test]
    fn test_with_header_accepts_mixed_case_names() {
        let req = WebRequest::new(Method::GET, "/").with_header("Accept-Language", "en");
        assert_eq!(req.header("accept-language"), Some("en"));
    }
}
