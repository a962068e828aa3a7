//! Request dispatch module
//!
//! Entry point for HTTP request processing: buffering, hidden method conversion,
//! route lookup, session handling, handler invocation and view rendering.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};

use super::{demo, employee, Endpoint, HandlerContext};
use crate::config::{AppState, Config};
use crate::error::WebError;
use crate::http::{self, WebRequest};
use crate::logger::{self, AccessLogEntry};
use crate::model::{Model, ModelAndView, Outcome};
use crate::routing::{MatchResult, RequestMapping, RouteTable};
use crate::session::Session;
use crate::view::{Resolved, ViewResolverChain};

/// Form field that overrides the method of a POST
const METHOD_PARAM: &str = "_method";

/// Build the route table: health check, index page, employee CRUD and the demos
pub fn build_routes(config: &Config) -> RouteTable<Endpoint> {
    let mut table = RouteTable::new();
    if config.health.enabled {
        table.add(RequestMapping::new(&config.health.path, Endpoint::Health).method(Method::GET));
    }
    table.add(RequestMapping::new("/", Endpoint::Index).method(Method::GET));
    for mapping in employee::mappings() {
        table.add(mapping);
    }
    table.nest(demo::PREFIX, demo::mappings());
    table
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(&req, "referer");
    entry.user_agent = header_string(&req, "user-agent");

    let mut response = match WebRequest::from_hyper(req, state.config.http.max_body_size).await {
        Ok(request) => dispatch(request, &state).await,
        Err(e) => error_response(&e),
    };
    http::set_server_header(&mut response, &state.config.http.server_name);

    if state.cached_access_log.load(Ordering::Relaxed) {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch a buffered request and build the response
pub async fn dispatch(request: WebRequest, state: &AppState) -> Response<Full<Bytes>> {
    let method = effective_method(&request);

    let (endpoint, path_vars) = match state.routes.lookup(&method, &request) {
        MatchResult::Matched(mapping, vars) => (*mapping.endpoint(), vars),
        MatchResult::MethodNotAllowed(allowed) => {
            let allowed = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let err = WebError::MethodNotAllowed {
                method: method.to_string(),
                allowed: allowed.clone(),
            };
            logger::log_warning(&err.to_string());
            return http::build_405_response(&allowed, err.to_string());
        }
        MatchResult::ParamsNotSatisfied(conditions) => {
            return error_response(&WebError::UnsatisfiedParams(conditions));
        }
        MatchResult::NotFound => {
            return error_response(&WebError::NoHandler {
                method: method.to_string(),
                path: request.path.clone(),
            });
        }
    };

    if endpoint == Endpoint::Health {
        return http::build_text_response(StatusCode::OK, "ok".to_string());
    }

    let cookie_name = state.config.session.cookie_name.as_str();
    let session = state
        .sessions
        .load_or_create(request.cookie(cookie_name))
        .await;

    let mut ctx = HandlerContext {
        state,
        request: &request,
        path_vars,
        model: Model::new(),
        session,
    };
    let result = invoke(endpoint, &mut ctx).await;
    let HandlerContext { model, session, .. } = ctx;
    state.sessions.save(&session).await;

    let mut response = match result
        .and_then(|outcome| render(outcome, model, &session, &state.views))
    {
        Ok(response) => response,
        Err(e) => error_response(&e),
    };
    if session.is_new {
        http::set_session_cookie(&mut response, cookie_name, &session.id);
    }
    response
}

async fn invoke(endpoint: Endpoint, ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    match endpoint {
        Endpoint::Index | Endpoint::Health => Ok(Outcome::view("index")),
        Endpoint::Employee(action) => employee::invoke(action, ctx).await,
        Endpoint::Demo(action) => demo::invoke(action, ctx).await,
    }
}

/// A POST whose `_method` field names PUT, DELETE or PATCH is treated as that method
fn effective_method(request: &WebRequest) -> Method {
    if request.method != Method::POST {
        return request.method.clone();
    }
    match request
        .params
        .get(METHOD_PARAM)
        .map(str::to_ascii_uppercase)
        .as_deref()
    {
        Some("PUT") => Method::PUT,
        Some("DELETE") => Method::DELETE,
        Some("PATCH") => Method::PATCH,
        _ => Method::POST,
    }
}

fn render(
    outcome: Outcome,
    mut model: Model,
    session: &Session,
    views: &ViewResolverChain,
) -> Result<Response<Full<Bytes>>, WebError> {
    match outcome.absorb_model(&mut model) {
        Outcome::Body(text) => Ok(http::build_text_response(StatusCode::OK, text)),
        Outcome::View(name) | Outcome::ModelAndView(ModelAndView { view: name, .. }) => {
            match views.resolve(&name)? {
                Resolved::Redirect(target) => Ok(http::build_redirect_response(&target)),
                Resolved::Render(view) => {
                    logger::log_debug(&format!(
                        "Rendering view '{name}' with {} model attribute(s)",
                        model.len()
                    ));
                    Ok(http::build_html_response(
                        view.render(&model, &session.attributes)?,
                    ))
                }
            }
        }
    }
}

fn error_response(err: &WebError) -> Response<Full<Bytes>> {
    let status = err.status();
    if status.is_server_error() {
        logger::log_error(&err.to_string());
    } else {
        logger::log_warning(&err.to_string());
    }
    http::build_text_response(
        status,
        format!("{} {}\n{err}", status.as_u16(), status.canonical_reason().unwrap_or("")),
    )
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;
    use http_body_util::BodyExt;
    use hyper::header::{LOCATION, SERVER, SET_COOKIE};

    struct TestResponse {
        status: StatusCode,
        headers: hyper::HeaderMap,
        body: String,
    }

    impl TestResponse {
        fn session_id(&self) -> Option<String> {
            let cookie = self.headers.get(SET_COOKIE)?.to_str().ok()?;
            let pair = cookie.split(';').next()?;
            pair.split_once('=').map(|(_, v)| v.to_string())
        }

        fn location(&self) -> Option<&str> {
            self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
        }
    }

    fn test_state() -> AppState {
        AppState::new(&Config::for_tests())
    }

    async fn send(state: &AppState, request: WebRequest) -> TestResponse {
        let response = dispatch(request, state).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn get(target: &str) -> WebRequest {
        WebRequest::new(Method::GET, target)
    }

    fn post(target: &str, form: &str) -> WebRequest {
        WebRequest::new(Method::POST, target).with_form(form)
    }

    #[tokio::test]
    async fn test_save_then_list() {
        let state = test_state();
        let resp = send(
            &state,
            post("/emp", "name=Ann&email=ann%40x.io&gender=0&departmentId=102"),
        )
        .await;
        assert_eq!(resp.status, StatusCode::FOUND);
        assert_eq!(resp.location(), Some("/emps"));

        let list = send(&state, get("/emps")).await;
        assert_eq!(list.status, StatusCode::OK);
        assert!(list.body.contains("<td>1006</td><td>Ann</td><td>ann@x.io</td><td>Female</td><td>D-BB</td>"));
        assert!(list.body.contains("E-AA"));
    }

    #[tokio::test]
    async fn test_save_ignores_submitted_id() {
        let state = test_state();
        send(
            &state,
            post("/emp", "id=1001&name=Ann&email=a%40x.io&gender=1&departmentId=101"),
        )
        .await;

        assert_eq!(state.employees.get(1001).await.unwrap().name, "E-AA");
        assert_eq!(state.employees.get(1006).await.unwrap().name, "Ann");
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_department() {
        let state = test_state();
        let resp = send(
            &state,
            post("/emp", "name=Ann&email=a%40x.io&gender=1&departmentId=999"),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(resp.body.contains("999"));
        assert_eq!(state.employees.get_all().await.len(), 5);
    }

    #[tokio::test]
    async fn test_input_form_is_blank_with_all_departments() {
        let state = test_state();
        let resp = send(&state, get("/emp")).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body.matches("<option value=").count(), 5);
        assert!(resp.body.contains("D-EE"));
        assert!(!resp.body.contains("name=\"id\""));
        assert!(!resp.body.contains(" checked"));
    }

    #[tokio::test]
    async fn test_edit_update_and_delete() {
        let state = test_state();

        let edit = send(&state, get("/emp/1001")).await;
        assert_eq!(edit.status, StatusCode::OK);
        assert!(edit.body.contains("name=\"id\" value=\"1001\""));
        assert!(edit.body.contains("value=\"PUT\""));
        assert_eq!(send(&state, get("/emp/4242")).await.status, StatusCode::NOT_FOUND);

        let update = send(
            &state,
            post(
                "/emp",
                "_method=PUT&id=1001&name=Changed&email=c%40x.io&gender=0&departmentId=103",
            ),
        )
        .await;
        assert_eq!(update.status, StatusCode::FOUND);
        let changed = state.employees.get(1001).await.unwrap();
        assert_eq!(changed.name, "Changed");
        assert_eq!(changed.department_id, Some(103));

        let missing = send(
            &state,
            post("/emp", "_method=PUT&id=4242&name=X&email=x%40x.io&departmentId=101"),
        )
        .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let delete = send(&state, post("/emp/1001", "_method=DELETE")).await;
        assert_eq!(delete.status, StatusCode::FOUND);
        assert_eq!(delete.location(), Some("/emps"));
        assert!(state.employees.get(1001).await.is_none());

        // Deleting again still redirects
        let again = send(&state, post("/emp/1001", "_method=delete")).await;
        assert_eq!(again.status, StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_method_not_allowed_and_not_found() {
        let state = test_state();
        let resp = send(&state, get("/springmvc/testMethod")).await;
        assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers.get("Allow").unwrap(), "POST");

        let ok = send(&state, post("/springmvc/testMethod", "")).await;
        assert_eq!(ok.status, StatusCode::OK);

        let missing = send(&state, get("/nothing/here")).await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert!(missing.session_id().is_none());
    }

    #[tokio::test]
    async fn test_hidden_method_only_applies_to_post() {
        let state = test_state();
        let put = send(&state, post("/springmvc/testRestPut/7", "_method=PUT")).await;
        assert_eq!(put.status, StatusCode::OK);

        let plain_post = send(&state, post("/springmvc/testRestPut/7", "")).await;
        assert_eq!(plain_post.status, StatusCode::METHOD_NOT_ALLOWED);

        let get_with_override = send(&state, get("/springmvc/testRestGet/7?_method=DELETE")).await;
        assert_eq!(get_with_override.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_params_and_headers_conditions() {
        let state = test_state();
        let with_header = |target: &str| {
            get(target).with_header("accept-language", "zh-CN,zh;q=0.9")
        };

        let ok = send(&state, with_header("/springmvc/testParamsAndHeaders?username=tom&age=11")).await;
        assert_eq!(ok.status, StatusCode::OK);

        let age_ten = send(&state, with_header("/springmvc/testParamsAndHeaders?username=tom&age=10")).await;
        assert_eq!(age_ten.status, StatusCode::BAD_REQUEST);

        let no_header = send(&state, get("/springmvc/testParamsAndHeaders?username=tom&age=11")).await;
        assert_eq!(no_header.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_binding_errors_are_bad_requests() {
        let state = test_state();
        let missing = send(&state, get("/springmvc/testRequestParam?age=3")).await;
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert!(missing.body.contains("username"));

        let ok = send(&state, get("/springmvc/testRequestParam?username=tom")).await;
        assert_eq!(ok.status, StatusCode::OK);

        let bad_age = send(&state, get("/springmvc/testRequestParam?username=tom&age=old")).await;
        assert_eq!(bad_age.status, StatusCode::BAD_REQUEST);

        let no_header = send(&state, get("/springmvc/testRequestHeader")).await;
        assert_eq!(no_header.status, StatusCode::BAD_REQUEST);

        let no_cookie = send(&state, get("/springmvc/testCookieValue")).await;
        assert_eq!(no_cookie.status, StatusCode::BAD_REQUEST);
        let with_cookie = send(
            &state,
            get("/springmvc/testCookieValue").with_cookie("JSESSIONID", "ABC"),
        )
        .await;
        assert_eq!(with_cookie.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_attributes_feed_model_attribute() {
        let state = test_state();
        let first = send(&state, get("/springmvc/testSessionAttributes")).await;
        assert_eq!(first.status, StatusCode::OK);
        let session_id = first.session_id().unwrap();
        assert_eq!(session_id.len(), 32);

        let second = send(
            &state,
            get("/springmvc/testModelAttribute?age=20").with_cookie("JSESSIONID", &session_id),
        )
        .await;
        assert_eq!(second.status, StatusCode::OK);
        assert!(second.session_id().is_none());

        let session = state.sessions.load_or_create(Some(session_id.as_str())).await;
        let user: User = session.attributes.get_as("user").unwrap().unwrap();
        assert_eq!(user, User::new("Tom", "123456", "tom@qq.com", 20));
        assert!(session.attributes.contains("school"));
    }

    #[tokio::test]
    async fn test_pojo_requires_session_user() {
        let state = test_state();
        let resp = send(&state, get("/springmvc/testPojo?name=Tom&age=3")).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(resp.body.contains("user"));
    }

    #[tokio::test]
    async fn test_model_attribute_hook_keeps_unbound_fields() {
        let state = test_state();
        let resp = send(&state, get("/springmvc/testModelAttribute?id=1&age=13")).await;
        assert_eq!(resp.status, StatusCode::OK);

        let session_id = resp.session_id().unwrap();
        let session = state.sessions.load_or_create(Some(session_id.as_str())).await;
        let user: User = session.attributes.get_as("user").unwrap().unwrap();
        assert_eq!(user.password, "123456");
        assert_eq!(user.email, "tom@atguigu.com");
        assert_eq!(user.age, 13);
    }

    #[tokio::test]
    async fn test_view_outcomes() {
        let state = test_state();

        let api = send(&state, get("/springmvc/testServletApi")).await;
        assert_eq!(api.body, "testServletApi");
        assert!(api.headers["content-type"].to_str().unwrap().starts_with("text/plain"));

        let hello = send(&state, get("/springmvc/testView")).await;
        assert!(hello.body.contains("Hello View"));

        let redirect = send(&state, get("/springmvc/testRedirect")).await;
        assert_eq!(redirect.status, StatusCode::FOUND);
        assert_eq!(redirect.location(), Some("/"));

        let mav = send(&state, get("/springmvc/testModelAndView")).await;
        assert!(mav.body.contains("<dt>time</dt>"));

        let map = send(&state, get("/springmvc/testMap")).await;
        assert!(map.body.contains("Jerry"));

        let index = send(&state, get("/")).await;
        assert!(index.body.contains("/springmvc/testRedirect"));
    }

    #[tokio::test]
    async fn test_health_check_skips_session() {
        let state = test_state();
        let resp = send(&state, get("/healthz")).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, "ok");
        assert!(resp.session_id().is_none());
    }

    #[tokio::test]
    async fn test_handle_request_sets_server_header_and_limits_body() {
        let state = Arc::new(test_state());
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();

        let req = Request::builder()
            .uri("/emps")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state), peer).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[SERVER], "mvc-showcase/test");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/emp")
            .body(Full::new(Bytes::from(vec![b'a'; 4096])))
            .unwrap();
        let resp = handle_request(req, state, peer).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_build_routes_respects_health_toggle() {
        let mut config = Config::for_tests();
        let with_health = build_routes(&config).len();
        config.health.enabled = false;
        assert_eq!(build_routes(&config).len(), with_health - 1);
    }
}
