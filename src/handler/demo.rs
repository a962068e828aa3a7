//! Request-mapping and binding demos, mounted under `/springmvc`
//!
//! Each endpoint exercises one mapping or binding feature and, unless noted,
//! answers with the `success` view. The controller keeps `user` and every
//! string-valued model attribute in the session.

use chrono::Local;
use hyper::Method;

use super::{Endpoint, HandlerContext};
use crate::binding::{resolve_model_attribute, Bindable};
use crate::error::WebError;
use crate::logger;
use crate::model::{ModelAndView, Outcome, User};
use crate::routing::RequestMapping;
use crate::session::SessionAttributes;

pub const PREFIX: &str = "/springmvc";

pub const SESSION_ATTRIBUTES: SessionAttributes = SessionAttributes::new(&["user"], true);

const SUCCESS: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAction {
    RequestMapping,
    Method,
    ParamsAndHeaders,
    AntPath,
    PathVariable,
    RestGet,
    RestPost,
    RestDelete,
    RestPut,
    RequestParam,
    RequestHeader,
    CookieValue,
    Pojo,
    ServletApi,
    ModelAndView,
    Map,
    SessionAttributes,
    ModelAttribute,
    ViewAndViewResolver,
    View,
    Redirect,
}

/// Mappings relative to [`PREFIX`]
pub fn mappings() -> Vec<RequestMapping<Endpoint>> {
    let m = |path: &str, action: DemoAction| RequestMapping::new(path, Endpoint::Demo(action));

    vec![
        m("/testRequestMapping", DemoAction::RequestMapping),
        m("/testMethod", DemoAction::Method).method(Method::POST),
        m("/testParamsAndHeaders", DemoAction::ParamsAndHeaders)
            .param("username")
            .param("age!=10")
            .header("Accept-Language", "zh-CN,zh;q=0.9"),
        m("/testAntPath/*/abc", DemoAction::AntPath),
        m("/testPathVariable/{id}", DemoAction::PathVariable),
        m("/testRestGet/{id}", DemoAction::RestGet).method(Method::GET),
        m("/testRestPost", DemoAction::RestPost).method(Method::POST),
        m("/testRestDelete/{id}", DemoAction::RestDelete).method(Method::DELETE),
        m("/testRestPut/{id}", DemoAction::RestPut).method(Method::PUT),
        m("/testRequestParam", DemoAction::RequestParam),
        m("/testRequestHeader", DemoAction::RequestHeader),
        m("/testCookieValue", DemoAction::CookieValue),
        m("/testPojo", DemoAction::Pojo),
        m("/testServletApi", DemoAction::ServletApi),
        m("/testModelAndView", DemoAction::ModelAndView),
        m("/testMap", DemoAction::Map),
        m("/testSessionAttributes", DemoAction::SessionAttributes),
        m("/testModelAttribute", DemoAction::ModelAttribute),
        m("/testViewAndViewResolver", DemoAction::ViewAndViewResolver),
        m("/testView", DemoAction::View),
        m("/testRedirect", DemoAction::Redirect),
    ]
}

/// Run a demo endpoint with the controller's model lifecycle:
/// session retrieval, the `get_user` hook, the handler, then session promotion.
pub async fn invoke(action: DemoAction, ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    SESSION_ATTRIBUTES.retrieve(&ctx.session.attributes, &mut ctx.model);
    get_user(ctx)?;

    let outcome = handle(action, ctx)?.absorb_model(&mut ctx.model);

    let stored = SESSION_ATTRIBUTES.store(&ctx.model, &mut ctx.session.attributes);
    if stored > 0 {
        logger::log_debug(&format!(
            "Stored {stored} model attribute(s) in session {}",
            ctx.session.id
        ));
    }
    Ok(outcome)
}

/// Runs before every demo endpoint: an `id` parameter loads the user into the model
fn get_user(ctx: &mut HandlerContext<'_>) -> Result<(), WebError> {
    logger::log_debug("ModelAttribute getUser");
    if let Some(id) = ctx.request.params.parse_opt::<i64>("id", "integer")? {
        let user = User::new("Tom", "123456", "tom@atguigu.com", 12);
        logger::log_info(&format!("Obtain user {id} from database: {user:?}"));
        ctx.model.insert(User::MODEL_KEY, &user)?;
    }
    Ok(())
}

fn handle(action: DemoAction, ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    let success = || Ok(Outcome::view(SUCCESS));

    match action {
        DemoAction::RequestMapping => {
            logger::log_info("testRequestMapping");
            success()
        }
        DemoAction::Method => {
            logger::log_info("testMethod");
            success()
        }
        DemoAction::ParamsAndHeaders => {
            logger::log_info("testParamsAndHeaders");
            success()
        }
        DemoAction::AntPath => {
            logger::log_info("testAntPath");
            success()
        }
        DemoAction::PathVariable => {
            logger::log_info(&format!("testPathVariable: {}", ctx.path_var("id")?));
            success()
        }
        DemoAction::RestGet => {
            logger::log_info(&format!("testRestGet: {}", ctx.path_var("id")?));
            success()
        }
        DemoAction::RestPost => {
            logger::log_info("testRestPost");
            success()
        }
        DemoAction::RestDelete => {
            logger::log_info(&format!("testRestDelete: {}", ctx.path_var("id")?));
            success()
        }
        DemoAction::RestPut => {
            logger::log_info(&format!("testRestPut: {}", ctx.path_var("id")?));
            success()
        }
        DemoAction::RequestParam => {
            let username = ctx.request.params.required("username")?;
            let age = ctx
                .request
                .params
                .parse_opt::<i32>("age", "integer")?
                .unwrap_or(0);
            logger::log_info(&format!("testRequestParam: username: {username}, age: {age}"));
            success()
        }
        DemoAction::RequestHeader => {
            let language = ctx
                .request
                .header("accept-language")
                .ok_or_else(|| WebError::MissingHeader("Accept-Language".to_string()))?;
            logger::log_info(&format!("testRequestHeader: {language}"));
            success()
        }
        DemoAction::CookieValue => {
            let cookie_name = ctx.state.config.session.cookie_name.as_str();
            let session_id = ctx
                .request
                .cookie(cookie_name)
                .ok_or_else(|| WebError::MissingCookie(cookie_name.to_string()))?;
            logger::log_info(&format!("testCookieValue: {session_id}"));
            success()
        }
        DemoAction::Pojo => {
            let user = bind_user(ctx)?;
            logger::log_info(&format!("testPojo: {user:?}"));
            success()
        }
        DemoAction::ServletApi => {
            logger::log_info(&format!(
                "testServletApi: request: {} {}, session: {}",
                ctx.request.method, ctx.request.path, ctx.session.id
            ));
            Ok(Outcome::Body("testServletApi".to_string()))
        }
        DemoAction::ModelAndView => {
            let time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            Ok(Outcome::ModelAndView(
                ModelAndView::new(SUCCESS).add_object("time", &time)?,
            ))
        }
        DemoAction::Map => {
            ctx.model.insert("names", &["Tom", "Jerry", "Mike"])?;
            success()
        }
        DemoAction::SessionAttributes => {
            let user = User::new("Tom", "123456", "tom@qq.com", 15);
            ctx.model.insert(User::MODEL_KEY, &user)?;
            ctx.model.insert("school", "atguigu")?;
            success()
        }
        DemoAction::ModelAttribute => {
            let user = bind_user(ctx)?;
            logger::log_info(&format!("Modifying: {user:?}"));
            success()
        }
        DemoAction::ViewAndViewResolver => {
            logger::log_info("testViewAndViewResolver");
            success()
        }
        DemoAction::View => {
            logger::log_info("testView");
            Ok(Outcome::view("helloView"))
        }
        DemoAction::Redirect => {
            logger::log_info("testRedirect");
            Ok(Outcome::redirect("/"))
        }
    }
}

fn bind_user(ctx: &mut HandlerContext<'_>) -> Result<User, WebError> {
    resolve_model_attribute(
        &mut ctx.model,
        &ctx.session.attributes,
        &SESSION_ATTRIBUTES,
        &ctx.request.params,
    )
}
