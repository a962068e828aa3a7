//! Request handler module
//!
//! Dispatch of buffered requests to the employee CRUD handler and the demo
//! controller, plus the context those handlers work on.

pub mod demo;
pub mod dispatcher;
pub mod employee;

use std::str::FromStr;

use crate::config::AppState;
use crate::error::WebError;
use crate::http::WebRequest;
use crate::model::Model;
use crate::routing::PathVariables;
use crate::session::Session;

pub use demo::DemoAction;
pub use dispatcher::{build_routes, handle_request};
pub use employee::EmployeeAction;

/// Target of a request mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Index,
    Health,
    Employee(EmployeeAction),
    Demo(DemoAction),
}

/// Everything a handler reads and writes during one request
pub struct HandlerContext<'a> {
    pub state: &'a AppState,
    pub request: &'a WebRequest,
    pub path_vars: PathVariables,
    /// Implicit model rendered by the view
    pub model: Model,
    pub session: Session,
}

impl HandlerContext<'_> {
    pub fn path_var(&self, name: &str) -> Result<&str, WebError> {
        self.path_vars
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| WebError::MissingParameter(name.to_string()))
    }

    pub fn path_var_as<T: FromStr>(&self, name: &str, expected: &'static str) -> Result<T, WebError> {
        let raw = self.path_var(name)?;
        raw.parse()
            .map_err(|_| WebError::type_mismatch(name, raw, expected))
    }
}
