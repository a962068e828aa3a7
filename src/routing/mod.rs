//! Routing module
//!
//! Request-mapping based routing:
//! - Path patterns with `{name}` variables and `*` wildcards
//! - Method constraints
//! - Parameter and header conditions

mod matcher;

pub use matcher::{MatchResult, PathVariables, RequestMapping, RouteTable};
