//! HTTP protocol layer module
//!
//! Request buffering, parameter decoding and response builders, decoupled from handler logic.

pub mod form;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use form::Params;
pub use request::WebRequest;
pub use response::{
    build_405_response, build_html_response, build_redirect_response, build_text_response,
    set_server_header, set_session_cookie,
};
