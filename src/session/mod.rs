//! HTTP sessions
//!
//! Cookie-identified session storage and the per-controller declaration of which
//! model attributes are promoted into it.

mod attributes;
mod store;

pub use attributes::SessionAttributes;
pub use store::{Session, SessionStore};
