//! Request parameter binding
//!
//! Form-backing objects implement [`Bindable`]. [`resolve_model_attribute`] finds the
//! object a handler argument should start from, binds the request parameters onto it
//! and exposes the result in the model.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::WebError;
use crate::http::Params;
use crate::model::Model;
use crate::session::SessionAttributes;

/// A type whose fields can be populated from request parameters
pub trait Bindable: Default + Serialize + DeserializeOwned {
    /// Model key: the type name with a lowercase first letter
    const MODEL_KEY: &'static str;

    /// Overwrite the fields named by `params`. Absent parameters leave fields untouched.
    fn bind(&mut self, params: &Params) -> Result<(), WebError>;
}

/// Resolve, bind and publish the model attribute for `T`.
///
/// Resolution order:
/// 1. the implicit model, when it already holds `T::MODEL_KEY`;
/// 2. the session, when the key is a declared session attribute (missing is an error);
/// 3. `T::default()`.
pub fn resolve_model_attribute<T: Bindable>(
    model: &mut Model,
    session: &Model,
    declared: &SessionAttributes,
    params: &Params,
) -> Result<T, WebError> {
    let key = T::MODEL_KEY;

    let mut target = if let Some(found) = model.get_as::<T>(key)? {
        found
    } else if declared.is_declared_name(key) {
        session
            .get_as::<T>(key)?
            .ok_or_else(|| WebError::SessionAttributeRequired(key.to_string()))?
    } else {
        T::default()
    };

    target.bind(params)?;
    model.insert(key, &target)?;
    Ok(target)
}
