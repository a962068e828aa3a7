//! Model mapping and handler outcomes
//!
//! The model is the per-request key/value mapping handlers fill in and views render.
//! Values are stored as JSON so the same mapping can be promoted into a session.

mod entities;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::WebError;

pub use entities::{Department, Employee, Gender, User};

/// Per-request attribute mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    attributes: BTreeMap<String, Value>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` and store it under `key`
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), WebError> {
        let value = serde_json::to_value(value).map_err(|source| WebError::ModelAttribute {
            key: key.to_string(),
            source,
        })?;
        self.attributes.insert(key.to_string(), value);
        Ok(())
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Typed read of `key`; `None` when absent
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, WebError> {
        self.attributes
            .get(key)
            .map(|v| {
                serde_json::from_value(v.clone()).map_err(|source| WebError::ModelAttribute {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Copy every attribute of `other` into this model, replacing existing keys
    pub fn merge(&mut self, other: Self) {
        self.attributes.extend(other.attributes);
    }
}

/// A view name together with its own model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAndView {
    pub view: String,
    pub model: Model,
}

impl ModelAndView {
    pub fn new(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            model: Model::new(),
        }
    }

    pub fn add_object<T: Serialize + ?Sized>(
        mut self,
        key: &str,
        value: &T,
    ) -> Result<Self, WebError> {
        self.model.insert(key, value)?;
        Ok(self)
    }
}

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Logical view name (`redirect:` prefix allowed), rendered with the implicit model
    View(String),
    /// View plus model entries merged into the implicit model
    ModelAndView(ModelAndView),
    /// Raw text written straight to the response
    Body(String),
}

impl Outcome {
    pub fn view(name: impl Into<String>) -> Self {
        Self::View(name.into())
    }

    pub fn redirect(target: &str) -> Self {
        Self::View(format!("redirect:{target}"))
    }

    /// Fold a `ModelAndView`'s entries into `model`, leaving a plain view
    #[must_use]
    pub fn absorb_model(self, model: &mut Model) -> Self {
        match self {
            Self::ModelAndView(mav) => {
                model.merge(mav.model);
                Self::View(mav.view)
            }
            other => other,
        }
    }
}
