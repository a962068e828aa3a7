//! Request parameter and cookie parsing
//!
//! Query strings and `application/x-www-form-urlencoded` bodies are merged into one
//! multi-valued parameter list, in the order they appear (query first).

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::WebError;

/// Multi-valued request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a urlencoded string (`a=1&b=two+words`)
    pub fn parse(encoded: &[u8]) -> Self {
        let mut params = Self::new();
        params.extend_encoded(encoded);
        params
    }

    pub fn extend_encoded(&mut self, encoded: &[u8]) {
        self.pairs.extend(
            form_urlencoded::parse(encoded).map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Required parameter, `MissingParameter` when absent
    pub fn required(&self, name: &str) -> Result<&str, WebError> {
        self.get(name)
            .ok_or_else(|| WebError::MissingParameter(name.to_string()))
    }

    /// Optional typed parameter; an empty value counts as absent
    pub fn parse_opt<T: FromStr>(
        &self,
        name: &str,
        expected: &'static str,
    ) -> Result<Option<T>, WebError> {
        match self.get(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| WebError::type_mismatch(name, raw, expected)),
        }
    }
}

/// Parse a `Cookie` header value into name/value pairs
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}
