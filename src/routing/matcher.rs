//! Request mapping matcher
//!
//! Matches method, path pattern, parameter conditions and header conditions.
//! Path patterns support literal segments, `{name}` variables and `*` single-segment wildcards.

use std::collections::HashMap;

use hyper::Method;
use percent_encoding::percent_decode_str;

use crate::http::{Params, WebRequest};
use crate::logger;

/// Values captured by `{name}` segments
pub type PathVariables = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
    Wildcard,
}

/// Parsed path pattern such as `/springmvc/testRestGet/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_segments(pattern)
            .map(|seg| {
                if seg == "*" {
                    Segment::Wildcard
                } else if let Some(name) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Segment::Variable(name.to_string())
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning captured variables. A trailing slash is ignored.
    pub fn matches(&self, path: &str) -> Option<PathVariables> {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut variables = PathVariables::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Wildcard => {}
                Segment::Variable(name) => {
                    let value = percent_decode_str(part).decode_utf8_lossy();
                    variables.insert(name.clone(), value.into_owned());
                }
            }
        }
        Some(variables)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Condition on a request parameter: `name`, `!name`, `name=value`, `name!=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamCondition {
    Present(String),
    Absent(String),
    Equals(String, String),
    NotEquals(String, String),
}

impl ParamCondition {
    pub fn parse(expr: &str) -> Self {
        if let Some((name, value)) = expr.split_once("!=") {
            Self::NotEquals(name.trim().to_string(), value.trim().to_string())
        } else if let Some((name, value)) = expr.split_once('=') {
            Self::Equals(name.trim().to_string(), value.trim().to_string())
        } else if let Some(name) = expr.strip_prefix('!') {
            Self::Absent(name.trim().to_string())
        } else {
            Self::Present(expr.trim().to_string())
        }
    }

    pub fn is_satisfied(&self, params: &Params) -> bool {
        match self {
            Self::Present(name) => params.contains(name),
            Self::Absent(name) => !params.contains(name),
            Self::Equals(name, value) => params.get(name) == Some(value.as_str()),
            Self::NotEquals(name, value) => params.get(name) != Some(value.as_str()),
        }
    }
}

/// Exact-value header condition; names compare case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCondition {
    pub name: String,
    pub value: String,
}

impl HeaderCondition {
    fn is_satisfied(&self, request: &WebRequest) -> bool {
        request.header(&self.name) == Some(self.value.as_str())
    }
}

/// One mapping from request conditions to an endpoint
#[derive(Debug, Clone)]
pub struct RequestMapping<E> {
    pattern: PathPattern,
    methods: Vec<Method>,
    params: Vec<ParamCondition>,
    param_exprs: Vec<String>,
    headers: Vec<HeaderCondition>,
    endpoint: E,
}

impl<E> RequestMapping<E> {
    /// Mapping for any method
    pub fn new(pattern: &str, endpoint: E) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            methods: Vec::new(),
            params: Vec::new(),
            param_exprs: Vec::new(),
            headers: Vec::new(),
            endpoint,
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn param(mut self, expr: &str) -> Self {
        self.params.push(ParamCondition::parse(expr));
        self.param_exprs.push(expr.to_string());
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push(HeaderCondition {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
        });
        self
    }

    pub const fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    fn allows_method(&self, method: &Method) -> bool {
        self.methods.is_empty()
            || self.methods.contains(method)
            || (*method == Method::HEAD && self.methods.contains(&Method::GET))
    }
}

/// Outcome of looking a request up in a [`RouteTable`]
#[derive(Debug)]
pub enum MatchResult<'a, E> {
    Matched(&'a RequestMapping<E>, PathVariables),
    /// Path matched but no mapping accepts the method
    MethodNotAllowed(Vec<Method>),
    /// Path and method matched but parameter conditions did not
    ParamsNotSatisfied(String),
    NotFound,
}

/// Ordered list of request mappings; the first full match wins
#[derive(Debug, Clone)]
pub struct RouteTable<E> {
    mappings: Vec<RequestMapping<E>>,
}

impl<E> RouteTable<E> {
    pub const fn new() -> Self {
        Self {
            mappings: Vec::new(),
        }
    }

    pub fn add(&mut self, mapping: RequestMapping<E>) {
        logger::log_debug(&format!(
            "Mapped \"{}\" methods=[{}] params=[{}]",
            mapping.pattern().as_str(),
            mapping
                .methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(","),
            mapping.param_exprs.join(","),
        ));
        self.mappings.push(mapping);
    }

    /// Prefix every pattern of `mappings` and add them
    pub fn nest(&mut self, prefix: &str, mappings: impl IntoIterator<Item = RequestMapping<E>>) {
        let prefix = prefix.trim_end_matches('/');
        for mut mapping in mappings {
            let joined = format!("{prefix}/{}", mapping.pattern.raw.trim_start_matches('/'));
            mapping.pattern = PathPattern::parse(&joined);
            self.add(mapping);
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn lookup(&self, method: &Method, request: &WebRequest) -> MatchResult<'_, E> {
        let mut allowed: Vec<Method> = Vec::new();
        let mut unsatisfied: Option<String> = None;

        for mapping in &self.mappings {
            let Some(variables) = mapping.pattern.matches(&request.path) else {
                continue;
            };
            if !mapping.headers.iter().all(|h| h.is_satisfied(request)) {
                continue;
            }
            if !mapping.allows_method(method) {
                for m in &mapping.methods {
                    if !allowed.contains(m) {
                        allowed.push(m.clone());
                    }
                }
                continue;
            }
            if !mapping.params.iter().all(|p| p.is_satisfied(&request.params)) {
                unsatisfied.get_or_insert_with(|| mapping.param_exprs.join(", "));
                continue;
            }
            return MatchResult::Matched(mapping, variables);
        }

        if let Some(conditions) = unsatisfied {
            MatchResult::ParamsNotSatisfied(conditions)
        } else if allowed.is_empty() {
            MatchResult::NotFound
        } else {
            MatchResult::MethodNotAllowed(allowed)
        }
    }
}

impl<E> Default for RouteTable<E> {
    fn default() -> Self {
        Self::new()
    }
}
