//! View resolution
//!
//! Logical view names go through an ordered resolver chain. A `redirect:` prefix
//! short-circuits the chain and becomes an HTTP redirect.

mod templates;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::WebError;
use crate::model::Model;

pub use templates::{HelloView, TemplateViewResolver};

const REDIRECT_PREFIX: &str = "redirect:";

/// Something that renders a model into an HTML page
pub trait View: Send + Sync {
    /// `model` is the request scope, `session` the session scope
    fn render(&self, model: &Model, session: &Model) -> Result<String, WebError>;
}

/// Maps a logical view name to a view, or passes
pub trait ViewResolver: Send + Sync {
    fn resolve_view_name(&self, name: &str) -> Option<Arc<dyn View>>;
}

/// Result of resolving a logical view name
pub enum Resolved {
    Redirect(String),
    Render(Arc<dyn View>),
}

/// Resolves views registered under a bean name (e.g. `helloView`)
#[derive(Default)]
pub struct BeanNameViewResolver {
    views: HashMap<String, Arc<dyn View>>,
}

impl BeanNameViewResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, name: &str, view: impl View + 'static) -> Self {
        self.views.insert(name.to_string(), Arc::new(view));
        self
    }
}

impl ViewResolver for BeanNameViewResolver {
    fn resolve_view_name(&self, name: &str) -> Option<Arc<dyn View>> {
        self.views.get(name).cloned()
    }
}

/// Resolvers consulted in ascending `order`
#[derive(Default)]
pub struct ViewResolverChain {
    resolvers: Vec<(i32, Box<dyn ViewResolver>)>,
}

impl ViewResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, order: i32, resolver: impl ViewResolver + 'static) -> Self {
        self.resolvers.push((order, Box::new(resolver)));
        self.resolvers.sort_by_key(|(order, _)| *order);
        self
    }

    /// Bean-name views first, then the built-in templates
    pub fn standard() -> Self {
        Self::new()
            .with(100, BeanNameViewResolver::new().register("helloView", HelloView))
            .with(i32::MAX, TemplateViewResolver::standard())
    }

    pub fn resolve(&self, name: &str) -> Result<Resolved, WebError> {
        if let Some(target) = name.strip_prefix(REDIRECT_PREFIX) {
            return Ok(Resolved::Redirect(target.to_string()));
        }

        self.resolvers
            .iter()
            .find_map(|(_, resolver)| resolver.resolve_view_name(name))
            .map(Resolved::Render)
            .ok_or_else(|| WebError::UnknownView(name.to_string()))
    }
}

/// Escape text for HTML element and attribute content
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Display form of a model value: strings bare, everything else as JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl View for Fixed {
        fn render(&self, _model: &Model, _session: &Model) -> Result<String, WebError> {
            Ok(self.0.to_string())
        }
    }

    fn render(resolved: Resolved) -> String {
        match resolved {
            Resolved::Render(view) => view.render(&Model::new(), &Model::new()).unwrap(),
            Resolved::Redirect(target) => format!("redirect to {target}"),
        }
    }

    #[test]
    fn test_redirect_prefix() {
        let chain = ViewResolverChain::standard();
        assert_eq!(render(chain.resolve("redirect:/emps").unwrap()), "redirect to /emps");
    }

    #[test]
    fn test_chain_order() {
        let chain = ViewResolverChain::new()
            .with(10, BeanNameViewResolver::new().register("success", Fixed("late")))
            .with(1, BeanNameViewResolver::new().register("success", Fixed("early")));
        assert_eq!(render(chain.resolve("success").unwrap()), "early");
    }

    #[test]
    fn test_unknown_view() {
        let chain = ViewResolverChain::standard();
        assert!(matches!(
            chain.resolve("nope"),
            Err(WebError::UnknownView(ref n)) if n == "nope"
        ));
    }

    #[test]
    fn test_bean_view_resolved_before_templates() {
        let chain = ViewResolverChain::standard();
        let page = render(chain.resolve("helloView").unwrap());
        assert!(page.contains("Hello View"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }
}
