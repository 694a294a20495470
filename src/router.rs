//! Radix-tree request router.
//!
//! One tree per HTTP method, plus an optional fallback that catches every
//! path no tree claims. A path registered under some methods but requested
//! with another gets `405` instead of falling through.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The application router. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

/// Outcome of routing one request.
pub(crate) enum Lookup {
    Found(BoxedHandler),
    /// The path exists under other methods; carries the `allow` header value.
    MethodNotAllowed(String),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), fallback: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Handler for every request whose path matches no route.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Lookup {
        if let Some(found) = self.find(method, path) {
            return found;
        }
        // HEAD is answered by GET routes; hyper drops the body.
        if *method == Method::HEAD {
            if let Some(found) = self.find(&Method::GET, path) {
                return found;
            }
        }

        let mut allowed: Vec<&str> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.as_str())
            .collect();
        if !allowed.is_empty() {
            allowed.sort_unstable();
            return Lookup::MethodNotAllowed(allowed.join(", "));
        }

        match &self.fallback {
            Some(handler) => Lookup::Found(Arc::clone(handler)),
            None => Lookup::NotFound,
        }
    }

    fn find(&self, method: &Method, path: &str) -> Option<Lookup> {
        let matched = self.routes.get(method)?.at(path).ok()?;
        Some(Lookup::Found(Arc::clone(matched.value)))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
