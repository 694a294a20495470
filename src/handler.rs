//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of many concrete types (plain `async fn`s,
//! closures capturing an `Arc<Site>`, middleware wrappers) in one table.
//! A collection holds one type, so every handler is hidden behind the
//! [`DynHandler`] trait object:
//!
//! ```text
//! move |req| async move { … }          closure capturing shared state
//!        ↓ Router::on(Method::POST, "/upload", closure)
//! closure.into_boxed_handler()          blanket impl below
//!        ↓
//! Arc<HandlerFn<closure>>               stored as BoxedHandler
//!        ↓
//! handler.respond(req)                  one dynamic call per request
//! ```
//!
//! # Checks before the body
//!
//! The server buffers a request body before the handler runs. Some answers
//! do not need it: a wrong bearer token can be refused from the headers
//! alone. [`DynHandler::admit`] runs first, on the request head, and a
//! handler built with [`Guarded`] turns requests away there, before a single
//! body byte is read.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::request::Parts;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// Boxed future produced by every stored handler.
///
/// Pinned because the runtime polls it in place; `Send + 'static` so tokio
/// can move it between worker threads.
#[doc(hidden)]
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe face of a handler.
///
/// Public only because it appears in [`Handler::into_boxed_handler`]'s
/// signature.
#[doc(hidden)]
pub trait DynHandler {
    /// Looks at the request head before the body is collected. `Some` is
    /// the final answer and the body is never read.
    fn admit(&self, _head: &Parts) -> Option<Response> {
        None
    }

    fn respond(&self, req: Request) -> BoxFuture;
}

/// Shared, type-erased handler. One `Arc` clone per request.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn DynHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Anything that can answer a route.
///
/// Satisfied automatically by `Fn(Request) -> impl Future<Output = impl
/// IntoResponse>`:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// move |req: Request| async move { … }
/// ```
///
/// Sealed: the blanket impl and the crate's own wrappers are the only
/// implementations.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(HandlerFn(self))
    }
}

/// Bridges a concrete `F` to the trait-object world.
struct HandlerFn<F>(F);

impl<F, Fut, R> DynHandler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn respond(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Guarded ───────────────────────────────────────────────────────────────────

/// A handler behind a head-only check.
///
/// `guard` returns `Some(response)` to refuse. It runs once from
/// [`DynHandler::admit`], before the server reads the body, and again in
/// [`DynHandler::respond`] so the check holds when this handler is itself
/// wrapped by another one that only forwards `respond`.
pub(crate) struct Guarded<G> {
    guard: G,
    inner: BoxedHandler,
}

impl<G> Guarded<G>
where
    G: Fn(&Parts) -> Option<Response> + Send + Sync + 'static,
{
    pub(crate) fn new(guard: G, inner: impl Handler) -> Self {
        Self { guard, inner: inner.into_boxed_handler() }
    }
}

impl<G> private::Sealed for Guarded<G> where G: Fn(&Parts) -> Option<Response> + Send + Sync + 'static {}

impl<G> Handler for Guarded<G>
where
    G: Fn(&Parts) -> Option<Response> + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl<G> DynHandler for Guarded<G>
where
    G: Fn(&Parts) -> Option<Response> + Send + Sync + 'static,
{
    fn admit(&self, head: &Parts) -> Option<Response> {
        (self.guard)(head).or_else(|| self.inner.admit(head))
    }

    fn respond(&self, req: Request) -> BoxFuture {
        match (self.guard)(req.head()) {
            Some(refused) => Box::pin(async move { refused }),
            None => self.inner.respond(req),
        }
    }
}
