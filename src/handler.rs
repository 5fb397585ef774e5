//! # Handler shapes and dispatch.
//!
//! A handler has exactly one of three shapes, fixed when it is built:
//! nullary (receives nothing), unary (receives the first payload value),
//! variadic (receives the whole payload). [`Handler`] is a closed union
//! over those shapes — anything else simply cannot be constructed, so
//! shape validation lives in the type system instead of a runtime check.
//!
//! Each variant wraps a closure that produces a **fresh** future per
//! invocation, so one registered handler serves any number of emissions
//! without shared mutable state; if a handler needs shared state, capture
//! an `Arc<...>` explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use evoke::{Handler, HandlerShape, Value};
//!
//! let greet = Handler::unary(|value: Value| async move {
//!     println!("hello, {}", value.expect_ref::<String>());
//! });
//!
//! assert_eq!(greet.shape(), HandlerShape::Unary);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::EmitterError;
use crate::payload::{Payload, Value};

/// Boxed future produced by one handler invocation.
pub type BoxHandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type NullaryFn = dyn Fn() -> BoxHandlerFuture + Send + Sync;
type UnaryFn = dyn Fn(Value) -> BoxHandlerFuture + Send + Sync;
type VariadicFn = dyn Fn(Payload) -> BoxHandlerFuture + Send + Sync;

/// Shape of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerShape {
    /// Invoked with nothing, regardless of what was emitted.
    Nullary,
    /// Invoked with the first emitted value only.
    Unary,
    /// Invoked with the complete payload sequence.
    Variadic,
}

impl HandlerShape {
    /// Short lowercase name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerShape::Nullary => "nullary",
            HandlerShape::Unary => "unary",
            HandlerShape::Variadic => "variadic",
        }
    }
}

/// A registered event handler: one of the three accepted callable shapes.
///
/// Cloning shares the underlying closure, so the same handler value can be
/// registered on several events — or several times on one event, in which
/// case it fires once per registration.
#[derive(Clone)]
pub enum Handler {
    /// Zero-argument shape.
    Nullary(Arc<NullaryFn>),
    /// Single-argument shape.
    Unary(Arc<UnaryFn>),
    /// Full-payload shape.
    Variadic(Arc<VariadicFn>),
}

impl Handler {
    /// Builds a zero-argument handler.
    pub fn nullary<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::Nullary(Arc::new(move || -> BoxHandlerFuture { Box::pin(f()) }))
    }

    /// Builds a handler that receives the first payload value.
    ///
    /// Dispatching it against an empty payload is fatal for that
    /// invocation's task (see [`Emitter::emit`](crate::Emitter::emit)).
    pub fn unary<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::Unary(Arc::new(move |value| -> BoxHandlerFuture {
            Box::pin(f(value))
        }))
    }

    /// Builds a handler that receives the whole payload, in emission order.
    pub fn variadic<F, Fut>(f: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::Variadic(Arc::new(move |payload| -> BoxHandlerFuture {
            Box::pin(f(payload))
        }))
    }

    /// Shape fixed at construction time.
    #[must_use]
    pub fn shape(&self) -> HandlerShape {
        match self {
            Handler::Nullary(_) => HandlerShape::Nullary,
            Handler::Unary(_) => HandlerShape::Unary,
            Handler::Variadic(_) => HandlerShape::Variadic,
        }
    }

    /// Builds the invocation future for one dispatch.
    ///
    /// Called inside the spawned task, so that a payload-contract violation
    /// aborts that task alone and never the emitting caller.
    ///
    /// # Panics
    /// With [`EmitterError::MissingPayload`] if a unary handler faces an
    /// empty payload.
    pub(crate) fn invoke(&self, event: &str, payload: Payload) -> BoxHandlerFuture {
        match self {
            Handler::Nullary(f) => f(),
            Handler::Unary(f) => {
                let Some(first) = payload.first() else {
                    panic!(
                        "{}",
                        EmitterError::MissingPayload {
                            event: event.to_string(),
                        }
                    );
                };
                f(first.clone())
            }
            Handler::Variadic(f) => f(payload),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.shape().as_str()).finish()
    }
}
