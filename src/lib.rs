//! # evoke
//!
//! **Evoke** is a lightweight in-process event emitter for Rust.
//!
//! Callers register handlers against named events and trigger them with
//! [`Emitter::emit`]; every matching handler runs concurrently as its own
//! task, and the returned [`Completion`] lets the caller wait for the
//! whole batch to finish — or walk away and let it run detached.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  on("X", h)      once("X", h)      add_listener("ON", "X", h)
//!      └────────────────┼────────────────────┘
//!                       ▼
//! ┌─────────────────────────────────────────────────┐
//! │  Emitter                                        │
//! │  handlers: (Mode, event name) → [Handler, ...]  │
//! │  (lock-guarded registration / snapshot)         │
//! └────────────────────────┬────────────────────────┘
//!                          │ emit("X", payload)
//!       snapshot ON:"X", take ONCE:"X" (entry removed)
//!                          ▼
//!        ┌────────────────┼────────────────┐
//!        ▼                ▼                ▼
//!    task: h1         task: h2         task: h3
//!    (nullary)        (unary)          (variadic)
//!    no payload       payload[0]       whole payload
//!        └────────────────┼────────────────┘
//!                         ▼  each task releases a guard on exit
//!                  Completion (outstanding-task counter)
//!                         ▼
//!                  done.wait().await
//! ```
//!
//! ### Handler shapes
//! A handler has exactly one of three shapes, fixed when it is built:
//!
//! | Shape | Built with | Receives |
//! |-------|------------|----------|
//! | Nullary | [`Handler::nullary`] | nothing, regardless of the payload |
//! | Unary | [`Handler::unary`] | the first payload [`Value`] |
//! | Variadic | [`Handler::variadic`] | the whole [`Payload`], in order |
//!
//! ## Guarantees (and non-guarantees)
//! - Handlers are **scheduled** in registration order, `on` batch before
//!   `once` batch, but **complete** in no particular order.
//! - `once` handlers fire on the next emission of their event only; the
//!   whole `once` batch for an event is discarded at schedule time.
//! - Registration and emission may race freely on a shared emitter; an
//!   emission dispatches the snapshot it took, never handlers added while
//!   it was in flight.
//! - A panicking handler aborts only its own task; the emission's
//!   [`Completion`] still resolves for any waiter.
//! - No persistence, no replay, no cross-event ordering, no backpressure:
//!   emission is fire-and-collect, not a message bus.
//!
//! ## Fatal paths
//! Contract violations abort the offending flow instead of returning an
//! error (see [`EmitterError`]): an unknown mode string passed to
//! [`Emitter::add_listener`] panics the caller, and a unary handler
//! dispatched against an empty payload aborts that handler's task.
//!
//! ## Example
//! ```rust
//! use evoke::{Emitter, Handler, Payload, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let emitter = Emitter::new();
//!
//!     emitter.on("greeting", Handler::nullary(|| async {
//!         println!("someone was greeted");
//!     }));
//!     emitter.once("greeting", Handler::variadic(|payload: Payload| async move {
//!         println!("first greeting carried {} values", payload.len());
//!     }));
//!
//!     let done = emitter.emit("greeting", vec![Value::new("world".to_string())]);
//!     done.wait().await;
//! }
//! ```

mod completion;
mod emitter;
mod error;
mod handler;
mod mode;
mod payload;

// ---- Public re-exports ----

pub use completion::Completion;
pub use emitter::Emitter;
pub use error::EmitterError;
pub use handler::{BoxHandlerFuture, Handler, HandlerShape};
pub use mode::Mode;
pub use payload::{Payload, Value};
