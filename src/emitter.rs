//! # The emitter: registration bookkeeping and concurrent dispatch.
//!
//! [`Emitter`] maps composite `(mode, event name)` keys to ordered handler
//! sequences. Registration appends under the key; emission snapshots the
//! matching sequences, schedules one task per handler, and removes the
//! `Once` entry at schedule time.
//!
//! ## Dispatch
//! ```text
//! emit("X", payload)
//!   │  write-lock: snapshot ON:"X" (clone), take ONCE:"X" (entry removed)
//!   ▼
//!   ├─► spawn handler #1 ─┐
//!   ├─► spawn handler #2 ─┼─► each task: invoke, catch panic,
//!   └─► spawn handler #N ─┘   release its completion guard
//!   │
//!   └─► returns Completion ─► done.wait().await
//! ```
//!
//! ## Rules
//! - Submission order: registration order within one key's sequence, `ON`
//!   batch before `ONCE` batch. Completion order: unspecified.
//! - The snapshot is taken at schedule time: handlers registered during an
//!   in-flight emission of the same event join the next emission only.
//! - `ONCE` removal happens at schedule time, so an overlapping emission of
//!   the same event cannot re-trigger those handlers, while later `once`
//!   registrations for the same name fire on a future emission.
//! - A handler panic is caught and logged; it aborts that task alone and
//!   still releases its completion guard.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use tracing::{debug, error, trace};

use crate::completion::Completion;
use crate::handler::Handler;
use crate::mode::Mode;
use crate::payload::Payload;

/// Composite key for one handler sequence: registration mode + event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    mode: Mode,
    event: Arc<str>,
}

impl Key {
    fn new(mode: Mode, event: &str) -> Self {
        Self {
            mode,
            event: Arc::from(event),
        }
    }
}

/// In-process publish/subscribe emitter.
///
/// Registration and emission may be called concurrently from any number of
/// tasks; the handler map is guarded by a lock held only for bookkeeping,
/// never across handler execution. The emitter is the sole owner of its
/// handler sequences — share the emitter itself (typically behind an
/// [`Arc`]) rather than its internals.
///
/// ## Example
/// ```rust
/// use evoke::{Emitter, Handler, Value};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let emitter = Emitter::new();
///     emitter.on("greeting", Handler::unary(|value: Value| async move {
///         println!("hello, {}", value.expect_ref::<String>());
///     }));
///
///     let done = emitter.emit("greeting", vec![Value::new("world".to_string())]);
///     done.wait().await;
/// }
/// ```
#[derive(Debug, Default)]
pub struct Emitter {
    handlers: RwLock<HashMap<Key, Vec<Handler>>>,
}

impl Emitter {
    /// Creates an emitter with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that fires every time `event` is emitted.
    ///
    /// Passing `None` is a silent no-op. There is no deduplication: the
    /// same handler registered twice fires twice per emission.
    pub fn on(&self, event: &str, handler: impl Into<Option<Handler>>) {
        self.register(Mode::On, event, handler.into());
    }

    /// Registers a handler that fires on the next emission of `event` only.
    ///
    /// All `once` handlers for an event are discarded together when that
    /// emission is scheduled. Passing `None` is a silent no-op.
    pub fn once(&self, event: &str, handler: impl Into<Option<Handler>>) {
        self.register(Mode::Once, event, handler.into());
    }

    /// Registers a handler under a mode given in string form.
    ///
    /// `mode` is matched case-insensitively against `"ON"` and `"ONCE"`;
    /// [`Emitter::on`] and [`Emitter::once`] are the typed shorthands.
    ///
    /// # Panics
    /// On any other mode string. An unknown mode is a caller bug — there is
    /// no error return channel on the registration path.
    pub fn add_listener(&self, mode: &str, event: &str, handler: impl Into<Option<Handler>>) {
        let mode = Mode::from_str(mode).unwrap_or_else(|err| panic!("{err}"));
        self.register(mode, event, handler.into());
    }

    /// Emits `event`, scheduling every matching handler as its own task.
    ///
    /// Never blocks: handlers run concurrently on the tokio runtime, and
    /// the returned [`Completion`] resolves once all of them have finished.
    /// With no matching registration this is a well-defined no-op and the
    /// handle resolves immediately.
    ///
    /// Payload contract per handler shape:
    /// - nullary: receives nothing, however many values were emitted;
    /// - unary: receives exactly the first value — an empty payload is
    ///   fatal for that handler's task at dispatch time;
    /// - variadic: receives the whole payload, in original order.
    ///
    /// Must be called within a tokio runtime context.
    pub fn emit(&self, event: &str, payload: impl Into<Payload>) -> Completion {
        let payload = payload.into();
        let completion = Completion::new();

        // One lock pass covers both the ON snapshot and the ONCE take, so
        // overlapping emissions of the same event observe the map in a
        // single consistent state.
        let batches: Vec<(Mode, Vec<Handler>)> = {
            let mut handlers = self.write_handlers();
            Mode::DISPATCH_ORDER
                .iter()
                .filter_map(|&mode| {
                    let key = Key::new(mode, event);
                    let batch = match mode {
                        Mode::On => handlers.get(&key).cloned(),
                        Mode::Once => handlers.remove(&key),
                    };
                    batch.map(|batch| (mode, batch))
                })
                .collect()
        };

        let event: Arc<str> = Arc::from(event);
        let mut scheduled = 0_usize;
        for (mode, batch) in batches {
            for handler in batch {
                scheduled += 1;
                self.spawn_handler(&event, mode, handler, payload.clone(), &completion);
            }
        }
        trace!(event = event.as_ref(), scheduled, "emission scheduled");

        completion
    }

    /// Number of handlers currently registered under `mode` for `event`.
    #[must_use]
    pub fn listener_count(&self, mode: Mode, event: &str) -> usize {
        self.read_handlers()
            .get(&Key::new(mode, event))
            .map_or(0, Vec::len)
    }

    /// True if any handler, under either mode, is registered for `event`.
    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        Mode::DISPATCH_ORDER
            .iter()
            .any(|&mode| self.listener_count(mode, event) > 0)
    }

    /// True if no handler is registered for any event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_handlers().is_empty()
    }

    fn register(&self, mode: Mode, event: &str, handler: Option<Handler>) {
        let Some(handler) = handler else {
            trace!(%mode, event, "skipped registration of absent handler");
            return;
        };

        let shape = handler.shape();
        let mut handlers = self.write_handlers();
        let sequence = handlers.entry(Key::new(mode, event)).or_default();
        sequence.push(handler);
        debug!(
            %mode,
            event,
            shape = shape.as_str(),
            listeners = sequence.len(),
            "handler registered"
        );
    }

    /// Runs one handler as an independent unit of work.
    ///
    /// The completion guard is released on every exit path; a panic inside
    /// the handler, including a payload-contract violation raised at
    /// dispatch, is caught and logged so the emission's waiter is never
    /// stranded and sibling tasks are unaffected.
    fn spawn_handler(
        &self,
        event: &Arc<str>,
        mode: Mode,
        handler: Handler,
        payload: Payload,
        completion: &Completion,
    ) {
        let guard = completion.guard();
        let event = Arc::clone(event);
        tokio::spawn(async move {
            let _guard = guard;
            let invocation = std::panic::AssertUnwindSafe(async {
                handler.invoke(&event, payload).await;
            });
            if let Err(panic_err) = invocation.catch_unwind().await {
                let reason = panic_err
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_err.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(
                    event = event.as_ref(),
                    %mode,
                    shape = handler.shape().as_str(),
                    %reason,
                    "handler panicked"
                );
            }
        });
    }

    fn read_handlers(&self) -> RwLockReadGuard<'_, HashMap<Key, Vec<Handler>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_handlers(&self) -> RwLockWriteGuard<'_, HashMap<Key, Vec<Handler>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Value;

    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::{Barrier, watch};
    use tokio::time::timeout;

    /// Nullary handler bumping a shared counter.
    fn counting_handler(hits: &Arc<AtomicUsize>) -> Handler {
        let hits = hits.clone();
        Handler::nullary(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    async fn wait_done(completion: &Completion) {
        timeout(Duration::from_secs(5), completion.wait())
            .await
            .expect("emission did not complete in time");
    }

    #[tokio::test]
    async fn test_emit_without_listeners_is_a_noop() {
        let emitter = Emitter::new();
        let done = emitter.emit("ghost", Payload::empty());
        assert_eq!(done.pending(), 0);
        assert!(done.is_complete());
        wait_done(&done).await;
    }

    #[tokio::test]
    async fn test_on_fires_every_emission() {
        let emitter = Emitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        emitter.on("tick", counting_handler(&hits));

        for _ in 0..3 {
            wait_done(&emitter.emit("tick", Payload::empty())).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(emitter.listener_count(Mode::On, "tick"), 1);
    }

    #[tokio::test]
    async fn test_once_fires_exactly_once() {
        let emitter = Emitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        emitter.once("boot", counting_handler(&hits));
        assert_eq!(emitter.listener_count(Mode::Once, "boot"), 1);

        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(Mode::Once, "boot"), 0);

        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_once_batch_is_discarded_together() {
        let emitter = Emitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        emitter.once("boot", counting_handler(&hits));
        emitter.once("boot", counting_handler(&hits));

        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_once_registered_after_emission_fires_next_time() {
        let emitter = Emitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        emitter.once("boot", counting_handler(&hits));
        wait_done(&emitter.emit("boot", Payload::empty())).await;

        emitter.once("boot", counting_handler(&hits));
        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_absent_handler_registration_is_a_noop() {
        let emitter = Emitter::new();
        emitter.on("tick", None);
        emitter.once("tick", None);
        emitter.add_listener("once", "tick", None);

        assert!(emitter.is_empty());
        assert!(!emitter.has_listeners("tick"));
        let done = emitter.emit("tick", Payload::empty());
        assert!(done.is_complete());
    }

    #[tokio::test]
    async fn test_modes_track_independent_sequences() {
        let emitter = Emitter::new();
        let on_hits = Arc::new(AtomicUsize::new(0));
        let once_hits = Arc::new(AtomicUsize::new(0));
        emitter.on("sync", counting_handler(&on_hits));
        emitter.once("sync", counting_handler(&once_hits));

        assert_eq!(emitter.listener_count(Mode::On, "sync"), 1);
        assert_eq!(emitter.listener_count(Mode::Once, "sync"), 1);

        wait_done(&emitter.emit("sync", Payload::empty())).await;
        wait_done(&emitter.emit("sync", Payload::empty())).await;

        assert_eq!(on_hits.load(Ordering::SeqCst), 2);
        assert_eq!(once_hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(Mode::On, "sync"), 1);
        assert_eq!(emitter.listener_count(Mode::Once, "sync"), 0);
    }

    #[tokio::test]
    async fn test_duplicate_registration_fires_twice() {
        let emitter = Emitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&hits);
        emitter.on("tick", handler.clone());
        emitter.on("tick", handler);

        wait_done(&emitter.emit("tick", Payload::empty())).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mixed_shapes_receive_their_payload_views() {
        let emitter = Emitter::new();

        let nullary_hits = Arc::new(AtomicUsize::new(0));
        emitter.on("greet", counting_handler(&nullary_hits));

        let variadic_seen = Arc::new(Mutex::new(Vec::new()));
        emitter.on("greet", {
            let seen = variadic_seen.clone();
            Handler::variadic(move |payload: Payload| {
                let seen = seen.clone();
                async move {
                    let message = payload.first().unwrap().expect_ref::<String>().clone();
                    let error = payload.get(1).unwrap().expect_ref::<io::Error>().to_string();
                    seen.lock().unwrap().push(format!("{message}/{error}"));
                }
            })
        });

        let unary_seen = Arc::new(Mutex::new(Vec::new()));
        emitter.once("greet", {
            let seen = unary_seen.clone();
            Handler::unary(move |value: Value| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(value.expect_ref::<String>().clone());
                }
            })
        });

        let payload = Payload::from(vec![
            Value::new("msg".to_string()),
            Value::new(io::Error::other("err")),
        ]);

        wait_done(&emitter.emit("greet", payload.clone())).await;
        assert_eq!(nullary_hits.load(Ordering::SeqCst), 1);
        assert_eq!(*variadic_seen.lock().unwrap(), vec!["msg/err".to_string()]);
        assert_eq!(*unary_seen.lock().unwrap(), vec!["msg".to_string()]);

        // Second emission: the once handler is gone, the on handlers repeat.
        wait_done(&emitter.emit("greet", payload)).await;
        assert_eq!(nullary_hits.load(Ordering::SeqCst), 2);
        assert_eq!(variadic_seen.lock().unwrap().len(), 2);
        assert_eq!(unary_seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unary_empty_payload_aborts_only_its_own_task() {
        let emitter = Emitter::new();

        let unary_ran = Arc::new(AtomicBool::new(false));
        emitter.on("lonely", {
            let ran = unary_ran.clone();
            Handler::unary(move |_: Value| {
                let ran = ran.clone();
                async move {
                    ran.store(true, Ordering::SeqCst);
                }
            })
        });

        let sibling_hits = Arc::new(AtomicUsize::new(0));
        emitter.on("lonely", counting_handler(&sibling_hits));

        let done = emitter.emit("lonely", Payload::empty());
        wait_done(&done).await;

        assert!(!unary_ran.load(Ordering::SeqCst));
        assert_eq!(sibling_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_never_strands_the_waiter() {
        let emitter = Emitter::new();
        emitter.on(
            "risky",
            Handler::nullary(|| async { panic!("handler blew up") }),
        );
        let sibling_hits = Arc::new(AtomicUsize::new(0));
        emitter.on("risky", counting_handler(&sibling_hits));

        wait_done(&emitter.emit("risky", Payload::empty())).await;
        assert_eq!(sibling_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_emission_handlers_run_concurrently() {
        let emitter = Emitter::new();
        let barrier = Arc::new(Barrier::new(2));

        for _ in 0..2 {
            let barrier = barrier.clone();
            emitter.on(
                "rendezvous",
                Handler::nullary(move || {
                    let barrier = barrier.clone();
                    async move {
                        // Deadlocks unless both handlers of this emission
                        // are in flight at the same time.
                        barrier.wait().await;
                    }
                }),
            );
        }

        wait_done(&emitter.emit("rendezvous", Payload::empty())).await;
    }

    #[tokio::test]
    async fn test_overlapping_emissions_run_side_by_side() {
        let emitter = Emitter::new();
        let (release, gate) = watch::channel(false);
        let hits = Arc::new(AtomicUsize::new(0));

        emitter.on("busy", {
            let hits = hits.clone();
            Handler::nullary(move || {
                let mut gate = gate.clone();
                let hits = hits.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    hits.fetch_add(1, Ordering::SeqCst);
                }
            })
        });

        let first = emitter.emit("busy", Payload::empty());
        let second = emitter.emit("busy", Payload::empty());
        tokio::task::yield_now().await;
        assert_eq!(first.pending(), 1);
        assert_eq!(second.pending(), 1);

        release.send(true).expect("gate receivers are alive");
        wait_done(&first).await;
        wait_done(&second).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_registration_during_emission_joins_the_next_one() {
        let emitter = Arc::new(Emitter::new());
        let late_hits = Arc::new(AtomicUsize::new(0));

        emitter.on("boot", {
            let emitter = emitter.clone();
            let late_hits = late_hits.clone();
            Handler::nullary(move || {
                let emitter = emitter.clone();
                let late_hits = late_hits.clone();
                async move {
                    emitter.on("boot", counting_handler(&late_hits));
                }
            })
        });

        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        wait_done(&emitter.emit("boot", Payload::empty())).await;
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_listener_parses_mode_case_insensitively() {
        let emitter = Emitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        emitter.add_listener("on", "tick", counting_handler(&hits));
        emitter.add_listener("ONCE", "tick", counting_handler(&hits));
        emitter.add_listener("OnCe", "tick", counting_handler(&hits));

        assert_eq!(emitter.listener_count(Mode::On, "tick"), 1);
        assert_eq!(emitter.listener_count(Mode::Once, "tick"), 2);
    }

    #[test]
    #[should_panic(expected = "invalid emit type: sometimes")]
    fn test_add_listener_rejects_unknown_mode() {
        let emitter = Emitter::new();
        emitter.add_listener("sometimes", "tick", Handler::nullary(|| async {}));
    }

    #[tokio::test]
    async fn test_listener_introspection() {
        let emitter = Emitter::new();
        assert!(emitter.is_empty());
        assert!(!emitter.has_listeners("tick"));

        emitter.once("tick", Handler::nullary(|| async {}));
        assert!(!emitter.is_empty());
        assert!(emitter.has_listeners("tick"));
        assert!(!emitter.has_listeners("tock"));

        wait_done(&emitter.emit("tick", Payload::empty())).await;
        assert!(!emitter.has_listeners("tick"));
        assert!(emitter.is_empty());
    }
}
