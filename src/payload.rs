//! # Opaque payload values carried by an emission.
//!
//! An emission carries an ordered sequence of heterogeneous values. The
//! emitter never looks inside them: each element is a [`Value`] — a cheaply
//! cloneable, type-erased handle — and handlers downcast to the concrete
//! types they expect by contract with the emitting side. [`Payload`] is the
//! shared, immutable sequence handed to every handler task of one emission.
//!
//! ## Example
//! ```rust
//! use evoke::{Payload, Value};
//!
//! let payload = Payload::from(vec![Value::new("ping".to_string()), Value::new(42_u32)]);
//!
//! assert_eq!(payload.len(), 2);
//! assert_eq!(payload.first().unwrap().downcast_ref::<String>().unwrap(), "ping");
//! assert_eq!(payload.get(1).unwrap().downcast_ref::<u32>(), Some(&42));
//! assert_eq!(payload.get(1).unwrap().downcast_ref::<String>(), None);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single type-erased payload element.
///
/// Cloning is cheap (reference-count bump); the wrapped value itself is
/// shared and never mutated.
#[derive(Clone)]
pub struct Value(Arc<dyn Any + Send + Sync>);

impl Value {
    /// Wraps a concrete value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the wrapped value as `T`, or `None` if the concrete type differs.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Borrows the wrapped value as `T`, aborting the current task if the
    /// concrete type differs.
    ///
    /// This is the handler-author escape hatch for payloads whose shape is
    /// fixed by contract with the emitting side: a mismatch is a bug in one
    /// of the two, not a condition the handler can recover from.
    ///
    /// # Panics
    /// If the wrapped value is not a `T`.
    #[must_use]
    pub fn expect_ref<T: Any>(&self) -> &T {
        match self.downcast_ref::<T>() {
            Some(value) => value,
            None => panic!("payload value is not a {}", std::any::type_name::<T>()),
        }
    }

    /// True if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Value(..)")
    }
}

/// The ordered payload of one emission, shared by all of its handler tasks.
///
/// Values are delivered in their original order, unmodified. Cloning shares
/// the underlying slice.
#[derive(Clone, Debug)]
pub struct Payload(Arc<[Value]>);

impl Payload {
    /// A payload carrying no values.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// The first value, if any. Unary handlers receive exactly this element.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.0.first()
    }

    /// The value at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the emission carried no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the values in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Value>> for Payload {
    fn from(values: Vec<Value>) -> Self {
        Self(values.into())
    }
}

impl FromIterator<Value> for Payload {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
