//! Change events.

use super::{Container, ReactiveContainer};
use crate::value::Value;
use std::rc::Rc;

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Event callback. Runs synchronously at the point of emission.
pub type Handler = Rc<dyn Fn(&ChangeEvent)>;

/// Build a [`Handler`] from a closure.
pub fn handler(f: impl Fn(&ChangeEvent) + 'static) -> Handler {
    Rc::new(f)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A value changed (own key, or the whole container on init).
    Changed,
    /// A map key was defined.
    Defined,
    /// List items were inserted; `indices` are their final positions.
    Added { values: Vec<Value>, indices: Vec<usize> },
    /// List items were removed; `indices` are their positions before removal.
    Removed { values: Vec<Value>, indices: Vec<usize> },
    /// List items changed position; `indices` are their new positions.
    Moved { values: Vec<Value>, indices: Vec<usize> },
    Destroyed,
}

/// One notification.
///
/// `source` is the container that mutated, `path` the own key it mutated
/// (`None` for whole-container events). Ancestors re-emit the same event
/// unchanged, so a subscriber on a parent sees the child as `source`.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub source: Container,
    pub path: Option<String>,
    pub kind: EventKind,
}

impl ChangeEvent {
    pub fn is_whole_container(&self) -> bool {
        self.path.is_none()
    }

    pub fn is_from(&self, container: &dyn ReactiveContainer) -> bool {
        self.source.id() == container.id()
    }

    /// Whether this is a plain value change of `key`.
    pub fn touches(&self, key: &str) -> bool {
        self.kind == EventKind::Changed && self.path.as_deref() == Some(key)
    }
}
