//! Reactive containers.
//!
//! Three variants share one contract, [`ReactiveContainer`]:
//!
//! - [`MapContainer`] ("data"): string keys, extensible through `define`,
//!   optional bottom layer for keys it does not own.
//! - [`StructContainer`]: fixed keys declared at construction.
//! - [`ListContainer`]: positional slots sharing one item definition.
//!
//! Every container starts uninitialized. `init` runs once and hands back a
//! [`PrivilegedSetter`], the only way to write readonly keys afterwards.
//! Mutations emit [`ChangeEvent`]s synchronously; events bubble up the
//! ownership chain (parent links are weak, ownership flows parent → child).

mod event;
mod link;
mod list;
mod map;
mod structure;

pub use event::{handler, ChangeEvent, EventKind, Handler, SubscriptionId};
pub use link::LinkId;
pub use list::ListContainer;
pub use map::{MapContainer, DEFAULT_DEFINITION_KEY};
pub use structure::StructContainer;

use crate::value::{Object, Value};
use link::Link;
use list::ListState;
use map::MapState;
use sprog_types::path::{join_path, parse_index, split_path};
use sprog_types::{Result, SprogError};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use structure::StructState;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Data,
    Struct,
    List,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Data => write!(f, "data"),
            ContainerKind::Struct => write!(f, "struct"),
            ContainerKind::List => write!(f, "list"),
        }
    }
}

/// State every variant carries: identity, lifecycle, ownership,
/// subscribers and links.
pub struct Core {
    id: u64,
    kind: ContainerKind,
    initialized: bool,
    destroyed: bool,
    owner: Option<Owner>,
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_subscription: u64,
    links: Vec<Link>,
    adopts: bool,
}

struct Owner {
    parent: WeakContainer,
    parent_id: u64,
    path: String,
}

impl Core {
    fn new(kind: ContainerKind) -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            initialized: false,
            destroyed: false,
            owner: None,
            subscribers: Vec::new(),
            next_subscription: 1,
            links: Vec::new(),
            adopts: true,
        }
    }

    fn label(&self) -> String {
        format!("{}#{}", self.kind, self.id)
    }
}

/// Shared allocation behind a container handle.
pub(crate) struct Node<S> {
    core: RefCell<Core>,
    state: RefCell<S>,
}

impl<S> Node<S> {
    fn new(kind: ContainerKind, state: S) -> Rc<Self> {
        Rc::new(Self {
            core: RefCell::new(Core::new(kind)),
            state: RefCell::new(state),
        })
    }
}

/// Capability to write a readonly key. Only this crate can mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeToken(());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Honors readonly flags.
    Public,
    /// Bypasses readonly flags; obtained through [`PrivilegedSetter`].
    Privileged(PrivilegeToken),
}

impl WriteMode {
    pub fn is_privileged(self) -> bool {
        matches!(self, WriteMode::Privileged(_))
    }

    pub(crate) fn privileged() -> Self {
        WriteMode::Privileged(PrivilegeToken(()))
    }
}

/// Returned by `init`: writes own keys regardless of their readonly flag.
/// Type, nullability and structural checks still apply, and every write
/// still emits a change event.
///
/// Privilege does not cross layers. A key held only by a bottom layer is
/// written there as a public write; use that layer's own setter instead.
#[derive(Debug, Clone)]
pub struct PrivilegedSetter {
    target: Container,
}

impl PrivilegedSetter {
    pub(crate) fn new(target: Container) -> Self {
        Self { target }
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.target
            .set_own_value(key, value.into(), WriteMode::privileged())
    }

    pub fn target(&self) -> &Container {
        &self.target
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Handles
// ══════════════════════════════════════════════════════════════════════════

/// Any container variant.
#[derive(Clone)]
pub enum Container {
    Data(MapContainer),
    Struct(StructContainer),
    List(ListContainer),
}

impl Container {
    pub fn downgrade(&self) -> WeakContainer {
        match self {
            Container::Data(map) => WeakContainer(WeakNode::Data(Rc::downgrade(&map.node))),
            Container::Struct(st) => WeakContainer(WeakNode::Struct(Rc::downgrade(&st.node))),
            Container::List(list) => WeakContainer(WeakNode::List(Rc::downgrade(&list.node))),
        }
    }

    pub fn as_map(&self) -> Option<&MapContainer> {
        match self {
            Container::Data(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructContainer> {
        match self {
            Container::Struct(st) => Some(st),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListContainer> {
        match self {
            Container::List(list) => Some(list),
            _ => None,
        }
    }

    /// Whether this is a map with a bottom layer.
    pub fn is_layered(&self) -> bool {
        self.as_map().is_some_and(|map| map.bottom_layer().is_some())
    }

    fn inner(&self) -> &dyn ReactiveContainer {
        match self {
            Container::Data(map) => map,
            Container::Struct(st) => st,
            Container::List(list) => list,
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner_debug(), f)
    }
}

impl Container {
    fn inner_debug(&self) -> &dyn fmt::Debug {
        match self {
            Container::Data(map) => map,
            Container::Struct(st) => st,
            Container::List(list) => list,
        }
    }
}

/// Non-owning container reference (child → parent, link → peer).
#[derive(Clone)]
pub struct WeakContainer(WeakNode);

#[derive(Clone)]
enum WeakNode {
    Data(Weak<Node<MapState>>),
    Struct(Weak<Node<StructState>>),
    List(Weak<Node<ListState>>),
}

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        match &self.0 {
            WeakNode::Data(w) => w.upgrade().map(|node| Container::Data(MapContainer { node })),
            WeakNode::Struct(w) => w
                .upgrade()
                .map(|node| Container::Struct(StructContainer { node })),
            WeakNode::List(w) => w.upgrade().map(|node| Container::List(ListContainer { node })),
        }
    }
}

fn debug_handle(core: &RefCell<Core>, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match core.try_borrow() {
        Ok(core) => f
            .debug_struct(name)
            .field("id", &core.id)
            .field("initialized", &core.initialized)
            .finish(),
        Err(_) => f.debug_struct(name).finish_non_exhaustive(),
    }
}

// ══════════════════════════════════════════════════════════════════════════
// The shared contract
// ══════════════════════════════════════════════════════════════════════════

/// Behavior shared by every container variant.
///
/// Variants implement the hooks (`core` … `remove_key`); everything else is
/// provided on top of them. All provided reads and writes fail with
/// `UninitializedAccess` until the variant's `init` has run.
pub trait ReactiveContainer {
    // ── hooks ───────────────────────────────────────────────────────────

    fn core(&self) -> &RefCell<Core>;

    /// Strong handle to this container.
    fn handle(&self) -> Container;

    fn is_key_readonly(&self, key: &str) -> bool;

    /// Keys this container itself holds, in order.
    fn my_keys(&self) -> Vec<String>;

    /// Keys visible through this container. Maps add their bottom layer.
    fn all_keys(&self) -> Vec<String> {
        self.my_keys()
    }

    fn has_own_key(&self, key: &str) -> bool;

    /// Value of one key, `undefined` if absent.
    fn get_own_value(&self, key: &str) -> Value;

    /// Validate and write one key, then emit `(self, key)`.
    fn set_own_value(&self, key: &str, value: Value, mode: WriteMode) -> Result<()>;

    /// Empty plain value of this container's shape (`{}` or `[]`).
    fn to_default_value(&self) -> Value;

    /// Remove one key (map `forget`, list `delete_index`).
    fn remove_key(&self, key: &str) -> Result<()>;

    /// Variant-specific teardown run by `destroy`.
    fn release(&self) {}

    // ── identity & lifecycle ────────────────────────────────────────────

    fn id(&self) -> u64 {
        self.core().borrow().id
    }

    fn kind(&self) -> ContainerKind {
        self.core().borrow().kind
    }

    fn is_initialized(&self) -> bool {
        self.core().borrow().initialized
    }

    fn is_destroyed(&self) -> bool {
        self.core().borrow().destroyed
    }

    fn ensure_initialized(&self) -> Result<()> {
        let core = self.core().borrow();
        if core.destroyed {
            return Err(SprogError::UninitializedAccess(format!(
                "{} has been destroyed",
                core.label()
            )));
        }
        if !core.initialized {
            return Err(SprogError::UninitializedAccess(format!(
                "{} used before init",
                core.label()
            )));
        }
        Ok(())
    }

    /// Owning container, if any.
    fn parent(&self) -> Option<Container> {
        self.core()
            .borrow()
            .owner
            .as_ref()
            .and_then(|owner| owner.parent.upgrade())
    }

    /// Path of this container inside its parent.
    fn path(&self) -> Option<String> {
        self.core()
            .borrow()
            .owner
            .as_ref()
            .map(|owner| owner.path.clone())
    }

    /// Path from the root of the ownership chain down to this container.
    fn full_path(&self) -> String {
        let mut segments = Vec::new();
        let mut path = self.path();
        let mut parent = self.parent();
        while let (Some(segment), Some(current)) = (path, parent) {
            segments.push(segment);
            path = current.path();
            parent = current.parent();
        }
        segments.reverse();
        join_path(&segments)
    }

    // ── events ──────────────────────────────────────────────────────────

    fn subscribe(&self, handler: Handler) -> SubscriptionId {
        let mut core = self.core().borrow_mut();
        let id = SubscriptionId(core.next_subscription);
        core.next_subscription += 1;
        core.subscribers.push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // handlers are dropped after the borrow ends; they may own containers
        let removed: Vec<(SubscriptionId, Handler)> = {
            let mut core = self.core().borrow_mut();
            let (removed, kept) = std::mem::take(&mut core.subscribers)
                .into_iter()
                .partition(|(sid, _)| *sid == id);
            core.subscribers = kept;
            removed
        };
        !removed.is_empty()
    }

    /// Deliver an event to this container's subscribers, then bubble it to
    /// every ancestor. No borrow is held while handlers run.
    fn emit(&self, event: &ChangeEvent) {
        let handlers: Vec<Handler> = self
            .core()
            .borrow()
            .subscribers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for h in handlers {
            h(event);
        }
        if let Some(parent) = self.parent() {
            parent.emit(event);
        }
    }

    fn notify(&self, path: Option<String>, kind: EventKind) {
        self.emit(&ChangeEvent {
            source: self.handle(),
            path,
            kind,
        });
    }

    // ── deep access ─────────────────────────────────────────────────────

    fn has_key(&self, path: &str) -> Result<bool> {
        self.ensure_initialized()?;
        let segments = split_path(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| SprogError::UnknownPath(path.to_string()))?;
        if parents.is_empty() {
            return Ok(self.has_own_key(last));
        }
        Ok(match self.get_path(parents)? {
            Value::Data(map) => map.has_own_key(last),
            Value::Struct(st) => st.has_own_key(last),
            Value::List(list) => list.has_own_key(last),
            Value::Object(map) => map.contains_key(last),
            Value::Array(items) => parse_index(last).is_some_and(|i| i < items.len()),
            _ => false,
        })
    }

    fn get_value(&self, path: &str) -> Result<Value> {
        let segments = split_path(path)?;
        self.get_path(&segments)
    }

    /// Deep read over pre-split segments. Missing keys read as `undefined`.
    fn get_path(&self, segments: &[String]) -> Result<Value> {
        self.ensure_initialized()?;
        let Some((first, rest)) = segments.split_first() else {
            return self.snapshot();
        };
        let value = self.get_own_value(first);
        if rest.is_empty() {
            return Ok(value);
        }
        descend(value, rest)
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        let segments = split_path(path)?;
        self.set_path(&segments, value)
    }

    /// Deep write. Intermediate plain segments are created as needed;
    /// writing through a primitive is an `UnknownPath` error.
    fn set_path(&self, segments: &[String], value: Value) -> Result<()> {
        self.ensure_initialized()?;
        let Some((first, rest)) = segments.split_first() else {
            return Err(SprogError::UnknownPath("empty path".into()));
        };
        if rest.is_empty() {
            return self.set_own_value(first, value, WriteMode::Public);
        }
        let current = self.get_own_value(first);
        if let Some(child) = current.as_container() {
            return child.set_path(rest, value);
        }
        let updated = set_in_plain(current, rest, value, segments)?;
        self.set_own_value(first, updated, WriteMode::Public)
    }

    fn set_null(&self, path: &str) -> Result<()> {
        self.set_value(path, Value::Null)
    }

    /// Plain deep copy of the current contents (the container `clone`).
    fn snapshot(&self) -> Result<Value> {
        self.ensure_initialized()?;
        Ok(match self.to_default_value() {
            Value::Array(mut items) => {
                for key in self.my_keys() {
                    items.push(self.get_own_value(&key).to_plain());
                }
                Value::Array(items)
            }
            Value::Object(mut map) => {
                for key in self.all_keys() {
                    let value = self.get_own_value(&key).to_plain();
                    map.insert(key, value);
                }
                Value::Object(map)
            }
            other => other,
        })
    }

    /// Own keys as a plain object (maps include their bottom layer).
    fn entries(&self) -> Result<Object> {
        self.ensure_initialized()?;
        Ok(self
            .all_keys()
            .into_iter()
            .map(|key| {
                let value = self.get_own_value(&key);
                (key, value)
            })
            .collect())
    }

    // ── links ───────────────────────────────────────────────────────────

    /// Keep `my_key` and `other[other_key]` in sync. See [`LinkId`].
    fn link(&self, other: &Container, other_key: &str, my_key: &str) -> Result<LinkId> {
        link::create(self, other, other_key, my_key)
    }

    fn unlink(&self, id: LinkId) -> bool {
        link::remove(self, id)
    }

    fn link_ids(&self) -> Vec<LinkId> {
        self.core().borrow().links.iter().map(|l| l.id).collect()
    }

    // ── teardown ────────────────────────────────────────────────────────

    /// Sever links, destroy owned children, emit `Destroyed`, drop
    /// subscribers. Bottom layers are never destroyed by their top layer.
    fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        link::sever_all(self);
        self.release();
        let my_id = self.id();
        for key in self.my_keys() {
            if let Some(child) = self.get_own_value(&key).as_container() {
                if owner_id(&child) == Some(my_id) {
                    child.destroy();
                }
            }
        }
        self.core().borrow_mut().destroyed = true;
        tracing::debug!(container = %self.core().borrow().label(), "destroyed");
        self.notify(None, EventKind::Destroyed);
        let subscribers = {
            let mut core = self.core().borrow_mut();
            core.owner = None;
            std::mem::take(&mut core.subscribers)
        };
        drop(subscribers);
    }
}

impl ReactiveContainer for Container {
    fn core(&self) -> &RefCell<Core> {
        self.inner().core()
    }

    fn handle(&self) -> Container {
        self.clone()
    }

    fn is_key_readonly(&self, key: &str) -> bool {
        self.inner().is_key_readonly(key)
    }

    fn my_keys(&self) -> Vec<String> {
        self.inner().my_keys()
    }

    fn all_keys(&self) -> Vec<String> {
        self.inner().all_keys()
    }

    fn has_own_key(&self, key: &str) -> bool {
        self.inner().has_own_key(key)
    }

    fn get_own_value(&self, key: &str) -> Value {
        self.inner().get_own_value(key)
    }

    fn set_own_value(&self, key: &str, value: Value, mode: WriteMode) -> Result<()> {
        self.inner().set_own_value(key, value, mode)
    }

    fn to_default_value(&self) -> Value {
        self.inner().to_default_value()
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        self.inner().remove_key(key)
    }

    fn release(&self) {
        self.inner().release()
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Helpers shared by the variants
// ══════════════════════════════════════════════════════════════════════════

fn owner_id(container: &dyn ReactiveContainer) -> Option<u64> {
    container
        .core()
        .borrow()
        .owner
        .as_ref()
        .map(|owner| owner.parent_id)
}

/// Check that `value` may become a child of `parent`. Runs before any
/// mutation so a rejected write leaves the parent untouched.
pub(crate) fn check_adoptable(parent: &dyn ReactiveContainer, value: &Value) -> Result<()> {
    let Some(child) = value.as_container() else {
        return Ok(());
    };
    if child.is_layered() {
        return Err(SprogError::Structural(format!(
            "layered {} cannot be owned by another container",
            child.core().borrow().label()
        )));
    }
    let child_id = child.id();
    let mut cursor = Some(parent.handle());
    while let Some(current) = cursor {
        if current.id() == child_id {
            return Err(SprogError::Structural(format!(
                "{} cannot own itself",
                current.core().borrow().label()
            )));
        }
        cursor = current.parent();
    }
    Ok(())
}

/// Record `parent` as the owner of a container value. Non-owning parents
/// only reference their container values.
pub(crate) fn attach(parent: &dyn ReactiveContainer, value: &Value, path: &str) {
    if !parent.core().borrow().adopts {
        return;
    }
    if let Some(child) = value.as_container() {
        let parent_handle = parent.handle();
        child.core().borrow_mut().owner = Some(Owner {
            parent: parent_handle.downgrade(),
            parent_id: parent_handle.id(),
            path: path.to_string(),
        });
    }
}

/// Clear the owner of a container value that `parent` no longer holds.
pub(crate) fn detach(parent: &dyn ReactiveContainer, value: &Value) {
    if let Some(child) = value.as_container() {
        if owner_id(&child) == Some(parent.id()) {
            child.core().borrow_mut().owner = None;
        }
    }
}

pub(crate) fn begin_init(container: &dyn ReactiveContainer) -> Result<()> {
    let core = container.core().borrow();
    if core.initialized {
        return Err(SprogError::Structural(format!(
            "{} is already initialized",
            core.label()
        )));
    }
    if core.destroyed {
        return Err(SprogError::UninitializedAccess(format!(
            "{} has been destroyed",
            core.label()
        )));
    }
    Ok(())
}

pub(crate) fn finish_init(container: &dyn ReactiveContainer) -> PrivilegedSetter {
    container.core().borrow_mut().initialized = true;
    container.notify(None, EventKind::Changed);
    PrivilegedSetter::new(container.handle())
}

pub(crate) fn label(container: &dyn ReactiveContainer) -> String {
    container.core().borrow().label()
}

pub(crate) fn type_error(key: &str, expected: &crate::ItemDefinition, got: &Value) -> SprogError {
    SprogError::Validation(format!(
        "key '{key}' expects {}{}, got {}",
        expected.type_tag,
        if expected.is_nullable() { " or null" } else { "" },
        got.type_name()
    ))
}

fn descend(mut current: Value, segments: &[String]) -> Result<Value> {
    for (i, segment) in segments.iter().enumerate() {
        if let Some(child) = current.as_container() {
            return child.get_path(&segments[i..]);
        }
        current = match current {
            Value::Object(mut map) => map.swap_remove(segment).unwrap_or_default(),
            Value::Array(mut items) => match parse_index(segment) {
                Some(index) if index < items.len() => items.swap_remove(index),
                _ if segment == "length" => Value::from(items.len()),
                _ => Value::Undefined,
            },
            Value::String(s) if segment == "length" => Value::from(s.chars().count()),
            _ => Value::Undefined,
        };
    }
    Ok(current)
}

fn set_in_plain(
    current: Value,
    segments: &[String],
    value: Value,
    full: &[String],
) -> Result<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(value);
    };
    if let Some(child) = current.as_container() {
        child.set_path(segments, value)?;
        return Ok(current);
    }
    match current {
        Value::Object(mut map) => {
            let child = map.get(segment).cloned().unwrap_or_default();
            let updated = set_in_plain(child, rest, value, full)?;
            map.insert(segment.clone(), updated);
            Ok(Value::Object(map))
        }
        Value::Array(mut items) => {
            let index = parse_index(segment).ok_or_else(|| {
                SprogError::UnknownPath(format!(
                    "'{segment}' is not an index in '{}'",
                    join_path(full)
                ))
            })?;
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            let child = std::mem::take(&mut items[index]);
            items[index] = set_in_plain(child, rest, value, full)?;
            Ok(Value::Array(items))
        }
        Value::Undefined | Value::Null => {
            let fresh = if parse_index(segment).is_some() {
                Value::Array(Vec::new())
            } else {
                Value::Object(Object::new())
            };
            set_in_plain(fresh, segments, value, full)
        }
        other => Err(SprogError::UnknownPath(format!(
            "cannot set '{}': '{segment}' is inside a {}",
            join_path(full),
            other.type_name()
        ))),
    }
}
