//! Super Values: reactive, schema-validated containers.
//!
//! A [`Value`] is either plain data (`null`, numbers, strings, arrays,
//! objects), a [`Function`], or a handle to one of three reactive
//! containers:
//!
//! - [`MapContainer`]: string keys, extensible, optionally layered on a
//!   bottom map (the variable scopes of `sprog-eval` are built from these).
//! - [`StructContainer`]: keys fixed at construction.
//! - [`ListContainer`]: positional slots with a full mutation surface.
//!
//! Every container validates writes against [`ItemDefinition`]s, emits
//! [`ChangeEvent`]s synchronously, owns the containers stored inside it,
//! and can keep keys in sync with other containers through links.

mod container;
mod definition;
mod value;

pub use container::{
    handler, ChangeEvent, Container, ContainerKind, Core, EventKind, Handler, LinkId,
    ListContainer, MapContainer, PrivilegeToken, PrivilegedSetter, ReactiveContainer,
    StructContainer, SubscriptionId, WeakContainer, WriteMode, DEFAULT_DEFINITION_KEY,
};
pub use definition::{
    check_definition, definitions_from_object, is_corresponding_type, resolve_initial_value,
    ItemDefinition, TypeTag,
};
pub use value::{Callable, Function, Object, Value};
