//! Positional container.

use super::{
    attach, begin_init, check_adoptable, debug_handle, detach, finish_init, label, type_error,
    Container, ContainerKind, Core, EventKind, Node, PrivilegedSetter, ReactiveContainer,
    WriteMode,
};
use crate::definition::ItemDefinition;
use crate::value::Value;
use sprog_types::path::parse_index;
use sprog_types::{Result, SprogError};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

pub(crate) struct ListState {
    items: Vec<Value>,
    definition: ItemDefinition,
    defaults: Option<Vec<Value>>,
}

/// Ordered container whose slots share one item definition.
///
/// Structural mutations emit a specific event (`Added`, `Removed` or
/// `Moved`, where one applies) followed by a whole-container `Changed`.
/// Writing one slot emits `Changed` for that index. A list whose item
/// definition is readonly rejects every public mutation.
#[derive(Clone)]
pub struct ListContainer {
    pub(crate) node: Rc<Node<ListState>>,
}

impl ListContainer {
    /// `defaults` supplies per-slot defaults positionally and the initial
    /// length when no longer initial array is given.
    pub fn new(definition: ItemDefinition, defaults: Option<Vec<Value>>) -> Self {
        Self {
            node: Node::new(
                ContainerKind::List,
                ListState {
                    items: Vec::new(),
                    definition,
                    defaults,
                },
            ),
        }
    }

    pub fn definition(&self) -> ItemDefinition {
        self.node.state.borrow().definition.clone()
    }

    /// Effective definition of slot `index`: the item definition with the
    /// positional default, if any.
    pub fn slot_definition(&self, index: usize) -> ItemDefinition {
        let state = self.node.state.borrow();
        let mut def = state.definition.clone();
        if let Some(default) = state.defaults.as_ref().and_then(|d| d.get(index)) {
            def.default = Some(default.clone());
        }
        def
    }

    pub fn init(&self, initial: Option<Vec<Value>>) -> Result<PrivilegedSetter> {
        begin_init(self)?;
        let initial = initial.unwrap_or_default();
        let default_len = self
            .node
            .state
            .borrow()
            .defaults
            .as_ref()
            .map_or(0, Vec::len);
        let len = initial.len().max(default_len);

        let mut staged = Vec::with_capacity(len);
        for index in 0..len {
            let def = self.slot_definition(index);
            let supplied = initial.get(index).filter(|v| !v.is_undefined()).cloned();
            let value = match supplied {
                Some(value) => value,
                None => def.initial_value()?.ok_or_else(|| {
                    SprogError::Validation(format!(
                        "required slot {index} not provided to {}",
                        label(self)
                    ))
                })?,
            };
            self.validate(index, &value)?;
            staged.push(value);
        }

        self.node.state.borrow_mut().items = staged;
        self.reindex();
        Ok(finish_init(self))
    }

    pub fn len(&self) -> usize {
        self.node.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current slots (shallow; containers stay handles).
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        self.ensure_initialized()?;
        Ok(self.node.state.borrow().items.clone())
    }

    pub fn get(&self, index: usize) -> Value {
        self.node
            .state
            .borrow()
            .items
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    // ── mutation surface ────────────────────────────────────────────────

    /// Append; returns the new length.
    pub fn push(&self, values: Vec<Value>) -> Result<usize> {
        self.check_mutable(WriteMode::Public)?;
        let start = self.len();
        self.validate_all(start, &values)?;
        self.node.state.borrow_mut().items.extend(values.iter().cloned());
        self.reindex();
        let indices = (start..start + values.len()).collect();
        self.structural(Some(EventKind::Added { values, indices }));
        Ok(self.len())
    }

    /// Prepend; returns the new length.
    pub fn unshift(&self, values: Vec<Value>) -> Result<usize> {
        self.check_mutable(WriteMode::Public)?;
        self.validate_all(0, &values)?;
        {
            let mut state = self.node.state.borrow_mut();
            state.items.splice(0..0, values.iter().cloned());
        }
        self.reindex();
        let indices = (0..values.len()).collect();
        self.structural(Some(EventKind::Added { values, indices }));
        Ok(self.len())
    }

    /// Remove the last slot. An empty list yields `undefined` silently.
    pub fn pop(&self) -> Result<Value> {
        self.check_mutable(WriteMode::Public)?;
        let popped = self.node.state.borrow_mut().items.pop();
        let Some(value) = popped else {
            return Ok(Value::Undefined);
        };
        detach(self, &value);
        let index = self.len();
        self.structural(Some(EventKind::Removed {
            values: vec![value.clone()],
            indices: vec![index],
        }));
        Ok(value)
    }

    /// Remove the first slot. An empty list yields `undefined` silently.
    pub fn shift(&self) -> Result<Value> {
        self.check_mutable(WriteMode::Public)?;
        let shifted = {
            let mut state = self.node.state.borrow_mut();
            if state.items.is_empty() {
                None
            } else {
                Some(state.items.remove(0))
            }
        };
        let Some(value) = shifted else {
            return Ok(Value::Undefined);
        };
        detach(self, &value);
        self.reindex();
        self.structural(Some(EventKind::Removed {
            values: vec![value.clone()],
            indices: vec![0],
        }));
        Ok(value)
    }

    /// Overwrite `start..end` with `value`. Bounds are relative (negative
    /// counts from the end) and clamped to the current length.
    pub fn fill(&self, value: Value, start: Option<i64>, end: Option<i64>) -> Result<()> {
        self.check_mutable(WriteMode::Public)?;
        let len = self.len();
        let start = relative_index(start.unwrap_or(0), len);
        let end = relative_index(end.unwrap_or(len as i64), len);
        for index in start..end {
            self.validate(index, &value)?;
        }
        let replaced: Vec<Value> = {
            let mut state = self.node.state.borrow_mut();
            (start..end)
                .map(|i| std::mem::replace(&mut state.items[i], value.clone()))
                .collect()
        };
        for old in replaced.iter().filter(|old| **old != value) {
            detach(self, old);
        }
        self.reindex();
        self.structural(None);
        Ok(())
    }

    /// Remove `delete_count` slots at `start` (all remaining when `None`)
    /// and insert `items` there. Returns the removed values.
    pub fn splice(
        &self,
        start: i64,
        delete_count: Option<usize>,
        items: Vec<Value>,
    ) -> Result<Vec<Value>> {
        self.check_mutable(WriteMode::Public)?;
        let len = self.len();
        let start = relative_index(start, len);
        let delete_count = delete_count.unwrap_or(len - start).min(len - start);
        self.validate_all(start, &items)?;

        let removed: Vec<Value> = self
            .node
            .state
            .borrow_mut()
            .items
            .splice(start..start + delete_count, items.iter().cloned())
            .collect();
        for old in &removed {
            detach(self, old);
        }
        self.reindex();

        if !removed.is_empty() {
            self.notify(
                None,
                EventKind::Removed {
                    values: removed.clone(),
                    indices: (start..start + delete_count).collect(),
                },
            );
        }
        if !items.is_empty() {
            let indices = (start..start + items.len()).collect();
            self.notify(None, EventKind::Added { values: items, indices });
        }
        self.notify(None, EventKind::Changed);
        Ok(removed)
    }

    pub fn reverse(&self) -> Result<()> {
        self.check_mutable(WriteMode::Public)?;
        let items = {
            let mut state = self.node.state.borrow_mut();
            state.items.reverse();
            state.items.clone()
        };
        self.reindex();
        let n = items.len();
        let indices: Vec<usize> = (0..n).filter(|&i| i != n - 1 - i).collect();
        self.structural(moved_event(&items, indices));
        Ok(())
    }

    /// Stable sort by [`Value::sort_cmp`].
    pub fn sort(&self) -> Result<()> {
        self.sort_by(|a, b| a.sort_cmp(b))
    }

    /// Stable sort. The `Moved` event names only the slots outside the
    /// longest run of items that kept their relative order; an already
    /// sorted list emits no `Moved` event.
    pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> Ordering) -> Result<()> {
        self.check_mutable(WriteMode::Public)?;
        let items = self.node.state.borrow().items.clone();
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| compare(&items[a], &items[b]));

        let sorted: Vec<Value> = order.iter().map(|&i| items[i].clone()).collect();
        self.node.state.borrow_mut().items = sorted.clone();
        self.reindex();

        let kept = longest_increasing_run(&order);
        let indices: Vec<usize> = (0..order.len()).filter(|&i| !kept[i]).collect();
        self.structural(moved_event(&sorted, indices));
        Ok(())
    }

    /// Clear slot `index` to `undefined` without shrinking the list.
    pub fn clear_index(&self, index: usize) -> Result<()> {
        self.check_mutable(WriteMode::Public)?;
        let len = self.len();
        if index >= len {
            return Err(out_of_range(index, len));
        }
        let old = std::mem::take(&mut self.node.state.borrow_mut().items[index]);
        detach(self, &old);
        self.notify(Some(index.to_string()), EventKind::Changed);
        Ok(())
    }

    /// Remove slot `index`, shifting later slots down.
    pub fn delete_index(&self, index: usize) -> Result<Value> {
        self.check_mutable(WriteMode::Public)?;
        let removed = {
            let mut state = self.node.state.borrow_mut();
            if index >= state.items.len() {
                return Err(out_of_range(index, state.items.len()));
            }
            state.items.remove(index)
        };
        detach(self, &removed);
        self.reindex();
        self.structural(Some(EventKind::Removed {
            values: vec![removed.clone()],
            indices: vec![index],
        }));
        Ok(removed)
    }

    /// Exchange slots `from` and `to`.
    ///
    /// Returns false, without mutating or emitting, when `from` is out of
    /// range, `to` is negative, or both name the same slot once `to` is
    /// clamped to the last index.
    pub fn move_index(&self, from: i64, to: i64) -> Result<bool> {
        self.check_mutable(WriteMode::Public)?;
        let len = self.len();
        if from < 0 || from as usize >= len || to < 0 {
            return Ok(false);
        }
        let from = from as usize;
        let to = (to as usize).min(len - 1);
        if from == to {
            return Ok(false);
        }
        let values = {
            let mut state = self.node.state.borrow_mut();
            state.items.swap(from, to);
            vec![state.items[to].clone(), state.items[from].clone()]
        };
        self.reindex();
        self.structural(Some(EventKind::Moved {
            values,
            indices: vec![to, from],
        }));
        Ok(true)
    }

    // ── internals ───────────────────────────────────────────────────────

    fn check_mutable(&self, mode: WriteMode) -> Result<()> {
        self.ensure_initialized()?;
        if self.node.state.borrow().definition.is_readonly() && !mode.is_privileged() {
            return Err(SprogError::Validation(format!("{} is readonly", label(self))));
        }
        Ok(())
    }

    fn validate(&self, index: usize, value: &Value) -> Result<()> {
        let def = self.slot_definition(index);
        if !def.accepts(value) {
            return Err(type_error(&index.to_string(), &def, value));
        }
        check_adoptable(self, value)
    }

    fn validate_all(&self, start: usize, values: &[Value]) -> Result<()> {
        values
            .iter()
            .enumerate()
            .try_for_each(|(offset, value)| self.validate(start + offset, value))
    }

    /// Point every owned child at its current index.
    fn reindex(&self) {
        let items = self.node.state.borrow().items.clone();
        for (index, item) in items.iter().enumerate() {
            attach(self, item, &index.to_string());
        }
    }

    fn structural(&self, specific: Option<EventKind>) {
        if let Some(kind) = specific {
            self.notify(None, kind);
        }
        self.notify(None, EventKind::Changed);
    }
}

impl ReactiveContainer for ListContainer {
    fn core(&self) -> &RefCell<Core> {
        &self.node.core
    }

    fn handle(&self) -> Container {
        Container::List(self.clone())
    }

    fn is_key_readonly(&self, _key: &str) -> bool {
        self.node.state.borrow().definition.is_readonly()
    }

    fn my_keys(&self) -> Vec<String> {
        (0..self.len()).map(|i| i.to_string()).collect()
    }

    fn has_own_key(&self, key: &str) -> bool {
        key == "length" || parse_index(key).is_some_and(|i| i < self.len())
    }

    fn get_own_value(&self, key: &str) -> Value {
        if key == "length" {
            return Value::from(self.len());
        }
        parse_index(key).map(|i| self.get(i)).unwrap_or_default()
    }

    /// Writing past the end pads with `undefined` and counts as an insert.
    fn set_own_value(&self, key: &str, value: Value, mode: WriteMode) -> Result<()> {
        self.check_mutable(mode)?;
        let index = parse_index(key).ok_or_else(|| {
            SprogError::Structural(format!("{} has no writable key '{key}'", label(self)))
        })?;
        self.validate(index, &value)?;
        let (old, grew) = {
            let mut state = self.node.state.borrow_mut();
            let grew = index >= state.items.len();
            if grew {
                state.items.resize(index + 1, Value::Undefined);
            }
            (std::mem::replace(&mut state.items[index], value.clone()), grew)
        };
        if old != value {
            detach(self, &old);
        }
        attach(self, &value, key);
        if grew {
            self.structural(Some(EventKind::Added {
                values: vec![value],
                indices: vec![index],
            }));
        } else {
            self.notify(Some(index.to_string()), EventKind::Changed);
        }
        Ok(())
    }

    fn to_default_value(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        let index = parse_index(key)
            .ok_or_else(|| SprogError::UnknownPath(format!("'{key}' is not a list index")))?;
        self.delete_index(index).map(|_| ())
    }
}

impl fmt::Debug for ListContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_handle(&self.node.core, "ListContainer", f)
    }
}

fn out_of_range(index: usize, len: usize) -> SprogError {
    SprogError::UnknownPath(format!("index {index} out of range for length {len}"))
}

/// Resolve a possibly negative index against `len`, clamped to `0..=len`.
fn relative_index(index: i64, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs() as usize)
    } else {
        (index as usize).min(len)
    }
}

fn moved_event(items: &[Value], indices: Vec<usize>) -> Option<EventKind> {
    if indices.is_empty() {
        return None;
    }
    Some(EventKind::Moved {
        values: indices.iter().map(|&i| items[i].clone()).collect(),
        indices,
    })
}

/// Mark the members of one longest strictly increasing subsequence.
fn longest_increasing_run(seq: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for i in 0..seq.len() {
        let pos = tails.partition_point(|&t| seq[t] < seq[i]);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }
    let mut kept = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        kept[i] = true;
        cursor = prev[i];
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_index() {
        assert_eq!(relative_index(-1, 4), 3);
        assert_eq!(relative_index(-10, 4), 0);
        assert_eq!(relative_index(7, 4), 4);
        assert_eq!(relative_index(2, 4), 2);
    }

    #[test]
    fn test_longest_increasing_run() {
        assert_eq!(longest_increasing_run(&[0, 1, 2]), vec![true, true, true]);
        // [3,0,1,2] sorts via order [1,2,3,0]; only the 3 moves
        assert_eq!(
            longest_increasing_run(&[1, 2, 3, 0]),
            vec![true, true, true, false]
        );
        assert_eq!(longest_increasing_run(&[]), Vec::<bool>::new());
    }
}
