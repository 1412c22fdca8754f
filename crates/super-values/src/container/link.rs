//! Two-way key links between containers.

use super::{handler, Container, Handler, ReactiveContainer, SubscriptionId, WeakContainer, WriteMode};
use sprog_types::{Result, SprogError};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `link`; pass it to `unlink` on either side.
///
/// On creation the linked key is copied from the peer into this container
/// (or the other way round when this key is readonly). Afterwards every
/// change of one key is written into the other unless the target is
/// readonly. Writes that would not change the target are skipped, which
/// keeps the two sides from ping-ponging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(u64);

/// One side of a link. Both containers keep a record under the same id.
pub(crate) struct Link {
    pub(crate) id: LinkId,
    peer: WeakContainer,
    /// Subscription on this container that forwards into the peer.
    outgoing: Option<SubscriptionId>,
}

pub(crate) fn create<C: ReactiveContainer + ?Sized>(
    me: &C,
    other: &Container,
    other_key: &str,
    my_key: &str,
) -> Result<LinkId> {
    me.ensure_initialized()?;
    other.ensure_initialized()?;
    if me.id() == other.id() && my_key == other_key {
        return Err(SprogError::Structural(format!(
            "cannot link key '{my_key}' to itself"
        )));
    }

    let me = me.handle();
    let id = LinkId(NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed));
    let my_readonly = me.is_key_readonly(my_key);
    let other_readonly = other.is_key_readonly(other_key);

    if !my_readonly {
        copy_value(other, other_key, &me, my_key)?;
    } else if !other_readonly {
        copy_value(&me, my_key, other, other_key)?;
    } else {
        tracing::warn!(
            my_key,
            other_key,
            "both linked keys are readonly; link will never sync"
        );
    }

    let into_me = (!my_readonly).then(|| other.subscribe(forward(other, other_key, &me, my_key)));
    let into_other = (!other_readonly).then(|| me.subscribe(forward(&me, my_key, other, other_key)));

    me.core().borrow_mut().links.push(Link {
        id,
        peer: other.downgrade(),
        outgoing: into_other,
    });
    other.core().borrow_mut().links.push(Link {
        id,
        peer: me.downgrade(),
        outgoing: into_me,
    });
    tracing::debug!(?id, my_key, other_key, "linked");
    Ok(id)
}

/// Drop a link from both sides. Returns false if `id` is not linked here.
pub(crate) fn remove<C: ReactiveContainer + ?Sized>(me: &C, id: LinkId) -> bool {
    let mine = take_records(me, id);
    if mine.is_empty() {
        return false;
    }
    for link in mine {
        if let Some(sub) = link.outgoing {
            me.unsubscribe(sub);
        }
        if let Some(peer) = link.peer.upgrade() {
            for theirs in take_records(&peer, id) {
                if let Some(sub) = theirs.outgoing {
                    peer.unsubscribe(sub);
                }
            }
        }
    }
    true
}

pub(crate) fn sever_all<C: ReactiveContainer + ?Sized>(me: &C) {
    for id in me.link_ids() {
        remove(me, id);
    }
}

fn take_records<C: ReactiveContainer + ?Sized>(container: &C, id: LinkId) -> Vec<Link> {
    let mut core = container.core().borrow_mut();
    let (taken, kept): (Vec<Link>, Vec<Link>) = std::mem::take(&mut core.links)
        .into_iter()
        .partition(|link| link.id == id);
    core.links = kept;
    taken
}

fn copy_value(from: &Container, from_key: &str, to: &Container, to_key: &str) -> Result<()> {
    let value = from.get_own_value(from_key);
    if to.get_own_value(to_key) == value {
        return Ok(());
    }
    to.set_own_value(to_key, value, WriteMode::Public)
}

/// Subscription on `from` that copies `from_key` into `to[to_key]`.
///
/// Holds both sides weakly; once either is gone the handler is inert.
fn forward(from: &Container, from_key: &str, to: &Container, to_key: &str) -> Handler {
    let source_id = from.id();
    let from = from.downgrade();
    let to = to.downgrade();
    let from_key = from_key.to_string();
    let to_key = to_key.to_string();
    handler(move |event| {
        if event.source.id() != source_id || !event.touches(&from_key) {
            return;
        }
        let (Some(from), Some(to)) = (from.upgrade(), to.upgrade()) else {
            return;
        };
        if to.is_destroyed() || !to.is_initialized() {
            return;
        }
        if let Err(err) = copy_value(&from, &from_key, &to, &to_key) {
            tracing::warn!(%err, %from_key, %to_key, "link sync failed");
        }
    })
}
