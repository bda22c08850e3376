//! Chronological index: a doubly linked list threaded through arena nodes.
//!
//! Unlike a standalone list, `ChronoList` does not own its nodes. Every node
//! lives in the container's [`SlotArena`] and carries a [`ChronoLinks`] pair;
//! the list itself only tracks head, tail and length. This lets the primary
//! index and the chronological index share one element population.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<N>)                     N: ChronoNode
//!   ┌────────┬──────────────────────────────────────────────┐
//!   │ SlotId │ node { .., chrono: { prev, next } }          │
//!   ├────────┼──────────────────────────────────────────────┤
//!   │ id_4   │ { prev: None,       next: Some(id_1) }  t=3  │
//!   │ id_1   │ { prev: Some(id_4), next: Some(id_7) }  t=5  │
//!   │ id_7   │ { prev: Some(id_1), next: None }        t=9  │
//!   └────────┴──────────────────────────────────────────────┘
//!
//!   head (oldest) ─► [id_4] ◄──► [id_1] ◄──► [id_7] ◄── tail (newest)
//! ```
//!
//! ## Operations
//! - `push_back(id)`: attach a freshly created node at the newest end
//! - `move_to_back(id)`: detach + attach at the newest end (touch)
//! - `unlink(id)`: detach before the node is freed
//!
//! ## Performance
//! - `push_back` / `move_to_back` / `unlink`: O(1)
//! - iteration in either direction: O(n)

use crate::ds::slot_arena::{SlotArena, SlotId};

/// Link pair stored inside each arena node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChronoLinks {
    pub(crate) prev: Option<SlotId>,
    pub(crate) next: Option<SlotId>,
}

/// Access to the chronological links embedded in an arena node.
pub trait ChronoNode {
    fn chrono(&self) -> &ChronoLinks;
    fn chrono_mut(&mut self) -> &mut ChronoLinks;
}

/// Head/tail bookkeeping for the time-ordered sequence.
#[derive(Debug, Clone, Default)]
pub struct ChronoList {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl ChronoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest node.
    pub fn front(&self) -> Option<SlotId> {
        self.head
    }

    /// Newest node.
    pub fn back(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn next<N: ChronoNode>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId> {
        arena.get(id).and_then(|node| node.chrono().next)
    }

    pub fn prev<N: ChronoNode>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId> {
        arena.get(id).and_then(|node| node.chrono().prev)
    }

    /// Appends an unlinked node at the newest end.
    pub fn push_back<N: ChronoNode>(&mut self, arena: &mut SlotArena<N>, id: SlotId) {
        if self.attach_back(arena, id).is_some() {
            self.len += 1;
        }
    }

    /// Moves a linked node to the newest end.
    pub fn move_to_back<N: ChronoNode>(&mut self, arena: &mut SlotArena<N>, id: SlotId) -> bool {
        if !arena.contains(id) {
            return false;
        }
        if Some(id) == self.tail {
            return true;
        }
        self.detach(arena, id);
        self.attach_back(arena, id);
        true
    }

    /// Unlinks a node; the node itself stays in the arena.
    pub fn unlink<N: ChronoNode>(&mut self, arena: &mut SlotArena<N>, id: SlotId) -> bool {
        if self.detach(arena, id).is_some() {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Forgets every link. Nodes must be released by the caller.
    pub fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn detach<N: ChronoNode>(&mut self, arena: &mut SlotArena<N>, id: SlotId) -> Option<()> {
        let ChronoLinks { prev, next } = *arena.get(id)?.chrono();

        if let Some(prev_id) = prev {
            if let Some(prev_node) = arena.get_mut(prev_id) {
                prev_node.chrono_mut().next = next;
            }
        } else {
            self.head = next;
        }

        if let Some(next_id) = next {
            if let Some(next_node) = arena.get_mut(next_id) {
                next_node.chrono_mut().prev = prev;
            }
        } else {
            self.tail = prev;
        }

        if let Some(node) = arena.get_mut(id) {
            *node.chrono_mut() = ChronoLinks::default();
        }

        Some(())
    }

    fn attach_back<N: ChronoNode>(&mut self, arena: &mut SlotArena<N>, id: SlotId) -> Option<()> {
        let old_tail = self.tail;
        {
            let links = arena.get_mut(id)?.chrono_mut();
            links.prev = old_tail;
            links.next = None;
        }
        if let Some(old_tail) = old_tail {
            if let Some(tail_node) = arena.get_mut(old_tail) {
                tail_node.chrono_mut().next = Some(id);
            }
        } else {
            self.head = Some(id);
        }
        self.tail = Some(id);
        Some(())
    }

    /// Walks the list front to back, checking link symmetry.
    pub(crate) fn audit<N: ChronoNode>(&self, arena: &SlotArena<N>) -> Result<Vec<SlotId>, String> {
        let mut order = Vec::with_capacity(self.len);
        let mut current = self.head;
        let mut prev = None;
        while let Some(id) = current {
            let node = arena
                .get(id)
                .ok_or_else(|| format!("chronological link to vacant slot {}", id.index()))?;
            if node.chrono().prev != prev {
                return Err(format!("broken back link at slot {}", id.index()));
            }
            order.push(id);
            if order.len() > self.len {
                return Err("chronological list longer than recorded length".into());
            }
            prev = Some(id);
            current = node.chrono().next;
        }
        if self.tail != prev {
            return Err("chronological tail does not match last node".into());
        }
        if order.len() != self.len {
            return Err(format!(
                "chronological length {} but {} nodes reachable",
                self.len,
                order.len()
            ));
        }
        Ok(order)
    }
}
