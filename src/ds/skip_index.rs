//! Ordered primary index: a skip list threaded through arena nodes.
//!
//! Nodes live in the container's [`SlotArena`]; each carries a [`SkipLink`]
//! with a forward and a back pointer per level. Search is O(log n) expected;
//! stepping from any element is O(1) in both directions, and unlinking a known
//! node splices each of its levels in place, O(height), however long its
//! equal-key run is.
//!
//! ```text
//! Level 2:  HEAD ──────────────────► 20 ──────────────────────► NIL
//!             │                       │
//! Level 1:  HEAD ────────► 10 ──────► 20 ──────────► 40 ──────► NIL
//!             │            │          │              │
//! Level 0:  HEAD ──► 5 ──► 10 ──► 10' ─► 20 ──► 30 ──► 40 ──► NIL
//!                  ◄──    ◄──   ◄──    ◄──    ◄──    ◄──          (back)
//! ```
//!
//! Duplicate keys (multi containers) are inserted at the upper bound of their
//! key, so an equal-key run stays contiguous and keeps insertion order
//! (`10` before `10'` above).
//!
//! Heights are drawn from a seeded [`SmallRng`] with p = 0.5, capped at
//! [`MAX_LEVEL`].

use std::cmp::Ordering;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::AllocError;
use crate::index::{Compare, IndexNode, PrimaryIndex, Probe, Sealed};

/// Maximum number of skip-list levels. At p = 0.5 this keeps search
/// logarithmic up to about 2^32 elements.
pub const MAX_LEVEL: usize = 32;

const HEIGHT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

type Preds = [Option<SlotId>; MAX_LEVEL];

/// Per-node links of the ordered index.
#[derive(Debug, Clone)]
pub struct SkipLink {
    forward: Vec<Option<SlotId>>,
    back: Vec<Option<SlotId>>,
}

impl SkipLink {
    fn height(&self) -> usize {
        self.forward.len()
    }

    fn forward(&self, lvl: usize) -> Option<SlotId> {
        self.forward.get(lvl).copied().flatten()
    }

    fn back(&self, lvl: usize) -> Option<SlotId> {
        self.back.get(lvl).copied().flatten()
    }
}

/// Comparator-driven ordered index.
#[derive(Debug, Clone)]
pub struct OrderedIndex<Cmp> {
    cmp: Cmp,
    head: Preds,
    tail: Option<SlotId>,
    levels: usize,
    len: usize,
    rng: SmallRng,
}

impl<Cmp> OrderedIndex<Cmp> {
    pub fn new(cmp: Cmp) -> Self {
        Self {
            cmp,
            head: [None; MAX_LEVEL],
            tail: None,
            levels: 0,
            len: 0,
            rng: SmallRng::seed_from_u64(HEIGHT_SEED),
        }
    }

    pub fn comparator(&self) -> &Cmp {
        &self.cmp
    }

    /// Last element in key order.
    pub fn last(&self) -> Option<SlotId> {
        self.tail
    }

    /// Predecessor of `id` in key order.
    pub fn prev<K, N>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId>
    where
        N: IndexNode<K, SkipLink>,
    {
        arena.get(id).and_then(|node| node.link().back(0))
    }

    /// First element whose key is not less than `key`.
    pub fn lower_bound<K, N>(&self, arena: &SlotArena<N>, key: &K) -> Option<SlotId>
    where
        Cmp: Compare<K>,
        N: IndexNode<K, SkipLink>,
    {
        let preds = self.predecessors(arena, key, false);
        self.forward_of(arena, preds[0], 0)
    }

    /// First element whose key is greater than `key`.
    pub fn upper_bound<K, N>(&self, arena: &SlotArena<N>, key: &K) -> Option<SlotId>
    where
        Cmp: Compare<K>,
        N: IndexNode<K, SkipLink>,
    {
        let preds = self.predecessors(arena, key, true);
        self.forward_of(arena, preds[0], 0)
    }

    fn random_height(&mut self) -> usize {
        let r = self.rng.next_u32();
        (r.trailing_ones() as usize + 1).min(MAX_LEVEL)
    }

    fn forward_of<K, N>(&self, arena: &SlotArena<N>, at: Option<SlotId>, lvl: usize) -> Option<SlotId>
    where
        N: IndexNode<K, SkipLink>,
    {
        match at {
            None => self.head[lvl],
            Some(id) => arena.get(id).and_then(|node| node.link().forward(lvl)),
        }
    }

    fn set_forward<K, N>(
        &mut self,
        arena: &mut SlotArena<N>,
        at: Option<SlotId>,
        lvl: usize,
        target: Option<SlotId>,
    ) where
        N: IndexNode<K, SkipLink>,
    {
        match at {
            None => self.head[lvl] = target,
            Some(id) => {
                if let Some(slot) = arena
                    .get_mut(id)
                    .and_then(|node| node.link_mut().forward.get_mut(lvl))
                {
                    *slot = target;
                }
            },
        }
    }

    fn set_back<K, N>(&self, arena: &mut SlotArena<N>, at: Option<SlotId>, lvl: usize, target: Option<SlotId>)
    where
        N: IndexNode<K, SkipLink>,
    {
        if let Some(slot) = at
            .and_then(|id| arena.get_mut(id))
            .and_then(|node| node.link_mut().back.get_mut(lvl))
        {
            *slot = target;
        }
    }

    /// Last node at each level whose key is less than `key`, or less than or
    /// equal to it when `inclusive`. `None` stands for the head.
    fn predecessors<K, N>(&self, arena: &SlotArena<N>, key: &K, inclusive: bool) -> Preds
    where
        Cmp: Compare<K>,
        N: IndexNode<K, SkipLink>,
    {
        let mut preds = [None; MAX_LEVEL];
        let mut current = None;
        for lvl in (0..self.levels).rev() {
            let mut next = self.forward_of(arena, current, lvl);
            while let Some(next_id) = next {
                let Some(node) = arena.get(next_id) else {
                    break;
                };
                let advance = match self.cmp.compare(node.key(), key) {
                    Ordering::Less => true,
                    Ordering::Equal => inclusive,
                    Ordering::Greater => false,
                };
                if !advance {
                    break;
                }
                current = Some(next_id);
                next = node.link().forward(lvl);
            }
            preds[lvl] = current;
        }
        preds
    }
}

impl<Cmp: Default> Default for OrderedIndex<Cmp> {
    fn default() -> Self {
        Self::new(Cmp::default())
    }
}

impl<Cmp> Sealed for OrderedIndex<Cmp> {}

impl<K, Cmp: Compare<K>> PrimaryIndex<K> for OrderedIndex<Cmp> {
    type Link = SkipLink;
    type Hint = Preds;

    fn new_link(&mut self) -> Result<SkipLink, AllocError> {
        let height = self.random_height();
        let mut forward = Vec::new();
        forward.try_reserve_exact(height)?;
        forward.resize(height, None);
        let mut back = Vec::new();
        back.try_reserve_exact(height)?;
        back.resize(height, None);
        Ok(SkipLink { forward, back })
    }

    fn reserve_for<N: IndexNode<K, SkipLink>>(
        &mut self,
        _arena: &mut SlotArena<N>,
        _len: usize,
        _additional: usize,
    ) -> Result<bool, AllocError> {
        Ok(false)
    }

    fn probe<N: IndexNode<K, SkipLink>>(&self, arena: &SlotArena<N>, key: &K) -> Probe<Preds> {
        let preds = self.predecessors(arena, key, true);
        let found = preds[0].filter(|&id| {
            arena
                .get(id)
                .map(|node| self.cmp.compare(node.key(), key) == Ordering::Equal)
                .unwrap_or(false)
        });
        Probe { found, hint: preds }
    }

    fn link<N: IndexNode<K, SkipLink>>(&mut self, arena: &mut SlotArena<N>, id: SlotId, preds: Preds) {
        let height = match arena.get(id) {
            Some(node) => node.link().height(),
            None => return,
        };
        debug_assert!(height >= 1, "skip link without levels");

        for (lvl, &pred) in preds.iter().enumerate().take(height) {
            let next = self.forward_of(arena, pred, lvl);
            if let Some(node) = arena.get_mut(id) {
                let link = node.link_mut();
                link.forward[lvl] = next;
                link.back[lvl] = pred;
            }
            self.set_forward(arena, pred, lvl, Some(id));
            self.set_back(arena, next, lvl, Some(id));
        }
        if self.forward_of(arena, Some(id), 0).is_none() {
            self.tail = Some(id);
        }

        self.levels = self.levels.max(height);
        self.len += 1;
    }

    fn unlink<N: IndexNode<K, SkipLink>>(&mut self, arena: &mut SlotArena<N>, id: SlotId) {
        let mut forward: Preds = [None; MAX_LEVEL];
        let mut back: Preds = [None; MAX_LEVEL];
        let height = match arena.get_mut(id) {
            Some(node) => {
                let link = node.link_mut();
                for (lvl, (next, pred)) in link.forward.iter_mut().zip(link.back.iter_mut()).enumerate() {
                    forward[lvl] = next.take();
                    back[lvl] = pred.take();
                }
                link.height()
            },
            None => return,
        };
        debug_assert!(
            self.forward_of(arena, back[0], 0) == Some(id),
            "unlink of a node not in the ordered index"
        );

        for lvl in 0..height {
            self.set_forward(arena, back[lvl], lvl, forward[lvl]);
            self.set_back(arena, forward[lvl], lvl, back[lvl]);
        }
        if forward[0].is_none() {
            self.tail = back[0];
        }

        while self.levels > 0 && self.head[self.levels - 1].is_none() {
            self.levels -= 1;
        }
        self.len -= 1;
    }

    fn find<N: IndexNode<K, SkipLink>>(&self, arena: &SlotArena<N>, key: &K) -> Option<SlotId> {
        let candidate = self.lower_bound(arena, key)?;
        let node = arena.get(candidate)?;
        (self.cmp.compare(node.key(), key) == Ordering::Equal).then_some(candidate)
    }

    fn first(&self) -> Option<SlotId> {
        self.head[0]
    }

    fn next<N: IndexNode<K, SkipLink>>(&self, arena: &SlotArena<N>, id: SlotId) -> Option<SlotId> {
        arena.get(id).and_then(|node| node.link().forward(0))
    }

    fn keys_equal(&self, a: &K, b: &K) -> bool {
        self.cmp.compare(a, b) == Ordering::Equal
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.head = [None; MAX_LEVEL];
        self.tail = None;
        self.levels = 0;
        self.len = 0;
    }

    fn audit<N: IndexNode<K, SkipLink>>(&self, arena: &SlotArena<N>) -> Result<(), String> {
        let mut per_level = [0usize; MAX_LEVEL];
        let mut count = 0usize;
        let mut prev: Option<SlotId> = None;
        let mut current = self.head[0];
        while let Some(id) = current {
            let node = arena
                .get(id)
                .ok_or_else(|| format!("ordered link to vacant slot {}", id.index()))?;
            let link = node.link();
            if link.back(0) != prev {
                return Err(format!("ordered back link broken at slot {}", id.index()));
            }
            if link.height() == 0 || link.height() > MAX_LEVEL || link.back.len() != link.height() {
                return Err(format!("invalid skip height {}", link.height()));
            }
            if let Some(prev_node) = prev.and_then(|p| arena.get(p)) {
                if self.cmp.compare(prev_node.key(), node.key()) == Ordering::Greater {
                    return Err(format!("keys out of order at slot {}", id.index()));
                }
            }
            for slot in per_level.iter_mut().take(link.height()) {
                *slot += 1;
            }
            count += 1;
            if count > self.len {
                return Err("ordered index longer than recorded length".into());
            }
            prev = Some(id);
            current = link.forward(0);
        }
        if count != self.len {
            return Err(format!(
                "ordered index length {} but {} nodes reachable",
                self.len, count
            ));
        }
        if self.tail != prev {
            return Err("ordered tail does not match last node".into());
        }
        for (lvl, &expected) in per_level.iter().enumerate() {
            let mut walked = 0usize;
            let mut prev: Option<SlotId> = None;
            let mut current = self.head[lvl];
            while let Some(id) = current {
                walked += 1;
                if walked > expected {
                    break;
                }
                let link = arena
                    .get(id)
                    .map(|node| node.link())
                    .ok_or_else(|| format!("level {} links vacant slot {}", lvl, id.index()))?;
                if link.back(lvl) != prev {
                    return Err(format!("level {} back link broken at slot {}", lvl, id.index()));
                }
                prev = Some(id);
                current = link.forward(lvl);
            }
            if walked != expected {
                return Err(format!(
                    "level {} links {} nodes but {} are tall enough",
                    lvl, walked, expected
                ));
            }
            if expected > 0 && lvl >= self.levels {
                return Err(format!("level {} in use above level count", lvl));
            }
        }
        Ok(())
    }
}
