//! Union-find (disjoint set) with stack-ordered rollback of unions.
//!
//! Elements start out as singletons, are merged with [`DisjointSet::union`],
//! and are queried with [`DisjointSet::equivalent`]. Unlike a conventional
//! union-find, every `union` call records the prior state of the backing
//! [`PersistentArray`] on a version stack, so [`DisjointSet::deunion`] can
//! undo the most recent unions in LIFO order. This is what lets a
//! backtracking algorithm open a speculative equivalence assumption, recurse,
//! and retract exactly that assumption on the way out.
//!
//! Keys are compared with their own `Eq`/`Hash` and are assigned dense
//! integer ids in first-seen order. Callers that need reference-identity
//! semantics (the deep comparer does — structural equality is exactly the
//! property under computation) must pass identity-bearing keys such as arena
//! ids, never structurally-compared values.
//!
//! Roots are found with union-by-rank; path compression runs only inside
//! `union`, where the rewritten parent pointers fall into the same rollback
//! unit as the link itself. The read path (`equivalent`) never compresses:
//! a compression performed there would not belong to any rollback unit and
//! would desynchronize the version stack from the recorded union count.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::persistent_array::PersistentArray;

/// Errors produced by [`DisjointSet`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisjointSetError {
    /// A zero expected capacity was supplied at construction.
    InvalidCapacity,
    /// A `deunion` count exceeded the number of recorded unions. No rollback
    /// is performed when this is returned.
    InvalidUndoCount {
        /// The number of unions the caller asked to undo.
        requested: usize,
        /// The number of unions currently recorded.
        recorded: usize,
    },
}

impl fmt::Display for DisjointSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity => write!(f, "expected capacity must be > 0"),
            Self::InvalidUndoCount {
                requested,
                recorded,
            } => write!(
                f,
                "cannot undo {requested} unions: only {recorded} are recorded"
            ),
        }
    }
}

impl std::error::Error for DisjointSetError {}

/// Per-element record stored in the backing array.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SetNode {
    parent: usize,
    rank: u32,
}

/// The initializer for backing-array slots: element `i` is its own root.
fn singleton(i: usize) -> SetNode {
    SetNode { parent: i, rank: 0 }
}

const DEFAULT_CAPACITY: usize = 32;

/// A disjoint-set structure whose `union` operations can be undone in
/// stack order.
///
/// Ids past the end of the backing array are implicit singletons; the array
/// grows lazily (doubling) when a union actually links such an id, and the
/// growth is part of that union's rollback unit.
#[derive(Debug)]
pub struct DisjointSet<K> {
    ids: HashMap<K, usize>,
    backing: PersistentArray<SetNode>,
    versions: Vec<PersistentArray<SetNode>>,
}

impl<K: Eq + Hash + Clone> Default for DisjointSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> DisjointSet<K> {
    /// Creates a new `DisjointSet` with the default expected capacity (32).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
            .unwrap_or_else(|_| unreachable!("default capacity is non-zero"))
    }

    /// Creates a new `DisjointSet` sized for `expected` elements.
    ///
    /// The capacity only sizes the initial backing array; the structure grows
    /// as needed. Fails with [`DisjointSetError::InvalidCapacity`] when
    /// `expected` is zero.
    pub fn with_capacity(expected: usize) -> Result<Self, DisjointSetError> {
        let backing = PersistentArray::new(expected, singleton)
            .map_err(|_| DisjointSetError::InvalidCapacity)?;
        Ok(Self {
            ids: HashMap::new(),
            backing,
            versions: Vec::new(),
        })
    }

    /// Places `a` and `b` in the same set.
    ///
    /// Exactly one version is pushed onto the undo stack per call, no-op
    /// unions included, so `deunion` counts always mirror `union` call
    /// counts. Any backing-array growth, the link itself, and the path
    /// compression performed while finding the two roots all land in that
    /// single rollback unit.
    pub fn union(&mut self, a: &K, b: &K) {
        let ia = self.id_of(a);
        let ib = self.id_of(b);
        self.versions.push(self.backing.clone());

        let ra = self.find_compressing(ia);
        let rb = self.find_compressing(ib);
        if ra == rb {
            return;
        }

        let rank_a = self.node(ra).rank;
        let rank_b = self.node(rb).rank;
        match rank_a.cmp(&rank_b) {
            std::cmp::Ordering::Less => self.link(ra, rb, None),
            std::cmp::Ordering::Greater => self.link(rb, ra, None),
            std::cmp::Ordering::Equal => self.link(ra, rb, Some(rank_b + 1)),
        }
    }

    /// Returns `true` if `a` and `b` are currently in the same set.
    ///
    /// Unseen keys are assigned ids (as singletons) but the version stack is
    /// untouched: this is a read with respect to rollback accounting.
    pub fn equivalent(&mut self, a: &K, b: &K) -> bool {
        let ia = self.id_of(a);
        let ib = self.id_of(b);
        self.root_of(ia) == self.root_of(ib)
    }

    /// Undoes the last `count` [`DisjointSet::union`] operations.
    ///
    /// Fails with [`DisjointSetError::InvalidUndoCount`] when `count` exceeds
    /// the number of recorded unions; on failure no rollback at all is
    /// performed. (An undo count can never be negative: it is a `usize`.)
    pub fn deunion(&mut self, count: usize) -> Result<(), DisjointSetError> {
        if count > self.versions.len() {
            return Err(DisjointSetError::InvalidUndoCount {
                requested: count,
                recorded: self.versions.len(),
            });
        }
        for _ in 0..count {
            match self.versions.pop() {
                Some(prior) => self.backing = prior,
                None => unreachable!("count checked against the version stack"),
            }
        }
        Ok(())
    }

    /// Undoes every recorded union, restoring the all-singletons relation.
    pub fn deunion_all(&mut self) {
        if self.deunion(self.versions.len()).is_err() {
            unreachable!("undoing exactly the recorded count cannot fail");
        }
    }

    /// Returns the number of unions currently recorded (and undoable).
    pub fn recorded_unions(&self) -> usize {
        self.versions.len()
    }

    /// Returns the number of distinct keys seen so far.
    pub fn element_count(&self) -> usize {
        self.ids.len()
    }

    /// Returns the dense id for `key`, assigning the next id on first sight.
    fn id_of(&mut self, key: &K) -> usize {
        let next = self.ids.len();
        *self.ids.entry(key.clone()).or_insert(next)
    }

    /// Reads the record for `id`; ids past the backing array are implicit
    /// singletons.
    fn node(&self, id: usize) -> SetNode {
        if id >= self.backing.len() {
            return singleton(id);
        }
        match self.backing.get(id) {
            Ok(node) => node,
            Err(_) => unreachable!("id is within the backing array"),
        }
    }

    /// Root lookup without compression; used by the read path.
    fn root_of(&self, mut id: usize) -> usize {
        loop {
            let parent = self.node(id).parent;
            if parent == id {
                return id;
            }
            id = parent;
        }
    }

    /// Root lookup with full path compression. Every rewritten parent pointer
    /// is an undoable `set` on the backing array, so this must only run
    /// after the caller has pushed the current version (i.e. inside `union`).
    fn find_compressing(&mut self, id: usize) -> usize {
        let root = self.root_of(id);
        let mut current = id;
        while current != root {
            let node = self.node(current);
            if node.parent != root {
                // A non-root parent pointer only exists at ids the backing
                // array already covers, so this store cannot grow it.
                self.store(current, SetNode {
                    parent: root,
                    rank: node.rank,
                });
            }
            current = node.parent;
        }
        root
    }

    /// Attaches `child`'s root under `parent`'s root, growing the backing
    /// array first so both records are physically present. `bump` carries the
    /// new rank of the surviving root when the ranks were tied.
    fn link(&mut self, child: usize, parent: usize, bump: Option<u32>) {
        self.grow_to_cover(child.max(parent));
        let child_rank = self.node(child).rank;
        self.store(child, SetNode {
            parent,
            rank: child_rank,
        });
        if let Some(rank) = bump {
            let parent_parent = self.node(parent).parent;
            self.store(parent, SetNode {
                parent: parent_parent,
                rank,
            });
        }
    }

    /// Doubles the backing array until it covers `id`. New slots are
    /// initialized as singletons; slots that were grown on an undone timeline
    /// and are being re-grown already hold their singleton state, because
    /// every later mutation went through an undoable `set`.
    fn grow_to_cover(&mut self, id: usize) {
        if id < self.backing.len() {
            return;
        }
        let mut new_len = self.backing.len();
        while new_len <= id {
            new_len *= 2;
        }
        match self.backing.resize(new_len, singleton) {
            Ok(next) => self.backing = next,
            Err(_) => unreachable!("resize only ever grows"),
        }
    }

    fn store(&mut self, id: usize, node: SetNode) {
        match self.backing.set(id, node) {
            Ok(next) => self.backing = next,
            Err(_) => unreachable!("backing array covers id"),
        }
    }
}
