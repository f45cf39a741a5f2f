//! Persistent versioned array based on one-step diffs and rerooting.
//!
//! Every [`PersistentArray`] handle is an immutable logical version: `set`
//! returns a new handle and leaves the receiver readable and unchanged. All
//! versions of one lineage share a single arena of nodes. Exactly one node in
//! the lineage is `Direct` and owns the element buffer; every other node is a
//! `Diff` recording a single `(index, value)` delta against a base node, and
//! following the diff chain from any node reaches the `Direct` node.
//!
//! Reading through a `Diff` handle *reroots* the lineage: the buffer migrates
//! to the accessed node one diff step at a time, and each node it passes
//! through is repointed to become a diff of its successor. For a linear chain
//! of sequential edits (the access pattern produced by the rollback
//! union-find) this amortizes to O(1) per operation; the first access to a
//! distant version after branching pays O(distance) once.
//!
//! Handles are reference-counted and not `Send`/`Sync`: rerooting mutates
//! shared linkage, so a lineage is owned by a single thread, matching the
//! single-comparison ownership model of the equivalence tracker.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

/// Errors produced by [`PersistentArray`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayError {
    /// A requested size was below the permitted minimum: zero at creation,
    /// or smaller than the current length for `resize` (shrinking is
    /// unsupported).
    InvalidSize {
        /// The size that was requested.
        requested: usize,
        /// The smallest size that would have been accepted.
        minimum: usize,
    },
    /// An index was outside the handle's logical bounds.
    IndexOutOfRange {
        /// The index that was accessed.
        index: usize,
        /// The logical length of the handle.
        len: usize,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { requested, minimum } => {
                write!(f, "invalid array size {requested}: must be >= {minimum}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of length {len}")
            }
        }
    }
}

impl std::error::Error for ArrayError {}

/// A node in the version arena: either the single buffer owner or a one-step
/// delta against a base node.
enum Node<T> {
    /// Owns the element buffer. The only variant that is ever physically
    /// mutated.
    Direct { buf: Vec<T> },
    /// Reads as `base`, except `index` holds `value`. Immutable once created,
    /// until rerooting repoints it.
    Diff {
        base: usize,
        index: usize,
        value: T,
    },
}

struct Store<T> {
    nodes: Vec<Node<T>>,
}

/// An immutable-handle array with O(1)-amortized persistent point updates.
///
/// Cloning a handle is cheap (a reference-count bump plus two words) and
/// yields a second handle onto the same logical version, which is how the
/// rollback union-find snapshots versions onto its undo stack.
pub struct PersistentArray<T> {
    store: Rc<RefCell<Store<T>>>,
    node: usize,
    len: usize,
}

impl<T> Clone for PersistentArray<T> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            node: self.node,
            len: self.len,
        }
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for PersistentArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.len {
            match self.get(i) {
                Ok(v) => {
                    list.entry(&v);
                }
                Err(_) => {
                    list.entry(&"<out of range>");
                }
            }
        }
        list.finish()
    }
}

impl<T: Clone> PersistentArray<T> {
    /// Creates a new array of length `len`, filling slot `i` with `init(i)`.
    ///
    /// Fails with [`ArrayError::InvalidSize`] (before allocating) when `len`
    /// is zero.
    pub fn new(len: usize, init: impl Fn(usize) -> T) -> Result<Self, ArrayError> {
        if len == 0 {
            return Err(ArrayError::InvalidSize {
                requested: 0,
                minimum: 1,
            });
        }
        let buf: Vec<T> = (0..len).map(init).collect();
        let store = Store {
            nodes: vec![Node::Direct { buf }],
        };
        Ok(Self {
            store: Rc::new(RefCell::new(store)),
            node: 0,
            len,
        })
    }

    /// Returns the logical length of this version.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if this version has no slots. Never true in practice,
    /// since construction rejects zero-length arrays.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the value at `index` in this version.
    ///
    /// Reroots the lineage to this handle first, so repeated reads of the
    /// same version are O(1).
    pub fn get(&self, index: usize) -> Result<T, ArrayError> {
        self.check_bounds(index)?;
        let mut store = self.store.borrow_mut();
        reroot(&mut store, self.node);
        match &store.nodes[self.node] {
            Node::Direct { buf } => Ok(buf[index].clone()),
            Node::Diff { .. } => unreachable!("node is direct after rerooting"),
        }
    }

    /// Returns a new version with `value` at `index`; the receiver remains
    /// readable and unchanged.
    ///
    /// The receiver's node is rerooted, physically updated in place, and then
    /// repointed to become a diff of the new version holding the overwritten
    /// value. This is the only place diff nodes are created.
    pub fn set(&self, index: usize, value: T) -> Result<Self, ArrayError> {
        self.check_bounds(index)?;
        let mut store = self.store.borrow_mut();
        reroot(&mut store, self.node);
        let new_node = store.nodes.len();

        let previous = match &mut store.nodes[self.node] {
            Node::Direct { buf } => mem::replace(&mut buf[index], value),
            Node::Diff { .. } => unreachable!("node is direct after rerooting"),
        };
        // Hand the buffer to the new version; the old version becomes a
        // one-step diff restoring the overwritten value.
        let displaced = mem::replace(
            &mut store.nodes[self.node],
            Node::Diff {
                base: new_node,
                index,
                value: previous,
            },
        );
        match displaced {
            Node::Direct { buf } => store.nodes.push(Node::Direct { buf }),
            Node::Diff { .. } => unreachable!("node is direct after rerooting"),
        }

        Ok(Self {
            store: Rc::clone(&self.store),
            node: new_node,
            len: self.len,
        })
    }

    /// Returns a new version of length `new_len`, with existing slots
    /// preserved and new slots filled by `init`. Shrinking is unsupported.
    ///
    /// The returned handle may share its arena node with the receiver (the
    /// logical length lives in the handle), so growth does not copy the
    /// buffer and does not create a diff: physical slots past a handle's
    /// logical length are simply invisible through it.
    pub fn resize(&self, new_len: usize, init: impl Fn(usize) -> T) -> Result<Self, ArrayError> {
        if new_len < self.len {
            return Err(ArrayError::InvalidSize {
                requested: new_len,
                minimum: self.len,
            });
        }
        let mut store = self.store.borrow_mut();
        reroot(&mut store, self.node);
        match &mut store.nodes[self.node] {
            Node::Direct { buf } => {
                while buf.len() < new_len {
                    buf.push(init(buf.len()));
                }
            }
            Node::Diff { .. } => unreachable!("node is direct after rerooting"),
        }
        Ok(Self {
            store: Rc::clone(&self.store),
            node: self.node,
            len: new_len,
        })
    }

    fn check_bounds(&self, index: usize) -> Result<(), ArrayError> {
        if index >= self.len {
            return Err(ArrayError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}

/// Migrates the `Direct` buffer to `target`, one diff step at a time.
///
/// Each node on the chain between `target` and the current owner swaps roles:
/// the node closer to the owner receives the buffer (with the diff applied)
/// and the previous owner is repointed to a diff holding the value that was
/// overwritten. The chain length is bounded by the arena size; exceeding it
/// means the diff chain is cyclic, which violates the lineage invariant.
fn reroot<T>(store: &mut Store<T>, target: usize) {
    let mut chain = Vec::new();
    let mut owner = target;
    loop {
        match &store.nodes[owner] {
            Node::Direct { .. } => break,
            Node::Diff { base, .. } => {
                chain.push(owner);
                owner = *base;
            }
        }
        if chain.len() > store.nodes.len() {
            unreachable!("diff chain does not terminate at a direct node");
        }
    }

    while let Some(next) = chain.pop() {
        let diff = mem::replace(&mut store.nodes[next], Node::Direct { buf: Vec::new() });
        let Node::Diff { base, index, value } = diff else {
            unreachable!("chain contains only diff nodes");
        };
        debug_assert_eq!(base, owner, "chain steps through consecutive bases");

        let direct = mem::replace(&mut store.nodes[owner], Node::Direct { buf: Vec::new() });
        let Node::Direct { mut buf } = direct else {
            unreachable!("buffer owner is the direct node");
        };
        let previous = mem::replace(&mut buf[index], value);
        store.nodes[owner] = Node::Diff {
            base: next,
            index,
            value: previous,
        };
        store.nodes[next] = Node::Direct { buf };
        owner = next;
    }
}
