//! Dynamic value graphs with explicit identity.
//!
//! The comparer does not operate on host objects directly; callers describe
//! their data as a graph of [`Value`]s inside a [`ValueArena`]. Composite
//! values reference their constituents by [`ValueId`], so graphs may be
//! self-referential or mutually referential. A `ValueId` is the value's
//! *identity*: two structurally identical values allocated separately have
//! distinct ids, which is exactly the distinction the equality engine needs
//! (structural equality is the property being computed, so nothing in the
//! engine may key on it).
//!
//! Cyclic graphs are built in two steps: allocate the composite, then patch
//! constituents in with [`ValueArena::set_field`] and friends.

use std::fmt;

use serde::Serialize;

/// Errors produced when patching values in a [`ValueArena`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// A mutator was applied to a value of the wrong kind (for example
    /// `set_field` on a sequence).
    KindMismatch {
        /// The kind the mutator requires.
        expected: &'static str,
        /// The kind that was found.
        found: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch { expected, found } => {
                write!(f, "expected a {expected} value, found {found}")
            }
        }
    }
}

impl std::error::Error for ArenaError {}

/// Identity of a value within its [`ValueArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ValueId(usize);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in a value graph.
///
/// Atoms (`Null`, `Bool`, `Int`, `Float`, `Str`) carry their payload inline;
/// composites reference constituents by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value.
    Null,
    /// A boolean atom.
    Bool(bool),
    /// A signed integer atom.
    Int(i64),
    /// A floating-point atom.
    Float(f64),
    /// A string atom.
    Str(String),
    /// A named composite with ordered, named fields.
    Record {
        /// The record's runtime type name; part of its [`TypeTag`].
        type_name: String,
        /// Field name/value pairs in declaration order.
        fields: Vec<(String, ValueId)>,
    },
    /// An ordered sequence of elements.
    Seq(Vec<ValueId>),
    /// An unordered collection of elements.
    Set(Vec<ValueId>),
    /// A collection of key/value entries.
    Map(Vec<(ValueId, ValueId)>),
}

/// The runtime type of a value, as seen by the comparer's exact-type check.
///
/// Kinds are distinct types; records additionally carry their type name, so
/// `Record("Circle")` and `Record("Ellipse")` never match (there is no
/// subtype relation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    /// Type of [`Value::Null`].
    Null,
    /// Type of [`Value::Bool`].
    Bool,
    /// Type of [`Value::Int`].
    Int,
    /// Type of [`Value::Float`].
    Float,
    /// Type of [`Value::Str`].
    Str,
    /// Type of [`Value::Record`], distinguished by name.
    Record(String),
    /// Type of [`Value::Seq`].
    Seq,
    /// Type of [`Value::Set`].
    Set,
    /// Type of [`Value::Map`].
    Map,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "string"),
            Self::Record(name) => write!(f, "record {name}"),
            Self::Seq => write!(f, "sequence"),
            Self::Set => write!(f, "set"),
            Self::Map => write!(f, "map"),
        }
    }
}

impl Value {
    /// Returns the runtime type of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Null => TypeTag::Null,
            Self::Bool(_) => TypeTag::Bool,
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::Str(_) => TypeTag::Str,
            Self::Record { type_name, .. } => TypeTag::Record(type_name.clone()),
            Self::Seq(_) => TypeTag::Seq,
            Self::Set(_) => TypeTag::Set,
            Self::Map(_) => TypeTag::Map,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Record { .. } => "record",
            Self::Seq(_) => "sequence",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }
}

/// Built-in equality for atoms.
///
/// Floats compare NaN equal to NaN (payload equality, not IEEE `==`), so a
/// value graph containing NaN is equal to itself. Composites are never
/// atom-equal; they are decomposed instead.
pub(crate) fn atoms_equal(a: &Value, b: &Value) -> bool {
    match a {
        Value::Null => matches!(b, Value::Null),
        Value::Bool(x) => {
            if let Value::Bool(y) = b {
                x == y
            } else {
                false
            }
        }
        Value::Int(x) => {
            if let Value::Int(y) = b {
                x == y
            } else {
                false
            }
        }
        Value::Float(x) => {
            if let Value::Float(y) = b {
                *x == *y || (x.is_nan() && y.is_nan())
            } else {
                false
            }
        }
        Value::Str(x) => {
            if let Value::Str(y) = b {
                x == y
            } else {
                false
            }
        }
        Value::Record { .. } | Value::Seq(_) | Value::Set(_) | Value::Map(_) => false,
    }
}

/// Owns the values of one or more graphs and hands out ids for them.
///
/// A single comparison may draw both of its operands from the same arena (the
/// usual case) or the caller may keep one arena per graph and compare within
/// a merged arena; ids are only meaningful relative to their arena.
#[derive(Debug, Default)]
pub struct ValueArena {
    values: Vec<Value>,
}

impl ValueArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `value` and returns its identity.
    pub fn alloc(&mut self, value: Value) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(value);
        id
    }

    /// Returns the value with identity `id`.
    ///
    /// Indexing with an id from a different arena is a caller logic error and
    /// may panic or return an unrelated value.
    pub fn get(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    /// Returns the number of values allocated.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // Convenience allocators, mostly for tests and builders.

    /// Allocates a [`Value::Null`].
    pub fn null(&mut self) -> ValueId {
        self.alloc(Value::Null)
    }

    /// Allocates a [`Value::Bool`].
    pub fn bool(&mut self, v: bool) -> ValueId {
        self.alloc(Value::Bool(v))
    }

    /// Allocates a [`Value::Int`].
    pub fn int(&mut self, v: i64) -> ValueId {
        self.alloc(Value::Int(v))
    }

    /// Allocates a [`Value::Float`].
    pub fn float(&mut self, v: f64) -> ValueId {
        self.alloc(Value::Float(v))
    }

    /// Allocates a [`Value::Str`].
    pub fn str(&mut self, v: impl Into<String>) -> ValueId {
        self.alloc(Value::Str(v.into()))
    }

    /// Allocates a [`Value::Record`] with the given type name and fields.
    pub fn record(
        &mut self,
        type_name: impl Into<String>,
        fields: Vec<(String, ValueId)>,
    ) -> ValueId {
        self.alloc(Value::Record {
            type_name: type_name.into(),
            fields,
        })
    }

    /// Allocates a [`Value::Seq`].
    pub fn seq(&mut self, elements: Vec<ValueId>) -> ValueId {
        self.alloc(Value::Seq(elements))
    }

    /// Allocates a [`Value::Set`].
    pub fn set(&mut self, elements: Vec<ValueId>) -> ValueId {
        self.alloc(Value::Set(elements))
    }

    /// Allocates a [`Value::Map`].
    pub fn map(&mut self, entries: Vec<(ValueId, ValueId)>) -> ValueId {
        self.alloc(Value::Map(entries))
    }

    // Mutators for building cyclic graphs: allocate first, patch after.

    /// Sets field `name` on the record `id`, replacing an existing field of
    /// that name or appending a new one. This is how back-references (and
    /// thus cycles) are introduced.
    pub fn set_field(
        &mut self,
        id: ValueId,
        name: impl Into<String>,
        child: ValueId,
    ) -> Result<(), ArenaError> {
        let name = name.into();
        match &mut self.values[id.0] {
            Value::Record { fields, .. } => {
                for (existing, slot) in fields.iter_mut() {
                    if *existing == name {
                        *slot = child;
                        return Ok(());
                    }
                }
                fields.push((name, child));
                Ok(())
            }
            other @ (Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Seq(_)
            | Value::Set(_)
            | Value::Map(_)) => Err(ArenaError::KindMismatch {
                expected: "record",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    /// Appends `child` to the sequence or set `id`.
    pub fn push_element(&mut self, id: ValueId, child: ValueId) -> Result<(), ArenaError> {
        match &mut self.values[id.0] {
            Value::Seq(elements) | Value::Set(elements) => {
                elements.push(child);
                Ok(())
            }
            other @ (Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Record { .. }
            | Value::Map(_)) => Err(ArenaError::KindMismatch {
                expected: "sequence or set",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    /// Appends a key/value entry to the map `id`.
    pub fn push_entry(
        &mut self,
        id: ValueId,
        key: ValueId,
        value: ValueId,
    ) -> Result<(), ArenaError> {
        match &mut self.values[id.0] {
            Value::Map(entries) => {
                entries.push((key, value));
                Ok(())
            }
            other @ (Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Record { .. }
            | Value::Seq(_)
            | Value::Set(_)) => Err(ArenaError::KindMismatch {
                expected: "map",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    /// Sets the value of the map entry whose key has identity `key`,
    /// replacing an existing entry or appending a new one. Like
    /// [`ValueArena::set_field`], this is a cycle-building mutator: the value
    /// may be the map itself or any ancestor of it.
    pub fn set_entry_value(
        &mut self,
        id: ValueId,
        key: ValueId,
        value: ValueId,
    ) -> Result<(), ArenaError> {
        match &mut self.values[id.0] {
            Value::Map(entries) => {
                for (existing, slot) in entries.iter_mut() {
                    if *existing == key {
                        *slot = value;
                        return Ok(());
                    }
                }
                entries.push((key, value));
                Ok(())
            }
            other @ (Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Record { .. }
            | Value::Seq(_)
            | Value::Set(_)) => Err(ArenaError::KindMismatch {
                expected: "map",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    /// Loads a `serde_json` document into the arena and returns the root id.
    ///
    /// JSON objects become maps with string keys (JSON carries no type names,
    /// so records are not used), arrays become sequences, numbers become
    /// `Int` when they fit in `i64` and `Float` otherwise. JSON documents are
    /// always acyclic.
    pub fn from_json(&mut self, json: &serde_json::Value) -> ValueId {
        match json {
            serde_json::Value::Null => self.null(),
            serde_json::Value::Bool(b) => self.bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => self.int(i),
                None => self.float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => self.str(s.clone()),
            serde_json::Value::Array(items) => {
                let elements: Vec<ValueId> = items.iter().map(|v| self.from_json(v)).collect();
                self.seq(elements)
            }
            serde_json::Value::Object(members) => {
                let entries: Vec<(ValueId, ValueId)> = members
                    .iter()
                    .map(|(k, v)| {
                        let key = self.str(k.clone());
                        let value = self.from_json(v);
                        (key, value)
                    })
                    .collect();
                self.map(entries)
            }
        }
    }
}
