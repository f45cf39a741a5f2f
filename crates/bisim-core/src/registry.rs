//! Type-to-strategy dispatch for the deep comparer.
//!
//! The comparer itself never inspects a composite value's shape directly; it
//! asks a [`ComparatorRegistry`] how to decompose the value into comparable
//! constituents. The registry is an ordered list of `(predicate, strategy)`
//! rules over the value's [`TypeTag`] — first match wins — with a mandatory
//! generic field-by-field fallback for records. Rules pushed by the caller
//! take precedence over the built-in ones, which is how, say, a sequence can
//! be re-declared as order-insensitive for one comparison.
//!
//! `strategy_for` is a pure function of the runtime type: the same tag always
//! yields the same strategy for a given registry. Callers are free to memoize
//! it; correctness never depends on that.

use std::fmt;

use crate::value::{TypeTag, Value, ValueArena, ValueId};

/// Errors produced by strategy selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No rule matched the value's type and the fallback did not apply, or a
    /// rule selected a strategy the value's shape cannot satisfy.
    UnsupportedType {
        /// Runtime type of the offending value.
        type_tag: TypeTag,
        /// The strategy that could not be applied, if one was selected.
        strategy: Option<Strategy>,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType { type_tag, strategy } => match strategy {
                Some(s) => write!(f, "strategy {s} is not applicable to values of type {type_tag}"),
                None => write!(f, "no decomposition strategy for values of type {type_tag}"),
            },
        }
    }
}

impl std::error::Error for RegistryError {}

/// The closed set of decomposition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Compare with built-in atom equality; no recursion.
    Atomic,
    /// Decompose into named fields, compared by name.
    Fields,
    /// Decompose into elements compared position by position.
    OrderedElements,
    /// Decompose into elements matched without regard to order.
    UnorderedElements,
    /// Decompose into key/value entries matched without regard to order.
    MapEntries,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => write!(f, "atomic"),
            Self::Fields => write!(f, "fields"),
            Self::OrderedElements => write!(f, "ordered-elements"),
            Self::UnorderedElements => write!(f, "unordered-elements"),
            Self::MapEntries => write!(f, "map-entries"),
        }
    }
}

/// A strategy applied to a concrete value: the constituents the comparer
/// recurses into.
#[derive(Debug, Clone, PartialEq)]
pub enum Decomposition {
    /// The value is a leaf; compare with built-in equality.
    Atomic,
    /// Named constituents, in declaration order.
    Fields(Vec<(String, ValueId)>),
    /// Positional constituents.
    OrderedElements(Vec<ValueId>),
    /// Order-insensitive constituents.
    UnorderedElements(Vec<ValueId>),
    /// Order-insensitive key/value constituents.
    MapEntries(Vec<(ValueId, ValueId)>),
}

type Predicate = Box<dyn Fn(&TypeTag) -> bool>;

struct Rule {
    predicate: Predicate,
    strategy: Strategy,
}

/// Ordered `(type predicate, strategy)` table with a generic field-by-field
/// fallback for records.
///
/// [`ComparatorRegistry::default`] routes atoms to [`Strategy::Atomic`],
/// sequences to [`Strategy::OrderedElements`], sets to
/// [`Strategy::UnorderedElements`], and maps to [`Strategy::MapEntries`];
/// records are handled by the fallback. An empty registry built with
/// [`ComparatorRegistry::new`] still decomposes records (the fallback is not
/// optional) but rejects everything else.
pub struct ComparatorRegistry {
    rules: Vec<Rule>,
}

impl fmt::Debug for ComparatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorRegistry")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Default for ComparatorRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.rules.push(Rule {
            predicate: Box::new(|tag| {
                match tag {
                    TypeTag::Null
                    | TypeTag::Bool
                    | TypeTag::Int
                    | TypeTag::Float
                    | TypeTag::Str => true,
                    TypeTag::Record(_) | TypeTag::Seq | TypeTag::Set | TypeTag::Map => false,
                }
            }),
            strategy: Strategy::Atomic,
        });
        registry.rules.push(Rule {
            predicate: Box::new(|tag| *tag == TypeTag::Seq),
            strategy: Strategy::OrderedElements,
        });
        registry.rules.push(Rule {
            predicate: Box::new(|tag| *tag == TypeTag::Set),
            strategy: Strategy::UnorderedElements,
        });
        registry.rules.push(Rule {
            predicate: Box::new(|tag| *tag == TypeTag::Map),
            strategy: Strategy::MapEntries,
        });
        registry
    }
}

impl ComparatorRegistry {
    /// Creates a registry with no rules (only the record fallback applies).
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Prepends a rule; caller rules take precedence over earlier and
    /// built-in ones.
    pub fn push_rule(&mut self, predicate: impl Fn(&TypeTag) -> bool + 'static, strategy: Strategy) {
        self.rules.insert(0, Rule {
            predicate: Box::new(predicate),
            strategy,
        });
    }

    /// Selects the strategy for `id`'s runtime type and applies it to the
    /// value, yielding its constituents.
    ///
    /// Fails with [`RegistryError::UnsupportedType`] when no rule (and not
    /// the fallback) covers the type, or when the selected strategy does not
    /// fit the value's shape.
    pub fn strategy_for(
        &self,
        arena: &ValueArena,
        id: ValueId,
    ) -> Result<Decomposition, RegistryError> {
        let value = arena.get(id);
        let tag = value.type_tag();
        for rule in &self.rules {
            if (rule.predicate)(&tag) {
                return apply(rule.strategy, value, &tag);
            }
        }
        // Mandatory fallback: generic field-by-field comparison of records.
        if let TypeTag::Record(_) = tag {
            return apply(Strategy::Fields, value, &tag);
        }
        Err(RegistryError::UnsupportedType {
            type_tag: tag,
            strategy: None,
        })
    }
}

fn apply(strategy: Strategy, value: &Value, tag: &TypeTag) -> Result<Decomposition, RegistryError> {
    let unsupported = || RegistryError::UnsupportedType {
        type_tag: tag.clone(),
        strategy: Some(strategy),
    };
    match strategy {
        Strategy::Atomic => match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
                Ok(Decomposition::Atomic)
            }
            Value::Record { .. } | Value::Seq(_) | Value::Set(_) | Value::Map(_) => {
                Err(unsupported())
            }
        },
        Strategy::Fields => match value {
            Value::Record { fields, .. } => Ok(Decomposition::Fields(fields.clone())),
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Seq(_)
            | Value::Set(_)
            | Value::Map(_) => Err(unsupported()),
        },
        Strategy::OrderedElements => match value {
            Value::Seq(elements) | Value::Set(elements) => {
                Ok(Decomposition::OrderedElements(elements.clone()))
            }
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Record { .. }
            | Value::Map(_) => Err(unsupported()),
        },
        Strategy::UnorderedElements => match value {
            Value::Seq(elements) | Value::Set(elements) => {
                Ok(Decomposition::UnorderedElements(elements.clone()))
            }
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Record { .. }
            | Value::Map(_) => Err(unsupported()),
        },
        Strategy::MapEntries => match value {
            Value::Map(entries) => Ok(Decomposition::MapEntries(entries.clone())),
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Record { .. }
            | Value::Seq(_)
            | Value::Set(_) => Err(unsupported()),
        },
    }
}
