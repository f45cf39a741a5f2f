//! Equivalence-tracking deep comparison of value graphs.
//!
//! Implements a coinductive (bisimulation-style) equality: before descending
//! into a composite pair, the pair is speculatively assumed equal by unioning
//! the two identities in a rollback [`DisjointSet`]; any pair reached again
//! while that assumption is open short-circuits to "equal" instead of
//! recursing, which is what makes the comparison terminate on cyclic graphs.
//! The assumption is retracted with `deunion` on every exit path, so it is
//! scoped exactly to the dynamic extent of the composite comparison and
//! sibling subtrees reusing the same identities are unaffected.
//!
//! Mismatches are data, not control flow: a mismatched constituent never
//! stops the traversal of its siblings, so the result carries every mismatch
//! found, each addressed by a [`Path`] from the root pair.
//!
//! Worst-case cost is proportional to the total reachable identity count
//! across both graphs; recursion depth is bounded by the longest acyclic
//! path, not by cycle length.

use std::fmt;

use serde::Serialize;

use crate::disjoint_set::DisjointSet;
use crate::registry::{ComparatorRegistry, Decomposition, RegistryError};
use crate::render::preview;
use crate::value::{Value, ValueArena, ValueId, atoms_equal};

/// Errors that abort a comparison outright.
///
/// Structural differences are never errors; only malformed input is (today
/// that means a value the registry cannot decompose).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// The registry had no applicable decomposition strategy.
    Unsupported(RegistryError),
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(e) => write!(f, "comparison aborted: {e}"),
        }
    }
}

impl std::error::Error for CompareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unsupported(e) => Some(e),
        }
    }
}

impl From<RegistryError> for CompareError {
    fn from(e: RegistryError) -> Self {
        Self::Unsupported(e)
    }
}

/// One step of a [`Path`] into a decomposed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PathStep {
    /// A named record field.
    Field(String),
    /// A position in an ordered sequence.
    Index(usize),
    /// The ordinal (in the expected value) of an unordered element or entry.
    Element(usize),
    /// The value of the map entry at the given expected ordinal.
    EntryValue(usize),
}

/// Location of a mismatch, as steps from the root pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Path(Vec<PathStep>);

impl Path {
    /// The path of the root pair itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// The steps from the root, outermost first.
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    fn push(&mut self, step: PathStep) {
        self.0.push(step);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            match step {
                PathStep::Field(name) => write!(f, ".{name}")?,
                PathStep::Index(i) => write!(f, "[{i}]")?,
                PathStep::Element(i) => write!(f, "{{{i}}}")?,
                PathStep::EntryValue(i) => write!(f, "{{{i}}}.value")?,
            }
        }
        Ok(())
    }
}

/// Classification of a single mismatch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchKind {
    /// Exactly one side was absent (`Null`).
    Absence,
    /// The runtime types differ.
    TypeMismatch,
    /// Two atoms differ under built-in equality.
    ValueMismatch,
    /// Two collections have different element or entry counts.
    LengthMismatch,
    /// A field of the expected record is missing from the actual record.
    MissingField,
    /// The actual record carries a field the expected record lacks.
    UnexpectedField,
    /// An expected element or entry matches nothing on the actual side.
    UnmatchedExpected,
    /// An actual element or entry matches nothing on the expected side.
    UnmatchedActual,
}

/// A single structural difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// What kind of difference this is.
    pub kind: MismatchKind,
    /// Where in the structure it was found.
    pub path: Path,
    /// Short rendering of the expected side at that location.
    pub expected: String,
    /// Short rendering of the actual side at that location.
    pub actual: String,
    /// Subordinate mismatches explaining this one, where available (for an
    /// unmatched map entry whose key is present exactly once on the actual
    /// side, these detail why the values differ).
    pub children: Vec<Mismatch>,
}

/// The outcome of a deep comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// `true` when no mismatch was found.
    pub matched: bool,
    /// Every mismatch found, in traversal order.
    pub mismatches: Vec<Mismatch>,
}

/// Deeply compares two value graphs with the default registry.
///
/// A fresh equivalence tracker is created per call; a `Comparison` with
/// `matched == false` carries the complete mismatch list.
pub fn deeply_equal(
    arena: &ValueArena,
    expected: ValueId,
    actual: ValueId,
) -> Result<Comparison, CompareError> {
    deeply_equal_with(arena, expected, actual, &ComparatorRegistry::default())
}

/// Deeply compares two value graphs using a caller-supplied registry.
pub fn deeply_equal_with(
    arena: &ValueArena,
    expected: ValueId,
    actual: ValueId,
    registry: &ComparatorRegistry,
) -> Result<Comparison, CompareError> {
    let mut comparer = Comparer {
        arena,
        registry,
        tracker: DisjointSet::new(),
    };
    let mut mismatches = Vec::new();
    let mut path = Path::root();
    comparer.compare_pair(expected, actual, &mut path, &mut mismatches)?;
    Ok(Comparison {
        matched: mismatches.is_empty(),
        mismatches,
    })
}

struct Comparer<'a> {
    arena: &'a ValueArena,
    registry: &'a ComparatorRegistry,
    tracker: DisjointSet<ValueId>,
}

impl Comparer<'_> {
    /// Compares one pair of identities, appending any mismatches to `out`.
    fn compare_pair(
        &mut self,
        expected: ValueId,
        actual: ValueId,
        path: &mut Path,
        out: &mut Vec<Mismatch>,
    ) -> Result<(), CompareError> {
        let expected_value = self.arena.get(expected);
        let actual_value = self.arena.get(actual);

        // Absence: an absent expected value matches only an absent actual.
        let expected_absent = matches!(expected_value, Value::Null);
        let actual_absent = matches!(actual_value, Value::Null);
        if expected_absent || actual_absent {
            if expected_absent != actual_absent {
                out.push(mismatch_at(
                    MismatchKind::Absence,
                    path,
                    preview(self.arena, expected),
                    preview(self.arena, actual),
                ));
            }
            return Ok(());
        }

        // Exact runtime type; no subtype relation is ever tolerated.
        let expected_tag = expected_value.type_tag();
        let actual_tag = actual_value.type_tag();
        if expected_tag != actual_tag {
            out.push(mismatch_at(
                MismatchKind::TypeMismatch,
                path,
                expected_tag.to_string(),
                actual_tag.to_string(),
            ));
            return Ok(());
        }

        // Cycle short-circuit: the pair is the same object, or it is already
        // assumed equal by an open ancestor comparison.
        if expected == actual || self.tracker.equivalent(&expected, &actual) {
            return Ok(());
        }

        // Speculatively assume the pair equal, descend, then retract the
        // assumption on every exit path (error propagation included).
        self.tracker.union(&expected, &actual);
        let result = self.compare_constituents(expected, actual, path, out);
        match self.tracker.deunion(1) {
            Ok(()) => result,
            Err(_) => unreachable!("a union was recorded just above"),
        }
    }

    fn compare_constituents(
        &mut self,
        expected: ValueId,
        actual: ValueId,
        path: &mut Path,
        out: &mut Vec<Mismatch>,
    ) -> Result<(), CompareError> {
        match self.registry.strategy_for(self.arena, expected)? {
            Decomposition::Atomic => {
                if !atoms_equal(self.arena.get(expected), self.arena.get(actual)) {
                    out.push(mismatch_at(
                        MismatchKind::ValueMismatch,
                        path,
                        preview(self.arena, expected),
                        preview(self.arena, actual),
                    ));
                }
                Ok(())
            }
            Decomposition::Fields(expected_fields) => {
                let Decomposition::Fields(actual_fields) =
                    self.registry.strategy_for(self.arena, actual)?
                else {
                    unreachable!("strategy is a pure function of the runtime type");
                };
                self.compare_fields(&expected_fields, &actual_fields, path, out)
            }
            Decomposition::OrderedElements(expected_elements) => {
                let Decomposition::OrderedElements(actual_elements) =
                    self.registry.strategy_for(self.arena, actual)?
                else {
                    unreachable!("strategy is a pure function of the runtime type");
                };
                self.compare_ordered(&expected_elements, &actual_elements, path, out)
            }
            Decomposition::UnorderedElements(expected_elements) => {
                let Decomposition::UnorderedElements(actual_elements) =
                    self.registry.strategy_for(self.arena, actual)?
                else {
                    unreachable!("strategy is a pure function of the runtime type");
                };
                self.compare_unordered(&expected_elements, &actual_elements, path, out)
            }
            Decomposition::MapEntries(expected_entries) => {
                let Decomposition::MapEntries(actual_entries) =
                    self.registry.strategy_for(self.arena, actual)?
                else {
                    unreachable!("strategy is a pure function of the runtime type");
                };
                self.compare_entries(&expected_entries, &actual_entries, path, out)
            }
        }
    }

    /// Fields are matched by name; every expected field is visited whether or
    /// not an earlier one already mismatched.
    fn compare_fields(
        &mut self,
        expected_fields: &[(String, ValueId)],
        actual_fields: &[(String, ValueId)],
        path: &mut Path,
        out: &mut Vec<Mismatch>,
    ) -> Result<(), CompareError> {
        for (name, expected_id) in expected_fields {
            path.push(PathStep::Field(name.clone()));
            match actual_fields.iter().find(|(n, _)| n == name) {
                Some((_, actual_id)) => {
                    self.compare_pair(*expected_id, *actual_id, path, out)?;
                }
                None => {
                    out.push(mismatch_at(
                        MismatchKind::MissingField,
                        path,
                        preview(self.arena, *expected_id),
                        "<absent>".to_owned(),
                    ));
                }
            }
            path.pop();
        }
        for (name, actual_id) in actual_fields {
            if !expected_fields.iter().any(|(n, _)| n == name) {
                path.push(PathStep::Field(name.clone()));
                out.push(mismatch_at(
                    MismatchKind::UnexpectedField,
                    path,
                    "<absent>".to_owned(),
                    preview(self.arena, *actual_id),
                ));
                path.pop();
            }
        }
        Ok(())
    }

    /// Ordered elements are compared position by position. A length mismatch
    /// is recorded but the shared prefix is still traversed, so per-element
    /// diagnostics survive a trailing insertion.
    fn compare_ordered(
        &mut self,
        expected_elements: &[ValueId],
        actual_elements: &[ValueId],
        path: &mut Path,
        out: &mut Vec<Mismatch>,
    ) -> Result<(), CompareError> {
        if expected_elements.len() != actual_elements.len() {
            out.push(mismatch_at(
                MismatchKind::LengthMismatch,
                path,
                format!("{} elements", expected_elements.len()),
                format!("{} elements", actual_elements.len()),
            ));
        }
        let common = expected_elements.len().min(actual_elements.len());
        for i in 0..common {
            path.push(PathStep::Index(i));
            self.compare_pair(expected_elements[i], actual_elements[i], path, out)?;
            path.pop();
        }
        Ok(())
    }

    /// Unordered elements use the double-coverage check: every expected
    /// element must deeply match at least one actual element and vice versa.
    /// This is weaker than a perfect matching (which would need a bipartite
    /// matching search) but is what the all-pairs probe can decide cheaply.
    fn compare_unordered(
        &mut self,
        expected_elements: &[ValueId],
        actual_elements: &[ValueId],
        path: &mut Path,
        out: &mut Vec<Mismatch>,
    ) -> Result<(), CompareError> {
        if expected_elements.len() != actual_elements.len() {
            out.push(mismatch_at(
                MismatchKind::LengthMismatch,
                path,
                format!("{} elements", expected_elements.len()),
                format!("{} elements", actual_elements.len()),
            ));
            return Ok(());
        }
        let mut covered = vec![false; actual_elements.len()];
        for (i, &expected_id) in expected_elements.iter().enumerate() {
            let mut found = false;
            for (j, &actual_id) in actual_elements.iter().enumerate() {
                if self.probe(expected_id, actual_id)? {
                    found = true;
                    covered[j] = true;
                }
            }
            if !found {
                path.push(PathStep::Element(i));
                out.push(mismatch_at(
                    MismatchKind::UnmatchedExpected,
                    path,
                    preview(self.arena, expected_id),
                    "<no matching element>".to_owned(),
                ));
                path.pop();
            }
        }
        for (j, &actual_id) in actual_elements.iter().enumerate() {
            if !covered[j] {
                path.push(PathStep::Element(j));
                out.push(mismatch_at(
                    MismatchKind::UnmatchedActual,
                    path,
                    "<no matching element>".to_owned(),
                    preview(self.arena, actual_id),
                ));
                path.pop();
            }
        }
        Ok(())
    }

    /// Map entries follow the unordered double-coverage scheme; an entry
    /// matches when its key and its value both deeply match. When an
    /// unmatched expected entry's key occurs exactly once on the actual side,
    /// the value comparison is re-run for real to attach an explanation.
    fn compare_entries(
        &mut self,
        expected_entries: &[(ValueId, ValueId)],
        actual_entries: &[(ValueId, ValueId)],
        path: &mut Path,
        out: &mut Vec<Mismatch>,
    ) -> Result<(), CompareError> {
        if expected_entries.len() != actual_entries.len() {
            out.push(mismatch_at(
                MismatchKind::LengthMismatch,
                path,
                format!("{} entries", expected_entries.len()),
                format!("{} entries", actual_entries.len()),
            ));
            return Ok(());
        }
        let mut covered = vec![false; actual_entries.len()];
        for (i, &(expected_key, expected_value)) in expected_entries.iter().enumerate() {
            let mut found = false;
            let mut key_matches: Vec<usize> = Vec::new();
            for (j, &(actual_key, actual_value)) in actual_entries.iter().enumerate() {
                if !self.probe(expected_key, actual_key)? {
                    continue;
                }
                key_matches.push(j);
                if self.probe(expected_value, actual_value)? {
                    found = true;
                    covered[j] = true;
                }
            }
            if !found {
                let mut children = Vec::new();
                if let [j] = key_matches[..] {
                    path.push(PathStep::EntryValue(i));
                    self.compare_pair(expected_value, actual_entries[j].1, path, &mut children)?;
                    path.pop();
                }
                path.push(PathStep::Element(i));
                let mut record = mismatch_at(
                    MismatchKind::UnmatchedExpected,
                    path,
                    format!(
                        "{}: {}",
                        preview(self.arena, expected_key),
                        preview(self.arena, expected_value)
                    ),
                    "<no matching entry>".to_owned(),
                );
                record.children = children;
                out.push(record);
                path.pop();
            }
        }
        for (j, &(actual_key, actual_value)) in actual_entries.iter().enumerate() {
            if !covered[j] {
                path.push(PathStep::Element(j));
                out.push(mismatch_at(
                    MismatchKind::UnmatchedActual,
                    path,
                    "<no matching entry>".to_owned(),
                    format!(
                        "{}: {}",
                        preview(self.arena, actual_key),
                        preview(self.arena, actual_value)
                    ),
                ));
                path.pop();
            }
        }
        Ok(())
    }

    /// Runs a full recursive comparison purely as a match test. The mismatch
    /// output is discarded; the tracker is balanced because every pair the
    /// probe opens is closed by the same `union`/`deunion` discipline.
    fn probe(&mut self, expected: ValueId, actual: ValueId) -> Result<bool, CompareError> {
        let mut scratch = Vec::new();
        let mut scratch_path = Path::root();
        self.compare_pair(expected, actual, &mut scratch_path, &mut scratch)?;
        Ok(scratch.is_empty())
    }
}

fn mismatch_at(kind: MismatchKind, path: &Path, expected: String, actual: String) -> Mismatch {
    Mismatch {
        kind,
        path: path.clone(),
        expected,
        actual,
        children: Vec::new(),
    }
}
