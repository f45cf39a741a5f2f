//! Text rendering of value graphs and comparison results.
//!
//! Rendering a possibly-cyclic graph has the same non-termination hazard as
//! comparing one, but needs none of the union-find machinery: an identity map
//! and a counter are enough. The first occurrence of a value that is
//! referenced more than once is prefixed with `&<label>`; every later
//! occurrence renders as `<reference to *<label>>`. Only composites are
//! labeled; shared atoms are simply repeated.

use std::collections::HashMap;

use crate::compare::{Comparison, Mismatch, MismatchKind};
use crate::value::{Value, ValueArena, ValueId};

/// Renders a one-line bounded summary of a value: atoms verbatim, composites
/// by kind and size. Used for the `expected`/`actual` fields of mismatch
/// records, where the full (possibly cyclic) rendering would be noise.
pub fn preview(arena: &ValueArena, id: ValueId) -> String {
    match arena.get(id) {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Record { type_name, fields } => {
            format!("{type_name} {{{} fields}}", fields.len())
        }
        Value::Seq(elements) => format!("[{} elements]", elements.len()),
        Value::Set(elements) => format!("{{{} elements}}", elements.len()),
        Value::Map(entries) => format!("{{{} entries}}", entries.len()),
    }
}

/// Renders a full, indented, multi-line description of a value graph,
/// labeling shared and cyclic references.
pub fn describe(arena: &ValueArena, id: ValueId) -> String {
    let mut counts: HashMap<ValueId, usize> = HashMap::new();
    count_occurrences(arena, id, &mut counts);

    let mut renderer = Renderer {
        arena,
        counts,
        labels: HashMap::new(),
        next_label: 1,
        out: String::new(),
    };
    renderer.render(id, 0);
    renderer.out
}

/// Renders a human-readable report for a comparison outcome.
pub fn report(comparison: &Comparison) -> String {
    if comparison.matched {
        return "matched\n".to_owned();
    }
    let mut out = String::new();
    let n = comparison.mismatches.len();
    let noun = if n == 1 { "mismatch" } else { "mismatches" };
    out.push_str(&format!("{n} {noun}:\n"));
    for mismatch in &comparison.mismatches {
        report_mismatch(mismatch, 1, &mut out);
    }
    out
}

fn report_mismatch(mismatch: &Mismatch, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!(
        "{indent}at {}: {}: expected {}, actual {}\n",
        mismatch.path,
        kind_label(mismatch.kind),
        mismatch.expected,
        mismatch.actual
    ));
    for child in &mismatch.children {
        report_mismatch(child, depth + 1, out);
    }
}

fn kind_label(kind: MismatchKind) -> &'static str {
    match kind {
        MismatchKind::Absence => "absence mismatch",
        MismatchKind::TypeMismatch => "type mismatch",
        MismatchKind::ValueMismatch => "value mismatch",
        MismatchKind::LengthMismatch => "length mismatch",
        MismatchKind::MissingField => "missing field",
        MismatchKind::UnexpectedField => "unexpected field",
        MismatchKind::UnmatchedExpected => "unmatched expected element",
        MismatchKind::UnmatchedActual => "unmatched actual element",
    }
}

/// Counts how often each composite is reached. A count above one means the
/// value is shared or on a cycle and needs a label. Traversal stops at
/// already-counted values, so cycles terminate.
fn count_occurrences(arena: &ValueArena, id: ValueId, counts: &mut HashMap<ValueId, usize>) {
    match arena.get(id) {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {}
        Value::Record { fields, .. } => {
            if bump(counts, id) {
                return;
            }
            for (_, child) in fields {
                count_occurrences(arena, *child, counts);
            }
        }
        Value::Seq(elements) | Value::Set(elements) => {
            if bump(counts, id) {
                return;
            }
            for child in elements {
                count_occurrences(arena, *child, counts);
            }
        }
        Value::Map(entries) => {
            if bump(counts, id) {
                return;
            }
            for (key, value) in entries {
                count_occurrences(arena, *key, counts);
                count_occurrences(arena, *value, counts);
            }
        }
    }
}

/// Increments the count for `id`; returns `true` if it was already seen.
fn bump(counts: &mut HashMap<ValueId, usize>, id: ValueId) -> bool {
    let count = counts.entry(id).or_insert(0);
    *count += 1;
    *count > 1
}

struct Renderer<'a> {
    arena: &'a ValueArena,
    counts: HashMap<ValueId, usize>,
    labels: HashMap<ValueId, String>,
    next_label: usize,
    out: String,
}

impl Renderer<'_> {
    fn render(&mut self, id: ValueId, depth: usize) {
        let value = self.arena.get(id);
        let labeled = match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => false,
            Value::Record { .. } | Value::Seq(_) | Value::Set(_) | Value::Map(_) => {
                self.counts.get(&id).copied().unwrap_or(0) > 1
            }
        };
        if labeled {
            if let Some(label) = self.labels.get(&id) {
                self.out.push_str(&format!("<reference to *{label}>"));
                return;
            }
            let label = format!("ref{}", self.next_label);
            self.next_label += 1;
            self.labels.insert(id, label.clone());
            self.out.push_str(&format!("&{label} "));
        }

        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(&b.to_string()),
            Value::Int(i) => self.out.push_str(&i.to_string()),
            Value::Float(x) => self.out.push_str(&x.to_string()),
            Value::Str(s) => self.out.push_str(&format!("{s:?}")),
            Value::Record { type_name, fields } => {
                self.out.push_str(&format!("{type_name} {{"));
                if fields.is_empty() {
                    self.out.push('}');
                    return;
                }
                let entries = fields.clone();
                self.render_block(depth, entries.len(), |renderer, i, d| {
                    let (name, child) = &entries[i];
                    renderer.out.push_str(&format!("{name}: "));
                    renderer.render(*child, d);
                });
                self.close(depth, '}');
            }
            Value::Seq(elements) => {
                self.out.push('[');
                if elements.is_empty() {
                    self.out.push(']');
                    return;
                }
                let entries = elements.clone();
                self.render_block(depth, entries.len(), |renderer, i, d| {
                    renderer.render(entries[i], d);
                });
                self.close(depth, ']');
            }
            Value::Set(elements) => {
                self.out.push('{');
                if elements.is_empty() {
                    self.out.push('}');
                    return;
                }
                let entries = elements.clone();
                self.render_block(depth, entries.len(), |renderer, i, d| {
                    renderer.render(entries[i], d);
                });
                self.close(depth, '}');
            }
            Value::Map(entries) => {
                self.out.push('{');
                if entries.is_empty() {
                    self.out.push('}');
                    return;
                }
                let pairs = entries.clone();
                self.render_block(depth, pairs.len(), |renderer, i, d| {
                    let (key, value) = pairs[i];
                    renderer.render(key, d);
                    renderer.out.push_str(" => ");
                    renderer.render(value, d);
                });
                self.close(depth, '}');
            }
        }
    }

    /// Renders `len` comma-separated items, one per line, indented one level
    /// past `depth`.
    fn render_block(
        &mut self,
        depth: usize,
        len: usize,
        mut item: impl FnMut(&mut Self, usize, usize),
    ) {
        for i in 0..len {
            self.out.push('\n');
            self.out.push_str(&"  ".repeat(depth + 1));
            item(self, i, depth + 1);
            if i + 1 < len {
                self.out.push(',');
            }
        }
    }

    fn close(&mut self, depth: usize, bracket: char) {
        self.out.push('\n');
        self.out.push_str(&"  ".repeat(depth));
        self.out.push(bracket);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::compare::deeply_equal;

    #[test]
    fn preview_is_bounded_and_kind_aware() {
        let mut arena = ValueArena::new();
        let i = arena.int(42);
        let s = arena.str("hi");
        let e1 = arena.int(1);
        let seq = arena.seq(vec![e1, e1]);
        let rec = arena.record("Point", vec![("x".to_owned(), i)]);

        assert_eq!(preview(&arena, i), "42");
        assert_eq!(preview(&arena, s), "\"hi\"");
        assert_eq!(preview(&arena, seq), "[2 elements]");
        assert_eq!(preview(&arena, rec), "Point {1 fields}");
    }

    #[test]
    fn describe_renders_nested_structure() {
        let mut arena = ValueArena::new();
        let x = arena.int(3);
        let rec = arena.record("Point", vec![("x".to_owned(), x)]);
        let text = describe(&arena, rec);
        assert_eq!(text, "Point {\n  x: 3\n}");
    }

    #[test]
    fn describe_labels_cycles_instead_of_diverging() {
        let mut arena = ValueArena::new();
        let v = arena.int(7);
        let node = arena.record("Node", vec![("value".to_owned(), v)]);
        arena.set_field(node, "next", node).expect("record");

        let text = describe(&arena, node);
        assert!(text.starts_with("&ref1 Node {"), "first occurrence is labeled: {text}");
        assert!(
            text.contains("<reference to *ref1>"),
            "the back-reference renders as a reference: {text}"
        );
    }

    #[test]
    fn describe_labels_shared_acyclic_values_once() {
        let mut arena = ValueArena::new();
        let leaf = arena.record("Leaf", vec![]);
        let pair = arena.record(
            "Pair",
            vec![("a".to_owned(), leaf), ("b".to_owned(), leaf)],
        );
        let text = describe(&arena, pair);
        assert_eq!(text.matches("&ref1").count(), 1);
        assert_eq!(text.matches("<reference to *ref1>").count(), 1);
    }

    #[test]
    fn report_lists_every_mismatch_with_its_path() {
        let mut arena = ValueArena::new();
        let e1 = arena.int(1);
        let e2 = arena.int(2);
        let e = arena.seq(vec![e1, e2]);
        let a1 = arena.int(9);
        let a2 = arena.int(8);
        let a = arena.seq(vec![a1, a2]);

        let comparison = deeply_equal(&arena, e, a).expect("covered");
        let text = report(&comparison);
        assert!(text.starts_with("2 mismatches:"));
        assert!(text.contains("at $[0]: value mismatch: expected 1, actual 9"));
        assert!(text.contains("at $[1]: value mismatch: expected 2, actual 8"));
    }

    #[test]
    fn report_for_a_match_is_terse() {
        let mut arena = ValueArena::new();
        let e = arena.int(1);
        let a = arena.int(1);
        let comparison = deeply_equal(&arena, e, a).expect("covered");
        assert_eq!(report(&comparison), "matched\n");
    }
}
