//! Matching compiled patterns against syntax tree nodes.

use crate::node::Node;
use crate::query::parser::{Element, KindMatcher, NodePattern, Operand, Pattern, Step};

/// Capture slots of one pattern, indexed like `Pattern::capture_names`.
pub(super) type Bindings<'t> = Vec<Option<Node<'t>>>;

/// The rest of a search: accepts a complete binding or asks for another.
type Then<'k, 't> = dyn FnMut(&Bindings<'t>) -> bool + 'k;

/// Tries `pattern` with its root at `node`.
///
/// Returns the first binding, in search order, that satisfies both the
/// structure and the predicates. A binding rejected by a predicate sends the
/// search back to try the next candidate children.
pub(super) fn match_pattern<'t>(pattern: &Pattern, node: Node<'t>) -> Option<Bindings<'t>> {
    let initial = vec![None; pattern.capture_names.len()];
    let mut found = None;
    match_element(&pattern.root, node, &initial, &mut |bindings: &Bindings<'t>| {
        if !predicates_hold(pattern, bindings) {
            return false;
        }
        found = Some(bindings.clone());
        true
    });
    found
}

/// Matches one element and hands each binding it produces to `then`.
fn match_element<'t>(
    element: &Element,
    node: Node<'t>,
    bindings: &Bindings<'t>,
    then: &mut Then<'_, 't>,
) -> bool {
    if let Some(field) = &element.field
        && node.field_name() != Some(field.as_str())
    {
        return false;
    }

    let mut bind = |inner: &Bindings<'t>| bind_captures(&element.captures, node, inner, then);
    match &element.step {
        Step::Node(pattern) => match_node(pattern, node, bindings, &mut bind),
        Step::Alternation(branches) => {
            for branch in branches {
                if match_element(branch, node, bindings, &mut bind) {
                    return true;
                }
            }
            false
        }
    }
}

fn bind_captures<'t>(
    slots: &[usize],
    node: Node<'t>,
    bindings: &Bindings<'t>,
    then: &mut Then<'_, 't>,
) -> bool {
    if slots.is_empty() {
        return then(bindings);
    }
    let mut bound = bindings.clone();
    for slot in slots {
        if let Some(binding) = bound.get_mut(*slot) {
            *binding = Some(node);
        }
    }
    then(&bound)
}

fn match_node<'t>(
    pattern: &NodePattern,
    node: Node<'t>,
    bindings: &Bindings<'t>,
    then: &mut Then<'_, 't>,
) -> bool {
    if !kind_matches(&pattern.kind, node) {
        return false;
    }
    if pattern
        .negated_fields
        .iter()
        .any(|field| node.child_by_field_name(field).is_some())
    {
        return false;
    }
    if pattern.children.is_empty() {
        return then(bindings);
    }
    let children: Vec<Node<'t>> = node.children().collect();
    match_sequence(&pattern.children, &children, bindings, then)
}

fn kind_matches(kind: &KindMatcher, node: Node<'_>) -> bool {
    match kind {
        KindMatcher::Named(name) => node.is_named() && node.kind() == *name,
        KindMatcher::AnyNamed => node.is_named(),
        KindMatcher::Any => true,
        KindMatcher::Anonymous(text) => !node.is_named() && node.kind() == *text,
        KindMatcher::Error => node.is_error(),
        KindMatcher::Missing(expected) => {
            node.is_missing() && expected.as_ref().is_none_or(|name| node.kind() == *name)
        }
    }
}

/// Matches `patterns` against an ordered, not necessarily contiguous,
/// subsequence of `children`, backtracking over the candidate positions
/// until `then` accepts a binding.
///
/// Optional elements are first tried against the remaining children and then
/// skipped.
fn match_sequence<'t>(
    patterns: &[Element],
    children: &[Node<'t>],
    bindings: &Bindings<'t>,
    then: &mut Then<'_, 't>,
) -> bool {
    let Some((first, rest)) = patterns.split_first() else {
        return then(bindings);
    };

    for (index, child) in children.iter().enumerate() {
        let remaining = children.get(index.saturating_add(1)..).unwrap_or_default();
        let mut continue_after = |bound: &Bindings<'t>| match_sequence(rest, remaining, bound, then);
        if match_element(first, *child, bindings, &mut continue_after) {
            return true;
        }
    }

    first.optional && match_sequence(rest, children, bindings, then)
}

/// Evaluates `#eq?` and `#not-eq?`. Predicates over unbound captures pass.
fn predicates_hold(pattern: &Pattern, bindings: &Bindings<'_>) -> bool {
    let bound = |slot: usize| bindings.get(slot).copied().flatten();
    pattern.predicates.iter().all(|predicate| {
        let Some(node) = bound(predicate.capture) else {
            return true;
        };
        let other = match &predicate.operand {
            Operand::Text(text) => text.as_str(),
            Operand::Capture(slot) => match bound(*slot) {
                Some(other) => other.text(),
                None => return true,
            },
        };
        (node.text() == other) != predicate.negated
    })
}
