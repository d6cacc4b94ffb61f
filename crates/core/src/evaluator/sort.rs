use std::collections::HashMap;

use crate::dom::{Document, NodeId};

#[derive(Default)]
struct SortEntry {
	children: Vec<NodeId>,
	taken: bool,
}

/// Deduplicates `elements` and orders them by document position, crossing
/// shadow boundaries. Light children of a host come before its shadow
/// children.
pub fn sort_in_dom_order(doc: &Document, elements: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
	let mut entries: HashMap<NodeId, SortEntry> = HashMap::new();
	let mut roots: Vec<NodeId> = Vec::new();

	for element in elements {
		append(doc, &mut entries, &mut roots, element);
		if let Some(entry) = entries.get_mut(&element) {
			entry.taken = true;
		}
	}

	let mut result = Vec::new();
	let mut stack: Vec<NodeId> = roots.into_iter().rev().collect();
	while let Some(element) = stack.pop() {
		let Some(entry) = entries.get_mut(&element) else {
			continue;
		};
		if entry.taken {
			result.push(element);
		}
		if entry.children.len() > 1 {
			let wanted = std::mem::take(&mut entry.children);
			let shadow_children = doc
				.shadow_root(element)
				.map(|shadow| doc.element_children(shadow).collect::<Vec<_>>())
				.unwrap_or_default();
			entry.children = doc
				.element_children(element)
				.chain(shadow_children)
				.filter(|child| wanted.contains(child))
				.collect();
		}
		stack.extend(entry.children.iter().rev().copied());
	}
	result
}

fn append(
	doc: &Document,
	entries: &mut HashMap<NodeId, SortEntry>,
	roots: &mut Vec<NodeId>,
	element: NodeId,
) {
	let mut chain = Vec::new();
	let mut current = Some(element);
	while let Some(node) = current {
		if entries.contains_key(&node) {
			break;
		}
		chain.push(node);
		current = doc.parent_element_or_shadow_host(node);
	}
	// `current` is the first already-known ancestor, if any.
	let mut parent = current;
	for node in chain.into_iter().rev() {
		match parent {
			Some(p) => {
				if let Some(entry) = entries.get_mut(&p) {
					entry.children.push(node);
				}
			}
			None => roots.push(node),
		}
		entries.insert(node, SortEntry::default());
		parent = Some(node);
	}
}
