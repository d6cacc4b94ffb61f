//! Static DOM the locator engine runs against.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. The tree mirrors the parts of the live DOM the engine needs:
//! light-tree parent/child links, shadow roots hanging off their host, and
//! form values kept apart from child text.
//!
//! A shadow root has no parent node; its host is reachable through
//! [`Document::host`], and [`Document::parent_element_or_shadow_host`]
//! crosses that boundary.

mod html;
pub(crate) mod matching;

#[cfg(test)]
mod tests;

use std::fmt;

use serde::Serialize;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
	/// Position in the arena; stable for the lifetime of the document.
	pub fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowRootMode {
	Open,
	Closed,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
	Document,
	Element(ElementData),
	Text(String),
	Comment(String),
	ShadowRoot(ShadowRootMode),
}

#[derive(Debug, Clone)]
pub struct ElementData {
	/// Lower-case tag name.
	tag_name: String,
	attributes: Vec<(String, String)>,
	/// Live form value, set through [`Document::set_value`].
	value: Option<String>,
}

#[derive(Debug, Clone)]
struct Node {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	shadow_root: Option<NodeId>,
	host: Option<NodeId>,
}

impl Node {
	fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			parent: None,
			children: Vec::new(),
			shadow_root: None,
			host: None,
		}
	}
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
	nodes: Vec<Node>,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Empty document containing only the document node.
	pub fn new() -> Self {
		Self {
			nodes: vec![Node::new(NodeKind::Document)],
		}
	}

	/// The document node.
	pub fn root(&self) -> NodeId {
		NodeId(0)
	}

	fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		self.nodes.push(Node::new(kind));
		NodeId(self.nodes.len() - 1)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.len() <= 1
	}

	pub fn kind(&self, id: NodeId) -> &NodeKind {
		&self.node(id).kind
	}

	pub fn is_element(&self, id: NodeId) -> bool {
		matches!(self.node(id).kind, NodeKind::Element(_))
	}

	pub fn is_document(&self, id: NodeId) -> bool {
		matches!(self.node(id).kind, NodeKind::Document)
	}

	pub fn is_shadow_root(&self, id: NodeId) -> bool {
		matches!(self.node(id).kind, NodeKind::ShadowRoot(_))
	}

	pub fn is_text(&self, id: NodeId) -> bool {
		matches!(self.node(id).kind, NodeKind::Text(_))
	}

	fn element(&self, id: NodeId) -> Option<&ElementData> {
		match &self.node(id).kind {
			NodeKind::Element(data) => Some(data),
			_ => None,
		}
	}

	fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
		match &mut self.nodes[id.0].kind {
			NodeKind::Element(data) => Some(data),
			_ => None,
		}
	}

	// Builders.

	pub fn create_element(&mut self, tag_name: &str) -> NodeId {
		self.push(NodeKind::Element(ElementData {
			tag_name: tag_name.to_ascii_lowercase(),
			attributes: Vec::new(),
			value: None,
		}))
	}

	pub fn create_text(&mut self, text: &str) -> NodeId {
		self.push(NodeKind::Text(text.to_string()))
	}

	pub fn create_comment(&mut self, text: &str) -> NodeId {
		self.push(NodeKind::Comment(text.to_string()))
	}

	/// Appends `child` as the last child of `parent`, detaching it first.
	pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
		if let Some(old) = self.nodes[child.0].parent.take() {
			self.nodes[old.0].children.retain(|c| *c != child);
		}
		self.nodes[child.0].parent = Some(parent);
		self.nodes[parent.0].children.push(child);
	}

	/// Sets or replaces an attribute. Names are lower-cased.
	pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
		let name = name.to_ascii_lowercase();
		if let Some(data) = self.element_mut(id) {
			match data.attributes.iter_mut().find(|(n, _)| *n == name) {
				Some(slot) => slot.1 = value.to_string(),
				None => data.attributes.push((name, value.to_string())),
			}
		}
	}

	pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
		if let Some(data) = self.element_mut(id) {
			data.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
		}
	}

	/// Attaches a shadow root to `host`, returning the existing one if any.
	pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> NodeId {
		if let Some(existing) = self.node(host).shadow_root {
			return existing;
		}
		let root = self.push(NodeKind::ShadowRoot(mode));
		self.nodes[root.0].host = Some(host);
		self.nodes[host.0].shadow_root = Some(root);
		root
	}

	/// Sets the live value of a form control without touching its children.
	pub fn set_value(&mut self, id: NodeId, value: &str) {
		if let Some(data) = self.element_mut(id) {
			data.value = Some(value.to_string());
		}
	}

	// Tree navigation.

	pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).parent
	}

	pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
		self.parent_node(id).filter(|p| self.is_element(*p))
	}

	/// Parent element, or the host when the parent is a shadow root.
	pub fn parent_element_or_shadow_host(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent_node(id)?;
		if self.is_element(parent) {
			return Some(parent);
		}
		self.host(parent)
	}

	pub fn children(&self, id: NodeId) -> &[NodeId] {
		&self.node(id).children
	}

	pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		self.children(id)
			.iter()
			.copied()
			.filter(|c| self.is_element(*c))
	}

	pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent_node(id)?;
		let siblings = self.children(parent);
		let pos = siblings.iter().position(|c| *c == id)?;
		siblings[..pos]
			.iter()
			.rev()
			.copied()
			.find(|c| self.is_element(*c))
	}

	pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent_node(id)?;
		let siblings = self.children(parent);
		let pos = siblings.iter().position(|c| *c == id)?;
		siblings[pos + 1..]
			.iter()
			.copied()
			.find(|c| self.is_element(*c))
	}

	pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).shadow_root
	}

	/// Host element of a shadow root.
	pub fn host(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).host
	}

	/// Topmost light-tree ancestor: the document, a shadow root, or a detached subtree.
	pub fn root_node(&self, id: NodeId) -> NodeId {
		let mut current = id;
		while let Some(parent) = self.parent_node(current) {
			current = parent;
		}
		current
	}

	// Element data.

	/// Lower-case tag name, empty for non-elements.
	pub fn tag_name(&self, id: NodeId) -> &str {
		self.element(id).map_or("", |e| e.tag_name.as_str())
	}

	/// DOM `nodeName`: upper-case tag for elements.
	pub fn node_name(&self, id: NodeId) -> String {
		match &self.node(id).kind {
			NodeKind::Element(data) => data.tag_name.to_ascii_uppercase(),
			NodeKind::Document => "#document".to_string(),
			NodeKind::Text(_) => "#text".to_string(),
			NodeKind::Comment(_) => "#comment".to_string(),
			NodeKind::ShadowRoot(_) => "#document-fragment".to_string(),
		}
	}

	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		self.element(id)?
			.attributes
			.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
		self.attribute(id, name).is_some()
	}

	pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
		self.element(id).map_or(&[], |e| e.attributes.as_slice())
	}

	/// The `id` attribute, empty when absent.
	pub fn element_id(&self, id: NodeId) -> &str {
		self.attribute(id, "id").unwrap_or("")
	}

	pub fn class_list(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
		self.attribute(id, "class")
			.unwrap_or("")
			.split_ascii_whitespace()
	}

	/// Data of a text or comment node.
	pub fn node_text(&self, id: NodeId) -> Option<&str> {
		match &self.node(id).kind {
			NodeKind::Text(text) | NodeKind::Comment(text) => Some(text),
			_ => None,
		}
	}

	/// Concatenated light-tree text, like DOM `textContent`.
	pub fn text_content(&self, id: NodeId) -> String {
		if let NodeKind::Text(text) = &self.node(id).kind {
			return text.clone();
		}
		let mut out = String::new();
		for node in self.descendants(id) {
			if let NodeKind::Text(text) = &self.node(node).kind {
				out.push_str(text);
			}
		}
		out
	}

	/// Form value of a control.
	///
	/// An explicit value set with [`Document::set_value`] wins; otherwise
	/// inputs read their `value` attribute, textareas their text, and selects
	/// their selected (or first) option.
	pub fn value(&self, id: NodeId) -> String {
		let Some(data) = self.element(id) else {
			return String::new();
		};
		if let Some(value) = &data.value {
			return value.clone();
		}
		match data.tag_name.as_str() {
			"textarea" => self.text_content(id),
			"select" => {
				let options: Vec<NodeId> = self
					.descendant_elements(id)
					.filter(|o| self.tag_name(*o) == "option")
					.collect();
				options
					.iter()
					.copied()
					.find(|o| self.has_attribute(*o, "selected"))
					.or_else(|| options.first().copied())
					.map(|o| self.option_value(o))
					.unwrap_or_default()
			}
			"option" => self.option_value(id),
			_ => self.attribute(id, "value").unwrap_or("").to_string(),
		}
	}

	fn option_value(&self, option: NodeId) -> String {
		match self.attribute(option, "value") {
			Some(value) => value.to_string(),
			None => pw_protocol::escape::normalize_white_space(&self.text_content(option)),
		}
	}

	// Queries.

	pub fn document_element(&self) -> Option<NodeId> {
		self.element_children(self.root()).next()
	}

	pub fn head(&self) -> Option<NodeId> {
		let html = self.document_element()?;
		self.element_children(html).find(|c| self.tag_name(*c) == "head")
	}

	pub fn body(&self) -> Option<NodeId> {
		let html = self.document_element()?;
		self.element_children(html).find(|c| self.tag_name(*c) == "body")
	}

	/// First element with the given id in `root`'s light tree.
	pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
		self.descendant_elements(root)
			.find(|e| self.attribute(*e, "id") == Some(id))
	}

	/// Pre-order light-tree descendants of `id`, excluding `id` itself.
	pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
		let mut stack: Vec<NodeId> = self.children(id).to_vec();
		stack.reverse();
		Descendants { doc: self, stack }
	}

	pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		self.descendants(id).filter(|n| self.is_element(*n))
	}

	/// Light-tree containment, inclusive, like DOM `Node.contains`.
	pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(n) = current {
			if n == ancestor {
				return true;
			}
			current = self.parent_node(n);
		}
		false
	}

	/// Whether `element` is inside `scope`, crossing shadow boundaries upward.
	pub fn is_inside_scope(&self, scope: NodeId, element: NodeId) -> bool {
		let mut current = Some(element);
		while let Some(node) = current {
			if self.contains(scope, node) {
				return true;
			}
			current = self.host(self.root_node(node));
		}
		false
	}

	/// Nearest inclusive ancestor satisfying `predicate`, walking through
	/// shadow hosts. A match that encloses `scope` does not count.
	pub fn closest_cross_shadow<F>(
		&self,
		element: NodeId,
		scope: Option<NodeId>,
		predicate: F,
	) -> Option<NodeId>
	where
		F: Fn(NodeId) -> bool,
	{
		let mut current = Some(element);
		while let Some(node) = current {
			if self.is_element(node) && predicate(node) {
				if let Some(scope) = scope {
					if node != scope && self.is_inside_scope(node, scope) {
						return None;
					}
				}
				return Some(node);
			}
			current = self.parent_element_or_shadow_host(node);
		}
		None
	}
}

/// Iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
	doc: &'a Document,
	stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<NodeId> {
		let node = self.stack.pop()?;
		self.stack
			.extend(self.doc.children(node).iter().rev().copied());
		Some(node)
	}
}
