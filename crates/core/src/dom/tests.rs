use pretty_assertions::assert_eq;

use super::*;

fn by_id(doc: &Document, id: &str) -> NodeId {
	doc.get_element_by_id(doc.root(), id).unwrap()
}

fn tags(doc: &Document, nodes: impl IntoIterator<Item = NodeId>) -> Vec<String> {
	nodes.into_iter().map(|n| doc.tag_name(n).to_string()).collect()
}

#[test]
fn parse_builds_document_skeleton() {
	let doc = Document::parse_html("<title>T</title><p id=a>Hello</p>").unwrap();
	let html = doc.document_element().unwrap();
	assert_eq!(doc.tag_name(html), "html");
	assert_eq!(tags(&doc, doc.element_children(html)), vec!["head", "body"]);
	assert_eq!(doc.parent_element(by_id(&doc, "a")), doc.body());
	assert_eq!(doc.text_content(by_id(&doc, "a")), "Hello");
	assert!(doc.head().is_some());
}

#[test]
fn declarative_shadow_roots_attach_to_parent() {
	let doc = Document::parse_html(
		r#"<div id="host"><template shadowrootmode="open"><span id="inner">In</span></template><b>light</b></div>
		<div id="closed"><template shadowrootmode="closed"><i>c</i></template></div>
		<template id="inert"><span id="lost"></span></template>"#,
	)
	.unwrap();
	let host = by_id(&doc, "host");
	let shadow = doc.shadow_root(host).unwrap();
	assert!(doc.is_shadow_root(shadow));
	assert_eq!(doc.host(shadow), Some(host));
	assert!(matches!(doc.kind(shadow), NodeKind::ShadowRoot(ShadowRootMode::Open)));
	assert_eq!(tags(&doc, doc.element_children(host)), vec!["b"]);

	// Light-tree lookups do not see into the shadow.
	assert!(doc.get_element_by_id(doc.root(), "inner").is_none());
	let inner = doc.get_element_by_id(shadow, "inner").unwrap();
	assert_eq!(doc.parent_node(inner), Some(shadow));
	assert_eq!(doc.parent_element(inner), None);
	assert_eq!(doc.parent_element_or_shadow_host(inner), Some(host));
	assert_eq!(doc.root_node(inner), shadow);

	let closed = doc.shadow_root(by_id(&doc, "closed")).unwrap();
	assert!(matches!(doc.kind(closed), NodeKind::ShadowRoot(ShadowRootMode::Closed)));

	let inert = by_id(&doc, "inert");
	assert!(doc.shadow_root(inert).is_none());
	assert!(doc.children(inert).is_empty());
	assert!(doc.get_element_by_id(doc.root(), "lost").is_none());
}

#[test]
fn scope_checks_cross_shadow_boundaries() {
	let doc = Document::parse_html(
		r#"<section id="s"><div id="host"><template shadowrootmode="open"><a id="link">x</a></template></div></section><p id="p"></p>"#,
	)
	.unwrap();
	let section = by_id(&doc, "s");
	let shadow = doc.shadow_root(by_id(&doc, "host")).unwrap();
	let link = doc.get_element_by_id(shadow, "link").unwrap();

	assert!(!doc.contains(section, link));
	assert!(doc.is_inside_scope(section, link));
	assert!(!doc.is_inside_scope(by_id(&doc, "p"), link));
	assert!(doc.contains(section, section));
}

#[test]
fn closest_cross_shadow_stops_at_scope() {
	let doc = Document::parse_html(
		r#"<form id="f"><div id="host"><template shadowrootmode="open"><span id="t">x</span></template></div></form>"#,
	)
	.unwrap();
	let host = by_id(&doc, "host");
	let form = by_id(&doc, "f");
	let target = doc.get_element_by_id(doc.shadow_root(host).unwrap(), "t").unwrap();
	let is_form = |e: NodeId| doc.tag_name(e) == "form";

	assert_eq!(doc.closest_cross_shadow(target, None, is_form), Some(form));
	assert_eq!(doc.closest_cross_shadow(target, Some(host), is_form), None);
	assert_eq!(doc.closest_cross_shadow(target, Some(form), is_form), Some(form));
	assert_eq!(doc.closest_cross_shadow(target, None, |e| e == target), Some(target));
}

#[test]
fn siblings_and_descendants_follow_document_order() {
	let doc = Document::parse_html(r#"<ul id="u"><li id="a"></li>text<li id="b"><i id="c"></i></li></ul>"#).unwrap();
	let (a, b, c) = (by_id(&doc, "a"), by_id(&doc, "b"), by_id(&doc, "c"));
	assert_eq!(doc.next_element_sibling(a), Some(b));
	assert_eq!(doc.previous_element_sibling(b), Some(a));
	assert_eq!(doc.previous_element_sibling(a), None);
	assert_eq!(
		doc.descendant_elements(by_id(&doc, "u")).collect::<Vec<_>>(),
		vec![a, b, c]
	);
	assert_eq!(doc.text_content(by_id(&doc, "u")), "text");
}

#[test]
fn attributes_and_classes() {
	let doc = Document::parse_html(r#"<div id="d" class=" one  two " DATA-X="1"></div>"#).unwrap();
	let d = by_id(&doc, "d");
	assert_eq!(doc.class_list(d).collect::<Vec<_>>(), vec!["one", "two"]);
	assert_eq!(doc.attribute(d, "data-x"), Some("1"));
	assert_eq!(doc.attribute(d, "Data-X"), Some("1"));
	assert!(!doc.has_attribute(d, "title"));
	assert_eq!(doc.element_id(doc.root()), "");
	assert_eq!(doc.node_name(d), "DIV");
	assert_eq!(doc.node_name(doc.root()), "#document");
}

#[test]
fn form_values() {
	let mut doc = Document::parse_html(
		r#"<input id="i" value="attr"><textarea id="t">typed</textarea>
		<select id="s"><option value="a">A</option><option selected>  B  choice </option></select>
		<select id="e"><option value="x">X</option></select>"#,
	)
	.unwrap();
	let input = by_id(&doc, "i");
	assert_eq!(doc.value(input), "attr");
	assert_eq!(doc.value(by_id(&doc, "t")), "typed");
	assert_eq!(doc.value(by_id(&doc, "s")), "B choice");
	assert_eq!(doc.value(by_id(&doc, "e")), "x");

	doc.set_value(input, "live");
	assert_eq!(doc.value(input), "live");
	assert_eq!(doc.attribute(input, "value"), Some("attr"));
}

#[test]
fn builders_keep_links_consistent() {
	let mut doc = Document::new();
	let root = doc.root();
	let html = doc.create_element("HTML");
	let body = doc.create_element("body");
	let p = doc.create_element("p");
	let text = doc.create_text("hi");
	doc.append_child(root, html);
	doc.append_child(html, body);
	doc.append_child(body, p);
	doc.append_child(p, text);
	doc.set_attribute(p, "ID", "x");
	assert_eq!(doc.tag_name(html), "html");
	assert_eq!(doc.body(), Some(body));
	assert_eq!(doc.get_element_by_id(root, "x"), Some(p));

	// Re-appending moves the node.
	doc.append_child(body, text);
	assert!(doc.children(p).is_empty());
	assert_eq!(doc.parent_node(text), Some(body));

	doc.remove_attribute(p, "id");
	assert_eq!(doc.get_element_by_id(root, "x"), None);

	let shadow = doc.attach_shadow(p, ShadowRootMode::Open);
	assert_eq!(doc.attach_shadow(p, ShadowRootMode::Closed), shadow);
	assert!(!doc.is_empty());
	assert_eq!(doc.len(), 6);
}
