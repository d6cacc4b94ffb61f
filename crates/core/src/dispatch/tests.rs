use pretty_assertions::assert_eq;

use super::*;
use crate::layout::Rect;

fn by_id(doc: &Document, id: &str) -> NodeId {
	doc.get_element_by_id(doc.root(), id).unwrap()
}

fn ids(doc: &Document, elements: &[NodeId]) -> Vec<String> {
	elements.iter().map(|e| doc.element_id(*e).to_string()).collect()
}

fn query_in(selectors: &Selectors<'_>, selector: &str) -> Vec<String> {
	let doc = selectors.document();
	let parsed = selectors.parse_selector(selector).unwrap();
	ids(doc, &selectors.query_all(&parsed, doc.root()).unwrap())
}

fn query(doc: &Document, selector: &str) -> Vec<String> {
	query_in(&Selectors::new(doc), selector)
}

fn query_err(doc: &Document, selector: &str) -> String {
	let selectors = Selectors::new(doc);
	match selectors.parse_selector(selector) {
		Ok(parsed) => selectors.query_all(&parsed, doc.root()).unwrap_err().to_string(),
		Err(err) => err.to_string(),
	}
}

#[test]
fn css_parts_chain_from_each_root() {
	let doc = Document::parse_html(
		r#"<div id="a"><div id="b"><div id="c"></div></div></div><ul><li id="l1"></li><li id="l2"></li></ul>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "#a > #b #c"), vec!["c"]);
	assert!(query(&doc, "#a > #c").is_empty());
	assert_eq!(query(&doc, "#a >> div >> div"), vec!["c"]);
	assert_eq!(query(&doc, "css=ul >> li"), vec!["l1", "l2"]);
}

#[test]
fn nth_counts_from_either_end() {
	let doc = Document::parse_html(r#"<li id="l1"></li><li id="l2"></li><li id="l3"></li>"#).unwrap();
	assert_eq!(query(&doc, "li >> nth=0"), vec!["l1"]);
	assert_eq!(query(&doc, "li >> nth=-1"), vec!["l3"]);
	assert_eq!(query(&doc, "li >> nth=-2"), vec!["l2"]);
	assert!(query(&doc, "li >> nth=3").is_empty());
	assert!(query(&doc, "span >> nth=-1").is_empty());
	assert!(query(&doc, "li >> nth=first").is_empty());
}

#[test]
fn attribute_engines_pierce_unless_light() {
	let doc = Document::parse_html(
		r#"<div id="host"><template shadowrootmode="open"><span id="in" data-testid="t">Inner</span></template></div><span id="out" data-testid="t">Outer</span>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "data-testid=t"), vec!["out", "in"]);
	assert_eq!(query(&doc, "data-testid:light=t"), vec!["out"]);
	assert_eq!(query(&doc, "id=in"), vec!["in"]);
	assert!(query(&doc, "id:light=in").is_empty());
	assert_eq!(query(&doc, "text=Inner"), vec!["in"]);
	assert!(query(&doc, "text:light=Inner").is_empty());
}

#[test]
fn text_engine_prefers_innermost_match() {
	let doc = Document::parse_html(
		r#"<div id="d">Hello <span id="s">World</span></div><p id="p">Hello</p>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "text=World"), vec!["s"]);
	assert_eq!(query(&doc, "text=hello"), vec!["d", "p"]);
	assert_eq!(query(&doc, r#"text="Hello""#), vec!["d", "p"]);
	assert_eq!(query(&doc, "text=/wor.d/i"), vec!["s"]);
	assert_eq!(query(&doc, r#"internal:text="Hello World"s"#), vec!["d"]);
	assert_eq!(query(&doc, r#"internal:text="hello w"i"#), vec!["d"]);
	assert!(query(&doc, r#"internal:text="hello"s"#).is_empty());
}

#[test]
fn has_text_filters_roots() {
	let doc = Document::parse_html(
		r#"<div id="a">Apple pie</div><div id="b">Banana</div>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, r#"div >> internal:has-text="apple"i"#), vec!["a"]);
	assert_eq!(query(&doc, r#"div >> internal:has-not-text="apple"i"#), vec!["b"]);
	assert_eq!(query(&doc, r#"div >> internal:has-text="Banana"s"#), vec!["b"]);
}

#[test]
fn role_engine() {
	let doc = Document::parse_html(
		r#"<button id="b1">Submit</button>
		<button id="b2" aria-pressed="true">Bold</button>
		<h2 id="h">Title</h2>
		<input id="c" type="checkbox" checked>
		<button id="hid" style="display:none">Hidden</button>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "role=button"), vec!["b1", "b2"]);
	assert_eq!(query(&doc, "role=button[include-hidden]"), vec!["b1", "b2", "hid"]);
	assert_eq!(query(&doc, r#"role=button[name="Submit"]"#), vec!["b1"]);
	assert!(query(&doc, r#"role=button[name="sub"i]"#).is_empty());
	assert_eq!(query(&doc, r#"internal:role=button[name="sub"i]"#), vec!["b1"]);
	assert_eq!(query(&doc, "role=button[name=/^Sub/]"), vec!["b1"]);
	assert_eq!(query(&doc, "role=button[pressed]"), vec!["b2"]);
	assert_eq!(query(&doc, "role=heading[level=2]"), vec!["h"]);
	assert!(query(&doc, "role=heading[level=1]").is_empty());
	assert_eq!(query(&doc, "role=checkbox[checked=true]"), vec!["c"]);
	assert_eq!(
		query_err(&doc, "role=button[checked]"),
		"\"checked\" attribute is only supported for roles: \"checkbox\", \"menuitemcheckbox\", \"menuitemradio\", \"option\", \"radio\", \"switch\", \"treeitem\""
	);
}

#[test]
fn role_engine_walks_shadow_roots_after_light_tree() {
	let doc = Document::parse_html(
		r#"<div id="host"><template shadowrootmode="open"><button id="sb">Shadow</button></template></div><button id="lb">Light</button>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "role=button"), vec!["lb", "sb"]);
}

#[test]
fn label_and_named_attribute_engines() {
	let doc = Document::parse_html(
		r#"<label for="email">Email</label><input id="email" placeholder="Your email">
		<input id="search" aria-label="Search box">
		<button id="save" data-testid="save-btn">Save</button>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, r#"internal:label="email"i"#), vec!["email"]);
	assert_eq!(query(&doc, r#"internal:label="Search box"s"#), vec!["search"]);
	assert_eq!(query(&doc, r#"internal:attr=[placeholder="your"i]"#), vec!["email"]);
	assert!(query(&doc, r#"internal:attr=[placeholder="your"s]"#).is_empty());
	assert_eq!(query(&doc, r#"internal:testid=[data-testid="save-btn"s]"#), vec!["save"]);
	assert_eq!(query(&doc, "internal:testid=[data-testid=/save/]"), vec!["save"]);
	assert_eq!(
		query_err(&doc, r#"internal:attr=[a="1"][b="2"]"#),
		r#"Malformed attribute selector: [a="1"][b="2"]"#
	);
}

#[test]
fn nested_engines() {
	let doc = Document::parse_html(
		r#"<div id="x"><span></span></div><div id="y"><b></b></div><p id="p"></p>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, r#"div >> internal:has="span""#), vec!["x"]);
	assert_eq!(query(&doc, r#"div >> internal:has-not="span""#), vec!["y"]);
	assert_eq!(query(&doc, r##"div >> internal:and="#y""##), vec!["y"]);
	assert_eq!(query(&doc, r##"#p >> internal:or="#x""##), vec!["x", "p"]);
	assert_eq!(query(&doc, r#"#y >> internal:chain="b""#), vec![""]);
	assert_eq!(query(&doc, r#"#p >> internal:describe="paragraph""#), vec!["p"]);
}

#[test]
fn control_and_visible_engines() {
	let doc = Document::parse_html(
		r#"<div id="one"><span id="only"></span></div><div id="two"><i></i><i></i></div><p id="v">a</p><p id="h" style="display:none">b</p>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "#one >> internal:control=component"), vec!["only"]);
	assert_eq!(query(&doc, "#two >> internal:control=component"), vec!["two"]);
	assert!(query(&doc, "#one >> internal:control=enter-frame").is_empty());
	assert_eq!(
		query_err(&doc, "#one >> internal:control=bogus"),
		"Internal error, unknown internal:control selector bogus"
	);
	assert_eq!(query(&doc, "p >> visible=true"), vec!["v"]);
	assert_eq!(query(&doc, "p >> visible=false"), vec!["h"]);
}

#[test]
fn capture_becomes_has() {
	let doc = Document::parse_html(
		r#"<section><div id="x"><span></span></div><div id="y"></div></section>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "section >> *css=div >> span"), vec!["x"]);
	assert_eq!(query(&doc, "section >> *css=div"), vec!["x", "y"]);
	assert_eq!(
		query_err(&doc, "section >> *css=div >> nth=0"),
		"Can't query n-th element in a request with the capture."
	);
}

#[test]
fn spatial_parts_sort_by_score() {
	let doc = Document::parse_html(
		r#"<span id="anchor">Name</span><button id="far">x</button><button id="close">y</button>"#,
	)
	.unwrap();
	let layout = StaticLayout::new()
		.with_rect(by_id(&doc, "anchor"), Rect::new(0.0, 0.0, 50.0, 20.0))
		.with_rect(by_id(&doc, "far"), Rect::new(300.0, 0.0, 50.0, 20.0))
		.with_rect(by_id(&doc, "close"), Rect::new(80.0, 0.0, 50.0, 20.0));
	let selectors = Selectors::new(&doc).with_layout(&layout);
	assert_eq!(query_in(&selectors, r##"button >> right-of="#anchor""##), vec!["close", "far"]);
	assert_eq!(query_in(&selectors, r##"button >> right-of="#anchor",100"##), vec!["close"]);
	assert!(query_in(&selectors, r##"button >> left-of="#anchor""##).is_empty());
}

#[test]
fn unknown_engines_are_rejected_at_parse_time() {
	let doc = Document::parse_html("<div></div>").unwrap();
	assert_eq!(
		query_err(&doc, "xpath=//div"),
		"Unknown engine \"xpath\" while parsing selector xpath=//div"
	);
	assert_eq!(
		query_err(&doc, r#"div >> internal:has="_react=App""#),
		"Unknown engine \"_react\" while parsing selector div >> internal:has=\"_react=App\""
	);
}

#[test]
fn roots_must_be_queryable() {
	let doc = Document::parse_html(r#"<p id="p">text</p><div id="host"><template shadowrootmode="open"><i></i></template></div>"#)
		.unwrap();
	let selectors = Selectors::new(&doc);
	let text = doc.children(by_id(&doc, "p"))[0];
	let parsed = selectors.parse_selector("div").unwrap();
	assert_eq!(
		selectors.query_all(&parsed, text).unwrap_err().to_string(),
		"Node is not queryable."
	);

	let shadow = doc.shadow_root(by_id(&doc, "host")).unwrap();
	let scope = selectors.parse_selector(":scope").unwrap();
	assert_eq!(selectors.query_all(&scope, shadow).unwrap(), vec![shadow]);
}

#[test]
fn query_and_matches() {
	let doc = Document::parse_html(r#"<button id="a">A</button><button id="b">B</button>"#).unwrap();
	let selectors = Selectors::new(&doc);
	let parsed = selectors.parse_selector("role=button").unwrap();
	assert_eq!(selectors.query(&parsed, doc.root()).unwrap(), Some(by_id(&doc, "a")));
	assert!(selectors.matches(by_id(&doc, "b"), &parsed, doc.root()).unwrap());
	let none = selectors.parse_selector("text=missing").unwrap();
	assert_eq!(selectors.query(&none, doc.root()).unwrap(), None);
	assert!(selectors.evaluator().text_cache().is_empty());
}
