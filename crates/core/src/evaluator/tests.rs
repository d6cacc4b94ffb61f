use pretty_assertions::assert_eq;
use pw_protocol::parse_css;

use super::*;
use crate::layout::{Rect, StaticLayout};

fn by_id(doc: &Document, id: &str) -> NodeId {
	doc.get_element_by_id(doc.root(), id)
		.or_else(|| {
			// Shadow content is not reachable through the light tree.
			let layout = StaticLayout::new();
			let evaluator = Evaluator::new(doc, &layout);
			evaluator
				.query_css(QueryContext::new(doc.root()), None)
				.iter()
				.copied()
				.find(|e| doc.element_id(*e) == id)
		})
		.unwrap()
}

fn ids(doc: &Document, elements: &[NodeId]) -> Vec<String> {
	elements.iter().map(|e| doc.element_id(*e).to_string()).collect()
}

fn query_with(doc: &Document, layout: &dyn Layout, ctx: QueryContext, css: &str) -> Vec<String> {
	let evaluator = Evaluator::new(doc, layout);
	let found = evaluator.query(ctx, &parse_css(css).unwrap()).unwrap();
	ids(doc, &found)
}

fn query(doc: &Document, css: &str) -> Vec<String> {
	query_with(doc, &StaticLayout::new(), QueryContext::new(doc.root()), css)
}

fn query_err(doc: &Document, css: &str) -> String {
	let layout = StaticLayout::new();
	let evaluator = Evaluator::new(doc, &layout);
	evaluator
		.query(QueryContext::new(doc.root()), &parse_css(css).unwrap())
		.unwrap_err()
		.to_string()
}

#[test]
fn engine_table_matches_parser_names() {
	assert!(engines::names_in_sync());
	assert_eq!(CssEngine::from_name("text-is").unwrap(), CssEngine::TextIs);
	assert_eq!(CssEngine::NthMatch.name(), "nth-match");
	assert_eq!(
		CssEngine::from_name("xpath").unwrap_err().to_string(),
		"Unknown selector engine \"xpath\""
	);
}

#[test]
fn child_and_descendant_combinators() {
	let doc = Document::parse_html(r#"<div id="a"><div id="b"><div id="c"></div></div></div>"#).unwrap();
	assert_eq!(query(&doc, "#a > #b #c"), vec!["c"]);
	assert!(query(&doc, "#a > #c").is_empty());
	assert_eq!(query(&doc, "#a #c"), vec!["c"]);
	assert_eq!(query(&doc, "div div"), vec!["b", "c"]);
}

#[test]
fn sibling_combinators() {
	let doc = Document::parse_html(r#"<p id="p1"></p><p id="p2"></p><span id="s"></span>"#).unwrap();
	assert_eq!(query(&doc, "#p1 ~ span"), vec!["s"]);
	assert_eq!(query(&doc, "#p2 + span"), vec!["s"]);
	assert!(query(&doc, "#p1 + span").is_empty());
}

#[test]
fn self_or_ancestor_combinator_tests_the_element_first() {
	let doc = Document::parse_html(
		r#"<div id="both" class="x y"></div><div class="x"><span id="inner" class="y"></span></div><span id="plain" class="y"></span>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, ".x >= .y"), vec!["both", "inner"]);
}

#[test]
fn shadow_piercing_follows_context() {
	let doc = Document::parse_html(
		r#"<div id="host"><template shadowrootmode="open"><span id="in" class="t"></span></template></div><span id="out" class="t"></span>"#,
	)
	.unwrap();
	let layout = StaticLayout::new();
	assert_eq!(query(&doc, ".t"), vec!["out", "in"]);
	assert_eq!(
		query_with(&doc, &layout, QueryContext::light(doc.root()), ".t"),
		vec!["out"]
	);
	assert_eq!(query(&doc, "#host span"), vec!["in"]);
	assert_eq!(query(&doc, "#host :light(span)"), Vec::<String>::new());
}

#[test]
fn unions_come_back_in_document_order() {
	let doc = Document::parse_html(
		r#"<div id="host"><template shadowrootmode="open"><i id="in"></i></template></div><b id="out"></b>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "#out, #in, #host"), vec!["host", "in", "out"]);
	assert_eq!(query(&doc, ":is(#out, #host)"), vec!["host", "out"]);
	let sorted = sort_in_dom_order(&doc, [by_id(&doc, "out"), by_id(&doc, "in"), by_id(&doc, "out")]);
	assert_eq!(ids(&doc, &sorted), vec!["in", "out"]);
}

#[test]
fn scope_has_and_not() {
	let doc = Document::parse_html(
		r#"<ul id="list"><li id="l1"><b>x</b></li><li id="l2"></li></ul><li id="stray"></li>"#,
	)
	.unwrap();
	let layout = StaticLayout::new();
	let list = by_id(&doc, "list");
	assert_eq!(query(&doc, "li:has(b)"), vec!["l1"]);
	assert_eq!(query(&doc, "li:has(> b)"), vec!["l1"]);
	assert_eq!(query(&doc, "li:not(:has(b))"), vec!["l2", "stray"]);
	assert_eq!(
		query_with(&doc, &layout, QueryContext::new(list), ":scope > li"),
		vec!["l1", "l2"]
	);
	assert_eq!(query(&doc, ":scope"), vec![""]);
	assert_eq!(query(&doc, ":nth-match(li, 2)"), vec!["l2"]);
	assert!(query(&doc, ":nth-match(li, 9)").is_empty());

	let evaluator = Evaluator::new(&doc, &layout);
	let l1 = by_id(&doc, "l1");
	let ctx = QueryContext::new(doc.root());
	assert!(evaluator.matches(l1, &parse_css("#list > li").unwrap(), ctx).unwrap());
	assert!(!evaluator.matches(l1, &parse_css("li + li").unwrap(), ctx).unwrap());
}

#[test]
fn text_engines() {
	let doc = Document::parse_html(
		r#"<div id="d">Hello <span id="s">World</span></div><p id="p"> spaced   out </p>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, r#":text("hello world")"#), vec!["d"]);
	assert_eq!(query(&doc, r#":text-is("World")"#), vec!["s"]);
	assert_eq!(query(&doc, r#":text-is("spaced out")"#), vec!["p"]);
	assert_eq!(query(&doc, r#"div:has-text("world")"#), vec!["d"]);
	assert_eq!(query(&doc, r#":text-matches("^Hel")"#), vec!["d"]);
	assert_eq!(query(&doc, r#":text-matches("^hel", "i")"#), vec!["d"]);
}

#[test]
fn visible_engine_uses_layout() {
	let doc = Document::parse_html(
		r#"<div id="v">a</div><div id="h" style="display:none">b</div>"#,
	)
	.unwrap();
	assert_eq!(query(&doc, "div:visible"), vec!["v"]);
}

#[test]
fn spatial_engines_sort_by_distance() {
	let doc = Document::parse_html(
		r#"<span id="anchor">Name</span><button id="far">x</button><button id="close">y</button>"#,
	)
	.unwrap();
	let mut layout = StaticLayout::new();
	layout.set_rect(by_id(&doc, "anchor"), Rect::new(0.0, 0.0, 50.0, 20.0));
	layout.set_rect(by_id(&doc, "far"), Rect::new(300.0, 0.0, 50.0, 20.0));
	layout.set_rect(by_id(&doc, "close"), Rect::new(80.0, 0.0, 50.0, 20.0));
	let ctx = QueryContext::new(doc.root());
	assert_eq!(
		query_with(&doc, &layout, ctx, "button:right-of(#anchor)"),
		vec!["close", "far"]
	);
	assert_eq!(
		query_with(&doc, &layout, ctx, "button:right-of(#anchor, 100)"),
		vec!["close"]
	);
	assert_eq!(query_with(&doc, &layout, ctx, "button:near(#anchor)"), vec!["close"]);
	assert!(query_with(&doc, &layout, ctx, "button:left-of(#anchor)").is_empty());
}

#[test]
fn argument_shape_errors() {
	let doc = Document::parse_html("<div></div>").unwrap();
	assert_eq!(query_err(&doc, "div:text(1)"), "\"text\" engine expects a single string");
	assert_eq!(
		query_err(&doc, ":nth-match(div, 0)"),
		"\"nth-match\" engine expects a one-based index as the last argument"
	);
	assert_eq!(
		query_err(&doc, ":nth-match(div)"),
		"\"nth-match\" engine expects non-empty selector list and an index argument"
	);
	assert_eq!(query_err(&doc, "div:visible(div)"), "\"visible\" engine expects no arguments");
}

#[test]
fn caches_live_for_the_epoch() {
	let doc = Document::parse_html(r#"<div id="d">text</div>"#).unwrap();
	let layout = StaticLayout::new();
	let evaluator = Evaluator::new(&doc, &layout);
	let ctx = QueryContext::new(doc.root());
	let selector = parse_css(r#"div:text("text")"#).unwrap();
	{
		let _epoch = evaluator.begin();
		assert_eq!(ids(&doc, &evaluator.query(ctx, &selector).unwrap()), vec!["d"]);
		assert!(!evaluator.text_cache().is_empty());
		let nested = evaluator.begin();
		drop(nested);
		assert!(!evaluator.text_cache().is_empty());
	}
	assert!(evaluator.text_cache().is_empty());

	// Errors release the epoch too.
	assert!(evaluator.query(ctx, &parse_css("div:text(1)").unwrap()).is_err());
	assert_eq!(evaluator.memo.retain.get(), 0);
}
