//! End-to-end properties of selector resolution and generation through the public API.

use pretty_assertions::assert_eq;
use pw_locator::{Document, GenerateOptions, NodeId, Selectors, is_guid_like, parse_selector, stringify_selector};

const APP: &str = r#"<header><nav><a href="/">Home</a><a href="/docs">Docs</a></nav></header>
<main>
	<section class="card"><h2>Plan</h2><ul><li><span>Free</span></li><li><span>Pro</span></li></ul></section>
	<section class="card"><h2>Plan</h2><ul><li><span>Free</span></li><li><span>Pro</span></li></ul></section>
	<div id="host"><template shadowrootmode="open"><button>Inside</button><span class="deep">deep</span></template></div>
	<table><tr><td></td><td></td></tr><tr><td></td><td></td></tr></table>
	<button data-testid="save">Save</button>
	<input placeholder="Search">
</main>"#;

fn all(selectors: &Selectors<'_>, selector: &str) -> Vec<NodeId> {
	let parsed = selectors.parse_selector(selector).unwrap();
	selectors.query_all(&parsed, selectors.document().root()).unwrap()
}

fn every_element(doc: &Document) -> Vec<NodeId> {
	let body = doc.body().unwrap();
	let mut elements: Vec<NodeId> = doc.descendant_elements(body).collect();
	let shadow = doc.shadow_root(doc.get_element_by_id(doc.root(), "host").unwrap()).unwrap();
	elements.extend(doc.descendant_elements(shadow));
	elements
}

#[test]
fn generated_selectors_resolve_back_to_their_target() {
	let doc = Document::parse_html(APP).unwrap();
	let selectors = Selectors::new(&doc);
	let options = GenerateOptions::default();

	for element in every_element(&doc) {
		let generated = selectors.generate(element, &options).unwrap();
		assert_eq!(generated.elements.len(), 1, "{}", generated.selector);
		let resolved = generated.elements[0];
		assert!(
			resolved == element || doc.is_inside_scope(resolved, element),
			"{} did not resolve to {element}",
			generated.selector
		);
		assert_eq!(all(&selectors, &generated.selector), generated.elements);

		let parsed = parse_selector(&generated.selector).unwrap();
		assert_eq!(stringify_selector(&parsed), generated.selector);
	}
}

#[test]
fn generation_is_deterministic_across_documents() {
	let first = Document::parse_html(APP).unwrap();
	let second = Document::parse_html(APP).unwrap();
	let (a, b) = (Selectors::new(&first), Selectors::new(&second));
	let options = GenerateOptions::default();

	let left: Vec<String> = every_element(&first)
		.into_iter()
		.map(|e| a.generate(e, &options).unwrap().selector)
		.collect();
	let right: Vec<String> = every_element(&second)
		.into_iter()
		.map(|e| b.generate(e, &options).unwrap().selector)
		.collect();
	assert_eq!(left, right);
}

#[test]
fn at_most_one_ancestor_is_used() {
	let doc = Document::parse_html(
		r#"<div data-testid="a"><section data-testid="x"><span>Go</span></section></div>
		<div data-testid="b"><section data-testid="x"><span>Go</span></section></div>"#,
	)
	.unwrap();
	let selectors = Selectors::new(&doc);
	let target = all(&selectors, "span")[1];
	let generated = selectors.generate(target, &GenerateOptions::default()).unwrap();
	assert_eq!(
		generated.selector,
		r#"internal:testid=[data-testid="b"s] >> internal:text="Go"i"#
	);

	// nth only ever closes a selector.
	let doc = Document::parse_html(APP).unwrap();
	let selectors = Selectors::new(&doc);
	for element in every_element(&doc) {
		let selector = selectors.generate(element, &GenerateOptions::default()).unwrap().selector;
		let parts = parse_selector(&selector).unwrap().parts;
		let nth = parts.iter().filter(|p| p.name == "nth").count();
		assert!(nth == 0 || (nth == 1 && parts[parts.len() - 1].name == "nth"), "{selector}");
	}
}

#[test]
fn cheaper_candidates_win() {
	let doc = Document::parse_html(APP).unwrap();
	let selectors = Selectors::new(&doc);
	let options = GenerateOptions::default();
	let generate = |selector: &str| {
		let target = all(&selectors, selector)[0];
		selectors.generate(target, &options).unwrap().selector
	};

	assert_eq!(generate("text=Save"), r#"internal:testid=[data-testid="save"s]"#);
	assert_eq!(generate("text=Docs"), r#"internal:role=link[name="Docs"i]"#);
	assert_eq!(generate("input"), r#"internal:role=textbox[name="Search"i]"#);
}

#[test]
fn descendant_and_child_combinators() {
	let doc = Document::parse_html(r#"<div id="a"><div id="b"><div id="c"></div></div></div>"#).unwrap();
	let selectors = Selectors::new(&doc);
	let c = doc.get_element_by_id(doc.root(), "c").unwrap();

	assert_eq!(all(&selectors, "#a > #b #c"), vec![c]);
	assert!(all(&selectors, "#a > #c").is_empty());
	assert_eq!(all(&selectors, "#a #c"), vec![c]);
}

#[test]
fn negative_nth_on_empty_results() {
	let doc = Document::parse_html("<p>x</p>").unwrap();
	let selectors = Selectors::new(&doc);
	assert!(all(&selectors, "span >> nth=-1").is_empty());
	assert!(all(&selectors, "span >> nth=0").is_empty());
	assert_eq!(all(&selectors, "p >> nth=-1").len(), 1);
}

#[test]
fn non_breaking_spaces_match_exact_text() {
	let doc = Document::parse_html("<button>Sign\u{a0}in</button><button>Sign inside</button>").unwrap();
	let selectors = Selectors::new(&doc);
	assert_eq!(all(&selectors, r#"text="Sign in""#).len(), 1);
	assert_eq!(all(&selectors, r#"internal:text="Sign in"s"#).len(), 1);
	assert_eq!(all(&selectors, r#"internal:text="Sign in"i"#).len(), 2);

	let doc = Document::parse_html("<span>Hello&nbsp;World</span>").unwrap();
	let selectors = Selectors::new(&doc);
	let span = all(&selectors, "span");
	assert_eq!(all(&selectors, r#"text="Hello World""#), span);
	assert_eq!(all(&selectors, r#"span:text-is("Hello World")"#), span);
	assert!(all(&selectors, r#"span:text-is("Hello")"#).is_empty());
}

#[test]
fn shadow_roots_are_pierced_unless_light() {
	let doc = Document::parse_html(APP).unwrap();
	let selectors = Selectors::new(&doc);

	assert_eq!(all(&selectors, "span.deep").len(), 1);
	assert!(all(&selectors, "css:light=span.deep").is_empty());
	assert_eq!(all(&selectors, "text=Inside").len(), 1);
	assert!(all(&selectors, "text:light=Inside").is_empty());
	assert_eq!(all(&selectors, "#host span.deep").len(), 1);
}

#[test]
fn guid_like_ids_are_not_used() {
	assert!(is_guid_like("a1b2c3d4-e5f6"));
	assert!(!is_guid_like("submit-button"));

	let doc = Document::parse_html(
		r#"<button id="a1b2c3d4-e5f6"></button><button id="submit-button"></button><button></button>"#,
	)
	.unwrap();
	let selectors = Selectors::new(&doc);
	let options = GenerateOptions::default();
	let by_id = |id: &str| doc.get_element_by_id(doc.root(), id).unwrap();

	let generated = selectors.generate(by_id("a1b2c3d4-e5f6"), &options).unwrap();
	assert!(!generated.selector.contains("a1b2c3d4"), "{}", generated.selector);
	assert_eq!(generated.elements, vec![by_id("a1b2c3d4-e5f6")]);

	let generated = selectors.generate(by_id("submit-button"), &options).unwrap();
	assert_eq!(generated.selector, "#submit-button");
}
