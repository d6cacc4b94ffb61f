//! Building a [`Document`] from HTML text with html5ever.

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;

use super::{Document, NodeId, ShadowRootMode};
use crate::error::Result;

impl Document {
	/// Parses an HTML document.
	///
	/// `<template shadowrootmode="open|closed">` becomes a shadow root of its
	/// parent element. Contents of other templates are inert and dropped.
	pub fn parse_html(html: &str) -> Result<Self> {
		let opts = ParseOpts {
			tree_builder: TreeBuilderOpts {
				scripting_enabled: false,
				..TreeBuilderOpts::default()
			},
			..ParseOpts::default()
		};
		let dom = parse_document(RcDom::default(), opts)
			.from_utf8()
			.read_from(&mut html.as_bytes())?;

		let mut doc = Document::new();
		let root = doc.root();
		for child in dom.document.children.borrow().iter() {
			doc.convert(child, root);
		}
		debug!(target = "pw_locator.dom", nodes = doc.len(), "parsed html");
		Ok(doc)
	}

	fn convert(&mut self, handle: &Handle, parent: NodeId) {
		match &handle.data {
			NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
			NodeData::Text { contents } => {
				let node = self.create_text(&contents.borrow());
				self.append_child(parent, node);
			}
			NodeData::Comment { contents } => {
				let node = self.create_comment(contents);
				self.append_child(parent, node);
			}
			NodeData::Element {
				name,
				attrs,
				template_contents,
				..
			} => {
				let tag = name.local.to_string();
				let attrs = attrs.borrow();
				if tag == "template" && self.is_element(parent) {
					let mode = attrs
						.iter()
						.find(|a| &*a.name.local == "shadowrootmode")
						.and_then(|a| match a.value.to_ascii_lowercase().as_str() {
							"open" => Some(ShadowRootMode::Open),
							"closed" => Some(ShadowRootMode::Closed),
							_ => None,
						});
					if let Some(mode) = mode {
						let shadow = self.attach_shadow(parent, mode);
						if let Some(contents) = template_contents.borrow().as_ref() {
							for child in contents.children.borrow().iter() {
								self.convert(child, shadow);
							}
						}
						for child in handle.children.borrow().iter() {
							self.convert(child, shadow);
						}
						return;
					}
				}

				let node = self.create_element(&tag);
				for attr in attrs.iter() {
					self.set_attribute(node, &attr.name.local, &attr.value);
				}
				self.append_child(parent, node);
				for child in handle.children.borrow().iter() {
					self.convert(child, node);
				}
			}
		}
	}
}
