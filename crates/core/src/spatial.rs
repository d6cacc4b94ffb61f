//! Proximity scoring for `left-of`, `right-of`, `above`, `below` and `near`.

use crate::dom::{Document, NodeId};
use crate::layout::{Layout, Rect};

/// Default threshold of `near`, in pixels.
pub const DEFAULT_NEAR_DISTANCE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialRelation {
	LeftOf,
	RightOf,
	Above,
	Below,
	Near,
}

impl SpatialRelation {
	pub fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"left-of" => SpatialRelation::LeftOf,
			"right-of" => SpatialRelation::RightOf,
			"above" => SpatialRelation::Above,
			"below" => SpatialRelation::Below,
			"near" => SpatialRelation::Near,
			_ => return None,
		})
	}

	pub fn name(self) -> &'static str {
		match self {
			SpatialRelation::LeftOf => "left-of",
			SpatialRelation::RightOf => "right-of",
			SpatialRelation::Above => "above",
			SpatialRelation::Below => "below",
			SpatialRelation::Near => "near",
		}
	}

	/// Score of `element` relative to one reference box, `None` when the
	/// relation does not hold within `max_distance`.
	pub fn score(self, element: &Rect, reference: &Rect, max_distance: Option<f64>) -> Option<f64> {
		match self {
			SpatialRelation::RightOf => box_right_of(element, reference, max_distance),
			SpatialRelation::LeftOf => box_left_of(element, reference, max_distance),
			SpatialRelation::Above => box_above(element, reference, max_distance),
			SpatialRelation::Below => box_below(element, reference, max_distance),
			SpatialRelation::Near => box_near(element, reference, max_distance),
		}
	}
}

fn within(distance: f64, max_distance: Option<f64>) -> bool {
	distance >= 0.0 && max_distance.is_none_or(|max| distance <= max)
}

pub fn box_right_of(b1: &Rect, b2: &Rect, max_distance: Option<f64>) -> Option<f64> {
	let distance = b1.left() - b2.right();
	if !within(distance, max_distance) {
		return None;
	}
	Some(distance + (b2.bottom() - b1.bottom()).max(0.0) + (b1.top() - b2.top()).max(0.0))
}

pub fn box_left_of(b1: &Rect, b2: &Rect, max_distance: Option<f64>) -> Option<f64> {
	let distance = b2.left() - b1.right();
	if !within(distance, max_distance) {
		return None;
	}
	Some(distance + (b2.bottom() - b1.bottom()).max(0.0) + (b1.top() - b2.top()).max(0.0))
}

pub fn box_above(b1: &Rect, b2: &Rect, max_distance: Option<f64>) -> Option<f64> {
	let distance = b2.top() - b1.bottom();
	if !within(distance, max_distance) {
		return None;
	}
	Some(distance + (b1.left() - b2.left()).max(0.0) + (b2.right() - b1.right()).max(0.0))
}

pub fn box_below(b1: &Rect, b2: &Rect, max_distance: Option<f64>) -> Option<f64> {
	let distance = b1.top() - b2.bottom();
	if !within(distance, max_distance) {
		return None;
	}
	Some(distance + (b1.left() - b2.left()).max(0.0) + (b2.right() - b1.right()).max(0.0))
}

pub fn box_near(b1: &Rect, b2: &Rect, max_distance: Option<f64>) -> Option<f64> {
	let threshold = max_distance.unwrap_or(DEFAULT_NEAR_DISTANCE);
	let mut score = 0.0;
	if b1.left() - b2.right() >= 0.0 {
		score += b1.left() - b2.right();
	}
	if b2.left() - b1.right() >= 0.0 {
		score += b2.left() - b1.right();
	}
	if b2.top() - b1.bottom() >= 0.0 {
		score += b2.top() - b1.bottom();
	}
	if b1.top() - b2.bottom() >= 0.0 {
		score += b1.top() - b2.bottom();
	}
	(score <= threshold).then_some(score)
}

/// Best (lowest) score of `element` against any reference box. The element's
/// own box is skipped by the caller passing only other elements.
pub fn layout_selector_score(
	relation: SpatialRelation,
	element: &Rect,
	references: &[Rect],
	max_distance: Option<f64>,
) -> Option<f64> {
	references
		.iter()
		.filter_map(|reference| relation.score(element, reference, max_distance))
		.min_by(f64::total_cmp)
}

/// Score of `element` against the boxes of `inner`, skipping the element
/// itself and anything without geometry.
pub fn element_score(
	doc: &Document,
	layout: &dyn Layout,
	relation: SpatialRelation,
	element: NodeId,
	inner: &[NodeId],
	max_distance: Option<f64>,
) -> Option<f64> {
	let rect = layout.compute_box(doc, element).rect?;
	let references: Vec<Rect> = inner
		.iter()
		.filter(|other| **other != element)
		.filter_map(|other| layout.compute_box(doc, *other).rect)
		.collect();
	layout_selector_score(relation, &rect, &references, max_distance)
}
