use std::fmt;
use std::ops::Range;

use regex::Regex;
use regex::RegexBuilder;

use crate::InjectError;
use crate::InjectResult;
use crate::tags::Binding;
use crate::tags::Placeholders;
use crate::tags::Segment;
use crate::tags::TagKind;
use crate::tags::split_placeholders;

/// Pattern used for a wildcard placeholder.
const ANY_PATTERN: &str = r"\S+?\b";

/// A compiled, whitespace tolerant and case-insensitive tag pattern.
///
/// Every whitespace run in the tag matches zero or more whitespace
/// characters in the document.
#[derive(Clone)]
pub struct TagPattern {
	regex: Regex,
	template: String,
}

impl TagPattern {
	/// Compile a tag template, binding its placeholders.
	pub fn compile(kind: TagKind, template: &str, placeholders: &Placeholders) -> InjectResult<Self> {
		let mut source = String::with_capacity(template.len() * 2);
		for segment in split_placeholders(template) {
			match segment {
				Segment::Literal(text) => push_literal(&mut source, text),
				Segment::Placeholder(token) => {
					match placeholders.binding(token) {
						Some(Binding::Value(value)) => {
							source.push_str(&regex::escape(&value));
							if value.chars().last().is_some_and(is_word_char) {
								source.push_str(r"\b");
							}
						}
						Some(Binding::Any) => source.push_str(ANY_PATTERN),
						None => push_literal(&mut source, token),
					}
				}
			}
		}

		Self::from_source(kind, template, &source)
	}

	/// Compile a fully resolved tag, treating placeholder tokens as text.
	pub fn literal(kind: TagKind, tag: &str) -> InjectResult<Self> {
		let mut source = String::with_capacity(tag.len() * 2);
		push_literal(&mut source, tag);
		Self::from_source(kind, tag, &source)
	}

	fn from_source(kind: TagKind, template: &str, source: &str) -> InjectResult<Self> {
		let regex = RegexBuilder::new(source)
			.case_insensitive(true)
			.build()
			.map_err(|e| {
				InjectError::InvalidPattern {
					tag: template.to_string(),
					reason: e.to_string(),
				}
			})?;

		// A tag that can match nothing would never advance the scan.
		if regex.is_match("") {
			return Err(InjectError::EmptyTag(kind.as_str()));
		}

		Ok(Self {
			regex,
			template: template.to_string(),
		})
	}

	/// The tag template this pattern was built from.
	pub fn template(&self) -> &str {
		&self.template
	}

	/// The generated regular expression.
	pub fn as_str(&self) -> &str {
		self.regex.as_str()
	}

	/// Find the next match starting no earlier than `from`.
	pub fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
		if from > text.len() {
			return None;
		}
		self.regex.find_at(text, from).map(|m| m.range())
	}
}

impl fmt::Debug for TagPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TagPattern")
			.field("template", &self.template)
			.field("regex", &self.regex.as_str())
			.finish()
	}
}

fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

/// Escape `text` and relax each whitespace run to `\s*`.
fn push_literal(source: &mut String, text: &str) {
	let mut in_whitespace = false;
	let mut run_start = 0;

	for (idx, c) in text.char_indices() {
		if c.is_whitespace() {
			if !in_whitespace {
				source.push_str(&regex::escape(&text[run_start..idx]));
				source.push_str(r"\s*");
				in_whitespace = true;
			}
		} else if in_whitespace {
			run_start = idx;
			in_whitespace = false;
		}
	}

	if !in_whitespace {
		source.push_str(&regex::escape(&text[run_start..]));
	}
}

/// The start and end patterns bracketing an injection region. A missing
/// end pattern selects single tag mode.
#[derive(Debug, Clone)]
pub struct TagPair {
	pub start: TagPattern,
	pub end: Option<TagPattern>,
}

impl TagPair {
	pub fn new(start: TagPattern, end: Option<TagPattern>) -> Self {
		Self { start, end }
	}

	pub fn is_single_tag(&self) -> bool {
		self.end.is_none()
	}
}

/// A located occurrence of a tag pair. All ranges are byte offsets into the
/// text that was searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRegion {
	pub start: Range<usize>,
	pub inner: Range<usize>,
	pub end: Option<Range<usize>>,
}

impl MatchRegion {
	/// The full span replaced when injecting.
	pub fn span(&self) -> Range<usize> {
		let end = self.end.as_ref().map_or(self.start.end, |end| end.end);
		self.start.start..end
	}

	pub fn start_tag<'a>(&self, text: &'a str) -> &'a str {
		&text[self.start.clone()]
	}

	pub fn end_tag<'a>(&self, text: &'a str) -> Option<&'a str> {
		self.end.clone().map(|end| &text[end])
	}

	pub fn inner_content<'a>(&self, text: &'a str) -> &'a str {
		&text[self.inner.clone()]
	}

	/// The separator placed between the tags and each injected fragment.
	///
	/// With an end tag this is the leading whitespace of the existing inner
	/// content. In single tag mode it is a newline followed by the
	/// indentation of the line holding the start tag, or nothing when the
	/// tag does not start its line.
	pub fn indent(&self, text: &str) -> String {
		if self.end.is_some() {
			let inner = self.inner_content(text);
			let content_start = inner.len() - inner.trim_start().len();
			return inner[..content_start].to_string();
		}

		let before = &text[..self.start.start];
		let trailing = &before[before.trim_end().len()..];
		trailing
			.find('\n')
			.map(|idx| trailing[idx..].to_string())
			.unwrap_or_default()
	}
}

/// Locate the next region of `pair` in `text`, beginning the start tag
/// search at `from`.
///
/// The end tag is searched from the end of the start tag match. A start
/// tag without an end tag is an error naming the start tag's text.
pub fn next_region(text: &str, pair: &TagPair, from: usize) -> InjectResult<Option<MatchRegion>> {
	let Some(start) = pair.start.find_at(text, from) else {
		return Ok(None);
	};

	let Some(end_pattern) = &pair.end else {
		return Ok(Some(MatchRegion {
			inner: start.end..start.end,
			start,
			end: None,
		}));
	};

	let Some(end) = end_pattern.find_at(text, start.end) else {
		return Err(InjectError::MissingEndTag(text[start].to_string()));
	};

	Ok(Some(MatchRegion {
		inner: start.end..end.start,
		start,
		end: Some(end),
	}))
}

/// Lazily find all non-overlapping regions of `pair` in `text`, left to
/// right.
pub fn find_regions<'a>(text: &'a str, pair: &'a TagPair) -> Regions<'a> {
	Regions {
		text,
		pair,
		position: 0,
		done: false,
	}
}

/// Iterator returned by [`find_regions`]. It stops after the first error.
#[derive(Debug)]
pub struct Regions<'a> {
	text: &'a str,
	pair: &'a TagPair,
	position: usize,
	done: bool,
}

impl Iterator for Regions<'_> {
	type Item = InjectResult<MatchRegion>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		match next_region(self.text, self.pair, self.position) {
			Ok(Some(region)) => {
				self.position = region.span().end;
				Some(Ok(region))
			}
			Ok(None) => {
				self.done = true;
				None
			}
			Err(error) => {
				self.done = true;
				Some(Err(error))
			}
		}
	}
}
