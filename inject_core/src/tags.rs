use std::fmt;
use std::sync::Arc;

/// Default value substituted for `{{name}}`.
pub const DEFAULT_NAME: &str = "inject";

/// Target type whose tag convention is used for unknown target extensions.
pub const DEFAULT_TARGET: &str = "html";

/// Placeholder for the source file extension.
pub const EXT_PLACEHOLDER: &str = "{{ext}}";
/// Placeholder for the injection name.
pub const NAME_PLACEHOLDER: &str = "{{name}}";
/// Placeholder for the shaped source file path.
pub const PATH_PLACEHOLDER: &str = "{{path}}";

/// Which side of an injection region a tag marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
	Start,
	End,
}

impl TagKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Start => "start",
			Self::End => "end",
		}
	}
}

impl fmt::Display for TagKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Computes a tag from `(target_ext, source_ext)`. Returning `None` falls
/// through to the built-in conventions.
pub type TagFn = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// A caller supplied replacement for the built-in start or end tag.
#[derive(Clone)]
pub enum TagOverride {
	/// A literal tag which may contain `{{ext}}`, `{{name}}` and `{{path}}`.
	Literal(String),
	/// A tag computed from the target and source extensions.
	Function(TagFn),
}

impl TagOverride {
	pub fn literal(tag: impl Into<String>) -> Self {
		Self::Literal(tag.into())
	}

	pub fn function<F>(func: F) -> Self
	where
		F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
	{
		Self::Function(Arc::new(func))
	}
}

impl fmt::Debug for TagOverride {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(tag) => f.debug_tuple("Literal").field(tag).finish(),
			Self::Function(_) => f.write_str("Function(..)"),
		}
	}
}

impl From<&str> for TagOverride {
	fn from(value: &str) -> Self {
		Self::Literal(value.to_string())
	}
}

impl From<String> for TagOverride {
	fn from(value: String) -> Self {
		Self::Literal(value)
	}
}

/// The built-in `(start, end)` tag templates for a target extension.
pub fn default_tags(target_ext: &str) -> (&'static str, &'static str) {
	match target_ext.to_ascii_lowercase().as_str() {
		"jsx" => ("{/* {{name}}:{{ext}} */}", "{/* endinject */}"),
		"jade" | "pug" => ("//- {{name}}:{{ext}}", "//- endinject"),
		"slm" | "slim" => ("/ {{name}}:{{ext}}", "/ endinject"),
		"haml" => ("-# {{name}}:{{ext}}", "-# endinject"),
		"less" | "sass" | "scss" => ("/* {{name}}:{{ext}} */", "/* endinject */"),
		_ => ("<!-- {{name}}:{{ext}} -->", "<!-- endinject -->"),
	}
}

/// Resolve the tag template (placeholders still in place) for a target and
/// source extension.
///
/// A literal override wins and a function override is consulted next. The
/// built-in table keyed by `target_ext` is the fallback, also used when the
/// function returns `None` or a blank tag.
pub fn tag_template(
	kind: TagKind,
	target_ext: &str,
	source_ext: &str,
	custom: Option<&TagOverride>,
) -> String {
	let computed = match custom {
		Some(TagOverride::Literal(tag)) => Some(tag.clone()),
		Some(TagOverride::Function(func)) => {
			func(target_ext, source_ext).filter(|tag| !tag.trim().is_empty())
		}
		None => None,
	};

	computed.unwrap_or_else(|| {
		let (start, end) = default_tags(target_ext);
		match kind {
			TagKind::Start => start.to_string(),
			TagKind::End => end.to_string(),
		}
	})
}

/// Resolve the literal tag text for a target and source extension with
/// `{{ext}}` and `{{name}}` substituted.
pub fn resolve_tag(
	kind: TagKind,
	target_ext: &str,
	source_ext: &str,
	custom: Option<&TagOverride>,
	name: &str,
) -> String {
	let template = tag_template(kind, target_ext, source_ext, custom);
	Placeholders::new(name).ext(source_ext).substitute(&template)
}

/// The value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
	/// Substituted literally.
	Value(String),
	/// Matches any run of non-whitespace characters when building patterns.
	Any,
}

/// Values for the placeholders that may appear in a tag template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
	pub name: String,
	pub ext: Option<Binding>,
	pub path: Option<Binding>,
}

impl Placeholders {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			ext: None,
			path: None,
		}
	}

	#[must_use]
	pub fn ext(mut self, ext: impl Into<String>) -> Self {
		self.ext = Some(Binding::Value(ext.into()));
		self
	}

	#[must_use]
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(Binding::Value(path.into()));
		self
	}

	/// Bind both `{{ext}}` and `{{path}}` to wildcards.
	#[must_use]
	pub fn any(mut self) -> Self {
		self.ext = Some(Binding::Any);
		self.path = Some(Binding::Any);
		self
	}

	/// Look up the binding for a placeholder token such as `{{ext}}`.
	pub fn binding(&self, placeholder: &str) -> Option<Binding> {
		match placeholder {
			NAME_PLACEHOLDER => Some(Binding::Value(self.name.clone())),
			EXT_PLACEHOLDER => self.ext.clone(),
			PATH_PLACEHOLDER => self.path.clone(),
			_ => None,
		}
	}

	/// Replace every bound placeholder in `template` with its value.
	/// Wildcards and unbound placeholders are left as they are.
	pub fn substitute(&self, template: &str) -> String {
		split_placeholders(template)
			.map(|segment| {
				match segment {
					Segment::Literal(text) => text.to_string(),
					Segment::Placeholder(token) => {
						match self.binding(token) {
							Some(Binding::Value(value)) => value,
							Some(Binding::Any) | None => token.to_string(),
						}
					}
				}
			})
			.collect()
	}
}

/// A piece of a tag template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
	Literal(&'a str),
	Placeholder(&'a str),
}

const PLACEHOLDERS: [&str; 3] = [NAME_PLACEHOLDER, EXT_PLACEHOLDER, PATH_PLACEHOLDER];

/// Split a template into literal text and known placeholder tokens.
pub(crate) fn split_placeholders(template: &str) -> impl Iterator<Item = Segment<'_>> {
	let mut rest = template;

	std::iter::from_fn(move || {
		if rest.is_empty() {
			return None;
		}

		let next = PLACEHOLDERS
			.iter()
			.filter_map(|token| rest.find(token).map(|idx| (idx, *token)))
			.min_by_key(|(idx, _)| *idx);

		match next {
			Some((0, token)) => {
				rest = &rest[token.len()..];
				Some(Segment::Placeholder(token))
			}
			Some((idx, _)) => {
				let literal = &rest[..idx];
				rest = &rest[idx..];
				Some(Segment::Literal(literal))
			}
			None => {
				let literal = rest;
				rest = "";
				Some(Segment::Literal(literal))
			}
		}
	})
}
