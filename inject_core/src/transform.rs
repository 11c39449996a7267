use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::InjectError;
use crate::InjectResult;
use crate::SourceFile;
use crate::TargetDocument;
use crate::source::extname;

/// Target conventions with a built-in fragment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
	Html,
	Jsx,
	Jade,
	Pug,
	Slm,
	Slim,
	Haml,
	Less,
	Sass,
	Scss,
}

impl TargetType {
	/// Match a target extension case-insensitively.
	pub fn from_ext(ext: &str) -> Option<Self> {
		let target = match ext.to_ascii_lowercase().as_str() {
			"html" => Self::Html,
			"jsx" => Self::Jsx,
			"jade" => Self::Jade,
			"pug" => Self::Pug,
			"slm" => Self::Slm,
			"slim" => Self::Slim,
			"haml" => Self::Haml,
			"less" => Self::Less,
			"sass" => Self::Sass,
			"scss" => Self::Scss,
			_ => return None,
		};
		Some(target)
	}

	/// The target type of a path, defaulting to html for unknown types.
	pub fn from_path(path: &str) -> Self {
		Self::from_ext(&extname(path)).unwrap_or(Self::Html)
	}
}

/// Normalized category of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
	Css,
	Js,
	Jsx,
	Html,
	Coffee,
	/// `jpeg`, `jpg`, `png` and `gif`.
	Image,
	Jade,
	Pug,
	Less,
	Sass,
	Scss,
}

impl SourceType {
	pub fn from_ext(ext: &str) -> Option<Self> {
		let source = match ext.to_ascii_lowercase().as_str() {
			"css" => Self::Css,
			"js" => Self::Js,
			"jsx" => Self::Jsx,
			"html" => Self::Html,
			"coffee" => Self::Coffee,
			"jpeg" | "jpg" | "png" | "gif" => Self::Image,
			"jade" => Self::Jade,
			"pug" => Self::Pug,
			"less" => Self::Less,
			"sass" => Self::Sass,
			"scss" => Self::Scss,
			_ => return None,
		};
		Some(source)
	}

	pub fn from_path(path: &str) -> Option<Self> {
		Self::from_ext(&extname(path))
	}
}

/// Rendering switches passed by value into every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
	/// End void elements (`link`, `img`) with ` />` in html-family targets.
	pub self_closing_tag: bool,
}

/// Everything a transform knows about the file it renders.
#[derive(Debug, Clone, Copy)]
pub struct FragmentRequest<'a> {
	/// The shaped path that should appear in the fragment.
	pub filepath: &'a str,
	pub source: &'a SourceFile,
	/// Position of the file within its injection group.
	pub index: usize,
	/// Number of files in the injection group.
	pub total: usize,
	pub target: &'a TargetDocument,
}

impl FragmentRequest<'_> {
	/// Whether this is the final file of its group.
	pub fn is_last(&self) -> bool {
		self.index + 1 >= self.total
	}
}

/// Render a fragment with the built-in table for the request's target.
///
/// Returns `None` when there is no mapping for the `(target, source)`
/// pair; the file is then silently omitted.
pub fn render(request: &FragmentRequest<'_>, options: RenderOptions) -> Option<String> {
	let target = TargetType::from_path(&request.target.path.to_string_lossy());
	render_as(target, request.filepath, options)
}

/// Render `filepath` as a fragment for an explicit target type.
pub fn render_as(target: TargetType, filepath: &str, options: RenderOptions) -> Option<String> {
	let source = SourceType::from_path(filepath)?;

	match target {
		TargetType::Html => html_fragment(source, filepath, options),
		// jsx only accepts self closing void elements. The flag is scoped to
		// this call.
		TargetType::Jsx => {
			html_fragment(
				source,
				filepath,
				RenderOptions {
					self_closing_tag: true,
				},
			)
		}
		TargetType::Jade | TargetType::Pug => jade_fragment(target, source, filepath),
		TargetType::Slm | TargetType::Slim => slm_fragment(source, filepath),
		TargetType::Haml => haml_fragment(source, filepath),
		TargetType::Less => {
			matches!(source, SourceType::Css | SourceType::Less)
				.then(|| format!("@import \"{filepath}\";"))
		}
		TargetType::Sass => {
			matches!(source, SourceType::Css | SourceType::Sass | SourceType::Scss)
				.then(|| format!("@import \"{filepath}\""))
		}
		TargetType::Scss => {
			matches!(source, SourceType::Css | SourceType::Sass | SourceType::Scss)
				.then(|| format!("@import \"{filepath}\";"))
		}
	}
}

fn html_fragment(source: SourceType, filepath: &str, options: RenderOptions) -> Option<String> {
	let end = if options.self_closing_tag { " />" } else { ">" };
	let fragment = match source {
		SourceType::Css => format!("<link rel=\"stylesheet\" href=\"{filepath}\"{end}"),
		SourceType::Js => format!("<script src=\"{filepath}\"></script>"),
		SourceType::Jsx => format!("<script type=\"text/jsx\" src=\"{filepath}\"></script>"),
		SourceType::Html => format!("<link rel=\"import\" href=\"{filepath}\"{end}"),
		SourceType::Coffee => {
			format!("<script type=\"text/coffeescript\" src=\"{filepath}\"></script>")
		}
		SourceType::Image => format!("<img src=\"{filepath}\"{end}"),
		_ => return None,
	};
	Some(fragment)
}

fn jade_fragment(target: TargetType, source: SourceType, filepath: &str) -> Option<String> {
	let fragment = match source {
		SourceType::Css => format!("link(rel=\"stylesheet\", href=\"{filepath}\")"),
		SourceType::Js => format!("script(src=\"{filepath}\")"),
		SourceType::Jsx => format!("script(type=\"text/jsx\", src=\"{filepath}\")"),
		SourceType::Html => format!("link(rel=\"import\", href=\"{filepath}\")"),
		SourceType::Coffee => format!("script(type=\"text/coffeescript\", src=\"{filepath}\")"),
		SourceType::Image => format!("img(src=\"{filepath}\")"),
		SourceType::Jade if target == TargetType::Jade => format!("include {filepath}"),
		SourceType::Pug if target == TargetType::Pug => format!("include {filepath}"),
		_ => return None,
	};
	Some(fragment)
}

fn slm_fragment(source: SourceType, filepath: &str) -> Option<String> {
	let fragment = match source {
		SourceType::Css => format!("link rel=\"stylesheet\" href=\"{filepath}\""),
		SourceType::Js => format!("script src=\"{filepath}\""),
		SourceType::Jsx => format!("script type=\"text/jsx\" src=\"{filepath}\""),
		SourceType::Html => format!("link rel=\"import\" href=\"{filepath}\""),
		SourceType::Coffee => format!("script type=\"text/coffeescript\" src=\"{filepath}\""),
		SourceType::Image => format!("img src=\"{filepath}\""),
		_ => return None,
	};
	Some(fragment)
}

fn haml_fragment(source: SourceType, filepath: &str) -> Option<String> {
	let fragment = match source {
		SourceType::Css => format!("%link{{rel:\"stylesheet\", href:\"{filepath}\"}}"),
		SourceType::Js => format!("%script{{src:\"{filepath}\"}}"),
		SourceType::Jsx => format!("%script{{type:\"text/jsx\", src:\"{filepath}\"}}"),
		SourceType::Html => format!("%link{{rel:\"import\", href:\"{filepath}\"}}"),
		SourceType::Coffee => {
			format!("%script{{type:\"text/coffeescript\", src:\"{filepath}\"}}")
		}
		SourceType::Image => format!("%img{{src:\"{filepath}\"}}"),
		_ => return None,
	};
	Some(fragment)
}

/// A caller supplied renderer. Returning `None` omits the file.
pub type TransformFn = Arc<dyn Fn(&FragmentRequest<'_>) -> Option<String> + Send + Sync>;

/// How each source file is turned into a fragment.
#[derive(Clone, Default)]
pub enum Transform {
	/// The built-in per-target table.
	#[default]
	Default,
	/// A caller supplied function.
	Function(TransformFn),
	/// A minijinja template rendered once per file.
	Template(FragmentTemplate),
}

impl Transform {
	pub fn function<F>(func: F) -> Self
	where
		F: Fn(&FragmentRequest<'_>) -> Option<String> + Send + Sync + 'static,
	{
		Self::Function(Arc::new(func))
	}

	/// Render one file. `Ok(None)` means the file contributes nothing.
	pub fn render(
		&self,
		request: &FragmentRequest<'_>,
		options: RenderOptions,
	) -> InjectResult<Option<String>> {
		match self {
			Self::Default => Ok(render(request, options)),
			Self::Function(func) => Ok(func(request)),
			Self::Template(template) => template.render(request).map(Some),
		}
	}
}

impl fmt::Debug for Transform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Default => f.write_str("Default"),
			Self::Function(_) => f.write_str("Function(..)"),
			Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
		}
	}
}

const FRAGMENT_TEMPLATE_NAME: &str = "__fragment__";

/// A fragment template such as `<script src="{{ path }}"></script>`.
///
/// The template sees `path`, `ext`, `index`, `total`, `last`, `content`
/// and `target`.
#[derive(Clone)]
pub struct FragmentTemplate {
	source: String,
	env: Arc<minijinja::Environment<'static>>,
}

#[derive(Serialize)]
struct FragmentContext<'a> {
	path: &'a str,
	ext: String,
	index: usize,
	total: usize,
	last: bool,
	content: Option<&'a str>,
	target: String,
}

impl FragmentTemplate {
	/// Compile the template once so syntax errors surface before any
	/// document is processed. The compiled template is shared by every
	/// render.
	pub fn new(source: impl Into<String>) -> InjectResult<Self> {
		let source = source.into();
		let mut env = minijinja::Environment::new();
		env.set_keep_trailing_newline(true);
		env.add_template_owned(FRAGMENT_TEMPLATE_NAME, source.clone())
			.map_err(|e| InjectError::InvalidTemplate(e.to_string()))?;

		Ok(Self {
			source,
			env: Arc::new(env),
		})
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn render(&self, request: &FragmentRequest<'_>) -> InjectResult<String> {
		let template = self
			.env
			.get_template(FRAGMENT_TEMPLATE_NAME)
			.map_err(|e| InjectError::TemplateRender(e.to_string()))?;

		let ctx = FragmentContext {
			path: request.filepath,
			ext: request.source.ext(),
			index: request.index,
			total: request.total,
			last: request.is_last(),
			content: request.source.contents.as_deref(),
			target: request.target.relative(),
		};

		template
			.render(minijinja::Value::from_serialize(&ctx))
			.map_err(|e| InjectError::TemplateRender(e.to_string()))
	}
}

impl fmt::Debug for FragmentTemplate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FragmentTemplate")
			.field("source", &self.source)
			.finish_non_exhaustive()
	}
}

impl PartialEq for FragmentTemplate {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source
	}
}

impl Eq for FragmentTemplate {}
