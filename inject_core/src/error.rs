use miette::Diagnostic;
use thiserror::Error;

/// Coarse classification of an [`InjectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
	/// Invalid or contradictory options, raised before any matching begins.
	Configuration,
	/// A malformed template, fatal for the document being processed.
	Structural,
	/// Strict mode was requested and no file was injected.
	NothingToInject,
	/// Reading or writing files at the edge of the system.
	Io,
	/// A transform template failed while rendering a fragment.
	Render,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum InjectError {
	#[error(transparent)]
	#[diagnostic(code(inject::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid option `{option}`: {reason}")]
	#[diagnostic(code(inject::invalid_option))]
	InvalidOption { option: String, reason: String },

	#[error("`{option}` option is deprecated! {hint}")]
	#[diagnostic(code(inject::deprecated_option))]
	DeprecatedOption { option: String, hint: String },

	#[error("the resolved {0} tag is empty")]
	#[diagnostic(
		code(inject::empty_tag),
		help("configure a non-empty `starttag` / `endtag`")
	)]
	EmptyTag(&'static str),

	#[error("invalid transform template: {0}")]
	#[diagnostic(code(inject::invalid_template))]
	InvalidTemplate(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(inject::config_parse),
		help("check that inject.toml is valid TOML with at least one [[inject]] section")
	)]
	ConfigParse(String),

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(code(inject::invalid_glob))]
	InvalidGlob { pattern: String, reason: String },

	#[error("Missing end tag for start tag: {0}")]
	#[diagnostic(
		code(inject::missing_end_tag),
		help("add the matching end tag after `{0}`, or enable `single_tag` mode")
	)]
	MissingEndTag(String),

	#[error("Nothing to inject into {target}.")]
	#[diagnostic(
		code(inject::nothing_to_inject),
		help("check that the source patterns match files and the target contains injection tags")
	)]
	NothingToInject { target: String },

	#[error("transform rendering failed: {0}")]
	#[diagnostic(code(inject::template_render))]
	TemplateRender(String),

	#[error("could not build a pattern for tag `{tag}`: {reason}")]
	#[diagnostic(code(inject::invalid_pattern))]
	InvalidPattern { tag: String, reason: String },

	#[error("failed to walk project files: {0}")]
	#[diagnostic(code(inject::walk))]
	Walk(String),
}

impl InjectError {
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Io(_) | Self::Walk(_) => ErrorCategory::Io,
			Self::InvalidOption { .. }
			| Self::DeprecatedOption { .. }
			| Self::EmptyTag(_)
			| Self::InvalidTemplate(_)
			| Self::ConfigParse(_)
			| Self::InvalidGlob { .. }
			| Self::InvalidPattern { .. } => ErrorCategory::Configuration,
			Self::MissingEndTag(_) => ErrorCategory::Structural,
			Self::NothingToInject { .. } => ErrorCategory::NothingToInject,
			Self::TemplateRender(_) => ErrorCategory::Render,
		}
	}
}

pub type InjectResult<T> = Result<T, InjectError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
