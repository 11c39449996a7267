use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::CountMode;
use crate::InjectError;
use crate::InjectOptions;
use crate::InjectResult;
use crate::SortFn;
use crate::SourceFile;
use crate::filepath::PathOptions;
use crate::tags::DEFAULT_NAME;
use crate::tags::TagKind;
use crate::tags::TagOverride;
use crate::transform::FragmentTemplate;
use crate::transform::Transform;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["inject.toml", ".inject.toml", ".config/inject.toml"];

/// A value that may be written as a single string or a list of strings.
///
/// ```toml
/// ignore_path = "dist"
/// ignore_path = ["dist", "build"]
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
	One(String),
	Many(Vec<String>),
}

impl OneOrMany {
	pub fn to_vec(&self) -> Vec<String> {
		match self {
			Self::One(value) => vec![value.clone()],
			Self::Many(values) => values.clone(),
		}
	}
}

/// Ordering applied to the files of each injection group.
#[derive(Debug, Clone, Copy, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
	/// Keep discovery order.
	#[default]
	Input,
	/// Ascending by source path.
	Path,
	/// Descending by source path.
	PathDesc,
}

impl SortOrder {
	pub fn comparator(self) -> Option<SortFn> {
		match self {
			Self::Input => None,
			Self::Path => Some(Arc::new(|a: &SourceFile, b: &SourceFile| a.path.cmp(&b.path))),
			Self::PathDesc => Some(Arc::new(|a: &SourceFile, b: &SourceFile| b.path.cmp(&a.path))),
		}
	}
}

/// Tags used for one target extension.
///
/// ```toml
/// [tags.json]
/// start = '"{{ext}}": ['
/// end = "]"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Eq, PartialEq)]
pub struct TagsConfig {
	#[serde(default)]
	pub start: Option<String>,
	#[serde(default)]
	pub end: Option<String>,
}

/// One `[[inject]]` entry: a set of targets and the sources injected into
/// them.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct InjectionConfig {
	/// Glob patterns selecting target documents. `!` prefixed patterns
	/// exclude.
	pub targets: Vec<String>,
	/// Glob patterns selecting source files, in priority order.
	pub sources: Vec<String>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub starttag: Option<String>,
	#[serde(default)]
	pub endtag: Option<String>,
	#[serde(default)]
	pub transform: Option<String>,
}

/// Configuration loaded from an `inject.toml` file.
///
/// ```toml
/// name = "inject"
/// relative = true
/// ignore_path = ["dist"]
///
/// [[inject]]
/// targets = ["src/index.html"]
/// sources = ["dist/**/*.js", "dist/**/*.css"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct InjectConfig {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub starttag: Option<String>,
	#[serde(default)]
	pub endtag: Option<String>,
	/// A minijinja fragment template replacing the built-in renderers.
	#[serde(default)]
	pub transform: Option<String>,
	#[serde(default)]
	pub sort: SortOrder,
	#[serde(default)]
	pub relative: bool,
	#[serde(default)]
	pub ignore_path: Option<OneOrMany>,
	#[serde(default)]
	pub add_prefix: Option<String>,
	#[serde(default)]
	pub add_suffix: Option<String>,
	#[serde(default)]
	pub add_root_slash: Option<bool>,
	#[serde(default)]
	pub remove_tags: bool,
	#[serde(default)]
	pub empty: bool,
	#[serde(default)]
	pub self_closing_tag: bool,
	#[serde(default)]
	pub single_tag: bool,
	#[serde(default)]
	pub quiet: bool,
	#[serde(default)]
	pub throw_error_if_no_inject: bool,
	#[serde(default)]
	pub count: CountMode,
	/// When true, `.gitignore` files are not used for filtering.
	#[serde(default)]
	pub disable_gitignore: bool,
	/// Per target extension tag overrides.
	#[serde(default)]
	pub tags: BTreeMap<String, TagsConfig>,
	#[serde(default)]
	pub inject: Vec<InjectionConfig>,
	#[serde(default)]
	template_string: Option<toml::Value>,
	#[serde(default)]
	read: Option<toml::Value>,
}

impl InjectConfig {
	/// Resolve the config file path from supported candidates.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first candidate found in `root`.
	pub fn load(root: &Path) -> InjectResult<Option<InjectConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::parse(&content).map(Some)
	}

	/// Parse and validate config text.
	pub fn parse(content: &str) -> InjectResult<InjectConfig> {
		let config: InjectConfig =
			toml::from_str(content).map_err(|e| InjectError::ConfigParse(e.to_string()))?;
		config.validate()?;

		Ok(config)
	}

	fn validate(&self) -> InjectResult<()> {
		if self.template_string.is_some() {
			return Err(InjectError::DeprecatedOption {
				option: "template_string".to_string(),
				hint: "Create the target file on disk and list it in `targets` instead.".to_string(),
			});
		}

		if self.read.is_some() {
			return Err(InjectError::DeprecatedOption {
				option: "read".to_string(),
				hint: "Source contents are read automatically when a `transform` template is set."
					.to_string(),
			});
		}

		if self.inject.is_empty() {
			return Err(InjectError::InvalidOption {
				option: "inject".to_string(),
				reason: "at least one [[inject]] section is required".to_string(),
			});
		}

		for (index, entry) in self.inject.iter().enumerate() {
			if entry.targets.is_empty() || entry.sources.is_empty() {
				return Err(InjectError::InvalidOption {
					option: format!("inject[{index}]"),
					reason: "both `targets` and `sources` need at least one pattern".to_string(),
				});
			}

			self.options_for(entry)?;
		}

		Ok(())
	}

	/// Whether sources of `entry` have to be read from disk.
	pub fn needs_contents(&self, entry: &InjectionConfig) -> bool {
		entry.transform.is_some() || self.transform.is_some()
	}

	/// Build the engine options for one `[[inject]]` entry. Entry level
	/// `name`, `starttag`, `endtag` and `transform` win over the top level
	/// values.
	pub fn options_for(&self, entry: &InjectionConfig) -> InjectResult<InjectOptions> {
		let name = entry
			.name
			.clone()
			.or_else(|| self.name.clone())
			.unwrap_or_else(|| DEFAULT_NAME.to_string());

		let starttag = entry
			.starttag
			.clone()
			.or_else(|| self.starttag.clone())
			.map(TagOverride::Literal)
			.or_else(|| self.tag_override(TagKind::Start));

		let endtag = if self.single_tag {
			None
		} else {
			entry
				.endtag
				.clone()
				.or_else(|| self.endtag.clone())
				.map(TagOverride::Literal)
				.or_else(|| self.tag_override(TagKind::End))
		};

		let transform = match entry.transform.as_ref().or(self.transform.as_ref()) {
			Some(source) => Transform::Template(FragmentTemplate::new(source.as_str())?),
			None => Transform::Default,
		};

		let options = InjectOptions {
			name,
			starttag,
			endtag,
			transform,
			sort: self.sort.comparator(),
			paths: PathOptions {
				relative: self.relative,
				ignore_path: self.ignore_path.as_ref().map(OneOrMany::to_vec).unwrap_or_default(),
				add_prefix: self.add_prefix.clone(),
				add_suffix: self.add_suffix.clone(),
				add_root_slash: self.add_root_slash,
			},
			remove_tags: self.remove_tags,
			empty: self.empty,
			self_closing_tag: self.self_closing_tag,
			single_tag: self.single_tag,
			quiet: self.quiet,
			throw_error_if_no_inject: self.throw_error_if_no_inject,
			count: self.count,
		};
		options.validate()?;

		Ok(options)
	}

	/// A function override serving the `[tags.<ext>]` tables. Other target
	/// extensions fall through to the built-in tags.
	fn tag_override(&self, kind: TagKind) -> Option<TagOverride> {
		let tags: BTreeMap<String, String> = self
			.tags
			.iter()
			.filter_map(|(ext, tags)| {
				let tag = match kind {
					TagKind::Start => tags.start.as_ref(),
					TagKind::End => tags.end.as_ref(),
				};
				tag.map(|tag| (ext.to_ascii_lowercase(), tag.clone()))
			})
			.collect();

		if tags.is_empty() {
			return None;
		}

		Some(TagOverride::function(move |target_ext, _source_ext| {
			tags.get(&target_ext.to_ascii_lowercase()).cloned()
		}))
	}
}
