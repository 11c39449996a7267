use std::path::Path;

use crate::SourceFile;
use crate::TargetDocument;
use crate::source::unixify;

/// Options shaping the file path a fragment receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOptions {
	/// Make paths relative to the target's directory instead of the
	/// source's working directory.
	pub relative: bool,
	/// Leading path segments to strip.
	pub ignore_path: Vec<String>,
	/// Prepended to the path (a separating slash is inserted).
	pub add_prefix: Option<String>,
	/// Appended verbatim, e.g. `?v=1.0.0`.
	pub add_suffix: Option<String>,
	/// Force or strip the leading slash. Defaults to `!relative`.
	pub add_root_slash: Option<bool>,
}

impl PathOptions {
	pub fn add_root_slash(&self) -> bool {
		self.add_root_slash.unwrap_or(!self.relative)
	}
}

/// Compute the path string written into a fragment for `source` injected
/// into `target`.
pub fn shape_filepath(source: &SourceFile, target: &TargetDocument, options: &PathOptions) -> String {
	let source_path = source.absolute_path();

	let mut filepath = if options.relative {
		let target_path = target.absolute_path();
		let target_dir = target_path.parent().unwrap_or_else(|| Path::new("/"));
		pathdiff::diff_paths(&source_path, target_dir)
			.map_or_else(|| source_path.to_string_lossy().into_owned(), |p| {
				p.to_string_lossy().into_owned()
			})
	} else {
		source_path
			.strip_prefix(&source.cwd)
			.unwrap_or(&source_path)
			.to_string_lossy()
			.into_owned()
	};
	filepath = unixify(&filepath).into_owned();

	if !options.ignore_path.is_empty() {
		filepath = remove_base_path(&options.ignore_path, &filepath);
	}

	if let Some(prefix) = options.add_prefix.as_deref().filter(|p| !p.is_empty()) {
		filepath = format!("{prefix}{}", add_root_slash(&filepath));
	}

	if options.add_root_slash() {
		filepath = add_root_slash(&filepath);
	} else if options.add_prefix.is_none() {
		filepath = remove_root_slash(&filepath).to_string();
	}

	if let Some(suffix) = options.add_suffix.as_deref() {
		filepath.push_str(suffix);
	}

	filepath
}

/// Ensure exactly one leading slash before the first path segment.
pub fn add_root_slash(filepath: &str) -> String {
	let trimmed = filepath.trim_start_matches('/');
	if trimmed.is_empty() {
		return filepath.to_string();
	}
	format!("/{trimmed}")
}

pub fn remove_root_slash(filepath: &str) -> &str {
	filepath.trim_start_matches('/')
}

/// Strip the first matching base directory from `filepath`. A leading slash
/// on either side does not prevent a match.
pub fn remove_base_path(bases: &[String], filepath: &str) -> String {
	bases.iter().fold(filepath.to_string(), |path, base| {
		let mut base = unixify(base).into_owned();
		if base.is_empty() {
			return path;
		}

		let mut path = path;
		let path_rooted = path.starts_with('/');
		if path_rooted && !base.starts_with('/') {
			base.insert(0, '/');
		} else if !path_rooted && base.starts_with('/') {
			path.insert(0, '/');
		}

		match path.strip_prefix(&base) {
			Some(stripped) => stripped.to_string(),
			None if !path_rooted => path.trim_start_matches('/').to_string(),
			None => path,
		}
	})
}
