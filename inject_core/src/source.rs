use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;

/// A file reference to inject into a target.
///
/// `path` may carry query-suffix noise (`lib.js?v=abc`) which is ignored
/// when detecting the extension. `contents` is only populated when a
/// renderer needs the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
	/// Path of the source file, absolute or relative to `cwd`.
	pub path: PathBuf,
	/// Working directory the path is resolved against.
	pub cwd: PathBuf,
	/// Optional text payload of the file.
	pub contents: Option<String>,
}

impl SourceFile {
	pub fn new(cwd: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			cwd: cwd.into(),
			contents: None,
		}
	}

	#[must_use]
	pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
		self.contents = Some(contents.into());
		self
	}

	/// The source path joined onto `cwd` when relative.
	pub fn absolute_path(&self) -> PathBuf {
		self.cwd.join(&self.path)
	}

	/// The detected extension, without the leading dot.
	pub fn ext(&self) -> String {
		extname(&self.path.to_string_lossy())
	}
}

/// A template document whose injection regions are rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDocument {
	pub path: PathBuf,
	pub cwd: PathBuf,
	pub contents: String,
}

impl TargetDocument {
	pub fn new(cwd: impl Into<PathBuf>, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			cwd: cwd.into(),
			contents: contents.into(),
		}
	}

	pub fn absolute_path(&self) -> PathBuf {
		self.cwd.join(&self.path)
	}

	pub fn ext(&self) -> String {
		extname(&self.path.to_string_lossy())
	}

	/// The target path relative to its working directory, with forward
	/// slashes. Used in reports.
	pub fn relative(&self) -> String {
		let absolute = self.absolute_path();
		let relative = absolute.strip_prefix(&self.cwd).unwrap_or(&absolute);
		unixify(&relative.to_string_lossy()).into_owned()
	}
}

/// Extract the extension of `file` without the leading dot.
///
/// Inline php blocks and anything after the first `?` are removed first so
/// that hashed or versioned references (`styles.css?0123abcd`) resolve to
/// their real extension.
pub fn extname(file: &str) -> String {
	let without_php = strip_php(file);
	let without_query = without_php.split('?').next().unwrap_or_default();

	Path::new(without_query)
		.extension()
		.map(|ext| ext.to_string_lossy().into_owned())
		.unwrap_or_default()
}

fn strip_php(file: &str) -> Cow<'_, str> {
	let Some(start) = file.find("<?php") else {
		return Cow::Borrowed(file);
	};
	let Some(len) = file[start..].find('>') else {
		return Cow::Borrowed(file);
	};

	let mut stripped = String::with_capacity(file.len());
	stripped.push_str(&file[..start]);
	stripped.push_str(&file[start + len + 1..]);
	Cow::Owned(stripped)
}

/// Replace windows separators with forward slashes.
pub fn unixify(path: &str) -> Cow<'_, str> {
	if path.contains('\\') {
		Cow::Owned(path.replace('\\', "/"))
	} else {
		Cow::Borrowed(path)
	}
}
