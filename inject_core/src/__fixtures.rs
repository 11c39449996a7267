use std::path::PathBuf;

use crate::SourceFile;
use crate::TargetDocument;

pub const CWD: &str = "/fixtures";

pub const HTML_TEMPLATE: &str = "<!DOCTYPE html>
<html>
<head>
  <!-- inject:css -->
  <!-- endinject -->
</head>
<body>
  <!-- inject:js -->
  <!-- endinject -->
</body>
</html>";

pub fn cwd() -> PathBuf {
	PathBuf::from(CWD)
}

pub fn source(path: &str) -> SourceFile {
	SourceFile::new(cwd(), path)
}

pub fn sources(paths: &[&str]) -> Vec<SourceFile> {
	paths.iter().map(|path| source(path)).collect()
}

pub fn target(path: &str, contents: &str) -> TargetDocument {
	TargetDocument::new(cwd(), path, contents)
}

pub fn html(contents: &str) -> TargetDocument {
	target("index.html", contents)
}

/// Write `files` below a fresh temporary directory.
pub fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for (path, contents) in files {
		let path = tmp.path().join(path);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
		}
		std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write: {e}"));
	}
	tmp
}
