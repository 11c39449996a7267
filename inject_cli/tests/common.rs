#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn inject_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("inject"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// Write `files` below `root`, creating parent directories.
pub fn write_files(root: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
	for (path, contents) in files {
		let path = root.join(path);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, contents)?;
	}
	Ok(())
}

pub const CONFIG: &str = r#"
[[inject]]
targets = ["src/*.html"]
sources = ["dist/**/*.css", "dist/**/*.js"]
"#;

pub const INDEX: &str = "<head>\n  <!-- inject:css -->\n  <!-- endinject -->\n</head>\n<body>\n  <!-- \
                         inject:js -->\n  <!-- endinject -->\n</body>\n";

pub const INJECTED_INDEX: &str = "<head>\n  <!-- inject:css -->\n  <link rel=\"stylesheet\" \
                                  href=\"/dist/site.css\">\n  <!-- endinject -->\n</head>\n<body>\n  \
                                  <!-- inject:js -->\n  <script src=\"/dist/app.js\"></script>\n  \
                                  <!-- endinject -->\n</body>\n";
