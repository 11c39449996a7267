use inject_core::AnyEmptyResult;

mod common;

use common::CONFIG;
use common::INDEX;
use common::INJECTED_INDEX;
use common::inject_cmd;
use common::write_files;

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_files(tmp.path(), &[
		("inject.toml", CONFIG),
		("src/index.html", INJECTED_INDEX),
		("dist/app.js", ""),
		("dist/site.css", ""),
	])?;

	inject_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("All targets are up to date."));

	Ok(())
}

#[test]
fn check_fails_when_stale() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_files(tmp.path(), &[
		("inject.toml", CONFIG),
		("src/index.html", INDEX),
		("dist/app.js", ""),
	])?;

	inject_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Stale targets:"))
		.stderr(predicates::str::contains("src/index.html"));

	let content = std::fs::read_to_string(tmp.path().join("src/index.html"))?;
	assert_eq!(content, INDEX);

	Ok(())
}

#[test]
fn check_diff_shows_expected_lines() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_files(tmp.path(), &[
		("inject.toml", CONFIG),
		("src/index.html", INDEX),
		("dist/app.js", ""),
	])?;

	inject_cmd()
		.arg("check")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains(
			"+  <script src=\"/dist/app.js\"></script>",
		));

	Ok(())
}

#[test]
fn check_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_files(tmp.path(), &[
		("inject.toml", CONFIG),
		("src/index.html", INDEX),
		("dist/app.js", ""),
	])?;

	let output = inject_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--quiet")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert_eq!(output.status.code(), Some(1));

	let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], serde_json::Value::Bool(false));
	assert_eq!(json["stale"][0]["target"], "src/index.html");
	assert_eq!(json["stale"][0]["current"], INDEX);

	Ok(())
}
