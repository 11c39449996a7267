use inject_core::AnyEmptyResult;

mod common;

use common::inject_cmd;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	inject_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created inject.toml"));

	let content = std::fs::read_to_string(tmp.path().join("inject.toml"))?;
	assert!(content.contains("[[inject]]"));
	assert!(inject_core::InjectConfig::parse(&content).is_ok());

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/inject.toml"), "existing")?;

	inject_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Config file already exists"));

	assert!(!tmp.path().join("inject.toml").exists());
	let content = std::fs::read_to_string(tmp.path().join(".config/inject.toml"))?;
	assert_eq!(content, "existing");

	Ok(())
}
