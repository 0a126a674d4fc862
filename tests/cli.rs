use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn pip_init(args: &[&str], overrides: Option<&str>) -> Output {
    let mut cmd = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_pip_init")));
    cmd.args(args)
        .env_remove("PIP_INIT_ARGS")
        .env_remove("PIP_INIT_HOME")
        .env_remove("PIP_INIT_LOG");
    if let Some(overrides) = overrides {
        cmd.env("PIP_INIT_ARGS", overrides);
    }
    cmd.output().expect("failed to run pip_init")
}

fn bundled_templates() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("templates")
        .to_string_lossy()
        .into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn bundled_default_succeeds() {
    let target = tempfile::tempdir().unwrap();
    let out = target.path().join("pkg");
    let output = pip_init(&[out.to_str().unwrap(), "--home", &bundled_templates()], None);

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Succeeded."));
    assert!(out.join("pyproject.toml").is_file());
    assert!(out.join("src/my_package/__init__.py").is_file());
}

#[test]
fn unknown_template_prints_search_path() {
    let home = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let output = pip_init(
        &[
            target.path().to_str().unwrap(),
            "--name",
            "doesnotexist",
            "--home",
            home.path().to_str().unwrap(),
        ],
        None,
    );

    assert_eq!(output.status.code(), Some(1));
    let printed = stdout(&output);
    assert!(printed.contains("failed to import template"));
    assert!(printed.contains("pip_init_internal_templates.doesnotexist"));
}

#[test]
fn malformed_overrides_do_not_hide_an_unknown_template() {
    let home = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let output = pip_init(
        &[
            target.path().to_str().unwrap(),
            "--name",
            "doesnotexist",
            "--home",
            home.path().to_str().unwrap(),
        ],
        Some("novalue"),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("pip_init_internal_templates.doesnotexist"));
}

#[test]
fn external_template_dir_with_broken_manifest_fails() {
    let templates = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let dir = templates.path().join("pip_init_templates").join("broken");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("template.json"), "{\"contents\": [").unwrap();

    let output = pip_init(
        &[
            target.path().to_str().unwrap(),
            "-n",
            "broken",
            "--template_dir",
            templates.path().to_str().unwrap(),
        ],
        None,
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot parse manifest"));
    assert!(!stdout(&output).contains("Succeeded."));
}
