use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn runner(settings: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scriptcs-runner").unwrap();
    cmd.env_remove("SCRIPTCS_EXE")
        .env_remove("SCRIPTCS_RUNNER_SETTINGS")
        .arg("--settings")
        .arg(settings);
    cmd
}

fn settings_with_exe(dir: &TempDir, exe: &str) -> PathBuf {
    let path = dir.path().join("settings.toml");
    fs::write(&path, format!("scriptcsexe = \"{exe}\"\n")).unwrap();
    path
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("scriptcs-runner").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(contains("ScriptCS Runner"));
}

#[test]
fn test_check_name() {
    let temp_dir = TempDir::new().unwrap();
    let settings = temp_dir.path().join("settings.toml");

    runner(&settings)
        .args(["check-name", ""])
        .assert()
        .code(64)
        .stdout(contains("error: Please set a name"));

    runner(&settings)
        .args(["check-name", "abc"])
        .assert()
        .success()
        .stdout(contains("warning: Isn't the name too short?"));
}

#[test]
fn test_configure_then_show_settings() {
    let temp_dir = TempDir::new().unwrap();
    let settings = temp_dir.path().join("conf").join("settings.toml");

    runner(&settings)
        .arg("settings")
        .assert()
        .success()
        .stdout(contains("ScriptCS executable: (not configured)"));

    runner(&settings)
        .args(["configure", "--exe", "/opt/scriptcs/scriptcs"])
        .assert()
        .success();

    runner(&settings)
        .arg("settings")
        .assert()
        .success()
        .stdout(contains("ScriptCS executable: /opt/scriptcs/scriptcs"));
}

#[test]
fn test_env_overrides_stored_executable() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_with_exe(&temp_dir, "/opt/scriptcs/scriptcs");

    runner(&settings)
        .env("SCRIPTCS_EXE", "/usr/local/bin/scriptcs")
        .arg("settings")
        .assert()
        .success()
        .stdout(contains("ScriptCS executable: /usr/local/bin/scriptcs"));
}

#[test]
fn test_run_without_executable_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let settings = temp_dir.path().join("settings.toml");

    runner(&settings)
        .current_dir(temp_dir.path())
        .args(["run", "--script-file", "build.csx"])
        .assert()
        .code(78);
}

#[test]
fn test_dry_run() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_with_exe(&temp_dir, "scriptcs");

    runner(&settings)
        .current_dir(temp_dir.path())
        .args(["run", "--dry-run", "--script-file", "build.csx", "--arguments=--verbose"])
        .assert()
        .success()
        .stdout(contains("Would execute: scriptcs build.csx -- --verbose"));
}

#[test]
fn test_nonexistent_executable_fails_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_with_exe(&temp_dir, "/nonexistent/bin/scriptcs");

    runner(&settings)
        .current_dir(temp_dir.path())
        .args(["run", "--script-file", "build.csx"])
        .assert()
        .code(1)
        .stdout(contains("FATAL: command execution failed"));
}

#[cfg(unix)]
#[test]
fn test_run_script_file_with_environment() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_with_exe(&temp_dir, "sh");
    fs::write(
        temp_dir.path().join("build.sh"),
        "echo \"built $BUILD_TAG\" \"$@\"\n",
    )
    .unwrap();

    runner(&settings)
        .current_dir(temp_dir.path())
        .env("BUILD_TAG", "ci-7")
        .args(["run", "--script-file", "build.sh", "--arguments=--verbose"])
        .assert()
        .success()
        .stdout(contains("Executing command: sh build.sh -- --verbose"))
        .stdout(contains("built ci-7 -- --verbose"));
}

#[cfg(unix)]
#[test]
fn test_custom_script_failure_removes_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_with_exe(&temp_dir, "sh");

    let assert = runner(&settings)
        .current_dir(temp_dir.path())
        .args(["run", "--custom-script", "echo \"script=$0\"; exit 3"])
        .assert()
        .code(1)
        .stdout(contains("Using custom script"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let script = stdout
        .lines()
        .find_map(|line| line.strip_prefix("script="))
        .expect("script path echoed");
    assert!(script.ends_with(".csx"));
    assert!(!Path::new(script).exists());
}

#[cfg(unix)]
#[test]
fn test_run_from_job_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_with_exe(&temp_dir, "sh");
    let job = temp_dir.path().join("job.toml");
    fs::write(
        &job,
        "scriptfile = \"ignored.sh\"\narguments = \"a b c\"\ncustomScript = \"\"\"\necho \"args=$#:$2\"\n\"\"\"\n",
    )
    .unwrap();

    runner(&settings)
        .current_dir(temp_dir.path())
        .arg("run")
        .arg("--job")
        .arg(&job)
        .assert()
        .success()
        .stdout(contains("args=2:a b c"));
}
