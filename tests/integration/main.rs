//! Integration tests for nativepack

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "CIBUILDWHEEL",
        "CONAN_HOME",
        "LIBC_CACHE_ID_FILE",
        "CONAN_CENTER_CLONE_PATH",
        "NATIVEPACK_CONFIG",
        "NATIVEPACK_DEBUG_BUILD",
        "NATIVEPACK_LOG",
    ];

    fn nativepack() -> Command {
        let mut cmd = cargo_bin_cmd!("nativepack");
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    fn source_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("conandata.yml"),
            "sources: {}\nrequirements:\n  - \"loki/0.0.8\"\n  - badline\n  - \"nauty/2.8.8\"\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn help_displays() {
        nativepack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build orchestrator"));
    }

    #[test]
    fn version_displays() {
        nativepack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nativepack"));
    }

    #[test]
    fn requirements_skip_malformed_lines() {
        let dir = source_dir();
        nativepack()
            .args(["requirements", "-s"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("loki/0.0.8"))
            .stdout(predicate::str::contains("nauty/2.8.8"))
            .stdout(predicate::str::contains("badline").not());
    }

    #[test]
    fn requirements_json() {
        let dir = source_dir();
        let output = nativepack()
            .args(["requirements", "-f", "json", "-s"])
            .arg(dir.path())
            .output()
            .unwrap();
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["requirements"].as_array().unwrap().len(), 2);
        assert_eq!(value["malformed"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn requirements_missing_manifest_fails() {
        let dir = TempDir::new().unwrap();
        nativepack()
            .args(["requirements", "-s"])
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn failing_configure_reports_stage() {
        let dir = source_dir();
        nativepack()
            .args(["build", "--toolchain-cmd", "false", "--conan-cmd", "false", "-s"])
            .arg(dir.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("FAILED at CONFIGURE"));
    }

    #[test]
    fn isolated_build_without_home_is_orchestration_failure() {
        let dir = source_dir();
        nativepack()
            .args(["build", "--isolated", "--toolchain-cmd", "false", "-s"])
            .arg(dir.path())
            .assert()
            .code(3)
            .stderr(predicate::str::contains("FAILED at ENV_SETUP"));
    }

    #[test]
    fn probe_runs() {
        nativepack()
            .args(["probe", "-f", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("family"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        nativepack()
            .args(["config", "-s"])
            .arg(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("[toolchain]"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        nativepack()
            .args(["config", "-s"])
            .arg(dir.path())
            .arg("path")
            .assert()
            .success()
            .stdout(predicate::str::contains("nativepack.toml"));
    }

    #[test]
    fn project_config_is_discovered() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("nativepack.toml"),
            "[extension]\npackage = \"pyloki\"\n",
        )
        .unwrap();
        nativepack()
            .args(["config", "-s"])
            .arg(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("pyloki"));
    }

    #[test]
    fn explicit_missing_config_is_orchestration_failure() {
        nativepack()
            .args(["--config", "/nonexistent/nativepack.toml", "config", "show"])
            .assert()
            .code(3);
    }

    #[test]
    fn completions_bash() {
        nativepack()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("nativepack"));
    }
}
