//! Integration tests for memoize

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn memoize() -> Command {
        cargo_bin_cmd!("memoize")
    }

    #[test]
    fn help_displays() {
        memoize()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Memoize any program or command"));
    }

    #[test]
    fn version_displays() {
        memoize()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("memoize"));
    }

    #[test]
    fn missing_command_is_usage_error() {
        memoize()
            .args(["--no-local", "-v"])
            .assert()
            .code(1)
            .stdout(
                predicate::str::contains("A command to memoize is required")
                    .and(predicate::str::contains("Usage")),
            );
    }
}

#[cfg(unix)]
mod memoize_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    /// Stand-in for strace: reports that `input.txt` was opened, runs the
    /// command, and records its exit status.
    const FAKE_STRACE: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --) shift; break ;;
    *) shift ;;
  esac
done
echo 'openat(AT_FDCWD, "input.txt", O_RDONLY) = 3' > "$out"
"$@"
code=$?
echo "exit_group($code) = ?" >> "$out"
exit $code
"#;

    /// Like `FAKE_STRACE`, but the trace carries no exit event.
    const FAKE_STRACE_NO_EXIT: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --) shift; break ;;
    *) shift ;;
  esac
done
echo 'openat(AT_FDCWD, "input.txt", O_RDONLY) = 3' > "$out"
exec "$@"
"#;

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new(tracer: Option<&str>) -> Self {
            Self::with_script(FAKE_STRACE, tracer)
        }

        fn with_script(script: &str, tracer: Option<&str>) -> Self {
            let dir = TempDir::new().unwrap();
            let tracer_path = dir.path().join("fake-strace");
            fs::write(&tracer_path, script).unwrap();
            fs::set_permissions(&tracer_path, fs::Permissions::from_mode(0o755)).unwrap();

            let program = tracer
                .map(str::to_string)
                .unwrap_or_else(|| tracer_path.display().to_string());
            fs::write(
                dir.path().join("config.toml"),
                format!("[tracer]\nprogram = \"{}\"\n", program),
            )
            .unwrap();
            fs::write(dir.path().join("input.txt"), "v1\n").unwrap();

            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn memoize(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("memoize");
            cmd.current_dir(self.path())
                .env_remove("MEMOIZE_CONFIG")
                .arg("--no-local")
                .arg("--config")
                .arg(self.path().join("config.toml"));
            cmd
        }

        fn runs(&self) -> usize {
            fs::read_to_string(self.path().join("runs.log"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        fn store(&self) -> serde_json::Value {
            let content = fs::read_to_string(self.path().join(".deps3")).unwrap();
            serde_json::from_str(&content).unwrap()
        }
    }

    const RECORDING_COMMAND: [&str; 3] = ["sh", "-c", "cat input.txt >> runs.log"];

    #[test]
    fn second_run_is_up_to_date() {
        let project = Project::new(None);

        project.memoize().args(RECORDING_COMMAND).assert().success();
        assert_eq!(project.runs(), 1);

        project
            .memoize()
            .args(RECORDING_COMMAND)
            .assert()
            .success()
            .stdout(predicate::str::contains("Up to date:"));
        assert_eq!(project.runs(), 1);
    }

    #[test]
    fn changed_input_reruns() {
        let project = Project::new(None);

        project.memoize().args(RECORDING_COMMAND).assert().success();
        fs::write(project.path().join("input.txt"), "v2\n").unwrap();
        project.memoize().args(RECORDING_COMMAND).assert().success();

        assert_eq!(project.runs(), 2);
    }

    #[test]
    fn store_records_command_and_file() {
        let project = Project::new(None);

        project.memoize().args(RECORDING_COMMAND).assert().success();

        let store = project.store();
        let deps = &store["commands"]["sh -c 'cat input.txt >> runs.log'"];
        assert_eq!(deps.as_array().unwrap().len(), 1);
        assert!(deps[0]["path"].as_str().unwrap().ends_with("input.txt"));
        assert!(deps[0]["hash"].is_string());
    }

    #[test]
    fn failing_command_returns_its_exit_code_and_is_not_recorded() {
        let project = Project::new(None);

        project.memoize().args(["sh", "-c", "exit 3"]).assert().code(3);

        let store = project.store();
        assert!(store["commands"].as_object().unwrap().is_empty());
    }

    #[test]
    fn custom_store_filename() {
        let project = Project::new(None);

        project
            .memoize()
            .args(["-f", "state/deps.json"])
            .args(RECORDING_COMMAND)
            .assert()
            .success();

        assert!(project.path().join("state/deps.json").exists());
        assert!(!project.path().join(".deps3").exists());
    }

    #[test]
    fn missing_tracer_is_a_configuration_error() {
        let project = Project::new(Some("/nonexistent/strace"));

        project
            .memoize()
            .args(["true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Tracer not found"));
        assert!(!project.path().join(".deps3").exists());
    }

    #[test]
    fn stdout_is_only_the_command_output() {
        let project = Project::with_script(FAKE_STRACE_NO_EXIT, None);
        fs::write(project.path().join(".deps3"), "not json").unwrap();

        let output = project
            .memoize()
            .args(["echo", "payload"])
            .env_remove("RUST_LOG")
            .output()
            .unwrap();

        assert!(output.status.success());
        assert_eq!(String::from_utf8(output.stdout).unwrap(), "payload\n");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn verbose_reports_corrupt_store() {
        let project = Project::new(None);
        fs::write(project.path().join(".deps3"), "not json").unwrap();

        project
            .memoize()
            .arg("-v")
            .args(["echo", "payload"])
            .env_remove("RUST_LOG")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("corrupt dependency store")
                    .and(predicate::str::contains("payload"))
                    .and(predicate::str::contains("\u{1b}[").not()),
            );
    }

    #[test]
    fn store_write_failure_suggests_verbose() {
        let project = Project::new(None);

        project
            .memoize()
            .args(["-f", "input.txt/deps.json"])
            .args(RECORDING_COMMAND)
            .assert()
            .code(1)
            .stderr(
                predicate::str::contains("creating store directory")
                    .and(predicate::str::contains("Re-run with -v")),
            );
    }

    fn strace_works() -> bool {
        std::process::Command::new("strace")
            .args(["-f", "-o", "/dev/null", "true"])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn real_strace_round_trip() {
        if !strace_works() {
            eprintln!("skipping: strace unavailable");
            return;
        }

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("input.txt"), "v1\n").unwrap();
        let memoize = || {
            let mut cmd = cargo_bin_cmd!("memoize");
            cmd.current_dir(dir.path())
                .env("MEMOIZE_CONFIG", dir.path().join("absent.toml"))
                .arg("--no-local");
            cmd
        };
        let command = ["sh", "-c", "cat input.txt > out.txt"];

        memoize().args(command).assert().success();
        memoize()
            .args(command)
            .assert()
            .success()
            .stdout(predicate::str::contains("Up to date:"));

        fs::write(dir.path().join("input.txt"), "v2\n").unwrap();
        memoize()
            .args(command)
            .assert()
            .success()
            .stdout(predicate::str::contains("Up to date:").not());
        assert_eq!(
            fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "v2\n"
        );
    }
}
