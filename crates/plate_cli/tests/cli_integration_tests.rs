//! End-to-end tests running the `plate` binary against a static library.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const MANIFEST: &str = r#"
kind: kubernetes
schema: "1.1"
metadata:
  name: Web App
  next_steps: kubectl apply -f {{ release_name }}.yaml
spec:
  general:
    vars:
      container_port:
        type: int
        default: 8080
"#;

struct Workspace {
    temp: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempdir().unwrap();
        let template = temp.path().join("library/kubernetes/web-app");
        fs::create_dir_all(&template).unwrap();
        fs::write(template.join("template.yaml"), MANIFEST).unwrap();
        fs::write(
            template.join("deployment.yaml.j2"),
            "name: {{ release_name }}\nport: {{ container_port }}\n",
        )
        .unwrap();
        fs::write(template.join("README.md"), "static {{ release_name }}\n").unwrap();

        let config = temp.path().join("config.yaml");
        fs::write(
            &config,
            "libraries:\n  - name: local\n    type: static\n    path: library\n",
        )
        .unwrap();
        Self { temp, config }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn plate(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("plate"));
        cmd.args(args)
            .env("PLATE_CONFIG", &self.config)
            .env("XDG_DATA_HOME", self.temp.path().join("data"))
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }
}

#[test]
fn test_generate_writes_rendered_files() {
    let ws = Workspace::new();
    let out = ws.path().join("out");

    ws.plate(&[
        "generate",
        "kubernetes",
        "web-app",
        "--no-interactive",
        "--var",
        "release_name=api",
        "-o",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("kubectl apply -f api.yaml"));

    assert_eq!(
        fs::read_to_string(out.join("deployment.yaml")).unwrap(),
        "name: api\nport: 8080\n"
    );
    assert_eq!(fs::read_to_string(out.join("README.md")).unwrap(), "static {{ release_name }}\n");
    assert!(!out.join("template.yaml").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let ws = Workspace::new();
    let out = ws.path().join("out");

    ws.plate(&[
        "generate",
        "kubernetes",
        "web-app",
        "--dry-run",
        "--var",
        "release_name=api",
        "-o",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("deployment.yaml"));

    assert!(!out.exists());
}

#[test]
fn test_refuses_non_empty_output_without_force() {
    let ws = Workspace::new();
    let out = ws.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("keep.txt"), "keep").unwrap();
    let args = [
        "generate",
        "kubernetes",
        "web-app",
        "--var",
        "release_name=api",
        "-o",
        out.to_str().unwrap(),
    ];

    ws.plate(&args).assert().code(2);
    assert!(!out.join("deployment.yaml").exists());

    let mut forced = args.to_vec();
    forced.push("--force");
    ws.plate(&forced).assert().success();
    assert!(out.join("deployment.yaml").exists());
}

#[test]
fn test_exit_codes() {
    let ws = Workspace::new();

    // release_name is required and has no default
    ws.plate(&["validate", "kubernetes", "web-app"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("release_name"));

    ws.plate(&["validate", "kubernetes", "missing", "--var", "release_name=a"])
        .assert()
        .code(4);

    ws.plate(&["validate", "helm", "web-app"]).assert().code(2);

    ws.plate(&["validate", "kubernetes", "web-app", "--var", "noequals"])
        .assert()
        .code(2);

    ws.plate(&["validate", "kubernetes", "web-app", "--var", "release_name=a"])
        .assert()
        .success();
}

#[test]
fn test_saved_defaults_feed_resolution() {
    let ws = Workspace::new();

    ws.plate(&["defaults", "set", "kubernetes", "release_name", "saved"])
        .assert()
        .success();
    assert!(fs::read_to_string(&ws.config).unwrap().contains("release_name: saved"));

    ws.plate(&["defaults", "list", "kubernetes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved"));

    ws.plate(&["validate", "kubernetes", "web-app"]).assert().success();

    ws.plate(&["defaults", "remove", "kubernetes", "release_name"])
        .assert()
        .success();
    ws.plate(&["validate", "kubernetes", "web-app"]).assert().code(3);
}

#[test]
fn test_list_shows_templates() {
    let ws = Workspace::new();
    ws.plate(&["list", "kubernetes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web-app"));
}
