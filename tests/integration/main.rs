//! Integration tests for scopecss

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Command isolated from any user or project configuration
    fn scopecss(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("scopecss");
        cmd.current_dir(dir)
            .env("SCOPECSS_CONFIG", dir.join("no-such-config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::write(
            temp.path().join("src/base.css"),
            ".btn { padding: 0 }\n.primary { color: blue }\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("src/button.css"),
            ".button {\n  composes: btn primary from \"./base.css\";\n}\n.icon { }\n",
        )
        .unwrap();
        temp
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        scopecss(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("scoped class names for CSS Modules stylesheets"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        scopecss(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("scopecss"));
    }

    #[test]
    fn escape_and_unescape() {
        let temp = TempDir::new().unwrap();
        scopecss(temp.path())
            .args(["escape", "1a:b"])
            .assert()
            .success()
            .stdout("\\31 a\\:b\n");

        scopecss(temp.path())
            .args(["escape", "--local", "sm:hidden"])
            .assert()
            .success()
            .stdout("sm-hidden\n");

        scopecss(temp.path())
            .args(["unescape", "\\31 a\\:b"])
            .assert()
            .success()
            .stdout("1a:b\n");
    }

    #[test]
    fn name_with_default_template() {
        let temp = project();
        scopecss(temp.path())
            .args(["name", "button", "src/button.css"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("src-___button__button___"));
    }

    #[test]
    fn name_with_template_override() {
        let temp = project();
        scopecss(temp.path())
            .args(["name", "icon", "src/button.css", "--template", "[folder]_[name]_[local]"])
            .assert()
            .success()
            .stdout("src_button_icon\n");
    }

    #[test]
    fn name_is_stable_across_runs() {
        let temp = project();
        let first = scopecss(temp.path())
            .args(["name", "x", "src/a.css"])
            .output()
            .unwrap();
        let second = scopecss(temp.path())
            .args(["name", "x", "src/a.css"])
            .output()
            .unwrap();
        assert!(first.status.success());
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn local_config_applies() {
        let temp = project();
        std::fs::write(
            temp.path().join(".scopecss.toml"),
            "[naming]\ntemplate = \"[name]__[local]\"\n",
        )
        .unwrap();
        std::fs::create_dir_all(temp.path().join("src/deep")).unwrap();

        scopecss(&temp.path().join("src/deep"))
            .args(["name", "icon", "../button.css"])
            .assert()
            .success()
            .stdout("button__icon\n");

        scopecss(&temp.path().join("src/deep"))
            .args(["--no-local", "name", "icon", "../button.css", "-t", "[local]"])
            .assert()
            .success()
            .stdout("icon\n");
    }

    #[test]
    fn resolve_json() {
        let temp = project();
        std::fs::write(
            temp.path().join(".scopecss.toml"),
            "[naming]\ntemplate = \"[name]_[local]\"\n",
        )
        .unwrap();

        scopecss(temp.path())
            .args(["resolve", "src/button.css", "src/base.css"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "\"button\": \"button_button base_btn base_primary\"",
            ))
            .stdout(predicate::str::contains("\"icon\": \"button_icon\""))
            .stdout(predicate::str::contains("\"btn\": \"base_btn\""));
    }

    #[test]
    fn resolve_plain() {
        let temp = project();
        scopecss(temp.path())
            .args([
                "--no-local",
                "resolve",
                "src/base.css",
                "--format",
                "plain",
            ])
            .env("SCOPECSS_CONFIG", temp.path().join("global.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("# src/base.css"))
            .stdout(predicate::str::contains("btn = src-___base__btn___"));
    }

    #[test]
    fn resolve_reports_cycle() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.css"), ".a { composes: b from './b.css' }").unwrap();
        std::fs::write(temp.path().join("b.css"), ".b { composes: a from './a.css' }").unwrap();

        scopecss(temp.path())
            .args(["resolve", "a.css"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("a.css"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn resolve_reports_missing_target() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.css"), ".a { composes: x from './gone.css' }").unwrap();

        scopecss(temp.path())
            .args(["resolve", "a.css"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("./gone.css"));
    }

    #[test]
    fn resolve_reports_syntax_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.css"), ".a {\n  color: red;\n").unwrap();

        scopecss(temp.path())
            .args(["resolve", "a.css"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("1:4"));
    }

    #[test]
    fn invalid_config_value_fails() {
        let temp = project();
        std::fs::write(temp.path().join(".scopecss.toml"), "[hash]\nalgorithm = \"md2\"\n")
            .unwrap();

        scopecss(temp.path())
            .args(["name", "x", "src/a.css"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("md2"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        scopecss(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no-such-config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        scopecss(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[hash]"))
            .stdout(predicate::str::contains("algorithm = \"md4\""));
    }

    #[test]
    fn config_init_and_set() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("conf").join("config.toml");

        scopecss(temp.path())
            .env("SCOPECSS_CONFIG", &config)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(config.exists());

        scopecss(temp.path())
            .env("SCOPECSS_CONFIG", &config)
            .args(["config", "set", "hash.algorithm", "sha256"])
            .assert()
            .success();

        scopecss(temp.path())
            .env("SCOPECSS_CONFIG", &config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("algorithm = \"sha256\""));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();
        scopecss(temp.path())
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown config key"));
    }
}
