use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn xtag(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xtag"))
        .args(args)
        .arg("--no-color")
        .output()
        .expect("failed to run xtag")
}

fn fixtures_dir() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures")
        .to_string_lossy()
        .into_owned()
}

#[test]
fn fixture_suite_passes() {
    let out = xtag(&["test", &fixtures_dir()]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "fixture failures:\n{}", stderr);
    assert!(stderr.contains("test result: ok."), "{}", stderr);
    assert!(!stderr.contains("FAIL"), "{}", stderr);
}

#[test]
fn category_filter() {
    let out = xtag(&["test", &fixtures_dir(), "-c", "errors"]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "{}", stderr);
    assert!(stderr.contains("errors"), "{}", stderr);
    assert!(!stderr.contains("nesting"), "{}", stderr);
}

#[test]
fn failing_fixture_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("wrong.test.html");
    fs::write(&file, "---\nexpect_output = \"nope\"\n---\nyes\n").unwrap();

    let out = xtag(&["test", &file.to_string_lossy()]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success());
    assert!(stderr.contains("output mismatch"), "{}", stderr);
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let components = dir.path().join("_components");
    fs::create_dir(&components).unwrap();
    fs::write(
        components.join("card.html"),
        r##"<div class="card">{{block "#slot--title" .}}untitled{{end}}</div>"##,
    )
    .unwrap();
    fs::write(
        dir.path().join("page.html"),
        "<main>\n<component type=\"card\" tone=\"warm\"><slot name=\"title\">Hi</slot></component>\n</main>\n",
    )
    .unwrap();
    dir
}

#[test]
fn expand_prints_to_stdout() {
    let dir = site();
    let page = dir.path().join("page.html");
    let out = xtag(&["expand", &page.to_string_lossy()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(r#"{{block "card__1__title" .}}"#), "{}", stdout);
    assert!(stdout.contains(r#"(kwargs "tone" "warm")"#), "{}", stdout);
}

#[test]
fn bare_file_argument_means_expand() {
    let dir = site();
    let page = dir.path().join("page.html");
    let out = xtag(&[&page.to_string_lossy()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("component__card__1"));
}

#[test]
fn bare_file_after_value_flags_means_expand() {
    let dir = site();
    let other = dir.path().join("other");
    fs::create_dir(&other).unwrap();
    fs::write(other.join("card.tmpl"), "<em>other card</em>").unwrap();
    let page = dir.path().join("page.html");
    let target = dir.path().join("out.html");

    let out = xtag(&[
        "--components",
        &other.to_string_lossy(),
        "--ext",
        "tmpl",
        "-o",
        &target.to_string_lossy(),
        &page.to_string_lossy(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.contains("<em>other card</em>"), "{}", written);
}

#[test]
fn expand_writes_output_file() {
    let dir = site();
    let page = dir.path().join("page.html");
    let target = dir.path().join("out.html");
    let out = xtag(&["expand", &page.to_string_lossy(), "-o", &target.to_string_lossy()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("<main>\n{{- block \"component__card__1\" . -}}"), "{}", written);
}

#[test]
fn config_file_changes_components_dir() {
    let dir = site();
    fs::rename(dir.path().join("_components"), dir.path().join("parts")).unwrap();
    fs::write(dir.path().join("xtag.toml"), "components_dir = \"parts\"\n").unwrap();

    let page = dir.path().join("page.html");
    let out = xtag(&["expand", &page.to_string_lossy()]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(r#"<div class="card">"#), "{}", stdout);
    assert!(!stdout.contains("component-unknown"), "{}", stdout);
}

#[test]
fn components_flag_overrides_config() {
    let dir = site();
    let other = dir.path().join("other");
    fs::create_dir(&other).unwrap();
    fs::write(other.join("card.tmpl"), "<em>other card</em>").unwrap();

    let page = dir.path().join("page.html");
    let out = xtag(&[
        "expand",
        &page.to_string_lossy(),
        "--components",
        &other.to_string_lossy(),
        "--ext",
        "tmpl",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("<em>other card</em>"), "{}", stdout);
}

#[test]
fn check_reports_component_count() {
    let dir = site();
    let page = dir.path().join("page.html");
    let out = xtag(&["expand", &page.to_string_lossy(), "--check"]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ok:") && stderr.contains("1 component(s)"), "{}", stderr);
}

#[test]
fn list_shows_component_tree() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.html");
    fs::write(
        &page,
        r#"<component type="card" tone="warm"><slot name="body"><component type="article">x</component></slot></component>"#,
    )
    .unwrap();

    let out = xtag(&["expand", &page.to_string_lossy(), "--list"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec![r#"card tone="warm" [body]"#, "  article"]);
}

#[test]
fn scan_errors_render_with_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("broken.html");
    fs::write(&page, "<p>\n<component type=\"card\">\n</p>\n").unwrap();

    let out = xtag(&["expand", &page.to_string_lossy()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unterminated <component> tag"), "{}", stderr);
    assert!(stderr.contains("broken.html:2:1"), "{}", stderr);
}

#[test]
fn invalid_config_is_reported() {
    let dir = site();
    fs::write(dir.path().join("xtag.toml"), "bogus = 1\n").unwrap();
    let page = dir.path().join("page.html");
    let out = xtag(&["expand", &page.to_string_lossy()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid config"));
}
