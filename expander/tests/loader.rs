use std::fs;

use expander::{
    Expander, ExpanderConfig, FsLoader, MemoryLoader, TemplateLoader, fallback_template,
};

fn components_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("card.html"),
        r##"<div class="card">{{block "#slot--default" .}}{{end}}</div>"##,
    )
    .unwrap();
    dir
}

#[test]
fn fs_loader_reads_type_and_extension() {
    let dir = components_dir();
    let mut loader = FsLoader::new(dir.path(), "html");
    assert_eq!(
        &*loader.load("card"),
        r##"<div class="card">{{block "#slot--default" .}}{{end}}</div>"##
    );
}

#[test]
fn fs_loader_caches_per_session() {
    let dir = components_dir();
    let mut loader = FsLoader::new(dir.path(), "html");
    let first = loader.load("card");

    fs::write(dir.path().join("card.html"), "changed").unwrap();
    assert_eq!(&*loader.load("card"), &*first, "second load must come from the cache");
    assert_eq!(loader.cached(), 1);

    let mut fresh = FsLoader::new(dir.path(), "html");
    assert_eq!(&*fresh.load("card"), "changed", "a new loader starts with an empty cache");
}

#[test]
fn missing_template_yields_fallback() {
    let dir = components_dir();
    let mut loader = FsLoader::new(dir.path(), "html");
    assert_eq!(&*loader.load("missing"), fallback_template("missing"));
}

#[test]
fn path_like_types_are_never_read() {
    let dir = components_dir();
    let nested = dir.path().join("inner");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("card.html"), "escaped").unwrap();

    let mut loader = FsLoader::new(&nested, "html");
    for bad in ["../card", "..", ".", "a/b", r"a\b", ""] {
        assert!(loader.template_path(bad).is_none(), "`{}` should be rejected", bad);
        assert_eq!(&*loader.load(bad), fallback_template(bad));
    }
    assert_eq!(&*loader.load("card"), "escaped");
}

#[test]
fn empty_extension_uses_bare_type() {
    let dir = tempfile::tempdir().unwrap();
    let loader = FsLoader::new(dir.path(), "");
    assert_eq!(loader.template_path("card"), Some(dir.path().join("card")));
}

#[test]
fn fallback_renders_a_placeholder() {
    let fallback = fallback_template("hero");
    assert!(fallback.starts_with(r#"<div class="component-unknown">"#));
    assert!(fallback.contains(r##"{{block "#slot--unknown" .}}unknown component hero{{end}}"##));
}

#[test]
fn memory_loader_from_pairs() {
    let mut loader: MemoryLoader = [("a", "A"), ("b", "B")].into_iter().collect();
    assert_eq!(&*loader.load("b"), "B");
    assert_eq!(&*loader.load("c"), fallback_template("c"));
}

#[test]
fn expander_over_fs_loader() {
    let root = tempfile::tempdir().unwrap();
    let components = root.path().join("_components");
    fs::create_dir(&components).unwrap();
    fs::write(components.join("note.html"), r##"<aside>{{block "#slot--default" .}}{{end}}</aside>"##)
        .unwrap();

    let config = ExpanderConfig::default();
    let loader = FsLoader::from_config(root.path(), &config);
    let mut expander = Expander::with_config(loader, &config);
    let out = expander
        .translate(r#"<component type="note">hi</component><component type="note">again</component>"#)
        .unwrap();
    assert!(out.contains(r#"{{block "note__2__default" .}}"#), "got:\n{}", out);
    assert!(out.contains("-}}again{{end}}</aside>"), "got:\n{}", out);
    assert_eq!(expander.loader().cached(), 1);
}

#[test]
fn borrowed_loader_keeps_its_cache() {
    let dir = components_dir();
    let mut loader = FsLoader::new(dir.path(), "html");
    expander::translate(r#"<component type="card"></component>"#, &mut loader).unwrap();
    assert_eq!(loader.cached(), 1);
}
