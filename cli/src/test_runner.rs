use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use expander::{ExpandError, Expander, MemoryLoader};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Component templates available to the source, keyed by type.
    #[serde(default)]
    pub components: BTreeMap<String, String>,

    /// Upper bound on resolved components. Defaults to the expander's.
    #[serde(default)]
    pub max_components: Option<usize>,

    /// Expected exact output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Substrings that must appear in the output.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// Substrings that must not appear in the output.
    #[serde(default)]
    pub expect_absent: Vec<String>,

    /// Expected expansion error: its Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If set, the error must point at this 1-based source line.
    #[serde(default)]
    pub expect_error_line: Option<usize>,
}

/// Parse a `.test.html` file into its TOML config and template source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    // 2. Parse frontmatter
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();

    // 3. Expand against the declared components
    let loader: MemoryLoader = config.components.iter().collect();
    let mut session = Expander::new(loader);
    if let Some(limit) = config.max_components {
        session = session.with_limit(limit);
    }
    let result = session.translate(source);

    // 4. Check error/output expectations
    let outcome = match (&config.expect_error, result) {
        (Some(expected), Err(error)) => check_error(source, &error, expected, config.expect_error_line),
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but expansion succeeded",
            expected
        )),
        (None, Err(error)) => Some(format!("unexpected expansion error: {}", error)),
        (None, Ok(output)) => check_output(&config, &output),
    };

    match outcome {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Returns `Some(reason)` when the error does not match.
fn check_error(
    source: &str,
    error: &ExpandError,
    expected: &str,
    line: Option<usize>,
) -> Option<String> {
    let message = error.to_string();
    if !message.contains(expected) {
        return Some(format!(
            "expected error containing \"{}\", got: {}",
            expected, message
        ));
    }

    let expected_line = line?;
    match error {
        ExpandError::Source(scan) => {
            let actual_line = byte_offset_to_line(source, scan.span.start);
            (actual_line != expected_line).then(|| {
                format!(
                    "expected error on line {}, but span is on line {}",
                    expected_line, actual_line
                )
            })
        }
        _ => Some(format!(
            "expected error on line {}, but the error has no source position",
            expected_line
        )),
    }
}

/// Returns `Some(reason)` on the first unmet output expectation.
fn check_output(config: &TestConfig, output: &str) -> Option<String> {
    if let Some(expected) = &config.expect_output {
        let actual_trimmed = output.trim();
        let expected_trimmed = expected.trim();
        if actual_trimmed != expected_trimmed {
            return Some(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected_trimmed, actual_trimmed
            ));
        }
    }

    if let Some(missing) = config.expect_contains.iter().find(|s| !output.contains(s.as_str())) {
        return Some(format!(
            "output does not contain \"{}\"\n  actual: {}",
            missing, output
        ));
    }

    if let Some(present) = config.expect_absent.iter().find(|s| output.contains(s.as_str())) {
        return Some(format!(
            "output should not contain \"{}\"\n  actual: {}",
            present, output
        ));
    }

    None
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

const TEST_SUFFIX: &str = ".test.html";

/// Fixture files under `root` keyed by category, the folder relative to
/// `root` ("" for files directly in it). Both levels are sorted.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(TEST_SUFFIX));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// ANSI styling, or none at all with `--no-color`.
struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

/// Keep the categories named in `requested`, and their subcategories.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.html` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };

    // a single file runs alone, without a category header
    let single = path.is_file();
    let all = if single {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };

    if all.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    let selected = if single {
        select_categories(&all, &[])
    } else {
        select_categories(&all, categories)
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        if !single {
            eprintln!();
            eprintln!("{}", style.bold(category_label(category)));
        }

        for file in *files {
            let result = run_single_test(file);
            let label = result.description.clone().unwrap_or_else(|| {
                file.file_name()
                    .and_then(|s| s.to_str())
                    .map(|name| name.trim_end_matches(TEST_SUFFIX).to_string())
                    .unwrap_or_else(|| "?".to_string())
            });

            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), label);
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), label);
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    let failed = failures.len();
    eprintln!();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("ok", "32"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("FAILED", "31"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
