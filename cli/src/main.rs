mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use expander::{Expander, ExpanderConfig, FsLoader};
use xtag::parser::{component_slots, list_tags};
use xtag::{COMPONENT, ScanError};

const SUBCOMMANDS: &[&str] = &["expand", "test", "help"];

/// Flags whose value is the next argument.
const VALUE_FLAGS: &[&str] = &[
    "-o",
    "--output",
    "--components",
    "--ext",
    "--config",
    "-c",
    "--category",
];

#[derive(Parser)]
#[command(name = "xtag", version, about = "Expand <component> tags into template blocks")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log every resolved component and loaded template
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Expand the components of a template file
    Expand(ExpandArgs),

    /// Run .test.html fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ExpandArgs {
    /// Template file to expand
    file: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Folder holding component templates (overrides the config)
    #[arg(long)]
    components: Option<PathBuf>,

    /// Component template extension, without the dot (overrides the config)
    #[arg(long)]
    ext: Option<String>,

    /// Config file to use instead of xtag.toml beside the input
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expand without printing the result (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// List the components used in the file, without expanding
    #[arg(long)]
    list: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.html file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `xtag page.html` works like `xtag expand page.html`.
    let mut args: Vec<String> = std::env::args().collect();
    if first_positional(&args).is_some_and(|a| !SUBCOMMANDS.contains(&a)) {
        args.insert(1, "expand".to_string());
    }

    let cli = Cli::parse_from(&args);

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Expand(expand_args) => do_expand(expand_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// The first argument that is neither a flag nor a flag's value.
fn first_positional(args: &[String]) -> Option<&str> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with('-') {
            return Some(arg.as_str());
        }
    }
    None
}

fn do_expand(args: ExpandArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    // --list: show the component tree, no templates needed
    if args.list {
        match list_components(&source) {
            Ok(lines) => {
                for line in lines {
                    println!("{}", line);
                }
            }
            Err(error) => {
                let diagnostic = error.in_file(file_id).to_diagnostic();
                emit(&writer, &config, &files, &diagnostic);
                process::exit(1);
            }
        }
        return;
    }

    // Templates and xtag.toml live beside the input unless told otherwise
    let root = Path::new(&args.file)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let loaded = match &args.config {
        Some(path) => ExpanderConfig::load(path),
        None => ExpanderConfig::discover(&root),
    };
    let mut settings = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    if let Some(ext) = args.ext {
        settings.extension = ext;
    }
    let folder = args
        .components
        .unwrap_or_else(|| settings.components_path(&root));
    log::debug!("loading components from {}", folder.display());

    let loader = FsLoader::new(folder, settings.extension.clone());
    let mut session = Expander::with_config(loader, &settings);
    let output = match session.translate(&source) {
        Ok(out) => out,
        Err(error) => {
            emit(&writer, &config, &files, &error.to_diagnostic(file_id));
            process::exit(1);
        }
    };

    if args.check {
        eprintln!(
            "ok: {} expanded {} component(s)",
            args.file,
            session.resolved()
        );
        return;
    }

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, output) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", output),
    }
}

fn emit(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostic: &Diagnostic<usize>,
) {
    let _ = term::emit_to_write_style(&mut writer.lock(), config, files, diagnostic);
}

/// One line per component, indented by nesting: type, props, then the
/// slots it fills.
fn list_components(source: &str) -> Result<Vec<String>, ScanError> {
    fn relocate(base: usize) -> impl Fn(ScanError) -> ScanError {
        move |e| {
            let start = base + e.span.start;
            e.relocated(start)
        }
    }

    fn walk(src: &str, base: usize, indent: usize, out: &mut Vec<String>) -> Result<(), ScanError> {
        for tag in list_tags(src, COMPONENT).map_err(relocate(base))? {
            let offset = base + tag.body_span.start;
            let slots = component_slots(&tag.body).map_err(relocate(offset))?;

            let pad = "  ".repeat(indent);
            let kind = if tag.id.is_empty() {
                "(no type)"
            } else {
                tag.id.as_str()
            };
            let props: Vec<String> = tag
                .attributes
                .iter()
                .filter(|(key, _)| *key != "type")
                .map(|(key, value)| format!("{}=\"{}\"", key, value))
                .collect();
            let names: Vec<&str> = slots.iter().map(|slot| slot.slot_name()).collect();

            let mut line = format!("{}{}", pad, kind);
            if !props.is_empty() {
                line.push(' ');
                line.push_str(&props.join(" "));
            }
            if !names.is_empty() {
                line.push_str(&format!(" [{}]", names.join(", ")));
            }
            out.push(line);

            if slots.is_empty() {
                walk(&tag.body, offset, indent + 1, out)?;
            } else {
                for slot in &slots {
                    walk(&slot.body, offset + slot.body_span.start, indent + 1, out)?;
                }
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(source, 0, 0, &mut out)?;
    Ok(out)
}
