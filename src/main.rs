//! luadoc-pages: generate cross-linked markdown API pages from annotated Lua sources.
//!
//! A run has two phases. Every source file under the source root is parsed
//! and its symbols are added to one index; only then is each module's page
//! rendered, so any page can link to symbols defined on any other.
//!
//! `luadoc-pages -s lua -o doc/api -b /api`

mod index;
mod links;
mod model;
mod parser;
mod render;

use anyhow::{bail, Context, Result};
use clap::Parser;
use index::IndexBuilder;
use model::Module;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "luadoc-pages",
    about = "Generate cross-linked markdown API pages from annotated Lua sources"
)]
struct Cli {
    /// Source root, scanned recursively
    #[arg(short = 's', long, default_value = "lua")]
    source: PathBuf,

    /// Output root; mirrors the source tree
    #[arg(short = 'o', long, default_value = "doc/api")]
    output: PathBuf,

    /// URL prefix of the generated pages, used for link targets
    #[arg(short = 'b', long, default_value = "/api")]
    base_url: String,

    /// Extension of the source files to document
    #[arg(short = 'e', long, default_value = "lua")]
    extension: String,

    /// Log debug output
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Run configuration for [`generate`].
struct GenerateConfig<'a> {
    source_root: &'a Path,
    output_root: &'a Path,
    base_url: &'a str,
    extension: &'a str,
}

/// A parsed module waiting for the index to be complete.
struct PendingPage {
    module: Module,
    doc_path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = GenerateConfig {
        source_root: &cli.source,
        output_root: &cli.output,
        base_url: &cli.base_url,
        extension: cli.extension.trim_start_matches('.'),
    };
    let written = generate(&config)?;
    info!(pages = written, output = %cli.output.display(), "documentation generated");
    Ok(())
}

/// `--verbose` forces debug output, otherwise `RUST_LOG` applies (default `info`).
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to initialize logging")?;

    Ok(())
}

/// Parse, index and render every source file. Returns the number of pages written.
///
/// Any error aborts the run; pages already written are left in place.
fn generate(config: &GenerateConfig) -> Result<usize> {
    if !config.source_root.is_dir() {
        bail!(
            "source directory not found: {}",
            config.source_root.display()
        );
    }

    let sources = discover_sources(config.source_root, config.extension)?;
    info!(
        files = sources.len(),
        root = %config.source_root.display(),
        "discovered source files"
    );

    // Phase 1: parse everything and build the index
    let mut builder = IndexBuilder::new();
    let mut pages = Vec::with_capacity(sources.len());
    for path in &sources {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let module = parser::parse(&content, path)?;

        let relative = relative_path(path, config.source_root).with_context(|| {
            format!(
                "{} is not under {}",
                path.display(),
                config.source_root.display()
            )
        })?;
        builder.add_module(&module, &page_url(config.base_url, &relative));

        pages.push(PendingPage {
            module,
            doc_path: config.output_root.join(doc_path(&relative)),
        });
    }
    let index = builder.finalize();
    info!(symbols = index.len(), "indexed symbols");

    // Phase 2: render against the complete index
    for page in &pages {
        let markdown = render::render_page(&page.module, &index);
        if let Some(parent) = page.doc_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        fs::write(&page.doc_path, markdown)
            .with_context(|| format!("failed to write {}", page.doc_path.display()))?;
        debug!(module = %page.module.name, path = %page.doc_path.display(), "wrote page");
    }

    Ok(pages.len())
}

/// Recursively find `*.<extension>` files under `root`, sorted for deterministic output.
fn discover_sources(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        extension
    );
    let mut files = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))? {
        let path = entry.context("failed to scan source directory")?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// `path` relative to `root`. glob drops leading `./` from the paths it
/// yields, so `.` components are ignored on both sides.
fn relative_path(path: &Path, root: &Path) -> Option<PathBuf> {
    let mut parts = path.components().filter(|c| *c != Component::CurDir);
    for expected in root.components().filter(|c| *c != Component::CurDir) {
        if parts.next() != Some(expected) {
            return None;
        }
    }
    Some(parts.collect())
}

/// Output path relative to the output root: `ui/widget.lua` → `ui/widget.md`.
fn doc_path(relative: &Path) -> PathBuf {
    relative.with_extension(render::DOC_EXTENSION)
}

/// Page URL of a module: `/api` + `ui/widget.lua` → `/api/ui/widget`.
fn page_url(base_url: &str, relative: &Path) -> String {
    let stem = relative.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn page_url_mirrors_source_path() {
        assert_eq!(page_url("/api", Path::new("ui/widget.lua")), "/api/ui/widget");
        assert_eq!(page_url("/api/", Path::new("core.lua")), "/api/core");
        assert_eq!(page_url("", Path::new("a/b/c.lua")), "/a/b/c");
    }

    #[test]
    fn relative_path_ignores_current_dir() {
        let expected = Some(PathBuf::from("ui/w.lua"));
        assert_eq!(relative_path(Path::new("lua/ui/w.lua"), Path::new("lua")), expected);
        assert_eq!(relative_path(Path::new("lua/ui/w.lua"), Path::new("./lua")), expected);
        assert_eq!(relative_path(Path::new("lua/ui/w.lua"), Path::new("./lua/")), expected);
        assert_eq!(relative_path(Path::new("./lua/ui/w.lua"), Path::new("lua/")), expected);
        assert_eq!(relative_path(Path::new("src/w.lua"), Path::new("lua")), None);
    }

    #[test]
    fn doc_path_swaps_extension() {
        assert_eq!(doc_path(Path::new("ui/widget.lua")), PathBuf::from("ui/widget.md"));
        assert_eq!(doc_path(Path::new("init.test.lua")), PathBuf::from("init.test.md"));
    }

    #[test]
    fn discovery_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "z.lua", "");
        write(dir.path(), "a/b/deep.lua", "");
        write(dir.path(), "a/first.lua", "");
        write(dir.path(), "notes.txt", "");

        let found = discover_sources(dir.path(), "lua").unwrap();
        let relative: Vec<PathBuf> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            [
                PathBuf::from("a/b/deep.lua"),
                PathBuf::from("a/first.lua"),
                PathBuf::from("z.lua"),
            ]
        );
    }

    #[test]
    fn generate_writes_mirrored_pages() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(
            src.path(),
            "shapes/rect.lua",
            "---@module Shapes\nlocal M = {}\n\n--- Area of a rectangle\n---@param w number\n---@param h number\n---@return number\nfunction M.area(w, h) end\n",
        );
        write(
            src.path(),
            "report.lua",
            "--- Prints Shapes.area results\nfunction print_area() end\n",
        );

        let config = GenerateConfig {
            source_root: src.path(),
            output_root: out.path(),
            base_url: "/api",
            extension: "lua",
        };
        assert_eq!(generate(&config).unwrap(), 2);

        let rect = fs::read_to_string(out.path().join("shapes/rect.md")).unwrap();
        assert!(rect.starts_with("# Shapes\n"));
        assert!(rect.contains("function area(w: number, h: number) -> number"));

        let report = fs::read_to_string(out.path().join("report.md")).unwrap();
        assert!(report.contains("Prints <a href=\"/api/shapes/rect/#area\">area</a> results"));
    }

    #[test]
    fn missing_source_root_is_an_error() {
        let out = TempDir::new().unwrap();
        let config = GenerateConfig {
            source_root: Path::new("/definitely/not/here"),
            output_root: out.path(),
            base_url: "/api",
            extension: "lua",
        };
        let err = generate(&config).unwrap_err();
        assert!(err.to_string().contains("source directory not found"));
    }
}
