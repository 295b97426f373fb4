//! Compile, validate and emit.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use shipdsl_codegen_lib::*;
use shipdsl_ir::Schema;
use tracing::{debug, info};

/// Output directories for `build`.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    pub models: PathBuf,
    pub routes: PathBuf,
    pub templates: PathBuf,
    pub ir: Option<PathBuf>,
}

/// Read a DSL file and compile it into a validated schema.
///
/// Every validation error is printed to stderr, in order, before failing.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let schema = shipdsl_parser::compile(&source)
        .with_context(|| format!("compiling {}", path.display()))?;

    let report = shipdsl_validate::validate_schema(&schema);
    if !report.is_valid() {
        for error in &report.errors {
            eprintln!("{}", error);
        }
        bail!(
            "{} validation error(s) in {}",
            report.errors.len(),
            path.display()
        );
    }

    info!(models = schema.models.len(), "schema validated");
    Ok(schema)
}

/// Write the IR JSON, creating parent directories.
pub fn write_ir(schema: &Schema, path: &Path) -> Result<()> {
    let json = schema.to_json().context("serializing IR")?;
    write_file(path, &json)
}

/// Run every emitter and pair its output with the directory it belongs in.
///
/// The emitters only read the schema, so they run on scoped threads; the
/// result order is fixed regardless of which finishes first.
pub fn emit(schema: &Schema, naming: &TableNaming, paths: &BuildPaths) -> Result<Vec<(PathBuf, GeneratedCode)>> {
    let models = OrmModelGenerator { naming: naming.clone() };
    let routes = CrudRouteGenerator { naming: naming.clone() };
    let helpers = RelationHelperGenerator { naming: naming.clone() };
    let templates = ViewTemplateGenerator { naming: naming.clone() };

    let jobs: [(&PathBuf, &(dyn Codegen + Sync)); 4] = [
        (&paths.models, &models),
        (&paths.routes, &routes),
        (&paths.routes, &helpers),
        (&paths.templates, &templates),
    ];

    std::thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(dir, generator)| {
                let handle = scope.spawn(move || {
                    generator
                        .generate(schema)
                        .with_context(|| format!("{} emitter failed", generator.language()))
                });
                (dir, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(dir, handle)| match handle.join() {
                Ok(code) => Ok((dir.clone(), code?)),
                Err(_) => bail!("emitter thread panicked"),
            })
            .collect()
    })
}

/// Totals reported after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub models: usize,
    pub files: usize,
}

/// Full pipeline: compile, validate, emit and write everything to disk.
pub fn build(dsl: &Path, paths: &BuildPaths, naming: &TableNaming) -> Result<BuildSummary> {
    let schema = load_schema(dsl)?;

    if let Some(ir) = &paths.ir {
        write_ir(&schema, ir)?;
        info!(path = %ir.display(), "IR written");
    }

    let outputs = emit(&schema, naming, paths)?;
    let mut files = 0;
    for (dir, code) in &outputs {
        for file in &code.files {
            write_file(&dir.join(&file.path), &file.content)?;
            files += 1;
        }
    }

    info!(models = schema.models.len(), files, "build complete");
    Ok(BuildSummary {
        models: schema.models.len(),
        files,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), "written");
    Ok(())
}
