use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{debug, info};

use zodgen_core::config::{self, CONFIG_FILE_NAME, OutputLayout, ZodgenConfig};
use zodgen_core::graph::{DependencyGraph, order_declarations};
use zodgen_core::ir::Document;
use zodgen_core::parse::{self, spec::OpenApiSpec};
use zodgen_core::transform;
use zodgen_core::{CodeGenerator, GeneratedFile};
use zodgen_hono::HonoGenerator;

#[derive(Parser)]
#[command(
    name = "zodgen",
    about = "Generate Zod schemas and Hono routes from OpenAPI 3.x",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from an OpenAPI spec
    Generate {
        /// Path to the OpenAPI spec (YAML, JSON or TypeSpec)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output layout, overriding the config file
        #[arg(long)]
        layout: Option<LayoutArg>,
    },

    /// Validate an OpenAPI spec
    Validate {
        /// Path to the OpenAPI spec
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print schemas in declaration order, cycles and operations
    Inspect {
        /// Path to the OpenAPI spec
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Write a default zodgen.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Single,
    Split,
}

impl From<LayoutArg> for OutputLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => OutputLayout::Single,
            LayoutArg::Split => OutputLayout::Split,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            layout,
        } => cmd_generate(input, output, layout),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "zodgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load `zodgen.yaml` from the current directory, if present.
fn try_load_config() -> Result<Option<ZodgenConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))
}

/// Parse a spec from disk. TypeSpec sources are compiled to OpenAPI first.
fn load_spec(path: &Path) -> Result<OpenApiSpec> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
    if ext == "tsp" {
        return compile_typespec(path);
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    };
    parsed.with_context(|| format!("failed to parse {}", path.display()))
}

fn load_document(path: &Path) -> Result<Document> {
    let spec = load_spec(path)?;
    let doc = transform::transform(&spec)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    debug!(
        "loaded {} schemas and {} operations from {}",
        doc.schemas.len(),
        doc.operations.len(),
        path.display()
    );
    Ok(doc)
}

/// Compile a TypeSpec file with the TypeSpec CLI into a temporary directory
/// and parse the emitted OpenAPI document.
fn compile_typespec(path: &Path) -> Result<OpenApiSpec> {
    let out_dir = tempfile::tempdir().context("failed to create a temporary directory")?;
    info!("compiling {} with the TypeSpec compiler", path.display());

    let result = Command::new("npx")
        .arg("tsp")
        .arg("compile")
        .arg(path)
        .args(["--emit", "@typespec/openapi3", "--output-dir"])
        .arg(out_dir.path())
        .output()
        .context(
            "failed to run `npx tsp`; install the TypeSpec compiler with `npm install -D @typespec/compiler @typespec/openapi3`",
        )?;
    if !result.status.success() {
        anyhow::bail!(
            "TypeSpec compilation of {} failed:\n{}",
            path.display(),
            String::from_utf8_lossy(&result.stderr)
        );
    }

    let emitted = find_emitted_spec(out_dir.path())?.with_context(|| {
        format!(
            "TypeSpec compiler produced no OpenAPI document for {}",
            path.display()
        )
    })?;
    load_spec(&emitted)
}

/// First `.yaml`/`.json` file under `dir`, searched depth-first in name order.
fn find_emitted_spec(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            if let Some(found) = find_emitted_spec(&entry)? {
                return Ok(Some(found));
            }
        } else if matches!(
            entry.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml" | "json")
        ) {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

/// Write generated files under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

fn readme_content() -> &'static str {
    r#"# Generated Code (Do Not Edit)

This directory is generated by `zodgen`. Manual changes are overwritten the
next time `zodgen generate` runs.

To regenerate, run:
```
zodgen generate
```

To change the output, edit `zodgen.yaml`.
"#
}

fn cmd_generate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    layout: Option<LayoutArg>,
) -> Result<()> {
    let mut cfg = try_load_config()?.unwrap_or_default();
    if let Some(layout) = layout {
        cfg.generate.layout = layout.into();
    }
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&cfg.output));

    let doc = load_document(&input)?;
    eprintln!("Generating {} → {}", input.display(), output_dir.display());

    let generated = HonoGenerator
        .generate(&doc, &cfg.generate)
        .with_context(|| format!("failed to generate code for {}", input.display()))?;

    fs::create_dir_all(&output_dir).with_context(|| {
        format!("failed to create output directory {}", output_dir.display())
    })?;
    write_files(&output_dir, &generated.files)?;

    let readme_path = output_dir.join("README.md");
    fs::write(&readme_path, readme_content())
        .with_context(|| format!("failed to write {}", readme_path.display()))?;
    eprintln!("  wrote {}", readme_path.display());

    if !generated.diagnostics.is_empty() {
        eprintln!("{} diagnostic(s):", generated.diagnostics.len());
        for diagnostic in &generated.diagnostics {
            eprintln!("  {diagnostic}");
        }
    }
    eprintln!(
        "Generated {} files in {}",
        generated.files.len() + 1,
        output_dir.display()
    );
    Ok(())
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let parsed = load_spec(&input)?;

    eprintln!(
        "Valid OpenAPI {} spec: {}",
        parsed.openapi, parsed.info.title
    );
    eprintln!("  Version: {}", parsed.info.version);
    eprintln!("  Paths: {}", parsed.paths.len());

    // References must resolve for generation to succeed.
    let doc = transform::transform(&parsed)?;
    eprintln!("  Operations: {}", doc.operations.len());
    eprintln!("  Schemas: {}", doc.schemas.len());

    let cycles = DependencyGraph::build(&doc.schemas).cycles();
    if !cycles.is_empty() {
        eprintln!("  Recursive schema groups: {}", cycles.len());
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: PathBuf, format: InspectFormat) -> Result<()> {
    let doc = load_document(&input)?;
    let summary = build_inspect_summary(&doc);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(doc: &Document) -> serde_json::Value {
    let graph = DependencyGraph::build(&doc.schemas);
    let order = order_declarations(&graph);

    let schemas: Vec<serde_json::Value> = order
        .iter()
        .map(|entry| {
            let dependencies: Vec<&str> = graph
                .dependencies(entry.index)
                .map(|dep| graph.name(dep))
                .collect();
            serde_json::json!({
                "name": entry.name,
                "kind": doc.schemas.by_index(entry.index).node.kind.label(),
                "lazy": entry.lazy,
                "group": entry.group,
                "dependencies": dependencies,
            })
        })
        .collect();

    let operations: Vec<serde_json::Value> = doc
        .operations
        .iter()
        .map(|op| {
            serde_json::json!({
                "operation_id": op.operation_id,
                "method": op.method.as_str(),
                "path": op.path,
                "parameters": op.parameters.len(),
                "responses": op.responses.keys().collect::<Vec<_>>(),
                "tags": op.tags,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": doc.info.title,
            "version": doc.info.version,
        },
        "schemas": schemas,
        "cycles": graph.cycles(),
        "operations": operations,
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE: &str = include_str!("../../zodgen-core/tests/fixtures/petstore.yaml");

    #[test]
    fn test_write_files_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            GeneratedFile {
                path: "index.ts".to_string(),
                content: "export {};\n".to_string(),
            },
            GeneratedFile {
                path: "schemas/pet.ts".to_string(),
                content: "// pet\n".to_string(),
            },
        ];
        write_files(dir.path(), &files).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("schemas/pet.ts")).unwrap(),
            "// pet\n"
        );
        assert!(dir.path().join("index.ts").exists());
    }

    #[test]
    fn test_load_document_from_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("openapi.yaml");
        fs::write(&yaml_path, PETSTORE).unwrap();
        let doc = load_document(&yaml_path).unwrap();
        assert_eq!(doc.operations.len(), 4);

        let spec: serde_json::Value = serde_yaml_ng::from_str(PETSTORE).unwrap();
        let json_path = dir.path().join("openapi.json");
        fs::write(&json_path, serde_json::to_string(&spec).unwrap()).unwrap();
        assert_eq!(load_document(&json_path).unwrap().schemas.len(), 4);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_spec(Path::new("does-not-exist.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read does-not-exist.yaml"));
    }

    #[test]
    fn test_find_emitted_spec() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("@typespec").join("openapi3");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("openapi.yaml"), "openapi: 3.0.0").unwrap();
        assert_eq!(
            find_emitted_spec(dir.path()).unwrap(),
            Some(nested.join("openapi.yaml"))
        );
    }

    #[test]
    fn test_inspect_summary_orders_schemas() {
        let doc = transform::transform(&parse::from_yaml(PETSTORE).unwrap()).unwrap();
        let summary = build_inspect_summary(&doc);
        let names: Vec<&str> = summary["schemas"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["NewPet", "Category", "Pet", "Error"]);
        assert_eq!(summary["cycles"], serde_json::json!([]));
    }
}
