use clap::{Parser, Subcommand};
use kestrel::engine::{Engine, EngineOptions};
use kestrel::flow::{FlowCompiler, FlowGraph};
use kestrel::manifest::{DeploymentMetadata, extract_manifest};
use kestrel::resolver::VfsPlugin;
use kestrel::vfs::{SourceFile, VirtualFileMap};
use kestrel::workspace::CompiledArtifact;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Directories never read into a workspace.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Compiles plugin workspaces the way the deployment pipeline does
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bundle a directory of source files into one script
    Bundle {
        /// Workspace directory
        dir: String,
        /// Entry module, relative to the workspace root
        #[arg(short, long, default_value = "index.ts")]
        entry: String,
        /// Write the bundle here instead of stdout
        #[arg(short, long)]
        out: Option<String>,
        /// Keep the output readable
        #[arg(long)]
        no_minify: bool,
    },
    /// Validate a flow graph JSON file and print its flow document
    Flow {
        /// Path to the graph JSON
        graph_path: String,
        /// Write the flow document here instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Print the deployment metadata a workspace resolves to
    Manifest {
        /// Workspace directory
        dir: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Bundle {
            dir,
            entry,
            out,
            no_minify,
        } => {
            let options = EngineOptions {
                minify: !no_minify,
            };
            run_bundle(&dir, &entry, out.as_deref(), options);
        }
        Command::Flow { graph_path, out } => run_flow(&graph_path, out.as_deref()),
        Command::Manifest { dir } => {
            let files = read_workspace(&dir);
            let metadata = DeploymentMetadata::from_manifest(extract_manifest(&files).as_ref());
            let json = serde_json::to_string_pretty(&metadata)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize metadata: {}", e)));
            println!("{}", json);
        }
    }
}

fn run_bundle(dir: &str, entry: &str, out: Option<&str>, options: EngineOptions) {
    let start = Instant::now();
    let files = read_workspace(dir);
    let metadata = DeploymentMetadata::from_manifest(extract_manifest(&files).as_ref());
    eprintln!("Read {} file(s) from '{}'", files.len(), dir);

    let engine = Engine::new(options)
        .unwrap_or_else(|e| exit_with_error(&format!("Engine initialization failed: {}", e)));
    let plugin = VfsPlugin::new(files);
    let source = engine.build(entry, &plugin).unwrap_or_else(|e| {
        let stage = if e.is_resolver_error() { "Resolution" } else { "Compilation" };
        exit_with_error(&format!("{} failed: {}", stage, e))
    });

    let artifact = CompiledArtifact::Bundle { source };
    write_output(out, artifact.source());

    eprintln!("\n--- Bundle Summary ---");
    print_metadata(&metadata);
    eprintln!("Bytes:        {}", artifact.source().len());
    eprintln!("Hash:         {}", artifact.content_hash());
    eprintln!("Elapsed:      {:?}", start.elapsed());
}

fn run_flow(graph_path: &str, out: Option<&str>) {
    let json = fs::read_to_string(graph_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read graph file '{}': {}", graph_path, e))
    });
    let graph = FlowGraph::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse graph JSON: {}", e)));

    let compiled = FlowCompiler::builder(graph)
        .build()
        .compile()
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let document = compiled
        .spec
        .to_json()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize specification: {}", e)));
    write_output(out, &document);

    eprintln!("\n--- Flow Summary ---");
    eprintln!("Nodes:        {}", compiled.spec.nodes.len());
    eprintln!("Edges:        {}", compiled.spec.edges.len());
    eprintln!("Credits:      {}", compiled.credits.total);
}

/// Reads every file below `dir` into a workspace keyed by its path relative to `dir`.
fn read_workspace(dir: &str) -> VirtualFileMap {
    let root = Path::new(dir);
    if !root.is_dir() {
        exit_with_error(&format!("'{}' is not a directory", dir));
    }
    let mut files = Vec::new();
    collect_files(root, root, &mut files);
    VirtualFileMap::new(files)
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<SourceFile>) {
    let entries = fs::read_dir(dir).unwrap_or_else(|e| {
        exit_with_error(&format!("Could not read directory '{}': {}", dir.display(), e))
    });
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        if path.is_dir() {
            if !SKIPPED_DIRS.iter().any(|skipped| name == *skipped) {
                collect_files(root, &path, files);
            }
            continue;
        }
        // Binary files are not part of a source workspace.
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(SourceFile::new(key, content));
    }
}

fn print_metadata(metadata: &DeploymentMetadata) {
    eprintln!("Key:          {}", metadata.key);
    eprintln!("Name:         {}", metadata.name);
    eprintln!("Description:  {}", metadata.description);
    eprintln!("Module type:  {}", metadata.module_type);
}

fn write_output(out: Option<&str>, content: &str) {
    match out {
        Some(path) => fs::write(path, content).unwrap_or_else(|e| {
            exit_with_error(&format!("Could not write to file '{}': {}", path, e))
        }),
        None => println!("{}", content),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
