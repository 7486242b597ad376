//! nodefn compiler CLI
//!
//! Command-line interface for checking, running and inspecting node graphs.
//! Set `RUST_LOG=nodefnc=debug` to see the compiler's execution plans.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use nodefn_core::{Dependencies, SharedFunction, TypeRegistry, Value};
use nodefnc::{CompilerConfig, GraphCompiler, Literal, NodeGraph};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "nodefnc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "nodefn compiler - compile node graphs into typed functions", long_about = None)]
struct Cli {
    /// Compiler configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a graph and print the resulting function's signature
    Check {
        /// Graph file (.json or .toml)
        graph: PathBuf,
    },

    /// Compile a graph, call it once and print its outputs
    Run {
        /// Graph file (.json or .toml)
        graph: PathBuf,

        /// Input value as name=JSON, e.g. a=3 or v=[1,2,3]; missing inputs use defaults
        #[arg(short, long = "input", value_name = "NAME=VALUE")]
        inputs: Vec<String>,
    },

    /// Print the external data a compiled graph depends on
    Deps {
        /// Graph file (.json or .toml)
        graph: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Check { graph } => run_check(&graph, config),
        Commands::Run { graph, inputs } => run_graph(&graph, config, &inputs),
        Commands::Deps { graph } => run_deps(&graph, config),
        Commands::Completions { shell } => {
            run_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "nodefnc", &mut io::stdout());
}

fn load_config(path: Option<&Path>) -> CompilerConfig {
    match path {
        Some(path) => match CompilerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => CompilerConfig::default(),
    }
}

fn compile(path: &Path, types: &TypeRegistry, config: CompilerConfig) -> Result<SharedFunction, String> {
    let graph = NodeGraph::load(path).map_err(|e| e.to_string())?;
    GraphCompiler::with_config(types, config)
        .try_compile(&graph)
        .map_err(|e| format!("{}: {}", path.display(), e))
}

fn run_check(path: &Path, config: CompilerConfig) -> Result<(), String> {
    let types = TypeRegistry::new();
    let function = compile(path, &types, config)?;
    println!("{}", function);
    Ok(())
}

fn run_graph(path: &Path, config: CompilerConfig, inputs: &[String]) -> Result<(), String> {
    let types = TypeRegistry::new();
    let function = compile(path, &types, config)?;
    let signature = function.signature();

    let mut fn_in = function.input_tuple();
    for input in inputs {
        let (name, value) = parse_input(input)?;
        let index = signature
            .input_index(name)
            .ok_or_else(|| format!("function has no input '{}'", name))?;
        let kind = signature.inputs()[index].ty.kind();
        let value = value
            .to_value(kind)
            .ok_or_else(|| format!("value for '{}' is not a valid {}", name, kind))?;
        fn_in.set_value(index, value).map_err(|e| e.to_string())?;
    }
    for index in fn_in.uninitialized_slots() {
        let kind = signature.inputs()[index].ty.kind();
        fn_in
            .set_value(index, Value::default_for(kind))
            .map_err(|e| e.to_string())?;
    }

    let mut fn_out = function.output_tuple();
    function
        .call(&mut fn_in, &mut fn_out)
        .map_err(|e| e.to_string())?;

    for (index, param) in signature.outputs().iter().enumerate() {
        let value = fn_out.copy_value(index).map_err(|e| e.to_string())?;
        println!("{} = {}", param, value);
    }
    Ok(())
}

fn parse_input(input: &str) -> Result<(&str, Literal), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", input))?;
    let literal = serde_json::from_str(value.trim())
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;
    Ok((name.trim(), literal))
}

fn run_deps(path: &Path, config: CompilerConfig) -> Result<(), String> {
    let types = TypeRegistry::new();
    let function = compile(path, &types, config)?;
    let mut deps = Dependencies::new();
    if !function.dependencies(&mut deps) || deps.is_empty() {
        println!("{}: no dependencies", function.name());
        return Ok(());
    }
    for dependency in deps.iter() {
        println!("{}", dependency);
    }
    Ok(())
}
