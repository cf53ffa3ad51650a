//! micro-cli
//!
//! Command-line interface for scaffolding micro-kit services and adding RPCs
//! to them.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use colored::*;
use micro_cli_common::{Config, MicroError, RpcKind};
use micro_cli_generator::{AddRpcRequest, HelmGenerator, ProjectScaffolder, RpcAdder};
use std::process::ExitCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "micro-cli")]
#[command(version, about = "Scaffold micro-kit services and add RPCs to them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new service and its client library entry
    #[command(after_help = "EXAMPLES:\n  \
        # Create $GOPATH/src/github.com/micro-kit/user-service\n  \
        micro-cli project --name user --desc \"user accounts\"\n\n  \
        # Custom project and client roots\n  \
        micro-cli project --name user --root github.com/acme --croot github.com/acme/clients")]
    Project {
        /// Service name, `-service` is appended for the directory
        #[arg(short, long, default_value = "")]
        name: String,

        /// Service description
        #[arg(short, long, default_value = "")]
        desc: String,

        /// Parent of the project relative to $GOPATH/src [env: ROOT_PATH]
        #[arg(long)]
        root: Option<String>,

        /// Client library relative to $GOPATH/src [env: MICROKIT_CLIENT_ROOT]
        #[arg(long)]
        croot: Option<String>,
    },

    /// Add an RPC method to an existing service
    #[command(after_help = "EXAMPLES:\n  \
        # Add GetUser to the client facing service\n  \
        micro-cli addrpc --svc user --rpc get_user --comment \"fetch one user\"\n\n  \
        # Add an admin rpc\n  \
        micro-cli addrpc --svc user --rpc ban_user --type admin")]
    Addrpc {
        /// Service name as given to `project`
        #[arg(long, default_value = "")]
        svc: String,

        /// RPC name, converted to PascalCase
        #[arg(long, default_value = "")]
        rpc: String,

        /// admin | foreground
        #[arg(long = "type", default_value = "foreground")]
        rpc_type: String,

        /// Comment placed above the generated code
        #[arg(long, default_value = "")]
        comment: String,

        /// Parent of the project relative to $GOPATH/src [env: ROOT_PATH]
        #[arg(long)]
        root: Option<String>,

        /// Client library relative to $GOPATH/src [env: MICROKIT_CLIENT_ROOT]
        #[arg(long)]
        croot: Option<String>,
    },

    /// Generate the Helm chart of a service
    Helm {
        /// Service name as given to `project`
        #[arg(short, long, default_value = "")]
        name: String,

        /// Parent of the project relative to $GOPATH/src [env: ROOT_PATH]
        #[arg(long)]
        root: Option<String>,
    },

    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Project { .. } => "project",
            Commands::Addrpc { .. } => "addrpc",
            Commands::Helm { .. } => "helm",
            Commands::Version => "version",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<MicroError>() {
            Some(usage) if usage.is_usage() => {
                eprintln!("{} {}\n", "!".yellow(), usage);
                print_help(cli.command.name());
                ExitCode::SUCCESS
            }
            _ => {
                log::error!("{:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn print_help(subcommand: &str) {
    let mut command = Cli::command();
    if let Some(sub) = command.find_subcommand_mut(subcommand) {
        let _ = sub.print_help();
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Project {
            name,
            desc,
            root,
            croot,
        } => project_command(name, desc, Config::resolve(root.as_deref(), croot.as_deref())),
        Commands::Addrpc {
            svc,
            rpc,
            rpc_type,
            comment,
            root,
            croot,
        } => {
            let kind: RpcKind = rpc_type.parse()?;
            let config = Config::resolve_for_service(svc, root.as_deref(), croot.as_deref());
            addrpc_command(
                AddRpcRequest {
                    service: svc.clone(),
                    rpc: rpc.clone(),
                    kind,
                    comment: comment.clone(),
                },
                config,
            )
        }
        Commands::Helm { name, root } => {
            helm_command(name, Config::resolve_for_service(name, root.as_deref(), None))
        }
        Commands::Version => {
            println!(
                "micro-cli {}\ngitHash: {}",
                VERSION,
                option_env!("GIT_HASH").unwrap_or("unknown")
            );
            Ok(())
        }
    }
}

fn project_command(name: &str, desc: &str, config: Config) -> Result<()> {
    let scaffolder = ProjectScaffolder::new(config.clone())?;
    let db = scaffolder.create(name, desc)?;

    println!("\n{}", "✓ Project created!".green().bold());
    println!("\n{}", "Generated:".bold());
    println!("  {}", config.project_dir(name.trim()).display());
    println!("  {}", config.proto_dir(name.trim()).display());
    println!("  {}", db.db_file_path().display());
    println!("\n{}", "Next steps:".bold());
    println!("  1. Run gen.sh in {}", config.proto_dir(name.trim()).display());
    println!(
        "  2. Add rpcs: micro-cli addrpc --svc {} --rpc <name>",
        name.trim()
    );
    Ok(())
}

fn addrpc_command(request: AddRpcRequest, config: Config) -> Result<()> {
    let adder = RpcAdder::new(config)?;
    let rpc = adder
        .add_rpc(&request)
        .with_context(|| format!("Failed to add rpc `{}` to `{}`", request.rpc, request.service))?;

    println!(
        "{} Added {} rpc {} to {}",
        "✓".green(),
        request.kind,
        rpc.cyan(),
        request.service.yellow()
    );
    Ok(())
}

fn helm_command(name: &str, config: Config) -> Result<()> {
    let chart_dir = HelmGenerator::new(config)?
        .generate(name)
        .context("Failed to generate helm chart")?;

    println!("{} Helm chart written to {}", "✓".green(), chart_dir.display());
    Ok(())
}
