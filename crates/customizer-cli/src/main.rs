mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_SCHEMA_ERROR, EXIT_SELECTION_ERROR};
use customizer_schema::ToppingPolicy;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "customizer",
    version,
    about = "Normalize product customizer schemas and price selections"
)]
struct Cli {
    /// Path to the customizer config file. Missing file means defaults.
    #[arg(long, default_value = customizer_schema::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a schema's properties against its catalog and print the options.
    Normalize {
        /// Path to the product schema JSON file.
        schema: PathBuf,
        /// How isTopping is derived: last-wins or any-unresolved (overrides config).
        #[arg(long)]
        policy: Option<ToppingPolicy>,
    },
    /// Apply quantity picks to a schema and print the order total.
    Total {
        /// Path to the product schema JSON file.
        schema: PathBuf,
        /// A pick in the form OPTION=CHOICE:QTY, where CHOICE is an item id or raw value.
        #[arg(long = "pick", value_name = "OPTION=CHOICE:QTY")]
        picks: Vec<String>,
        /// Exit non-zero if a required option is left unsatisfied.
        #[arg(long, default_value_t = false)]
        require_satisfied: bool,
    },
    /// Verify that a schema parses and normalizes.
    Check {
        /// Path to the product schema JSON file.
        schema: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CUSTOMIZER_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let result = commands::load_config(&cli.config).and_then(|config| match cli.command {
        Commands::Normalize { schema, policy } => {
            let mut options = config.normalize_options();
            if let Some(policy) = policy {
                options.topping_policy = policy;
            }
            commands::normalize::run(&schema, options, json_output)
        }
        Commands::Total {
            schema,
            picks,
            require_satisfied,
        } => commands::total::run(
            &schema,
            config.normalize_options(),
            &picks,
            require_satisfied,
            json_output,
        ),
        Commands::Check { schema } => {
            commands::check::run(&schema, config.normalize_options(), json_output)
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("schema error:")
                || msg.starts_with("failed to parse schema")
                || msg.starts_with("failed to read schema")
            {
                EXIT_SCHEMA_ERROR
            } else if msg.starts_with("selection error:") || msg.starts_with("invalid pick") {
                EXIT_SELECTION_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
