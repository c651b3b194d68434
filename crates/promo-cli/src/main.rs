//! `promo-step`: run one promotion step against a local work dir

mod input;

use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use input::{load, load_warehouses, FreightFile};
use promo_directives::{
    cancellation, default_steps, Config, PromotionStepContext, PromotionStepResult,
    HELM_UPDATE_IMAGE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("promo-step")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run a promotion step against a local work dir")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log as JSON"),
        )
        .subcommand(
            Command::new("run")
                .about("Run a step")
                .arg(
                    Arg::new("step")
                        .long("step")
                        .default_value(HELM_UPDATE_IMAGE)
                        .help("Step name"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Step config file (JSON or YAML)"),
                )
                .arg(
                    Arg::new("freight")
                        .long("freight")
                        .value_parser(value_parser!(PathBuf))
                        .help("Freight and freight requests file (JSON or YAML)"),
                )
                .arg(
                    Arg::new("warehouses")
                        .long("warehouses")
                        .value_parser(value_parser!(PathBuf))
                        .help("Warehouse list file (JSON or YAML)"),
                )
                .arg(
                    Arg::new("work-dir")
                        .long("work-dir")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Working directory the step's paths are relative to"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .required(true)
                        .help("Project the Warehouses live in"),
                )
                .arg(
                    Arg::new("timeout-secs")
                        .long("timeout-secs")
                        .value_parser(value_parser!(u64))
                        .help("Deadline for the whole step"),
                ),
        )
        .subcommand(Command::new("steps").about("List available steps"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(args: &ArgMatches) -> Result<PromotionStepResult> {
    let step_name = args
        .get_one::<String>("step")
        .map_or(HELM_UPDATE_IMAGE, String::as_str);
    let config_path = args
        .get_one::<PathBuf>("config")
        .ok_or_else(|| anyhow!("--config is required"))?;
    let project = args
        .get_one::<String>("project")
        .ok_or_else(|| anyhow!("--project is required"))?;
    let work_dir = args
        .get_one::<PathBuf>("work-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let registry = default_steps();
    let step = registry
        .get(step_name)
        .ok_or_else(|| anyhow!("unknown step {step_name:?}; available: {:?}", registry.names()))?;

    let config: Config = load(config_path)?;
    let freight: FreightFile = match args.get_one::<PathBuf>("freight") {
        Some(path) => load(path)?,
        None => FreightFile::default(),
    };
    let store = load_warehouses(args.get_one::<PathBuf>("warehouses").map(PathBuf::as_path))?;

    let (handle, signal) = cancellation();
    let mut ctx = PromotionStepContext::new(project.clone(), work_dir, Arc::new(store))
        .with_freight_requests(freight.requests())
        .with_freight(freight.freight)
        .with_cancellation(signal);
    if let Some(secs) = args.get_one::<u64>("timeout-secs") {
        ctx = ctx.with_timeout(Duration::from_secs(*secs));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling step");
            handle.cancel();
        }
    });

    info!(step = step_name, project = %project, "Starting");
    step.run(&ctx, &config)
        .await
        .with_context(|| format!("step {step_name} failed"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    match matches.subcommand() {
        Some(("run", args)) => match run(args).await {
            Ok(result) => {
                println!("{}", serde_json::to_string_pretty(&result)?);
                Ok(())
            }
            Err(e) => {
                println!("{}", serde_json::to_string_pretty(&PromotionStepResult::errored())?);
                Err(e)
            }
        },
        Some(("steps", _)) => {
            for name in default_steps().names() {
                println!("{name}");
            }
            Ok(())
        }
        _ => Err(anyhow!("no subcommand given")),
    }
}
