use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use app_release::config::{self, Config};
use app_release::descriptor::DescriptorStore;
use app_release::domain::{BumpType, VersionDescriptor};
use app_release::pipeline::{
    require_explicit_bump, reset, BumpResolver, ReleasePipeline, ReleaseRequest,
};
use app_release::ui::{self, PromptResolver};

#[derive(Parser)]
#[command(
    name = "app-release",
    version,
    about = "Bump, build and upload iOS app releases"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More log output (-v, -vv)")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Release a build configuration
    Release {
        /// Build configuration key (e.g. test, production)
        configuration: String,

        #[arg(short, long, help = "Bump type: major, minor, patch or build")]
        bump: Option<BumpType>,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,

        #[arg(
            short,
            long,
            help = "Never prompt: skip confirmation and require --bump instead of asking"
        )]
        force: bool,
    },
    /// Show configured build configurations
    List,
    /// Show the remote version/build of a configuration and the next candidates
    Status {
        /// Build configuration key
        configuration: String,
    },
    /// Restore the persisted descriptor to its default
    Reset,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref()).context("Error loading config")?;

    match args.command {
        Commands::Release {
            configuration,
            bump,
            dry_run,
            force,
        } => release(&config, &configuration, bump, dry_run, force),
        Commands::List => {
            let configurations = config.build_configurations()?;
            if configurations.is_empty() {
                anyhow::bail!("No build configurations in the config file");
            }
            ui::display_configurations(&configurations);
            Ok(())
        }
        Commands::Status { configuration } => status(&config, &configuration),
        Commands::Reset => {
            let sentinel = config.descriptor.sentinel()?;
            let mut store = config.descriptor.store();
            reset(&mut store, &sentinel)?;
            ui::display_success(&format!(
                "Reset {} to {}",
                store.path().display(),
                sentinel
            ));
            Ok(())
        }
    }
}

fn release(
    config: &Config,
    key: &str,
    bump: Option<BumpType>,
    dry_run: bool,
    force: bool,
) -> Result<()> {
    let configuration = config.configuration(key)?;
    let sentinel = config.descriptor.sentinel()?;
    let pipeline = ReleasePipeline::new(
        config.signer(),
        config.builder(),
        config.distributor(),
        config.crash_reporter(),
        sentinel,
    )
    .with_crash_token(config.crash_token());

    if config.crash_token().is_none() {
        ui::display_status("No crash reporting token configured, debug symbols will not be uploaded");
    }

    let mut prompt = PromptResolver;
    let mut explicit = require_explicit_bump;
    let resolver: &mut dyn BumpResolver = if force { &mut explicit } else { &mut prompt };

    ui::display_status(&format!(
        "Checking latest release of {}...",
        configuration.bundle_id
    ));
    let mut store = config.descriptor.store();
    if dry_run {
        let outcome = pipeline.run(
            &mut store,
            &configuration,
            ReleaseRequest { bump, dry_run: true },
            resolver,
        )?;
        ui::display_plan(&outcome.plan);
        ui::display_outcome(&outcome);
        return Ok(());
    }

    let plan = pipeline.plan(&configuration, bump, resolver)?;
    ui::display_plan(&plan);

    if !force && !ui::confirm_action("Sign, build and upload this release?")? {
        println!("Release cancelled by user.");
        return Ok(());
    }

    let outcome = pipeline
        .execute(&mut store, plan)
        .with_context(|| format!("Release of '{}' failed", key))?;
    ui::display_outcome(&outcome);

    println!(
        "\n{} Released {} {}\n",
        console::style("✓").green(),
        outcome.plan.configuration.bundle_id,
        outcome.plan.next
    );
    Ok(())
}

fn status(config: &Config, key: &str) -> Result<()> {
    let configuration = config.configuration(key)?;
    let sentinel = config.descriptor.sentinel()?;
    let pipeline = ReleasePipeline::new(
        config.signer(),
        config.builder(),
        config.distributor(),
        config.crash_reporter(),
        sentinel.clone(),
    );

    let remote = pipeline.remote_descriptor(&configuration)?;
    let base = remote.clone().unwrap_or_else(|| sentinel.clone());
    let candidates: Vec<(BumpType, VersionDescriptor)> = configuration
        .allowed_bumps()
        .iter()
        .filter(|b| remote.is_some() || **b == BumpType::Major)
        .map(|b| Ok((*b, base.next(*b, sentinel.build)?)))
        .collect::<app_release::Result<_>>()?;

    ui::display_remote_status(&configuration, remote.as_ref(), &candidates);

    let store = config.descriptor.store();
    match store.load() {
        Ok(current) if current == sentinel => {}
        Ok(current) => ui::display_warning(&format!(
            "{} holds {} instead of {}; run `app-release reset`",
            store.path().display(),
            current,
            sentinel
        )),
        Err(e) => ui::display_warning(&format!(
            "Could not read {}: {}",
            store.path().display(),
            e
        )),
    }
    Ok(())
}
