//! Vast.ai launcher CLI - pick the best GPU offer and start a training container.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vast_launcher::config::{
    DEFAULT_AWS_REGION, DEFAULT_CONFIG_FILE, DEFAULT_DISK_ALLOCATION, DEFAULT_DOCKER_IMAGE,
    DEFAULT_GPU_NAME, DEFAULT_MAX_PRICE_PER_HOUR, DEFAULT_MIN_DISK_SPACE, DEFAULT_MIN_INET,
    DEFAULT_MIN_RELIABILITY,
};
use vast_launcher::providers::vast::Vast;
use vast_launcher::{
    launch, rank_offers, LaunchOutcome, Marketplace, Offer, RequirementSet, RunConfig, Secrets,
};

/// Vast.ai launcher - rent the best matching GPU and launch training on it.
#[derive(Parser)]
#[command(name = "vast-launcher")]
#[command(about = "Select and launch GPU instances on Vast.ai")]
struct Cli {
    /// Vast.ai API key (or set `VAST_API_KEY` env var).
    #[arg(long, env = "VAST_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the best offer and launch an instance on it.
    Launch {
        #[command(flatten)]
        requirements: RequirementArgs,

        #[command(flatten)]
        workload: WorkloadArgs,

        #[command(flatten)]
        secrets: SecretArgs,

        /// Search and select only, don't create an instance.
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Show eligible offers, best first.
    Search {
        #[command(flatten)]
        requirements: RequirementArgs,

        /// Number of offers to show.
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// List my instances.
    List,
}

/// Offer constraints.
#[derive(Args)]
struct RequirementArgs {
    /// Maximum price per hour in USD.
    #[arg(long, default_value_t = DEFAULT_MAX_PRICE_PER_HOUR)]
    max_price: f64,

    /// Minimum host reliability (0-1).
    #[arg(long, default_value_t = DEFAULT_MIN_RELIABILITY)]
    min_reliability: f64,

    /// Minimum free disk in GB.
    #[arg(long, default_value_t = DEFAULT_MIN_DISK_SPACE)]
    min_disk: f64,

    /// Minimum download bandwidth in Mbps.
    #[arg(long, default_value_t = DEFAULT_MIN_INET)]
    min_inet_down: f64,

    /// Minimum upload bandwidth in Mbps.
    #[arg(long, default_value_t = DEFAULT_MIN_INET)]
    min_inet_up: f64,

    /// Exact number of GPUs.
    #[arg(long, default_value = "1")]
    gpus: u32,

    /// Acceptable GPU types.
    #[arg(long, num_args = 1.., default_value = DEFAULT_GPU_NAME)]
    gpu_type: Vec<String>,
}

impl From<RequirementArgs> for RequirementSet {
    fn from(args: RequirementArgs) -> Self {
        Self {
            max_price_per_hour: args.max_price,
            min_reliability: args.min_reliability,
            min_disk_space: args.min_disk,
            min_inet_down: args.min_inet_down,
            min_inet_up: args.min_inet_up,
            num_gpus: args.gpus,
            gpu_names: args.gpu_type,
        }
    }
}

/// Container settings.
#[derive(Args)]
struct WorkloadArgs {
    /// Docker image to use.
    #[arg(long, short = 'i', default_value = DEFAULT_DOCKER_IMAGE)]
    docker_image: String,

    /// Training config file path.
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Extra arguments for the training script.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    extra_args: String,

    /// Disk to allocate in GB.
    #[arg(long, default_value_t = DEFAULT_DISK_ALLOCATION)]
    disk: f64,

    /// Command to run when the container starts.
    #[arg(long, default_value = "")]
    onstart: String,
}

/// Credentials passed into the container.
#[derive(Args)]
struct SecretArgs {
    /// Weights & Biases API key.
    #[arg(long, env = "WANDB_API_KEY", default_value = "", hide_env_values = true)]
    wandb_key: String,

    /// AWS access key ID.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", default_value = "", hide_env_values = true)]
    aws_key: String,

    /// AWS secret access key.
    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        default_value = "",
        hide_env_values = true
    )]
    aws_secret: String,

    /// AWS region for data access.
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = DEFAULT_AWS_REGION)]
    aws_region: String,

    /// S3 path of the training data.
    #[arg(long, env = "S3_DATA_PATH", default_value = "")]
    s3_path: String,
}

impl From<SecretArgs> for Secrets {
    fn from(args: SecretArgs) -> Self {
        Self {
            wandb_key: args.wandb_key,
            aws_key: args.aws_key,
            aws_secret: args.aws_secret,
            aws_region: args.aws_region,
            s3_path: args.s3_path,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let api_key = cli.api_key.trim().to_string();

    match cli.command {
        Commands::Launch {
            requirements,
            workload,
            secrets,
            dry_run,
        } => {
            let config = RunConfig {
                api_key,
                docker_image: workload.docker_image,
                requirements: requirements.into(),
                disk_space: workload.disk,
                onstart: workload.onstart,
                config_file: workload.config,
                extra_args: workload.extra_args,
                secrets: secrets.into(),
            };
            run_launch(&config, dry_run).await?;
        }

        Commands::Search {
            requirements,
            limit,
        } => {
            let config = RunConfig {
                api_key,
                requirements: requirements.into(),
                ..RunConfig::default()
            };
            config.validate()?;
            let vast = Vast::new(&config.api_key).context("Failed to create Vast.ai client")?;

            let offers = vast.search_offers().await.context("Offer search failed")?;
            let ranked = rank_offers(&offers, &config.requirements);

            println!(
                "\n🔎 {} of {} offers match ({} shown)",
                ranked.len(),
                offers.len(),
                ranked.len().min(limit)
            );
            println!(
                "\n{:<12} {:<16} {:>4} {:>9} {:>7} {:>7} {:<20}",
                "ID", "GPU", "N", "$/HR", "REL%", "SCORE", "LOCATION"
            );
            println!("{}", "-".repeat(80));
            for scored in ranked.iter().take(limit) {
                let o = &scored.offer;
                println!(
                    "{:<12} {:<16} {:>4} {:>9.3} {:>7.1} {:>7.2} {:<20}",
                    o.id,
                    o.gpu_name,
                    o.num_gpus,
                    o.price_per_hour,
                    o.reliability * 100.0,
                    scored.score,
                    o.geolocation.as_deref().unwrap_or("Unknown")
                );
            }
            println!();
        }

        Commands::List => {
            if api_key.is_empty() {
                anyhow::bail!("Missing required environment variables: VAST_API_KEY");
            }
            let vast = Vast::new(&api_key).context("Failed to create Vast.ai client")?;
            let instances = vast
                .list_instances()
                .await
                .context("Failed to list instances")?;

            println!("\n📋 My Instances ({})", instances.len());
            println!("{}", "-".repeat(60));

            for inst in instances {
                let status_emoji = match inst.status.as_str() {
                    "running" => "🟢",
                    "loading" | "created" => "🟡",
                    "exited" | "offline" => "🔴",
                    _ => "⚪",
                };
                let started = inst
                    .started_at
                    .map(|t| t.format(" | since %Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default();
                println!(
                    "  [{}] {} x{} | ${:.3}/hr | {} {}{}",
                    inst.id,
                    inst.gpu_name,
                    inst.num_gpus,
                    inst.price_per_hour,
                    status_emoji,
                    inst.status,
                    started
                );
            }
            println!();
        }
    }

    Ok(())
}

async fn run_launch(config: &RunConfig, dry_run: bool) -> Result<()> {
    let vast = Vast::new(&config.api_key).context("Failed to create Vast.ai client")?;

    match launch(&vast, config, dry_run).await? {
        LaunchOutcome::NoEligibleOffer => {
            println!("\n❌ No instances matching the criteria found.");
            println!("   -> Try relaxing requirements (price, GPU type, etc.)");
            if !dry_run {
                anyhow::bail!("No instance was launched");
            }
        }
        LaunchOutcome::DryRun(best) => {
            print_offer_info(&best.offer, best.score);
            println!("\n[DRY RUN] Skipping instance creation");
        }
        LaunchOutcome::Launched { offer, handle } => {
            print_offer_info(&offer.offer, offer.score);
            println!("\n✅ Instance created successfully!");
            println!("   Instance ID: {handle}");
            println!("   Image:       {}", config.docker_image);
            println!("   Config:      {}", config.config_file);
            println!("\n💡 Monitor at: https://cloud.vast.ai/instances/");
        }
    }

    Ok(())
}

fn print_offer_info(offer: &Offer, score: f64) {
    println!("\n{}", "=".repeat(50));
    println!("🎮 Selected Instance");
    println!("{}", "=".repeat(50));
    println!("   ID:          {}", offer.id);
    println!("   GPU:         {} x {}", offer.gpu_name, offer.num_gpus);
    println!("   VRAM:        {:.1} GB", offer.gpu_ram / 1024.0);
    println!("   Price:       ${:.3}/hour", offer.price_per_hour);
    println!("   Reliability: {:.1}%", offer.reliability * 100.0);
    println!("   Download:    {:.0} Mbps", offer.inet_down);
    println!("   Upload:      {:.0} Mbps", offer.inet_up);
    println!(
        "   Location:    {}",
        offer.geolocation.as_deref().unwrap_or("Unknown")
    );
    println!("   Score:       {score:.2}");
    println!("{}", "=".repeat(50));
}
