use clap::Parser;
use tracing_subscriber::EnvFilter;

use gitmigrator::{
    BackupReader, Config, ContentPusher, GitHubClient, Migrator, RateLimiter, RunSummary,
    StateTracker,
};

#[derive(Parser, Debug)]
#[command(name = "gitmigrator")]
#[command(version = "0.1.0")]
#[command(about = "Migrate a GitHub organization's repositories, issues, and PR metadata")]
struct Args {
    /// Source GitHub organization name
    source_org: String,

    /// Target GitHub organization name
    target_org: String,

    /// GitHub access token (defaults to the GITHUB_TOKEN environment variable)
    #[arg(long)]
    token: Option<String>,

    /// Path to the state file used for resumption
    #[arg(long)]
    state_file: Option<std::path::PathBuf>,

    /// Root of the organization backup to migrate from
    #[arg(long)]
    backup_dir: Option<std::path::PathBuf>,

    /// Issue-creating calls per minute
    #[arg(long, default_value = "20")]
    issues_per_minute: u32,

    /// Comment-creating calls per minute
    #[arg(long, default_value = "20")]
    comments_per_minute: u32,

    /// Skip pushing repository content (migrate issues and PR metadata only)
    #[arg(long)]
    no_content: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gitmigrator=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match Config::from_env(args.token.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Some(state_file) = args.state_file {
        config.state_file = state_file;
    }
    if let Some(backup_dir) = args.backup_dir {
        config.backup_dir = backup_dir;
    }
    config.limits.issues_per_minute = args.issues_per_minute;
    config.limits.comments_per_minute = args.comments_per_minute;
    config.push_content = !args.no_content;

    tracing::info!(
        "Migration {} -> {} (state: {}, backup: {}, {} issues/min, {} comments/min, content: {})",
        args.source_org,
        args.target_org,
        config.state_file.display(),
        config.backup_dir.display(),
        config.limits.issues_per_minute,
        config.limits.comments_per_minute,
        if config.push_content { "enabled" } else { "disabled" },
    );

    let api = match GitHubClient::new(&config.github_token) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let tracker = match StateTracker::load(&config.state_file, &args.source_org, &args.target_org)
    {
        Ok(tracker) => tracker,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let limiter = RateLimiter::new(&config.limits);
    let reader = BackupReader::new(&config.backup_dir);
    let pusher = config
        .push_content
        .then(|| ContentPusher::new(&config.github_token, &args.target_org));

    let mut migrator = Migrator::new(
        api,
        tracker,
        limiter,
        reader,
        pusher,
        &args.source_org,
        &args.target_org,
    );

    match migrator.run().await {
        Ok(summary) => {
            report(&summary);
            if summary.is_full_completion() {
                Ok(())
            } else {
                eprintln!("Run the same command again to resume, or edit the state file to retry failed repositories.");
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Migration aborted: {}", e);
            eprintln!("{}", e);
            if e.is_resumable() {
                eprintln!("Run the same command again to resume from where it left off.");
            }
            std::process::exit(1);
        }
    }
}

fn report(summary: &RunSummary) {
    println!(
        "Migration finished: {} completed, {} skipped (already done), {} failed",
        summary.completed,
        summary.skipped,
        summary.failed.len()
    );
    for name in &summary.failed {
        println!("  failed: {}", name);
    }
}
