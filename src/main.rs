use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use update_policy::cli::{self, EvaluateWorkflowArgs, OutputFormat};
use update_policy::ui;

const LOG_ENV: &str = "UPDATE_POLICY_LOG";

#[derive(clap::Parser)]
#[command(
    name = "update-policy",
    version,
    about = "Decide which dependency updates get a branch or a pull request"
)]
struct Args {
    #[arg(short, long, help = "Policy document path (TOML, or JSON by extension)")]
    config: Option<String>,

    #[arg(
        short = 'i',
        long,
        help = "JSON array of update candidates, '-' for stdin",
        required_unless_present_any = ["check", "list_rules"]
    )]
    candidates: Option<String>,

    #[arg(long, help = "Validate the policy document and exit")]
    check: bool,

    #[arg(long, help = "Show the package rules and limits, then exit")]
    list_rules: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help = "Output format")]
    format: OutputFormat,

    #[arg(long, default_value_t = 0, help = "Branches already open")]
    open_branches: u32,

    #[arg(long, default_value_t = 0, help = "Pull requests already open")]
    open_prs: u32,

    #[arg(long, default_value_t = 0, help = "Pull requests created this hour")]
    prs_this_hour: u32,

    #[arg(short, long, help = "Log decisions and limiter activity")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let policy = match cli::load_policy(args.config.as_deref()) {
        Ok(policy) => policy,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if args.check {
        ui::display_success(&format!(
            "Policy is valid ({} package rule(s))",
            policy.package_rules.len()
        ));
        return Ok(());
    }

    if args.list_rules {
        ui::display_rules(&policy);
        return Ok(());
    }

    let workflow_args = EvaluateWorkflowArgs {
        candidates_path: args.candidates.unwrap_or_else(|| "-".to_string()),
        open_branches: args.open_branches,
        open_prs: args.open_prs,
        prs_this_hour: args.prs_this_hour,
    };

    let result = match cli::run_evaluation(&workflow_args, &policy) {
        Ok(result) => result,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    match args.format {
        OutputFormat::Json => println!("{}", ui::render_json(&result.evaluation)?),
        OutputFormat::Text => ui::display_evaluation(&result.evaluation),
    }

    Ok(())
}
