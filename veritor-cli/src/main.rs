//! Veritor CLI — serve the verification API or run one-shot checks.

use anyhow::{Context, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use veritor_core::config::load_config;
use veritor_core::service::{self, ServiceState};
use veritor_core::types::VerifyRequest;
use veritor_core::verifier::Verifier;

/// Veritor: evidence-grounded verification for AI-generated answers
#[derive(Parser, Debug)]
#[command(name = "veritor", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (location of .veritor/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Corpus file override
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP verification service
    Serve {
        /// Bind host override
        #[arg(long)]
        host: Option<String>,

        /// Bind port override
        #[arg(long)]
        port: Option<u16>,
    },
    /// Verify a single question/answer pair and print the JSON report
    Verify {
        /// The question that produced the answer
        #[arg(short, long)]
        question: String,

        /// The answer to verify against the corpus
        #[arg(short, long)]
        answer: String,

        /// Include per-claim counter-evidence analysis
        #[arg(long)]
        counter: bool,

        /// Green (Verified) threshold as a fraction in [0, 1]
        #[arg(long, default_value_t = 0.70)]
        green: f64,

        /// Yellow (Hallucination Suspected) threshold as a fraction in [0, 1]
        #[arg(long, default_value_t = 0.40)]
        yellow: f64,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut config = load_config(Some(&cli.workspace), None)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to load configuration")?;
    if let Some(corpus_path) = cli.corpus {
        config.corpus_path = corpus_path;
    }

    match cli.command {
        Commands::Serve { host, port } => {
            let verifier = Verifier::from_config(&config)
                .context("startup failed; the service will not accept requests")?;
            let state = ServiceState::new(verifier);
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            service::run(state, &host, port)
                .await
                .context("verification service terminated")?;
        }
        Commands::Verify {
            question,
            answer,
            counter,
            green,
            yellow,
        } => {
            // The CLI is a boundary layer: reject input the core is not
            // specified to handle before constructing the pipeline.
            if question.trim().is_empty() {
                bail!("question must not be empty");
            }
            if answer.trim().is_empty() {
                bail!("answer must not be empty");
            }
            if !(0.0..=1.0).contains(&green) || !(0.0..=1.0).contains(&yellow) {
                bail!("thresholds must be fractions in [0, 1]");
            }

            let verifier = Verifier::from_config(&config)
                .context("startup failed; cannot verify")?;
            let request = VerifyRequest {
                question,
                answer,
                include_counter: counter,
                threshold_green: green,
                threshold_yellow: yellow,
            };
            let response = verifier.verify(&request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
