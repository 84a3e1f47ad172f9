use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    document::{
        CLIENT_EMAIL_ID, CLIENT_NAME_ID, DESCRIPTION_ID, PAYMENT_AMOUNT_ID, REQUIREMENTS_ID,
    },
    ContractClient, ContractFormHandler, InMemoryDocument, StdoutNotifier, SubmissionOutcome,
    SubmitEvent,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Fills the contract form from flags and submits it. Alerts go to stdout,
/// logs to stderr.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long, default_value = "")]
    client_name: String,
    #[arg(long, default_value = "")]
    client_email: String,
    #[arg(long, default_value = "")]
    payment_amount: String,
    #[arg(long, default_value = "")]
    requirements: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Number of times the submit button is pressed.
    #[arg(long, default_value_t = 1)]
    submissions: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let document = Arc::new(InMemoryDocument::contract_page());
    document.set_value(CLIENT_NAME_ID, args.client_name);
    document.set_value(CLIENT_EMAIL_ID, args.client_email);
    document.set_value(PAYMENT_AMOUNT_ID, args.payment_amount);
    document.set_value(REQUIREMENTS_ID, args.requirements);
    document.set_value(DESCRIPTION_ID, args.description);

    let client = ContractClient::new(&args.server_url)
        .with_context(|| format!("invalid server url '{}'", args.server_url))?;
    info!(endpoint = %client.endpoint(), "contract form ready");
    let handler = ContractFormHandler::on_document_ready(document, Arc::new(StdoutNotifier), client)?;

    let mut pending = Vec::with_capacity(args.submissions);
    for _ in 0..args.submissions {
        pending.push(handler.on_submit(&mut SubmitEvent::new())?);
    }

    let mut failed = 0usize;
    for joined in futures::future::join_all(pending).await {
        match joined.context("submission task panicked")? {
            SubmissionOutcome::Alerted(_) => {}
            SubmissionOutcome::Failed(_) => failed += 1,
        }
    }
    if failed > 0 {
        warn!(failed, total = args.submissions, "some submissions did not reach the server");
    }

    Ok(())
}
