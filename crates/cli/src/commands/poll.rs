// Poll command - wait for events of an existing session

use crate::output::{
    print_field, print_report, ArtefactSummary, OutputFormat, RunSummary, TextObserver,
};
use anyhow::Result;
use flowrun_engine::{
    poll_session, resolve_artefact, FlowApi, NoopObserver, PollConfig, PollObserver, PollOutcome,
    Timestamp,
};

pub async fn run<A: FlowApi + ?Sized>(
    client: &A,
    output: OutputFormat,
    quiet: bool,
    session_id: &str,
    since: Timestamp,
    config: &PollConfig,
) -> Result<()> {
    if !quiet && output.is_text() {
        print_field("Session ID", session_id);
        println!();
    }

    follow(client, output, quiet, session_id, since, config).await
}

/// Poll until the session settles, download a matching artefact and print the result.
///
/// Only output serialization can fail here; poll and download problems are part of the report.
pub async fn follow<A: FlowApi + ?Sized>(
    client: &A,
    output: OutputFormat,
    quiet: bool,
    session_id: &str,
    since: Timestamp,
    config: &PollConfig,
) -> Result<()> {
    let progress: &dyn PollObserver = if output.is_text() && !quiet {
        &TextObserver
    } else {
        &NoopObserver
    };

    if !quiet && output.is_text() && !config.initial_delay.is_zero() {
        println!(
            "Waiting {} seconds before first check...",
            config.initial_delay.as_secs()
        );
    }

    let report = poll_session(client, session_id, since, config, progress).await;

    let artefact = match &report.outcome {
        PollOutcome::Artefact(artefact) => {
            let result = resolve_artefact(client, artefact).await;
            if let Err(e) = &result {
                // Shown to the user in the report
                tracing::debug!(artefact = %artefact.name, error = %e, "artefact download failed");
            }
            Some(ArtefactSummary::new(artefact, result))
        }
        _ => None,
    };

    if output.is_text() {
        print_report(session_id, &report, artefact.as_ref());
    } else {
        output.print_value(&RunSummary {
            session_id,
            report: &report,
            artefact: artefact.as_ref(),
        })?;
    }

    Ok(())
}
