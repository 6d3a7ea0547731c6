// Output formatting for CLI

use flowrun_engine::{
    ArtefactContent, ArtefactRef, ClientError, FlowEvent, PollObserver, PollOutcome, PollReport,
};
use serde::Serialize;

#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => print!("{}", to_yaml(value)?),
            OutputFormat::Text => {
                // Text format is handled by each command
            }
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// YAML through a JSON document, so numbers keep the exact digits they arrived with
fn to_yaml<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let json = serde_json::to_string(value)?;
    let document: serde_yaml::Value = serde_yaml::from_str(&json)?;
    Ok(serde_yaml::to_string(&document)?)
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print a fatal error, with the service response body when there is one
pub fn print_error(err: &anyhow::Error) {
    eprintln!("Error: {:#}", err);
    if let Some(body) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>())
        .and_then(ClientError::response_body)
    {
        eprintln!("Response body: {}", body);
    }
}

/// Prints per-attempt progress lines
pub struct TextObserver;

impl PollObserver for TextObserver {
    fn on_events(&self, attempt: u32, max_attempts: u32, count: usize) {
        println!("Attempt {}/{} - got {} events", attempt, max_attempts, count);
    }

    fn on_empty(&self, attempt: u32, max_attempts: u32, empty_streak: u32) {
        println!(
            "Attempt {}/{} - no new events (empty: {})",
            attempt, max_attempts, empty_streak
        );
    }

    fn on_error(&self, attempt: u32, max_attempts: u32, error: &ClientError) {
        println!("Attempt {}/{} - error: {}", attempt, max_attempts, error);
    }

    fn on_artefact_found(&self, name: &str) {
        println!("\nFound artefact: {}", name);
    }

    fn on_artefact_without_url(&self, name: &str) {
        println!("\nWarning: artefact {} has no download URL, still waiting", name);
    }
}

/// Downloaded artefact, or why it could not be downloaded
#[derive(Debug, Serialize)]
pub struct ArtefactSummary {
    pub name: String,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ArtefactContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArtefactSummary {
    pub fn new(artefact: &ArtefactRef, result: Result<ArtefactContent, ClientError>) -> Self {
        let (content, error) = match result {
            Ok(content) => (Some(content), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            name: artefact.name.clone(),
            download_url: artefact.download_url.clone(),
            content,
            error,
        }
    }
}

/// Final document for json/yaml output
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub session_id: &'a str,
    #[serde(flatten)]
    pub report: &'a PollReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artefact: Option<&'a ArtefactSummary>,
}

/// Text rendering of a finished polling run
pub fn print_report(session_id: &str, report: &PollReport, artefact: Option<&ArtefactSummary>) {
    match &report.outcome {
        PollOutcome::Artefact(_) => {
            if let Some(artefact) = artefact {
                print_artefact(artefact);
            }
        }
        PollOutcome::Failed { event } => print_failure(event),
        PollOutcome::Completed => {
            println!("\nFlow completed.\n");
            print_messages(&report.messages);
        }
        PollOutcome::Timeout => {
            print_messages(&report.messages);
            println!("\nTimeout: flow did not complete within {} attempts.", report.attempts);
            print_field("Session ID", session_id);
            print_field("Last event", &report.watermark.to_string());
        }
    }
}

fn print_artefact(artefact: &ArtefactSummary) {
    println!("\n=== ARTEFACT ===");
    print_field("File", &artefact.name);
    print_field("URL", &artefact.download_url);
    println!();

    match (&artefact.content, &artefact.error) {
        (Some(content), _) => println!("{}", content.body()),
        (None, Some(error)) => println!("Error downloading artefact: {}", error),
        (None, None) => {}
    }
}

fn print_failure(event: &FlowEvent) {
    println!("\nFlow failed!");
    match serde_json::to_string_pretty(event) {
        Ok(dump) => println!("{}", dump),
        Err(_) => println!("{:?}", event),
    }
}

fn print_messages(messages: &[String]) {
    println!("=== OUTPUT ===");
    if messages.is_empty() {
        println!("No AI messages collected.");
        return;
    }

    for (idx, message) in messages.iter().enumerate() {
        println!("\nMessage {}:", idx + 1);
        println!("{}", message);
    }
}
