// Run command - create a session for a flow, invoke it and follow its events

use crate::output::{print_field, OutputFormat};
use anyhow::{Context, Result};
use flowrun_engine::{FlowApi, FlowTarget, PollConfig, Timestamp};

pub async fn run<A: FlowApi + ?Sized>(
    client: &A,
    output: OutputFormat,
    quiet: bool,
    target: &FlowTarget,
    message: &str,
    config: &PollConfig,
) -> Result<()> {
    let verbose = !quiet && output.is_text();

    if verbose {
        println!("Step 1: Creating session from flow...");
        print_field("Flow ID", &target.flow_id);
        print_field("Workspace ID", &target.workspace_id);
        print_field("Input length", &format!("{} characters", message.chars().count()));
        println!();
    }

    let session_id = client
        .create_session(target)
        .await
        .context("Failed to create flow session")?;
    tracing::info!(%session_id, "session created");

    if verbose {
        println!("Session created.");
        print_field("Session ID", &session_id);
        println!();
        println!("Step 2: Invoking session...");
    }

    client
        .invoke(&session_id, message)
        .await
        .with_context(|| format!("Failed to invoke session {}", session_id))?;

    if verbose {
        println!("Session invoked.\n");
        println!("Step 3: Polling for response...");
    }

    super::poll::follow(client, output, quiet, &session_id, Timestamp::zero(), config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowrun_engine::{ClientError, FlowEvent};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records calls; fails at the configured step
    #[derive(Default)]
    struct FakeApi {
        fail_create: bool,
        fail_invoke: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FlowApi for FakeApi {
        async fn create_session(&self, target: &FlowTarget) -> Result<String, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create:{}:{}", target.workspace_id, target.flow_id));
            if self.fail_create {
                return Err(ClientError::Api {
                    status: 401,
                    message: "Invalid API key".to_string(),
                });
            }
            Ok("sess-1".to_string())
        }

        async fn invoke(&self, session_id: &str, message: &str) -> Result<(), ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("invoke:{session_id}:{message}"));
            if self.fail_invoke {
                return Err(ClientError::NotFound);
            }
            Ok(())
        }

        async fn poll_events(
            &self,
            session_id: &str,
            from_timestamp: &Timestamp,
        ) -> Result<Vec<FlowEvent>, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("poll:{session_id}:{from_timestamp}"));
            let event = serde_json::from_value(json!({
                "event_type": "system",
                "action_type": "artefacts",
                "created_at_timestamp": 3,
                "metadata": {"artefacts": [{"name": "korektura.json", "download_url": "https://files/k"}]}
            }))
            .unwrap();
            Ok(vec![event])
        }

        async fn fetch_artefact(&self, download_url: &str) -> Result<String, ClientError> {
            self.calls.lock().unwrap().push(format!("fetch:{download_url}"));
            Err(ClientError::NotFound)
        }
    }

    fn target() -> FlowTarget {
        FlowTarget::new("ws", "flow")
    }

    fn config() -> PollConfig {
        PollConfig {
            max_attempts: 3,
            poll_interval: Duration::ZERO,
            initial_delay: Duration::ZERO,
            ..PollConfig::default()
        }
    }

    #[tokio::test]
    async fn test_full_run_creates_invokes_polls_and_fetches() {
        let api = FakeApi::default();

        run(&api, OutputFormat::Json, true, &target(), "text", &config())
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "create:ws:flow",
                "invoke:sess-1:text",
                "poll:sess-1:0",
                "fetch:https://files/k",
            ]
        );
    }

    #[tokio::test]
    async fn test_session_creation_failure_is_fatal() {
        let api = FakeApi {
            fail_create: true,
            ..Default::default()
        };

        let err = run(&api, OutputFormat::Text, true, &target(), "text", &config())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to create flow session"));
        let cause = err.downcast_ref::<ClientError>().unwrap();
        assert_eq!(cause.response_body(), Some("Invalid API key"));
        assert_eq!(api.calls(), vec!["create:ws:flow"]);
    }

    #[tokio::test]
    async fn test_invoke_failure_is_fatal_and_skips_polling() {
        let api = FakeApi {
            fail_invoke: true,
            ..Default::default()
        };

        let err = run(&api, OutputFormat::Text, true, &target(), "text", &config())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to invoke session sess-1"));
        assert_eq!(api.calls(), vec!["create:ws:flow", "invoke:sess-1:text"]);
    }
}
