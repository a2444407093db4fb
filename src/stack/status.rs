use crate::stack::Stack;
use aws_sdk_cloudformation::types::StackEvent;
use eyre::{ContextCompat, WrapErr};

/// Aggregate state of the most recent stack run
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum State {
    InProgress,
    Complete,
    Failed,
}

/// Stack status together with failure details when the run went wrong
#[derive(Clone, Debug)]
pub(crate) struct Status {
    pub(crate) state: State,
    pub(crate) errors: Vec<String>,
}

const END_SUCCESS: [&str; 3] = ["UPDATE_COMPLETE", "CREATE_COMPLETE", "DELETE_COMPLETE"];

const END_FAILURE: [&str; 7] = [
    "UPDATE_ROLLBACK_COMPLETE",
    "UPDATE_ROLLBACK_FAILED",
    "ROLLBACK_COMPLETE",
    "ROLLBACK_FAILED",
    "CREATE_FAILED",
    "UPDATE_FAILED",
    "DELETE_FAILED",
];

impl Stack {
    /// Current status derived from the stack's event stream
    ///
    /// Events come newest first, so fetching stops at the "User Initiated"
    /// marker which opens every run. Only events of the most recent run are
    /// classified.
    pub(crate) async fn status(&self) -> eyre::Result<Status> {
        let mut next_token = None;
        let mut events: Vec<StackEvent> = Vec::new();

        loop {
            let mut request = self
                .client
                .describe_stack_events()
                .stack_name(self.name.clone());

            if let Some(token) = next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .wrap_err("Failed to describe stack events")?;

            events.extend_from_slice(response.stack_events());
            next_token = response.next_token().map(|s| s.to_string());

            if next_token.is_none() || events.iter().any(is_start_marker) {
                break;
            }
        }

        classify(&events)
    }
}

fn is_stack_event(event: &StackEvent) -> bool {
    event
        .resource_type()
        .unwrap_or_default()
        .eq("AWS::CloudFormation::Stack")
}

/// Every run opens with a stack-level event marked "User Initiated"
fn is_start_marker(event: &StackEvent) -> bool {
    is_stack_event(event)
        && event
            .resource_status_reason()
            .unwrap_or_default()
            .eq("User Initiated")
}

/// Classify a newest-first list of stack events
fn classify(events: &[StackEvent]) -> eyre::Result<Status> {
    let mut end_success = false;
    let mut end_failure = false;
    let mut current_run = Vec::new();

    for event in events {
        // Anything older than the start marker belongs to a previous run
        if is_start_marker(event) {
            break;
        }

        let status = event
            .resource_status()
            .wrap_err("Missing resource status")?
            .as_str();

        // Only the newest terminal stack event decides the outcome
        if is_stack_event(event) && !end_success && !end_failure {
            if END_SUCCESS.contains(&status) {
                end_success = true;
            }

            if END_FAILURE.contains(&status) {
                end_failure = true;
            }
        }

        current_run.push(event);
    }

    if end_failure {
        return Ok(Status {
            state: State::Failed,
            errors: failures(&current_run),
        });
    }

    if end_success {
        return Ok(Status {
            state: State::Complete,
            errors: vec![],
        });
    }

    Ok(Status {
        state: State::InProgress,
        errors: vec![],
    })
}

/// Failed resource events of the run, so the operator sees what broke
fn failures(events: &[&StackEvent]) -> Vec<String> {
    let mut errors = vec![];

    for event in events {
        let status = event
            .resource_status()
            .map(|s| s.as_str())
            .unwrap_or_default();

        if !status.contains("FAILED") || is_stack_event(event) {
            continue;
        }

        errors.push(format!(
            "{} ({}): {}",
            event.logical_resource_id().unwrap_or_default(),
            event.resource_type().unwrap_or_default(),
            event.resource_status_reason().unwrap_or("Unknown reason"),
        ));
    }

    errors
}
