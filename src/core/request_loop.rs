//! Free text in, executed intent out.
//!
//! Each request walks `Idle -> Prompting -> Generating -> Extracting ->
//! Validating -> Dispatching` and ends either `Dispatched` or `Rejected`.
//! A rejection never stops the loop; the next line is read as usual.

use crate::core::classifier::try_classify;
use crate::core::contact_store::ContactChange;
use crate::core::dispatcher::{DispatchReport, Dispatcher};
use crate::core::extractor::extract_json;
use crate::core::prompt::{build_prompt, PromptStyle};
use crate::domain::model::ParsedIntent;
use crate::domain::ports::TextGenerator;
use crate::utils::error::{MailError, Result};
use crate::utils::validation::is_valid_email;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const QUIT_COMMAND: &str = "quit";

const INPUT_PROMPT: &str =
    "Tell me your request (either update contact OR send email), typing quit would end the program.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Idle,
    Prompting,
    Generating,
    Extracting,
    Validating,
    Dispatching,
    Dispatched,
    Rejected,
}

#[derive(Debug)]
pub enum RequestOutcome {
    Dispatched {
        intent: ParsedIntent,
        report: DispatchReport,
    },
    Rejected {
        /// Stage that failed.
        stage: RequestStage,
        error: MailError,
    },
}

impl RequestOutcome {
    pub fn terminal_stage(&self) -> RequestStage {
        match self {
            RequestOutcome::Dispatched { .. } => RequestStage::Dispatched,
            RequestOutcome::Rejected { .. } => RequestStage::Rejected,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self, RequestOutcome::Dispatched { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub processed: usize,
    pub dispatched: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub prompt_style: PromptStyle,
    /// Replace a contact name in `receiver` with its stored address before validation.
    pub resolve_names: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            prompt_style: PromptStyle::Guided,
            resolve_names: true,
        }
    }
}

pub struct RequestPipeline {
    generator: Arc<dyn TextGenerator>,
    dispatcher: Dispatcher,
    options: PipelineOptions,
}

impl RequestPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        dispatcher: Dispatcher,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            dispatcher,
            options,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs a request up to (but not including) dispatch.
    pub async fn parse(
        &self,
        input: &str,
    ) -> std::result::Result<ParsedIntent, (RequestStage, MailError)> {
        enter(RequestStage::Prompting);
        let prompt = {
            let contacts = self.dispatcher.contacts().lock().await;
            build_prompt(self.options.prompt_style, input, &contacts)
        };

        enter(RequestStage::Generating);
        let raw = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| (RequestStage::Generating, e))?;
        tracing::debug!("=== Raw AI output ===\n{}", raw);

        enter(RequestStage::Extracting);
        let mut value =
            extract_json(&raw).ok_or((RequestStage::Extracting, MailError::ExtractionError))?;

        enter(RequestStage::Validating);
        if self.options.resolve_names {
            self.resolve_receiver(&mut value).await;
        }
        try_classify(&value).map_err(|e| (RequestStage::Validating, e))
    }

    pub async fn process(&self, input: &str) -> RequestOutcome {
        let intent = match self.parse(input).await {
            Ok(intent) => intent,
            Err((stage, error)) => return reject(stage, error),
        };

        enter(RequestStage::Dispatching);
        match self.dispatcher.dispatch(&intent).await {
            Ok(report) => {
                tracing::info!("Request dispatched as '{}'", intent.kind());
                RequestOutcome::Dispatched { intent, report }
            }
            Err(error) => reject(RequestStage::Dispatching, error),
        }
    }

    /// Reads one request per line until `quit` or end of input.
    ///
    /// A line that is not valid UTF-8 is rejected on its own; the loop keeps reading.
    pub async fn run<R>(&self, mut reader: R) -> Result<LoopSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut summary = LoopSummary::default();

        loop {
            enter(RequestStage::Idle);
            println!("{}", INPUT_PROMPT);

            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    summary.processed += 1;
                    summary.rejected += 1;
                    tracing::warn!("⚠️ Request rejected: input is not valid UTF-8 ({})", e);
                    println!("❌ Input is not valid UTF-8 text, please type the request again");
                    continue;
                }
            };
            let input = line.trim();
            if input == QUIT_COMMAND {
                break;
            }
            if input.is_empty() {
                continue;
            }

            summary.processed += 1;
            match self.process(input).await {
                RequestOutcome::Dispatched { report, .. } => {
                    summary.dispatched += 1;
                    println!("✅ {}", describe(&report));
                }
                RequestOutcome::Rejected { error, .. } => {
                    summary.rejected += 1;
                    println!("❌ {}", error.user_friendly_message());
                    println!("💡 {}", error.recovery_suggestion());
                }
            }
        }

        tracing::info!(
            "Session finished: {} processed, {} dispatched, {} rejected",
            summary.processed,
            summary.dispatched,
            summary.rejected
        );
        Ok(summary)
    }

    async fn resolve_receiver(&self, value: &mut Value) {
        if value.get("type").and_then(Value::as_str) != Some("email") {
            return;
        }
        let Some(receiver) = value.get("receiver").and_then(Value::as_str) else {
            return;
        };
        if is_valid_email(receiver) {
            return;
        }

        let contacts = self.dispatcher.contacts().lock().await;
        if let Some(address) = contacts.resolve_name(receiver) {
            tracing::debug!("Resolved receiver '{}' to {}", receiver, address);
            value["receiver"] = Value::String(address.to_string());
        }
    }
}

fn enter(stage: RequestStage) {
    tracing::debug!("request stage: {:?}", stage);
}

fn reject(stage: RequestStage, error: MailError) -> RequestOutcome {
    tracing::warn!("⚠️ Request rejected at {:?}: {}", stage, error);
    RequestOutcome::Rejected { stage, error }
}

fn describe(report: &DispatchReport) -> String {
    match report {
        DispatchReport::MailSent { to, .. } => format!("Email sent to {}", to),
        DispatchReport::ContactChanged { change } => match change {
            ContactChange::Added { name, email } => {
                format!("Added contact {} -> {}", name, email)
            }
            ContactChange::Replaced { name, email, .. }
            | ContactChange::Updated { name, email, .. } => {
                format!("Updated contact {} -> {}", name, email)
            }
            ContactChange::Deleted { name, .. } => {
                format!("Deleted contact {}", name)
            }
        },
    }
}
