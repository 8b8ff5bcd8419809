//! Component fan-out driver
//!
//! Every configured component is mirrored by its own worker task, at most
//! `workers` at a time. A worker reports back plain data: failures never
//! cross the task boundary as errors or panics, so one component failing
//! cannot stop its siblings. Failures are logged once, when the report
//! is turned into the run's result.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, Instrument};

use super::{Mirror, SharedConfig};
use crate::clients::ClientFactory;
use crate::error::{MirrorError, MirrorResult};

/// Result of one component worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentOutcome {
    Success { component: String },
    Failure { component: String, message: String },
}

impl ComponentOutcome {
    pub fn component(&self) -> &str {
        match self {
            ComponentOutcome::Success { component } | ComponentOutcome::Failure { component, .. } => component,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            ComponentOutcome::Success { .. } => None,
            ComponentOutcome::Failure { message, .. } => Some(message),
        }
    }
}

/// Outcomes of a whole run, in configuration order
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcomes: Vec<ComponentOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ComponentOutcome> {
        self.outcomes.iter().filter(|o| o.failure_message().is_some())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Log every failure, then fail with the first one
    pub fn into_result(self) -> MirrorResult<()> {
        let messages: Vec<String> = self
            .failures()
            .filter_map(|o| o.failure_message().map(str::to_string))
            .collect();

        for message in &messages {
            error!("{}", message);
        }

        match messages.into_iter().next() {
            Some(first) => Err(MirrorError::Component(first)),
            None => Ok(()),
        }
    }
}

pub struct Driver {
    shared: SharedConfig,
    factory: Arc<dyn ClientFactory>,
}

impl Driver {
    pub fn new(shared: SharedConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self { shared, factory }
    }

    /// Mirror every configured component
    pub async fn run(&self) -> RunReport {
        let started = Instant::now();
        let components: Vec<String> = self.shared.components.ids().cloned().collect();
        let workers = self.shared.settings.workers.max(1);
        info!("Components to process: {}, workers: {}", components.len(), workers);

        let outcomes: Vec<ComponentOutcome> = stream::iter(components)
            .map(|component| {
                let shared = self.shared.clone();
                let factory = self.factory.clone();
                let span = tracing::info_span!("component", id = %component);
                let handle = tokio::spawn(
                    Self::process_component(shared, factory, component.clone()).instrument(span),
                );

                async move {
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let message = format!("[{}]: {}", component, MirrorError::Join(e.to_string()));
                            ComponentOutcome::Failure { component, message }
                        }
                    }
                }
            })
            .buffered(workers)
            .collect()
            .await;

        let report = RunReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            "All [{}] components processed. Errors: [{}]. Elapsed time: {:.2?}",
            report.outcomes.len(),
            report.failure_count(),
            report.elapsed
        );
        report
    }

    async fn process_component(
        shared: SharedConfig,
        factory: Arc<dyn ClientFactory>,
        component: String,
    ) -> ComponentOutcome {
        let result = match Mirror::connect(shared, factory.as_ref()) {
            Ok(mirror) => mirror.process_component(&component).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => ComponentOutcome::Success { component },
            Err(e) => ComponentOutcome::Failure {
                message: format!("[{}]: {}", component, e),
                component,
            },
        }
    }
}
