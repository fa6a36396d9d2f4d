//! Import pipeline
//!
//! # State Progression
//! START → RESOLVED → REGISTERED → TRANSFERRED → SUBMITTED
//!
//! Any stage failure ends the run in FAILED. Earlier stages are not undone:
//! a failed transfer leaves the registered upload orphaned, and a failed
//! submission leaves the stored object without an import job.
//!
//! Each `ImportPipeline` owns its own HTTP clients, so separate instances
//! can run concurrently without sharing anything.

use crate::client::ContactServiceClient;
use crate::error::{ImportError, Result};
use crate::file_descriptor::FileDescriptor;
use crate::registrar::{UploadIntent, UploadRegistrar};
use crate::settings::ImportSettings;
use crate::submitter::{ImportJob, ImportSubmitter};
use crate::transfer::TransferExecutor;
use std::fmt;
use std::path::Path;
use tracing::{error, info};

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Resolved,
    Registered,
    Transferred,
    Submitted,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "START",
            PipelineStage::Resolved => "RESOLVED",
            PipelineStage::Registered => "REGISTERED",
            PipelineStage::Transferred => "TRANSFERRED",
            PipelineStage::Submitted => "SUBMITTED",
            PipelineStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Stage transition reported to a [`ProgressObserver`]
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    Resolved(&'a FileDescriptor),
    Registered(&'a UploadIntent),
    Transferred { upload_id: &'a str },
    Submitted(&'a ImportJob),
    /// `reached` is the last stage completed before the failure
    Failed {
        reached: PipelineStage,
        error: &'a ImportError,
    },
}

/// Receives stage transitions as they happen
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent<'_>);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_event(&self, _event: &PipelineEvent<'_>) {}
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub descriptor: FileDescriptor,
    pub upload_id: String,
    pub job: ImportJob,
}

/// Resolve → register → transfer → submit, stopping at the first error
#[derive(Debug, Clone)]
pub struct ImportPipeline {
    registrar: UploadRegistrar,
    executor: TransferExecutor,
    submitter: ImportSubmitter,
}

impl ImportPipeline {
    /// Build a pipeline with fresh contact service and storage clients
    pub fn new(settings: &ImportSettings) -> Result<Self> {
        let client = ContactServiceClient::new(
            &settings.host,
            &settings.credentials,
            settings.request_timeout,
        )?;
        let executor = TransferExecutor::new(settings.request_timeout)?;

        Ok(Self {
            registrar: UploadRegistrar::new(client.clone()),
            executor,
            submitter: ImportSubmitter::new(client),
        })
    }

    /// Run without progress reporting
    pub async fn run(&self, path: &Path) -> Result<ImportOutcome> {
        self.run_with(path, &NoProgress).await
    }

    /// Run, reporting each transition to `observer`
    pub async fn run_with(
        &self,
        path: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<ImportOutcome> {
        let mut reached = PipelineStage::Start;
        let result = self.execute(path, observer, &mut reached).await;

        if let Err(e) = &result {
            let last = reached;
            advance(&mut reached, PipelineStage::Failed);
            error!(
                file = %path.display(),
                reached = %last,
                error = %e,
                "Import pipeline failed"
            );
            observer.on_event(&PipelineEvent::Failed {
                reached: last,
                error: e,
            });
        }

        result
    }

    async fn execute(
        &self,
        path: &Path,
        observer: &dyn ProgressObserver,
        reached: &mut PipelineStage,
    ) -> Result<ImportOutcome> {
        let descriptor = FileDescriptor::resolve(path).await?;
        advance(reached, PipelineStage::Resolved);
        observer.on_event(&PipelineEvent::Resolved(&descriptor));

        let intent = self.registrar.register(&descriptor).await?;
        advance(reached, PipelineStage::Registered);
        observer.on_event(&PipelineEvent::Registered(&intent));

        self.executor
            .transfer(&intent.id, &intent.contract, &descriptor)
            .await?;
        advance(reached, PipelineStage::Transferred);
        observer.on_event(&PipelineEvent::Transferred {
            upload_id: &intent.id,
        });

        let job = self.submitter.submit(&intent.id).await?;
        advance(reached, PipelineStage::Submitted);
        observer.on_event(&PipelineEvent::Submitted(&job));

        Ok(ImportOutcome {
            descriptor,
            upload_id: intent.id,
            job,
        })
    }
}

fn advance(reached: &mut PipelineStage, next: PipelineStage) {
    info!("Import pipeline: {} → {}", reached, next);
    *reached = next;
}
