//! cimport library interface
//!
//! Uploads a local contact spreadsheet (`.xlsx` or `.csv`) to the contact
//! service and starts an import job for it:
//!
//! 1. [`FileDescriptor::resolve`] inspects the file
//! 2. [`UploadRegistrar`] registers the upload and receives a presigned
//!    storage contract
//! 3. [`TransferExecutor`] posts the file straight to storage
//! 4. [`ImportSubmitter`] creates the import job
//!
//! [`ImportPipeline`] runs the four steps in order.

pub mod client;
pub mod credentials;
pub mod error;
pub mod file_descriptor;
pub mod jsonapi;
pub mod pipeline;
pub mod registrar;
pub mod settings;
pub mod submitter;
pub mod transfer;

pub use crate::credentials::Credentials;
pub use crate::error::{ImportError, Result};
pub use crate::file_descriptor::{FileDescriptor, MimeType};
pub use crate::pipeline::{
    ImportOutcome, ImportPipeline, NoProgress, PipelineEvent, PipelineStage, ProgressObserver,
};
pub use crate::registrar::{TransferContract, UploadIntent, UploadRegistrar};
pub use crate::settings::{ImportSettings, SettingsOverrides};
pub use crate::submitter::{ImportJob, ImportJobStatus, ImportSubmitter};
pub use crate::transfer::TransferExecutor;
