//! Delegation boundary for the CAD-exchange and BIM-exchange formats.
//!
//! The export engine never writes those formats itself. It builds one of the
//! request shapes in [`protocol`] and hands it to a [`FormatService`]: either
//! the remote HTTP service or the in-process [`LocalFormatService`].

pub mod error;
pub mod http;
pub mod local;
pub mod progress;
pub mod protocol;

pub use error::DelegateError;
pub use http::{HttpFormatService, ServiceConfig};
pub use local::LocalFormatService;
pub use progress::{poll_progress, PollConfig};
pub use protocol::{
    ArchiveFormat, BatchExportRequest, BatchItem, BatchResponse, BimExportRequest,
    CadExportRequest, DelegateResponse, MeshPayload, ProgressStatus,
};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// A collaborator able to produce the delegated formats. Payloads come back
/// base64-encoded; `success = false` carries the service's own message.
#[allow(async_fn_in_trait)]
pub trait FormatService {
    async fn export_cad(
        &self,
        request: &CadExportRequest,
    ) -> Result<DelegateResponse, DelegateError>;

    async fn export_bim(
        &self,
        request: &BimExportRequest,
    ) -> Result<DelegateResponse, DelegateError>;

    async fn export_batch(
        &self,
        request: &BatchExportRequest,
    ) -> Result<BatchResponse, DelegateError>;

    async fn progress(&self, job_id: &str) -> Result<ProgressStatus, DelegateError>;
}

pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, DelegateError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| DelegateError::Decode(format!("invalid base64 payload: {e}")))
}

impl<T: FormatService + ?Sized> FormatService for &T {
    async fn export_cad(
        &self,
        request: &CadExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        (**self).export_cad(request).await
    }

    async fn export_bim(
        &self,
        request: &BimExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        (**self).export_bim(request).await
    }

    async fn export_batch(
        &self,
        request: &BatchExportRequest,
    ) -> Result<BatchResponse, DelegateError> {
        (**self).export_batch(request).await
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressStatus, DelegateError> {
        (**self).progress(job_id).await
    }
}
