//! In-process implementation of [`FormatService`] so exports work offline.
//! Payloads are base64-encoded exactly as the remote service returns them.

pub mod cad;
pub mod ifc;

use crate::error::DelegateError;
use crate::protocol::{
    BatchExportRequest, BatchResponse, BimExportRequest, CadExportRequest, DelegateResponse,
    ProgressStatus,
};
use crate::{encode_payload, FormatService};

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFormatService;

impl FormatService for LocalFormatService {
    async fn export_cad(
        &self,
        request: &CadExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        tracing::info!(objects = request.objects.len(), format = "dxf", "exporting locally");
        let bytes = cad::mesh_dxf(request)?;
        Ok(DelegateResponse::ok(encode_payload(&bytes)))
    }

    async fn export_bim(
        &self,
        request: &BimExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        tracing::info!(objects = request.objects.len(), format = "ifc", "exporting locally");
        let text = ifc::mesh_ifc(request);
        Ok(DelegateResponse::ok(encode_payload(text.as_bytes())))
    }

    async fn export_batch(
        &self,
        request: &BatchExportRequest,
    ) -> Result<BatchResponse, DelegateError> {
        tracing::warn!(
            items = request.items.len(),
            "batch archives need the remote export service"
        );
        Ok(BatchResponse::failed(
            "batch archives are only produced by the remote export service",
        ))
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressStatus, DelegateError> {
        Err(DelegateError::Unsupported(format!(
            "local exports run to completion; no job '{job_id}' to poll"
        )))
    }
}
