// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::path::Path;

use crate::{
    AnalysisParams, BaselineSummary, FilterParams, FilterSummary, Frequency, ResponseAnalysis,
    Sample, SampleId,
};

/// The sample service as seen by the view-state controller.
pub trait SampleBackend {
    fn upload_csv(&mut self, path: &Path) -> Result<()>;
    fn list_samples(&mut self) -> Result<Vec<Sample>>;
    fn add_sample(&mut self, sample: &Sample) -> Result<()>;
    fn delete_sample(&mut self, sample_id: &SampleId) -> Result<()>;
    fn list_frequencies(&mut self) -> Result<Vec<Frequency>>;
    fn response_analysis(&mut self, params: &AnalysisParams) -> Result<Vec<ResponseAnalysis>>;
    fn baseline_summary(&mut self) -> Result<BaselineSummary>;
    fn filter_summary(&mut self, params: &FilterParams) -> Result<FilterSummary>;
    fn filter_samples(&mut self, params: &FilterParams) -> Result<Vec<Sample>>;
}

/// A non-success response from the service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe_rejection(.status, .detail))]
pub struct ServerRejection {
    pub status: u16,
    pub detail: Option<String>,
}

impl ServerRejection {
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// Finds a rejection anywhere in an error chain.
    pub fn find(error: &anyhow::Error) -> Option<&Self> {
        error.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }
}

fn describe_rejection(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("server error ({status}): {detail}"),
        None => format!("server returned {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::ServerRejection;
    use anyhow::Context;

    #[test]
    fn rejection_display_includes_detail() {
        let rejection = ServerRejection::new(400, Some("duplicate sample".to_owned()));
        assert_eq!(rejection.to_string(), "server error (400): duplicate sample");
        assert_eq!(
            ServerRejection::new(502, None).to_string(),
            "server returned 502"
        );
    }

    #[test]
    fn rejection_is_found_through_context() {
        let result: anyhow::Result<()> =
            Err(ServerRejection::new(409, Some("exists".to_owned()))).context("add sample s1");
        let error = result.expect_err("error expected");
        let found = ServerRejection::find(&error).expect("rejection in chain");
        assert_eq!(found.detail.as_deref(), Some("exists"));
    }
}
