// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use cytoview_api::Client;
use cytoview_app::{
    AnalysisParams, BaselineSummary, FilterParams, FilterSummary, Frequency, ResponseAnalysis,
    Sample, SampleBackend, SampleId,
};
use std::path::Path;

/// Serves the controller from the HTTP service.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl SampleBackend for ApiRuntime {
    fn upload_csv(&mut self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "uploading csv");
        self.client.upload_csv(path)
    }

    fn list_samples(&mut self) -> Result<Vec<Sample>> {
        self.client.list_samples()
    }

    fn add_sample(&mut self, sample: &Sample) -> Result<()> {
        tracing::info!(sample_id = sample.sample_id.as_str(), "adding sample");
        self.client.add_sample(sample)
    }

    fn delete_sample(&mut self, sample_id: &SampleId) -> Result<()> {
        tracing::info!(sample_id = sample_id.as_str(), "deleting sample");
        self.client.delete_sample(sample_id)
    }

    fn list_frequencies(&mut self) -> Result<Vec<Frequency>> {
        self.client.list_frequencies()
    }

    fn response_analysis(&mut self, params: &AnalysisParams) -> Result<Vec<ResponseAnalysis>> {
        self.client.response_analysis(params)
    }

    fn baseline_summary(&mut self) -> Result<BaselineSummary> {
        self.client.baseline_summary()
    }

    fn filter_summary(&mut self, params: &FilterParams) -> Result<FilterSummary> {
        self.client.filter_summary(params)
    }

    fn filter_samples(&mut self, params: &FilterParams) -> Result<Vec<Sample>> {
        self.client.filter_samples(params)
    }
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::{Result, anyhow};
    use cytoview_api::Client;
    use cytoview_app::{Action, AppState, SampleId, ViewKind, perform};
    use cytoview_testkit::{CohortFaker, cohort_summary};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    /// Answers each request in order and reports the request line.
    fn serve(replies: Vec<(u16, String)>) -> Result<(String, mpsc::Receiver<String>)> {
        let server = Server::http("127.0.0.1:0").map_err(|error| anyhow!("bind: {error}"))?;
        let addr = format!("http://{}/api", server.server_addr());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in replies {
                let Ok(request) = server.recv() else {
                    return;
                };
                let _ = tx.send(format!("{} {}", request.method(), request.url()));
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("valid content type header"),
                    );
                let _ = request.respond(response);
            }
        });
        Ok((addr, rx))
    }

    fn runtime(addr: &str) -> Result<ApiRuntime> {
        Ok(ApiRuntime::new(Client::new(addr, Duration::from_secs(2))?))
    }

    #[test]
    fn delete_on_baseline_view_cascades_over_http() -> Result<()> {
        let samples = CohortFaker::new(9).samples(2);
        let summary = cohort_summary(&samples);
        let (addr, seen) = serve(vec![
            (200, r#"{"message":"deleted"}"#.to_owned()),
            (200, serde_json::to_string(&samples)?),
            (200, serde_json::to_string(&summary)?),
        ])?;
        let mut runtime = runtime(&addr)?;
        let mut state = AppState {
            view: ViewKind::Baseline,
            ..AppState::default()
        };

        perform(
            &mut state,
            &mut runtime,
            Action::Delete(SampleId::new("sample00002")),
        );

        assert_eq!(seen.recv()?, "DELETE /api/samples/sample00002");
        assert_eq!(seen.recv()?, "GET /api/samples");
        assert_eq!(seen.recv()?, "GET /api/baseline-summary");
        assert_eq!(state.samples, samples);
        assert_eq!(state.baseline, Some(summary));
        Ok(())
    }

    #[test]
    fn server_rejection_reaches_the_status_line() -> Result<()> {
        let (addr, _seen) = serve(vec![(404, r#"{"detail":"Sample not found"}"#.to_owned())])?;
        let mut runtime = runtime(&addr)?;
        let mut state = AppState::default();

        perform(&mut state, &mut runtime, Action::Delete(SampleId::new("gone")));

        let status = state.status_line.unwrap_or_default();
        assert!(status.contains("Sample not found"), "{status}");
        assert!(state.samples.is_empty());
        Ok(())
    }
}
