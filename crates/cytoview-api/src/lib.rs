// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use cytoview_app::{
    AnalysisParams, BaselineSummary, FilterParams, FilterSummary, Frequency, ResponseAnalysis,
    Sample, SampleId, ServerRejection,
};
use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const UPLOAD_FIELD: &str = "file";

/// Blocking client for the sample service.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("server.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if base_url.cannot_be_a_base() {
            bail!("server.base_url {trimmed:?} cannot carry a path");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves path segments under the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn upload_csv(&self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_owned());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .context("build multipart body")?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let url = self.endpoint(&["upload"])?;
        self.send(self.http.post(url).multipart(form), "POST upload")?;
        Ok(())
    }

    pub fn list_samples(&self) -> Result<Vec<Sample>> {
        let url = self.endpoint(&["samples"])?;
        let response = self.send(self.http.get(url), "GET samples")?;
        decode(response, "decode sample list")
    }

    pub fn add_sample(&self, sample: &Sample) -> Result<()> {
        let url = self.endpoint(&["samples"])?;
        self.send(self.http.post(url).json(sample), "POST samples")?;
        Ok(())
    }

    pub fn delete_sample(&self, sample_id: &SampleId) -> Result<()> {
        let url = self.endpoint(&["samples", sample_id.as_str()])?;
        self.send(self.http.delete(url), "DELETE samples")?;
        Ok(())
    }

    pub fn list_frequencies(&self) -> Result<Vec<Frequency>> {
        let url = self.endpoint(&["frequencies"])?;
        let response = self.send(self.http.get(url), "GET frequencies")?;
        decode(response, "decode frequency list")
    }

    pub fn response_analysis(&self, params: &AnalysisParams) -> Result<Vec<ResponseAnalysis>> {
        let url = self.endpoint(&["response-analysis"])?;
        let response = self.send(self.http.post(url).json(params), "POST response-analysis")?;
        decode(response, "decode response analysis")
    }

    pub fn baseline_summary(&self) -> Result<BaselineSummary> {
        let url = self.endpoint(&["baseline-summary"])?;
        let response = self.send(self.http.get(url), "GET baseline-summary")?;
        decode(response, "decode baseline summary")
    }

    pub fn filter_summary(&self, params: &FilterParams) -> Result<FilterSummary> {
        let url = self.endpoint(&["filter-summary"])?;
        let response = self.send(self.http.post(url).json(params), "POST filter-summary")?;
        decode(response, "decode filter summary")
    }

    pub fn filter_samples(&self, params: &FilterParams) -> Result<Vec<Sample>> {
        let url = self.endpoint(&["filter-samples"])?;
        let response = self.send(self.http.post(url).json(params), "POST filter-samples")?;
        decode(response, "decode filtered samples")
    }

    fn send(&self, request: RequestBuilder, label: &str) -> Result<Response> {
        tracing::debug!(request = label, base_url = %self.base_url, "sending request");
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::debug!(request = label, status = status.as_u16(), "request rejected");
            return Err(error_response(status, &body));
        }
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response, what: &'static str) -> Result<T> {
    response.json().context(what)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [server].base_url or start the service ({})",
        base_url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Items(Vec<ValidationItem>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    #[serde(default)]
    msg: String,
}

fn error_response(status: StatusCode, body: &str) -> anyhow::Error {
    ServerRejection::new(status.as_u16(), error_detail(body)).into()
}

/// Pulls a human-readable message out of an error body.
pub fn error_detail(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(detail) = parsed.detail
    {
        return match detail {
            ErrorDetail::Text(text) if !text.trim().is_empty() => Some(text),
            ErrorDetail::Items(items) => {
                let joined = items
                    .into_iter()
                    .map(|item| item.msg)
                    .filter(|msg| !msg.is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }
            ErrorDetail::Text(_) | ErrorDetail::Other(_) => None,
        };
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return Some(trimmed.to_owned());
    }
    None
}
