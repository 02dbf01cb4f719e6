// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use cytoview_app::{
    AnalysisParams, BaselineSummary, Choice, CohortSummary, Condition, FilterParams,
    FilterSummary, Frequency, PROJECTS, Population, Response, ResponseAnalysis, Sample,
    SampleBackend, SampleId, SampleType, ServerRejection, Sex, TimePoint, Treatment,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "project,subject,condition,age,sex,treatment,response,sample,sample_type,time_from_treatment_start,b_cell,cd8_t_cell,cd4_t_cell,nk_cell,monocyte";

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn range(&mut self, low: i64, high: i64) -> i64 {
        let span = (high - low + 1).max(1) as usize;
        low + self.int_n(span) as i64
    }

    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// Deterministic cohort data for tests and demos.
#[derive(Debug, Clone)]
pub struct CohortFaker {
    rng: DeterministicRng,
}

impl CohortFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    fn pick<T: Copy>(&mut self, values: &[T]) -> T {
        values[self.rng.int_n(values.len())]
    }

    pub fn sample(&mut self, index: usize) -> Sample {
        let condition = self.pick(Condition::ALL);
        let treatment = match condition {
            Condition::Healthy => None,
            _ => Some(self.pick(Treatment::ALL)),
        };
        let response = treatment.map(|_| self.pick(Response::ALL));
        let cell_counts = Population::ALL
            .iter()
            .map(|population| {
                (
                    population.as_str().to_owned(),
                    self.rng.range(500, 60_000),
                )
            })
            .collect();
        Sample {
            sample_id: SampleId::new(format!("sample{index:05}")),
            project: self.pick(&PROJECTS).to_owned(),
            subject: format!("sbj{:03}", index / 3),
            condition: Some(condition.as_str().to_owned()),
            age: Some(self.rng.range(25, 85)),
            sex: Some(self.pick(Sex::ALL).as_str().to_owned()),
            treatment: treatment.map(|value| value.as_str().to_owned()),
            response: response.map(|value| value.as_str().to_owned()),
            sample_type: self.pick(SampleType::ALL).as_str().to_owned(),
            time_from_treatment_start: self.pick(TimePoint::ALL).days(),
            cell_counts,
        }
    }

    pub fn samples(&mut self, count: usize) -> Vec<Sample> {
        (0..count).map(|index| self.sample(index)).collect()
    }

    pub fn analysis_row(&mut self, population: Population) -> ResponseAnalysis {
        let responders = (0..self.rng.range(3, 8))
            .map(|_| round2(self.rng.unit() * 60.0))
            .collect();
        let non_responders = (0..self.rng.range(3, 8))
            .map(|_| round2(self.rng.unit() * 60.0))
            .collect();
        ResponseAnalysis {
            population: population.as_str().to_owned(),
            responders,
            non_responders,
            p_value: self.rng.unit(),
        }
    }

    pub fn analysis(&mut self) -> Vec<ResponseAnalysis> {
        Population::ALL
            .iter()
            .map(|population| self.analysis_row(*population))
            .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A minimal sample with zeroed optional fields.
pub fn sample(id: &str) -> Sample {
    Sample {
        sample_id: SampleId::new(id),
        project: "prj1".to_owned(),
        subject: format!("sbj-{id}"),
        condition: None,
        age: None,
        sex: None,
        treatment: None,
        response: None,
        sample_type: SampleType::Pbmc.as_str().to_owned(),
        time_from_treatment_start: 0,
        cell_counts: cytoview_app::zero_cell_counts(),
    }
}

/// One row per sample and population, as the frequency endpoint reports them.
pub fn frequencies_for(samples: &[Sample]) -> Vec<Frequency> {
    samples
        .iter()
        .flat_map(|sample| {
            let total = sample.total_count();
            Population::ALL.iter().map(move |population| {
                let count = sample.count_for(*population);
                let percentage = if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                };
                Frequency {
                    sample: sample.sample_id.clone(),
                    total_count: total,
                    population: population.as_str().to_owned(),
                    count,
                    percentage,
                }
            })
        })
        .collect()
}

pub fn cohort_summary(samples: &[Sample]) -> CohortSummary {
    let mut samples_by_project = BTreeMap::new();
    for sample in samples {
        *samples_by_project.entry(sample.project.clone()).or_insert(0) += 1;
    }

    let mut seen = BTreeSet::new();
    let mut subjects_by_response = BTreeMap::new();
    let mut subjects_by_sex = BTreeMap::new();
    for sample in samples {
        if !seen.insert(sample.subject.as_str()) {
            continue;
        }
        if let Some(response) = &sample.response {
            *subjects_by_response.entry(response.clone()).or_insert(0) += 1;
        }
        if let Some(sex) = &sample.sex {
            *subjects_by_sex.entry(sex.clone()).or_insert(0) += 1;
        }
    }

    CohortSummary {
        samples_by_project,
        subjects_by_response,
        subjects_by_sex,
    }
}

/// Writes a CSV in the upload format into a fresh temp dir.
pub fn temp_csv(samples: &[Sample]) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("cell-count.csv");
    let mut body = String::from(CSV_HEADER);
    body.push('\n');
    for sample in samples {
        let counts = Population::ALL
            .iter()
            .map(|population| sample.count_for(*population).to_string())
            .collect::<Vec<_>>()
            .join(",");
        body.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            sample.project,
            sample.subject,
            sample.condition.as_deref().unwrap_or_default(),
            sample.age.map(|age| age.to_string()).unwrap_or_default(),
            sample.sex.as_deref().unwrap_or_default(),
            sample.treatment.as_deref().unwrap_or("none"),
            sample.response.as_deref().unwrap_or_default(),
            sample.sample_id,
            sample.sample_type,
            sample.time_from_treatment_start,
            counts,
        ));
    }
    std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    UploadCsv,
    ListSamples,
    AddSample,
    DeleteSample,
    ListFrequencies,
    ResponseAnalysis,
    BaselineSummary,
    FilterSummary,
    FilterSamples,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    UploadCsv(PathBuf),
    ListSamples,
    AddSample(Sample),
    DeleteSample(SampleId),
    ListFrequencies,
    ResponseAnalysis(AnalysisParams),
    BaselineSummary,
    FilterSummary(FilterParams),
    FilterSamples(FilterParams),
}

impl BackendCall {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::UploadCsv(_) => Endpoint::UploadCsv,
            Self::ListSamples => Endpoint::ListSamples,
            Self::AddSample(_) => Endpoint::AddSample,
            Self::DeleteSample(_) => Endpoint::DeleteSample,
            Self::ListFrequencies => Endpoint::ListFrequencies,
            Self::ResponseAnalysis(_) => Endpoint::ResponseAnalysis,
            Self::BaselineSummary => Endpoint::BaselineSummary,
            Self::FilterSummary(_) => Endpoint::FilterSummary,
            Self::FilterSamples(_) => Endpoint::FilterSamples,
        }
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Rejection(ServerRejection),
    Transport(String),
}

/// In-memory sample service that records every call it receives.
///
/// Mutations change the stored samples, so reloads after an add or delete
/// see the new list. Derived data (frequencies, summaries) is computed from
/// the stored samples unless a fixed response is set.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub samples: Vec<Sample>,
    pub uploaded: Vec<Sample>,
    pub analysis: Vec<ResponseAnalysis>,
    pub fixed_filter_samples: Option<Vec<Sample>>,
    calls: Vec<BackendCall>,
    failures: HashMap<Endpoint, Failure>,
}

impl RecordingBackend {
    pub fn with_samples(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            ..Self::default()
        }
    }

    pub fn reject(&mut self, endpoint: Endpoint, status: u16, detail: Option<&str>) {
        self.failures.insert(
            endpoint,
            Failure::Rejection(ServerRejection::new(status, detail.map(str::to_owned))),
        );
    }

    pub fn disconnect(&mut self, endpoint: Endpoint, message: &str) {
        self.failures
            .insert(endpoint, Failure::Transport(message.to_owned()));
    }

    pub fn recover(&mut self, endpoint: Endpoint) {
        self.failures.remove(&endpoint);
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.calls.iter().map(BackendCall::endpoint).collect()
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    fn record(&mut self, call: BackendCall) -> Result<()> {
        let endpoint = call.endpoint();
        self.calls.push(call);
        match self.failures.get(&endpoint) {
            None => Ok(()),
            Some(Failure::Rejection(rejection)) => Err(rejection.clone().into()),
            Some(Failure::Transport(message)) => Err(anyhow!("{message}")),
        }
    }

    fn matching(&self, params: &FilterParams) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|sample| matches_filter(sample, params))
            .cloned()
            .collect()
    }
}

pub fn matches_filter(sample: &Sample, params: &FilterParams) -> bool {
    let text_matches = |field: &Option<String>, wanted: Option<&str>| match wanted {
        None => true,
        Some(wanted) => field.as_deref() == Some(wanted),
    };
    text_matches(&sample.condition, params.condition.map(Choice::as_str))
        && text_matches(&sample.treatment, params.treatment.map(Choice::as_str))
        && params
            .sample_type
            .is_none_or(|wanted| sample.sample_type == wanted.as_str())
        && params
            .time_from_treatment_start
            .is_none_or(|days| sample.time_from_treatment_start == days)
}

impl SampleBackend for RecordingBackend {
    fn upload_csv(&mut self, path: &Path) -> Result<()> {
        self.record(BackendCall::UploadCsv(path.to_path_buf()))?;
        let uploaded = std::mem::take(&mut self.uploaded);
        self.samples.extend(uploaded);
        Ok(())
    }

    fn list_samples(&mut self) -> Result<Vec<Sample>> {
        self.record(BackendCall::ListSamples)?;
        Ok(self.samples.clone())
    }

    fn add_sample(&mut self, sample: &Sample) -> Result<()> {
        self.record(BackendCall::AddSample(sample.clone()))?;
        self.samples.push(sample.clone());
        Ok(())
    }

    fn delete_sample(&mut self, sample_id: &SampleId) -> Result<()> {
        self.record(BackendCall::DeleteSample(sample_id.clone()))?;
        let before = self.samples.len();
        self.samples.retain(|sample| &sample.sample_id != sample_id);
        if self.samples.len() == before {
            return Err(ServerRejection::new(404, Some("Sample not found".to_owned())).into());
        }
        Ok(())
    }

    fn list_frequencies(&mut self) -> Result<Vec<Frequency>> {
        self.record(BackendCall::ListFrequencies)?;
        Ok(frequencies_for(&self.samples))
    }

    fn response_analysis(&mut self, params: &AnalysisParams) -> Result<Vec<ResponseAnalysis>> {
        self.record(BackendCall::ResponseAnalysis(*params))?;
        Ok(self.analysis.clone())
    }

    fn baseline_summary(&mut self) -> Result<BaselineSummary> {
        self.record(BackendCall::BaselineSummary)?;
        let baseline = self.matching(&FilterParams {
            condition: Some(Condition::Melanoma),
            treatment: Some(Treatment::Miraclib),
            sample_type: Some(SampleType::Pbmc),
            time_from_treatment_start: Some(0),
        });
        Ok(cohort_summary(&baseline))
    }

    fn filter_summary(&mut self, params: &FilterParams) -> Result<FilterSummary> {
        self.record(BackendCall::FilterSummary(*params))?;
        Ok(cohort_summary(&self.matching(params)))
    }

    fn filter_samples(&mut self, params: &FilterParams) -> Result<Vec<Sample>> {
        self.record(BackendCall::FilterSamples(*params))?;
        Ok(self
            .fixed_filter_samples
            .clone()
            .unwrap_or_else(|| self.matching(params)))
    }
}
