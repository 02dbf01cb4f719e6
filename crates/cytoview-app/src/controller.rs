// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Remote operations against the sample service and the cache refreshes that
//! follow them.
//!
//! Every mutation reloads the full sample cache and then the data behind the
//! active view. Failures land on the status line; caches from earlier loads
//! are left as they were.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::{
    AppEvent, AppState, Notice, PageList, SampleBackend, SampleId, ServerRejection, ViewKind,
};

pub const ADD_FAILURE_TITLE: &str = "Failed to add sample";
const ADD_FAILURE_FALLBACK: &str = "The server rejected the sample.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadSamples,
    LoadFrequencies,
    LoadAnalysis,
    LoadBaseline,
    ApplyFilters,
    RefreshView,
    Upload(PathBuf),
    AddDraft,
    ConfirmDelete,
    Delete(SampleId),
}

impl Action {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LoadSamples => "load samples",
            Self::LoadFrequencies => "load frequencies",
            Self::LoadAnalysis => "load analysis",
            Self::LoadBaseline => "load baseline",
            Self::ApplyFilters => "apply filters",
            Self::RefreshView => "refresh",
            Self::Upload(_) => "upload",
            Self::AddDraft => "add sample",
            Self::ConfirmDelete | Self::Delete(_) => "delete sample",
        }
    }

    /// The load a view needs when it becomes active, if any.
    pub const fn on_enter(view: ViewKind) -> Option<Self> {
        match view {
            ViewKind::Samples => None,
            ViewKind::Frequencies => Some(Self::LoadFrequencies),
            ViewKind::Analysis => Some(Self::LoadAnalysis),
            ViewKind::Baseline => Some(Self::LoadBaseline),
            ViewKind::Filter => Some(Self::ApplyFilters),
        }
    }
}

/// Picks the remote action implied by a batch of reducer events.
pub fn follow_up(state: &AppState, events: &[AppEvent]) -> Option<Action> {
    events.iter().rev().find_map(|event| match event {
        AppEvent::ViewChanged(view) => Action::on_enter(*view),
        AppEvent::AnalysisParamsChanged(_) if state.view == ViewKind::Analysis => {
            Some(Action::LoadAnalysis)
        }
        _ => None,
    })
}

pub fn perform<B>(state: &mut AppState, backend: &mut B, action: Action) -> Vec<AppEvent>
where
    B: SampleBackend + ?Sized,
{
    if state.loading {
        tracing::warn!(action = action.label(), "ignored while another request is running");
        return vec![AppEvent::Busy];
    }

    let mut events = Vec::new();
    let action = match action {
        Action::ConfirmDelete => match state.pending_delete.take() {
            Some(pending) => {
                events.push(AppEvent::DeleteConfirmed(pending.sample_id.clone()));
                Action::Delete(pending.sample_id)
            }
            None => return events,
        },
        Action::AddDraft => match state.draft.validate() {
            Ok(()) => Action::AddDraft,
            Err(missing) => {
                tracing::debug!(fields = missing.0.len(), "add sample blocked by validation");
                let notice = Notice::error(missing.title(), missing.message());
                state.notice = Some(notice.clone());
                events.push(AppEvent::NoticeShown(notice));
                return events;
            }
        },
        other => other,
    };

    let label = action.label();
    tracing::info!(action = label, view = state.view.as_str(), "request started");
    state.loading = true;
    events.push(AppEvent::LoadingChanged(true));

    let outcome = run(state, backend, &action, &mut events);

    state.loading = false;
    events.push(AppEvent::LoadingChanged(false));

    match outcome {
        Ok(()) => {
            tracing::info!(action = label, "request finished");
            if let Some(message) = success_message(&action) {
                events.push(state.set_status(message));
            }
        }
        Err(error) => {
            tracing::warn!(action = label, error = %format!("{error:#}"), "request failed");
            if matches!(action, Action::AddDraft) {
                let notice = Notice::error(ADD_FAILURE_TITLE, add_failure_message(&error));
                state.notice = Some(notice.clone());
                events.push(AppEvent::NoticeShown(notice));
            }
            events.push(state.set_status(format!("{label} failed: {error:#}")));
        }
    }
    events
}

fn run<B>(state: &mut AppState, backend: &mut B, action: &Action, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    match action {
        Action::LoadSamples => load_samples(state, backend, events),
        Action::LoadFrequencies => load_frequencies(state, backend, events),
        Action::LoadAnalysis => load_analysis(state, backend, events),
        Action::LoadBaseline => load_baseline(state, backend, events),
        Action::ApplyFilters => apply_filters(state, backend, events),
        Action::RefreshView => refresh_view(state, backend, events),
        Action::Upload(path) => {
            check_upload_path(path)?;
            backend
                .upload_csv(path)
                .with_context(|| format!("upload {}", path.display()))?;
            events.push(AppEvent::Uploaded);
            reload_after_mutation(state, backend, events)
        }
        Action::AddDraft => {
            let sample = state.draft.to_sample();
            backend
                .add_sample(&sample)
                .with_context(|| format!("add sample {}", sample.sample_id))?;
            state.draft = Default::default();
            state.add_dialog_open = false;
            events.push(AppEvent::SampleAdded(sample.sample_id));
            events.push(AppEvent::DraftReset);
            events.push(AppEvent::AddDialogChanged(false));
            reload_after_mutation(state, backend, events)
        }
        Action::Delete(sample_id) => {
            backend
                .delete_sample(sample_id)
                .with_context(|| format!("delete sample {sample_id}"))?;
            events.push(AppEvent::SampleDeleted(sample_id.clone()));
            reload_after_mutation(state, backend, events)
        }
        Action::ConfirmDelete => Ok(()),
    }
}

fn reload_after_mutation<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    load_samples(state, backend, events)?;
    if state.view == ViewKind::Samples {
        return Ok(());
    }
    refresh_view(state, backend, events)
}

fn refresh_view<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    match state.view {
        ViewKind::Samples => load_samples(state, backend, events),
        ViewKind::Frequencies => load_frequencies(state, backend, events),
        ViewKind::Analysis => load_analysis(state, backend, events),
        ViewKind::Baseline => load_baseline(state, backend, events),
        ViewKind::Filter => apply_filters(state, backend, events),
    }
}

fn load_samples<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    let samples = backend.list_samples().context("list samples")?;
    let count = samples.len();
    state.samples = samples;
    if state.view == ViewKind::Samples {
        state.clamp_cursor(PageList::General, count);
    }
    events.push(AppEvent::SamplesLoaded(count));
    Ok(())
}

fn load_frequencies<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    let frequencies = backend.list_frequencies().context("list frequencies")?;
    let count = frequencies.len();
    state.frequencies = frequencies;
    if state.view == ViewKind::Frequencies {
        state.clamp_cursor(PageList::General, count);
    }
    events.push(AppEvent::FrequenciesLoaded(count));
    Ok(())
}

fn load_analysis<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    let params = state.analysis_params;
    let rows = backend
        .response_analysis(&params)
        .context("response analysis")?;
    let count = rows.len();
    state.analysis = rows;
    events.push(AppEvent::AnalysisLoaded(count));
    Ok(())
}

fn load_baseline<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    let summary = backend.baseline_summary().context("baseline summary")?;
    state.baseline = Some(summary);
    events.push(AppEvent::BaselineLoaded);
    Ok(())
}

/// Fetches the summary and the matching samples for the current filter.
/// Both caches update only when both requests succeed.
fn apply_filters<B>(state: &mut AppState, backend: &mut B, events: &mut Vec<AppEvent>) -> Result<()>
where
    B: SampleBackend + ?Sized,
{
    let params = state.filter_params;
    let summary = backend.filter_summary(&params).context("filter summary")?;
    let samples = backend.filter_samples(&params).context("filter samples")?;
    let count = samples.len();
    state.filter_summary = Some(summary);
    state.filter_samples = samples;
    state.clamp_cursor(PageList::Filter, count);
    events.push(AppEvent::FilterSummaryLoaded);
    events.push(AppEvent::FilterSamplesLoaded(count));
    Ok(())
}

fn check_upload_path(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        bail!("{} is not a .csv file", path.display());
    }
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("read {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    Ok(())
}

fn success_message(action: &Action) -> Option<String> {
    match action {
        Action::Upload(path) => Some(format!("uploaded {}", path.display())),
        Action::AddDraft => Some("sample added".to_owned()),
        Action::Delete(sample_id) => Some(format!("deleted sample {sample_id}")),
        _ => None,
    }
}

/// The server's own wording when it sent any, otherwise a generic line.
pub fn add_failure_message(error: &anyhow::Error) -> String {
    match ServerRejection::find(error) {
        Some(ServerRejection {
            detail: Some(detail),
            ..
        }) => detail.clone(),
        Some(_) => ADD_FAILURE_FALLBACK.to_owned(),
        None => format!("{error:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{ADD_FAILURE_FALLBACK, Action, add_failure_message, check_upload_path, follow_up};
    use crate::{AnalysisParams, AppEvent, AppState, ServerRejection, ViewKind};
    use anyhow::anyhow;

    #[test]
    fn entering_a_view_picks_its_load() {
        let state = AppState::default();
        assert_eq!(
            follow_up(&state, &[AppEvent::ViewChanged(ViewKind::Filter)]),
            Some(Action::ApplyFilters)
        );
        assert_eq!(
            follow_up(&state, &[AppEvent::ViewChanged(ViewKind::Samples)]),
            None
        );
    }

    #[test]
    fn analysis_params_reload_only_on_the_analysis_view() {
        let event = AppEvent::AnalysisParamsChanged(AnalysisParams::default());
        let mut state = AppState::default();
        assert_eq!(follow_up(&state, std::slice::from_ref(&event)), None);

        state.view = ViewKind::Analysis;
        assert_eq!(follow_up(&state, &[event]), Some(Action::LoadAnalysis));
    }

    #[test]
    fn add_failure_message_prefers_server_detail() {
        let error = anyhow::Error::new(ServerRejection::new(
            400,
            Some("Sample s1 already exists".to_owned()),
        ))
        .context("add sample s1");
        assert_eq!(add_failure_message(&error), "Sample s1 already exists");

        let bare = anyhow::Error::new(ServerRejection::new(500, None));
        assert_eq!(add_failure_message(&bare), ADD_FAILURE_FALLBACK);

        let transport = anyhow!("connection refused");
        assert_eq!(add_failure_message(&transport), "connection refused");
    }

    #[test]
    fn upload_requires_an_existing_csv() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path();
        let csv = dir.join("cells.csv");
        std::fs::write(&csv, "sample,b_cell\n")?;
        let txt = dir.join("cells.txt");
        std::fs::write(&txt, "x")?;

        assert!(check_upload_path(&csv).is_ok());
        let error = check_upload_path(&txt).expect_err("wrong extension");
        assert!(error.to_string().contains("not a .csv file"));
        assert!(check_upload_path(&dir.join("missing.csv")).is_err());
        Ok(())
    }
}
