// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use cytoview_app::{
    Action, AnalysisParams, AppCommand, AppEvent, AppState, Condition, FilterParams,
    MISSING_FIELDS_TITLE, SampleDraft, SampleId, Sex, Treatment, ViewKind, controller::ADD_FAILURE_TITLE,
    follow_up, perform,
};
use cytoview_testkit::{BackendCall, CohortFaker, Endpoint, RecordingBackend, sample, temp_csv};

fn loaded(view: ViewKind, backend: &mut RecordingBackend) -> AppState {
    let mut state = AppState {
        view,
        ..AppState::default()
    };
    perform(&mut state, backend, Action::LoadSamples);
    backend.take_calls();
    state
}

fn complete_draft(state: &mut AppState, id: &str) {
    state.draft.sample_id = id.to_owned();
    state.draft.project = "prj2".to_owned();
    state.draft.subject = "sbj42".to_owned();
    state.draft.sex = Some(Sex::Female);
}

#[test]
fn upload_on_samples_view_reloads_samples_once() -> Result<()> {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1")]);
    backend.uploaded = CohortFaker::new(11).samples(3);
    let mut state = loaded(ViewKind::Samples, &mut backend);
    let (_dir, path) = temp_csv(&backend.uploaded)?;

    let events = perform(&mut state, &mut backend, Action::Upload(path.clone()));

    assert_eq!(
        backend.calls(),
        &[BackendCall::UploadCsv(path), BackendCall::ListSamples]
    );
    assert_eq!(state.samples.len(), 4);
    assert!(events.contains(&AppEvent::Uploaded));
    assert!(!state.loading);
    Ok(())
}

#[test]
fn upload_on_frequency_view_refreshes_frequencies_after_samples() -> Result<()> {
    let mut backend = RecordingBackend::with_samples(CohortFaker::new(2).samples(2));
    let mut state = loaded(ViewKind::Frequencies, &mut backend);
    let (_dir, path) = temp_csv(&[])?;

    perform(&mut state, &mut backend, Action::Upload(path));

    assert_eq!(
        backend.endpoints(),
        vec![
            Endpoint::UploadCsv,
            Endpoint::ListSamples,
            Endpoint::ListFrequencies
        ]
    );
    assert_eq!(state.frequencies.len(), 10);
    Ok(())
}

#[test]
fn upload_on_analysis_view_refetches_analysis_only() -> Result<()> {
    let mut backend = RecordingBackend::default();
    let mut state = loaded(ViewKind::Analysis, &mut backend);
    let params = AnalysisParams {
        condition: Some(Condition::Carcinoma),
        ..AnalysisParams::default()
    };
    state.dispatch(AppCommand::SetAnalysisParams(params));
    let (_dir, path) = temp_csv(&CohortFaker::new(3).samples(4))?;

    perform(&mut state, &mut backend, Action::Upload(path.clone()));

    assert_eq!(
        backend.calls(),
        &[
            BackendCall::UploadCsv(path),
            BackendCall::ListSamples,
            BackendCall::ResponseAnalysis(params),
        ]
    );
    Ok(())
}

#[test]
fn upload_rejects_non_csv_without_calling_the_service() -> Result<()> {
    let mut backend = RecordingBackend::default();
    let mut state = AppState::default();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("counts.xlsx");
    std::fs::write(&path, "not csv")?;

    perform(&mut state, &mut backend, Action::Upload(path));

    assert!(backend.calls().is_empty());
    let status = state.status_line.unwrap_or_default();
    assert!(status.starts_with("upload failed:"), "{status}");
    Ok(())
}

#[test]
fn confirmed_delete_on_filter_view_reapplies_filters() {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1"), sample("s2")]);
    let mut state = loaded(ViewKind::Filter, &mut backend);
    state.filter_params = FilterParams {
        condition: Some(Condition::Melanoma),
        ..FilterParams::default()
    };

    state.dispatch(AppCommand::RequestDelete(SampleId::new("s2")));
    assert!(backend.calls().is_empty(), "requesting only opens the dialog");

    let events = perform(&mut state, &mut backend, Action::ConfirmDelete);

    assert!(state.pending_delete.is_none());
    assert_eq!(
        backend.endpoints(),
        vec![
            Endpoint::DeleteSample,
            Endpoint::ListSamples,
            Endpoint::FilterSummary,
            Endpoint::FilterSamples
        ]
    );
    assert_eq!(
        backend.calls()[2],
        BackendCall::FilterSummary(state.filter_params)
    );
    assert_eq!(state.samples.len(), 1);
    assert!(events.contains(&AppEvent::SampleDeleted(SampleId::new("s2"))));
    assert_eq!(state.status_line.as_deref(), Some("deleted sample s2"));
}

#[test]
fn canceled_delete_leaves_service_untouched() {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1")]);
    let mut state = loaded(ViewKind::Samples, &mut backend);

    state.dispatch(AppCommand::RequestDelete(SampleId::new("s1")));
    state.dispatch(AppCommand::CancelDelete);
    let events = perform(&mut state, &mut backend, Action::ConfirmDelete);

    assert!(events.is_empty());
    assert!(backend.calls().is_empty());
    assert_eq!(state.samples.len(), 1);
}

#[test]
fn delete_on_analysis_view_reloads_analysis_with_current_params() {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1")]);
    backend.analysis = CohortFaker::new(4).analysis();
    let mut state = loaded(ViewKind::Analysis, &mut backend);
    let params = AnalysisParams {
        treatment: Some(Treatment::Phauximab),
        ..AnalysisParams::default()
    };
    state.analysis_params = params;

    perform(&mut state, &mut backend, Action::Delete(SampleId::new("s1")));

    assert_eq!(
        backend.calls(),
        &[
            BackendCall::DeleteSample(SampleId::new("s1")),
            BackendCall::ListSamples,
            BackendCall::ResponseAnalysis(params),
        ]
    );
    assert_eq!(state.analysis.len(), 5);
}

#[test]
fn add_with_missing_fields_never_reaches_the_service() {
    let mut backend = RecordingBackend::default();
    let mut state = AppState::default();
    state.dispatch(AppCommand::OpenAddDialog);
    state.draft.project = "prj1".to_owned();
    state.draft.subject = "sbj1".to_owned();
    state.draft.sex = Some(Sex::Male);

    perform(&mut state, &mut backend, Action::AddDraft);

    assert!(backend.calls().is_empty());
    let notice = state.notice.clone().expect("validation notice");
    assert_eq!(notice.title, MISSING_FIELDS_TITLE);
    assert!(notice.message.contains("Sample ID"), "{}", notice.message);
    assert!(state.add_dialog_open);
    assert!(!state.loading);
}

#[test]
fn add_rejection_shows_server_detail_verbatim() {
    let mut backend = RecordingBackend::default();
    backend.reject(
        Endpoint::AddSample,
        400,
        Some("Sample with ID s9 already exists"),
    );
    let mut state = AppState::default();
    state.dispatch(AppCommand::OpenAddDialog);
    complete_draft(&mut state, "s9");

    perform(&mut state, &mut backend, Action::AddDraft);

    let notice = state.notice.clone().expect("failure notice");
    assert_eq!(notice.title, ADD_FAILURE_TITLE);
    assert_eq!(notice.message, "Sample with ID s9 already exists");
    assert!(state.add_dialog_open, "form stays open for correction");
    assert_eq!(state.draft.sample_id, "s9");
    assert_eq!(backend.endpoints(), vec![Endpoint::AddSample]);
}

#[test]
fn successful_add_resets_the_form_and_reloads() {
    let mut backend = RecordingBackend::default();
    let mut state = loaded(ViewKind::Baseline, &mut backend);
    state.dispatch(AppCommand::OpenAddDialog);
    complete_draft(&mut state, "  s10 ");

    let events = perform(&mut state, &mut backend, Action::AddDraft);

    assert_eq!(
        backend.endpoints(),
        vec![
            Endpoint::AddSample,
            Endpoint::ListSamples,
            Endpoint::BaselineSummary
        ]
    );
    let BackendCall::AddSample(sent) = &backend.calls()[0] else {
        panic!("first call should add the sample");
    };
    assert_eq!(sent.sample_id.as_str(), "s10");
    assert!(!state.add_dialog_open);
    assert_eq!(state.draft, SampleDraft::default());
    assert!(events.contains(&AppEvent::SampleAdded(SampleId::new("s10"))));
    assert_eq!(state.samples.len(), 1);
}

#[test]
fn busy_controller_ignores_new_actions() {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1")]);
    let mut state = AppState {
        loading: true,
        ..AppState::default()
    };

    let events = perform(&mut state, &mut backend, Action::LoadSamples);

    assert_eq!(events, vec![AppEvent::Busy]);
    assert!(backend.calls().is_empty());
    assert!(state.loading);
}

#[test]
fn loading_flag_brackets_every_request() {
    let mut backend = RecordingBackend::default();
    backend.reject(Endpoint::ListFrequencies, 503, None);
    let mut state = AppState::default();

    let events = perform(&mut state, &mut backend, Action::LoadFrequencies);

    assert_eq!(events.first(), Some(&AppEvent::LoadingChanged(true)));
    assert!(events.contains(&AppEvent::LoadingChanged(false)));
    assert!(!state.loading);
}

#[test]
fn failed_reload_keeps_previous_cache() {
    let mut backend = RecordingBackend::with_samples(CohortFaker::new(8).samples(5));
    let mut state = loaded(ViewKind::Samples, &mut backend);
    let before = state.samples.clone();

    backend.disconnect(Endpoint::ListSamples, "connection refused");
    perform(&mut state, &mut backend, Action::LoadSamples);

    assert_eq!(state.samples, before);
    let status = state.status_line.clone().unwrap_or_default();
    assert!(status.contains("connection refused"), "{status}");
    assert!(state.notice.is_none(), "loads report on the status line only");
}

#[test]
fn filter_caches_update_together() {
    let mut backend = RecordingBackend::with_samples(CohortFaker::new(6).samples(12));
    let mut state = loaded(ViewKind::Filter, &mut backend);
    perform(&mut state, &mut backend, Action::ApplyFilters);
    let summary = state.filter_summary.clone();
    let rows = state.filter_samples.clone();
    assert!(summary.is_some());

    state.filter_params.condition = Some(Condition::Healthy);
    backend.reject(Endpoint::FilterSamples, 500, Some("database locked"));
    perform(&mut state, &mut backend, Action::ApplyFilters);

    assert_eq!(state.filter_summary, summary);
    assert_eq!(state.filter_samples, rows);
}

#[test]
fn switching_view_loads_that_views_data() {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1")]);
    let mut state = AppState::default();

    let events = state.dispatch(AppCommand::SwitchView(ViewKind::Baseline));
    let action = follow_up(&state, &events).expect("baseline loads on entry");
    perform(&mut state, &mut backend, action);

    assert_eq!(backend.endpoints(), vec![Endpoint::BaselineSummary]);
    assert!(state.baseline.is_some());
}

#[test]
fn refresh_view_on_samples_reloads_samples_only() {
    let mut backend = RecordingBackend::with_samples(vec![sample("s1")]);
    let mut state = AppState::default();

    perform(&mut state, &mut backend, Action::RefreshView);

    assert_eq!(backend.endpoints(), vec![Endpoint::ListSamples]);
}

#[test]
fn shrinking_list_clamps_general_cursor() {
    let mut backend = RecordingBackend::with_samples(CohortFaker::new(1).samples(6));
    let mut state = AppState {
        page_size: 2,
        ..AppState::default()
    };
    perform(&mut state, &mut backend, Action::LoadSamples);
    state.dispatch(AppCommand::JumpToPage("3".to_owned()));
    assert_eq!(state.general_page.page, 3);

    perform(&mut state, &mut backend, Action::Delete(SampleId::new("sample00005")));
    perform(&mut state, &mut backend, Action::Delete(SampleId::new("sample00004")));

    assert_eq!(state.samples.len(), 4);
    assert_eq!(state.general_page.page, 2);
}
