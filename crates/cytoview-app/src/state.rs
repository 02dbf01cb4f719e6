// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AnalysisParams, BaselineSummary, FilterParams, FilterSummary, Frequency, PageCursor,
    ResponseAnalysis, Sample, SampleDraft, SampleId, ViewKind, pagination::DEFAULT_PAGE_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Warning,
    Info,
    Success,
}

/// A blocking, titled message the user has to dismiss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub sample_id: SampleId,
    pub display_name: String,
}

impl PendingDelete {
    pub fn title(&self) -> &'static str {
        "Delete Sample"
    }

    pub fn message(&self) -> String {
        format!(
            "Are you sure you want to delete sample \"{}\"? This action cannot be undone.",
            self.display_name
        )
    }
}

/// Which paginated list a cursor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageList {
    General,
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub view: ViewKind,
    pub page_size: usize,
    pub general_page: PageCursor,
    pub filter_page: PageCursor,
    pub samples: Vec<Sample>,
    pub frequencies: Vec<Frequency>,
    pub analysis: Vec<ResponseAnalysis>,
    pub baseline: Option<BaselineSummary>,
    pub filter_summary: Option<FilterSummary>,
    pub filter_samples: Vec<Sample>,
    pub filter_params: FilterParams,
    pub analysis_params: AnalysisParams,
    pub draft: SampleDraft,
    pub loading: bool,
    pub add_dialog_open: bool,
    pub pending_delete: Option<PendingDelete>,
    pub notice: Option<Notice>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: ViewKind::Samples,
            page_size: DEFAULT_PAGE_SIZE,
            general_page: PageCursor::default(),
            filter_page: PageCursor::default(),
            samples: Vec::new(),
            frequencies: Vec::new(),
            analysis: Vec::new(),
            baseline: None,
            filter_summary: None,
            filter_samples: Vec::new(),
            filter_params: FilterParams::default(),
            analysis_params: AnalysisParams::default(),
            draft: SampleDraft::default(),
            loading: false,
            add_dialog_open: false,
            pending_delete: None,
            notice: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SwitchView(ViewKind),
    NextView,
    PrevView,
    NextPage,
    PrevPage,
    JumpToPage(String),
    SetFilterParams(FilterParams),
    SetAnalysisParams(AnalysisParams),
    OpenAddDialog,
    CloseAddDialog,
    SetDraft(SampleDraft),
    RequestDelete(SampleId),
    CancelDelete,
    ShowNotice(Notice),
    DismissNotice,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ViewChanged(ViewKind),
    PageChanged { list: PageList, page: usize },
    FilterParamsChanged(FilterParams),
    AnalysisParamsChanged(AnalysisParams),
    AddDialogChanged(bool),
    DraftChanged,
    DeleteRequested(SampleId),
    DeleteConfirmed(SampleId),
    DeleteCanceled,
    NoticeShown(Notice),
    NoticeDismissed,
    StatusUpdated(String),
    StatusCleared,
    LoadingChanged(bool),
    Busy,
    SamplesLoaded(usize),
    FrequenciesLoaded(usize),
    AnalysisLoaded(usize),
    BaselineLoaded,
    FilterSummaryLoaded,
    FilterSamplesLoaded(usize),
    Uploaded,
    SampleAdded(SampleId),
    SampleDeleted(SampleId),
    DraftReset,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SwitchView(view) => self.switch_view(view),
            AppCommand::NextView => self.rotate_view(1),
            AppCommand::PrevView => self.rotate_view(-1),
            AppCommand::NextPage => {
                let (len, page_size) = (self.active_list_len(), self.page_size);
                let list = self.active_page_list();
                let page = self.cursor_mut(list).next(len, page_size);
                vec![AppEvent::PageChanged { list, page }]
            }
            AppCommand::PrevPage => {
                let (len, page_size) = (self.active_list_len(), self.page_size);
                let list = self.active_page_list();
                let page = self.cursor_mut(list).prev(len, page_size);
                vec![AppEvent::PageChanged { list, page }]
            }
            AppCommand::JumpToPage(raw) => {
                let (len, page_size) = (self.active_list_len(), self.page_size);
                let list = self.active_page_list();
                let page = self.cursor_mut(list).jump(&raw, len, page_size);
                vec![AppEvent::PageChanged { list, page }]
            }
            AppCommand::SetFilterParams(params) => {
                self.filter_params = params;
                vec![AppEvent::FilterParamsChanged(params)]
            }
            AppCommand::SetAnalysisParams(params) => {
                self.analysis_params = params;
                vec![AppEvent::AnalysisParamsChanged(params)]
            }
            AppCommand::OpenAddDialog => {
                self.add_dialog_open = true;
                vec![AppEvent::AddDialogChanged(true)]
            }
            AppCommand::CloseAddDialog => {
                self.add_dialog_open = false;
                vec![AppEvent::AddDialogChanged(false)]
            }
            AppCommand::SetDraft(draft) => {
                self.draft = draft;
                vec![AppEvent::DraftChanged]
            }
            AppCommand::RequestDelete(sample_id) => {
                let display_name = self
                    .samples
                    .iter()
                    .find(|sample| sample.sample_id == sample_id)
                    .map_or_else(
                        || sample_id.to_string(),
                        |sample| sample.sample_id.to_string(),
                    );
                self.pending_delete = Some(PendingDelete {
                    sample_id: sample_id.clone(),
                    display_name,
                });
                vec![AppEvent::DeleteRequested(sample_id)]
            }
            AppCommand::CancelDelete => {
                self.pending_delete = None;
                vec![AppEvent::DeleteCanceled]
            }
            AppCommand::ShowNotice(notice) => {
                self.notice = Some(notice.clone());
                vec![AppEvent::NoticeShown(notice)]
            }
            AppCommand::DismissNotice => {
                self.notice = None;
                vec![AppEvent::NoticeDismissed]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// The cursor that page commands move while `view` is active.
    pub const fn page_list_for(view: ViewKind) -> PageList {
        match view {
            ViewKind::Filter => PageList::Filter,
            _ => PageList::General,
        }
    }

    pub fn active_page_list(&self) -> PageList {
        Self::page_list_for(self.view)
    }

    pub fn cursor(&self, list: PageList) -> PageCursor {
        match list {
            PageList::General => self.general_page,
            PageList::Filter => self.filter_page,
        }
    }

    fn cursor_mut(&mut self, list: PageList) -> &mut PageCursor {
        match list {
            PageList::General => &mut self.general_page,
            PageList::Filter => &mut self.filter_page,
        }
    }

    /// Length of the paginated list shown by the active view, if it has one.
    pub fn active_list_len(&self) -> usize {
        match self.view {
            ViewKind::Samples => self.samples.len(),
            ViewKind::Frequencies => self.frequencies.len(),
            ViewKind::Filter => self.filter_samples.len(),
            ViewKind::Analysis | ViewKind::Baseline => 0,
        }
    }

    pub(crate) fn clamp_cursor(&mut self, list: PageList, len: usize) {
        let page_size = self.page_size;
        self.cursor_mut(list).clamp(len, page_size);
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>) -> AppEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        AppEvent::StatusUpdated(message)
    }

    fn switch_view(&mut self, view: ViewKind) -> Vec<AppEvent> {
        self.view = view;
        // Samples and frequencies share the general cursor.
        if matches!(
            view,
            ViewKind::Samples | ViewKind::Frequencies | ViewKind::Filter
        ) {
            self.clamp_cursor(Self::page_list_for(view), self.active_list_len());
        }
        vec![AppEvent::ViewChanged(view)]
    }

    fn rotate_view(&mut self, delta: isize) -> Vec<AppEvent> {
        let views = ViewKind::ALL;
        let current = views
            .iter()
            .position(|view| *view == self.view)
            .unwrap_or(0) as isize;
        let len = views.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.switch_view(views[next])
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, PageList};
    use crate::{
        AnalysisParams, Condition, FilterParams, Frequency, Sample, SampleId, ViewKind,
        zero_cell_counts,
    };

    fn sample(id: &str) -> Sample {
        Sample {
            sample_id: SampleId::new(id),
            project: "prj1".to_owned(),
            subject: "sbj1".to_owned(),
            condition: None,
            age: None,
            sex: None,
            treatment: None,
            response: None,
            sample_type: "PBMC".to_owned(),
            time_from_treatment_start: 0,
            cell_counts: zero_cell_counts(),
        }
    }

    #[test]
    fn view_rotation_wraps() {
        let mut state = AppState {
            view: ViewKind::Filter,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextView);
        assert_eq!(state.view, ViewKind::Samples);
        assert_eq!(events, vec![AppEvent::ViewChanged(ViewKind::Samples)]);

        state.dispatch(AppCommand::PrevView);
        assert_eq!(state.view, ViewKind::Filter);
    }

    #[test]
    fn page_commands_move_the_active_views_cursor() {
        let mut state = AppState {
            page_size: 2,
            samples: (0..5).map(|index| sample(&format!("s{index}"))).collect(),
            filter_samples: vec![sample("f1")],
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextPage);
        assert_eq!(
            events,
            vec![AppEvent::PageChanged {
                list: PageList::General,
                page: 2
            }]
        );
        state.dispatch(AppCommand::JumpToPage("99".to_owned()));
        assert_eq!(state.general_page.page, 3);

        state.dispatch(AppCommand::SwitchView(ViewKind::Filter));
        state.dispatch(AppCommand::NextPage);
        assert_eq!(state.filter_page.page, 1, "single filtered page");
        assert_eq!(state.general_page.page, 3, "cursors are independent");

        state.dispatch(AppCommand::SwitchView(ViewKind::Samples));
        state.dispatch(AppCommand::JumpToPage("0".to_owned()));
        assert_eq!(state.general_page.page, 1);
    }

    #[test]
    fn switching_view_clamps_the_shared_cursor() {
        let mut state = AppState {
            view: ViewKind::Frequencies,
            page_size: 2,
            samples: (0..4).map(|index| sample(&format!("s{index}"))).collect(),
            frequencies: (0..20)
                .map(|index| Frequency {
                    sample: SampleId::new(format!("s{}", index / 5)),
                    total_count: 100,
                    population: "b_cell".to_owned(),
                    count: 20,
                    percentage: 20.0,
                })
                .collect(),
            ..AppState::default()
        };
        for _ in 0..9 {
            state.dispatch(AppCommand::NextPage);
        }
        assert_eq!(state.general_page.page, 10);

        state.dispatch(AppCommand::SwitchView(ViewKind::Samples));
        assert_eq!(state.general_page.page, 2);

        state.dispatch(AppCommand::PrevPage);
        assert_eq!(state.general_page.page, 1);
    }

    #[test]
    fn delete_request_and_cancel() {
        let mut state = AppState {
            samples: vec![sample("s7")],
            ..AppState::default()
        };

        state.dispatch(AppCommand::RequestDelete(SampleId::new("s7")));
        let pending = state.pending_delete.clone().expect("pending delete");
        assert_eq!(pending.display_name, "s7");
        assert_eq!(
            pending.message(),
            "Are you sure you want to delete sample \"s7\"? This action cannot be undone."
        );

        let events = state.dispatch(AppCommand::CancelDelete);
        assert!(state.pending_delete.is_none());
        assert_eq!(events, vec![AppEvent::DeleteCanceled]);
        assert_eq!(state.samples.len(), 1);
    }

    #[test]
    fn params_and_dialog_updates() {
        let mut state = AppState::default();
        let params = FilterParams {
            condition: Some(Condition::Healthy),
            ..FilterParams::default()
        };
        state.dispatch(AppCommand::SetFilterParams(params));
        assert_eq!(state.filter_params, params);

        let analysis = AnalysisParams {
            treatment: None,
            ..AnalysisParams::default()
        };
        state.dispatch(AppCommand::SetAnalysisParams(analysis));
        assert_eq!(state.analysis_params.treatment, None);

        state.dispatch(AppCommand::OpenAddDialog);
        assert!(state.add_dialog_open);
        state.dispatch(AppCommand::CloseAddDialog);
        assert!(!state.add_dialog_open);
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::SetStatus("ready".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("ready"));
        assert_eq!(events, vec![AppEvent::StatusUpdated("ready".to_owned())]);

        state.dispatch(AppCommand::ClearStatus);
        assert!(state.status_line.is_none());
    }
}
