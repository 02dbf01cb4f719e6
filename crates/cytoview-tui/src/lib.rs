// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use cytoview_app::{
    Action, AnalysisParams, AppCommand, AppEvent, AppState, Choice, CohortSummary, FilterParams,
    FiveNumberSummary, Frequency, Notice, PROJECTS, Page, PendingDelete, Population,
    ResponseAnalysis, Sample, SampleBackend, SampleDraft, Significance, TimePoint,
    ViewKind, box_plot_series, choice_label, cycle_choice, cycle_required, follow_up, paginate,
    perform,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const PROCESSING_LABEL: &str = "Processing…";
const EMPTY_CELL: &str = "-";

const SAMPLE_COLUMNS: [&str; 11] = [
    "Sample ID",
    "Project",
    "Subject",
    "Condition",
    "Treatment",
    "Response",
    "B Cells",
    "CD8 T",
    "CD4 T",
    "NK",
    "Mono",
];
const FILTERED_COLUMNS: [&str; 9] = [
    "Sample ID",
    "Project",
    "Subject",
    "Condition",
    "Age",
    "Sex",
    "Treatment",
    "Response",
    "Time",
];
const FREQUENCY_COLUMNS: [&str; 5] = ["Sample", "Total Count", "Population", "Count", "% of Total"];
const ANALYSIS_COLUMNS: [&str; 5] = [
    "Population",
    "Responders",
    "Non-responders",
    "p-value",
    "Result",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Upload,
    JumpToPage,
}

impl PromptKind {
    const fn title(self) -> &'static str {
        match self {
            Self::Upload => "upload CSV",
            Self::JumpToPage => "go to page",
        }
    }

    const fn hint(self) -> &'static str {
        match self {
            Self::Upload => "path to a .csv file | enter upload | esc cancel",
            Self::JumpToPage => "page number | enter go | esc cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptUiState {
    kind: PromptKind,
    input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    SampleId,
    Project,
    Subject,
    Age,
    Condition,
    Sex,
    Treatment,
    Response,
    SampleType,
    TimePoint,
    Count(Population),
}

const FORM_FIELDS: [FormField; 15] = [
    FormField::SampleId,
    FormField::Project,
    FormField::Subject,
    FormField::Age,
    FormField::Condition,
    FormField::Sex,
    FormField::Treatment,
    FormField::Response,
    FormField::SampleType,
    FormField::TimePoint,
    FormField::Count(Population::BCell),
    FormField::Count(Population::Cd8TCell),
    FormField::Count(Population::Cd4TCell),
    FormField::Count(Population::NkCell),
    FormField::Count(Population::Monocyte),
];

impl FormField {
    const fn label(self) -> &'static str {
        match self {
            Self::SampleId => "Sample ID",
            Self::Project => "Project",
            Self::Subject => "Subject",
            Self::Age => "Age",
            Self::Condition => "Condition",
            Self::Sex => "Sex",
            Self::Treatment => "Treatment",
            Self::Response => "Response",
            Self::SampleType => "Sample Type",
            Self::TimePoint => "Time From Start",
            Self::Count(population) => population_label(population),
        }
    }

    const fn required(self) -> bool {
        matches!(
            self,
            Self::SampleId | Self::Project | Self::Subject | Self::Sex
        )
    }
}

const fn population_label(population: Population) -> &'static str {
    match population {
        Population::BCell => "B Cells",
        Population::Cd8TCell => "CD8 T Cells",
        Population::Cd4TCell => "CD4 T Cells",
        Population::NkCell => "NK Cells",
        Population::Monocyte => "Monocytes",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamField {
    Condition,
    Treatment,
    SampleType,
    TimePoint,
}

const FILTER_FIELDS: [ParamField; 4] = [
    ParamField::Condition,
    ParamField::Treatment,
    ParamField::SampleType,
    ParamField::TimePoint,
];
const ANALYSIS_FIELDS: [ParamField; 3] = [
    ParamField::Condition,
    ParamField::Treatment,
    ParamField::SampleType,
];

impl ParamField {
    const fn label(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Treatment => "treatment",
            Self::SampleType => "sample type",
            Self::TimePoint => "time",
        }
    }
}

const fn param_fields(view: ViewKind) -> &'static [ParamField] {
    match view {
        ViewKind::Filter => &FILTER_FIELDS,
        ViewKind::Analysis => &ANALYSIS_FIELDS,
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    help_visible: bool,
    selected_row: usize,
    form_field: usize,
    param_field: usize,
    prompt: Option<PromptUiState>,
    pending: VecDeque<Action>,
    status_token: u64,
}

pub fn run_app<B: SampleBackend>(state: &mut AppState, backend: &mut B) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    view_data.pending.extend(startup_actions(state.view));
    tracing::info!(view = state.view.as_str(), "terminal ui started");

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        if !view_data.pending.is_empty() {
            run_pending_actions(state, backend, &mut view_data, &internal_tx);
            continue;
        }

        let has_event = match event::poll(POLL_INTERVAL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    tracing::info!("terminal ui stopped");
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn startup_actions(view: ViewKind) -> Vec<Action> {
    let mut actions = vec![Action::LoadSamples];
    actions.extend(Action::on_enter(view));
    actions
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn run_pending_actions<B: SampleBackend + ?Sized>(
    state: &mut AppState,
    backend: &mut B,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    while let Some(action) = view_data.pending.pop_front() {
        let events = perform(state, backend, action);
        apply_events(view_data, internal_tx, &events);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn apply_events(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>, events: &[AppEvent]) {
    for event in events {
        match event {
            AppEvent::ViewChanged(_) => {
                view_data.selected_row = 0;
                view_data.param_field = 0;
            }
            AppEvent::PageChanged { .. } => view_data.selected_row = 0,
            AppEvent::AddDialogChanged(false) => view_data.form_field = 0,
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            _ => {}
        }
    }
}

fn dispatch(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if let Some(action) = follow_up(state, &events) {
        view_data.pending.push_back(action);
    }
    apply_events(view_data, internal_tx, &events);
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(
        state,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if state.notice.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            dispatch(state, view_data, internal_tx, AppCommand::DismissNotice);
        }
        return false;
    }

    if state.pending_delete.is_some() {
        handle_delete_confirm_key(state, view_data, internal_tx, key);
        return false;
    }

    if state.add_dialog_open {
        handle_form_key(state, view_data, internal_tx, key);
        return false;
    }

    if view_data.prompt.is_some() {
        handle_prompt_key(state, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    handle_nav_key(state, view_data, internal_tx, key);
    false
}

fn handle_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Tab => dispatch(state, view_data, internal_tx, AppCommand::NextView),
        KeyCode::BackTab => dispatch(state, view_data, internal_tx, AppCommand::PrevView),
        KeyCode::Char(digit @ '1'..='5') => {
            let index = (digit as usize) - ('1' as usize);
            let view = ViewKind::ALL[index];
            if view != state.view {
                dispatch(state, view_data, internal_tx, AppCommand::SwitchView(view));
            }
        }
        KeyCode::Char('j') | KeyCode::Down => move_selection(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(state, view_data, -1),
        KeyCode::Char('n') | KeyCode::PageDown => {
            if has_page_list(state.view) {
                dispatch(state, view_data, internal_tx, AppCommand::NextPage);
            }
        }
        KeyCode::Char('p') | KeyCode::PageUp => {
            if has_page_list(state.view) {
                dispatch(state, view_data, internal_tx, AppCommand::PrevPage);
            }
        }
        KeyCode::Char('g') => {
            if has_page_list(state.view) {
                view_data.prompt = Some(PromptUiState {
                    kind: PromptKind::JumpToPage,
                    input: String::new(),
                });
            }
        }
        KeyCode::Char('r') => view_data.pending.push_back(Action::RefreshView),
        KeyCode::Char('u') => {
            if state.loading {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    "upload unavailable while a request is running",
                );
            } else {
                view_data.prompt = Some(PromptUiState {
                    kind: PromptKind::Upload,
                    input: String::new(),
                });
            }
        }
        KeyCode::Char('a') => dispatch(state, view_data, internal_tx, AppCommand::OpenAddDialog),
        KeyCode::Char('d') => {
            let selected = if state.view == ViewKind::Samples {
                selected_sample(state, view_data).map(|sample| sample.sample_id.clone())
            } else {
                None
            };
            match selected {
                Some(sample_id) => dispatch(
                    state,
                    view_data,
                    internal_tx,
                    AppCommand::RequestDelete(sample_id),
                ),
                None => emit_status(state, view_data, internal_tx, "no sample selected"),
            }
        }
        KeyCode::Enter => {
            if state.view == ViewKind::Filter {
                view_data.pending.push_back(Action::ApplyFilters);
            }
        }
        KeyCode::Char('h') | KeyCode::Left => move_param_field(state, view_data, -1),
        KeyCode::Char('l') | KeyCode::Right => move_param_field(state, view_data, 1),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char(' ') => {
            cycle_param(state, view_data, internal_tx, 1);
        }
        KeyCode::Char('-') => cycle_param(state, view_data, internal_tx, -1),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
}

fn has_page_list(view: ViewKind) -> bool {
    matches!(
        view,
        ViewKind::Samples | ViewKind::Frequencies | ViewKind::Filter
    )
}

fn active_page_len(state: &AppState) -> usize {
    match state.view {
        ViewKind::Samples => sample_page(state).items.len(),
        ViewKind::Frequencies => frequency_page(state).items.len(),
        ViewKind::Filter => filtered_page(state).items.len(),
        ViewKind::Analysis | ViewKind::Baseline => 0,
    }
}

fn sample_page(state: &AppState) -> Page<'_, Sample> {
    paginate(&state.samples, state.general_page.page, state.page_size)
}

fn frequency_page(state: &AppState) -> Page<'_, Frequency> {
    paginate(&state.frequencies, state.general_page.page, state.page_size)
}

fn filtered_page(state: &AppState) -> Page<'_, Sample> {
    paginate(&state.filter_samples, state.filter_page.page, state.page_size)
}

fn selected_sample<'a>(state: &'a AppState, view_data: &ViewData) -> Option<&'a Sample> {
    sample_page(state).items.get(view_data.selected_row)
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let len = active_page_len(state);
    if len == 0 {
        view_data.selected_row = 0;
        return;
    }
    let next = (view_data.selected_row as isize + delta).clamp(0, len as isize - 1);
    view_data.selected_row = next as usize;
}

fn move_param_field(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let fields = param_fields(state.view);
    if fields.is_empty() {
        return;
    }
    let len = fields.len() as isize;
    view_data.param_field = (view_data.param_field as isize + delta).rem_euclid(len) as usize;
}

fn cycle_param(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let fields = param_fields(state.view);
    let Some(field) = fields.get(view_data.param_field.min(fields.len().saturating_sub(1))) else {
        return;
    };
    match state.view {
        ViewKind::Filter => {
            let mut params = state.filter_params;
            let label = cycle_filter_field(&mut params, *field, delta);
            dispatch(
                state,
                view_data,
                internal_tx,
                AppCommand::SetFilterParams(params),
            );
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{}: {label} (enter to apply)", field.label()),
            );
        }
        ViewKind::Analysis => {
            let mut params = state.analysis_params;
            let label = cycle_analysis_field(&mut params, *field, delta);
            dispatch(
                state,
                view_data,
                internal_tx,
                AppCommand::SetAnalysisParams(params),
            );
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{}: {label}", field.label()),
            );
        }
        _ => {}
    }
}

fn cycle_filter_field(params: &mut FilterParams, field: ParamField, delta: isize) -> &'static str {
    match field {
        ParamField::Condition => {
            params.condition = cycle_choice(params.condition, delta);
            choice_label(params.condition)
        }
        ParamField::Treatment => {
            params.treatment = cycle_choice(params.treatment, delta);
            choice_label(params.treatment)
        }
        ParamField::SampleType => {
            params.sample_type = cycle_choice(params.sample_type, delta);
            choice_label(params.sample_type)
        }
        ParamField::TimePoint => {
            let next = cycle_choice(params.time_point(), delta);
            params.time_from_treatment_start = next.map(TimePoint::days);
            choice_label(next)
        }
    }
}

fn cycle_analysis_field(
    params: &mut AnalysisParams,
    field: ParamField,
    delta: isize,
) -> &'static str {
    match field {
        ParamField::Condition => {
            params.condition = cycle_choice(params.condition, delta);
            choice_label(params.condition)
        }
        ParamField::Treatment => {
            params.treatment = cycle_choice(params.treatment, delta);
            choice_label(params.treatment)
        }
        ParamField::SampleType => {
            params.sample_type = cycle_choice(params.sample_type, delta);
            choice_label(params.sample_type)
        }
        ParamField::TimePoint => "any",
    }
}

fn handle_delete_confirm_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => view_data.pending.push_back(Action::ConfirmDelete),
        KeyCode::Char('n') | KeyCode::Esc => {
            dispatch(state, view_data, internal_tx, AppCommand::CancelDelete);
        }
        _ => {}
    }
}

fn handle_prompt_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.prompt.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => view_data.prompt = None,
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.input.push(ch);
        }
        KeyCode::Enter => {
            let PromptUiState { kind, input } = prompt.clone();
            view_data.prompt = None;
            match kind {
                PromptKind::Upload => {
                    let trimmed = input.trim();
                    if trimmed.is_empty() {
                        emit_status(state, view_data, internal_tx, "no file given");
                    } else {
                        view_data
                            .pending
                            .push_back(Action::Upload(PathBuf::from(trimmed)));
                    }
                }
                PromptKind::JumpToPage => {
                    dispatch(state, view_data, internal_tx, AppCommand::JumpToPage(input));
                }
            }
        }
        _ => {}
    }
}

fn handle_form_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let len = FORM_FIELDS.len();
    let field = FORM_FIELDS[view_data.form_field.min(len - 1)];
    let mut draft = state.draft.clone();
    let changed = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            dispatch(state, view_data, internal_tx, AppCommand::CloseAddDialog);
            return;
        }
        (KeyCode::Char('s'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.pending.push_back(Action::AddDraft);
            return;
        }
        (KeyCode::Enter, _) => {
            view_data.pending.push_back(Action::AddDraft);
            return;
        }
        (KeyCode::Tab | KeyCode::Down, _) => {
            view_data.form_field = (view_data.form_field + 1) % len;
            return;
        }
        (KeyCode::BackTab | KeyCode::Up, _) => {
            view_data.form_field = (view_data.form_field + len - 1) % len;
            return;
        }
        (KeyCode::Left, _) => cycle_form_choice(&mut draft, field, -1),
        (KeyCode::Right, _) => cycle_form_choice(&mut draft, field, 1),
        (KeyCode::Backspace, _) => erase_form_char(&mut draft, field),
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            type_form_char(&mut draft, field, ch)
        }
        _ => false,
    };
    if changed {
        dispatch(state, view_data, internal_tx, AppCommand::SetDraft(draft));
    }
}

fn cycle_form_choice(draft: &mut SampleDraft, field: FormField, delta: isize) -> bool {
    match field {
        FormField::Project => {
            draft.project = cycle_project(&draft.project, delta);
        }
        FormField::Condition => draft.condition = cycle_choice(draft.condition, delta),
        FormField::Sex => draft.sex = cycle_choice(draft.sex, delta),
        FormField::Treatment => draft.treatment = cycle_choice(draft.treatment, delta),
        FormField::Response => draft.response = cycle_choice(draft.response, delta),
        FormField::SampleType => draft.sample_type = cycle_required(draft.sample_type, delta),
        FormField::TimePoint => draft.time_point = cycle_required(draft.time_point, delta),
        FormField::SampleId | FormField::Subject | FormField::Age | FormField::Count(_) => {
            return false;
        }
    }
    true
}

/// Steps through the blank slot followed by the known project codes.
fn cycle_project(current: &str, delta: isize) -> String {
    let slots = PROJECTS.len() as isize + 1;
    let position = PROJECTS
        .iter()
        .position(|project| *project == current)
        .map_or(0, |index| index as isize + 1);
    match (position + delta).rem_euclid(slots) {
        0 => String::new(),
        next => PROJECTS[(next - 1) as usize].to_owned(),
    }
}

fn type_form_char(draft: &mut SampleDraft, field: FormField, ch: char) -> bool {
    match field {
        FormField::SampleId => draft.sample_id.push(ch),
        FormField::Subject => draft.subject.push(ch),
        FormField::Age => {
            let Some(digit) = ch.to_digit(10) else {
                return false;
            };
            let Some(age) = draft
                .age
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|age| age.checked_add(digit))
            else {
                return false;
            };
            draft.age = Some(age);
        }
        FormField::Count(population) => {
            let Some(digit) = ch.to_digit(10) else {
                return false;
            };
            let Some(count) = draft
                .count_for(population)
                .checked_mul(10)
                .and_then(|count| count.checked_add(u64::from(digit)))
            else {
                return false;
            };
            draft.set_count(population, count);
        }
        _ if ch == ' ' => return cycle_form_choice(draft, field, 1),
        _ => return false,
    }
    true
}

fn erase_form_char(draft: &mut SampleDraft, field: FormField) -> bool {
    match field {
        FormField::SampleId => draft.sample_id.pop().is_some(),
        FormField::Subject => draft.subject.pop().is_some(),
        FormField::Project => {
            draft.project.clear();
            true
        }
        FormField::Age => {
            draft.age = draft.age.map(|age| age / 10).filter(|age| *age > 0);
            true
        }
        FormField::Count(population) => {
            let count = draft.count_for(population) / 10;
            draft.set_count(population, count);
            true
        }
        FormField::Condition => draft.condition.take().is_some(),
        FormField::Sex => draft.sex.take().is_some(),
        FormField::Treatment => draft.treatment.take().is_some(),
        FormField::Response => draft.response.take().is_some(),
        FormField::SampleType | FormField::TimePoint => false,
    }
}

fn form_value(draft: &SampleDraft, field: FormField) -> String {
    let unset = || "(none)".to_owned();
    match field {
        FormField::SampleId => draft.sample_id.clone(),
        FormField::Project if draft.project.is_empty() => unset(),
        FormField::Project => draft.project.clone(),
        FormField::Subject => draft.subject.clone(),
        FormField::Age => draft.age.map(|age| age.to_string()).unwrap_or_default(),
        FormField::Condition => draft.condition.map_or_else(unset, |v| v.as_str().to_owned()),
        FormField::Sex => draft.sex.map_or_else(unset, |v| v.as_str().to_owned()),
        FormField::Treatment => draft.treatment.map_or_else(unset, |v| v.as_str().to_owned()),
        FormField::Response => draft.response.map_or_else(unset, |v| v.as_str().to_owned()),
        FormField::SampleType => draft.sample_type.as_str().to_owned(),
        FormField::TimePoint => format!("day {}", draft.time_point.days()),
        FormField::Count(population) => draft.count_for(population).to_string(),
    }
}

fn render_form_text(draft: &SampleDraft, field_index: usize) -> String {
    let mut lines = FORM_FIELDS
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let cursor = if index == field_index { ">" } else { " " };
            let marker = if field.required() { "*" } else { "" };
            format!(
                "{cursor} {}{marker}: {}",
                field.label(),
                form_value(draft, *field)
            )
        })
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push("* required".to_owned());
    lines.push(
        "tab/shift+tab field | left/right choose | type text/digits | enter or ctrl+s save | esc cancel"
            .to_owned(),
    );
    lines.join("\n")
}

fn render_delete_text(pending: &PendingDelete) -> String {
    format!("{}\n\ny delete | n cancel", pending.message())
}

fn render_notice_text(notice: &Notice) -> String {
    format!("{}\n\nenter dismiss", notice.message)
}

fn render_prompt_text(prompt: &PromptUiState) -> String {
    format!("> {}\n\n{}", prompt.input, prompt.kind.hint())
}

fn optional(value: &Option<String>) -> String {
    value.as_deref().unwrap_or(EMPTY_CELL).to_owned()
}

fn sample_row_cells(sample: &Sample) -> Vec<String> {
    let mut cells = vec![
        sample.sample_id.to_string(),
        sample.project.clone(),
        sample.subject.clone(),
        optional(&sample.condition),
        optional(&sample.treatment),
        optional(&sample.response),
    ];
    cells.extend(
        Population::ALL
            .iter()
            .map(|population| sample.count_for(*population).to_string()),
    );
    cells
}

fn filtered_row_cells(sample: &Sample) -> Vec<String> {
    vec![
        sample.sample_id.to_string(),
        sample.project.clone(),
        sample.subject.clone(),
        optional(&sample.condition),
        sample
            .age
            .map_or_else(|| EMPTY_CELL.to_owned(), |age| age.to_string()),
        optional(&sample.sex),
        optional(&sample.treatment),
        optional(&sample.response),
        sample.time_from_treatment_start.to_string(),
    ]
}

fn frequency_row_cells(row: &Frequency) -> Vec<String> {
    vec![
        row.sample.to_string(),
        row.total_count.to_string(),
        row.population.clone(),
        row.count.to_string(),
        format!("{:.2}%", row.percentage),
    ]
}

fn analysis_row_cells(row: &ResponseAnalysis) -> Vec<String> {
    vec![
        row.population.clone(),
        row.responders.len().to_string(),
        row.non_responders.len().to_string(),
        format!("{:.4}", row.p_value),
        Significance::from_p_value(row.p_value).label().to_owned(),
    ]
}

fn render_box_plot_text(rows: &[ResponseAnalysis]) -> String {
    if rows.is_empty() {
        return "no analysis loaded".to_owned();
    }
    let series = box_plot_series(rows);
    let mut lines = Vec::new();
    for row in rows {
        for trace in &series {
            let summary = FiveNumberSummary::from_values(trace.values_for(&row.population));
            let body = match summary {
                Some(summary) => format!(
                    "min {:.2} | q1 {:.2} | median {:.2} | q3 {:.2} | max {:.2}",
                    summary.min, summary.q1, summary.median, summary.q3, summary.max
                ),
                None => "no values".to_owned(),
            };
            lines.push(format!(
                "{:<12} {:<15} {body}",
                row.population,
                trace.group.label()
            ));
        }
    }
    lines.join("\n")
}

fn summary_sections(summary: &CohortSummary) -> [(&'static str, String); 3] {
    let list = |counts: &std::collections::BTreeMap<String, i64>| {
        if counts.is_empty() {
            return "none".to_owned();
        }
        counts
            .iter()
            .map(|(label, count)| format!("{label}: {count}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    [
        ("Samples by Project", list(&summary.samples_by_project)),
        ("Subjects by Response", list(&summary.subjects_by_response)),
        ("Subjects by Sex", list(&summary.subjects_by_sex)),
    ]
}

fn render_params_text(state: &AppState, field_index: usize) -> String {
    let values = match state.view {
        ViewKind::Filter => FILTER_FIELDS
            .iter()
            .map(|field| filter_value(&state.filter_params, *field))
            .collect::<Vec<_>>(),
        ViewKind::Analysis => ANALYSIS_FIELDS
            .iter()
            .map(|field| analysis_value(&state.analysis_params, *field))
            .collect::<Vec<_>>(),
        _ => return String::new(),
    };
    let fields = param_fields(state.view);
    fields
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (field, value))| {
            if index == field_index {
                format!("{}: [{value}]", field.label())
            } else {
                format!("{}: {value}", field.label())
            }
        })
        .collect::<Vec<_>>()
        .join("   ")
}

fn filter_value(params: &FilterParams, field: ParamField) -> &'static str {
    match field {
        ParamField::Condition => choice_label(params.condition),
        ParamField::Treatment => choice_label(params.treatment),
        ParamField::SampleType => choice_label(params.sample_type),
        ParamField::TimePoint => choice_label(params.time_point()),
    }
}

fn analysis_value(params: &AnalysisParams, field: ParamField) -> &'static str {
    match field {
        ParamField::Condition => choice_label(params.condition),
        ParamField::Treatment => choice_label(params.treatment),
        ParamField::SampleType => choice_label(params.sample_type),
        ParamField::TimePoint => "any",
    }
}

fn page_title<T>(label: &str, page: &Page<'_, T>, total: usize) -> String {
    format!(
        "{label} | page {}/{} | {total} rows",
        page.page, page.total_pages
    )
}

fn view_hints(view: ViewKind) -> &'static str {
    match view {
        ViewKind::Samples => "j/k row | n/p page | g go to | d delete | u upload | r refresh",
        ViewKind::Frequencies => "j/k row | n/p page | g go to | u upload | r refresh",
        ViewKind::Analysis => "h/l param | +/- change | u upload | r refresh",
        ViewKind::Baseline => "u upload | r refresh",
        ViewKind::Filter => "h/l param | +/- change | enter apply | n/p page | g go to | r refresh",
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mut parts = vec![state.view.as_str().to_uppercase()];
    if state.loading || !view_data.pending.is_empty() {
        parts.push(PROCESSING_LABEL.to_owned());
    }
    if let Some(status) = &state.status_line {
        parts.push(status.clone());
    }
    parts.push(view_hints(state.view).to_owned());
    parts.push("a add | tab view | ? help | ctrl+q quit".to_owned());
    parts.join(" | ")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | tab/shift+tab or 1-5 switch view | ? help\n\
tables: j/k row | n/p or pgdn/pgup page | g go to page\n\
data: r refresh view | u upload csv | a add sample\n\
samples: d delete selected\n\
filter/analysis: h/l param | +/- or space change value | enter apply filters\n\
form: tab/shift+tab field | left/right choose | type text or digits | enter or ctrl+s save | esc cancel\n\
confirm: y delete | n cancel\n\
notice: enter dismiss"
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = ViewKind::ALL
        .iter()
        .position(|view| *view == state.view)
        .unwrap_or(0);
    let titles = ViewKind::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| format!("{} {}", index + 1, view.title()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("cytoview").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.view {
        ViewKind::Samples => render_samples(frame, layout[1], state, view_data),
        ViewKind::Frequencies => render_frequencies(frame, layout[1], state, view_data),
        ViewKind::Analysis => render_analysis(frame, layout[1], state, view_data),
        ViewKind::Baseline => render_baseline(frame, layout[1], state),
        ViewKind::Filter => render_filter(frame, layout[1], state, view_data),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if state.add_dialog_open {
        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(render_form_text(&state.draft, view_data.form_field))
            .block(Block::default().title("Add New Sample").borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    if let Some(prompt) = &view_data.prompt {
        let area = centered_rect(60, 20, frame.area());
        frame.render_widget(Clear, area);
        let widget = Paragraph::new(render_prompt_text(prompt))
            .block(Block::default().title(prompt.kind.title()).borders(Borders::ALL));
        frame.render_widget(widget, area);
    }

    if let Some(pending) = &state.pending_delete {
        let area = centered_rect(50, 25, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(render_delete_text(pending))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(pending.title())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(confirm, area);
    }

    if let Some(notice) = &state.notice {
        let area = centered_rect(55, 25, frame.area());
        frame.render_widget(Clear, area);
        let widget = Paragraph::new(render_notice_text(notice))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(notice.title.as_str())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Magenta)),
            );
        frame.render_widget(widget, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_rows(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: String,
    columns: &[&str],
    rows: Vec<Vec<String>>,
    selected: Option<usize>,
) {
    let widths = vec![Constraint::Min(6); columns.len().max(1)];
    let header = Row::new(columns.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let body = rows.into_iter().enumerate().map(|(index, cells)| {
        let style = if selected == Some(index) {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(cells.into_iter().map(Cell::from)).style(style)
    });
    let table = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn clamp_selection(selected: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| selected.min(len - 1))
}

fn render_samples(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let page = sample_page(state);
    let title = page_title(state.view.title(), &page, state.samples.len());
    let rows = page.items.iter().map(sample_row_cells).collect::<Vec<_>>();
    let selected = clamp_selection(view_data.selected_row, rows.len());
    render_rows(frame, area, title, &SAMPLE_COLUMNS, rows, selected);
}

fn render_frequencies(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let page = frequency_page(state);
    let title = page_title(state.view.title(), &page, state.frequencies.len());
    let rows = page.items.iter().map(frequency_row_cells).collect::<Vec<_>>();
    let selected = clamp_selection(view_data.selected_row, rows.len());
    render_rows(frame, area, title, &FREQUENCY_COLUMNS, rows, selected);
}

fn render_params(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let params = Paragraph::new(render_params_text(state, view_data.param_field))
        .block(Block::default().title("parameters").borders(Borders::ALL));
    frame.render_widget(params, area);
}

fn render_analysis(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let table_height = u16::try_from(state.analysis.len())
        .unwrap_or(u16::MAX)
        .saturating_add(3)
        .min(12);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(table_height),
            Constraint::Min(3),
        ])
        .split(area);

    render_params(frame, layout[0], state, view_data);
    let rows = state.analysis.iter().map(analysis_row_cells).collect();
    render_rows(
        frame,
        layout[1],
        format!("{}: {}", state.view.title(), state.view.description()),
        &ANALYSIS_COLUMNS,
        rows,
        None,
    );
    let plot = Paragraph::new(render_box_plot_text(&state.analysis)).block(
        Block::default()
            .title("frequency distribution (%)")
            .borders(Borders::ALL),
    );
    frame.render_widget(plot, layout[2]);
}

fn render_summary(frame: &mut ratatui::Frame<'_>, area: Rect, summary: Option<&CohortSummary>) {
    let Some(summary) = summary else {
        let empty = Paragraph::new("no summary loaded")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);
    for (column, (title, body)) in columns.iter().zip(summary_sections(summary)) {
        let section =
            Paragraph::new(body).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(section, *column);
    }
}

fn render_baseline(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);
    let header = Paragraph::new(state.view.description())
        .block(Block::default().title(state.view.title()).borders(Borders::ALL));
    frame.render_widget(header, layout[0]);
    render_summary(frame, layout[1], state.baseline.as_ref());
}

fn render_filter(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(3),
        ])
        .split(area);

    render_params(frame, layout[0], state, view_data);
    render_summary(frame, layout[1], state.filter_summary.as_ref());

    let page = filtered_page(state);
    let title = page_title("Filtered Samples", &page, state.filter_samples.len());
    let rows = page.items.iter().map(filtered_row_cells).collect::<Vec<_>>();
    let selected = clamp_selection(view_data.selected_row, rows.len());
    render_rows(frame, layout[2], title, &FILTERED_COLUMNS, rows, selected);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
