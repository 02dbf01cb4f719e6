// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::*;

/// A closed set of values offered by a picker in the UI.
pub trait Choice: Copy + PartialEq + Sized + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.as_str() == value)
    }
}

/// Steps through `None` followed by every value of `T`, wrapping at both ends.
pub fn cycle_choice<T: Choice>(current: Option<T>, delta: isize) -> Option<T> {
    let slots = T::ALL.len() as isize + 1;
    let position = match current {
        None => 0,
        Some(value) => T::ALL
            .iter()
            .position(|choice| *choice == value)
            .map_or(0, |index| index as isize + 1),
    };
    let next = (position + delta).rem_euclid(slots);
    if next == 0 {
        None
    } else {
        Some(T::ALL[(next - 1) as usize])
    }
}

/// Steps through the values of `T` only; used for pickers without an "any" slot.
pub fn cycle_required<T: Choice>(current: T, delta: isize) -> T {
    let len = T::ALL.len() as isize;
    let position = T::ALL
        .iter()
        .position(|choice| *choice == current)
        .unwrap_or(0) as isize;
    T::ALL[(position + delta).rem_euclid(len) as usize]
}

pub fn choice_label<T: Choice>(value: Option<T>) -> &'static str {
    value.map_or("any", Choice::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Samples,
    Frequencies,
    Analysis,
    Baseline,
    Filter,
}

impl ViewKind {
    pub const ALL: [Self; 5] = [
        Self::Samples,
        Self::Frequencies,
        Self::Analysis,
        Self::Baseline,
        Self::Filter,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Samples => "samples",
            Self::Frequencies => "freqs",
            Self::Analysis => "analysis",
            Self::Baseline => "baseline",
            Self::Filter => "filter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "samples" => Some(Self::Samples),
            "freqs" => Some(Self::Frequencies),
            "analysis" => Some(Self::Analysis),
            "baseline" => Some(Self::Baseline),
            "filter" => Some(Self::Filter),
            _ => None,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Samples => "Sample Overview",
            Self::Frequencies => "Population Frequencies",
            Self::Analysis => "Response Analysis",
            Self::Baseline => "Baseline Summary",
            Self::Filter => "Filter & Summarize",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Samples => "Manage and view all cytometry samples",
            Self::Frequencies => "Analyze cell population frequencies",
            Self::Analysis => "Statistical analysis of treatment responses",
            Self::Baseline => "Melanoma PBMC samples at baseline on miraclib",
            Self::Filter => "Filter samples and generate summaries",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Population {
    #[serde(rename = "b_cell")]
    BCell,
    #[serde(rename = "cd8_t_cell")]
    Cd8TCell,
    #[serde(rename = "cd4_t_cell")]
    Cd4TCell,
    #[serde(rename = "nk_cell")]
    NkCell,
    #[serde(rename = "monocyte")]
    Monocyte,
}

impl Choice for Population {
    const ALL: &'static [Self] = &[
        Self::BCell,
        Self::Cd8TCell,
        Self::Cd4TCell,
        Self::NkCell,
        Self::Monocyte,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::BCell => "b_cell",
            Self::Cd8TCell => "cd8_t_cell",
            Self::Cd4TCell => "cd4_t_cell",
            Self::NkCell => "nk_cell",
            Self::Monocyte => "monocyte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Melanoma,
    Carcinoma,
    Healthy,
}

impl Choice for Condition {
    const ALL: &'static [Self] = &[Self::Melanoma, Self::Carcinoma, Self::Healthy];

    fn as_str(self) -> &'static str {
        match self {
            Self::Melanoma => "melanoma",
            Self::Carcinoma => "carcinoma",
            Self::Healthy => "healthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Treatment {
    Miraclib,
    Phauximab,
}

impl Choice for Treatment {
    const ALL: &'static [Self] = &[Self::Miraclib, Self::Phauximab];

    fn as_str(self) -> &'static str {
        match self {
            Self::Miraclib => "miraclib",
            Self::Phauximab => "phauximab",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    #[serde(rename = "PBMC")]
    Pbmc,
    #[serde(rename = "WB")]
    WholeBlood,
}

impl Choice for SampleType {
    const ALL: &'static [Self] = &[Self::Pbmc, Self::WholeBlood];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pbmc => "PBMC",
            Self::WholeBlood => "WB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Choice for Sex {
    const ALL: &'static [Self] = &[Self::Male, Self::Female];

    fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
    No,
}

impl Choice for Response {
    const ALL: &'static [Self] = &[Self::Yes, Self::No];

    fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePoint {
    Day0,
    Day7,
    Day14,
}

impl TimePoint {
    pub const fn days(self) -> i64 {
        match self {
            Self::Day0 => 0,
            Self::Day7 => 7,
            Self::Day14 => 14,
        }
    }

    pub fn from_days(days: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|point| point.days() == days)
    }
}

impl Choice for TimePoint {
    const ALL: &'static [Self] = &[Self::Day0, Self::Day7, Self::Day14];

    fn as_str(self) -> &'static str {
        match self {
            Self::Day0 => "0",
            Self::Day7 => "7",
            Self::Day14 => "14",
        }
    }
}

/// Project codes offered by the add-sample form.
pub const PROJECTS: [&str; 3] = ["prj1", "prj2", "prj3"];

/// Counts keyed by population name. Keys outside `Population` are kept as sent.
pub type CellCounts = BTreeMap<String, i64>;

pub fn zero_cell_counts() -> CellCounts {
    Population::ALL
        .iter()
        .map(|population| (population.as_str().to_owned(), 0))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: SampleId,
    pub project: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub sample_type: String,
    pub time_from_treatment_start: i64,
    #[serde(default)]
    pub cell_counts: CellCounts,
}

impl Sample {
    pub fn count_for(&self, population: Population) -> i64 {
        self.cell_counts
            .get(population.as_str())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_count(&self) -> i64 {
        self.cell_counts.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub sample: SampleId,
    pub total_count: i64,
    pub population: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    pub population: String,
    pub responders: Vec<f64>,
    pub non_responders: Vec<f64>,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<Treatment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<SampleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_from_treatment_start: Option<i64>,
}

impl FilterParams {
    pub fn time_point(&self) -> Option<TimePoint> {
        self.time_from_treatment_start
            .and_then(TimePoint::from_days)
    }
}

/// The filter subset accepted by the response analysis endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<Treatment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<SampleType>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            condition: Some(Condition::Melanoma),
            treatment: Some(Treatment::Miraclib),
            sample_type: Some(SampleType::Pbmc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CohortSummary {
    #[serde(default)]
    pub samples_by_project: BTreeMap<String, i64>,
    #[serde(default)]
    pub subjects_by_response: BTreeMap<String, i64>,
    #[serde(default)]
    pub subjects_by_sex: BTreeMap<String, i64>,
}

pub type FilterSummary = CohortSummary;
pub type BaselineSummary = CohortSummary;
