// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    CellCounts, Choice, Condition, Population, Response, Sample, SampleId, SampleType, Sex,
    TimePoint, Treatment, zero_cell_counts,
};
use std::fmt;

pub const MISSING_FIELDS_TITLE: &str = "Missing Required Fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    SampleId,
    Project,
    Subject,
    Sex,
}

impl RequiredField {
    pub const ALL: [Self; 4] = [Self::SampleId, Self::Project, Self::Subject, Self::Sex];

    pub const fn label(self) -> &'static str {
        match self {
            Self::SampleId => "Sample ID",
            Self::Project => "Project",
            Self::Subject => "Subject",
            Self::Sex => "Sex",
        }
    }
}

/// Every required field left blank in a draft, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields(pub Vec<RequiredField>);

impl MissingFields {
    pub fn title(&self) -> &'static str {
        MISSING_FIELDS_TITLE
    }

    pub fn message(&self) -> String {
        let labels = self
            .0
            .iter()
            .map(|field| field.label())
            .collect::<Vec<_>>()
            .join(", ");
        format!("Please fill in the following required fields: {labels}")
    }
}

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for MissingFields {}

/// Editable state of the add-sample form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDraft {
    pub sample_id: String,
    pub project: String,
    pub subject: String,
    pub age: Option<u32>,
    pub condition: Option<Condition>,
    pub sex: Option<Sex>,
    pub treatment: Option<Treatment>,
    pub response: Option<Response>,
    pub sample_type: SampleType,
    pub time_point: TimePoint,
    pub cell_counts: CellCounts,
}

impl Default for SampleDraft {
    fn default() -> Self {
        Self {
            sample_id: String::new(),
            project: String::new(),
            subject: String::new(),
            age: None,
            condition: None,
            sex: None,
            treatment: None,
            response: None,
            sample_type: SampleType::Pbmc,
            time_point: TimePoint::Day0,
            cell_counts: zero_cell_counts(),
        }
    }
}

impl SampleDraft {
    pub fn is_blank(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::SampleId => self.sample_id.trim().is_empty(),
            RequiredField::Project => self.project.trim().is_empty(),
            RequiredField::Subject => self.subject.trim().is_empty(),
            RequiredField::Sex => self.sex.is_none(),
        }
    }

    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|field| self.is_blank(*field))
            .collect()
    }

    pub fn validate(&self) -> Result<(), MissingFields> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingFields(missing))
        }
    }

    pub fn count_for(&self, population: Population) -> u64 {
        self.cell_counts
            .get(population.as_str())
            .copied()
            .map_or(0, |count| count.max(0) as u64)
    }

    pub fn set_count(&mut self, population: Population, count: u64) {
        self.cell_counts
            .insert(population.as_str().to_owned(), i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Builds the request body. Validation is the caller's job.
    pub fn to_sample(&self) -> Sample {
        Sample {
            sample_id: SampleId::new(self.sample_id.trim()),
            project: self.project.trim().to_owned(),
            subject: self.subject.trim().to_owned(),
            condition: self.condition.map(|value| value.as_str().to_owned()),
            age: self.age.map(i64::from),
            sex: self.sex.map(|value| value.as_str().to_owned()),
            treatment: self.treatment.map(|value| value.as_str().to_owned()),
            response: self.response.map(|value| value.as_str().to_owned()),
            sample_type: self.sample_type.as_str().to_owned(),
            time_from_treatment_start: self.time_point.days(),
            cell_counts: self.cell_counts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MISSING_FIELDS_TITLE, RequiredField, SampleDraft};
    use crate::{Population, Sex, TimePoint};

    #[test]
    fn blank_draft_reports_every_required_field() {
        let error = SampleDraft::default()
            .validate()
            .expect_err("blank draft should fail");
        assert_eq!(error.0, RequiredField::ALL.to_vec());
        assert_eq!(error.title(), MISSING_FIELDS_TITLE);
        assert_eq!(
            error.message(),
            "Please fill in the following required fields: Sample ID, Project, Subject, Sex"
        );
    }

    #[test]
    fn missing_sample_id_is_named() {
        let draft = SampleDraft {
            project: "p1".to_owned(),
            subject: "s1".to_owned(),
            sex: Some(Sex::Female),
            ..SampleDraft::default()
        };
        let error = draft.validate().expect_err("missing id should fail");
        assert_eq!(error.0, vec![RequiredField::SampleId]);
        assert!(error.message().contains("Sample ID"));
    }

    #[test]
    fn whitespace_only_text_counts_as_blank() {
        let draft = SampleDraft {
            sample_id: "   ".to_owned(),
            project: "prj1".to_owned(),
            subject: "\t".to_owned(),
            sex: Some(Sex::Male),
            ..SampleDraft::default()
        };
        assert_eq!(
            draft.missing_fields(),
            vec![RequiredField::SampleId, RequiredField::Subject]
        );
    }

    #[test]
    fn to_sample_trims_and_omits_unset_options() {
        let mut draft = SampleDraft {
            sample_id: " s9 ".to_owned(),
            project: "prj2".to_owned(),
            subject: "sbj9".to_owned(),
            sex: Some(Sex::Male),
            time_point: TimePoint::Day14,
            ..SampleDraft::default()
        };
        draft.set_count(Population::NkCell, 42);

        let sample = draft.to_sample();
        assert_eq!(sample.sample_id.as_str(), "s9");
        assert_eq!(sample.sex.as_deref(), Some("M"));
        assert_eq!(sample.condition, None);
        assert_eq!(sample.age, None);
        assert_eq!(sample.sample_type, "PBMC");
        assert_eq!(sample.time_from_treatment_start, 14);
        assert_eq!(sample.count_for(Population::NkCell), 42);
        assert_eq!(sample.cell_counts.len(), 5);
    }
}
