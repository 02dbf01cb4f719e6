// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ResponseAnalysis;

pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl Significance {
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < SIGNIFICANCE_THRESHOLD {
            Self::Significant
        } else {
            Self::NotSignificant
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Significant => "Significant",
            Self::NotSignificant => "Not Significant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseGroup {
    Responders,
    NonResponders,
}

impl ResponseGroup {
    pub const ALL: [Self; 2] = [Self::Responders, Self::NonResponders];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Responders => "Responders",
            Self::NonResponders => "Non-responders",
        }
    }

    fn values(self, row: &ResponseAnalysis) -> &[f64] {
        match self {
            Self::Responders => &row.responders,
            Self::NonResponders => &row.non_responders,
        }
    }
}

/// One trace of a grouped box plot: `x[i]` is the population of `y[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotSeries {
    pub group: ResponseGroup,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

impl BoxPlotSeries {
    pub fn values_for<'a>(&'a self, population: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.x
            .iter()
            .zip(&self.y)
            .filter(move |(label, _)| label.as_str() == population)
            .map(|(_, value)| *value)
    }
}

pub fn box_plot_series(rows: &[ResponseAnalysis]) -> [BoxPlotSeries; 2] {
    ResponseGroup::ALL.map(|group| {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for row in rows {
            let values = group.values(row);
            x.extend(std::iter::repeat_n(row.population.clone(), values.len()));
            y.extend_from_slice(values);
        }
        BoxPlotSeries { group, x, y }
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl FiveNumberSummary {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted = values
            .into_iter()
            .filter(|value| value.is_finite())
            .collect::<Vec<_>>();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::{FiveNumberSummary, ResponseGroup, Significance, box_plot_series};
    use crate::ResponseAnalysis;

    fn row(population: &str, responders: &[f64], non_responders: &[f64], p: f64) -> ResponseAnalysis {
        ResponseAnalysis {
            population: population.to_owned(),
            responders: responders.to_vec(),
            non_responders: non_responders.to_vec(),
            p_value: p,
        }
    }

    #[test]
    fn significance_threshold_is_strict() {
        assert_eq!(Significance::from_p_value(0.049999), Significance::Significant);
        assert_eq!(Significance::from_p_value(0.05), Significance::NotSignificant);
        assert_eq!(Significance::from_p_value(1.0).label(), "Not Significant");
        assert_eq!(Significance::from_p_value(0.0).label(), "Significant");
    }

    #[test]
    fn box_plot_series_repeats_population_per_value() {
        let rows = vec![
            row("b_cell", &[1.0, 2.0], &[3.0], 0.5),
            row("nk_cell", &[4.0], &[5.0, 6.0, 7.0], 0.01),
        ];
        let [responders, non_responders] = box_plot_series(&rows);

        assert_eq!(responders.group, ResponseGroup::Responders);
        assert_eq!(responders.x, vec!["b_cell", "b_cell", "nk_cell"]);
        assert_eq!(responders.y, vec![1.0, 2.0, 4.0]);

        assert_eq!(non_responders.group.label(), "Non-responders");
        assert_eq!(non_responders.x, vec!["b_cell", "nk_cell", "nk_cell", "nk_cell"]);
        assert_eq!(non_responders.y, vec![3.0, 5.0, 6.0, 7.0]);
        assert_eq!(
            non_responders.values_for("nk_cell").collect::<Vec<_>>(),
            vec![5.0, 6.0, 7.0]
        );
    }

    #[test]
    fn five_number_summary_interpolates_quartiles() {
        let summary = FiveNumberSummary::from_values([4.0, 1.0, 3.0, 2.0, 5.0])
            .expect("non-empty values");
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.max, 5.0);

        let even = FiveNumberSummary::from_values([1.0, 2.0, 3.0, 4.0]).expect("non-empty");
        assert_eq!(even.median, 2.5);
        assert!(FiveNumberSummary::from_values(Vec::new()).is_none());
    }
}
