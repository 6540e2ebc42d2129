use serde::Serialize;

use crate::models::Record;

/// Receiver for the record under focus. The host owns presentation.
pub trait InfoPanelAdapter {
    fn show(&mut self, record: &Record);
    fn clear(&mut self);
}

/// Risk band shown next to the safety score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Secure,
    Moderate,
    HighRisk,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            RiskLevel::Secure
        } else if score > 0.4 {
            RiskLevel::Moderate
        } else {
            RiskLevel::HighRisk
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Secure => "SECURE",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::HighRisk => "HIGH RISK",
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            RiskLevel::Secure => "#7FFF00",
            RiskLevel::Moderate => "#FFFF00",
            RiskLevel::HighRisk => "#FF4500",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub label: String,
    pub count: String,
}

/// Display-ready strings for the info panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub title: String,
    pub code: String,
    pub borough: String,
    pub crime_count: String,
    pub precinct: String,
    pub safety_percent: String,
    pub risk_label: &'static str,
    pub risk_color: &'static str,
    pub breakdown: Vec<BreakdownRow>,
}

impl PanelView {
    pub fn from_record(record: &Record, missing_precinct: &str) -> Self {
        let risk = RiskLevel::from_score(record.safety_score);
        let precinct = if record.precinct == missing_precinct {
            "No Precinct Data".to_string()
        } else {
            format!("Precinct {}", record.precinct)
        };

        Self {
            title: record.neighborhood_name.clone(),
            code: record.code.clone(),
            borough: record.borough_name.clone(),
            crime_count: record.crime_count.to_string(),
            precinct,
            safety_percent: format!("{:.0}%", record.safety_score * 100.0),
            risk_label: risk.label(),
            risk_color: risk.css_color(),
            breakdown: record
                .crime_breakdown
                .iter()
                .map(|tally| BreakdownRow {
                    label: tally.category.to_lowercase(),
                    count: format_count(tally.count),
                })
                .collect(),
        }
    }
}

fn format_count(count: f64) -> String {
    if count.fract() == 0.0 {
        format!("{}", count as i64)
    } else {
        format!("{}", count)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Show(Record),
    Clear,
}

/// Panel that only remembers what it was asked to do.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPanel {
    pub events: Vec<PanelEvent>,
}

#[cfg(test)]
impl RecordingPanel {
    pub fn clear_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PanelEvent::Clear))
            .count()
    }

    pub fn last_shown(&self) -> Option<&Record> {
        self.events.iter().rev().find_map(|e| match e {
            PanelEvent::Show(record) => Some(record),
            PanelEvent::Clear => None,
        })
    }
}

#[cfg(test)]
impl InfoPanelAdapter for RecordingPanel {
    fn show(&mut self, record: &Record) {
        self.events.push(PanelEvent::Show(record.clone()));
    }

    fn clear(&mut self) {
        self.events.push(PanelEvent::Clear);
    }
}
