// Device health domain model
use serde::{Deserialize, Serialize};

/// Category whose health pair counts passengers instead of devices
pub const OCCUPANCY_CATEGORY: &str = "occupancy";

/// One configured device category and its (healthy, faulty) count pair
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCategory {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "healthy")]
    pub healthy_count: i64,
    #[serde(rename = "faulty")]
    pub faulty_count: i64,
}

impl DeviceCategory {
    pub fn new(name: impl Into<String>, healthy_count: i64, faulty_count: i64) -> Self {
        Self {
            name: name.into(),
            title: None,
            healthy_count,
            faulty_count,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    Active,
    Inactive,
    Present,
    Absent,
}

/// Two-label vocabulary used for a category's health pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelVocabulary {
    Presence,
    Activity,
}

impl LabelVocabulary {
    pub fn for_category(name: &str) -> Self {
        if name == OCCUPANCY_CATEGORY {
            LabelVocabulary::Presence
        } else {
            LabelVocabulary::Activity
        }
    }

    /// (healthy label, faulty label)
    pub fn labels(self) -> (StatusLabel, StatusLabel) {
        match self {
            LabelVocabulary::Presence => (StatusLabel::Present, StatusLabel::Absent),
            LabelVocabulary::Activity => (StatusLabel::Active, StatusLabel::Inactive),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub label: StatusLabel,
    pub value: u64,
}

/// Ordered [healthy, faulty] pair ready for a two-slice proportion chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusDisplayRecord {
    entries: [StatusEntry; 2],
}

impl StatusDisplayRecord {
    pub fn entries(&self) -> &[StatusEntry; 2] {
        &self.entries
    }

    pub fn healthy(&self) -> StatusEntry {
        self.entries[0]
    }

    pub fn faulty(&self) -> StatusEntry {
        self.entries[1]
    }
}

/// Faulty/absent count surfaced as a standalone alert metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultHighlight {
    pub label: StatusLabel,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceCard {
    pub name: String,
    pub title: String,
    pub entries: StatusDisplayRecord,
    pub fault: FaultHighlight,
    pub fault_ratio: f64,
}

pub fn summarize(category: &DeviceCategory) -> StatusDisplayRecord {
    let (healthy_label, faulty_label) = LabelVocabulary::for_category(&category.name).labels();
    let healthy = clamp_count(&category.name, "healthy", category.healthy_count);
    let faulty = clamp_count(&category.name, "faulty", category.faulty_count);

    StatusDisplayRecord {
        entries: [
            StatusEntry {
                label: healthy_label,
                value: healthy,
            },
            StatusEntry {
                label: faulty_label,
                value: faulty,
            },
        ],
    }
}

pub fn fault_highlight(record: &StatusDisplayRecord) -> FaultHighlight {
    let faulty = record.faulty();
    FaultHighlight {
        label: faulty.label,
        value: faulty.value,
    }
}

pub fn device_card(category: &DeviceCategory) -> DeviceCard {
    let entries = summarize(category);
    let healthy = entries.healthy().value;
    let faulty = entries.faulty().value;
    let observed = healthy + faulty;
    let fault_ratio = if observed == 0 {
        0.0
    } else {
        faulty as f64 / observed as f64
    };

    DeviceCard {
        name: category.name.clone(),
        title: category.display_title().to_string(),
        entries,
        fault: fault_highlight(&entries),
        fault_ratio,
    }
}

fn clamp_count(category: &str, kind: &str, value: i64) -> u64 {
    if value < 0 {
        tracing::warn!(
            category = category,
            kind = kind,
            value = value,
            "Negative device count clamped to zero"
        );
        0
    } else {
        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_uses_presence_labels() {
        let record = summarize(&DeviceCategory::new("occupancy", 20, 5));

        assert_eq!(
            record.entries(),
            &[
                StatusEntry {
                    label: StatusLabel::Present,
                    value: 20
                },
                StatusEntry {
                    label: StatusLabel::Absent,
                    value: 5
                },
            ]
        );

        let highlight = fault_highlight(&record);
        assert_eq!(highlight.value, 5);
        assert_eq!(highlight.label, StatusLabel::Absent);
    }

    #[test]
    fn test_other_categories_use_activity_labels() {
        for name in ["smart_screen", "lte_router", "Occupancy", "occupancy_camera"] {
            let record = summarize(&DeviceCategory::new(name, 1200, 34));
            assert_eq!(record.healthy().label, StatusLabel::Active, "{name}");
            assert_eq!(record.faulty().label, StatusLabel::Inactive, "{name}");
        }
    }

    #[test]
    fn test_values_keep_order_regardless_of_vocabulary() {
        for (name, h, f) in [("occupancy", 0, 7), ("led_lighting", 900, 100), ("x", 0, 0)] {
            let record = summarize(&DeviceCategory::new(name, h, f));
            assert_eq!(record.entries().len(), 2);
            assert_eq!(record.healthy().value, h as u64);
            assert_eq!(record.faulty().value, f as u64);
        }
    }

    #[test]
    fn test_negative_counts_are_clamped() {
        let record = summarize(&DeviceCategory::new("air_quality_display", -3, -1));
        assert_eq!(record.healthy().value, 0);
        assert_eq!(record.faulty().value, 0);
    }

    #[test]
    fn test_device_card() {
        let card = device_card(&DeviceCategory::new("lte_router", 950, 50).with_title("LTE 라우터 동작 상태"));
        assert_eq!(card.title, "LTE 라우터 동작 상태");
        assert_eq!(card.fault.value, 50);
        assert_eq!(card.fault.label, StatusLabel::Inactive);
        assert!((card.fault_ratio - 0.05).abs() < f64::EPSILON);

        let idle = device_card(&DeviceCategory::new("spare", 0, 0));
        assert_eq!(idle.title, "spare");
        assert_eq!(idle.fault_ratio, 0.0);
    }

    #[test]
    fn test_record_serializes_as_pair() {
        let record = summarize(&DeviceCategory::new("occupancy", 20, 5));
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "label": "present", "value": 20 },
                { "label": "absent", "value": 5 }
            ])
        );
    }
}
