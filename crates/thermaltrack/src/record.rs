//! Printable maintenance records.
//!
//! A [`MaintenanceRecord`] is a flat, display-ready snapshot of one
//! inspection: who, when, what was found, which images were compared and the
//! numbered list of hotspots.

use std::fmt;

use serde::Serialize;

use crate::dashboard::{Dashboard, InspectionDetail};
use crate::model::Severity;

/// Placeholder for empty optional fields.
const EMPTY: &str = "-";

/// Placeholder for references that do not resolve.
const NOT_AVAILABLE: &str = "N/A";

/// One row of the hotspot table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotRow {
    /// 1-based position in insertion order.
    pub index: usize,
    /// `(x, y)` rounded to one decimal.
    pub location: String,
    /// Radius percentage.
    pub radius: f64,
    /// Severity.
    pub severity: Severity,
    /// Note or `-`.
    pub note: String,
}

/// Display-ready maintenance record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceRecord {
    /// Inspection id.
    pub inspection_id: String,
    /// `"<location> (<number>)"`, or `N/A` if the transformer is gone.
    pub transformer: String,
    /// Inspection date.
    pub date: String,
    /// Inspector.
    pub inspector: String,
    /// Status.
    pub status: String,
    /// Observed condition.
    pub condition: String,
    /// Notes or `-`.
    pub notes: String,
    /// Name of the baseline image, if one is attached.
    pub baseline_image: Option<String>,
    /// Name of the maintenance image, if it has a payload.
    pub maintenance_image: Option<String>,
    /// Hotspots in insertion order.
    pub hotspots: Vec<HotspotRow>,
}

impl MaintenanceRecord {
    /// Build the record for one inspection.
    #[must_use]
    pub fn from_detail(detail: &InspectionDetail<'_>) -> Self {
        let inspection = detail.inspection;

        let transformer = detail.transformer.map_or_else(
            || NOT_AVAILABLE.to_string(),
            |t| format!("{} ({})", t.location, t.number),
        );

        let hotspots = inspection
            .annotations
            .iter()
            .enumerate()
            .map(|(idx, h)| HotspotRow {
                index: idx + 1,
                location: format!("({:.1}, {:.1})", h.x, h.y),
                radius: h.radius,
                severity: h.severity,
                note: or_dash(h.note.as_deref()),
            })
            .collect();

        let maintenance = &inspection.maintenance_image;

        Self {
            inspection_id: inspection.id.clone(),
            transformer,
            date: inspection.date.clone(),
            inspector: inspection.inspector.clone(),
            status: inspection.status.to_string(),
            condition: inspection.condition.clone(),
            notes: or_dash(Some(&inspection.notes)),
            baseline_image: detail.baseline.map(|b| b.name.clone()),
            maintenance_image: (!maintenance.data_url.is_empty()).then(|| maintenance.name.clone()),
            hotspots,
        }
    }

    /// Build the record for inspection `id`, if it exists.
    #[must_use]
    pub fn for_inspection(dashboard: &Dashboard, id: &str) -> Option<Self> {
        dashboard.detail(id).map(|d| Self::from_detail(&d))
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EMPTY.to_string(),
    }
}

impl fmt::Display for MaintenanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Maintenance Record")?;
        writeln!(f, "==================")?;
        writeln!(f, "Transformer:        {}", self.transformer)?;
        writeln!(f, "Date:               {}", self.date)?;
        writeln!(f, "Inspector:          {}", self.inspector)?;
        writeln!(f, "Status:             {}", self.status)?;
        writeln!(f, "Condition:          {}", self.condition)?;
        writeln!(f, "Notes:              {}", self.notes)?;
        writeln!(
            f,
            "Baseline image:     {}",
            self.baseline_image.as_deref().unwrap_or(NOT_AVAILABLE)
        )?;
        writeln!(
            f,
            "Maintenance image:  {}",
            self.maintenance_image.as_deref().unwrap_or(NOT_AVAILABLE)
        )?;
        writeln!(f)?;
        writeln!(f, "Annotated Hotspots")?;
        writeln!(f, "------------------")?;

        if self.hotspots.is_empty() {
            return writeln!(f, "None");
        }

        writeln!(
            f,
            "{:<4} {:<20} {:<9} {:<9} Note",
            "#", "Location (x%, y%)", "Radius %", "Severity"
        )?;
        for row in &self.hotspots {
            writeln!(
                f,
                "{:<4} {:<20} {:<9} {:<9} {}",
                row.index,
                row.location,
                row.radius,
                row.severity.to_string(),
                row.note
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Hotspot, Image, ImageType, Inspection, InspectionStatus, MaintenanceImage, Transformer,
        TransformerType,
    };

    fn inspection(annotations: Vec<Hotspot>) -> Inspection {
        Inspection {
            id: "i1".to_string(),
            transformer_id: "t1".to_string(),
            inspector: "Kamal".to_string(),
            date: "2024-05-01".to_string(),
            condition: "Overheat".to_string(),
            status: InspectionStatus::InProgress,
            notes: "  ".to_string(),
            maintenance_image: MaintenanceImage {
                id: "m1".to_string(),
                name: "thermal.png".to_string(),
                data_url: "data:image/png;base64,AA==".to_string(),
            },
            baseline_image_id: Some("b1".to_string()),
            annotations,
        }
    }

    fn transformer() -> Transformer {
        Transformer {
            id: "t1".to_string(),
            region: "Colombo".to_string(),
            number: "TX-9".to_string(),
            pole: None,
            kind: TransformerType::Bulk,
            location: "Dock 4".to_string(),
        }
    }

    fn baseline() -> Image {
        Image {
            id: "b1".to_string(),
            transformer_id: "t1".to_string(),
            kind: ImageType::Baseline,
            uploader: "admin".to_string(),
            upload_date: "2024-01-01 09:00:00".to_string(),
            name: "base.png".to_string(),
            data_url: "data:image/png;base64,AA==".to_string(),
            condition: Some("Normal".to_string()),
        }
    }

    fn hotspot(id: &str, x: f64, note: Option<&str>) -> Hotspot {
        Hotspot {
            id: id.to_string(),
            x,
            y: 33.333,
            radius: 4.5,
            severity: Severity::High,
            note: note.map(ToString::to_string),
        }
    }

    #[test]
    fn test_record_with_all_references() {
        let insp = inspection(Vec::new());
        let t = transformer();
        let b = baseline();
        let detail = InspectionDetail {
            inspection: &insp,
            transformer: Some(&t),
            baseline: Some(&b),
        };

        let record = MaintenanceRecord::from_detail(&detail);
        assert_eq!(record.transformer, "Dock 4 (TX-9)");
        assert_eq!(record.status, "In Progress");
        assert_eq!(record.notes, "-");
        assert_eq!(record.baseline_image.as_deref(), Some("base.png"));
        assert_eq!(record.maintenance_image.as_deref(), Some("thermal.png"));

        let text = record.to_string();
        assert!(text.contains("Annotated Hotspots"));
        assert!(text.contains("None"));
    }

    #[test]
    fn test_record_dangling_references_show_not_available() {
        let insp = inspection(Vec::new());
        let detail = InspectionDetail {
            inspection: &insp,
            transformer: None,
            baseline: None,
        };

        let record = MaintenanceRecord::from_detail(&detail);
        assert_eq!(record.transformer, "N/A");
        assert!(record.baseline_image.is_none());
        assert!(record.to_string().contains("Baseline image:     N/A"));
    }

    #[test]
    fn test_hotspots_numbered_in_insertion_order() {
        let insp = inspection(vec![
            hotspot("z", 12.345, Some("bushing")),
            hotspot("a", 80.0, None),
        ]);
        let detail = InspectionDetail {
            inspection: &insp,
            transformer: None,
            baseline: None,
        };

        let record = MaintenanceRecord::from_detail(&detail);
        assert_eq!(record.hotspots.len(), 2);
        assert_eq!(record.hotspots[0].index, 1);
        assert_eq!(record.hotspots[0].location, "(12.3, 33.3)");
        assert_eq!(record.hotspots[0].note, "bushing");
        assert_eq!(record.hotspots[1].index, 2);
        assert_eq!(record.hotspots[1].location, "(80.0, 33.3)");
        assert_eq!(record.hotspots[1].note, "-");

        let text = record.to_string();
        let first = text.find("bushing").unwrap();
        let second = text.find("(80.0, 33.3)").unwrap();
        assert!(first < second);
        assert!(!text.contains("None\n"));
    }

    #[test]
    fn test_record_serializes_to_json() {
        let insp = inspection(vec![hotspot("h", 1.0, None)]);
        let detail = InspectionDetail {
            inspection: &insp,
            transformer: None,
            baseline: None,
        };
        let json = serde_json::to_value(MaintenanceRecord::from_detail(&detail)).unwrap();
        assert_eq!(json["inspection_id"], "i1");
        assert_eq!(json["hotspots"][0]["severity"], "High");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some(" note ")), "note");
    }
}
