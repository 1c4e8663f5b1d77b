//! Core record types for thermaltrack.
//!
//! These are the shapes persisted in the three stored collections. Field names
//! serialize in camelCase so stored documents read the same as the records
//! operators see in listings (`transformerId`, `uploadDate`, `dataUrl`, ...).

use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::repository::Record;

/// Storage key of the transformer collection.
pub const TRANSFORMERS_KEY: &str = "transformers";

/// Storage key of the image collection.
pub const IMAGES_KEY: &str = "images";

/// Storage key of the inspection collection.
pub const INSPECTIONS_KEY: &str = "inspections";

/// Format used for upload timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time as an upload timestamp string.
#[must_use]
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Kind of transformer installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransformerType {
    /// Pole-mounted distribution transformer.
    #[default]
    Distribution,
    /// Bulk supply transformer.
    Bulk,
}

impl fmt::Display for TransformerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distribution => write!(f, "Distribution"),
            Self::Bulk => write!(f, "Bulk"),
        }
    }
}

/// A registered transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformer {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// Region the transformer is installed in.
    pub region: String,
    /// Transformer number.
    pub number: String,
    /// Pole number, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pole: Option<String>,
    /// Installation kind.
    #[serde(rename = "type", default)]
    pub kind: TransformerType,
    /// Free-form location details.
    pub location: String,
}

impl Transformer {
    /// Build a transformer from a validated form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any required field is blank.
    pub fn from_form(id: impl Into<String>, form: TransformerForm) -> Result<Self> {
        form.validate()?;
        Ok(Self {
            id: id.into(),
            region: form.region,
            number: form.number,
            pole: form.pole.filter(|p| !p.trim().is_empty()),
            kind: form.kind,
            location: form.location,
        })
    }
}

impl Record for Transformer {
    const COLLECTION: &'static str = TRANSFORMERS_KEY;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Transformer fields as submitted by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerForm {
    /// Region (required).
    pub region: String,
    /// Transformer number (required).
    pub number: String,
    /// Pole number.
    pub pole: Option<String>,
    /// Installation kind.
    pub kind: TransformerType,
    /// Location details (required).
    pub location: String,
}

impl TransformerForm {
    /// Check that region, number and location are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming every missing field.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("region", &self.region),
            ("number", &self.number),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "missing required transformer fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl From<&Transformer> for TransformerForm {
    fn from(t: &Transformer) -> Self {
        Self {
            region: t.region.clone(),
            number: t.number.clone(),
            pole: t.pole.clone(),
            kind: t.kind,
            location: t.location.clone(),
        }
    }
}

/// Role of a stored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageType {
    /// Reference image captured under a known condition.
    Baseline,
    /// Thermal image captured during an inspection visit.
    Maintenance,
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "Baseline"),
            Self::Maintenance => write!(f, "Maintenance"),
        }
    }
}

/// A stored image with its embedded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Unique identifier.
    pub id: String,
    /// Transformer this image was taken of. Not checked for existence.
    pub transformer_id: String,
    /// Baseline or maintenance.
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// Who uploaded the image.
    #[serde(default)]
    pub uploader: String,
    /// Upload timestamp.
    pub upload_date: String,
    /// Original file name.
    pub name: String,
    /// Embedded `data:` URL payload.
    pub data_url: String,
    /// Recorded condition; only meaningful for baselines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Image {
    /// Whether this is a baseline image.
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.kind == ImageType::Baseline
    }
}

impl Record for Image {
    const COLLECTION: &'static str = IMAGES_KEY;

    fn id(&self) -> &str {
        &self.id
    }
}

/// The image captured during an inspection, embedded in the inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceImage {
    /// Id shared with the derived image record.
    pub id: String,
    /// Original file name.
    pub name: String,
    /// Embedded `data:` URL payload.
    pub data_url: String,
}

/// Inspection status.
///
/// Any string is accepted. `Open`, `In Progress` and `Completed` map to named
/// variants; everything else, including other spellings of those, is kept
/// verbatim in [`InspectionStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InspectionStatus {
    /// Not yet worked on.
    #[default]
    Open,
    /// Being worked on.
    InProgress,
    /// Finished.
    Completed,
    /// Any other operator-supplied status.
    Other(String),
}

impl From<String> for InspectionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Open" => Self::Open,
            "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for InspectionStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<InspectionStatus> for String {
    fn from(status: InspectionStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Completed => write!(f, "Completed"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// How serious a marked hotspot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Worth noting.
    Low,
    /// Needs follow-up.
    Medium,
    /// Needs prompt maintenance.
    High,
    /// Immediate risk.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// A marked point of interest on a maintenance image.
///
/// Coordinates and radius are percentages of the image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Identifier, unique within the owning inspection.
    pub id: String,
    /// Horizontal position, 0–100.
    pub x: f64,
    /// Vertical position, 0–100.
    pub y: f64,
    /// Radius, 0–100.
    pub radius: f64,
    /// Severity.
    pub severity: Severity,
    /// Optional operator note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Hotspot {
    /// Check that position and radius are percentages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a value is outside 0–100 or not finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("x", self.x), ("y", self.y), ("radius", self.radius)] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(Error::validation(format!(
                    "hotspot {} has {name} = {value}, expected 0-100",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// A recorded inspection visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    /// Unique identifier.
    pub id: String,
    /// Inspected transformer. Not checked for existence.
    pub transformer_id: String,
    /// Inspector name.
    pub inspector: String,
    /// Inspection date as entered.
    pub date: String,
    /// Observed condition; drives baseline matching.
    pub condition: String,
    /// Current status.
    #[serde(default)]
    pub status: InspectionStatus,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// The thermal image taken during this visit.
    pub maintenance_image: MaintenanceImage,
    /// Baseline chosen at creation time, never recomputed.
    #[serde(default)]
    pub baseline_image_id: Option<String>,
    /// Hotspots in insertion order.
    #[serde(default)]
    pub annotations: Vec<Hotspot>,
}

impl Record for Inspection {
    const COLLECTION: &'static str = INSPECTIONS_KEY;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Everything needed to create an inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInspection {
    /// Identifier for the new inspection.
    pub id: String,
    /// Inspected transformer.
    pub transformer_id: String,
    /// Inspector name; also recorded as the maintenance image uploader.
    pub inspector: String,
    /// Inspection date.
    pub date: String,
    /// Observed condition.
    pub condition: String,
    /// Initial status.
    #[serde(default)]
    pub status: InspectionStatus,
    /// Notes.
    #[serde(default)]
    pub notes: String,
    /// Image captured during the visit.
    pub maintenance_image: MaintenanceImage,
    /// Initial hotspots.
    #[serde(default)]
    pub annotations: Vec<Hotspot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> TransformerForm {
        TransformerForm {
            region: "Colombo".to_string(),
            number: "TX-1001".to_string(),
            pole: Some("P-12".to_string()),
            kind: TransformerType::Bulk,
            location: "Main St substation".to_string(),
        }
    }

    #[test]
    fn test_form_validate_ok() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_form_validate_names_missing_fields() {
        let mut f = form();
        f.region = "  ".to_string();
        f.location = String::new();

        let err = f.validate().unwrap_err();
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("region"));
        assert!(msg.contains("location"));
        assert!(!msg.contains("number"));
    }

    #[test]
    fn test_transformer_from_form_drops_blank_pole() {
        let mut f = form();
        f.pole = Some(String::new());

        let t = Transformer::from_form("1", f).unwrap();
        assert_eq!(t.id, "1");
        assert!(t.pole.is_none());
        assert_eq!(t.kind, TransformerType::Bulk);
    }

    #[test]
    fn test_transformer_serializes_type_field() {
        let t = Transformer::from_form("1", form()).unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "Bulk");
        assert_eq!(json["pole"], "P-12");
    }

    #[test]
    fn test_transformer_type_defaults_to_distribution() {
        let json = r#"{"id":"7","region":"Kandy","number":"9","location":"Hill"}"#;
        let t: Transformer = serde_json::from_str(json).unwrap();
        assert_eq!(t.kind, TransformerType::Distribution);
        assert!(t.pole.is_none());
    }

    #[test]
    fn test_image_camel_case_fields() {
        let image = Image {
            id: "img-1".to_string(),
            transformer_id: "t-1".to_string(),
            kind: ImageType::Baseline,
            uploader: "Nimal".to_string(),
            upload_date: "2024-01-01 10:00:00".to_string(),
            name: "base.png".to_string(),
            data_url: "data:image/png;base64,AAAA".to_string(),
            condition: Some("Normal".to_string()),
        };
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["transformerId"], "t-1");
        assert_eq!(json["uploadDate"], "2024-01-01 10:00:00");
        assert_eq!(json["dataUrl"], "data:image/png;base64,AAAA");
        assert_eq!(json["type"], "Baseline");
        assert!(image.is_baseline());
    }

    #[test]
    fn test_status_parses_known_values() {
        assert_eq!(InspectionStatus::from("Open"), InspectionStatus::Open);
        assert_eq!(
            InspectionStatus::from("In Progress"),
            InspectionStatus::InProgress
        );
        assert_eq!(
            InspectionStatus::from("Completed"),
            InspectionStatus::Completed
        );
    }

    #[test]
    fn test_status_round_trips_other_spellings() {
        for raw in ["completed", "COMPLETED", " Open", "in-progress"] {
            let json = serde_json::to_string(&InspectionStatus::from(raw)).unwrap();
            assert_eq!(json, serde_json::to_string(raw).unwrap());

            let back: InspectionStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back.to_string(), raw);
        }
    }

    #[test]
    fn test_status_keeps_unknown_strings() {
        let status = InspectionStatus::from("Awaiting parts");
        assert_eq!(status, InspectionStatus::Other("Awaiting parts".to_string()));
        assert_eq!(status.to_string(), "Awaiting parts");
    }

    #[test]
    fn test_status_serde_as_string() {
        let json = serde_json::to_string(&InspectionStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");

        let back: InspectionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, InspectionStatus::InProgress);

        let other: InspectionStatus = serde_json::from_str("\"Deferred\"").unwrap();
        assert_eq!(other, InspectionStatus::Other("Deferred".to_string()));
    }

    #[test]
    fn test_hotspot_validate() {
        let mut h = Hotspot {
            id: "h1".to_string(),
            x: 50.0,
            y: 0.0,
            radius: 100.0,
            severity: Severity::High,
            note: None,
        };
        assert!(h.validate().is_ok());

        h.x = 100.5;
        assert!(h.validate().unwrap_err().to_string().contains("x = 100.5"));

        h.x = 10.0;
        h.radius = f64::NAN;
        assert!(h.validate().is_err());
    }

    #[test]
    fn test_inspection_defaults_on_missing_fields() {
        let json = r#"{
            "id": "i1",
            "transformerId": "t1",
            "inspector": "Kamal",
            "date": "2024-03-01",
            "condition": "Normal",
            "maintenanceImage": {"id": "m1", "name": "m.png", "dataUrl": "data:image/png;base64,AA"}
        }"#;
        let inspection: Inspection = serde_json::from_str(json).unwrap();
        assert_eq!(inspection.status, InspectionStatus::Open);
        assert!(inspection.baseline_image_id.is_none());
        assert!(inspection.annotations.is_empty());
        assert!(inspection.notes.is_empty());
    }

    #[test]
    fn test_timestamp_now_format() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
