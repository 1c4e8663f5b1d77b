//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{ImageType, Severity, TransformerForm, TransformerType};

/// Transformer commands.
#[derive(Debug, Subcommand)]
pub enum TransformerCommand {
    /// Register a transformer
    Add(TransformerFields),

    /// Edit a transformer; unspecified fields keep their current value
    Update {
        /// Transformer id
        id: String,

        #[command(flatten)]
        fields: TransformerFields,
    },

    /// Delete a transformer (images and inspections keep their reference)
    Delete {
        /// Transformer id
        id: String,
    },

    /// List transformers
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Transformer form fields.
#[derive(Debug, Clone, Default, Args)]
pub struct TransformerFields {
    /// Region (e.g. Colombo)
    #[arg(long)]
    pub region: Option<String>,

    /// Transformer number
    #[arg(long)]
    pub number: Option<String>,

    /// Pole number
    #[arg(long)]
    pub pole: Option<String>,

    /// Installation type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<TransformerTypeArg>,

    /// Location details
    #[arg(long)]
    pub location: Option<String>,
}

impl TransformerFields {
    /// Turn the fields into a form, blank where not given.
    #[must_use]
    pub fn into_form(self) -> TransformerForm {
        self.merge_into(TransformerForm::default())
    }

    /// Overlay the given fields on an existing form.
    #[must_use]
    pub fn merge_into(self, mut form: TransformerForm) -> TransformerForm {
        if let Some(region) = self.region {
            form.region = region;
        }
        if let Some(number) = self.number {
            form.number = number;
        }
        if let Some(pole) = self.pole {
            form.pole = Some(pole);
        }
        if let Some(kind) = self.kind {
            form.kind = kind.into();
        }
        if let Some(location) = self.location {
            form.location = location;
        }
        form
    }
}

/// Image commands.
#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Upload an image from a file or an encoded data URL
    Upload(UploadCommand),

    /// List images
    List {
        /// Only images of this transformer
        #[arg(long)]
        transformer: Option<String>,

        /// Only baseline images
        #[arg(short, long)]
        baselines: bool,

        /// Output as JSON (includes payloads)
        #[arg(short, long)]
        json: bool,
    },
}

/// Image upload arguments.
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Transformer the image was taken of
    #[arg(long)]
    pub transformer: String,

    /// Image role
    #[arg(short = 't', long = "type", value_enum, default_value = "baseline")]
    pub kind: ImageTypeArg,

    /// Uploader name
    #[arg(short, long, default_value = "")]
    pub uploader: String,

    /// Condition the baseline was captured under (e.g. Normal, Oil Leak)
    #[arg(long)]
    pub condition: Option<String>,

    /// Image file to read
    #[arg(short, long, conflicts_with = "data_url", required_unless_present = "data_url")]
    pub file: Option<String>,

    /// Already encoded `data:image/...;base64,...` payload
    #[arg(long, requires = "name")]
    pub data_url: Option<String>,

    /// File name to record with --data-url
    #[arg(long)]
    pub name: Option<String>,
}

/// Inspection commands.
#[derive(Debug, Subcommand)]
pub enum InspectionCommand {
    /// Create an inspection and pair it with a baseline image
    Create(CreateInspectionCommand),

    /// List inspections
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show an inspection with its transformer and baseline
    Show {
        /// Inspection id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Set an inspection's status (any text is accepted)
    Status {
        /// Inspection id
        id: String,

        /// New status (e.g. Open, "In Progress", Completed)
        status: String,
    },

    /// Mark a hotspot on an inspection's maintenance image
    Annotate(AnnotateCommand),

    /// Remove all hotspots from an inspection
    ClearAnnotations {
        /// Inspection id
        id: String,
    },

    /// Delete an inspection
    Delete {
        /// Inspection id
        id: String,
    },
}

/// Inspection creation arguments.
#[derive(Debug, Args)]
pub struct CreateInspectionCommand {
    /// Inspected transformer
    #[arg(long)]
    pub transformer: String,

    /// Inspector name
    #[arg(short, long)]
    pub inspector: String,

    /// Inspection date (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Observed condition, used to pick the baseline
    #[arg(long)]
    pub condition: String,

    /// Initial status
    #[arg(short, long, default_value = "Open")]
    pub status: String,

    /// Notes
    #[arg(short, long, default_value = "")]
    pub notes: String,

    /// Thermal image captured during the visit
    #[arg(long)]
    pub image: String,
}

/// Hotspot arguments.
#[derive(Debug, Args)]
pub struct AnnotateCommand {
    /// Inspection id
    pub id: String,

    /// Horizontal position in percent
    #[arg(short, long)]
    pub x: f64,

    /// Vertical position in percent
    #[arg(short, long)]
    pub y: f64,

    /// Radius in percent
    #[arg(short, long, default_value = "5")]
    pub radius: f64,

    /// Severity
    #[arg(short, long, value_enum, default_value = "medium")]
    pub severity: SeverityArg,

    /// Note
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Record command arguments.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// Inspection id
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Transformer type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransformerTypeArg {
    /// Distribution transformer
    Distribution,
    /// Bulk supply transformer
    Bulk,
}

impl From<TransformerTypeArg> for TransformerType {
    fn from(arg: TransformerTypeArg) -> Self {
        match arg {
            TransformerTypeArg::Distribution => Self::Distribution,
            TransformerTypeArg::Bulk => Self::Bulk,
        }
    }
}

/// Image type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageTypeArg {
    /// Baseline image
    Baseline,
    /// Maintenance image
    Maintenance,
}

impl From<ImageTypeArg> for ImageType {
    fn from(arg: ImageTypeArg) -> Self {
        match arg {
            ImageTypeArg::Baseline => Self::Baseline,
            ImageTypeArg::Maintenance => Self::Maintenance,
        }
    }
}

/// Severity argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Low => Self::Low,
            SeverityArg::Medium => Self::Medium,
            SeverityArg::High => Self::High,
            SeverityArg::Critical => Self::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformer_type_arg_conversion() {
        assert_eq!(
            TransformerType::from(TransformerTypeArg::Distribution),
            TransformerType::Distribution
        );
        assert_eq!(
            TransformerType::from(TransformerTypeArg::Bulk),
            TransformerType::Bulk
        );
    }

    #[test]
    fn test_image_type_arg_conversion() {
        assert_eq!(ImageType::from(ImageTypeArg::Baseline), ImageType::Baseline);
        assert_eq!(
            ImageType::from(ImageTypeArg::Maintenance),
            ImageType::Maintenance
        );
    }

    #[test]
    fn test_severity_arg_conversion() {
        assert_eq!(Severity::from(SeverityArg::Low), Severity::Low);
        assert_eq!(Severity::from(SeverityArg::Critical), Severity::Critical);
    }

    #[test]
    fn test_fields_into_form_leaves_blanks() {
        let fields = TransformerFields {
            region: Some("Kandy".to_string()),
            ..TransformerFields::default()
        };
        let form = fields.into_form();
        assert_eq!(form.region, "Kandy");
        assert!(form.number.is_empty());
        assert_eq!(form.kind, TransformerType::Distribution);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_fields_merge_keeps_existing_values() {
        let existing = TransformerForm {
            region: "Kandy".to_string(),
            number: "TX-1".to_string(),
            pole: Some("P1".to_string()),
            kind: TransformerType::Distribution,
            location: "Lake Rd".to_string(),
        };
        let fields = TransformerFields {
            location: Some("Temple Rd".to_string()),
            kind: Some(TransformerTypeArg::Bulk),
            ..TransformerFields::default()
        };

        let form = fields.merge_into(existing);
        assert_eq!(form.region, "Kandy");
        assert_eq!(form.pole.as_deref(), Some("P1"));
        assert_eq!(form.location, "Temple Rd");
        assert_eq!(form.kind, TransformerType::Bulk);
    }
}
