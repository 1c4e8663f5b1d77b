//! `thermaltrack` - Transformer inspection records with baseline thermal image matching
//!
//! This library keeps three persisted collections (transformers, thermal
//! images and inspections), pairs each new inspection with the most fitting
//! baseline image of its transformer, and renders printable maintenance
//! records with annotated hotspots.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod decode;
pub mod error;
pub mod logging;
pub mod matching;
pub mod model;
pub mod record;
pub mod repository;
pub mod storage;

pub use config::Config;
pub use dashboard::{Dashboard, ImageSource, ImageUpload, InspectionDetail};
pub use decode::{FileDecoder, ImageDecoder};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use matching::select_baseline;
pub use model::{
    Hotspot, Image, ImageType, Inspection, InspectionStatus, MaintenanceImage, NewInspection,
    Severity, Transformer, TransformerForm, TransformerType,
};
pub use record::MaintenanceRecord;
pub use storage::{CollectionStore, MemoryStore, Storage};
