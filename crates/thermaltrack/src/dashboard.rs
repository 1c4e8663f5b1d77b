//! Application state and inspection lifecycle.
//!
//! [`Dashboard`] owns the three repositories together with the session
//! state (the active inspection selection and the transformer being edited).
//! Every operation runs to completion against `&mut self`, saving each
//! touched collection before returning.

use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::decode::{parse_data_url, ImageDecoder};
use crate::error::{Error, Result};
use crate::matching::select_baseline;
use crate::model::{
    timestamp_now, Hotspot, Image, ImageType, Inspection, InspectionStatus, NewInspection,
    Transformer, TransformerForm, IMAGES_KEY, INSPECTIONS_KEY, TRANSFORMERS_KEY,
};
use crate::repository::Repository;
use crate::storage::CollectionStore;

/// Where the payload of an uploaded image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file to decode.
    File(PathBuf),
    /// An already encoded payload.
    Encoded {
        /// File name to record.
        name: String,
        /// `data:` URL payload.
        data_url: String,
    },
}

/// An image upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Transformer the image was taken of.
    pub transformer_id: String,
    /// Baseline or maintenance.
    pub kind: ImageType,
    /// Who is uploading.
    pub uploader: String,
    /// Recorded condition, for baselines.
    pub condition: Option<String>,
    /// Payload source.
    pub source: ImageSource,
}

/// An inspection with the records it points at.
///
/// References that no longer resolve are `None`.
#[derive(Debug, Clone, Copy)]
pub struct InspectionDetail<'a> {
    /// The inspection.
    pub inspection: &'a Inspection,
    /// Its transformer, if it still exists.
    pub transformer: Option<&'a Transformer>,
    /// Its baseline image, if one was matched and still exists.
    pub baseline: Option<&'a Image>,
}

/// Owned application state.
#[derive(Debug)]
pub struct Dashboard {
    store: Rc<dyn CollectionStore>,
    transformers: Repository<Transformer>,
    images: Repository<Image>,
    inspections: Repository<Inspection>,
    selected: Option<String>,
    editing: Option<String>,
}

impl Dashboard {
    /// Load all collections from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn open(store: Rc<dyn CollectionStore>) -> Result<Self> {
        let transformers = Repository::load(store.clone())?;
        let images = Repository::load(store.clone())?;
        let inspections = Repository::load(store.clone())?;

        let dashboard = Self {
            store,
            transformers,
            images,
            inspections,
            selected: None,
            editing: None,
        };
        info!(
            "Loaded {} transformers, {} images, {} inspections",
            dashboard.transformers.len(),
            dashboard.images.len(),
            dashboard.inspections.len()
        );
        Ok(dashboard)
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &dyn CollectionStore {
        self.store.as_ref()
    }

    // === Queries ===

    /// All transformers in insertion order.
    #[must_use]
    pub fn transformers(&self) -> &[Transformer] {
        self.transformers.list()
    }

    /// All images in insertion order.
    #[must_use]
    pub fn images(&self) -> &[Image] {
        self.images.list()
    }

    /// All inspections in insertion order.
    #[must_use]
    pub fn inspections(&self) -> &[Inspection] {
        self.inspections.list()
    }

    /// Find a transformer by id.
    #[must_use]
    pub fn transformer(&self, id: &str) -> Option<&Transformer> {
        self.transformers.get(id)
    }

    /// Find an image by id.
    #[must_use]
    pub fn image(&self, id: &str) -> Option<&Image> {
        self.images.get(id)
    }

    /// Find an inspection by id.
    #[must_use]
    pub fn inspection(&self, id: &str) -> Option<&Inspection> {
        self.inspections.get(id)
    }

    /// Resolve an inspection and the records it references.
    #[must_use]
    pub fn detail(&self, id: &str) -> Option<InspectionDetail<'_>> {
        let inspection = self.inspections.get(id)?;
        Some(InspectionDetail {
            inspection,
            transformer: self.transformers.get(&inspection.transformer_id),
            baseline: inspection
                .baseline_image_id
                .as_deref()
                .and_then(|bid| self.images.get(bid)),
        })
    }

    /// Fresh id for a new inspection.
    #[must_use]
    pub fn next_inspection_id(&self) -> String {
        self.inspections.next_id()
    }

    /// Fresh id for a new image.
    #[must_use]
    pub fn next_image_id(&self) -> String {
        self.images.next_id()
    }

    // === Transformers ===

    /// Register a transformer from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if required fields are blank (nothing is
    /// stored), or a storage error if the save fails.
    pub fn add_transformer(&mut self, form: TransformerForm) -> Result<Transformer> {
        let transformer = Transformer::from_form(self.transformers.next_id(), form)?;
        self.transformers.add(transformer.clone())?;
        info!("Added transformer {}", transformer.id);
        Ok(transformer)
    }

    /// Start editing a transformer. Returns it if it exists.
    pub fn begin_edit(&mut self, id: &str) -> Option<&Transformer> {
        if !self.transformers.contains(id) {
            return None;
        }
        self.editing = Some(id.to_string());
        self.transformers.get(id)
    }

    /// The transformer currently being edited.
    #[must_use]
    pub fn editing(&self) -> Option<&Transformer> {
        self.editing.as_deref().and_then(|id| self.transformers.get(id))
    }

    /// Replace a transformer's fields from a submitted form.
    ///
    /// Returns `false` if no transformer has this id. A successful update
    /// ends any edit in progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if required fields are blank; the edit
    /// stays open and nothing is stored.
    pub fn update_transformer(&mut self, id: &str, form: TransformerForm) -> Result<bool> {
        let transformer = Transformer::from_form(id, form)?;
        let updated = self.transformers.update(id, transformer)?;
        if updated {
            info!("Updated transformer {id}");
            self.editing = None;
        }
        Ok(updated)
    }

    /// Delete a transformer.
    ///
    /// Images and inspections referencing it are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn delete_transformer(&mut self, id: &str) -> Result<bool> {
        let deleted = self.transformers.delete(id)?;
        if deleted {
            if self.editing.as_deref() == Some(id) {
                self.editing = None;
            }
            let images = self.images().iter().filter(|im| im.transformer_id == id).count();
            let inspections = self
                .inspections()
                .iter()
                .filter(|i| i.transformer_id == id)
                .count();
            if images + inspections > 0 {
                warn!(
                    "Transformer {id} deleted; {images} images and {inspections} inspections still reference it"
                );
            }
        }
        Ok(deleted)
    }

    // === Images ===

    /// Store an uploaded image.
    ///
    /// File sources are decoded first; if decoding fails the error is
    /// returned and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns a decode error, an invalid data URL error, or a storage error.
    pub async fn upload_image(
        &mut self,
        decoder: &dyn ImageDecoder,
        upload: ImageUpload,
    ) -> Result<Image> {
        let (name, data_url) = match upload.source {
            ImageSource::File(path) => {
                let decoded = decoder.decode(&path).await?;
                (decoded.name, decoded.data_url)
            }
            ImageSource::Encoded { name, data_url } => {
                parse_data_url(&data_url)?;
                (name, data_url)
            }
        };

        let image = Image {
            id: self.images.next_id(),
            transformer_id: upload.transformer_id,
            kind: upload.kind,
            uploader: upload.uploader,
            upload_date: timestamp_now(),
            name,
            data_url,
            condition: upload.condition,
        };
        self.images.add(image.clone())?;
        info!("Uploaded {} image {} ({})", image.kind, image.id, image.name);
        Ok(image)
    }

    // === Inspections ===

    /// Create an inspection.
    ///
    /// Derives the maintenance image record, pairs the inspection with a
    /// baseline via [`select_baseline`], stores both and selects the new
    /// inspection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if the inspection or maintenance image id
    /// is taken, [`Error::Validation`] for out-of-range hotspots (nothing is
    /// stored in either case), or a storage error.
    pub fn create_inspection(&mut self, payload: NewInspection) -> Result<Inspection> {
        if self.inspections.contains(&payload.id) {
            return Err(Error::DuplicateId {
                collection: INSPECTIONS_KEY,
                id: payload.id,
            });
        }
        if self.images.contains(&payload.maintenance_image.id) {
            return Err(Error::DuplicateId {
                collection: IMAGES_KEY,
                id: payload.maintenance_image.id,
            });
        }
        for hotspot in &payload.annotations {
            hotspot.validate()?;
        }

        let maintenance = Image {
            id: payload.maintenance_image.id.clone(),
            transformer_id: payload.transformer_id.clone(),
            kind: ImageType::Maintenance,
            uploader: payload.inspector.clone(),
            upload_date: timestamp_now(),
            name: payload.maintenance_image.name.clone(),
            data_url: payload.maintenance_image.data_url.clone(),
            condition: None,
        };

        let baseline_image_id = select_baseline(
            self.images.list(),
            &payload.transformer_id,
            &payload.condition,
        )
        .map(|b| b.id.clone());
        match &baseline_image_id {
            Some(bid) => debug!("Inspection {} paired with baseline {bid}", payload.id),
            None => debug!(
                "No baseline for transformer {}; inspection {} unpaired",
                payload.transformer_id, payload.id
            ),
        }

        let inspection = Inspection {
            id: payload.id,
            transformer_id: payload.transformer_id,
            inspector: payload.inspector,
            date: payload.date,
            condition: payload.condition,
            status: payload.status,
            notes: payload.notes,
            maintenance_image: payload.maintenance_image,
            baseline_image_id,
            annotations: payload.annotations,
        };

        self.images.add(maintenance)?;
        self.inspections.add(inspection.clone())?;
        self.selected = Some(inspection.id.clone());
        info!("Created inspection {}", inspection.id);
        Ok(inspection)
    }

    /// Set an inspection's status. Any status is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn set_status(&mut self, id: &str, status: InspectionStatus) -> Result<bool> {
        debug!("Setting status of {id} to {status}");
        self.inspections.modify(id, |i| i.status = status)
    }

    /// Replace an inspection's hotspots with `hotspots`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any hotspot is out of range (nothing
    /// changes), or a storage error.
    pub fn update_annotations(&mut self, id: &str, hotspots: Vec<Hotspot>) -> Result<bool> {
        for hotspot in &hotspots {
            hotspot.validate()?;
        }
        debug!("Replacing annotations of {id} with {} hotspots", hotspots.len());
        self.inspections.modify(id, |i| i.annotations = hotspots)
    }

    /// Append one hotspot to an inspection's annotations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an out-of-range or duplicate hotspot,
    /// or a storage error.
    pub fn add_hotspot(&mut self, id: &str, hotspot: Hotspot) -> Result<bool> {
        let Some(inspection) = self.inspections.get(id) else {
            return Ok(false);
        };
        if inspection.annotations.iter().any(|h| h.id == hotspot.id) {
            return Err(Error::validation(format!(
                "hotspot {} already exists on inspection {id}",
                hotspot.id
            )));
        }
        let mut hotspots = inspection.annotations.clone();
        hotspots.push(hotspot);
        self.update_annotations(id, hotspots)
    }

    /// Delete an inspection, clearing the selection if it pointed at it.
    ///
    /// The maintenance image record stays in the image collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn delete_inspection(&mut self, id: &str) -> Result<bool> {
        let deleted = self.inspections.delete(id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if deleted {
            info!("Deleted inspection {id}");
        }
        Ok(deleted)
    }

    // === Selection ===

    /// Make `id` the active selection.
    pub fn select(&mut self, id: &str) {
        self.selected = Some(id.to_string());
    }

    /// Clear the active selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Id of the active selection.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected inspection with its references resolved.
    #[must_use]
    pub fn selected(&self) -> Option<InspectionDetail<'_>> {
        self.detail(self.selected.as_deref()?)
    }

    /// Keys of the three collections, in display order.
    #[must_use]
    pub fn collection_keys() -> [&'static str; 3] {
        [TRANSFORMERS_KEY, IMAGES_KEY, INSPECTIONS_KEY]
    }
}
