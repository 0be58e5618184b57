use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{
    Property, PropertyDetail, PropertyDraft, PropertyFields, PropertyId, PropertyImage,
    PropertyImageId,
};
use super::repository::PropertyRepository;
use crate::media::{upload_path, ImageStorage, ImageUpload, MediaError};
use crate::store::RepositoryError;
use crate::validation::{ValidationErrors, REQUIRED};

/// Number of listings shown on the landing page.
pub const FEATURED_LIMIT: usize = 6;

const NO_FILE: &str = "No file was submitted.";

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Query string accepted by the public and admin listing pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceOrder {
    Low,
    High,
}

impl PropertyQuery {
    fn term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    fn price_order(&self) -> Option<PriceOrder> {
        match self.price.as_deref() {
            Some("low") => Some(PriceOrder::Low),
            Some("high") => Some(PriceOrder::High),
            _ => None,
        }
    }
}

/// Service composing the catalog store and image storage.
pub struct ListingService {
    repository: Arc<dyn PropertyRepository>,
    images: Arc<dyn ImageStorage>,
}

impl ListingService {
    pub fn new(repository: Arc<dyn PropertyRepository>, images: Arc<dyn ImageStorage>) -> Self {
        Self { repository, images }
    }

    /// Every listing, newest first, with images nested.
    pub fn list(&self) -> Result<Vec<PropertyDetail>, ListingError> {
        self.repository
            .list()?
            .into_iter()
            .map(|property| self.detail(property))
            .collect()
    }

    /// Up to `limit` unsold listings in posting order.
    pub fn featured(&self, limit: usize) -> Result<Vec<Property>, ListingError> {
        let mut unsold: Vec<Property> = self
            .repository
            .list()?
            .into_iter()
            .filter(|property| !property.sold_out)
            .collect();
        unsold.sort_by_key(|property| property.id);
        unsold.truncate(limit);
        Ok(unsold)
    }

    /// Title/location filter and optional price ordering; newest first otherwise.
    pub fn search(&self, query: &PropertyQuery) -> Result<Vec<Property>, ListingError> {
        let mut properties = self.repository.list()?;

        if let Some(term) = query.term() {
            properties.retain(|property| {
                property.fields.title.to_lowercase().contains(&term)
                    || property.fields.location.to_lowercase().contains(&term)
            });
        }

        match query.price_order() {
            Some(PriceOrder::Low) => properties.sort_by(|a, b| a.fields.price.cmp(&b.fields.price)),
            Some(PriceOrder::High) => {
                properties.sort_by(|a, b| b.fields.price.cmp(&a.fields.price))
            }
            None => {}
        }
        Ok(properties)
    }

    pub fn get(&self, id: PropertyId) -> Result<PropertyDetail, ListingError> {
        let property = self.fetch(id)?;
        self.detail(property)
    }

    pub fn fetch(&self, id: PropertyId) -> Result<Property, ListingError> {
        let property = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(property)
    }

    pub fn create(&self, draft: PropertyDraft) -> Result<PropertyDetail, ListingError> {
        let fields = draft.validate()?;
        let property = self.repository.insert(fields)?;
        info!(property_id = %property.id, title = %property.fields.title, "listing created");
        self.detail(property)
    }

    /// Create a listing and attach any uploaded photos to it.
    ///
    /// Upload names are checked before the listing is stored.
    pub async fn create_with_images(
        &self,
        draft: PropertyDraft,
        uploads: Vec<ImageUpload>,
    ) -> Result<PropertyDetail, ListingError> {
        check_uploads(&uploads)?;
        let created = self.create(draft)?;
        self.store_images(created.property.id, uploads).await?;
        self.detail(created.property)
    }

    /// Full (`partial = false`) or partial update of the writable fields.
    pub fn update(
        &self,
        id: PropertyId,
        draft: PropertyDraft,
        partial: bool,
    ) -> Result<PropertyDetail, ListingError> {
        let property = self.update_fields(id, draft, partial)?;
        self.detail(property)
    }

    /// Full update from the edit page; new photos are added to the existing ones.
    pub async fn update_with_images(
        &self,
        id: PropertyId,
        draft: PropertyDraft,
        uploads: Vec<ImageUpload>,
    ) -> Result<PropertyDetail, ListingError> {
        self.fetch(id)?;
        check_uploads(&uploads)?;
        let property = self.update_fields(id, draft, false)?;
        self.store_images(property.id, uploads).await?;
        self.detail(property)
    }

    pub fn toggle_sold_out(&self, id: PropertyId) -> Result<Property, ListingError> {
        let property = self.repository.toggle_sold_out(id)?;
        info!(property_id = %id, sold_out = property.sold_out, "listing availability toggled");
        Ok(property)
    }

    /// Deletes the listing and its images.
    pub fn delete(&self, id: PropertyId) -> Result<Property, ListingError> {
        let property = self.fetch(id)?;
        let removed = self.repository.delete(id)?;
        info!(property_id = %id, images = removed.len(), "listing deleted");
        Ok(property)
    }

    /// Attach uploads to an existing listing, failing before any write when
    /// the listing is unknown or a file is not an image.
    pub async fn attach_images(
        &self,
        property: PropertyId,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<PropertyImage>, ListingError> {
        if self.repository.fetch(property)?.is_none() {
            return Err(ValidationErrors::single(
                "property",
                format!("Invalid pk \"{property}\" - object does not exist."),
            )
            .into());
        }
        check_uploads(&uploads)?;
        self.store_images(property, uploads).await
    }

    pub fn images(&self) -> Result<Vec<PropertyImage>, ListingError> {
        Ok(self.repository.list_images()?)
    }

    pub fn image(&self, id: PropertyImageId) -> Result<PropertyImage, ListingError> {
        let image = self
            .repository
            .fetch_image(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(image)
    }

    /// Move an image to another listing or replace its file. A full update
    /// (`partial = false`) needs both; a partial one keeps whatever is absent.
    pub async fn update_image(
        &self,
        id: PropertyImageId,
        property: Option<PropertyId>,
        upload: Option<ImageUpload>,
        partial: bool,
    ) -> Result<PropertyImage, ListingError> {
        let current = self.image(id)?;

        let mut errors = ValidationErrors::new();
        if !partial && property.is_none() {
            errors.add("property", REQUIRED);
        }
        if !partial && upload.is_none() {
            errors.add("image", NO_FILE);
        }
        if let Some(target) = property {
            if self.repository.fetch(target)?.is_none() {
                errors.add(
                    "property",
                    format!("Invalid pk \"{target}\" - object does not exist."),
                );
            }
        }
        if let Some(upload) = &upload {
            if upload_path(&upload.file_name).is_err() {
                errors.add("image", INVALID_IMAGE);
            }
        }
        errors.into_result(())?;

        let image = match upload {
            Some(upload) => self.images.store(&upload.file_name, &upload.bytes).await?,
            None => current.image,
        };
        let updated = self
            .repository
            .update_image(id, property.unwrap_or(current.property), image)?;
        info!(image_id = %id, property_id = %updated.property, "listing image updated");
        Ok(updated)
    }

    pub fn delete_image(&self, id: PropertyImageId) -> Result<(), ListingError> {
        let image = self.repository.delete_image(id)?;
        info!(image_id = %id, property_id = %image.property, "listing image deleted");
        Ok(())
    }

    fn update_fields(
        &self,
        id: PropertyId,
        draft: PropertyDraft,
        partial: bool,
    ) -> Result<Property, ListingError> {
        let current = self.fetch(id)?;
        let fields: PropertyFields = if partial {
            draft.apply_to(&current.fields)?
        } else {
            draft.validate()?
        };
        Ok(self.repository.update(id, fields)?)
    }

    async fn store_images(
        &self,
        property: PropertyId,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<PropertyImage>, ListingError> {
        let mut created = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let image = self.images.store(&upload.file_name, &upload.bytes).await?;
            match self.repository.add_image(property, image) {
                Ok(stored) => created.push(stored),
                Err(err) => {
                    warn!(property_id = %property, error = %err, "image row not saved");
                    return Err(err.into());
                }
            }
        }
        Ok(created)
    }

    fn detail(&self, property: Property) -> Result<PropertyDetail, ListingError> {
        let images = self.repository.images_for(property.id)?;
        Ok(PropertyDetail { property, images })
    }
}

fn check_uploads(uploads: &[ImageUpload]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for upload in uploads {
        if upload_path(&upload.file_name).is_err() {
            errors.add("images", INVALID_IMAGE);
        }
    }
    errors.into_result(())
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Media(#[from] MediaError),
}
