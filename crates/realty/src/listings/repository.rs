use super::domain::{
    ImageRef, Property, PropertyFields, PropertyId, PropertyImage, PropertyImageId,
};
use crate::store::RepositoryError;

/// Storage abstraction for listings and their images.
///
/// Images belong to exactly one property and disappear with it.
pub trait PropertyRepository: Send + Sync {
    /// Persist a new listing with `sold_out = false` and a fresh `date_posted`.
    fn insert(&self, fields: PropertyFields) -> Result<Property, RepositoryError>;
    /// Replace the client-writable fields; id, `date_posted` and `sold_out` are kept.
    fn update(&self, id: PropertyId, fields: PropertyFields) -> Result<Property, RepositoryError>;
    fn toggle_sold_out(&self, id: PropertyId) -> Result<Property, RepositoryError>;
    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// Newest id first.
    fn list(&self) -> Result<Vec<Property>, RepositoryError>;
    /// Removes the listing and every image attached to it.
    fn delete(&self, id: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError>;

    fn add_image(
        &self,
        property: PropertyId,
        image: ImageRef,
    ) -> Result<PropertyImage, RepositoryError>;
    fn images_for(&self, property: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError>;
    fn fetch_image(&self, id: PropertyImageId) -> Result<Option<PropertyImage>, RepositoryError>;
    fn list_images(&self) -> Result<Vec<PropertyImage>, RepositoryError>;
    /// Points an existing image row at `property` and `image`.
    fn update_image(
        &self,
        id: PropertyImageId,
        property: PropertyId,
        image: ImageRef,
    ) -> Result<PropertyImage, RepositoryError>;
    fn delete_image(&self, id: PropertyImageId) -> Result<PropertyImage, RepositoryError>;
}
