use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;

use super::domain::{
    ImageRef, Property, PropertyFields, PropertyId, PropertyImage, PropertyImageId,
};
use super::repository::PropertyRepository;
use crate::store::{poisoned, RepositoryError};

#[derive(Default)]
struct CatalogState {
    properties: BTreeMap<PropertyId, Property>,
    images: BTreeMap<PropertyImageId, PropertyImage>,
    last_property_id: u64,
    last_image_id: u64,
}

/// Process-local catalog. One lock covers listings and images so a cascade
/// delete never leaves orphaned images visible.
#[derive(Default)]
pub struct InMemoryPropertyRepository {
    state: Mutex<CatalogState>,
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn insert(&self, fields: PropertyFields) -> Result<Property, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.last_property_id += 1;
        let property = Property {
            id: PropertyId(state.last_property_id),
            fields,
            date_posted: Utc::now(),
            sold_out: false,
        };
        state.properties.insert(property.id, property.clone());
        Ok(property)
    }

    fn update(&self, id: PropertyId, fields: PropertyFields) -> Result<Property, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let property = state
            .properties
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        property.fields = fields;
        Ok(property.clone())
    }

    fn toggle_sold_out(&self, id: PropertyId) -> Result<Property, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let property = state
            .properties
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        property.sold_out = !property.sold_out;
        Ok(property.clone())
    }

    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.properties.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Property>, RepositoryError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.properties.values().rev().cloned().collect())
    }

    fn delete(&self, id: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state
            .properties
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;

        let orphaned: Vec<PropertyImageId> = state
            .images
            .values()
            .filter(|image| image.property == id)
            .map(|image| image.id)
            .collect();
        Ok(orphaned
            .into_iter()
            .filter_map(|image_id| state.images.remove(&image_id))
            .collect())
    }

    fn add_image(
        &self,
        property: PropertyId,
        image: ImageRef,
    ) -> Result<PropertyImage, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        if !state.properties.contains_key(&property) {
            return Err(RepositoryError::NotFound);
        }
        state.last_image_id += 1;
        let stored = PropertyImage {
            id: PropertyImageId(state.last_image_id),
            property,
            image,
        };
        state.images.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn images_for(&self, property: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state
            .images
            .values()
            .filter(|image| image.property == property)
            .cloned()
            .collect())
    }

    fn fetch_image(&self, id: PropertyImageId) -> Result<Option<PropertyImage>, RepositoryError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.images.get(&id).cloned())
    }

    fn list_images(&self) -> Result<Vec<PropertyImage>, RepositoryError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.images.values().cloned().collect())
    }

    fn update_image(
        &self,
        id: PropertyImageId,
        property: PropertyId,
        image: ImageRef,
    ) -> Result<PropertyImage, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        if !state.properties.contains_key(&property) {
            return Err(RepositoryError::NotFound);
        }
        let row = state.images.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.property = property;
        row.image = image;
        Ok(row.clone())
    }

    fn delete_image(&self, id: PropertyImageId) -> Result<PropertyImage, RepositoryError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.images.remove(&id).ok_or(RepositoryError::NotFound)
    }
}
