use std::sync::Arc;

use tempfile::TempDir;

use crate::listings::{
    InMemoryPropertyRepository, ListingService, PropertyDraft, PropertyFields, PropertyType,
};
use crate::media::{ImageUpload, LocalImageStorage};
use crate::validation::RawField;

pub(super) fn draft(title: &str, location: &str, price: &str) -> PropertyDraft {
    PropertyDraft {
        title: Some(title.to_string()),
        description: Some(String::new()),
        price: Some(RawField::Text(price.to_string())),
        location: Some(location.to_string()),
        property_type: Some("Flat".to_string()),
        bedrooms: Some(RawField::Integer(2)),
        bathrooms: Some(RawField::Integer(2)),
        ..PropertyDraft::default()
    }
}

pub(super) fn fields(title: &str) -> PropertyFields {
    PropertyFields {
        title: title.to_string(),
        description: "Corner plot".to_string(),
        price: "4500000.00".parse().expect("decimal"),
        location: "Nashik".to_string(),
        property_type: PropertyType::Plot,
        bedrooms: None,
        bathrooms: None,
        plot_area: Some(2400.0),
        carpet_area: None,
        super_builtup_area: None,
    }
}

pub(super) fn upload(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

/// Service over a fresh store with images written to a temporary media root.
pub(super) fn build_service() -> (ListingService, Arc<InMemoryPropertyRepository>, TempDir) {
    let media = tempfile::tempdir().expect("tempdir");
    let repository = Arc::new(InMemoryPropertyRepository::default());
    let storage = Arc::new(LocalImageStorage::new(media.path()));
    let service = ListingService::new(repository.clone(), storage);
    (service, repository, media)
}
