//! Property catalog: listings, their photos, and the service used by both the
//! JSON API and the website pages.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ImageRef, Property, PropertyDetail, PropertyDraft, PropertyFields, PropertyId, PropertyImage,
    PropertyImageId, PropertyType,
};
pub use memory::InMemoryPropertyRepository;
pub use repository::PropertyRepository;
pub use service::{ListingError, ListingService, PropertyQuery, FEATURED_LIMIT};
