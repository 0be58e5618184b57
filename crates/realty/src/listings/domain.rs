use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::validation::{
    optional_float, optional_integer, required_text, RawField, ValidationErrors, REQUIRED,
};

const TITLE_MAX: usize = 200;
const LOCATION_MAX: usize = 255;
const PRICE_MAX_DIGITS: u32 = 12;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// Identifier wrapper for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyImageId(pub u64);

impl fmt::Display for PropertyImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    House,
    Flat,
    Villa,
    Office,
    Shop,
    Showroom,
    Plot,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        PropertyType::House,
        PropertyType::Flat,
        PropertyType::Villa,
        PropertyType::Office,
        PropertyType::Shop,
        PropertyType::Showroom,
        PropertyType::Plot,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Flat => "Flat",
            PropertyType::Villa => "Villa",
            PropertyType::Office => "Office",
            PropertyType::Shop => "Shop",
            PropertyType::Showroom => "Showroom",
            PropertyType::Plot => "Plot",
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == value)
            .ok_or_else(|| format!("\"{value}\" is not a valid choice."))
    }
}

/// Client-writable listing attributes.
///
/// Type-specific measurements are optional and deliberately independent of
/// `property_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFields {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub location: String,
    pub property_type: PropertyType,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub plot_area: Option<f64>,
    pub carpet_area: Option<f64>,
    pub super_builtup_area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub id: PropertyId,
    #[serde(flatten)]
    pub fields: PropertyFields,
    pub date_posted: DateTime<Utc>,
    pub sold_out: bool,
}

/// Path of a stored upload relative to the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn relative_path(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> String {
        format!("/media/{}", self.0)
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyImage {
    pub id: PropertyImageId,
    pub property: PropertyId,
    pub image: ImageRef,
}

/// A listing with its images nested, as exposed by read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub images: Vec<PropertyImage>,
}

/// Unvalidated listing input from a JSON body or a form post.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PropertyDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<RawField>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<RawField>,
    #[serde(default)]
    pub bathrooms: Option<RawField>,
    #[serde(default)]
    pub plot_area: Option<RawField>,
    #[serde(default)]
    pub carpet_area: Option<RawField>,
    #[serde(default)]
    pub super_builtup_area: Option<RawField>,
}

impl PropertyDraft {
    /// Full validation, used for create and full update.
    pub fn validate(self) -> Result<PropertyFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(&mut errors, "title", self.title, TITLE_MAX);
        let description = self.description.unwrap_or_default().trim().to_string();
        let price = validate_price(&mut errors, self.price);
        let location = required_text(&mut errors, "location", self.location, LOCATION_MAX);
        let property_type = validate_type(&mut errors, self.property_type);
        let bedrooms = optional_integer(&mut errors, "bedrooms", self.bedrooms);
        let bathrooms = optional_integer(&mut errors, "bathrooms", self.bathrooms);
        let plot_area = optional_float(&mut errors, "plot_area", self.plot_area);
        let carpet_area = optional_float(&mut errors, "carpet_area", self.carpet_area);
        let super_builtup_area =
            optional_float(&mut errors, "super_builtup_area", self.super_builtup_area);

        match (price, property_type) {
            (Some(price), Some(property_type)) if errors.is_empty() => Ok(PropertyFields {
                title,
                description,
                price,
                location,
                property_type,
                bedrooms,
                bathrooms,
                plot_area,
                carpet_area,
                super_builtup_area,
            }),
            _ => Err(errors),
        }
    }

    /// Partial update: fields absent from the draft keep their current value.
    pub fn apply_to(self, current: &PropertyFields) -> Result<PropertyFields, ValidationErrors> {
        PropertyDraft {
            title: self.title.or_else(|| Some(current.title.clone())),
            description: self
                .description
                .or_else(|| Some(current.description.clone())),
            price: self
                .price
                .or_else(|| Some(RawField::Text(current.price.to_string()))),
            location: self.location.or_else(|| Some(current.location.clone())),
            property_type: self
                .property_type
                .or_else(|| Some(current.property_type.label().to_string())),
            bedrooms: self
                .bedrooms
                .or_else(|| current.bedrooms.map(|value| RawField::Integer(value.into()))),
            bathrooms: self
                .bathrooms
                .or_else(|| current.bathrooms.map(|value| RawField::Integer(value.into()))),
            plot_area: self.plot_area.or_else(|| current.plot_area.map(RawField::Float)),
            carpet_area: self
                .carpet_area
                .or_else(|| current.carpet_area.map(RawField::Float)),
            super_builtup_area: self
                .super_builtup_area
                .or_else(|| current.super_builtup_area.map(RawField::Float)),
        }
        .validate()
    }
}

fn validate_type(errors: &mut ValidationErrors, value: Option<String>) -> Option<PropertyType> {
    let value = value.map(|raw| raw.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        errors.add("property_type", REQUIRED);
        return None;
    }
    match value.parse::<PropertyType>() {
        Ok(kind) => Some(kind),
        Err(message) => {
            errors.add("property_type", message);
            None
        }
    }
}

fn validate_price(errors: &mut ValidationErrors, value: Option<RawField>) -> Option<Decimal> {
    let Some(raw) = value.filter(|raw| !raw.is_blank()) else {
        errors.add("price", REQUIRED);
        return None;
    };
    let Ok(price) = Decimal::from_str(&raw.as_text()) else {
        errors.add("price", "A valid number is required.");
        return None;
    };

    let scale = price.scale();
    let digits = price.mantissa().unsigned_abs().to_string().len() as u32;
    let (total, whole) = if scale == 0 {
        (digits, digits)
    } else if digits > scale {
        (digits, digits - scale)
    } else {
        (scale, 0)
    };

    let mut valid = true;
    if total > PRICE_MAX_DIGITS {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        );
        valid = false;
    }
    if scale > PRICE_DECIMAL_PLACES {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        );
        valid = false;
    }
    if whole > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        errors.add(
            "price",
            format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
            ),
        );
        valid = false;
    }
    if !valid {
        return None;
    }

    let mut price = price;
    price.rescale(PRICE_DECIMAL_PLACES);
    Some(price)
}
