//! Products - the catalog's single record type, plus the inputs that create
//! and modify it.
//!
//! Records are serialized with camelCase field names (`inStock`,
//! `createdAt`, ...) so the persisted JSON and the export file share one shape.

pub mod image;
mod validate;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub use validate::{screen, validate, Candidate, Rejection, RejectReason, Screened};

pub type ProductId = u64;

/// Categories the storefront offers. The store does not enforce them.
pub const CATEGORIES: [&str; 4] = ["Men", "Women", "Shoes", "Accessories"];

/// Placeholder image used by the seeded products.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=300&width=300";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub images: Vec<String>,
    pub category: String,
    pub description: String,
    pub in_stock: bool,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_millis")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_millis")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Build a fresh record from creation input.
    pub fn from_new(id: ProductId, data: NewProduct, now: DateTime<Utc>) -> Self {
        Product {
            id,
            name: data.name,
            price: data.price,
            images: data.images,
            category: data.category,
            description: data.description,
            in_stock: data.in_stock,
            featured: data.featured,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Keep an existing `created_at` (or set it to `now`) and refresh `updated_at`.
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.created_at = self.created_at.or(Some(now));
        self.updated_at = Some(now);
        self
    }
}

/// Product data supplied by the admin page; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
}

fn default_in_stock() -> bool {
    true
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64, category: impl Into<String>) -> Self {
        NewProduct {
            name: name.into(),
            price,
            images: Vec::new(),
            category: category.into(),
            description: String::new(),
            in_stock: true,
            featured: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.images.push(image.into());
        self
    }

    /// Attach an uploaded image, stored inline as a base64 data URL.
    pub fn with_image_data(mut self, mime: &str, bytes: &[u8]) -> Self {
        self.images.push(image::data_url(mime, bytes));
        self
    }

    pub fn in_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = in_stock;
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        check_name(&self.name)?;
        check_price(self.price)
    }
}

/// Partial update. `None` fields keep their current value; id and
/// `createdAt` cannot be expressed and therefore never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = Some(in_stock);
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        Ok(())
    }

    /// Merge the set fields over `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(in_stock) = self.in_stock {
            product.in_stock = in_stock;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
    }
}

fn check_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidProduct("name must not be empty".into()));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::InvalidProduct(format!(
            "price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(())
}

/// The two products a fresh catalog is seeded with.
pub fn default_products(now: DateTime<Utc>) -> Vec<Product> {
    let now = now.trunc_subsecs(3);
    vec![
        Product::from_new(
            1,
            NewProduct::new("Pro Runner Sneakers", 129.99, "Shoes")
                .with_image(PLACEHOLDER_IMAGE)
                .with_description("High-performance running shoes with advanced cushioning")
                .featured(true),
            now,
        ),
        Product::from_new(
            2,
            NewProduct::new("Performance Track Jacket", 89.99, "Men")
                .with_image(PLACEHOLDER_IMAGE)
                .with_description("Lightweight track jacket for optimal performance")
                .featured(true),
            now,
        ),
    ]
}

/// ISO-8601 timestamps with millisecond precision (`2024-05-01T12:00:00.000Z`).
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&format(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
            None => Ok(None),
        }
    }
}
