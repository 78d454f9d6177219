//! Structural screening of untrusted product JSON.
//!
//! Every path that reads records from outside the process (primary slot,
//! backup slot, import file) goes through [`screen`]. A candidate either maps
//! onto a typed [`Product`] or is rejected; nothing is repaired or coerced.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use super::{iso_millis, Product, ProductId};

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    NotAnObject,
    /// The named field is missing or has the wrong type.
    Field(&'static str),
    /// An earlier record already uses this id.
    DuplicateId(ProductId),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotAnObject => write!(f, "record is not an object"),
            RejectReason::Field(field) => write!(f, "field `{}` is missing or malformed", field),
            RejectReason::DuplicateId(id) => write!(f, "duplicate id {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Position of the record in the source array.
    pub index: usize,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Valid(Product),
    Rejected(RejectReason),
}

/// Result of screening a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screened {
    pub valid: Vec<Product>,
    pub rejected: Vec<Rejection>,
}

/// Check one candidate record against the product schema.
///
/// `id` must be a non-negative integer (`1` and `1.0` both qualify; negative
/// ids cannot be represented and are rejected), `price` a non-negative number,
/// `images` an array of strings, `name`/`category`/`description` strings and
/// `inStock`/`featured` booleans. Timestamps are optional; unparseable ones
/// are treated as absent and get stamped on the next save.
pub fn validate(value: &Value) -> Candidate {
    match parse(value) {
        Ok(product) => Candidate::Valid(product),
        Err(reason) => Candidate::Rejected(reason),
    }
}

/// Screen a batch, keeping valid records in order and the first record per id.
pub fn screen(values: &[Value]) -> Screened {
    let mut seen = HashSet::new();
    let mut screened = Screened::default();

    for (index, value) in values.iter().enumerate() {
        match validate(value) {
            Candidate::Valid(product) => {
                if seen.insert(product.id) {
                    screened.valid.push(product);
                } else {
                    screened.rejected.push(Rejection {
                        index,
                        reason: RejectReason::DuplicateId(product.id),
                    });
                }
            }
            Candidate::Rejected(reason) => screened.rejected.push(Rejection { index, reason }),
        }
    }

    screened
}

fn parse(value: &Value) -> Result<Product, RejectReason> {
    let obj = value.as_object().ok_or(RejectReason::NotAnObject)?;

    let id = obj.get("id").and_then(id_value).ok_or(RejectReason::Field("id"))?;
    let price = obj
        .get("price")
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or(RejectReason::Field("price"))?;
    let images = obj
        .get("images")
        .and_then(Value::as_array)
        .ok_or(RejectReason::Field("images"))?
        .iter()
        .map(|img| img.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or(RejectReason::Field("images"))?;

    Ok(Product {
        id,
        name: string_field(obj, "name")?,
        price,
        images,
        category: string_field(obj, "category")?,
        description: string_field(obj, "description")?,
        in_stock: bool_field(obj, "inStock")?,
        featured: bool_field(obj, "featured")?,
        created_at: obj
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(iso_millis::parse),
        updated_at: obj
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(iso_millis::parse),
    })
}

fn id_value(value: &Value) -> Option<ProductId> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as ProductId)
    })
}

fn string_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, RejectReason> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(RejectReason::Field(field))
}

fn bool_field(obj: &Map<String, Value>, field: &'static str) -> Result<bool, RejectReason> {
    obj.get(field)
        .and_then(Value::as_bool)
        .ok_or(RejectReason::Field(field))
}
