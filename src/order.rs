//! Order hand-off: turns a product and quantity into a message for the
//! shop's WhatsApp number. Nothing flows back into the catalog.

use url::Url;

use crate::error::CatalogError;
use crate::product::Product;

const WHATSAPP_BASE: &str = "https://wa.me/";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest<'a> {
    product: &'a Product,
    quantity: u32,
    size: Option<String>,
}

impl<'a> OrderRequest<'a> {
    /// Quantities below one are raised to one.
    pub fn new(product: &'a Product, quantity: u32) -> Self {
        OrderRequest {
            product,
            quantity: quantity.max(1),
            size: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }

    /// The free-text order message.
    pub fn summary(&self) -> String {
        let size = self.size.as_deref().unwrap_or("One Size");
        format!(
            "Hi! I'm interested in purchasing:\n\n\
             Product: {}\n\
             Price: ${:.2}\n\
             Size: {}\n\
             Quantity: {}\n\
             Total: ${:.2}\n\n\
             Please let me know about availability and payment options.",
            self.product.name,
            self.product.price,
            size,
            self.quantity,
            self.total()
        )
    }

    /// `https://wa.me/<digits>?text=<summary>`
    pub fn whatsapp_link(&self, phone: &str) -> Result<Url, CatalogError> {
        whatsapp_link(phone, &self.summary())
    }
}

/// Deep link that opens a chat with `phone` prefilled with `message`.
///
/// `phone` may contain `+`, spaces and dashes; anything else must be a digit.
pub fn whatsapp_link(phone: &str, message: &str) -> Result<Url, CatalogError> {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CatalogError::Link(format!("invalid phone number: {:?}", phone)));
    }

    let base = format!("{}{}", WHATSAPP_BASE, digits);
    Url::parse_with_params(&base, &[("text", message)]).map_err(|e| CatalogError::Link(e.to_string()))
}
