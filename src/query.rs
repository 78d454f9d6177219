//! Storefront listing filters over a loaded catalog.

use crate::product::Product;

/// Category value the storefront uses for "no category filter".
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    category: Option<String>,
    search: Option<String>,
    in_stock_only: bool,
    featured_only: bool,
    limit: Option<usize>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Products listing: everything in stock.
    pub fn storefront() -> Self {
        Self::new().in_stock_only()
    }

    /// Home page showcase: featured, in stock, at most six.
    pub fn featured_showcase() -> Self {
        Self::new().in_stock_only().featured_only().limit(6)
    }

    /// Exact category match. `"All"` clears the filter.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = (category != ALL_CATEGORIES).then_some(category);
        self
    }

    /// Case-insensitive substring match on the product name.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into().trim().to_lowercase();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured_only = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.in_stock_only && !product.in_stock {
            return false;
        }
        if self.featured_only && !product.featured {
            return false;
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        match &self.search {
            Some(term) => product.name.to_lowercase().contains(term),
            None => true,
        }
    }

    /// Matching products, in catalog order.
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
