use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest accepted product name, counted in characters.
pub const NAME_MAX_CHARS: usize = 50;

/// Lowest accepted product price.
pub const PRICE_MIN: f64 = 0.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse::<i64>().map(Self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

/// A validated product ready to be inserted. The store assigns the id.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateProductInput {
    pub name: String,
    pub price: f64,
}

/// A validated partial update. Only `Some` fields are written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl CreateProductInput {
    pub fn into_product(self, id: ProductId) -> Product {
        Product { id, name: self.name, price: self.price }
    }
}

impl UpdateProductInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }

    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
    }
}
