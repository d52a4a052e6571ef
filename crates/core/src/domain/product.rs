use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Simple,
    Configurable,
    Bundle,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Configurable => "configurable",
            Self::Bundle => "bundle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(Self::Simple),
            "configurable" => Some(Self::Configurable),
            "bundle" => Some(Self::Bundle),
            _ => None,
        }
    }
}

/// Catalog visibility as stored on the product row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    NotVisible,
    Catalog,
    Search,
    Both,
}

impl Visibility {
    pub fn code(&self) -> i64 {
        match self {
            Self::NotVisible => 1,
            Self::Catalog => 2,
            Self::Search => 3,
            Self::Both => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::NotVisible),
            2 => Some(Self::Catalog),
            3 => Some(Self::Search),
            4 => Some(Self::Both),
            _ => None,
        }
    }

    /// Codes shown in catalog listings.
    pub fn visible_in_catalog() -> [Visibility; 2] {
        [Self::Catalog, Self::Both]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub product_type: ProductType,
    pub visibility: Visibility,
    pub price: Decimal,
    pub final_price: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub news_from_date: Option<NaiveDateTime>,
    pub news_to_date: Option<NaiveDateTime>,
}

impl Product {
    pub fn is_discounted(&self) -> bool {
        self.final_price < self.price
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Kind of curated product-to-product association.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Related,
    Upsell,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Upsell => "upsell",
        }
    }
}
