//! Catalog types.
//!
//! The classic three-table catalog (products, aisles, departments) keeps the
//! integer ids of the source CSVs; the optional enrichment side-table carries
//! description, price and image URL. The same serde structs drive both the
//! CSV bootstrap (via `csv::Reader::deserialize`) and the wire contract.
//!
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, TimeleError};

/// One row of `aisles.csv` / the `aisles` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Aisle {
    pub aisle_id: i32,
    pub aisle: String,
}

/// One row of `departments.csv` / the `departments` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub department_id: i32,
    pub department: String,
}

/// One row of `products.csv` / the `products` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: i32,
    pub product_name: String,
    pub aisle_id: i32,
    pub department_id: i32,
}

/// One row of an `enriched_products_dept*.csv` file / the `product_enriched`
/// table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductEnriched {
    pub product_id: i32,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// A product join-rendered with its aisle, department and enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductDetail {
    pub product_id: i32,
    pub product_name: String,
    pub aisle_id: i32,
    pub aisle: String,
    pub department_id: i32,
    pub department: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// A page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<ProductDetail>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Bulk id-set lookup payload, used by the edge to splice product attributes
/// into recommendation results with a single round-trip.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductLookup {
    pub product_ids: Vec<i32>,
}

/// Sort keys accepted on catalog listings.
///
/// `popularity` orders by how often a product appears in order items;
/// `rating` has no backing data and falls back to name order (accepted so
/// clients sending it never see a 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    Name,
    Price,
    CreatedAt,
    Popularity,
    Rating,
}

impl ProductSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductSort::Name => "name",
            ProductSort::Price => "price",
            ProductSort::CreatedAt => "createdAt",
            ProductSort::Popularity => "popularity",
            ProductSort::Rating => "rating",
        }
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProductSort {
    type Err = TimeleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProductSort::Name),
            "price" => Ok(ProductSort::Price),
            "createdAt" => Ok(ProductSort::CreatedAt),
            "popularity" => Ok(ProductSort::Popularity),
            "rating" => Ok(ProductSort::Rating),
            other => Err(TimeleError::service(
                ErrorKind::InvalidInput,
                format!("unknown sort key `{other}`"),
            )),
        }
    }
}

/// Query shape for catalog listings on the internal contract.
///
/// `categories` holds department names compared case-insensitively; on the
/// internal wire they travel as one comma-separated parameter.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub limit: i64,
    pub offset: i64,
    pub sort: Option<ProductSort>,
    pub categories: Vec<String>,
    pub search: Option<String>,
    pub department_id: Option<i32>,
    pub aisle_id: Option<i32>,
}

impl ProductQuery {
    /// Clamps `limit` into 1..=100 (default 20) and `offset` to >= 0.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(20).clamp(1, 100),
            offset: offset.unwrap_or(0).max(0),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_keys_round_trip() {
        for key in ["name", "price", "createdAt", "popularity", "rating"] {
            assert_eq!(key.parse::<ProductSort>().unwrap().as_str(), key);
        }
        assert!("bestseller".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_query_clamps() {
        let q = ProductQuery::clamped(Some(1000), Some(-5));
        assert_eq!(q.limit, 100);
        assert_eq!(q.offset, 0);

        let q = ProductQuery::clamped(None, None);
        assert_eq!(q.limit, 20);
        assert_eq!(q.offset, 0);

        let q = ProductQuery::clamped(Some(0), Some(40));
        assert_eq!(q.limit, 1);
        assert_eq!(q.offset, 40);
    }

    #[test]
    fn test_product_csv_row_shape() {
        let csv_data = "product_id,product_name,aisle_id,department_id\n\
                        1,Chocolate Sandwich Cookies,61,19\n\
                        2,All-Seasons Salt,104,13\n";
        let mut rdr = csv::Reader::from_reader(csv_data.as_bytes());
        let rows: Vec<Product> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, 1);
        assert_eq!(rows[1].product_name, "All-Seasons Salt");
    }

    #[test]
    fn test_enriched_csv_row_shape() {
        let csv_data = "product_id,description,price,image_url\n\
                        2,A salt for all seasons,4.99,https://img.example.com/2.png\n\
                        3,,,\n";
        let mut rdr = csv::Reader::from_reader(csv_data.as_bytes());
        let rows: Vec<ProductEnriched> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, Some(Decimal::new(499, 2)));
        assert!(rows[1].price.is_none());
        assert!(rows[1].description.is_none());
    }
}
