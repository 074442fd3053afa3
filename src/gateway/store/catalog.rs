//! Catalog operations: `/products/` group and the CSV bootstrap.
//!
//! The catalog is read-mostly shared state. At startup the loader fills any
//! empty table from its CSV file and leaves non-empty tables untouched, so
//! the bootstrap is idempotent per table. Browsing always join-renders the
//! aisle and department names plus the optional enrichment columns.
//!
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, warn};

use crate::error::{ErrorKind, Result, TimeleError};
use crate::gateway::models::{
    Aisle, Department, Product, ProductDetail, ProductEnriched, ProductPage, ProductQuery,
    ProductSort,
};
use crate::gateway::store::Store;

const INSERT_CHUNK: usize = 500;

const PRODUCT_DETAIL_COLUMNS: &str =
    "p.product_id, p.product_name, p.aisle_id, a.aisle, p.department_id, d.department, \
     pe.description, pe.price, pe.image_url";

const PRODUCT_DETAIL_FROM: &str = "FROM products p \
     JOIN aisles a ON a.aisle_id = p.aisle_id \
     JOIN departments d ON d.department_id = p.department_id \
     LEFT JOIN product_enriched pe ON pe.product_id = p.product_id";

/// Catalog operations.
///
pub struct Catalog<'s> {
    store: &'s Store,
}

impl<'s> Catalog<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    // ===== [ CSV bootstrap ] =====

    /// Parses a CSV file into a vector of `T`.
    ///
    /// This function will return an error if the file cannot be read or a
    /// row cannot be parsed. A UTF-8 header row is required.
    fn parse_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: T = result.map_err(|e| {
                TimeleError::Internal(format!("CSV parse error in {}: {e}", path.display()))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    async fn table_is_empty(&self, table: &str) -> Result<bool> {
        // Table names come from the fixed list below, never from input.
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.store.pool())
            .await?;
        Ok(count == 0)
    }

    /// Loads the catalog from CSVs on the mounted data directory.
    ///
    /// Each table loads only when empty and its file exists: `departments`
    /// and `aisles` first (products reference them), then `products`, then
    /// the optional enrichment files. Runs before the gateway accepts
    /// traffic.
    pub async fn bootstrap(&self, csv_dir: &Path) -> Result<()> {
        if self.table_is_empty("departments").await? {
            let path = csv_dir.join("departments.csv");
            if path.is_file() {
                let rows: Vec<Department> = Self::parse_csv(&path)?;
                self.insert_departments(&rows).await?;
                info!(rows = rows.len(), "loaded departments from CSV");
            } else {
                warn!(path = %path.display(), "departments table empty and CSV missing");
            }
        }
        if self.table_is_empty("aisles").await? {
            let path = csv_dir.join("aisles.csv");
            if path.is_file() {
                let rows: Vec<Aisle> = Self::parse_csv(&path)?;
                self.insert_aisles(&rows).await?;
                info!(rows = rows.len(), "loaded aisles from CSV");
            }
        }
        if self.table_is_empty("products").await? {
            let path = csv_dir.join("products.csv");
            if path.is_file() {
                let rows: Vec<Product> = Self::parse_csv(&path)?;
                self.insert_products(&rows).await?;
                info!(rows = rows.len(), "loaded products from CSV");
            }
        }
        if self.table_is_empty("product_enriched").await? {
            let files = enrichment_files(csv_dir)?;
            if !files.is_empty() {
                let known = self.known_product_ids().await?;
                let mut rows: Vec<ProductEnriched> = Vec::new();
                for file in &files {
                    let mut parsed: Vec<ProductEnriched> = Self::parse_csv(file)?;
                    parsed.retain(|r| known.contains(&r.product_id));
                    rows.append(&mut parsed);
                }
                self.insert_enriched(&rows).await?;
                info!(
                    rows = rows.len(),
                    files = files.len(),
                    "loaded product enrichment from CSV"
                );
            }
        }
        Ok(())
    }

    async fn known_product_ids(&self) -> Result<HashSet<i32>> {
        let ids: Vec<(i32,)> = sqlx::query_as("SELECT product_id FROM products")
            .fetch_all(self.store.pool())
            .await?;
        Ok(ids.into_iter().map(|r| r.0).collect())
    }

    async fn insert_departments(&self, rows: &[Department]) -> Result<()> {
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO departments (department_id, department) ");
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.department_id).push_bind(&row.department);
            });
            qb.push(" ON CONFLICT (department_id) DO NOTHING");
            qb.build().execute(self.store.pool()).await?;
        }
        Ok(())
    }

    async fn insert_aisles(&self, rows: &[Aisle]) -> Result<()> {
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO aisles (aisle_id, aisle) ");
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.aisle_id).push_bind(&row.aisle);
            });
            qb.push(" ON CONFLICT (aisle_id) DO NOTHING");
            qb.build().execute(self.store.pool()).await?;
        }
        Ok(())
    }

    async fn insert_products(&self, rows: &[Product]) -> Result<()> {
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO products (product_id, product_name, aisle_id, department_id) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.product_id)
                    .push_bind(&row.product_name)
                    .push_bind(row.aisle_id)
                    .push_bind(row.department_id);
            });
            qb.push(" ON CONFLICT (product_id) DO NOTHING");
            qb.build().execute(self.store.pool()).await?;
        }
        Ok(())
    }

    async fn insert_enriched(&self, rows: &[ProductEnriched]) -> Result<()> {
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO product_enriched (product_id, description, price, image_url) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.product_id)
                    .push_bind(&row.description)
                    .push_bind(row.price)
                    .push_bind(&row.image_url);
            });
            qb.push(" ON CONFLICT (product_id) DO NOTHING");
            qb.build().execute(self.store.pool()).await?;
        }
        Ok(())
    }

    // ===== [ Browse and lookup ] =====

    /// Lists products under the given filters, sort key and page window.
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) {PRODUCT_DETAIL_FROM}"));
        apply_filters(&mut count_qb, query);
        let (total,): (i64,) = count_qb
            .build_query_as()
            .fetch_one(self.store.pool())
            .await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_DETAIL_COLUMNS} {PRODUCT_DETAIL_FROM}"));
        apply_filters(&mut qb, query);
        qb.push(order_clause(query.sort));
        qb.push(" LIMIT ").push_bind(query.limit);
        qb.push(" OFFSET ").push_bind(query.offset);
        let products: Vec<ProductDetail> = qb
            .build_query_as()
            .fetch_all(self.store.pool())
            .await?;

        Ok(ProductPage {
            products,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    /// Fetches one product with its joined attributes.
    pub async fn get(&self, product_id: i32) -> Result<ProductDetail> {
        let row: Option<ProductDetail> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_DETAIL_COLUMNS} {PRODUCT_DETAIL_FROM} WHERE p.product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(self.store.pool())
        .await?;
        row.ok_or_else(|| TimeleError::service(ErrorKind::NotFound, "product not found"))
    }

    /// Bulk id-set lookup used to splice attributes into recommendation
    /// results with one round-trip.
    pub async fn lookup(&self, product_ids: &[i32]) -> Result<Vec<ProductDetail>> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }
        let rows: Vec<ProductDetail> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_DETAIL_COLUMNS} {PRODUCT_DETAIL_FROM} WHERE p.product_id = ANY($1)"
        ))
        .bind(product_ids)
        .fetch_all(self.store.pool())
        .await?;
        Ok(rows)
    }
}

/// Lists the optional `enriched_products_dept*.csv` files, sorted by name.
fn enrichment_files(csv_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(csv_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(files),
    };
    for entry in entries {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.starts_with("enriched_products_dept") && name.ends_with(".csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    qb.push(" WHERE 1 = 1");
    if !query.categories.is_empty() {
        let lowered: Vec<String> = query
            .categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        qb.push(" AND lower(d.department) = ANY(");
        qb.push_bind(lowered);
        qb.push(")");
    }
    if let Some(search) = &query.search {
        qb.push(" AND p.product_name ILIKE ");
        qb.push_bind(format!("%{}%", search.trim()));
    }
    if let Some(department_id) = query.department_id {
        qb.push(" AND p.department_id = ");
        qb.push_bind(department_id);
    }
    if let Some(aisle_id) = query.aisle_id {
        qb.push(" AND p.aisle_id = ");
        qb.push_bind(aisle_id);
    }
}

fn order_clause(sort: Option<ProductSort>) -> &'static str {
    match sort {
        Some(ProductSort::Price) => " ORDER BY pe.price ASC NULLS LAST, p.product_id ASC",
        // No creation column exists in the source data; id order tracks
        // catalog age.
        Some(ProductSort::CreatedAt) => " ORDER BY p.product_id ASC",
        Some(ProductSort::Popularity) => {
            " ORDER BY (SELECT COUNT(*) FROM order_items oi \
                 WHERE oi.product_id = p.product_id) DESC, p.product_id ASC"
        }
        // No rating data exists; fall back to name order.
        Some(ProductSort::Rating) | Some(ProductSort::Name) => {
            " ORDER BY p.product_name ASC, p.product_id ASC"
        }
        None => " ORDER BY p.product_id ASC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_always_has_stable_tiebreak() {
        for sort in [
            None,
            Some(ProductSort::Name),
            Some(ProductSort::Price),
            Some(ProductSort::CreatedAt),
            Some(ProductSort::Popularity),
            Some(ProductSort::Rating),
        ] {
            assert!(order_clause(sort).contains("p.product_id ASC"));
        }
    }

    #[test]
    fn test_enrichment_files_filters_by_prefix() {
        let dir = std::env::temp_dir().join(format!("timele-cat-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("enriched_products_dept1.csv"), "a").unwrap();
        std::fs::write(dir.join("enriched_products_dept2.csv"), "a").unwrap();
        std::fs::write(dir.join("products.csv"), "a").unwrap();
        std::fs::write(dir.join("notes.txt"), "a").unwrap();

        let files = enrichment_files(&dir).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["enriched_products_dept1.csv", "enriched_products_dept2.csv"]
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_yields_no_enrichment_files() {
        let files = enrichment_files(Path::new("/nonexistent/timele")).unwrap();
        assert!(files.is_empty());
    }
}
