use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use csv::StringRecord;
use once_cell::sync::OnceCell;

use super::literal::{format_vector, parse_vector};
use super::product::{non_blank, parse_price, Product, EMBEDDING_COLUMN, REQUIRED_COLUMNS};
use super::{Catalog, CatalogError};
use crate::embeddings::Embedder;

/// Loads the catalog file once and hands out the cached result afterwards.
///
/// When the file has no `embedding` column, every kept row is embedded and the
/// table is written back with the new column, so later loads skip the service.
/// Concurrent first callers wait on a single initialization.
pub struct CatalogStore {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
    catalog: OnceCell<Arc<Catalog>>,
}

/// Column positions resolved from the CSV header.
struct Columns {
    title: usize,
    brand: usize,
    category: usize,
    description: usize,
    colour: Option<usize>,
    price: Option<usize>,
    image: Option<usize>,
    link: Option<usize>,
    embedding: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, CatalogError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &'static str| find(name).ok_or(CatalogError::MissingColumn(name));
        let [title, brand, category, description] = REQUIRED_COLUMNS.map(require);

        Ok(Self {
            title: title?,
            brand: brand?,
            category: category?,
            description: description?,
            colour: find("colour"),
            price: find("selling_price"),
            image: find("image"),
            link: find("link"),
            embedding: find(EMBEDDING_COLUMN),
        })
    }

    /// Build a product from a record; `None` when a required field is missing.
    /// The embedding is left empty.
    fn product(&self, record: &StringRecord) -> Option<Product> {
        let optional = |idx: Option<usize>| non_blank(idx.and_then(|idx| record.get(idx)));

        Some(Product {
            title: non_blank(record.get(self.title))?,
            brand: non_blank(record.get(self.brand))?,
            category: non_blank(record.get(self.category))?,
            product_description: non_blank(record.get(self.description))?,
            colour: optional(self.colour),
            selling_price: parse_price(self.price.and_then(|idx| record.get(idx))),
            image: optional(self.image),
            link: optional(self.link),
            embedding: vec![],
        })
    }
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            path: path.into(),
            embedder,
            catalog: OnceCell::new(),
        }
    }

    /// Whether the catalog has already been loaded by this store.
    pub fn is_loaded(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// Load the catalog, reading the file only on the first successful call.
    pub fn load(&self) -> Result<Arc<Catalog>, CatalogError> {
        self.catalog
            .get_or_try_init(|| self.read_catalog().map(Arc::new))
            .cloned()
    }

    fn read_catalog(&self) -> Result<Catalog, CatalogError> {
        if let Err(err) = std::fs::metadata(&self.path) {
            return match err.kind() {
                ErrorKind::NotFound => Err(CatalogError::NotFound(self.path.clone())),
                _ => Err(err.into()),
            };
        }

        let now = Instant::now();
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let headers = csv_reader.headers()?.clone();
        let columns = Columns::resolve(&headers)?;

        let mut rows = vec![];
        let mut dropped = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            match columns.product(&record) {
                Some(product) => rows.push((record, product)),
                None => dropped += 1,
            }
        }

        log::debug!(
            "took {}ms to read csv ({} rows kept, {} dropped)",
            now.elapsed().as_micros() as f64 / 1000.0,
            rows.len(),
            dropped
        );

        let catalog = match columns.embedding {
            Some(idx) => Catalog::new(Self::parse_embeddings(rows, idx)?)?,
            None => self.backfill(&headers, rows)?,
        };

        log::info!(
            "loaded {} products ({} dimensions) from {}",
            catalog.len(),
            catalog.dimensions(),
            self.path.display()
        );

        Ok(catalog)
    }

    fn parse_embeddings(
        rows: Vec<(StringRecord, Product)>,
        idx: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        rows.into_iter()
            .enumerate()
            .map(|(row, (record, mut product))| {
                product.embedding = parse_vector(record.get(idx).unwrap_or_default())
                    .map_err(|source| CatalogError::Parse { row, source })?;
                Ok(product)
            })
            .collect()
    }

    /// Embed every kept row, then persist the table with the new column.
    /// Nothing is written unless every embedding succeeded and all of them
    /// share one dimension.
    fn backfill(
        &self,
        headers: &StringRecord,
        rows: Vec<(StringRecord, Product)>,
    ) -> Result<Catalog, CatalogError> {
        log::info!(
            "no {EMBEDDING_COLUMN} column in {}, embedding {} products with {}",
            self.path.display(),
            rows.len(),
            self.embedder.model()
        );

        let now = Instant::now();
        let mut records = Vec::with_capacity(rows.len());
        let mut products = Vec::with_capacity(rows.len());
        for (record, mut product) in rows {
            product.embedding = self.embedder.embed(&product.embedding_text())?;
            records.push(record);
            products.push(product);
        }

        log::info!(
            "embedded {} products in {}ms",
            products.len(),
            now.elapsed().as_millis()
        );

        let catalog = Catalog::new(products)?;
        self.save_with_embeddings(headers, &records, &catalog)?;

        Ok(catalog)
    }

    fn save_with_embeddings(
        &self,
        headers: &StringRecord,
        records: &[StringRecord],
        catalog: &Catalog,
    ) -> Result<(), CatalogError> {
        let width = headers.len();
        let temp_path = {
            let mut name = self.path.clone().into_os_string();
            name.push("-tmp");
            PathBuf::from(name)
        };

        let write = || -> Result<(), CatalogError> {
            let mut csv_wrt = csv::Writer::from_path(&temp_path)?;

            let mut header_row: Vec<&str> = headers.iter().collect();
            header_row.push(EMBEDDING_COLUMN);
            csv_wrt.write_record(&header_row)?;

            for (record, product) in records.iter().zip(catalog.products()) {
                let mut fields: Vec<String> = (0..width)
                    .map(|idx| record.get(idx).unwrap_or_default().to_string())
                    .collect();
                fields.push(format_vector(&product.embedding));
                csv_wrt.write_record(&fields)?;
            }

            csv_wrt.flush()?;
            Ok(())
        };

        if let Err(err) = write() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err);
        }

        std::fs::rename(&temp_path, &self.path)?;
        log::info!("saved embeddings to {}", self.path.display());

        Ok(())
    }
}
