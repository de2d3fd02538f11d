use serde::Serialize;

/// Columns a row must fill to be kept in the catalog.
pub const REQUIRED_COLUMNS: [&str; 4] = ["title", "brand", "category", "product_description"];

pub const EMBEDDING_COLUMN: &str = "embedding";

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Product {
    pub title: String,
    pub brand: String,
    pub category: String,
    pub product_description: String,

    pub colour: Option<String>,
    pub selling_price: Option<f64>,
    pub image: Option<String>,
    pub link: Option<String>,

    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl Product {
    /// Text sent to the embedding service for this product.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title, self.brand, self.category, self.product_description
        )
    }

    /// Lowercased title, category and description, concatenated without separators.
    pub fn keyword_haystack(&self) -> String {
        format!(
            "{}{}{}",
            self.title, self.category, self.product_description
        )
        .to_lowercase()
    }
}

/// Empty or whitespace-only cells count as missing.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

pub(crate) fn parse_price(value: Option<&str>) -> Option<f64> {
    let value = non_blank(value)?;
    match value.replace(',', "").parse::<f64>() {
        Ok(price) if price.is_finite() => Some(price),
        _ => {
            log::debug!("ignoring unparsable selling_price {value:?}");
            None
        }
    }
}
