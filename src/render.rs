//! Terminal rendering of search results.

use std::fmt::Write;

use crate::catalog::Product;
use crate::search::{QueryResult, SearchStatus};

pub const BLOCKED_MESSAGE: &str = "No Products Found, Shop from similar Categories.";
pub const NO_MATCH_MESSAGE: &str = "No results found.";
const CURRENCY: &str = "₹";
const SEPARATOR: &str = "---";

pub fn render_result(result: &QueryResult) -> String {
    let mut out = String::new();

    match result.status {
        SearchStatus::Blocked => {
            let _ = writeln!(out, "{BLOCKED_MESSAGE}");
            let _ = writeln!(out);
        }
        SearchStatus::NoMatch => {
            let _ = writeln!(out, "{NO_MATCH_MESSAGE}");
        }
        SearchStatus::Matched => {}
    }

    for hit in &result.hits {
        out.push_str(&render_card(&hit.product));
    }

    out
}

/// One result card. Missing image and link lines are left out; missing
/// colour and price print blank.
pub fn render_card(product: &Product) -> String {
    let mut out = String::new();

    if let Some(image) = &product.image {
        let _ = writeln!(out, "Image: {image}");
    }
    let _ = writeln!(out, "{}", product.title);
    let _ = writeln!(out, "Brand: {}", product.brand);
    let _ = writeln!(out, "Category: {}", product.category);
    let _ = writeln!(out, "Colour: {}", product.colour.as_deref().unwrap_or_default());
    match product.selling_price {
        // float form, so whole prices keep their ".0"
        Some(price) => {
            let _ = writeln!(out, "Price: {CURRENCY}{price:?}");
        }
        None => {
            let _ = writeln!(out, "Price: ");
        }
    }
    let _ = writeln!(out, "Description: {}", product.product_description);
    if let Some(link) = &product.link {
        let _ = writeln!(out, "View Product: {link}");
    }
    let _ = writeln!(out, "{SEPARATOR}");

    out
}
