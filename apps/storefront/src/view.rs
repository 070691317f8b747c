//! Text rendering of the product listing.

use std::fmt::Write as _;

use client_core::ListingSnapshot;
use shared::{domain::SortField, protocol::Product};

pub const LOADING: &str = "Loading...";
pub const EMPTY: &str = "No products found";

pub fn render_controls() -> String {
    let fields: Vec<&str> = SortField::ALL
        .into_iter()
        .map(SortField::as_query_value)
        .collect();
    format!(
        "Type to search products. Commands: /sort <{}>, /toggle, /quit",
        fields.join("|")
    )
}

pub fn render_header(snapshot: &ListingSnapshot) -> String {
    let query = &snapshot.query;
    format!(
        "Products | Search: \"{}\" | Sort By: {} | [{}]",
        query.search_term,
        query.sort_by.label(),
        query.sort_order.toggle_label()
    )
}

pub fn render_listing(snapshot: &ListingSnapshot) -> String {
    let mut out = render_header(snapshot);
    out.push('\n');

    if snapshot.is_loading() {
        out.push_str(LOADING);
    } else if snapshot.products.is_empty() {
        out.push_str(EMPTY);
    } else {
        let lines: Vec<String> = snapshot.products.iter().map(render_product).collect();
        out.push_str(&lines.join("\n"));
    }
    out
}

fn render_product(product: &Product) -> String {
    let mut line = format!(
        "#{:<4} {:<40} {:>10.2}  rating {:.2}",
        product.id.0, product.title, product.price, product.rating
    );
    if let Some(brand) = product.extra.get("brand").and_then(|value| value.as_str()) {
        let _ = write!(line, "  ({brand})");
    }
    line
}
