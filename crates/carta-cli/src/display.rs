//! Text rendering for storefront records.

use carta_core::{Category, Product};
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount the way the storefront shows prices: dot thousands
/// separator, comma decimals (only when there are cents), `COP` suffix.
pub(crate) fn format_cop(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let whole = group_thousands(whole);
    if cents == "00" {
        format!("{sign}{whole} COP")
    } else {
        format!("{sign}{whole},{cents} COP")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

pub(crate) fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("no categories");
        return;
    }
    println!("{:<8}NAME", "ID");
    for category in categories {
        println!("{:<8}{}", category.id, category.name);
    }
}

pub(crate) fn print_product_table(products: &[Product]) {
    if products.is_empty() {
        println!("no products");
        return;
    }
    println!("{:<8}{:<32}{:>16}  STATUS", "ID", "NAME", "PRICE");
    for product in products {
        let status = if product.is_listed_available() {
            "available"
        } else {
            "sold out"
        };
        println!(
            "{:<8}{:<32}{:>16}  {status}",
            product.id,
            truncate(&product.name, 30),
            format_cop(product.price),
        );
    }
}

pub(crate) fn print_product_detail(product: &Product) {
    println!("{} (#{})", product.name, product.id);
    if let Some(description) = &product.description {
        println!("{description}");
    }
    if let Some(kind) = &product.kind {
        println!("Type: {kind}");
    }
    if !product.ingredients.is_empty() {
        println!("Ingredients: {}", product.ingredients.join(", "));
    }

    if product.requires_size() {
        println!("Sizes:");
        for (size, price) in product.size_options() {
            println!("  {size:<16}{}", format_cop(price));
        }
    } else {
        println!("Price: {}", format_cop(product.price));
    }

    if product.is_combo() {
        println!("Includes:");
        for item in &product.combo_items {
            let note = if item.available { "" } else { " (unavailable)" };
            println!("  {} x {}{note}", item.quantity, item.name);
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars - 3).collect::<String>())
    } else {
        text.to_owned()
    }
}
