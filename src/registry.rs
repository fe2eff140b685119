//! Command side: validated, durable inserts for the three record types.
//!
//! Name uniqueness is enforced by the UNIQUE constraint in the schema, not by
//! a check-then-insert in application code. Two concurrent registrations of
//! the same name race to the constraint and exactly one wins; the loser gets
//! `DuplicateName`.

use crate::entities::{Market, Price, Product};
use crate::error::RegistryError;
use crate::queries::{find_market_by_id, find_product_by_id};
use chrono::Utc;
use rusqlite::{params, Connection};

/// Register a new market. Fails with `DuplicateName` if the exact name is
/// already taken; nothing is written in that case.
pub fn register_market(conn: &Connection, name: &str) -> Result<Market, RegistryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::EmptyName { entity: "market" });
    }

    let result = conn.execute("INSERT INTO markets (name) VALUES (?1)", params![name]);

    match result {
        Ok(_) => Ok(Market {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        }),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(RegistryError::DuplicateName {
                entity: "market",
                name: name.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Register a new product. Uniqueness is keyed on the name alone; the brand
/// is stored as-is, with a blank or absent brand persisted as NULL.
pub fn register_product(
    conn: &Connection,
    name: &str,
    brand: Option<&str>,
) -> Result<Product, RegistryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::EmptyName { entity: "product" });
    }

    let brand = brand
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    let result = conn.execute(
        "INSERT INTO products (name, brand) VALUES (?1, ?2)",
        params![name, brand],
    );

    match result {
        Ok(_) => Ok(Product {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            brand,
        }),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(RegistryError::DuplicateName {
                entity: "product",
                name: name.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Record a price observation. The amount arrives as raw form input and must
/// parse to a finite, non-negative number; both referenced rows must exist.
/// `recorded_at` is always the current time, the caller cannot override it.
pub fn register_price(
    conn: &Connection,
    product_id: i64,
    market_id: i64,
    amount: &str,
) -> Result<Price, RegistryError> {
    let amount = parse_amount(amount)?;

    // Explicit lookups give a named error per missing parent; the foreign-key
    // pragma still backstops the insert itself.
    if find_product_by_id(conn, product_id)?.is_none() {
        return Err(RegistryError::UnknownProduct(product_id));
    }
    if find_market_by_id(conn, market_id)?.is_none() {
        return Err(RegistryError::UnknownMarket(market_id));
    }

    let recorded_at = Utc::now();

    conn.execute(
        "INSERT INTO prices (amount, recorded_at, product_id, market_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![amount, recorded_at.to_rfc3339(), product_id, market_id],
    )?;

    Ok(Price {
        id: conn.last_insert_rowid(),
        amount,
        recorded_at,
        product_id,
        market_id,
    })
}

fn parse_amount(raw: &str) -> Result<f64, RegistryError> {
    let trimmed = raw.trim();
    let amount: f64 = trimmed
        .parse()
        .map_err(|_| RegistryError::InvalidAmount(trimmed.to_string()))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(RegistryError::InvalidAmount(trimmed.to_string()));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::queries::{
        list_markets, list_recent_prices, market_count, price_count, product_count,
    };

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_register_market_fresh_name() {
        let conn = test_conn();

        let market = register_market(&conn, "Aldi").unwrap();
        assert_eq!(market.name, "Aldi");
        assert!(market.id > 0);

        let listed = list_markets(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], market);
    }

    #[test]
    fn test_register_market_duplicate_rejected() {
        let conn = test_conn();
        register_market(&conn, "Aldi").unwrap();

        let result = register_market(&conn, "Aldi");
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateName { entity: "market", .. })
        ));
        assert_eq!(market_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_register_market_trims_and_rejects_blank() {
        let conn = test_conn();

        let market = register_market(&conn, "  Aldi  ").unwrap();
        assert_eq!(market.name, "Aldi");

        let result = register_market(&conn, "   ");
        assert!(matches!(result, Err(RegistryError::EmptyName { .. })));
        assert_eq!(market_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_check_is_case_sensitive() {
        let conn = test_conn();
        register_market(&conn, "Aldi").unwrap();

        // Exact match only; a different casing is a different market
        register_market(&conn, "ALDI").unwrap();
        assert_eq!(market_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_register_product_with_and_without_brand() {
        let conn = test_conn();

        let rice = register_product(&conn, "Rice", Some("GoldenGrain")).unwrap();
        assert_eq!(rice.brand.as_deref(), Some("GoldenGrain"));

        let beans = register_product(&conn, "Beans", None).unwrap();
        assert_eq!(beans.brand, None);

        // Blank brand normalizes to NULL
        let milk = register_product(&conn, "Milk", Some("  ")).unwrap();
        assert_eq!(milk.brand, None);
    }

    #[test]
    fn test_register_product_duplicate_rejected() {
        let conn = test_conn();
        register_product(&conn, "Rice", Some("GoldenGrain")).unwrap();

        // Same name with a different brand is still a duplicate
        let result = register_product(&conn, "Rice", Some("OtherBrand"));
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateName { entity: "product", .. })
        ));
        assert_eq!(product_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_register_price_valid_amount() {
        let conn = test_conn();
        let product = register_product(&conn, "Coffee", None).unwrap();
        let market = register_market(&conn, "Aldi").unwrap();

        let price = register_price(&conn, product.id, market.id, "12.5").unwrap();
        assert_eq!(price.amount, 12.5);
        assert_eq!(price.product_id, product.id);
        assert_eq!(price.market_id, market.id);

        let recent = list_recent_prices(&conn, 5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].amount, 12.5);
        assert_eq!(recent[0].product_name, "Coffee");
        assert_eq!(recent[0].market_name, "Aldi");
    }

    #[test]
    fn test_register_price_rejects_non_numeric_amount() {
        let conn = test_conn();
        let product = register_product(&conn, "Coffee", None).unwrap();
        let market = register_market(&conn, "Aldi").unwrap();

        let result = register_price(&conn, product.id, market.id, "abc");
        assert!(matches!(result, Err(RegistryError::InvalidAmount(_))));
        assert_eq!(price_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_register_price_rejects_negative_and_nan() {
        let conn = test_conn();
        let product = register_product(&conn, "Coffee", None).unwrap();
        let market = register_market(&conn, "Aldi").unwrap();

        for bad in ["-1", "-0.01", "NaN", "inf", ""] {
            let result = register_price(&conn, product.id, market.id, bad);
            assert!(
                matches!(result, Err(RegistryError::InvalidAmount(_))),
                "amount {:?} should be rejected",
                bad
            );
        }
        assert_eq!(price_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_register_price_rejects_unknown_references() {
        let conn = test_conn();
        let product = register_product(&conn, "Coffee", None).unwrap();
        let market = register_market(&conn, "Aldi").unwrap();

        let result = register_price(&conn, 999, market.id, "1.0");
        assert!(matches!(result, Err(RegistryError::UnknownProduct(999))));

        let result = register_price(&conn, product.id, 999, "1.0");
        assert!(matches!(result, Err(RegistryError::UnknownMarket(999))));

        assert_eq!(price_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_repeated_prices_for_same_pair_allowed() {
        let conn = test_conn();
        let product = register_product(&conn, "Coffee", None).unwrap();
        let market = register_market(&conn, "Aldi").unwrap();

        register_price(&conn, product.id, market.id, "3.10").unwrap();
        register_price(&conn, product.id, market.id, "3.20").unwrap();
        register_price(&conn, product.id, market.id, "2.95").unwrap();

        assert_eq!(price_count(&conn).unwrap(), 3);
    }

    #[test]
    fn test_end_to_end_dashboard_scenario() {
        let conn = test_conn();

        let market = register_market(&conn, "MarketA").unwrap();
        let product = register_product(&conn, "ProductX", Some("BrandY")).unwrap();
        register_price(&conn, product.id, market.id, "3.49").unwrap();

        let recent = list_recent_prices(&conn, 5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].product_name, "ProductX");
        assert_eq!(recent[0].brand.as_deref(), Some("BrandY"));
        assert_eq!(recent[0].market_name, "MarketA");
        assert_eq!(recent[0].amount, 3.49);
    }
}
