//! Read side: listing and lookup functions feeding the views.
//!
//! Every listing is explicitly sorted; nothing relies on insertion order.

use crate::entities::{Market, Price, PriceObservation, Product};
use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// How many observations the dashboard shows by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

pub fn list_markets(conn: &Connection) -> Result<Vec<Market>, RegistryError> {
    let mut stmt = conn.prepare("SELECT id, name FROM markets ORDER BY name ASC")?;

    let markets = stmt
        .query_map([], |row| {
            Ok(Market {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(markets)
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>, RegistryError> {
    let mut stmt = conn.prepare("SELECT id, name, brand FROM products ORDER BY name ASC")?;

    let products = stmt
        .query_map([], |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
                brand: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(products)
}

/// The `limit` most recent observations, newest first, each joined with its
/// product and market for display. Ties on recorded_at fall back to insertion
/// order (rowid), so back-to-back inserts still list newest first.
pub fn list_recent_prices(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<PriceObservation>, RegistryError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, pr.name, pr.brand, m.name, p.amount, p.recorded_at
         FROM prices p
         JOIN products pr ON pr.id = p.product_id
         JOIN markets m ON m.id = p.market_id
         ORDER BY p.recorded_at DESC, p.id DESC
         LIMIT ?1",
    )?;

    let observations = stmt
        .query_map(params![limit as i64], |row| {
            Ok(PriceObservation {
                id: row.get(0)?,
                product_name: row.get(1)?,
                brand: row.get(2)?,
                market_name: row.get(3)?,
                amount: row.get(4)?,
                recorded_at: parse_recorded_at(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(observations)
}

pub fn find_market_by_id(conn: &Connection, id: i64) -> Result<Option<Market>, RegistryError> {
    let market = conn
        .query_row(
            "SELECT id, name FROM markets WHERE id = ?1",
            params![id],
            |row| {
                Ok(Market {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(market)
}

pub fn find_product_by_id(conn: &Connection, id: i64) -> Result<Option<Product>, RegistryError> {
    let product = conn
        .query_row(
            "SELECT id, name, brand FROM products WHERE id = ?1",
            params![id],
            |row| {
                Ok(Product {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    brand: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(product)
}

pub fn market_count(conn: &Connection) -> Result<i64, RegistryError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM markets", [], |row| row.get(0))?;
    Ok(count)
}

pub fn product_count(conn: &Connection) -> Result<i64, RegistryError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
    Ok(count)
}

pub fn price_count(conn: &Connection) -> Result<i64, RegistryError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;
    Ok(count)
}

/// One price row by id, unjoined.
pub fn find_price_by_id(conn: &Connection, id: i64) -> Result<Option<Price>, RegistryError> {
    let price = conn
        .query_row(
            "SELECT id, amount, recorded_at, product_id, market_id
             FROM prices WHERE id = ?1",
            params![id],
            |row| {
                Ok(Price {
                    id: row.get(0)?,
                    amount: row.get(1)?,
                    recorded_at: parse_recorded_at(row, 2)?,
                    product_id: row.get(3)?,
                    market_id: row.get(4)?,
                })
            },
        )
        .optional()?;

    Ok(price)
}

fn parse_recorded_at(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::registry::{register_market, register_price, register_product};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_markets_listed_alphabetically() {
        let conn = test_conn();
        register_market(&conn, "Walmart").unwrap();
        register_market(&conn, "Aldi").unwrap();
        register_market(&conn, "Lidl").unwrap();

        let names: Vec<String> = list_markets(&conn)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Aldi", "Lidl", "Walmart"]);
    }

    #[test]
    fn test_products_listed_alphabetically() {
        let conn = test_conn();
        register_product(&conn, "Rice", Some("GoldenGrain")).unwrap();
        register_product(&conn, "Beans", None).unwrap();
        register_product(&conn, "Milk", Some("DairyCo")).unwrap();

        let names: Vec<String> = list_products(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Beans", "Milk", "Rice"]);
    }

    #[test]
    fn test_recent_prices_capped_and_descending() {
        let conn = test_conn();
        let product = register_product(&conn, "Coffee", None).unwrap();
        let market = register_market(&conn, "Corner Shop").unwrap();

        for i in 0..7 {
            let amount = format!("{}.00", i + 1);
            register_price(&conn, product.id, market.id, &amount).unwrap();
        }

        let recent = list_recent_prices(&conn, 5).unwrap();
        assert_eq!(recent.len(), 5);

        // Newest first, even when timestamps collide within the same tick
        assert_eq!(recent[0].amount, 7.0);
        for pair in recent.windows(2) {
            assert!(pair[0].recorded_at >= pair[1].recorded_at);
        }
    }

    #[test]
    fn test_find_by_id_returns_none_when_absent() {
        let conn = test_conn();
        assert!(find_market_by_id(&conn, 42).unwrap().is_none());
        assert!(find_product_by_id(&conn, 42).unwrap().is_none());
        assert!(find_price_by_id(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_find_by_id_returns_registered_row() {
        let conn = test_conn();
        let market = register_market(&conn, "Aldi").unwrap();

        let found = find_market_by_id(&conn, market.id).unwrap().unwrap();
        assert_eq!(found, market);
    }

    #[test]
    fn test_counts_track_inserts() {
        let conn = test_conn();
        assert_eq!(market_count(&conn).unwrap(), 0);

        register_market(&conn, "Aldi").unwrap();
        register_market(&conn, "Lidl").unwrap();
        assert_eq!(market_count(&conn).unwrap(), 2);
        assert_eq!(product_count(&conn).unwrap(), 0);
        assert_eq!(price_count(&conn).unwrap(), 0);
    }
}
