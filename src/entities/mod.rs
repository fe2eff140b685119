// Entity Models
//
// Three append-only record types: a market is a place, a product is a thing,
// a price ties the two together with an amount and a timestamp.

pub mod market;
pub mod price;
pub mod product;

pub use market::Market;
pub use price::{Price, PriceObservation};
pub use product::Product;
