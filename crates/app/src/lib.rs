//! Storefront services and persistence over `PostgreSQL`.

pub mod context;
pub mod database;
pub mod domain;

#[cfg(test)]
mod test;
