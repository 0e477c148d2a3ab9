//! Catalog Repositories

mod facets;
mod products;

pub(crate) use facets::PgFacetsRepository;
pub(crate) use products::PgProductsRepository;
