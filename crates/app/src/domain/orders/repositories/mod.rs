//! Order Repositories

mod methods;
mod numbers;
mod orders;
mod statuses;

pub(crate) use methods::PgMethodsRepository;
pub(crate) use numbers::PgOrderNumbersRepository;
pub(crate) use orders::PgOrdersRepository;
pub(crate) use statuses::PgOrderStatusesRepository;
