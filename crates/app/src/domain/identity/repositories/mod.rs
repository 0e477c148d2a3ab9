//! Identity Repositories

mod anonymous;
mod otp_codes;
mod sessions;
mod users;

pub(crate) use anonymous::PgAnonymousUsersRepository;
pub(crate) use otp_codes::PgOtpCodesRepository;
pub(crate) use sessions::PgSessionsRepository;
pub(crate) use users::PgUsersRepository;
