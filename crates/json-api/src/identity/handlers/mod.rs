//! Identity Handlers

pub(crate) mod send_otp;
pub(crate) mod verify_otp;
