//! Service test support.


pub(crate) use context::{RecordingOtpDelivery, TestContext};
pub(crate) use db::TestDb;
