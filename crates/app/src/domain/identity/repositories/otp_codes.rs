//! OTP Codes Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::identity::records::{OtpCodeRecord, OtpCodeUuid};

const CREATE_OTP_CODE_SQL: &str = include_str!("../sql/create_otp_code.sql");
const EXPIRE_OTP_CODES_SQL: &str = include_str!("../sql/expire_otp_codes.sql");
const LOCK_LATEST_OTP_CODE_SQL: &str = include_str!("../sql/lock_latest_otp_code.sql");
const RECORD_OTP_ATTEMPT_SQL: &str = include_str!("../sql/record_otp_attempt.sql");
const CONSUME_OTP_CODE_SQL: &str = include_str!("../sql/consume_otp_code.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOtpCodesRepository;

impl PgOtpCodesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Store a new code for `phone`, closing every earlier one.
    pub(crate) async fn replace(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
        code_hash: &str,
        now: Timestamp,
        expires_at: Timestamp,
    ) -> Result<OtpCodeUuid, sqlx::Error> {
        query(EXPIRE_OTP_CODES_SQL)
            .bind(phone)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?;

        let uuid = OtpCodeUuid::new();

        query(CREATE_OTP_CODE_SQL)
            .bind(uuid.into_uuid())
            .bind(phone)
            .bind(code_hash)
            .bind(SqlxTimestamp::from(expires_at))
            .execute(&mut **tx)
            .await?;

        Ok(uuid)
    }

    pub(crate) async fn lock_latest(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
        now: Timestamp,
    ) -> Result<Option<OtpCodeRecord>, sqlx::Error> {
        query_as::<Postgres, OtpCodeRecord>(LOCK_LATEST_OTP_CODE_SQL)
            .bind(phone)
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn record_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OtpCodeUuid,
    ) -> Result<(), sqlx::Error> {
        query(RECORD_OTP_ATTEMPT_SQL)
            .bind(uuid.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn consume(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OtpCodeUuid,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(CONSUME_OTP_CODE_SQL)
            .bind(uuid.into_uuid())
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for OtpCodeRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let attempts: i32 = row.try_get("attempts")?;

        Ok(Self {
            uuid: OtpCodeUuid::from_uuid(row.try_get("uuid")?),
            phone: row.try_get("phone")?,
            code_hash: row.try_get("code_hash")?,
            attempts: u32::try_from(attempts).map_err(|e| sqlx::Error::ColumnDecode {
                index: "attempts".to_string(),
                source: Box::new(e),
            })?,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
        })
    }
}
