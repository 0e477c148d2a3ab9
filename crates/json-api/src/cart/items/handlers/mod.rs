//! Cart Item Handlers

use salvo::prelude::StatusError;
use spareline::cart::{CartLineKey, LineKind};
use uuid::Uuid;

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod update;

/// Line key from the `{kind}/{uuid}` path segments.
fn line_key(kind: &str, uuid: Uuid) -> Result<CartLineKey, StatusError> {
    let kind: LineKind = kind
        .parse()
        .map_err(|error: spareline::cart::UnknownLineKind| {
            StatusError::bad_request().brief(error.to_string())
        })?;

    Ok(CartLineKey::from_parts(kind, uuid))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_both_line_kinds() -> TestResult {
        let uuid = Uuid::from_u128(5);

        assert_eq!(line_key("product", uuid)?.kind(), LineKind::Product);
        assert_eq!(line_key("offers", uuid)?.kind(), LineKind::Offer);
        assert!(line_key("bundle", uuid).is_err(), "unknown kind rejected");

        Ok(())
    }
}
