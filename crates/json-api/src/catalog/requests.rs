//! Catalog Requests

use std::{collections::BTreeMap, str::FromStr};

use rust_decimal::Decimal;
use salvo::{http::StatusError, oapi::ToSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::{
    facets::{AttributeSelection, ProductFilter},
    uuids::{AttributeOptionUuid, AttributeUuid},
};

/// Selection for one attribute. Set exactly one of `option_uuids`, `min`/`max`,
/// `colors` and `text`.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct AttributeSelectionRequest {
    pub attribute_uuid: Uuid,

    /// Any of these options
    pub option_uuids: Option<Vec<Uuid>>,

    /// Inclusive lower bound, as a decimal string
    pub min: Option<String>,

    /// Inclusive upper bound, as a decimal string
    pub max: Option<String>,

    /// Any of these colours
    pub colors: Option<Vec<String>>,

    /// Case-insensitive substring
    pub text: Option<String>,
}

impl TryFrom<AttributeSelectionRequest> for AttributeSelection {
    type Error = StatusError;

    fn try_from(request: AttributeSelectionRequest) -> Result<Self, Self::Error> {
        let is_range = request.min.is_some() || request.max.is_some();

        let forms = [
            request.option_uuids.is_some(),
            is_range,
            request.colors.is_some(),
            request.text.is_some(),
        ];

        if forms.into_iter().filter(|set| *set).count() != 1 {
            return Err(StatusError::bad_request().brief(format!(
                "attribute {} needs exactly one selection",
                request.attribute_uuid
            )));
        }

        if let Some(options) = request.option_uuids {
            return Ok(Self::Options(
                options.into_iter().map(AttributeOptionUuid::from).collect(),
            ));
        }

        if let Some(colors) = request.colors {
            return Ok(Self::Colors(colors));
        }

        if let Some(text) = request.text {
            return Ok(Self::Text(text));
        }

        Ok(Self::Range {
            min: request.min.as_deref().map(decimal).transpose()?,
            max: request.max.as_deref().map(decimal).transpose()?,
        })
    }
}

fn decimal(value: &str) -> Result<Decimal, StatusError> {
    Decimal::from_str(value.trim())
        .map_err(|_ignored| StatusError::bad_request().brief(format!("invalid number: {value}")))
}

/// Product Filter Request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductFilterRequest {
    /// Substring of the product name or SKU
    pub search: Option<String>,

    #[serde(default)]
    pub category_uuids: Vec<Uuid>,

    #[serde(default)]
    pub brand_uuids: Vec<Uuid>,

    /// Lowest price in kopecks
    pub min_price: Option<u64>,

    /// Highest price in kopecks
    pub max_price: Option<u64>,

    pub in_stock: Option<bool>,

    #[serde(default)]
    pub attributes: Vec<AttributeSelectionRequest>,
}

impl TryFrom<ProductFilterRequest> for ProductFilter {
    type Error = StatusError;

    fn try_from(request: ProductFilterRequest) -> Result<Self, Self::Error> {
        let mut attributes = BTreeMap::new();

        for selection in request.attributes {
            let uuid = AttributeUuid::from(selection.attribute_uuid);

            if attributes.insert(uuid, selection.try_into()?).is_some() {
                return Err(StatusError::bad_request()
                    .brief(format!("attribute {uuid} is selected twice")));
            }
        }

        Ok(Self {
            search: request.search,
            category_uuids: request.category_uuids.into_iter().map(Into::into).collect(),
            brand_uuids: request.brand_uuids.into_iter().map(Into::into).collect(),
            min_price: request.min_price,
            max_price: request.max_price,
            in_stock: request.in_stock,
            attributes,
        })
    }
}
