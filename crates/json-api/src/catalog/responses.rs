//! Catalog Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::{
    facets::{AttributeFacet, AvailableFilters, FacetCount, FacetValues, ValueCount},
    uuids::TypedUuid,
};
use spareline_app::domain::catalog::records::ProductRecord;

/// Option with the number of matching products
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OptionCountResponse {
    pub uuid: Uuid,
    pub value: String,
    pub count: u64,
}

/// Distinct value with the number of matching products
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValueCountResponse {
    pub value: String,
    pub count: u64,
}

impl From<ValueCount> for ValueCountResponse {
    fn from(count: ValueCount) -> Self {
        Self {
            value: count.value,
            count: count.count,
        }
    }
}

/// Numeric span as decimal strings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct NumberRangeResponse {
    pub min: String,
    pub max: String,
}

/// Attribute Facet Response
///
/// Select attributes carry `options`, numbers carry `range`, colours and texts
/// carry `values`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AttributeFacetResponse {
    pub uuid: Uuid,
    pub name: String,

    /// `text`, `number`, `select_one`, `select_many` or `color`
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionCountResponse>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<NumberRangeResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ValueCountResponse>>,
}

impl From<AttributeFacet> for AttributeFacetResponse {
    fn from(facet: AttributeFacet) -> Self {
        let mut response = Self {
            uuid: facet.uuid.into_uuid(),
            name: facet.name,
            kind: facet.kind.as_str().to_string(),
            options: None,
            range: None,
            values: None,
        };

        match facet.values {
            FacetValues::Options(options) => {
                response.options = Some(
                    options
                        .into_iter()
                        .map(|option| OptionCountResponse {
                            uuid: option.uuid.into_uuid(),
                            value: option.value,
                            count: option.count,
                        })
                        .collect(),
                );
            }
            FacetValues::Range { min, max } => {
                response.range = Some(NumberRangeResponse {
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
            FacetValues::Colors(values) | FacetValues::Texts(values) => {
                response.values = Some(values.into_iter().map(Into::into).collect());
            }
        }

        response
    }
}

/// Category or brand with the number of matching products
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct FacetCountResponse {
    pub uuid: Uuid,
    pub name: String,
    pub count: u64,
}

impl<T> From<FacetCount<TypedUuid<T>>> for FacetCountResponse {
    fn from(count: FacetCount<TypedUuid<T>>) -> Self {
        Self {
            uuid: count.uuid.into_uuid(),
            name: count.name,
            count: count.count,
        }
    }
}

/// Price span in kopecks
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PriceRangeResponse {
    pub min: u64,
    pub max: u64,
}

/// Available Filters Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AvailableFiltersResponse {
    pub attributes: Vec<AttributeFacetResponse>,

    /// Absent when no product matches
    pub price_range: Option<PriceRangeResponse>,

    pub categories: Vec<FacetCountResponse>,
    pub brands: Vec<FacetCountResponse>,
}

impl From<AvailableFilters> for AvailableFiltersResponse {
    fn from(filters: AvailableFilters) -> Self {
        Self {
            attributes: filters.attributes.into_iter().map(Into::into).collect(),
            price_range: filters.price_range.map(|range| PriceRangeResponse {
                min: range.min,
                max: range.max,
            }),
            categories: filters.categories.into_iter().map(Into::into).collect(),
            brands: filters.brands.into_iter().map(Into::into).collect(),
        }
    }
}

/// Product Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    pub uuid: Uuid,
    pub name: String,
    pub sku: String,

    /// Price in kopecks
    pub price: u64,

    pub is_active: bool,
    pub in_stock: bool,
    pub exclude_from_promo_codes: bool,
    pub brand_uuid: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            uuid: product.uuid.into_uuid(),
            name: product.name,
            sku: product.sku,
            price: product.price,
            is_active: product.is_active,
            in_stock: product.in_stock,
            exclude_from_promo_codes: product.exclude_from_promo_codes,
            brand_uuid: product.brand_uuid.map(|brand| brand.into_uuid()),
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
        }
    }
}
