//! Facets Repository
//!
//! Loads the active catalog slice a filter can touch. Search and stock filters are
//! pushed into SQL because no facet is counted across them; everything else is
//! filtered in memory so each dimension can be counted without its own filter.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use spareline::{
    facets::{
        AttributeDefinition, AttributeKind, AttributeOption, AttributeValue, FacetProduct, Named,
    },
    uuids::{AttributeOptionUuid, AttributeUuid, BrandUuid, CategoryUuid, ProductUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::database::try_get_amount;

const LIST_FACET_PRODUCTS_SQL: &str = include_str!("../sql/list_facet_products.sql");
const LIST_FACET_CATEGORIES_SQL: &str = include_str!("../sql/list_facet_categories.sql");
const LIST_FACET_ATTRIBUTE_VALUES_SQL: &str =
    include_str!("../sql/list_facet_attribute_values.sql");
const LIST_FILTERABLE_ATTRIBUTES_SQL: &str = include_str!("../sql/list_filterable_attributes.sql");
const LIST_ATTRIBUTE_OPTIONS_SQL: &str = include_str!("../sql/list_attribute_options.sql");

struct ProductRow(FacetProduct);

struct CategoryRow {
    product: ProductUuid,
    category: Named<CategoryUuid>,
}

struct ValueRow {
    product: ProductUuid,
    attribute: AttributeUuid,
    kind: AttributeKind,
    option: Option<AttributeOptionUuid>,
    number: Option<Decimal>,
    text: Option<String>,
}

struct AttributeRow(AttributeDefinition);

struct OptionRow {
    attribute: AttributeUuid,
    option: AttributeOption,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgFacetsRepository;

impl PgFacetsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Active products matching `search` and `in_stock`, with categories and
    /// filterable attribute values attached.
    pub(crate) async fn products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        search: Option<&str>,
        in_stock: Option<bool>,
    ) -> Result<Vec<FacetProduct>, sqlx::Error> {
        let mut products: Vec<FacetProduct> =
            query_as::<Postgres, ProductRow>(LIST_FACET_PRODUCTS_SQL)
                .bind(search)
                .bind(in_stock)
                .fetch_all(&mut **tx)
                .await?
                .into_iter()
                .map(|row| row.0)
                .collect();

        if products.is_empty() {
            return Ok(products);
        }

        let uuids: Vec<Uuid> = products.iter().map(|p| p.uuid.into_uuid()).collect();

        let index: FxHashMap<ProductUuid, usize> = products
            .iter()
            .enumerate()
            .map(|(position, product)| (product.uuid, position))
            .collect();

        let categories = query_as::<Postgres, CategoryRow>(LIST_FACET_CATEGORIES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        for row in categories {
            if let Some(product) = index.get(&row.product).and_then(|&i| products.get_mut(i)) {
                product.categories.push(row.category);
            }
        }

        let values = query_as::<Postgres, ValueRow>(LIST_FACET_ATTRIBUTE_VALUES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        for row in values {
            let Some(product) = index.get(&row.product).and_then(|&i| products.get_mut(i)) else {
                continue;
            };

            attach_value(&mut product.attributes, row);
        }

        Ok(products)
    }

    /// Filterable attributes in display order, options included.
    pub(crate) async fn attributes(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<AttributeDefinition>, sqlx::Error> {
        let mut attributes: Vec<AttributeDefinition> =
            query_as::<Postgres, AttributeRow>(LIST_FILTERABLE_ATTRIBUTES_SQL)
                .fetch_all(&mut **tx)
                .await?
                .into_iter()
                .map(|row| row.0)
                .collect();

        let options = query_as::<Postgres, OptionRow>(LIST_ATTRIBUTE_OPTIONS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        for row in options {
            if let Some(attribute) = attributes.iter_mut().find(|a| a.uuid == row.attribute) {
                attribute.options.push(row.option);
            }
        }

        Ok(attributes)
    }
}

fn attach_value(attributes: &mut FxHashMap<AttributeUuid, AttributeValue>, row: ValueRow) {
    let value = match (row.kind, row.option, row.number, row.text) {
        (AttributeKind::SelectOne | AttributeKind::SelectMany, Some(option), ..) => {
            if let Some(AttributeValue::Options(options)) = attributes.get_mut(&row.attribute) {
                options.push(option);
                return;
            }

            let mut options = SmallVec::new();
            options.push(option);

            AttributeValue::Options(options)
        }
        (AttributeKind::Number, _, Some(number), _) => AttributeValue::Number(number),
        (AttributeKind::Color, _, _, Some(text)) => AttributeValue::Color(text),
        (AttributeKind::Text, _, _, Some(text)) => AttributeValue::Text(text),
        // value stored in the wrong column for its attribute kind
        _ => return,
    };

    attributes.insert(row.attribute, value);
}

fn try_get_kind(row: &PgRow, col: &str) -> Result<AttributeKind, sqlx::Error> {
    let kind: String = row.try_get(col)?;

    AttributeKind::parse(&kind).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: format!("unknown attribute kind: {kind}").into(),
    })
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let brand_uuid: Option<Uuid> = row.try_get("brand_uuid")?;
        let brand_name: Option<String> = row.try_get("brand_name")?;

        let brand = brand_uuid.zip(brand_name).map(|(uuid, name)| Named {
            uuid: BrandUuid::from_uuid(uuid),
            name,
        });

        Ok(Self(FacetProduct {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: try_get_amount(row, "price")?,
            in_stock: row.try_get("in_stock")?,
            brand,
            categories: SmallVec::new(),
            attributes: FxHashMap::default(),
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            category: Named {
                uuid: CategoryUuid::from_uuid(row.try_get("uuid")?),
                name: row.try_get("name")?,
            },
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ValueRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            attribute: AttributeUuid::from_uuid(row.try_get("attribute_uuid")?),
            kind: try_get_kind(row, "kind")?,
            option: row
                .try_get::<Option<Uuid>, _>("option_uuid")?
                .map(AttributeOptionUuid::from_uuid),
            number: row.try_get("number_value")?,
            text: row.try_get("text_value")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AttributeRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(AttributeDefinition {
            uuid: AttributeUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            kind: try_get_kind(row, "kind")?,
            sort_order: row.try_get("sort_order")?,
            options: Vec::new(),
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for OptionRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            attribute: AttributeUuid::from_uuid(row.try_get("attribute_uuid")?),
            option: AttributeOption {
                uuid: AttributeOptionUuid::from_uuid(row.try_get("uuid")?),
                value: row.try_get("value")?,
                sort_order: row.try_get("sort_order")?,
            },
        })
    }
}
