//! Catalog facets
//!
//! Given the active products of the catalog and a filter, computes which filter values
//! are still worth offering. Counts are disjunctive: every dimension is counted over
//! the products that match all *other* active filters, so selecting one brand does not
//! hide the remaining brands.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    errors::{ValidationError, optional_text},
    uuids::{AttributeOptionUuid, AttributeUuid, BrandUuid, CategoryUuid, ProductUuid},
};

const SEARCH_MAX: usize = 200;

/// How an attribute's values are typed and filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Free text, filtered by substring.
    Text,

    /// Number, filtered by range.
    Number,

    /// One option per product.
    SelectOne,

    /// Several options per product.
    SelectMany,

    /// Colour name or hex code.
    Color,
}

impl AttributeKind {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Number => "NUMBER",
            Self::SelectOne => "SELECT_ONE",
            Self::SelectMany => "SELECT_MANY",
            Self::Color => "COLOR",
        }
    }

    /// Parse the database representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TEXT" => Some(Self::Text),
            "NUMBER" => Some(Self::Number),
            "SELECT_ONE" => Some(Self::SelectOne),
            "SELECT_MANY" => Some(Self::SelectMany),
            "COLOR" => Some(Self::Color),
            _ => None,
        }
    }
}

/// An identifier paired with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named<T> {
    /// Identifier
    pub uuid: T,

    /// Display name
    pub name: String,
}

/// A filterable attribute option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeOption {
    /// Identifier
    pub uuid: AttributeOptionUuid,

    /// Display value
    pub value: String,

    /// Position among the attribute's options
    pub sort_order: i32,
}

/// A filterable attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    /// Identifier
    pub uuid: AttributeUuid,

    /// Display name
    pub name: String,

    /// Value type
    pub kind: AttributeKind,

    /// Position among attributes
    pub sort_order: i32,

    /// Options, for select attributes
    pub options: Vec<AttributeOption>,
}

/// A product's value for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Selected options.
    Options(SmallVec<[AttributeOptionUuid; 2]>),

    /// Numeric value.
    Number(Decimal),

    /// Colour.
    Color(String),

    /// Text.
    Text(String),
}

/// The facet-relevant view of an active product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetProduct {
    /// Identifier
    pub uuid: ProductUuid,

    /// Name, searched by [`ProductFilter::search`]
    pub name: String,

    /// Stock keeping unit, searched by [`ProductFilter::search`]
    pub sku: String,

    /// Price in kopecks
    pub price: u64,

    /// Whether the product is in stock
    pub in_stock: bool,

    /// Brand
    pub brand: Option<Named<BrandUuid>>,

    /// Categories
    pub categories: SmallVec<[Named<CategoryUuid>; 2]>,

    /// Attribute values
    pub attributes: FxHashMap<AttributeUuid, AttributeValue>,
}

/// What a filter requires of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelection {
    /// Any of these options, for select attributes.
    Options(Vec<AttributeOptionUuid>),

    /// Inclusive numeric range; open on a missing bound.
    Range {
        /// Lower bound
        min: Option<Decimal>,

        /// Upper bound
        max: Option<Decimal>,
    },

    /// Any of these colours, compared case-insensitively.
    Colors(Vec<String>),

    /// Case-insensitive substring.
    Text(String),
}

impl AttributeSelection {
    fn matches(&self, value: Option<&AttributeValue>) -> bool {
        match (self, value) {
            (Self::Options(wanted), Some(AttributeValue::Options(options))) => {
                wanted.is_empty() || options.iter().any(|option| wanted.contains(option))
            }
            (Self::Range { min, max }, Some(AttributeValue::Number(number))) => {
                min.is_none_or(|min| *number >= min) && max.is_none_or(|max| *number <= max)
            }
            (Self::Colors(wanted), Some(AttributeValue::Color(color))) => {
                wanted.is_empty() || wanted.iter().any(|want| want.eq_ignore_ascii_case(color))
            }
            (Self::Text(needle), Some(AttributeValue::Text(text))) => {
                contains_ignore_case(text, needle)
            }
            _ => false,
        }
    }
}

/// A catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Substring of the name or SKU
    pub search: Option<String>,

    /// Any of these categories
    pub category_uuids: Vec<CategoryUuid>,

    /// Any of these brands
    pub brand_uuids: Vec<BrandUuid>,

    /// Lowest price in kopecks
    pub min_price: Option<u64>,

    /// Highest price in kopecks
    pub max_price: Option<u64>,

    /// Only products in (or out of) stock
    pub in_stock: Option<bool>,

    /// Per-attribute selections
    pub attributes: BTreeMap<AttributeUuid, AttributeSelection>,
}

/// One filter dimension, used to leave it out when counting its own values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Nothing,
    Category,
    Brand,
    Price,
    Attribute(AttributeUuid),
}

impl ProductFilter {
    /// Normalise the search text and check ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] for a range whose lower bound exceeds
    /// its upper bound, or [`ValidationError::TooLong`] for an oversized search.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let search = optional_text("search", self.search.as_deref(), SEARCH_MAX)?;

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(ValidationError::InvertedRange { field: "price" });
        }

        for selection in self.attributes.values() {
            if let AttributeSelection::Range {
                min: Some(min),
                max: Some(max),
            } = selection
                && min > max
            {
                return Err(ValidationError::InvertedRange { field: "attribute" });
            }
        }

        Ok(Self { search, ..self })
    }

    /// Whether `product` satisfies every active filter.
    #[must_use]
    pub fn matches(&self, product: &FacetProduct) -> bool {
        self.matches_except(product, Dimension::Nothing)
    }

    fn matches_except(&self, product: &FacetProduct, skip: Dimension) -> bool {
        let search = self.search.as_deref().is_none_or(|needle| {
            contains_ignore_case(&product.name, needle) || contains_ignore_case(&product.sku, needle)
        });

        let in_stock = self.in_stock.is_none_or(|wanted| product.in_stock == wanted);

        let category = skip == Dimension::Category
            || self.category_uuids.is_empty()
            || product
                .categories
                .iter()
                .any(|category| self.category_uuids.contains(&category.uuid));

        let brand = skip == Dimension::Brand
            || self.brand_uuids.is_empty()
            || product
                .brand
                .as_ref()
                .is_some_and(|brand| self.brand_uuids.contains(&brand.uuid));

        let price = skip == Dimension::Price
            || (self.min_price.is_none_or(|min| product.price >= min)
                && self.max_price.is_none_or(|max| product.price <= max));

        let attributes = self.attributes.iter().all(|(attribute, selection)| {
            skip == Dimension::Attribute(*attribute)
                || selection.matches(product.attributes.get(attribute))
        });

        search && in_stock && category && brand && price && attributes
    }
}

/// Count for one category or brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetCount<T> {
    /// Identifier
    pub uuid: T,

    /// Display name
    pub name: String,

    /// Matching products
    pub count: u64,
}

/// Count for one attribute option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionCount {
    /// Option
    pub uuid: AttributeOptionUuid,

    /// Display value
    pub value: String,

    /// Matching products
    pub count: u64,
}

/// Count for one distinct colour or text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    /// Value
    pub value: String,

    /// Matching products
    pub count: u64,
}

/// Values still available for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetValues {
    /// Select options with counts.
    Options(Vec<OptionCount>),

    /// Numeric span.
    Range {
        /// Smallest value
        min: Decimal,

        /// Largest value
        max: Decimal,
    },

    /// Distinct colours with counts.
    Colors(Vec<ValueCount>),

    /// Distinct texts with counts.
    Texts(Vec<ValueCount>),
}

/// Facet for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFacet {
    /// Attribute
    pub uuid: AttributeUuid,

    /// Display name
    pub name: String,

    /// Value type
    pub kind: AttributeKind,

    /// Available values
    pub values: FacetValues,
}

/// Inclusive price span in kopecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    /// Lowest price
    pub min: u64,

    /// Highest price
    pub max: u64,
}

/// Everything a filter sidebar needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableFilters {
    /// Attributes with at least one value among the candidates
    pub attributes: Vec<AttributeFacet>,

    /// Price span, `None` when nothing matches
    pub price_range: Option<PriceRange>,

    /// Product counts per category
    pub categories: Vec<FacetCount<CategoryUuid>>,

    /// Product counts per brand
    pub brands: Vec<FacetCount<BrandUuid>>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn counted<T, I>(entries: I) -> Vec<FacetCount<T>>
where
    T: Copy + Eq + std::hash::Hash,
    I: IntoIterator<Item = Named<T>>,
{
    let mut counts: FxHashMap<T, FacetCount<T>> = FxHashMap::default();

    for entry in entries {
        counts
            .entry(entry.uuid)
            .or_insert_with(|| FacetCount {
                uuid: entry.uuid,
                name: entry.name,
                count: 0,
            })
            .count += 1;
    }

    let mut counts: Vec<_> = counts.into_values().collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}

fn value_counts<'a, I>(values: I) -> Vec<ValueCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();

    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut counts: Vec<_> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

fn attribute_facet<'a, I>(definition: &AttributeDefinition, values: I) -> Option<AttributeFacet>
where
    I: IntoIterator<Item = &'a AttributeValue>,
{
    let values = match definition.kind {
        AttributeKind::SelectOne | AttributeKind::SelectMany => {
            let mut counts: FxHashMap<AttributeOptionUuid, u64> = FxHashMap::default();

            for value in values {
                if let AttributeValue::Options(options) = value {
                    for option in options {
                        *counts.entry(*option).or_default() += 1;
                    }
                }
            }

            let mut options: Vec<_> = definition
                .options
                .iter()
                .filter_map(|option| {
                    counts.get(&option.uuid).map(|count| (option, *count))
                })
                .collect();

            options.sort_by_key(|(option, _)| option.sort_order);

            FacetValues::Options(
                options
                    .into_iter()
                    .map(|(option, count)| OptionCount {
                        uuid: option.uuid,
                        value: option.value.clone(),
                        count,
                    })
                    .collect(),
            )
        }
        AttributeKind::Number => {
            let (min, max) = values
                .into_iter()
                .filter_map(|value| match value {
                    AttributeValue::Number(number) => Some(*number),
                    _ => None,
                })
                .fold(None, |span: Option<(Decimal, Decimal)>, number| {
                    Some(span.map_or((number, number), |(min, max)| {
                        (min.min(number), max.max(number))
                    }))
                })?;

            FacetValues::Range { min, max }
        }
        AttributeKind::Color => FacetValues::Colors(value_counts(values.into_iter().filter_map(
            |value| match value {
                AttributeValue::Color(color) => Some(color.as_str()),
                _ => None,
            },
        ))),
        AttributeKind::Text => FacetValues::Texts(value_counts(values.into_iter().filter_map(
            |value| match value {
                AttributeValue::Text(text) => Some(text.as_str()),
                _ => None,
            },
        ))),
    };

    let empty = match &values {
        FacetValues::Options(options) => options.is_empty(),
        FacetValues::Colors(counts) | FacetValues::Texts(counts) => counts.is_empty(),
        FacetValues::Range { .. } => false,
    };

    (!empty).then(|| AttributeFacet {
        uuid: definition.uuid,
        name: definition.name.clone(),
        kind: definition.kind,
        values,
    })
}

/// Compute the available filter values for `filter` over the active `products`.
///
/// Nothing matching the full filter yields [`AvailableFilters::default`].
#[must_use]
pub fn build_facets(
    products: &[FacetProduct],
    attributes: &[AttributeDefinition],
    filter: &ProductFilter,
) -> AvailableFilters {
    if !products.iter().any(|product| filter.matches(product)) {
        return AvailableFilters::default();
    }

    let except = |dimension: Dimension| {
        products
            .iter()
            .filter(move |product| filter.matches_except(product, dimension))
    };

    let price_range = except(Dimension::Price)
        .map(|product| product.price)
        .fold(None, |span: Option<PriceRange>, price| {
            Some(span.map_or(PriceRange { min: price, max: price }, |span| PriceRange {
                min: span.min.min(price),
                max: span.max.max(price),
            }))
        });

    let categories = counted(except(Dimension::Category).flat_map(|product| {
        product.categories.iter().cloned()
    }));

    let brands = counted(except(Dimension::Brand).filter_map(|product| product.brand.clone()));

    let mut definitions: Vec<&AttributeDefinition> = attributes.iter().collect();
    definitions.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));

    let attributes = definitions
        .into_iter()
        .filter_map(|definition| {
            attribute_facet(
                definition,
                except(Dimension::Attribute(definition.uuid))
                    .filter_map(|product| product.attributes.get(&definition.uuid)),
            )
        })
        .collect();

    AvailableFilters {
        attributes,
        price_range,
        categories,
        brands,
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    struct Catalog {
        bosch: Named<BrandUuid>,
        brembo: Named<BrandUuid>,
        brakes: Named<CategoryUuid>,
        filters: Named<CategoryUuid>,
        diameter: AttributeUuid,
        position: AttributeDefinition,
        front: AttributeOptionUuid,
        rear: AttributeOptionUuid,
    }

    fn catalog() -> Catalog {
        let front = AttributeOptionUuid::new();
        let rear = AttributeOptionUuid::new();

        Catalog {
            bosch: Named {
                uuid: BrandUuid::new(),
                name: "Bosch".to_string(),
            },
            brembo: Named {
                uuid: BrandUuid::new(),
                name: "Brembo".to_string(),
            },
            brakes: Named {
                uuid: CategoryUuid::new(),
                name: "Brakes".to_string(),
            },
            filters: Named {
                uuid: CategoryUuid::new(),
                name: "Filters".to_string(),
            },
            diameter: AttributeUuid::new(),
            position: AttributeDefinition {
                uuid: AttributeUuid::new(),
                name: "Position".to_string(),
                kind: AttributeKind::SelectOne,
                sort_order: 1,
                options: vec![
                    AttributeOption {
                        uuid: rear,
                        value: "Rear".to_string(),
                        sort_order: 2,
                    },
                    AttributeOption {
                        uuid: front,
                        value: "Front".to_string(),
                        sort_order: 1,
                    },
                ],
            },
            front,
            rear,
        }
    }

    fn product(
        name: &str,
        price: u64,
        brand: &Named<BrandUuid>,
        category: &Named<CategoryUuid>,
    ) -> FacetProduct {
        FacetProduct {
            uuid: ProductUuid::new(),
            name: name.to_string(),
            sku: format!("SKU-{price}"),
            price,
            in_stock: true,
            brand: Some(brand.clone()),
            categories: smallvec![category.clone()],
            attributes: FxHashMap::default(),
        }
    }

    fn products(catalog: &Catalog) -> Vec<FacetProduct> {
        let mut disc = product("Brake disc", 5_000, &catalog.brembo, &catalog.brakes);
        disc.attributes.insert(
            catalog.position.uuid,
            AttributeValue::Options(smallvec![catalog.front]),
        );
        disc.attributes
            .insert(catalog.diameter, AttributeValue::Number(Decimal::from(300)));

        let mut pads = product("Brake pads", 2_000, &catalog.bosch, &catalog.brakes);
        pads.attributes.insert(
            catalog.position.uuid,
            AttributeValue::Options(smallvec![catalog.rear]),
        );

        let oil = product("Oil filter", 800, &catalog.bosch, &catalog.filters);

        vec![disc, pads, oil]
    }

    #[test]
    fn unfiltered_counts_everything() {
        let catalog = catalog();
        let facets = build_facets(
            &products(&catalog),
            std::slice::from_ref(&catalog.position),
            &ProductFilter::default(),
        );

        assert_eq!(facets.price_range, Some(PriceRange { min: 800, max: 5_000 }));
        assert_eq!(
            facets
                .brands
                .iter()
                .map(|brand| (brand.name.as_str(), brand.count))
                .collect::<Vec<_>>(),
            vec![("Bosch", 2), ("Brembo", 1)]
        );
        assert_eq!(
            facets
                .categories
                .iter()
                .map(|category| (category.name.as_str(), category.count))
                .collect::<Vec<_>>(),
            vec![("Brakes", 2), ("Filters", 1)]
        );
    }

    #[test]
    fn options_follow_their_sort_order() -> TestResult {
        let catalog = catalog();
        let facets = build_facets(
            &products(&catalog),
            std::slice::from_ref(&catalog.position),
            &ProductFilter::default(),
        );

        let position = facets.attributes.first().ok_or("missing position facet")?;

        assert_eq!(
            position.values,
            FacetValues::Options(vec![
                OptionCount {
                    uuid: catalog.front,
                    value: "Front".to_string(),
                    count: 1,
                },
                OptionCount {
                    uuid: catalog.rear,
                    value: "Rear".to_string(),
                    count: 1,
                },
            ])
        );

        Ok(())
    }

    #[test]
    fn selected_dimension_keeps_its_alternatives() {
        let catalog = catalog();
        let filter = ProductFilter {
            brand_uuids: vec![catalog.brembo.uuid],
            ..ProductFilter::default()
        };

        let facets = build_facets(&products(&catalog), &[], &filter);

        assert_eq!(facets.brands.len(), 2, "other brands stay selectable");
        assert_eq!(
            facets
                .categories
                .iter()
                .map(|category| (category.name.as_str(), category.count))
                .collect::<Vec<_>>(),
            vec![("Brakes", 1)]
        );
        assert_eq!(facets.price_range, Some(PriceRange { min: 5_000, max: 5_000 }));
    }

    #[test]
    fn price_range_ignores_price_filter() {
        let catalog = catalog();
        let filter = ProductFilter {
            min_price: Some(1_000),
            ..ProductFilter::default()
        };

        let facets = build_facets(&products(&catalog), &[], &filter);

        assert_eq!(facets.price_range, Some(PriceRange { min: 800, max: 5_000 }));
        assert_eq!(
            facets
                .categories
                .iter()
                .map(|category| category.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Brakes"]
        );
    }

    #[test]
    fn number_attribute_reports_span() -> TestResult {
        let catalog = catalog();
        let diameter = AttributeDefinition {
            uuid: catalog.diameter,
            name: "Diameter".to_string(),
            kind: AttributeKind::Number,
            sort_order: 0,
            options: Vec::new(),
        };

        let facets = build_facets(&products(&catalog), &[diameter], &ProductFilter::default());
        let facet = facets.attributes.first().ok_or("missing diameter facet")?;

        assert_eq!(
            facet.values,
            FacetValues::Range {
                min: Decimal::from(300),
                max: Decimal::from(300),
            }
        );

        Ok(())
    }

    #[test]
    fn search_matches_name_and_sku() {
        let catalog = catalog();
        let filter = ProductFilter {
            search: Some("OIL".to_string()),
            ..ProductFilter::default()
        };

        let facets = build_facets(&products(&catalog), &[], &filter);

        assert_eq!(facets.price_range, Some(PriceRange { min: 800, max: 800 }));

        let by_sku = ProductFilter {
            search: Some("sku-2000".to_string()),
            ..ProductFilter::default()
        };

        assert_eq!(
            build_facets(&products(&catalog), &[], &by_sku).price_range,
            Some(PriceRange { min: 2_000, max: 2_000 })
        );
    }

    #[test]
    fn zero_matches_yield_empty_facets() {
        let catalog = catalog();
        let filter = ProductFilter {
            search: Some("wiper".to_string()),
            ..ProductFilter::default()
        };

        let facets = build_facets(
            &products(&catalog),
            std::slice::from_ref(&catalog.position),
            &filter,
        );

        assert_eq!(facets, AvailableFilters::default());
        assert!(facets.price_range.is_none(), "no products, no price range");
    }

    #[test]
    fn attribute_selection_filters_other_dimensions() {
        let catalog = catalog();
        let mut filter = ProductFilter::default();
        filter.attributes.insert(
            catalog.position.uuid,
            AttributeSelection::Options(vec![catalog.rear]),
        );

        let facets = build_facets(
            &products(&catalog),
            std::slice::from_ref(&catalog.position),
            &filter,
        );

        assert_eq!(
            facets
                .brands
                .iter()
                .map(|brand| brand.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Bosch"]
        );
        assert_eq!(facets.price_range, Some(PriceRange { min: 2_000, max: 2_000 }));
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let filter = ProductFilter {
            min_price: Some(10),
            max_price: Some(5),
            ..ProductFilter::default()
        };

        assert_eq!(
            filter.validate(),
            Err(ValidationError::InvertedRange { field: "price" })
        );

        let mut filter = ProductFilter::default();
        filter.attributes.insert(
            AttributeUuid::new(),
            AttributeSelection::Range {
                min: Some(Decimal::from(5)),
                max: Some(Decimal::from(1)),
            },
        );

        assert_eq!(
            filter.validate(),
            Err(ValidationError::InvertedRange { field: "attribute" })
        );
    }
}
