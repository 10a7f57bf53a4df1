use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use catalog_core::{DomainError, DomainResult, Entity, ValueObject};

/// Maximum number of fractional digits a price may carry.
pub const MAX_PRICE_SCALE: u32 = 4;

/// Product identifier (assigned by storage, never reused).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Wrap a storage-assigned identifier.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Validate a caller-supplied identifier (must be positive).
    pub fn parse(raw: i64) -> DomainResult<Self> {
        if raw < 1 {
            return Err(DomainError::invalid_id(format!(
                "product id must be a positive integer (got {raw})"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Non-empty product name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ValueObject for ProductName {}

impl ProductName {
    /// Surrounding whitespace is dropped; a blank name is rejected.
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative price with at most [`MAX_PRICE_SCALE`] fractional digits.
///
/// Stored normalized (`10.50` becomes `10.5`), so the scale check counts only
/// significant fractional digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Price(Decimal);

impl ValueObject for Price {}

impl Price {
    pub fn parse(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(format!(
                "price cannot be negative (got {value})"
            )));
        }
        let normalized = value.normalize();
        if normalized.scale() > MAX_PRICE_SCALE {
            return Err(DomainError::validation(format!(
                "price must have at most {MAX_PRICE_SCALE} decimal places (got {value})"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

// A JSON number carrying every digit of the decimal, never routed through f64.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::arbitrary_precision::serialize(&self.0, serializer)
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)
            .map_err(|e| DomainError::validation(format!("price `{s}` is not a decimal: {e}")))?;
        Self::parse(value)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Availability lifecycle.
///
/// `Unavailable` is the soft-deleted state; it is terminal for the catalog
/// operations and invisible to every read. Serialized as the `available` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
}

impl Availability {
    pub fn from_flag(available: bool) -> Self {
        if available {
            Self::Available
        } else {
            Self::Unavailable
        }
    }

    pub fn is_available(self) -> bool {
        self == Self::Available
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_available())
    }
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: ProductName,
    pub price: Price,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Decimal) -> DomainResult<Self> {
        Ok(Self {
            name: ProductName::parse(name)?,
            price: Price::parse(price)?,
        })
    }
}

/// Validated partial update. Absent fields are left unchanged.
///
/// Has no `id` field: identifiers are immutable, and an `id` in an update
/// payload is dropped before a patch is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<ProductName>,
    pub price: Option<Price>,
}

impl ProductPatch {
    pub fn new(name: Option<String>, price: Option<Decimal>) -> DomainResult<Self> {
        Ok(Self {
            name: name.map(ProductName::parse).transpose()?,
            price: price.map(Price::parse).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}

/// Catalog entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: ProductName,
    price: Price,
    #[serde(rename = "available")]
    availability: Availability,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// A freshly created product: available, `created_at == updated_at == now`.
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            price: input.price,
            availability: Availability::Available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a product from persisted state.
    pub fn restore(
        id: ProductId,
        name: ProductName,
        price: Price,
        availability: Availability,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if updated_at < created_at {
            return Err(DomainError::validation(format!(
                "product {id}: updated_at {updated_at} precedes created_at {created_at}"
            )));
        }
        Ok(Self {
            id,
            name,
            price,
            availability,
            created_at,
            updated_at,
        })
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn is_available(&self) -> bool {
        self.availability.is_available()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply the present fields of `patch` and refresh `updated_at`.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        self.touch(now);
    }

    /// Soft delete: flip availability off and refresh `updated_at`.
    pub fn mark_unavailable(&mut self, now: DateTime<Utc>) {
        self.availability = Availability::Unavailable;
        self.touch(now);
    }

    // Clamped so a clock step backwards never breaks updated_at >= created_at.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn laptop() -> Product {
        let input = NewProduct::new("Laptop", d("999.99")).unwrap();
        Product::create(ProductId::new(1), input, test_time())
    }

    #[test]
    fn create_product_is_available_with_equal_timestamps() {
        let product = laptop();
        assert_eq!(product.id(), &ProductId::new(1));
        assert_eq!(product.name().as_str(), "Laptop");
        assert_eq!(product.price().amount(), d("999.99"));
        assert!(product.is_available());
        assert_eq!(product.created_at(), product.updated_at());
    }

    #[test]
    fn create_product_rejects_blank_name() {
        let err = NewProduct::new("   ", d("1")).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank name"),
        }
    }

    #[test]
    fn create_product_rejects_negative_price() {
        let err = NewProduct::new("Laptop", d("-5")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn empty_name_and_negative_price_are_rejected_before_storage() {
        assert!(NewProduct::new("", d("-5")).is_err());
    }

    #[test]
    fn price_accepts_four_decimal_places_and_rejects_five() {
        assert!(Price::parse(d("0.0001")).is_ok());
        assert!(Price::parse(d("0.00001")).is_err());
    }

    #[test]
    fn price_ignores_trailing_zeros_when_counting_decimals() {
        let price = Price::parse(d("10.500000")).unwrap();
        assert_eq!(price.amount(), d("10.5"));
        assert_eq!(price.amount().scale(), 1);
    }

    #[test]
    fn zero_price_is_allowed() {
        assert!(Price::parse(d("0")).is_ok());
        assert!(Price::parse(d("-0.00")).is_ok());
    }

    #[test]
    fn price_parses_from_stored_text() {
        let price: Price = "899.9900".parse().unwrap();
        assert_eq!(price.amount(), d("899.99"));
        assert!("abc".parse::<Price>().is_err());
    }

    #[test]
    fn product_id_parse_rejects_non_positive() {
        assert!(ProductId::parse(1).is_ok());
        assert!(matches!(ProductId::parse(0), Err(DomainError::InvalidId(_))));
        assert!(matches!(ProductId::parse(-3), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn patch_with_only_price_leaves_other_fields_unchanged() {
        let mut product = laptop();
        let before = product.clone();
        let later = before.created_at() + Duration::seconds(5);

        product.apply_patch(ProductPatch::new(None, Some(d("899.99"))).unwrap(), later);

        assert_eq!(product.price().amount(), d("899.99"));
        assert_eq!(product.name(), before.name());
        assert_eq!(product.created_at(), before.created_at());
        assert_eq!(product.availability(), before.availability());
        assert_eq!(product.updated_at(), later);
    }

    #[test]
    fn patch_rejects_blank_name() {
        assert!(ProductPatch::new(Some(" ".to_string()), None).is_err());
        assert!(ProductPatch::new(None, None).unwrap().is_empty());
    }

    #[test]
    fn mark_unavailable_only_flips_flag_and_timestamp() {
        let mut product = laptop();
        let before = product.clone();
        product.mark_unavailable(before.created_at() + Duration::seconds(1));

        assert_eq!(product.availability(), Availability::Unavailable);
        assert_eq!(product.name(), before.name());
        assert_eq!(product.price(), before.price());
        assert!(product.updated_at() > before.updated_at());
    }

    #[test]
    fn clock_going_backwards_keeps_updated_at_after_created_at() {
        let mut product = laptop();
        let earlier = product.created_at() - Duration::hours(1);
        product.mark_unavailable(earlier);
        assert_eq!(product.updated_at(), product.created_at());
    }

    #[test]
    fn restore_rejects_updated_before_created() {
        let now = test_time();
        let err = Product::restore(
            ProductId::new(7),
            ProductName::parse("Mouse").unwrap(),
            Price::parse(d("20")).unwrap(),
            Availability::Available,
            now,
            now - Duration::seconds(1),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serializes_with_available_flag_and_numeric_price() {
        let json = serde_json::to_value(laptop()).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Laptop");
        assert_eq!(json["price"], 999.99);
        assert_eq!(json["available"], true);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn large_prices_serialize_without_rounding() {
        let input = NewProduct::new("Server rack", d("12345678901234567.89")).unwrap();
        let product = Product::create(ProductId::new(2), input, test_time());

        let text = serde_json::to_string(&product).unwrap();
        assert!(text.contains(r#""price":12345678901234567.89"#), "{text}");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a price is accepted iff it is non-negative with at most four significant decimals.
        #[test]
        fn price_validation_matches_scale_and_sign(mantissa in -1_000_000i64..1_000_000, scale in 0u32..8) {
            let value = Decimal::new(mantissa, scale);
            let expected = mantissa >= 0 && value.normalize().scale() <= MAX_PRICE_SCALE;
            prop_assert_eq!(Price::parse(value).is_ok(), expected);
        }

        /// Property: every mutation keeps updated_at >= created_at.
        #[test]
        fn mutations_keep_timestamps_monotonic(offsets in prop::collection::vec(-3600i64..3600, 1..10)) {
            let mut product = laptop();
            let base = product.created_at();
            for (i, offset) in offsets.into_iter().enumerate() {
                let at = base + Duration::seconds(offset);
                if i % 2 == 0 {
                    product.apply_patch(ProductPatch::default(), at);
                } else {
                    product.mark_unavailable(at);
                }
                prop_assert!(product.updated_at() >= product.created_at());
            }
        }
    }
}
