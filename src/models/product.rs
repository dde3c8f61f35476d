use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

// DB models

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name_fr: String,
    pub name_ar: String,
    pub desc_fr: Option<String>,
    pub desc_ar: Option<String>,
    pub price: Decimal,
    pub discount: Decimal,
    pub category: String,
    pub stock: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Unit price after the percentage discount, rounded to cents.
    pub fn final_price(&self) -> Decimal {
        discounted_price(self.price, self.discount)
    }
}

pub fn discounted_price(price: Decimal, discount: Decimal) -> Decimal {
    let price = if discount > Decimal::ZERO {
        price * (Decimal::ONE - discount / Decimal::from(100))
    } else {
        price
    };

    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductColor {
    pub id: i32,
    pub product_id: i32,
    pub name_fr: String,
    pub name_ar: String,
    pub hex_code: String,
    pub stock: i32,
    pub image: Option<String>,
}

// Query types

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Discount,
    NameAsc,
    NameDesc,
}

impl SortBy {
    pub fn order_clause(self) -> &'static str {
        match self {
            SortBy::Newest => "created_at DESC, id DESC",
            SortBy::PriceAsc => "price * (1 - discount / 100) ASC, id ASC",
            SortBy::PriceDesc => "price * (1 - discount / 100) DESC, id DESC",
            SortBy::Discount => "discount DESC, created_at DESC",
            SortBy::NameAsc => "name_fr ASC, id ASC",
            SortBy::NameDesc => "name_fr DESC, id DESC",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub sort: Option<SortBy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
    pub sort: Option<SortBy>,
}

/// Which slice of the catalog a listing reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFilter {
    All,
    Category(String),
    Discounted,
    Search(String),
}

// Request types

/// Text fields of the multipart product form.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name_fr: Option<String>,
    pub name_ar: Option<String>,
    pub desc_fr: Option<String>,
    pub desc_ar: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub colors: Option<Vec<ColorInput>>,
}

/// One entry of the `colors` JSON field. Colors added in the admin form carry a
/// temporary string id such as `temp-1712345678`, which reads as `None`.
///
/// An `image` path sent by the client is ignored; color images only come from uploads.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorInput {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i32>,
    pub name_fr: String,
    pub name_ar: String,
    #[serde(default = "default_hex_code")]
    pub hex_code: String,
    #[serde(default, deserialize_with = "lenient_stock")]
    pub stock: i32,
}

pub const MAX_COLOR_NAME_LEN: usize = 100;

fn default_hex_code() -> String {
    "#000000".to_string()
}

/// `#rrggbb` with hex digits in either case.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl ColorInput {
    /// Validates the color at `index` (zero based) of the submitted list.
    pub fn into_data(self, index: usize) -> crate::error::Result<ColorData> {
        use crate::error::AppError;

        let position = index + 1;
        let name_fr = self.name_fr.trim().to_string();
        let name_ar = self.name_ar.trim().to_string();
        if name_fr.is_empty() || name_ar.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Color {} needs a French and an Arabic name",
                position
            )));
        }
        if name_fr.chars().count() > MAX_COLOR_NAME_LEN
            || name_ar.chars().count() > MAX_COLOR_NAME_LEN
        {
            return Err(AppError::BadRequest(format!(
                "Color {} name is longer than {} characters",
                position, MAX_COLOR_NAME_LEN
            )));
        }

        let hex_code = self.hex_code.trim().to_string();
        if !is_hex_color(&hex_code) {
            return Err(AppError::BadRequest(format!(
                "Color {} has an invalid hex code {:?}",
                position, hex_code
            )));
        }
        if self.stock < 0 {
            return Err(AppError::BadRequest("stock cannot be negative".to_string()));
        }

        Ok(ColorData {
            id: self.id,
            name_fr,
            name_ar,
            hex_code,
            stock: self.stock,
            image: None,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn as_i32(&self) -> Option<i32> {
        match self {
            NumberOrText::Number(n) => i32::try_from(*n).ok(),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i32()))
}

fn lenient_stock<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i32()).unwrap_or(0))
}

/// A validated product ready for insert or update.
#[derive(Debug, Clone)]
pub struct ProductData {
    pub name_fr: String,
    pub name_ar: String,
    pub desc_fr: Option<String>,
    pub desc_ar: Option<String>,
    pub price: Decimal,
    pub discount: Decimal,
    pub category: String,
    pub stock: i32,
    pub image: Option<String>,
}

/// A validated color. `image` is a fresh upload; an existing color without one
/// keeps its stored image.
#[derive(Debug, Clone)]
pub struct ColorData {
    pub id: Option<i32>,
    pub name_fr: String,
    pub name_ar: String,
    pub hex_code: String,
    pub stock: i32,
    pub image: Option<String>,
}

impl ProductForm {
    /// Merges the submitted fields over `existing` (if any) and validates the result.
    pub fn into_data(self, existing: Option<&Product>) -> crate::error::Result<ProductData> {
        use crate::error::AppError;

        let required = |value: Option<String>, fallback: Option<&String>, field: &str| {
            value
                .or_else(|| fallback.cloned())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
        };

        let name_fr = required(self.name_fr, existing.map(|p| &p.name_fr), "name_fr")?;
        let name_ar = required(self.name_ar, existing.map(|p| &p.name_ar), "name_ar")?;
        let category = required(self.category, existing.map(|p| &p.category), "category")?;

        let price = self
            .price
            .or(existing.map(|p| p.price))
            .ok_or_else(|| AppError::BadRequest("price is required".to_string()))?;
        if price < Decimal::ZERO {
            return Err(AppError::BadRequest("price cannot be negative".to_string()));
        }

        let discount = self
            .discount
            .or(existing.map(|p| p.discount))
            .unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || discount > Decimal::from(100) {
            return Err(AppError::BadRequest(
                "discount must be between 0 and 100".to_string(),
            ));
        }

        let stock = self.stock.or(existing.map(|p| p.stock)).unwrap_or(0);
        if stock < 0 {
            return Err(AppError::BadRequest("stock cannot be negative".to_string()));
        }

        Ok(ProductData {
            name_fr,
            name_ar,
            desc_fr: self.desc_fr.or_else(|| existing.and_then(|p| p.desc_fr.clone())),
            desc_ar: self.desc_ar.or_else(|| existing.and_then(|p| p.desc_ar.clone())),
            price,
            discount,
            category,
            stock,
            image: existing.and_then(|p| p.image.clone()),
        })
    }
}

// Response types

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub final_price: Decimal,
    pub colors: Vec<ProductColor>,
}

impl ProductResponse {
    pub fn new(product: Product, colors: Vec<ProductColor>) -> Self {
        Self {
            final_price: product.final_price(),
            product,
            colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::error::AppError;

    fn product(price: Decimal, discount: Decimal) -> Product {
        Product {
            id: 1,
            name_fr: "Rouge à lèvres".to_string(),
            name_ar: "أحمر شفاه".to_string(),
            desc_fr: None,
            desc_ar: None,
            price,
            discount,
            category: "makeup".to_string(),
            stock: 3,
            image: Some("/uploads/a.png".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn applies_percentage_discount() {
        assert_eq!(product(dec!(100), dec!(20)).final_price(), dec!(80));
        assert_eq!(product(dec!(99.99), dec!(0)).final_price(), dec!(99.99));
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 19.99 * 0.85 = 16.9915
        assert_eq!(discounted_price(dec!(19.99), dec!(15)), dec!(16.99));
        // 10 * (1 - 33.333/100) = 6.6667
        assert_eq!(discounted_price(dec!(10), dec!(33.333)), dec!(6.67));
    }

    #[test]
    fn sort_keys_parse_from_query_values() {
        let parsed: SortBy = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(parsed, SortBy::PriceDesc);
        assert!(serde_json::from_str::<SortBy>("\"cheapest\"").is_err());
        assert_eq!(SortBy::default(), SortBy::Newest);
    }

    #[test]
    fn form_requires_core_fields_on_create() {
        let form = ProductForm {
            name_fr: Some("Crème".into()),
            name_ar: Some("كريم".into()),
            category: Some("skincare".into()),
            ..Default::default()
        };

        assert!(matches!(
            form.into_data(None),
            Err(crate::error::AppError::BadRequest(_))
        ));
    }

    #[test]
    fn form_keeps_existing_values_on_update() {
        let existing = product(dec!(50), dec!(10));
        let form = ProductForm {
            discount: Some(dec!(25)),
            ..Default::default()
        };

        let data = form.into_data(Some(&existing)).unwrap();
        assert_eq!(data.name_fr, existing.name_fr);
        assert_eq!(data.price, dec!(50));
        assert_eq!(data.discount, dec!(25));
        assert_eq!(data.image, existing.image);
    }

    #[test]
    fn form_rejects_out_of_range_discount() {
        let existing = product(dec!(50), dec!(10));
        let form = ProductForm {
            discount: Some(dec!(120)),
            ..Default::default()
        };

        assert!(form.into_data(Some(&existing)).is_err());
    }

    #[test]
    fn color_input_defaults() {
        let color: ColorInput =
            serde_json::from_str(r#"{"name_fr":"Rose","name_ar":"وردي"}"#).unwrap();
        assert_eq!(color.hex_code, "#000000");
        assert_eq!(color.stock, 0);
        assert!(color.id.is_none());
    }

    #[test]
    fn color_input_reads_temporary_ids_as_new() {
        let colors: Vec<ColorInput> = serde_json::from_str(
            r##"[
                {"id": 7, "name_fr": "Noir", "name_ar": "أسود", "hex_code": "#000000", "stock": "4"},
                {"id": "temp-1712345678", "name_fr": "Rose", "name_ar": "وردي", "stock": 2, "isNew": true}
            ]"##,
        )
        .unwrap();

        assert_eq!(colors[0].id, Some(7));
        assert_eq!(colors[0].stock, 4);
        assert_eq!(colors[1].id, None);
        assert_eq!(colors[1].stock, 2);
    }

    fn color(name_fr: &str, hex_code: &str) -> ColorInput {
        ColorInput {
            id: None,
            name_fr: name_fr.to_string(),
            name_ar: "أحمر".to_string(),
            hex_code: hex_code.to_string(),
            stock: 1,
        }
    }

    #[test]
    fn accepts_six_digit_hex_codes() {
        assert!(is_hex_color("#A0b1C2"));
        assert!(!is_hex_color("#ff000080"));
        assert!(!is_hex_color("red"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("#gg0000"));
        assert!(!is_hex_color("#ééé"));
    }

    #[test]
    fn color_with_bad_hex_code_is_rejected() {
        for hex in ["#ff000080", "red", ""] {
            let result = color("Rouge", hex).into_data(0);
            assert!(matches!(result, Err(AppError::BadRequest(_))), "{hex}");
        }
    }

    #[test]
    fn color_name_longer_than_column_is_rejected() {
        let long_name = "r".repeat(MAX_COLOR_NAME_LEN + 1);
        let result = color(&long_name, "#ff0000").into_data(2);

        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.starts_with("Color 3")));
    }

    #[test]
    fn valid_color_is_trimmed_and_has_no_image() {
        let data = color("  Rouge ", " #FF0000").into_data(0).unwrap();

        assert_eq!(data.name_fr, "Rouge");
        assert_eq!(data.hex_code, "#FF0000");
        assert!(data.image.is_none());
    }

    #[test]
    fn rounds_half_cents_up() {
        // 10.05 * 0.5 = 5.025
        assert_eq!(discounted_price(dec!(10.05), dec!(50)), dec!(5.03));
    }
}
