//! Shopper cart.
//!
//! The cart lives on the shopper's device. Lines snapshot the catalog price
//! and discount when they are added and are turned into order lines at
//! checkout, where the server prices them again.

mod store;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use store::{CartStore, FileCartStore, MemoryCartStore};

use crate::{
    error::Result,
    models::{OrderItemRequest, Product, ProductColor, discounted_price},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedColor {
    pub id: i32,
    pub name_fr: String,
    pub name_ar: String,
    pub hex_code: String,
}

impl From<&ProductColor> for SelectedColor {
    fn from(color: &ProductColor) -> Self {
        Self {
            id: color.id,
            name_fr: color.name_fr.clone(),
            name_ar: color.name_ar.clone(),
            hex_code: color.hex_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i32,
    pub name_fr: String,
    pub name_ar: String,
    pub image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub color: Option<SelectedColor>,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product: &Product, color: Option<&ProductColor>, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name_fr: product.name_fr.clone(),
            name_ar: product.name_ar.clone(),
            image: color
                .and_then(|c| c.image.clone())
                .or_else(|| product.image.clone()),
            price: product.price,
            discount: product.discount,
            color: color.map(SelectedColor::from),
            quantity,
        }
    }

    pub fn color_id(&self) -> Option<i32> {
        self.color.as_ref().map(|c| c.id)
    }

    /// Lines describe the same item when product and color both match;
    /// a line without a color only matches another line without one.
    pub fn is_same_item(&self, product_id: i32, color_id: Option<i32>) -> bool {
        self.product_id == product_id && self.color_id() == color_id
    }

    pub fn unit_price(&self) -> Decimal {
        discounted_price(self.price, self.discount)
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a line, merging its quantity into an existing line for the same item.
    pub fn add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }

        match self
            .lines
            .iter_mut()
            .find(|l| l.is_same_item(line.product_id, line.color_id()))
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.lines.push(line),
        }
    }

    pub fn remove(&mut self, product_id: i32, color_id: Option<i32>) {
        self.lines.retain(|l| !l.is_same_item(product_id, color_id));
    }

    /// Sets the quantity of a line. Quantities below one are ignored.
    pub fn update_quantity(&mut self, product_id: i32, color_id: Option<i32>, quantity: u32) {
        if quantity < 1 {
            return;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.is_same_item(product_id, color_id))
        {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .map(|l| l.quantity)
            .fold(0, u32::saturating_add)
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Lines in the shape `POST /api/orders` expects.
    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.lines
            .iter()
            .map(|l| OrderItemRequest {
                product_id: l.product_id,
                quantity: i32::try_from(l.quantity).unwrap_or(i32::MAX),
                color_id: l.color_id(),
            })
            .collect()
    }
}

/// A cart that writes itself back to its store after every change.
pub struct SavedCart<S: CartStore> {
    cart: Cart,
    store: S,
}

impl<S: CartStore> SavedCart<S> {
    pub fn open(store: S) -> Result<Self> {
        let cart = store.load()?;
        Ok(Self { cart, store })
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn add(&mut self, line: CartLine) -> Result<()> {
        self.cart.add(line);
        self.store.save(&self.cart)
    }

    pub fn remove(&mut self, product_id: i32, color_id: Option<i32>) -> Result<()> {
        self.cart.remove(product_id, color_id);
        self.store.save(&self.cart)
    }

    pub fn update_quantity(
        &mut self,
        product_id: i32,
        color_id: Option<i32>,
        quantity: u32,
    ) -> Result<()> {
        self.cart.update_quantity(product_id, color_id, quantity);
        self.store.save(&self.cart)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.cart.clear();
        self.store.save(&self.cart)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::dec;

    use super::*;

    fn product(id: i32, price: Decimal, discount: Decimal) -> Product {
        Product {
            id,
            name_fr: format!("Produit {}", id),
            name_ar: format!("منتج {}", id),
            desc_fr: None,
            desc_ar: None,
            price,
            discount,
            category: "soins".to_string(),
            stock: 10,
            image: Some(format!("/uploads/{}.png", id)),
            created_at: Utc::now(),
        }
    }

    fn color(id: i32, product_id: i32) -> ProductColor {
        ProductColor {
            id,
            product_id,
            name_fr: format!("Teinte {}", id),
            name_ar: format!("لون {}", id),
            hex_code: "#aa3355".to_string(),
            stock: 4,
            image: None,
        }
    }

    #[test]
    fn same_product_and_color_merge() {
        let p = product(1, dec!(100), Decimal::ZERO);
        let c = color(5, 1);
        let mut cart = Cart::new();

        cart.add(CartLine::new(&p, Some(&c), 1));
        cart.add(CartLine::new(&p, Some(&c), 2));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn item_count_saturates() {
        let p = product(1, dec!(1), Decimal::ZERO);
        let mut cart = Cart::new();

        cart.add(CartLine::new(&p, Some(&color(5, 1)), u32::MAX - 1));
        cart.add(CartLine::new(&p, Some(&color(6, 1)), 2));

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn different_colors_stay_separate() {
        let p = product(1, dec!(100), Decimal::ZERO);
        let mut cart = Cart::new();

        cart.add(CartLine::new(&p, Some(&color(5, 1)), 1));
        cart.add(CartLine::new(&p, Some(&color(6, 1)), 1));
        cart.add(CartLine::new(&p, None, 1));

        assert_eq!(cart.lines().len(), 3);
    }

    #[test]
    fn missing_color_only_matches_missing_color() {
        let p = product(1, dec!(100), Decimal::ZERO);
        let mut cart = Cart::new();

        cart.add(CartLine::new(&p, None, 1));
        cart.add(CartLine::new(&p, None, 4));
        cart.remove(1, Some(5));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 5);

        cart.remove(1, None);
        assert!(cart.is_empty());
    }

    #[test]
    fn total_uses_discounted_unit_price() {
        let mut cart = Cart::new();
        cart.add(CartLine::new(&product(1, dec!(100), dec!(20)), None, 2));
        cart.add(CartLine::new(&product(2, dec!(49.99), Decimal::ZERO), None, 1));

        assert_eq!(cart.total(), dec!(209.99));
    }

    #[test]
    fn update_quantity_ignores_values_below_one() {
        let p = product(1, dec!(10), Decimal::ZERO);
        let mut cart = Cart::new();
        cart.add(CartLine::new(&p, None, 2));

        cart.update_quantity(1, None, 0);
        assert_eq!(cart.item_count(), 2);

        cart.update_quantity(1, None, 7);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn order_items_carry_product_and_color() {
        let p = product(3, dec!(10), Decimal::ZERO);
        let mut cart = Cart::new();
        cart.add(CartLine::new(&p, Some(&color(9, 3)), 2));

        assert_eq!(
            cart.order_items(),
            vec![OrderItemRequest {
                product_id: 3,
                quantity: 2,
                color_id: Some(9),
            }]
        );
    }

    #[test]
    fn saved_cart_persists_changes() {
        let store = MemoryCartStore::default();
        let mut saved = SavedCart::open(store.clone()).unwrap();

        saved
            .add(CartLine::new(&product(1, dec!(10), Decimal::ZERO), None, 1))
            .unwrap();

        assert_eq!(store.load().unwrap().item_count(), 1);

        saved.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
