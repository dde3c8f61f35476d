use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::{
    cart::Cart,
    error::{AppError, Result},
};

/// Where a cart is kept between sessions.
pub trait CartStore {
    fn load(&self) -> Result<Cart>;
    fn save(&self, cart: &Cart) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    cart: Arc<Mutex<Cart>>,
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Cart> {
        self.cart
            .lock()
            .map(|cart| cart.clone())
            .map_err(|_| AppError::InternalError("Cart store lock poisoned".to_string()))
    }

    fn save(&self, cart: &Cart) -> Result<()> {
        let mut stored = self
            .cart
            .lock()
            .map_err(|_| AppError::InternalError("Cart store lock poisoned".to_string()))?;
        *stored = cart.clone();
        Ok(())
    }
}

/// Cart saved as a JSON file.
///
/// A file that no longer parses is deleted and read as an empty cart.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStore for FileCartStore {
    fn load(&self) -> Result<Cart> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Cart::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => {
                tracing::debug!("Cart loaded with {} line(s)", cart.lines().len());
                Ok(cart)
            }
            Err(e) => {
                tracing::warn!(
                    "Discarding unreadable cart at {}: {}",
                    self.path.display(),
                    e
                );
                std::fs::remove_file(&self.path)?;
                Ok(Cart::new())
            }
        }
    }

    fn save(&self, cart: &Cart) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(cart)
            .map_err(|e| AppError::InternalError(format!("Failed to encode cart: {}", e)))?;
        std::fs::write(&self.path, json)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::{Decimal, dec};
    use testresult::TestResult;

    use super::*;
    use crate::{cart::CartLine, models::Product};

    fn line() -> CartLine {
        let product = Product {
            id: 1,
            name_fr: "Savon".to_string(),
            name_ar: "صابون".to_string(),
            desc_fr: None,
            desc_ar: None,
            price: dec!(25),
            discount: Decimal::ZERO,
            category: "soins".to_string(),
            stock: 5,
            image: None,
            created_at: Utc::now(),
        };
        CartLine::new(&product, None, 2)
    }

    #[test]
    fn missing_file_is_an_empty_cart() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileCartStore::new(dir.path().join("cart.json"));

        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn saved_cart_reloads() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileCartStore::new(dir.path().join("nested").join("cart.json"));

        let mut cart = Cart::new();
        cart.add(line());
        store.save(&cart)?;

        assert_eq!(store.load()?, cart);
        Ok(())
    }

    #[test]
    fn corrupt_file_is_discarded() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");
        std::fs::write(&path, "{not json")?;

        let store = FileCartStore::new(&path);

        assert!(store.load()?.is_empty());
        assert!(!path.exists());
        Ok(())
    }
}
