// keyshop/src/pricing.rs

//! Price identifiers the short payment form may reference, and their unit
//! amounts in minor currency units.

use crate::errors::{AppError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceCatalog {
  unit_amounts: BTreeMap<String, i64>,
}

impl PriceCatalog {
  /// Parses `id=amount` pairs separated by commas, e.g.
  /// `price_basic=1999,price_pro=4999`.
  pub fn parse(raw: &str) -> Result<Self> {
    let mut unit_amounts = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
      let (id, amount) = entry
        .split_once('=')
        .ok_or_else(|| AppError::Config(format!("PRICE_CATALOG entry '{}' is not id=amount", entry)))?;
      let id = id.trim();
      if id.is_empty() {
        return Err(AppError::Config(format!("PRICE_CATALOG entry '{}' has no id", entry)));
      }
      let amount = amount
        .trim()
        .parse::<i64>()
        .map_err(|e| AppError::Config(format!("PRICE_CATALOG amount for '{}': {}", id, e)))?;
      if amount <= 0 {
        return Err(AppError::Config(format!("PRICE_CATALOG amount for '{}' must be positive", id)));
      }
      if unit_amounts.insert(id.to_string(), amount).is_some() {
        return Err(AppError::Config(format!("PRICE_CATALOG lists '{}' twice", id)));
      }
    }
    Ok(Self { unit_amounts })
  }

  pub fn with_price(mut self, id: &str, unit_amount: i64) -> Self {
    self.unit_amounts.insert(id.to_string(), unit_amount);
    self
  }

  pub fn unit_amount(&self, price_id: &str) -> Option<i64> {
    self.unit_amounts.get(price_id).copied()
  }

  pub fn len(&self) -> usize {
    self.unit_amounts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.unit_amounts.is_empty()
  }

  /// Total for `quantity` units of `price_id`.
  pub fn quote(&self, price_id: &str, quantity: i64) -> Result<i64> {
    if quantity <= 0 {
      return Err(AppError::Validation("Quantity must be at least 1.".to_string()));
    }
    let unit = self
      .unit_amount(price_id)
      .ok_or_else(|| AppError::Validation(format!("Unknown price '{}'.", price_id)))?;
    unit
      .checked_mul(quantity)
      .ok_or_else(|| AppError::Validation("Order total is too large.".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_default_catalog() {
    let catalog = PriceCatalog::parse("price_basic=1999, price_pro=4999,").unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.unit_amount("price_pro"), Some(4999));
  }

  #[test]
  fn rejects_malformed_entries() {
    assert!(PriceCatalog::parse("price_basic").is_err());
    assert!(PriceCatalog::parse("=100").is_err());
    assert!(PriceCatalog::parse("a=abc").is_err());
    assert!(PriceCatalog::parse("a=0").is_err());
    assert!(PriceCatalog::parse("a=1,a=2").is_err());
  }

  #[test]
  fn quote_multiplies_and_guards() {
    let catalog = PriceCatalog::default().with_price("price_basic", 1999);
    assert_eq!(catalog.quote("price_basic", 3).unwrap(), 5997);
    assert!(matches!(catalog.quote("price_basic", 0), Err(AppError::Validation(_))));
    assert!(matches!(catalog.quote("price_gold", 1), Err(AppError::Validation(_))));
    let huge = PriceCatalog::default().with_price("p", i64::MAX);
    assert!(huge.quote("p", 2).is_err());
  }
}
