//! 施設ごとの注文数

use crate::error::{PlatePackError, Result};
use std::collections::HashMap;
use std::path::Path;

/// 料理名（調理指示書の記載どおり）→ 施設ごとの食数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityOrders {
    orders: HashMap<String, Vec<u32>>,
}

impl FacilityOrders {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PlatePackError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<u32>> = serde_json::from_str(json)?;
        let orders = raw
            .into_iter()
            .map(|(name, quantities)| (name.trim().to_string(), quantities))
            .collect();
        Ok(Self { orders })
    }

    /// 注文がなければ空
    pub fn for_descriptor(&self, descriptor: &str) -> &[u32] {
        self.orders
            .get(descriptor.trim())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let orders = FacilityOrders::from_json(r#"{" ①すきやき76g ": [10, 1, 0]}"#).unwrap();
        assert_eq!(orders.for_descriptor("①すきやき76g"), &[10, 1, 0]);
        assert!(orders.for_descriptor("③和え物50g").is_empty());
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        assert!(FacilityOrders::from_json(r#"{"①すきやき76g": [-1]}"#).is_err());
    }
}
