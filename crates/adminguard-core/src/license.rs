//! License snapshot as read from the license provider.

use serde::{Deserialize, Serialize};

/// Short SKU name carried by enterprise licenses.
pub const SKU_ENTERPRISE: &str = "enterprise";

/// Active license. Absence of a license is modelled as `Option<License>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub sku_short_name: String,
    #[serde(default)]
    pub is_cloud: bool,
}

impl License {
    pub fn new(sku_short_name: impl Into<String>, is_cloud: bool) -> Self {
        Self {
            sku_short_name: sku_short_name.into(),
            is_cloud,
        }
    }

    pub fn enterprise() -> Self {
        Self::new(SKU_ENTERPRISE, false)
    }
}
