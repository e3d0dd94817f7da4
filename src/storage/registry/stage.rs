//! Deployment stages

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::RegistryError;

/// Deployment stage of a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelStage {
    /// Registered but not deployed anywhere
    None,
    /// Being validated before release
    Staging,
    /// Deployed and serving traffic
    Production,
    /// Retired; can be promoted again explicitly
    Archived,
}

impl ModelStage {
    /// Every stage, in lifecycle order
    pub const ALL: [ModelStage; 4] =
        [ModelStage::None, ModelStage::Staging, ModelStage::Production, ModelStage::Archived];

    /// Stages that admit at most one version per lineage
    pub fn is_exclusive(&self) -> bool {
        match self {
            ModelStage::Staging | ModelStage::Production => true,
            ModelStage::None | ModelStage::Archived => false,
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStage::None => "None",
            ModelStage::Staging => "Staging",
            ModelStage::Production => "Production",
            ModelStage::Archived => "Archived",
        }
    }
}

impl std::fmt::Display for ModelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ModelStage {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(ModelStage::None),
            "Staging" => Ok(ModelStage::Staging),
            "Production" => Ok(ModelStage::Production),
            "Archived" => Ok(ModelStage::Archived),
            other => Err(RegistryError::InvalidStage(other.to_string())),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_unknown_names_are_invalid(name in "[a-zA-Z]{1,12}") {
            let known = ModelStage::ALL.iter().any(|s| s.as_str() == name);
            prop_assert_eq!(name.parse::<ModelStage>().is_ok(), known);
        }
    }
}
