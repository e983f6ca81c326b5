//! Tunable options, loadable from TOML.
//!
//! ```toml
//! [compile]
//! accelerate_meshes = true
//!
//! [compile.bvh]
//! leaf_threshold = 4
//! max_split_candidates = 32
//! min_split_candidates = 4
//!
//! [kernel]
//! quartic_precision = "double"
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};

use crate::bvh::BvhOptions;
use crate::error::ConfigError;
use crate::intersect::QuarticPrecision;

/// Options for [`SceneCompiler`](crate::SceneCompiler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Build a BVH for every mesh. When off, meshes are compiled with only a
    /// bounding box and tested triangle by triangle.
    pub accelerate_meshes: bool,
    /// SAH construction parameters.
    pub bvh: BvhOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            accelerate_meshes: true,
            bvh: BvhOptions::default(),
        }
    }
}

/// Options for [`Kernel`](crate::Kernel).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelOptions {
    /// Precision of the torus quartic solve.
    pub quartic_precision: QuarticPrecision,
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Scene compilation.
    pub compile: CompileOptions,
    /// Intersection kernel.
    pub kernel: KernelOptions,
}

impl CoreConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bvh = &self.compile.bvh;
        if bvh.leaf_threshold == 0 {
            return Err(ConfigError::Invalid {
                key: "compile.bvh.leaf_threshold",
                reason: "must be at least 1",
            });
        }
        if bvh.min_split_candidates == 0 {
            return Err(ConfigError::Invalid {
                key: "compile.bvh.min_split_candidates",
                reason: "must be at least 1",
            });
        }
        if bvh.max_split_candidates < bvh.min_split_candidates {
            return Err(ConfigError::Invalid {
                key: "compile.bvh.max_split_candidates",
                reason: "must not be below min_split_candidates",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.compile.accelerate_meshes);
        assert_eq!(config.kernel.quartic_precision, QuarticPrecision::Double);
    }

    #[test]
    fn test_partial_document() {
        let config = CoreConfig::from_toml_str(
            r#"
            [compile]
            accelerate_meshes = false

            [compile.bvh]
            max_split_candidates = 8

            [kernel]
            quartic_precision = "single"
            "#,
        )
        .unwrap();
        assert!(!config.compile.accelerate_meshes);
        assert_eq!(config.compile.bvh.max_split_candidates, 8);
        assert_eq!(config.compile.bvh.leaf_threshold, 4);
        assert_eq!(config.kernel.quartic_precision, QuarticPrecision::Single);
    }

    #[test]
    fn test_round_trip() {
        let mut config = CoreConfig::default();
        config.compile.bvh.leaf_threshold = 2;
        let text = config.to_toml_string().unwrap();
        assert_eq!(CoreConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            CoreConfig::from_toml_str("[kernel]\nquartic_precision = \"quad\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("[compile.bvh]\nleaf_threshold = 0"),
            Err(ConfigError::Invalid { key: "compile.bvh.leaf_threshold", .. })
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("[compile.bvh]\nmax_split_candidates = 2"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
