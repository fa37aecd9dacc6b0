//! Configuration file support for batch analysis

use crate::density::DensityKernel;
use crate::error::{MeshError, Result};
use crate::mesh::ManifoldPolicy;
use crate::periodic::PeriodicBox;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One density field to compute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityRequest {
    /// Name of the resulting per-vertex field
    pub name: String,

    /// Kernel shape, bandwidth and limits
    #[serde(default)]
    pub kernel: DensityKernel,

    /// Query vertices (all vertices if not specified)
    #[serde(default)]
    pub ids: Option<Vec<usize>>,

    /// Contributing vertices (all vertices if not specified)
    ///
    /// Mutually exclusive with `ids`.
    #[serde(default)]
    pub sources: Option<Vec<usize>>,
}

impl DensityRequest {
    /// Request a density over all vertices
    pub fn new(name: impl Into<String>, kernel: DensityKernel) -> Self {
        Self {
            name: name.into(),
            kernel,
            ids: None,
            sources: None,
        }
    }
}

/// Periodic processing options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicConfig {
    /// Periodic box
    pub bbox: PeriodicBox,

    /// Number of axes to wrap (2 = xy, 3 = xyz)
    #[serde(default = "default_wrap_axes")]
    pub wrap_axes: usize,

    /// Create ghost vertices for boundary-crossing faces
    #[serde(default = "default_true")]
    pub duplicate: bool,
}

fn default_wrap_axes() -> usize {
    2
}

fn default_true() -> bool {
    true
}

/// Top-level configuration for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Input mesh file path
    pub input_file: String,

    /// Output VTP file path
    pub output_file: String,

    /// Optional JSON summary path
    #[serde(default)]
    pub summary_file: Option<String>,

    /// Periodic box handling (non-periodic if not specified)
    #[serde(default)]
    pub periodic: Option<PeriodicConfig>,

    /// Density fields to compute, in order
    #[serde(default)]
    pub densities: Vec<DensityRequest>,

    /// Write vertex and face normals
    #[serde(default = "default_true")]
    pub normals: bool,

    /// Compute point areas (stored as the `area` field)
    #[serde(default = "default_true")]
    pub point_areas: bool,

    /// Treatment of edges shared by more than two faces
    #[serde(default)]
    pub manifold_policy: ManifoldPolicy,
}

impl AnalysisConfig {
    /// Default configuration for one input and output
    pub fn new(input_file: impl Into<String>, output_file: impl Into<String>) -> Self {
        Self {
            input_file: input_file.into(),
            output_file: output_file.into(),
            summary_file: None,
            periodic: None,
            densities: Vec::new(),
            normals: true,
            point_areas: true,
            manifold_policy: ManifoldPolicy::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MeshError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            MeshError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            MeshError::ConfigurationError(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content).map_err(|e| {
            MeshError::ConfigurationError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Check kernels, the periodic box and density request names
    pub fn validate(&self) -> Result<()> {
        if let Some(periodic) = &self.periodic {
            periodic.bbox.validate()?;
            if !(periodic.wrap_axes == 2 || periodic.wrap_axes == 3) {
                return Err(MeshError::ConfigurationError(format!(
                    "wrap_axes must be 2 or 3, got {}",
                    periodic.wrap_axes
                )));
            }
        }

        for (i, request) in self.densities.iter().enumerate() {
            request.kernel.validate()?;
            if request.name.is_empty() {
                return Err(MeshError::ConfigurationError(format!(
                    "Density request {} has an empty name",
                    i
                )));
            }
            if request.ids.is_some() && request.sources.is_some() {
                return Err(MeshError::ConfigurationError(format!(
                    "Density request '{}' sets both ids and sources",
                    request.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::KernelShape;
    use tempfile::tempdir;

    #[test]
    fn test_parse_minimal_config() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{
                "input_file": "membrane.off",
                "output_file": "membrane.vtp",
                "densities": [
                    {"name": "density", "kernel": {"shape": "epanechnikov", "bandwidth": 2.0}}
                ]
            }"#,
        )
        .unwrap();

        assert!(config.normals);
        assert!(config.point_areas);
        assert!(config.periodic.is_none());
        assert_eq!(config.manifold_policy, ManifoldPolicy::FirstMatch);
        assert_eq!(config.densities[0].kernel.shape, KernelShape::Epanechnikov);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_periodic_defaults() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{
                "input_file": "a.off",
                "output_file": "a.vtp",
                "periodic": {"bbox": {"min": [0, 0, 0], "max": [10, 10, 0]}}
            }"#,
        )
        .unwrap();

        let periodic = config.periodic.as_ref().unwrap();
        assert_eq!(periodic.wrap_axes, 2);
        assert_eq!(periodic.bbox.dims, 2);
        assert!(periodic.duplicate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_requests() {
        let mut config = AnalysisConfig::new("a.off", "a.vtp");
        config
            .densities
            .push(DensityRequest::new("bad", DensityKernel::gaussian(0.0)));
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new("a.off", "a.vtp");
        let mut request = DensityRequest::new("both", DensityKernel::gaussian(1.0));
        request.ids = Some(vec![0]);
        request.sources = Some(vec![1]);
        config.densities.push(request);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AnalysisConfig::new("membrane.off", "membrane.vtp");
        config
            .densities
            .push(DensityRequest::new("density", DensityKernel::gaussian(1.5)));
        config.to_file(&path).unwrap();

        let loaded = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(loaded.input_file, "membrane.off");
        assert_eq!(loaded.densities.len(), 1);
        assert_eq!(loaded.densities[0].kernel.bandwidth, 1.5);
    }

    #[test]
    fn test_missing_file() {
        let result = AnalysisConfig::from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(MeshError::ConfigurationError(_))));
    }
}
