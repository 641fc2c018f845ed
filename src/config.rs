use crate::error::{PropertyError, Result};
use crate::plot::PlotOptions;
use crate::properties::{CalculatorOptions, MassMode, PiOptions, PkaScale};
use crate::types::Property;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths and settings for one pipeline run. Every field has a default, so a
/// TOML file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    pub mw_table_path: PathBuf,
    pub pi_table_path: PathBuf,
    pub mw_plot_path: PathBuf,
    pub pi_plot_path: PathBuf,
    pub mass_mode: MassMode,
    pub pka_scale: PkaScale,
    pub pi_precision: f64,
    pub plot: PlotOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("N_meningitidis.fasta"),
            mw_table_path: PathBuf::from("output_mw.csv"),
            pi_table_path: PathBuf::from("output_pi.csv"),
            mw_plot_path: PathBuf::from("MW_boxplot.jpg"),
            pi_plot_path: PathBuf::from("pI_boxplot.jpg"),
            mass_mode: MassMode::default(),
            pka_scale: PkaScale::default(),
            pi_precision: PiOptions::default().precision,
            plot: PlotOptions::default(),
        }
    }
}

impl Config {
    /// Loads a configuration from a TOML file; missing keys keep their defaults.
    ///
    /// # Errors
    /// * Returns `PropertyError::FileNotFound` / `PropertyError::Io` if the file cannot be read
    /// * Returns `PropertyError::InvalidFileFormat` if the TOML is malformed
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PropertyError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            PropertyError::InvalidFileFormat(format!("{}: {}", path.display(), e))
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PropertyError::DataError(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.calculator_options().pi.validate()?;
        self.plot.validate()
    }

    pub fn calculator_options(&self) -> CalculatorOptions {
        CalculatorOptions {
            mass_mode: self.mass_mode,
            pi: PiOptions {
                scale: self.pka_scale,
                precision: self.pi_precision,
                ..PiOptions::default()
            },
        }
    }

    pub fn table_path(&self, property: Property) -> &Path {
        match property {
            Property::MolecularWeight => &self.mw_table_path,
            Property::IsoelectricPoint => &self.pi_table_path,
        }
    }

    pub fn plot_path(&self, property: Property) -> &Path {
        match property {
            Property::MolecularWeight => &self.mw_plot_path,
            Property::IsoelectricPoint => &self.pi_plot_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_fixed_names() {
        let config = Config::default();
        assert_eq!(config.input_path, PathBuf::from("N_meningitidis.fasta"));
        assert_eq!(config.table_path(Property::MolecularWeight), Path::new("output_mw.csv"));
        assert_eq!(config.table_path(Property::IsoelectricPoint), Path::new("output_pi.csv"));
        assert_eq!(config.plot_path(Property::MolecularWeight), Path::new("MW_boxplot.jpg"));
        assert_eq!(config.plot_path(Property::IsoelectricPoint), Path::new("pI_boxplot.jpg"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            input_path = "proteome.fasta"
            pka_scale = "sillero"

            [plot]
            width = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.input_path, PathBuf::from("proteome.fasta"));
        assert_eq!(config.pka_scale, PkaScale::Sillero);
        assert_eq!(config.plot.width, 1024);
        assert_eq!(config.plot.height, PlotOptions::default().height);
        assert_eq!(config.mw_table_path, PathBuf::from("output_mw.csv"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.mass_mode = MassMode::Average;
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_precision() {
        let config = Config {
            pi_precision: -1.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PropertyError::InvalidParameter { .. })
        ));
    }
}
