use crate::config::Config;
use crate::error::{Result, Stage};
use crate::fasta::read_fasta;
use crate::plot::plot_boxplot;
use crate::properties::compute_properties;
use crate::table::write_property_table;
use crate::types::{Property, PropertyTable};
use log::{debug, info, log_enabled, Level};
use std::path::PathBuf;

/// Outputs of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub sequences: usize,
    pub mw_table: PropertyTable,
    pub pi_table: PropertyTable,
    pub outputs: Vec<PathBuf>,
}

/// The load → compute → write → plot sequence for one configuration.
///
/// Errors are tagged with the stage that raised them. Files written by earlier
/// stages stay on disk when a later stage fails.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        if log_enabled!(Level::Debug) {
            match config.to_toml() {
                Ok(text) => debug!("Effective configuration:\n{}", text.trim_end()),
                Err(e) => debug!("Effective configuration not serializable: {}", e),
            }
        }
        Self { config }
    }

    /// Loads the FASTA input, computes both properties and writes both tables.
    ///
    /// Nothing is written unless every sequence was computed successfully.
    pub fn export_tables(&self) -> Result<(PropertyTable, PropertyTable)> {
        let sequences =
            read_fasta(&self.config.input_path).map_err(|e| e.in_stage(Stage::LoadSequences))?;

        let (mw_table, pi_table) = compute_properties(&sequences, &self.config.calculator_options())
            .map_err(|e| e.in_stage(Stage::ComputeProperties))?;

        for table in [&mw_table, &pi_table] {
            write_property_table(table, self.config.table_path(table.property))
                .map_err(|e| e.in_stage(Stage::WriteTables))?;
        }

        info!(
            "Wrote {} and {} for {} sequences",
            self.config.mw_table_path.display(),
            self.config.pi_table_path.display(),
            sequences.len()
        );
        Ok((mw_table, pi_table))
    }

    /// Renders the boxplot for one property from its table on disk.
    pub fn export_boxplot(&self, property: Property) -> Result<PathBuf> {
        let stage = match property {
            Property::MolecularWeight => Stage::PlotMolecularWeight,
            Property::IsoelectricPoint => Stage::PlotIsoelectricPoint,
        };
        let out = self.config.plot_path(property);

        plot_boxplot(
            self.config.table_path(property),
            property.column_name(),
            out,
            &self.config.plot,
        )
        .map_err(|e| e.in_stage(stage))?;

        Ok(out.to_path_buf())
    }

    /// Runs every stage in order.
    pub fn run(&self) -> Result<RunReport> {
        let (mw_table, pi_table) = self.export_tables()?;
        let mut outputs = vec![
            self.config.mw_table_path.clone(),
            self.config.pi_table_path.clone(),
        ];
        for property in [Property::MolecularWeight, Property::IsoelectricPoint] {
            outputs.push(self.export_boxplot(property)?);
        }

        Ok(RunReport {
            sequences: mw_table.len(),
            mw_table,
            pi_table,
            outputs,
        })
    }
}
