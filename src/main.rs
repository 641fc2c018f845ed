use clap::Parser;
use log::LevelFilter;
use protein_props::config::Config;
use protein_props::error::Result;
use protein_props::pipeline::Pipeline;
use protein_props::properties::{MassMode, PkaScale};
use protein_props::types::Property;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "protein-props",
    about = "Computes molecular weight and isoelectric point for every protein in a FASTA file",
    long_about = "Reads a protein FASTA file, computes the monoisotopic molecular weight and the \
                  isoelectric point of each sequence, writes one CSV table per property and \
                  exports a boxplot of each property's distribution.",
    version,
    after_help = "Example usage:\n    \
                  protein-props\n    \
                  protein-props --input proteome.fasta --mw-plot mw.png --pi-plot pi.png\n    \
                  protein-props --config run.toml -v",
    color = clap::ColorChoice::Auto
)]
struct Args {
    /// TOML file with run settings; flags given on the command line take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input protein FASTA file
    #[arg(short, long, value_name = "FASTA")]
    input: Option<PathBuf>,

    /// Output CSV for molecular weights
    #[arg(long, value_name = "CSV")]
    mw_table: Option<PathBuf>,

    /// Output CSV for isoelectric points
    #[arg(long, value_name = "CSV")]
    pi_table: Option<PathBuf>,

    /// Output image for the molecular weight boxplot (png, jpg or bmp)
    #[arg(long, value_name = "IMAGE")]
    mw_plot: Option<PathBuf>,

    /// Output image for the isoelectric point boxplot (png, jpg or bmp)
    #[arg(long, value_name = "IMAGE")]
    pi_plot: Option<PathBuf>,

    /// Isotope weighting for molecular weight
    #[arg(long, value_enum)]
    mass_mode: Option<MassMode>,

    /// pKa scale for isoelectric point
    #[arg(long, value_enum)]
    pka_scale: Option<PkaScale>,

    /// TrueType font used for plot text
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress log output
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };

        if let Some(path) = self.input {
            config.input_path = path;
        }
        if let Some(path) = self.mw_table {
            config.mw_table_path = path;
        }
        if let Some(path) = self.pi_table {
            config.pi_table_path = path;
        }
        if let Some(path) = self.mw_plot {
            config.mw_plot_path = path;
        }
        if let Some(path) = self.pi_plot {
            config.pi_plot_path = path;
        }
        if let Some(mode) = self.mass_mode {
            config.mass_mode = mode;
        }
        if let Some(scale) = self.pka_scale {
            config.pka_scale = scale;
        }
        if self.font.is_some() {
            config.plot.font_path = self.font;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbosity: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Off
    } else {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let pipeline = Pipeline::new(args.into_config()?);

    pipeline.export_tables()?;
    println!("Molecular weights and isoelectric points calculated and saved to CSVs.");

    for property in [Property::MolecularWeight, Property::IsoelectricPoint] {
        let out = pipeline.export_boxplot(property)?;
        println!("Boxplot exported as {}", out.display());
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
