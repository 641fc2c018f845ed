//! Molecular weight and isoelectric point tables and boxplots for protein FASTA collections

pub mod config;
pub mod error;
pub mod fasta;
pub mod pipeline;
pub mod plot;
pub mod properties;
pub mod table;
pub mod types;
