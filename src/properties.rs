use crate::error::{PropertyError, Result};
use crate::types::{Property, PropertyTable, SequenceCollection};
use log::debug;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monoisotopic mass of water, added once per chain for the free termini
pub const WATER_MONOISOTOPIC: f64 = 18.0105646837;
/// Average mass of water
pub const WATER_AVERAGE: f64 = 18.01524;

const PH_MIN: f64 = 0.0;
const PH_MAX: f64 = 14.0;
const DEFAULT_PI_PRECISION: f64 = 0.01;

/// Monoisotopic residue masses (Da), i.e. amino acid minus one water
static MONOISOTOPIC_RESIDUE_MASS: phf::Map<char, f64> = phf_map! {
    'A' => 71.03711378471,
    'C' => 103.00918478471,
    'D' => 115.02694302383,
    'E' => 129.04259308797,
    'F' => 147.06841391299,
    'G' => 57.02146372057,
    'H' => 137.05891185845,
    'I' => 113.08406397713,
    'K' => 128.09496301400,
    'L' => 113.08406397713,
    'M' => 131.04048491299,
    'N' => 114.04292744114,
    'O' => 237.14772686285,
    'P' => 97.05276384885,
    'Q' => 128.05857750528,
    'R' => 156.10111102360,
    'S' => 87.03202840427,
    'T' => 101.04767846841,
    'U' => 150.95363508471,
    'V' => 99.06841391299,
    'W' => 186.07931294986,
    'Y' => 163.06332853255,
};

/// Average residue masses (Da)
static AVERAGE_RESIDUE_MASS: phf::Map<char, f64> = phf_map! {
    'A' => 71.0788,
    'C' => 103.1388,
    'D' => 115.0886,
    'E' => 129.1155,
    'F' => 147.1766,
    'G' => 57.0519,
    'H' => 137.1411,
    'I' => 113.1594,
    'K' => 128.1741,
    'L' => 113.1594,
    'M' => 131.1926,
    'N' => 114.1038,
    'O' => 237.2982,
    'P' => 97.1167,
    'Q' => 128.1307,
    'R' => 156.1875,
    'S' => 87.0782,
    'T' => 101.1051,
    'U' => 150.0388,
    'V' => 99.1326,
    'W' => 186.2132,
    'Y' => 163.1760,
};

/// Which isotope weighting to use for molecular weight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MassMode {
    #[default]
    Monoisotopic,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charge {
    Positive,
    Negative,
}

impl Charge {
    fn sign(self) -> f64 {
        match self {
            Charge::Positive => 1.0,
            Charge::Negative => -1.0,
        }
    }
}

/// A pKa table: terminal groups plus ionizable side chains
#[derive(Debug)]
pub struct PkaTable {
    pub n_term: f64,
    pub c_term: f64,
    pub side_chains: &'static [(char, f64, Charge)],
}

static LEHNINGER: PkaTable = PkaTable {
    n_term: 9.69,
    c_term: 2.34,
    side_chains: &[
        ('K', 10.53, Charge::Positive),
        ('R', 12.48, Charge::Positive),
        ('H', 6.00, Charge::Positive),
        ('D', 3.65, Charge::Negative),
        ('E', 4.25, Charge::Negative),
        ('C', 8.18, Charge::Negative),
        ('Y', 10.07, Charge::Negative),
    ],
};

static SILLERO: PkaTable = PkaTable {
    n_term: 8.2,
    c_term: 3.2,
    side_chains: &[
        ('K', 10.4, Charge::Positive),
        ('R', 12.0, Charge::Positive),
        ('H', 6.4, Charge::Positive),
        ('D', 4.0, Charge::Negative),
        ('E', 4.5, Charge::Negative),
        ('C', 9.0, Charge::Negative),
        ('Y', 10.0, Charge::Negative),
    ],
};

static RODWELL: PkaTable = PkaTable {
    n_term: 8.0,
    c_term: 3.1,
    side_chains: &[
        ('K', 11.5, Charge::Positive),
        ('R', 11.5, Charge::Positive),
        ('H', 6.0, Charge::Positive),
        ('D', 3.68, Charge::Negative),
        ('E', 4.25, Charge::Negative),
        ('C', 8.33, Charge::Negative),
        ('Y', 10.07, Charge::Negative),
    ],
};

/// Named pKa scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PkaScale {
    #[default]
    Lehninger,
    Sillero,
    Rodwell,
}

impl PkaScale {
    pub fn table(&self) -> &'static PkaTable {
        match self {
            PkaScale::Lehninger => &LEHNINGER,
            PkaScale::Sillero => &SILLERO,
            PkaScale::Rodwell => &RODWELL,
        }
    }
}

/// Settings for the isoelectric point search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiOptions {
    pub scale: PkaScale,
    /// Width of the final bisection interval, in pH units
    pub precision: f64,
    pub ph_range: (f64, f64),
}

impl Default for PiOptions {
    fn default() -> Self {
        Self {
            scale: PkaScale::default(),
            precision: DEFAULT_PI_PRECISION,
            ph_range: (PH_MIN, PH_MAX),
        }
    }
}

impl PiOptions {
    /// # Errors
    /// * Returns `PropertyError::InvalidParameter` for a non-positive precision or a
    ///   pH range that is reversed or leaves [0, 14]
    pub fn validate(&self) -> Result<()> {
        if !(self.precision > 0.0) {
            return Err(PropertyError::invalid_parameter(
                "pi_precision",
                self.precision,
                "must be positive",
            ));
        }
        let (lo, hi) = self.ph_range;
        if !(PH_MIN..=PH_MAX).contains(&lo) || !(PH_MIN..=PH_MAX).contains(&hi) || lo >= hi {
            return Err(PropertyError::invalid_parameter(
                "ph_range",
                format!("{}..{}", lo, hi),
                "must be an increasing range within 0..14",
            ));
        }
        Ok(())
    }
}

/// Options for a full calculator pass over a collection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalculatorOptions {
    pub mass_mode: MassMode,
    pub pi: PiOptions,
}

/// Counts residues, rejecting any code without a known mass.
///
/// Positions in errors are 1-based.
fn composition(residues: &str) -> Result<BTreeMap<char, usize>> {
    let mut counts = BTreeMap::new();
    for (idx, residue) in residues.chars().enumerate() {
        if !MONOISOTOPIC_RESIDUE_MASS.contains_key(&residue) {
            return Err(PropertyError::invalid_sequence(
                idx + 1,
                format!("unsupported residue '{}'", residue),
            ));
        }
        *counts.entry(residue).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Calculates the neutral monoisotopic mass of a protein sequence.
///
/// # Arguments
/// * `residues` - Upper-case one-letter residue codes
///
/// # Returns
/// * `Result<f64>` - Sum of residue masses plus one water, in Daltons
///
/// # Errors
/// * Returns `PropertyError::InvalidSequence` if a residue outside the 20 standard
///   amino acids plus `U` and `O` is present
pub fn molecular_weight(residues: &str) -> Result<f64> {
    molecular_weight_with(residues, MassMode::Monoisotopic)
}

/// Like [`molecular_weight`] but with an explicit isotope weighting
pub fn molecular_weight_with(residues: &str, mode: MassMode) -> Result<f64> {
    let (table, water) = match mode {
        MassMode::Monoisotopic => (&MONOISOTOPIC_RESIDUE_MASS, WATER_MONOISOTOPIC),
        MassMode::Average => (&AVERAGE_RESIDUE_MASS, WATER_AVERAGE),
    };

    let counts = composition(residues)?;
    let mass = counts
        .iter()
        .map(|(residue, &n)| table[residue] * n as f64)
        .sum::<f64>();

    Ok(mass + water)
}

fn net_charge(counts: &BTreeMap<char, usize>, ph: f64, table: &PkaTable) -> f64 {
    // Henderson-Hasselbalch: fraction charged = 1 / (1 + 10^(z * (pH - pKa)))
    let group = |pka: f64, charge: Charge| {
        let z = charge.sign();
        z / (1.0 + 10f64.powf(z * (ph - pka)))
    };

    let termini = group(table.n_term, Charge::Positive) + group(table.c_term, Charge::Negative);
    let side_chains = table
        .side_chains
        .iter()
        .map(|&(residue, pka, charge)| {
            counts.get(&residue).copied().unwrap_or(0) as f64 * group(pka, charge)
        })
        .sum::<f64>();

    termini + side_chains
}

/// Net charge of a sequence at the given pH.
///
/// # Errors
/// * Returns `PropertyError::InvalidSequence` on unsupported residues
pub fn charge_at_ph(residues: &str, ph: f64, scale: PkaScale) -> Result<f64> {
    let counts = composition(residues)?;
    Ok(net_charge(&counts, ph, scale.table()))
}

/// Calculates the isoelectric point using the Lehninger pKa scale.
///
/// The net charge is bisected over pH 0–14 until the bracketing interval is
/// narrower than 0.01, and the midpoint is returned.
///
/// # Arguments
/// * `residues` - Upper-case one-letter residue codes
///
/// # Returns
/// * `Result<f64>` - pH at which the net charge crosses zero
///
/// # Errors
/// * Returns `PropertyError::InvalidSequence` on unsupported residues
pub fn isoelectric_point(residues: &str) -> Result<f64> {
    isoelectric_point_with(residues, &PiOptions::default())
}

/// Like [`isoelectric_point`] but with an explicit scale, precision and pH range.
///
/// When the charge has the same sign at both ends of the range, the end with
/// the smaller absolute charge is returned.
pub fn isoelectric_point_with(residues: &str, options: &PiOptions) -> Result<f64> {
    options.validate()?;
    let counts = composition(residues)?;
    let table = options.scale.table();

    let (mut left_x, mut right_x) = options.ph_range;
    let mut left_y = net_charge(&counts, left_x, table);
    let mut right_y = net_charge(&counts, right_x, table);

    while right_x - left_x > options.precision {
        if left_y * right_y > 0.0 {
            return Ok(if left_y.abs() < right_y.abs() {
                left_x
            } else {
                right_x
            });
        }
        let middle_x = (left_x + right_x) / 2.0;
        let middle_y = net_charge(&counts, middle_x, table);
        if middle_y * left_y < 0.0 {
            right_x = middle_x;
            right_y = middle_y;
        } else {
            left_x = middle_x;
            left_y = middle_y;
        }
    }

    Ok((left_x + right_x) / 2.0)
}

/// Computes molecular weight and isoelectric point for every sequence.
///
/// # Arguments
/// * `sequences` - Loaded records; their order is the order of both output tables
/// * `options` - Mass mode and pI search settings
///
/// # Returns
/// * `Result<(PropertyTable, PropertyTable)>` - Molecular weight table and
///   isoelectric point table, equal length and identical identifier order
///
/// # Errors
/// * Returns `PropertyError::InvalidSequence` for the first record containing an
///   unsupported residue; the message names the record
/// * Returns `PropertyError::InvalidParameter` if the pI options are invalid
pub fn compute_properties(
    sequences: &SequenceCollection,
    options: &CalculatorOptions,
) -> Result<(PropertyTable, PropertyTable)> {
    options.pi.validate()?;

    let mut mw_table = PropertyTable::new(Property::MolecularWeight);
    let mut pi_table = PropertyTable::new(Property::IsoelectricPoint);

    for record in sequences {
        let annotate = |e: PropertyError| match e {
            PropertyError::InvalidSequence { position, message } => {
                PropertyError::invalid_sequence(position, format!("{} in {}", message, record.id))
            }
            other => other,
        };

        let weight = molecular_weight_with(&record.residues, options.mass_mode).map_err(annotate)?;
        let pi = isoelectric_point_with(&record.residues, &options.pi).map_err(annotate)?;

        mw_table.push(record.id.clone(), weight);
        pi_table.push(record.id.clone(), pi);
    }

    debug!("Computed properties for {} sequences", mw_table.len());
    Ok((mw_table, pi_table))
}
