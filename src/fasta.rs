use crate::error::{PropertyError, Result};
use crate::types::SequenceCollection;
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Reads protein sequences from a FASTA format file into an ordered collection.
///
/// The identifier of each record is the first whitespace-delimited token of its
/// header line; the rest of the header (the description) is dropped. Residue
/// lines are concatenated and upper-cased but otherwise passed through as-is, so
/// ambiguity codes reach the property calculator untouched.
///
/// # Arguments
/// * `path` - Path to the FASTA file to read
///
/// # Returns
/// * `Result<SequenceCollection>` - Records in the order they appear in the file
///
/// # Errors
/// * Returns `PropertyError::FileNotFound` if the path does not exist
/// * Returns `PropertyError::Io` for other file reading issues
/// * Returns `PropertyError::InvalidFileFormat` if a header has no identifier,
///   an identifier repeats, or no sequences are found
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<SequenceCollection> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PropertyError::FileNotFound(path.to_path_buf()),
        _ => PropertyError::Io(e),
    })?;
    let reader = BufReader::new(file);

    let mut sequences = SequenceCollection::new();
    let mut current_header: Option<String> = None;
    let mut current_sequence = String::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if let Some(header) = line.strip_prefix('>') {
            if let Some(id) = current_header.take() {
                sequences.insert(id, current_sequence.to_uppercase())?;
                current_sequence.clear();
            }
            let id = header.split_whitespace().next().ok_or_else(|| {
                PropertyError::InvalidFileFormat(format!(
                    "Missing sequence identifier on line {}",
                    line_no + 1
                ))
            })?;
            current_header = Some(id.to_string());
        } else if line.is_empty() || line.starts_with(';') {
            continue;
        } else if current_header.is_some() {
            current_sequence.extend(line.chars().filter(|c| !c.is_whitespace()));
        } else {
            skipped += 1;
        }
    }

    if let Some(id) = current_header {
        sequences.insert(id, current_sequence.to_uppercase())?;
    }

    if skipped > 0 {
        warn!(
            "Ignored {} line(s) before the first FASTA header in {}",
            skipped,
            path.display()
        );
    }

    if sequences.is_empty() {
        return Err(PropertyError::InvalidFileFormat("No sequences found".into()));
    }

    debug!("Loaded {} sequences from {}", sequences.len(), path.display());
    Ok(sequences)
}

/// Writes a sequence collection to a FASTA format file, one residue line per record.
///
/// # Arguments
/// * `sequences` - Records to write, in collection order
/// * `path` - Path where the FASTA file should be written
///
/// # Errors
/// * Returns `PropertyError::Io` for file writing issues
pub fn write_fasta<P: AsRef<Path>>(sequences: &SequenceCollection, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    for record in sequences {
        writeln!(writer, ">{}", record.id)?;
        writeln!(writer, "{}", record.residues)?;
    }

    writer.flush()?;
    Ok(())
}
