//! Accession-register (AR) numbers for QC samples
//!
//! Format: `AR-<YYYYMMDD>-<NNNN>`, where the four-digit sequence restarts at
//! 0001 every UTC calendar day.

use chrono::NaiveDate;
use thiserror::Error;

pub const ACCESSION_PREFIX: &str = "AR";

/// Highest sequence that fits the four-digit suffix
pub const MAX_ACCESSION_SEQUENCE: u16 = 9999;

/// Lower bound of the randomized suffix range
pub const RANDOM_SEQUENCE_MIN: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessionError {
    #[error("accession sequence for {0} is exhausted")]
    SequenceExhausted(NaiveDate),

    #[error("malformed accession number: {0}")]
    Malformed(String),
}

/// Day prefix shared by all accession numbers minted on `day`, e.g. `AR-20250101-`
pub fn accession_prefix(day: NaiveDate) -> String {
    format!("{}-{}-", ACCESSION_PREFIX, day.format("%Y%m%d"))
}

pub fn format_accession(day: NaiveDate, sequence: u16) -> String {
    format!("{}{:04}", accession_prefix(day), sequence)
}

/// Split an accession number into its day and sequence
pub fn parse_accession(accession: &str) -> Result<(NaiveDate, u16), AccessionError> {
    let malformed = || AccessionError::Malformed(accession.to_string());

    let mut parts = accession.splitn(3, '-');
    let (Some(prefix), Some(day), Some(sequence)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    if prefix != ACCESSION_PREFIX || day.len() != 8 || sequence.len() != 4 {
        return Err(malformed());
    }
    if !sequence.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }

    let day = NaiveDate::parse_from_str(day, "%Y%m%d").map_err(|_| malformed())?;
    let sequence: u16 = sequence.parse().map_err(|_| malformed())?;
    if sequence == 0 {
        return Err(malformed());
    }

    Ok((day, sequence))
}

/// Next sequence for a day given the highest one already issued
pub fn next_sequence(day: NaiveDate, highest: Option<u16>) -> Result<u16, AccessionError> {
    match highest {
        None => Ok(1),
        Some(highest) if highest >= MAX_ACCESSION_SEQUENCE => {
            Err(AccessionError::SequenceExhausted(day))
        }
        Some(highest) => Ok(highest + 1),
    }
}

/// Highest sequence among `accessions` that belongs to `day`
pub fn highest_sequence<'a, I>(day: NaiveDate, accessions: I) -> Option<u16>
where
    I: IntoIterator<Item = &'a str>,
{
    accessions
        .into_iter()
        .filter_map(|accession| parse_accession(accession).ok())
        .filter(|(issued_on, _)| *issued_on == day)
        .map(|(_, sequence)| sequence)
        .max()
}
