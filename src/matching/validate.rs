//! Validation of the raw `GET /match` query parameters.

use std::collections::HashMap;

use crate::{common::GenomeRelease, err::ValidationError, liftover::LocusOracle};

use super::schema::{Allele, Locus};

/// The required query parameters, in the order they are reported when missing.
pub const REQUIRED_PARAMS: [&str; 5] = [
    "assemblyId",
    "referenceName",
    "start",
    "referenceBases",
    "alternateBases",
];

/// Turn the raw query parameters into a locus on the requested release and the allele.
///
/// The first failing check wins; no backend is contacted here except for the
/// (local) locus oracle.
pub fn validate(
    params: &HashMap<String, String>,
    oracle: &dyn LocusOracle,
) -> Result<(Locus, Allele), ValidationError> {
    let missing = REQUIRED_PARAMS
        .iter()
        .filter(|name| !params.contains_key(**name))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ValidationError::MissingParameters(missing));
    }
    let param = |name: &str| params.get(name).map(String::as_str).unwrap_or_default();

    let assembly_id = param("assemblyId");
    let release = GenomeRelease::from_alias(assembly_id)
        .ok_or_else(|| ValidationError::InvalidAssemblyId(assembly_id.to_string()))?;

    let reference_name = param("referenceName");
    let contig = release.normalize_contig(reference_name);
    if !oracle.is_valid_contig(release, &contig) {
        return Err(ValidationError::InvalidReferenceName(
            reference_name.to_string(),
        ));
    }

    let start = param("start");
    let position = if !start.is_empty() && start.bytes().all(|b| b.is_ascii_digit()) {
        start
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidStart(start.to_string()))?
    } else {
        return Err(ValidationError::InvalidStart(start.to_string()));
    };
    if !oracle.is_valid_locus(release, &contig, position) {
        return Err(ValidationError::InvalidStart(position.to_string()));
    }

    Ok((
        Locus {
            release,
            contig,
            position,
        },
        Allele {
            reference: param("referenceBases").to_string(),
            alternative: param("alternateBases").to_string(),
        },
    ))
}
