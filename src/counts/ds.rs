//! Module with datastructures stored in the count stores.

use byteorder::{ByteOrder, LittleEndian};

use crate::matching::schema::CountTally;

/// Allele and homozygote counts by sequencing modality.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counts {
    /// Alternative allele count in exomes.
    pub ac_exome: u32,
    /// Alternative allele count in genomes.
    pub ac_genome: u32,
    /// Number of hom. alt. individuals in exomes.
    pub hom_exome: u32,
    /// Number of hom. alt. individuals in genomes.
    pub hom_genome: u32,
}

impl Counts {
    /// Convert to a byte vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16);
        buf.extend_from_slice(&self.ac_exome.to_le_bytes());
        buf.extend_from_slice(&self.ac_genome.to_le_bytes());
        buf.extend_from_slice(&self.hom_exome.to_le_bytes());
        buf.extend_from_slice(&self.hom_genome.to_le_bytes());
        buf
    }

    /// Convert from a byte vector.
    pub fn from_vec(buf: &[u8]) -> Result<Self, anyhow::Error> {
        if buf.len() != 16 {
            anyhow::bail!("invalid counts record of length {}", buf.len());
        }
        Ok(Self {
            ac_exome: LittleEndian::read_u32(&buf[0..4]),
            ac_genome: LittleEndian::read_u32(&buf[4..8]),
            hom_exome: LittleEndian::read_u32(&buf[8..12]),
            hom_genome: LittleEndian::read_u32(&buf[12..16]),
        })
    }

    /// Aggregate other into self, saturating at `u32::MAX`.
    pub fn aggregate(&mut self, other: &Self) {
        self.ac_exome = self.ac_exome.saturating_add(other.ac_exome);
        self.ac_genome = self.ac_genome.saturating_add(other.ac_genome);
        self.hom_exome = self.hom_exome.saturating_add(other.hom_exome);
        self.hom_genome = self.hom_genome.saturating_add(other.hom_genome);
    }
}

impl From<Counts> for CountTally {
    fn from(val: Counts) -> Self {
        CountTally {
            allele_count: val.ac_exome as u64 + val.ac_genome as u64,
            hom_count: val.hom_exome as u64 + val.hom_genome as u64,
        }
    }
}
