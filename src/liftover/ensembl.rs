//! Liftover via the Ensembl REST API assembly mapping endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use crate::matching::schema::Locus;

use super::Liftover;

/// Default base URL of the Ensembl REST API.
pub const DEFAULT_BASE_URL: &str = "https://rest.ensembl.org";

/// Response of `GET /map/human/{asm_one}/{region}/{asm_two}`.
#[derive(Deserialize, Debug)]
struct MapResponse {
    mappings: Vec<Mapping>,
}

#[derive(Deserialize, Debug)]
struct Mapping {
    mapped: MappedRegion,
}

#[derive(Deserialize, Debug)]
struct MappedRegion {
    seq_region_name: String,
    start: u64,
    end: u64,
}

/// Translate single positions with Ensembl's assembly mapper.
#[derive(Debug, Clone)]
pub struct EnsemblLiftover {
    client: reqwest::Client,
    base_url: String,
}

impl EnsemblLiftover {
    /// Construct with the given client and base URL, e.g., [`DEFAULT_BASE_URL`].
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn map_url(&self, locus: &Locus) -> String {
        format!(
            "{}/map/human/{}/{}:{}..{}:1/{}",
            self.base_url,
            locus.release.name(),
            crate::common::strip_chr(&locus.contig),
            locus.position,
            locus.position,
            locus.release.other().name(),
        )
    }
}

#[async_trait]
impl Liftover for EnsemblLiftover {
    async fn translate(&self, locus: &Locus) -> Result<Option<Locus>, anyhow::Error> {
        let url = self.map_url(locus);
        tracing::debug!("liftover request {}", &url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("problem querying liftover service: {}", e))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "liftover service returned status {} for {}",
                response.status(),
                &url
            );
        }
        let body: MapResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("problem decoding liftover response: {}", e))?;

        // Only a unique point mapping counts as an equivalent locus.
        let target = locus.release.other();
        match body.mappings.as_slice() {
            [mapping] if mapping.mapped.start == mapping.mapped.end => Ok(Some(Locus {
                release: target,
                contig: target.normalize_contig(&mapping.mapped.seq_region_name),
                position: mapping.mapped.start,
            })),
            mappings => {
                tracing::debug!(
                    "no equivalent locus for {:?} ({} mappings)",
                    locus,
                    mappings.len()
                );
                Ok(None)
            }
        }
    }
}
