//! The match pipeline: validation, lookups on both genome releases, and
//! formatting of the beacon response.

use std::{collections::HashMap, sync::Arc};

use crate::{
    counts::CountStore,
    err::MatchError,
    liftover::{Liftover, LocusOracle},
};

pub mod output;
pub mod schema;
pub mod validate;

use schema::{Allele, CountTally, Locus, MatchResult};

/// Path of the human readable variant record below the base URL.
pub const VARIANT_LOOKUP_PATH: &str = "summary_data/variant_lookup";

/// Settings of the match pipeline, fixed at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSettings {
    /// Node identifier used in handover and result set labels.
    pub node_id: String,
    /// Base URL of the human readable variant record.
    pub base_url: String,
    /// Static contact address, overrides the handover URL when set.
    pub contact_email: Option<String>,
}

impl MatchSettings {
    /// The handover URL for the variant at `locus`.
    pub fn handover_url(&self, locus: &Locus, allele: &Allele) -> Result<String, anyhow::Error> {
        if let Some(contact_email) = &self.contact_email {
            return Ok(format!("mailto:{}", contact_email));
        }
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                VARIANT_LOOKUP_PATH
            ),
            &[
                ("genomeVersion", locus.release.version().to_string()),
                ("variantId", locus.variant_id(allele)),
            ],
        )
        .map_err(|e| anyhow::anyhow!("invalid base URL {}: {}", &self.base_url, e))?;
        Ok(url.to_string())
    }
}

/// Pick the locus the handover points to.
///
/// The lifted locus is only used if the requested release has no observation
/// but the other one has.
pub fn handover_target<'a>(
    locus: &'a Locus,
    primary: CountTally,
    lifted: Option<(&'a Locus, CountTally)>,
) -> &'a Locus {
    match lifted {
        Some((lifted_locus, secondary))
            if primary.allele_count == 0 && secondary.allele_count > 0 =>
        {
            lifted_locus
        }
        _ => locus,
    }
}

/// Runs match requests against the count store on both genome releases.
pub struct Matcher {
    pub settings: MatchSettings,
    pub oracle: Arc<dyn LocusOracle>,
    pub counts: Arc<dyn CountStore>,
    pub liftover: Arc<dyn Liftover>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Matcher {
    /// Look up the counts of `allele` at `locus` on the blocking thread pool.
    async fn lookup(&self, locus: &Locus, allele: &Allele) -> Result<CountTally, anyhow::Error> {
        let counts = self.counts.clone();
        let (locus, allele) = (locus.clone(), allele.clone());
        let tally = tokio::task::spawn_blocking(move || counts.lookup(&locus, &allele))
            .await
            .map_err(|e| anyhow::anyhow!("count store lookup did not complete: {}", e))??;
        Ok(tally)
    }

    /// Answer the match query given by the raw query parameters.
    ///
    /// The caller must have authenticated the request.
    pub async fn run(&self, params: &HashMap<String, String>) -> Result<MatchResult, MatchError> {
        let (locus, allele) = validate::validate(params, self.oracle.as_ref())?;

        let primary = self.lookup(&locus, &allele).await?;
        tracing::debug!("{:?} {:?} -> {:?}", &locus, &allele, &primary);

        let lifted_locus = match self.liftover.translate(&locus).await {
            Ok(lifted_locus) => lifted_locus,
            Err(e) => {
                tracing::warn!(
                    "liftover of {:?} failed, counting {} only: {}",
                    &locus,
                    locus.release,
                    e
                );
                None
            }
        };
        let lifted = match &lifted_locus {
            Some(lifted_locus) => {
                let secondary = self.lookup(lifted_locus, &allele).await?;
                tracing::debug!("{:?} {:?} -> {:?}", lifted_locus, &allele, &secondary);
                Some((lifted_locus, secondary))
            }
            None => {
                tracing::debug!("no equivalent of {:?} on {}", &locus, locus.release.other());
                None
            }
        };

        let mut tally = primary;
        if let Some((_, secondary)) = &lifted {
            tally.aggregate(*secondary);
        }

        let target = handover_target(&locus, primary, lifted);
        let url = self.settings.handover_url(target, &allele)?;

        Ok(output::format_result(&self.settings.node_id, tally, &url))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        common::GenomeRelease,
        counts::{StoreScope, TsvCountStore},
        err::ValidationError,
        liftover::ContigLengths,
    };

    /// Liftover from a fixed table, counting the calls.
    #[derive(Default)]
    pub struct TableLiftover {
        pub table: HashMap<Locus, Locus>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl Liftover for TableLiftover {
        async fn translate(&self, locus: &Locus) -> Result<Option<Locus>, anyhow::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("liftover service unavailable");
            }
            Ok(self.table.get(locus).cloned())
        }
    }

    /// Count store whose every lookup fails.
    pub struct FailingCounts;

    impl CountStore for FailingCounts {
        fn lookup(&self, _locus: &Locus, _allele: &Allele) -> Result<CountTally, anyhow::Error> {
            Err(anyhow::anyhow!("disk unavailable").context("count store lookup failed"))
        }
    }

    fn locus(release: GenomeRelease, contig: &str, position: u64) -> Locus {
        Locus {
            release,
            contig: contig.into(),
            position,
        }
    }

    pub fn liftover_table() -> HashMap<Locus, Locus> {
        [
            (
                locus(GenomeRelease::Grch37, "7", 140453136),
                locus(GenomeRelease::Grch38, "chr7", 140753336),
            ),
            (
                locus(GenomeRelease::Grch38, "chr7", 140753336),
                locus(GenomeRelease::Grch37, "7", 140453136),
            ),
            (
                locus(GenomeRelease::Grch37, "1", 55516888),
                locus(GenomeRelease::Grch38, "chr1", 55051215),
            ),
        ]
        .into_iter()
        .collect()
    }

    pub fn settings(contact_email: Option<&str>) -> MatchSettings {
        MatchSettings {
            node_id: "seqr".into(),
            base_url: "https://seqr.example.org/".into(),
            contact_email: contact_email.map(String::from),
        }
    }

    pub fn matcher(settings: MatchSettings, liftover: Arc<TableLiftover>) -> Matcher {
        Matcher {
            settings,
            oracle: Arc::new(ContigLengths::from_assemblies()),
            counts: Arc::new(
                TsvCountStore::new("tests/counts/counts.tsv", StoreScope::default()).unwrap(),
            ),
            liftover,
        }
    }

    fn params(
        assembly_id: &str,
        reference_name: &str,
        start: &str,
        alt: &str,
    ) -> HashMap<String, String> {
        let reference = if alt == "GA" { "G" } else { "A" };
        [
            ("assemblyId", assembly_id),
            ("referenceName", reference_name),
            ("start", start),
            ("referenceBases", reference),
            ("alternateBases", alt),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn result_counts(result: &MatchResult) -> Vec<(String, i64)> {
        result
            .response
            .result_sets
            .iter()
            .map(|rs| (rs.id.clone(), rs.results_count))
            .collect()
    }

    #[rstest::rstest]
    #[case::hits_on_both_releases(
        "GRCh37",
        "7",
        "140453136",
        "T",
        25,
        vec![("seqr Homozygous", 3), ("seqr Heterozygous", 22)],
        "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=37&variantId=7-140453136-A-T",
    )]
    #[case::hits_on_both_releases_from_grch38(
        "hg38",
        "7",
        "140753336",
        "T",
        25,
        vec![("seqr Homozygous", 3), ("seqr Heterozygous", 22)],
        "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=38&variantId=chr7-140753336-A-T",
    )]
    #[case::hit_only_on_lifted_release(
        "GRCh37",
        "chr1",
        "55516888",
        "GA",
        4,
        vec![("seqr Homozygous", 1), ("seqr Heterozygous", 3)],
        "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=38&variantId=chr1-55051215-G-GA",
    )]
    #[case::no_equivalent_locus(
        "GRCh38",
        "chr1",
        "55051215",
        "GA",
        4,
        vec![("seqr Homozygous", 1), ("seqr Heterozygous", 3)],
        "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=38&variantId=chr1-55051215-G-GA",
    )]
    #[case::no_hit(
        "GRCh37",
        "7",
        "140453136",
        "C",
        0,
        vec![],
        "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=37&variantId=7-140453136-A-C",
    )]
    #[actix_web::test]
    async fn run(
        #[case] assembly_id: &str,
        #[case] reference_name: &str,
        #[case] start: &str,
        #[case] alt: &str,
        #[case] total: i64,
        #[case] counts: Vec<(&str, i64)>,
        #[case] url: &str,
    ) -> Result<(), anyhow::Error> {
        let liftover = Arc::new(TableLiftover {
            table: liftover_table(),
            ..Default::default()
        });
        let matcher = matcher(settings(None), liftover.clone());

        let result = matcher
            .run(&params(assembly_id, reference_name, start, alt))
            .await?;

        assert_eq!(result.response_summary.total, total);
        assert_eq!(result.response_summary.exists, total > 0);
        assert_eq!(
            result_counts(&result),
            counts
                .into_iter()
                .map(|(id, count)| (id.to_string(), count))
                .collect::<Vec<_>>()
        );
        assert_eq!(result.beacon_handovers[0].url, url);
        assert_eq!(liftover.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[actix_web::test]
    async fn run_with_contact_email() -> Result<(), anyhow::Error> {
        let liftover = Arc::new(TableLiftover {
            table: liftover_table(),
            ..Default::default()
        });
        let matcher = matcher(settings(Some("vlm@example.org")), liftover);

        for (start, alt) in [("140453136", "T"), ("140453136", "C")] {
            let result = matcher.run(&params("GRCh37", "7", start, alt)).await?;
            assert_eq!(result.beacon_handovers[0].url, "mailto:vlm@example.org");
        }
        let result = matcher
            .run(&params("GRCh37", "1", "55516888", "GA"))
            .await?;
        assert_eq!(result.beacon_handovers[0].url, "mailto:vlm@example.org");
        Ok(())
    }

    #[actix_web::test]
    async fn run_is_idempotent() -> Result<(), anyhow::Error> {
        let liftover = Arc::new(TableLiftover {
            table: liftover_table(),
            ..Default::default()
        });
        let matcher = matcher(settings(None), liftover);
        let params = params("GRCh37", "7", "140453136", "T");

        let first = matcher.run(&params).await?;
        let second = matcher.run(&params).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[actix_web::test]
    async fn run_invalid_query_skips_backends() {
        let liftover = Arc::new(TableLiftover {
            table: liftover_table(),
            ..Default::default()
        });
        let matcher = matcher(settings(None), liftover.clone());

        let err = matcher.run(&HashMap::new()).await.unwrap_err();
        assert!(matches!(
            err,
            MatchError::Validation(ValidationError::MissingParameters(ref missing)) if missing.len() == 5
        ));
        let err = matcher
            .run(&params("GRCh37", "chr7", "999999999999", "T"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid start: 999999999999");
        assert_eq!(liftover.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    #[tracing_test::traced_test]
    async fn run_liftover_failure_counts_primary_only() -> Result<(), anyhow::Error> {
        let liftover = Arc::new(TableLiftover {
            fail: true,
            ..Default::default()
        });
        let matcher = matcher(settings(None), liftover.clone());

        let result = matcher
            .run(&params("GRCh37", "7", "140453136", "T"))
            .await?;

        assert_eq!(result.response_summary.total, 15);
        assert_eq!(
            result_counts(&result),
            vec![
                ("seqr Homozygous".to_string(), 3),
                ("seqr Heterozygous".to_string(), 12)
            ]
        );
        assert_eq!(
            result.beacon_handovers[0].url,
            "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=37&variantId=7-140453136-A-T"
        );
        assert_eq!(liftover.calls.load(Ordering::SeqCst), 1);
        assert!(logs_contain("liftover service unavailable"));
        Ok(())
    }

    #[actix_web::test]
    async fn run_count_store_failure_is_backend_error() {
        let liftover = Arc::new(TableLiftover {
            table: liftover_table(),
            ..Default::default()
        });
        let matcher = Matcher {
            counts: Arc::new(FailingCounts),
            ..matcher(settings(None), liftover)
        };

        let err = matcher
            .run(&params("GRCh37", "7", "140453136", "T"))
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::Backend(_)));
        assert_eq!(err.to_string(), "count store lookup failed");
    }

    #[rstest::rstest]
    #[case::primary_has_data(5, 0, false)]
    #[case::both_have_data(5, 7, false)]
    #[case::neither_has_data(0, 0, false)]
    #[case::only_lifted_has_data(0, 7, true)]
    fn handover_target_preference(
        #[case] primary: u64,
        #[case] secondary: u64,
        #[case] expect_lifted: bool,
    ) {
        let original = locus(GenomeRelease::Grch37, "7", 140453136);
        let lifted = locus(GenomeRelease::Grch38, "chr7", 140753336);
        let tally = |allele_count| CountTally {
            allele_count,
            hom_count: 0,
        };

        let target = handover_target(&original, tally(primary), Some((&lifted, tally(secondary))));
        assert_eq!(target == &lifted, expect_lifted);
        assert_eq!(handover_target(&original, tally(0), None), &original);
    }

    #[test]
    fn handover_url() -> Result<(), anyhow::Error> {
        let allele = Allele {
            reference: "A".into(),
            alternative: "T".into(),
        };
        let settings = MatchSettings {
            node_id: "seqr".into(),
            base_url: "https://seqr.example.org".into(),
            contact_email: None,
        };
        assert_eq!(
            settings.handover_url(&locus(GenomeRelease::Grch38, "chrX", 42), &allele)?,
            "https://seqr.example.org/summary_data/variant_lookup?genomeVersion=38&variantId=chrX-42-A-T"
        );
        let settings = MatchSettings {
            base_url: "not a url".into(),
            ..settings
        };
        assert!(settings
            .handover_url(&locus(GenomeRelease::Grch37, "X", 42), &allele)
            .is_err());
        Ok(())
    }
}
