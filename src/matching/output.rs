//! Formatting of the beacon response.

use super::schema::{
    CountTally, Handover, HandoverType, MatchResult, Meta, ResponseSummary, ResultSet,
    ResultSets, ReturnedSchema,
};

/// Version of the beacon API spoken.
pub const API_VERSION: &str = "v1.0";
/// Identifier of the beacon.
pub const BEACON_ID: &str = "com.gnx.beacon.v2";
/// Entity type of the returned schema.
pub const ENTITY_TYPE: &str = "genomicVariant";
/// Schema of the returned entities.
pub const SCHEMA: &str = "ga4gh-beacon-variant-v2.0.0";

/// Build the response for the combined `tally`, pointing the caller to `url`.
pub fn format_result(node_id: &str, tally: CountTally, url: &str) -> MatchResult {
    let allele_count = tally.allele_count as i64;
    let hom_count = tally.hom_count as i64;
    let total = allele_count - hom_count;
    let exists = tally.allele_count > 0;

    let result_set = |label: &str, count: i64| ResultSet {
        exists: true,
        id: format!("{} {}", node_id, label),
        results: Vec::new(),
        results_count: count,
        set_type: ENTITY_TYPE.to_string(),
    };
    let result_sets = if exists {
        vec![
            result_set("Homozygous", hom_count),
            result_set("Heterozygous", total - hom_count),
        ]
    } else {
        Vec::new()
    };

    MatchResult {
        beacon_handovers: vec![Handover {
            handover_type: HandoverType {
                id: node_id.to_string(),
                label: format!("{} browser", node_id),
            },
            url: url.to_string(),
        }],
        meta: Meta {
            api_version: API_VERSION.to_string(),
            beacon_id: BEACON_ID.to_string(),
            returned_schemas: vec![ReturnedSchema {
                entity_type: ENTITY_TYPE.to_string(),
                schema: SCHEMA.to_string(),
            }],
        },
        response_summary: ResponseSummary { exists, total },
        response: ResultSets { result_sets },
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn combined_counts() -> Result<(), anyhow::Error> {
        let mut tally = CountTally {
            allele_count: 18,
            hom_count: 3,
        };
        tally.aggregate(CountTally {
            allele_count: 10,
            hom_count: 0,
        });
        let result = format_result("seqr", tally, "https://seqr.example.org/x");

        assert_eq!(
            serde_json::to_value(&result)?,
            json!({
                "beaconHandovers": [{
                    "handoverType": {"id": "seqr", "label": "seqr browser"},
                    "url": "https://seqr.example.org/x"
                }],
                "meta": {
                    "apiVersion": "v1.0",
                    "beaconId": "com.gnx.beacon.v2",
                    "returnedSchemas": [{
                        "entityType": "genomicVariant",
                        "schema": "ga4gh-beacon-variant-v2.0.0"
                    }]
                },
                "responseSummary": {"exists": true, "total": 25},
                "response": {
                    "resultSets": [
                        {
                            "exists": true,
                            "id": "seqr Homozygous",
                            "results": [],
                            "resultsCount": 3,
                            "setType": "genomicVariant"
                        },
                        {
                            "exists": true,
                            "id": "seqr Heterozygous",
                            "results": [],
                            "resultsCount": 22,
                            "setType": "genomicVariant"
                        }
                    ]
                }
            })
        );
        Ok(())
    }

    #[test]
    fn zero_counts() {
        let result = format_result("seqr", CountTally::default(), "mailto:vlm@example.org");
        assert_eq!(
            result.response_summary,
            ResponseSummary {
                exists: false,
                total: 0
            }
        );
        assert!(result.response.result_sets.is_empty());
        assert_eq!(result.beacon_handovers[0].url, "mailto:vlm@example.org");
    }

    #[test]
    fn homozygous_entry_emitted_without_homozygotes() {
        let result = format_result(
            "node",
            CountTally {
                allele_count: 2,
                hom_count: 0,
            },
            "",
        );
        let counts = result
            .response
            .result_sets
            .iter()
            .map(|rs| (rs.id.as_str(), rs.results_count))
            .collect::<Vec<_>>();
        assert_eq!(
            counts,
            vec![("node Homozygous", 0), ("node Heterozygous", 2)]
        );
    }
}
