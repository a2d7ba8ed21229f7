//! Common functionality.

use biocommons_bioutils::assemblies::Assembly;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Return the version of the `vlm-beacon-gateway` crate and `x.y.z` in tests.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// How contig names are spelled on a genome release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContigNaming {
    /// Bare names, e.g., `7`, `X`, `MT`.
    Plain,
    /// UCSC-style names with a leading `chr`, e.g., `chr7`.
    ChrPrefixed,
}

/// The genome releases supported by the gateway.
#[derive(
    Clone,
    Copy,
    Debug,
    strum_macros::Display,
    strum_macros::EnumIter,
    PartialEq,
    Eq,
    enum_map::Enum,
    Hash,
)]
pub enum GenomeRelease {
    /// GRCh37 / hg19
    #[strum(serialize = "grch37")]
    Grch37,
    /// GRCh38 / hg38
    #[strum(serialize = "grch38")]
    Grch38,
}

impl GenomeRelease {
    /// The canonical name, e.g., `GRCh37`.
    pub fn name(&self) -> &'static str {
        match self {
            GenomeRelease::Grch37 => "GRCh37",
            GenomeRelease::Grch38 => "GRCh38",
        }
    }

    /// The informal (UCSC) alias, e.g., `hg19`.
    pub fn informal_alias(&self) -> &'static str {
        match self {
            GenomeRelease::Grch37 => "hg19",
            GenomeRelease::Grch38 => "hg38",
        }
    }

    /// The release number without the `GRCh` prefix, e.g., `37`.
    pub fn version(&self) -> &'static str {
        self.name().trim_start_matches("GRCh")
    }

    /// The other supported genome release.
    pub fn other(&self) -> Self {
        match self {
            GenomeRelease::Grch37 => GenomeRelease::Grch38,
            GenomeRelease::Grch38 => GenomeRelease::Grch37,
        }
    }

    /// The contig naming rule of this release.
    pub fn contig_naming(&self) -> ContigNaming {
        match self {
            GenomeRelease::Grch37 => ContigNaming::Plain,
            GenomeRelease::Grch38 => ContigNaming::ChrPrefixed,
        }
    }

    /// Resolve a client-facing assembly alias.
    ///
    /// The canonical names must match exactly, the informal aliases are compared
    /// case-insensitively.
    pub fn from_alias(alias: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        GenomeRelease::iter().find(|release| {
            alias == release.name() || alias.eq_ignore_ascii_case(release.informal_alias())
        })
    }

    /// Normalize a contig name to the naming rule of this release.
    ///
    /// Any `chr` prefix is stripped and then re-added if the release requires it.
    pub fn normalize_contig(&self, raw: &str) -> String {
        let bare = strip_chr(raw);
        match self.contig_naming() {
            ContigNaming::Plain => bare.to_string(),
            ContigNaming::ChrPrefixed => format!("chr{}", bare),
        }
    }
}

impl From<GenomeRelease> for Assembly {
    fn from(val: GenomeRelease) -> Self {
        match val {
            GenomeRelease::Grch37 => Assembly::Grch37p10,
            GenomeRelease::Grch38 => Assembly::Grch38,
        }
    }
}

impl std::str::FromStr for GenomeRelease {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("grch37") || lower == "hg19" {
            Ok(GenomeRelease::Grch37)
        } else if lower.starts_with("grch38") || lower == "hg38" {
            Ok(GenomeRelease::Grch38)
        } else {
            Err(anyhow::anyhow!("Unknown genome release: {}", s))
        }
    }
}

/// Strip a leading `chr` from a contig name.
pub fn strip_chr(contig: &str) -> &str {
    contig.strip_prefix("chr").unwrap_or(contig)
}

/// Spawn an in-process HTTP server on an ephemeral port and return its base URL.
///
/// Must be called from within an actix runtime, e.g., `#[actix_web::test]`.
#[cfg(test)]
pub(crate) fn spawn_stub_server<F>(
    configure: F,
) -> Result<(String, actix_web::dev::ServerHandle), anyhow::Error>
where
    F: Fn(&mut actix_web::web::ServiceConfig) + Send + Clone + 'static,
{
    let server =
        actix_web::HttpServer::new(move || actix_web::App::new().configure(configure.clone()))
            .workers(1)
            .bind(("127.0.0.1", 0))?;
    let addr = server
        .addrs()
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("stub server is not bound"))?;
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Ok((format!("http://{}", addr), handle))
}

#[cfg(test)]
mod test {
    use super::{ContigNaming, GenomeRelease};

    #[rstest::rstest]
    #[case("GRCh37", Some(GenomeRelease::Grch37))]
    #[case("hg19", Some(GenomeRelease::Grch37))]
    #[case("HG19", Some(GenomeRelease::Grch37))]
    #[case("Hg19", Some(GenomeRelease::Grch37))]
    #[case("GRCh38", Some(GenomeRelease::Grch38))]
    #[case("hg38", Some(GenomeRelease::Grch38))]
    #[case("HG38", Some(GenomeRelease::Grch38))]
    #[case("grch38", None)]
    #[case("GRCh39", None)]
    #[case("", None)]
    fn from_alias(#[case] alias: &str, #[case] expected: Option<GenomeRelease>) {
        assert_eq!(GenomeRelease::from_alias(alias), expected);
    }

    #[rstest::rstest]
    #[case(GenomeRelease::Grch37, "7", "7")]
    #[case(GenomeRelease::Grch37, "chr7", "7")]
    #[case(GenomeRelease::Grch38, "7", "chr7")]
    #[case(GenomeRelease::Grch38, "chr7", "chr7")]
    #[case(GenomeRelease::Grch38, "X", "chrX")]
    #[case(GenomeRelease::Grch37, "chrMT", "MT")]
    fn normalize_contig(
        #[case] release: GenomeRelease,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(release.normalize_contig(raw), expected);
    }

    #[rstest::rstest]
    #[case(GenomeRelease::Grch37, "GRCh37", "37", GenomeRelease::Grch38, ContigNaming::Plain)]
    #[case(
        GenomeRelease::Grch38,
        "GRCh38",
        "38",
        GenomeRelease::Grch37,
        ContigNaming::ChrPrefixed
    )]
    fn release_properties(
        #[case] release: GenomeRelease,
        #[case] name: &str,
        #[case] version: &str,
        #[case] other: GenomeRelease,
        #[case] naming: ContigNaming,
    ) {
        assert_eq!(release.name(), name);
        assert_eq!(release.version(), version);
        assert_eq!(release.other(), other);
        assert_eq!(release.contig_naming(), naming);
    }

    #[rstest::rstest]
    #[case("grch37", GenomeRelease::Grch37)]
    #[case("GRCh37.p10", GenomeRelease::Grch37)]
    #[case("grch38", GenomeRelease::Grch38)]
    #[case("hg38", GenomeRelease::Grch38)]
    fn genome_release_from_str(#[case] s: &str, #[case] expected: GenomeRelease) {
        assert_eq!(s.parse::<GenomeRelease>().unwrap(), expected);
    }

    #[test]
    fn genome_release_display() {
        assert_eq!(format!("{}", GenomeRelease::Grch37), "grch37");
        assert_eq!(format!("{}", GenomeRelease::Grch38), "grch38");
    }
}
