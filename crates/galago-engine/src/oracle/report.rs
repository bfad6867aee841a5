//! Verifier report classification.
//!
//! The external verifier's captured stdout is classified against a fixed
//! marker grammar, checked in order: syntax rejection first, then the three
//! obligation failure codes with their witness blocks, then the all-clear
//! line. A report carrying both a failure code and the all-clear line
//! classifies as a failure.

use thiserror::Error;

use galago_ice::ObligationKind;

/// The verifier could not parse a rendered obligation program.
const SYNTAX_REJECTED_MARKER: &str = "parse errors";

/// Summary line of a fully verified run.
const ALL_CLEAR_MARKER: &str = "0 error";

/// Failure codes in obligation order, paired with the obligation they
/// refute.
const FAILURE_CODES: [(&str, ObligationKind); 3] = [
    ("BP5004", ObligationKind::Pre),
    ("BP5005", ObligationKind::Inductive),
    ("BP5001", ObligationKind::Post),
];

/// Longest excerpt kept from an unclassifiable report.
const EXCERPT_LEN: usize = 120;

/// Classification of a verifier report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportVerdict {
    /// The verifier discharged every obligation.
    AllClear,
    /// One obligation failed; `witness` is its raw witness block.
    ObligationFailed {
        kind: ObligationKind,
        witness: String,
    },
}

/// Reports that fit no verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The rendered candidate broke the obligation program's syntax.
    #[error("verifier rejected the obligation program with parse errors")]
    SyntaxRejected,
    /// Output matched no known marker.
    #[error("unrecognized verifier report: {excerpt}")]
    Unrecognized { excerpt: String },
}

/// Classify a captured verifier report.
pub fn parse_report(report: &str) -> Result<ReportVerdict, ReportError> {
    if report.contains(SYNTAX_REJECTED_MARKER) {
        return Err(ReportError::SyntaxRejected);
    }
    for (code, kind) in FAILURE_CODES {
        if !report.contains(code) {
            continue;
        }
        if let Some(witness) = witness_block(report, kind.marker()) {
            return Ok(ReportVerdict::ObligationFailed { kind, witness });
        }
    }
    if report.contains(ALL_CLEAR_MARKER) {
        return Ok(ReportVerdict::AllClear);
    }
    Err(ReportError::Unrecognized {
        excerpt: excerpt(report),
    })
}

/// The witness text runs from the obligation marker to the first `}` at or
/// after it.
fn witness_block(report: &str, marker: &str) -> Option<String> {
    let start = report.find(marker)?;
    let end = report[start..].find('}')?;
    Some(report[start..start + end + 1].to_string())
}

fn excerpt(report: &str) -> String {
    let trimmed = report.trim();
    if trimmed.len() <= EXCERPT_LEN {
        return trimmed.to_string();
    }
    let mut end = EXCERPT_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
