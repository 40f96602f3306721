//! Human-readable and JSON rendering of a validation report

use crate::cross_validate::{Finding, ValidationReport};
use crate::types::Address;
use serde_json::Value;

/// One report line; failures go to stderr
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub passed: bool,
    pub text: String,
}

impl ReportLine {
    fn pass(text: String) -> Self {
        Self {
            passed: true,
            text: format!("✓ {}", text),
        }
    }

    fn fail(text: String) -> Self {
        Self {
            passed: false,
            text: format!("❌ {}", text),
        }
    }
}

pub fn format_finding(finding: &Finding) -> String {
    match finding {
        Finding::CountMismatch { published, expected } => {
            format!("Incorrect number of errors: {}. Should be {}.", published, expected)
        }
        Finding::UnknownCorrection { address, amount } => {
            format!("Unknown error in hotfix. {} = {}", address, amount)
        }
        Finding::AmountMismatch {
            address,
            amount,
            expected,
        } => format!(
            "Invalid error amount found. {} = {}, should be {}",
            address, amount, expected
        ),
        Finding::MissingCorrection { address, difference } => {
            format!("Error not found in hotfix. {} = {}", address, difference)
        }
    }
}

/// Count check, findings in discovery order, then the verdict
pub fn render(report: &ValidationReport, hotfix: &Address) -> Vec<ReportLine> {
    let mut lines = Vec::with_capacity(report.findings.len() + 2);

    if report.count_matches() {
        lines.push(ReportLine::pass(format!(
            "Correct number of errors: {}",
            report.published_count
        )));
    }

    lines.extend(report.findings.iter().map(|f| ReportLine::fail(format_finding(f))));

    if report.is_verified() {
        lines.push(ReportLine::pass(format!("Hotfix at {} is correct", hotfix)));
    } else {
        lines.push(ReportLine::fail(format!("Hotfix at {} is incorrect", hotfix)));
    }

    lines
}

pub fn print(report: &ValidationReport, hotfix: &Address) {
    for line in render(report, hotfix) {
        if line.passed {
            println!("{}", line.text);
        } else {
            eprintln!("{}", line.text);
        }
    }
}

/// Machine-readable summary
pub fn json_summary(report: &ValidationReport, hotfix: &Address) -> Value {
    serde_json::json!({
        "hotfix": hotfix,
        "verified": report.is_verified(),
        "published_count": report.published_count,
        "computed_count": report.discrepancies.len(),
        "discrepancies": report.discrepancies,
        "findings": report.findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Discrepancy;
    use num_bigint::BigInt;

    fn hotfix() -> Address {
        Address([0x52; 20])
    }

    #[test]
    fn test_render_verified() {
        let mut d = Discrepancy::new(Address([0x0c; 20]), BigInt::from(50));
        d.verified = true;
        let report = ValidationReport {
            published_count: 1,
            discrepancies: vec![d],
            findings: vec![],
        };
        let lines = render(&report, &hotfix());
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.passed));
        assert_eq!(lines[0].text, "✓ Correct number of errors: 1");
        assert!(lines[1].text.ends_with("is correct"));
    }

    #[test]
    fn test_render_findings() {
        let x = Address([0x0a; 20]);
        let report = ValidationReport {
            published_count: 1,
            discrepancies: vec![],
            findings: vec![
                Finding::CountMismatch {
                    published: 1,
                    expected: 0,
                },
                Finding::UnknownCorrection {
                    address: x,
                    amount: BigInt::from(10),
                },
            ],
        };
        let lines = render(&report, &hotfix());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts[0], "❌ Incorrect number of errors: 1. Should be 0.");
        assert_eq!(texts[1], format!("❌ Unknown error in hotfix. {} = 10", x));
        assert!(texts[2].ends_with("is incorrect"));
        assert!(lines.iter().all(|l| !l.passed));
    }

    #[test]
    fn test_json_summary() {
        let report = ValidationReport {
            published_count: 0,
            discrepancies: vec![Discrepancy::new(Address([0x0d; 20]), BigInt::from(-20))],
            findings: vec![Finding::MissingCorrection {
                address: Address([0x0d; 20]),
                difference: BigInt::from(-20),
            }],
        };
        let json = json_summary(&report, &hotfix());
        assert_eq!(json["verified"], false);
        assert_eq!(json["computed_count"], 1);
        assert_eq!(json["findings"][0]["kind"], "missing_correction");
        assert_eq!(json["discrepancies"][0]["difference"], "-20");
    }
}
