use crate::domain::contribution::Contribution;
use crate::domain::money::Money;
use crate::domain::ports::{ContributionStoreBox, DonationRecord, TransactionStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// One reported difference between the processor's ledger and the local
/// contribution records. Never fatal; the batch always continues.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub donation_id: Option<String>,
    pub contribution_id: Option<u64>,
    pub message: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.donation_id, &self.contribution_id) {
            (Some(d), Some(c)) => write!(f, "donation {d} / contribution {c}: {}", self.message),
            (Some(d), None) => write!(f, "donation {d}: {}", self.message),
            (None, Some(c)) => write!(f, "contribution {c}: {}", self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

/// Batch comparator between the processor's donation ledger and the local
/// contribution store. Read-only on both sides.
pub struct Reconciler {
    contributions: ContributionStoreBox,
}

impl Reconciler {
    pub fn new(contributions: ContributionStoreBox) -> Self {
        Self { contributions }
    }

    /// Checks every remote donation against the local records and reports
    /// each discrepancy individually.
    ///
    /// Contributions created after the remote snapshot are tolerated: only
    /// local ids greater than the smallest matched remote id are expected to
    /// appear in the snapshot.
    pub async fn reconcile(&self, donations: &[DonationRecord]) -> Result<Vec<Discrepancy>> {
        let mut report = Report::default();

        for donation in donations {
            self.check_donation(donation, &mut report).await?;
        }

        // Anything the processor has no record of?
        if let Some(&first_seen) = report.seen.iter().min() {
            for contribution in self.contributions.all().await? {
                if contribution.id > first_seen && !report.seen.contains(&contribution.id) {
                    report.push(
                        None,
                        Some(contribution.id),
                        "has no donation record on the processor".to_string(),
                    );
                }
            }
        }

        Ok(report.discrepancies)
    }

    async fn check_donation(&self, donation: &DonationRecord, report: &mut Report) -> Result<()> {
        if donation.authtest_request {
            // Authorization tests have no local counterpart.
            return Ok(());
        }

        let donation_id = Some(donation.donation_id.clone());

        if !donation.authcapture_request {
            report.push(
                donation_id,
                None,
                "has authtest_request, authcapture_request both false".to_string(),
            );
            return Ok(());
        }

        if donation.line_items.is_empty() {
            report.push(donation_id, None, "has no line items".to_string());
            return Ok(());
        }

        let guids: HashSet<&str> = donation
            .line_items
            .iter()
            .map(|li| li.transaction_guid.as_str())
            .collect();
        if guids.len() != 1 {
            report.push(
                donation_id,
                None,
                "has more than one transaction (should be one)".to_string(),
            );
            return Ok(());
        }

        let contribution_id = match tracking_id(donation) {
            Some(id) => id,
            None => {
                report.push(donation_id, None, "has invalid aux_data".to_string());
                return Ok(());
            }
        };

        let contribution = match self.contributions.get(contribution_id).await? {
            Some(c) => c,
            None => {
                report.push(donation_id, None, "has invalid contribution id".to_string());
                return Ok(());
            }
        };
        report.seen.insert(contribution_id);

        self.check_donor_fields(donation, &contribution, report);
        self.check_line_items(donation, &contribution, report);
        self.check_status(donation, &contribution, report);
        Ok(())
    }

    /// Field-by-field donor identity comparison; every mismatch is reported
    /// individually, no short-circuiting.
    fn check_donor_fields(
        &self,
        donation: &DonationRecord,
        contribution: &Contribution,
        report: &mut Report,
    ) {
        let local = &contribution.contributor;
        let fields: [(&str, &Option<String>, &String); 8] = [
            ("donor_first_name", &donation.donor_first_name, &local.name_first),
            ("donor_last_name", &donation.donor_last_name, &local.name_last),
            ("donor_address1", &donation.donor_address1, &local.address),
            ("donor_city", &donation.donor_city, &local.city),
            ("donor_state", &donation.donor_state, &local.state),
            ("donor_zip", &donation.donor_zip, &local.zip),
            (
                "compliance_employer",
                &donation.compliance_employer,
                &local.employer,
            ),
            (
                "compliance_occupation",
                &donation.compliance_occupation,
                &local.occupation,
            ),
        ];
        for (name, remote, local_value) in fields {
            if remote.as_deref() != Some(local_value.as_str()) {
                report.push(
                    Some(donation.donation_id.clone()),
                    Some(contribution.id),
                    format!(
                        "has a mismatch in {name} ({:?}, {:?})",
                        remote.as_deref(),
                        local_value
                    ),
                );
            }
        }
    }

    /// Per-recipient amount comparison. Remote amounts arrive as strings and
    /// are parsed as exact decimals quantized to cents.
    fn check_line_items(
        &self,
        donation: &DonationRecord,
        contribution: &Contribution,
        report: &mut Report,
    ) {
        let mut local_amounts: HashMap<&str, Money> = contribution
            .line_items
            .iter()
            .map(|li| (li.recipient.id.as_str(), li.amount))
            .collect();

        for line_item in &donation.line_items {
            let actual = match parse_amount(&line_item.amount) {
                Some(amount) => amount,
                None => {
                    report.push(
                        Some(donation.donation_id.clone()),
                        Some(contribution.id),
                        format!(
                            "has a malformed line item amount {:?} for {}",
                            line_item.amount, line_item.recipient_name
                        ),
                    );
                    continue;
                }
            };
            let expected = local_amounts
                .remove(line_item.recipient_id.as_str())
                .unwrap_or(Money::ZERO);
            if actual != expected {
                report.push(
                    Some(donation.donation_id.clone()),
                    Some(contribution.id),
                    format!(
                        "has recipient mismatch {} got {} instead of {}",
                        line_item.recipient_name, actual, expected
                    ),
                );
            }
        }

        // Local recipient amounts with no corresponding remote line item.
        for (recipient_id, expected) in local_amounts {
            report.push(
                Some(donation.donation_id.clone()),
                Some(contribution.id),
                format!("has orphaned recipient {recipient_id} with local amount {expected}"),
            );
        }
    }

    /// Remote transaction status versus local void state.
    fn check_status(
        &self,
        donation: &DonationRecord,
        contribution: &Contribution,
        report: &mut Report,
    ) {
        // All line items share one transaction id by this point.
        let status = donation.line_items[0].transaction_status;
        let voided = contribution.is_voided();
        let message = match status {
            TransactionStatus::Captured if voided => {
                Some("is captured on the processor but voided locally".to_string())
            }
            TransactionStatus::Captured => None,
            TransactionStatus::Voided | TransactionStatus::Credited if !voided => {
                Some("is reversed on the processor but not voided locally".to_string())
            }
            TransactionStatus::Voided | TransactionStatus::Credited => None,
            TransactionStatus::Authorized | TransactionStatus::Unknown => {
                Some("has an unexpected transaction status".to_string())
            }
        };
        if let Some(message) = message {
            report.push(
                Some(donation.donation_id.clone()),
                Some(contribution.id),
                message,
            );
        }
    }
}

#[derive(Default)]
struct Report {
    discrepancies: Vec<Discrepancy>,
    /// Contribution ids matched to a remote donation.
    seen: HashSet<u64>,
}

impl Report {
    fn push(&mut self, donation_id: Option<String>, contribution_id: Option<u64>, message: String) {
        let discrepancy = Discrepancy {
            donation_id,
            contribution_id,
            message,
        };
        tracing::warn!(discrepancy = %discrepancy, "reconciliation discrepancy");
        self.discrepancies.push(discrepancy);
    }
}

/// The embedded tracking identifier linking a remote donation back to a
/// local contribution. The processor echoes it as either a string or a
/// number.
fn tracking_id(donation: &DonationRecord) -> Option<u64> {
    let tracked = donation.aux_data.as_object()?.get("contribution")?;
    match tracked {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Parses a remote amount string (a leading `$` is tolerated) as an exact
/// decimal, quantized to cents; conversion from floats upstream is inexact.
fn parse_amount(raw: &str) -> Option<Money> {
    let cleaned = raw.trim().trim_start_matches('$');
    Decimal::from_str(cleaned).ok().map(Money::half_even)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount_tolerates_dollar_sign() {
        assert_eq!(parse_amount("$12.34"), Some(Money::new(dec!(12.34))));
        assert_eq!(parse_amount(" 5 "), Some(Money::new(dec!(5.00))));
        assert_eq!(parse_amount("12.345"), Some(Money::new(dec!(12.34))));
        assert_eq!(parse_amount("twelve"), None);
    }

    #[test]
    fn test_tracking_id_accepts_string_or_number() {
        let mut donation = DonationRecord {
            donation_id: "d1".to_string(),
            authtest_request: false,
            authcapture_request: true,
            line_items: vec![],
            aux_data: serde_json::json!({ "contribution": 7 }),
            donor_first_name: None,
            donor_last_name: None,
            donor_address1: None,
            donor_city: None,
            donor_state: None,
            donor_zip: None,
            compliance_employer: None,
            compliance_occupation: None,
        };
        assert_eq!(tracking_id(&donation), Some(7));

        donation.aux_data = serde_json::json!({ "contribution": "7" });
        assert_eq!(tracking_id(&donation), Some(7));

        donation.aux_data = serde_json::json!(["contribution"]);
        assert_eq!(tracking_id(&donation), None);
    }
}
