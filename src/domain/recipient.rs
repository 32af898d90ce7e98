use crate::domain::money::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The legal category of a recipient, which determines its statutory
/// contribution limit and its display rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Candidate,
    Pac,
    C4,
}

impl RecipientType {
    /// Fixed display rank: candidates first, then PACs, then C4s. The fee
    /// line sorts after all of these.
    pub fn sort_rank(&self) -> u8 {
        match self {
            RecipientType::Candidate => 0,
            RecipientType::Pac => 1,
            RecipientType::C4 => 2,
        }
    }
}

/// A contribution recipient, immutable for the duration of one allocation.
///
/// Recipients with `points` are weighted and receive a proportional share of
/// the contribution. Recipients without `points` are overflow recipients and
/// only receive money once the weighted recipients are exhausted or capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub r#type: RecipientType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Decimal>,
    /// Optional per-recipient override; the effective limit is the lesser of
    /// this and the statutory limit for the recipient's type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Money>,
}

impl Recipient {
    pub fn is_weighted(&self) -> bool {
        self.points.is_some()
    }
}

/// Per-period statutory ceilings by recipient type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatutoryLimits {
    pub candidate: Money,
    pub pac: Money,
    pub c4: Money,
}

impl StatutoryLimits {
    pub fn limit_for(&self, r#type: RecipientType) -> Money {
        match r#type {
            RecipientType::Candidate => self.candidate,
            RecipientType::Pac => self.pac,
            RecipientType::C4 => self.c4,
        }
    }
}

/// Tunable constants for the allocation algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Global floor for the minimum contribution, in charged dollars.
    pub min_contrib: Money,
    /// Global ceiling for the maximum contribution, in charged dollars.
    pub max_contrib: Money,
    pub limits: StatutoryLimits,
    /// Fixed portion of the service fee.
    pub fees_fixed: Money,
    /// Percentage portion of the service fee, as a fraction (0.029 = 2.9%).
    pub fees_percent: Decimal,
    /// Baseline share for the lowest-points recipient when computing the
    /// minimum contribution.
    pub min_cent_baseline: Money,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_contrib: Money::new(dec!(1.00)),
            max_contrib: Money::new(dec!(250000.00)),
            limits: StatutoryLimits {
                candidate: Money::new(dec!(2700)), // per election
                pac: Money::new(dec!(5000)),       // per year
                c4: Money::new(dec!(100000)),
            },
            fees_fixed: Money::new(dec!(0.30)),
            fees_percent: dec!(0.029),
            min_cent_baseline: Money::new(dec!(0.01)),
        }
    }
}

impl AllocatorConfig {
    /// A fee-free configuration, useful when the processor charges fees out
    /// of band.
    pub fn without_fees() -> Self {
        Self {
            fees_fixed: Money::ZERO,
            fees_percent: Decimal::ZERO,
            ..Self::default()
        }
    }

    /// The lesser of the statutory limit for the recipient's type and its
    /// per-recipient override, if any.
    pub fn effective_limit(&self, recipient: &Recipient) -> Money {
        let statutory = self.limits.limit_for(recipient.r#type);
        match recipient.limit {
            Some(override_limit) => statutory.min(override_limit),
            None => statutory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(id: &str, r#type: RecipientType, limit: Option<Money>) -> Recipient {
        Recipient {
            id: id.to_string(),
            r#type,
            name: id.to_string(),
            points: None,
            limit,
        }
    }

    #[test]
    fn test_effective_limit_without_override() {
        let config = AllocatorConfig::default();
        let r = recipient("A", RecipientType::Candidate, None);
        assert_eq!(config.effective_limit(&r), Money::new(dec!(2700)));
    }

    #[test]
    fn test_effective_limit_takes_lower_override() {
        let config = AllocatorConfig::default();
        let r = recipient("A", RecipientType::Pac, Some(Money::new(dec!(100))));
        assert_eq!(config.effective_limit(&r), Money::new(dec!(100)));
    }

    #[test]
    fn test_effective_limit_ignores_higher_override() {
        let config = AllocatorConfig::default();
        let r = recipient("A", RecipientType::Candidate, Some(Money::new(dec!(9999))));
        assert_eq!(config.effective_limit(&r), Money::new(dec!(2700)));
    }

    #[test]
    fn test_type_sort_rank_order() {
        assert!(RecipientType::Candidate.sort_rank() < RecipientType::Pac.sort_rank());
        assert!(RecipientType::Pac.sort_rank() < RecipientType::C4.sort_rank());
    }

    #[test]
    fn test_recipient_catalog_deserialization() {
        let json = r#"{"id": "de-101", "type": "candidate", "name": "A", "points": 2}"#;
        let r: Recipient = serde_json::from_str(json).unwrap();
        assert_eq!(r.r#type, RecipientType::Candidate);
        assert_eq!(r.points, Some(dec!(2)));
        assert!(r.limit.is_none());
        assert!(r.is_weighted());
    }
}
