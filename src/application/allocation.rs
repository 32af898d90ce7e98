use crate::domain::contribution::{Allocation, LineItem};
use crate::domain::money::Money;
use crate::domain::recipient::{AllocatorConfig, Recipient};
use crate::error::{ContributionError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Splits `amount` into a service fee plus per-recipient line items.
///
/// Pure function of its inputs: the same recipients, amount and seed always
/// produce the same allocation, so a preview binds exactly to the eventual
/// executed contribution. Varying only the seed can move only the leftover
/// cents of the proportional split.
pub fn allocate(
    config: &AllocatorConfig,
    recipients: &[Recipient],
    amount: Money,
    seed: u64,
) -> Result<Allocation> {
    if recipients.is_empty() {
        return Err(ContributionError::NoRecipients);
    }

    let fee = service_fee(config, amount)?;

    // Partition into weighted and overflow recipients, preserving the
    // catalog order within each group.
    let (weighted, overflow): (Vec<&Recipient>, Vec<&Recipient>) =
        recipients.iter().partition(|r| r.is_weighted());

    let mut line_items = apportion(config, &weighted, amount - fee, seed)?;

    // Whatever the weighted recipients could not absorb drains through the
    // overflow recipients in catalog order, each up to its effective limit.
    let allocated: Money = line_items.iter().map(|li| li.amount).sum();
    let mut remaining = amount - fee - allocated;
    let mut overflow = overflow.into_iter();
    while remaining > Money::ZERO {
        let recipient = overflow.next().ok_or(ContributionError::ExceedsMaximum)?;
        let share = remaining.min(config.effective_limit(recipient));
        line_items.push(LineItem {
            recipient: recipient.clone(),
            amount: share,
        });
        remaining -= share;
    }

    line_items.sort_by(|a, b| {
        (a.recipient.r#type.sort_rank(), &a.recipient.name)
            .cmp(&(b.recipient.r#type.sort_rank(), &b.recipient.name))
    });

    let allocation = Allocation {
        line_items,
        fee,
        total: amount,
    };
    // A mismatch here is a defect in the rounding logic, not a user error.
    assert_eq!(
        allocation.fee + allocation.recipient_total(),
        amount,
        "allocated line items do not sum back to the contribution amount"
    );
    Ok(allocation)
}

/// The service fee, worked backward from the charged total so that
/// `total = fees_fixed + fees_percent * distributed + distributed`.
fn service_fee(config: &AllocatorConfig, amount: Money) -> Result<Money> {
    let distributed = Money::half_even(
        (amount - config.fees_fixed).value() / (Decimal::ONE + config.fees_percent),
    );
    let fee = amount - distributed;
    if amount < fee {
        return Err(ContributionError::BelowMinimumFee);
    }
    Ok(fee)
}

/// Recursively apportions `amount` among weighted recipients in proportion to
/// their points, clamping anyone whose share exceeds their effective limit
/// and re-apportioning the excess among the rest.
fn apportion(
    config: &AllocatorConfig,
    recipients: &[&Recipient],
    amount: Money,
    seed: u64,
) -> Result<Vec<LineItem>> {
    if recipients.is_empty() {
        return Ok(Vec::new());
    }

    let total_points: Decimal = recipients.iter().filter_map(|r| r.points).sum();

    // "Fixed" recipients are clamped at their limit; "free" recipients keep
    // their floor-rounded proportional share.
    let mut fixed = Vec::new();
    let mut free = Vec::new();
    for recipient in recipients {
        let points = recipient.points.unwrap_or_default();
        let raw = Money::floor(amount.value() * points / total_points);
        if raw < Money::cent() {
            return Err(ContributionError::AmountTooSmall);
        }
        let limit = config.effective_limit(recipient);
        if raw > limit {
            fixed.push(LineItem {
                recipient: (*recipient).clone(),
                amount: limit,
            });
        } else {
            free.push(LineItem {
                recipient: (*recipient).clone(),
                amount: raw,
            });
        }
    }

    // Money clamped at one recipient's limit is redistributed, in proportion,
    // among the uncapped recipients, iterated until nobody is over limit.
    if !fixed.is_empty() {
        let remaining_recipients: Vec<&Recipient> = free.iter().map(|li| &li.recipient).collect();
        let fixed_total: Money = fixed.iter().map(|li| li.amount).sum();
        let mut result = fixed;
        result.extend(apportion(
            config,
            &remaining_recipients,
            amount - fixed_total,
            seed,
        )?);
        return Ok(result);
    }

    // Terminal case: floor rounding left up to N-1 cents undistributed. Deal
    // them one at a time to uniformly random under-limit recipients, seeded
    // so the outcome is reproducible.
    let allocated: Money = free.iter().map(|li| li.amount).sum();
    let mut leftover = amount - allocated;
    let mut rng = StdRng::seed_from_u64(seed);
    while leftover > Money::ZERO {
        let under_limit: Vec<usize> = free
            .iter()
            .enumerate()
            .filter(|(_, li)| li.amount < config.effective_limit(&li.recipient))
            .map(|(i, _)| i)
            .collect();
        if under_limit.is_empty() {
            // Every recipient is at its limit; the residue flows onward to
            // the overflow recipients rather than being dropped.
            break;
        }
        let pick = under_limit[rng.gen_range(0..under_limit.len())];
        free[pick].amount += Money::cent();
        leftover -= Money::cent();
    }

    Ok(free)
}

/// The smallest charged amount the allocation engine can still split without
/// producing a zero-value line item: the lowest-points recipient gets the
/// cent baseline, everyone else a proportional share, grossed up for fees,
/// floored at the configured global minimum.
pub fn minimum_contribution(config: &AllocatorConfig, recipients: &[Recipient]) -> Result<Money> {
    if recipients.is_empty() {
        return Err(ContributionError::NoRecipients);
    }

    let weighted: Vec<&Recipient> = recipients.iter().filter(|r| r.is_weighted()).collect();

    let minimum = match weighted.iter().filter_map(|r| r.points).min() {
        None => config.min_contrib,
        Some(min_points) => {
            let base: Decimal = weighted
                .iter()
                .map(|r| {
                    let points = r.points.unwrap_or_default();
                    Money::ceil(points / min_points * config.min_cent_baseline.value()).value()
                })
                .sum();
            let grossed = Money::ceil(
                base * (Decimal::ONE + config.fees_percent) + config.fees_fixed.value(),
            );
            grossed.max(config.min_contrib)
        }
    };

    // Self-check: the bound we hand out must actually be allocatable.
    let check = allocate(config, recipients, minimum, 0);
    assert!(
        check.is_ok(),
        "minimum contribution {minimum} is not allocatable: {:?}",
        check.err()
    );
    Ok(minimum)
}

/// The largest charged amount: the sum of every recipient's effective limit,
/// grossed up for fees, capped at the configured global maximum.
pub fn maximum_contribution(config: &AllocatorConfig, recipients: &[Recipient]) -> Result<Money> {
    if recipients.is_empty() {
        return Err(ContributionError::NoRecipients);
    }

    let limit_sum: Decimal = recipients
        .iter()
        .map(|r| config.effective_limit(r).value())
        .sum();
    let grossed =
        Money::floor(limit_sum * (Decimal::ONE + config.fees_percent) + config.fees_fixed.value());
    let maximum = grossed.min(config.max_contrib);

    let check = allocate(config, recipients, maximum, 0);
    assert!(
        check.is_ok(),
        "maximum contribution {maximum} is not allocatable: {:?}",
        check.err()
    );
    Ok(maximum)
}

/// Cosmetically widened limits for display. Never use these for validation.
pub fn limits_for_display(min: Money, max: Money) -> (Money, Money) {
    let mut display_min = min;
    let mut display_max = max;

    // Round the minimum up to the next power of ten, if that stays well
    // below the maximum.
    let mut power = Decimal::ONE;
    while power <= min.value() {
        power *= Decimal::TEN;
    }
    if power < max.value() / Decimal::from(50) {
        display_min = Money::new(power);
    }

    // Round the maximum down to the nearest multiple of 100, if that stays
    // well above the minimum.
    let hundreds = (max.value() / Decimal::ONE_HUNDRED).floor() * Decimal::ONE_HUNDRED;
    if hundreds > display_min.value() * Decimal::from(50) {
        display_max = Money::new(hundreds);
    }

    (display_min, display_max)
}
