/// Remaining inventory for an event, derived from its configured limit and
/// the sum of confirmed booking quantities. Capacity is never a counter on
/// the event row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Unlimited,
    Remaining(i64),
}

/// Derive remaining capacity. A missing limit means unlimited; a limit of
/// zero means booking is closed regardless of existing bookings.
pub fn remaining_capacity(limit: Option<i64>, confirmed_sum: i64) -> Capacity {
    match limit {
        None => Capacity::Unlimited,
        Some(0) => Capacity::Remaining(0),
        Some(n) => Capacity::Remaining(n - confirmed_sum),
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("booking is currently unavailable")]
    Closed,

    #[error("only {remaining} remaining")]
    Insufficient { remaining: i64 },
}

/// Decide whether `requested` units can be booked against the limit.
/// Distinguishes a closed event (limit 0) from a partially sold one so the
/// caller can surface the exact remaining count.
pub fn check_request(
    limit: Option<i64>,
    confirmed_sum: i64,
    requested: i64,
) -> Result<(), AvailabilityError> {
    match remaining_capacity(limit, confirmed_sum) {
        Capacity::Unlimited => Ok(()),
        Capacity::Remaining(_) if limit == Some(0) => Err(AvailabilityError::Closed),
        Capacity::Remaining(remaining) => {
            if requested > remaining {
                Err(AvailabilityError::Insufficient {
                    remaining: remaining.max(0),
                })
            } else {
                Ok(())
            }
        }
    }
}
