//! Capacity decision rule

/// Outcome of checking a party against remaining slot capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityDecision {
    /// The party fits; the booking confirms immediately
    Fits,
    /// The party would exceed capacity; the booking needs admin approval
    Overbooking,
}

/// The single decision rule shared by submission, reschedule and
/// book-from-waitlist: a party overbooks when it would push the counter
/// past capacity. Exactly at capacity still fits.
pub fn assess_capacity(booked_count: u32, capacity: u32, requested: u32) -> CapacityDecision {
    if booked_count + requested > capacity {
        CapacityDecision::Overbooking
    } else {
        CapacityDecision::Fits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_that_fills_slot_exactly_fits() {
        // capacity 10, 8 booked, 2 requested -> confirmed
        assert_eq!(assess_capacity(8, 10, 2), CapacityDecision::Fits);
    }

    #[test]
    fn test_party_past_capacity_is_overbooking() {
        // capacity 10, 8 booked, 3 requested -> needs approval
        assert_eq!(assess_capacity(8, 10, 3), CapacityDecision::Overbooking);
    }

    #[test]
    fn test_empty_slot() {
        assert_eq!(assess_capacity(0, 10, 10), CapacityDecision::Fits);
        assert_eq!(assess_capacity(0, 10, 11), CapacityDecision::Overbooking);
    }

    #[test]
    fn test_already_overbooked_slot_rejects_everything() {
        assert_eq!(assess_capacity(12, 10, 1), CapacityDecision::Overbooking);
    }
}
