//! Time-lock reveal gate.

/// Whether sealed bid amounts may be disclosed.
///
/// This is the only authorization check for exposing plaintext amounts. Callers
/// evaluate it with the clock reading of the operation that needs it.
pub fn can_reveal(end_time: u64, now: u64) -> bool {
    now >= end_time
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_boundary() {
        assert!(!can_reveal(1000, 999));
        assert!(can_reveal(1000, 1000));
        assert!(can_reveal(1000, 1001));
    }

    #[test]
    fn test_gate_monotonic() {
        let end_time = 500;
        let mut opened = false;
        for now in 0..1000 {
            let open = can_reveal(end_time, now);
            // Once open, the gate never closes again.
            assert!(!opened || open);
            assert_eq!(open, now >= end_time);
            opened = open;
        }
    }

    #[test]
    fn test_gate_extremes() {
        assert!(can_reveal(0, 0));
        assert!(can_reveal(u64::MAX, u64::MAX));
        assert!(!can_reveal(u64::MAX, u64::MAX - 1));
    }
}
