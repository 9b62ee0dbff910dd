/// Allocates the names of the pass/fail checkboxes in an execution table.
///
/// One counter belongs to exactly one suite compilation; names are
/// strictly increasing and start at 1 after a reset.
#[derive(Debug, Default)]
pub struct CheckboxCounter {
    last: u64,
}

impl CheckboxCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next unused name.
    pub fn next_name(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// The most recently allocated name, `0` when none was handed out.
    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_start_at_one_and_increase() {
        let mut c = CheckboxCounter::new();
        assert_eq!(c.last(), 0);
        assert_eq!(c.next_name(), 1);
        assert_eq!(c.next_name(), 2);
        assert_eq!(c.last(), 2);
    }

    #[test]
    fn reset_starts_over() {
        let mut c = CheckboxCounter::new();
        c.next_name();
        c.next_name();
        c.reset();
        assert_eq!(c.next_name(), 1);
    }
}
