//! Memory register (MC / MR / MS / M+ / M-).

use tracing::debug;

use super::number::NumericValue;

/// A single accumulator owned by one calculator instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryRegister {
    value: NumericValue,
}

impl MemoryRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.value = NumericValue::zero();
    }

    pub fn recall(&self) -> NumericValue {
        self.value.clone()
    }

    /// Check if anything other than zero is stored.
    pub fn is_set(&self) -> bool {
        !self.value.is_zero()
    }

    /// Replace the stored value. Returns false, leaving the register
    /// untouched, when `input` is not a number.
    pub fn store(&mut self, input: &str) -> bool {
        self.apply(input, |_, v| v)
    }

    pub fn add(&mut self, input: &str) -> bool {
        self.apply(input, |m, v| m + v)
    }

    pub fn subtract(&mut self, input: &str) -> bool {
        self.apply(input, |m, v| m - v)
    }

    pub fn store_value(&mut self, value: NumericValue) {
        self.value = value;
    }

    pub fn add_value(&mut self, value: NumericValue) {
        self.value = self.value.clone() + value;
    }

    pub fn subtract_value(&mut self, value: NumericValue) {
        self.value = self.value.clone() - value;
    }

    fn apply(
        &mut self,
        input: &str,
        op: impl FnOnce(NumericValue, NumericValue) -> NumericValue,
    ) -> bool {
        match input.trim().parse::<NumericValue>() {
            Ok(v) => {
                self.value = op(self.value.clone(), v);
                true
            }
            Err(err) => {
                debug!(input, error = %err, "memory operation ignored");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_recall() {
        let mut memory = MemoryRegister::new();
        assert!(!memory.is_set());
        assert!(memory.store("42"));
        assert_eq!(memory.recall(), NumericValue::from(42));
        assert!(memory.is_set());
    }

    #[test]
    fn test_add_subtract() {
        let mut memory = MemoryRegister::new();
        assert!(memory.add("10"));
        assert!(memory.add("2.5"));
        assert!(memory.subtract("0.5"));
        assert_eq!(memory.recall(), NumericValue::from(12));
    }

    #[test]
    fn test_invalid_input_leaves_value() {
        let mut memory = MemoryRegister::new();
        memory.store("7");
        assert!(!memory.store("abc"));
        assert!(!memory.add(""));
        assert!(!memory.subtract("1 +"));
        assert_eq!(memory.recall(), NumericValue::from(7));
    }

    #[test]
    fn test_clear() {
        let mut memory = MemoryRegister::new();
        memory.store_value(NumericValue::from(3));
        memory.clear();
        assert_eq!(memory.recall(), NumericValue::zero());
    }
}
