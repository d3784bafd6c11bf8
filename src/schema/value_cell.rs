//! Versioned value container for GPU-bound data.
//!
//! Every write bumps the version. Consumers (the GPU sync step) remember the
//! last version they uploaded and skip the upload while it is unchanged.

/// A mutable value plus a monotonically increasing write counter.
#[derive(Debug, Clone)]
pub struct ValueCell<T> {
    value: T,
    version: u64,
}

impl<T> ValueCell<T> {
    /// Cell holding `value` at version 0.
    pub fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    /// Current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Overwrite the value and bump the version.
    pub fn update(&mut self, value: T) {
        self.value = value;
        self.version += 1;
    }

    /// Swap in `value`, bump the version, and hand back the previous value
    /// so its allocation can be recycled.
    pub fn replace(&mut self, value: T) -> T {
        self.version += 1;
        std::mem::replace(&mut self.value, value)
    }

    /// Mutate in place through `f`; always counts as a write.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        self.version += 1;
        f(&mut self.value)
    }
}

impl<T: PartialEq> ValueCell<T> {
    /// Write only if `value` differs from the current one.
    ///
    /// Returns `true` when the cell was written.
    pub fn update_if_changed(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.update(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_write_bumps_version() {
        let mut cell = ValueCell::new(1.0_f32);
        assert_eq!(cell.version(), 0);
        cell.update(1.0);
        cell.update(2.0);
        assert_eq!(cell.version(), 2);
        assert_eq!(*cell.get(), 2.0);
    }

    #[test]
    fn unchanged_write_is_skipped() {
        let mut cell = ValueCell::new(vec![1u32, 2, 3]);
        assert!(!cell.update_if_changed(vec![1, 2, 3]));
        assert_eq!(cell.version(), 0);
        assert!(cell.update_if_changed(vec![1, 2]));
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn replace_returns_previous_allocation() {
        let mut cell = ValueCell::new(Vec::<f32>::with_capacity(64));
        let old = cell.replace(vec![1.0]);
        assert!(old.capacity() >= 64);
        assert_eq!(cell.version(), 1);
    }
}
