//! Ordered class registry
//!
//! Every fitted model indexes its per-class statistics through a
//! [`ClassRegistry`]: an ordered mapping from class label to dense class
//! index. The registry is established by the first fit call — either from
//! the sorted unique labels of the data or from an explicitly declared
//! list — and is frozen for the rest of the model's life. Columns of all
//! probability outputs follow the registry order.
use std::collections::HashSet;

use savia::Label;

use crate::error::{NaiveBayesError, Result};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Ordered mapping from class label to dense class index
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRegistry<L> {
    classes: Vec<L>,
    frozen: bool,
}

impl<L: Label> Default for ClassRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> ClassRegistry<L> {
    /// An empty, unfrozen registry
    pub fn new() -> Self {
        ClassRegistry {
            classes: Vec::new(),
            frozen: false,
        }
    }

    /// Registry holding the sorted unique labels of the first fitted data,
    /// frozen immediately
    pub fn from_sorted_labels(labels: &[L]) -> Self
    where
        L: Ord,
    {
        let mut registry = Self::new();
        // labels stem from `Labels::labels` and are already unique
        registry
            .register(labels)
            .expect("a fresh registry accepts labels");
        registry.classes.sort_unstable();
        registry.freeze();
        registry
    }

    /// Registry holding an explicitly declared class list, frozen
    /// immediately. The declared order is kept; duplicates are rejected.
    pub fn from_declared(classes: &[L]) -> Result<Self> {
        if classes.is_empty() {
            return Err(savia::Error::Parameters(
                "the declared class list must not be empty".to_string(),
            )
            .into());
        }
        let mut seen = HashSet::new();
        for class in classes {
            if !seen.insert(class.clone()) {
                return Err(savia::Error::Parameters(format!(
                    "duplicate class {:?} in the declared class list",
                    class
                ))
                .into());
            }
        }
        let mut registry = Self::new();
        registry
            .register(classes)
            .expect("a fresh registry accepts labels");
        registry.freeze();
        Ok(registry)
    }

    /// Assign dense indices to labels not yet seen
    ///
    /// Registration is only legal before the registry is frozen; a frozen
    /// registry rejects any attempt with `ClassesAlreadyFrozen`.
    pub fn register(&mut self, labels: &[L]) -> Result<()> {
        if self.frozen {
            return Err(NaiveBayesError::ClassesAlreadyFrozen);
        }
        for label in labels {
            if !self.classes.contains(label) {
                self.classes.push(label.clone());
            }
        }
        Ok(())
    }

    /// Freeze the class set; later updates may only reference known labels
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Dense index of `label`, failing with `UnknownLabel` for labels
    /// outside the registry
    pub fn index_of(&self, label: &L) -> Result<usize> {
        self.classes
            .iter()
            .position(|class| class == label)
            .ok_or_else(|| NaiveBayesError::UnknownLabel(format!("{:?}", label)))
    }

    pub fn contains(&self, label: &L) -> bool {
        self.classes.contains(label)
    }

    /// Class labels in registry order
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ClassRegistry;
    use crate::NaiveBayesError;

    #[test]
    fn sorted_construction() {
        let registry = ClassRegistry::from_sorted_labels(&[2usize, 0, 1]);
        assert!(registry.is_frozen());
        assert_eq!(registry.classes(), &[0, 1, 2]);
        assert_eq!(registry.index_of(&2).unwrap(), 2);
    }

    #[test]
    fn declared_order_is_kept() {
        let registry = ClassRegistry::from_declared(&["b", "a", "c"]).unwrap();
        assert_eq!(registry.classes(), &["b", "a", "c"]);
        assert_eq!(registry.index_of(&"a").unwrap(), 1);
    }

    #[test]
    fn declared_duplicates_rejected() {
        assert!(ClassRegistry::from_declared(&[1usize, 2, 1]).is_err());
    }

    #[test]
    fn frozen_registry_rejects_unknown() {
        let registry = ClassRegistry::from_sorted_labels(&["a", "b"]);
        match registry.index_of(&"c") {
            Err(NaiveBayesError::UnknownLabel(_)) => {}
            other => panic!("expected UnknownLabel, got {:?}", other),
        }
    }

    #[test]
    fn frozen_registry_rejects_registration() {
        let mut registry = ClassRegistry::from_sorted_labels(&[1usize, 2]);
        match registry.register(&[3]) {
            Err(NaiveBayesError::ClassesAlreadyFrozen) => {}
            other => panic!("expected ClassesAlreadyFrozen, got {:?}", other),
        }
    }
}
