use std::collections::BTreeSet;

use graft_types::Reference;

/// Receives the reference values seen while (de)serializing properties.
///
/// - `write` is called for every reference serialized.
/// - `read` is called for every reference decoded into a property.
/// - `remove` is called for every reference dropped during reserialization.
pub trait ReferenceValues {
    fn read(&mut self, reference: &Reference);
    fn write(&mut self, reference: &Reference);
    fn remove(&mut self, reference: &Reference);
}

/// Ignores every reference.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReferenceValues;

impl ReferenceValues for NoReferenceValues {
    fn read(&mut self, _reference: &Reference) {}
    fn write(&mut self, _reference: &Reference) {}
    fn remove(&mut self, _reference: &Reference) {}
}

/// Accumulates references so the caller can validate them in bulk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct References {
    read: BTreeSet<Reference>,
    written: BTreeSet<Reference>,
    removed: BTreeSet<Reference>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_references(&self) -> &BTreeSet<Reference> {
        &self.read
    }

    pub fn written_references(&self) -> &BTreeSet<Reference> {
        &self.written
    }

    pub fn removed_references(&self) -> &BTreeSet<Reference> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.written.is_empty() && self.removed.is_empty()
    }

    pub fn clear(&mut self) {
        self.read.clear();
        self.written.clear();
        self.removed.clear();
    }
}

impl ReferenceValues for References {
    fn read(&mut self, reference: &Reference) {
        self.read.insert(*reference);
    }

    fn write(&mut self, reference: &Reference) {
        self.written.insert(*reference);
    }

    fn remove(&mut self, reference: &Reference) {
        self.removed.insert(*reference);
    }
}
