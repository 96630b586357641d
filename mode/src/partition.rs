//! Disjoint classes of label integers.
//!
//! Provisional labels found during a raster scan are grouped into
//! equivalence classes here and then remapped to `class index + 1`.
//! Classes are explicit small sets plus a label-to-class index; class
//! indices follow creation order, and a merge always keeps the lower index,
//! so final object numbers follow scan order.

use hashbrown::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Partition {
    classes: Vec<Vec<u32>>,
    class_of: HashMap<u32, usize>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes.
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Number of distinct labels across all classes.
    #[inline]
    pub fn n_labels(&self) -> usize {
        self.class_of.len()
    }

    /// Members of class `i`. Panics when `i` is out of range.
    pub fn class(&self, i: usize) -> &[u32] {
        &self.classes[i]
    }

    pub fn classes(&self) -> impl Iterator<Item = &[u32]> {
        self.classes.iter().map(|c| c.as_slice())
    }

    #[inline]
    pub fn which_class(&self, label: u32) -> Option<usize> {
        self.class_of.get(&label).copied()
    }

    pub fn has(&self, class: usize, label: u32) -> bool {
        self.which_class(label) == Some(class)
    }

    /// Add `label` as a singleton class unless it is already present.
    pub fn add_no_repeat(&mut self, label: u32) -> usize {
        if let Some(class) = self.which_class(label) {
            return class;
        }
        let class = self.classes.len();
        self.classes.push(vec![label]);
        self.class_of.insert(label, class);
        class
    }

    /// Union the classes holding `a` and `b`, adding either one first if absent.
    pub fn merge_values(&mut self, a: u32, b: u32) {
        if a == b {
            return;
        }
        let ca = self.add_no_repeat(a);
        let cb = self.add_no_repeat(b);
        if ca != cb {
            self.merge_classes(ca.min(cb), ca.max(cb));
        }
    }

    fn merge_classes(&mut self, keep: usize, remove: usize) {
        debug_assert!(keep < remove);
        let moved = self.classes.remove(remove);
        for &label in &moved {
            self.class_of.insert(label, keep);
        }
        self.classes[keep].extend(moved);

        // Every class after the removed slot shifted down by one.
        for (i, class) in self.classes.iter().enumerate().skip(remove) {
            for &label in class {
                self.class_of.insert(label, i);
            }
        }
    }
}
