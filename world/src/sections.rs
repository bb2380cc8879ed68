use std::collections::BTreeMap;

use level_scene_core::{SectionId, SECTION_WIDTH};

/// Sparse index bucketing objects into fixed-width horizontal sections.
///
/// Buckets are keyed by signed section id, so objects left of the origin are
/// stored like any other. Vertical position is not indexed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpatialIndex {
    buckets: BTreeMap<i32, Vec<usize>>,
    len: usize,
}

impl SpatialIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `object` to the bucket of `section`, preserving insertion order.
    pub fn insert(&mut self, section: SectionId, object: usize) {
        self.buckets.entry(section.get()).or_default().push(object);
        self.len += 1;
    }

    /// Objects in every section overlapping `[min_x, max_x)`, bucket by bucket.
    ///
    /// A range ending exactly on a section boundary does not reach into the
    /// section starting there. A degenerate range covers the section holding
    /// its single point. Inverted ranges and NaN bounds yield no objects.
    #[must_use]
    pub fn range_query(&self, min_x: f32, max_x: f32) -> Vec<usize> {
        if min_x.is_nan() || max_x.is_nan() || min_x > max_x {
            return Vec::new();
        }

        let first = SectionId::containing(min_x).get();
        let last = if max_x > min_x {
            ((max_x / SECTION_WIDTH).ceil() as i32).saturating_sub(1)
        } else {
            first
        };
        if last < first {
            return Vec::new();
        }

        self.buckets
            .range(first..=last)
            .flat_map(|(_, objects)| objects.iter().copied())
            .collect()
    }

    /// Objects stored in one section.
    #[must_use]
    pub fn section(&self, section: SectionId) -> &[usize] {
        self.buckets
            .get(&section.get())
            .map_or(&[], |objects| objects.as_slice())
    }

    /// Number of populated sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of indexed objects.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether no object is indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(positions: &[f32]) -> SpatialIndex {
        let mut index = SpatialIndex::new();
        for (object, x) in positions.iter().enumerate() {
            index.insert(SectionId::containing(*x), object);
        }
        index
    }

    #[test]
    fn range_query_covers_whole_sections() {
        let index = index(&[100.0, 300.0, 450.0, 399.9]);
        assert_eq!(index.range_query(0.0, 400.0), vec![0, 1, 3]);
        assert_eq!(index.range_query(0.0, 400.5), vec![0, 1, 3, 2]);
        assert_eq!(index.range_query(150.0, 150.0), vec![0]);
        assert_eq!(index.range_query(250.0, 301.0), vec![1, 3]);
        assert_eq!(index.range_query(200.0, 300.0), Vec::<usize>::new());
    }

    #[test]
    fn negative_sections_are_ordered_before_positive_ones() {
        let index = index(&[50.0, -50.0, -150.0, -0.5]);
        assert_eq!(index.section(SectionId::new(-1)), &[1, 3]);
        assert_eq!(index.range_query(-200.0, 99.0), vec![2, 1, 3, 0]);
        assert_eq!(index.section_count(), 3);
    }

    #[test]
    fn inverted_and_nan_ranges_are_empty() {
        let index = index(&[10.0, 20.0]);
        assert!(index.range_query(50.0, 0.0).is_empty());
        assert!(index.range_query(f32::NAN, 100.0).is_empty());
        assert!(index.range_query(0.0, f32::NAN).is_empty());
    }

    #[test]
    fn unbounded_ranges_return_everything() {
        let index = index(&[-1.0e6, 0.0, 1.0e6]);
        assert_eq!(
            index.range_query(f32::NEG_INFINITY, f32::INFINITY),
            vec![0, 1, 2]
        );
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
    }
}
