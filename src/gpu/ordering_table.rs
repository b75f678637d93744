//! Depth-bucketed ordering table
//!
//! Painter's algorithm without a depth buffer: bucket `len - 1` is the
//! farthest and is drawn first, bucket 0 is drawn last. Each bucket is a
//! chain of arena records linked through `PrimRecord::next`. Insertion
//! appends at the bucket tail, so records sharing a depth key are emitted in
//! the order they were inserted.

use super::arena::{PrimArena, PrimHandle};
use super::primitive::Primitive;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    head: Option<PrimHandle>,
    tail: Option<PrimHandle>,
}

#[derive(Debug, Clone)]
pub struct OrderingTable {
    buckets: Vec<Bucket>,
}

impl OrderingTable {
    pub fn new(len: usize) -> Self {
        Self {
            buckets: vec![Bucket::default(); len],
        }
    }

    /// Number of depth buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Empty every bucket
    pub fn clear(&mut self) {
        self.buckets.fill(Bucket::default());
    }

    /// Link `handle` into bucket `key`
    ///
    /// Keys outside `0..len` are dropped and `false` is returned.
    pub fn insert(&mut self, handle: PrimHandle, key: usize, arena: &mut PrimArena) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        arena.set_next(handle, None);
        match bucket.tail {
            Some(tail) => arena.set_next(tail, Some(handle)),
            None => bucket.head = Some(handle),
        }
        bucket.tail = Some(handle);
        true
    }

    /// Walk back to front, yielding `(key, primitive)`
    pub fn iter<'a>(&'a self, arena: &'a PrimArena) -> OtIter<'a> {
        OtIter {
            table: self,
            arena,
            bucket: self.buckets.len(),
            cursor: None,
        }
    }

    /// Primitives reachable by traversal
    pub fn count(&self, arena: &PrimArena) -> usize {
        self.iter(arena).count()
    }

    /// Primitives in one bucket
    pub fn bucket_len(&self, key: usize, arena: &PrimArena) -> usize {
        let mut n = 0;
        let mut cursor = self.buckets.get(key).and_then(|b| b.head);
        while let Some(h) = cursor {
            n += 1;
            cursor = arena.record(h).next;
        }
        n
    }
}

/// Back-to-front traversal over an ordering table
pub struct OtIter<'a> {
    table: &'a OrderingTable,
    arena: &'a PrimArena,
    /// One past the bucket currently being walked
    bucket: usize,
    cursor: Option<PrimHandle>,
}

impl<'a> Iterator for OtIter<'a> {
    type Item = (usize, &'a Primitive);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(h) = self.cursor {
                let record = self.arena.record(h);
                self.cursor = record.next;
                return Some((self.bucket, &record.prim));
            }
            if self.bucket == 0 {
                return None;
            }
            self.bucket -= 1;
            self.cursor = self.table.buckets[self.bucket].head;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::MaskMode;
    use crate::gte::{Rgb, ScreenXY};

    fn tagged(r: u8) -> Primitive {
        Primitive::F3 {
            xy: [ScreenXY::default(); 3],
            rgb: Rgb::new(r, 0, 0),
            semi_trans: false,
        }
    }

    fn red(p: &Primitive) -> u8 {
        match p {
            Primitive::F3 { rgb, .. } => rgb.r,
            _ => 0,
        }
    }

    #[test]
    fn test_clear_empties_all_buckets() {
        let mut arena = PrimArena::new(4096);
        let mut ot = OrderingTable::new(8);
        for key in 0..8 {
            let h = arena.alloc(tagged(key as u8)).unwrap();
            ot.insert(h, key, &mut arena);
        }
        assert_eq!(ot.count(&arena), 8);
        ot.clear();
        assert_eq!(ot.count(&arena), 0);
        for key in 0..8 {
            assert_eq!(ot.bucket_len(key, &arena), 0);
        }
    }

    #[test]
    fn test_out_of_range_key_dropped() {
        let mut arena = PrimArena::new(4096);
        let mut ot = OrderingTable::new(4);
        let h = arena.alloc(tagged(1)).unwrap();
        assert!(!ot.insert(h, 4, &mut arena));
        assert_eq!(ot.count(&arena), 0);
    }

    #[test]
    fn test_traversal_is_back_to_front() {
        let mut arena = PrimArena::new(4096);
        let mut ot = OrderingTable::new(16);
        for key in [3usize, 15, 0, 7, 7, 12] {
            let h = arena.alloc(tagged(key as u8)).unwrap();
            ot.insert(h, key, &mut arena);
        }
        let keys: Vec<usize> = ot.iter(&arena).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![15, 12, 7, 7, 3, 0]);
        assert!(keys.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_same_bucket_keeps_insertion_order() {
        let mut arena = PrimArena::new(4096);
        let mut ot = OrderingTable::new(4);
        let mask = arena.alloc(Primitive::Mask(MaskMode::FromSource)).unwrap();
        ot.insert(mask, 3, &mut arena);
        for r in 1..=3 {
            let h = arena.alloc(tagged(r)).unwrap();
            ot.insert(h, 3, &mut arena);
        }
        let prims: Vec<&Primitive> = ot.iter(&arena).map(|(_, p)| p).collect();
        assert_eq!(prims[0], &Primitive::Mask(MaskMode::FromSource));
        assert_eq!(prims[1..].iter().map(|p| red(p)).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_count_matches_insertions() {
        let mut arena = PrimArena::new(1 << 16);
        let mut ot = OrderingTable::new(4096);
        for i in 0..500usize {
            let h = arena.alloc(tagged(0)).unwrap();
            ot.insert(h, (i * 37) % 4096, &mut arena);
        }
        assert_eq!(ot.count(&arena), 500);
    }
}
