use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;

use crate::entry::CacheEntry;

// ---------------------------------------------------------------------------
// Sentinel layout
//
// The first six slots of `nodes` are permanent HEAD/TAIL sentinels — one
// pair per segment.  Real entries start at index 6.  Sentinels always have
// `entry = None` and are never returned or looked up via the index.
//
// HEAD.next is the least-recently-touched entry of a segment; TAIL.prev the
// most-recently-touched.
// ---------------------------------------------------------------------------
const WINDOW_HEAD: usize = 0;
const WINDOW_TAIL: usize = 1;
const PROBATION_HEAD: usize = 2;
const PROBATION_TAIL: usize = 3;
const PROTECTED_HEAD: usize = 4;
const PROTECTED_TAIL: usize = 5;
const NULL: usize = usize::MAX;
const SENTINEL_COUNT: usize = 6;

/// Which segment a cache entry currently belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Segment {
    Window,
    Probation,
    Protected,
}

impl Segment {
    #[inline]
    fn head(self) -> usize {
        match self {
            Segment::Window => WINDOW_HEAD,
            Segment::Probation => PROBATION_HEAD,
            Segment::Protected => PROTECTED_HEAD,
        }
    }

    #[inline]
    fn tail(self) -> usize {
        match self {
            Segment::Window => WINDOW_TAIL,
            Segment::Probation => PROBATION_TAIL,
            Segment::Protected => PROTECTED_TAIL,
        }
    }
}

/// A single node in the entry arena.
struct SegmentNode<K, V> {
    /// `None` only for sentinel slots and recycled slots.
    entry: Option<Arc<CacheEntry<K, V>>>,
    prev: usize,
    next: usize,
    segment: Segment,
}

// ---------------------------------------------------------------------------
// SegmentedLru
// ---------------------------------------------------------------------------

/// The three W-TinyLFU segment queues over one arena.
///
/// Entries hold no list pointers themselves; each resident key maps to an
/// arena slot carrying `prev`/`next` indices and a segment tag, which makes
/// membership queries O(1) and sidesteps aliasing between the lookup table
/// and the queues.  All methods assume the caller holds the eviction lock.
pub(crate) struct SegmentedLru<K, V> {
    /// Central node arena — sentinels and real entries alike.
    nodes: Vec<SegmentNode<K, V>>,
    /// Maps `K → arena index` for O(1) access.
    index: AHashMap<K, usize>,
    /// Recycled arena slots.
    free_list: Vec<usize>,

    window_len: usize,
    probation_len: usize,
    protected_len: usize,

    probation_cap: usize,
    protected_cap: usize,
}

impl<K: Hash + Eq + Clone, V> SegmentedLru<K, V> {
    pub(crate) fn new(capacity: usize, probation_cap: usize, protected_cap: usize) -> Self {
        let mut nodes: Vec<SegmentNode<K, V>> = Vec::with_capacity(SENTINEL_COUNT + capacity);
        let sentinel_segments = [
            Segment::Window,    // 0 = WINDOW_HEAD
            Segment::Window,    // 1 = WINDOW_TAIL
            Segment::Probation, // 2 = PROBATION_HEAD
            Segment::Probation, // 3 = PROBATION_TAIL
            Segment::Protected, // 4 = PROTECTED_HEAD
            Segment::Protected, // 5 = PROTECTED_TAIL
        ];
        for segment in sentinel_segments {
            nodes.push(SegmentNode {
                entry: None,
                prev: NULL,
                next: NULL,
                segment,
            });
        }
        // Wire sentinel pairs: HEAD.next = TAIL, TAIL.prev = HEAD.
        nodes[WINDOW_HEAD].next = WINDOW_TAIL;
        nodes[WINDOW_TAIL].prev = WINDOW_HEAD;
        nodes[PROBATION_HEAD].next = PROBATION_TAIL;
        nodes[PROBATION_TAIL].prev = PROBATION_HEAD;
        nodes[PROTECTED_HEAD].next = PROTECTED_TAIL;
        nodes[PROTECTED_TAIL].prev = PROTECTED_HEAD;

        SegmentedLru {
            nodes,
            index: AHashMap::with_capacity(capacity),
            free_list: Vec::new(),
            window_len: 0,
            probation_len: 0,
            protected_len: 0,
            probation_cap,
            protected_cap,
        }
    }

    pub(crate) fn probation_cap(&self) -> usize {
        self.probation_cap
    }

    // -----------------------------------------------------------------------
    // Linked-list helpers (operate on the arena by index)
    // -----------------------------------------------------------------------

    /// Inserts node `idx` immediately before sentinel `tail` (MRU position).
    #[inline]
    fn link_before(&mut self, tail: usize, idx: usize) {
        let old_last = self.nodes[tail].prev;
        self.nodes[idx].next = tail;
        self.nodes[idx].prev = old_last;
        self.nodes[tail].prev = idx;
        self.nodes[old_last].next = idx;
    }

    /// Removes node `idx` from its current position.
    /// After this call `nodes[idx].{prev, next} == NULL`.
    #[inline]
    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }

    #[inline]
    fn len_mut(&mut self, segment: Segment) -> &mut usize {
        match segment {
            Segment::Window => &mut self.window_len,
            Segment::Probation => &mut self.probation_len,
            Segment::Protected => &mut self.protected_len,
        }
    }

    // -----------------------------------------------------------------------
    // Node lifecycle
    // -----------------------------------------------------------------------

    fn alloc_node(&mut self, entry: Arc<CacheEntry<K, V>>, segment: Segment) -> usize {
        if let Some(idx) = self.free_list.pop() {
            let node = &mut self.nodes[idx];
            node.entry = Some(entry);
            node.prev = NULL;
            node.next = NULL;
            node.segment = segment;
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(SegmentNode {
                entry: Some(entry),
                prev: NULL,
                next: NULL,
                segment,
            });
            idx
        }
    }

    /// Frees a node that is already unlinked, returning its entry.
    fn release(&mut self, idx: usize) -> Option<Arc<CacheEntry<K, V>>> {
        let entry = self.nodes[idx].entry.take()?;
        self.index.remove(entry.key());
        self.free_list.push(idx);
        Some(entry)
    }

    // -----------------------------------------------------------------------
    // Queue operations
    // -----------------------------------------------------------------------

    /// Appends `entry` at the MRU end of `segment`.
    ///
    /// The key must not currently be tracked by any segment.
    pub(crate) fn push_back(&mut self, segment: Segment, entry: Arc<CacheEntry<K, V>>) {
        debug_assert!(!self.index.contains_key(entry.key()));
        let key = entry.key().clone();
        let idx = self.alloc_node(entry, segment);
        self.index.insert(key, idx);
        self.link_before(segment.tail(), idx);
        *self.len_mut(segment) += 1;
    }

    /// Detaches and returns the LRU entry of `segment`.
    pub(crate) fn pop_front(&mut self, segment: Segment) -> Option<Arc<CacheEntry<K, V>>> {
        let idx = self.nodes[segment.head()].next;
        if idx == segment.tail() {
            return None;
        }
        self.unlink(idx);
        *self.len_mut(segment) -= 1;
        self.release(idx)
    }

    /// Peeks at the LRU entry of `segment` without detaching it.
    pub(crate) fn peek_front(&self, segment: Segment) -> Option<Arc<CacheEntry<K, V>>> {
        let idx = self.nodes[segment.head()].next;
        if idx == segment.tail() {
            return None;
        }
        self.nodes[idx].entry.as_ref().map(Arc::clone)
    }

    /// Unlinks `key` from whichever segment holds it.
    pub(crate) fn remove(&mut self, key: &K) -> Option<Arc<CacheEntry<K, V>>> {
        let idx = *self.index.get(key)?;
        let segment = self.nodes[idx].segment;
        self.unlink(idx);
        *self.len_mut(segment) -= 1;
        self.release(idx)
    }

    /// The segment currently holding `key`, if any.
    pub(crate) fn segment_of(&self, key: &K) -> Option<Segment> {
        self.index.get(key).map(|&idx| self.nodes[idx].segment)
    }

    /// Re-access bookkeeping for a resident key:
    ///
    /// - window hit → refresh recency within the window;
    /// - probation hit → promote to protected, demoting the protected LRU
    ///   back to probation's MRU end when protected is at capacity;
    /// - protected hit → refresh recency within protected.
    ///
    /// No-op when the key is not tracked (it may have been evicted between
    /// the table lookup and lock acquisition).
    pub(crate) fn promote(&mut self, key: &K) {
        let Some(&idx) = self.index.get(key) else { return };

        match self.nodes[idx].segment {
            Segment::Window => {
                self.unlink(idx);
                self.link_before(WINDOW_TAIL, idx);
            }
            Segment::Protected => {
                self.unlink(idx);
                self.link_before(PROTECTED_TAIL, idx);
            }
            Segment::Probation => {
                self.unlink(idx);
                self.probation_len -= 1;

                if self.protected_len >= self.protected_cap {
                    let demote = self.nodes[PROTECTED_HEAD].next;
                    if demote != PROTECTED_TAIL {
                        self.unlink(demote);
                        self.protected_len -= 1;
                        self.nodes[demote].segment = Segment::Probation;
                        self.link_before(PROBATION_TAIL, demote);
                        self.probation_len += 1;
                    }
                }

                self.nodes[idx].segment = Segment::Protected;
                self.link_before(PROTECTED_TAIL, idx);
                self.protected_len += 1;
            }
        }
    }

    /// Moves probation's LRU entries into protected while probation exceeds
    /// its budget and protected has room.
    ///
    /// Called after a duel-free admission so that `|probation|` stays within
    /// `probation_cap` after every operation, not only once main is full.
    pub(crate) fn rebalance(&mut self) {
        while self.probation_len > self.probation_cap && self.protected_len < self.protected_cap {
            let idx = self.nodes[PROBATION_HEAD].next;
            if idx == PROBATION_TAIL {
                break;
            }
            self.unlink(idx);
            self.probation_len -= 1;
            self.nodes[idx].segment = Segment::Protected;
            self.link_before(PROTECTED_TAIL, idx);
            self.protected_len += 1;
        }
    }

    pub(crate) fn len(&self, segment: Segment) -> usize {
        match segment {
            Segment::Window => self.window_len,
            Segment::Probation => self.probation_len,
            Segment::Protected => self.protected_len,
        }
    }

    #[allow(dead_code)]
    pub(crate) fn total_len(&self) -> usize {
        self.window_len + self.probation_len + self.protected_len
    }

    /// Drops every tracked entry and resets the arena to its sentinels.
    pub(crate) fn clear(&mut self) {
        self.nodes.truncate(SENTINEL_COUNT);
        self.nodes[WINDOW_HEAD].next = WINDOW_TAIL;
        self.nodes[WINDOW_TAIL].prev = WINDOW_HEAD;
        self.nodes[PROBATION_HEAD].next = PROBATION_TAIL;
        self.nodes[PROBATION_TAIL].prev = PROBATION_HEAD;
        self.nodes[PROTECTED_HEAD].next = PROTECTED_TAIL;
        self.nodes[PROTECTED_TAIL].prev = PROTECTED_HEAD;
        self.index.clear();
        self.free_list.clear();
        self.window_len = 0;
        self.probation_len = 0;
        self.protected_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: u64) -> Arc<CacheEntry<u64, u64>> {
        Arc::new(CacheEntry::new(key, key, key, 8, 10, 0))
    }

    fn make() -> SegmentedLru<u64, u64> {
        SegmentedLru::new(16, 2, 3)
    }

    #[test]
    fn push_and_pop_is_fifo_per_segment() {
        let mut lru = make();
        lru.push_back(Segment::Window, entry(1));
        lru.push_back(Segment::Window, entry(2));
        lru.push_back(Segment::Window, entry(3));

        assert_eq!(lru.len(Segment::Window), 3);
        assert_eq!(*lru.pop_front(Segment::Window).unwrap().key(), 1);
        assert_eq!(*lru.pop_front(Segment::Window).unwrap().key(), 2);
        assert_eq!(*lru.pop_front(Segment::Window).unwrap().key(), 3);
        assert!(lru.pop_front(Segment::Window).is_none());
    }

    #[test]
    fn peek_does_not_detach() {
        let mut lru = make();
        lru.push_back(Segment::Probation, entry(9));
        assert_eq!(*lru.peek_front(Segment::Probation).unwrap().key(), 9);
        assert_eq!(lru.len(Segment::Probation), 1);
    }

    #[test]
    fn remove_unlinks_from_owning_segment() {
        let mut lru = make();
        lru.push_back(Segment::Window, entry(1));
        lru.push_back(Segment::Window, entry(2));
        assert!(lru.remove(&1).is_some());
        assert_eq!(lru.len(Segment::Window), 1);
        assert_eq!(lru.segment_of(&1), None);
        assert!(lru.remove(&1).is_none(), "second remove must be a no-op");
    }

    #[test]
    fn window_promotion_refreshes_recency() {
        let mut lru = make();
        lru.push_back(Segment::Window, entry(1));
        lru.push_back(Segment::Window, entry(2));
        lru.promote(&1);
        // 1 moved to the MRU end, so 2 is now the LRU victim.
        assert_eq!(*lru.pop_front(Segment::Window).unwrap().key(), 2);
    }

    #[test]
    fn probation_hit_promotes_to_protected() {
        let mut lru = make();
        lru.push_back(Segment::Probation, entry(5));
        lru.promote(&5);
        assert_eq!(lru.segment_of(&5), Some(Segment::Protected));
        assert_eq!(lru.len(Segment::Probation), 0);
        assert_eq!(lru.len(Segment::Protected), 1);
    }

    #[test]
    fn protected_overflow_demotes_lru_back_to_probation() {
        let mut lru = make(); // protected_cap = 3
        for key in 1..=4u64 {
            lru.push_back(Segment::Probation, entry(key));
            lru.promote(&key);
        }
        assert_eq!(lru.len(Segment::Protected), 3);
        assert_eq!(lru.len(Segment::Probation), 1);
        // Key 1 was the protected LRU when 4 was promoted.
        assert_eq!(lru.segment_of(&1), Some(Segment::Probation));
    }

    #[test]
    fn rebalance_spills_probation_overflow_into_protected() {
        let mut lru = make(); // probation_cap = 2, protected_cap = 3
        for key in 1..=4u64 {
            lru.push_back(Segment::Probation, entry(key));
        }
        lru.rebalance();
        assert_eq!(lru.len(Segment::Probation), 2);
        assert_eq!(lru.len(Segment::Protected), 2);
        // The LRU end spilled first.
        assert_eq!(lru.segment_of(&1), Some(Segment::Protected));
        assert_eq!(lru.segment_of(&2), Some(Segment::Protected));
        assert_eq!(lru.segment_of(&3), Some(Segment::Probation));
    }

    #[test]
    fn rebalance_stops_at_protected_capacity() {
        let mut lru = make(); // probation_cap = 2, protected_cap = 3
        for key in 1..=3u64 {
            lru.push_back(Segment::Protected, entry(key));
        }
        for key in 10..=13u64 {
            lru.push_back(Segment::Probation, entry(key));
        }
        lru.rebalance();
        // Protected is full, so probation keeps its overflow.
        assert_eq!(lru.len(Segment::Protected), 3);
        assert_eq!(lru.len(Segment::Probation), 4);
    }

    #[test]
    fn promote_on_untracked_key_is_noop() {
        let mut lru = make();
        lru.promote(&42);
        assert_eq!(lru.total_len(), 0);
    }

    #[test]
    fn slots_are_recycled() {
        let mut lru = make();
        for key in 0..100u64 {
            lru.push_back(Segment::Window, entry(key));
            lru.pop_front(Segment::Window);
        }
        assert!(
            lru.nodes.len() <= SENTINEL_COUNT + 1,
            "arena grew to {} slots despite recycling",
            lru.nodes.len()
        );
    }

    #[test]
    fn clear_resets_everything() {
        let mut lru = make();
        for key in 0..10u64 {
            lru.push_back(Segment::Window, entry(key));
        }
        lru.clear();
        assert_eq!(lru.total_len(), 0);
        assert!(lru.peek_front(Segment::Window).is_none());
        // Reusable after clear.
        lru.push_back(Segment::Protected, entry(1));
        assert_eq!(lru.len(Segment::Protected), 1);
    }
}
