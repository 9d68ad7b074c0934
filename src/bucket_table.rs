//! The open-addressing index behind [`HashMap`](crate::HashMap).
//!
//! The table never sees keys or values. Each bucket holds a packed
//! distance/fingerprint word and the position of its entry in the map's dense
//! value store. Callers hand in mixed hashes and an equality predicate over
//! value indices.

use alloc::alloc::alloc_zeroed;
use alloc::alloc::dealloc;
use alloc::alloc::handle_alloc_error;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::ptr::NonNull;

use crate::error::Error;

/// The load factor at which the bucket table grows.
pub const MAX_LOAD_FACTOR: f32 = 0.8;

/// One unit of probe distance; the low byte below it holds the fingerprint.
const DIST_INC: u32 = 1 << 8;
const FINGERPRINT_MASK: u32 = DIST_INC - 1;

const INITIAL_BUCKET_COUNT: usize = 4;
pub(crate) const INITIAL_SHIFTS: u8 = 64 - INITIAL_BUCKET_COUNT.trailing_zeros() as u8;

/// Largest number of entries a 32-bit value index can address.
pub(crate) const MAX_SIZE: u64 = 1 << 32;
const MAX_BUCKET_COUNT: u64 = MAX_SIZE;
const MIN_SHIFTS: u8 = 64 - MAX_BUCKET_COUNT.trailing_zeros() as u8;

#[inline(always)]
fn bucket_count_for(shifts: u8) -> u64 {
    (1u64 << (64 - shifts)).min(MAX_BUCKET_COUNT)
}

/// `floor(bucket_count * 0.8)`; a table of the maximum size may fill up.
#[inline(always)]
fn max_load(bucket_count: u64) -> u64 {
    if bucket_count == MAX_BUCKET_COUNT {
        MAX_BUCKET_COUNT
    } else {
        bucket_count * 4 / 5
    }
}

/// Smallest table (largest shift) whose load limit admits `size` entries.
pub(crate) fn shifts_for_size(size: u64) -> u8 {
    let mut shifts = INITIAL_SHIFTS;
    while shifts > MIN_SHIFTS && max_load(bucket_count_for(shifts)) < size {
        shifts -= 1;
    }
    shifts
}

#[inline(always)]
fn dist_inc(dist_and_fingerprint: u32) -> u32 {
    dist_and_fingerprint.wrapping_add(DIST_INC)
}

#[inline(always)]
fn dist_and_fingerprint_from_hash(hash: u64) -> u32 {
    DIST_INC | (hash as u32 & FINGERPRINT_MASK)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub(crate) struct Bucket {
    /// Upper 24 bits: probe distance plus one. Lower 8 bits: fingerprint.
    /// Zero marks an empty bucket.
    dist_and_fingerprint: u32,
    value_index: u32,
}

impl Bucket {
    #[inline(always)]
    fn is_empty(self) -> bool {
        self.dist_and_fingerprint == 0
    }

    #[cfg(any(test, feature = "stats"))]
    fn distance(self) -> usize {
        (self.dist_and_fingerprint >> 8) as usize - 1
    }
}

/// Where an insertion search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// An equal key is stored at this value index.
    Occupied(u32),
    /// The key is absent; a new entry belongs at this slot.
    Vacant(Slot),
}

/// A displacement point found by [`BucketTable::probe`].
///
/// Only valid until the table is next modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    dist_and_fingerprint: u32,
    bucket_index: usize,
}

pub(crate) struct BucketTable {
    alloc: NonNull<Bucket>,
    layout: Layout,
    bucket_count: usize,
    max_bucket_capacity: u64,
    shifts: u8,
    /// Shift amount of the largest table this one may grow into.
    min_shifts: u8,
}

// SAFETY: The table exclusively owns its allocation, which only holds plain
// `u32` pairs.
unsafe impl Send for BucketTable {}
// SAFETY: Shared access never mutates the allocation.
unsafe impl Sync for BucketTable {}

impl BucketTable {
    /// Allocates the smallest table.
    pub(crate) fn new() -> Self {
        Self::from_layout(
            INITIAL_SHIFTS,
            INITIAL_BUCKET_COUNT,
            Layout::new::<[Bucket; INITIAL_BUCKET_COUNT]>(),
        )
    }

    /// Allocates an empty table addressed by `hash >> shifts`.
    pub(crate) fn with_shifts(shifts: u8) -> Result<Self, Error> {
        debug_assert!((MIN_SHIFTS..=INITIAL_SHIFTS).contains(&shifts));

        let bucket_count =
            usize::try_from(bucket_count_for(shifts)).map_err(|_| Error::CapacityExceeded)?;
        let layout = Layout::array::<Bucket>(bucket_count).map_err(|_| Error::CapacityExceeded)?;
        Ok(Self::from_layout(shifts, bucket_count, layout))
    }

    fn from_layout(shifts: u8, bucket_count: usize, layout: Layout) -> Self {
        debug_assert!(layout.size() != 0);

        // SAFETY: Every table has at least `INITIAL_BUCKET_COUNT` buckets, so
        // the layout is non-zero sized. Null is handled below.
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(alloc) = NonNull::new(raw.cast::<Bucket>()) else {
            handle_alloc_error(layout);
        };

        Self {
            alloc,
            layout,
            bucket_count,
            max_bucket_capacity: max_load(bucket_count as u64),
            shifts,
            min_shifts: MIN_SHIFTS,
        }
    }

    /// Allocates the smallest table, refusing to grow past `min_shifts`.
    #[cfg(test)]
    pub(crate) fn with_growth_limit(min_shifts: u8) -> Self {
        debug_assert!((MIN_SHIFTS..=INITIAL_SHIFTS).contains(&min_shifts));

        let mut table = Self::new();
        table.min_shifts = min_shifts;
        table
    }

    #[inline(always)]
    fn buckets(&self) -> &[Bucket] {
        // SAFETY: The allocation holds `bucket_count` buckets, zero-initialized
        // at allocation time, and an all-zero `Bucket` is valid (empty).
        unsafe { core::slice::from_raw_parts(self.alloc.as_ptr(), self.bucket_count) }
    }

    #[inline(always)]
    fn buckets_mut(&mut self) -> &mut [Bucket] {
        // SAFETY: See `buckets`; `&mut self` guarantees exclusive access.
        unsafe { core::slice::from_raw_parts_mut(self.alloc.as_ptr(), self.bucket_count) }
    }

    pub(crate) fn shifts(&self) -> u8 {
        self.shifts
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Number of entries the table accepts before it has to grow.
    pub(crate) fn capacity(&self) -> usize {
        usize::try_from(self.max_bucket_capacity).unwrap_or(usize::MAX)
    }

    /// Whether `len` entries exceed the load limit of this table.
    #[inline(always)]
    pub(crate) fn is_full(&self, len: usize) -> bool {
        len as u64 > self.max_bucket_capacity
    }

    #[inline(always)]
    fn bucket_index_from_hash(&self, hash: u64) -> usize {
        (hash >> self.shifts) as usize
    }

    #[inline(always)]
    fn next(&self, bucket_index: usize) -> usize {
        if bucket_index + 1 == self.bucket_count {
            0
        } else {
            bucket_index + 1
        }
    }

    /// Looks up the value index of the entry for which `eq` holds.
    ///
    /// Stops as soon as a bucket is closer to its home than the candidate
    /// would be: sorted probe chains rule out any later match.
    #[inline]
    pub(crate) fn find(&self, hash: u64, eq: impl Fn(u32) -> bool) -> Option<u32> {
        let buckets = self.buckets();
        let mut dist_and_fingerprint = dist_and_fingerprint_from_hash(hash);
        let mut bucket_index = self.bucket_index_from_hash(hash);

        // Most hits are in the first two buckets of the chain.
        for _ in 0..2 {
            let bucket = buckets[bucket_index];
            if bucket.dist_and_fingerprint == dist_and_fingerprint && eq(bucket.value_index) {
                return Some(bucket.value_index);
            }
            dist_and_fingerprint = dist_inc(dist_and_fingerprint);
            bucket_index = self.next(bucket_index);
        }

        loop {
            let bucket = buckets[bucket_index];
            if dist_and_fingerprint == bucket.dist_and_fingerprint {
                if eq(bucket.value_index) {
                    return Some(bucket.value_index);
                }
            } else if dist_and_fingerprint > bucket.dist_and_fingerprint {
                return None;
            }
            dist_and_fingerprint = dist_inc(dist_and_fingerprint);
            bucket_index = self.next(bucket_index);
        }
    }

    /// Runs the insertion search for a key with the given mixed hash.
    #[inline]
    pub(crate) fn probe(&self, hash: u64, eq: impl Fn(u32) -> bool) -> Probe {
        let buckets = self.buckets();
        let mut dist_and_fingerprint = dist_and_fingerprint_from_hash(hash);
        let mut bucket_index = self.bucket_index_from_hash(hash);

        loop {
            let bucket = buckets[bucket_index];
            if dist_and_fingerprint == bucket.dist_and_fingerprint {
                if eq(bucket.value_index) {
                    return Probe::Occupied(bucket.value_index);
                }
            } else if dist_and_fingerprint > bucket.dist_and_fingerprint {
                return Probe::Vacant(Slot {
                    dist_and_fingerprint,
                    bucket_index,
                });
            }
            dist_and_fingerprint = dist_inc(dist_and_fingerprint);
            bucket_index = self.next(bucket_index);
        }
    }

    /// Insertion search for an entry known to be absent from the table.
    #[inline]
    fn next_while_less(&self, hash: u64) -> Slot {
        let buckets = self.buckets();
        let mut dist_and_fingerprint = dist_and_fingerprint_from_hash(hash);
        let mut bucket_index = self.bucket_index_from_hash(hash);

        while dist_and_fingerprint < buckets[bucket_index].dist_and_fingerprint {
            dist_and_fingerprint = dist_inc(dist_and_fingerprint);
            bucket_index = self.next(bucket_index);
        }

        Slot {
            dist_and_fingerprint,
            bucket_index,
        }
    }

    /// Stores `value_index` at a slot returned by [`probe`](Self::probe).
    #[inline]
    pub(crate) fn insert_at(&mut self, slot: Slot, value_index: u32) {
        self.place_and_shift_up(
            Bucket {
                dist_and_fingerprint: slot.dist_and_fingerprint,
                value_index,
            },
            slot.bucket_index,
        );
    }

    /// Writes `bucket` at `bucket_index` and pushes every occupant after it one
    /// bucket further from home, until an empty bucket absorbs the chain.
    fn place_and_shift_up(&mut self, mut bucket: Bucket, mut bucket_index: usize) {
        while !self.buckets()[bucket_index].is_empty() {
            bucket = core::mem::replace(&mut self.buckets_mut()[bucket_index], bucket);
            bucket.dist_and_fingerprint = dist_inc(bucket.dist_and_fingerprint);
            bucket_index = self.next(bucket_index);
        }

        self.buckets_mut()[bucket_index] = bucket;
    }

    /// Shift amount of the next larger table.
    pub(crate) fn grown_shifts(&self) -> Result<u8, Error> {
        if self.shifts <= self.min_shifts {
            return Err(Error::CapacityExceeded);
        }
        Ok(self.shifts - 1)
    }

    /// Replaces this table with an empty one of the given size, then places
    /// every entry again. `hashes` yields the mixed hash of each entry in
    /// value-index order.
    ///
    /// On error the current table is left untouched.
    pub(crate) fn rebuild(
        &mut self,
        shifts: u8,
        hashes: impl Iterator<Item = u64>,
    ) -> Result<(), Error> {
        if shifts < self.min_shifts {
            return Err(Error::CapacityExceeded);
        }
        let mut table = Self::with_shifts(shifts)?;
        table.min_shifts = self.min_shifts;

        for (value_index, hash) in hashes.enumerate() {
            let value_index = u32::try_from(value_index).map_err(|_| Error::CapacityExceeded)?;
            let slot = table.next_while_less(hash);
            table.insert_at(slot, value_index);
        }

        *self = table;
        Ok(())
    }

    /// Marks every bucket empty, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        self.buckets_mut().fill(Bucket::default());
    }

    /// Number of entries stored at each probe distance.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn probe_histogram(&self) -> ProbeHistogram {
        let mut counts = Vec::new();
        for bucket in self.buckets().iter().filter(|b| !b.is_empty()) {
            let distance = bucket.distance();
            if counts.len() <= distance {
                counts.resize(distance + 1, 0);
            }
            counts[distance] += 1;
        }
        ProbeHistogram { counts }
    }

    #[cfg(feature = "stats")]
    pub(crate) fn debug_stats(&self, populated: usize, entry_bytes: usize) -> DebugStats {
        let histogram = self.probe_histogram();
        let occupied_buckets = histogram.counts.iter().sum::<usize>();
        let total_distance = histogram
            .counts
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum::<usize>();

        DebugStats {
            populated,
            capacity: self.capacity(),
            bucket_count: self.bucket_count,
            occupied_buckets,
            load_factor: populated as f64 / self.bucket_count as f64,
            max_probe_distance: histogram.counts.len().saturating_sub(1),
            mean_probe_distance: if occupied_buckets == 0 {
                0.0
            } else {
                total_distance as f64 / occupied_buckets as f64
            },
            bucket_bytes: self.layout.size(),
            entry_bytes,
        }
    }

    /// Asserts the structural invariants of the table, given the mixed hash of
    /// every stored entry in value-index order.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self, hashes: &[u64]) {
        let buckets = self.buckets();
        let mut seen = alloc::vec![false; hashes.len()];

        assert!(
            !self.is_full(hashes.len()),
            "{} entries over capacity {}",
            hashes.len(),
            self.max_bucket_capacity
        );

        for (bucket_index, &bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            let value_index = bucket.value_index as usize;
            assert!(value_index < hashes.len(), "dangling index {value_index}");
            assert!(!seen[value_index], "index {value_index} stored twice");
            seen[value_index] = true;

            let hash = hashes[value_index];
            let home = self.bucket_index_from_hash(hash);
            let distance = (bucket_index + self.bucket_count - home) % self.bucket_count;
            assert_eq!(
                bucket.dist_and_fingerprint,
                dist_and_fingerprint_from_hash(hash) + DIST_INC * distance as u32,
                "bucket {bucket_index} does not encode its distance from home {home}"
            );

            let next = buckets[self.next(bucket_index)];
            if !next.is_empty() {
                assert!(
                    next.distance() <= bucket.distance() + 1,
                    "probe chain out of order after bucket {bucket_index}: {:?} then {:?}",
                    bucket,
                    next
                );
            }
        }

        assert!(seen.iter().all(|&s| s), "entries missing from the table");
    }
}

impl Clone for BucketTable {
    fn clone(&self) -> Self {
        let mut table = Self::from_layout(self.shifts, self.bucket_count, self.layout);
        table.buckets_mut().copy_from_slice(self.buckets());
        table.min_shifts = self.min_shifts;
        table
    }
}

impl Drop for BucketTable {
    fn drop(&mut self) {
        // SAFETY: `alloc` was returned by `alloc_zeroed` for `layout`.
        unsafe {
            dealloc(self.alloc.as_ptr().cast(), self.layout);
        }
    }
}

impl Debug for BucketTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;

        f.debug_struct("BucketTable")
            .field("shifts", &self.shifts)
            .field("capacity", &self.max_bucket_capacity)
            .field(
                "buckets",
                &self
                    .buckets()
                    .iter()
                    .map(|b| {
                        if b.is_empty() {
                            String::from("..........")
                        } else {
                            format!(
                                "{:02}:{:02x}->{}",
                                (b.dist_and_fingerprint >> 8) - 1,
                                b.dist_and_fingerprint & FINGERPRINT_MASK,
                                b.value_index
                            )
                        }
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Number of entries found at each probe distance from their home bucket.
///
/// Index `d` of [`counts`](Self::counts) holds how many entries sit `d`
/// buckets past their home bucket.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    counts: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Entry counts indexed by probe distance.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Pretty-prints the histogram as a horizontal bar chart.
    #[cfg(all(feature = "stats", feature = "std"))]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "probe histogram ({} entries):",
            self.counts.iter().sum::<usize>()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                7 => Some('▉'),
                _ => None,
            };
            bar.extend(partial);
            bar
        };

        for (distance, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// Bucket table statistics for debugging and tuning.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries in the map
    pub populated: usize,
    /// Number of entries accepted before the bucket table grows
    pub capacity: usize,
    /// Number of buckets allocated
    pub bucket_count: usize,
    /// Number of buckets currently holding an entry
    pub occupied_buckets: usize,
    /// Load factor (populated / bucket_count)
    pub load_factor: f64,
    /// Longest distance of any entry from its home bucket
    pub max_probe_distance: usize,
    /// Average distance of entries from their home buckets
    pub mean_probe_distance: f64,
    /// Bytes allocated for buckets
    pub bucket_bytes: usize,
    /// Bytes allocated for the dense entry store
    pub entry_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Bucket Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% of buckets)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Buckets: {}/{} occupied",
            self.occupied_buckets, self.bucket_count
        );
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_probe_distance, self.mean_probe_distance
        );
        println!(
            "Memory: {} bytes of buckets, {} bytes of entries",
            self.bucket_bytes, self.entry_bytes
        );
    }
}
