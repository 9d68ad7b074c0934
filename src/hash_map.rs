use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

#[cfg(feature = "stats")]
use crate::bucket_table::DebugStats;
#[cfg(feature = "stats")]
use crate::bucket_table::ProbeHistogram;
use crate::bucket_table::BucketTable;
use crate::bucket_table::MAX_LOAD_FACTOR;
use crate::bucket_table::MAX_SIZE;
use crate::bucket_table::Probe;
use crate::bucket_table::Slot;
use crate::bucket_table::shifts_for_size;
use crate::error::Error;
use crate::hash::MixState;
use crate::hash::avalanche;

/// A hash map using Robin Hood open addressing over a dense, insertion-ordered
/// entry store.
///
/// Entries live in a contiguous `Vec<(K, V)>` in the order they were first
/// inserted. A separate bucket table of packed 8-byte buckets maps hashes to
/// positions in that store, so iteration is a plain slice walk and lookups
/// touch the entries only to confirm a fingerprint match.
///
/// Entries cannot be removed individually; [`clear`](Self::clear) empties the
/// whole map. An entry's index therefore never changes once inserted.
///
/// # Performance Characteristics
///
/// - **Memory**: 8 bytes per bucket (at most 80% of buckets are occupied),
///   plus the size of `(K, V)` per entry
/// - **Lookup**: at most one key comparison per matching 8-bit fingerprint
/// - **Growth**: doubles the bucket table and re-places every entry from the
///   entry store; the entries themselves never move for a rehash
pub struct HashMap<K, V, S = MixState> {
    entries: Vec<(K, V)>,
    table: BucketTable,
    hash_builder: S,
}

#[inline]
fn make_hash<Q, S>(hash_builder: &S, key: &Q) -> u64
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    avalanche(hash_builder.hash_one(key))
}

#[cold]
#[track_caller]
fn capacity_overflow(err: Error) -> ! {
    panic!("{err}")
}

impl<K, V> HashMap<K, V, MixState> {
    /// Creates an empty map using the default [`MixState`] hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let map: HashMap<u64, &str> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.bucket_count(), 4);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(MixState)
    }
}

impl<K, V> HashMap<K, V, MixState>
where
    K: Hash + Eq,
{
    /// Creates an empty map able to hold at least `capacity` entries before
    /// the bucket table grows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let map: HashMap<u64, u64> = HashMap::with_capacity(1000);
    /// assert!(map.capacity() >= 1000);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, MixState)
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use robin_dense::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            entries: Vec::new(),
            table: BucketTable::new(),
            hash_builder,
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries the map holds before the bucket table
    /// has to grow.
    ///
    /// This is 80% of [`bucket_count`](Self::bucket_count), except for a
    /// table of the largest size, which may fill completely.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets in the bucket table. Always a power of
    /// two.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the load factor at which the bucket table grows.
    pub fn max_load_factor(&self) -> f32 {
        MAX_LOAD_FACTOR
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes every entry, keeping both allocations for reuse.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// for i in 0..100u32 {
    ///     map.insert(i, i);
    /// }
    /// let buckets = map.bucket_count();
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.get(&7), None);
    /// assert_eq!(map.bucket_count(), buckets);
    /// ```
    pub fn clear(&mut self) {
        self.entries.clear();
        self.table.clear();
    }

    /// Returns the entries as a slice, in insertion order.
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.entries
    }

    /// Returns the entry at `index` in insertion order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(k, v)| (k, v))
    }

    /// Returns the entry at `index` in insertion order, with a mutable
    /// reference to its value.
    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        self.entries.get_mut(index).map(|(k, v)| (&*k, v))
    }

    /// An iterator visiting all key-value pairs in insertion order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("c", 3);
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// let pairs: Vec<_> = map.iter().collect();
    /// assert_eq!(pairs, [(&"c", &3), (&"a", &1), (&"b", &2)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// An iterator visiting all key-value pairs in insertion order, with
    /// mutable references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.entries.iter_mut(),
        }
    }

    /// An iterator visiting all keys in insertion order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in insertion order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// An iterator visiting all values mutably in insertion order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Consumes the map, yielding its keys in insertion order.
    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    /// Consumes the map, yielding its values in insertion order.
    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues {
            inner: self.into_iter(),
        }
    }

    /// Returns the number of entries at each probe distance from their home
    /// bucket.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        self.table.probe_histogram()
    }

    /// Returns statistics about the bucket table and entry store.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        self.table.debug_stats(
            self.entries.len(),
            self.entries.capacity() * core::mem::size_of::<(K, V)>(),
        )
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with room for at least `capacity` entries, using
    /// the given hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use robin_dense::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut map = Self::with_hasher(hash_builder);
        map.reserve(capacity);
        map
    }

    /// Inserts `key` with `value` unless an equal key is already present.
    ///
    /// Returns the index of the entry for `key` and whether it was newly
    /// inserted. When the key already exists, the stored value is kept and
    /// `key` and `value` are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the map already indexes the maximum number of entries. See
    /// [`try_insert`](Self::try_insert) for a fallible version.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(5, "a"), (0, true));
    /// assert_eq!(map.insert(5, "b"), (0, false));
    /// assert_eq!(map.get(&5), Some(&"a"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (usize, bool) {
        self.try_insert(key, value)
            .unwrap_or_else(|err| capacity_overflow(err))
    }

    /// Fallible version of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] when the bucket table is already at
    /// its largest size and cannot take another entry. The map is left
    /// exactly as it was.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(usize, bool), Error> {
        let hash = make_hash(&self.hash_builder, &key);
        let entries = &self.entries;
        match self.table.probe(hash, |i| entries[i as usize].0 == key) {
            Probe::Occupied(index) => Ok((index as usize, false)),
            Probe::Vacant(slot) => {
                self.entries.push((key, value));
                self.place_last(slot)?;
                Ok((self.entries.len() - 1, true))
            }
        }
    }

    /// Inserts `key` with `value`, replacing and returning the value of an
    /// existing entry with an equal key. The entry keeps its original key and
    /// position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert_or_assign(5, "a"), None);
    /// assert_eq!(map.insert_or_assign(5, "b"), Some("a"));
    /// assert_eq!(map.get(&5), Some(&"b"));
    /// ```
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// The entry store is not touched until a vacant entry is filled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// for word in ["a", "b", "a", "c", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get("a"), Some(&3));
    /// assert_eq!(counts.get("b"), Some(&1));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S> {
        let hash = make_hash(&self.hash_builder, &key);
        let entries = &self.entries;
        match self.table.probe(hash, |i| entries[i as usize].0 == key) {
            Probe::Occupied(index) => Entry::Occupied(OccupiedEntry {
                map: self,
                index: index as usize,
            }),
            Probe::Vacant(slot) => Entry::Vacant(VacantEntry {
                map: self,
                key,
                slot,
            }),
        }
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map: HashMap<&str, Vec<u32>> = HashMap::new();
    /// map.get_or_insert_default("evens").push(2);
    /// map.get_or_insert_default("evens").push(4);
    /// assert_eq!(map.get("evens"), Some(&vec![2, 4]));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Looks up `key`, returning the stored key and value.
    pub fn find<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).map(|index| {
            let (k, v) = &self.entries[index];
            (k, v)
        })
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(String::from("one"), 1);
    /// assert_eq!(map.get("one"), Some(&1));
    /// assert_eq!(map.get("two"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).map(|index| &self.entries[index].1)
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).map(|index| &mut self.entries[index].1)
    }

    /// Returns the stored key and the value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key)
    }

    /// Returns the insertion index of the entry for `key`.
    pub fn get_index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key)
    }

    /// Returns `true` if the map contains an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Returns the value for `key`, or [`Error::KeyNotFound`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::Error;
    /// use robin_dense::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "one");
    /// assert_eq!(map.at(&1), Ok(&"one"));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value for `key`, or
    /// [`Error::KeyNotFound`].
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Ensures the map can hold at least `capacity` entries in total without
    /// growing the bucket table.
    ///
    /// `capacity` is an absolute count, not additional room. The bucket table
    /// never shrinks. Requests above the indexable maximum are clamped to it.
    ///
    /// # Panics
    ///
    /// Panics if the memory cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = HashMap::new();
    /// map.reserve(1000);
    /// let buckets = map.bucket_count();
    /// assert!(map.capacity() >= 1000);
    ///
    /// for i in 0..1000 {
    ///     map.insert(i, i);
    /// }
    /// assert_eq!(map.bucket_count(), buckets);
    /// ```
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            capacity_overflow(err);
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the entry store or bucket table
    /// cannot be sized for `capacity`. The map is left unchanged.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), Error> {
        let target = (capacity as u64).min(MAX_SIZE).max(self.entries.len() as u64);
        let additional = usize::try_from(target).map_err(|_| Error::CapacityExceeded)?
            - self.entries.len();

        self.entries
            .try_reserve(additional)
            .map_err(|_| Error::CapacityExceeded)?;

        let shifts = shifts_for_size(target);
        if shifts < self.table.shifts() {
            self.rebuild(shifts)?;
            tracing::debug!(
                capacity = target,
                bucket_count = self.table.bucket_count(),
                "reserved bucket table"
            );
        }
        Ok(())
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.entries.is_empty() {
            return None;
        }

        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find(hash, |i| {
                <K as Borrow<Q>>::borrow(&self.entries[i as usize].0) == key
            })
            .map(|index| index as usize)
    }

    /// Indexes the entry just pushed onto the entry store at `slot`, growing
    /// the bucket table instead when it is full. On error the entry is popped
    /// again.
    fn place_last(&mut self, slot: Slot) -> Result<(), Error> {
        let placed = match u32::try_from(self.entries.len() - 1) {
            Ok(_) if self.table.is_full(self.entries.len()) => self.grow(),
            Ok(value_index) => {
                self.table.insert_at(slot, value_index);
                Ok(())
            }
            Err(_) => Err(Error::CapacityExceeded),
        };

        if let Err(err) = placed {
            self.entries.pop();
            tracing::warn!(len = self.entries.len(), "{err}");
        }
        placed
    }

    /// Doubles the bucket table and indexes every entry, including the one
    /// just pushed.
    fn grow(&mut self) -> Result<(), Error> {
        let shifts = self.table.grown_shifts()?;
        self.rebuild(shifts)?;
        tracing::debug!(
            len = self.entries.len(),
            bucket_count = self.table.bucket_count(),
            "grew bucket table"
        );
        Ok(())
    }

    fn rebuild(&mut self, shifts: u8) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table.rebuild(
            shifts,
            self.entries.iter().map(|(k, _)| make_hash(hash_builder, k)),
        )
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            table: if self.entries.is_empty() {
                BucketTable::new()
            } else {
                self.table.clone()
            },
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts every pair; for keys already present the stored value is kept.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(self.len().saturating_add(iter.size_hint().0));
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for HashMap<K, V, S>
where
    K: Hash + Eq + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashMap<K, V>
where
    K: Hash + Eq,
{
    /// # Examples
    ///
    /// ```rust
    /// use robin_dense::HashMap;
    ///
    /// let map = HashMap::from([(1, "one"), (2, "two"), (1, "uno")]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// ```
    fn from(pairs: [(K, V); N]) -> Self {
        let mut map = Self::with_capacity(N);
        map.extend(pairs);
        map
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry of a [`HashMap`], which is either vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V, S = MixState> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, S>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, S>),
}

impl<'a, K, V, S> Entry<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference to the value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

impl<'a, K, V, S> Entry<'a, K, V, S> {
    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

/// A view into a vacant entry in a [`HashMap`].
pub struct VacantEntry<'a, K, V, S = MixState> {
    map: &'a mut HashMap<K, V, S>,
    key: K,
    slot: Slot,
}

impl<'a, K, V, S> VacantEntry<'a, K, V, S> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<'a, K, V, S> VacantEntry<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Appends the entry to the map and returns a mutable reference to its
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if the map already indexes the maximum number of entries.
    pub fn insert(self, value: V) -> &'a mut V {
        self.try_insert(value)
            .unwrap_or_else(|err| capacity_overflow(err))
    }

    /// Fallible version of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] when the bucket table cannot grow
    /// any further. The map is left unchanged.
    pub fn try_insert(self, value: V) -> Result<&'a mut V, Error> {
        let map = self.map;
        let index = map.entries.len();
        map.entries.push((self.key, value));
        map.place_last(self.slot)?;
        Ok(&mut map.entries[index].1)
    }
}

/// A view into an occupied entry in a [`HashMap`].
pub struct OccupiedEntry<'a, K, V, S = MixState> {
    map: &'a mut HashMap<K, V, S>,
    index: usize,
}

impl<'a, K, V, S> OccupiedEntry<'a, K, V, S> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.map.entries[self.index].0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.map.entries[self.index].1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.map.entries[self.index].1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.map.entries[self.index].1
    }

    /// Replaces the value in the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Returns the insertion index of the entry.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// An iterator over the key-value pairs of a [`HashMap`], in insertion order.
#[derive(Clone)]
pub struct Iter<'a, K, V> {
    inner: core::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the key-value pairs of a [`HashMap`], in insertion
/// order.
pub struct IterMut<'a, K, V> {
    inner: core::slice::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`HashMap`].
#[derive(Clone)]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`HashMap`].
#[derive(Clone)]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a [`HashMap`].
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the entries of a [`HashMap`], in insertion order.
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// An owning iterator over the keys of a [`HashMap`].
pub struct IntoKeys<K, V> {
    inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoKeys<K, V> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoKeys<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for IntoKeys<K, V> {}
impl<K, V> FusedIterator for IntoKeys<K, V> {}

/// An owning iterator over the values of a [`HashMap`].
pub struct IntoValues<K, V> {
    inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoValues<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoValues<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for IntoValues<K, V> {}
impl<K, V> FusedIterator for IntoValues<K, V> {}
