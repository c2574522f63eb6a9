//! Ordered key vectors.
//!
//! A key vector is the driver's addressing scheme: the same list of
//! `(key, value)` pairs always selects the same graph, calibration set or
//! topology variant. Order is significant for matching, so [`KeyVector`]
//! preserves insertion order and never sorts.

/// A single `(key, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyValuePair {
    /// Key identifier.
    pub key: u32,
    /// Value for this key.
    pub value: u32,
}

impl KeyValuePair {
    /// Create a pair.
    #[inline]
    pub const fn new(key: u32, value: u32) -> Self {
        Self { key, value }
    }
}

impl core::fmt::Display for KeyValuePair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}={:#x}", self.key, self.value)
    }
}

/// An ordered sequence of [`KeyValuePair`]s.
///
/// # Example
///
/// ```rust
/// use offload_core::{KeyVector, KeyValuePair};
///
/// let mut kv = KeyVector::new();
/// kv.push(0xA1, 1);
/// kv.push_unique(KeyValuePair::new(0xA2, 7));
/// kv.push_unique(KeyValuePair::new(0xA2, 7)); // ignored
///
/// assert_eq!(kv.len(), 2);
/// assert_eq!(kv.value_of(0xA2), Some(7));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyVector {
    pairs: Vec<KeyValuePair>,
}

impl KeyVector {
    /// Create an empty key vector.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a pair built from `key` and `value`.
    pub fn push(&mut self, key: u32, value: u32) {
        self.pairs.push(KeyValuePair::new(key, value));
    }

    /// Append `pair` unless an identical pair is already present.
    ///
    /// Returns true if the pair was appended.
    pub fn push_unique(&mut self, pair: KeyValuePair) -> bool {
        if self.pairs.contains(&pair) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Value of the first pair with `key`, if any.
    pub fn value_of(&self, key: u32) -> Option<u32> {
        self.pairs.iter().find(|p| p.key == key).map(|p| p.value)
    }

    /// Replace the contents with `pairs`, keeping the allocation.
    pub fn reset_to(&mut self, pairs: impl IntoIterator<Item = KeyValuePair>) {
        self.pairs.clear();
        self.pairs.extend(pairs);
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true when the vector holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The pairs in insertion order.
    pub fn pairs(&self) -> &[KeyValuePair] {
        &self.pairs
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, KeyValuePair> {
        self.pairs.iter()
    }
}

impl FromIterator<KeyValuePair> for KeyVector {
    fn from_iter<I: IntoIterator<Item = KeyValuePair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<(u32, u32)>> for KeyVector {
    fn from(pairs: Vec<(u32, u32)>) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| KeyValuePair::new(k, v))
            .collect()
    }
}

impl<'a> IntoIterator for &'a KeyVector {
    type Item = &'a KeyValuePair;
    type IntoIter = core::slice::Iter<'a, KeyValuePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl core::fmt::Display for KeyVector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("[")?;
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{pair}")?;
        }
        f.write_str("]")
    }
}
