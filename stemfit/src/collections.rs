//! Internal "small" style collection type.

use crate::Error;

/// A growable vector type with inline storage optimization.
///
/// Note that unlike the real `SmallVec`, this only works with types that
/// are `Copy + Default` to simplify our implementation.
///
/// Growth is fallible: once the inline buffer is exhausted, the contents are
/// copied to the heap a single time and further growth is by a quarter of the
/// current capacity (plus a small constant), reporting allocation failure
/// instead of aborting.
#[derive(Clone)]
pub struct SmallVec<T, const N: usize>(Storage<T, N>);

impl<T, const N: usize> SmallVec<T, N>
where
    T: Copy + Default,
{
    /// Creates a new, empty `SmallVec<T>`.
    pub fn new() -> Self {
        Self(Storage::Inline([T::default(); N], 0))
    }

    /// Clears the vector, removing all values.
    ///
    /// Heap storage, if any, is retained for reuse.
    pub fn clear(&mut self) {
        match &mut self.0 {
            Storage::Inline(_buf, len) => *len = 0,
            Storage::Heap(vec) => vec.clear(),
        }
    }

    /// Returns true if the values are stored inline.
    pub fn is_inline(&self) -> bool {
        matches!(self.0, Storage::Inline(..))
    }

    /// Returns the number of elements the vector can hold without
    /// growing.
    pub fn capacity(&self) -> usize {
        match &self.0 {
            Storage::Inline(..) => N,
            Storage::Heap(vec) => vec.capacity(),
        }
    }

    /// Tries to reserve capacity for at least `additional` more elements.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        match &mut self.0 {
            Storage::Inline(buf, len) => {
                let new_cap = *len + additional;
                if new_cap > N {
                    let mut vec = Vec::new();
                    vec.try_reserve_exact(new_cap)
                        .map_err(|_| Error::OutOfMemory)?;
                    vec.extend_from_slice(&buf[..*len]);
                    self.0 = Storage::Heap(vec);
                }
            }
            Storage::Heap(vec) => {
                vec.try_reserve(additional)
                    .map_err(|_| Error::OutOfMemory)?;
            }
        }
        Ok(())
    }

    /// Appends an element to the back of the collection, growing the
    /// storage if necessary.
    pub fn try_push(&mut self, value: T) -> Result<(), Error> {
        match &mut self.0 {
            Storage::Inline(buf, len) => {
                if *len < N {
                    buf[*len] = value;
                    *len += 1;
                    return Ok(());
                }
                let mut vec = Vec::new();
                vec.try_reserve_exact(grown_capacity(N))
                    .map_err(|_| Error::OutOfMemory)?;
                vec.extend_from_slice(&buf[..*len]);
                vec.push(value);
                self.0 = Storage::Heap(vec);
            }
            Storage::Heap(vec) => {
                if vec.len() == vec.capacity() {
                    let additional = grown_capacity(vec.len()) - vec.len();
                    vec.try_reserve_exact(additional)
                        .map_err(|_| Error::OutOfMemory)?;
                }
                vec.push(value);
            }
        }
        Ok(())
    }

    /// Removes and returns the value at the back of the collection.
    pub fn pop(&mut self) -> Option<T> {
        match &mut self.0 {
            Storage::Inline(buf, len) => {
                if *len > 0 {
                    *len -= 1;
                    Some(buf[*len])
                } else {
                    None
                }
            }
            Storage::Heap(vec) => vec.pop(),
        }
    }
}

impl<T, const N: usize> SmallVec<T, N> {
    /// Extracts a slice containing the entire vector.
    pub fn as_slice(&self) -> &[T] {
        match &self.0 {
            Storage::Inline(buf, len) => &buf[..*len],
            Storage::Heap(vec) => vec.as_slice(),
        }
    }

    /// Extracts a mutable slice containing the entire vector.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.0 {
            Storage::Inline(buf, len) => &mut buf[..*len],
            Storage::Heap(vec) => vec.as_mut_slice(),
        }
    }
}

/// Capacity after growing from `cap`: 1.25x plus a small constant.
fn grown_capacity(cap: usize) -> usize {
    cap.saturating_add((cap >> 2) + 4)
}

impl<T, const N: usize> Default for SmallVec<T, N>
where
    T: Copy + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> core::ops::Deref for SmallVec<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, const N: usize> core::ops::DerefMut for SmallVec<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> PartialEq for SmallVec<T, N>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, const N: usize> Eq for SmallVec<T, N> where T: Eq {}

impl<T, const N: usize> core::fmt::Debug for SmallVec<T, N>
where
    T: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a SmallVec<T, N> {
    type IntoIter = core::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a mut SmallVec<T, N> {
    type IntoIter = core::slice::IterMut<'a, T>;
    type Item = &'a mut T;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

#[derive(Clone)]
enum Storage<T, const N: usize> {
    Inline([T; N], usize),
    Heap(Vec<T>),
}
