//! Non-owning references between the records of one event.
//!
//! Every record lives in a typed [`Arena`]. A [`Ref`] names a record by the arena it was
//! allocated in, its slot index, and the generation stamped on the slot at allocation time.
//! Generations are drawn from a per-arena counter which is never reset, so a handle to a
//! removed record, or to any record of an event which has already been torn down, can never
//! resolve into whatever now occupies its old slot. Dereferencing such a handle fails with
//! [`TesseraError::NotFound`].
//!
//! Store identifiers are offset by a random per-process salt, so a handle decoded from bytes
//! written by another process never matches an arena of this one.
//!
//! References never own their target: dropping or clearing a [`Ref`] or a [`RefList`] does
//! nothing to the referent, and removing the referent leaves the references dangling (and
//! detectably so).
use std::{
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    utils::{enums::RecordKind, process_salt},
    TesseraError, TesseraResult,
};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier for one [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        Self(process_salt().wrapping_add(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)))
    }
}

impl Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store#{:016x}", self.0)
    }
}

/// A weak, typed handle to a record of type `T` held in an [`Arena<T>`].
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Ref<T> {
    store: StoreId,
    index: u32,
    generation: u64,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    /// The arena this handle was allocated in.
    pub fn store(&self) -> StoreId {
        self.store
    }
    /// The slot index within the arena.
    pub fn index(&self) -> u32 {
        self.index
    }
    /// The generation stamped on the slot when the record was allocated.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Ref<T> {}
impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
            && self.index == other.index
            && self.generation == other.generation
    }
}
impl<T> Eq for Ref<T> {}
impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store.hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}
impl<T> Debug for Ref<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ref({}, {}@{})", self.store, self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    position: u32,
    value: Option<T>,
}

/// A typed, per-event store of records which hands out [`Ref`]s.
///
/// An [`Arena`] owns every record inserted into it. Records are released one at a time with
/// [`Arena::remove`] or all at once with [`Arena::clear`] at the event boundary.
#[derive(Debug)]
pub struct Arena<T> {
    id: StoreId,
    kind: RecordKind,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    // (slot, generation) of every insertion since the last clear
    positions: Vec<(u32, u64)>,
    len: usize,
    next_generation: u64,
}

impl<T> Arena<T> {
    /// Create an empty arena holding records of the given kind.
    pub fn new(kind: RecordKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    /// Create an empty arena with room for `capacity` records before reallocating.
    pub fn with_capacity(kind: RecordKind, capacity: usize) -> Self {
        Self {
            id: StoreId::next(),
            kind,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            positions: Vec::new(),
            len: 0,
            next_generation: 0,
        }
    }

    /// The identifier of this arena.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The kind of record held by this arena.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move a record into the arena and return a handle to it.
    pub fn insert(&mut self, value: T) -> Ref<T> {
        let generation = self.next_generation;
        self.next_generation += 1;
        let position = self.positions.len() as u32;
        let index = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = generation;
            slot.position = position;
            slot.value = Some(value);
            index
        } else {
            self.slots.push(Slot {
                generation,
                position,
                value: Some(value),
            });
            (self.slots.len() - 1) as u32
        };
        self.positions.push((index, generation));
        self.len += 1;
        Ref {
            store: self.id,
            index,
            generation,
            _marker: PhantomData,
        }
    }

    fn not_found(&self, handle: Ref<T>) -> TesseraError {
        TesseraError::NotFound {
            kind: self.kind,
            index: handle.index,
            generation: handle.generation,
        }
    }

    fn slot_index(&self, handle: Ref<T>) -> Option<usize> {
        if handle.store != self.id {
            return None;
        }
        let index = handle.index as usize;
        match self.slots.get(index) {
            Some(slot) if slot.generation == handle.generation && slot.value.is_some() => {
                Some(index)
            }
            _ => None,
        }
    }

    /// The handle of the record inserted at `position` since the arena was last cleared, if it
    /// is still live.
    ///
    /// Positions count insertions and are never handed out twice within an event, so a
    /// position whose record was removed stays dangling even after its slot is reused. Without
    /// removals the position of a record equals its slot index.
    pub fn handle_at(&self, position: u32) -> Option<Ref<T>> {
        let &(index, generation) = self.positions.get(position as usize)?;
        let handle = Ref {
            store: self.id,
            index,
            generation,
            _marker: PhantomData,
        };
        self.contains(handle).then_some(handle)
    }

    /// The insertion position of a live record, the inverse of [`Arena::handle_at`].
    pub fn position(&self, handle: Ref<T>) -> Option<u32> {
        self.slot_index(handle).map(|index| self.slots[index].position)
    }

    /// Returns `true` if `handle` still resolves to a live record in this arena.
    pub fn contains(&self, handle: Ref<T>) -> bool {
        self.slot_index(handle).is_some()
    }

    /// Resolve a handle to its record.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`] if the record has been removed, the arena has been
    /// cleared since the handle was issued, or the handle belongs to another arena.
    pub fn get(&self, handle: Ref<T>) -> TesseraResult<&T> {
        self.slot_index(handle)
            .and_then(|index| self.slots[index].value.as_ref())
            .ok_or_else(|| self.not_found(handle))
    }

    /// Resolve a handle to a mutable reference to its record.
    ///
    /// # Errors
    ///
    /// See [`Arena::get`].
    pub fn get_mut(&mut self, handle: Ref<T>) -> TesseraResult<&mut T> {
        let err = self.not_found(handle);
        match self.slot_index(handle) {
            Some(index) => self.slots[index].value.as_mut().ok_or(err),
            None => Err(err),
        }
    }

    /// Release a single record, returning it. Every outstanding handle to it stops resolving.
    ///
    /// # Errors
    ///
    /// See [`Arena::get`].
    pub fn remove(&mut self, handle: Ref<T>) -> TesseraResult<T> {
        let index = self
            .slot_index(handle)
            .ok_or_else(|| self.not_found(handle))?;
        let value = self.slots[index]
            .value
            .take()
            .ok_or_else(|| self.not_found(handle))?;
        self.free.push(handle.index);
        self.len -= 1;
        trace!(kind = %self.kind, index = handle.index, "released record");
        Ok(value)
    }

    /// Release every record at once. Handles issued before the call never resolve again.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.positions.clear();
        self.len = 0;
    }

    /// Iterate over the live records together with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Ref<T>, &T)> + '_ {
        let store = self.id;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Ref {
                        store,
                        index: index as u32,
                        generation: slot.generation,
                        _marker: PhantomData,
                    },
                    value,
                )
            })
        })
    }

    /// Iterate over the live records in slot order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    /// Handles to every live record, in slot order.
    pub fn refs(&self) -> Vec<Ref<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

/// An ordered list of weak references. Duplicates are permitted.
///
/// Whether the order carries meaning depends on the field: it does for constituent-style
/// relations and does not for truth-matching relations.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RefList<T>(Vec<Ref<T>>);

impl<T> Default for RefList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}
impl<T> Clone for RefList<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl<T> PartialEq for RefList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Debug for RefList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T> RefList<T> {
    /// Append a reference to the end of the list. Uniqueness is not enforced.
    pub fn push(&mut self, target: Ref<T>) {
        self.0.push(target);
    }
    /// The number of references, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// Returns `true` if the list holds no references.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// The reference at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Ref<T>> {
        self.0.get(index).copied()
    }
    /// The references as a slice, in insertion order.
    pub fn as_slice(&self) -> &[Ref<T>] {
        &self.0
    }
    /// Iterate over the references in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Ref<T>> + '_ {
        self.0.iter().copied()
    }
    /// Drop every reference. The referents are unaffected.
    pub fn clear(&mut self) {
        self.0.clear();
    }
    /// Dereference every entry against `arena`, in list order.
    pub fn resolve<'a>(
        &'a self,
        arena: &'a Arena<T>,
    ) -> impl Iterator<Item = TesseraResult<&'a T>> + 'a {
        self.0.iter().map(move |handle| arena.get(*handle))
    }
}

impl<T> FromIterator<Ref<T>> for RefList<T> {
    fn from_iter<I: IntoIterator<Item = Ref<T>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> Extend<Ref<T>> for RefList<T> {
    fn extend<I: IntoIterator<Item = Ref<T>>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}
