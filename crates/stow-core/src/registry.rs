//! Shared object registry.
//!
//! One registry pair lives inside each archive session. The save side maps
//! object identities to the ids handed out in first-write order; the load
//! side maps ids back to decoded objects. Neither side owns anything: the save
//! side remembers addresses of objects the caller keeps alive, the load side
//! holds only weak handles to objects the caller's `Rc`/`Arc` own.

use std::any::{type_name, Any};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::rc::{self, Rc};
use std::sync::{self, Arc};

use stow_types::ObjectId;
use tracing::{debug, trace};

use crate::error::{StowError, StowResult};

/// Address-based identity of a shared object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity(usize);

impl Identity {
    /// Identity of the object `ptr` points to. Metadata of wide pointers is
    /// ignored.
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>() as usize)
    }
}

/// Weak handle to a shared object, type-erased.
pub enum Handle {
    Local(rc::Weak<dyn Any>),
    Sync(sync::Weak<dyn Any + Send + Sync>),
}

impl Handle {
    pub fn rc<T: Any>(object: &Rc<T>) -> Self {
        let erased: Rc<dyn Any> = object.clone();
        Handle::Local(Rc::downgrade(&erased))
    }

    pub fn arc<T: Any + Send + Sync>(object: &Arc<T>) -> Self {
        let erased: Arc<dyn Any + Send + Sync> = object.clone();
        Handle::Sync(Arc::downgrade(&erased))
    }

    fn identity(&self) -> Identity {
        match self {
            Handle::Local(weak) => Identity::of(weak.as_ptr()),
            Handle::Sync(weak) => Identity::of(weak.as_ptr()),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Handle::Local(_) => "Local",
            Handle::Sync(_) => "Sync",
        };
        f.debug_tuple(kind).field(&self.identity()).finish()
    }
}

/// Save-side identity table.
#[derive(Debug, Default)]
pub struct SaveRegistry {
    ids: HashMap<Identity, (ObjectId, Handle)>,
    next_index: u32,
}

impl SaveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object about to be written.
    ///
    /// The first call for an identity returns a new id (flag clear) and the
    /// caller must write the payload right after it. Later calls return the
    /// same index with the back-reference flag set. The handle is kept for
    /// the rest of the session.
    pub fn register(&mut self, handle: Handle) -> StowResult<ObjectId> {
        let identity = handle.identity();
        if let Some((id, _)) = self.ids.get(&identity) {
            trace!(id = %id, "shared object already written");
            return Ok(id.as_back_reference());
        }
        let id = self.peek_next()?;
        self.next_index += 1;
        self.ids.insert(identity, (id, handle));
        debug!(id = %id, "registered shared object");
        Ok(id)
    }

    /// Id the next new object would receive. Nothing is reserved.
    pub fn peek_next(&self) -> StowResult<ObjectId> {
        ObjectId::new(self.next_index).map_err(|_| StowError::IdSpaceExhausted)
    }

    /// Id assigned to an identity, if any, with the flag clear.
    pub fn lookup(&self, identity: Identity) -> Option<ObjectId> {
        self.ids.get(&identity).map(|(id, _)| *id)
    }

    /// Number of distinct objects registered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next_index: u32) -> Self {
        Self {
            ids: HashMap::new(),
            next_index,
        }
    }
}

/// Load-side alias table.
#[derive(Default)]
pub struct LoadRegistry {
    slots: HashMap<u32, Handle>,
}

impl LoadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly decoded `Rc` under a new id.
    pub fn insert_rc<T: Any>(&mut self, id: ObjectId, object: &Rc<T>) -> StowResult<()> {
        self.insert(id, Handle::rc(object))
    }

    /// Record a freshly decoded `Arc` under a new id.
    pub fn insert_arc<T: Any + Send + Sync>(
        &mut self,
        id: ObjectId,
        object: &Arc<T>,
    ) -> StowResult<()> {
        self.insert(id, Handle::arc(object))
    }

    /// Resolve an id to the `Rc` decoded for it earlier in the session.
    pub fn get_rc<T: Any>(&self, id: ObjectId) -> StowResult<Rc<T>> {
        match self.slot(id)? {
            Handle::Local(weak) => weak
                .upgrade()
                .ok_or(StowError::Expired(id))?
                .downcast::<T>()
                .map_err(|_| mismatch::<T>(id)),
            Handle::Sync(_) => Err(mismatch::<Rc<T>>(id)),
        }
    }

    /// Resolve an id to the `Arc` decoded for it earlier in the session.
    pub fn get_arc<T: Any + Send + Sync>(&self, id: ObjectId) -> StowResult<Arc<T>> {
        match self.slot(id)? {
            Handle::Sync(weak) => weak
                .upgrade()
                .ok_or(StowError::Expired(id))?
                .downcast::<T>()
                .map_err(|_| mismatch::<T>(id)),
            Handle::Local(_) => Err(mismatch::<Arc<T>>(id)),
        }
    }

    /// Returns `true` if `id` was introduced in this session.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id.index())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn insert(&mut self, id: ObjectId, slot: Handle) -> StowResult<()> {
        match self.slots.entry(id.index()) {
            Entry::Occupied(_) => Err(StowError::DuplicateIdentity(id.as_new())),
            Entry::Vacant(entry) => {
                entry.insert(slot);
                debug!(id = %id, "introduced shared object");
                Ok(())
            }
        }
    }

    fn slot(&self, id: ObjectId) -> StowResult<&Handle> {
        let slot = self
            .slots
            .get(&id.index())
            .ok_or(StowError::UnregisteredIdentity(id))?;
        trace!(id = %id, "resolved back-reference");
        Ok(slot)
    }
}

fn mismatch<T>(id: ObjectId) -> StowError {
    StowError::TypeMismatch {
        id,
        expected: type_name::<T>(),
    }
}

impl fmt::Debug for LoadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRegistry")
            .field("object_count", &self.slots.len())
            .finish()
    }
}
