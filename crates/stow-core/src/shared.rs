//! Owning and non-owning references.
//!
//! `Rc`/`Arc` own their target: the first one written introduces the object
//! (`{ id, data }`), later ones write only the flagged id. `Weak` never owns
//! and can never introduce an object; it writes `{ id }` for an object an
//! owning reference already introduced, and fails otherwise.

use std::any::Any;
use std::rc::{self, Rc};
use std::sync::{self, Arc};

use stow_types::{ObjectId, StrategyChoice};

use crate::archive::{InputArchive, OutputArchive};
use crate::error::{StowError, StowResult, Violation};
use crate::named::{load_nvp, save_nvp, DATA_KEY, ID_KEY};
use crate::persist::Persist;
use crate::registry::{Handle, Identity};

fn save_owner<A, T>(archive: &mut A, handle: Handle, value: &T) -> StowResult<()>
where
    A: OutputArchive,
    T: Persist,
{
    let id = archive.registry().register(handle)?;
    archive.start_node()?;
    save_nvp(archive, ID_KEY, &id.to_wire())?;
    if id.is_new() {
        save_nvp(archive, DATA_KEY, value)?;
    }
    archive.finish_node()
}

fn save_non_owning<A>(archive: &mut A, identity: Identity, alive: bool) -> StowResult<()>
where
    A: OutputArchive,
{
    if !alive {
        return Err(StowError::DanglingReference);
    }
    // A rejected save leaves the registry untouched.
    let Some(id) = archive.registry().lookup(identity) else {
        return Err(StowError::ProtocolViolation {
            id: archive.registry().peek_next()?,
            kind: Violation::RawSavedBeforeOwner,
        });
    };
    let id = id.as_back_reference();
    archive.start_node()?;
    save_nvp(archive, ID_KEY, &id.to_wire())?;
    archive.finish_node()
}

fn load_id<A: InputArchive>(archive: &mut A) -> StowResult<ObjectId> {
    load_nvp::<A, u32>(archive, ID_KEY).map(ObjectId::from_wire)
}

fn load_non_owning_id<A: InputArchive>(archive: &mut A) -> StowResult<ObjectId> {
    archive.start_node()?;
    let id = load_id(archive)?;
    archive.finish_node()?;
    if id.is_new() {
        return Err(StowError::ProtocolViolation {
            id,
            kind: Violation::RawLoadedBeforeOwner,
        });
    }
    Ok(id)
}

impl<T: Persist + Any> Persist for Rc<T> {
    const STRATEGY: StrategyChoice = StrategyChoice::SharedReference;

    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_owner(archive, Handle::rc(self), &**self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        let id = load_id(archive)?;
        let object = if id.is_back_reference() {
            archive.registry().get_rc::<T>(id)?
        } else {
            let object = Rc::new(load_nvp::<A, T>(archive, DATA_KEY)?);
            archive.registry().insert_rc(id, &object)?;
            object
        };
        archive.finish_node()?;
        Ok(object)
    }
}

impl<T: Persist + Any + Send + Sync> Persist for Arc<T> {
    const STRATEGY: StrategyChoice = StrategyChoice::SharedReference;

    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_owner(archive, Handle::arc(self), &**self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        let id = load_id(archive)?;
        let object = if id.is_back_reference() {
            archive.registry().get_arc::<T>(id)?
        } else {
            let object = Arc::new(load_nvp::<A, T>(archive, DATA_KEY)?);
            archive.registry().insert_arc(id, &object)?;
            object
        };
        archive.finish_node()?;
        Ok(object)
    }
}

impl<T: Persist + Any> Persist for rc::Weak<T> {
    const STRATEGY: StrategyChoice = StrategyChoice::SharedReference;

    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_non_owning(archive, Identity::of(self.as_ptr()), self.strong_count() > 0)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        let id = load_non_owning_id(archive)?;
        let target = archive.registry().get_rc::<T>(id)?;
        Ok(Rc::downgrade(&target))
    }
}

impl<T: Persist + Any + Send + Sync> Persist for sync::Weak<T> {
    const STRATEGY: StrategyChoice = StrategyChoice::SharedReference;

    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_non_owning(archive, Identity::of(self.as_ptr()), self.strong_count() > 0)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        let id = load_non_owning_id(archive)?;
        let target = archive.registry().get_arc::<T>(id)?;
        Ok(Arc::downgrade(&target))
    }
}
