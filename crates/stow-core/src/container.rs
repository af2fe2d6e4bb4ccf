//! Container codec.
//!
//! Decoding reads a size tag, empties the target, reserves what it safely
//! can, then constructs and appends exactly that many elements in order.
//! Elements are built by [`Persist::load`], so no element type needs a
//! default value.
//!
//! When an element fails to load, decoding stops at once with that error.
//! Elements appended before the failure stay in the container.

use std::collections::{LinkedList, VecDeque};

use tracing::trace;

use crate::archive::{InputArchive, OutputArchive};
use crate::capability::{
    raw_load_layout, raw_save_layout, resolve_load, BinaryRead, BinaryWrite,
};
use crate::error::{StowError, StowResult};
use crate::persist::Persist;
use stow_types::SizeTag;

/// Byte budget for one raw block.
const RAW_CHUNK_BYTES: usize = 64 * 1024;

/// A container that can be emptied and appended to.
pub trait AppendContainer {
    type Item;

    fn clear(&mut self);

    fn append(&mut self, item: Self::Item);

    /// Capacity hint ahead of `additional` appends. Ignored by default.
    fn reserve(&mut self, additional: usize) {
        let _ = additional;
    }
}

impl<T> AppendContainer for Vec<T> {
    type Item = T;

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn append(&mut self, item: T) {
        self.push(item);
    }

    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional);
    }
}

impl<T> AppendContainer for VecDeque<T> {
    type Item = T;

    fn clear(&mut self) {
        VecDeque::clear(self);
    }

    fn append(&mut self, item: T) {
        self.push_back(item);
    }

    fn reserve(&mut self, additional: usize) {
        VecDeque::reserve(self, additional);
    }
}

impl<T> AppendContainer for LinkedList<T> {
    type Item = T;

    fn clear(&mut self) {
        LinkedList::clear(self);
    }

    fn append(&mut self, item: T) {
        self.push_back(item);
    }
}

/// Decode a sequence into `container`, replacing its contents.
pub fn load_into<A, C>(archive: &mut A, container: &mut C) -> StowResult<()>
where
    A: InputArchive,
    C: AppendContainer,
    C::Item: Persist,
{
    archive.start_node()?;
    let tag = archive.load_size_tag()?;
    let len = archive.config().check_size(tag)?.to_usize()?;
    trace!(
        len,
        strategy = %resolve_load::<C::Item, A>(),
        "decoding container"
    );

    container.clear();
    container.reserve(archive.config().reservation(len));
    read_elements(archive, len, |item| container.append(item))?;
    archive.finish_node()
}

/// Encode a sequence of known length: a size tag, then the elements.
pub fn save_sequence<'a, A, T, I>(archive: &mut A, len: usize, items: I) -> StowResult<()>
where
    A: OutputArchive,
    T: Persist + 'a,
    I: IntoIterator<Item = &'a T>,
{
    archive.start_node()?;
    archive.save_size_tag(SizeTag::from_len(len))?;
    write_elements(archive, items)?;
    archive.finish_node()
}

fn write_elements<'a, A, T, I>(archive: &mut A, items: I) -> StowResult<()>
where
    A: OutputArchive,
    T: Persist + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let Some(layout) = raw_save_layout::<T, A>() else {
        for item in items {
            item.save(archive)?;
        }
        return Ok(());
    };

    let chunk_bytes = (RAW_CHUNK_BYTES / layout.width).max(1) * layout.width;
    let mut block = Vec::new();
    for item in items {
        let start = block.len();
        block.resize(start + layout.width, 0);
        (layout.encode)(item, &mut block[start..]);
        if block.len() >= chunk_bytes {
            <A::Binary as BinaryWrite<A>>::write_block(archive, &block)?;
            block.clear();
        }
    }
    if !block.is_empty() {
        <A::Binary as BinaryWrite<A>>::write_block(archive, &block)?;
    }
    Ok(())
}

fn read_elements<A, T, F>(archive: &mut A, len: usize, mut sink: F) -> StowResult<()>
where
    A: InputArchive,
    T: Persist,
    F: FnMut(T),
{
    let Some(layout) = raw_load_layout::<T, A>() else {
        for _ in 0..len {
            sink(T::load(archive)?);
        }
        return Ok(());
    };

    let per_chunk = (RAW_CHUNK_BYTES / layout.width).max(1);
    let mut block = Vec::new();
    let mut remaining = len;
    while remaining > 0 {
        let batch = remaining.min(per_chunk);
        block.resize(batch * layout.width, 0);
        <A::Binary as BinaryRead<A>>::read_block(archive, &mut block)?;
        for bytes in block.chunks_exact(layout.width) {
            sink((layout.decode)(bytes));
        }
        remaining -= batch;
    }
    Ok(())
}

impl<T: Persist> Persist for Vec<T> {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_sequence(archive, self.len(), self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        let mut items = Vec::new();
        load_into(archive, &mut items)?;
        Ok(items)
    }
}

impl<T: Persist> Persist for VecDeque<T> {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_sequence(archive, self.len(), self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        let mut items = VecDeque::new();
        load_into(archive, &mut items)?;
        Ok(items)
    }
}

impl<T: Persist> Persist for LinkedList<T> {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        save_sequence(archive, self.len(), self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        let mut items = LinkedList::new();
        load_into(archive, &mut items)?;
        Ok(items)
    }
}

// Fixed arrays carry no size tag; the length is part of the type.
impl<T: Persist, const N: usize> Persist for [T; N] {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.start_node()?;
        write_elements(archive, self)?;
        archive.finish_node()
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        let mut items = Vec::with_capacity(N);
        read_elements(archive, N, |item| items.push(item))?;
        archive.finish_node()?;
        <[T; N]>::try_from(items)
            .map_err(|items| StowError::InvalidData(format!("expected {N} elements, got {}", items.len())))
    }
}
