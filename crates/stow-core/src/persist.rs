use stow_types::StrategyChoice;

use crate::archive::{InputArchive, OutputArchive};
use crate::capability::RawLayout;
use crate::error::{StowError, StowResult};
use crate::named::{load_nvp, save_nvp};

/// A value that can be written to and constructed from any archive.
///
/// `load` is the constructing hook: it produces a complete value straight
/// from the archive, so no `Default` bound is ever needed to decode.
///
/// The associated constants describe the type to the capability resolver;
/// most implementations keep the defaults.
pub trait Persist: Sized {
    /// What the type declares itself to be. Arithmetic and composite types
    /// keep `ElementWise`; the resolver upgrades arithmetic types to
    /// `RawBytes` for archives with binary support.
    const STRATEGY: StrategyChoice = StrategyChoice::ElementWise;

    /// Byte layout, for trivially copyable arithmetic types only.
    const RAW: Option<RawLayout<Self>> = None;

    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()>;

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self>;
}

macro_rules! persist_arithmetic {
    ($($ty:ty => $save:ident, $load:ident;)*) => {$(
        impl Persist for $ty {
            const RAW: Option<RawLayout<Self>> = Some(RawLayout::new(
                |value: &$ty, out: &mut [u8]| out.copy_from_slice(&value.to_le_bytes()),
                |bytes: &[u8]| -> $ty {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                },
            ));

            fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
                archive.$save(*self)
            }

            fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
                archive.$load()
            }
        }
    )*};
}

persist_arithmetic! {
    u8 => save_u8, load_u8;
    u16 => save_u16, load_u16;
    u32 => save_u32, load_u32;
    u64 => save_u64, load_u64;
    i8 => save_i8, load_i8;
    i16 => save_i16, load_i16;
    i32 => save_i32, load_i32;
    i64 => save_i64, load_i64;
    f32 => save_f32, load_f32;
    f64 => save_f64, load_f64;
}

impl Persist for bool {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.save_bool(*self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.load_bool()
    }
}

impl Persist for char {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.save_u32(u32::from(*self))
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        let code = archive.load_u32()?;
        char::from_u32(code)
            .ok_or_else(|| StowError::InvalidData(format!("{code:#x} is not a char")))
    }
}

impl Persist for String {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.save_str(self)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.load_string()
    }
}

impl Persist for () {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.start_node()?;
        archive.finish_node()
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        archive.finish_node()
    }
}

// Adapter: classified as whatever it wraps.
impl<T: Persist> Persist for Box<T> {
    const STRATEGY: StrategyChoice = T::STRATEGY;

    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        (**self).save(archive)
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        T::load(archive).map(Box::new)
    }
}

impl<T: Persist> Persist for Option<T> {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.start_node()?;
        save_nvp(archive, "has_value", &self.is_some())?;
        if let Some(value) = self {
            save_nvp(archive, "value", value)?;
        }
        archive.finish_node()
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        let value = if load_nvp::<A, bool>(archive, "has_value")? {
            Some(load_nvp(archive, "value")?)
        } else {
            None
        };
        archive.finish_node()?;
        Ok(value)
    }
}
