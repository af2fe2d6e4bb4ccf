//! Token tape archives and fixtures for unit tests.
//!
//! `TapeWriter` records every archive call as a [`Token`]; `TapeReader`
//! replays a token list and checks each call against it. The `Native`
//! variants additionally record raw byte blocks.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use num_enum::FromPrimitive;
use stow_types::SizeTag;

use crate::archive::{BinaryInput, BinaryOutput, InputArchive, OutputArchive};
use crate::capability::{BinaryRead, BinaryWrite, Native, Unsupported};
use crate::config::ArchiveConfig;
use crate::enumeration::Enumeration;
use crate::error::{StowError, StowResult};
use crate::minimal::Minimal;
use crate::named::{load_nvp, save_nvp};
use crate::persist::Persist;
use crate::registry::{LoadRegistry, SaveRegistry};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Name(&'static str),
    Start,
    Finish,
    Size(u64),
    Block(Vec<u8>),
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
}

pub(crate) struct TapeWriter<B = Unsupported> {
    pub(crate) tokens: Vec<Token>,
    registry: SaveRegistry,
    _binary: PhantomData<B>,
}

impl<B> TapeWriter<B> {
    fn empty() -> Self {
        Self {
            tokens: Vec::new(),
            registry: SaveRegistry::new(),
            _binary: PhantomData,
        }
    }
}

impl TapeWriter {
    pub(crate) fn new() -> Self {
        Self::empty()
    }
}

impl TapeWriter<Native> {
    pub(crate) fn with_blocks() -> Self {
        Self::empty()
    }
}

macro_rules! tape_save {
    ($($method:ident($ty:ty) => $variant:ident;)*) => {$(
        fn $method(&mut self, value: $ty) -> StowResult<()> {
            self.tokens.push(Token::$variant(value.into()));
            Ok(())
        }
    )*};
}

impl<B: BinaryWrite<TapeWriter<B>>> OutputArchive for TapeWriter<B> {
    type Binary = B;

    fn registry(&mut self) -> &mut SaveRegistry {
        &mut self.registry
    }

    fn set_next_name(&mut self, name: &'static str) {
        self.tokens.push(Token::Name(name));
    }

    fn start_node(&mut self) -> StowResult<()> {
        self.tokens.push(Token::Start);
        Ok(())
    }

    fn finish_node(&mut self) -> StowResult<()> {
        self.tokens.push(Token::Finish);
        Ok(())
    }

    fn save_size_tag(&mut self, tag: SizeTag) -> StowResult<()> {
        self.tokens.push(Token::Size(tag.get()));
        Ok(())
    }

    tape_save! {
        save_bool(bool) => Bool;
        save_u8(u8) => U8;
        save_u16(u16) => U16;
        save_u32(u32) => U32;
        save_u64(u64) => U64;
        save_i8(i8) => I8;
        save_i16(i16) => I16;
        save_i32(i32) => I32;
        save_i64(i64) => I64;
        save_f32(f32) => F32;
        save_f64(f64) => F64;
        save_str(&str) => Str;
    }
}

impl BinaryOutput for TapeWriter<Native> {
    fn binary_data(&mut self, bytes: &[u8]) -> StowResult<()> {
        self.tokens.push(Token::Block(bytes.to_vec()));
        Ok(())
    }
}

pub(crate) struct TapeReader<B = Unsupported> {
    tokens: VecDeque<Token>,
    expected_name: Option<&'static str>,
    registry: LoadRegistry,
    config: ArchiveConfig,
    _binary: PhantomData<B>,
}

impl<B> TapeReader<B> {
    fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
            expected_name: None,
            registry: LoadRegistry::new(),
            config: ArchiveConfig::default(),
            _binary: PhantomData,
        }
    }

    pub(crate) fn config_mut(&mut self) -> &mut ArchiveConfig {
        &mut self.config
    }

    fn pop(&mut self) -> StowResult<Token> {
        self.tokens
            .pop_front()
            .ok_or_else(|| StowError::Truncated("tape exhausted".into()))
    }

    fn next(&mut self) -> StowResult<Token> {
        if let Some(expected) = self.expected_name.take() {
            match self.pop()? {
                Token::Name(name) if name == expected => {}
                other => {
                    return Err(StowError::InvalidData(format!(
                        "expected name {expected:?}, found {other:?}"
                    )))
                }
            }
        }
        self.pop()
    }
}

impl TapeReader {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl TapeReader<Native> {
    pub(crate) fn with_blocks(tokens: Vec<Token>) -> Self {
        Self::from_tokens(tokens)
    }
}

fn unexpected(wanted: &str, found: Token) -> StowError {
    StowError::InvalidData(format!("expected {wanted}, found {found:?}"))
}

macro_rules! tape_load {
    ($($method:ident -> $ty:ty: $variant:ident;)*) => {$(
        fn $method(&mut self) -> StowResult<$ty> {
            match self.next()? {
                Token::$variant(value) => Ok(value),
                other => Err(unexpected(stringify!($variant), other)),
            }
        }
    )*};
}

impl<B: BinaryRead<TapeReader<B>>> InputArchive for TapeReader<B> {
    type Binary = B;

    fn registry(&mut self) -> &mut LoadRegistry {
        &mut self.registry
    }

    fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    fn set_next_name(&mut self, name: &'static str) {
        self.expected_name = Some(name);
    }

    fn start_node(&mut self) -> StowResult<()> {
        match self.next()? {
            Token::Start => Ok(()),
            other => Err(unexpected("Start", other)),
        }
    }

    fn finish_node(&mut self) -> StowResult<()> {
        match self.next()? {
            Token::Finish => Ok(()),
            other => Err(unexpected("Finish", other)),
        }
    }

    fn load_size_tag(&mut self) -> StowResult<SizeTag> {
        match self.next()? {
            Token::Size(n) => Ok(SizeTag::new(n)),
            other => Err(unexpected("Size", other)),
        }
    }

    tape_load! {
        load_bool -> bool: Bool;
        load_u8 -> u8: U8;
        load_u16 -> u16: U16;
        load_u32 -> u32: U32;
        load_u64 -> u64: U64;
        load_i8 -> i8: I8;
        load_i16 -> i16: I16;
        load_i32 -> i32: I32;
        load_i64 -> i64: I64;
        load_f32 -> f32: F32;
        load_f64 -> f64: F64;
        load_string -> String: Str;
    }
}

impl BinaryInput for TapeReader<Native> {
    fn load_binary_data(&mut self, buf: &mut [u8]) -> StowResult<()> {
        match self.next()? {
            Token::Block(bytes) if bytes.len() == buf.len() => {
                buf.copy_from_slice(&bytes);
                Ok(())
            }
            other => Err(unexpected("Block", other)),
        }
    }
}

pub(crate) fn record<T: Persist>(value: &T) -> StowResult<Vec<Token>> {
    let mut tape = TapeWriter::new();
    tape.save(value)?;
    Ok(tape.tokens)
}

pub(crate) fn record_blocks<T: Persist>(value: &T) -> StowResult<Vec<Token>> {
    let mut tape = TapeWriter::with_blocks();
    tape.save(value)?;
    Ok(tape.tokens)
}

pub(crate) fn replay<T: Persist>(tokens: Vec<Token>) -> StowResult<T> {
    TapeReader::new(tokens).load()
}

pub(crate) fn replay_blocks<T: Persist>(tokens: Vec<Token>) -> StowResult<T> {
    TapeReader::with_blocks(tokens).load()
}

/// Forward-compatible enum: unknown values land in `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub(crate) enum Level {
    Low = 1,
    High = 2,
    #[num_enum(catch_all)]
    Other(u8),
}

impl Enumeration for Level {
    type Repr = u8;

    fn to_underlying(&self) -> u8 {
        match *self {
            Level::Low => 1,
            Level::High => 2,
            Level::Other(value) => value,
        }
    }

    fn from_underlying(repr: u8) -> Self {
        Self::from_primitive(repr)
    }
}

crate::persist_enum!(Level);

/// Temperature stored as whole degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Celsius(pub(crate) i32);

impl Minimal for Celsius {
    type Repr = i32;

    fn save_minimal(&self) -> i32 {
        self.0
    }

    fn load_minimal(repr: i32) -> StowResult<Self> {
        if repr < -273 {
            return Err(StowError::InvalidData(format!("{repr} is below absolute zero")));
        }
        Ok(Self(repr))
    }
}

crate::persist_minimal!(Celsius);

/// A struct with no default value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub(crate) label: String,
    pub(crate) weight: u32,
}

impl Node {
    pub(crate) fn new(label: &str, weight: u32) -> Self {
        Self {
            label: label.to_owned(),
            weight,
        }
    }
}

impl Persist for Node {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.start_node()?;
        save_nvp(archive, "label", &self.label)?;
        save_nvp(archive, "weight", &self.weight)?;
        archive.finish_node()
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        let label = load_nvp(archive, "label")?;
        let weight = load_nvp(archive, "weight")?;
        archive.finish_node()?;
        Ok(Self { label, weight })
    }
}

/// Owners first, then non-owning aliases into them.
pub(crate) struct Graph {
    pub(crate) owners: Vec<Rc<Node>>,
    pub(crate) aliases: Vec<Weak<Node>>,
}

impl Persist for Graph {
    fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
        archive.start_node()?;
        save_nvp(archive, "owners", &self.owners)?;
        save_nvp(archive, "aliases", &self.aliases)?;
        archive.finish_node()
    }

    fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
        archive.start_node()?;
        let owners = load_nvp(archive, "owners")?;
        let aliases = load_nvp(archive, "aliases")?;
        archive.finish_node()?;
        Ok(Self { owners, aliases })
    }
}
