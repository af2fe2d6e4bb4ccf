use serde_json::{Map, Number, Value};
use stow_core::{OutputArchive, SaveRegistry, SizeTag, StowResult, Unsupported};
use tracing::trace;

use crate::config::JsonConfig;
use crate::error::JsonError;

enum Frame {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

struct Level {
    /// Name the finished node is stored under in its parent.
    name: Option<&'static str>,
    frame: Frame,
    /// Counter for `value{n}` keys.
    unnamed: usize,
}

impl Level {
    fn new(name: Option<&'static str>) -> Self {
        Self {
            name,
            frame: Frame::Object(Map::new()),
            unnamed: 0,
        }
    }

    fn into_value(self) -> Value {
        match self.frame {
            Frame::Object(map) => Value::Object(map),
            Frame::Array(items) => Value::Array(items),
        }
    }
}

/// Builds a [`serde_json::Value`] tree.
///
/// The root is an object. Named values become keys, unnamed ones are keyed
/// `value0`, `value1`, ... in order. A node whose first value is a size tag
/// becomes an array and its children are stored by position.
pub struct JsonOutputArchive {
    stack: Vec<Level>,
    next_name: Option<&'static str>,
    registry: SaveRegistry,
    config: JsonConfig,
}

impl Default for JsonOutputArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOutputArchive {
    pub fn new() -> Self {
        Self::with_config(JsonConfig::default())
    }

    pub fn with_config(config: JsonConfig) -> Self {
        Self {
            stack: vec![Level::new(None)],
            next_name: None,
            registry: SaveRegistry::new(),
            config,
        }
    }

    pub fn json_config(&self) -> &JsonConfig {
        &self.config
    }

    /// Close the root object and return the finished tree.
    pub fn finish(mut self) -> StowResult<Value> {
        if self.stack.len() != 1 {
            return Err(JsonError::UnbalancedNodes("node still open at finish").into());
        }
        match self.stack.pop() {
            Some(root) => Ok(root.into_value()),
            None => Err(JsonError::UnbalancedNodes("root already closed").into()),
        }
    }

    fn top(&mut self) -> StowResult<&mut Level> {
        self.stack
            .last_mut()
            .ok_or_else(|| JsonError::UnbalancedNodes("root already closed").into())
    }

    fn push(&mut self, value: Value) -> StowResult<()> {
        let name = self.next_name.take();
        let level = self.top()?;
        match &mut level.frame {
            Frame::Object(map) => {
                let key = match name {
                    Some(name) => name.to_owned(),
                    None => {
                        let key = format!("value{}", level.unnamed);
                        level.unnamed += 1;
                        key
                    }
                };
                map.insert(key, value);
            }
            Frame::Array(items) => items.push(value),
        }
        Ok(())
    }

    fn push_float(&mut self, value: f64) -> StowResult<()> {
        let number = Number::from_f64(value).ok_or(JsonError::NonFinite(value))?;
        self.push(Value::Number(number))
    }
}

macro_rules! save_number {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(&mut self, value: $ty) -> StowResult<()> {
                self.push(Value::from(value))
            }
        )*
    };
}

impl OutputArchive for JsonOutputArchive {
    type Binary = Unsupported;

    fn registry(&mut self) -> &mut SaveRegistry {
        &mut self.registry
    }

    fn set_next_name(&mut self, name: &'static str) {
        self.next_name = Some(name);
    }

    fn start_node(&mut self) -> StowResult<()> {
        let name = self.next_name.take();
        self.stack.push(Level::new(name));
        Ok(())
    }

    fn finish_node(&mut self) -> StowResult<()> {
        if self.stack.len() < 2 {
            return Err(JsonError::UnbalancedNodes("finish_node without start_node").into());
        }
        if let Some(level) = self.stack.pop() {
            self.next_name = level.name;
            self.push(level.into_value())?;
        }
        Ok(())
    }

    fn save_size_tag(&mut self, tag: SizeTag) -> StowResult<()> {
        let nested = self.stack.len() > 1;
        let level = self.top()?;
        let fresh = matches!(&level.frame, Frame::Object(map) if map.is_empty());
        if !(nested && fresh) {
            return Err(JsonError::MisplacedSizeTag.into());
        }
        trace!(size = tag.get(), "node becomes an array");
        level.frame = Frame::Array(Vec::new());
        Ok(())
    }

    fn save_bool(&mut self, value: bool) -> StowResult<()> {
        self.push(Value::Bool(value))
    }

    save_number! {
        save_u8: u8,
        save_u16: u16,
        save_u32: u32,
        save_u64: u64,
        save_i8: i8,
        save_i16: i16,
        save_i32: i32,
        save_i64: i64,
    }

    fn save_f32(&mut self, value: f32) -> StowResult<()> {
        self.push_float(f64::from(value))
    }

    fn save_f64(&mut self, value: f64) -> StowResult<()> {
        self.push_float(value)
    }

    fn save_str(&mut self, value: &str) -> StowResult<()> {
        self.push(Value::String(value.to_owned()))
    }
}
