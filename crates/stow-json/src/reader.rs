use serde_json::{Map, Value};
use stow_core::{
    ArchiveConfig, InputArchive, LoadRegistry, SizeTag, StowResult, Unsupported,
};
use tracing::debug;

use crate::config::JsonConfig;
use crate::error::{JsonError, JsonResult};

enum Node {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

struct Cursor {
    node: Node,
    position: usize,
}

impl Cursor {
    fn new(node: Node) -> Self {
        Self { node, position: 0 }
    }

    /// Take the child named `name`, or the next child by position.
    ///
    /// Taken children are replaced by `null` so keys keep their order.
    fn take(&mut self, name: Option<&'static str>) -> JsonResult<Value> {
        match (&mut self.node, name) {
            (Node::Object(map), Some(name)) => {
                let (index, slot) = map
                    .iter_mut()
                    .enumerate()
                    .find_map(|(index, (key, slot))| (key == name).then_some((index, slot)))
                    .ok_or(JsonError::MissingField(name))?;
                self.position = index + 1;
                Ok(slot.take())
            }
            (Node::Object(map), None) => {
                let slot = map
                    .values_mut()
                    .nth(self.position)
                    .ok_or(JsonError::Exhausted(self.position))?;
                self.position += 1;
                Ok(slot.take())
            }
            (Node::Array(items), _) => {
                let slot = items
                    .get_mut(self.position)
                    .ok_or(JsonError::Exhausted(self.position))?;
                self.position += 1;
                Ok(slot.take())
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn unexpected(expected: &'static str, found: &Value) -> JsonError {
    JsonError::UnexpectedType {
        expected,
        found: kind(found),
    }
}

/// Reads a tree produced by [`JsonOutputArchive`](crate::JsonOutputArchive).
///
/// Named values are looked up by key, so hand-edited documents may reorder
/// fields. Unnamed values are read in document order.
pub struct JsonInputArchive {
    stack: Vec<Cursor>,
    next_name: Option<&'static str>,
    registry: LoadRegistry,
    config: JsonConfig,
}

impl JsonInputArchive {
    pub fn new(root: Value) -> StowResult<Self> {
        Self::with_config(root, JsonConfig::default())
    }

    /// Open a document. The root must be an object.
    pub fn with_config(root: Value, config: JsonConfig) -> StowResult<Self> {
        let map = match root {
            Value::Object(map) => map,
            other => return Err(unexpected("object", &other).into()),
        };
        debug!(entries = map.len(), "opened JSON document");
        Ok(Self {
            stack: vec![Cursor::new(Node::Object(map))],
            next_name: None,
            registry: LoadRegistry::new(),
            config,
        })
    }

    pub fn json_config(&self) -> &JsonConfig {
        &self.config
    }

    /// Check every node opened was closed.
    pub fn finish(self) -> StowResult<()> {
        if self.stack.len() != 1 {
            return Err(JsonError::UnbalancedNodes("node still open at finish").into());
        }
        Ok(())
    }

    fn next_value(&mut self) -> StowResult<Value> {
        let name = self.next_name.take();
        let cursor = self
            .stack
            .last_mut()
            .ok_or(JsonError::UnbalancedNodes("root already closed"))?;
        Ok(cursor.take(name)?)
    }

    fn next_u64(&mut self, target: &'static str) -> StowResult<u64> {
        let value = self.next_value()?;
        value.as_u64().ok_or_else(|| match &value {
            Value::Number(n) => JsonError::OutOfRange {
                value: n.to_string(),
                target,
            }
            .into(),
            other => unexpected("number", other).into(),
        })
    }

    fn next_i64(&mut self, target: &'static str) -> StowResult<i64> {
        let value = self.next_value()?;
        value.as_i64().ok_or_else(|| match &value {
            Value::Number(n) => JsonError::OutOfRange {
                value: n.to_string(),
                target,
            }
            .into(),
            other => unexpected("number", other).into(),
        })
    }

    fn next_f64(&mut self) -> StowResult<f64> {
        let value = self.next_value()?;
        value
            .as_f64()
            .ok_or_else(|| unexpected("number", &value).into())
    }
}

macro_rules! load_narrow {
    ($($method:ident: $ty:ty => $wide:ident),* $(,)?) => {
        $(
            fn $method(&mut self) -> StowResult<$ty> {
                let wide = self.$wide(stringify!($ty))?;
                <$ty>::try_from(wide).map_err(|_| {
                    JsonError::OutOfRange {
                        value: wide.to_string(),
                        target: stringify!($ty),
                    }
                    .into()
                })
            }
        )*
    };
}

impl InputArchive for JsonInputArchive {
    type Binary = Unsupported;

    fn registry(&mut self) -> &mut LoadRegistry {
        &mut self.registry
    }

    fn config(&self) -> &ArchiveConfig {
        &self.config.limits
    }

    fn set_next_name(&mut self, name: &'static str) {
        self.next_name = Some(name);
    }

    fn start_node(&mut self) -> StowResult<()> {
        let node = match self.next_value()? {
            Value::Object(map) => Node::Object(map),
            Value::Array(items) => Node::Array(items),
            other => return Err(unexpected("object or array", &other).into()),
        };
        self.stack.push(Cursor::new(node));
        Ok(())
    }

    fn finish_node(&mut self) -> StowResult<()> {
        if self.stack.len() < 2 {
            return Err(JsonError::UnbalancedNodes("finish_node without start_node").into());
        }
        self.stack.pop();
        Ok(())
    }

    fn load_size_tag(&mut self) -> StowResult<SizeTag> {
        let cursor = self
            .stack
            .last()
            .ok_or(JsonError::UnbalancedNodes("root already closed"))?;
        match &cursor.node {
            Node::Array(items) => Ok(SizeTag::from_len(items.len())),
            Node::Object(map) => Err(JsonError::UnexpectedType {
                expected: "array",
                found: if map.is_empty() { "empty object" } else { "object" },
            }
            .into()),
        }
    }

    fn load_bool(&mut self) -> StowResult<bool> {
        let value = self.next_value()?;
        value
            .as_bool()
            .ok_or_else(|| unexpected("bool", &value).into())
    }

    load_narrow! {
        load_u8: u8 => next_u64,
        load_u16: u16 => next_u64,
        load_u32: u32 => next_u64,
        load_i8: i8 => next_i64,
        load_i16: i16 => next_i64,
        load_i32: i32 => next_i64,
    }

    fn load_u64(&mut self) -> StowResult<u64> {
        self.next_u64("u64")
    }

    fn load_i64(&mut self) -> StowResult<i64> {
        self.next_i64("i64")
    }

    fn load_f32(&mut self) -> StowResult<f32> {
        // Values written from f32 widen exactly, so narrowing is lossless.
        self.next_f64().map(|value| value as f32)
    }

    fn load_f64(&mut self) -> StowResult<f64> {
        self.next_f64()
    }

    fn load_string(&mut self) -> StowResult<String> {
        match self.next_value()? {
            Value::String(text) => Ok(text),
            other => Err(unexpected("string", &other).into()),
        }
    }
}
