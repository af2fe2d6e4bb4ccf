//! JSON archive back end for Stow.
//!
//! Archives are [`serde_json::Value`] trees rooted at an object. Names
//! given with [`save_nvp`](stow_core::save_nvp) become keys; unnamed values
//! are keyed `value0`, `value1`, ... Containers become arrays. Shared objects
//! appear as `{"id": n, "data": ...}` the first time and `{"id": n}` after,
//! with back-references carrying the high bit (`2147483648 + index`).
//!
//! This archive has no binary capability, so arithmetic containers are
//! always written one element at a time.

pub mod config;
pub mod error;
pub mod reader;
pub mod writer;

use serde_json::Value;
use stow_core::{InputArchive, OutputArchive, Persist, StowResult};

pub use config::JsonConfig;
pub use error::{JsonError, JsonResult};
pub use reader::JsonInputArchive;
pub use writer::JsonOutputArchive;

/// Serialize `value` into a JSON tree.
pub fn to_value<T: Persist>(value: &T) -> StowResult<Value> {
    let mut archive = JsonOutputArchive::new();
    archive.save(value)?;
    archive.finish()
}

/// Serialize `value` as compact JSON text.
pub fn to_string<T: Persist>(value: &T) -> StowResult<String> {
    to_string_with(value, JsonConfig::default())
}

pub fn to_string_with<T: Persist>(value: &T, config: JsonConfig) -> StowResult<String> {
    let pretty = config.pretty;
    let mut archive = JsonOutputArchive::with_config(config);
    archive.save(value)?;
    let tree = archive.finish()?;
    let text = if pretty {
        serde_json::to_string_pretty(&tree)
    } else {
        serde_json::to_string(&tree)
    }
    .map_err(JsonError::from)?;
    Ok(text)
}

/// Deserialize a value from a JSON tree.
pub fn from_value<T: Persist>(value: Value) -> StowResult<T> {
    from_value_with(value, JsonConfig::default())
}

pub fn from_value_with<T: Persist>(value: Value, config: JsonConfig) -> StowResult<T> {
    let mut archive = JsonInputArchive::with_config(value, config)?;
    let loaded = archive.load()?;
    archive.finish()?;
    Ok(loaded)
}

/// Deserialize a value from JSON text.
pub fn from_str<T: Persist>(text: &str) -> StowResult<T> {
    let value: Value = serde_json::from_str(text).map_err(JsonError::from)?;
    from_value(value)
}

#[cfg(test)]
mod tests {
    use std::rc::{Rc, Weak};
    use std::sync::Arc;

    use num_enum::FromPrimitive;
    use proptest::prelude::*;
    use serde_json::json;
    use stow_core::{
        load_into, load_nvp, save_nvp, Enumeration, Minimal, StowError, StrategyChoice,
        Violation,
    };

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
    #[repr(i8)]
    enum Signal {
        Stop = -1,
        Go = 1,
        #[num_enum(catch_all)]
        Other(i8),
    }

    impl Enumeration for Signal {
        type Repr = i8;

        fn to_underlying(&self) -> i8 {
            match *self {
                Signal::Stop => -1,
                Signal::Go => 1,
                Signal::Other(value) => value,
            }
        }

        fn from_underlying(repr: i8) -> Self {
            Signal::from_primitive(repr)
        }
    }

    stow_core::persist_enum!(Signal);

    /// Percentages stored as a bare number.
    #[derive(Debug, PartialEq)]
    struct Percent(u8);

    impl Minimal for Percent {
        type Repr = u8;

        fn save_minimal(&self) -> u8 {
            self.0
        }

        fn load_minimal(repr: u8) -> StowResult<Self> {
            if repr > 100 {
                return Err(StowError::InvalidData(format!("{repr}% is not a percentage")));
            }
            Ok(Percent(repr))
        }
    }

    stow_core::persist_minimal!(Percent);

    #[derive(Debug, PartialEq)]
    struct Sample {
        label: String,
        level: Percent,
        signal: Signal,
        readings: Vec<f32>,
    }

    impl Persist for Sample {
        fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
            archive.start_node()?;
            save_nvp(archive, "label", &self.label)?;
            save_nvp(archive, "level", &self.level)?;
            save_nvp(archive, "signal", &self.signal)?;
            save_nvp(archive, "readings", &self.readings)?;
            archive.finish_node()
        }

        fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
            archive.start_node()?;
            let label = load_nvp(archive, "label")?;
            let level = load_nvp(archive, "level")?;
            let signal = load_nvp(archive, "signal")?;
            let readings = load_nvp(archive, "readings")?;
            archive.finish_node()?;
            Ok(Self {
                label,
                level,
                signal,
                readings,
            })
        }
    }

    struct Roster {
        members: Vec<Rc<String>>,
        captain: Weak<String>,
    }

    impl Persist for Roster {
        fn save<A: OutputArchive>(&self, archive: &mut A) -> StowResult<()> {
            archive.start_node()?;
            save_nvp(archive, "members", &self.members)?;
            save_nvp(archive, "captain", &self.captain)?;
            archive.finish_node()
        }

        fn load<A: InputArchive>(archive: &mut A) -> StowResult<Self> {
            archive.start_node()?;
            let members = load_nvp(archive, "members")?;
            let captain = load_nvp(archive, "captain")?;
            archive.finish_node()?;
            Ok(Self { members, captain })
        }
    }

    #[test]
    fn sequence_becomes_an_array() {
        let tree = to_value(&vec![1u32, 2, 3]).unwrap();
        assert_eq!(tree, json!({"value0": [1, 2, 3]}));
        let back: Vec<u32> = from_value(tree).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn arithmetic_is_never_raw_here() {
        assert_eq!(
            stow_core::resolve_save::<u64, JsonOutputArchive>(),
            StrategyChoice::ElementWise
        );
        assert_eq!(
            stow_core::resolve_load::<f32, JsonInputArchive>(),
            StrategyChoice::ElementWise
        );
        assert_eq!(
            stow_core::resolve_save::<Box<Signal>, JsonOutputArchive>(),
            StrategyChoice::EnumProjected
        );
        assert_eq!(
            stow_core::resolve_save::<Percent, JsonOutputArchive>(),
            StrategyChoice::UserMinimal
        );
    }

    #[test]
    fn shared_objects_keep_identity() {
        let a = Rc::new(7u32);
        let b = Rc::new(9u32);
        let tree = to_value(&vec![a.clone(), a, b]).unwrap();
        assert_eq!(
            tree,
            json!({"value0": [
                {"id": 0, "data": 7},
                {"id": 2147483648u32},
                {"id": 1, "data": 9},
            ]})
        );

        let back: Vec<Rc<u32>> = from_value(tree).unwrap();
        assert!(Rc::ptr_eq(&back[0], &back[1]));
        assert!(!Rc::ptr_eq(&back[1], &back[2]));
        assert_eq!(Rc::strong_count(&back[0]), 2);
    }

    #[test]
    fn non_owning_reference_is_a_bare_id() {
        let alice = Rc::new("alice".to_owned());
        let bob = Rc::new("bob".to_owned());
        let roster = Roster {
            members: vec![alice, bob.clone()],
            captain: Rc::downgrade(&bob),
        };
        let tree = to_value(&roster).unwrap();
        assert_eq!(
            tree,
            json!({"value0": {
                "members": [{"id": 0, "data": "alice"}, {"id": 1, "data": "bob"}],
                "captain": {"id": 2147483649u32},
            }})
        );

        let back: Roster = from_value(tree).unwrap();
        let captain = back.captain.upgrade().unwrap();
        assert!(Rc::ptr_eq(&captain, &back.members[1]));
    }

    #[test]
    fn rejected_non_owning_save_leaves_the_owner_intact() {
        let bob = Rc::new("bob".to_owned());
        let mut out = JsonOutputArchive::new();
        let err = out.save(&Rc::downgrade(&bob)).unwrap_err();
        assert!(matches!(
            err,
            StowError::ProtocolViolation {
                kind: Violation::RawSavedBeforeOwner,
                ..
            }
        ));

        out.save(&bob).unwrap();
        out.save(&Rc::downgrade(&bob)).unwrap();
        assert_eq!(
            out.finish().unwrap(),
            json!({
                "value0": {"id": 0, "data": "bob"},
                "value1": {"id": 2147483648u32},
            })
        );
    }

    #[test]
    fn non_owning_reference_cannot_introduce_an_object() {
        let tree = json!({"value0": {
            "members": [],
            "captain": {"id": 0},
        }});
        let err = from_value::<Roster>(tree).err().unwrap();
        assert!(matches!(
            err,
            StowError::ProtocolViolation {
                kind: Violation::RawLoadedBeforeOwner,
                ..
            }
        ));
    }

    #[test]
    fn back_reference_to_unknown_id() {
        let tree = json!({"value0": [{"id": 2147483653u32}]});
        let err = from_value::<Vec<Rc<u32>>>(tree).unwrap_err();
        assert!(matches!(err, StowError::UnregisteredIdentity(_)));
    }

    #[test]
    fn struct_with_enum_minimal_and_floats() {
        let sample = Sample {
            label: "gauge".into(),
            level: Percent(42),
            signal: Signal::Stop,
            readings: vec![0.5, -1.25],
        };
        let text = to_string(&sample).unwrap();
        assert_eq!(
            text,
            r#"{"value0":{"label":"gauge","level":42,"signal":-1,"readings":[0.5,-1.25]}}"#
        );
        assert_eq!(from_str::<Sample>(&text).unwrap(), sample);
    }

    #[test]
    fn fields_may_be_reordered_by_hand() {
        let text = r#"{"value0":{"readings":[],"signal":9,"level":100,"label":"edited"}}"#;
        let sample: Sample = from_str(text).unwrap();
        assert_eq!(sample.signal, Signal::Other(9));
        assert_eq!(sample.level, Percent(100));
        assert!(sample.readings.is_empty());
    }

    #[test]
    fn minimal_validation_applies() {
        let err = from_str::<Percent>(r#"{"value0":101}"#).unwrap_err();
        assert!(matches!(err, StowError::InvalidData(_)));
    }

    #[test]
    fn pretty_output_parses_back() {
        let values = vec![Some("a".to_owned()), None];
        let text = to_string_with(&values, JsonConfig::pretty()).unwrap();
        assert!(text.contains('\n'));
        let back: Vec<Option<String>> = from_str(&text).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn size_limit_applies() {
        let mut config = JsonConfig::default();
        config.limits.max_size_tag = 2;
        let err = from_value_with::<Vec<u8>>(json!({"value0": [1, 2, 3]}), config).unwrap_err();
        assert!(matches!(err, StowError::SizeLimitExceeded { size: 3, max: 2 }));
    }

    #[test]
    fn failed_load_keeps_appended_elements() {
        let mut archive = JsonInputArchive::new(json!({"value0": [1, 2, "three"]})).unwrap();
        let mut out: Vec<u8> = vec![9];
        let err = load_into(&mut archive, &mut out).unwrap_err();
        assert!(matches!(
            JsonError::find(&err),
            Some(JsonError::UnexpectedType { .. })
        ));
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn arc_round_trip() {
        let shared = Arc::new("sync".to_owned());
        let back: Vec<Arc<String>> = from_value(to_value(&vec![shared.clone(), shared]).unwrap()).unwrap();
        assert!(Arc::ptr_eq(&back[0], &back[1]));
    }

    #[test]
    fn malformed_text() {
        let err = from_str::<u8>("{").unwrap_err();
        assert!(matches!(JsonError::find(&err), Some(JsonError::Syntax(_))));
    }

    proptest! {
        #[test]
        fn enum_values_survive(raw in any::<i8>()) {
            let back: Signal = from_value(to_value(&Signal::from_underlying(raw)).unwrap()).unwrap();
            prop_assert_eq!(back.to_underlying(), raw);
        }

        #[test]
        fn container_order_and_count(values in proptest::collection::vec(any::<i64>(), 0..32)) {
            let back: Vec<i64> = from_str(&to_string(&values).unwrap()).unwrap();
            prop_assert_eq!(back, values);
        }
    }
}
