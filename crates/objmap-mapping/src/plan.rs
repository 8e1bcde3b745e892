//! Compiled mapping plans
//!
//! A plan is computed once from a mapper's configuration and the member
//! lists of the two record types. Classification happens here, at build
//! time; running the plan only moves values through the conversion trees.

use crate::classify::{Classification, classify};
use crate::convert;
use crate::facade::Facade;
use crate::{Error, Result};
use objmap_reflect::{PrimitiveKind, Record, TypeDescriptor, TypePair, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Custom member expression, with its result already turned into a [`Value`]
pub(crate) type MemberFn<S> = Arc<dyn Fn(&S, &Facade<'_>) -> Result<Value> + Send + Sync>;

/// Callback run on the populated destination
pub(crate) type AfterMapFn<S, D> = Arc<dyn Fn(&S, &mut D, &Facade<'_>) -> Result<()> + Send + Sync>;

/// Whole-object mapping function
pub(crate) type MapFn<S, D> = Arc<dyn Fn(&S, &Facade<'_>) -> Result<D> + Send + Sync>;

/// How one member value becomes a destination member value
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// Same type on both sides
    Copy,

    /// Cast between two non-text primitives
    Primitive { from: PrimitiveKind, to: PrimitiveKind },

    /// Formatting to, or parsing from, text
    Text { from: PrimitiveKind, to: PrimitiveKind },

    /// Entry-wise dictionary copy
    Dictionary {
        key: Box<Conversion>,
        value: Box<Conversion>,
    },

    /// Element-wise sequence copy
    Sequence { element: Box<Conversion> },

    /// `None` stays `None`, present values go through `inner`
    Optional {
        inner: Box<Conversion>,
        destination_optional: bool,
    },

    /// Nested record, mapped by the mapper registered for `pair`
    Nested { pair: TypePair },

    /// No automatic conversion exists for `pair`
    Unsupported { pair: TypePair },
}

impl Conversion {
    /// Conversion tree for a source and destination member type
    #[must_use]
    pub fn compile(source: &TypeDescriptor, destination: &TypeDescriptor) -> Self {
        match classify(source, destination) {
            Classification::Identical => Self::Copy,
            Classification::Convertible { from, to } => Self::Primitive { from, to },
            Classification::StringCoercion { from, to } => Self::Text { from, to },
            Classification::Optional {
                source,
                destination,
                destination_optional,
                ..
            } => Self::Optional {
                inner: Box::new(Self::compile(source, destination)),
                destination_optional,
            },
            Classification::Dictionary {
                source_key,
                source_value,
                destination_key,
                destination_value,
            } => Self::Dictionary {
                key: Box::new(Self::compile(source_key, destination_key)),
                value: Box::new(Self::compile(source_value, destination_value)),
            },
            Classification::Sequence {
                source_element,
                destination_element,
            } => Self::Sequence {
                element: Box::new(Self::compile(source_element, destination_element)),
            },
            Classification::Nested => Self::Nested {
                pair: TypePair::new(source.key(), destination.key()),
            },
            Classification::Unsupported => Self::Unsupported {
                pair: TypePair::new(source.key(), destination.key()),
            },
        }
    }

    /// Convert one value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] for failed primitive conversions,
    /// [`Error::InvalidArgument`] when `None` meets a non-optional destination,
    /// and [`Error::MissingMapper`] for unsupported or unregistered pairs.
    pub fn apply(&self, value: Value, facade: &Facade<'_>) -> Result<Value> {
        match self {
            Self::Copy => Ok(value),
            Self::Primitive { to, .. } | Self::Text { to, .. } => convert::convert(value, *to),
            Self::Dictionary {
                key,
                value: value_conversion,
            } => match value {
                Value::Map(entries) => entries
                    .into_iter()
                    .map(|(k, v)| Ok((key.apply(k, facade)?, value_conversion.apply(v, facade)?)))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Map),
                other => Err(shape_mismatch("map", &other)),
            },
            Self::Sequence { element } => match value {
                Value::Seq(items) => items
                    .into_iter()
                    .map(|item| element.apply(item, facade))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Seq),
                other => Err(shape_mismatch("sequence", &other)),
            },
            Self::Optional {
                inner,
                destination_optional,
            } => match value {
                Value::Null if *destination_optional => Ok(Value::Null),
                Value::Null => Err(Error::InvalidArgument(
                    "source value is None but the destination member is not optional".to_string(),
                )),
                present => inner.apply(present, facade),
            },
            Self::Nested { pair } => facade.map_value(value, pair),
            Self::Unsupported { pair } => Err(Error::missing_mapper(pair)),
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Primitive { from, to } => write!(f, "cast {from} -> {to}"),
            Self::Text { from, to } => write!(f, "text {from} -> {to}"),
            Self::Dictionary { key, value } => write!(f, "dictionary[{key}: {value}]"),
            Self::Sequence { element } => write!(f, "sequence[{element}]"),
            Self::Optional { inner, .. } => write!(f, "optional[{inner}]"),
            Self::Nested { pair } => write!(f, "nested {pair}"),
            Self::Unsupported { pair } => write!(f, "unsupported {pair}"),
        }
    }
}

fn shape_mismatch(expected: &str, found: &Value) -> Error {
    let error = objmap_reflect::Error::type_mismatch(expected, found.kind_name());
    error.into()
}

/// Where a destination member's value comes from
pub(crate) enum ValueSource<S> {
    Custom(MemberFn<S>),
    Member {
        name: &'static str,
        conversion: Conversion,
    },
}

pub(crate) struct PropertyStep<S> {
    pub(crate) target: &'static str,
    pub(crate) source: ValueSource<S>,
}

impl<S: Record> PropertyStep<S> {
    fn apply<D: Record>(&self, source: &S, destination: &mut D, facade: &Facade<'_>) -> Result<()> {
        let value = match &self.source {
            ValueSource::Custom(expression) => expression(source, facade)?,
            ValueSource::Member { name, conversion } => {
                let value = source.get(name).ok_or_else(|| {
                    objmap_reflect::Error::unknown_member(std::any::type_name::<S>(), *name)
                })?;
                conversion.apply(value, facade)?
            }
        };
        destination.set(self.target, value)?;
        Ok(())
    }
}

/// Immutable, reusable mapping function for one `S -> D` pair
pub(crate) enum Plan<S, D> {
    /// Function supplied when the mapper was created
    Explicit(MapFn<S, D>),

    /// Member steps in destination declaration order, then callbacks
    Steps {
        steps: Vec<PropertyStep<S>>,
        after_map: Vec<AfterMapFn<S, D>>,
    },
}

impl<S: Record, D: Record> Plan<S, D> {
    /// Build the plan for a mapper configuration.
    ///
    /// Every writable destination member that is not ignored gets a step:
    /// its custom expression if one is configured, otherwise the readable
    /// source member of the same name. Members with neither keep their
    /// default value.
    pub(crate) fn build(
        ignored: &HashSet<String>,
        custom: &HashMap<String, MemberFn<S>>,
        after_map: &[AfterMapFn<S, D>],
    ) -> Self {
        let pair = TypePair::of::<S, D>();
        let source_members = S::members();
        let mut steps = Vec::new();

        for member in D::members() {
            if !member.access.is_writable() {
                trace!(%pair, member = member.name, "Skipping read-only member");
                continue;
            }
            if ignored.contains(member.name) {
                trace!(%pair, member = member.name, "Ignoring member");
                continue;
            }
            if let Some(expression) = custom.get(member.name) {
                trace!(%pair, member = member.name, "Using custom expression");
                steps.push(PropertyStep {
                    target: member.name,
                    source: ValueSource::Custom(Arc::clone(expression)),
                });
                continue;
            }

            let Some(source_member) = source_members
                .iter()
                .find(|candidate| candidate.name == member.name && candidate.access.is_readable())
            else {
                trace!(%pair, member = member.name, "No source member, keeping default");
                continue;
            };

            let conversion = Conversion::compile(&source_member.descriptor, &member.descriptor);
            trace!(%pair, member = member.name, %conversion, "Mapping member");
            steps.push(PropertyStep {
                target: member.name,
                source: ValueSource::Member {
                    name: source_member.name,
                    conversion,
                },
            });
        }

        debug!(
            %pair,
            steps = steps.len(),
            callbacks = after_map.len(),
            "Built mapping plan"
        );
        Self::Steps {
            steps,
            after_map: after_map.to_vec(),
        }
    }

    /// Run the plan against one source.
    ///
    /// # Errors
    ///
    /// Member failures are wrapped with the member's name; callback errors are
    /// returned as they are.
    pub(crate) fn execute(&self, source: &S, facade: &Facade<'_>) -> Result<D> {
        match self {
            Self::Explicit(function) => function(source, facade),
            Self::Steps { steps, after_map } => {
                let mut destination = D::default();
                for step in steps {
                    step.apply(source, &mut destination, facade)
                        .map_err(|e| e.in_property(step.target))?;
                }
                for callback in after_map {
                    callback(source, &mut destination, facade)?;
                }
                Ok(destination)
            }
        }
    }

    /// Destination members written by the plan, in order
    #[cfg(test)]
    pub(crate) fn targets(&self) -> Vec<&'static str> {
        match self {
            Self::Explicit(_) => Vec::new(),
            Self::Steps { steps, .. } => steps.iter().map(|step| step.target).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::config::MapperConfig;
    use crate::facade::{ErasedMapper, MapperResolver};
    use objmap_reflect::{Reflect, record};
    use std::collections::BTreeMap;

    struct NoMappers;

    impl MapperResolver for NoMappers {
        fn resolve(&self, _pair: &TypePair) -> Option<Arc<dyn ErasedMapper>> {
            None
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Inner {
            id: i32,
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct InnerDto {
            id: i64,
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Source {
            name: String,
            age: i32,
            nickname: Option<String>,
            inner: Inner,
            only_here: bool,
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Target {
            name: String,
            age: String,
            nickname: String,
            inner: InnerDto,
            missing: u8,
        }
    }

    fn d<T: Reflect>() -> TypeDescriptor {
        T::descriptor()
    }

    #[test]
    fn test_compile_conversion_trees() {
        assert_eq!(
            Conversion::compile(&d::<i32>(), &d::<i32>()),
            Conversion::Copy
        );
        assert_eq!(
            Conversion::compile(&d::<Vec<i32>>(), &d::<Vec<String>>()),
            Conversion::Sequence {
                element: Box::new(Conversion::Text {
                    from: PrimitiveKind::I32,
                    to: PrimitiveKind::String
                })
            }
        );
        assert_eq!(
            Conversion::compile(&d::<Option<u8>>(), &d::<Option<u16>>()),
            Conversion::Optional {
                inner: Box::new(Conversion::Primitive {
                    from: PrimitiveKind::U8,
                    to: PrimitiveKind::U16
                }),
                destination_optional: true,
            }
        );
        assert_eq!(
            Conversion::compile(&d::<Inner>(), &d::<InnerDto>()),
            Conversion::Nested {
                pair: TypePair::of::<Inner, InnerDto>()
            }
        );
        assert_eq!(
            Conversion::compile(&d::<i32>(), &d::<Inner>()),
            Conversion::Unsupported {
                pair: TypePair::of::<i32, Inner>()
            }
        );
    }

    #[test]
    fn test_apply_dictionary_converts_keys_and_values() {
        let config = MapperConfig::default();
        let facade = Facade::new(&NoMappers, &config);
        let conversion = Conversion::compile(
            &d::<BTreeMap<String, i32>>(),
            &d::<BTreeMap<String, String>>(),
        );

        let source = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        let converted = conversion.apply(source.to_value(), &facade).unwrap();
        let result = BTreeMap::<String, String>::from_value(converted).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result["a"], "1");
        assert_eq!(result["b"], "2");
    }

    #[test]
    fn test_apply_dictionary_key_collision_fails() {
        let config = MapperConfig::default();
        let facade = Facade::new(&NoMappers, &config);
        let conversion =
            Conversion::compile(&d::<BTreeMap<String, i32>>(), &d::<BTreeMap<i32, i32>>());

        // "1" and "01" both parse to 1
        let source = Value::Map(vec![
            (Value::String("1".to_string()), Value::I32(1)),
            (Value::String("01".to_string()), Value::I32(2)),
        ]);
        let converted = conversion.apply(source, &facade).unwrap();
        let err = BTreeMap::<i32, i32>::from_value(converted).unwrap_err();

        assert!(matches!(err, objmap_reflect::Error::DuplicateKey { .. }));
    }

    #[test]
    fn test_apply_optional() {
        let config = MapperConfig::default();
        let facade = Facade::new(&NoMappers, &config);

        let lift = Conversion::compile(&d::<i32>(), &d::<Option<i64>>());
        assert_eq!(lift.apply(Value::I32(3), &facade).unwrap(), Value::I64(3));

        let keep = Conversion::compile(&d::<Option<i32>>(), &d::<Option<i64>>());
        assert_eq!(keep.apply(Value::Null, &facade).unwrap(), Value::Null);

        let unwrap = Conversion::compile(&d::<Option<i32>>(), &d::<i64>());
        assert_eq!(unwrap.apply(Value::I32(4), &facade).unwrap(), Value::I64(4));
        let err = unwrap.apply(Value::Null, &facade).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_build_skips_members_without_source() {
        let plan = Plan::<Source, Target>::build(&HashSet::new(), &HashMap::new(), &[]);
        assert_eq!(plan.targets(), vec!["name", "age", "nickname", "inner"]);

        let ignored = HashSet::from(["age".to_string()]);
        let plan = Plan::<Source, Target>::build(&ignored, &HashMap::new(), &[]);
        assert_eq!(plan.targets(), vec!["name", "nickname", "inner"]);
    }

    #[test]
    fn test_execute_wraps_member_errors() {
        let config = MapperConfig::default();
        let facade = Facade::new(&NoMappers, &config);
        let plan = Plan::<Source, Target>::build(&HashSet::new(), &HashMap::new(), &[]);

        let source = Source {
            name: "Ann".to_string(),
            age: 30,
            nickname: Some("A".to_string()),
            ..Default::default()
        };
        let err = plan.execute(&source, &facade).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingMapper);
        assert_eq!(err.property_path().as_deref(), Some("inner"));
    }

    #[test]
    fn test_execute_custom_and_callbacks() {
        let config = MapperConfig::default();
        let facade = Facade::new(&NoMappers, &config);
        let ignored = HashSet::from(["inner".to_string()]);
        let mut custom: HashMap<String, MemberFn<Source>> = HashMap::new();
        custom.insert(
            "age".to_string(),
            Arc::new(|s: &Source, _: &Facade<'_>| -> Result<Value> {
                Ok(Value::String(format!("{} years", s.age)))
            }),
        );
        let callbacks: Vec<AfterMapFn<Source, Target>> = vec![
            Arc::new(|_: &Source, d: &mut Target, _: &Facade<'_>| -> Result<()> {
                d.missing = 1;
                Ok(())
            }),
            Arc::new(|_: &Source, d: &mut Target, _: &Facade<'_>| -> Result<()> {
                d.missing *= 10;
                Ok(())
            }),
        ];
        let plan = Plan::<Source, Target>::build(&ignored, &custom, &callbacks);

        let source = Source {
            name: "Ann".to_string(),
            age: 30,
            ..Default::default()
        };
        let err = plan.execute(&source, &facade).unwrap_err();
        assert_eq!(err.property_path().as_deref(), Some("nickname"));

        let source = Source {
            nickname: Some("Annie".to_string()),
            ..source
        };
        let target = plan.execute(&source, &facade).unwrap();
        assert_eq!(target.name, "Ann");
        assert_eq!(target.age, "30 years");
        assert_eq!(target.nickname, "Annie");
        assert_eq!(target.inner, InnerDto::default());
        assert_eq!(target.missing, 10);
    }
}
