//! # Type Capabilities
//!
//! The rewriter never inspects types by itself. It asks a [`TypeCapabilities`] provider two
//! questions ("can `T` be built with no arguments?" and "is `T` an optional-wrapper, and of
//! what?") and asks it to build the values it splices into the tree.
//!
//! ## Trait Design
//!
//! The trait sits behind a trait object (`Arc<dyn TypeCapabilities>`) so a query host can back
//! it with its own type system. [`TypeRegistry`] is the explicit, statically-registered
//! provider: record shapes and wrapper families are declared up front, and every query is a
//! lookup rather than a search.
//!
//! ## Resolution Rules
//!
//! - Primitives are default-constructible with their zero value; `Sequence(T)` with the empty
//!   sequence; function types never.
//! - A record is default-constructible iff it declares a zero-parameter constructor. Building
//!   its default zero-initializes every field: primitives get their zero value, wrappers of
//!   registered families hold `default(T)` (or `Null` when `T` has none), all other field
//!   types get `Null`.
//! - `Optional { wrapper, .. }` is an optional-wrapper iff the family is registered, and is
//!   default-constructible iff the family declares a 0-arity constructor.
//! - Wrapper construction needs exactly one non-nullary constructor, taking exactly one
//!   argument. Anything else is a registration conflict and fails.

use crate::error::{Result, RewriteError};
use crate::types::{DataType, Value};
use ordered_float::OrderedFloat;
use std::collections::HashMap;

/// Capability queries answered by the host type system.
pub trait TypeCapabilities: Send + Sync {
    /// Whether a zero-argument construction path exists for `ty`.
    fn has_default_constructor(&self, ty: &DataType) -> bool;

    /// Build the canonical default instance of `ty`.
    fn construct_default(&self, ty: &DataType) -> Result<Value>;

    /// The inner type if `ty` is an optional-wrapper.
    fn is_optional_wrapper(&self, ty: &DataType) -> Option<DataType>;

    /// Build a `wrapper` value by passing `inner_default` to its non-nullary constructor.
    fn construct_optional_wrapper(
        &self,
        wrapper: &DataType,
        inner_default: Value,
    ) -> Result<Value>;
}

/// A record constructor, described by its parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub params: Vec<DataType>,
}

impl Constructor {
    pub fn nullary() -> Self {
        Self { params: vec![] }
    }

    pub fn with_params(params: Vec<DataType>) -> Self {
        Self { params }
    }
}

/// Shape of a registered record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDef {
    pub fields: Vec<(String, DataType)>,
    pub constructors: Vec<Constructor>,
}

impl RecordDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    pub fn constructor(mut self, ctor: Constructor) -> Self {
        self.constructors.push(ctor);
        self
    }
}

/// Shape of a registered optional-wrapper family.
///
/// Constructors are described by arity only; the inner type is supplied by each
/// `DataType::Optional` instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperDef {
    pub constructor_arities: Vec<usize>,
}

impl WrapperDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructor(mut self, arity: usize) -> Self {
        self.constructor_arities.push(arity);
        self
    }
}

/// Explicit registry of record and wrapper capabilities.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    records: HashMap<String, RecordDef>,
    wrappers: HashMap<String, WrapperDef>,
}

impl TypeRegistry {
    /// An empty registry: only primitives and sequences have capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `Nullable` wrapper family (one 1-arity constructor).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register_wrapper("Nullable", WrapperDef::new().constructor(1));
        registry
    }

    pub fn register_record(&mut self, name: impl Into<String>, def: RecordDef) -> &mut Self {
        self.records.insert(name.into(), def);
        self
    }

    pub fn register_wrapper(&mut self, family: impl Into<String>, def: WrapperDef) -> &mut Self {
        self.wrappers.insert(family.into(), def);
        self
    }

    pub fn record(&self, name: &str) -> Option<&RecordDef> {
        self.records.get(name)
    }

    pub fn wrapper(&self, family: &str) -> Option<&WrapperDef> {
        self.wrappers.get(family)
    }

    /// Default instance of `ty`. `building` holds the records currently under construction.
    fn build_default(&self, ty: &DataType, building: &mut Vec<String>) -> Result<Value> {
        match ty {
            DataType::Bool | DataType::Int64 | DataType::Float64 | DataType::Utf8 => {
                self.field_zero(ty, building)
            }
            DataType::Sequence(_) => Ok(Value::Sequence(vec![])),
            DataType::Record(name) => {
                let def = self
                    .record(name)
                    .ok_or_else(|| RewriteError::MissingDefaultConstructor(ty.clone()))?;
                match def.constructors.iter().filter(|c| c.params.is_empty()).count() {
                    0 => Err(RewriteError::MissingDefaultConstructor(ty.clone())),
                    1 => {
                        building.push(name.clone());
                        let fields = def
                            .fields
                            .iter()
                            .map(|(field, field_ty)| {
                                Ok((field.clone(), self.field_zero(field_ty, building)?))
                            })
                            .collect::<Result<Vec<_>>>();
                        building.pop();
                        Ok(Value::Record {
                            type_name: name.clone(),
                            fields: fields?,
                        })
                    }
                    found => Err(RewriteError::AmbiguousDefaultConstructor {
                        ty: ty.clone(),
                        found,
                    }),
                }
            }
            DataType::Optional { .. } => {
                if !self.has_default_constructor(ty) {
                    return Err(RewriteError::MissingDefaultConstructor(ty.clone()));
                }
                self.field_zero(ty, building)
            }
            DataType::Function { .. } => Err(RewriteError::MissingDefaultConstructor(ty.clone())),
        }
    }

    /// Zero-initialized value of `ty`, as found in a freshly built record field.
    ///
    /// Wrappers of registered families are value types. Their payload is the same `default(T)`
    /// the rewriter passes to `construct_optional_wrapper`, so a default record's wrapper
    /// fields equal the empty wrapper. Records, sequences and functions are references and
    /// start out `Null`.
    fn field_zero(&self, ty: &DataType, building: &mut Vec<String>) -> Result<Value> {
        Ok(match ty {
            DataType::Bool => Value::Bool(false),
            DataType::Int64 => Value::Int64(0),
            DataType::Float64 => Value::Float64(OrderedFloat(0.0)),
            DataType::Utf8 => Value::Utf8(String::new()),
            DataType::Optional { wrapper, inner } if self.wrappers.contains_key(wrapper) => {
                Value::Wrapped {
                    wrapper: wrapper.clone(),
                    payload: Box::new(self.empty_payload(inner, building)?),
                }
            }
            _ => Value::Null,
        })
    }

    /// Payload of an empty wrapper around `inner`.
    ///
    /// `Null` when `inner` has no default, or when it is a record already being built: a
    /// wrapper field referring back to its own record has no finite default.
    fn empty_payload(&self, inner: &DataType, building: &mut Vec<String>) -> Result<Value> {
        if !self.has_default_constructor(inner) {
            return Ok(Value::Null);
        }
        if let DataType::Record(name) = inner {
            if building.contains(name) {
                return Ok(Value::Null);
            }
        }
        self.build_default(inner, building)
    }
}

impl TypeCapabilities for TypeRegistry {
    fn has_default_constructor(&self, ty: &DataType) -> bool {
        match ty {
            DataType::Bool
            | DataType::Int64
            | DataType::Float64
            | DataType::Utf8
            | DataType::Sequence(_) => true,
            DataType::Record(name) => self
                .record(name)
                .is_some_and(|def| def.constructors.iter().any(|c| c.params.is_empty())),
            DataType::Optional { wrapper, .. } => self
                .wrapper(wrapper)
                .is_some_and(|def| def.constructor_arities.contains(&0)),
            DataType::Function { .. } => false,
        }
    }

    fn construct_default(&self, ty: &DataType) -> Result<Value> {
        self.build_default(ty, &mut Vec::new())
    }

    fn is_optional_wrapper(&self, ty: &DataType) -> Option<DataType> {
        match ty {
            DataType::Optional { wrapper, inner } if self.wrappers.contains_key(wrapper) => {
                Some(inner.as_ref().clone())
            }
            _ => None,
        }
    }

    fn construct_optional_wrapper(
        &self,
        wrapper: &DataType,
        inner_default: Value,
    ) -> Result<Value> {
        let DataType::Optional { wrapper: family, .. } = wrapper else {
            return Err(RewriteError::NotOptionalWrapper(wrapper.clone()));
        };
        let def = self
            .wrapper(family)
            .ok_or_else(|| RewriteError::NotOptionalWrapper(wrapper.clone()))?;

        let non_nullary: Vec<usize> = def
            .constructor_arities
            .iter()
            .copied()
            .filter(|&arity| arity > 0)
            .collect();
        match non_nullary.as_slice() {
            [1] => Ok(Value::Wrapped {
                wrapper: family.clone(),
                payload: Box::new(inner_default),
            }),
            [arity] => Err(RewriteError::WrapperConstructorArity {
                ty: wrapper.clone(),
                arity: *arity,
            }),
            other => Err(RewriteError::AmbiguousWrapperConstructor {
                ty: wrapper.clone(),
                found: other.len(),
            }),
        }
    }
}
