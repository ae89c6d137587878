//! Scalar expressions.
//!
//! The scalar language is deliberately small: it only needs to express column projections and
//! the equi-join predicates that rewrite rules assemble. Column references are positional, so an
//! expression is only meaningful against the schema it was built for.

use std::fmt;

use anyhow::bail;
use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use strum_macros::Display;

use crate::error::{OptError, OptResult};
use crate::properties::{DataType, Schema};

mod builder;
pub use builder::*;

/// Zero-based ordinal of a field in a row.
pub type FieldIndex = usize;

/// Positional reference to an input field.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct FieldRef {
    index: FieldIndex,
    data_type: DataType,
}

impl FieldRef {
    pub fn new(index: FieldIndex, data_type: DataType) -> Self {
        Self { index, data_type }
    }

    pub fn index(&self) -> FieldIndex {
        self.index
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum ScalarValue {
    Boolean(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
}

impl ScalarValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Boolean(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::Float64(v) => write!(f, "{:?}", v.into_inner()),
            ScalarValue::Utf8(v) => write!(f, "'{}'", v),
        }
    }
}

/// Binary scalar operators.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Display)]
pub enum ScalarOperator {
    #[strum(serialize = "=")]
    Equals,
    #[strum(serialize = "AND")]
    And,
}

impl ScalarOperator {
    pub fn return_type(&self) -> DataType {
        DataType::Boolean
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum Expr {
    Column(FieldRef),
    Literal(ScalarValue),
    Call { op: ScalarOperator, args: Vec<Expr> },
}

impl Expr {
    pub fn data_type(&self) -> DataType {
        match self {
            Expr::Column(field_ref) => field_ref.data_type(),
            Expr::Literal(value) => value.data_type(),
            Expr::Call { op, .. } => op.return_type(),
        }
    }

    /// Checks that every field reference in this expression resolves against `schema` with the
    /// type it claims, and that operator arguments are well typed.
    pub fn validate(&self, schema: &Schema) -> OptResult<()> {
        match self {
            Expr::Column(field_ref) => match schema.field(field_ref.index()) {
                None => bail!(OptError::malformed(format!(
                    "field reference {} out of range for {} fields",
                    self,
                    schema.len()
                ))),
                Some(field) if field.data_type() != field_ref.data_type() => {
                    bail!(OptError::malformed(format!(
                        "field reference {} declared as {} but field {} is {}",
                        self,
                        field_ref.data_type(),
                        field.name(),
                        field.data_type()
                    )))
                }
                Some(_) => Ok(()),
            },
            Expr::Literal(_) => Ok(()),
            Expr::Call { op, args } => {
                if args.len() != 2 {
                    bail!(OptError::malformed(format!(
                        "operator {} expects 2 arguments, got {}",
                        op,
                        args.len()
                    )));
                }
                for arg in args {
                    arg.validate(schema)?;
                }
                let (left, right) = (args[0].data_type(), args[1].data_type());
                let well_typed = match op {
                    ScalarOperator::Equals => left == right,
                    ScalarOperator::And => {
                        left == DataType::Boolean && right == DataType::Boolean
                    }
                };
                if !well_typed {
                    bail!(OptError::malformed(format!(
                        "operator {} cannot be applied to {} and {}",
                        op, left, right
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(field_ref) => write!(f, "${}", field_ref.index()),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Call { op, args } => {
                write!(f, "({})", args.iter().join(&format!(" {} ", op)))
            }
        }
    }
}
