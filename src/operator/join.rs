use std::fmt;

use anyhow::bail;
use strum_macros::Display;

use crate::error::{OptError, OptResult};
use crate::expr::Expr;
use crate::operator::LogicalOperatorTrait;
use crate::properties::{DataType, Schema};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Display)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

/// Logical join operator.
///
/// The condition is evaluated against the concatenation of the left and right input rows.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Join {
    join_type: JoinType,
    condition: Expr,
}

impl Join {
    pub fn new(join_type: JoinType, condition: Expr) -> Self {
        Self {
            join_type,
            condition,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn condition(&self) -> &Expr {
        &self.condition
    }
}

impl LogicalOperatorTrait for Join {
    fn input_count(&self) -> usize {
        2
    }

    fn derive_schema(&self, inputs: &[&Schema]) -> OptResult<Schema> {
        let schema = inputs[0].join(inputs[1]);
        self.condition.validate(&schema)?;
        if self.condition.data_type() != DataType::Boolean {
            bail!(OptError::malformed(format!(
                "join condition {} is not boolean",
                self.condition
            )));
        }
        Ok(schema)
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Join(type={}, condition={})",
            self.join_type, self.condition
        )
    }
}
