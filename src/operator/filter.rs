use std::fmt;

use anyhow::bail;

use crate::error::{OptError, OptResult};
use crate::expr::Expr;
use crate::operator::LogicalOperatorTrait;
use crate::properties::{DataType, Schema};

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Filter {
    predicate: Expr,
}

impl Filter {
    pub fn new(predicate: Expr) -> Self {
        Self { predicate }
    }

    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }
}

impl LogicalOperatorTrait for Filter {
    fn input_count(&self) -> usize {
        1
    }

    fn derive_schema(&self, inputs: &[&Schema]) -> OptResult<Schema> {
        self.predicate.validate(inputs[0])?;
        if self.predicate.data_type() != DataType::Boolean {
            bail!(OptError::malformed(format!(
                "filter predicate {} is not boolean",
                self.predicate
            )));
        }
        Ok(inputs[0].clone())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.predicate)
    }
}
