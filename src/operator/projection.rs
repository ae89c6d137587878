use std::fmt;

use anyhow::bail;
use itertools::Itertools;

use crate::error::{OptError, OptResult};
use crate::expr::Expr;
use crate::operator::LogicalOperatorTrait;
use crate::properties::{Field, Schema};

/// Maps each input row to `exprs.len()` output fields, named by `field_names`.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Projection {
    exprs: Vec<Expr>,
    field_names: Vec<String>,
}

impl Projection {
    pub fn new(exprs: Vec<Expr>, field_names: Vec<String>) -> Self {
        Self { exprs, field_names }
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }
}

impl LogicalOperatorTrait for Projection {
    fn input_count(&self) -> usize {
        1
    }

    fn derive_schema(&self, inputs: &[&Schema]) -> OptResult<Schema> {
        if self.exprs.len() != self.field_names.len() {
            bail!(OptError::malformed(format!(
                "projection has {} expressions but {} field names",
                self.exprs.len(),
                self.field_names.len()
            )));
        }
        for expr in &self.exprs {
            expr.validate(inputs[0])?;
        }

        Ok(self
            .exprs
            .iter()
            .zip(self.field_names.iter())
            .map(|(expr, name)| Field::new(name.clone(), expr.data_type()))
            .collect())
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Projection(exprs=[{}], names=[{}])",
            self.exprs.iter().join(", "),
            self.field_names.iter().join(", ")
        )
    }
}
