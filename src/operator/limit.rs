use std::fmt;

use crate::error::OptResult;
use crate::operator::LogicalOperatorTrait;
use crate::properties::Schema;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Limit {
    limit: usize,
}

impl Limit {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl LogicalOperatorTrait for Limit {
    fn input_count(&self) -> usize {
        1
    }

    fn derive_schema(&self, inputs: &[&Schema]) -> OptResult<Schema> {
        Ok(inputs[0].clone())
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Limit({})", self.limit)
    }
}
