use std::fmt;

use crate::error::OptResult;
use crate::operator::LogicalOperatorTrait;
use crate::properties::Schema;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TableScan {
    table_name: String,
    schema: Schema,
}

impl TableScan {
    pub fn new<S: Into<String>>(table_name: S, schema: Schema) -> Self {
        Self {
            table_name: table_name.into(),
            schema,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl LogicalOperatorTrait for TableScan {
    fn input_count(&self) -> usize {
        0
    }

    fn derive_schema(&self, _inputs: &[&Schema]) -> OptResult<Schema> {
        Ok(self.schema.clone())
    }
}

impl fmt::Display for TableScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableScan({})", self.table_name)
    }
}
