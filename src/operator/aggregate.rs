use std::fmt;

use anyhow::bail;
use itertools::Itertools;
use smallvec::SmallVec;
use strum_macros::{Display, EnumString};

use crate::error::{OptError, OptResult};
use crate::expr::FieldIndex;
use crate::operator::LogicalOperatorTrait;
use crate::properties::{DataType, Field, Schema};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

/// Argument ordinals of an aggregate call. Order is part of the call's identity.
pub type AggregateArgs = SmallVec<[FieldIndex; 4]>;

/// One aggregate function application inside an [`Aggregate`].
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct AggregateCall {
    function: AggregateFunction,
    distinct: bool,
    args: AggregateArgs,
    result_type: DataType,
}

impl AggregateCall {
    pub fn new<I>(function: AggregateFunction, distinct: bool, args: I, result_type: DataType) -> Self
    where
        I: IntoIterator<Item = FieldIndex>,
    {
        Self {
            function,
            distinct,
            args: args.into_iter().collect(),
            result_type,
        }
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn args(&self) -> &[FieldIndex] {
        &self.args
    }

    pub fn result_type(&self) -> DataType {
        self.result_type
    }

    /// Copy of this call with different arguments and distinct flag.
    pub fn with_args<I>(&self, distinct: bool, args: I) -> Self
    where
        I: IntoIterator<Item = FieldIndex>,
    {
        Self::new(self.function, distinct, args, self.result_type)
    }

    fn validate(&self, input: &Schema) -> OptResult<()> {
        if self.distinct && self.args.is_empty() {
            bail!(OptError::malformed(format!(
                "distinct aggregate call {} has no arguments",
                self
            )));
        }
        if self.args.is_empty() && self.function != AggregateFunction::Count {
            bail!(OptError::malformed(format!(
                "aggregate call {} requires arguments",
                self
            )));
        }
        if let Some(arg) = self.args.iter().find(|arg| **arg >= input.len()) {
            bail!(OptError::malformed(format!(
                "argument ${} of aggregate call {} out of range for {} input fields",
                arg,
                self,
                input.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}(*)", self.function);
        }
        write!(
            f,
            "{}({}{})",
            self.function,
            if self.distinct { "DISTINCT " } else { "" },
            self.args.iter().map(|arg| format!("${}", arg)).join(", ")
        )
    }
}

/// Logical aggregate operator.
///
/// Groups by the first `group_count` input fields and outputs them verbatim, followed by one
/// field per call. An aggregate with no calls and `group_count` equal to the input width is a
/// `SELECT DISTINCT` over its input.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Aggregate {
    group_count: usize,
    calls: Vec<AggregateCall>,
}

impl Aggregate {
    pub fn new(group_count: usize, calls: Vec<AggregateCall>) -> Self {
        Self { group_count, calls }
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn calls(&self) -> &[AggregateCall] {
        &self.calls
    }

    pub fn contains_distinct_call(&self) -> bool {
        self.calls.iter().any(AggregateCall::is_distinct)
    }
}

impl LogicalOperatorTrait for Aggregate {
    fn input_count(&self) -> usize {
        1
    }

    fn derive_schema(&self, inputs: &[&Schema]) -> OptResult<Schema> {
        let input = inputs[0];
        if self.group_count > input.len() {
            bail!(OptError::malformed(format!(
                "aggregate groups by {} fields but input has {}",
                self.group_count,
                input.len()
            )));
        }
        for call in &self.calls {
            call.validate(input)?;
        }

        Ok(input.fields()[..self.group_count]
            .iter()
            .cloned()
            .chain(
                self.calls
                    .iter()
                    .map(|call| Field::new(call.to_string(), call.result_type())),
            )
            .collect())
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Aggregate(group_count={}, calls=[{}])",
            self.group_count,
            self.calls.iter().join(", ")
        )
    }
}
