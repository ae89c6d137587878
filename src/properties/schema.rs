use std::fmt;

use derive_more::Display as DeriveDisplay;
use itertools::Itertools;
use strum_macros::{Display, EnumString};

/// Data type of a field or scalar expression.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Display, EnumString)]
pub enum DataType {
    Boolean,
    Int64,
    Float64,
    Utf8,
}

/// One named, typed column of an operator's output.
#[derive(Clone, Debug, Hash, Eq, PartialEq, DeriveDisplay)]
#[display(fmt = "{}: {}", name, data_type)]
pub struct Field {
    name: String,
    data_type: DataType,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// Ordered field list produced by an operator.
///
/// Field order is significant: parents address fields by ordinal.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Schema of a join: all left fields followed by all right fields.
    ///
    /// Right field `j` ends up at `self.len() + j`.
    pub fn join(&self, right: &Schema) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .chain(right.fields.iter())
                .cloned()
                .collect(),
        }
    }

    /// Tests whether `other` can stand in for `self`: same arity, same type at every position.
    ///
    /// Field names are ignored.
    pub fn is_compatible_with(&self, other: &Schema) -> bool {
        self.len() == other.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.data_type == b.data_type)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.fields.iter().join(", "))
    }
}

impl FromIterator<Field> for Schema {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Schema::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn schema(fields: &[(&str, DataType)]) -> Schema {
        fields
            .iter()
            .map(|(name, data_type)| Field::new(*name, *data_type))
            .collect()
    }

    #[test]
    fn test_join_keeps_left_then_right() {
        let left = schema(&[("a", DataType::Int64), ("b", DataType::Utf8)]);
        let right = schema(&[("c", DataType::Boolean)]);

        let joined = left.join(&right);
        assert_eq!(3, joined.len());
        assert_eq!("a", joined.fields()[0].name());
        assert_eq!("b", joined.fields()[1].name());
        assert_eq!("c", joined.fields()[left.len()].name());
    }

    #[test]
    fn test_compatibility_ignores_names() {
        let a = schema(&[("a", DataType::Int64), ("b", DataType::Utf8)]);
        let b = schema(&[("x", DataType::Int64), ("y", DataType::Utf8)]);
        let c = schema(&[("x", DataType::Utf8), ("y", DataType::Int64)]);
        let d = schema(&[("x", DataType::Int64)]);

        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
        assert!(!a.is_compatible_with(&d));
    }

    #[test]
    fn test_display() {
        let s = schema(&[("deptno", DataType::Int64), ("gender", DataType::Utf8)]);
        assert_eq!("[deptno: Int64, gender: Utf8]", s.to_string());
        assert_eq!(DataType::Utf8, DataType::from_str("Utf8").unwrap());
    }
}
