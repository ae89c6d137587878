use crate::expr::{Expr, FieldIndex, FieldRef, ScalarOperator, ScalarValue};
use crate::properties::DataType;

/// Reference to input field `index`.
pub fn col(index: FieldIndex, data_type: DataType) -> Expr {
    Expr::Column(FieldRef::new(index, data_type))
}

pub fn lit(value: ScalarValue) -> Expr {
    Expr::Literal(value)
}

pub fn lit_bool(value: bool) -> Expr {
    Expr::Literal(ScalarValue::Boolean(value))
}

pub fn binary(op: ScalarOperator, left: Expr, right: Expr) -> Expr {
    Expr::Call {
        op,
        args: vec![left, right],
    }
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    binary(ScalarOperator::Equals, left, right)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    binary(ScalarOperator::And, left, right)
}

/// Folds predicates into `((p0 AND p1) AND p2) ...`.
///
/// Returns `None` when there is nothing to fold.
pub fn conjunction<I>(predicates: I) -> Option<Expr>
where
    I: IntoIterator<Item = Expr>,
{
    predicates.into_iter().reduce(and)
}

impl Expr {
    pub fn eq_to(self, other: Expr) -> Expr {
        eq(self, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        and(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conjunction_is_left_associative() {
        let p = |i| col(i, DataType::Int64).eq_to(col(i + 10, DataType::Int64));

        let folded = conjunction(vec![p(0), p(1), p(2)]).unwrap();
        assert_eq!(p(0).and(p(1)).and(p(2)), folded);
        assert_eq!(Some(p(0)), conjunction(vec![p(0)]));
        assert_eq!(None, conjunction(Vec::new()));
    }
}
