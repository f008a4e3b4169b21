/// A query source - either one selector or a two-way left join
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A named reference to one logical table
    Selector { name: String },
    /// A left join of two sources
    ///
    /// Only selector-to-selector joins compile; nested joins are rejected.
    Join {
        left: Box<Source>,
        right: Box<Source>,
        condition: JoinCondition,
    },
}

impl Source {
    pub fn selector(name: impl Into<String>) -> Self {
        Self::Selector { name: name.into() }
    }

    pub fn join(left: Source, right: Source, condition: JoinCondition) -> Self {
        Self::Join {
            left: Box::new(left),
            right: Box::new(right),
            condition,
        }
    }
}

/// A join condition
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    /// Equality between one property on each side of the join
    Equi {
        selector1: String,
        property1: String,
        selector2: String,
        property2: String,
    },
}

impl JoinCondition {
    pub fn equi(
        selector1: impl Into<String>,
        property1: impl Into<String>,
        selector2: impl Into<String>,
        property2: impl Into<String>,
    ) -> Self {
        Self::Equi {
            selector1: selector1.into(),
            property1: property1.into(),
            selector2: selector2.into(),
            property2: property2.into(),
        }
    }
}
