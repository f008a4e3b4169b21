/// A dynamic operand - the left-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicOperand {
    /// A property of a selector, compiled to a column reference
    PropertyValue {
        selector_name: String,
        property_name: String,
    },
    /// The lower-cased inner operand (SQL `LOWER`)
    LowerCase(Box<DynamicOperand>),
    /// The upper-cased inner operand (SQL `UPPER`)
    UpperCase(Box<DynamicOperand>),
}

impl DynamicOperand {
    pub fn property(selector_name: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self::PropertyValue {
            selector_name: selector_name.into(),
            property_name: property_name.into(),
        }
    }

    pub fn lower_case(inner: DynamicOperand) -> Self {
        Self::LowerCase(Box::new(inner))
    }

    pub fn upper_case(inner: DynamicOperand) -> Self {
        Self::UpperCase(Box::new(inner))
    }
}
