use crate::name::Name;
use crate::value::Value;

/// A named property with zero or more typed values.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    name: Name,
    values: Vec<Value>,
}

impl Property {
    /// Name of the property that carries a node's own identifier.
    pub const UUID_PROPERTY: &'static str = "graft:uuid";

    pub fn new(name: Name, values: Vec<Value>) -> Self {
        Self { name, values }
    }

    pub fn single(name: Name, value: impl Into<Value>) -> Self {
        Self {
            name,
            values: vec![value.into()],
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn is_uuid_property(&self) -> bool {
        self.name.as_str() == Self::UUID_PROPERTY
    }
}

impl<'a> IntoIterator for &'a Property {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
