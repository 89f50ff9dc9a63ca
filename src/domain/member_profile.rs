use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Checked(bool),
}

/// Extra profile columns a member filled in on the groups service, keyed by
/// column id. Only columns that carry a value are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberProfile {
    columns: HashMap<u32, ColumnValue>,
}

impl MemberProfile {
    pub fn insert(&mut self, column: u32, value: ColumnValue) {
        self.columns.insert(column, value);
    }

    pub fn text(&self, column: u32) -> Option<&str> {
        match self.columns.get(&column) {
            Some(ColumnValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn checked(&self, column: u32) -> Option<bool> {
        match self.columns.get(&column) {
            Some(ColumnValue::Checked(checked)) => Some(*checked),
            _ => None,
        }
    }
}
