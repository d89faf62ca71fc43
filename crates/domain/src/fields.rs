//! The fixed set of editable flag columns.

use serde::Serialize;

/// API name of the collection that stores feature flags.
pub const COLLECTION: &str = "Feature_Flag__c";

/// How a column's value is rendered and edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Boolean,
    Number,
}

/// One of the editable fields of a feature flag record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagField {
    Name,
    Description,
    IsActive,
    PercentageRollout,
}

impl FlagField {
    /// All fields in grid order.
    pub const ALL: [FlagField; 4] = [
        FlagField::Name,
        FlagField::Description,
        FlagField::IsActive,
        FlagField::PercentageRollout,
    ];

    /// Returns the field's API name as used by the listing and mutation services.
    pub fn api_name(&self) -> &'static str {
        match self {
            FlagField::Name => "Name",
            FlagField::Description => "Description__c",
            FlagField::IsActive => "Is_Active__c",
            FlagField::PercentageRollout => "Percentage_Rollout__c",
        }
    }

    /// Returns the column header.
    pub fn label(&self) -> &'static str {
        match self {
            FlagField::Name => "Name",
            FlagField::Description => "Description",
            FlagField::IsActive => "Is Active",
            FlagField::PercentageRollout => "Percentage Rollout",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            FlagField::Name | FlagField::Description => ColumnKind::Text,
            FlagField::IsActive => ColumnKind::Boolean,
            FlagField::PercentageRollout => ColumnKind::Number,
        }
    }

    /// Returns `<collection>.<api name>`, the form listing requests use.
    pub fn qualified(&self, collection: &str) -> String {
        format!("{}.{}", collection, self.api_name())
    }

    /// Looks up a field by API name.
    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.api_name() == name)
    }
}

impl std::fmt::Display for FlagField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Grid column metadata handed to whatever renders the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub label: &'static str,
    #[serde(rename = "fieldName")]
    pub field_name: &'static str,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    pub editable: bool,
}

/// Returns the column layout: every flag field, all editable.
pub fn columns() -> Vec<Column> {
    FlagField::ALL
        .into_iter()
        .map(|field| Column {
            label: field.label(),
            field_name: field.api_name(),
            kind: field.kind(),
            editable: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_name_lookup() {
        for field in FlagField::ALL {
            assert_eq!(FlagField::from_api_name(field.api_name()), Some(field));
        }
        assert_eq!(FlagField::from_api_name("Owner"), None);
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            FlagField::IsActive.qualified(COLLECTION),
            "Feature_Flag__c.Is_Active__c"
        );
    }

    #[test]
    fn test_columns_layout() {
        let cols = columns();
        assert_eq!(cols.len(), 4);
        assert!(cols.iter().all(|c| c.editable));
        assert_eq!(cols[2].label, "Is Active");
        assert_eq!(cols[2].kind, ColumnKind::Boolean);
        assert_eq!(cols[3].kind, ColumnKind::Number);
    }

    #[test]
    fn test_column_serialization() {
        let json = serde_json::to_value(&columns()[1]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "label": "Description",
                "fieldName": "Description__c",
                "type": "text",
                "editable": true
            })
        );
    }
}
