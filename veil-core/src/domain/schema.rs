// veil-core/src/domain/schema.rs

use serde::{Deserialize, Serialize};

/// Relational schema the physical design is completed against.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Definitions {
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RelationDef {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl Definitions {
    pub fn from_pairs(pairs: Vec<(&str, Vec<&str>)>) -> Self {
        let relations = pairs
            .into_iter()
            .map(|(name, columns)| RelationDef {
                name: name.to_string(),
                columns: columns
                    .into_iter()
                    .map(|c| ColumnDef {
                        name: c.to_string(),
                        data_type: None,
                    })
                    .collect(),
            })
            .collect();
        Self { relations }
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Every `(relation, column)` pair, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.relations.iter().flat_map(|r| {
            r.columns
                .iter()
                .map(move |c| (r.name.as_str(), c.name.as_str()))
        })
    }
}

impl RelationDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_deserialization() -> anyhow::Result<()> {
        let yaml = r#"
relations:
  - name: emp
    columns:
      - { name: id, type: int }
      - { name: salary, type: decimal }
  - name: dept
    columns:
      - { name: id }
"#;
        let defs: Definitions = serde_yaml::from_str(yaml)?;

        assert_eq!(defs.relations.len(), 2);
        let emp = defs.relation("emp").unwrap();
        assert_eq!(emp.column("salary").unwrap().data_type.as_deref(), Some("decimal"));
        assert!(defs.relation("dept").unwrap().column("salary").is_none());

        let pairs: Vec<(&str, &str)> = defs.columns().collect();
        assert_eq!(pairs, vec![("emp", "id"), ("emp", "salary"), ("dept", "id")]);
        Ok(())
    }
}
