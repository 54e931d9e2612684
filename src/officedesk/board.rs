//! Kanban-style grouping for workflow entities (sales opportunities,
//! projects).

use crate::model::Record;
use serde::{Deserialize, Serialize};

/// Key of the trailing column that collects records with no known stage.
pub const UNASSIGNED: &str = "unassigned";

/// Which field drives the board and the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub field: String,
    pub columns: Vec<String>,
}

impl BoardLayout {
    pub fn new(field: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            field: field.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub field: String,
    pub columns: Vec<Column>,
}

impl Board {
    /// Groups records into the layout's columns, keeping record order inside
    /// each column. Every configured column is present even when empty; the
    /// [`UNASSIGNED`] column only appears when something lands in it.
    pub fn build(layout: &BoardLayout, records: &[Record]) -> Board {
        let mut columns: Vec<Column> = layout
            .columns
            .iter()
            .map(|key| Column {
                key: key.clone(),
                records: Vec::new(),
            })
            .collect();
        let mut unassigned = Vec::new();

        for record in records {
            let stage = record.text(&layout.field);
            let slot = stage
                .as_deref()
                .and_then(|stage| columns.iter().position(|c| c.key == stage));
            match slot {
                Some(index) => columns[index].records.push(record.clone()),
                None => unassigned.push(record.clone()),
            }
        }

        if !unassigned.is_empty() {
            columns.push(Column {
                key: UNASSIGNED.to_string(),
                records: unassigned,
            });
        }

        Board {
            field: layout.field.clone(),
            columns,
        }
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.records.len()).sum()
    }
}
