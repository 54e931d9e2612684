//! Presets for the entities the console manages: endpoints, identifier key,
//! filters, table columns and board layouts.

use crate::board::BoardLayout;
use crate::filter::FilterSpec;
use crate::model::IdKey;
use crate::service::Endpoints;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    People,
    Clients,
    Projects,
    Communications,
    Opportunities,
    Expenses,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::People,
        EntityKind::Clients,
        EntityKind::Projects,
        EntityKind::Communications,
        EntityKind::Opportunities,
        EntityKind::Expenses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::People => "people",
            EntityKind::Clients => "clients",
            EntityKind::Projects => "projects",
            EntityKind::Communications => "communications",
            EntityKind::Opportunities => "opportunities",
            EntityKind::Expenses => "expenses",
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        match self {
            EntityKind::People => Endpoints {
                list: "/empleados".into(),
                create: "/empleados/crear".into(),
                update: "/empleados/actualizar/{id}".into(),
                delete: Some("/empleados/eliminar/{id}".into()),
                filtered: None,
            }
            .with_filtered("/obtenerEmpleadosPorDepartamentos", "departamentos"),
            EntityKind::Clients => Endpoints {
                list: "/clientes".into(),
                create: "/clientes/crear".into(),
                update: "/clientes/actualizar/{id}".into(),
                delete: Some("/clientes/eliminar/{id}".into()),
                filtered: None,
            },
            // Communications are an append-only log.
            EntityKind::Communications => Endpoints::rest("/api/communications").without_delete(),
            EntityKind::Projects => Endpoints::rest("/api/projects"),
            EntityKind::Opportunities => Endpoints::rest("/api/opportunities"),
            EntityKind::Expenses => Endpoints::rest("/api/expenses"),
        }
    }

    pub fn id_key(&self) -> IdKey {
        match self {
            EntityKind::People => IdKey::new("empleadoId"),
            _ => IdKey::default(),
        }
    }

    /// Record field the server-side filtered list selects on.
    pub fn filtered_field(&self) -> Option<&'static str> {
        match self {
            EntityKind::People => Some("department"),
            _ => None,
        }
    }

    pub fn filter_spec(&self) -> FilterSpec {
        match self {
            EntityKind::People => FilterSpec::new()
                .search("search", &["name", "empleadoId", "id", "position", "email"])
                .categorical("department", "department")
                .categorical("status", "status")
                .date_range("from", "to", "hireDate"),
            EntityKind::Clients => FilterSpec::new()
                .search("search", &["name", "company", "email", "id"])
                .categorical("type", "type")
                .categorical("status", "status")
                .date_range("from", "to", "createdAt"),
            EntityKind::Projects => FilterSpec::new()
                .search("search", &["name", "client.name", "id"])
                .categorical("status", "status")
                .categorical("priority", "priority")
                .date_range("from", "to", "startDate"),
            EntityKind::Communications => FilterSpec::new()
                .search("search", &["subject", "client.name", "body"])
                .categorical("channel", "channel")
                .categorical("direction", "direction")
                .date_range("from", "to", "date"),
            EntityKind::Opportunities => FilterSpec::new()
                .search("search", &["title", "client.name", "owner"])
                .categorical("stage", "stage")
                .categorical("owner", "owner")
                .date_range("from", "to", "expectedClose"),
            EntityKind::Expenses => FilterSpec::new()
                .search("search", &["description", "vendor"])
                .categorical("category", "category")
                .categorical("paymentMethod", "paymentMethod")
                .date_range("from", "to", "date"),
        }
    }

    /// Fields shown as table columns, most important first.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::People => &["empleadoId", "name", "department", "position", "status"],
            EntityKind::Clients => &["id", "name", "company", "type", "status"],
            EntityKind::Projects => &["id", "name", "client.name", "status", "startDate"],
            EntityKind::Communications => &["id", "date", "channel", "subject", "client.name"],
            EntityKind::Opportunities => &["id", "title", "client.name", "stage", "amount"],
            EntityKind::Expenses => &["id", "date", "category", "description", "amount"],
        }
    }

    /// Field used as a card title on boards.
    pub fn title_field(&self) -> &'static str {
        match self {
            EntityKind::Opportunities => "title",
            EntityKind::Communications => "subject",
            EntityKind::Expenses => "description",
            _ => "name",
        }
    }

    pub fn board(&self) -> Option<BoardLayout> {
        match self {
            EntityKind::Opportunities => Some(BoardLayout::new(
                "stage",
                &["lead", "qualified", "proposal", "negotiation", "won", "lost"],
            )),
            EntityKind::Projects => Some(BoardLayout::new(
                "status",
                &["backlog", "in_progress", "review", "done"],
            )),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "people" | "person" | "personnel" | "employees" | "empleados" => Ok(EntityKind::People),
            "clients" | "client" | "clientes" => Ok(EntityKind::Clients),
            "projects" | "project" => Ok(EntityKind::Projects),
            "communications" | "communication" | "comms" => Ok(EntityKind::Communications),
            "opportunities" | "opportunity" | "deals" => Ok(EntityKind::Opportunities),
            "expenses" | "expense" | "gastos" => Ok(EntityKind::Expenses),
            other => Err(format!(
                "unknown entity '{}', expected one of: {}",
                other,
                EntityKind::ALL
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}
