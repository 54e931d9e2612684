//! # CLI Dispatch
//!
//! `run()` parses arguments, wires a [`DeskContext`] and sends each command to
//! its handler. Every handler opens its own [`ViewScope`]: a command is one
//! view, and the scope ends when the handler returns.

use super::render::{print_board, print_message, print_records, MessageLevel};
use super::setup::Commands;
use officedesk::board::Board;
use officedesk::config::{DeskConfig, CONFIG_KEYS};
use officedesk::entities::EntityKind;
use officedesk::error::{DeskError, Result};
use officedesk::filter::FilterCriteria;
use officedesk::init::{config_dir, initialize, DeskContext};
use officedesk::model::{Record, RecordId};
use officedesk::resource::ViewScope;
use serde_json::Value;

pub async fn run(command: Commands) -> Result<()> {
    let dir = config_dir()?;

    // These never touch the network.
    match &command {
        Commands::Entities => return handle_entities(),
        Commands::Config { key, value } => {
            return handle_config(&dir, key.as_deref(), value.as_deref())
        }
        _ => {}
    }

    let ctx = initialize(&dir)?;
    match command {
        Commands::Login { token } => handle_login(&ctx, &token),
        Commands::Logout => handle_logout(&ctx),
        Commands::List {
            entity,
            search,
            criteria,
            from,
            to,
            server_filter,
            json,
        } => {
            let mut filter = FilterCriteria::from_iter(criteria);
            if let Some(search) = search {
                filter.set("search", search);
            }
            if let Some(from) = from {
                filter.set("from", from);
            }
            if let Some(to) = to {
                filter.set("to", to);
            }
            handle_list(&ctx, parse_entity(&entity)?, filter, server_filter, json).await
        }
        Commands::Board { entity } => handle_board(&ctx, parse_entity(&entity)?).await,
        Commands::Create { entity, fields } => {
            handle_create(&ctx, parse_entity(&entity)?, fields).await
        }
        Commands::Update { entity, id, fields } => {
            handle_update(&ctx, parse_entity(&entity)?, id.into(), fields).await
        }
        Commands::Move { entity, id, column } => {
            handle_move(&ctx, parse_entity(&entity)?, id.into(), &column).await
        }
        Commands::Delete { entity, id } => {
            handle_delete(&ctx, parse_entity(&entity)?, id.into()).await
        }
        Commands::Entities | Commands::Config { .. } => Ok(()),
    }
}

fn parse_entity(name: &str) -> Result<EntityKind> {
    name.parse().map_err(DeskError::Unsupported)
}

fn record_from(fields: Vec<(String, Value)>) -> Record {
    fields.into_iter().collect()
}

fn handle_entities() -> Result<()> {
    for kind in EntityKind::ALL {
        let mut traits = Vec::new();
        if kind.board().is_some() {
            traits.push("board");
        }
        if kind.endpoints().filtered.is_some() {
            traits.push("server filter");
        }
        if kind.endpoints().delete.is_none() {
            traits.push("no delete");
        }
        if traits.is_empty() {
            println!("{}", kind);
        } else {
            println!("{} ({})", kind, traits.join(", "));
        }
    }
    Ok(())
}

fn handle_login(ctx: &DeskContext, token: &str) -> Result<()> {
    ctx.api.login(token)?;
    print_message(MessageLevel::Success, "Logged in.");
    Ok(())
}

fn handle_logout(ctx: &DeskContext) -> Result<()> {
    ctx.api.logout()?;
    print_message(MessageLevel::Success, "Logged out.");
    Ok(())
}

async fn handle_list(
    ctx: &DeskContext,
    kind: EntityKind,
    criteria: FilterCriteria,
    server_filter: Vec<String>,
    json: bool,
) -> Result<()> {
    let spec = ctx.api.filter_spec(kind);
    let known = spec.criteria_names();
    if let Some(unknown) = criteria.names().find(|name| !known.contains(name)) {
        return Err(DeskError::InvalidCriteria(format!(
            "{} cannot be filtered by '{}', expected one of: {}",
            kind,
            unknown,
            known.join(", ")
        )));
    }

    let scope = ViewScope::new();
    let resource = ctx.api.resource(kind, &scope);
    if server_filter.is_empty() {
        resource.fetch_all().await?;
    } else {
        resource.fetch_filtered(&server_filter).await?;
    }
    let records = resource.filtered(&spec, &criteria).await?;

    if json {
        let values: Vec<Value> = records.into_iter().map(Record::into_value).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print_records(kind, &records);
    }
    Ok(())
}

async fn handle_board(ctx: &DeskContext, kind: EntityKind) -> Result<()> {
    let layout = ctx.api.board_layout(kind)?;
    let scope = ViewScope::new();
    let resource = ctx.api.resource(kind, &scope);
    let records = resource.fetch_all().await?;
    print_board(kind, &Board::build(&layout, &records));
    Ok(())
}

async fn handle_create(ctx: &DeskContext, kind: EntityKind, fields: Vec<(String, Value)>) -> Result<()> {
    let scope = ViewScope::new();
    let resource = ctx.api.resource(kind, &scope);
    match resource.create(record_from(fields)).await? {
        Some(created) => {
            let id = created
                .id(&resource.options().id_key)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            print_message(MessageLevel::Success, &format!("Created {} #{}", kind, id));
        }
        None => print_message(MessageLevel::Success, &format!("Created {}", kind)),
    }
    Ok(())
}

async fn handle_update(
    ctx: &DeskContext,
    kind: EntityKind,
    id: RecordId,
    fields: Vec<(String, Value)>,
) -> Result<()> {
    let scope = ViewScope::new();
    let resource = ctx.api.resource(kind, &scope);
    resource.update(&id, record_from(fields)).await?;
    print_message(MessageLevel::Success, &format!("Updated {} #{}", kind, id));
    Ok(())
}

async fn handle_move(ctx: &DeskContext, kind: EntityKind, id: RecordId, column: &str) -> Result<()> {
    let layout = ctx.api.board_layout(kind)?;
    if !layout.has_column(column) {
        return Err(DeskError::Unsupported(format!(
            "'{}' is not a column of the {} board, expected one of: {}",
            column,
            kind,
            layout.columns.join(", ")
        )));
    }

    let scope = ViewScope::new();
    let resource = ctx.api.resource(kind, &scope);
    resource.move_to(&id, &layout.field, column).await?;
    print_message(
        MessageLevel::Success,
        &format!("Moved {} #{} to {}", kind, id, column),
    );
    Ok(())
}

async fn handle_delete(ctx: &DeskContext, kind: EntityKind, id: RecordId) -> Result<()> {
    let scope = ViewScope::new();
    let resource = ctx.api.resource(kind, &scope);
    resource.remove(&id).await?;
    print_message(MessageLevel::Success, &format!("Deleted {} #{}", kind, id));
    Ok(())
}

fn handle_config(dir: &std::path::Path, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut config = DeskConfig::load(dir)?;
    match (key, value) {
        (None, _) => {
            for key in CONFIG_KEYS {
                println!("{} = {}", key, config.get(key).unwrap_or_default());
            }
        }
        (Some(key), None) => match config.get(key) {
            Some(value) => println!("{}", value),
            None => {
                return Err(DeskError::Config(format!(
                    "unknown config key '{}', expected one of: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )))
            }
        },
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save(dir)?;
            let display = config.get(key).unwrap_or_else(|| value.to_string());
            print_message(MessageLevel::Success, &format!("{} set to {}", key, display));
        }
    }
    Ok(())
}
