use indexmap::IndexMap;
use nu_ansi_term::Color::{Green, Yellow};
use serde_json::json;
use tinyorm::{Aggregate, Database, Queryset, Table};
use tracing::{debug, info};

use crate::{
    error::{CliError, CliResult},
    utils::{parse_assignments, print_records, Colored},
};

pub struct Context {
    pub db: Database,
    pub tables: IndexMap<String, Table>,
    pub json: bool,
}

impl Context {
    fn table(&self, name: &str) -> CliResult<&Table> {
        self.tables
            .get(&name.to_lowercase())
            .ok_or_else(|| CliError::UnknownTable(name.to_string()))
    }

    fn report_changes(&self, qs: &Queryset, action: &str) -> CliResult<()> {
        debug!("{}", qs.statement());
        if self.json {
            println!(
                "{}",
                serde_json::to_string(&json!({ "rows_affected": qs.rows_affected() }))?
            );
        } else {
            info!("{} row(s) {action}", Colored(Green, qs.rows_affected()));
        }
        Ok(())
    }
}

pub fn schema(ctx: &Context, table: Option<&str>) -> CliResult<()> {
    match table {
        Some(name) => info!("{}", ctx.table(name)?.schema()),
        None => {
            for table in ctx.tables.values() {
                info!("{}", table.schema());
            }
        }
    }
    Ok(())
}

pub fn init(ctx: &Context) -> CliResult<()> {
    let tables: Vec<&Table> = ctx.tables.values().collect();
    ctx.db.create_tables_if_not_exists(&tables)?;

    if tables.is_empty() {
        info!("{}", Colored(Yellow, "No tables declared"));
    }
    for table in tables {
        info!("{} {}", Colored(Green, "created"), table.name());
    }
    Ok(())
}

pub fn select(ctx: &Context, table: &str, filters: &[String]) -> CliResult<()> {
    let table = ctx.table(table)?;
    let qs = table.objects().select(parse_assignments(filters)?)?;
    debug!("{}", qs.statement());
    print_records(table, qs.records(), ctx.json)
}

pub fn insert(ctx: &Context, table: &str, values: &[String]) -> CliResult<()> {
    let table = ctx.table(table)?;
    let qs = table.objects().insert(parse_assignments(values)?)?;
    debug!("{}", qs.statement());
    print_records(table, qs.records(), ctx.json)
}

pub fn update(ctx: &Context, table: &str, set: &[String], filters: &[String]) -> CliResult<()> {
    let table = ctx.table(table)?;
    let qs = table
        .objects()
        .update(parse_assignments(set)?, parse_assignments(filters)?)?;
    ctx.report_changes(&qs, "updated")
}

pub fn delete(ctx: &Context, table: &str, filters: &[String]) -> CliResult<()> {
    let table = ctx.table(table)?;
    let qs = table.objects().delete(parse_assignments(filters)?)?;
    ctx.report_changes(&qs, "deleted")
}

pub fn aggregate(
    ctx: &Context,
    function: Aggregate,
    table: &str,
    column: Option<&str>,
    filters: &[String],
) -> CliResult<()> {
    let table = ctx.table(table)?;
    let value = table
        .objects()
        .aggregate(function, column, parse_assignments(filters)?)?;

    if ctx.json {
        let output = json!({
            "function": function.to_string(),
            "column": column.unwrap_or("*"),
            "value": serde_json::to_value(&value)?,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        info!("{}", Colored(Green, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tinyorm::fields;
    use tinyorm_config::Config;

    use super::*;

    fn setup_ctx() -> Context {
        let config = Config::from_toml(
            r#"
            [[tables]]
            name = "User"

            [[tables.fields]]
            name = "username"
            type = "varchar"
            max_length = 50

            [[tables.fields]]
            name = "age"
            type = "integer"
            "#,
        )
        .unwrap();
        let db = config.open().unwrap();
        let tables = config.declare(&db).unwrap();
        Context {
            db,
            tables,
            json: true,
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_commands_round_trip() {
        let ctx = setup_ctx();
        insert(&ctx, "User", &args(&["username=User1", "age=30"])).unwrap();
        insert(&ctx, "user", &args(&["username=user2", "age=50"])).unwrap();
        select(&ctx, "user", &args(&["age__gt=20"])).unwrap();

        update(&ctx, "user", &args(&["age=31"]), &args(&["username=User1"])).unwrap();
        aggregate(&ctx, Aggregate::Sum, "user", Some("age"), &[]).unwrap();

        let user = ctx.table("user").unwrap();
        assert_eq!(
            user.objects().sum("age", fields! {}).unwrap(),
            tinyorm::Value::Integer(81)
        );

        delete(&ctx, "user", &args(&["age__lt=40"])).unwrap();
        assert_eq!(user.objects().count(fields! {}).unwrap(), 1);
    }

    #[test]
    fn test_unknown_table() {
        let ctx = setup_ctx();
        assert!(matches!(
            select(&ctx, "order", &[]),
            Err(CliError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_schema_and_init() {
        let ctx = setup_ctx();
        schema(&ctx, None).unwrap();
        schema(&ctx, Some("User")).unwrap();
        init(&ctx).unwrap();
        assert_eq!(ctx.db.table_names().unwrap(), vec!["user".to_string()]);
    }
}
