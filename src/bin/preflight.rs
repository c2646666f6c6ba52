use snapshot_sync::infra::{logging, Config};
use snapshot_sync::PgSnapshotStore;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--table <name>]\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL, SYNC_API_KEY\n\
         Optional:\n\
           SYNC_DEFAULT_TABLE, SYNC_SCHEMA, SYNC_SCHEMA_FILE\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let table_arg = match args.iter().position(|a| a == "--table") {
        Some(i) => match args.get(i + 1) {
            Some(t) => Some(t.clone()),
            None => usage_and_exit(),
        },
        None => None,
    };

    let config = Config::from_env()?;
    logging::init(config.log_format);

    let table = table_arg.unwrap_or_else(|| config.default_table.clone());
    if !snapshot_sync::domain::is_valid_identifier(&table) {
        anyhow::bail!("table name '{}' is not a plain identifier", table);
    }

    println!("> Preflight:");
    println!("  table={}", table);
    println!(
        "  schema: {} columns, chunk size {}",
        config.schema.columns().len(),
        config.schema.chunk_size()
    );
    println!("  clear policy={:?} lock_table={}", config.clear_policy, config.lock_table);

    let store = PgSnapshotStore::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
    println!("  Database connection OK.");

    let actual = store.table_columns(&table).await?;
    if actual.is_empty() {
        anyhow::bail!("table '{}' does not exist in the current schema", table);
    }

    let missing: Vec<&str> = config
        .schema
        .column_names()
        .filter(|c| !actual.iter().any(|a| a == c))
        .collect();
    let extra: Vec<&str> = actual
        .iter()
        .map(String::as_str)
        .filter(|a| !config.schema.column_names().any(|c| c == *a))
        .collect();

    if !extra.is_empty() {
        println!("  Note: columns not written by sync (left NULL/default): {}", extra.join(", "));
    }
    if !missing.is_empty() {
        anyhow::bail!(
            "table '{}' is missing columns the sync writes: {}",
            table,
            missing.join(", ")
        );
    }
    println!("  All {} sync columns present.", config.schema.columns().len());

    let rows = store.row_count(&table).await?;
    println!("  Current row count: {}", rows);

    store.pool().close().await;
    println!("> Preflight OK.");
    Ok(())
}
