use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use query_filter::{FieldConfigRegistry, ParserResult, QueryFilterError, QueryFilterParser, RegistryConfig};

const DEFAULT_CONFIG: &str = "field_config.json";
const ENV_LOG: &str = "QUERY_FILTER_LOG";

fn init_logging() {
    let filter = env::var(ENV_LOG)
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .with_env_filter(filter)
        .init();
}

/// 加载字段注册表：显式指定的文件必须存在；否则优先使用默认JSON配置，失败时使用演示配置
fn load_registry(explicit: Option<&str>) -> Result<FieldConfigRegistry> {
    if let Some(path) = explicit {
        let config = RegistryConfig::from_json_file(path)
            .with_context(|| format!("failed to load field config {}", path))?;
        tracing::info!(path, fields = config.fields.len(), "loaded field config");
        return Ok(config.into_registry());
    }

    if Path::new(DEFAULT_CONFIG).exists() {
        let config = RegistryConfig::from_json_file(DEFAULT_CONFIG)
            .with_context(|| format!("failed to load field config {}", DEFAULT_CONFIG))?;
        tracing::info!(path = DEFAULT_CONFIG, fields = config.fields.len(), "loaded field config");
        return Ok(config.into_registry());
    }

    tracing::info!("no field config found, using demo fields");
    Ok(RegistryConfig::demo().into_registry())
}

fn print_fields(registry: &FieldConfigRegistry) {
    for (name, field) in registry.iter() {
        let operators: Vec<_> = field.allowed_operators.iter().map(|k| k.keyword()).collect();
        println!(
            "  {} -> {} ({}) [{}]{}{}",
            name,
            field.model_name,
            field.field_type,
            operators.join(", "),
            if field.folds_case() { " case-insensitive" } else { "" },
            if field.require_not_null_guard { " not-null-guard" } else { "" },
        );
    }
}

fn print_result(result: &ParserResult) -> Result<()> {
    println!("predicate: {}", result.predicate);
    for (i, value) in result.values.iter().enumerate() {
        println!("  {{{}}} = {} ({})", i, value, value.type_name());
    }
    println!("json: {}", serde_json::to_string(result)?);
    Ok(())
}

fn print_error(filter: &str, err: &QueryFilterError) {
    println!("✗ {}", err);
    println!("  {}", filter);
    let width = err.text.chars().count().max(1);
    let offset = filter.get(..err.span.start).unwrap_or(filter).chars().count();
    println!("  {}{}", " ".repeat(offset), "^".repeat(width));
}

fn main() -> Result<()> {
    init_logging();

    let config_path = env::args().nth(1);
    let registry = load_registry(config_path.as_deref())?;
    let parser = QueryFilterParser::new(&registry);

    println!("--- query_filter: filter → predicate ---");
    println!("fields:");
    print_fields(&registry);
    println!("enter a filter, :fields to list fields, :quit to exit");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let filter = line.trim();
                if filter.is_empty() {
                    continue;
                }
                editor.add_history_entry(filter)?;
                match filter {
                    ":quit" | ":q" => break,
                    ":fields" => print_fields(&registry),
                    _ => match parser.parse(filter) {
                        Ok(result) => print_result(&result)?,
                        Err(err) => print_error(filter, &err),
                    },
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
