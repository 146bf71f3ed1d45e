use std::{io::Write, path::Path, process, sync::Arc};

use magblocks::{
    application::{
        bootstrap::{MagazineRuntime, bootstrap},
        error::AppError,
        registry,
        repos::ContentRepository,
    },
    cache::CacheConfig,
    config::{self, Command, RenderArgs, SchemaArgs},
    domain::{fragment::Fragment, types::BlockVariant},
    infra::{error::InfraError, memory::InMemoryRepository, telemetry},
};
use serde_json::{Map, Value};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(source = report.source, chain = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, chain = ?report.messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let command = cli_args
        .command
        .unwrap_or_else(|| Command::Schema(SchemaArgs::default()));

    match command {
        Command::Schema(args) => run_schema(args),
        Command::Render(args) => run_render(settings, *args).await,
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), AppError> {
    let schemas: Vec<_> = match args.block.as_deref() {
        Some(tag) => {
            let variant =
                BlockVariant::from_tag(tag).ok_or_else(|| AppError::UnknownBlock(tag.to_string()))?;
            vec![registry::schema(variant)]
        }
        None => BlockVariant::ALL.iter().copied().map(registry::schema).collect(),
    };

    let json = serde_json::to_string_pretty(&schemas)
        .map_err(|err| AppError::unexpected(format!("failed to encode schema: {err}")))?;
    write_stdout(&json)
}

async fn run_render(settings: config::Settings, args: RenderArgs) -> Result<(), AppError> {
    if BlockVariant::from_tag(&args.block).is_none() {
        return Err(AppError::UnknownBlock(args.block));
    }
    let attributes = read_attributes(&args)?;

    let repository = open_repository(settings.content.fixture.as_deref())?;
    let runtime = bootstrap(
        repository,
        CacheConfig::from(&settings.cache),
        settings.render.timezone,
    );

    let outcome = render_repeatedly(&runtime, &args.block, &attributes, args.repeat).await;
    runtime.shutdown().await?;
    write_stdout(outcome?.as_str())
}

async fn render_repeatedly(
    runtime: &MagazineRuntime,
    tag: &str,
    attributes: &Map<String, Value>,
    repeat: u32,
) -> Result<Fragment, AppError> {
    let mut fragment = None;
    for round in 1..=repeat {
        let rendered = runtime.registry().render(tag, attributes).await;
        info!(
            target = "magblocks::cli",
            block = tag,
            round,
            bytes = rendered.len(),
            cached = runtime.cache().len(),
            "Rendered block"
        );
        fragment = Some(rendered);
    }
    fragment.ok_or_else(|| AppError::validation("repeat must be at least 1"))
}

fn read_attributes(args: &RenderArgs) -> Result<Map<String, Value>, AppError> {
    let source = match (args.options.as_ref(), args.options_file.as_ref()) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(InfraError::from)?,
        (None, None) => return Ok(Map::new()),
    };

    match serde_json::from_str::<Value>(&source) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::validation("block options must be a JSON object")),
        Err(err) => Err(AppError::validation(format!("invalid block options: {err}"))),
    }
}

fn open_repository(fixture: Option<&Path>) -> Result<Arc<dyn ContentRepository>, AppError> {
    let repository = match fixture {
        Some(path) => InMemoryRepository::from_toml_file(path)?,
        None => InMemoryRepository::new(),
    };
    info!(
        target = "magblocks::cli",
        items = repository.len(),
        "Content repository ready"
    );
    Ok(Arc::new(repository))
}

fn write_stdout(text: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").map_err(InfraError::from)?;
    stdout.flush().map_err(InfraError::from)?;
    Ok(())
}
