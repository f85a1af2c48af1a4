use anyhow::Context;
use clap::{Parser, ValueEnum};
use linqmql::{
    expression::Expression,
    options::TranslationOptions,
    result,
    serializer::{ClassMap, StandardSerializerRegistry},
    translator::TranslationContext,
    usererror::UserError,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::{env, fs, path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt::time, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// A lambda over the current document, rendered as an aggregation expression.
    Expression,
    /// A predicate lambda, rendered as a match filter.
    Filter,
    /// A queryable method chain, rendered as a pipeline.
    Pipeline,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about=None)]
struct Cli {
    #[arg(index = 1, help = "A JSON file holding the serialized expression tree to translate")]
    expression: PathBuf,
    #[arg(
        short,
        long,
        help = "A JSON file holding `classMaps` and translation `options`"
    )]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = Mode::Pipeline)]
    mode: Mode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Config {
    options: TranslationOptions,
    class_maps: Vec<ClassMap>,
}

fn init_logger() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_timer(time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .init();
    info!("Logger initialized with level: {}", log_level);
}

fn read_json<T: DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let contents = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// Formats translation failures the way users see them: the technical
/// message followed by a hint when one exists.
fn describe(error: result::Error) -> anyhow::Error {
    match error {
        result::Error::Translator(e) => match e.user_message() {
            Some(hint) => anyhow::anyhow!("{} (code {})\n{}", e.technical_message(), e.code(), hint),
            None => anyhow::anyhow!("{} (code {})", e.technical_message(), e.code()),
        },
        e => anyhow::anyhow!(e),
    }
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Cli::parse();

    let config: Config = match &args.config {
        Some(path) => read_json(path)?,
        None => Config::default(),
    };
    let expression: Expression = read_json(&args.expression)?;
    let registry = StandardSerializerRegistry::new(config.class_maps).map_err(|e| describe(e.into()))?;
    let context = TranslationContext::new(Arc::new(registry), config.options);

    match args.mode {
        Mode::Expression => {
            let translation = linqmql::translate_expression(&context, &expression).map_err(describe)?;
            println!("expression:\n    {}", translation.expression);
            println!("output type: {:?}", translation.output_serializer.value_type());
        }
        Mode::Filter => {
            let translation = linqmql::translate_filter(&context, &expression).map_err(describe)?;
            println!("filter:\n    {}", translation.filter);
        }
        Mode::Pipeline => {
            let translation = linqmql::translate_pipeline(&context, &expression).map_err(describe)?;
            println!("collection: {}", translation.collection);
            if let Some(final_operator) = translation.final_operator {
                println!("final operator: {:?}", final_operator);
            }
            println!("output type: {:?}", translation.output_serializer.value_type());
            println!("pipeline:");
            for stage in translation.pipeline {
                println!("    {}", stage);
            }
        }
    }
    Ok(())
}
