//! `cropyield` - CLI for the crop yield predictor
//!
//! This binary serves the prediction form and exposes the same prediction,
//! model inspection, and history from the terminal.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use cropyield::cli::{Cli, Command, ConfigCommand, HistoryCommand, ModelCommand, PredictCommand};
use cropyield::history::History;
use cropyield::model::ModelHandle;
use cropyield::predict::{Predictor, Submission};
use cropyield::render::text;
use cropyield::web::{self, AppState};
use cropyield::{init_logging, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => {
            if let Some(host) = cmd.host {
                config.server.host = host;
            }
            if let Some(port) = cmd.port {
                config.server.port = port;
            }
            config.validate()?;
            handle_serve(&config)
        }
        Command::Predict(cmd) => handle_predict(&config, &cmd),
        Command::Model(cmd) => handle_model(&config, &cmd),
        Command::History(cmd) => handle_history(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let predictor = Predictor::from_config(config);
    let address = config.bind_address();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(web::serve(&address, AppState::new(predictor)))?;
    Ok(())
}

fn handle_predict(config: &Config, cmd: &PredictCommand) -> anyhow::Result<()> {
    let predictor = Predictor::from_config(config);
    let submission = predictor.submit(&cmd.to_form());

    if cmd.json {
        let value = match &submission {
            Submission::Disabled { reason } => serde_json::json!({
                "status": "disabled",
                "error": format!("Failed to load model: {reason}"),
            }),
            Submission::Processed {
                record,
                summary,
                warnings,
                outcome,
            } => {
                let warnings: Vec<String> = warnings.iter().map(ToString::to_string).collect();
                let summary: serde_json::Map<String, serde_json::Value> = summary
                    .rows
                    .iter()
                    .map(|(label, value)| ((*label).to_string(), value.clone().into()))
                    .collect();
                match outcome {
                    Ok(prediction) => serde_json::json!({
                        "status": "ok",
                        "record": record,
                        "summary": summary,
                        "warnings": warnings,
                        "yield_tons_per_hectare": prediction.yield_tons_per_hectare,
                        "yield": prediction.yield_display(),
                        "tier": prediction.tier,
                        "headline": prediction.tier.headline(),
                        "advice": prediction.tier.advice(),
                        "predicted_at": prediction.predicted_at.to_rfc3339(),
                    }),
                    Err(failure) => serde_json::json!({
                        "status": "failed",
                        "record": record,
                        "summary": summary,
                        "warnings": warnings,
                        "error": failure.to_string(),
                    }),
                }
            }
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", text::submission(&submission));
    }

    match submission {
        Submission::Disabled { .. } => bail!("model unavailable"),
        Submission::Processed {
            outcome: Err(_), ..
        } => bail!("prediction failed"),
        Submission::Processed { .. } => Ok(()),
    }
}

fn handle_model(config: &Config, cmd: &ModelCommand) -> anyhow::Result<()> {
    let model = ModelHandle::load(&config.model.path);

    match cmd {
        ModelCommand::Info { json } => {
            if *json {
                let value = serde_json::json!({
                    "loaded": model.is_ready(),
                    "configured_path": config.model.path,
                    "info": model.info(),
                    "error": model.load_error(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", text::model_info(&model));
            }
        }
        ModelCommand::Check => {
            if let Some(reason) = model.load_error() {
                bail!("Failed to load model: {reason}");
            }
            println!("Model OK: {}", config.model.path.display());
        }
    }
    Ok(())
}

fn handle_history(config: &Config, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let path = config.database_path();
    if !config.history.enabled && !path.exists() {
        println!("History is disabled. Set history.enabled = true to record predictions.");
        return Ok(());
    }

    let history = History::open(&path)?;
    let entries = history.recent(cmd.limit.unwrap_or(config.history.recent_limit))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", text::history(&entries, history.count()?));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Model]");
                println!("  Path:               {}", config.model.path.display());
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.bind_address());
                println!();
                println!("[History]");
                println!("  Enabled:            {}", config.history.enabled);
                println!("  Database path:      {}", config.database_path().display());
                println!("  Recent limit:       {}", config.history.recent_limit);
                println!("  Max entries:        {}", config.history.max_entries);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
