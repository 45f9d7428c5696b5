//! Headless workflow diagram preview
//!
//! Loads a workflow model and a descriptor catalog, runs one render pass of
//! the designer and prints the projected graph and computed layout as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use designer_engine::{
    validate_workflow, ActivityDescriptor, ActivityRegistry, DesignerConfig, DesignerError,
    DesignerMode, DiagramLayout, HeadlessSurface, InteractionController, NullEventSink,
    NullMessageBus, ProjectedGraph, WorkflowModel,
};

/// Render a workflow diagram without a UI
#[derive(Parser, Debug)]
#[command(name = "designer-preview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow model (JSON)
    workflow: PathBuf,

    /// Path to the activity descriptor catalog (JSON array)
    catalog: PathBuf,

    /// Path to a designer configuration (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Designer mode, which decides the attached interactions
    #[arg(long, value_enum, default_value_t = Mode::Edit)]
    mode: Mode,

    /// Activity to draw as selected (repeatable)
    #[arg(long = "select")]
    selected: Vec<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Edit,
    Instance,
    ReadOnly,
}

impl From<Mode> for DesignerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Edit => DesignerMode::Edit,
            Mode::Instance => DesignerMode::Instance,
            Mode::ReadOnly => DesignerMode::ReadOnly,
        }
    }
}

#[derive(Debug, Error)]
enum PreviewError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Designer(#[from] DesignerError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct Preview<'a> {
    graph: &'a ProjectedGraph,
    layout: &'a DiagramLayout,
    problems: Vec<String>,
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PreviewError> {
    let text = fs::read_to_string(path).map_err(|source| PreviewError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PreviewError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn preview(cli: &Cli) -> Result<String, PreviewError> {
    let model: WorkflowModel = load_json(&cli.workflow)?;
    let catalog: Vec<ActivityDescriptor> = load_json(&cli.catalog)?;
    let config: DesignerConfig = match &cli.config {
        Some(path) => load_json(path)?,
        None => DesignerConfig::default(),
    };

    let registry = ActivityRegistry::from_descriptors(catalog);
    let problems: Vec<String> = validate_workflow(&model, Some(&registry))
        .iter()
        .map(ToString::to_string)
        .collect();
    log::info!(
        "Loaded {} activities, {} connections, {} descriptor(s)",
        model.activities.len(),
        model.connections.len(),
        registry.len()
    );

    let surface = HeadlessSurface::new(config.layout.clone());
    let mut controller = InteractionController::new(
        config,
        Arc::new(registry),
        Arc::new(NullEventSink),
        Arc::new(NullMessageBus),
        surface,
    );
    controller.set_model(model);
    controller.set_mode(cli.mode.into());
    controller.set_selected_activity_ids(&cli.selected);

    let layout = controller.render()?.clone();
    let output = Preview {
        graph: controller.projected_graph(),
        layout: &layout,
        problems,
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(json)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match preview(&cli) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn write(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn fixtures(dir: &Path) -> (PathBuf, PathBuf) {
        let workflow = write(
            dir,
            "workflow.json",
            json!({
                "activities": [
                    {"activityId": "a", "type": "WriteLine", "displayName": "A", "outcomes": ["Done"]},
                    {"activityId": "b", "type": "WriteLine", "displayName": "B", "outcomes": ["Done"]}
                ],
                "connections": [
                    {"sourceId": "a", "targetId": "b", "outcome": "Done"},
                    {"sourceId": "a", "targetId": "b", "outcome": "Failed"}
                ]
            }),
        );
        let catalog = write(
            dir,
            "catalog.json",
            json!([{"type": "WriteLine", "displayName": "Write Line", "outcomes": ["Done"]}]),
        );
        (workflow, catalog)
    }

    #[test]
    fn test_preview_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, catalog) = fixtures(dir.path());

        let cli = Cli::parse_from([
            "designer-preview",
            workflow.to_str().unwrap(),
            catalog.to_str().unwrap(),
            "--select",
            "b",
        ]);
        let output: Value = serde_json::from_str(&preview(&cli).unwrap()).unwrap();

        let ids: Vec<&str> = output["graph"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["start", "a/start", "a", "a/Done", "b", "b/Done"]);
        assert_eq!(output["graph"]["stale"][0]["missingNode"], "a/Failed");
        assert_eq!(output["graph"]["nodes"][4]["selected"], true);
        assert_eq!(output["layout"]["nodes"].as_array().unwrap().len(), 6);
        assert_eq!(output["problems"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_config_file_changes_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, catalog) = fixtures(dir.path());
        let config = write(dir.path(), "config.json", json!({"layout": {"rank_sep": 10.0}}));

        let cli = Cli::parse_from([
            "designer-preview",
            workflow.to_str().unwrap(),
            catalog.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        let output: Value = serde_json::from_str(&preview(&cli).unwrap()).unwrap();

        let start = &output["layout"]["nodes"][0];
        let connector = &output["layout"]["nodes"][1];
        let gap = connector["y"].as_f64().unwrap() - connector["height"].as_f64().unwrap() / 2.0
            - (start["y"].as_f64().unwrap() + start["height"].as_f64().unwrap() / 2.0);
        assert!((gap - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_, catalog) = fixtures(dir.path());
        let missing = dir.path().join("missing.json");

        let cli = Cli::parse_from([
            "designer-preview",
            missing.to_str().unwrap(),
            catalog.to_str().unwrap(),
        ]);
        assert!(matches!(preview(&cli), Err(PreviewError::Read { .. })));
    }
}
