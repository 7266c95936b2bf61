use std::{fmt::Write, fs, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tract_onnx::prelude::{
    Framework, Graph, InferenceModelExt, IntoTensor, SimplePlan, Tensor, TypedFact, TypedOp, tvec,
};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Network description loaded from the JSON sidecar next to the weights.
///
/// The runnable graph knows its own layers and input shape; the sidecar
/// carries the one fact it cannot report: how many classes each detection
/// row scores. The label table must list exactly this many names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelSpec {
    /// Number of class columns after the box and objectness columns.
    pub class_count: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self { class_count: 80 }
    }
}

impl ModelSpec {
    /// Load the network description from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read network description {}", path.display()))?;
        let spec: ModelSpec = serde_json::from_str(&contents).with_context(|| {
            format!("failed to parse network description JSON at {}", path.display())
        })?;
        anyhow::ensure!(
            spec.class_count > 0,
            "network description {} declares zero classes",
            path.display()
        );
        Ok(spec)
    }
}

/// Wrapper around the runnable YOLOv3 ONNX graph.
///
/// Handles parsing the ONNX file, preparing it for execution, and running
/// inference. The graph keeps the input shape declared in the ONNX file.
#[derive(Debug)]
pub struct YoloModel {
    runnable: RunnableModel,
}

impl YoloModel {
    /// Load and optimize the ONNX graph.
    pub fn load<P: AsRef<Path>>(weights_path: P) -> Result<Self> {
        let path = weights_path.as_ref();
        anyhow::ensure!(path.exists(), "model file not found: {}", path.display());

        let runnable = match load_runnable_model(path, true) {
            Ok(model) => {
                debug!("model {} optimized successfully", path.display());
                model
            }
            Err(opt_err) => {
                let optimize_msg = format!("{opt_err}");
                let mut chain_msg = String::new();
                for cause in opt_err.chain() {
                    let _ = writeln!(&mut chain_msg, "  - {cause}");
                }
                warn!(
                    "model {} failed optimized load ({}); falling back to decluttered graph (~2x slower).\nError chain:\n{}",
                    path.display(),
                    optimize_msg,
                    chain_msg.trim_end()
                );
                let decluttered = load_runnable_model(path, false).with_context(|| {
                    format!(
                        "fallback to decluttered graph failed after optimize error: {optimize_msg}"
                    )
                })?;
                debug!("model {} running in decluttered mode", path.display());
                decluttered
            }
        };

        Ok(Self { runnable })
    }

    /// Execute the network and return one tensor per output head.
    ///
    /// YOLOv3 exports commonly emit one tensor per detection scale; every
    /// head contributes rows, so all of them are returned.
    pub fn run(&self, input: Tensor) -> Result<Vec<Tensor>> {
        let outputs = self
            .runnable
            .run(tvec![input.into()])
            .map_err(|e| anyhow::anyhow!("network execution failed: {e}"))?;

        anyhow::ensure!(!outputs.is_empty(), "network produced no outputs");
        Ok(outputs
            .into_iter()
            .map(|value| value.into_tensor())
            .collect())
    }
}

fn load_runnable_model(path: &Path, optimized: bool) -> Result<RunnableModel> {
    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("failed to parse ONNX graph from {}", path.display()))?;

    if optimized {
        model
            .into_optimized()
            .map_err(|e| anyhow::anyhow!("unable to optimize graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make graph runnable: {e}"))
    } else {
        model
            .into_typed()
            .map_err(|e| anyhow::anyhow!("unable to type-check graph: {e}"))?
            .into_decluttered()
            .map_err(|e| anyhow::anyhow!("unable to declutter graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make graph runnable: {e}"))
    }
}
