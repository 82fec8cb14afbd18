use std::cmp::Ordering;

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use serde::Serialize;

use crate::config::ClassifierConfig;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

pub struct ImageClassifier {
    session: Session,
    labels: Vec<String>,
    top_k: usize,
    input_size: u32,
}

impl ImageClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let labels = load_labels(&config.labels_path)?;

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| -> ort::Error { e.into() })?
            .with_intra_threads(4)
            .map_err(|e| -> ort::Error { e.into() })?;

        let session = if config.model_path.starts_with("http://")
            || config.model_path.starts_with("https://")
        {
            builder.commit_from_url(&config.model_path)?
        } else {
            builder.commit_from_file(&config.model_path)?
        };

        tracing::info!(
            model = %config.model_path,
            labels = labels.len(),
            "classifier loaded"
        );

        Ok(Self {
            session,
            labels,
            top_k: config.top_k,
            input_size: config.input_size,
        })
    }

    /// Classify a BGR frame, returning the top-k labels by confidence.
    pub fn classify(
        &mut self,
        frame: &opencv::core::Mat,
    ) -> Result<Vec<Classification>, Box<dyn std::error::Error + Send + Sync>> {
        use opencv::prelude::*;

        if frame.rows() == 0 || frame.cols() == 0 {
            return Ok(Vec::new());
        }

        let input_tensor = self.preprocess(frame)?;

        let tensor_ref = TensorRef::from_array_view(input_tensor.view())?.into_dyn();
        let outputs = self.session.run(ort::inputs![tensor_ref])?;

        let fallback;
        let value = match outputs.get("output") {
            Some(v) => v,
            None => {
                fallback = outputs
                    .values()
                    .next()
                    .ok_or("model produced no outputs")?;
                &fallback
            }
        };
        let scores = value.try_extract_array::<f32>()?;
        let logits = scores.as_slice().ok_or("cannot read score tensor")?;

        let probabilities = softmax(logits);

        let mut ranked: Vec<usize> = (0..probabilities.len()).collect();
        ranked.sort_by(|&a, &b| {
            probabilities[b]
                .partial_cmp(&probabilities[a])
                .unwrap_or(Ordering::Equal)
        });

        let results = ranked
            .into_iter()
            .take(self.top_k)
            .map(|i| Classification {
                label: self
                    .labels
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{i}")),
                confidence: probabilities[i],
            })
            .collect();

        Ok(results)
    }

    fn preprocess(
        &self,
        frame: &opencv::core::Mat,
    ) -> Result<Array4<f32>, Box<dyn std::error::Error + Send + Sync>> {
        use opencv::core::{Mat, Size};
        use opencv::imgproc;
        use opencv::prelude::*;

        let size = self.input_size as usize;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(size as i32, size as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let data = rgb.data_bytes()?;
        if data.len() < size * size * 3 {
            return Err("frame data too small".into());
        }

        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for y in 0..size {
            for x in 0..size {
                let idx = (y * size + x) * 3;
                for c in 0..3 {
                    let v = data[idx + c] as f32 / 255.0;
                    tensor[[0, c, y, x]] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
                }
            }
        }

        Ok(tensor)
    }
}

fn load_labels(path: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read labels file {path}: {e}"))?;

    let labels: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(format!("labels file {path} is empty").into());
    }

    Ok(labels)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one_and_preserves_order() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[1] > probs[2]);
        assert!(probs[2] > probs[0]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }
}
