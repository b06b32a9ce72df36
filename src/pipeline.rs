use crate::catalog::catalog;
use crate::classifier::{MatchConfig, TagVerdict, classify_tag};
use crate::fallback::fallback_ingredients;
use crate::models::{PipelineResult, StageReport};
use crate::scoring::{GateVerdict, ScoringConfig, rank, sufficiency_gate};
use crate::vision::{ProbeOutcome, RawLabelList, VisionClient, VisionConfig, VisionFailure};
use serde_json::{Value, json};
use std::{
    env,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[derive(Clone)]
pub struct Pipeline {
    pub config: Arc<PipelineConfig>,
    pub vision: Arc<VisionClient>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub matching: MatchConfig,
    pub scoring: ScoringConfig,
}

/// Why a classification ended the way it did. Callers of [`Pipeline::classify`] only
/// see the list; this is kept for logs and the HTTP transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Detected,
    /// No label matched a catalog entry.
    NoEvidence,
    /// Some labels matched but the gate rejected the set.
    InsufficientEvidence,
    Fallback(VisionFailure),
}

impl ClassificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationOutcome::Detected => "detected",
            ClassificationOutcome::NoEvidence => "no_evidence",
            ClassificationOutcome::InsufficientEvidence => "insufficient_evidence",
            ClassificationOutcome::Fallback(_) => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub ingredients: PipelineResult,
    pub outcome: ClassificationOutcome,
    pub stages: Vec<StageReport>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, vision: VisionConfig) -> Self {
        Self {
            config: Arc::new(config),
            vision: Arc::new(VisionClient::new(vision)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(PipelineConfig::default(), VisionConfig::from_env())
    }

    /// Turns a photo into a ranked ingredient list. Never fails: upstream trouble yields
    /// the fallback set and weak evidence yields an empty list. The HTTP handler uses
    /// [`Pipeline::classify_detailed`] instead, to report the outcome and stage transcript.
    #[allow(dead_code)]
    pub async fn classify(&self, image_path: &Path) -> PipelineResult {
        self.classify_detailed(image_path).await.ingredients
    }

    pub async fn classify_detailed(&self, image_path: &Path) -> Classification {
        self.classify_with_cancel(image_path, std::future::pending())
            .await
    }

    /// Like [`Pipeline::classify_detailed`], but abandons the vision call as soon as
    /// `cancel` resolves and answers with the fallback set.
    pub async fn classify_with_cancel<C>(&self, image_path: &Path, cancel: C) -> Classification
    where
        C: Future<Output = ()>,
    {
        let mut stages = Vec::new();
        let extracted = {
            let vision = self.extract(image_path, &mut stages);
            tokio::pin!(cancel);
            tokio::select! {
                result = vision => result,
                _ = &mut cancel => Err(VisionFailure::Cancelled),
            }
        };

        let classification = match extracted {
            Ok(labels) => self.classify_labels(&labels, stages),
            Err(failure) => {
                warn!(
                    target = "pantry.pipeline",
                    image = %image_path.display(),
                    failure = failure.kind(),
                    detail = %failure,
                    "vision_failed_using_fallback"
                );
                let ingredients = self.capture_stage("fallback", &mut stages, || {
                    let ingredients = fallback_ingredients();
                    let output = json!({
                        "failure": failure.kind(),
                        "count": ingredients.len(),
                    });
                    StageOutcome::new(ingredients, output)
                });
                Classification {
                    ingredients,
                    outcome: ClassificationOutcome::Fallback(failure),
                    stages,
                }
            }
        };

        crate::metrics::outcome(classification.outcome.as_str());
        info!(
            target = "pantry.pipeline",
            image = %image_path.display(),
            outcome = classification.outcome.as_str(),
            ingredients = ?classification.ingredients.names(),
            "classification_complete"
        );
        classification
    }

    async fn extract(
        &self,
        image_path: &Path,
        stages: &mut Vec<StageReport>,
    ) -> Result<RawLabelList, VisionFailure> {
        let started = Instant::now();
        let probe = self.vision.probe_outcome().await;
        let output = match &probe {
            ProbeOutcome::Healthy { status } => json!({ "healthy": true, "status": status }),
            ProbeOutcome::Unhealthy { reason } => json!({ "healthy": false, "reason": reason }),
        };
        push_stage(stages, "probe", started, output);
        if let ProbeOutcome::Unhealthy { reason } = probe {
            return Err(VisionFailure::ServiceUnavailable(reason));
        }

        let started = Instant::now();
        let result = self.vision.upload(image_path).await;
        let output = match &result {
            Ok(list) => json!({
                "count": list.labels.len(),
                "field": list.field,
                "preview": list.labels.iter().take(4).collect::<Vec<_>>(),
            }),
            Err(failure) => json!({ "failure": failure.kind(), "detail": failure.to_string() }),
        };
        push_stage(stages, "extract_labels", started, output);
        result
    }

    fn classify_labels(
        &self,
        labels: &RawLabelList,
        mut stages: Vec<StageReport>,
    ) -> Classification {
        let catalog = catalog();
        let candidates = self.capture_stage("classify_tags", &mut stages, || {
            let mut candidates = Vec::new();
            let (mut excluded, mut unmatched) = (0usize, 0usize);
            for (position, tag) in labels.labels.iter().enumerate() {
                match classify_tag(tag, catalog, &self.config.matching) {
                    TagVerdict::Matched(found) => {
                        trace!(
                            target = "pantry.classifier",
                            tag = %tag,
                            rank = position,
                            item = found.entry.name,
                            category = found.entry.category.as_str(),
                            rule = ?found.rule,
                            "tag_matched"
                        );
                        candidates.push(self.config.scoring.ingredient(
                            found.entry,
                            position,
                            catalog,
                        ));
                    }
                    TagVerdict::Excluded => excluded += 1,
                    TagVerdict::NoMatch => unmatched += 1,
                }
            }
            let output = json!({
                "labels": labels.labels.len(),
                "matched": candidates.len(),
                "excluded": excluded,
                "unmatched": unmatched,
            });
            StageOutcome::new(candidates, output)
        });
        let matched_any = !candidates.is_empty();

        let ranked = self.capture_stage("rank", &mut stages, || {
            let before = candidates.len();
            let ranked = rank(candidates);
            let output = json!({ "candidates": before, "unique": ranked.len() });
            StageOutcome::new(ranked, output)
        });

        let verdict = self.capture_stage("sufficiency_gate", &mut stages, || {
            let verdict = sufficiency_gate(ranked, &self.config.scoring);
            let output = match &verdict {
                GateVerdict::Accepted(result) => {
                    json!({ "verdict": "accepted", "kept": result.len() })
                }
                GateVerdict::NothingDetected => {
                    json!({ "verdict": "nothing_detected", "kept": 0 })
                }
                GateVerdict::Insufficient { kept } => {
                    json!({ "verdict": "insufficient", "kept": kept })
                }
            };
            StageOutcome::new(verdict, output)
        });

        let outcome = match (&verdict, matched_any) {
            (GateVerdict::Accepted(_), _) => ClassificationOutcome::Detected,
            (_, false) => ClassificationOutcome::NoEvidence,
            (_, true) => ClassificationOutcome::InsufficientEvidence,
        };
        if outcome != ClassificationOutcome::Detected {
            debug!(target = "pantry.pipeline", verdict = ?verdict, "evidence_rejected");
        }

        Classification {
            ingredients: verdict.into_result(),
            outcome,
            stages,
        }
    }

    fn capture_stage<T, F>(
        &self,
        name: &'static str,
        stages: &mut Vec<StageReport>,
        stage: F,
    ) -> T
    where
        F: FnOnce() -> StageOutcome<T>,
    {
        let started = Instant::now();
        let outcome = stage();
        push_stage(stages, name, started, outcome.output);
        outcome.value
    }
}

fn push_stage(stages: &mut Vec<StageReport>, name: &'static str, started: Instant, output: Value) {
    let elapsed_ms = started.elapsed().as_millis();
    crate::metrics::stage_elapsed(name, elapsed_ms);
    stages.push(StageReport::new(name, elapsed_ms, output));
}

#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub output: Value,
}

impl<T> StageOutcome<T> {
    fn new(value: T, output: Value) -> Self {
        Self { value, output }
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::InvalidInput,
        }
    }

    pub fn internal(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Internal,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

/// Checks that a caller-supplied path names a readable file, inside `IMAGE_ROOT` when
/// that is set.
pub async fn resolve_image_path(raw: &str) -> Result<PathBuf, PipelineError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PipelineError::invalid_input(
            "resolve_image",
            "missing image_path",
        ));
    }
    let path = tokio::fs::canonicalize(raw)
        .await
        .map_err(|_| PipelineError::invalid_input("resolve_image", format!("image_not_found: {raw}")))?;

    if let Some(root) = image_root() {
        let root = tokio::fs::canonicalize(&root).await.map_err(|err| {
            PipelineError::internal("resolve_image", format!("invalid IMAGE_ROOT: {err}"))
        })?;
        if !path.starts_with(&root) {
            return Err(PipelineError::invalid_input(
                "resolve_image",
                "path_outside_image_root",
            ));
        }
    }

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|err| PipelineError::internal("resolve_image", err.to_string()))?;
    if !metadata.is_file() {
        return Err(PipelineError::invalid_input("resolve_image", "not_a_file"));
    }
    Ok(path)
}

fn image_root() -> Option<PathBuf> {
    env::var("IMAGE_ROOT")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
