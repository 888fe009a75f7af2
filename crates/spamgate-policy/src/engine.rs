//! Decision engine
//!
//! One pass per post, strictly ordered, each stage able to short-circuit:
//!
//! 1. Origin check against the blocklist
//! 2. Input validation
//! 3. Rule evaluation
//! 4. Optional analyzer call, bounded by a timeout
//! 5. Synthesis of the final action
//!
//! Configuration and the analyzer live in one snapshot that is swapped whole
//! on update; a decision clones the snapshot once and runs against it.

use crate::blocklist::IpMatcher;
use crate::events::{AnalyzerFailure, FailureBus};
use parking_lot::RwLock;
use serde::Serialize;
use spamgate_analyzer::{Analyzer, AnalyzerError, AnalyzerFactory};
use spamgate_core::{
    Action, AnalyzerSeverity, AnalyzerVerdict, ConfigUpdate, Decision, EngineConfig, Post,
};
use spamgate_rules::{RuleEvaluation, RuleSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Analyzer confidence above which its reasoning is added to the reasons
const REASON_CONFIDENCE: f64 = 0.7;

/// Analyzer confidence above which it overrides the rule-based verdict
const OVERRIDE_CONFIDENCE: f64 = 0.8;

/// Stage that produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Origin,
    Validation,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Validation => "validation",
            Self::Synthesis => "synthesis",
        }
    }
}

/// A decision together with the stage that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub decision: Decision,
    pub stage: Stage,
}

/// Analyzer introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerStatus {
    pub enabled: bool,
    pub configured: bool,
    pub model: Option<String>,
    pub redacted_key: Option<String>,
}

#[derive(Clone)]
struct Snapshot {
    config: Arc<EngineConfig>,
    analyzer: Arc<dyn Analyzer>,
}

/// Classifies posts as allow, flag or reject
pub struct DecisionEngine {
    snapshot: RwLock<Snapshot>,
    rules: Arc<RuleSet>,
    blocklist: Arc<IpMatcher>,
    factory: Arc<dyn AnalyzerFactory>,
    failures: FailureBus,
}

impl DecisionEngine {
    /// Create an engine; the analyzer is built from `config.analyzer_key`
    pub fn new(
        config: EngineConfig,
        rules: RuleSet,
        factory: impl AnalyzerFactory + 'static,
    ) -> Self {
        let factory: Arc<dyn AnalyzerFactory> = Arc::new(factory);
        let analyzer = factory.build(config.analyzer_key.as_deref());

        Self {
            snapshot: RwLock::new(Snapshot {
                config: Arc::new(config),
                analyzer,
            }),
            rules: Arc::new(rules),
            blocklist: Arc::new(IpMatcher::new()),
            factory,
            failures: FailureBus::default(),
        }
    }

    /// Use an existing blocklist
    pub fn with_blocklist(mut self, blocklist: Arc<IpMatcher>) -> Self {
        self.blocklist = blocklist;
        self
    }

    /// Classify a post
    pub async fn evaluate(&self, post: &Post) -> Decision {
        self.decide(post).await.decision
    }

    /// Classify a post, reporting which stage decided
    pub async fn decide(&self, post: &Post) -> Outcome {
        let start = Instant::now();
        let snapshot = self.snapshot.read().clone();

        let outcome = self.run(post, &snapshot).await;

        metrics::counter!(
            "spamgate_decisions_total",
            "action" => outcome.decision.action.as_str(),
            "stage" => outcome.stage.as_str()
        )
        .increment(1);
        metrics::histogram!("spamgate_decision_latency_us")
            .record(start.elapsed().as_micros() as f64);

        debug!(
            action = %outcome.decision.action,
            stage = outcome.stage.as_str(),
            confidence = outcome.decision.confidence,
            "Decision complete"
        );

        outcome
    }

    async fn run(&self, post: &Post, snapshot: &Snapshot) -> Outcome {
        let config = snapshot.config.as_ref();

        // Stage 1: origin
        if config.ip_blocking_enabled {
            if let Some(ip) = post.origin_ip.as_deref().filter(|ip| !ip.is_empty()) {
                let check = self.blocklist.check(ip);
                if let Some(reason) = check.reason.filter(|_| check.blocked) {
                    info!(ip, reason = %reason, "Rejected post from blocked origin");
                    return Outcome {
                        decision: Decision::rejected(vec![reason]),
                        stage: Stage::Origin,
                    };
                }
            }
        }

        // Stage 2: validation
        let violations = validate(post, config);
        if !violations.is_empty() {
            return Outcome {
                decision: Decision::rejected(violations),
                stage: Stage::Validation,
            };
        }

        // Stage 3: rules
        let text = post.text();
        let evaluation = self.rules.evaluate(text);
        for rule in &evaluation.triggered {
            metrics::counter!("spamgate_rules_triggered_total", "rule" => rule.name.clone())
                .increment(1);
        }

        // Stage 4: analyzer
        let verdict = if config.analyzer_enabled && snapshot.analyzer.configured() {
            self.consult(snapshot.analyzer.as_ref(), text, config).await
        } else {
            None
        };

        // Stage 5: synthesis
        Outcome {
            decision: synthesize(evaluation, verdict, config),
            stage: Stage::Synthesis,
        }
    }

    async fn consult(
        &self,
        analyzer: &dyn Analyzer,
        text: &str,
        config: &EngineConfig,
    ) -> Option<AnalyzerVerdict> {
        let result = tokio::time::timeout(config.analyzer_timeout(), analyzer.analyze(text))
            .await
            .unwrap_or(Err(AnalyzerError::Timeout));

        match result {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                self.report_failure(&e);
                None
            }
        }
    }

    fn report_failure(&self, error: &AnalyzerError) {
        warn!(kind = error.kind(), error = %error, "Analyzer unavailable, using rules only");
        metrics::counter!("spamgate_analyzer_failures_total", "kind" => error.kind()).increment(1);

        self.failures.publish(AnalyzerFailure {
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<EngineConfig> {
        self.snapshot.read().config.clone()
    }

    /// Apply a partial update and return the new snapshot.
    ///
    /// Supplying an analyzer key rebuilds the analyzer. In-flight decisions
    /// finish against the snapshot they started with.
    pub fn update_config(&self, update: &ConfigUpdate) -> Arc<EngineConfig> {
        let mut snapshot = self.snapshot.write();
        let config = Arc::new(snapshot.config.apply(update));

        if update.changes_analyzer_key() {
            snapshot.analyzer = self.factory.build(config.analyzer_key.as_deref());
            info!(
                configured = snapshot.analyzer.configured(),
                "Analyzer reinitialized"
            );
        }

        snapshot.config = config.clone();
        info!(
            spam_threshold = config.spam_threshold,
            flag_threshold = config.flag_threshold,
            "Configuration updated"
        );

        config
    }

    /// Configured flag, model and redacted credential
    pub fn analyzer_status(&self) -> AnalyzerStatus {
        let snapshot = self.snapshot.read();
        AnalyzerStatus {
            enabled: snapshot.config.analyzer_enabled,
            configured: snapshot.analyzer.configured(),
            model: snapshot.analyzer.model().map(str::to_string),
            redacted_key: snapshot.config.redacted_key(),
        }
    }

    /// Round-trip probe through the current analyzer
    pub async fn test_connection(&self) -> bool {
        let analyzer = self.snapshot.read().analyzer.clone();
        analyzer.test_connection().await
    }

    pub fn blocklist(&self) -> &Arc<IpMatcher> {
        &self.blocklist
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Receive analyzer failures as they happen
    pub fn subscribe_failures(&self) -> broadcast::Receiver<AnalyzerFailure> {
        self.failures.subscribe()
    }
}

/// Violation messages for the text of `post`; empty when valid
pub fn validate(post: &Post, config: &EngineConfig) -> Vec<String> {
    let text = match post.text.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => return vec!["Text is required and must be a string".to_string()],
    };

    let mut violations = Vec::new();
    if text.chars().count() > config.max_text_length {
        violations.push(format!(
            "Text exceeds maximum length of {} characters",
            config.max_text_length
        ));
    }
    if text.trim().chars().count() < config.min_text_length {
        violations.push(format!(
            "Text must be at least {} characters long",
            config.min_text_length
        ));
    }

    violations
}

/// Combine rule severity and the analyzer verdict into a decision.
///
/// Severity and analyzer confidence are never added together; they meet only
/// through `max` and threshold comparisons.
pub fn synthesize(
    evaluation: RuleEvaluation,
    verdict: Option<AnalyzerVerdict>,
    config: &EngineConfig,
) -> Decision {
    let total = evaluation.total_severity;
    let mut reasons = evaluation.reasons();

    let mut confidence = if config.spam_threshold == 0 {
        1.0
    } else {
        (f64::from(total) / f64::from(config.spam_threshold)).min(1.0)
    };
    let mut is_spam = total >= config.flag_threshold;

    let mut override_action = None;
    if let Some(verdict) = verdict.as_ref().filter(|v| v.is_spam) {
        confidence = confidence.max(verdict.confidence);

        if verdict.is_confident_spam(REASON_CONFIDENCE) {
            reasons.push(format!("AI detected: {}", verdict.reasoning));
        }

        if verdict.is_confident_spam(OVERRIDE_CONFIDENCE) {
            is_spam = true;
            let high = verdict.severity == AnalyzerSeverity::High;
            override_action = Some(if high || total >= config.spam_threshold {
                Action::Reject
            } else {
                Action::Flag
            });
        }
    }

    let action = override_action.unwrap_or(if total >= config.spam_threshold {
        Action::Reject
    } else if total >= config.flag_threshold {
        Action::Flag
    } else {
        Action::Allow
    });

    // A spam decision always carries at least one reason.
    if is_spam && reasons.is_empty() {
        reasons.push(format!(
            "Rule severity {} meets flag threshold {}",
            total, config.flag_threshold
        ));
    }

    Decision::new(is_spam, confidence, reasons, action, verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spamgate_rules::TriggeredRule;

    fn evaluation(severities: &[u32]) -> RuleEvaluation {
        let triggered: Vec<TriggeredRule> = severities
            .iter()
            .enumerate()
            .map(|(i, severity)| TriggeredRule {
                name: format!("rule_{}", i),
                severity: *severity,
                description: format!("Rule {} fired", i),
            })
            .collect();

        RuleEvaluation {
            total_severity: severities.iter().sum(),
            triggered,
        }
    }

    fn verdict(is_spam: bool, confidence: f64, severity: AnalyzerSeverity) -> AnalyzerVerdict {
        AnalyzerVerdict {
            is_spam,
            confidence,
            reasoning: "Looks like a scam".to_string(),
            categories: vec!["scam".to_string()],
            severity,
        }
    }

    #[test]
    fn test_validate_missing_text() {
        let config = EngineConfig::default();
        let post = Post::default();
        assert_eq!(
            validate(&post, &config),
            vec!["Text is required and must be a string".to_string()]
        );
        assert_eq!(validate(&Post::new(""), &config).len(), 1);
    }

    #[test]
    fn test_validate_length_bounds() {
        let config = EngineConfig::default();

        let long = Post::new("a".repeat(281));
        assert_eq!(
            validate(&long, &config),
            vec!["Text exceeds maximum length of 280 characters".to_string()]
        );

        let blank = Post::new("   ");
        assert_eq!(
            validate(&blank, &config),
            vec!["Text must be at least 1 characters long".to_string()]
        );

        // Length counts characters, not bytes
        let emoji = Post::new("🎉".repeat(280));
        assert!(validate(&emoji, &config).is_empty());
    }

    #[test]
    fn test_synthesize_thresholds() {
        let config = EngineConfig::default();

        let clean = synthesize(evaluation(&[]), None, &config);
        assert_eq!(clean.action, Action::Allow);
        assert!(!clean.is_spam);
        assert_eq!(clean.confidence, 0.0);

        let flagged = synthesize(evaluation(&[3]), None, &config);
        assert_eq!(flagged.action, Action::Flag);
        assert!(flagged.is_spam);

        let rejected = synthesize(evaluation(&[5, 3]), None, &config);
        assert_eq!(rejected.action, Action::Reject);
        assert_eq!(rejected.confidence, 1.0);
    }

    #[test]
    fn test_confident_high_severity_forces_reject() {
        let config = EngineConfig::default();
        let decision = synthesize(
            evaluation(&[1]),
            Some(verdict(true, 0.9, AnalyzerSeverity::High)),
            &config,
        );

        assert_eq!(decision.action, Action::Reject);
        assert!(decision.is_spam);
        assert_eq!(decision.confidence, 0.9);
        assert_eq!(
            decision.reasons.last().map(String::as_str),
            Some("AI detected: Looks like a scam")
        );
    }

    #[test]
    fn test_confident_override_without_high_severity_flags() {
        let config = EngineConfig::default();
        let decision = synthesize(
            evaluation(&[]),
            Some(verdict(true, 0.85, AnalyzerSeverity::Medium)),
            &config,
        );

        assert_eq!(decision.action, Action::Flag);
        assert!(decision.is_spam);
        assert!(!decision.reasons.is_empty());
    }

    #[test]
    fn test_moderate_confidence_adds_reason_only() {
        let config = EngineConfig::default();
        let decision = synthesize(
            evaluation(&[]),
            Some(verdict(true, 0.75, AnalyzerSeverity::High)),
            &config,
        );

        assert_eq!(decision.action, Action::Allow);
        assert!(!decision.is_spam);
        assert_eq!(decision.confidence, 0.75);
        assert_eq!(decision.reasons, vec!["AI detected: Looks like a scam".to_string()]);
    }

    #[test]
    fn test_non_spam_verdict_does_not_raise_confidence() {
        let config = EngineConfig::default();
        let decision = synthesize(
            evaluation(&[2]),
            Some(verdict(false, 0.99, AnalyzerSeverity::Low)),
            &config,
        );

        assert_eq!(decision.action, Action::Allow);
        assert!((decision.confidence - 2.0 / 7.0).abs() < f64::EPSILON);
        assert!(decision.analyzer_verdict.is_some());
    }

    #[test]
    fn test_analyzer_severity_never_added() {
        let config = EngineConfig::default();
        let decision = synthesize(
            evaluation(&[2]),
            Some(verdict(true, 0.5, AnalyzerSeverity::High)),
            &config,
        );

        assert_eq!(decision.action, Action::Allow);
        assert_eq!(decision.reasons.len(), 1);
    }
}
