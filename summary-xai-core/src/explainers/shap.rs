//! Partition SHAP for text.
//!
//! Tokens are arranged in a balanced binary tree over their positions. Owen
//! values are estimated best-first: the node whose output change (weighted by
//! its share of the coalition) is largest gets split next, each split costing
//! two model evaluations. When the budget runs out, every unexpanded node's
//! contribution is spread evenly across its tokens, so attributions always add
//! up to `f(full text) - f(fully masked text)`.

use regex::Regex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::OnceLock;

use crate::error::{Result, XaiError};
use crate::model::TextScorer;

pub const DEFAULT_MASK_TOKEN: &str = "...";

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\W+").expect("static separator pattern is valid"))
}

/// Splits text into maskable tokens and rebuilds partially masked variants.
///
/// Each token is a word followed by the separator run after it, so joining
/// all tokens reproduces the input exactly.
#[derive(Debug, Clone)]
pub struct TextMasker {
    mask_token: String,
    collapse_mask_token: bool,
}

impl Default for TextMasker {
    fn default() -> Self {
        Self {
            mask_token: DEFAULT_MASK_TOKEN.to_string(),
            collapse_mask_token: true,
        }
    }
}

impl TextMasker {
    pub fn new(mask_token: impl Into<String>, collapse_mask_token: bool) -> Self {
        Self {
            mask_token: mask_token.into(),
            collapse_mask_token,
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut start = 0;
        for m in separator_pattern().find_iter(text) {
            // A separator at the very beginning forms its own token.
            tokens.push(text[start..m.end()].to_string());
            start = m.end();
        }
        if start < text.len() {
            tokens.push(text[start..].to_string());
        }
        tokens
    }

    /// Rebuild text keeping tokens where `keep` is true.
    pub fn mask(&self, tokens: &[String], keep: &[bool]) -> String {
        let mut out = String::new();
        let mut in_masked_run = false;
        for (token, &present) in tokens.iter().zip(keep) {
            if present {
                out.push_str(token);
                in_masked_run = false;
            } else if !(self.collapse_mask_token && in_masked_run) {
                out.push_str(&self.mask_token);
                out.push(' ');
                in_masked_run = true;
            }
        }
        out
    }
}

/// Result of explaining one text.
#[derive(Debug, Clone)]
pub struct ShapExplanation {
    /// Tokens exactly as produced by the masker, trailing separators included.
    pub tokens: Vec<String>,
    pub values: Vec<f64>,
    /// Output with every token masked.
    pub base_value: f64,
    /// Output for the unmasked text.
    pub output_value: f64,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
struct Pending {
    priority: f64,
    sequence: usize,
    start: usize,
    end: usize,
    /// Tokens outside this node that are present in the context.
    context: Vec<bool>,
    f_off: f64,
    f_on: f64,
    weight: f64,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Max-heap on priority; earlier insertions win ties.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .partial_cmp(&other.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Owen-value explainer over a binary partition of token positions.
#[derive(Debug, Clone)]
pub struct PartitionExplainer {
    masker: TextMasker,
    batch_size: usize,
}

impl PartitionExplainer {
    pub fn new(masker: TextMasker, batch_size: usize) -> Self {
        Self {
            masker,
            batch_size: batch_size.max(1),
        }
    }

    pub fn explain<S: TextScorer + ?Sized>(
        &self,
        text: &str,
        scorer: &S,
        max_evals: usize,
    ) -> Result<ShapExplanation> {
        if max_evals < 2 {
            return Err(XaiError::explainer(format!(
                "max_evals={max_evals} is too low, at least 2 evaluations are required"
            )));
        }
        let tokens = self.masker.tokenize(text);
        let n = tokens.len();
        if n == 0 {
            return Err(XaiError::explainer("text contains no tokens to mask"));
        }

        let none = vec![false; n];
        let all = vec![true; n];
        let root_scores = self.evaluate(scorer, &tokens, &[none.clone(), all])?;
        let (base_value, output_value) = (root_scores[0], root_scores[1]);
        let mut evaluations = 2;

        let mut values = vec![0.0; n];
        let mut sequence = 0usize;
        let mut heap = BinaryHeap::new();
        heap.push(Pending {
            priority: (output_value - base_value).abs(),
            sequence,
            start: 0,
            end: n,
            context: none,
            f_off: base_value,
            f_on: output_value,
            weight: 1.0,
        });

        while !heap.is_empty() {
            let mut batch = Vec::new();
            while batch.len() < self.batch_size.div_ceil(2).max(1) {
                let Some(item) = heap.pop() else { break };
                if item.end - item.start == 1 {
                    values[item.start] += item.weight * (item.f_on - item.f_off);
                    continue;
                }
                if evaluations + 2 * (batch.len() + 1) > max_evals {
                    heap.push(item);
                    break;
                }
                batch.push(item);
            }
            if batch.is_empty() {
                if heap.peek().is_some_and(|top| top.end - top.start > 1) {
                    break;
                }
                continue;
            }

            let mut masks = Vec::with_capacity(batch.len() * 2);
            for item in &batch {
                let mid = item.start + (item.end - item.start) / 2;
                let mut left_on = item.context.clone();
                left_on[item.start..mid].fill(true);
                let mut right_on = item.context.clone();
                right_on[mid..item.end].fill(true);
                masks.push(left_on);
                masks.push(right_on);
            }
            let scores = self.evaluate(scorer, &tokens, &masks)?;
            evaluations += masks.len();

            for (item, pair) in batch.into_iter().zip(scores.chunks(2)) {
                let (f_left, f_right) = (pair[0], pair[1]);
                let mid = item.start + (item.end - item.start) / 2;
                let half = item.weight * 0.5;

                let mut with_right = item.context.clone();
                with_right[mid..item.end].fill(true);
                let mut with_left = item.context.clone();
                with_left[item.start..mid].fill(true);

                let children = [
                    (item.start, mid, item.context.clone(), item.f_off, f_left),
                    (item.start, mid, with_right, f_right, item.f_on),
                    (mid, item.end, item.context.clone(), item.f_off, f_right),
                    (mid, item.end, with_left, f_left, item.f_on),
                ];
                for (start, end, context, f_off, f_on) in children {
                    sequence += 1;
                    heap.push(Pending {
                        priority: (f_on - f_off).abs() * half,
                        sequence,
                        start,
                        end,
                        context,
                        f_off,
                        f_on,
                        weight: half,
                    });
                }
            }
        }

        // Budget exhausted: spread the remaining contributions evenly.
        let unexpanded = heap.len();
        for item in heap.into_vec() {
            let share = item.weight * (item.f_on - item.f_off) / (item.end - item.start) as f64;
            for value in &mut values[item.start..item.end] {
                *value += share;
            }
        }

        tracing::debug!(
            tokens = n,
            evaluations,
            unexpanded,
            base_value,
            output_value,
            "Partition SHAP explanation computed"
        );
        Ok(ShapExplanation {
            tokens,
            values,
            base_value,
            output_value,
            evaluations,
        })
    }

    fn evaluate<S: TextScorer + ?Sized>(
        &self,
        scorer: &S,
        tokens: &[String],
        masks: &[Vec<bool>],
    ) -> Result<Vec<f64>> {
        let texts: Vec<String> = masks.iter().map(|m| self.masker.mask(tokens, m)).collect();
        let scores = scorer.score(&texts);
        if scores.len() != texts.len() {
            return Err(XaiError::explainer(format!(
                "scorer returned {} outputs for {} inputs",
                scores.len(),
                texts.len()
            )));
        }
        Ok(scores)
    }
}
