use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;

/// The subset of a hub `config.json` needed to name model outputs
#[derive(Debug, Default, Deserialize)]
struct LabelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Reads `id2label` from a model config into an index-ordered label list.
///
/// Gaps in the index space are filled with `LABEL_<i>`.
pub(crate) fn parse_labels(raw: &str) -> anyhow::Result<Vec<String>> {
    let config: LabelConfig = serde_json::from_str(raw).context("Invalid model config")?;

    let mut entries = config
        .id2label
        .into_iter()
        .map(|(index, label)| {
            index
                .parse::<usize>()
                .map(|index| (index, label))
                .with_context(|| format!("Invalid label index '{}'", index))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    entries.sort_by_key(|(index, _)| *index);

    let len = entries.last().map_or(0, |(index, _)| index + 1);
    let mut labels: Vec<String> = (0..len).map(fallback_label).collect();
    for (index, label) in entries {
        labels[index] = label;
    }
    Ok(labels)
}

pub(crate) fn label_for(labels: &[String], index: usize) -> String {
    labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| fallback_label(index))
}

fn fallback_label(index: usize) -> String {
    format!("LABEL_{}", index)
}

/// Numerically stable softmax
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|x| x / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

/// Truncates token ids to `max_length`, keeping the final (separator) token.
pub(crate) fn truncate_tokens(ids: &[u32], max_length: usize) -> Vec<u32> {
    if max_length == 0 || ids.len() <= max_length {
        return ids.to_vec();
    }
    let mut truncated = ids[..max_length - 1].to_vec();
    truncated.extend(ids.last().copied());
    truncated
}
