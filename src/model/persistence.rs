// src/model/persistence.rs

//! On-disk weights.
//!
//! A saved model is a directory with one `<TemplateName>.weights.tsv` per
//! template. Each line is `<feature>\t<weight>`, sorted by descending weight
//! (ties by feature name). Weights are written with the shortest
//! representation that parses back to the same `f64`, so a save/load round
//! trip is exact.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use super::Model;
use crate::error::{Error, Result};
use crate::state::Assignment;
use crate::vector::Vector;

pub const WEIGHTS_FILE_SUFFIX: &str = ".weights.tsv";

pub fn weights_file_name(template: &str) -> String {
    format!("{template}{WEIGHTS_FILE_SUFFIX}")
}

pub(crate) fn validate_template_name(name: &str) -> Result<()> {
    let unusable = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\t', '\n', '\r']);
    if unusable {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_feature_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['\t', '\n', '\r']) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Writes `weights` in the TSV format, highest weight first.
pub fn write_weights(out: &mut impl Write, weights: &Vector) -> std::io::Result<()> {
    let mut entries: Vec<(&str, f64)> = weights.iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (feature, weight) in entries {
        writeln!(out, "{feature}\t{weight}")?;
    }
    Ok(())
}

/// Parses the TSV format. `path` is only used for error reporting.
pub fn parse_weights(path: &Path, text: &str) -> Result<Vector> {
    let mut weights = Vector::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = |reason: String| Error::MalformedWeights {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };
        let (feature, value) = line
            .split_once('\t')
            .ok_or_else(|| malformed("expected <feature>\\t<weight>".to_string()))?;
        if feature.is_empty() {
            return Err(malformed("empty feature name".to_string()));
        }
        let weight: f64 = value
            .trim_end()
            .parse()
            .map_err(|e| malformed(format!("bad weight {value:?}: {e}")))?;
        if !weight.is_finite() {
            return Err(malformed(format!("non-finite weight {weight}")));
        }
        if weights.contains(feature) {
            return Err(malformed(format!("duplicate feature {feature:?}")));
        }
        weights.set(feature, weight);
    }
    Ok(weights)
}

/// Weights `parse_weights` would refuse.
fn validate_weights(template: &str, weights: &Vector) -> Result<()> {
    for (feature, value) in weights {
        validate_feature_name(feature)?;
        if !value.is_finite() {
            return Err(Error::NonFiniteWeight {
                template: template.to_string(),
                feature: feature.to_string(),
                value,
            });
        }
    }
    Ok(())
}

impl<A: Assignment> Model<A> {
    /// Writes every template's weights into `dir`, creating it if needed.
    /// Nothing is written when any weight could not be loaded back.
    pub fn save_weights(&self, dir: &Path) -> Result<()> {
        for entry in &self.templates {
            validate_weights(entry.template.name(), &entry.weights)?;
        }
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        for entry in &self.templates {
            let path = dir.join(weights_file_name(entry.template.name()));
            let file = fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
            let mut out = BufWriter::new(file);
            write_weights(&mut out, &entry.weights)
                .and_then(|()| out.flush())
                .map_err(|e| Error::io(&path, e))?;
            debug!(
                "Saved {} weights of {} to {}",
                entry.weights.len(),
                entry.template.name(),
                path.display()
            );
        }
        info!("Model saved to {}", dir.display());
        Ok(())
    }

    /// Replaces every template's weights with the ones saved in `dir`. The
    /// model is left unchanged if any file is missing or malformed.
    pub fn load_weights(&mut self, dir: &Path) -> Result<()> {
        let mut loaded = Vec::with_capacity(self.templates.len());
        for entry in &self.templates {
            let path = dir.join(weights_file_name(entry.template.name()));
            let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            loaded.push(parse_weights(&path, &text)?);
        }
        for (entry, weights) in self.templates.iter_mut().zip(loaded) {
            entry.weights = weights;
        }
        info!("Model loaded from {}", dir.display());
        Ok(())
    }
}
