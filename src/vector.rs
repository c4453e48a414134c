// src/vector.rs

//! Sparse feature vectors.
//!
//! A [`Vector`] maps feature names to values. Absent features read as
//! exactly `0.0`, and writing `0.0` removes the entry, so the map never holds
//! explicit zeros. Entries are kept ordered by name: iteration, summation and
//! therefore every score computed from a vector is deterministic regardless
//! of which thread built it.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Sparse feature-name to value map with the algebra the learner needs.
/// Serialized as a plain JSON object; zeros are dropped on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Vector {
    features: BTreeMap<String, f64>,
}

impl Vector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `feature`, `0.0` when absent.
    #[inline]
    pub fn get(&self, feature: &str) -> f64 {
        self.features.get(feature).copied().unwrap_or(0.0)
    }

    /// Sets `feature` to `value`. Setting `0.0` removes the feature.
    pub fn set(&mut self, feature: impl Into<String>, value: f64) {
        let feature = feature.into();
        if value == 0.0 {
            self.features.remove(&feature);
        } else {
            self.features.insert(feature, value);
        }
    }

    /// Adds `delta` to the current value of `feature`.
    pub fn add_to_value(&mut self, feature: impl Into<String>, delta: f64) {
        let feature = feature.into();
        let value = self.get(&feature) + delta;
        self.set(feature, value);
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.features.iter(),
        }
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// `self + other`, missing keys on either side read as zero.
    pub fn add(&self, other: &Vector) -> Vector {
        let mut result = self.clone();
        result += other;
        result
    }

    /// `self - other`, missing keys on either side read as zero.
    pub fn sub(&self, other: &Vector) -> Vector {
        let mut result = self.clone();
        result -= other;
        result
    }

    /// Every value multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Vector {
        self.map_values(|v| v * factor)
    }

    /// Applies `f` to every stored value; results of `0.0` are dropped.
    pub fn map_values(&self, mut f: impl FnMut(f64) -> f64) -> Vector {
        let mut result = Vector::new();
        for (name, value) in &self.features {
            result.set(name.clone(), f(*value));
        }
        result
    }

    /// Inner product. Iterates the smaller operand.
    pub fn dot(&self, other: &Vector) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .features
            .iter()
            .map(|(name, value)| value * large.get(name))
            .sum()
    }

    /// Euclidean norm.
    pub fn length(&self) -> f64 {
        self.features.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Unit-length copy. The zero vector normalizes to itself.
    pub fn normalize(&self) -> Vector {
        let length = self.length();
        if length == 0.0 {
            return self.clone();
        }
        self.scale(1.0 / length)
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }
}

impl AddAssign<&Vector> for Vector {
    fn add_assign(&mut self, other: &Vector) {
        for (name, value) in &other.features {
            self.add_to_value(name.as_str(), *value);
        }
    }
}

impl SubAssign<&Vector> for Vector {
    fn sub_assign(&mut self, other: &Vector) {
        for (name, value) in &other.features {
            self.add_to_value(name.as_str(), -*value);
        }
    }
}

impl Add for &Vector {
    type Output = Vector;

    fn add(self, other: &Vector) -> Vector {
        Vector::add(self, other)
    }
}

impl Sub for &Vector {
    type Output = Vector;

    fn sub(self, other: &Vector) -> Vector {
        Vector::sub(self, other)
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    fn mul(self, factor: f64) -> Vector {
        self.scale(factor)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Vector {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut vector = Vector::new();
        for (name, value) in iter {
            vector.add_to_value(name, value);
        }
        vector
    }
}

impl From<BTreeMap<String, f64>> for Vector {
    fn from(features: BTreeMap<String, f64>) -> Self {
        features.into_iter().collect()
    }
}

impl From<Vector> for BTreeMap<String, f64> {
    fn from(vector: Vector) -> Self {
        vector.features
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.features.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

/// Iterator over `(feature, value)` pairs in feature-name order.
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, f64>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<'a> IntoIterator for &'a Vector {
    type Item = (&'a str, f64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(&str, f64)]) -> Vector {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn assert_close(a: &Vector, b: &Vector) {
        let names: std::collections::BTreeSet<&str> =
            a.feature_names().chain(b.feature_names()).collect();
        for name in names {
            assert!(
                (a.get(name) - b.get(name)).abs() < 1e-12,
                "feature {name}: {} vs {}",
                a.get(name),
                b.get(name)
            );
        }
    }

    #[test_log::test]
    fn missing_feature_reads_zero() {
        let v = vector(&[("a", 1.5)]);
        assert_eq!(v.get("a"), 1.5);
        assert_eq!(v.get("missing"), 0.0);
    }

    #[test_log::test]
    fn setting_zero_removes_feature() {
        let mut v = vector(&[("a", 1.0), ("b", 2.0)]);
        v.set("a", 0.0);
        assert!(!v.contains("a"));
        assert_eq!(v.len(), 1);

        v.add_to_value("b", -2.0);
        assert!(v.is_empty(), "cancelling to zero must drop the entry");
    }

    #[test_log::test]
    fn add_then_sub_restores_original() {
        let a = vector(&[("x", 0.1), ("y", -3.0), ("z", 7.25)]);
        let b = vector(&[("y", 1.3), ("w", 0.7)]);
        assert_close(&a.add(&b).sub(&b), &a);
        assert_close(&(&(&a + &b) - &b), &a);
    }

    #[test_log::test]
    fn dot_is_symmetric() {
        let a = vector(&[("x", 2.0), ("y", -1.0), ("z", 0.5)]);
        let b = vector(&[("y", 4.0), ("z", 2.0)]);
        assert_eq!(a.dot(&b), b.dot(&a));
        assert_eq!(a.dot(&b), -3.0);
        assert_eq!(a.dot(&Vector::new()), 0.0);
    }

    #[test_log::test]
    fn normalize_yields_unit_length() {
        let v = vector(&[("a", 3.0), ("b", 4.0)]);
        let n = v.normalize();
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert!((n.get("a") - 0.6).abs() < 1e-12);
        assert_eq!(Vector::new().normalize(), Vector::new());
    }

    #[test_log::test]
    fn scale_by_zero_is_empty() {
        let v = vector(&[("a", 3.0)]);
        assert!(v.scale(0.0).is_empty());
        assert_eq!((&v * 2.0).get("a"), 6.0);
    }

    #[test_log::test]
    fn iteration_is_name_ordered() {
        let v = vector(&[("b", 1.0), ("c", 2.0), ("a", 3.0)]);
        let names: Vec<&str> = v.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(v.to_string(), "{a=3, b=1, c=2}");
    }

    #[test_log::test]
    fn json_drops_explicit_zeros() {
        let parsed: Vector = serde_json::from_str(r#"{"a": 0.0, "b": 1.5}"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(!parsed.contains("a"));
        assert_eq!(parsed, vector(&[("b", 1.5)]));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"b":1.5}"#);
    }
}
