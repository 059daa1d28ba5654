use crate::error::{Error, Result};
use crate::tracker::Detection;

/// Keeps only detections whose label is one of the configured classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    classes: Vec<String>,
}

impl ClassFilter {
    /// Build a filter from an ordered class list; repeated labels are dropped.
    pub fn new<I, S>(classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for class in classes {
            let class = class.into();
            if !unique.contains(&class) {
                unique.push(class);
            }
        }
        if unique.is_empty() {
            return Err(Error::Config("at least one class must be selected".into()));
        }
        Ok(Self { classes: unique })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes.iter().any(|c| c == label)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn retain(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| self.contains(&d.label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retain_by_label() {
        let filter = ClassFilter::new(["car", "truck"]).unwrap();
        let kept = filter.retain(vec![
            Detection::new(0.0, 0.0, 10.0, 10.0, 0.9, "car"),
            Detection::new(0.0, 0.0, 10.0, 10.0, 0.9, "person"),
            Detection::new(0.0, 0.0, 10.0, 10.0, 0.9, "truck"),
        ]);
        let labels: Vec<&str> = kept.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["car", "truck"]);
    }

    #[test]
    fn test_duplicates_collapse_in_order() {
        let filter = ClassFilter::new(["truck", "car", "truck"]).unwrap();
        assert_eq!(filter.classes(), ["truck", "car"]);
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(ClassFilter::new(Vec::<String>::new()).is_err());
    }
}
