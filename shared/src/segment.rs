use serde::{Deserialize, Serialize};

/// One visual slice of a prize wheel.
///
/// `weight` only controls how much of the circle the slice occupies; it never
/// influences which prize is awarded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub weight: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub is_losing_segment: bool,
}

impl Segment {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            weight,
            is_losing_segment: false,
        }
    }

    pub fn losing(id: impl Into<String>, weight: f64) -> Self {
        Self {
            is_losing_segment: true,
            ..Self::new(id, weight)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A single prize entry inside a case, as the spin API knows it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Chance {
    pub chance_id: String,
    pub label: String,
    pub weight: f64,
    #[serde(default)]
    pub is_losing: bool,
}

/// A selectable prize set. Switching cases replaces the wheel's segments.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PrizeCase {
    pub id: String,
    pub name: String,
    pub chances: Vec<Chance>,
}

impl PrizeCase {
    /// Segments in the same order as the case's chances.
    pub fn segments(&self) -> Vec<Segment> {
        self.chances
            .iter()
            .map(|chance| Segment {
                id: chance.chance_id.clone(),
                weight: chance.weight,
                label: chance.label.clone(),
                is_losing_segment: chance.is_losing,
            })
            .collect()
    }

    pub fn losing_chance(&self) -> Option<&Chance> {
        self.chances.iter().find(|c| c.is_losing)
    }
}
