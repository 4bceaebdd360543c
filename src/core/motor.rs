//! Minimal actuator records referenced by joints.
//!
//! The motor submodel proper lives outside this crate; a chain only needs
//! named records that accept a commanded input per driven DOF.

use serde::{Deserialize, Serialize};

/// An actuator attached to a joint, addressed by index from the owning
/// chain's motor table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Motor {
    pub name: String,
    input: Vec<f64>,
}

impl Motor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            input: Vec::new(),
        }
    }

    /// Last commanded input, one value per driven joint DOF.
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn set_input(&mut self, input: &[f64]) {
        self.input.clear();
        self.input.extend_from_slice(input);
    }
}
