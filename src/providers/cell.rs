//! Heterogeneous JSON cell.
//!
//! Sensor-network rows mix integers, floats, strings and nulls in one array, and the same
//! column can change type between rows. Cells are decoded once into this sum type and read
//! through the lenient accessors below.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(value) => Some(*value as f64),
            Cell::Float(value) => Some(*value),
            Cell::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Cell::Bool(_) | Cell::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(value) => Some(*value),
            Cell::Float(value) if value.is_finite() && value.fract() == 0.0 => Some(*value as i64),
            Cell::Text(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(text) => Some(text.clone()),
            Cell::Int(value) => Some(value.to_string()),
            Cell::Float(value) => Some(value.to_string()),
            Cell::Bool(_) | Cell::Null => None,
        }
    }
}
