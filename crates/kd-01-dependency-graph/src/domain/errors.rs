//! Error types for the Dependency Graph

use shared_types::{Coordinate, TemplateError};
use thiserror::Error;

/// All errors that can occur while building, splitting or sorting the graph
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// Cycle detected; fatal to the component containing it
    #[error("Cyclic dependency between {}", format_coordinates(.coordinates))]
    CyclicDependency { coordinates: Vec<Coordinate> },

    /// Malformed template or parameter, local to one config
    #[error("Invalid config {coordinate}: {source}")]
    Validation {
        coordinate: Coordinate,
        #[source]
        source: TemplateError,
    },

    /// Two configs share a coordinate
    #[error("Duplicate coordinate {coordinate}")]
    DuplicateCoordinate { coordinate: Coordinate },

    /// Reference to a config that is not part of the loaded set
    #[error("Config {from} references unknown config {to}")]
    UnknownReference { from: Coordinate, to: Coordinate },

    /// Config count exceeded limits
    #[error("Config count exceeded: {count} > {max}")]
    TooManyConfigs { count: usize, max: usize },

    /// Edge count exceeded limits
    #[error("Edge count exceeded: {count} > {max}")]
    TooManyEdges { count: usize, max: usize },
}

impl GraphError {
    /// The config this error is local to, if any.
    pub fn coordinate(&self) -> Option<&Coordinate> {
        match self {
            GraphError::Validation { coordinate, .. }
            | GraphError::DuplicateCoordinate { coordinate } => Some(coordinate),
            GraphError::UnknownReference { from, .. } => Some(from),
            _ => None,
        }
    }
}

fn format_coordinates(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_names_members() {
        let err = GraphError::CyclicDependency {
            coordinates: vec![Coordinate::new("p", "t", "a"), Coordinate::new("p", "t", "b")],
        };
        assert_eq!(err.to_string(), "Cyclic dependency between p:t:a, p:t:b");
    }

    #[test]
    fn test_error_display() {
        let err = GraphError::TooManyEdges {
            count: 200,
            max: 100,
        };
        assert_eq!(err.to_string(), "Edge count exceeded: 200 > 100");
    }

    #[test]
    fn test_unknown_reference_coordinate() {
        let from = Coordinate::new("p", "t", "a");
        let err = GraphError::UnknownReference {
            from: from.clone(),
            to: Coordinate::new("q", "t", "x"),
        };
        assert_eq!(err.coordinate(), Some(&from));
    }
}
