use crate::geometry::LayerId;
use thiserror::Error;

/// Errors reported before any search starts.
///
/// A connection that simply cannot be routed is not an error, see
/// [`ConnectionResult::Unsolved`](crate::ConnectionResult::Unsolved).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RouteError {
    /// a connection lists more than two points
    #[error("connection `{connection}` has {count} points, at most 2 are supported")]
    TooManyPoints {
        /// name of the connection
        connection: String,
        /// number of points it lists
        count: usize,
    },
    /// a connection lists fewer than two points
    #[error("connection `{connection}` has {count} points, 2 are required")]
    TooFewPoints {
        /// name of the connection
        connection: String,
        /// number of points it lists
        count: usize,
    },
    /// a connection point lies on a layer the board does not have
    #[error("connection `{connection}` uses layer {layer}, but the board only has {layer_count} layers")]
    LayerOutOfRange {
        /// name of the connection
        connection: String,
        /// the offending layer
        layer: LayerId,
        /// number of layers of the board
        layer_count: usize,
    },
    /// the configuration contradicts itself
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
