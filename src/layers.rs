//! Mapping between layer indices and the names boards use for them.

use crate::geometry::LayerId;

/// Names of the layers of a board with `layer_count` layers, indexed by [`LayerId`].
///
/// ```
/// # use trace_autorouter::layers::layer_names;
/// assert_eq!(layer_names(2), vec!["top", "bottom"]);
/// assert_eq!(layer_names(4), vec!["top", "inner1", "inner2", "bottom"]);
/// ```
pub fn layer_names(layer_count: usize) -> Vec<String> {
    match layer_count {
        0 => vec![],
        1 => vec!["top".to_string()],
        n => std::iter::once("top".to_string())
            .chain((1..n - 1).map(|i| format!("inner{}", i)))
            .chain(std::iter::once("bottom".to_string()))
            .collect(),
    }
}

/// The index of the layer called `name` on a board with `layer_count` layers.
pub fn layer_index(name: &str, layer_count: usize) -> Option<LayerId> {
    layer_names(layer_count).iter().position(|n| n == name)
}
