use crate::error::RouteError;
use crate::neighbors::{GridNeighbors, JumpConfig, JumpNeighbors, LayerConfig, LayeredJumpNeighbors, NeighborStrategy};
use crate::obstacle_index::IndexKind;
use crate::search::SearchConfig;

/// Which [`NeighborStrategy`] the [`Autorouter`](crate::Autorouter) searches with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeighborMode {
    /// [`GridNeighbors`]
    Grid,
    /// [`JumpNeighbors`], ignoring every layer but the one a connection starts on
    Jump,
    /// [`LayeredJumpNeighbors`]
    LayeredJump,
    /// `Jump` on single layer boards, `LayeredJump` otherwise
    Auto,
}

/// Options for configuring the [`Autorouter`](crate::Autorouter)
///
/// Default options:
/// ```
/// # use trace_autorouter::prelude::*;
/// assert_eq!(
///     RouterConfig {
///         search: SearchConfig::default(),
///         jump: JumpConfig::default(),
///         layers: LayerConfig::default(),
///         neighbor_mode: NeighborMode::Auto,
///         index_kind: IndexKind::default(),
///         trace_thickness: 0.15,
///         remove_loops: true,
///         shortcuts: true,
///         remove_collinear: true,
///     },
///     Default::default()
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouterConfig {
    /// Options for every search
    pub search: SearchConfig,
    /// Margins and margin tiers of the jump strategies. `jump.obstacle_margin` is also the
    /// clearance of the grid strategy and of the shortcuts.
    pub jump: JumpConfig,
    /// Vias
    pub layers: LayerConfig,
    /// The strategy to search with
    pub neighbor_mode: NeighborMode,
    /// The obstacle index built for every connection
    pub index_kind: IndexKind,
    /// Width of a routed trace. Later connections keep their margin to the full width.
    pub trace_thickness: f64,
    /// `true` (default): cut out parts of a route that cross themselves
    pub remove_loops: bool,
    /// `true` (default): replace detours by direct corners where the obstacles allow it
    pub shortcuts: bool,
    /// `true` (default): drop points in the middle of straight runs
    pub remove_collinear: bool,
}

impl Default for RouterConfig {
    fn default() -> RouterConfig {
        RouterConfig {
            search: SearchConfig::default(),
            jump: JumpConfig::default(),
            layers: LayerConfig::default(),
            neighbor_mode: NeighborMode::Auto,
            index_kind: IndexKind::default(),
            trace_thickness: 0.15,
            remove_loops: true,
            shortcuts: true,
            remove_collinear: true,
        }
    }
}

impl RouterConfig {
    /// An example RouterConfig that gives up early and greedily follows the heuristic
    ///
    /// Values:
    /// ```
    /// # use trace_autorouter::prelude::*;
    /// let config = RouterConfig::fast();
    /// assert_eq!(config.search.greedy_multiplier, 1.5);
    /// assert_eq!(config.search.max_iterations, 2_000);
    /// assert_eq!(config.jump.margin_tiers.len(), 1);
    /// ```
    pub fn fast() -> RouterConfig {
        let jump = JumpConfig::default();
        RouterConfig {
            search: SearchConfig {
                greedy_multiplier: 1.5,
                max_iterations: 2_000,
                ..Default::default()
            },
            jump: JumpConfig {
                margin_tiers: jump.margin_tiers[..1].to_vec(),
                ..jump
            },
            ..Default::default()
        }
    }

    /// An example RouterConfig that searches longer for shorter routes
    ///
    /// Values:
    /// ```
    /// # use trace_autorouter::prelude::*;
    /// let config = RouterConfig::thorough();
    /// assert_eq!(config.search.greedy_multiplier, 1.0);
    /// assert_eq!(config.search.max_iterations, 50_000);
    /// assert_eq!(config.search.grid_step, 0.05);
    /// ```
    pub fn thorough() -> RouterConfig {
        RouterConfig {
            search: SearchConfig {
                grid_step: 0.05,
                greedy_multiplier: 1.0,
                max_iterations: 50_000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Checks every option.
    ///
    /// ## Errors
    /// [`RouteError::InvalidConfig`] if a step or margin is not positive, a margin tier is
    /// narrower than the obstacle margin or the greedy multiplier is below `1`.
    pub fn validate(&self) -> Result<(), RouteError> {
        let search = &self.search;
        if !(search.grid_step > 0.0) {
            return Err(RouteError::InvalidConfig(format!(
                "grid_step must be positive, got {}",
                search.grid_step
            )));
        }
        if !(search.greedy_multiplier >= 1.0) {
            return Err(RouteError::InvalidConfig(format!(
                "greedy_multiplier must be at least 1, got {}",
                search.greedy_multiplier
            )));
        }
        if search.max_iterations == 0 {
            return Err(RouteError::InvalidConfig("max_iterations must not be 0".into()));
        }
        if !(self.trace_thickness >= 0.0) {
            return Err(RouteError::InvalidConfig(format!(
                "trace_thickness must not be negative, got {}",
                self.trace_thickness
            )));
        }
        if let IndexKind::GridCells { cell_size, max_margin } = self.index_kind {
            if !(cell_size > 0.0) || !(max_margin >= 0.0) {
                return Err(RouteError::InvalidConfig(format!(
                    "grid cells need a positive cell size, got {} (max_margin {})",
                    cell_size, max_margin
                )));
            }
        }
        self.jump.validate()?;
        self.layers.validate()
    }

    /// The strategy [`neighbor_mode`](RouterConfig::neighbor_mode) stands for on a board with
    /// `layer_count` layers
    pub fn strategy(&self, layer_count: usize) -> Box<dyn NeighborStrategy> {
        let layered = match self.neighbor_mode {
            NeighborMode::Grid => {
                return Box::new(GridNeighbors::with_clearance(self.jump.obstacle_margin));
            }
            NeighborMode::Jump => false,
            NeighborMode::LayeredJump => true,
            NeighborMode::Auto => layer_count > 1,
        };
        if layered {
            Box::new(LayeredJumpNeighbors::new(self.jump.clone(), self.layers))
        } else {
            Box::new(JumpNeighbors::new(self.jump.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(RouterConfig::default().validate(), Ok(()));
        assert_eq!(RouterConfig::fast().validate(), Ok(()));
        assert_eq!(RouterConfig::thorough().validate(), Ok(()));
    }

    #[test]
    fn rejects_nonsense() {
        let mut config = RouterConfig::default();
        config.search.greedy_multiplier = 0.5;
        assert!(matches!(config.validate(), Err(RouteError::InvalidConfig(_))));

        let mut config = RouterConfig::default();
        config.search.grid_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.jump.obstacle_margin = 0.5;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.index_kind = IndexKind::GridCells {
            cell_size: -1.0,
            max_margin: 1.0,
        };
        assert!(config.validate().is_err());
    }
}
