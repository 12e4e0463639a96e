//! Per-flag traversal weights used by the pathfinder.
use crate::{flags::NodeFlags, FxIndexMap};

/// A traversal weight attached to a single [`NodeFlags`] bit.
///
/// Leaving a cell that carries `flag` lowers the step cost by `weight * distance`,
/// so positive weights attract paths and negative weights repel them.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaDefinition {
    pub flag: NodeFlags,
    pub name: String,
    /// Bit position of `flag`.
    pub index: u32,
    pub weight: f32,
}

impl AreaDefinition {
    /// Returns `None` unless `flag` has exactly one bit set.
    pub fn new(flag: NodeFlags, weight: f32) -> Option<Self> {
        let index = flag.bit_index()?;
        let name = NodeFlags::all()
            .iter_names()
            .find(|(_, f)| *f == flag)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| format!("BIT_{index}"));

        Some(AreaDefinition {
            flag,
            name,
            index,
            weight,
        })
    }
}

/// An ordered set of [`AreaDefinition`]s keyed by flag.
///
/// ```
/// use bevy_voxelnav::prelude::*;
///
/// let mut areas = AreaDefinitionSet::all();
/// areas.set_weight(NodeFlags::COMBAT, 0.5);
///
/// assert_eq!(areas.weight(NodeFlags::COMBAT), Some(0.5));
/// assert_eq!(areas.modifier(NodeFlags::COMBAT | NodeFlags::ALLOW_WALK, 2.0), 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaDefinitionSet {
    areas: FxIndexMap<NodeFlags, AreaDefinition>,
}

impl AreaDefinitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A definition for every named [`NodeFlags`] bit, each with weight 0.
    pub fn all() -> Self {
        let areas = NodeFlags::all()
            .iter()
            .filter_map(|flag| AreaDefinition::new(flag, 0.0))
            .map(|area| (area.flag, area))
            .collect();

        AreaDefinitionSet { areas }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn get(&self, flag: NodeFlags) -> Option<&AreaDefinition> {
        self.areas.get(&flag)
    }

    pub fn weight(&self, flag: NodeFlags) -> Option<f32> {
        self.get(flag).map(|area| area.weight)
    }

    /// Adds or replaces a definition. Returns false if `flag` isn't a single bit.
    pub fn insert(&mut self, flag: NodeFlags, weight: f32) -> bool {
        let Some(area) = AreaDefinition::new(flag, weight) else {
            return false;
        };
        self.areas.insert(flag, area);
        true
    }

    /// Sets the weight of `flag`, adding it if it's missing.
    pub fn set_weight(&mut self, flag: NodeFlags, weight: f32) -> bool {
        match self.areas.get_mut(&flag) {
            Some(area) => {
                area.weight = weight;
                true
            }
            None => self.insert(flag, weight),
        }
    }

    pub fn remove(&mut self, flag: NodeFlags) -> Option<AreaDefinition> {
        self.areas.shift_remove(&flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AreaDefinition> {
        self.areas.values()
    }

    /// Cost reduction for a step of length `distance` leaving a cell with `flags`.
    pub fn modifier(&self, flags: NodeFlags, distance: f32) -> f32 {
        self.areas
            .values()
            .filter(|area| area.weight != 0.0 && flags.intersects(area.flag))
            .map(|area| area.weight * distance)
            .sum()
    }
}

impl FromIterator<(NodeFlags, f32)> for AreaDefinitionSet {
    fn from_iter<T: IntoIterator<Item = (NodeFlags, f32)>>(iter: T) -> Self {
        let mut set = AreaDefinitionSet::default();
        for (flag, weight) in iter {
            set.insert(flag, weight);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_names_every_flag() {
        let areas = AreaDefinitionSet::all();
        assert_eq!(areas.len(), 13);

        let near_edge = areas.get(NodeFlags::NEAR_EDGE).unwrap();
        assert_eq!(near_edge.name, "NEAR_EDGE");
        assert_eq!(near_edge.index, 9);
        assert_eq!(near_edge.weight, 0.0);

        // Insertion order follows bit order.
        let indices: Vec<u32> = areas.iter().map(|a| a.index).collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_multi_bit_flags() {
        let mut areas = AreaDefinitionSet::new();
        assert!(!areas.insert(NodeFlags::COMBAT | NodeFlags::RANGED, 1.0));
        assert!(!areas.insert(NodeFlags::empty(), 1.0));
        assert!(areas.is_empty());
    }

    #[test]
    fn test_modifier_sums_matching_weights() {
        let areas: AreaDefinitionSet = [
            (NodeFlags::COMBAT, 0.5),
            (NodeFlags::AVOIDANCE, -2.0),
            (NodeFlags::HEALTH, 1.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(areas.modifier(NodeFlags::ALLOW_WALK, 3.0), 0.0);
        assert_eq!(areas.modifier(NodeFlags::COMBAT, 2.0), 1.0);
        assert_eq!(
            areas.modifier(NodeFlags::COMBAT | NodeFlags::AVOIDANCE, 2.0),
            -3.0
        );
    }

    #[test]
    fn test_set_weight_and_remove() {
        let mut areas = AreaDefinitionSet::new();
        assert!(areas.set_weight(NodeFlags::MONSTER, 1.5));
        assert_eq!(areas.weight(NodeFlags::MONSTER), Some(1.5));

        assert!(areas.set_weight(NodeFlags::MONSTER, -1.0));
        assert_eq!(areas.len(), 1);
        assert_eq!(areas.weight(NodeFlags::MONSTER), Some(-1.0));

        assert!(areas.remove(NodeFlags::MONSTER).is_some());
        assert_eq!(areas.weight(NodeFlags::MONSTER), None);
    }
}
