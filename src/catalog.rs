//! Static game data: biomes, the castle and building definitions.
//!
//! The built-in catalog is what `GameConfig` uses unless a config file
//! overrides it. Nothing in here has behaviour beyond lookup and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::{ResourceBundle, ResourceCost, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeType {
    Empty,
    Castle,
    Grounds,
    Forest,
    Mountain,
    Plains,
    Lake,
    Quarry,
    Mine,
    Desert,
}

impl BiomeType {
    /// Empty, castle and grounds tiles can never come out of a purchase.
    pub fn is_purchasable(self) -> bool {
        !matches!(self, BiomeType::Empty | BiomeType::Castle | BiomeType::Grounds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeDef {
    pub biome: BiomeType,
    pub display: String,
    /// Multiplicative factor per affected resource; unlisted kinds stay at 1.0.
    #[serde(default)]
    pub modifiers: Vec<(ResourceKind, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastleDef {
    pub base_rates: ResourceBundle,
    pub level_multiplier: f64,
    pub max_level: u32,
    /// `upgrade_costs[i]` is the price of going from level `i + 1` to `i + 2`.
    pub upgrade_costs: Vec<ResourceCost>,
}

impl CastleDef {
    /// Price of the next upgrade from `level`, or `None` at the cap.
    pub fn upgrade_cost(&self, level: u32) -> Option<&ResourceCost> {
        if level == 0 || level >= self.max_level {
            return None;
        }
        self.upgrade_costs.get(level as usize - 1)
    }

    pub fn level_scale(&self, level: u32) -> f64 {
        self.level_multiplier
            .powi(level.saturating_sub(1).min(i32::MAX as u32) as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub id: String,
    pub name: String,
    pub biome: BiomeType,
    pub cost: ResourceCost,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tile_cost: f64,
    pub base_rates: ResourceBundle,
    pub castle: CastleDef,
    pub biomes: Vec<BiomeDef>,
    #[serde(default)]
    pub buildings: Vec<BuildingDef>,
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog defines no purchasable biome")]
    NoPurchasableBiome,
    #[error("biome {0:?} defined more than once")]
    DuplicateBiome(BiomeType),
    #[error("castle max level must be at least 1")]
    InvalidMaxLevel,
    #[error("castle level multiplier must be positive, got {0}")]
    InvalidLevelMultiplier(f64),
    #[error("castle needs {expected} upgrade costs for max level {max_level}, found {found}")]
    UpgradeCostCount {
        expected: usize,
        found: usize,
        max_level: u32,
    },
    #[error("tile cost must be non-negative, got {0}")]
    InvalidTileCost(f64),
    #[error("building '{id}' references non-purchasable biome {biome:?}")]
    BuildingBiome { id: String, biome: BiomeType },
}

impl Catalog {
    pub fn biome(&self, biome: BiomeType) -> Option<&BiomeDef> {
        self.biomes.iter().find(|def| def.biome == biome)
    }

    /// Biomes a purchase may roll, in catalog order.
    pub fn purchasable_biomes(&self) -> Vec<BiomeType> {
        self.biomes
            .iter()
            .map(|def| def.biome)
            .filter(|biome| biome.is_purchasable())
            .collect()
    }

    pub fn buildings_for(&self, biome: BiomeType) -> impl Iterator<Item = &BuildingDef> {
        self.buildings.iter().filter(move |b| b.biome == biome)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if !(self.tile_cost >= 0.0) {
            return Err(CatalogError::InvalidTileCost(self.tile_cost));
        }

        let mut seen = Vec::new();
        for def in &self.biomes {
            if seen.contains(&def.biome) {
                return Err(CatalogError::DuplicateBiome(def.biome));
            }
            seen.push(def.biome);
        }
        if self.purchasable_biomes().is_empty() {
            return Err(CatalogError::NoPurchasableBiome);
        }

        if self.castle.max_level == 0 {
            return Err(CatalogError::InvalidMaxLevel);
        }
        if !(self.castle.level_multiplier > 0.0) {
            return Err(CatalogError::InvalidLevelMultiplier(
                self.castle.level_multiplier,
            ));
        }
        let expected = self.castle.max_level as usize - 1;
        if self.castle.upgrade_costs.len() != expected {
            return Err(CatalogError::UpgradeCostCount {
                expected,
                found: self.castle.upgrade_costs.len(),
                max_level: self.castle.max_level,
            });
        }

        for building in &self.buildings {
            if !building.biome.is_purchasable() || self.biome(building.biome).is_none() {
                return Err(CatalogError::BuildingBiome {
                    id: building.id.clone(),
                    biome: building.biome,
                });
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        builtin()
    }
}

fn cost(entries: &[(ResourceKind, f64)]) -> ResourceCost {
    entries.iter().copied().collect()
}

fn biome(biome: BiomeType, display: &str, modifiers: &[(ResourceKind, f64)]) -> BiomeDef {
    BiomeDef {
        biome,
        display: display.to_string(),
        modifiers: modifiers.to_vec(),
    }
}

fn building(id: &str, name: &str, biome: BiomeType, price: ResourceCost, description: &str) -> BuildingDef {
    BuildingDef {
        id: id.to_string(),
        name: name.to_string(),
        biome,
        cost: price,
        description: description.to_string(),
    }
}

pub fn builtin() -> Catalog {
    use ResourceKind::*;

    Catalog {
        tile_cost: 100.0,
        base_rates: ResourceBundle {
            gold: 1.0,
            wood: 0.5,
            stone: 0.25,
            coal: 0.1,
            food: 0.5,
            experience: 0.1,
        },
        castle: CastleDef {
            base_rates: ResourceBundle {
                gold: 2.0,
                wood: 1.0,
                stone: 1.0,
                coal: 0.5,
                food: 1.0,
                experience: 0.5,
            },
            level_multiplier: 1.5,
            max_level: 5,
            upgrade_costs: vec![
                cost(&[(Gold, 500.0), (Wood, 200.0), (Stone, 200.0)]),
                cost(&[(Gold, 1_500.0), (Wood, 600.0), (Stone, 600.0), (Coal, 100.0)]),
                cost(&[
                    (Gold, 4_000.0),
                    (Wood, 1_500.0),
                    (Stone, 1_500.0),
                    (Coal, 400.0),
                    (Food, 500.0),
                ]),
                cost(&[
                    (Gold, 10_000.0),
                    (Wood, 4_000.0),
                    (Stone, 4_000.0),
                    (Coal, 1_000.0),
                    (Food, 1_500.0),
                ]),
            ],
        },
        biomes: vec![
            biome(BiomeType::Empty, "Wilderness", &[]),
            biome(BiomeType::Castle, "Castle", &[]),
            biome(BiomeType::Grounds, "Castle Grounds", &[]),
            biome(BiomeType::Forest, "Forest", &[(Wood, 1.15)]),
            biome(BiomeType::Mountain, "Mountain", &[(Stone, 1.1), (Coal, 1.05)]),
            biome(BiomeType::Plains, "Plains", &[(Food, 1.1), (Gold, 1.02)]),
            biome(BiomeType::Lake, "Lake", &[(Food, 1.05), (Experience, 1.05)]),
            biome(BiomeType::Quarry, "Quarry", &[(Stone, 1.15)]),
            biome(BiomeType::Mine, "Mine", &[(Coal, 1.15), (Gold, 1.03)]),
            biome(BiomeType::Desert, "Desert", &[(Gold, 1.08), (Food, 0.95)]),
        ],
        buildings: vec![
            building(
                "lumber_camp",
                "Lumber Camp",
                BiomeType::Forest,
                cost(&[(Gold, 150.0), (Wood, 50.0)]),
                "Felling crews for the surrounding woods.",
            ),
            building(
                "farmstead",
                "Farmstead",
                BiomeType::Plains,
                cost(&[(Gold, 120.0), (Wood, 80.0)]),
                "",
            ),
            building(
                "fishery",
                "Fishery",
                BiomeType::Lake,
                cost(&[(Gold, 140.0), (Wood, 60.0)]),
                "",
            ),
            building(
                "stone_cutter",
                "Stone Cutter",
                BiomeType::Quarry,
                cost(&[(Gold, 200.0), (Wood, 100.0)]),
                "Dresses quarried blocks for the castle walls.",
            ),
            building(
                "coal_pit",
                "Coal Pit",
                BiomeType::Mine,
                cost(&[(Gold, 250.0), (Wood, 120.0), (Stone, 60.0)]),
                "",
            ),
            building(
                "watchtower",
                "Watchtower",
                BiomeType::Mountain,
                cost(&[(Gold, 300.0), (Stone, 150.0)]),
                "",
            ),
            building(
                "caravanserai",
                "Caravanserai",
                BiomeType::Desert,
                cost(&[(Gold, 400.0), (Stone, 100.0), (Food, 80.0)]),
                "Trade stop for desert caravans.",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        assert_eq!(builtin().validate(), Ok(()));
    }

    #[test]
    fn purchasable_biomes_exclude_reserved_categories() {
        let biomes = builtin().purchasable_biomes();
        assert!(!biomes.is_empty());
        for reserved in [BiomeType::Empty, BiomeType::Castle, BiomeType::Grounds] {
            assert!(!biomes.contains(&reserved));
        }
    }

    #[test]
    fn upgrade_cost_is_none_at_max_level() {
        let castle = builtin().castle;
        assert!(castle.upgrade_cost(1).is_some());
        assert!(castle.upgrade_cost(castle.max_level - 1).is_some());
        assert!(castle.upgrade_cost(castle.max_level).is_none());
        assert!(castle.upgrade_cost(0).is_none());
    }

    #[test]
    fn level_scale_compounds_per_level() {
        let castle = builtin().castle;
        assert_eq!(castle.level_scale(1), 1.0);
        assert!((castle.level_scale(3) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn validation_rejects_mismatched_upgrade_costs() {
        let mut catalog = builtin();
        catalog.castle.upgrade_costs.pop();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::UpgradeCostCount { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn validation_rejects_catalog_without_purchasable_biome() {
        let mut catalog = builtin();
        catalog.biomes.retain(|def| !def.biome.is_purchasable());
        catalog.buildings.clear();
        assert_eq!(catalog.validate(), Err(CatalogError::NoPurchasableBiome));
    }

    #[test]
    fn validation_rejects_building_on_reserved_biome() {
        let mut catalog = builtin();
        catalog.buildings[0].biome = BiomeType::Castle;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::BuildingBiome { .. })
        ));
    }

    #[test]
    fn buildings_are_looked_up_by_biome() {
        let catalog = builtin();
        assert_eq!(catalog.buildings_for(BiomeType::Forest).count(), 1);
        assert_eq!(catalog.buildings_for(BiomeType::Castle).count(), 0);
    }
}
