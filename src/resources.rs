use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    Wood,
    Stone,
    Coal,
    Food,
    Experience,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Gold,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Coal,
        ResourceKind::Food,
        ResourceKind::Experience,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Gold => "gold",
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Coal => "coal",
            ResourceKind::Food => "food",
            ResourceKind::Experience => "experience",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holdings, rates and modifiers all share this fixed schema.
///
/// Amounts are not floored at zero; overspending is prevented by
/// [`can_afford`] checks in the transitions, not by the bundle itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceBundle {
    pub gold: f64,
    pub wood: f64,
    pub stone: f64,
    pub coal: f64,
    pub food: f64,
    pub experience: f64,
}

impl ResourceBundle {
    pub fn splat(value: f64) -> Self {
        Self {
            gold: value,
            wood: value,
            stone: value,
            coal: value,
            food: value,
            experience: value,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Gold => self.gold,
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Coal => self.coal,
            ResourceKind::Food => self.food,
            ResourceKind::Experience => self.experience,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Gold => &mut self.gold,
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Coal => &mut self.coal,
            ResourceKind::Food => &mut self.food,
            ResourceKind::Experience => &mut self.experience,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        ResourceKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }

    /// Component-wise product, used for `total = base * modifiers`.
    pub fn scaled_by(&self, factors: &ResourceBundle) -> ResourceBundle {
        let mut out = ResourceBundle::default();
        for kind in ResourceKind::ALL {
            *out.get_mut(kind) = self.get(kind) * factors.get(kind);
        }
        out
    }

    pub fn add_scaled(&mut self, other: &ResourceBundle, factor: f64) {
        for kind in ResourceKind::ALL {
            *self.get_mut(kind) += other.get(kind) * factor;
        }
    }

    pub fn subtract(&mut self, cost: &ResourceCost) {
        for (kind, amount) in cost.iter() {
            *self.get_mut(kind) -= amount;
        }
    }
}

/// A sparse bundle naming only the resources a price requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCost(BTreeMap<ResourceKind, f64>);

impl ResourceCost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ResourceKind, amount: f64) -> Self {
        self.0.insert(kind, amount);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Option<f64> {
        self.0.get(&kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        self.0.iter().map(|(kind, amount)| (*kind, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ResourceKind, f64)> for ResourceCost {
    fn from_iter<I: IntoIterator<Item = (ResourceKind, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ResourceCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(kind, amount)| format!("{amount:.0} {kind}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// A price is either a flat gold amount or a full bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum Cost<'a> {
    Gold(f64),
    Bundle(&'a ResourceCost),
}

impl From<f64> for Cost<'_> {
    fn from(value: f64) -> Self {
        Cost::Gold(value)
    }
}

impl<'a> From<&'a ResourceCost> for Cost<'a> {
    fn from(value: &'a ResourceCost) -> Self {
        Cost::Bundle(value)
    }
}

pub fn can_afford<'a>(resources: &ResourceBundle, cost: impl Into<Cost<'a>>) -> bool {
    match cost.into() {
        Cost::Gold(amount) => resources.gold >= amount,
        Cost::Bundle(bundle) => bundle
            .iter()
            .all(|(kind, amount)| resources.get(kind) >= amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_cost_checks_gold_only() {
        let resources = ResourceBundle {
            gold: 100.0,
            ..ResourceBundle::default()
        };
        assert!(can_afford(&resources, 100.0));
        assert!(!can_afford(&resources, 100.5));
    }

    #[test]
    fn bundle_cost_requires_every_named_resource() {
        let resources = ResourceBundle {
            gold: 500.0,
            wood: 199.0,
            stone: 300.0,
            ..ResourceBundle::default()
        };
        let cost = ResourceCost::new()
            .with(ResourceKind::Gold, 500.0)
            .with(ResourceKind::Wood, 200.0);
        assert!(!can_afford(&resources, &cost));

        let cost = ResourceCost::new()
            .with(ResourceKind::Gold, 500.0)
            .with(ResourceKind::Stone, 300.0);
        assert!(can_afford(&resources, &cost));
    }

    #[test]
    fn unnamed_resources_are_not_checked() {
        let resources = ResourceBundle {
            gold: 10.0,
            coal: -5.0,
            ..ResourceBundle::default()
        };
        let cost = ResourceCost::new().with(ResourceKind::Gold, 10.0);
        assert!(can_afford(&resources, &cost));
    }

    #[test]
    fn subtract_touches_only_named_resources() {
        let mut resources = ResourceBundle::splat(50.0);
        let cost = ResourceCost::new()
            .with(ResourceKind::Wood, 20.0)
            .with(ResourceKind::Food, 5.0);
        resources.subtract(&cost);
        assert_eq!(resources.wood, 30.0);
        assert_eq!(resources.food, 45.0);
        assert_eq!(resources.gold, 50.0);
        assert_eq!(resources.experience, 50.0);
    }

    #[test]
    fn cost_serializes_as_plain_map() {
        let cost = ResourceCost::new()
            .with(ResourceKind::Gold, 5.0)
            .with(ResourceKind::Coal, 1.0);
        let json = serde_json::to_string(&cost).unwrap();
        assert_eq!(json, r#"{"gold":5.0,"coal":1.0}"#);
    }
}
