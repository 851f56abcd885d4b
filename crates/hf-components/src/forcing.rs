//! External driving inputs bound to spatial units.

use std::fmt;

use hf_core::{NodeId, UnitId, same_tag};

use crate::error::{ComponentError, ComponentResult};

/// Kind of forcing variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableKind {
    Precipitation,
    Temperature,
    PotentialEvapotranspiration,
}

impl VariableKind {
    /// Parse a variable name (case-insensitive).
    pub fn from_name(name: &str) -> ComponentResult<Self> {
        const TABLE: &[(&str, VariableKind)] = &[
            ("precipitation", VariableKind::Precipitation),
            ("precip", VariableKind::Precipitation),
            ("temperature", VariableKind::Temperature),
            ("temp", VariableKind::Temperature),
            ("pet", VariableKind::PotentialEvapotranspiration),
            (
                "potential_evapotranspiration",
                VariableKind::PotentialEvapotranspiration,
            ),
        ];
        TABLE
            .iter()
            .find(|(alias, _)| same_tag(alias, name))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ComponentError::InvalidArg {
                what: format!("unknown forcing variable '{name}'"),
            })
    }

    /// Whether the variable is an amount of water that can feed a brick.
    pub fn is_water_input(self) -> bool {
        matches!(self, VariableKind::Precipitation)
    }

    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Precipitation => "precipitation",
            VariableKind::Temperature => "temperature",
            VariableKind::PotentialEvapotranspiration => "pet",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A forcing instance on one spatial unit.
///
/// The value is supplied from outside once per step and stays constant
/// within the step.
#[derive(Debug, Clone, PartialEq)]
pub struct Forcing {
    kind: VariableKind,
    unit: UnitId,
    node: NodeId,
    value: f64,
}

impl Forcing {
    pub fn new(kind: VariableKind, unit: UnitId, node: NodeId) -> Self {
        Self {
            kind,
            unit,
            node,
            value: 0.0,
        }
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Graph node standing for this forcing.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn update(&mut self, value: f64) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(
            VariableKind::from_name("Precipitation").unwrap(),
            VariableKind::Precipitation
        );
        assert_eq!(
            VariableKind::from_name("PET").unwrap(),
            VariableKind::PotentialEvapotranspiration
        );
        assert!(VariableKind::from_name("wind").is_err());
    }

    #[test]
    fn only_precipitation_is_water() {
        assert!(VariableKind::Precipitation.is_water_input());
        assert!(!VariableKind::Temperature.is_water_input());
    }

    #[test]
    fn forcing_holds_latest_value() {
        let mut f = Forcing::new(
            VariableKind::Precipitation,
            UnitId::from_index(0),
            NodeId::from_index(3),
        );
        assert_eq!(f.value(), 0.0);
        f.update(12.5);
        assert_eq!(f.value(), 12.5);
        assert_eq!(f.node().index(), 3);
    }
}
