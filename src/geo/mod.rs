pub mod crosswalk;
pub mod registry;

pub use crosswalk::{AreaCountyRelations, AreaWeightTable, Crosswalk, CountyWeight};
pub use registry::{Entity, EntityRegistry, RegistryError};

use std::collections::BTreeMap;

/// Directory of every county known to the loaded source tables, keyed by
/// normalized FIPS code. Backs the state-level resolver fallback.
#[derive(Debug, Default, Clone)]
pub struct CountyDirectory {
    states: BTreeMap<String, String>,
}

impl CountyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, county_fips: String, state: String) {
        self.states
            .entry(county_fips)
            .or_insert_with(|| state.trim().to_ascii_uppercase());
    }

    /// All counties whose state abbreviation appears in `states`, in FIPS order.
    pub fn counties_in_states(&self, states: &[String]) -> Vec<String> {
        if states.is_empty() {
            return Vec::new();
        }

        let wanted: Vec<String> = states
            .iter()
            .map(|state| state.trim().to_ascii_uppercase())
            .collect();

        self.states
            .iter()
            .filter(|(_, state)| wanted.iter().any(|candidate| candidate == *state))
            .map(|(fips, _)| fips.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
