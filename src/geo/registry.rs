use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// A tracked nation with its stable identifier and declared state membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub name: String,
    #[serde(default)]
    pub states: Vec<String>,
}

/// Authoritative list of tracked entities. Pure data, loaded once per batch.
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read entity registry: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid entity registry data: {0}")]
    Json(#[from] serde_json::Error),
}

impl EntityRegistry {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegistryError> {
        let entities: Vec<Entity> = serde_json::from_reader(reader)?;
        Ok(Self { entities })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
