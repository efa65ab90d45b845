use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use broker_common::errors::Result;

use crate::RegistrySnapshot;

/// Persists and loads a [`RegistrySnapshot`] to/from whatever "durable
/// key/value of the server state" backs a deployment. The on-disk format
/// is an implementation detail; this trait is the seam an operator can
/// swap.
pub trait DurableStore: Send + Sync {
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()>;
    fn load(&self) -> Result<Option<RegistrySnapshot>>;
}

/// A plain JSON file on local disk. The default, working implementation so
/// the binary runs standalone without an external collaborator.
pub struct FileDurableStore {
    path: PathBuf,
}

impl FileDurableStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }
}

impl DurableStore for FileDurableStore {
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer(BufWriter::new(file), snapshot)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<RegistrySnapshot>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(serde_json::from_reader(file)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentSnapshot, Channel};
    use std::collections::{HashMap, HashSet};

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDurableStore::new(dir.path().join("registry.json"));

        let mut channels = HashMap::new();
        channels.insert(
            "c1".to_owned(),
            Channel {
                owner: "u1".to_owned(),
                version: 2,
            },
        );
        let snapshot = RegistrySnapshot {
            agents: vec![AgentSnapshot {
                uaid: "u1".to_owned(),
                channels: HashSet::from(["c1".to_owned()]),
                wakeup: None,
                last_contact: 7,
            }],
            channels,
            groups: HashMap::new(),
        };

        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDurableStore::new(dir.path().join("missing.json"));
        assert!(store.load().unwrap().is_none());
    }
}
