use std::{
    collections::BTreeMap,
    fs::{create_dir_all, File},
    io,
    path::Path,
};

use selector::SavedSelection;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access the saved selections cuz: {0:?}")]
    IoError(#[from] io::Error),
    #[error("Failed to (de)serialize the saved selections cuz: {0:?}")]
    Bincode(#[from] bincode::Error),
}

/// The last track selection of every file, keyed on the path mpv reports.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SavedSelections {
    files: BTreeMap<String, SavedSelection>,
}

impl SavedSelections {
    pub fn get(&self, path: &str) -> Option<SavedSelection> {
        self.files.get(path).copied()
    }

    /// Returns whether anything changed.
    pub fn record(&mut self, path: &str, selection: SavedSelection) -> bool {
        let old = self.files.insert(path.to_string(), selection);
        old != Some(selection)
    }

    pub fn forget(&mut self, path: &str) -> Option<SavedSelection> {
        self.files.remove(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SavedSelection)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A missing file is the same as an empty one.
pub fn read_store(path: &Path) -> StoreResult<SavedSelections> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("There are no saved selections yet");
            return Ok(SavedSelections::default());
        }
        Err(e) => return Err(e.into()),
    };
    let store = bincode::deserialize_from(io::BufReader::new(file))?;
    Ok(store)
}

pub fn write_store(path: &Path, contents: &SavedSelections) -> StoreResult<()> {
    if let Some(p) = path.parent() {
        create_dir_all(p)?;
    }
    let mut file = File::create(path)?;

    bincode::serialize_into(&mut file, contents)?;

    file.sync_all()?;
    log::debug!("Wrote {} saved selections to {:?}", contents.len(), path);
    Ok(())
}
