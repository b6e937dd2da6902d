use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::filename::{FileType, parse_file_name};
use crate::repair::FileNumberAllocator;

/// Engine files found in one directory, grouped by type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredFiles {
    /// Bare names of every manifest, superseded once repair installs its own.
    pub manifests: Vec<String>,
    /// Log numbers, ascending.
    pub logs: Vec<u64>,
    /// Table numbers, ascending.
    pub tables: Vec<u64>,
    /// Seeded one past the largest non-manifest file number.
    pub allocator: FileNumberAllocator,
    /// How many names parsed as engine files.
    pub recognized: usize,
}

impl DiscoveredFiles {
    pub fn classify<S: AsRef<str>>(names: &[S]) -> Self {
        let mut found = DiscoveredFiles::default();
        for name in names {
            let name = name.as_ref();
            let Some((number, file_type)) = parse_file_name(name) else {
                continue;
            };
            found.recognized += 1;
            if file_type == FileType::Descriptor {
                found.manifests.push(name.to_string());
                continue;
            }
            found.allocator.mark_used(number);
            match file_type {
                FileType::Log => found.logs.push(number),
                FileType::Table => found.tables.push(number),
                _ => {}
            }
        }
        found.manifests.sort();
        found.logs.sort_unstable();
        found.tables.sort_unstable();
        found
    }
}

/// Entry names of `dir`. Names that are not UTF-8 cannot be engine files
/// and are left out.
pub fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        if let Ok(name) = entry?.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}

/// List and classify `dir`. A directory without a single engine file is
/// an error: there is nothing to rebuild from.
pub fn discover(dir: &Path) -> Result<DiscoveredFiles> {
    let found = DiscoveredFiles::classify(&list_dir(dir)?);
    if found.recognized == 0 {
        return Err(Error::NoFiles(dir.to_path_buf()));
    }
    debug!(
        dir = %dir.display(),
        logs = found.logs.len(),
        tables = found.tables.len(),
        manifests = found.manifests.len(),
        next_file = found.allocator.next_file_number(),
        "found files"
    );
    Ok(found)
}
