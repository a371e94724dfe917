use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use jobwatch_logging::{watch_info, watch_warn};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dedup store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Links already notified, one per line in a flat text file.
#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the set of posted links. A missing file is an empty set.
    ///
    /// Lines are trimmed and blank lines ignored. If the file held blank,
    /// padded or repeated lines it is rewritten in compact form.
    pub fn load(&self) -> Result<HashSet<String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watch_info!(
                    "No posted jobs file at {}; starting with an empty set.",
                    self.path.display()
                );
                return Ok(HashSet::new());
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let mut links = HashSet::new();
        let mut ordered = Vec::new();
        let mut untidy = false;
        for line in content.lines() {
            let link = line.trim();
            if link.is_empty() || link.len() != line.len() {
                untidy = true;
            }
            if link.is_empty() {
                continue;
            }
            if links.insert(link.to_string()) {
                ordered.push(link);
            } else {
                untidy = true;
            }
        }

        if untidy {
            match self.rewrite(&ordered) {
                Ok(()) => watch_info!("Compacted posted jobs file {}", self.path.display()),
                Err(err) => watch_warn!("Could not compact posted jobs file: {}", err),
            }
        }
        watch_info!("Loaded {} previously posted job links.", links.len());
        Ok(links)
    }

    /// Records one delivered link. Creates the file and its directory when
    /// missing.
    pub fn append(&self, link: &str) -> Result<(), StoreError> {
        if let Some(dir) = self.dir() {
            fs::create_dir_all(dir).map_err(|err| StoreError::io(dir, err))?;
        }
        let needs_newline =
            !ends_with_newline(&self.path).map_err(|err| StoreError::io(&self.path, err))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::io(&self.path, err))?;
        let line = if needs_newline {
            format!("\n{}\n", link.trim())
        } else {
            format!("{}\n", link.trim())
        };
        file.write_all(line.as_bytes())
            .map_err(|err| StoreError::io(&self.path, err))
    }

    fn dir(&self) -> Option<&Path> {
        self.path.parent().filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Replaces the file through a temp file in the same directory.
    fn rewrite(&self, links: &[&str]) -> Result<(), StoreError> {
        let dir = self.dir().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| StoreError::io(dir, err))?;
        let mut content = links.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        write_synced(&mut tmp, content.as_bytes()).map_err(|err| StoreError::io(tmp.path(), err))?;
        tmp.persist(&self.path)
            .map_err(|err| StoreError::io(&self.path, err.error))?;
        Ok(())
    }
}

fn write_synced(tmp: &mut NamedTempFile, content: &[u8]) -> io::Result<()> {
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()
}

/// True for a missing or empty file, so appends never glue onto a line.
fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err),
    };
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
