use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use bsp_types::{SnapshotHeader, FORMAT_VERSION};
use tracing::debug;

use crate::error::{CodecError, CodecResult};

/// File holding the snapshot header.
pub const HEADER_FILE: &str = "base.json";
/// File holding the per-account summary array.
pub const ACCOUNTS_FILE: &str = "accounts.json";
/// File holding the per-leaf proof array.
pub const PROOFS_FILE: &str = "proofs.json";

/// Paths of the three snapshot streams inside one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotLayout {
    root: PathBuf,
}

impl SnapshotLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn header_path(&self) -> PathBuf {
        self.root.join(HEADER_FILE)
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.root.join(ACCOUNTS_FILE)
    }

    pub fn proofs_path(&self) -> PathBuf {
        self.root.join(PROOFS_FILE)
    }

    /// All three stream paths, header first.
    pub fn paths(&self) -> [PathBuf; 3] {
        [self.header_path(), self.accounts_path(), self.proofs_path()]
    }

    /// Whether any stream of a snapshot is already present.
    pub fn exists(&self) -> bool {
        self.paths().iter().any(|p| p.exists())
    }
}

/// Write the header as pretty-printed JSON.
pub fn write_header(writer: impl Write, header: &SnapshotHeader) -> CodecResult<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, header)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read and version-check a header file.
pub fn read_header(path: impl AsRef<Path>) -> CodecResult<SnapshotHeader> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let header: SnapshotHeader = serde_json::from_reader(BufReader::new(file))?;
    if header.format_version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(header.format_version));
    }
    debug!(
        path = %path.display(),
        root = %header.state_root,
        leaves = header.leaf_count,
        "read snapshot header"
    );
    Ok(header)
}
