use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::Result;

/// Directory an ingest run writes transient segment files into. Segments are
/// named deterministically (`seg_<NNNNN>.bin`) so the merger can enumerate
/// them without a side manifest.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub output_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&output_dir)?;
        Ok(StorageLayout { output_dir })
    }

    pub fn segment_path(&self, sequence: usize) -> PathBuf {
        self.output_dir.join(format!("seg_{:05}.bin", sequence))
    }

    /// Temp path for a file under construction, renamed to `final_path` on
    /// successful completion so a reader never observes a partial write.
    /// Shared by every writer in the pipeline (segment writer, mmap writer)
    /// so the write-to-temp-then-rename convention stays in one place.
    pub fn temp_path_for(final_path: &Path) -> PathBuf {
        let file_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        final_path.with_file_name(format!("{}.tmp", file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_paths_are_zero_padded_and_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            layout.segment_path(3).file_name().unwrap().to_str().unwrap(),
            "seg_00003.bin"
        );
    }

    #[test]
    fn temp_path_appends_tmp_suffix_to_file_name() {
        let final_path = Path::new("/tmp/out/seg_00003.bin");
        let temp = StorageLayout::temp_path_for(final_path);
        assert_eq!(temp.file_name().unwrap().to_str().unwrap(), "seg_00003.bin.tmp");
        assert_eq!(temp.parent(), final_path.parent());
    }
}
