use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tar::Archive;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::error::{PipelineError, Result};

/// Archive containers the ingestion stage can unpack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarZstd,
}

impl ArchiveFormat {
    /// Pick a format from the file name; anything unrecognised is treated as zip
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            ArchiveFormat::TarZstd
        } else {
            ArchiveFormat::Zip
        }
    }
}

/// Unpack `archive` into `dest`, which must already exist
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .map_err(|e| PipelineError::io(format!("Failed to open archive {:?}", archive), e))?;

    match ArchiveFormat::from_path(archive) {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(BufReader::new(file))
                .map_err(|e| PipelineError::archive(archive, e))?;
            zip.extract(dest)
                .map_err(|e| PipelineError::archive(archive, e))?;
        }
        ArchiveFormat::TarZstd => {
            let decoder = ZstdDecoder::new(file).map_err(|e| PipelineError::archive(archive, e))?;
            Archive::new(decoder)
                .unpack(dest)
                .map_err(|e| PipelineError::archive(archive, e))?;
        }
    }

    Ok(())
}
