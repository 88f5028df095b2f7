//! Archive extraction
//!
//! Package archives are gzip compressed tarballs (`.tar.gz` or `.tgz`).

use flate2::read::GzDecoder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::PackageError;

/// Whether `archive` has an extension we can unpack
pub fn is_supported_archive(archive: &Path) -> bool {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Unpack `archive` into `dest_dir`, creating it if needed.
pub fn unpack_archive(archive: &Path, dest_dir: &Path) -> Result<(), PackageError> {
    if !is_supported_archive(archive) {
        return Err(PackageError::UnsupportedArchive {
            archive: archive.to_path_buf(),
        });
    }
    let unpack_err = |e: std::io::Error| PackageError::Unpack {
        archive: archive.to_path_buf(),
        error: e.to_string(),
    };

    debug!("Unpacking {} into {}", archive.display(), dest_dir.display());
    std::fs::create_dir_all(dest_dir).map_err(unpack_err)?;
    let file = File::open(archive).map_err(unpack_err)?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball.set_preserve_permissions(true);
    tarball.unpack(dest_dir).map_err(unpack_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn make_tgz(path: &Path, files: &[(&str, &[u8])]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_unpack_tgz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg.tgz");
        make_tgz(&archive, &[("bin/yosys", b"#!/bin/sh\n"), ("README", b"hi")]);

        let dest = temp.path().join("out");
        unpack_archive(&archive, &dest).unwrap();

        assert!(dest.join("bin/yosys").is_file());
        assert_eq!(std::fs::read(dest.join("README")).unwrap(), b"hi");
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let err = unpack_archive(&temp.path().join("pkg.zip"), temp.path()).unwrap_err();
        assert!(matches!(err, PackageError::UnsupportedArchive { .. }));
    }

    #[test]
    fn test_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bad.tar.gz");
        std::fs::write(&archive, b"not gzip").unwrap();
        let err = unpack_archive(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, PackageError::Unpack { .. }));
    }
}
