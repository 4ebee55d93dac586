//! Content fingerprinting
//!
//! Files are hashed with MD5 in fixed-size chunks so memory stays bounded no
//! matter how large the file is. The digest only identifies content for the
//! catalog; it is not used for anything security-sensitive.

use crate::error::{HashbindError, Result};
use crate::types::{FileDescriptor, Fingerprint, FingerprintResult};
use std::io::Read;

const READ_BUFFER_SIZE: usize = 8192;

/// Fingerprint an in-memory byte slice
pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
    Fingerprint::from_digest(md5::compute(data))
}

/// Fingerprint any readable source
pub fn compute_fingerprint<R: Read>(reader: &mut R) -> std::io::Result<Fingerprint> {
    let mut context = md5::Context::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        context.consume(&buffer[..bytes_read]);
    }

    Ok(Fingerprint::from_digest(context.compute()))
}

/// Fingerprint a discovered file.
///
/// Blocking; callers on an async runtime should run this on the blocking pool.
pub fn fingerprint_file(file: &FileDescriptor) -> Result<FingerprintResult> {
    let fingerprint = std::fs::File::open(&file.path)
        .and_then(|mut handle| compute_fingerprint(&mut handle))
        .map_err(|e| HashbindError::file_read(&file.path, e))?;

    Ok(FingerprintResult {
        fingerprint,
        name: file.name.clone(),
        path: file.path.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_fingerprint_bytes() {
        // MD5 of "Hello, world!"
        assert_eq!(
            fingerprint_bytes(b"Hello, world!").as_str(),
            "6cd3556deb0da54bca060b4c39479839"
        );
    }

    #[test]
    fn test_fingerprint_empty() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let fp = compute_fingerprint(&mut cursor).unwrap();
        assert_eq!(fp.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_fingerprint_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test data").unwrap();
        temp_file.flush().unwrap();

        let file = FileDescriptor::from_path(temp_file.path());
        let result = fingerprint_file(&file).unwrap();
        assert_eq!(result.fingerprint.as_str(), "eb733a00c0c9d336e65691a37ab54293");
        assert_eq!(result.name, file.name);
        assert_eq!(result.path, file.path);
    }

    #[test]
    fn test_fingerprint_file_larger_than_buffer() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..(READ_BUFFER_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        let result = fingerprint_file(&FileDescriptor::from_path(temp_file.path())).unwrap();
        assert_eq!(result.fingerprint, fingerprint_bytes(&data));
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileDescriptor::from_path(dir.path().join("vanished.bin"));

        let err = fingerprint_file(&file).unwrap_err();
        assert!(matches!(err, HashbindError::FileRead { .. }));
        assert!(err.to_string().contains("vanished.bin"));
    }

    proptest! {
        #[test]
        fn prop_streamed_matches_one_shot(data in proptest::collection::vec(any::<u8>(), 0..40_000)) {
            let streamed = compute_fingerprint(&mut Cursor::new(&data)).unwrap();
            prop_assert_eq!(streamed, fingerprint_bytes(&data));
        }
    }
}
