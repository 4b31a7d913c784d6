//! A stable content hash of a file's bytes, used as File identity. Streams
//! the file in fixed-size chunks so memory use is independent of file size.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use data_encoding::HEXLOWER;
use sha1::{Digest, Sha1};

const BUFFER_SIZE: usize = 8192;

pub fn checksum_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(HEXLOWER.encode(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_stable_across_calls() {
        let tmp = tempfile_with_contents(b">a\nPEPTIDE\n");
        let first = checksum_file(tmp.path()).unwrap();
        let second = checksum_file(tmp.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn checksum_differs_for_different_contents() {
        let a = tempfile_with_contents(b">a\nPEPTIDE\n");
        let b = tempfile_with_contents(b">a\nPEPTIDES\n");
        assert_ne!(checksum_file(a.path()).unwrap(), checksum_file(b.path()).unwrap());
    }

    fn tempfile_with_contents(contents: &[u8]) -> NamedFile {
        let path = std::env::temp_dir().join(format!(
            "pepdigest-checksum-test-{}-{}",
            std::process::id(),
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        NamedFile { path }
    }

    struct NamedFile {
        path: std::path::PathBuf,
    }

    impl NamedFile {
        fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for NamedFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
