use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Block size for the streaming digest pass. Content of arbitrary size is
/// hashed without ever holding more than one block in memory.
const BLOCK_SIZE: usize = 4096;

/// Hex SHA2-256 digest of a file, read in fixed-size blocks.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];
    loop {
        let n = file.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn digest_of(content: &[u8]) -> String {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(content).unwrap();
        sha256_file(tmp.path()).unwrap()
    }

    #[test]
    fn empty_file_digest() {
        assert_eq!(
            digest_of(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            digest_of(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn multi_block_content() {
        // Spans several 4 KiB blocks with a ragged tail.
        let content = vec![0xA5u8; BLOCK_SIZE * 3 + 17];
        let streamed = digest_of(&content);
        let whole = hex::encode(Sha256::digest(&content));
        assert_eq!(streamed, whole);
    }
}
