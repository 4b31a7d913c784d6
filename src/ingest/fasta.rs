//! FASTA reading: a byte stream yielding `(header, sequence)` pairs.
//! Sequence lines accumulate until the next `>` header or EOF. Exposed as a
//! two-pass `Iterator` so the coordinator can count records before
//! streaming them.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub sequence: String,
}

/// Counts FASTA records in `path` without materializing their sequences,
/// for the first of two passes over the file.
pub fn count_records(path: &Path) -> io::Result<usize> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut count = 0usize;
    for line in reader.lines() {
        if line?.trim_start().starts_with('>') {
            count += 1;
        }
    }
    Ok(count)
}

/// Streams `(header, sequence)` pairs out of a FASTA file, one record at a
/// time, with sequence whitespace and line breaks stripped.
pub struct FastaReader {
    lines: std::io::Lines<BufReader<File>>,
    pending_header: Option<String>,
    exhausted: bool,
}

impl FastaReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(FastaReader {
            lines: BufReader::new(file).lines(),
            pending_header: None,
            exhausted: false,
        })
    }
}

impl Iterator for FastaReader {
    type Item = io::Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let header = match self.pending_header.take() {
            Some(header) => header,
            None => loop {
                match self.lines.next() {
                    None => {
                        self.exhausted = true;
                        return None;
                    }
                    Some(Err(err)) => return Some(Err(err)),
                    Some(Ok(line)) => {
                        let trimmed = line.trim();
                        if let Some(rest) = trimmed.strip_prefix('>') {
                            break rest.to_owned();
                        }
                        // Sequence lines before any header are malformed input;
                        // the coordinator treats this as a parse error.
                        if !trimmed.is_empty() {
                            return Some(Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                "sequence data before first FASTA header",
                            )));
                        }
                    }
                }
            },
        };
        let mut sequence = String::new();
        loop {
            match self.lines.next() {
                None => {
                    self.exhausted = true;
                    break;
                }
                Some(Err(err)) => return Some(Err(err)),
                Some(Ok(line)) => {
                    let trimmed = line.trim();
                    if let Some(rest) = trimmed.strip_prefix('>') {
                        self.pending_header = Some(rest.to_owned());
                        break;
                    }
                    sequence.push_str(trimmed);
                }
            }
        }
        Some(Ok(FastaRecord { header, sequence }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct NamedFile(std::path::PathBuf);

    impl Drop for NamedFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn write_fixture(name: &str, contents: &str) -> NamedFile {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        NamedFile(path)
    }

    #[test]
    fn reads_multi_line_records() {
        let fixture = write_fixture(
            "pepdigest_fasta_test_multi.fasta",
            ">sp|P1|one\nAKAK\nBK\n>sp|P2|two\nCKDK\n",
        );
        let records: Vec<FastaRecord> = FastaReader::open(&fixture.0)
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            records,
            vec![
                FastaRecord {
                    header: "sp|P1|one".to_owned(),
                    sequence: "AKAKBK".to_owned()
                },
                FastaRecord {
                    header: "sp|P2|two".to_owned(),
                    sequence: "CKDK".to_owned()
                },
            ]
        );
    }

    #[test]
    fn count_matches_iterator_length() {
        let fixture = write_fixture(
            "pepdigest_fasta_test_count.fasta",
            ">a\nAK\n>b\nBK\n>c\nCK\n",
        );
        assert_eq!(count_records(&fixture.0).unwrap(), 3);
        let count = FastaReader::open(&fixture.0).unwrap().count();
        assert_eq!(count, 3);
    }

    #[test]
    fn empty_file_yields_no_records() {
        let fixture = write_fixture("pepdigest_fasta_test_empty.fasta", "");
        let records: Vec<_> = FastaReader::open(&fixture.0).unwrap().collect();
        assert!(records.is_empty());
    }
}
