use std::{fs::File, io::Write, os::fd::IntoRawFd, path::Path};

use crate::error::{BenchError, Result};

/// Close `file` and report the result of close(2), which `Drop for File` silently discards.
pub fn close_checked(file: File, path: &Path) -> Result<()> {
    let fd = file.into_raw_fd();
    nix::unistd::close(fd).map_err(|errno| BenchError::Io {
        op: "close",
        path: path.to_owned(),
        source: errno.into(),
    })
}

/// A single write(2); a short write is an error, not a reason to loop.
pub fn write_once<W: Write>(out: &mut W, path: &Path, bytes: &[u8]) -> Result<()> {
    let written = out.write(bytes).map_err(BenchError::io("write", path))?;
    if written != bytes.len() {
        return Err(BenchError::Io {
            op: "write",
            path: path.to_owned(),
            source: std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short write: {written} of {} bytes", bytes.len()),
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most `limit` bytes per call.
    struct Trickle {
        limit: usize,
        written: Vec<u8>,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_write_is_not_retried() {
        let mut out = Trickle {
            limit: 4,
            written: Vec::new(),
        };
        match write_once(&mut out, Path::new("out.csv"), b"100,1,1.000,2.000\n") {
            Err(BenchError::Io { op, source, .. }) => {
                assert_eq!(op, "write");
                assert_eq!(source.kind(), std::io::ErrorKind::WriteZero);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(out.written, b"100,");
    }

    #[test]
    fn full_write_succeeds() {
        let mut out = Trickle {
            limit: usize::MAX,
            written: Vec::new(),
        };
        write_once(&mut out, Path::new("out.csv"), b"abc\n").unwrap();
        assert_eq!(out.written, b"abc\n");
    }

    #[test]
    fn write_error_carries_path() {
        let mut full = std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .unwrap();
        match write_once(&mut full, Path::new("/dev/full"), b"x\n") {
            Err(BenchError::Io { op, path, .. }) => {
                assert_eq!(op, "write");
                assert_eq!(path, Path::new("/dev/full"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
