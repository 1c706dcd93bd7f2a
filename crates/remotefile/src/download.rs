//! Streaming a response body onto disk.
//!
//! Content is written to a temporary file next to the target and renamed
//! over it once complete, so a reader of `target` sees either the old
//! content or the new one, never a partial body. The context is checked
//! between chunks; on any failure the temporary file is dropped and the
//! target is left untouched.

use crate::error::{Error, Result};
use declarative::ApplyContext;
use std::io::{self, Read, Write};
use std::path::Path;

/// Read buffer size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Copy `body` to `target`, returning the number of bytes written.
///
/// The parent directory of `target` must exist.
pub(crate) fn stream_to_file(
    ctx: &ApplyContext,
    url: &str,
    target: &Path,
    body: &mut dyn Read,
) -> Result<u64> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".terraurl-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        ctx.checkpoint().map_err(|r| Error::interrupted(url, r))?;
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::http(url, e)),
        };
        tmp.write_all(&buf[..n])
            .map_err(|e| Error::io(tmp.path(), e))?;
        written += n as u64;
    }
    tmp.flush().map_err(|e| Error::io(tmp.path(), e))?;

    ctx.checkpoint().map_err(|r| Error::interrupted(url, r))?;
    tmp.persist(target).map_err(|e| Error::io(target, e.error))?;

    log::debug!("Wrote {} bytes to {}", written, target.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::CancelToken;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_stream_writes_all_bytes() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.bin");
        let data = vec![7u8; CHUNK_SIZE * 2 + 5];

        let written = stream_to_file(
            &ApplyContext::default(),
            "https://x/out.bin",
            &target,
            &mut Cursor::new(data.clone()),
        )
        .unwrap();

        assert_eq!(written, data.len() as u64);
        assert_eq!(fs::read(&target).unwrap(), data);
        assert_eq!(entries(dir.path()), 1);
    }

    #[test]
    fn test_stream_replaces_existing_content() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old content that is longer").unwrap();

        stream_to_file(
            &ApplyContext::default(),
            "https://x/out.txt",
            &target,
            &mut Cursor::new(b"new".to_vec()),
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_cancelled_stream_keeps_old_content() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old").unwrap();

        let token = CancelToken::new();
        token.cancel();
        let ctx = ApplyContext::default().with_cancel_token(token);

        let mut body = Cursor::new(b"new".to_vec());
        let err = stream_to_file(&ctx, "https://x/out.txt", &target, &mut body).unwrap_err();

        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(entries(dir.path()), 1);
    }

    #[test]
    fn test_failing_body_is_transport_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let ctx = ApplyContext::default();
        let err = stream_to_file(&ctx, "https://x/out.txt", &target, &mut Broken).unwrap_err();

        assert!(matches!(err, Error::Http { .. }));
        assert!(!target.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_missing_parent_is_filesystem_error() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("no/such/dir/out.txt");
        let err = stream_to_file(
            &ApplyContext::default(),
            "https://x/out.txt",
            &target,
            &mut Cursor::new(b"data".to_vec()),
        )
        .unwrap_err();

        assert!(err.is_not_found());
    }
}
