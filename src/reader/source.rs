use std::fs::File;
use std::io;

/// Positioned byte source.
///
/// `read_at` must be idempotent and safe for concurrent callers; it returns
/// `Ok(0)` only at or past the end of the source and never moves a shared
/// cursor.
pub trait ReadAt: Send + Sync {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> io::Result<u64>;
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

#[cfg(unix)]
impl ReadAt for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

#[cfg(windows)]
impl ReadAt for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

/// Fill `buf` completely from `offset`; any shortfall is `UnexpectedEof`.
pub(crate) fn read_exact_at<R: ReadAt + ?Sized>(
    reader: &R,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<()> {
    if !try_read_exact_at(reader, buf, offset)? {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "unexpected end of source",
        ));
    }
    Ok(())
}

/// Like [`read_exact_at`], but a clean end of source (no byte available at
/// `offset`) is reported as `Ok(false)`.
pub(crate) fn try_read_exact_at<R: ReadAt + ?Sized>(
    reader: &R,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<bool> {
    let mut read = 0usize;
    while read < buf.len() {
        match reader.read_at(&mut buf[read..], offset + read as u64) {
            Ok(0) if read == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "unexpected end of source",
                ))
            }
            Ok(n) => read += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}
