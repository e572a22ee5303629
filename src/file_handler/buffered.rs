//! Buffered stream backend.
//!
//! A single scratch buffer owned by the stream serves both directions, the way
//! a stdio stream does: it holds read-ahead while reading and pending bytes
//! while writing. Switching direction first settles the buffer (pending writes
//! are flushed, unread read-ahead is given back to the OS cursor), so the
//! logical position seen by the caller is always exact.
//!
//! Like stdio, a failed read or write sets a sticky error indicator that is
//! reported by [`BufferedStream::error`] until [`BufferedStream::clear_error`].

use log::{trace, warn};
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    Idle,
    /// `scratch[pos..filled]` is read-ahead not yet handed to the caller
    Reading { pos: usize, filled: usize },
    /// `scratch[..len]` is waiting to be written
    Writing { len: usize },
}

/// File stream with an explicitly owned scratch buffer.
#[derive(Debug)]
pub struct BufferedStream {
    file: File,
    scratch: Box<[u8]>,
    state: BufferState,
    writable: bool,
    error: bool,
    eof: bool,
}

impl BufferedStream {
    /// Wrap `file` with a scratch buffer of `capacity` bytes (at least one).
    ///
    /// `writable` must match how `file` was opened: a stream that is not
    /// writable refuses writes up front instead of buffering them.
    pub fn with_capacity(file: File, capacity: usize, writable: bool) -> Self {
        Self {
            file,
            scratch: vec![0u8; capacity.max(1)].into_boxed_slice(),
            state: BufferState::Idle,
            writable,
            error: false,
            eof: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Sticky error indicator, set by any failed read or write.
    pub fn error(&self) -> bool {
        self.error
    }

    /// Whether the last read stopped at end of file.
    pub fn eof(&self) -> bool {
        self.eof
    }

    pub fn clear_error(&mut self) {
        self.error = false;
        self.eof = false;
    }

    /// Read up to `buf.len()` bytes, stopping early only at end of file.
    ///
    /// A short count is the end-of-file signal. If an error interrupts a read
    /// that already produced bytes, those bytes are returned and the error
    /// indicator is set.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.settle_writes()?;

        let mut total = 0;
        while total < buf.len() {
            let (pos, filled) = match self.state {
                BufferState::Reading { pos, filled } if pos < filled => (pos, filled),
                _ => {
                    let remaining = buf.len() - total;
                    let result = if remaining >= self.scratch.len() {
                        // Large requests skip the scratch buffer entirely
                        self.file.read(&mut buf[total..])
                    } else {
                        self.file.read(&mut self.scratch[..])
                    };

                    match result {
                        Ok(0) => {
                            self.state = BufferState::Idle;
                            self.eof = true;
                            break;
                        }
                        Ok(n) if remaining >= self.scratch.len() => {
                            self.state = BufferState::Idle;
                            total += n;
                            continue;
                        }
                        Ok(n) => (0, n),
                        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(e) => {
                            self.state = BufferState::Idle;
                            return self.fail(total, e);
                        }
                    }
                }
            };

            let n = (filled - pos).min(buf.len() - total);
            buf[total..total + n].copy_from_slice(&self.scratch[pos..pos + n]);
            total += n;
            self.state = BufferState::Reading {
                pos: pos + n,
                filled,
            };
        }

        trace!("buffered read {} of {} bytes", total, buf.len());
        Ok(total)
    }

    /// Queue `data` for writing, pushing full buffers to the OS.
    pub fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.writable {
            self.error = true;
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                "stream is not open for writing",
            ));
        }
        self.settle_reads()?;

        let capacity = self.scratch.len();
        let mut written = 0;
        while written < data.len() {
            let len = match self.state {
                BufferState::Writing { len } => len,
                _ => 0,
            };
            let rest = &data[written..];

            if len == 0 && rest.len() >= capacity {
                if let Err(e) = self.file.write_all(rest) {
                    return self.fail(written, e);
                }
                written += rest.len();
                break;
            }

            let n = (capacity - len).min(rest.len());
            self.scratch[len..len + n].copy_from_slice(&rest[..n]);
            self.state = BufferState::Writing { len: len + n };
            written += n;

            if len + n == capacity {
                if let Err(e) = self.settle_writes() {
                    return self.fail(written - n, e);
                }
            }
        }

        trace!("buffered write {} bytes", written);
        Ok(written)
    }

    /// Reposition the stream and return the new absolute position.
    ///
    /// On failure the logical position is unchanged.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.settle_writes()?;
        self.settle_reads()?;

        let new_pos = self.file.seek(pos)?;
        self.eof = false;
        Ok(new_pos)
    }

    /// Logical position: the OS cursor adjusted for buffered bytes.
    pub fn position(&mut self) -> io::Result<u64> {
        let os_pos = self.file.stream_position()?;
        Ok(match self.state {
            BufferState::Idle => os_pos,
            BufferState::Reading { pos, filled } => os_pos - (filled - pos) as u64,
            BufferState::Writing { len } => os_pos + len as u64,
        })
    }

    /// Push pending bytes to the OS.
    pub fn flush(&mut self) -> io::Result<()> {
        self.settle_writes()?;
        self.file.flush()
    }

    /// Flush and release the stream. The descriptor and scratch buffer are
    /// released even when the flush fails.
    pub fn close(mut self) -> io::Result<()> {
        self.flush()
    }

    fn settle_writes(&mut self) -> io::Result<()> {
        if let BufferState::Writing { len } = self.state {
            // The pending bytes are dropped on failure, as stdio does
            self.state = BufferState::Idle;
            if let Err(e) = self.file.write_all(&self.scratch[..len]) {
                self.error = true;
                return Err(e);
            }
        }
        Ok(())
    }

    fn settle_reads(&mut self) -> io::Result<()> {
        if let BufferState::Reading { pos, filled } = self.state {
            let unread = (filled - pos) as i64;
            if unread > 0 {
                self.file.seek(SeekFrom::Current(-unread))?;
            }
            self.state = BufferState::Idle;
        }
        Ok(())
    }

    fn fail(&mut self, done: usize, err: io::Error) -> io::Result<usize> {
        self.error = true;
        if done > 0 {
            Ok(done)
        } else {
            Err(err)
        }
    }
}

impl Drop for BufferedStream {
    fn drop(&mut self) {
        if let Err(e) = self.settle_writes() {
            warn!("Dropping buffered stream lost pending writes: {}", e);
        }
    }
}
