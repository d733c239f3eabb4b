//! Raw payload streaming in both directions.

use std::io;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::progress::{Direction, ProgressReporter, TransferProgress};
use crate::{TransferError, TransferOptions};

/// Streams the contents of `path` to `writer`.
///
/// Exactly `declared_size` bytes are written. A larger file is cut off. When
/// the local file cannot be opened or read, or turns out shorter than
/// announced, the remainder is filled with zero bytes so the peer's command
/// stream stays aligned, and the local error is returned afterwards.
/// Returns the number of file bytes written.
pub async fn send_file<W, F>(
    writer: &mut W,
    path: &Path,
    declared_size: u64,
    options: &TransferOptions,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(TransferProgress),
{
    let name = display_name(path);
    let mut reporter = ProgressReporter::new(
        name.clone(),
        Direction::Send,
        declared_size,
        options.progress_interval,
    );
    let mut buf = vec![0u8; options.effective_chunk_size()];

    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!(file = %name, error = %e, "cannot open source, padding payload");
            pad_remaining(writer, declared_size, &mut buf).await?;
            return Err(TransferError::Io(e));
        }
    };

    let mut sent: u64 = 0;

    while sent < declared_size {
        let to_read = usize::try_from(declared_size - sent)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = match file.read(&mut buf[..to_read]).await {
            Ok(0) => {
                warn!(file = %name, sent, declared_size, "local file shorter than announced");
                pad_remaining(writer, declared_size - sent, &mut buf).await?;
                return Err(TransferError::SizeMismatch {
                    expected: declared_size,
                    actual: sent,
                });
            }
            Ok(n) => n,
            Err(e) => {
                warn!(file = %name, error = %e, "read failed, padding payload");
                pad_remaining(writer, declared_size - sent, &mut buf).await?;
                return Err(TransferError::Io(e));
            }
        };

        writer
            .write_all(&buf[..n])
            .await
            .map_err(TransferError::Stream)?;
        sent += n as u64;
        reporter.update(sent, &mut on_progress);
    }

    writer.flush().await.map_err(TransferError::Stream)?;
    reporter.finish(sent, &mut on_progress);

    info!(file = %name, bytes = sent, "file sent");
    Ok(sent)
}

/// Writes `remaining` zero bytes so the receiver reads its full declared size.
async fn pad_remaining<W>(
    writer: &mut W,
    remaining: u64,
    buf: &mut [u8],
) -> Result<(), TransferError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    buf.fill(0);
    let mut left = remaining;
    while left > 0 {
        let n = usize::try_from(left).unwrap_or(usize::MAX).min(buf.len());
        writer
            .write_all(&buf[..n])
            .await
            .map_err(TransferError::Stream)?;
        left -= n as u64;
    }
    writer.flush().await.map_err(TransferError::Stream)
}

/// Reads `declared_size` payload bytes from `reader` into `dest`.
///
/// The payload is always consumed in full, even when the destination cannot
/// be created or written, so the next command on the stream stays readable.
/// On any failure a partially written destination is removed.
pub async fn receive_file<R, F>(
    reader: &mut R,
    dest: &Path,
    declared_size: u64,
    options: &TransferOptions,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    F: FnMut(TransferProgress),
{
    let name = display_name(dest);
    let mut reporter = ProgressReporter::new(
        name.clone(),
        Direction::Receive,
        declared_size,
        options.progress_interval,
    );

    let mut local_error: Option<io::Error> = None;
    let mut file = match tokio::fs::File::create(dest).await {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(file = %name, error = %e, "cannot create destination, draining payload");
            local_error = Some(e);
            None
        }
    };
    let created = file.is_some();

    let mut buf = vec![0u8; options.effective_chunk_size()];
    let mut received: u64 = 0;

    while received < declared_size {
        let to_read = usize::try_from(declared_size - received)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = match reader.read(&mut buf[..to_read]).await {
            Ok(0) => {
                drop(file);
                discard_partial(dest, created).await;
                return Err(TransferError::PrematureEof {
                    received,
                    expected: declared_size,
                });
            }
            Ok(n) => n,
            Err(e) => {
                drop(file);
                discard_partial(dest, created).await;
                return Err(TransferError::Stream(e));
            }
        };

        if let Some(f) = file.as_mut() {
            if let Err(e) = f.write_all(&buf[..n]).await {
                warn!(file = %name, error = %e, "write failed, draining payload");
                local_error = Some(e);
                file = None;
            }
        }

        received += n as u64;
        reporter.update(received, &mut on_progress);
    }

    if let Some(f) = file.as_mut() {
        if let Err(e) = f.flush().await {
            local_error = Some(e);
        }
    }
    drop(file);

    if let Some(e) = local_error {
        discard_partial(dest, created).await;
        return Err(TransferError::Io(e));
    }

    reporter.finish(received, &mut on_progress);
    info!(file = %name, bytes = received, path = %dest.display(), "file received");
    Ok(received)
}

async fn discard_partial(dest: &Path, created: bool) {
    if !created {
        return;
    }
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!(path = %dest.display(), "partial file removed"),
        Err(e) => warn!(path = %dest.display(), error = %e, "failed to remove partial file"),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
