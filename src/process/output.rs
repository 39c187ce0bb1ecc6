//! Line streams over a child's captured output.

use std::io;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::Stream;

/// Lines of a build's combined stdout and stderr.
///
/// Read errors are yielded in place and do not end the stream.
pub type OutputLines = Pin<Box<dyn Stream<Item = io::Result<String>> + Send>>;

/// Split one reader into lines.
pub fn line_stream<R>(reader: R) -> OutputLines
where
    R: AsyncRead + Send + 'static,
{
    Box::pin(LinesStream::new(BufReader::new(reader).lines()))
}

/// Interleave lines from two readers in arrival order.
#[cfg(not(unix))]
pub fn merged_lines<O, E>(stdout: O, stderr: E) -> OutputLines
where
    O: AsyncRead + Send + Unpin + 'static,
    E: AsyncRead + Send + Unpin + 'static,
{
    use tokio_stream::StreamExt;

    let out = LinesStream::new(BufReader::new(stdout).lines());
    let err = LinesStream::new(BufReader::new(stderr).lines());
    Box::pin(out.merge(err))
}
