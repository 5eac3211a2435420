//! Chunk-by-chunk relay of an upstream event stream
//!
//! The returned stream is polled by the server only when the caller's
//! connection accepts more data, and the next upstream chunk is read only on
//! that poll. A slow caller therefore slows the upstream read instead of
//! piling chunks up in memory.

use std::convert::Infallible;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::{
    proxy::{ByteStream, RequestContext},
    routes::metrics::record_stream_chunk,
    streaming::Utf8ChunkDecoder,
};

/// Tracks how a relayed stream ended.
///
/// Lives inside the relay stream, so it is dropped together with the
/// upstream reader on every exit path. A drop before [`StreamGuard::finish`]
/// means the caller went away mid-stream.
struct StreamGuard {
    ctx: RequestContext,
    chunks: usize,
    completed: bool,
}

impl StreamGuard {
    fn new(ctx: RequestContext) -> Self {
        Self {
            ctx,
            chunks: 0,
            completed: false,
        }
    }

    fn finish(&mut self) {
        self.completed = true;
        self.ctx.log_stream_ended(self.chunks);
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.ctx.log_client_disconnect(self.chunks);
        }
    }
}

/// Relay `upstream` to the caller as decoded text chunks.
///
/// Each upstream chunk is written as soon as it decodes to at least one full
/// character. An upstream error ends the stream cleanly: it is logged, and
/// what was already sent stays sent.
pub fn relay_stream(
    mut upstream: ByteStream,
    ctx: RequestContext,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let mut guard = StreamGuard::new(ctx);

    async_stream::stream! {
        let mut decoder = Utf8ChunkDecoder::new();

        while let Some(next) = upstream.next().await {
            match next {
                Ok(chunk) => {
                    let text = decoder.decode(&chunk);
                    if text.is_empty() {
                        continue;
                    }
                    guard.chunks += 1;
                    record_stream_chunk();
                    yield Ok::<_, Infallible>(Bytes::from(text));
                }
                Err(err) => {
                    guard.ctx.log_error(&format!("Upstream stream failed: {}", err));
                    break;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            guard.chunks += 1;
            yield Ok(Bytes::from(tail));
        }

        guard.finish();
    }
}
