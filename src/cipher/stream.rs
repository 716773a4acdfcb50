//! Duplex stream over a single engine transform.
//!
//! Bytes written to a [`CipherStream`] go through the transform and come out
//! of its read side in the same order. Shutting down the write side finalises
//! the transform; only then is [`CipherStream::cipher_info`] available.
//!
//! Writes stall once more than the high-water mark of output is waiting to be
//! read, so a slow consumer throttles the producer. Authenticated decryption
//! releases nothing until the tag has verified; a bad tag surfaces as a
//! terminal error on both halves.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

use super::options::CipherInfo;
use crate::config::STREAM_HIGH_WATER_MARK;
use crate::engine::Transform;
use crate::error::{Error, Result};
use crate::types::Direction;

enum State {
    Open,
    Finished,
    Failed(Error),
    Aborted,
}

pub struct CipherStream {
    transform: Option<Box<dyn Transform>>,
    direction: Direction,
    state: State,
    output: Vec<u8>,
    read_pos: usize,
    high_water_mark: usize,
    read_waker: Option<Waker>,
    write_waker: Option<Waker>,
    info: CipherInfo,
}

impl CipherStream {
    pub(crate) fn new(transform: Box<dyn Transform>, direction: Direction, info: CipherInfo) -> Self {
        tracing::debug!(cipher = %info.cipher, %direction, "stream opened");

        Self {
            transform: Some(transform),
            direction,
            state: State::Open,
            output: Vec::new(),
            read_pos: 0,
            high_water_mark: STREAM_HIGH_WATER_MARK,
            read_waker: None,
            write_waker: None,
            info,
        }
    }

    /// Sets how much unread output may pile up before writes stall.
    #[must_use]
    pub fn with_high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes.max(1);
        self
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// What the stream used, including the tag for authenticated encryption.
    ///
    /// # Errors
    ///
    /// [`Error::StreamNotFinished`] before the write side has been shut down,
    /// the terminal error if finalisation failed, and [`Error::StreamClosed`]
    /// after [`abort`](Self::abort).
    pub fn cipher_info(&self) -> Result<CipherInfo> {
        match &self.state {
            State::Finished => Ok(self.info.clone()),
            State::Open => Err(Error::StreamNotFinished),
            State::Failed(err) => Err(err.clone()),
            State::Aborted => Err(Error::StreamClosed),
        }
    }

    /// Drops the transform and any unread output. No cipher info will follow.
    pub fn abort(&mut self) {
        if matches!(self.state, State::Open) {
            tracing::debug!(cipher = %self.info.cipher, "stream aborted");
        }
        self.transform = None;
        self.state = State::Aborted;
        self.output.clear();
        self.read_pos = 0;
        self.wake_reader();
        self.wake_writer();
    }

    /// Copies `input` through the stream into `output` and returns the cipher info.
    pub async fn pipe<R, W>(self, mut input: R, mut output: W) -> Result<CipherInfo>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (mut reader, mut writer) = tokio::io::split(self);

        let feed = async {
            tokio::io::copy(&mut input, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<_, io::Error>(())
        };
        let drain = async {
            tokio::io::copy(&mut reader, &mut output).await?;
            output.flush().await?;
            Ok::<_, io::Error>(())
        };
        let (fed, drained) = tokio::join!(feed, drain);

        let stream = reader.unsplit(writer);
        fed?;
        drained?;
        stream.cipher_info()
    }

    /// Runs `input` through the stream and returns the output with the cipher info.
    pub async fn collect(self, input: &[u8]) -> Result<(Vec<u8>, CipherInfo)> {
        let mut output = Vec::with_capacity(input.len() + 16);
        let info = self.pipe(input, &mut output).await?;
        Ok((output, info))
    }

    #[inline]
    fn pending(&self) -> usize {
        self.output.len() - self.read_pos
    }

    fn wake_reader(&mut self) {
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
    }

    fn wake_writer(&mut self) {
        if let Some(waker) = self.write_waker.take() {
            waker.wake();
        }
    }

    fn push_output(&mut self, bytes: Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        if self.read_pos > 0 {
            self.output.drain(..self.read_pos);
            self.read_pos = 0;
        }
        self.output.extend(bytes);
        self.wake_reader();
    }

    fn fail(&mut self, err: Error) -> io::Error {
        tracing::debug!(cipher = %self.info.cipher, error = %err, "stream failed");

        self.transform = None;
        self.output.clear();
        self.read_pos = 0;
        self.state = State::Failed(err.clone());
        self.wake_reader();
        self.wake_writer();
        err.into()
    }

    fn closed_error(&self) -> Option<io::Error> {
        match &self.state {
            State::Open => None,
            State::Failed(err) => Some(err.clone().into()),
            State::Finished | State::Aborted => Some(Error::StreamClosed.into()),
        }
    }

    fn finish(&mut self) -> Result<()> {
        let mut transform = self.transform.take().ok_or(Error::StreamClosed)?;
        let tail = transform.finalize()?;

        if self.direction == Direction::Encrypt {
            self.info.auth_tag = transform.auth_tag();
        }
        self.push_output(tail);
        self.state = State::Finished;
        self.wake_reader();

        tracing::debug!(cipher = %self.info.cipher, "stream finished");
        Ok(())
    }
}

impl AsyncWrite for CipherStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        if let Some(err) = this.closed_error() {
            return Poll::Ready(Err(err));
        }
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        if this.pending() >= this.high_water_mark {
            this.write_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let Some(transform) = this.transform.as_mut() else {
            return Poll::Ready(Err(Error::StreamClosed.into()));
        };
        match transform.update(buf) {
            Ok(bytes) => {
                tracing::trace!(input = buf.len(), output = bytes.len(), "stream chunk");
                this.push_output(bytes);
                Poll::Ready(Ok(buf.len()))
            }
            Err(err) => Poll::Ready(Err(this.fail(err))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        match &this.state {
            State::Open => {}
            State::Finished => return Poll::Ready(Ok(())),
            State::Failed(err) => return Poll::Ready(Err(err.clone().into())),
            State::Aborted => return Poll::Ready(Err(Error::StreamClosed.into())),
        }

        match this.finish() {
            Ok(()) => Poll::Ready(Ok(())),
            Err(err) => Poll::Ready(Err(this.fail(err))),
        }
    }
}

impl AsyncRead for CipherStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.pending() > 0 {
            let len = this.pending().min(buf.remaining());
            buf.put_slice(&this.output[this.read_pos..this.read_pos + len]);
            this.read_pos += len;
            if this.read_pos == this.output.len() {
                this.output.clear();
                this.read_pos = 0;
            }
            this.wake_writer();
            return Poll::Ready(Ok(()));
        }

        match &this.state {
            State::Open => {
                this.read_waker = Some(cx.waker().clone());
                Poll::Pending
            }
            State::Finished => Poll::Ready(Ok(())),
            State::Failed(err) => Poll::Ready(Err(err.clone().into())),
            State::Aborted => Poll::Ready(Err(Error::StreamClosed.into())),
        }
    }
}

impl fmt::Debug for CipherStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Open => "open",
            State::Finished => "finished",
            State::Failed(_) => "failed",
            State::Aborted => "aborted",
        };
        f.debug_struct("CipherStream")
            .field("cipher", &self.info.cipher)
            .field("direction", &self.direction)
            .field("state", &state)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
