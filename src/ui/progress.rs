use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncRead, ReadBuf};

pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    pub fn new(total: u64, description: &str) -> Result<Self> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?.progress_chars("●○ ");

        bar.set_style(style);
        bar.set_message(description.to_owned());

        Ok(Self { bar })
    }

    pub fn add(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}

/// Reader that advances a [`Bar`] by every byte it yields and finishes it at end of input.
pub struct ProgressReader<R> {
    inner: R,
    bar: Bar,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, bar: Bar) -> Self {
        Self { inner, bar }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let read = buf.filled().len() - before;
            if read == 0 && buf.remaining() > 0 {
                this.bar.finish();
            } else {
                this.bar.add(read as u64);
            }
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_reader_passes_bytes_through() {
        let data = vec![7u8; 10_000];
        let bar = Bar::new(data.len() as u64, "Reading...").unwrap();
        let mut reader = ProgressReader::new(&data[..], bar);

        let mut output = Vec::new();
        reader.read_to_end(&mut output).await.unwrap();
        assert_eq!(output, data);
        assert_eq!(reader.bar.bar.position(), 10_000);
        assert!(reader.bar.bar.is_finished());
    }

    #[tokio::test]
    async fn test_reader_unfinished_until_eof() {
        let data = vec![1u8; 64];
        let mut reader = ProgressReader::new(&data[..], Bar::new(64, "Reading...").unwrap());

        let mut head = [0u8; 16];
        reader.read_exact(&mut head).await.unwrap();
        assert_eq!(reader.bar.bar.position(), 16);
        assert!(!reader.bar.bar.is_finished());
    }
}
