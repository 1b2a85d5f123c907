use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, ReadBuf};

pin_project! {
    /// Reader that feeds every byte it yields into a running SHA-256.
    pub struct HashReader<R> {
        #[pin]
        inner: R,
        hasher: Sha256,
        bytes_read: u64,
    }
}

impl<R> HashReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Lower-case hex SHA-256 of everything read so far.
    pub fn sha256_hex(&self) -> String {
        hex::encode(self.hasher.clone().finalize())
    }
}

impl<R: AsyncRead> AsyncRead for HashReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.project();
        let filled_before = buf.filled().len();
        let poll = this.inner.poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let fresh = &buf.filled()[filled_before..];
            this.hasher.update(fresh);
            *this.bytes_read += fresh.len() as u64;
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::HashReader;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[tokio::test]
    async fn hashes_bytes_as_they_pass_through() {
        let mut source: &[u8] = b"hello";
        let mut reader = HashReader::new(&mut source);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"hello");
        assert_eq!(reader.bytes_read(), 5);
        assert_eq!(reader.sha256_hex(), HELLO_SHA256);
    }

    #[tokio::test]
    async fn digest_covers_only_consumed_bytes() {
        let mut source: &[u8] = b"hello world";
        let mut reader = HashReader::new(&mut source);
        let mut head = [0u8; 5];
        reader.read_exact(&mut head).await.unwrap();

        assert_eq!(reader.bytes_read(), 5);
        assert_eq!(reader.sha256_hex(), HELLO_SHA256);
    }
}
