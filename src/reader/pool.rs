use crate::error::Result;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Bodies up to this length are decoded from a stack array.
pub(crate) const SMALL_BODY_LEN: usize = 64;

const MAX_POOLED_BUFFERS: usize = 16;
const MAX_POOLED_CAPACITY: usize = 1 << 20;

lazy_static! {
    static ref BUFFER_POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());
}

/// A scratch buffer borrowed from the process-wide pool. It goes back to the pool when dropped.
pub(crate) struct PooledBuffer {
    buffer: Vec<u8>,
}

impl PooledBuffer {
    pub(crate) fn take(length: usize) -> Self {
        let mut buffer = BUFFER_POOL
            .lock()
            .ok()
            .and_then(|mut pool| pool.pop())
            .unwrap_or_default();
        buffer.clear();
        buffer.resize(length, 0);
        PooledBuffer { buffer }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        if buffer.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        if let Ok(mut pool) = BUFFER_POOL.lock() {
            if pool.len() < MAX_POOLED_BUFFERS {
                pool.push(buffer);
            }
        }
    }
}

/// Fills a scratch buffer of `length` bytes and decodes it. Short bodies never touch the pool.
pub(crate) fn with_scratch<T, F, D>(length: usize, fill: F, decode: D) -> Result<T>
where
    F: FnOnce(&mut [u8]) -> Result<()>,
    D: FnOnce(&[u8]) -> Result<T>,
{
    if length <= SMALL_BODY_LEN {
        let mut scratch = [0u8; SMALL_BODY_LEN];
        let body = &mut scratch[..length];
        fill(body)?;
        decode(body)
    } else {
        let mut buffer = PooledBuffer::take(length);
        fill(&mut buffer)?;
        decode(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn large_bodies_go_through_a_pooled_buffer() {
        let decoded = with_scratch(
            200,
            |buffer| {
                buffer.iter_mut().for_each(|byte| *byte = b'x');
                Ok(())
            },
            |body| Ok(body.iter().filter(|byte| **byte == b'x').count()),
        )
        .unwrap();
        assert_eq!(decoded, 200);
    }

    #[test]
    fn reused_buffers_come_back_zeroed_to_length() {
        {
            let mut buffer = PooledBuffer::take(300);
            buffer[0] = 0xFF;
        }
        let buffer = PooledBuffer::take(100);
        assert_eq!(buffer.len(), 100);
        assert!(buffer.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn fill_errors_propagate() {
        let result: Result<()> = with_scratch(500, |_| Err(Error::UnexpectedEof), |_| Ok(()));
        assert!(matches!(result, Err(Error::UnexpectedEof)));
    }
}
