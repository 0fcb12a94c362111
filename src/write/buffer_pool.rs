/// A free-list of reusable byte buffers for page bodies.
///
/// [`PageBufferPool::get`] returns a buffer with arbitrary contents;
/// callers clear it before appending. Buffers survive across row groups
/// but are never shared between two concurrent writes.
#[derive(Debug, Default)]
pub struct PageBufferPool {
    buffers: Vec<Vec<u8>>,
}

impl PageBufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self) -> Vec<u8> {
        self.buffers.pop().unwrap_or_default()
    }

    pub fn put(&mut self, buffer: Vec<u8>) {
        self.buffers.push(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_recycled() {
        let mut pool = PageBufferPool::new();
        let mut buffer = pool.get();
        buffer.extend_from_slice(&[1, 2, 3]);
        let capacity = buffer.capacity();
        pool.put(buffer);

        let recycled = pool.get();
        assert_eq!(recycled.capacity(), capacity);
        assert!(pool.get().is_empty());
    }
}
