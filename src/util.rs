/// A byte buffer with a cursor separating the part the engine has already
/// consumed (or filled) from the part it has not reached yet.
#[derive(Debug, Default)]
pub struct PartialBuffer<B: AsRef<[u8]>> {
    buffer: B,
    index: usize,
}

impl<B: AsRef<[u8]>> PartialBuffer<B> {
    /// Wrap `buffer` with the cursor at its start.
    pub fn new(buffer: B) -> Self {
        Self { buffer, index: 0 }
    }

    /// Bytes before the cursor.
    pub fn written(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.index]
    }

    /// Bytes from the cursor to the end of the buffer.
    pub fn unwritten(&self) -> &[u8] {
        &self.buffer.as_ref()[self.index..]
    }

    /// Move the cursor forward by `amount` bytes.
    pub fn advance(&mut self, amount: usize) {
        self.index += amount;
        debug_assert!(self.index <= self.buffer.as_ref().len());
    }

    /// Whether the cursor has reached the end of the buffer.
    pub fn is_full(&self) -> bool {
        self.unwritten().is_empty()
    }

    /// Convert back into the underlying buffer.
    pub fn into_inner(self) -> B {
        self.buffer
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> PartialBuffer<B> {
    /// Mutable view of the bytes from the cursor to the end of the buffer.
    pub fn unwritten_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[self.index..]
    }
}
