/// Fixed-capacity byte store backing every region on the bus.
///
/// The capacity is set once in [`Memory::new`] and never changes. Every access is
/// bounds-checked: an out-of-range offset means the caller's decode arithmetic is
/// wrong, so it panics instead of wrapping or clamping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    data: Box<[u8]>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self::with_default(size, 0)
    }

    pub fn with_default(size: usize, default: u8) -> Self {
        Self {
            data: vec![default; size].into_boxed_slice(),
        }
    }

    pub fn get_size(&self) -> usize {
        self.data.len()
    }

    pub fn read(&self, offset: usize) -> u8 {
        self.check(offset, 1);
        self.data[offset]
    }

    pub fn read_n(&self, offset: usize, n: usize) -> &[u8] {
        self.check(offset, n);
        &self.data[offset..offset + n]
    }

    pub fn write(&mut self, offset: usize, value: u8) {
        self.check(offset, 1);
        self.data[offset] = value;
    }

    /// Bulk write used when installing ROM images.
    pub fn write_n(&mut self, offset: usize, bytes: &[u8]) {
        self.check(offset, bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    #[inline(always)]
    fn check(&self, offset: usize, n: usize) {
        assert!(
            offset
                .checked_add(n)
                .is_some_and(|end| end <= self.data.len()),
            "memory access out of range: offset ${:04X} (+{}) in store of {} bytes",
            offset,
            n,
            self.data.len()
        );
    }
}
