//! Dynamic GPU buffer management with automatic resizing
//!
//! Provides buffers that grow automatically when data exceeds capacity,
//! using a 2x growth strategy to minimize reallocations.

/// A GPU buffer backing one schema slot, growing as the slot's array grows.
///
/// Uses a 2x growth strategy when capacity is exceeded.
/// Never shrinks (GPU buffers cannot be resized in place).
pub struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: usize, // Capacity in bytes
    len: usize,      // Current data length in bytes
    usage: wgpu::BufferUsages,
    label: String,
    reallocations: u32,
}

impl DynamicBuffer {
    /// Smallest allocation in bytes.
    pub const MIN_CAPACITY: usize = 64;

    /// Buffer with the given initial byte capacity.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        initial_capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let capacity = initial_capacity
            .max(Self::MIN_CAPACITY)
            .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize);
        Self {
            buffer: Self::allocate(device, label, capacity, usage),
            capacity,
            len: 0,
            usage,
            label: label.to_owned(),
            reallocations: 0,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Write a typed slice, growing if necessary.
    ///
    /// Returns `true` if buffer was reallocated (bind groups need recreation)
    pub fn write<T: bytemuck::Pod>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[T],
    ) -> bool {
        self.write_bytes(device, queue, bytemuck::cast_slice(data))
    }

    /// Write raw bytes to buffer, growing if necessary.
    ///
    /// Returns `true` if buffer was reallocated (bind groups need recreation).
    pub fn write_bytes(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
    ) -> bool {
        let needed = data.len();
        let reallocated = if needed > self.capacity {
            let new_capacity = grown_capacity(self.capacity, needed);
            self.buffer =
                Self::allocate(device, &self.label, new_capacity, self.usage);
            self.capacity = new_capacity;
            self.reallocations += 1;
            log::debug!(
                "{}: grew to {} bytes ({} reallocations)",
                self.label,
                new_capacity,
                self.reallocations
            );
            true
        } else {
            false
        };

        // Copies must be 4-byte multiples; pad the tail of odd-sized data.
        if needed > 0 {
            if needed % wgpu::COPY_BUFFER_ALIGNMENT as usize == 0 {
                queue.write_buffer(&self.buffer, 0, data);
            } else {
                let mut padded = data.to_vec();
                padded.resize(
                    needed.next_multiple_of(
                        wgpu::COPY_BUFFER_ALIGNMENT as usize,
                    ),
                    0,
                );
                queue.write_buffer(&self.buffer, 0, &padded);
            }
        }
        self.len = needed;

        reallocated
    }

    /// Underlying buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Bytes currently written.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Capacity after growth: 2x the need, and at least 1 KiB more than before.
/// Always a multiple of the copy alignment.
pub(crate) fn grown_capacity(current: usize, needed: usize) -> usize {
    (needed * 2)
        .max(current + 1024)
        .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize)
}
