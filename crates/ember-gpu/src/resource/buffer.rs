use std::ops::Range;

use crate::device::Gpu;
use crate::error::{GpuError, Result};
use crate::registry::{BufferHandle, BufferRecord, DeviceHandle, QueueHandle, get, get_mut};

/// Window of a mapped buffer handed to the caller.
///
/// Element writes are checked against this window, not just the buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MappedRange {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub size: u64,
}

impl MappedRange {
    /// Absolute byte span of element `index` of width `elem`.
    pub fn element_span(&self, index: u64, elem: u64) -> Result<(u64, u64)> {
        let start = index
            .checked_mul(elem)
            .and_then(|rel| rel.checked_add(self.offset));
        let end = start.and_then(|s| s.checked_add(elem));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.offset + self.size => Ok((start, end)),
            _ => Err(GpuError::MappedRangeOutOfBounds {
                offset: index.saturating_mul(elem),
                end: index.saturating_mul(elem).saturating_add(elem),
                len: self.size,
            }),
        }
    }
}

/// Checked byte range for binding `(offset, size)` of a buffer of `len`
/// bytes, where size 0 means "rest of buffer".
///
/// wgpu panics on empty or out-of-bounds slices, so both are rejected here.
/// An offset equal to `len` with size 0 names an empty rest and is an error.
pub(crate) fn buffer_range(offset: u64, size: u64, len: u64) -> Result<Range<u64>> {
    let end = if size == 0 { Some(len) } else { offset.checked_add(size) };
    match end {
        Some(end) if offset < end && end <= len => Ok(offset..end),
        _ => Err(GpuError::BufferRangeOutOfBounds { offset, size, len }),
    }
}

/// Smallest window around `start..end` that wgpu accepts for a mapped view.
///
/// Views must start on [`wgpu::MAP_ALIGNMENT`] and span a multiple of
/// [`wgpu::COPY_BUFFER_ALIGNMENT`], so narrow writes go through a wider view.
pub(crate) fn mapped_window(start: u64, end: u64, buffer_size: u64) -> (u64, u64) {
    let lo = start - start % wgpu::MAP_ALIGNMENT;
    let hi = end.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT;
    (lo, hi.min(buffer_size))
}

fn mapped(gpu: &Gpu, buffer: BufferHandle) -> Result<&BufferRecord> {
    let record = get(&gpu.reg.buffers, buffer, "buffer")?;
    if !record.mapped {
        return Err(GpuError::BufferNotMapped);
    }
    Ok(record)
}

impl Gpu {
    /// Creates a buffer of `size` bytes.
    ///
    /// When `mapped_at_creation` is set the size is rounded up to
    /// [`wgpu::COPY_BUFFER_ALIGNMENT`], as wgpu requires.
    pub fn create_buffer(
        &mut self,
        device: DeviceHandle,
        size: u64,
        usage: wgpu::BufferUsages,
        mapped_at_creation: bool,
    ) -> Result<BufferHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let size = if mapped_at_creation {
            size.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT
        } else {
            size
        };

        let buffer = dev.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage,
            mapped_at_creation,
        });
        let handle = self.reg.buffers.insert(BufferRecord {
            buffer,
            mapped: mapped_at_creation,
        });
        log::trace!("created buffer {handle:?} ({size} bytes, {usage:?})");
        Ok(handle)
    }

    /// Returns the writable window `offset..offset + size` of a mapped buffer.
    ///
    /// `size` 0 extends the window to the end of the buffer.
    pub fn get_mapped_range(
        &self,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<MappedRange> {
        let len = mapped(self, buffer)?.buffer.size();
        let size = if size == 0 { len.saturating_sub(offset) } else { size };
        match offset.checked_add(size) {
            Some(end) if end <= len => Ok(MappedRange {
                buffer,
                offset,
                size,
            }),
            _ => Err(GpuError::MappedRangeOutOfBounds {
                offset,
                end: offset.saturating_add(size),
                len,
            }),
        }
    }

    /// Copies `bytes` into a mapped buffer at absolute byte `offset`.
    pub fn write_mapped(&self, buffer: BufferHandle, offset: u64, bytes: &[u8]) -> Result<()> {
        let record = mapped(self, buffer)?;
        let len = record.buffer.size();
        let end = match offset.checked_add(bytes.len() as u64) {
            Some(end) if end <= len => end,
            _ => {
                return Err(GpuError::MappedRangeOutOfBounds {
                    offset,
                    end: offset.saturating_add(bytes.len() as u64),
                    len,
                });
            }
        };
        if bytes.is_empty() {
            return Ok(());
        }

        let (lo, hi) = mapped_window(offset, end, len);
        let mut view = record.buffer.slice(lo..hi).get_mapped_range_mut();
        let at = (offset - lo) as usize;
        view[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Writes one `f32` at element `index` of `range`.
    pub fn mapped_write_f32(&self, range: MappedRange, index: u64, value: f32) -> Result<()> {
        let (start, _) = range.element_span(index, 4)?;
        self.write_mapped(range.buffer, start, &value.to_le_bytes())
    }

    /// Writes one 16-bit index at element `index` of `range`.
    pub fn mapped_write_u16(&self, range: MappedRange, index: u64, value: u16) -> Result<()> {
        let (start, _) = range.element_span(index, 2)?;
        self.write_mapped(range.buffer, start, &value.to_le_bytes())
    }

    /// Writes one 32-bit index at element `index` of `range`.
    pub fn mapped_write_u32(&self, range: MappedRange, index: u64, value: u32) -> Result<()> {
        let (start, _) = range.element_span(index, 4)?;
        self.write_mapped(range.buffer, start, &value.to_le_bytes())
    }

    /// Ends the mapped state; further writes go through the queue.
    pub fn unmap(&mut self, buffer: BufferHandle) -> Result<()> {
        let record = get_mut(&mut self.reg.buffers, buffer, "buffer")?;
        if !record.mapped {
            log::debug!("unmap of {buffer:?} ignored: not mapped");
            return Ok(());
        }
        record.buffer.unmap();
        record.mapped = false;
        Ok(())
    }

    /// Writes `floats` at offset 0 of a mapped buffer, then unmaps it.
    pub fn buffer_write_floats(&mut self, buffer: BufferHandle, floats: &[f32]) -> Result<()> {
        self.write_mapped(buffer, 0, bytemuck::cast_slice(floats))?;
        self.unmap(buffer)
    }

    /// Schedules a write of `data` into `buffer` at `offset`.
    ///
    /// Valid at any time after creation. wgpu requires `offset` and the data
    /// length to be multiples of 4; violations surface as diagnostics.
    pub fn queue_write_buffer(
        &self,
        queue: QueueHandle,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<()> {
        let queue = get(&self.reg.queues, queue, "queue")?;
        let record = get(&self.reg.buffers, buffer, "buffer")?;
        queue.write_buffer(&record.buffer, offset, data);
        Ok(())
    }
}
