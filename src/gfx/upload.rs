//! 上传缓冲区（CPU -> GPU）
//!
//! 把多个同类型的常量块按固定步长排在一块 CPU 内存里，整体写入 GPU 缓冲区，
//! 绘制时通过动态偏移选择其中一个槽位。
//!
//! 常量缓冲区的偏移需要 256 字节对齐（D3D12 与 wgpu 默认的
//! `min_uniform_buffer_offset_alignment`），所以每个槽位按 256 字节对齐。

use std::marker::PhantomData;

use bytemuck::Pod;

/// 常量缓冲区偏移对齐要求
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// 向上对齐到 `alignment`（必须是 2 的幂）
#[inline]
pub const fn align_up(size: u64, alignment: u64) -> u64 {
    (size + alignment - 1) & !(alignment - 1)
}

/// 类型化的上传缓冲区
///
/// # 示例
///
/// ```
/// use pipes_render::gfx::{UploadBuffer, constants::MaterialConstants};
///
/// let mut buffer = UploadBuffer::<MaterialConstants>::new(4);
/// buffer.write(2, &MaterialConstants::default());
/// assert_eq!(buffer.offset_of(2), 512);
/// ```
pub struct UploadBuffer<T: Pod> {
    /// 槽位数量
    capacity: usize,
    /// 每个槽位的大小（对齐后）
    stride: u64,
    /// CPU 侧数据
    data: Vec<u8>,
    _phantom: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    /// 创建包含 `capacity` 个槽位的上传缓冲区（至少 1 个）
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let stride = align_up(std::mem::size_of::<T>() as u64, CONSTANT_BUFFER_ALIGNMENT);

        Self {
            capacity,
            stride,
            data: vec![0; stride as usize * capacity],
            _phantom: PhantomData,
        }
    }

    /// 槽位数量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 每个槽位的大小（对齐后）
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// 总大小
    pub fn total_size(&self) -> u64 {
        self.data.len() as u64
    }

    /// 单个元素的实际大小，即绑定时的范围
    pub fn element_size(&self) -> u64 {
        std::mem::size_of::<T>() as u64
    }

    /// 槽位在缓冲区中的字节偏移
    pub fn offset_of(&self, slot: usize) -> u64 {
        assert!(slot < self.capacity, "Upload buffer slot out of bounds");
        self.stride * slot as u64
    }

    /// 写入一个槽位
    pub fn write(&mut self, slot: usize, value: &T) {
        let offset = self.offset_of(slot) as usize;
        let bytes = bytemuck::bytes_of(value);
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// 读取一个槽位
    pub fn read(&self, slot: usize) -> T {
        let offset = self.offset_of(slot) as usize;
        bytemuck::pod_read_unaligned(&self.data[offset..offset + std::mem::size_of::<T>()])
    }

    /// 前 `count` 个槽位的字节数据
    pub fn bytes(&self, count: usize) -> &[u8] {
        let count = count.min(self.capacity);
        &self.data[..self.stride as usize * count]
    }

    /// 容纳 `required` 个槽位所需的新容量，按 2 倍增长；无需扩容时返回 `None`
    pub fn grown_capacity(&self, required: usize) -> Option<usize> {
        if required <= self.capacity {
            return None;
        }

        let mut capacity = self.capacity;
        while capacity < required {
            capacity *= 2;
        }
        Some(capacity)
    }

    /// `capacity` 个槽位的总字节数
    pub fn size_for(&self, capacity: usize) -> u64 {
        self.stride * capacity as u64
    }

    /// 确保至少有 `required` 个槽位
    ///
    /// 返回 `true` 表示发生了扩容，
    /// 调用方需要重新创建对应的 GPU 缓冲区和绑定。
    pub fn grow_to(&mut self, required: usize) -> bool {
        match self.grown_capacity(required) {
            Some(capacity) => {
                self.capacity = capacity;
                self.data.resize(self.size_for(capacity) as usize, 0);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::constants::{MaterialConstants, PerObjectConstants};

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(0, 256), 0);
    }

    #[test]
    fn test_stride_and_offsets() {
        let buffer = UploadBuffer::<PerObjectConstants>::new(3);
        assert_eq!(buffer.stride(), 256);
        assert_eq!(buffer.total_size(), 768);
        assert_eq!(buffer.element_size(), 128);
        assert_eq!(buffer.offset_of(0), 0);
        assert_eq!(buffer.offset_of(2), 512);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_offset_out_of_bounds() {
        let buffer = UploadBuffer::<MaterialConstants>::new(1);
        buffer.offset_of(1);
    }

    #[test]
    fn test_write_read() {
        let mut buffer = UploadBuffer::<MaterialConstants>::new(2);
        let material = MaterialConstants {
            shininess: 32.0,
            ..Default::default()
        };
        buffer.write(1, &material);
        assert_eq!(buffer.read(1), material);
        assert_eq!(buffer.read(0).shininess, 0.0);
    }

    #[test]
    fn test_grown_capacity_does_not_mutate() {
        let buffer = UploadBuffer::<PerObjectConstants>::new(4);
        assert_eq!(buffer.grown_capacity(4), None);
        assert_eq!(buffer.grown_capacity(9), Some(16));
        assert_eq!(buffer.size_for(16), 16 * 256);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.total_size(), 4 * 256);
    }

    #[test]
    fn test_grow_preserves_data() {
        let mut buffer = UploadBuffer::<MaterialConstants>::new(2);
        buffer.write(1, &MaterialConstants::default());

        assert!(!buffer.grow_to(2));
        assert!(buffer.grow_to(5));
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.read(1), MaterialConstants::default());
        assert_eq!(buffer.bytes(3).len(), 768);
    }
}
