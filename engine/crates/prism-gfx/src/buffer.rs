use crate::flags::{GfxBindFlags, GfxMiscFlags};
use crate::format::GfxFormat;

/// 缓冲区所在的内存类型
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GfxResourceUsage {
    #[default]
    Default,
    Upload,
    Readback,
}

/// 缓冲区描述
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GfxBufferDesc {
    pub size: u64,
    pub stride: u32,
    pub format: GfxFormat,
    pub bind_flags: GfxBindFlags,
    pub misc_flags: GfxMiscFlags,
    pub resource_usage: GfxResourceUsage,
}

impl GfxBufferDesc {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn structured(count: u64, stride: u32) -> Self {
        Self {
            size: count * stride as u64,
            stride,
            misc_flags: GfxMiscFlags::BUFFER_STRUCTURED,
            ..Default::default()
        }
    }

    pub fn indirect_args(count: u64, stride: u32) -> Self {
        Self {
            misc_flags: GfxMiscFlags::INDIRECT_ARGS,
            ..Self::structured(count, stride)
        }
    }

    pub fn with_bind_flags(mut self, bind_flags: GfxBindFlags) -> Self {
        self.bind_flags = bind_flags;
        self
    }

    pub fn with_usage(mut self, resource_usage: GfxResourceUsage) -> Self {
        self.resource_usage = resource_usage;
        self
    }

    /// 缓冲区只有全部字段一致时才可以复用
    #[inline]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self == other
    }

    #[inline]
    pub fn element_count(&self) -> u64 {
        if self.stride == 0 { self.size } else { self.size / self.stride as u64 }
    }
}

/// 缓冲区视图覆盖的范围，`size == u64::MAX` 表示到缓冲区末尾
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxBufferSubresourceDesc {
    pub offset: u64,
    pub size: u64,
}

impl Default for GfxBufferSubresourceDesc {
    fn default() -> Self {
        Self {
            offset: 0,
            size: u64::MAX,
        }
    }
}
