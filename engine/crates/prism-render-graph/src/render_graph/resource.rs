use super::handle::RgPassId;
use super::resource_name::RgResourceName;

/// 纹理与缓冲区共有的 graph 内部信息
#[derive(Clone, Debug)]
pub struct RgResourceInfo {
    pub name: RgResourceName,
    pub imported: bool,
    /// 每次写入递增
    pub version: u32,
    /// 读取该资源的 Pass 数量（包括写入时附带的隐式读取）
    pub ref_count: u32,
    /// 最后一个写入该资源的 Pass
    pub writer: Option<RgPassId>,
    /// 第一个使用该资源的未剔除 Pass，物理资源在这里分配
    pub first_used_by: Option<RgPassId>,
    /// 最后一个使用该资源的未剔除 Pass，物理资源在这里释放
    pub last_used_by: Option<RgPassId>,
}

impl RgResourceInfo {
    pub(crate) fn new(name: RgResourceName, imported: bool) -> Self {
        Self {
            name,
            imported,
            version: 0,
            ref_count: 0,
            writer: None,
            first_used_by: None,
            last_used_by: None,
        }
    }

    /// 资源是否被任何未剔除的 Pass 使用
    #[inline]
    pub fn is_used(&self) -> bool {
        self.first_used_by.is_some()
    }
}
