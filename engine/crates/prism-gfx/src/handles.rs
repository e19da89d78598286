use slotmap::new_key_type;

new_key_type! {
    /// 设备端纹理句柄
    pub struct GfxTextureHandle;
    /// 设备端缓冲区句柄
    pub struct GfxBufferHandle;
    /// 设备端描述符（SRV/UAV/RTV/DSV）句柄
    pub struct GfxDescriptor;
}

/// 资源视图的类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GfxViewType {
    ShaderResource,
    UnorderedAccess,
    RenderTarget,
    DepthStencil,
}
