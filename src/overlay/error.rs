//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 三层错误，自下而上：
//! - `ImageError`：单级加载/解码失败（网络、格式、文件、超时、资源限制、跨域读回）
//! - `LoadError`：两级回退全部失败，同时保留两级的失败原因
//! - `CompositeError`：一次合成调用的唯一结果（加载 / 遮罩格式 / 渲染）
//!
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

use crate::mask::MaskFormatError;

/// 单级图片获取 / 解码错误。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("跨域读回被拒绝：{0}")]
    CrossOrigin(String),
}

impl ImageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK",
            Self::Decode(_) => "DECODE",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::FileSystem(_) => "FILE_SYSTEM",
            Self::Timeout(_) => "TIMEOUT",
            Self::ResourceLimit(_) => "RESOURCE_LIMIT",
            Self::CrossOrigin(_) => "CROSS_ORIGIN",
        }
    }
}

/// 两级回退均失败。
#[derive(Debug, thiserror::Error)]
#[error("图片加载失败（读回模式：{readback}；仅绘制模式：{draw_only}）")]
pub struct LoadError {
    /// 第一级（允许像素读回）的失败原因。
    pub readback: ImageError,
    /// 第二级（仅绘制）的失败原因。
    #[source]
    pub draw_only: ImageError,
}

/// 合成调用的统一错误。
///
/// 任一分支出现时都不会返回部分着色的缓冲。
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("遮罩无效：{0}")]
    Mask(#[from] MaskFormatError),

    #[error("当前环境要求像素读回，但原图仅以绘制模式加载")]
    ReadbackUnavailable,

    #[error("合成失败：{0}")]
    Render(String),

    #[error("配置错误：{0}")]
    Config(String),
}

impl CompositeError {
    /// 失败所在阶段，供日志与诊断展示。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Load(_) | Self::ReadbackUnavailable => "load",
            Self::Mask(_) => "mask",
            Self::Render(_) => "render",
            Self::Config(_) => "config",
        }
    }
}

impl From<ImageError> for CompositeError {
    /// 解码后的缩放 / 编码失败归入渲染阶段。
    fn from(error: ImageError) -> Self {
        Self::Render(error.to_string())
    }
}
