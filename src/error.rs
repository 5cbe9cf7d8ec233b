//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，汇总遮罩、加载、合成各层错误，
//! 替代各调用点分散的 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为各子模块错误提供 `From` 转换，调用侧直接 `?`。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 返回给外部调用方。

use serde::Serialize;

use crate::mask::MaskFormatError;
use crate::overlay::{CompositeError, ImageError, LoadError};

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 遮罩字符串格式错误
    #[error("遮罩格式错误: {0}")]
    Mask(#[from] MaskFormatError),

    /// 单级图片处理错误（解码 / 编码 / 上传校验）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 原图两级加载均失败
    #[error("{0}")]
    Load(#[from] LoadError),

    /// 合成预览失败
    #[error("{0}")]
    Composite(#[from] CompositeError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置无效
    #[error("配置错误: {0}")]
    Config(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
