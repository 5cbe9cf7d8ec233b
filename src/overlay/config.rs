//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `OverlayConfig`：加载限制、网络超时、预览框默认尺寸、缩放滤镜。
//! 预览档位（quality / balanced / speed）作为高层语义，映射到底层滤镜组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `PreviewProfile` 负责档位字符串解析与反向输出。
//! - `OverlayAdvancedConfig` 是可序列化的参数子集：可从 JSON 读取，应用前统一校验。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::ImageError;

/// 遮罩预览配置。
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// 原图字节体积上限（与上传校验一致，10MB）。
    pub max_file_size: u64,
    /// 网络下载超时时间（秒）。
    pub download_timeout: u64,
    /// 建立连接超时时间（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时时间（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时时间（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问内网或本地地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 读回模式请求携带的 `Origin`。
    pub readback_origin: String,
    /// 为 true 时，仅绘制模式加载的原图视为失败。
    pub require_readback: bool,
    /// 解码后的像素上限（原图与遮罩共用）。
    pub max_decoded_pixels: u64,
    /// 解码预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 预览框默认宽度。
    pub default_max_width: u32,
    /// 预览框默认高度。
    pub default_max_height: u32,
    /// 原图缩放滤镜（遮罩始终最近邻）。
    pub resize_filter: FilterType,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            allow_private_network: false,
            readback_origin: "null".to_string(),
            require_readback: false,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            default_max_width: 800,
            default_max_height: 600,
            resize_filter: FilterType::Triangle,
        }
    }
}

/// 预览档位。
///
/// - `Quality`：Lanczos3，最清晰
/// - `Balanced`：双线性
/// - `Speed`：最近邻
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewProfile {
    Quality,
    Balanced,
    Speed,
}

impl PreviewProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use mask_overlay::overlay::PreviewProfile;
    ///
    /// let p = PreviewProfile::parse("Balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), mask_overlay::overlay::ImageError>(())
    /// ```
    pub fn parse(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidFormat(format!(
                "未知预览档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl OverlayConfig {
    /// 基于当前滤镜反推档位。
    pub fn infer_preview_profile(&self) -> PreviewProfile {
        match self.resize_filter {
            FilterType::Nearest => PreviewProfile::Speed,
            FilterType::CatmullRom | FilterType::Lanczos3 => PreviewProfile::Quality,
            FilterType::Triangle | FilterType::Gaussian => PreviewProfile::Balanced,
        }
    }

    pub fn apply_preview_profile(&mut self, profile: PreviewProfile) {
        self.resize_filter = match profile {
            PreviewProfile::Quality => FilterType::Lanczos3,
            PreviewProfile::Balanced => FilterType::Triangle,
            PreviewProfile::Speed => FilterType::Nearest,
        };
    }

    /// 应用已校验的高级配置。
    pub fn apply_advanced(&mut self, advanced: &OverlayAdvancedConfig) -> Result<(), ImageError> {
        advanced.validate()?;

        self.max_file_size = advanced.max_file_size;
        self.allow_private_network = advanced.allow_private_network;
        self.require_readback = advanced.require_readback;
        self.max_decoded_pixels = advanced.max_decoded_pixels;
        self.max_decoded_bytes = advanced.max_decoded_bytes;
        self.connect_timeout = advanced.connect_timeout;
        self.stream_first_byte_timeout_ms = advanced.stream_first_byte_timeout_ms;
        self.stream_chunk_timeout_ms = advanced.stream_chunk_timeout_ms;
        self.default_max_width = advanced.default_max_width;
        self.default_max_height = advanced.default_max_height;
        if let Some(profile) = advanced.profile.as_deref() {
            self.apply_preview_profile(PreviewProfile::parse(profile)?);
        }

        Ok(())
    }

    pub fn advanced(&self) -> OverlayAdvancedConfig {
        OverlayAdvancedConfig {
            max_file_size: self.max_file_size,
            allow_private_network: self.allow_private_network,
            require_readback: self.require_readback,
            max_decoded_pixels: self.max_decoded_pixels,
            max_decoded_bytes: self.max_decoded_bytes,
            connect_timeout: self.connect_timeout,
            stream_first_byte_timeout_ms: self.stream_first_byte_timeout_ms,
            stream_chunk_timeout_ms: self.stream_chunk_timeout_ms,
            default_max_width: self.default_max_width,
            default_max_height: self.default_max_height,
            profile: Some(self.infer_preview_profile().as_str().to_string()),
        }
    }
}

/// 可序列化的高级配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayAdvancedConfig {
    pub max_file_size: u64,
    pub allow_private_network: bool,
    pub require_readback: bool,
    pub max_decoded_pixels: u64,
    pub max_decoded_bytes: u64,
    pub connect_timeout: u64,
    pub stream_first_byte_timeout_ms: u64,
    pub stream_chunk_timeout_ms: u64,
    pub default_max_width: u32,
    pub default_max_height: u32,
    pub profile: Option<String>,
}

impl Default for OverlayAdvancedConfig {
    fn default() -> Self {
        OverlayConfig::default().advanced()
    }
}

impl OverlayAdvancedConfig {
    pub fn from_json(json: &str) -> Result<Self, ImageError> {
        serde_json::from_str(json)
            .map_err(|e| ImageError::InvalidFormat(format!("配置 JSON 解析失败：{}", e)))
    }

    pub fn validate(&self) -> Result<(), ImageError> {
        if !(1024..=512 * 1024 * 1024).contains(&self.max_file_size) {
            return Err(ImageError::InvalidFormat("max_file_size 必须在 1KB~512MB 之间".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ImageError::InvalidFormat("max_decoded_pixels 不能为 0".to_string()));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(ImageError::InvalidFormat("max_decoded_bytes 不能小于 8MB".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ImageError::InvalidFormat("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(ImageError::InvalidFormat(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(ImageError::InvalidFormat(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if self.default_max_width == 0 || self.default_max_height == 0 {
            return Err(ImageError::InvalidFormat("预览框默认尺寸必须为正".to_string()));
        }
        if let Some(profile) = self.profile.as_deref() {
            PreviewProfile::parse(profile)?;
        }

        Ok(())
    }
}
