//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `OverlayHandler` 只负责流程编排与配置管理。一次合成的链路固定为：
//! 1. 读取配置快照
//! 2. 并发：两级加载原图 / 解码遮罩字符串
//! 3. 检查读回要求
//! 4. 缩放 + 着色，输出新像素缓冲
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<OverlayConfig>>` 支持运行时切换档位。
//! - 单次请求内使用同一配置快照，避免处理中途配置漂移。
//! - 原图与遮罩互不依赖，用 `tokio::join!` 同时推进，二者都完成后才合成。
//! - 原图加载失败优先于遮罩格式错误上报。
//! - 记录 `load/render/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::compositor::composite_pixels;
use super::source::{ImageSource, LoadedImage, PixelBuffer};
use super::{CompositeError, ImageError, OverlayAdvancedConfig, OverlayConfig, PreviewProfile};
use crate::mask::{self, BitmapMask};

/// 遮罩预览处理器。
pub struct OverlayHandler {
    config: Arc<RwLock<OverlayConfig>>,
}

impl OverlayHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use mask_overlay::overlay::{OverlayConfig, OverlayHandler, PreviewProfile};
    ///
    /// let handler = OverlayHandler::new(OverlayConfig::default());
    /// handler.set_preview_profile(PreviewProfile::Speed)?;
    /// assert_eq!(handler.preview_profile()?, PreviewProfile::Speed);
    /// # Ok::<(), mask_overlay::overlay::ImageError>(())
    /// ```
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<OverlayConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    pub fn set_preview_profile(&self, profile: PreviewProfile) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_preview_profile(profile);

        log::info!(
            "⚙️ 已切换预览档位：{}（filter={:?}）",
            profile.as_str(),
            config.resize_filter
        );

        Ok(())
    }

    pub fn preview_profile(&self) -> Result<PreviewProfile, ImageError> {
        Ok(self.config_snapshot()?.infer_preview_profile())
    }

    /// 设置高级配置。校验失败时原配置保持不变。
    pub fn set_advanced_config(&self, advanced: &OverlayAdvancedConfig) -> Result<(), ImageError> {
        advanced.validate()?;

        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_advanced(advanced)?;

        log::info!(
            "⚙️ 已更新高级配置：private_network={} require_readback={} max_pixels={} box={}x{}",
            config.allow_private_network,
            config.require_readback,
            config.max_decoded_pixels,
            config.default_max_width,
            config.default_max_height
        );

        Ok(())
    }

    pub fn advanced_config(&self) -> Result<OverlayAdvancedConfig, ImageError> {
        Ok(self.config_snapshot()?.advanced())
    }

    /// 只加载并解码原图（两级回退）。
    pub async fn load_image(&self, source: &ImageSource) -> Result<LoadedImage, CompositeError> {
        let config = self.snapshot_for_request()?;
        Ok(self.acquire(source, &config).await?)
    }

    /// 按当前配置的像素上限解码遮罩字符串。
    pub fn decode_mask(&self, mask: &str) -> Result<BitmapMask, CompositeError> {
        let config = self.snapshot_for_request()?;
        Ok(mask::decode_with_limit(mask, config.max_decoded_pixels)?)
    }

    /// 合成主入口：原图 + 可选遮罩 → 预览框内的着色预览。
    ///
    /// 任何失败都不会返回部分结果。
    pub async fn composite(
        &self,
        source: &ImageSource,
        mask: Option<&str>,
        max_width: u32,
        max_height: u32,
    ) -> Result<PixelBuffer, CompositeError> {
        let config = self.snapshot_for_request()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let (loaded, decoded_mask) = tokio::join!(self.acquire(source, &config), async {
            mask.map(|value| mask::decode_with_limit(value, config.max_decoded_pixels))
                .transpose()
        });
        let loaded = loaded?;
        let decoded_mask = decoded_mask?;
        let load_elapsed = load_start.elapsed();

        if config.require_readback && !loaded.is_readable() {
            log::warn!("⚠️ 原图仅以绘制模式加载，当前配置要求像素读回 - 来源: {}", loaded.source_hint);
            return Err(CompositeError::ReadbackUnavailable);
        }

        let render_start = Instant::now();
        let output = composite_pixels(
            &loaded.pixels,
            decoded_mask.as_ref(),
            max_width,
            max_height,
            config.resize_filter,
        )?;
        let render_elapsed = render_start.elapsed();

        log::info!(
            "✅ 遮罩预览完成 - 来源: {} 模式: {} 输出: {}x{} 遮罩: {} load={}ms render={}ms total={}ms",
            loaded.source_hint,
            loaded.mode.as_str(),
            output.width(),
            output.height(),
            decoded_mask
                .as_ref()
                .map(|m| format!("{}x{}", m.width(), m.height()))
                .unwrap_or_else(|| "无".to_string()),
            load_elapsed.as_millis(),
            render_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(output)
    }

    /// 使用配置中的默认预览框合成。
    pub async fn composite_with_defaults(
        &self,
        source: &ImageSource,
        mask: Option<&str>,
    ) -> Result<PixelBuffer, CompositeError> {
        let config = self.snapshot_for_request()?;
        self.composite(source, mask, config.default_max_width, config.default_max_height)
            .await
    }

    fn snapshot_for_request(&self) -> Result<OverlayConfig, CompositeError> {
        self.config_snapshot()
            .map_err(|e| CompositeError::Config(e.to_string()))
    }
}
