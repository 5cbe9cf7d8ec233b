//! # 遮罩工具：命令行入口
//!
//! 本文件只负责参数解析、日志初始化与结果输出。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。
//!
//! ```text
//! mask-overlay encode  -i strokes.png [--classifier mask-image] [--width 1024 --height 768]
//! mask-overlay decode  --mask "MASK:4x2:3,5" -o mask.png [--alpha]
//! mask-overlay preview --image https://cdn.example/a.jpg --mask-file a.mask -o preview.png
//! mask-overlay check-upload -i upload.webp
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mask_overlay::error::AppError;
use mask_overlay::mask::{self, BitmapMask, MaskClassifier};
use mask_overlay::overlay::{
    ImageError, ImageSource, OverlayAdvancedConfig, OverlayConfig, OverlayHandler, PreviewProfile, encode_png,
};

/// 遮罩编解码与叠加预览工具。
#[derive(Parser, Debug)]
#[command(name = "mask-overlay", version, about = "Run-length mask codec and overlay preview")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 将笔触画布或黑白遮罩图片编码为遮罩字符串。
    Encode {
        /// 输入 PNG（画布笔触层或旧版遮罩图片）。
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// 像素分类规则：stroke（红色笔触）或 mask-image（白色为选中）。
        #[arg(short, long, default_value = "stroke", value_name = "KIND")]
        classifier: String,

        /// 原图宽度。与 --height 一起给出时，遮罩先缩放到原图分辨率。
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// 原图高度。
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// 输出文件；省略时写到标准输出。
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// 将遮罩字符串还原为 PNG。
    Decode {
        #[command(flatten)]
        mask: MaskInput,

        /// 输出 PNG。
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// 导出透明遮罩（未选中透明）而非黑白遮罩。
        #[arg(long)]
        alpha: bool,
    },

    /// 生成原图 + 遮罩的着色预览。
    Preview {
        /// 原图引用：http(s) URL、data URL 或本地路径。
        #[arg(long, value_name = "REF")]
        image: String,

        #[command(flatten)]
        mask: OptionalMaskInput,

        /// 输出 PNG。
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// 预览框宽度；省略时使用配置默认值。
        #[arg(long)]
        max_width: Option<u32>,

        /// 预览框高度；省略时使用配置默认值。
        #[arg(long)]
        max_height: Option<u32>,

        /// 预览档位：quality / balanced / speed。
        #[arg(long, value_name = "PROFILE")]
        profile: Option<String>,

        /// 高级配置 JSON 文件。
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// 校验待上传图片（JPEG / PNG / WebP，10MB 以内）。
    CheckUpload {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct MaskInput {
    /// 遮罩字符串。
    #[arg(long, value_name = "MASK")]
    mask: Option<String>,

    /// 包含遮罩字符串的文件。
    #[arg(long, value_name = "FILE")]
    mask_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
#[group(required = false, multiple = false)]
struct OptionalMaskInput {
    /// 遮罩字符串；省略时输出不着色的缩放原图。
    #[arg(long, value_name = "MASK")]
    mask: Option<String>,

    #[arg(long, value_name = "FILE")]
    mask_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Encode {
            input,
            classifier,
            width,
            height,
            output,
        } => {
            let classifier = MaskClassifier::parse(&classifier)
                .ok_or_else(|| AppError::Config(format!("未知分类规则：{}（可选：stroke / mask-image）", classifier)))?;
            let layer = read_rgba(&input).await?;
            let mut bitmap = BitmapMask::from_rgba_image(&layer, classifier)?;
            if let (Some(width), Some(height)) = (width, height) {
                bitmap = bitmap.resized(width, height)?;
            }

            let encoded = mask::encode(&bitmap);
            log::info!(
                "🧩 遮罩编码完成 - {}x{} 选中 {} 像素 分类: {}",
                bitmap.width(),
                bitmap.height(),
                bitmap.selected_count(),
                classifier.as_str()
            );

            match output {
                Some(path) => tokio::fs::write(&path, encoded).await?,
                None => println!("{encoded}"),
            }
        }

        Command::Decode {
            mask: input,
            output,
            alpha,
        } => {
            let encoded = read_mask(input.mask, input.mask_file).await?;
            let bitmap = mask::decode(&encoded)?;
            let raster = if alpha { bitmap.to_alpha_mask() } else { bitmap.to_mask_image() };

            tokio::fs::write(&output, encode_png(&raster)?).await?;
            log::info!("💾 遮罩已导出 - {}x{} → {}", bitmap.width(), bitmap.height(), output.display());
        }

        Command::Preview {
            image,
            mask: input,
            output,
            max_width,
            max_height,
            profile,
            config,
        } => {
            let handler = OverlayHandler::new(OverlayConfig::default());
            if let Some(path) = config {
                let json = tokio::fs::read_to_string(&path).await?;
                handler.set_advanced_config(&OverlayAdvancedConfig::from_json(&json)?)?;
            }
            if let Some(profile) = profile {
                handler.set_preview_profile(PreviewProfile::parse(&profile)?)?;
            }

            let encoded = match (input.mask, input.mask_file) {
                (None, None) => None,
                (inline, file) => Some(read_mask(inline, file).await?),
            };

            let defaults = handler.config_snapshot()?;
            let preview = handler
                .composite(
                    &ImageSource::from_reference(&image),
                    encoded.as_deref(),
                    max_width.unwrap_or(defaults.default_max_width),
                    max_height.unwrap_or(defaults.default_max_height),
                )
                .await?;

            tokio::fs::write(&output, preview.to_png()?).await?;
            log::info!(
                "🖼️ 预览已导出 - {}x{} → {}",
                preview.width(),
                preview.height(),
                output.display()
            );
        }

        Command::CheckUpload { input } => {
            let bytes = tokio::fs::read(&input).await?;
            let mime = OverlayHandler::validate_upload(&bytes, &OverlayConfig::default())?;
            println!("{mime}");
        }
    }

    Ok(())
}

async fn read_rgba(path: &Path) -> Result<image::RgbaImage, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败 {}：{}", path.display(), e)))?;
    Ok(decoded.to_rgba8())
}

async fn read_mask(inline: Option<String>, file: Option<PathBuf>) -> Result<String, AppError> {
    match (inline, file) {
        (Some(value), _) => Ok(value),
        (None, Some(path)) => Ok(tokio::fs::read_to_string(&path).await?),
        (None, None) => Err(AppError::Config("缺少遮罩：请提供 --mask 或 --mask-file".to_string())),
    }
}
