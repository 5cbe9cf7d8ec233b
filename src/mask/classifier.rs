//! # 像素分类规则
//!
//! 把单个 RGBA 采样映射为“选中 / 未选中”。
//!
//! - `PaintStroke`：画笔笔触（不透明纯红）。
//! - `MaskImage`：旧版栅格遮罩（白色为选中）。
//!
//! 原始栅格遮罩只能经由这里进入编解码核心，不在核心内部按未分类字节处理。

/// 画笔笔触颜色：完全不透明的纯红。
pub const STROKE_COLOR: [u8; 4] = [255, 0, 0, 255];

/// 笔触判定：强红、低绿蓝、非透明。
#[inline]
pub const fn is_paint_stroke(r: u8, g: u8, b: u8, a: u8) -> bool {
    r > 200 && g < 100 && b < 100 && a > 0
}

/// 栅格遮罩判定：接近白色且非透明。
#[inline]
pub const fn is_mask_white(r: u8, g: u8, b: u8, a: u8) -> bool {
    r > 200 && g > 200 && b > 200 && a > 0
}

/// 分类器选择。
///
/// 调用方必须显式声明输入栅格的语义，避免按内容猜测格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskClassifier {
    /// 画布上的红色笔触。
    #[default]
    PaintStroke,
    /// 白色为选中区域的黑白（或带透明度）遮罩图片。
    MaskImage,
}

impl MaskClassifier {
    #[inline]
    pub fn classify(self, [r, g, b, a]: [u8; 4]) -> bool {
        match self {
            Self::PaintStroke => is_paint_stroke(r, g, b, a),
            Self::MaskImage => is_mask_white(r, g, b, a),
        }
    }

    /// 从外部字符串解析分类器（`stroke` / `mask-image`）。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stroke" | "paint-stroke" => Some(Self::PaintStroke),
            "mask-image" | "mask" => Some(Self::MaskImage),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PaintStroke => "stroke",
            Self::MaskImage => "mask-image",
        }
    }
}
