//! # shadow_ink 库
//!
//! 本库包含口令保护的 LSB 隐写工具的核心逻辑。
//! [`steganography::hide`] 与 [`steganography::extract`] 只处理展平的 RGB 像素缓冲区，
//! 图像文件的读写由 [`handler`] 负责。

// 声明库包含的所有模块。

pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod handler;
pub mod steganography;

pub use codec::{Bitstream, Framing, deserialize, serialize};
pub use error::{DecodeError, EncodeError};
pub use steganography::{embed, extract, hide};
