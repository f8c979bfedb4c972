//! # 错误类型
//!
//! 隐写核心只返回这里定义的类型化错误；命令行层再用 `anyhow` 包装上下文。

use thiserror::Error;

/// 隐藏消息时可能出现的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// 比特流比像素缓冲区长，缓冲区未被改动。
    #[error("message is too large for this image: {required} bits required, {available} available")]
    MessageTooLarge { required: usize, available: usize },

    /// 口令或消息中含有无法用单字节 (Latin-1) 表示的字符。
    #[error("character {ch:?} at position {index} cannot be encoded as a single byte")]
    UnsupportedCharacter { ch: char, index: usize },

    /// 口令中含有分隔符 `:`，提取时无法还原。
    #[error("passkey must not contain the ':' separator")]
    PasskeyContainsSeparator,

    /// 哨兵帧下载荷中出现了结束标记字节 `ÿþ`，提取时会被提前截断。
    #[error(
        "passkey or message contains the end marker bytes 0xFF 0xFE at payload byte {offset}; \
         use --framing length-prefixed to hide it"
    )]
    PayloadContainsMarker { offset: usize },
}

/// 提取消息时可能出现的错误。
///
/// 三种错误都不携带载荷中的任何内容。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("no hidden payload found in the image")]
    NoPayloadFound,

    #[error("hidden payload is malformed: separator missing")]
    MalformedPayload,

    #[error("passkey does not match")]
    PasskeyMismatch,
}
