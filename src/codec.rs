//! # 载荷编解码模块
//!
//! 负责 `(口令, 消息)` 与比特流之间的相互转换。
//!
//! 载荷的字节布局为 `口令 || ':' || 消息`，每个字符占一个字节 (Latin-1)，
//! 每个字节按大端顺序 (最高位在前) 展开成 8 个比特。
//! 载荷的结束位置有两种标记方式，见 [`Framing`]。

use crate::constants::{
    BITS_PER_BYTE, END_MARKER, END_MARKER_BITS, LENGTH_PREFIX_BITS, SEPARATOR,
};
use crate::error::{DecodeError, EncodeError};
use log::{debug, trace};

/// 有序的比特序列，每个元素对应一个二进制位。
pub type Bitstream = Vec<bool>;

/// 载荷在比特流中的定界方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framing {
    /// 在载荷之后追加 16 比特结束标记 `0xFF 0xFE`。
    /// 与已有的隐写图像逐比特兼容；载荷中不能相邻出现 `ÿþ`。
    #[default]
    Sentinel,

    /// 在载荷之前写入 32 比特大端长度字段，不使用结束标记。
    LengthPrefixed,
}

impl Framing {
    /// 定界信息本身占用的比特数。
    pub fn overhead_bits(self) -> usize {
        match self {
            Framing::Sentinel => END_MARKER_BITS,
            Framing::LengthPrefixed => LENGTH_PREFIX_BITS,
        }
    }
}

/// 以默认的哨兵帧将口令和消息序列化为比特流。
///
/// 见 [`serialize_with`]。
pub fn serialize(passkey: &str, message: &str) -> Result<Bitstream, EncodeError> {
    serialize_with(passkey, message, Framing::Sentinel)
}

/// 将口令和消息序列化为比特流。
///
/// # Errors
///
/// * [`EncodeError::UnsupportedCharacter`] - 某个字符的码位大于 255，
///   `index` 是它在 `口令:消息` 中的字符位置。
/// * [`EncodeError::PasskeyContainsSeparator`] - 口令中含有 `:`。
/// * [`EncodeError::PayloadContainsMarker`] - 哨兵帧下载荷中相邻出现 `0xFF 0xFE`。
/// * [`EncodeError::MessageTooLarge`] - 长度前缀帧下载荷超过 `u32` 能表示的长度。
pub fn serialize_with(
    passkey: &str,
    message: &str,
    framing: Framing,
) -> Result<Bitstream, EncodeError> {
    let key = to_latin1(passkey, 0)?;
    if key.contains(&SEPARATOR) {
        return Err(EncodeError::PasskeyContainsSeparator);
    }
    let body = to_latin1(message, key.len() + 1)?;

    let mut payload = Vec::with_capacity(key.len() + 1 + body.len());
    payload.extend_from_slice(&key);
    payload.push(SEPARATOR);
    payload.extend_from_slice(&body);

    let required = payload.len() * BITS_PER_BYTE + framing.overhead_bits();
    let mut bits = Vec::with_capacity(required);

    match framing {
        Framing::Sentinel => {
            if let Some(offset) = payload.windows(END_MARKER.len()).position(|w| w == END_MARKER) {
                return Err(EncodeError::PayloadContainsMarker { offset });
            }
            push_bytes(&mut bits, &payload);
            push_bytes(&mut bits, &END_MARKER);
        }
        Framing::LengthPrefixed => {
            let len = u32::try_from(payload.len()).map_err(|_| EncodeError::MessageTooLarge {
                required,
                available: (u32::MAX as usize)
                    .saturating_mul(BITS_PER_BYTE)
                    .saturating_add(LENGTH_PREFIX_BITS),
            })?;
            push_bytes(&mut bits, &len.to_be_bytes());
            push_bytes(&mut bits, &payload);
        }
    }

    debug!(
        "serialized {} payload bytes into {} bits ({:?})",
        payload.len(),
        bits.len(),
        framing
    );
    Ok(bits)
}

/// 以默认的哨兵帧从比特流中解析出 `(口令, 消息)`。
///
/// 见 [`deserialize_with`]。
pub fn deserialize<I>(bits: I) -> Result<(String, String), DecodeError>
where
    I: IntoIterator<Item = bool>,
{
    deserialize_with(bits, Framing::Sentinel)
}

/// 从比特流中解析出 `(口令候选, 消息)`。
///
/// 比特按 8 个一组重组为字节；不足 8 个的尾部比特被忽略。
/// 迭代器只被消费到载荷结束为止，因此可以直接传入惰性的 LSB 流。
/// 口令是否正确由调用方判断。
///
/// # Errors
///
/// * [`DecodeError::NoPayloadFound`] - 比特耗尽前没有找到结束标记，
///   或长度字段缺失、为零、超过剩余数据。
/// * [`DecodeError::MalformedPayload`] - 载荷中没有分隔符 `:`。
pub fn deserialize_with<I>(bits: I, framing: Framing) -> Result<(String, String), DecodeError>
where
    I: IntoIterator<Item = bool>,
{
    let bytes = ByteReader {
        bits: bits.into_iter(),
    };

    let payload = match framing {
        Framing::Sentinel => read_until_marker(bytes)?,
        Framing::LengthPrefixed => read_length_prefixed(bytes)?,
    };
    trace!("recovered {} payload bytes", payload.len());

    split_payload(&payload)
}

/// 把比特迭代器按大端顺序重组为字节。
struct ByteReader<I> {
    bits: I,
}

impl<I: Iterator<Item = bool>> Iterator for ByteReader<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        for _ in 0..BITS_PER_BYTE {
            byte = (byte << 1) | u8::from(self.bits.next()?);
        }
        Some(byte)
    }
}

fn read_until_marker(bytes: impl Iterator<Item = u8>) -> Result<Vec<u8>, DecodeError> {
    let mut payload = Vec::new();
    for byte in bytes {
        payload.push(byte);
        if payload.ends_with(&END_MARKER) {
            payload.truncate(payload.len() - END_MARKER.len());
            return Ok(payload);
        }
    }
    Err(DecodeError::NoPayloadFound)
}

fn read_length_prefixed(mut bytes: impl Iterator<Item = u8>) -> Result<Vec<u8>, DecodeError> {
    let mut header = [0u8; LENGTH_PREFIX_BITS / BITS_PER_BYTE];
    for slot in header.iter_mut() {
        *slot = bytes.next().ok_or(DecodeError::NoPayloadFound)?;
    }

    // 合法载荷至少包含分隔符
    let len = u32::from_be_bytes(header) as usize;
    if len == 0 {
        return Err(DecodeError::NoPayloadFound);
    }

    let payload: Vec<u8> = bytes.take(len).collect();
    if payload.len() < len {
        return Err(DecodeError::NoPayloadFound);
    }
    Ok(payload)
}

fn split_payload(payload: &[u8]) -> Result<(String, String), DecodeError> {
    let at = payload
        .iter()
        .position(|&byte| byte == SEPARATOR)
        .ok_or(DecodeError::MalformedPayload)?;
    let (key, rest) = payload.split_at(at);
    Ok((from_latin1(key), from_latin1(&rest[1..])))
}

fn push_bytes(bits: &mut Bitstream, bytes: &[u8]) {
    for &byte in bytes {
        bits.extend((0..BITS_PER_BYTE).rev().map(|shift| (byte >> shift) & 1 == 1));
    }
}

fn to_latin1(text: &str, offset: usize) -> Result<Vec<u8>, EncodeError> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            u8::try_from(ch).map_err(|_| EncodeError::UnsupportedCharacter {
                ch,
                index: offset + i,
            })
        })
        .collect()
}

fn from_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}
