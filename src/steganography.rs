//! # LSB 隐写核心
//!
//! 在展平的 RGB 像素缓冲区 (R,G,B,R,G,B,...) 中，按线性顺序把比特流写入
//! 每个通道字节的最低有效位，以及反向读取。
//!
//! 所有函数都只借用调用方的缓冲区，从不修改它。

use crate::codec::{Bitstream, Framing, deserialize_with, serialize_with};
use crate::constants::BITS_PER_BYTE;
use crate::error::{DecodeError, EncodeError};
use log::{debug, warn};

/// 将比特流写入像素缓冲区的最低有效位，返回新的缓冲区。
///
/// 第 `i` 个输出字节为 `(buffer[i] & 0xFE) | bits[i]`；
/// 比特流之后的字节原样复制。
///
/// # Errors
///
/// 比特流长于缓冲区时返回 [`EncodeError::MessageTooLarge`]，不做任何写入。
pub fn embed(buffer: &[u8], bits: &[bool]) -> Result<Vec<u8>, EncodeError> {
    if bits.len() > buffer.len() {
        return Err(EncodeError::MessageTooLarge {
            required: bits.len(),
            available: buffer.len(),
        });
    }

    let mut output = buffer.to_vec();
    for (byte, &bit) in output.iter_mut().zip(bits) {
        *byte = (*byte & 0xFE) | u8::from(bit);
    }

    debug!("embedded {} bits into {} bytes", bits.len(), buffer.len());
    Ok(output)
}

/// 按给定帧格式序列化口令和消息并写入缓冲区。
pub fn hide(
    buffer: &[u8],
    passkey: &str,
    message: &str,
    framing: Framing,
) -> Result<Vec<u8>, EncodeError> {
    let bits: Bitstream = serialize_with(passkey, message, framing)?;
    embed(buffer, &bits)
}

/// 以默认的哨兵帧从缓冲区中提取消息。
///
/// 见 [`extract_with`]。
pub fn extract(buffer: &[u8], passkey: &str) -> Result<String, DecodeError> {
    extract_with(buffer, passkey, Framing::Sentinel)
}

/// 从缓冲区中提取消息，并校验口令。
///
/// # Errors
///
/// * [`DecodeError::NoPayloadFound`] / [`DecodeError::MalformedPayload`] - 来自
///   [`deserialize_with`]。
/// * [`DecodeError::PasskeyMismatch`] - 口令不一致，消息不会以任何形式返回。
pub fn extract_with(buffer: &[u8], passkey: &str, framing: Framing) -> Result<String, DecodeError> {
    let lsbs = buffer.iter().map(|&byte| byte & 1 == 1);
    let (candidate, message) = deserialize_with(lsbs, framing)?;

    if !passkey_matches(&candidate, passkey) {
        warn!("refused extraction: passkey mismatch");
        return Err(DecodeError::PasskeyMismatch);
    }
    Ok(message)
}

/// 长度为 `buffer_len` 的缓冲区在给定帧格式下能容纳的最大载荷字节数
/// (口令、分隔符和消息之和)。
pub fn capacity(buffer_len: usize, framing: Framing) -> usize {
    buffer_len.saturating_sub(framing.overhead_bits()) / BITS_PER_BYTE
}

/// 比较全部字节，不在第一个差异处提前返回。
fn passkey_matches(candidate: &str, passkey: &str) -> bool {
    let (a, b) = (candidate.as_bytes(), passkey.as_bytes());
    let diff = a
        .iter()
        .zip(b)
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    a.len() == b.len() && diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serialize;
    use rand::{Rng, RngCore};

    /// 带有伪随机内容的 RGB 缓冲区。
    fn noisy_buffer(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 37 + 11) as u8).collect()
    }

    #[test]
    fn scenario_zero_buffer_round_trip() {
        let buffer = vec![0u8; 100];
        let bits = serialize("key", "hi").unwrap();
        assert_eq!(bits.len(), 64);

        let encoded = embed(&buffer, &bits).unwrap();
        assert_eq!(encoded.len(), buffer.len());
        assert_eq!(extract(&encoded, "key"), Ok("hi".to_string()));
        assert_eq!(extract(&encoded, "wrong"), Err(DecodeError::PasskeyMismatch));
    }

    #[test]
    fn zero_buffer_has_no_payload() {
        let buffer = vec![0u8; 300];
        assert_eq!(extract(&buffer, "key"), Err(DecodeError::NoPayloadFound));
        assert_eq!(
            extract_with(&buffer, "key", Framing::LengthPrefixed),
            Err(DecodeError::NoPayloadFound)
        );
    }

    #[test]
    fn too_small_buffer_is_rejected_untouched() {
        let buffer = vec![7u8; 4];
        let snapshot = buffer.clone();
        let bits = serialize("k", "m").unwrap();

        assert_eq!(
            embed(&buffer, &bits),
            Err(EncodeError::MessageTooLarge {
                required: 40,
                available: 4
            })
        );
        assert_eq!(buffer, snapshot);
    }

    #[test]
    fn exact_fit_is_accepted() {
        let bits = serialize("k", "m").unwrap();
        let buffer = noisy_buffer(bits.len());
        let encoded = embed(&buffer, &bits).unwrap();
        assert_eq!(extract(&encoded, "k"), Ok("m".to_string()));

        let short = noisy_buffer(bits.len() - 1);
        assert!(embed(&short, &bits).is_err());
    }

    #[test]
    fn only_lsbs_of_prefix_change() {
        let buffer = noisy_buffer(999);
        let bits = serialize("passkey", "the quick brown fox").unwrap();
        let encoded = embed(&buffer, &bits).unwrap();

        for (i, (&before, &after)) in buffer.iter().zip(&encoded).enumerate() {
            assert_eq!(before & 0xFE, after & 0xFE, "high bits changed at {i}");
            if i < bits.len() {
                assert_eq!(after & 1 == 1, bits[i]);
            } else {
                assert_eq!(before, after, "byte past the bitstream changed at {i}");
            }
        }
    }

    #[test]
    fn wrong_passkeys_never_reveal_message() {
        let buffer = noisy_buffer(3 * 200);
        let encoded = hide(&buffer, "open sesame", "treasure", Framing::Sentinel).unwrap();

        for guess in ["", "open", "open sesame!", "Open sesame", "open sesamf"] {
            assert_eq!(
                extract(&encoded, guess),
                Err(DecodeError::PasskeyMismatch),
                "guess {guess:?}"
            );
        }
    }

    #[test]
    fn extraction_is_repeatable() {
        let buffer = noisy_buffer(600);
        let encoded = hide(&buffer, "k", "again", Framing::Sentinel).unwrap();
        let first = extract(&encoded, "k");
        let second = extract(&encoded, "k");
        assert_eq!(first, second);
        assert_eq!(first, Ok("again".to_string()));
    }

    #[test]
    fn round_trip_over_both_framings() {
        let buffer = noisy_buffer(3 * 64 * 64);
        for framing in [Framing::Sentinel, Framing::LengthPrefixed] {
            for (key, message) in [("", ""), ("k", "x"), ("long key", "ça: va? ÿ")] {
                let encoded = hide(&buffer, key, message, framing).unwrap();
                assert_eq!(
                    extract_with(&encoded, key, framing),
                    Ok(message.to_string()),
                    "{framing:?} {key:?} {message:?}"
                );
            }
        }
    }

    /// 随机长度的 Latin-1 文本，只保留满足 `keep` 的字符。
    fn random_latin1(rng: &mut impl Rng, max_len: usize, keep: impl Fn(char) -> bool) -> String {
        let len = rng.random_range(0..=max_len);
        std::iter::repeat_with(|| char::from(rng.random::<u8>()))
            .filter(|&ch| keep(ch))
            .take(len)
            .collect()
    }

    #[test]
    fn random_payloads_round_trip_over_random_covers() {
        let mut rng = rand::rng();

        for _ in 0..200 {
            let passkey = random_latin1(&mut rng, 16, |ch| ch != ':');
            let message = random_latin1(&mut rng, 96, |_| true);

            for framing in [Framing::Sentinel, Framing::LengthPrefixed] {
                let bits = match serialize_with(&passkey, &message, framing) {
                    Ok(bits) => bits,
                    Err(EncodeError::PayloadContainsMarker { .. }) => {
                        assert_eq!(framing, Framing::Sentinel);
                        let payload = format!("{passkey}:{message}");
                        assert!(payload.contains("\u{ff}\u{fe}"));
                        continue;
                    }
                    Err(err) => panic!("{passkey:?} / {message:?}: {err}"),
                };

                // 长度取 3 的倍数，相当于完整的 RGB 像素
                let spare = rng.random_range(0..64);
                let mut cover = vec![0u8; (bits.len() + spare).next_multiple_of(3)];
                rng.fill_bytes(&mut cover);

                let encoded = embed(&cover, &bits).unwrap();
                assert_eq!(encoded.len(), cover.len());
                assert!(
                    cover
                        .iter()
                        .zip(&encoded)
                        .all(|(before, after)| before & 0xFE == after & 0xFE)
                );

                assert_eq!(
                    extract_with(&encoded, &passkey, framing),
                    Ok(message.clone()),
                    "{framing:?} {passkey:?} {message:?}"
                );

                let other = random_latin1(&mut rng, 16, |ch| ch != ':');
                let wrong = if other == passkey { format!("{other}x") } else { other };
                assert_eq!(
                    extract_with(&encoded, &wrong, framing),
                    Err(DecodeError::PasskeyMismatch)
                );
            }
        }
    }

    #[test]
    fn capacity_bounds_what_fits() {
        let len = 3 * 10 * 10;
        for framing in [Framing::Sentinel, Framing::LengthPrefixed] {
            let max = capacity(len, framing);
            let buffer = noisy_buffer(len);

            // 口令 "k" 与分隔符占两个字节
            let fits = "m".repeat(max - 2);
            assert!(hide(&buffer, "k", &fits, framing).is_ok());

            let too_big = "m".repeat(max - 1);
            assert!(matches!(
                hide(&buffer, "k", &too_big, framing),
                Err(EncodeError::MessageTooLarge { .. })
            ));
        }
        assert_eq!(capacity(10, Framing::Sentinel), 0);
    }

    #[test]
    fn hide_propagates_codec_errors() {
        let buffer = noisy_buffer(300);
        assert_eq!(
            hide(&buffer, "a:b", "m", Framing::Sentinel),
            Err(EncodeError::PasskeyContainsSeparator)
        );
    }

    #[test]
    fn marker_bytes_are_refused_by_sentinel_and_kept_by_length_prefix() {
        let cover = vec![0u8; 3000];
        assert_eq!(
            hide(&cover, "k", "pay \u{ff}\u{fe} me", Framing::Sentinel),
            Err(EncodeError::PayloadContainsMarker { offset: 6 })
        );
        assert!(matches!(
            hide(&cover, "a\u{ff}\u{fe}b", "secret", Framing::Sentinel),
            Err(EncodeError::PayloadContainsMarker { offset: 1 })
        ));

        let encoded = hide(&cover, "k", "pay \u{ff}\u{fe} me", Framing::LengthPrefixed).unwrap();
        assert_eq!(
            extract_with(&encoded, "k", Framing::LengthPrefixed),
            Ok("pay \u{ff}\u{fe} me".to_string())
        );
    }

    #[test]
    fn passkey_comparison() {
        assert!(passkey_matches("abc", "abc"));
        assert!(passkey_matches("", ""));
        assert!(!passkey_matches("abc", "abd"));
        assert!(!passkey_matches("abc", "ab"));
        assert!(!passkey_matches("ab", "abc"));
    }
}
