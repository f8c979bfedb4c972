/// 载荷中分隔口令与消息的字节 (`:`)。
/// 提取时在第一个分隔符处切分，因此口令本身不能包含它。
pub const SEPARATOR: u8 = b':';

/// 哨兵帧的结束标记：字节 255 后接 254，即比特 `1111111111111110`。
pub const END_MARKER: [u8; 2] = [0xFF, 0xFE];

/// 结束标记占用的比特数。
pub const END_MARKER_BITS: usize = END_MARKER.len() * 8;

/// 长度前缀帧中载荷长度字段的比特数 (大端 `u32`)。
pub const LENGTH_PREFIX_BITS: usize = 32;

/// 每个载荷字节展开后的比特数。
pub const BITS_PER_BYTE: usize = 8;

/// 未指定输出路径时，隐写图像文件名的前缀。
pub const DOCTORED_PREFIX: &str = "doctored_";
