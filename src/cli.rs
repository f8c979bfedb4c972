//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::codec::Framing;
use clap::builder::PossibleValue;
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用口令保护隐藏在 RGB 图像中的文本。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，把文本连同口令一起隐藏在图像的像素数据中，只有提供相同口令才能恢复。口令不是加密密钥，不提供机密性。"
)]
pub struct Cli {
    /// 提高日志详细程度 (-v 为 info，-vv 为 debug，-vvv 为 trace)。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏)、recover (恢复) 和 capacity (容量)。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 把消息和口令隐藏到图像中，输出无损格式的图像。
    Hide(HideArgs),

    /// 用口令从经过隐写的图像中恢复隐藏的消息。
    Recover(RecoverArgs),

    /// 显示图像最多能隐藏多少字节的载荷。
    Capacity(CapacityArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["message", "text"])))]
pub struct HideArgs {
    /// 作为载体的输入图像文件路径 (PNG, BMP, JPEG 等)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 直接在命令行上给出的消息。
    #[arg(short, long)]
    pub message: Option<String>,

    /// 包含消息内容的文本文件路径。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 恢复消息时需要提供的口令，不能包含 ':'。
    #[arg(short, long)]
    pub passkey: String,

    /// 结果图像的输出路径，默认为输入图像旁的 `doctored_<文件名>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    /// 载荷的定界方式。
    #[arg(long, value_enum, default_value_t = Framing::Sentinel)]
    pub framing: Framing,
}

/// 'recover' 命令所需的参数。
#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// 已隐藏消息的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 隐藏消息时使用的口令。
    #[arg(short, long)]
    pub passkey: String,

    /// 把恢复的消息另存到此文本文件。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 允许覆盖已存在的文本文件。
    #[arg(short, long)]
    pub force: bool,

    /// 载荷的定界方式，必须与隐藏时一致。
    #[arg(long, value_enum, default_value_t = Framing::Sentinel)]
    pub framing: Framing,
}

/// 'capacity' 命令所需的参数。
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// 要检查的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    #[arg(long, value_enum, default_value_t = Framing::Sentinel)]
    pub framing: Framing,
}

/// `--framing` 的取值：`sentinel` 与 `length-prefixed`。
impl ValueEnum for Framing {
    fn value_variants<'a>() -> &'a [Self] {
        &[Framing::Sentinel, Framing::LengthPrefixed]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            Framing::Sentinel => {
                PossibleValue::new("sentinel").help("在载荷之后追加 0xFF 0xFE 结束标记 (默认)")
            }
            Framing::LengthPrefixed => {
                PossibleValue::new("length-prefixed").help("在载荷之前写入 32 位长度字段")
            }
        })
    }
}
