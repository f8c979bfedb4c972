//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责图像的解码与编码、文件 I/O、调用核心隐写算法以及向用户报告结果。
//! 隐写核心只接触展平的 RGB 像素缓冲区，图像容器格式全部在这里处理。

use crate::cli::{CapacityArgs, HideArgs, RecoverArgs};
use crate::constants::DOCTORED_PREFIX;
use crate::error::EncodeError;
use crate::steganography::{capacity, extract_with, hide};
use anyhow::{Context, Result};
use colored::Colorize;
use image::{ImageFormat, RgbImage};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// 处理 'Hide' 命令的执行逻辑。
///
/// 读取载体图像和消息，将口令与消息写入像素的最低有效位，
/// 最后以无损格式保存结果图像。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径、口令和帧格式的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出路径是有损格式，或已存在且未指定 `--force`。
/// * 无法读取输入的图像或文本文件。
/// * 消息含有不支持的字符，或图像没有足够的空间。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args.dest.unwrap_or_else(|| default_dest(&args.image));
    ensure_lossless(&dest)?;
    ensure_writable(&dest, args.force)?;

    let message = match (args.message, &args.text) {
        (Some(message), _) => message,
        (None, Some(text)) => fs::read_to_string(text).with_context(|| {
            format!(
                "Unable to read text file: {}",
                text.to_string_lossy().red().bold()
            )
        })?,
        (None, None) => anyhow::bail!("Either --message or --text must be given."),
    };

    let cover = load_rgb(&args.image)?;
    let (width, height) = cover.dimensions();
    let pixels = cover.into_raw();

    let available = capacity(pixels.len(), args.framing);
    debug!(
        "cover {}x{} holds at most {} payload bytes ({:?})",
        width, height, available, args.framing
    );

    let encoded = hide(&pixels, &args.passkey, &message, args.framing).map_err(|err| {
        let context = match err {
            EncodeError::MessageTooLarge { .. } => format!(
                "Not enough space in {} to hide the message. \nThe image can hold at most {} bytes of passkey and message.",
                args.image.to_string_lossy().red().bold(),
                available.to_string().green().bold()
            ),
            _ => format!(
                "Unable to hide the message in {}.",
                args.image.to_string_lossy().red().bold()
            ),
        };
        anyhow::Error::new(err).context(context)
    })?;

    let doctored = RgbImage::from_raw(width, height, encoded)
        .context("The encoded pixel buffer does not match the image dimensions.")?;

    doctored.save(&dest).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    info!("hid {} characters in {}", message.chars().count(), dest.display());
    println!(
        "The message has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 读取经过隐写的图像，用口令提取消息并打印；指定了 `--text` 时同时写入文件。
/// 成功时返回恢复的消息。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 图像中没有载荷、载荷损坏或口令不匹配。
/// * 目标文本文件已存在且未指定 `--force`，或无法写入。
pub fn handle_recover(args: RecoverArgs) -> Result<String> {
    if let Some(text) = &args.text {
        ensure_writable(text, args.force)?;
    }

    let pixels = load_rgb(&args.image)?.into_raw();

    let message = extract_with(&pixels, &args.passkey, args.framing).with_context(|| {
        format!(
            "Failed to recover a message from '{}'.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    if let Some(text) = &args.text {
        fs::write(text, &message).with_context(|| {
            format!(
                "Unable to write to target text file: {}",
                text.to_string_lossy().red().bold()
            )
        })?;
        println!(
            "The message has been successfully recovered and saved: {}",
            text.to_string_lossy().green().bold()
        );
    } else {
        println!("{}", "The message has been successfully recovered:".green());
        println!("{message}");
    }

    info!("recovered {} characters from {}", message.chars().count(), args.image.display());
    Ok(message)
}

/// 处理 'Capacity' 命令，返回图像能容纳的最大载荷字节数。
pub fn handle_capacity(args: CapacityArgs) -> Result<usize> {
    let pixels = load_rgb(&args.image)?.into_raw();
    let max = capacity(pixels.len(), args.framing);

    println!(
        "{} channel bytes, room for {} bytes of passkey and message ({:?} framing).",
        pixels.len().to_string().green().bold(),
        max.to_string().green().bold(),
        args.framing
    );
    Ok(max)
}

/// 解码任意支持的图像格式，并转换为 8 位 RGB。
fn load_rgb(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    Ok(image.to_rgb8())
}

/// `photo.jpg` -> 同目录下的 `doctored_photo.png`
fn default_dest(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    image.with_file_name(format!("{DOCTORED_PREFIX}{stem}.png"))
}

fn ensure_lossless(dest: &Path) -> Result<()> {
    let format = ImageFormat::from_path(dest).with_context(|| {
        format!(
            "Unable to determine the output format of: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    anyhow::ensure!(
        format != ImageFormat::Jpeg,
        "Lossy output format would destroy the hidden bits: {}. \nUse a lossless format such as PNG or BMP.",
        dest.to_string_lossy().red().bold()
    );
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}
