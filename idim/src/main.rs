//! idim: inspect image headers without decoding.
//!
//! Expands file and glob arguments, probes each file's leading bytes with
//! `imgdim`, and prints format, dimensions, and the estimated decoded size.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;

use imgdim::{Detection, GifVersion, ImageFormat, ImageHeader};

/// Probe image files for format, dimensions, and estimated decoded size.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input files, directories, or glob patterns.
    #[arg(required = true)]
    files: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    json: bool,

    /// Estimate decoded size without the mipmap overhead budget.
    #[arg(long)]
    no_mipmaps: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let files = expand_inputs(&args.files)?;
    if files.is_empty() {
        anyhow::bail!("no input files found");
    }

    let multi = files.len() > 1;
    let mut failures = 0usize;

    for (i, path) in files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }

        match inspect_file(path, !args.no_mipmaps) {
            Ok(info) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    print_info(&info);
                }
            }
            Err(e) => {
                eprintln!("  error: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} file(s) failed");
    }
    Ok(())
}

/// Probe a single file and return structured info.
fn inspect_file(path: &Path, with_mipmapping: bool) -> anyhow::Result<HeaderDisplay> {
    let data = std::fs::read(path)?;
    let file_size = data.len() as u64;

    let header = match imgdim::detect(&data)? {
        Detection::Recognized(header) => header,
        Detection::Unrecognized => anyhow::bail!("unrecognized image format"),
    };

    let gif_version = match &header {
        ImageHeader::Gif(gif) => Some(gif.version()),
        _ => None,
    };

    Ok(HeaderDisplay {
        path: path.display().to_string(),
        format: format!("{:?}", header.format()),
        mime_type: header.format().mime_type().to_string(),
        width: header.width(),
        height: header.height(),
        estimated_size_bytes: header.estimated_size_bytes(with_mipmapping),
        gif_version: gif_version.map(GifVersion::number),
        file_size,
    })
}

#[derive(Debug, Serialize)]
struct HeaderDisplay {
    path: String,
    format: String,
    mime_type: String,
    width: i64,
    height: i64,
    estimated_size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    gif_version: Option<u16>,
    file_size: u64,
}

fn print_info(info: &HeaderDisplay) {
    println!("  Format:        {} ({})", info.format, info.mime_type);
    println!("  Dimensions:    {}x{}", info.width, info.height);
    if let Some(version) = info.gif_version {
        println!("  GIF version:   {version}");
    }
    if info.estimated_size_bytes >= 0 {
        println!(
            "  Decoded (est): {}",
            format_size(info.estimated_size_bytes as u64)
        );
    }
    println!("  File size:     {}", format_size(info.file_size));
}

/// Expand input patterns into a deduplicated, sorted list of files.
///
/// Handles glob patterns (containing `*`, `?`, `[`), plain file paths, and
/// directories (recursive discovery filtered by image extension).
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            for entry in glob::glob(pattern)? {
                let path = entry?;
                if path.is_file() {
                    push_unique(path, &mut seen, &mut files);
                }
            }
        } else {
            let path = PathBuf::from(pattern);
            if path.is_dir() {
                collect_images_in_dir(&path, &mut seen, &mut files);
            } else if path.is_file() {
                push_unique(path, &mut seen, &mut files);
            } else {
                anyhow::bail!("not a file or directory: {}", path.display());
            }
        }
    }

    files.sort();
    Ok(files)
}

fn push_unique(path: PathBuf, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    if let Ok(canonical) = path.canonicalize() {
        if seen.insert(canonical) {
            files.push(path);
        }
    }
}

fn collect_images_in_dir(dir: &Path, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_images_in_dir(&path, seen, files);
        } else if path.is_file() && is_image(&path) {
            push_unique(path, seen, files);
        }
    }
}

/// Check if a file path has a recognized image extension.
fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .is_some()
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn is_image_by_extension() {
        assert!(is_image(Path::new("photo.JPG")));
        assert!(is_image(Path::new("icon.webp")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("no_extension")));
    }
}
