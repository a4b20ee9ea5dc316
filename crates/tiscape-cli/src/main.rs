// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tiscape::{DatasetConfig, Error, IGNORE_INDEX, TiscapeSegmentation, write_splits};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[clap(long, short)]
    verbose: bool,

    /// Dataset configuration file (TOML, JSON, or YAML)
    #[clap(long, env = "TISCAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the number of classes
    #[clap(long)]
    num_classes: Option<usize>,

    /// Override the annotation file prefix
    #[clap(long)]
    annotation_prefix: Option<String>,

    /// Shuffle samples with this seed
    #[clap(long)]
    shuffle: Option<u64>,

    /// Keep at most this many images per split
    #[clap(long)]
    num_imgs: Option<usize>,

    /// Dataset Command
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Split `annotations/<prefix>_sorted.json` into train and val
    /// annotation files.  Existing split files are left untouched.
    Split {
        /// Dataset root folder
        root: PathBuf,
    },
    /// Show the number of usable images and classes for a split.
    Info {
        /// Dataset root folder
        root: PathBuf,

        /// Dataset split
        #[clap(long, default_value = "train")]
        split: String,
    },
    /// Write samples of a split to a folder: the image, the class mask
    /// (ignore label 255), and its palette visualization.
    Render {
        /// Dataset root folder
        root: PathBuf,

        /// Dataset split
        #[clap(long, default_value = "train")]
        split: String,

        /// Sample index; every sample is written when omitted
        #[clap(long)]
        index: Option<usize>,

        /// Output folder
        #[clap(long, short)]
        output: PathBuf,
    },
}

fn load_config(args: &Args) -> Result<DatasetConfig, Error> {
    let mut config = DatasetConfig::load(args.config.as_deref())?;
    if let Some(num_classes) = args.num_classes {
        config.num_classes = num_classes;
    }
    if let Some(prefix) = &args.annotation_prefix {
        config.annotation_prefix = prefix.clone();
    }
    if args.shuffle.is_some() {
        config.shuffle = args.shuffle;
    }
    if args.num_imgs.is_some() {
        config.num_imgs = args.num_imgs;
    }
    config.validate()?;
    Ok(config)
}

fn handle_split(config: &DatasetConfig, root: &Path) -> Result<(), Error> {
    for file in write_splits(config, root)? {
        let state = if file.written { "written" } else { "kept" };
        println!(
            "{}: {} images -> {} ({})",
            file.split,
            file.images,
            file.path.display(),
            state
        );
    }
    Ok(())
}

fn handle_info(config: &DatasetConfig, root: &Path, split: &str) -> Result<(), Error> {
    let dataset = TiscapeSegmentation::new(root, split, config.dataset_options(), None)?;
    let index = dataset.base().index();

    println!("split: {}", dataset.base().split());
    println!("images: {}", dataset.len());
    println!("images in annotation file: {}", index.image_ids().len());
    println!("classes: {}", config.num_classes);
    for (class, id) in dataset.base().category_map().ids().iter().enumerate() {
        let name = index.category_name(*id).unwrap_or("<unnamed>");
        println!("  [{}] {} (category {})", class, name, id);
    }
    Ok(())
}

fn handle_render(
    config: &DatasetConfig,
    root: &Path,
    split: &str,
    index: Option<usize>,
    output: &Path,
) -> Result<(), Error> {
    let dataset = TiscapeSegmentation::new(root, split, config.dataset_options(), None)?;
    std::fs::create_dir_all(output)?;

    let indices: Vec<usize> = match index {
        Some(idx) => vec![idx],
        None => (0..dataset.len()).collect(),
    };

    let bar = ProgressBar::new(indices.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise} ETA: {eta}] {msg}: {wide_bar:.yellow} {human_pos}/{human_len}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▇▆▅▄▃▂▁  "),
    );
    bar.set_message("Rendering");

    for idx in indices {
        let sample = dataset.get(idx)?;
        let stem = dataset
            .image_path(idx)?
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{:06}", idx));

        sample.image.save(output.join(format!("{}.png", stem)))?;
        sample.mask.save(output.join(format!("{}_mask.png", stem)))?;
        dataset
            .decode_segmap_rgb8(&sample.mask)
            .save(output.join(format!("{}_color.png", stem)))?;

        let ignored = sample
            .mask
            .pixels()
            .filter(|p| p[0] == IGNORE_INDEX)
            .count();
        log::debug!(
            "{}: {} of {} pixels ignored",
            stem,
            ignored,
            sample.mask.len()
        );
        bar.inc(1);
    }

    bar.finish_with_message("Rendered");
    println!("Wrote {} samples to {}", bar.position(), output.display());
    Ok(())
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = load_config(&args)?;

    match args.cmd {
        Command::Split { root } => handle_split(&config, &root),
        Command::Info { root, split } => handle_info(&config, &root, &split),
        Command::Render {
            root,
            split,
            index,
            output,
        } => handle_render(&config, &root, &split, index, &output),
    }
}
