#![allow(dead_code)]

use alphaquant::{ImageBuf, Sample};
use rand::{SeedableRng as _, distr::Uniform, prelude::Distribution as _};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(PathBuf, ImageBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths = entries
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect::<Vec<_>>();

    paths.sort_unstable();

    paths
        .into_iter()
        .map(|path| {
            let image = image::open(&path).unwrap().into_rgba8();
            let image = ImageBuf::try_from(&image).unwrap();
            (path, image)
        })
        .collect()
}

fn root_dir() -> PathBuf {
    // assume current exe path is something like: target/profile/deps/current_exe
    std::env::current_exe()
        .unwrap()
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap()
        .into()
}

/// A smooth gradient over all four channels with a bit of seeded noise.
pub fn synthetic_image(width: u32, height: u32) -> ImageBuf {
    let noise = Uniform::new(0, 16).unwrap();
    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(u64::from(width * height));
    ImageBuf::from_fn(width, height, |x, y| {
        let red = (x * 255 / width.max(1)) as u8;
        let green = (y * 255 / height.max(1)) as u8;
        let blue = ((x + y) * 127 / (width + height).max(1)) as u8;
        let alpha = if (x / 16 + y / 16) % 5 == 0 { (x % 128) as u8 } else { 0 };
        Sample::new(
            red.saturating_add(noise.sample(rng)),
            green,
            blue.saturating_add(noise.sample(rng)),
            alpha,
        )
    })
    .unwrap()
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, ImageBuf)>> = OnceLock::new();

/// Synthetic images of a few sizes, followed by any png images in `img/`.
pub fn benchmark_images() -> &'static [(String, ImageBuf)] {
    BENCHMARK_IMAGES.get_or_init(|| {
        let mut images = [(256, 256), (640, 480), (1280, 720)]
            .into_iter()
            .map(|(width, height)| (format!("synthetic/{width}x{height}"), synthetic_image(width, height)))
            .collect::<Vec<_>>();

        let mut dir = root_dir();
        dir.push("img");
        images.extend(load_image_dir(dir).into_iter().map(|(path, image)| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, image)
        }));

        images
    })
}
