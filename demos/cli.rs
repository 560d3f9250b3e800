use alphaquant::{
    Converter, DitherAmount, ImageBuf, Palette, SignificantBits, color_map::DistanceMode,
    quantize::Quantizer,
};
use clap::Parser;
use image::RgbaImage;
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Options {
    /// The maximum number of palette colors.
    #[arg(short, long, default_value_t = 256)]
    k: usize,

    /// The number of most significant bits per channel used to build the palette.
    #[arg(short, long, default_value_t = SignificantBits::DEFAULT, value_parser = parse_significant_bits)]
    bits: SignificantBits,

    #[arg(short, long, default_value_t = DitherAmount::DEFAULT.get(), value_parser = parse_dither_amount)]
    dither: f32,

    /// Match palette colors in CIE Lab instead of RGBA.
    #[arg(long)]
    lab: bool,

    #[arg(long)]
    parallel: bool,

    input: PathBuf,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_significant_bits(s: &str) -> Result<SignificantBits, String> {
    let value: u8 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn parse_dither_amount(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    DitherAmount::try_new(value).map(DitherAmount::get).map_err(|e| format!("{e}"))
}

fn main() {
    pretty_env_logger::init();

    let Options { k, bits, dither, lab, parallel, input, output } = Options::parse();

    macro_rules! timed {
        ($name: literal, $val: expr) => {{
            let time = std::time::Instant::now();
            let value = $val;
            info!("{} took {}ms", $name, time.elapsed().as_millis());
            value
        }};
    }

    let image = timed!("read image", image::open(input).unwrap().into_rgba8());
    let image = ImageBuf::try_from(&image).unwrap();

    let quantizer = Quantizer::new(k).unwrap().significant_bits(bits);
    let colors = if parallel {
        timed!("quantization", quantizer.quantize_par(&image).unwrap())
    } else {
        timed!("quantization", quantizer.quantize(&image).unwrap())
    };
    info!("generated {} colors", colors.len());

    let mut converter = Converter::new()
        .dither_amount(DitherAmount::new_clamped(dither))
        .distance_mode(if lab { DistanceMode::Lab } else { DistanceMode::Rgba });

    let palette = Palette::try_from(colors).unwrap();
    let converted = timed!("conversion", converter.convert(&image, &palette).unwrap());

    match converter.lookup_hit_rate() {
        Some(rate) => info!("lookup cache hit rate: {:.1}%", rate * 100.0),
        None => info!("no lookups"),
    }

    if let Some(output) = output {
        let image = RgbaImage::from(converted);
        timed!("write image", image.save(output).unwrap());
    }
}
