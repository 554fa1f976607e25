use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};

use lucid::{
    image::{Image, ImageSize},
    imgproc::{
        self,
        deconvolution::{DivisionPolicy, RichardsonLucy, RichardsonLucyConfig},
        filter::{kernels, ConvolveOptions},
    },
};

#[derive(FromArgs)]
/// Blur a synthetic star field, add photon noise and restore it with Richardson-Lucy
struct Args {
    /// the width and height of the image
    #[argh(option, default = "128")]
    size: usize,

    /// the number of stars to place
    #[argh(option, default = "40")]
    stars: usize,

    /// the sigma of the gaussian point-spread function
    #[argh(option, default = "2.0")]
    sigma: f32,

    /// the width and height of the point-spread function
    #[argh(option, default = "15")]
    kernel_size: usize,

    /// the number of Richardson-Lucy iterations
    #[argh(option, default = "30")]
    iterations: usize,

    /// the brightest star flux, in photons
    #[argh(option, default = "1000.0")]
    peak: f32,

    /// the sky background level, in photons per pixel
    #[argh(option, default = "10.0")]
    background: f32,

    /// the standard deviation of the gaussian read noise added after the photon noise
    #[argh(option, default = "0.0")]
    read_noise: f32,

    /// guard the division with this epsilon instead of letting zeros propagate
    #[argh(option)]
    epsilon: Option<f32>,

    /// the random seed for the star positions and the noise
    #[argh(option, default = "0")]
    seed: u64,
}

fn check_args(args: &Args) -> Result<(), String> {
    if args.size == 0 {
        return Err("--size must be at least 1".to_string());
    }
    if args.kernel_size > args.size {
        return Err(format!(
            "--kernel-size {} does not fit in a {}x{} image",
            args.kernel_size, args.size, args.size
        ));
    }
    Ok(())
}

fn star_field(
    size: ImageSize,
    stars: usize,
    peak: f32,
    background: f32,
    seed: u64,
) -> Result<Image<f32, 1>, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut image = Image::from_size_val(size, background)?;

    for _ in 0..stars {
        let y = rng.random_range(0..size.height);
        let x = rng.random_range(0..size.width);
        let flux = peak * rng.random_range(0.05f32..1.0);
        if let Some(pixel) = image.get_mut([y, x, 0]) {
            *pixel += flux;
        }
    }

    Ok(image)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    check_args(&args)?;

    let size = [args.size, args.size].into();
    let truth = star_field(size, args.stars, args.peak, args.background, args.seed)?;

    // blur with the psf, draw photon counts and add read noise
    let psf = kernels::gaussian_kernel_2d(
        (args.kernel_size, args.kernel_size),
        (args.sigma, args.sigma),
    )?;
    let blurred = imgproc::filter::convolve(&truth, &psf, ConvolveOptions::default())?;
    let mut observed = imgproc::noise::poisson_noise(&blurred, args.seed)?;
    if args.read_noise != 0.0 {
        let read_seed = args.seed.wrapping_add(1);
        observed = imgproc::noise::gaussian_noise(&observed, args.read_noise, read_seed)?;
    }

    log::info!(
        "simulated {} stars on {} with a {}x{} psf (sigma {})",
        args.stars,
        size,
        args.kernel_size,
        args.kernel_size,
        args.sigma
    );

    let division = match args.epsilon {
        Some(eps) => DivisionPolicy::Epsilon(eps),
        None => DivisionPolicy::Propagate,
    };
    let config = RichardsonLucyConfig::default()
        .with_iterations(args.iterations)
        .with_division(division);

    let mut rl = RichardsonLucy::new(config);
    let report_every = (args.iterations / 10).max(1);
    let restored = rl.run_with_callback(&observed, &psf, |iteration, estimate| {
        if (iteration + 1) % report_every == 0 {
            match imgproc::metrics::nmse(&truth, estimate) {
                Ok(nmse) => log::info!("iteration {:>4}: nmse {:.6}", iteration + 1, nmse),
                Err(e) => log::warn!("iteration {:>4}: {}", iteration + 1, e),
            }
        }
    })?;

    for (name, image) in [("observed", &observed), ("restored", &restored)] {
        let mse = imgproc::metrics::mse(&truth, image)?;
        let nmse = imgproc::metrics::nmse(&truth, image)?;
        println!("{name}: MSE {mse:.4}, NMSE {nmse:.6}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use argh::FromArgs;

    use super::{check_args, Args};

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["starfield"], args).unwrap()
    }

    #[test]
    fn test_default_args() {
        let args = parse(&[]);
        assert_eq!(args.iterations, 30);
        assert_eq!(args.read_noise, 0.0);
        assert!(check_args(&args).is_ok());
    }

    #[test]
    fn test_kernel_larger_than_image() {
        let err = check_args(&parse(&["--size", "8"])).unwrap_err();
        assert!(err.contains("--kernel-size 15"), "{err}");

        assert!(check_args(&parse(&["--size", "8", "--kernel-size", "8"])).is_ok());
        assert!(check_args(&parse(&["--size", "0", "--kernel-size", "0"])).is_err());
    }
}
