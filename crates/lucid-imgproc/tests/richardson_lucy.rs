use approx::{assert_abs_diff_eq, assert_relative_eq};
use lucid_image::{Image, ImageError, ImageSize};
use lucid_imgproc::{
    deconvolution::{richardson_lucy, RichardsonLucy, RichardsonLucyConfig},
    filter::{convolve, kernels, ConvolveOptions, DirectConvolver},
    metrics::nmse,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_image(size: ImageSize, low: f32, high: f32, seed: u64) -> Image<f32, 1> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..size.area())
        .map(|_| rng.random_range(low..high))
        .collect();
    Image::new(size, data).unwrap()
}

fn assert_images_close<const C: usize>(a: &Image<f32, C>, b: &Image<f32, C>, epsilon: f32) {
    assert_eq!(a.size(), b.size());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
    }
}

#[test]
fn delta_kernel_returns_observation() -> Result<(), ImageError> {
    let observed = random_image([9, 7].into(), 0.5, 2.0, 1);
    let kernel = kernels::delta_kernel((3, 3))?;

    for iterations in [1, 2, 10] {
        let restored = richardson_lucy(&observed, &kernel, iterations)?;
        assert_images_close(&restored, &observed, 1e-4);
    }
    Ok(())
}

#[test]
fn zero_iterations_returns_initial_estimate() -> Result<(), ImageError> {
    let observed = random_image([6, 5].into(), 0.0, 10.0, 2);
    let kernel = kernels::gaussian_kernel_2d((3, 3), (1.0, 1.0))?;

    let restored = richardson_lucy(&observed, &kernel, 0)?;
    assert_eq!(restored.size(), observed.size());
    assert!(restored.as_slice().iter().all(|&v| v == 0.5));
    Ok(())
}

#[test]
fn initial_estimate_independent_of_prior_runs() -> Result<(), ImageError> {
    let observed = random_image([8, 8].into(), 0.5, 1.5, 3);
    let kernel = kernels::gaussian_kernel_2d((3, 3), (0.8, 0.8))?;

    let mut rl = RichardsonLucy::new(RichardsonLucyConfig::default().with_iterations(5));
    let first = rl.run(&observed, &kernel)?;

    let fresh = richardson_lucy(&observed, &kernel, 0)?;
    let fed_back = richardson_lucy(&first, &kernel, 0)?;
    assert_eq!(fed_back, fresh);

    // a reused deconvolver starts from scratch on every run
    assert_eq!(rl.run(&observed, &kernel)?, first);
    Ok(())
}

#[test]
fn output_shape_matches_observation() -> Result<(), ImageError> {
    let size = ImageSize {
        width: 7,
        height: 5,
    };
    let observed = random_image(size, 0.5, 1.5, 4);

    // a kernel as large as the image
    let full = kernels::gaussian_kernel_2d((7, 5), (1.0, 1.0))?;
    // and a smaller one
    let small = kernels::box_kernel_2d((3, 3))?;

    for iterations in [0, 1, 3] {
        assert_eq!(richardson_lucy(&observed, &full, iterations)?.size(), size);
        assert_eq!(richardson_lucy(&observed, &small, iterations)?.size(), size);
    }
    Ok(())
}

#[test]
fn single_pixel_identity() -> Result<(), ImageError> {
    let observed = Image::<f32, 1>::new([1, 1].into(), vec![4.0])?;
    let kernel = Image::<f32, 1>::new([1, 1].into(), vec![1.0])?;

    let restored = richardson_lucy(&observed, &kernel, 5)?;
    assert_relative_eq!(restored.as_slice()[0], 4.0, epsilon = 1e-5);
    Ok(())
}

#[test]
fn flat_image_is_a_fixed_point() -> Result<(), ImageError> {
    let c = 3.5;
    let observed = Image::<f32, 1>::from_size_val([10, 8].into(), c)?;
    let kernel = kernels::box_kernel_2d((3, 3))?;

    for iterations in [1, 4, 15] {
        let restored = richardson_lucy(&observed, &kernel, iterations)?;
        for v in restored.as_slice() {
            assert_relative_eq!(*v, c, max_relative = 1e-4);
        }
    }
    Ok(())
}

#[test]
fn shift_kernel_is_undone_in_one_iteration() -> Result<(), ImageError> {
    // the only weight sits one column right of the kernel centre, so the blur shifts the
    // image one column to the right with wrap-around
    let truth = random_image([5, 4].into(), 1.0, 2.0, 5);
    let mut kernel = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
    if let Some(w) = kernel.get_mut([1, 2, 0]) {
        *w = 1.0;
    }

    let observed = convolve(&truth, &kernel, ConvolveOptions::default())?;
    for x in 0..truth.width() {
        let expected = truth.get([2, (x + truth.width() - 1) % truth.width(), 0]);
        assert_abs_diff_eq!(
            *observed.get([2, x, 0]).unwrap(),
            *expected.unwrap(),
            epsilon = 1e-5
        );
    }

    for iterations in [1, 3] {
        let restored = richardson_lucy(&observed, &kernel, iterations)?;
        assert_images_close(&restored, &truth, 1e-4);
    }
    Ok(())
}

#[test]
fn two_pixel_average_converges_to_mean() -> Result<(), ImageError> {
    let observed = Image::<f32, 1>::new([2, 1].into(), vec![1.0, 3.0])?;
    let kernel = Image::<f32, 1>::new([2, 1].into(), vec![0.5, 0.5])?;

    // the periodic average of any estimate is flat, so one update lands on the mean
    let restored = richardson_lucy(&observed, &kernel, 1)?;
    assert_images_close(&restored, &Image::from_size_val([2, 1].into(), 2.0)?, 1e-5);

    let restored = richardson_lucy(&observed, &kernel, 6)?;
    assert_images_close(&restored, &Image::from_size_val([2, 1].into(), 2.0)?, 1e-5);
    Ok(())
}

#[test]
fn normalized_kernel_preserves_flux() -> Result<(), ImageError> {
    let observed = random_image([12, 12].into(), 0.2, 5.0, 6);
    let kernel = kernels::gaussian_kernel_2d((5, 5), (1.2, 1.2))?;
    let total = observed.as_slice().iter().sum::<f32>();

    let config = RichardsonLucyConfig::default().with_iterations(8);
    RichardsonLucy::new(config).run_with_callback(&observed, &kernel, |_, estimate| {
        let flux = estimate.as_slice().iter().sum::<f32>();
        assert_relative_eq!(flux, total, max_relative = 1e-3);
    })?;
    Ok(())
}

#[test]
fn fft_and_direct_backends_agree_after_twenty_iterations() -> Result<(), ImageError> {
    let truth = random_image([16, 16].into(), 0.1, 1.0, 42);
    let kernel = kernels::gaussian_kernel_2d((5, 5), (1.0, 1.0))?;
    let observed = convolve(&truth, &kernel, ConvolveOptions::default())?;

    let config = RichardsonLucyConfig::default().with_iterations(20);
    let fft = RichardsonLucy::new(config).run(&observed, &kernel)?;
    let direct = RichardsonLucy::with_convolver(config, DirectConvolver::default())
        .run(&observed, &kernel)?;

    for (a, b) in fft.as_slice().iter().zip(direct.as_slice()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-3);
    }
    Ok(())
}

/// Estimate after 20 iterations on `reference_observation` with `reference_kernel`,
/// computed once in double precision and stored.
#[rustfmt::skip]
const REFERENCE_ESTIMATE: [f32; 30] = [
    0.5310588, 1.8021759, 1.2774720, 1.8194957, 2.0334660, 0.5740401,
    1.1722401, 0.7289458, 1.9035293, 1.2924452, 1.7708134, 2.0722502,
    3.3530961, 1.6364870, 0.5027539, 1.8584163, 1.4770142, 1.1973160,
    0.3496297, 1.9312278, 2.0086319, 0.4918611, 1.7854216, 1.6818232,
    2.5902078, 1.0671510, 1.9269082, 1.9707146, 0.5065154, 1.6868915,
];

fn reference_observation() -> Result<Image<f32, 1>, ImageError> {
    Image::from_size_fn([6, 5].into(), |y, x, _| {
        1.0 + ((7 * y + 3 * x) % 5) as f32 * 0.25
    })
}

fn reference_kernel() -> Result<Image<f32, 1>, ImageError> {
    // asymmetric, so that a missing or doubled flip changes the result
    #[rustfmt::skip]
    let weights = vec![
        1.0, 2.0, 0.0,
        3.0, 6.0, 1.0,
        0.0, 2.0, 1.0,
    ];
    Image::new([3, 3].into(), weights.iter().map(|w| w / 16.0).collect())
}

#[test]
fn twenty_iterations_match_stored_reference() -> Result<(), ImageError> {
    let observed = reference_observation()?;
    let kernel = reference_kernel()?;
    let config = RichardsonLucyConfig::default().with_iterations(20);

    let direct = RichardsonLucy::with_convolver(config, DirectConvolver::default())
        .run(&observed, &kernel)?;
    for (a, e) in direct.as_slice().iter().zip(REFERENCE_ESTIMATE.iter()) {
        assert_relative_eq!(*a, *e, max_relative = 1e-6);
    }

    // the fft round trip adds a little single precision noise
    let fft = richardson_lucy(&observed, &kernel, 20)?;
    for (a, e) in fft.as_slice().iter().zip(REFERENCE_ESTIMATE.iter()) {
        assert_relative_eq!(*a, *e, max_relative = 1e-5);
    }
    Ok(())
}

#[test]
fn restoration_improves_on_observation() -> Result<(), ImageError> {
    let size = ImageSize {
        width: 32,
        height: 32,
    };
    let mut truth = Image::<f32, 1>::from_size_val(size, 0.1)?;
    for (y, x, flux) in [(8, 8, 50.0), (20, 11, 30.0), (14, 25, 80.0)] {
        if let Some(v) = truth.get_mut([y, x, 0]) {
            *v += flux;
        }
    }

    let kernel = kernels::gaussian_kernel_2d((7, 7), (1.5, 1.5))?;
    let observed = convolve(&truth, &kernel, ConvolveOptions::default())?;
    let restored = richardson_lucy(&observed, &kernel, 50)?;

    let before = nmse(&truth, &observed)?;
    let after = nmse(&truth, &restored)?;
    assert!(after < before, "nmse before {before}, after {after}");
    Ok(())
}

#[test]
fn channels_are_restored_independently() -> Result<(), ImageError> {
    let r = random_image([6, 6].into(), 0.5, 1.5, 7);
    let g = random_image([6, 6].into(), 0.5, 1.5, 8);
    let rgb = Image::<f32, 2>::from_channels(&[r.clone(), g.clone()])?;
    let kernel = kernels::gaussian_kernel_2d((3, 3), (0.8, 0.8))?;

    let restored = richardson_lucy(&rgb, &kernel, 4)?.split_channels()?;
    assert_images_close(&restored[0], &richardson_lucy(&r, &kernel, 4)?, 1e-5);
    assert_images_close(&restored[1], &richardson_lucy(&g, &kernel, 4)?, 1e-5);
    Ok(())
}
