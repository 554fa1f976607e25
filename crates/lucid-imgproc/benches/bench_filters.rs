use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use lucid_image::Image;
use lucid_imgproc::filter::{kernels, Convolver, DirectConvolver, FftConvolver};

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("Convolution");

    for (width, height) in [(128, 128), (256, 224), (512, 448)].iter() {
        for kernel_size in [3, 7, 15].iter() {
            group.throughput(criterion::Throughput::Elements(
                (*width * *height * *kernel_size) as u64,
            ));

            let parameter_string = format!("{}x{}x{}", width, height, kernel_size);

            // input image and psf
            let image_size = [*width, *height].into();
            let image = Image::<f32, 1>::from_size_val(image_size, 1.0).unwrap();
            let kernel =
                kernels::gaussian_kernel_2d((*kernel_size, *kernel_size), (1.5, 1.5)).unwrap();

            // output image
            let output = Image::<f32, 1>::from_size_val(image_size, 0.0).unwrap();

            group.bench_with_input(
                BenchmarkId::new("fft", &parameter_string),
                &(&image, &output),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    let mut convolver = FftConvolver::default();
                    b.iter(|| black_box(convolver.convolve(src, &kernel, &mut dst)))
                },
            );

            group.bench_with_input(
                BenchmarkId::new("direct", &parameter_string),
                &(&image, &output),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    let mut convolver = DirectConvolver::default();
                    b.iter(|| black_box(convolver.convolve(src, &kernel, &mut dst)))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
