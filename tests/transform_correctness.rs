use gckmatch::lowlevel::{direct_plane, walsh_coefficient};
use gckmatch::{DescriptorSet, DescriptorSpec, GckConfig, GckMatchError, GckTransform, ImageView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_image(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random_range(0..=255u8)).collect()
}

fn check_against_direct(width: usize, height: usize, kernel: usize, bases: usize, seed: u64) {
    let data = random_image(width, height, seed);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let transform = GckTransform::new(GckConfig {
        kernel_size: kernel,
        bases,
    })
    .unwrap();

    let fits = kernel <= width && kernel <= height;
    let planes = match transform.compute(view) {
        Ok(planes) => planes,
        Err(err) => {
            assert!(!fits, "{width}x{height} S={kernel}: {err}");
            assert_eq!(
                err,
                GckMatchError::KernelTooLarge {
                    kernel,
                    width,
                    height
                }
            );
            return;
        }
    };
    assert!(fits);
    assert_eq!(planes.width(), width + kernel - 1);
    assert_eq!(planes.height(), height + kernel - 1);

    for (b, entry) in transform.path().entries().iter().enumerate() {
        let expected = direct_plane(view, kernel, entry.x, entry.y).unwrap();
        let got = planes.plane(b).unwrap();
        assert_eq!(
            got,
            expected.as_slice(),
            "{width}x{height} S={kernel} basis {b} ({}, {})",
            entry.x,
            entry.y
        );
    }
}

#[test]
fn incremental_planes_match_direct_convolution() {
    let sizes = [(8, 8), (17, 13), (32, 32)];
    let mut seed = 1;
    for &(w, h) in &sizes {
        for &(kernel, bases) in &[(4, 16), (8, 64), (16, 48)] {
            check_against_direct(w, h, kernel, bases, seed);
            seed += 1;
        }
    }
}

#[test]
fn kernel_two_full_basis() {
    check_against_direct(9, 5, 2, 4, 99);
}

#[test]
fn unit_kernel_is_identity() {
    let data = random_image(5, 4, 7);
    let view = ImageView::from_slice(&data, 5, 4).unwrap();
    let planes = GckTransform::new(GckConfig {
        kernel_size: 1,
        bases: 1,
    })
    .unwrap()
    .compute(view)
    .unwrap();
    let expected: Vec<i32> = data.iter().map(|&v| i32::from(v)).collect();
    assert_eq!(planes.plane(0).unwrap(), expected.as_slice());
}

#[test]
fn descriptors_are_valid_window_projections() {
    let (w, h, kernel) = (12, 10, 4);
    let data = random_image(w, h, 3);
    let view = ImageView::from_slice(&data, w, h).unwrap();
    let set = DescriptorSet::extract(&[view], &DescriptorSpec::single(kernel, 10)).unwrap();
    assert_eq!((set.width(), set.height()), (w - kernel + 1, h - kernel + 1));

    let transform = GckTransform::new(GckConfig {
        kernel_size: kernel,
        bases: 10,
    })
    .unwrap();
    let path = transform.path().entries();
    for (gy, gx) in [(0, 0), (3, 5), (6, 8)] {
        let desc = set.at(gx, gy).unwrap();
        for (b, entry) in path.iter().enumerate() {
            let mut acc = 0i32;
            for ty in 0..kernel {
                for tx in 0..kernel {
                    let v = i32::from(data[(gy + ty) * w + gx + tx]);
                    acc += walsh_coefficient(entry.y, ty, kernel)
                        * walsh_coefficient(entry.x, tx, kernel)
                        * v;
                }
            }
            assert_eq!(desc[b], acc, "window ({gx}, {gy}) basis {b}");
        }
    }

    let from_planes = transform.compute(view).unwrap().descriptors().unwrap();
    assert_eq!(from_planes, set);
}

#[test]
fn strided_views_transform_like_contiguous_ones() {
    let (w, h, stride) = (9, 9, 13);
    let mut padded = vec![255u8; stride * h];
    let data = random_image(w, h, 11);
    for y in 0..h {
        padded[y * stride..y * stride + w].copy_from_slice(&data[y * w..(y + 1) * w]);
    }
    let contiguous = ImageView::from_slice(&data, w, h).unwrap();
    let strided = ImageView::new(&padded, w, h, stride).unwrap();
    let transform = GckTransform::new(GckConfig::default()).unwrap();
    let a = transform.compute(contiguous).unwrap();
    let b = transform.compute(strided).unwrap();
    for basis in 0..a.bases() {
        assert_eq!(a.plane(basis), b.plane(basis));
    }
}
