use gckmatch::{
    BuildConfig, DescriptorSet, DescriptorSpec, GckConfig, GckMatchError, GckTransform, ImageView,
    MatchConfig, OwnedImage,
};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        GckMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        GckMatchError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        GckMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, GckMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_shares_stride() {
    let data: Vec<u8> = (0..20).collect();
    let view = ImageView::new(&data, 4, 4, 5).unwrap();
    let roi = view.roi(1, 2, 2, 2).unwrap();
    assert_eq!(roi.stride(), 5);
    assert_eq!(roi.row(0).unwrap(), &[11, 12]);
    assert_eq!(roi.get(1, 1), Some(&17));

    let err = view.roi(3, 0, 2, 1).err().unwrap();
    assert_eq!(
        err,
        GckMatchError::RoiOutOfBounds {
            x: 3,
            y: 0,
            width: 2,
            height: 1,
            img_width: 4,
            img_height: 4,
        }
    );
}

#[test]
fn image_view_access_without_trailing_padding() {
    // The last row stops at `width`, so the buffer is one padding short.
    let data: Vec<u8> = (0..14).collect();
    let view = ImageView::new(&data, 4, 3, 5).unwrap();
    assert_eq!(view.row(2).unwrap(), &[10, 11, 12, 13]);
    assert_eq!(view.get(3, 2), Some(&13));
    assert_eq!(view.get(4, 0), None);
    assert_eq!(view.get(0, 3), None);
    assert_eq!(view.row(3), None);

    let corner = view.roi(2, 1, 2, 2).unwrap();
    assert_eq!(corner.row(1).unwrap(), &[12, 13]);
    assert_eq!(corner.get(1, 1), Some(&13));
    assert_eq!(corner.get(2, 0), None);
}

#[test]
fn owned_image_copies_strided_rows() {
    let data: Vec<u8> = (0..12).collect();
    let view = ImageView::new(&data, 3, 3, 4).unwrap();
    let owned = OwnedImage::from_view(view).unwrap();
    assert_eq!(owned.data(), &[0, 1, 2, 4, 5, 6, 8, 9, 10]);
    assert_eq!(owned.view().get(2, 2), Some(&10));
}

#[test]
fn default_configs() {
    assert_eq!(
        GckConfig::default(),
        GckConfig {
            kernel_size: 8,
            bases: 16
        }
    );
    assert_eq!(
        BuildConfig::default(),
        BuildConfig {
            leaf_cap: 8,
            max_depth: 64
        }
    );
    let m = MatchConfig::default();
    assert!(m.coherence && m.hops && !m.parallel);
    assert_eq!(DescriptorSpec::default().dims(), 16);
}

#[test]
fn transform_rejects_invalid_configs() {
    let err = GckTransform::new(GckConfig {
        kernel_size: 12,
        bases: 4,
    })
    .err()
    .unwrap();
    assert_eq!(err, GckMatchError::InvalidKernelSize { kernel: 12 });

    let err = GckTransform::new(GckConfig {
        kernel_size: 0,
        bases: 1,
    })
    .err()
    .unwrap();
    assert_eq!(err, GckMatchError::InvalidKernelSize { kernel: 0 });

    let err = GckTransform::new(GckConfig {
        kernel_size: 8,
        bases: 65,
    })
    .err()
    .unwrap();
    assert_eq!(err, GckMatchError::InvalidBasisCount { bases: 65, max: 64 });
}

#[test]
fn descriptor_extract_requires_matching_channels() {
    let a = [0u8; 16];
    let b = [0u8; 20];
    let va = ImageView::from_slice(&a, 4, 4).unwrap();
    let vb = ImageView::from_slice(&b, 5, 4).unwrap();
    let spec = DescriptorSpec {
        kernel_size: 2,
        channel_bases: vec![2, 2],
    };
    let err = DescriptorSet::extract(&[va, vb], &spec).err().unwrap();
    assert_eq!(
        err,
        GckMatchError::InvalidDimensions {
            width: 5,
            height: 4
        }
    );
}

#[test]
fn errors_render_readably() {
    let err = GckMatchError::KernelTooLarge {
        kernel: 16,
        width: 8,
        height: 8,
    };
    assert_eq!(err.to_string(), "kernel size 16 larger than image 8x8");
    assert_eq!(GckMatchError::EmptyIndex.to_string(), "index is empty");
}
