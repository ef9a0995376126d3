use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_new_and_shape() {
    let t = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    assert_eq!(t.shape(), &[2, 3]);
    assert_eq!(t.dimension(), 2);
    assert_eq!(t.size(), 6);
}

#[test]
fn test_zeros_and_ones() {
    let z = Tensor::zeros(&[2, 2, 2, 2]);
    assert!(z.data_as_slice().iter().all(|&x| x == 0.0));

    let o = Tensor::ones(&[3]);
    assert!(o.data_as_slice().iter().all(|&x| x == 1.0));
}

#[test]
fn test_index_nhwc() {
    // [batch=1, H=2, W=2, C=2]，行主序
    let t = Tensor::new(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], &[1, 2, 2, 2]);
    assert_abs_diff_eq!(t[[0, 0, 0, 0]], 0.0);
    assert_abs_diff_eq!(t[[0, 0, 0, 1]], 1.0);
    assert_abs_diff_eq!(t[[0, 0, 1, 0]], 2.0);
    assert_abs_diff_eq!(t[[0, 1, 0, 0]], 4.0);
    assert_abs_diff_eq!(t[[0, 1, 1, 1]], 7.0);
}

#[test]
fn test_normal_seeded_is_deterministic() {
    let a = Tensor::normal_seeded(0.0, 1.0, &[4, 4], 7);
    let b = Tensor::normal_seeded(0.0, 1.0, &[4, 4], 7);
    assert_eq!(a.data_as_slice(), b.data_as_slice());

    let c = Tensor::normal_seeded(0.0, 1.0, &[4, 4], 8);
    assert_ne!(a.data_as_slice(), c.data_as_slice());
}

#[test]
fn test_new_random_in_range() {
    let t = Tensor::new_random(0.0, 1.0, &[3, 5, 5, 2]);
    assert!(t.data_as_slice().iter().all(|&x| (0.0..=1.0).contains(&x)));
}

#[test]
fn test_can_broadcast_with() {
    let image = Tensor::zeros(&[2, 4, 4, 3]);
    let bias = Tensor::zeros(&[3]);
    let keepdims = Tensor::zeros(&[2, 1, 1, 3]);
    let other = Tensor::zeros(&[4]);

    assert!(image.can_broadcast_with(&bias));
    assert!(image.can_broadcast_with(&keepdims));
    assert!(!image.can_broadcast_with(&other));
}

#[test]
fn test_where_with_f32() {
    let t = Tensor::new(&[-2.0, -1.0, 0.0, 3.0], &[4]);
    let relu = t.where_with_f32(|x| x > 0.0, |x| x, |_| 0.0);
    assert_eq!(relu.data_as_slice(), &[0.0, 0.0, 0.0, 3.0]);
}

#[test]
fn test_npy_roundtrip() {
    let t = Tensor::new(&[1.5, -2.5, 3.25, 0.0, 7.0, -8.0], &[3, 2]);
    let path = std::env::temp_dir().join("only_conv_tensor_roundtrip.npy");
    t.save_npy(&path).unwrap();

    let loaded = Tensor::load_npy(&path).unwrap();
    assert_eq!(loaded.shape(), t.shape());
    assert_eq!(loaded.data_as_slice(), t.data_as_slice());

    std::fs::remove_file(&path).ok();
}
