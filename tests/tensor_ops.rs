use seqfeat::tensor::{IndexTensor, Tensor};

#[test]
fn repeat_over_time_copies_each_row() {
    let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let r = t.repeat_over_time(3);
    assert_eq!(r.shape, vec![2, 3, 2]);
    for s in 0..3 {
        assert_eq!(r.get(&[0, s, 0]), 1.0);
        assert_eq!(r.get(&[0, s, 1]), 2.0);
        assert_eq!(r.get(&[1, s, 0]), 3.0);
        assert_eq!(r.get(&[1, s, 1]), 4.0);
    }
}

#[test]
fn sum_over_time_inverts_repeat_up_to_scale() {
    let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let s = t.repeat_over_time(5).sum_over_time();
    assert_eq!(s.shape, vec![2, 2]);
    assert_eq!(s.data, vec![5.0, 10.0, 15.0, 20.0]);
}

#[test]
fn concat_last_interleaves_rows() {
    let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let b = Tensor::new(vec![9.0, 8.0], vec![2, 1]);
    let c = Tensor::concat_last(&[&a, &b]);
    assert_eq!(c.shape, vec![2, 3]);
    assert_eq!(c.data, vec![1.0, 2.0, 9.0, 3.0, 4.0, 8.0]);
}

#[test]
fn slice_last_recovers_concat_inputs() {
    let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let b = Tensor::new(vec![9.0, 8.0], vec![2, 1]);
    let c = Tensor::concat_last(&[&a, &b]);
    assert_eq!(c.slice_last(0, 2), a);
    assert_eq!(c.slice_last(2, 1), b);
}

#[test]
fn index_tensor_converts_to_real_values() {
    let x = IndexTensor::new(vec![0, 3, 7], vec![3, 1]);
    let t = x.to_real();
    assert_eq!(t.shape, vec![3, 1]);
    assert_eq!(t.data, vec![0.0, 3.0, 7.0]);
}
