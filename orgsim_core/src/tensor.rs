//! Shape inspection and zero-filled allocation for the nested parameter
//! tensors.
//!
//! Rank-1 and rank-2 data use `nalgebra` vectors and matrices; the rank-3
//! and rank-4 parameter tensors are nested `Vec`s because their dimensions
//! are only known from configuration. A shape is valid only if the nesting
//! is rectangular.

/// Rank-3 tensor, `[agent][state][state]`.
pub type Tensor3 = Vec<Vec<Vec<f64>>>;

/// Rank-4 tensor, `[agent][agent][state][state]` or
/// `[agent][state][state][external]`.
pub type Tensor4 = Vec<Vec<Vec<Vec<f64>>>>;

/// Allocates a zero-filled rank-3 tensor.
pub fn zeros3(d0: usize, d1: usize, d2: usize) -> Tensor3 {
    vec![vec![vec![0.0; d2]; d1]; d0]
}

/// Allocates a zero-filled rank-4 tensor.
pub fn zeros4(d0: usize, d1: usize, d2: usize, d3: usize) -> Tensor4 {
    vec![vec![vec![vec![0.0; d3]; d2]; d1]; d0]
}

/// Returns the shape of a rank-3 tensor, or `None` if the nesting is ragged.
///
/// An empty outer dimension yields `[0, 0, 0]`.
pub fn shape3(tensor: &Tensor3) -> Option<[usize; 3]> {
    let d0 = tensor.len();
    if d0 == 0 {
        return Some([0, 0, 0]);
    }
    let d1 = tensor[0].len();
    let d2 = tensor[0].first().map_or(0, Vec::len);
    for plane in tensor {
        if plane.len() != d1 {
            return None;
        }
        for row in plane {
            if row.len() != d2 {
                return None;
            }
        }
    }
    Some([d0, d1, d2])
}

/// Returns the shape of a rank-4 tensor, or `None` if the nesting is ragged.
///
/// An empty outer dimension yields `[0, 0, 0, 0]`.
pub fn shape4(tensor: &Tensor4) -> Option<[usize; 4]> {
    let d0 = tensor.len();
    if d0 == 0 {
        return Some([0, 0, 0, 0]);
    }
    let d1 = tensor[0].len();
    let [_, d2, d3] = shape3(&tensor[0])?;
    for block in tensor {
        match shape3(block) {
            Some([b1, b2, b3]) if b1 == d1 && b2 == d2 && b3 == d3 => {}
            _ => return None,
        }
    }
    Some([d0, d1, d2, d3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shapes() {
        let t3 = zeros3(2, 3, 4);
        assert_eq!(shape3(&t3), Some([2, 3, 4]));

        let t4 = zeros4(2, 2, 3, 5);
        assert_eq!(shape4(&t4), Some([2, 2, 3, 5]));
    }

    #[test]
    fn test_ragged_tensor_has_no_shape() {
        let mut t3 = zeros3(2, 2, 2);
        t3[1][0].push(0.0);
        assert_eq!(shape3(&t3), None);

        let mut t4 = zeros4(2, 2, 2, 2);
        t4[0][1].pop();
        assert_eq!(shape4(&t4), None);
    }

    #[test]
    fn test_empty_tensor_shape() {
        assert_eq!(shape3(&Vec::new()), Some([0, 0, 0]));
        assert_eq!(shape4(&Vec::new()), Some([0, 0, 0, 0]));
    }
}
