//! Bounded Nelder–Mead simplex minimization.
//!
//! Gradient-free by construction: the orbit-fit objective contains a Newton
//! solve of Kepler's equation in its interior, so its derivatives are not
//! smooth enough for Jacobian-based least squares. The iteration count is
//! capped; hitting the cap returns the best vertex found so far.

/// Standard Nelder–Mead coefficients.
const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `start`, with one initial simplex step per
/// dimension.
///
/// Arguments
/// -----------------
/// * `f`: objective to minimize.
/// * `start`: initial vertex.
/// * `steps`: per-dimension offsets building the initial simplex.
/// * `max_iter`: iteration cap (doubles as the cancellation mechanism).
/// * `eps`: convergence threshold on the spread of the vertex values.
///
/// Return
/// ----------
/// * `(best_point, best_value)` – the best vertex when the spread fell below
///   `eps`, or the best vertex at the cap (best effort, never an error).
pub(crate) fn minimize<F>(
    f: F,
    start: &[f64],
    steps: &[f64],
    max_iter: usize,
    eps: f64,
) -> (Vec<f64>, f64)
where
    F: Fn(&[f64]) -> f64,
{
    let dim = start.len();
    debug_assert_eq!(dim, steps.len());

    // Initial simplex: the start vertex plus one offset vertex per dimension.
    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    vertices.push(start.to_vec());
    for i in 0..dim {
        let mut v = start.to_vec();
        v[i] += steps[i];
        vertices.push(v);
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| f(v)).collect();

    for _ in 0..max_iter {
        // Sort vertices by objective value, best first.
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_unstable_by(|&a, &b| {
            values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[dim];
        let second_worst = order[dim - 1];

        if (values[worst] - values[best]).abs() < eps {
            break;
        }

        // Centroid of all vertices but the worst.
        let mut centroid = vec![0.0; dim];
        for (idx, v) in vertices.iter().enumerate() {
            if idx == worst {
                continue;
            }
            for (c, x) in centroid.iter_mut().zip(v.iter()) {
                *c += x;
            }
        }
        for c in centroid.iter_mut() {
            *c /= dim as f64;
        }

        let blend = |coeff: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(vertices[worst].iter())
                .map(|(c, w)| c + coeff * (c - w))
                .collect()
        };

        // Reflection.
        let reflected = blend(REFLECTION);
        let reflected_value = f(&reflected);

        if reflected_value < values[best] {
            // Expansion.
            let expanded = blend(EXPANSION);
            let expanded_value = f(&expanded);
            if expanded_value < reflected_value {
                vertices[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                vertices[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            vertices[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        // Contraction towards the centroid.
        let contracted = blend(-CONTRACTION);
        let contracted_value = f(&contracted);
        if contracted_value < values[worst] {
            vertices[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink everything towards the best vertex.
        let best_vertex = vertices[best].clone();
        for (idx, v) in vertices.iter_mut().enumerate() {
            if idx == best {
                continue;
            }
            for (x, b) in v.iter_mut().zip(best_vertex.iter()) {
                *x = b + SHRINK * (*x - b);
            }
            values[idx] = f(v);
        }
    }

    let mut best = 0;
    for i in 1..values.len() {
        if values[i] < values[best] {
            best = i;
        }
    }
    (vertices[best].clone(), values[best])
}

#[cfg(test)]
mod simplex_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimizes_shifted_quadratic() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2) + 5.0;
        let (best, value) = minimize(f, &[0.0, 0.0], &[0.5, 0.5], 500, 1e-12);
        assert_relative_eq!(best[0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(best[1], -1.0, epsilon = 1e-4);
        assert_relative_eq!(value, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_minimizes_rosenbrock_valley() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let (best, _) = minimize(f, &[-1.2, 1.0], &[0.5, 0.5], 5000, 1e-14);
        assert_relative_eq!(best[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(best[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_iteration_cap_returns_best_so_far() {
        let f = |x: &[f64]| x[0] * x[0];
        let (best, value) = minimize(f, &[10.0], &[1.0], 3, 1e-15);
        // Not converged, but strictly better than the start.
        assert!(value < 100.0);
        assert!(best[0].abs() < 10.0);
    }
}
