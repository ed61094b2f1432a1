use super::{unbounded, Barrier};
use crate::errors::{Result, SamplerError};
use ndarray::{Array1, Array2, ArrayView1, NdFloat};

/**
Intersection of several barriers over the same space.

Potentials add up. The feasible chord is the intersection of the members' chords.

# Example

```rust
use conspace_sampler::barriers::{Barrier, BoxBarrier, ComposeBarrier, EllipsoidBarrier};
use ndarray::arr1;

// The unit disk clipped to |y| <= 0.5.
let slab = BoxBarrier::new(arr1(&[1.0, 0.5])).unwrap();
let disk = EllipsoidBarrier::ball(2, 1.0).unwrap();
let members: Vec<Box<dyn Barrier<f64>>> = vec![Box::new(slab), Box::new(disk)];
let barrier = ComposeBarrier::new(members).unwrap();
assert!(barrier.contains(arr1(&[0.8, 0.4]).view()));
assert!(!barrier.contains(arr1(&[0.0, 0.7]).view()));
```
*/
pub struct ComposeBarrier<T: NdFloat> {
    barriers: Vec<Box<dyn Barrier<T>>>,
    dimension: usize,
}

impl<T: NdFloat> ComposeBarrier<T> {
    /// Fails with [`SamplerError::InvalidBarrier`] if the list is empty or the members
    /// disagree on the dimension.
    pub fn new(barriers: Vec<Box<dyn Barrier<T>>>) -> Result<Self> {
        let dimension = barriers
            .first()
            .map(|b| b.dimension())
            .ok_or_else(|| SamplerError::InvalidBarrier("nothing to compose".to_string()))?;
        if let Some(pos) = barriers.iter().position(|b| b.dimension() != dimension) {
            return Err(SamplerError::InvalidBarrier(format!(
                "barrier {pos} has dimension {}, expected {dimension}",
                barriers[pos].dimension()
            )));
        }
        Ok(Self {
            barriers,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }
}

impl<T: NdFloat> std::fmt::Debug for ComposeBarrier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeBarrier")
            .field("n_barriers", &self.barriers.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl<T: NdFloat> Barrier<T> for ComposeBarrier<T> {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn contains(&self, x: ArrayView1<T>) -> bool {
        self.barriers.iter().all(|b| b.contains(x))
    }

    fn chord(&self, x: ArrayView1<T>, direction: ArrayView1<T>) -> (T, T) {
        let (mut t_min, mut t_max) = unbounded::<T>();
        for barrier in &self.barriers {
            let (lo, hi) = barrier.chord(x, direction);
            t_min = t_min.max(lo);
            t_max = t_max.min(hi);
        }
        (t_min, t_max)
    }

    fn value(&self, x: ArrayView1<T>) -> T {
        self.barriers
            .iter()
            .fold(T::zero(), |acc, b| acc + b.value(x))
    }

    fn gradient(&self, x: ArrayView1<T>) -> Array1<T> {
        self.barriers
            .iter()
            .fold(Array1::zeros(self.dimension), |acc, b| acc + b.gradient(x))
    }

    fn hessian(&self, x: ArrayView1<T>) -> Array2<T> {
        self.barriers.iter().fold(
            Array2::zeros((self.dimension, self.dimension)),
            |acc, b| acc + b.hessian(x),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barriers::{BoxBarrier, EllipsoidBarrier, PolytopeBarrier};
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2, Array};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    const DIM: usize = 43;

    fn box_and_ball() -> ComposeBarrier<f64> {
        ComposeBarrier::new(vec![
            Box::new(BoxBarrier::new(Array1::ones(DIM)).unwrap()) as Box<dyn Barrier<f64>>,
            Box::new(EllipsoidBarrier::ball(DIM, 1.0).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_empty_and_mismatched() {
        assert!(ComposeBarrier::<f64>::new(vec![]).is_err());
        let result = ComposeBarrier::new(vec![
            Box::new(BoxBarrier::new(arr1(&[1.0, 1.0])).unwrap()) as Box<dyn Barrier<f64>>,
            Box::new(EllipsoidBarrier::ball(3, 1.0).unwrap()),
        ]);
        assert!(matches!(result, Err(SamplerError::InvalidBarrier(_))));
    }

    #[test]
    fn feasibility_of_ball_inside_box() {
        let composed = box_and_ball();
        let mut rng = SmallRng::seed_from_u64(19);
        for _ in 0..19 {
            let x: Array1<f64> = Array::from_shape_fn(DIM, |_| rng.sample(StandardNormal));
            let inside = &x / x.dot(&x).sqrt() * rng.random::<f64>();
            assert!(composed.contains(inside.view()));
        }
        // A corner-ish point: inside the box, outside the ball.
        let corner = Array1::from_elem(DIM, 0.5);
        assert!(!composed.contains(corner.view()));
    }

    #[test]
    fn derivatives_are_sums() {
        let composed = box_and_ball();
        let cube = BoxBarrier::new(Array1::<f64>::ones(DIM)).unwrap();
        let ball = EllipsoidBarrier::ball(DIM, 1.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        let x: Array1<f64> = Array::from_shape_fn(DIM, |_| rng.sample(StandardNormal));
        let x = &x / x.dot(&x).sqrt() * 0.6;

        assert_abs_diff_eq!(
            composed.value(x.view()),
            cube.value(x.view()) + ball.value(x.view()),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            composed.gradient(x.view()),
            cube.gradient(x.view()) + ball.gradient(x.view()),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            composed.hessian(x.view()),
            cube.hessian(x.view()) + ball.hessian(x.view()),
            epsilon = 1e-9
        );
    }

    #[test]
    fn chord_is_the_tighter_member() {
        let composed = box_and_ball();
        let mut d = Array1::<f64>::zeros(DIM);
        d[0] = 1.0;
        let origin = Array1::<f64>::zeros(DIM);
        let (t_min, t_max) = composed.boundary_distances(origin.view(), d.view()).unwrap();
        assert_abs_diff_eq!(t_min, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t_max, 1.0, epsilon = 1e-12);

        let diag = Array1::from_elem(DIM, 1.0 / (DIM as f64).sqrt());
        let (_, t_max) = composed.boundary_distances(origin.view(), diag.view()).unwrap();
        // The ball is hit first along the diagonal.
        assert_abs_diff_eq!(t_max, 1.0, epsilon = 1e-12);
        assert_eq!(composed.boundary_to_interior_half(origin.view()), None);
    }

    #[test]
    fn unbounded_member_is_clipped() {
        // Half-plane y >= -0.5 inside the unit disk.
        let half_plane =
            PolytopeBarrier::new(arr2(&[[0.0, -1.0]]), arr1(&[0.5]), None).unwrap();
        let up = arr1(&[0.0, 1.0]);
        let origin = arr1(&[0.0, 0.0]);
        assert!(half_plane.boundary_distances(origin.view(), up.view()).is_err());

        let composed = ComposeBarrier::new(vec![
            Box::new(half_plane) as Box<dyn Barrier<f64>>,
            Box::new(EllipsoidBarrier::ball(2, 1.0).unwrap()),
        ])
        .unwrap();
        let (t_min, t_max) = composed.boundary_distances(origin.view(), up.view()).unwrap();
        assert_abs_diff_eq!(t_min, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(t_max, 1.0, epsilon = 1e-12);
    }
}
