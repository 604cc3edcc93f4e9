use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Runge-Kutta 4 over any `DynamicalSystem`, with stage buffers sized once.
///
/// `integrator::step` is the allocation-free version for the bare pendulum;
/// this one drives systems whose size is only known at runtime, such as the
/// 20-dimensional tangent system in `analysis`.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    stage_state: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            stage_state: vec![z; dim],
        }
    }

    pub fn dimension(&self) -> usize {
        self.k1.len()
    }
}

/// `out = y + h * k`
fn offset_into<T: Scalar>(out: &mut [T], y: &[T], k: &[T], h: T) {
    for ((o, &yi), &ki) in out.iter_mut().zip(y).zip(k) {
        *o = yi + h * ki;
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        debug_assert_eq!(state.len(), self.dimension());
        let two = T::one() + T::one();
        let half = dt / two;
        let t0 = *t;

        system.apply(t0, state, &mut self.k1);
        offset_into(&mut self.stage_state, state, &self.k1, half);
        system.apply(t0 + half, &self.stage_state, &mut self.k2);
        offset_into(&mut self.stage_state, state, &self.k2, half);
        system.apply(t0 + half, &self.stage_state, &mut self.k3);
        offset_into(&mut self.stage_state, state, &self.k3, dt);
        system.apply(t0 + dt, &self.stage_state, &mut self.k4);

        let sixth = dt / (two + two + two);
        for (i, y) in state.iter_mut().enumerate() {
            *y = *y + sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }
        *t = t0 + dt;
    }
}
