use num_traits::Float;

/// Deviation from unit length tolerated for a normalised direction before it is considered
/// unusable in the spatial index.
const UNIT_NORM_TOLERANCE: f64 = 1e-3;

pub(crate) fn dot<T: Float>(a: &[T; 3], b: &[T; 3]) -> T {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x) * (*y))
        .fold(T::zero(), std::ops::Add::add)
}

pub(crate) fn magnitude<T: Float>(a: &[T; 3]) -> T {
    dot(a, a).sqrt()
}

/// The angle between a cluster position and a particle momentum, `acos(a.b / |a||b|)`.
///
/// The cosine is clamped to [-1, 1] to absorb rounding overshoot. A cosine that is not finite,
/// which happens when either vector has zero magnitude, gives an infinite angle so that the
/// candidate can never be the best match.
pub(crate) fn angular_distance<T: Float>(position: &[T; 3], momentum: &[T; 3]) -> T {
    let cos_theta = dot(position, momentum) / (magnitude(position) * magnitude(momentum));
    // Must be checked before clamping, Float::max/min would swallow a NaN
    if !cos_theta.is_finite() {
        return T::infinity();
    }
    cos_theta.max(-T::one()).min(T::one()).acos()
}

/// Relative energy difference `(e_rec - e_gen) / e_gen`.
pub(crate) fn energy_residual<T: Float>(cluster_energy: T, particle_energy: T) -> T {
    (cluster_energy - particle_energy) / particle_energy
}

/// Unit vector along `a`, if one can be computed reliably.
pub(crate) fn unit_direction<T: Float>(a: &[T; 3]) -> Option<[T; 3]> {
    let mag = magnitude(a);
    if !mag.is_normal() {
        return None;
    }
    let unit = [a[0] / mag, a[1] / mag, a[2] / mag];
    let tolerance = T::from(UNIT_NORM_TOLERANCE)?;
    if unit.iter().all(|c| c.is_finite()) && (magnitude(&unit) - T::one()).abs() < tolerance {
        Some(unit)
    } else {
        None
    }
}

/// Straight line distance between two unit vectors separated by `angle` radians.
/// Monotonic in the angle on [0, π].
pub(crate) fn chord_length<T: Float>(angle: T) -> T {
    let two = T::one() + T::one();
    two * (angle / two).sin()
}
