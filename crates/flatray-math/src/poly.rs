//! Real-root polynomial solvers up to degree four.
//!
//! The solvers are generic over [`num_traits::Float`] so the torus
//! intersector can run the quartic in either `f32` or `f64`. Roots are
//! returned in ascending order without heap allocation.

use num_traits::{Float, NumCast};

/// Up to four real roots in ascending order.
#[derive(Debug, Clone, Copy)]
pub struct Roots<T> {
    values: [T; 4],
    len: usize,
}

impl<T: Float> Roots<T> {
    /// No roots.
    pub fn none() -> Self {
        Self {
            values: [T::zero(); 4],
            len: 0,
        }
    }

    fn push(&mut self, v: T) {
        if self.len < 4 && v.is_finite() {
            self.values[self.len] = v;
            self.len += 1;
        }
    }

    fn sort(&mut self) {
        let s = &mut self.values[..self.len];
        // Insertion sort; at most four elements.
        for i in 1..s.len() {
            let mut j = i;
            while j > 0 && s[j - 1] > s[j] {
                s.swap(j - 1, j);
                j -= 1;
            }
        }
    }

    fn dedup(&mut self, eps: T) {
        let mut out = Self::none();
        for &v in self.as_slice() {
            if out.len == 0 || (v - out.values[out.len - 1]).abs() > eps {
                out.push(v);
            }
        }
        *self = out;
    }

    /// The roots as a slice, ascending.
    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len]
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if there are no real roots.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn c<T: Float>(v: f64) -> T {
    <T as NumCast>::from(v).unwrap_or_else(T::nan)
}

fn eps<T: Float>() -> T {
    // Scale the degeneracy threshold with the working precision.
    T::epsilon().sqrt() * c(1e-2)
}

/// Solve `a·x² + b·x + c = 0`.
///
/// Uses the cancellation-free form `q = -(b + sign(b)·√disc) / 2`.
/// A double root is reported twice so callers can rely on a pair.
pub fn solve_quadratic<T: Float>(a: T, b: T, c0: T) -> Roots<T> {
    let mut roots = Roots::none();
    if a == T::zero() {
        if b != T::zero() {
            roots.push(-c0 / b);
        }
        return roots;
    }
    let disc = b * b - c::<T>(4.0) * a * c0;
    if disc < T::zero() {
        return roots;
    }
    let root = disc.sqrt();
    let q = if b < T::zero() {
        c::<T>(-0.5) * (b - root)
    } else {
        c::<T>(-0.5) * (b + root)
    };
    if q == T::zero() {
        // b == 0 and c == 0: double root at zero.
        roots.push(T::zero());
        roots.push(T::zero());
        return roots;
    }
    roots.push(q / a);
    roots.push(c0 / q);
    roots.sort();
    roots
}

/// Solve `a·x³ + b·x² + c·x + d = 0` with Cardano's formula.
pub fn solve_cubic<T: Float>(a: T, b: T, c0: T, d: T) -> Roots<T> {
    if a.abs() < eps() {
        return solve_quadratic(b, c0, d);
    }

    // Normalize: x³ + p·x² + q·x + r = 0
    let p = b / a;
    let q = c0 / a;
    let r = d / a;

    // Depressed cubic via x = t - p/3: t³ + aa·t + bb = 0
    let p2 = p * p;
    let aa = q - p2 / c(3.0);
    let bb = r - p * q / c(3.0) + c::<T>(2.0) * p2 * p / c(27.0);

    let delta = bb * bb / c(4.0) + aa * aa * aa / c(27.0);
    let shift = p / c(3.0);
    let tiny = eps::<T>();

    let mut roots = Roots::none();
    if delta > tiny {
        // One real root.
        let sqrt_delta = delta.sqrt();
        let u = (-bb / c(2.0) + sqrt_delta).cbrt();
        let v = (-bb / c(2.0) - sqrt_delta).cbrt();
        roots.push(u + v - shift);
    } else if delta.abs() <= tiny {
        if aa.abs() < tiny && bb.abs() < tiny {
            // Triple root.
            roots.push(-shift);
        } else {
            // Double root.
            let u = (-bb / c(2.0)).cbrt();
            roots.push(c::<T>(2.0) * u - shift);
            roots.push(-u - shift);
        }
    } else {
        // Three real roots (Vieta's trigonometric solution).
        let m = c::<T>(2.0) * (-aa / c(3.0)).sqrt();
        let arg = (c::<T>(3.0) * bb / (aa * m)).max(-T::one()).min(T::one());
        let theta = arg.acos() / c(3.0);
        let third = c::<T>(2.0 * std::f64::consts::PI / 3.0);
        roots.push(m * theta.cos() - shift);
        roots.push(m * (theta - third).cos() - shift);
        roots.push(m * (theta + third).cos() - shift);
    }
    roots.sort();
    roots
}

/// Solve `a·x⁴ + b·x³ + c·x² + d·x + e = 0` with Ferrari's method.
///
/// Each root is polished with a few Newton steps on the original
/// polynomial, which matters most for the single-precision path.
pub fn solve_quartic<T: Float>(a: T, b: T, c0: T, d: T, e: T) -> Roots<T> {
    if a.abs() < eps() {
        return solve_cubic(b, c0, d, e);
    }

    // Normalize: x⁴ + p·x³ + q·x² + r·x + s = 0
    let p = b / a;
    let q = c0 / a;
    let r = d / a;
    let s = e / a;

    // Depressed quartic via x = y - p/4: y⁴ + a2·y² + a1·y + a0 = 0
    let p2 = p * p;
    let p3 = p2 * p;
    let p4 = p2 * p2;
    let a2 = q - c::<T>(3.0) * p2 / c(8.0);
    let a1 = r - p * q / c(2.0) + p3 / c(8.0);
    let a0 = s - p * r / c(4.0) + p2 * q / c(16.0) - c::<T>(3.0) * p4 / c(256.0);
    let shift = p / c(4.0);
    let tiny = eps::<T>();

    // Resolvent cubic: 8u³ + 8·a2·u² + (2·a2² - 8·a0)·u - a1² = 0
    let resolvent = solve_cubic(
        c(8.0),
        c::<T>(8.0) * a2,
        c::<T>(2.0) * a2 * a2 - c::<T>(8.0) * a0,
        -a1 * a1,
    );
    let u = resolvent
        .as_slice()
        .iter()
        .copied()
        .filter(|&u| u > tiny)
        .fold(T::zero(), T::max);

    let sqrt_2u = (c::<T>(2.0) * u).max(T::zero()).sqrt();

    let mut roots = Roots::none();
    if sqrt_2u > tiny {
        let alpha = a2 + c::<T>(2.0) * u;
        let beta = a1 / sqrt_2u;

        // y² + √(2u)·y + (α + β)/2 = 0
        let disc1 = sqrt_2u * sqrt_2u - c::<T>(2.0) * (alpha + beta);
        if disc1 >= T::zero() {
            let sd = disc1.sqrt();
            roots.push((-sqrt_2u + sd) / c(2.0) - shift);
            roots.push((-sqrt_2u - sd) / c(2.0) - shift);
        }

        // y² - √(2u)·y + (α - β)/2 = 0
        let disc2 = sqrt_2u * sqrt_2u - c::<T>(2.0) * (alpha - beta);
        if disc2 >= T::zero() {
            let sd = disc2.sqrt();
            roots.push((sqrt_2u + sd) / c(2.0) - shift);
            roots.push((sqrt_2u - sd) / c(2.0) - shift);
        }
    } else {
        // Biquadratic: y⁴ + a2·y² + a0 = 0
        let disc = a2 * a2 - c::<T>(4.0) * a0;
        if disc >= T::zero() {
            let sd = disc.sqrt();
            for y2 in [(-a2 + sd) / c(2.0), (-a2 - sd) / c(2.0)] {
                if y2 >= T::zero() {
                    let y = y2.sqrt();
                    roots.push(y - shift);
                    roots.push(-y - shift);
                }
            }
        }
    }

    let mut polished = Roots::none();
    for &x in roots.as_slice() {
        polished.push(polish_quartic(x, p, q, r, s));
    }
    polished.sort();
    polished.dedup(tiny);
    polished
}

fn polish_quartic<T: Float>(mut x: T, p: T, q: T, r: T, s: T) -> T {
    for _ in 0..3 {
        let f = (((x + p) * x + q) * x + r) * x + s;
        let df = ((c::<T>(4.0) * x + c::<T>(3.0) * p) * x + c::<T>(2.0) * q) * x + r;
        if df == T::zero() {
            break;
        }
        let next = x - f / df;
        if !next.is_finite() {
            break;
        }
        x = next;
    }
    x
}
