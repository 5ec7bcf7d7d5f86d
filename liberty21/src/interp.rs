//!
//! # Table Interpolation
//!
//! Evaluation of characterized [Lut]s at arbitrary operating points.
//! Between indices, values are interpolated (multi-)linearly.
//! Beyond the first or last index, the nearest segment is extended linearly.
//!

// Local Imports
use crate::data::*;

impl Lut {
    /// Evaluate the table at `(x1, x2)`.
    ///
    /// Scalar tables ignore both arguments, and single-axis tables ignore `x2`.
    /// Returns `None` for tables of more than two axes, or with inconsistent values.
    pub fn value(&self, x1: LibDecimal, x2: LibDecimal) -> Option<LibDecimal> {
        match self.num_axes() {
            0 => self.lookup(&[]),
            1 => self.lookup(&[x1]),
            2 => self.lookup(&[x1, x2]),
            _ => None,
        }
    }
    /// Evaluate the table at point `xs`, one coordinate per axis
    pub fn lookup(&self, xs: &[LibDecimal]) -> Option<LibDecimal> {
        if xs.len() != self.num_axes() || !self.is_consistent() || self.values.is_empty() {
            return None;
        }
        interpolate(&self.indices, &self.values, xs)
    }
}

/// Recursive multilinear interpolation, outermost axis first
fn interpolate(indices: &[Vec<LibDecimal>], values: &[LibDecimal], xs: &[LibDecimal]) -> Option<LibDecimal> {
    let (axis, rest) = match indices.split_first() {
        None => return values.first().copied(),
        Some(x) => x,
    };
    let stride = values.len() / axis.len();
    let sub = |i: usize| interpolate(rest, &values[i * stride..(i + 1) * stride], &xs[1..]);
    if axis.len() == 1 {
        return sub(0);
    }
    let x = xs[0];
    // Segment `[i, i+1]` containing `x`, or the nearest one
    let i = axis[1..axis.len() - 1]
        .iter()
        .position(|idx| x < *idx)
        .unwrap_or(axis.len() - 2);
    let (x0, x1) = (axis[i], axis[i + 1]);
    let (v0, v1) = (sub(i)?, sub(i + 1)?);
    if x1 == x0 {
        return Some(v0);
    }
    let slope = v1.checked_sub(v0)?.checked_div(x1.checked_sub(x0)?)?;
    let rv = v0.checked_add(slope.checked_mul(x.checked_sub(x0)?)?)?;
    Some(rv.normalize())
}

/// Assign operating-point values to each axis of `lut`, by axis variable
fn axis_inputs(lut: &Lut, assign: impl Fn(LutVar) -> Option<LibDecimal>) -> Option<Vec<LibDecimal>> {
    if lut.variables.len() < lut.num_axes() {
        return None;
    }
    lut.variables[..lut.num_axes()].iter().map(|v| assign(*v)).collect()
}

impl Timing {
    /// Cell delay for output transition `out_tran`, at input slew `slew` and output load `load`
    pub fn delay(&self, out_tran: Tran, slew: LibDecimal, load: LibDecimal) -> Option<LibDecimal> {
        self.eval_output(ArcKind::Delay, out_tran, slew, load)
    }
    /// Output slew for output transition `out_tran`, at input slew `slew` and output load `load`
    pub fn slew(&self, out_tran: Tran, slew: LibDecimal, load: LibDecimal) -> Option<LibDecimal> {
        self.eval_output(ArcKind::Slew, out_tran, slew, load)
    }
    /// Constraint (setup, hold, and the like) for transition `tran` of the constrained pin
    pub fn constraint(
        &self,
        tran: Tran,
        related_slew: LibDecimal,
        constrained_slew: LibDecimal,
    ) -> Option<LibDecimal> {
        let lut = self.lut(LutKey::new(self.split, tran, ArcKind::Constraint))?;
        let xs = axis_inputs(lut, |var| match var {
            LutVar::RelatedPinTransition => Some(related_slew),
            LutVar::ConstrainedPinTransition => Some(constrained_slew),
            _ => None,
        })?;
        lut.lookup(&xs)
    }
    fn eval_output(&self, kind: ArcKind, tran: Tran, slew: LibDecimal, load: LibDecimal) -> Option<LibDecimal> {
        let lut = self.lut(LutKey::new(self.split, tran, kind))?;
        let xs = axis_inputs(lut, |var| match var {
            LutVar::InputNetTransition | LutVar::InputTransitionTime => Some(slew),
            LutVar::TotalOutputNetCapacitance => Some(load),
            _ => None,
        })?;
        lut.lookup(&xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(x: i64) -> LibDecimal {
        LibDecimal::from(x)
    }
    fn lut2(i1: &[i64], i2: &[i64], f: impl Fn(i64, i64) -> i64) -> Lut {
        let mut values = Vec::new();
        for a in i1 {
            for b in i2 {
                values.push(d(f(*a, *b)));
            }
        }
        Lut {
            template: "t".into(),
            variables: vec![LutVar::InputNetTransition, LutVar::TotalOutputNetCapacitance],
            indices: vec![i1.iter().map(|x| d(*x)).collect(), i2.iter().map(|x| d(*x)).collect()],
            values,
        }
    }

    #[test]
    fn it_evaluates_scalars() {
        let lut = Lut::scalar(d(7));
        assert_eq!(lut.value(d(100), d(-3)), Some(d(7)));
    }
    #[test]
    fn it_interpolates_planes() {
        // Planes are reproduced exactly, in range and out
        let lut = lut2(&[0, 2, 4, 8], &[1, 3, 9], |a, b| 3 * a + 2 * b + 1);
        for x1 in [-4, 0, 1, 3, 5, 8, 12] {
            for x2 in [-1, 1, 2, 6, 9, 20] {
                let want = d(3 * x1 + 2 * x2 + 1);
                assert_eq!(lut.value(d(x1), d(x2)), Some(want), "({}, {})", x1, x2);
            }
        }
    }
    #[test]
    fn it_holds_unit_axes_constant() {
        let lut = lut2(&[5], &[0, 10], |_, b| b);
        assert_eq!(lut.value(d(-100), d(5)), Some(d(5)));
        assert_eq!(lut.value(d(100), d(20)), Some(d(20)));
    }
    #[test]
    fn it_rejects_inconsistent_tables() {
        let mut lut = lut2(&[0, 1], &[0, 1], |a, b| a + b);
        lut.values.pop();
        assert_eq!(lut.value(d(0), d(0)), None);
    }
    #[test]
    fn it_maps_timing_axes() {
        let mut timing = Timing::new("A", Split::Late);
        // Capacitance first, transition second
        let mut lut = lut2(&[0, 10], &[0, 10], |a, b| a + 2 * b);
        lut.variables = vec![LutVar::TotalOutputNetCapacitance, LutVar::InputNetTransition];
        timing.set_lut(Tran::Rise, ArcKind::Delay, lut);
        // slew = 3, load = 5 => 5 + 2 * 3
        assert_eq!(timing.delay(Tran::Rise, d(3), d(5)), Some(d(11)));
        assert_eq!(timing.delay(Tran::Fall, d(3), d(5)), None);
        assert_eq!(timing.slew(Tran::Rise, d(3), d(5)), None);

        let mut lut = lut2(&[0, 10], &[0, 10], |a, b| a - b);
        lut.variables = vec![LutVar::RelatedPinTransition, LutVar::ConstrainedPinTransition];
        timing.set_lut(Tran::Fall, ArcKind::Constraint, lut);
        assert_eq!(timing.constraint(Tran::Fall, d(4), d(1)), Some(d(3)));
    }
}
