//! Model parameters: canonical ordering, absolute bounds and validation.
//!
//! Every vector exchanged with the optimizer, the engine or a parameter file
//! follows the order of [`Param::ALL`].

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::processes::State;

/// Number of model parameters (5 initial states and 18 process constants).
pub const N_PARAMS: usize = 23;

/// The named parameters of the model, in canonical order.
///
/// The discriminant is the parameter's index in every dense vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Param {
    /// Initial snow depth [L].
    SnwDth = 0,
    /// Air temperature at or below which precipitation falls as snow [K].
    SnwAst = 1,
    /// Air temperature above which the snowpack melts [K].
    SnwAmt = 2,
    /// Air melt factor [L/TK].
    SnwAmf = 3,
    /// Precipitation melt factor [L/LTK].
    SnwPmf = 4,
    /// Initial soil layer 0 moisture [L].
    Sl0Mse = 5,
    /// Initial soil layer 1 moisture [L].
    Sl1Mse = 6,
    /// Soil layer 0 field capacity [L].
    Sl0Fcy = 7,
    /// Soil layer 0 runoff exponent [-].
    Sl0Bt0 = 8,
    /// Soil layer 1 permanent wilting point [L].
    Sl1Pwp = 9,
    /// Soil layer 1 field capacity [L].
    Sl1Fcy = 10,
    /// Soil layer 1 transfer exponent [-].
    Sl1Bt0 = 11,
    /// Initial upper reservoir depth [L].
    UrrDth = 12,
    /// Initial lower reservoir depth [L].
    LrrDth = 13,
    /// Share of soil runoff entering the upper reservoir after percolation [-].
    UrrRsr = 14,
    /// Upper reservoir overflow threshold depth [L].
    UrrTdh = 15,
    /// Upper reservoir overflow rate [1/T].
    UrrTdr = 16,
    /// Upper reservoir outlet rate [1/T].
    UrrCst = 17,
    /// Surface share of the upper reservoir outlet [-].
    UrrDro = 18,
    /// Upper-to-lower reservoir percolation rate [1/T].
    UrrUlc = 19,
    /// Lower reservoir depth at which percolation stops [L].
    LrrTdh = 20,
    /// Lower reservoir outlet rate [1/T].
    LrrCst = 21,
    /// Surface share of the lower reservoir outlet [-].
    LrrDro = 22,
}

impl Param {
    /// All parameters in canonical order.
    pub const ALL: [Param; N_PARAMS] = [
        Self::SnwDth,
        Self::SnwAst,
        Self::SnwAmt,
        Self::SnwAmf,
        Self::SnwPmf,
        Self::Sl0Mse,
        Self::Sl1Mse,
        Self::Sl0Fcy,
        Self::Sl0Bt0,
        Self::Sl1Pwp,
        Self::Sl1Fcy,
        Self::Sl1Bt0,
        Self::UrrDth,
        Self::LrrDth,
        Self::UrrRsr,
        Self::UrrTdh,
        Self::UrrTdr,
        Self::UrrCst,
        Self::UrrDro,
        Self::UrrUlc,
        Self::LrrTdh,
        Self::LrrCst,
        Self::LrrDro,
    ];

    /// Returns the zero-based canonical index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the parameter label used in bounds mappings and result files.
    pub fn name(self) -> &'static str {
        match self {
            Self::SnwDth => "snw_dth",
            Self::SnwAst => "snw_ast",
            Self::SnwAmt => "snw_amt",
            Self::SnwAmf => "snw_amf",
            Self::SnwPmf => "snw_pmf",
            Self::Sl0Mse => "sl0_mse",
            Self::Sl1Mse => "sl1_mse",
            Self::Sl0Fcy => "sl0_fcy",
            Self::Sl0Bt0 => "sl0_bt0",
            Self::Sl1Pwp => "sl1_pwp",
            Self::Sl1Fcy => "sl1_fcy",
            Self::Sl1Bt0 => "sl1_bt0",
            Self::UrrDth => "urr_dth",
            Self::LrrDth => "lrr_dth",
            Self::UrrRsr => "urr_rsr",
            Self::UrrTdh => "urr_tdh",
            Self::UrrTdr => "urr_tdr",
            Self::UrrCst => "urr_cst",
            Self::UrrDro => "urr_dro",
            Self::UrrUlc => "urr_ulc",
            Self::LrrTdh => "lrr_tdh",
            Self::LrrCst => "lrr_cst",
            Self::LrrDro => "lrr_dro",
        }
    }

    /// Looks up a parameter by its label.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Returns the absolute `(lower, upper)` bound of this parameter.
    pub fn absolute_bounds(self) -> (f64, f64) {
        match self {
            Self::SnwAst | Self::SnwAmt => (f64::NEG_INFINITY, f64::INFINITY),
            Self::UrrRsr
            | Self::UrrTdr
            | Self::UrrCst
            | Self::UrrDro
            | Self::UrrUlc
            | Self::LrrCst
            | Self::LrrDro => (0.0, 1.0),
            _ => (0.0, f64::INFINITY),
        }
    }

    /// Returns `true` for the five parameters that only seed the state at `t = 0`.
    pub fn is_initial_state(self) -> bool {
        matches!(
            self,
            Self::SnwDth | Self::Sl0Mse | Self::Sl1Mse | Self::UrrDth | Self::LrrDth
        )
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed parameter space of the model.
///
/// Stateless; groups the bound and vector checks shared by the engine, the
/// calibrator and the parameter file reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterSpace;

impl ParameterSpace {
    /// Parameter labels in canonical order.
    pub fn labels() -> [&'static str; N_PARAMS] {
        Param::ALL.map(Param::name)
    }

    /// Absolute `(lower, upper)` bounds in canonical order.
    pub fn absolute_bounds() -> [(f64, f64); N_PARAMS] {
        Param::ALL.map(Param::absolute_bounds)
    }

    /// Maps user calibration bounds into a dense array in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] naming the offending parameter if
    /// a name is unknown or missing, a pair is not ordered, or a pair leaves
    /// the parameter's absolute bound.
    pub fn order_bounds(
        user_bounds: &BTreeMap<String, (f64, f64)>,
    ) -> Result<Vec<(f64, f64)>, ModelError> {
        if let Some(unknown) = user_bounds.keys().find(|k| Param::from_name(k).is_none()) {
            return Err(ModelError::configuration(
                unknown.as_str(),
                "not a model parameter",
            ));
        }

        let mut ordered = Vec::with_capacity(N_PARAMS);
        for param in Param::ALL {
            let &(lower, upper) = user_bounds
                .get(param.name())
                .ok_or_else(|| ModelError::configuration(param.name(), "bounds missing"))?;

            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(ModelError::configuration(
                    param.name(),
                    format!("lower bound {lower} exceeds upper bound {upper}"),
                ));
            }

            let (abs_lower, abs_upper) = param.absolute_bounds();
            if lower < abs_lower || upper > abs_upper {
                return Err(ModelError::configuration(
                    param.name(),
                    format!(
                        "bounds [{lower}, {upper}] outside absolute range [{abs_lower}, {abs_upper}]"
                    ),
                ));
            }
            ordered.push((lower, upper));
        }
        Ok(ordered)
    }

    /// Checks a dense parameter vector against length, finiteness and
    /// absolute bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] naming the vector on a wrong
    /// length, or naming the parameter for a non-finite or out-of-range
    /// component.
    pub fn validate_vector(values: &[f64]) -> Result<(), ModelError> {
        if values.len() != N_PARAMS {
            return Err(ModelError::configuration(
                "parameter vector",
                format!("expected {N_PARAMS} values, got {}", values.len()),
            ));
        }
        for (param, &value) in Param::ALL.iter().zip(values) {
            if !value.is_finite() {
                return Err(ModelError::configuration(
                    param.name(),
                    format!("value must be finite, got {value}"),
                ));
            }
            let (lower, upper) = param.absolute_bounds();
            if value < lower || value > upper {
                return Err(ModelError::configuration(
                    param.name(),
                    format!("value {value} outside absolute range [{lower}, {upper}]"),
                ));
            }
        }
        Ok(())
    }

    /// Calibration bounds for a daily lumped catchment.
    ///
    /// A reasonable starting range for mid-latitude catchments with
    /// precipitation in mm; narrow it where prior knowledge exists.
    pub fn default_calibration_bounds() -> BTreeMap<String, (f64, f64)> {
        let bounds: [(Param, (f64, f64)); N_PARAMS] = [
            (Param::SnwDth, (0.0, 1e2)),
            (Param::SnwAst, (-1.0, 1.0)),
            (Param::SnwAmt, (0.0, 2.0)),
            (Param::SnwAmf, (0.0, 2.0)),
            (Param::SnwPmf, (0.0, 2.0)),
            (Param::Sl0Mse, (0.0, 1e2)),
            (Param::Sl1Mse, (0.0, 2e2)),
            (Param::Sl0Fcy, (0.0, 2e2)),
            (Param::Sl0Bt0, (0.0, 3.0)),
            (Param::Sl1Pwp, (0.0, 4e2)),
            (Param::Sl1Fcy, (0.0, 4e2)),
            (Param::Sl1Bt0, (0.0, 4.0)),
            (Param::UrrDth, (0.0, 2e1)),
            (Param::LrrDth, (0.0, 5.0)),
            (Param::UrrRsr, (0.0, 1.0)),
            (Param::UrrTdh, (0.0, 1e2)),
            (Param::UrrTdr, (0.0, 1.0)),
            (Param::UrrCst, (0.0, 1.0)),
            (Param::UrrDro, (0.0, 1.0)),
            (Param::UrrUlc, (0.0, 1.0)),
            (Param::LrrTdh, (0.0, 1e4)),
            (Param::LrrCst, (0.0, 1.0)),
            (Param::LrrDro, (0.0, 1.0)),
        ];
        bounds
            .into_iter()
            .map(|(p, b)| (p.name().to_string(), b))
            .collect()
    }
}

/// A validated parameter vector with named access.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    values: [f64; N_PARAMS],
}

impl Parameters {
    /// Builds a parameter set from a dense vector in canonical order.
    ///
    /// # Errors
    ///
    /// See [`ParameterSpace::validate_vector`].
    pub fn from_slice(values: &[f64]) -> Result<Self, ModelError> {
        ParameterSpace::validate_vector(values)?;
        let mut out = [0.0; N_PARAMS];
        out.copy_from_slice(values);
        Ok(Self { values: out })
    }

    /// Builds a parameter set from a name-to-value mapping covering every
    /// parameter exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] for an unknown or missing name,
    /// then validates as [`Parameters::from_slice`].
    pub fn from_named(named: &BTreeMap<String, f64>) -> Result<Self, ModelError> {
        if let Some(unknown) = named.keys().find(|k| Param::from_name(k).is_none()) {
            return Err(ModelError::configuration(
                unknown.as_str(),
                "not a model parameter",
            ));
        }
        let mut values = [0.0; N_PARAMS];
        for param in Param::ALL {
            values[param.index()] = *named
                .get(param.name())
                .ok_or_else(|| ModelError::configuration(param.name(), "value missing"))?;
        }
        Self::from_slice(&values)
    }

    /// Returns the value of a single parameter.
    pub fn get(&self, param: Param) -> f64 {
        self.values[param.index()]
    }

    /// Returns the dense vector in canonical order.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Returns `(label, value)` pairs in canonical order.
    pub fn labelled(&self) -> Vec<(&'static str, f64)> {
        Param::ALL
            .iter()
            .map(|&p| (p.name(), self.get(p)))
            .collect()
    }

    /// Model state at `t = 0`, taken from the five initial-value parameters.
    pub fn initial_state(&self) -> State {
        State {
            snow_depth: self.get(Param::SnwDth),
            sl0_moisture: self.get(Param::Sl0Mse),
            sl1_moisture: self.get(Param::Sl1Mse),
            urr_depth: self.get(Param::UrrDth),
            lrr_depth: self.get(Param::LrrDth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_bounds() -> BTreeMap<String, (f64, f64)> {
        ParameterSpace::default_calibration_bounds()
    }

    #[test]
    fn names_round_trip() {
        for p in Param::ALL {
            assert_eq!(Param::from_name(p.name()), Some(p));
        }
        assert_eq!(Param::from_name("snw_xyz"), None);
    }

    #[test]
    fn index_matches_position() {
        for (i, p) in Param::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn five_initial_states() {
        let n = Param::ALL.iter().filter(|p| p.is_initial_state()).count();
        assert_eq!(n, 5);
    }

    #[test]
    fn absolute_bounds_shapes() {
        let abs = ParameterSpace::absolute_bounds();
        assert_eq!(abs[Param::SnwAst.index()], (f64::NEG_INFINITY, f64::INFINITY));
        assert_eq!(abs[Param::UrrCst.index()], (0.0, 1.0));
        assert_eq!(abs[Param::Sl0Fcy.index()], (0.0, f64::INFINITY));
    }

    #[test]
    fn order_bounds_follows_canonical_order() {
        let ordered = ParameterSpace::order_bounds(&full_bounds()).unwrap();
        assert_eq!(ordered.len(), N_PARAMS);
        assert_eq!(ordered[Param::SnwAst.index()], (-1.0, 1.0));
        assert_eq!(ordered[Param::LrrTdh.index()], (0.0, 1e4));
    }

    #[test]
    fn order_bounds_rejects_unknown_name() {
        let mut b = full_bounds();
        b.insert("foo_bar".to_string(), (0.0, 1.0));
        let err = ParameterSpace::order_bounds(&b).unwrap_err();
        assert!(matches!(err, ModelError::Configuration { ref name, .. } if name == "foo_bar"));
    }

    #[test]
    fn order_bounds_rejects_outside_absolute() {
        let mut b = full_bounds();
        b.insert("urr_cst".to_string(), (0.0, 1.5));
        let err = ParameterSpace::order_bounds(&b).unwrap_err();
        assert!(matches!(err, ModelError::Configuration { ref name, .. } if name == "urr_cst"));
    }

    #[test]
    fn order_bounds_rejects_nan() {
        let mut b = full_bounds();
        b.insert("sl0_bt0".to_string(), (f64::NAN, 1.0));
        assert!(ParameterSpace::order_bounds(&b).is_err());
    }

    #[test]
    fn validate_vector_wrong_length() {
        let err = ParameterSpace::validate_vector(&[0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            ModelError::Configuration {
                name: "parameter vector".to_string(),
                reason: "expected 23 values, got 3".to_string(),
            }
        );
    }

    #[test]
    fn validate_vector_names_offender() {
        let mut v = [0.5; N_PARAMS];
        v[Param::LrrDro.index()] = 2.0;
        let err = ParameterSpace::validate_vector(&v).unwrap_err();
        assert!(err.to_string().contains("lrr_dro"));
    }

    #[test]
    fn validate_vector_rejects_infinite() {
        let mut v = [0.5; N_PARAMS];
        v[Param::SnwAst.index()] = f64::INFINITY;
        assert!(ParameterSpace::validate_vector(&v).is_err());
    }

    #[test]
    fn parameters_from_named() {
        let named: BTreeMap<String, f64> = Param::ALL
            .iter()
            .map(|p| (p.name().to_string(), p.index() as f64 / 100.0))
            .collect();
        let params = Parameters::from_named(&named).unwrap();
        assert_eq!(params.get(Param::UrrDro), 0.18);
        assert_eq!(params.labelled()[0], ("snw_dth", 0.0));
    }

    #[test]
    fn initial_state_from_parameters() {
        let mut v = [0.5; N_PARAMS];
        v[Param::SnwDth.index()] = 3.0;
        v[Param::LrrDth.index()] = 7.0;
        let state = Parameters::from_slice(&v).unwrap().initial_state();
        assert_eq!(state.snow_depth, 3.0);
        assert_eq!(state.lrr_depth, 7.0);
        assert_eq!(state.sl0_moisture, 0.5);
    }
}
