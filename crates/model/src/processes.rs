//! Snow, soil and routing process functions for one time step.
//!
//! Each routine is a pure function of the previous storages, the step's
//! forcing and the fixed parameters. [`step`] chains them and returns the new
//! state together with every flux written to the output table.

use crate::outputs::{N_OUTPUTS, OutputColumn};
use crate::params::{Param, Parameters};

/// The five water stores carried from one step to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct State {
    /// Snow depth [L].
    pub snow_depth: f64,
    /// Soil layer 0 moisture [L].
    pub sl0_moisture: f64,
    /// Soil layer 1 moisture [L].
    pub sl1_moisture: f64,
    /// Upper reservoir depth [L].
    pub urr_depth: f64,
    /// Lower reservoir depth [L].
    pub lrr_depth: f64,
}

impl State {
    /// Total water held in all stores.
    pub fn total_storage(&self) -> f64 {
        self.snow_depth + self.sl0_moisture + self.sl1_moisture + self.urr_depth + self.lrr_depth
    }
}

/// Snow routine result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowFluxes {
    /// Snow depth after accumulation and melt.
    pub depth: f64,
    /// Precipitation passed on as liquid water.
    pub liquid_precip: f64,
    /// Air-temperature-induced melt.
    pub air_melt: f64,
    /// Precipitation-induced melt.
    pub precip_melt: f64,
}

impl SnowFluxes {
    /// Air plus precipitation melt.
    pub fn total_melt(&self) -> f64 {
        self.air_melt + self.precip_melt
    }
}

/// Snow accumulation and melt.
///
/// An existing snowpack above the melt temperature melts by the air melt
/// factor; rain on the pack passes through as liquid and adds melt in
/// proportion to its depth. Without a melting pack, precipitation at or
/// below the snow temperature accumulates and above it falls as rain.
pub fn snow(depth: f64, tem: f64, ppt: f64, p: &Parameters) -> SnowFluxes {
    let ast = p.get(Param::SnwAst);
    let amt = p.get(Param::SnwAmt);

    let mut out = SnowFluxes {
        depth,
        liquid_precip: 0.0,
        air_melt: 0.0,
        precip_melt: 0.0,
    };

    if depth > 0.0 && tem > amt {
        let aim = ((tem - amt) * p.get(Param::SnwAmf)).min(out.depth);
        if aim > 0.0 {
            out.depth -= aim;
            out.air_melt = aim;
        }

        if ppt > 0.0 {
            out.liquid_precip = ppt;

            let pmf = p.get(Param::SnwPmf);
            if pmf > 0.0 && out.depth > 0.0 {
                let pim = ((tem - amt) * pmf * ppt).min(out.depth);
                if pim > 0.0 {
                    out.depth -= pim;
                    out.precip_melt = pim;
                }
            }
        }
    } else if ppt > 0.0 {
        if tem <= ast {
            out.depth += ppt;
        } else {
            out.liquid_precip = ppt;
        }
    }
    out
}

/// Soil routine result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilFluxes {
    /// Layer 0 moisture after infiltration and transfer.
    pub sl0_moisture: f64,
    /// Layer 1 moisture after evapotranspiration and transfer.
    pub sl1_moisture: f64,
    /// Water arriving at layer 0 (liquid precipitation plus melt).
    pub potential_runoff: f64,
    /// Water that did not infiltrate layer 0.
    pub actual_runoff: f64,
    /// Evapotranspiration drawn from layer 1.
    pub evapotranspiration: f64,
}

/// Two-layer soil moisture accounting.
///
/// Layer 0 partitions incoming water into infiltration and runoff, layer 1
/// supplies evapotranspiration, and moisture moves from layer 0 into layer 1
/// along a power-law saturation curve.
pub fn soil(sl0: f64, sl1: f64, inflow: f64, pet: f64, p: &Parameters) -> SoilFluxes {
    let sl0_fcy = p.get(Param::Sl0Fcy);
    let sl1_pwp = p.get(Param::Sl1Pwp);
    let sl1_fcy = p.get(Param::Sl1Fcy);

    let mut sl0 = sl0;
    let mut sl1 = sl1;
    let mut actual_runoff = 0.0;

    if inflow > 0.0 {
        let runoff_ratio = if sl0_fcy > 0.0 {
            (sl0 / sl0_fcy).powf(p.get(Param::Sl0Bt0)).min(1.0)
        } else {
            1.0
        };
        let infiltration = (inflow * (1.0 - runoff_ratio)).min(sl0_fcy - sl0).max(0.0);
        sl0 += infiltration;
        actual_runoff = inflow - infiltration;
    }

    let et_ratio = if sl1_pwp > 0.0 {
        (sl1 / sl1_pwp).min(1.0)
    } else {
        1.0
    };
    let evapotranspiration = (et_ratio * pet).min(sl1);
    sl1 -= evapotranspiration;

    if sl0 > 0.0 && sl1 < sl1_fcy {
        let transfer = (sl0 * (1.0 - sl1 / sl1_fcy).powf(p.get(Param::Sl1Bt0))).min(sl1_fcy - sl1);
        sl0 -= transfer;
        sl1 += transfer;
    }

    SoilFluxes {
        sl0_moisture: sl0,
        sl1_moisture: sl1,
        potential_runoff: inflow,
        actual_runoff,
        evapotranspiration,
    }
}

/// Routing routine result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingFluxes {
    /// Upper reservoir depth at the end of the step.
    pub urr_depth: f64,
    /// Lower reservoir depth at the end of the step.
    pub lrr_depth: f64,
    /// Upper reservoir constant-rate outlet.
    pub urr_runoff: f64,
    /// Percolation from the upper to the lower reservoir.
    pub percolation: f64,
    /// Lower reservoir outlet.
    pub lrr_runoff: f64,
    /// Surface runoff leaving the catchment.
    pub surface_runoff: f64,
    /// Groundwater runoff leaving the catchment.
    pub ground_runoff: f64,
}

/// Upper and lower reservoir routing.
///
/// The upper reservoir takes the `1 - urr_rsr` share of soil runoff, spills
/// above `urr_tdh` into surface runoff, drains through a constant-rate
/// outlet split by `urr_dro`, and percolates into the lower reservoir at a
/// rate that falls linearly to zero as the lower reservoir reaches
/// `lrr_tdh`. The remaining `urr_rsr` share is added after percolation.
pub fn routing(urr: f64, lrr: f64, soil_runoff: f64, p: &Parameters) -> RoutingFluxes {
    let rsr = p.get(Param::UrrRsr);
    let tdh = p.get(Param::UrrTdh);
    let dro = p.get(Param::UrrDro);
    let lrr_tdh = p.get(Param::LrrTdh);
    let lrr_dro = p.get(Param::LrrDro);

    let mut urr = urr + soil_runoff * (1.0 - rsr);
    let mut lrr = lrr;
    let mut surface = 0.0;
    let mut ground = 0.0;

    if urr > tdh {
        let overflow = (urr - tdh) * p.get(Param::UrrTdr);
        surface += overflow;
        urr -= overflow;
    }

    let urr_runoff = urr * p.get(Param::UrrCst);
    urr -= urr_runoff;
    surface += urr_runoff * dro;
    ground += urr_runoff * (1.0 - dro);

    let percolation = if lrr < lrr_tdh {
        urr * p.get(Param::UrrUlc) * (1.0 - lrr / lrr_tdh)
    } else {
        0.0
    };
    urr -= percolation;

    let lrr_runoff = lrr * p.get(Param::LrrCst);
    lrr -= lrr_runoff;
    lrr += percolation;
    surface += lrr_runoff * lrr_dro;
    ground += lrr_runoff * (1.0 - lrr_dro);

    urr += soil_runoff * rsr;

    RoutingFluxes {
        urr_depth: urr,
        lrr_depth: lrr,
        urr_runoff,
        percolation,
        lrr_runoff,
        surface_runoff: surface,
        ground_runoff: ground,
    }
}

/// All fluxes of one time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepFluxes {
    /// Snow routine.
    pub snow: SnowFluxes,
    /// Soil routine.
    pub soil: SoilFluxes,
    /// Routing routine.
    pub routing: RoutingFluxes,
}

impl StepFluxes {
    /// Output row for this step with the given mass balance residual.
    pub fn to_row(&self, mass_balance: f64) -> [f64; N_OUTPUTS] {
        let mut row = [0.0; N_OUTPUTS];
        let mut put = |col: OutputColumn, v: f64| row[col.index()] = v;

        put(OutputColumn::SnwDth, self.snow.depth);
        put(OutputColumn::SnwLpt, self.snow.liquid_precip);
        put(OutputColumn::SnwAim, self.snow.air_melt);
        put(OutputColumn::SnwPim, self.snow.precip_melt);
        put(OutputColumn::SnwMlt, self.snow.total_melt());
        put(OutputColumn::Sl0Mse, self.soil.sl0_moisture);
        put(OutputColumn::Sl1Mse, self.soil.sl1_moisture);
        put(OutputColumn::Sl0Prf, self.soil.potential_runoff);
        put(OutputColumn::Sl0Arf, self.soil.actual_runoff);
        put(OutputColumn::Sl1Etn, self.soil.evapotranspiration);
        put(OutputColumn::UrrDth, self.routing.urr_depth);
        put(OutputColumn::LrrDth, self.routing.lrr_depth);
        put(OutputColumn::UrrRnf, self.routing.urr_runoff);
        put(OutputColumn::UrrPln, self.routing.percolation);
        put(OutputColumn::LrrRnf, self.routing.lrr_runoff);
        put(OutputColumn::RnfSfc, self.routing.surface_runoff);
        put(OutputColumn::RnfGnd, self.routing.ground_runoff);
        put(OutputColumn::ModBal, mass_balance);
        row
    }
}

/// Advances the model by one time step.
pub fn step(prev: &State, tem: f64, ppt: f64, pet: f64, p: &Parameters) -> (State, StepFluxes) {
    let snow = snow(prev.snow_depth, tem, ppt, p);
    let soil = soil(
        prev.sl0_moisture,
        prev.sl1_moisture,
        snow.liquid_precip + snow.total_melt(),
        pet,
        p,
    );
    let routing = routing(prev.urr_depth, prev.lrr_depth, soil.actual_runoff, p);

    let next = State {
        snow_depth: snow.depth,
        sl0_moisture: soil.sl0_moisture,
        sl1_moisture: soil.sl1_moisture,
        urr_depth: routing.urr_depth,
        lrr_depth: routing.lrr_depth,
    };
    (next, StepFluxes { snow, soil, routing })
}

/// Water balance residual of one step: precipitation minus outflows minus
/// the change in storage.
pub fn mass_balance(ppt: f64, prev: &State, next: &State, fluxes: &StepFluxes) -> f64 {
    let outflow = fluxes.soil.evapotranspiration
        + fluxes.routing.surface_runoff
        + fluxes.routing.ground_runoff;
    ppt - outflow - (next.total_storage() - prev.total_storage())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::N_PARAMS;
    use approx::assert_relative_eq;

    fn params_with(overrides: &[(Param, f64)]) -> Parameters {
        let mut v = [0.0; N_PARAMS];
        for &(p, x) in overrides {
            v[p.index()] = x;
        }
        Parameters::from_slice(&v).unwrap()
    }

    #[test]
    fn snow_accumulates_below_threshold() {
        let p = params_with(&[(Param::SnwAst, 0.0), (Param::SnwAmt, 1.0)]);
        let s = snow(0.0, -2.0, 5.0, &p);
        assert_eq!(s.depth, 5.0);
        assert_eq!(s.liquid_precip, 0.0);
    }

    #[test]
    fn rain_without_snowpack() {
        let p = params_with(&[(Param::SnwAst, 0.0), (Param::SnwAmt, 1.0)]);
        let s = snow(0.0, 3.0, 5.0, &p);
        assert_eq!(s.depth, 0.0);
        assert_eq!(s.liquid_precip, 5.0);
        assert_eq!(s.total_melt(), 0.0);
    }

    #[test]
    fn air_melt_capped_at_depth() {
        let p = params_with(&[(Param::SnwAmt, 0.0), (Param::SnwAmf, 10.0)]);
        let s = snow(2.0, 5.0, 0.0, &p);
        assert_eq!(s.air_melt, 2.0);
        assert_eq!(s.depth, 0.0);
    }

    #[test]
    fn rain_on_snow_melts() {
        let p = params_with(&[
            (Param::SnwAmt, 0.0),
            (Param::SnwAmf, 1.0),
            (Param::SnwPmf, 0.1),
        ]);
        let s = snow(10.0, 2.0, 5.0, &p);
        assert_relative_eq!(s.air_melt, 2.0);
        assert_relative_eq!(s.precip_melt, 1.0);
        assert_relative_eq!(s.depth, 7.0);
        assert_eq!(s.liquid_precip, 5.0);
    }

    #[test]
    fn dry_soil_infiltrates_everything() {
        let p = params_with(&[
            (Param::Sl0Fcy, 100.0),
            (Param::Sl0Bt0, 2.0),
            (Param::Sl1Fcy, 100.0),
        ]);
        let s = soil(0.0, 0.0, 10.0, 0.0, &p);
        assert_eq!(s.actual_runoff, 0.0);
        assert_relative_eq!(s.sl0_moisture + s.sl1_moisture, 10.0);
    }

    #[test]
    fn saturated_soil_runs_off() {
        let p = params_with(&[(Param::Sl0Fcy, 50.0), (Param::Sl0Bt0, 1.0)]);
        let s = soil(50.0, 0.0, 10.0, 0.0, &p);
        assert_eq!(s.actual_runoff, 10.0);
    }

    #[test]
    fn evapotranspiration_limited_by_wilting_point() {
        let p = params_with(&[(Param::Sl1Pwp, 100.0), (Param::Sl1Fcy, 10.0)]);
        let s = soil(0.0, 50.0, 0.0, 4.0, &p);
        assert_relative_eq!(s.evapotranspiration, 2.0);
        assert_relative_eq!(s.sl1_moisture, 48.0);
    }

    #[test]
    fn zero_capacity_does_not_produce_nan() {
        let p = params_with(&[]);
        let s = soil(0.0, 0.0, 3.0, 1.0, &p);
        assert!(s.sl0_moisture.is_finite());
        assert_eq!(s.actual_runoff, 3.0);
        assert_eq!(s.evapotranspiration, 0.0);
    }

    #[test]
    fn routing_conserves_water() {
        let p = params_with(&[
            (Param::UrrRsr, 0.3),
            (Param::UrrTdh, 5.0),
            (Param::UrrTdr, 0.5),
            (Param::UrrCst, 0.2),
            (Param::UrrDro, 0.6),
            (Param::UrrUlc, 0.1),
            (Param::LrrTdh, 100.0),
            (Param::LrrCst, 0.05),
            (Param::LrrDro, 0.4),
        ]);
        let r = routing(10.0, 20.0, 8.0, &p);
        let before = 10.0 + 20.0 + 8.0;
        let after = r.urr_depth + r.lrr_depth + r.surface_runoff + r.ground_runoff;
        assert_relative_eq!(before, after, epsilon = 1e-12);
    }

    #[test]
    fn percolation_stops_at_lower_threshold() {
        let p = params_with(&[(Param::UrrUlc, 0.5), (Param::LrrTdh, 10.0)]);
        let r = routing(10.0, 10.0, 0.0, &p);
        assert_eq!(r.percolation, 0.0);
    }

    #[test]
    fn step_mass_balance_is_zero() {
        let p = params_with(&[
            (Param::SnwDth, 5.0),
            (Param::SnwAmt, 0.0),
            (Param::SnwAmf, 1.5),
            (Param::SnwPmf, 0.05),
            (Param::Sl0Mse, 20.0),
            (Param::Sl1Mse, 30.0),
            (Param::Sl0Fcy, 80.0),
            (Param::Sl0Bt0, 2.0),
            (Param::Sl1Pwp, 60.0),
            (Param::Sl1Fcy, 120.0),
            (Param::Sl1Bt0, 1.5),
            (Param::UrrDth, 3.0),
            (Param::LrrDth, 2.0),
            (Param::UrrRsr, 0.4),
            (Param::UrrTdh, 10.0),
            (Param::UrrTdr, 0.3),
            (Param::UrrCst, 0.2),
            (Param::UrrDro, 0.7),
            (Param::UrrUlc, 0.1),
            (Param::LrrTdh, 50.0),
            (Param::LrrCst, 0.05),
            (Param::LrrDro, 0.5),
        ]);
        let prev = p.initial_state();
        let (next, fluxes) = step(&prev, 3.0, 12.0, 2.0, &p);
        let bal = mass_balance(12.0, &prev, &next, &fluxes);
        assert!(bal.abs() < 1e-10, "residual {bal}");
    }
}
