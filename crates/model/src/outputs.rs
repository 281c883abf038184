//! Output columns and the full-trajectory output table.

use ndarray::{Array2, ArrayView1, ArrayView2};

/// Number of output columns written per time step.
pub const N_OUTPUTS: usize = 18;

/// Named flux and state outputs, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutputColumn {
    /// Snow depth at the end of the step [L].
    SnwDth = 0,
    /// Liquid precipitation [L/T].
    SnwLpt = 1,
    /// Air-induced melt [L/T].
    SnwAim = 2,
    /// Precipitation-induced melt [L/T].
    SnwPim = 3,
    /// Total melt [L/T].
    SnwMlt = 4,
    /// Soil layer 0 moisture [L].
    Sl0Mse = 5,
    /// Soil layer 1 moisture [L].
    Sl1Mse = 6,
    /// Potential runoff into soil layer 0 [L/T].
    Sl0Prf = 7,
    /// Actual runoff out of soil layer 0 [L/T].
    Sl0Arf = 8,
    /// Evapotranspiration from soil layer 1 [L/T].
    Sl1Etn = 9,
    /// Upper reservoir depth [L].
    UrrDth = 10,
    /// Lower reservoir depth [L].
    LrrDth = 11,
    /// Upper reservoir outlet runoff [L/T].
    UrrRnf = 12,
    /// Percolation from the upper to the lower reservoir [L/T].
    UrrPln = 13,
    /// Lower reservoir outlet runoff [L/T].
    LrrRnf = 14,
    /// Surface runoff [L/T].
    RnfSfc = 15,
    /// Groundwater runoff [L/T].
    RnfGnd = 16,
    /// Mass balance residual [L/T].
    ModBal = 17,
}

impl OutputColumn {
    /// All columns in order.
    pub const ALL: [OutputColumn; N_OUTPUTS] = [
        Self::SnwDth,
        Self::SnwLpt,
        Self::SnwAim,
        Self::SnwPim,
        Self::SnwMlt,
        Self::Sl0Mse,
        Self::Sl1Mse,
        Self::Sl0Prf,
        Self::Sl0Arf,
        Self::Sl1Etn,
        Self::UrrDth,
        Self::LrrDth,
        Self::UrrRnf,
        Self::UrrPln,
        Self::LrrRnf,
        Self::RnfSfc,
        Self::RnfGnd,
        Self::ModBal,
    ];

    /// Returns the zero-based column index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the column label.
    pub fn name(self) -> &'static str {
        match self {
            Self::SnwDth => "snw_dth",
            Self::SnwLpt => "snw_lpt",
            Self::SnwAim => "snw_aim",
            Self::SnwPim => "snw_pim",
            Self::SnwMlt => "snw_mlt",
            Self::Sl0Mse => "sl0_mse",
            Self::Sl1Mse => "sl1_mse",
            Self::Sl0Prf => "sl0_prf",
            Self::Sl0Arf => "sl0_arf",
            Self::Sl1Etn => "sl1_etn",
            Self::UrrDth => "urr_dth",
            Self::LrrDth => "lrr_dth",
            Self::UrrRnf => "urr_rnf",
            Self::UrrPln => "urr_pln",
            Self::LrrRnf => "lrr_rnf",
            Self::RnfSfc => "rnf_sfc",
            Self::RnfGnd => "rnf_gnd",
            Self::ModBal => "mod_bal",
        }
    }

    /// Column labels in order.
    pub fn labels() -> [&'static str; N_OUTPUTS] {
        Self::ALL.map(Self::name)
    }
}

/// Full-trajectory output table, one row per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    data: Array2<f64>,
}

impl OutputTable {
    pub(crate) fn zeros(n_steps: usize) -> Self {
        Self {
            data: Array2::zeros((n_steps, N_OUTPUTS)),
        }
    }

    pub(crate) fn write_row(&mut self, t: usize, row: &[f64; N_OUTPUTS]) {
        for (dst, &src) in self.data.row_mut(t).iter_mut().zip(row) {
            *dst = src;
        }
    }

    /// Number of time steps.
    pub fn n_steps(&self) -> usize {
        self.data.nrows()
    }

    /// Returns one output column over all time steps.
    pub fn column(&self, col: OutputColumn) -> ArrayView1<'_, f64> {
        self.data.column(col.index())
    }

    /// Returns the outputs of one time step.
    ///
    /// # Panics
    ///
    /// Panics if `t >= n_steps()`.
    pub fn row(&self, t: usize) -> ArrayView1<'_, f64> {
        self.data.row(t)
    }

    /// Returns the whole `(n_steps, 18)` table.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Consumes the table and returns the underlying array.
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_in_order() {
        let labels = OutputColumn::labels();
        assert_eq!(labels[0], "snw_dth");
        assert_eq!(labels[15], "rnf_sfc");
        assert_eq!(labels[17], "mod_bal");
    }

    #[test]
    fn index_matches_position() {
        for (i, c) in OutputColumn::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn write_and_read_row() {
        let mut table = OutputTable::zeros(3);
        let mut row = [0.0; N_OUTPUTS];
        row[OutputColumn::RnfSfc.index()] = 4.5;
        table.write_row(1, &row);
        assert_eq!(table.column(OutputColumn::RnfSfc).to_vec(), vec![0.0, 4.5, 0.0]);
        assert_eq!(table.n_steps(), 3);
    }
}
