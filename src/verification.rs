use crate::error::{CashFlowError, Result};
use crate::rolling::RollingForecast;
use crate::schema::EntryKind;

pub struct TimelineVerifier<'a> {
    forecast: &'a RollingForecast,
}

impl<'a> TimelineVerifier<'a> {
    pub fn new(forecast: &'a RollingForecast) -> Self {
        Self { forecast }
    }

    /// Checks contiguity, kind ordering and the balance hand-off, in that order.
    pub fn verify(&self, tolerance: f64) -> Result<()> {
        self.verify_contiguous()?;
        self.verify_kind_order()?;
        self.verify_boundary_balance(tolerance)
    }

    pub fn verify_contiguous(&self) -> Result<()> {
        for pair in self.forecast.entries.windows(2) {
            if pair[0].month.next() != pair[1].month {
                return Err(CashFlowError::TimelineGap {
                    previous: pair[0].month.to_string(),
                    next: pair[1].month.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn verify_kind_order(&self) -> Result<()> {
        let mut seen_forecast = false;
        for entry in &self.forecast.entries {
            match entry.kind {
                EntryKind::Forecast => seen_forecast = true,
                EntryKind::Actual if seen_forecast => {
                    return Err(CashFlowError::KindOrder {
                        month: entry.month.to_string(),
                    });
                }
                EntryKind::Actual => {}
            }
        }
        Ok(())
    }

    /// The first forecast balance must be the last actual balance plus its own net.
    pub fn verify_boundary_balance(&self, tolerance: f64) -> Result<()> {
        let Some(boundary) = self
            .forecast
            .entries
            .iter()
            .position(|e| e.kind == EntryKind::Forecast)
        else {
            return Ok(());
        };

        let first_forecast = &self.forecast.entries[boundary];
        if first_forecast.sanitized {
            return Ok(());
        }

        let base = if boundary == 0 {
            self.forecast.starting_balance
        } else {
            self.forecast.entries[boundary - 1].balance
        };
        let expected = base + first_forecast.net;
        let difference = (first_forecast.balance - expected).abs();

        if difference > tolerance {
            return Err(CashFlowError::BalanceDiscontinuity {
                month: first_forecast.month.to_string(),
                expected,
                found: first_forecast.balance,
                difference,
            });
        }
        Ok(())
    }
}

pub fn verify_rolling_forecast(forecast: &RollingForecast, tolerance: f64) -> Result<()> {
    TimelineVerifier::new(forecast).verify(tolerance)
}
