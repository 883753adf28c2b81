use serde::{Deserialize, Serialize};

/// Loan assumptions used to estimate a monthly payment for a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortgageTerms {
    /// Share of the price paid up front, 0-100
    pub down_payment_percent: f64,
    /// Yearly interest rate in percent, 0-20
    pub interest_rate: f64,
    /// Loan length; one of 15, 20 or 30
    pub loan_years: u32,
}

impl Default for MortgageTerms {
    fn default() -> Self {
        Self {
            down_payment_percent: 20.0,
            interest_rate: 7.0,
            loan_years: 30,
        }
    }
}

impl MortgageTerms {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.down_payment_percent) {
            return Err(format!(
                "down payment {}% is outside 0-100",
                self.down_payment_percent
            ));
        }
        if !(0.0..=20.0).contains(&self.interest_rate) {
            return Err(format!("interest rate {}% is outside 0-20", self.interest_rate));
        }
        if ![15, 20, 30].contains(&self.loan_years) {
            return Err(format!("loan term of {} years is not offered", self.loan_years));
        }
        Ok(())
    }

    /// Estimated monthly principal and interest, rounded to whole units.
    ///
    /// Returns 0 when there is nothing to finance or no interest to amortize.
    pub fn monthly_payment(&self, price: f64) -> u64 {
        if !price.is_finite() || price <= 0.0 {
            return 0;
        }

        let loan = price * (1.0 - self.down_payment_percent / 100.0);
        let monthly_rate = self.interest_rate / 100.0 / 12.0;
        let payments = (self.loan_years * 12) as i32;

        if monthly_rate <= 0.0 || loan <= 0.0 || payments == 0 {
            return 0;
        }

        let growth = (1.0 + monthly_rate).powi(payments);
        (loan * monthly_rate * growth / (growth - 1.0)).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_thirty_year_loan() {
        let terms = MortgageTerms::default();
        // 400k loan at 7% over 30 years
        assert_eq!(terms.monthly_payment(500_000.0), 2661);
    }

    #[test]
    fn nothing_to_finance() {
        let terms = MortgageTerms::default();
        assert_eq!(terms.monthly_payment(0.0), 0);
        assert_eq!(terms.monthly_payment(-5.0), 0);

        let cash = MortgageTerms {
            down_payment_percent: 100.0,
            ..MortgageTerms::default()
        };
        assert_eq!(cash.monthly_payment(300_000.0), 0);

        let free = MortgageTerms {
            interest_rate: 0.0,
            ..MortgageTerms::default()
        };
        assert_eq!(free.monthly_payment(300_000.0), 0);
    }

    #[test]
    fn validates_ranges() {
        assert!(MortgageTerms::default().validate().is_ok());
        let odd_term = MortgageTerms {
            loan_years: 25,
            ..MortgageTerms::default()
        };
        assert!(odd_term.validate().is_err());
        let steep = MortgageTerms {
            interest_rate: 25.0,
            ..MortgageTerms::default()
        };
        assert!(steep.validate().is_err());
    }
}
