//! acoustic.rs — Acoustic link settings (carrier frequency, trigger code)
//!
//! Operators pick a carrier frequency and a release code and may test both
//! against the buoy before the mission trigger. Changing either setting
//! invalidates its previous test result.

use recovery_types::{BuoyStatus, TriggerCode};
use thiserror::Error;

use crate::config::AcousticConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcousticError {
    #[error("frequency {requested} kHz outside band {min}-{max} kHz")]
    FrequencyOutOfBand { requested: u32, min: u32, max: u32 },
    #[error("buoy is off")]
    BuoyOff,
    #[error("no trigger code selected")]
    NoCodeSelected,
}

#[derive(Debug, Clone)]
pub struct AcousticLink {
    min_khz: u32,
    max_khz: u32,
    frequency_khz: u32,
    frequency_tested: bool,
    selected_code: Option<TriggerCode>,
    code_tested: bool,
}

impl AcousticLink {
    pub fn new(cfg: &AcousticConfig) -> Self {
        Self {
            min_khz: cfg.min_frequency_khz,
            max_khz: cfg.max_frequency_khz,
            frequency_khz: cfg.default_frequency_khz,
            frequency_tested: false,
            selected_code: None,
            code_tested: false,
        }
    }

    pub fn frequency_khz(&self) -> u32 {
        self.frequency_khz
    }

    pub fn frequency_tested(&self) -> bool {
        self.frequency_tested
    }

    pub fn selected_code(&self) -> Option<TriggerCode> {
        self.selected_code
    }

    pub fn code_tested(&self) -> bool {
        self.code_tested
    }

    pub fn set_frequency_khz(&mut self, khz: u32) -> Result<(), AcousticError> {
        if !(self.min_khz..=self.max_khz).contains(&khz) {
            return Err(AcousticError::FrequencyOutOfBand {
                requested: khz,
                min: self.min_khz,
                max: self.max_khz,
            });
        }
        if khz != self.frequency_khz {
            self.frequency_khz = khz;
            self.frequency_tested = false;
        }
        Ok(())
    }

    pub fn select_code(&mut self, code: TriggerCode) {
        if self.selected_code != Some(code) {
            self.selected_code = Some(code);
            self.code_tested = false;
        }
    }

    pub fn record_frequency_test(&mut self, buoy: BuoyStatus) -> Result<(), AcousticError> {
        if buoy == BuoyStatus::Off {
            return Err(AcousticError::BuoyOff);
        }
        self.frequency_tested = true;
        Ok(())
    }

    pub fn record_code_test(&mut self, buoy: BuoyStatus) -> Result<TriggerCode, AcousticError> {
        let code = self.selected_code.ok_or(AcousticError::NoCodeSelected)?;
        if buoy == BuoyStatus::Off {
            return Err(AcousticError::BuoyOff);
        }
        self.code_tested = true;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> AcousticLink {
        AcousticLink::new(&AcousticConfig::default())
    }

    #[test]
    fn test_defaults() {
        let l = link();
        assert_eq!(l.frequency_khz(), 57);
        assert!(l.selected_code().is_none());
        assert!(!l.frequency_tested() && !l.code_tested());
    }

    #[test]
    fn test_frequency_band_enforced() {
        let mut l = link();
        assert_eq!(
            l.set_frequency_khz(80),
            Err(AcousticError::FrequencyOutOfBand { requested: 80, min: 25, max: 75 })
        );
        assert_eq!(l.frequency_khz(), 57);
        assert!(l.set_frequency_khz(25).is_ok());
        assert!(l.set_frequency_khz(75).is_ok());
    }

    #[test]
    fn test_retune_invalidates_test() {
        let mut l = link();
        l.record_frequency_test(BuoyStatus::On).unwrap();
        l.set_frequency_khz(57).unwrap();
        assert!(l.frequency_tested(), "same frequency keeps the result");
        l.set_frequency_khz(40).unwrap();
        assert!(!l.frequency_tested());
    }

    #[test]
    fn test_frequency_test_needs_buoy() {
        let mut l = link();
        assert_eq!(l.record_frequency_test(BuoyStatus::Off), Err(AcousticError::BuoyOff));
        assert!(!l.frequency_tested());
    }

    #[test]
    fn test_code_test_needs_selection_then_buoy() {
        let mut l = link();
        assert_eq!(l.record_code_test(BuoyStatus::On), Err(AcousticError::NoCodeSelected));
        l.select_code(TriggerCode::B);
        assert_eq!(l.record_code_test(BuoyStatus::Off), Err(AcousticError::BuoyOff));
        assert_eq!(l.record_code_test(BuoyStatus::On), Ok(TriggerCode::B));
        assert!(l.code_tested());
        l.select_code(TriggerCode::C);
        assert!(!l.code_tested());
    }
}
