//! Usage query scales and energy units.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Time scale for usage queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    Second,
    Minute,
    Minutes15,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Scale {
    /// The wire value the upstream API expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Second => "1S",
            Scale::Minute => "1MIN",
            Scale::Minutes15 => "15MIN",
            Scale::Hour => "1H",
            Scale::Day => "1D",
            Scale::Week => "1W",
            Scale::Month => "1MON",
            Scale::Year => "1Y",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1S" => Ok(Scale::Second),
            "1MIN" => Ok(Scale::Minute),
            "15MIN" => Ok(Scale::Minutes15),
            "1H" => Ok(Scale::Hour),
            "1D" => Ok(Scale::Day),
            "1W" => Ok(Scale::Week),
            "1MON" => Ok(Scale::Month),
            "1Y" => Ok(Scale::Year),
            other => Err(InvalidInputError::Other {
                message: format!("unknown usage scale '{other}'"),
            }
            .into()),
        }
    }
}

/// Energy unit for usage queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    KilowattHours,
    Dollars,
    AmpHours,
    Trees,
    GallonsOfGas,
    MilesDriven,
    Carbon,
}

impl Unit {
    /// The wire value the upstream API expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::KilowattHours => "KilowattHours",
            Unit::Dollars => "Dollars",
            Unit::AmpHours => "AmpHours",
            Unit::Trees => "Trees",
            Unit::GallonsOfGas => "GallonsOfGas",
            Unit::MilesDriven => "MilesDriven",
            Unit::Carbon => "Carbon",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KilowattHours" => Ok(Unit::KilowattHours),
            "Dollars" => Ok(Unit::Dollars),
            "AmpHours" => Ok(Unit::AmpHours),
            "Trees" => Ok(Unit::Trees),
            "GallonsOfGas" => Ok(Unit::GallonsOfGas),
            "MilesDriven" => Ok(Unit::MilesDriven),
            "Carbon" => Ok(Unit::Carbon),
            other => Err(InvalidInputError::Other {
                message: format!("unknown energy unit '{other}'"),
            }
            .into()),
        }
    }
}
