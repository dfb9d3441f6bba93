use serde::{Deserialize, Serialize};

/// The 18 hazard types published per county by the national risk index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    Avalanche,
    CoastalFlooding,
    ColdWave,
    Drought,
    Earthquake,
    Hail,
    HeatWave,
    Hurricane,
    IceStorm,
    Landslide,
    Lightning,
    RiverineFlooding,
    StrongWind,
    Tornado,
    Tsunami,
    VolcanicActivity,
    Wildfire,
    WinterWeather,
}

impl HazardCategory {
    pub const fn all() -> [HazardCategory; 18] {
        [
            Self::Avalanche,
            Self::CoastalFlooding,
            Self::ColdWave,
            Self::Drought,
            Self::Earthquake,
            Self::Hail,
            Self::HeatWave,
            Self::Hurricane,
            Self::IceStorm,
            Self::Landslide,
            Self::Lightning,
            Self::RiverineFlooding,
            Self::StrongWind,
            Self::Tornado,
            Self::Tsunami,
            Self::VolcanicActivity,
            Self::Wildfire,
            Self::WinterWeather,
        ]
    }

    /// Column prefix used by the upstream dataset for this hazard.
    pub const fn column_prefix(self) -> &'static str {
        match self {
            Self::Avalanche => "AVLN",
            Self::CoastalFlooding => "CFLD",
            Self::ColdWave => "CWAV",
            Self::Drought => "DRGT",
            Self::Earthquake => "ERQK",
            Self::Hail => "HAIL",
            Self::HeatWave => "HWAV",
            Self::Hurricane => "HRCN",
            Self::IceStorm => "ISTM",
            Self::Landslide => "LNDS",
            Self::Lightning => "LTNG",
            Self::RiverineFlooding => "RFLD",
            Self::StrongWind => "SWND",
            Self::Tornado => "TRND",
            Self::Tsunami => "TSUN",
            Self::VolcanicActivity => "VLCN",
            Self::Wildfire => "WFIR",
            Self::WinterWeather => "WNTW",
        }
    }

    /// Stable key used in serialized profiles.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Avalanche => "avalanche",
            Self::CoastalFlooding => "coastal_flooding",
            Self::ColdWave => "cold_wave",
            Self::Drought => "drought",
            Self::Earthquake => "earthquake",
            Self::Hail => "hail",
            Self::HeatWave => "heat_wave",
            Self::Hurricane => "hurricane",
            Self::IceStorm => "ice_storm",
            Self::Landslide => "landslide",
            Self::Lightning => "lightning",
            Self::RiverineFlooding => "riverine_flooding",
            Self::StrongWind => "strong_wind",
            Self::Tornado => "tornado",
            Self::Tsunami => "tsunami",
            Self::VolcanicActivity => "volcanic_activity",
            Self::Wildfire => "wildfire",
            Self::WinterWeather => "winter_weather",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Avalanche => "Avalanche",
            Self::CoastalFlooding => "Coastal Flooding",
            Self::ColdWave => "Cold Wave",
            Self::Drought => "Drought",
            Self::Earthquake => "Earthquake",
            Self::Hail => "Hail",
            Self::HeatWave => "Heat Wave",
            Self::Hurricane => "Hurricane",
            Self::IceStorm => "Ice Storm",
            Self::Landslide => "Landslide",
            Self::Lightning => "Lightning",
            Self::RiverineFlooding => "Riverine Flooding",
            Self::StrongWind => "Strong Wind",
            Self::Tornado => "Tornado",
            Self::Tsunami => "Tsunami",
            Self::VolcanicActivity => "Volcanic Activity",
            Self::Wildfire => "Wildfire",
            Self::WinterWeather => "Winter Weather",
        }
    }
}

/// Social vulnerability index themes (percentile ranks in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SviTheme {
    SocioeconomicStatus,
    HouseholdCharacteristics,
    RacialEthnicMinorityStatus,
    HousingTypeTransportation,
}

impl SviTheme {
    pub const fn all() -> [SviTheme; 4] {
        [
            Self::SocioeconomicStatus,
            Self::HouseholdCharacteristics,
            Self::RacialEthnicMinorityStatus,
            Self::HousingTypeTransportation,
        ]
    }

    pub const fn column(self) -> &'static str {
        match self {
            Self::SocioeconomicStatus => "RPL_THEME1",
            Self::HouseholdCharacteristics => "RPL_THEME2",
            Self::RacialEthnicMinorityStatus => "RPL_THEME3",
            Self::HousingTypeTransportation => "RPL_THEME4",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::SocioeconomicStatus => "socioeconomic_status",
            Self::HouseholdCharacteristics => "household_characteristics",
            Self::RacialEthnicMinorityStatus => "racial_ethnic_minority_status",
            Self::HousingTypeTransportation => "housing_type_transportation",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SocioeconomicStatus => "Socioeconomic Status",
            Self::HouseholdCharacteristics => "Household Characteristics",
            Self::RacialEthnicMinorityStatus => "Racial & Ethnic Minority Status",
            Self::HousingTypeTransportation => "Housing Type & Transportation",
        }
    }
}
