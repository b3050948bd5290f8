use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal $(| $legacy:literal)*),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($wire $(| $legacy)* => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        stringify!($name),
                        other,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

/// 刊登狀態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    #[serde(alias = "expirée", alias = "expiree")]
    Expired,
    #[serde(alias = "vendue")]
    Sold,
}

wire_enum!(ListingStatus {
    Active => "active",
    Expired => "expired" | "expirée" | "expiree",
    Sold => "sold" | "vendue",
});

impl ListingStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, ListingStatus::Sold)
    }
}

/// 車輛狀態，未指定時為 available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    #[default]
    #[serde(alias = "disponible")]
    Available,
    #[serde(alias = "réservé", alias = "reserve")]
    Reserved,
    #[serde(alias = "vendu")]
    Sold,
    #[serde(alias = "retiré", alias = "retire")]
    Withdrawn,
}

wire_enum!(VehicleStatus {
    Available => "available" | "disponible",
    Reserved => "reserved" | "réservé" | "reserve",
    Sold => "sold" | "vendu",
    Withdrawn => "withdrawn" | "retiré" | "retire",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[serde(alias = "vendeur")]
    Seller,
    #[default]
    #[serde(alias = "acheteur")]
    Buyer,
    #[serde(alias = "les deux", alias = "les_deux")]
    Both,
}

wire_enum!(AccountType {
    Seller => "seller" | "vendeur",
    Buyer => "buyer" | "acheteur",
    Both => "both" | "les deux" | "les_deux",
});

impl AccountType {
    pub fn can_sell(&self) -> bool {
        matches!(self, AccountType::Seller | AccountType::Both)
    }

    pub fn can_buy(&self) -> bool {
        matches!(self, AccountType::Buyer | AccountType::Both)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccidentSeverity {
    #[default]
    #[serde(alias = "léger", alias = "leger")]
    Minor,
    #[serde(alias = "moyen")]
    Moderate,
    #[serde(alias = "grave")]
    Severe,
}

wire_enum!(AccidentSeverity {
    Minor => "minor" | "léger" | "leger",
    Moderate => "moderate" | "moyen",
    Severe => "severe" | "grave",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ListingStatus::default(), ListingStatus::Active);
        assert_eq!(VehicleStatus::default(), VehicleStatus::Available);
        assert_eq!(AccountType::default(), AccountType::Buyer);
    }

    #[test]
    fn test_legacy_strings_are_accepted() {
        let status: ListingStatus = serde_json::from_str("\"expirée\"").unwrap();
        assert_eq!(status, ListingStatus::Expired);
        let status: ListingStatus = serde_json::from_str("\"vendue\"").unwrap();
        assert_eq!(status, ListingStatus::Sold);
        let account: AccountType = serde_json::from_str("\"les deux\"").unwrap();
        assert_eq!(account, AccountType::Both);
        let vehicle: VehicleStatus = serde_json::from_str("\"disponible\"").unwrap();
        assert_eq!(vehicle, VehicleStatus::Available);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(serde_json::from_str::<ListingStatus>("\"archived\"").is_err());
        assert!("archived".parse::<ListingStatus>().is_err());
        assert!(serde_json::from_str::<AccountType>("\"\"").is_err());
    }

    #[test]
    fn test_from_str_matches_serde_names() {
        for status in ListingStatus::ALL {
            assert_eq!(status.as_str().parse::<ListingStatus>().unwrap(), *status);
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!("Les Deux".parse::<AccountType>().unwrap(), AccountType::Both);
    }
}
