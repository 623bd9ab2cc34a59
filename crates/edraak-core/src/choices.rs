//! Enumerations accepted for profile fields
//!
//! The host platform owns these lists; they are injected through
//! [`crate::config::Settings`]. Defaults mirror the platform's stock values.

use std::collections::BTreeSet;

/// ISO 3166-1 alpha-2 codes
const COUNTRY_CODES: &str = "\
AD AE AF AG AI AL AM AO AQ AR AS AT AU AW AX AZ BA BB BD BE BF BG BH BI BJ BL \
BM BN BO BQ BR BS BT BV BW BY BZ CA CC CD CF CG CH CI CK CL CM CN CO CR CU CV \
CW CX CY CZ DE DJ DK DM DO DZ EC EE EG EH ER ES ET FI FJ FK FM FO FR GA GB GD \
GE GF GG GH GI GL GM GN GP GQ GR GS GT GU GW GY HK HM HN HR HT HU ID IE IL IM \
IN IO IQ IR IS IT JE JM JO JP KE KG KH KI KM KN KP KR KW KY KZ LA LB LC LI LK \
LR LS LT LU LV LY MA MC MD ME MF MG MH MK ML MM MN MO MP MQ MR MS MT MU MV MW \
MX MY MZ NA NC NE NF NG NI NL NO NP NR NU NZ OM PA PE PF PG PH PK PL PM PN PR \
PS PT PW PY QA RE RO RS RU RW SA SB SC SD SE SG SH SI SJ SK SL SM SN SO SR SS \
ST SV SX SY SZ TC TD TF TG TH TJ TK TL TM TN TO TR TT TV TW TZ UA UG UM US UY \
UZ VA VC VE VG VI VN VU WF WS YE YT ZA ZM ZW";

/// Allowed values for the enumerated request fields
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Choices {
    pub genders: BTreeSet<String>,
    pub education_levels: BTreeSet<String>,
    pub countries: BTreeSet<String>,
    pub languages: BTreeSet<String>,
}

impl Default for Choices {
    fn default() -> Self {
        Self {
            genders: to_set(&["m", "f", "o"]),
            education_levels: to_set(&[
                "p", "m", "b", "a", "hs", "jhs", "el", "none", "other",
            ]),
            countries: COUNTRY_CODES.split_whitespace().map(String::from).collect(),
            languages: to_set(&["ar", "en"]),
        }
    }
}

impl Choices {
    pub fn is_valid_gender(&self, value: &str) -> bool {
        self.genders.contains(value)
    }

    pub fn is_valid_education_level(&self, value: &str) -> bool {
        self.education_levels.contains(value)
    }

    pub fn is_valid_country(&self, value: &str) -> bool {
        self.countries.contains(value)
    }

    /// Whether `value` is one of the enabled site languages
    pub fn is_enabled_language(&self, value: &str) -> bool {
        self.languages.contains(value)
    }
}

fn to_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}
