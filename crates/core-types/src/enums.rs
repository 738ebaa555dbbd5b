use serde::{Deserialize, Serialize};
use std::fmt;

/// Tail-heaviness classification of a return distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KurtosisClass {
    Platykurtic,
    Mesokurtic,
    Leptokurtic,
}

impl KurtosisClass {
    /// Kurtosis value the bands are centred on.
    pub const BASELINE: f64 = 3.0;
    /// Half-width of the mesokurtic band around the baseline.
    pub const MESOKURTIC_BAND: f64 = 0.5;

    /// Classifies a kurtosis value. The bands are tested in order and the first
    /// match wins, so every value (NaN included) lands in exactly one class:
    /// `(-inf, 3)` platykurtic, `[3, 3.5)` mesokurtic, everything else leptokurtic.
    pub fn classify(kurtosis: f64) -> Self {
        if kurtosis < Self::BASELINE {
            KurtosisClass::Platykurtic
        } else if (kurtosis - Self::BASELINE).abs() < Self::MESOKURTIC_BAND {
            KurtosisClass::Mesokurtic
        } else {
            KurtosisClass::Leptokurtic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KurtosisClass::Platykurtic => "Platykurtic",
            KurtosisClass::Mesokurtic => "Mesokurtic",
            KurtosisClass::Leptokurtic => "Leptokurtic",
        }
    }

    /// Traffic-light colour used when the class is drawn on a risk gauge.
    pub fn color(&self) -> &'static str {
        match self {
            KurtosisClass::Platykurtic => "green",
            KurtosisClass::Mesokurtic => "yellow",
            KurtosisClass::Leptokurtic => "red",
        }
    }
}

impl fmt::Display for KurtosisClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_first_match_order() {
        assert_eq!(KurtosisClass::classify(-1.0), KurtosisClass::Platykurtic);
        assert_eq!(KurtosisClass::classify(2.9), KurtosisClass::Platykurtic);
        // 2.6 is within 0.5 of the baseline but the "< 3" test wins.
        assert_eq!(KurtosisClass::classify(2.6), KurtosisClass::Platykurtic);
        assert_eq!(KurtosisClass::classify(3.0), KurtosisClass::Mesokurtic);
        assert_eq!(KurtosisClass::classify(3.49), KurtosisClass::Mesokurtic);
        assert_eq!(KurtosisClass::classify(3.5), KurtosisClass::Leptokurtic);
        assert_eq!(KurtosisClass::classify(12.0), KurtosisClass::Leptokurtic);
    }

    #[test]
    fn every_value_maps_to_exactly_one_class() {
        let mut k = -10.0;
        while k < 10.0 {
            let class = KurtosisClass::classify(k);
            let matches = [
                k < 3.0,
                (3.0..3.5).contains(&k),
                k >= 3.5,
            ];
            assert_eq!(matches.iter().filter(|m| **m).count(), 1, "k = {k}");
            let expected = match matches.iter().position(|m| *m) {
                Some(0) => KurtosisClass::Platykurtic,
                Some(1) => KurtosisClass::Mesokurtic,
                _ => KurtosisClass::Leptokurtic,
            };
            assert_eq!(class, expected, "k = {k}");
            k += 0.01;
        }
        assert_eq!(KurtosisClass::classify(f64::NAN), KurtosisClass::Leptokurtic);
        assert_eq!(KurtosisClass::classify(f64::INFINITY), KurtosisClass::Leptokurtic);
        assert_eq!(KurtosisClass::classify(f64::NEG_INFINITY), KurtosisClass::Platykurtic);
    }

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&KurtosisClass::Mesokurtic).unwrap();
        assert_eq!(json, "\"Mesokurtic\"");
        assert_eq!(KurtosisClass::Leptokurtic.to_string(), "Leptokurtic");
    }
}
