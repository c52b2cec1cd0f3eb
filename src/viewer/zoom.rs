// Zoom module
// Zoom levels offered by the viewer's Display menu

use std::fmt;
use std::str::FromStr;

/// Display scale of a viewer window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Zoom {
    #[default]
    Full,
    ThreeQuarters,
    Half,
    Quarter,
}

impl Zoom {
    /// Menu order
    pub const ALL: [Zoom; 4] = [Zoom::Full, Zoom::ThreeQuarters, Zoom::Half, Zoom::Quarter];

    pub fn factor(self) -> f64 {
        match self {
            Zoom::Full => 1.0,
            Zoom::ThreeQuarters => 0.75,
            Zoom::Half => 0.5,
            Zoom::Quarter => 0.25,
        }
    }

    pub fn percent(self) -> u32 {
        match self {
            Zoom::Full => 100,
            Zoom::ThreeQuarters => 75,
            Zoom::Half => 50,
            Zoom::Quarter => 25,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zoom::Full => "100 %",
            Zoom::ThreeQuarters => "75 %",
            Zoom::Half => "50 %",
            Zoom::Quarter => "25 %",
        }
    }

    pub fn from_percent(percent: u32) -> Option<Self> {
        Zoom::ALL.into_iter().find(|zoom| zoom.percent() == percent)
    }

    /// Scaled size of a `width` x `height` image, truncated, never below 1
    pub fn scale(self, width: u32, height: u32) -> (u32, u32) {
        let f = self.factor();
        (
            ((width as f64 * f) as u32).max(1),
            ((height as f64 * f) as u32).max(1),
        )
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Zoom {
    type Err = String;

    /// Accepts "100", "75%", "50 %", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches('%').trim();
        digits
            .parse::<u32>()
            .ok()
            .and_then(Zoom::from_percent)
            .ok_or_else(|| format!("Invalid zoom '{}' (expected 100, 75, 50 or 25)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_truncates_like_integer_casts() {
        assert_eq!(Zoom::Full.scale(101, 33), (101, 33));
        assert_eq!(Zoom::ThreeQuarters.scale(101, 33), (75, 24));
        assert_eq!(Zoom::Half.scale(101, 33), (50, 16));
        assert_eq!(Zoom::Quarter.scale(101, 33), (25, 8));
    }

    #[test]
    fn scale_never_reaches_zero() {
        assert_eq!(Zoom::Quarter.scale(1, 3), (1, 1));
    }

    #[test]
    fn parses_percentages() {
        assert_eq!("100".parse::<Zoom>(), Ok(Zoom::Full));
        assert_eq!("75%".parse::<Zoom>(), Ok(Zoom::ThreeQuarters));
        assert_eq!(" 50 % ".parse::<Zoom>(), Ok(Zoom::Half));
        assert_eq!("25".parse::<Zoom>(), Ok(Zoom::Quarter));
        assert!("30".parse::<Zoom>().is_err());
        assert!("big".parse::<Zoom>().is_err());
    }
}
