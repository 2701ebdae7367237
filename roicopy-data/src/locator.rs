// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;
use std::str::FromStr;

use roicopy_core::error::RoiCopyError;

/// Where ROIs are read from or written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Image(i64),
    Dataset(i64),
}

impl Locator {
    pub fn id(&self) -> i64 {
        match self {
            Locator::Image(id) | Locator::Dataset(id) => *id,
        }
    }
}

impl FromStr for Locator {
    type Err = RoiCopyError;

    /// Parse `Image:<id>` or `Dataset:<id>`
    ///
    /// # Examples
    ///
    /// ```
    /// use roicopy_data::locator::Locator;
    ///
    /// assert_eq!("Image:12".parse::<Locator>().unwrap(), Locator::Image(12));
    /// assert_eq!("Dataset:3".parse::<Locator>().unwrap(), Locator::Dataset(3));
    /// assert!("Project:1".parse::<Locator>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (kind, id) = s.split_once(':').ok_or_else(|| {
            RoiCopyError::AmbiguousLocatorError(format!("Locator '{}' has no object type", s))
        })?;

        let id: i64 = id.trim().parse().map_err(|_| {
            RoiCopyError::AmbiguousLocatorError(format!("Locator '{}' has an invalid id", s))
        })?;

        if id < 0 {
            return Err(RoiCopyError::AmbiguousLocatorError(format!(
                "Locator '{}' has a negative id",
                s
            )));
        }

        match kind {
            "Image" => Ok(Locator::Image(id)),
            "Dataset" => Ok(Locator::Dataset(id)),
            other => Err(RoiCopyError::AmbiguousLocatorError(format!(
                "Unknown object type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Locator::Image(id) => write!(f, "Image:{}", id),
            Locator::Dataset(id) => write!(f, "Dataset:{}", id),
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(" Image:7 ".parse::<Locator>().unwrap(), Locator::Image(7));
        assert_eq!("Dataset: 51".parse::<Locator>().unwrap(), Locator::Dataset(51));
        assert_eq!(Locator::Dataset(51).id(), 51);
    }

    #[test]
    fn test_parse_invalid() {
        for locator in ["12", "Image:", "Image:abc", "image:1", "Well:3", "Image:-4", ":5"] {
            let err = locator.parse::<Locator>().unwrap_err();
            assert!(
                matches!(err, RoiCopyError::AmbiguousLocatorError(_)),
                "{}",
                locator
            );
        }
    }

    #[test]
    fn test_display_roundtrip() {
        let locator = Locator::Image(99);
        assert_eq!(locator.to_string().parse::<Locator>().unwrap(), locator);
    }
}
