use std::fmt;
use std::str::FromStr;

use crate::errors::CoordinatorRecordError;

macro_rules! metadata_versions {
    ($($variant:ident => ($version:literal, $release:literal)),+ $(,)?) => {
        /// Cluster protocol version, a.k.a. `inter.broker.protocol.version`.
        ///
        /// The negotiated version of the cluster drives which schema version the legacy
        /// record values (classic [`GroupMetadataValue`] and [`OffsetCommitValue`]) are
        /// written with, so that brokers still running an older release can read them.
        ///
        /// Variants are declared in release order: [`Ord`] compares them chronologically.
        ///
        /// [`GroupMetadataValue`]: crate::GroupMetadataValue
        /// [`OffsetCommitValue`]: crate::OffsetCommitValue
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum MetadataVersion {
            $($variant,)+
        }

        impl MetadataVersion {
            /// Every known version, oldest first.
            pub const VALUES: &'static [MetadataVersion] = &[$(MetadataVersion::$variant,)+];

            /// Full version string, e.g. `3.5-IV2`.
            pub fn version(&self) -> &'static str {
                match self {
                    $(MetadataVersion::$variant => $version,)+
                }
            }

            /// Release the version belongs to, e.g. `3.5`.
            pub fn release_version(&self) -> &'static str {
                match self {
                    $(MetadataVersion::$variant => $release,)+
                }
            }
        }
    };
}

metadata_versions! {
    IBP_0_8_0 => ("0.8.0", "0.8.0"),
    IBP_0_8_1 => ("0.8.1", "0.8.1"),
    IBP_0_8_2 => ("0.8.2", "0.8.2"),
    IBP_0_9_0 => ("0.9.0", "0.9.0"),
    IBP_0_10_0_IV0 => ("0.10.0-IV0", "0.10.0"),
    IBP_0_10_0_IV1 => ("0.10.0-IV1", "0.10.0"),
    IBP_0_10_1_IV0 => ("0.10.1-IV0", "0.10.1"),
    IBP_0_10_1_IV1 => ("0.10.1-IV1", "0.10.1"),
    IBP_0_10_1_IV2 => ("0.10.1-IV2", "0.10.1"),
    IBP_0_10_2_IV0 => ("0.10.2-IV0", "0.10.2"),
    IBP_0_11_0_IV0 => ("0.11.0-IV0", "0.11.0"),
    IBP_0_11_0_IV1 => ("0.11.0-IV1", "0.11.0"),
    IBP_0_11_0_IV2 => ("0.11.0-IV2", "0.11.0"),
    IBP_1_0_IV0 => ("1.0-IV0", "1.0"),
    IBP_1_1_IV0 => ("1.1-IV0", "1.1"),
    IBP_2_0_IV0 => ("2.0-IV0", "2.0"),
    IBP_2_0_IV1 => ("2.0-IV1", "2.0"),
    IBP_2_1_IV0 => ("2.1-IV0", "2.1"),
    IBP_2_1_IV1 => ("2.1-IV1", "2.1"),
    IBP_2_1_IV2 => ("2.1-IV2", "2.1"),
    IBP_2_2_IV0 => ("2.2-IV0", "2.2"),
    IBP_2_2_IV1 => ("2.2-IV1", "2.2"),
    IBP_2_3_IV0 => ("2.3-IV0", "2.3"),
    IBP_2_3_IV1 => ("2.3-IV1", "2.3"),
    IBP_2_4_IV0 => ("2.4-IV0", "2.4"),
    IBP_2_4_IV1 => ("2.4-IV1", "2.4"),
    IBP_2_5_IV0 => ("2.5-IV0", "2.5"),
    IBP_2_6_IV0 => ("2.6-IV0", "2.6"),
    IBP_2_7_IV0 => ("2.7-IV0", "2.7"),
    IBP_2_7_IV1 => ("2.7-IV1", "2.7"),
    IBP_2_7_IV2 => ("2.7-IV2", "2.7"),
    IBP_2_8_IV0 => ("2.8-IV0", "2.8"),
    IBP_2_8_IV1 => ("2.8-IV1", "2.8"),
    IBP_3_0_IV0 => ("3.0-IV0", "3.0"),
    IBP_3_0_IV1 => ("3.0-IV1", "3.0"),
    IBP_3_1_IV0 => ("3.1-IV0", "3.1"),
    IBP_3_2_IV0 => ("3.2-IV0", "3.2"),
    IBP_3_3_IV0 => ("3.3-IV0", "3.3"),
    IBP_3_3_IV1 => ("3.3-IV1", "3.3"),
    IBP_3_3_IV2 => ("3.3-IV2", "3.3"),
    IBP_3_3_IV3 => ("3.3-IV3", "3.3"),
    IBP_3_4_IV0 => ("3.4-IV0", "3.4"),
    IBP_3_5_IV0 => ("3.5-IV0", "3.5"),
    IBP_3_5_IV1 => ("3.5-IV1", "3.5"),
    IBP_3_5_IV2 => ("3.5-IV2", "3.5"),
    IBP_3_6_IV0 => ("3.6-IV0", "3.6"),
    IBP_3_6_IV1 => ("3.6-IV1", "3.6"),
    IBP_3_6_IV2 => ("3.6-IV2", "3.6"),
    IBP_3_7_IV0 => ("3.7-IV0", "3.7"),
    IBP_3_7_IV1 => ("3.7-IV1", "3.7"),
    IBP_3_7_IV2 => ("3.7-IV2", "3.7"),
    IBP_3_7_IV3 => ("3.7-IV3", "3.7"),
    IBP_3_7_IV4 => ("3.7-IV4", "3.7"),
    IBP_3_8_IV0 => ("3.8-IV0", "3.8"),
}

impl MetadataVersion {
    /// Most recent version known to this crate.
    pub const LATEST: MetadataVersion = MetadataVersion::IBP_3_8_IV0;

    pub fn is_at_least(&self, other: MetadataVersion) -> bool {
        *self >= other
    }

    pub fn is_less_than(&self, other: MetadataVersion) -> bool {
        *self < other
    }
}

impl Default for MetadataVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for MetadataVersion {
    type Err = CoordinatorRecordError;

    /// Parses either a full version (`3.5-IV2`) or a release (`3.5`).
    ///
    /// A release resolves to its most recent version, matching how brokers interpret
    /// `inter.broker.protocol.version=3.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(mv) = Self::VALUES.iter().find(|mv| mv.version() == s) {
            return Ok(*mv);
        }

        Self::VALUES
            .iter()
            .rev()
            .find(|mv| mv.release_version() == s)
            .copied()
            .ok_or_else(|| CoordinatorRecordError::UnknownMetadataVersion(s.to_string()))
    }
}
